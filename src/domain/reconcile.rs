//! Trade reconciliation: orders, deals and segments into summary rows.
//!
//! Positions come from the segment relation. Every distinct positive
//! `position_id` groups the orders its segments reference; the two earliest
//! orders by open time are paired as entry and exit. Orders no position
//! claimed are summarized on their own afterwards.
//!
//! Output order is fixed: position rows in the order their ids first appear
//! in the segments, then unmatched orders in source order. Lookups use
//! `Vec`s in source order so identical inputs always produce identical rows.

use crate::domain::deal::DealRecord;
use crate::domain::order::OrderRecord;
use crate::domain::segment::SegmentRecord;
use crate::domain::summary::{LegFeatures, SummaryRecord};
use std::collections::HashSet;
use tracing::{debug, info};

pub const TIMEFRAME_5MIN: &str = "M5";
pub const TIMEFRAME_15MIN: &str = "M15";
pub const TIMEFRAME_30MIN: &str = "M30";

pub const STATUS_CANCELLED: &str = "取消";
pub const STATUS_EXPIRED: &str = "过期";
pub const STATUS_PROFIT: &str = "盈利";
pub const STATUS_LOSS: &str = "亏损";
pub const STATUS_BREAKEVEN: &str = "持平";

/// Two-place rounding with ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Outcome label for a position.
///
/// Cancellation beats expiry, and both beat the profit sign.
pub fn merge_status(entry: &str, exit: &str, profit: f64) -> &'static str {
    let entry = entry.to_lowercase();
    let exit = exit.to_lowercase();
    let either = |needles: &[&str]| {
        needles
            .iter()
            .any(|n| entry.contains(n) || exit.contains(n))
    };

    if either(&["cancel"]) {
        STATUS_CANCELLED
    } else if either(&["expired"]) {
        STATUS_EXPIRED
    } else if profit > 0.0 {
        STATUS_PROFIT
    } else if profit < 0.0 {
        STATUS_LOSS
    } else {
        STATUS_BREAKEVEN
    }
}

/// Right-segment counts per timeframe plus the first Right segment's length.
pub fn leg_features<'a>(segments: impl IntoIterator<Item = &'a SegmentRecord>) -> LegFeatures {
    let mut features = LegFeatures::default();
    let mut first: Option<&SegmentRecord> = None;

    for seg in segments.into_iter().filter(|s| s.is_right()) {
        match seg.timeframe.as_str() {
            TIMEFRAME_5MIN => features.right_5min += 1,
            TIMEFRAME_15MIN => features.right_15min += 1,
            TIMEFRAME_30MIN => features.right_30min += 1,
            _ => {}
        }
        // Strict `<` keeps the earliest row on equal indices.
        if first.is_none_or(|f| seg.segment_index < f.segment_index) {
            first = Some(seg);
        }
    }

    features.first_segment_length = first.map(|s| round2(s.length()));
    features
}

struct DealTotals<'a> {
    commission: f64,
    swap: f64,
    profit: f64,
    /// Last deal in extraction order.
    last: Option<&'a DealRecord>,
}

fn deal_totals<'a>(deals: &[&'a DealRecord]) -> DealTotals<'a> {
    DealTotals {
        commission: deals.iter().map(|d| d.commission).sum(),
        swap: deals.iter().map(|d| d.swap).sum(),
        profit: deals.iter().map(|d| d.profit).sum(),
        last: deals.last().copied(),
    }
}

fn distinct_in_order(values: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}

/// Builds the summary relation.
pub fn reconcile(
    orders: &[OrderRecord],
    deals: &[DealRecord],
    segments: &[SegmentRecord],
) -> Vec<SummaryRecord> {
    let position_ids =
        distinct_in_order(segments.iter().filter_map(|s| s.position_id).filter(|id| *id > 0));

    let mut processed: HashSet<i64> = HashSet::new();
    let mut summaries = Vec::with_capacity(orders.len());

    for position_id in &position_ids {
        let position_segments: Vec<&SegmentRecord> = segments
            .iter()
            .filter(|s| s.position_id == Some(*position_id))
            .collect();
        let tickets = distinct_in_order(position_segments.iter().map(|s| s.order_ticket));
        processed.extend(tickets.iter().copied());

        let mut position_orders: Vec<&OrderRecord> = orders
            .iter()
            .filter(|o| tickets.contains(&o.order_id))
            .collect();
        let position_deals: Vec<&DealRecord> = deals
            .iter()
            .filter(|d| tickets.contains(&d.order_id))
            .collect();

        // Stable: equal open times keep source order.
        position_orders.sort_by_key(|o| o.open_time);
        let Some(entry) = position_orders.first().copied() else {
            debug!(position_id, "position references no known order");
            continue;
        };
        if position_orders.len() > 2 {
            debug!(
                position_id,
                orders = position_orders.len(),
                "pairing only the two earliest orders"
            );
        }
        let exit = position_orders.get(1).copied();

        summaries.push(summarize_position(
            *position_id,
            entry,
            exit,
            &position_deals,
            &position_segments,
        ));
    }

    let positions = summaries.len();

    for order in orders.iter().filter(|o| !processed.contains(&o.order_id)) {
        let order_deals: Vec<&DealRecord> =
            deals.iter().filter(|d| d.order_id == order.order_id).collect();
        let order_segments = segments
            .iter()
            .filter(|s| s.order_ticket == order.order_id);
        summaries.push(summarize_unmatched(order, &order_deals, order_segments));
    }

    info!(
        positions,
        unmatched = summaries.len() - positions,
        "reconciled summary"
    );
    summaries
}

/// With no exit the entry closes itself for status and exit-leg features; the comment is not doubled.
fn summarize_position(
    position_id: i64,
    entry: &OrderRecord,
    exit: Option<&OrderRecord>,
    deals: &[&DealRecord],
    segments: &[&SegmentRecord],
) -> SummaryRecord {
    let totals = deal_totals(deals);
    // A single-order position closes on itself.
    let closing = exit.unwrap_or(entry);

    let comment = match exit {
        Some(exit) => format!("{} | {}", entry.comment, exit.comment),
        None => entry.comment.clone(),
    };

    let mut summary = SummaryRecord {
        order_id: closing.order_id,
        position_id: Some(position_id),
        symbol: entry.symbol.clone(),
        order_type: entry.order_type.clone(),
        volume: entry.volume,
        open_price: entry.price,
        close_price: Some(closing.price),
        stop_loss: entry.stop_loss,
        take_profit: entry.take_profit,
        open_time: entry.open_time,
        close_time: closing.time,
        status: merge_status(&entry.status, &closing.status, totals.profit).to_string(),
        commission: totals.commission,
        swap: totals.swap,
        profit: totals.profit,
        comment,
        both: LegFeatures::default(),
        entry: leg_features(
            segments
                .iter()
                .copied()
                .filter(|s| s.order_ticket == entry.order_id),
        ),
        exit: leg_features(
            segments
                .iter()
                .copied()
                .filter(|s| s.order_ticket == closing.order_id),
        ),
    };

    if let Some(last) = totals.last {
        summary.close_price = Some(last.price);
        summary.close_time = last.time;
        summary.comment = last.comment.clone();
    }
    summary
}

fn summarize_unmatched<'a>(
    order: &OrderRecord,
    deals: &[&DealRecord],
    segments: impl IntoIterator<Item = &'a SegmentRecord>,
) -> SummaryRecord {
    let totals = deal_totals(deals);

    let mut summary = SummaryRecord {
        order_id: order.order_id,
        position_id: None,
        symbol: order.symbol.clone(),
        order_type: order.order_type.clone(),
        volume: order.volume,
        open_price: order.price,
        close_price: None,
        stop_loss: order.stop_loss,
        take_profit: order.take_profit,
        open_time: order.open_time,
        close_time: order.time,
        status: merge_status(&order.status, &order.status, totals.profit).to_string(),
        commission: totals.commission,
        swap: totals.swap,
        profit: totals.profit,
        comment: order.comment.clone(),
        both: leg_features(segments),
        entry: LegFeatures::default(),
        exit: LegFeatures::default(),
    };

    if let Some(last) = totals.last {
        summary.close_price = Some(last.price);
        summary.close_time = last.time;
        summary.comment = last.comment.clone();
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::segment::SegmentSide;
    use crate::domain::tabular::Tabular;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn order(id: i64, open_hour: u32, price: f64) -> OrderRecord {
        OrderRecord {
            order_id: id,
            symbol: "EURUSD".into(),
            order_type: "buy".into(),
            volume: 0.1,
            price,
            stop_loss: 0.0,
            take_profit: 0.0,
            open_time: at(open_hour),
            time: Some(at(open_hour)),
            status: "filled".into(),
            comment: format!("c{id}"),
        }
    }

    fn deal(id: i64, order_id: i64, profit: f64, hour: u32) -> DealRecord {
        DealRecord {
            deal_id: id,
            order_id,
            symbol: "EURUSD".into(),
            deal_type: "sell".into(),
            direction: "out".into(),
            volume: 0.1,
            price: 1.2 + id as f64 / 100.0,
            commission: -0.35,
            swap: 0.0,
            profit,
            balance: 0.0,
            time: Some(at(hour)),
            comment: format!("d{id}"),
        }
    }

    fn segment(ticket: i64, position: Option<i64>, tf: &str, side: SegmentSide, index: i64, start: f64, end: f64) -> SegmentRecord {
        SegmentRecord {
            order_ticket: ticket,
            position_id: position,
            timeframe: tf.into(),
            segment_side: side,
            segment_index: index,
            start_price: start,
            end_price: end,
            ..Default::default()
        }
    }

    #[test]
    fn status_merge_follows_priority() {
        assert_eq!(merge_status("filled", "filled", 37.5), "盈利");
        assert_eq!(merge_status("filled", "filled", -4.0), "亏损");
        assert_eq!(merge_status("filled", "filled", 0.0), "持平");
        assert_eq!(merge_status("Canceled", "filled", 50.0), "取消");
        assert_eq!(merge_status("filled", "CANCELLED", -1.0), "取消");
        assert_eq!(merge_status("expired", "filled", 10.0), "过期");
        assert_eq!(merge_status("cancel", "expired", 0.0), "取消");
    }

    #[test]
    fn localized_status_words_do_not_override_profit_sign() {
        assert_eq!(merge_status("已取消", "filled", 3.0), STATUS_PROFIT);
        assert_eq!(merge_status("filled", "已过期", -2.0), STATUS_LOSS);
    }

    #[test]
    fn rounding_is_to_two_places() {
        assert_eq!(round2(0.0020), 0.0);
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(0.125 + 0.001), 0.13);
    }

    #[test]
    fn rounding_ties_go_to_even() {
        assert_eq!(round2((1.25f64 - 1.125).abs()), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(2.5), 2.5);
    }

    #[test]
    fn two_order_position_pairs_entry_and_exit() {
        let orders = vec![order(100, 10, 1.1000), order(101, 12, 1.1050)];
        let segments = vec![
            segment(100, Some(5), "M5", SegmentSide::Right, 0, 1.1000, 1.1020),
            segment(101, Some(5), "M5", SegmentSide::Right, 0, 1.1050, 1.1030),
        ];
        let out = reconcile(&orders, &[], &segments);
        assert_eq!(out.len(), 1);
        let s = &out[0];
        assert_eq!(s.position_id, Some(5));
        assert_eq!(s.order_id, 101);
        assert_eq!(s.open_time, at(10));
        assert_eq!(s.open_price, 1.1000);
        assert_eq!(s.close_price, Some(1.1050));
        assert_eq!(s.close_time, Some(at(12)));
        assert_eq!(s.entry.right_5min, 1);
        assert_eq!(s.exit.right_5min, 1);
        assert_eq!(s.entry.first_segment_length, Some(0.0));
        assert_eq!(s.exit.first_segment_length, Some(0.0));
        assert_eq!(s.comment, "c100 | c101");
        assert_eq!(s.status, "持平");
        assert_eq!(s.both, LegFeatures::default());
    }

    #[test]
    fn entry_is_earliest_by_open_time_not_source_order() {
        let orders = vec![order(201, 15, 1.3), order(200, 9, 1.2)];
        let segments = vec![
            segment(201, Some(8), "M15", SegmentSide::Right, 1, 1.0, 1.5),
            segment(200, Some(8), "M30", SegmentSide::Left, 0, 1.0, 2.0),
        ];
        let out = reconcile(&orders, &[], &segments);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].open_time, at(9));
        assert_eq!(out[0].order_id, 201);
        assert_eq!(out[0].entry, LegFeatures::default());
        assert_eq!(out[0].exit.right_15min, 1);
        assert_eq!(out[0].exit.first_segment_length, Some(0.5));
    }

    #[test]
    fn single_order_position_has_identical_legs() {
        let orders = vec![order(300, 10, 1.1)];
        let segments = vec![
            segment(300, Some(9), "M5", SegmentSide::Right, 2, 1.10, 1.20),
            segment(300, Some(9), "M15", SegmentSide::Right, 1, 1.10, 1.45),
            segment(300, Some(9), "M30", SegmentSide::Left, 0, 1.10, 1.00),
        ];
        let out = reconcile(&orders, &[deal(1, 300, 37.5, 11)], &segments);
        let s = &out[0];
        assert_eq!(s.entry, s.exit);
        assert_eq!(s.entry.right_5min, 1);
        assert_eq!(s.entry.right_15min, 1);
        assert_eq!(s.entry.right_30min, 0);
        assert_eq!(s.entry.first_segment_length, Some(0.35));
        assert_eq!(s.order_id, 300);
        assert_eq!(s.status, "盈利");
    }

    #[test]
    fn single_order_position_without_deals_closes_on_itself() {
        let mut only = order(300, 10, 1.1);
        only.status = "expired".into();
        let segments = vec![segment(300, Some(9), "M5", SegmentSide::Right, 0, 1.10, 1.20)];
        let s = &reconcile(&[only], &[], &segments)[0];
        assert_eq!(s.comment, "c300");
        assert_eq!(s.close_price, Some(1.1));
        assert_eq!(s.close_time, Some(at(10)));
        assert_eq!(s.status, STATUS_EXPIRED);
        assert_eq!(s.exit.right_5min, 1);
    }

    #[test]
    fn deals_sum_and_last_deal_closes() {
        let orders = vec![order(100, 10, 1.1), order(101, 12, 1.2)];
        let deals = vec![deal(7, 100, -2.0, 10), deal(8, 101, 6.0, 12), deal(9, 999, 100.0, 13)];
        let segments = vec![
            segment(100, Some(1), "M5", SegmentSide::Left, 0, 0.0, 0.0),
            segment(101, Some(1), "M5", SegmentSide::Left, 0, 0.0, 0.0),
        ];
        let out = reconcile(&orders, &deals, &segments);
        let s = &out[0];
        assert_relative_eq!(s.profit, 4.0);
        assert_relative_eq!(s.commission, -0.70);
        assert_eq!(s.close_price, Some(deals[1].price));
        assert_eq!(s.close_time, Some(at(12)));
        assert_eq!(s.comment, "d8");
        assert_eq!(s.status, "盈利");
    }

    #[test]
    fn position_without_orders_emits_nothing() {
        let segments = vec![segment(555, Some(3), "M5", SegmentSide::Right, 0, 1.0, 2.0)];
        assert!(reconcile(&[], &[], &segments).is_empty());
    }

    #[test]
    fn only_first_two_orders_are_paired() {
        let orders = vec![order(1, 8, 1.0), order(2, 9, 2.0), order(3, 10, 3.0)];
        let segments: Vec<_> = [1, 2, 3]
            .into_iter()
            .map(|t| segment(t, Some(4), "M5", SegmentSide::Right, 0, 0.0, 0.0))
            .collect();
        let out = reconcile(&orders, &[], &segments);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].order_id, 2);
    }

    #[test]
    fn unmatched_orders_follow_positions_in_source_order() {
        let orders = vec![order(10, 10, 1.0), order(11, 11, 1.0), order(12, 12, 1.0)];
        let deals = vec![deal(1, 12, -4.0, 13)];
        let segments = vec![
            segment(11, Some(2), "M5", SegmentSide::Right, 0, 1.0, 1.0),
            segment(12, None, "M30", SegmentSide::Right, 3, 1.0, 1.256),
            segment(12, Some(0), "M30", SegmentSide::Right, 1, 1.0, 1.5),
        ];
        let out = reconcile(&orders, &deals, &segments);
        let ids: Vec<(i64, Option<i64>)> = out.iter().map(|s| (s.order_id, s.position_id)).collect();
        assert_eq!(ids, vec![(11, Some(2)), (10, None), (12, None)]);

        let plain = &out[1];
        assert_eq!(plain.close_price, None);
        assert_eq!(plain.close_time, Some(at(10)));
        assert_eq!(plain.status, "持平");
        assert_eq!(plain.comment, "c10");

        let with_deal = &out[2];
        assert_eq!(with_deal.status, "亏损");
        assert_eq!(with_deal.close_time, Some(at(13)));
        assert_eq!(with_deal.comment, "d1");
        assert_eq!(with_deal.both.right_30min, 2);
        assert_eq!(with_deal.both.first_segment_length, Some(0.5));
        assert_eq!(with_deal.entry, LegFeatures::default());
    }

    #[test]
    fn reconciliation_is_idempotent() {
        let orders = vec![order(100, 10, 1.1), order(101, 12, 1.2), order(102, 14, 1.3)];
        let deals = vec![deal(1, 100, 1.0, 10), deal(2, 101, 2.5, 12)];
        let segments = vec![
            segment(100, Some(5), "M5", SegmentSide::Right, 0, 1.0, 1.1),
            segment(101, Some(5), "M15", SegmentSide::Right, 0, 1.0, 1.2),
        ];
        let render = |rows: Vec<SummaryRecord>| -> Vec<Vec<String>> {
            rows.iter().map(|r| r.row()).collect()
        };
        let first = render(reconcile(&orders, &deals, &segments));
        let second = render(reconcile(&orders, &deals, &segments));
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn first_segment_prefers_smallest_index_then_earliest_row() {
        let segs = [
            segment(1, None, "M5", SegmentSide::Right, 2, 0.0, 9.0),
            segment(1, None, "M5", SegmentSide::Right, 1, 0.0, 1.0),
            segment(1, None, "M5", SegmentSide::Right, 1, 0.0, 2.0),
            segment(1, None, "M5", SegmentSide::Left, 0, 0.0, 5.0),
        ];
        let f = leg_features(segs.iter());
        assert_eq!(f.right_5min, 3);
        assert_eq!(f.first_segment_length, Some(1.0));
    }

    #[test]
    fn leg_without_right_segments_has_no_length() {
        let segs = [segment(1, None, "H1", SegmentSide::Left, 0, 0.0, 1.0)];
        assert_eq!(leg_features(segs.iter()), LegFeatures::default());
    }
}
