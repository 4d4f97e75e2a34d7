//! End-to-end extraction and reconciliation over file adapters, no store.

mod common;

use approx::assert_relative_eq;
use common::*;
use reportrecon::adapters::csv_grid_adapter::CsvGridAdapter;
use reportrecon::adapters::csv_segment_adapter::CsvSegmentAdapter;
use reportrecon::adapters::csv_sink_adapter::CsvSinkAdapter;
use reportrecon::domain::header_locator::HeaderPolicy;
use reportrecon::domain::reconcile::{STATUS_CANCELLED, STATUS_PROFIT, reconcile};
use reportrecon::domain::report::extract_report;
use reportrecon::domain::segment::SegmentSide;
use reportrecon::domain::settings::ExtractSettings;
use reportrecon::domain::summary::SummaryRecord;
use reportrecon::domain::tabular::Tabular;
use reportrecon::ports::grid_port::GridPort;
use reportrecon::ports::segment_port::SegmentPort;
use reportrecon::ports::sink_port::write_relation;
use tempfile::TempDir;

fn summarize(report: &str, policy: HeaderPolicy) -> Vec<SummaryRecord> {
    let grid = CsvGridAdapter::new(b',').parse(report, "report.csv").unwrap();
    let settings = ExtractSettings {
        policy,
        ..ExtractSettings::default()
    };
    let extraction = extract_report(&grid, &settings, &ctx());
    let segments = CsvSegmentAdapter::new(b';')
        .parse(SEGMENTS, "segments.csv")
        .unwrap();
    reconcile(extraction.orders(), extraction.deals(), &segments.records)
}

mod extraction {
    use super::*;

    #[test]
    fn chinese_report_extracts_both_tables() {
        let grid = CsvGridAdapter::new(b',').parse(ZH_REPORT, "zh.csv").unwrap();
        let out = extract_report(&grid, &ExtractSettings::default(), &ctx());

        let ids: Vec<i64> = out.orders().iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![100, 101, 102]);
        assert_eq!(out.deals().len(), 2);
        assert_eq!(out.warnings().count(), 0);

        let first = &out.orders()[0];
        assert_relative_eq!(first.volume, 0.1);
        assert_eq!(first.open_time, ts(10, 0, 0));
        assert_eq!(first.time, Some(ts(10, 0, 1)));

        let closing = &out.deals()[1];
        assert_eq!(closing.order_id, 101);
        assert_relative_eq!(closing.balance, 10_049.30);
        assert_eq!(closing.comment, "tp");
    }

    #[test]
    fn english_report_matches_chinese_report() {
        let zh = CsvGridAdapter::new(b',').parse(ZH_REPORT, "zh.csv").unwrap();
        let en = CsvGridAdapter::new(b',').parse(EN_REPORT, "en.csv").unwrap();
        for policy in [HeaderPolicy::Flexible, HeaderPolicy::StrictPair] {
            let settings = ExtractSettings {
                policy,
                ..ExtractSettings::default()
            };
            let zh_out = extract_report(&zh, &settings, &ctx());
            let en_out = extract_report(&en, &settings, &ctx());
            assert_eq!(zh_out.orders(), en_out.orders(), "{policy:?}");
            assert_eq!(zh_out.deals(), en_out.deals(), "{policy:?}");
        }
    }

    #[test]
    fn blank_separator_row_yields_no_record() {
        let grid = CsvGridAdapter::new(b',').parse(ZH_REPORT, "zh.csv").unwrap();
        let out = extract_report(&grid, &ExtractSettings::default(), &ctx());
        assert!(out.orders().iter().all(|o| o.order_id > 0));
        assert_eq!(out.orders().len(), 3);
    }

    #[test]
    fn order_without_open_time_gets_fallback() {
        let report = grid(&[
            &["订单"],
            &["开价时间", "订单", "交易品种", "类型", "交易量", "价格", "时间", "状态"],
            &["", "7", "EURUSD", "buy", "0.1", "1.1", "", "placed"],
        ]);
        let out = extract_report(&report, &ExtractSettings::default(), &ctx());
        assert_eq!(out.orders()[0].open_time, ctx().fallback_time);
        assert_eq!(out.warnings().count(), 1);
    }
}

mod reconciliation {
    use super::*;

    #[test]
    fn position_and_unmatched_rows_from_files() {
        let summary = summarize(ZH_REPORT, HeaderPolicy::Flexible);
        assert_eq!(summary.len(), 2);

        let position = &summary[0];
        assert_eq!(position.order_id, 101);
        assert_eq!(position.position_id, Some(5));
        assert_eq!(position.order_type, "buy");
        assert_relative_eq!(position.open_price, 1.1);
        assert_relative_eq!(position.close_price.unwrap(), 1.105);
        assert_eq!(position.close_time, Some(ts(12, 0, 1)));
        assert_relative_eq!(position.commission, -0.7);
        assert_relative_eq!(position.profit, 50.0);
        assert_eq!(position.status, STATUS_PROFIT);
        assert_eq!(position.comment, "tp");

        assert_eq!(position.entry.right_5min, 2);
        assert_eq!(position.entry.right_15min, 0);
        assert_relative_eq!(position.entry.first_segment_length.unwrap(), 0.05);
        assert_eq!(position.exit.right_30min, 1);
        assert_relative_eq!(position.exit.first_segment_length.unwrap(), 0.02);
        assert_eq!(position.both.right_5min, 0);

        let cancelled = &summary[1];
        assert_eq!(cancelled.order_id, 102);
        assert_eq!(cancelled.position_id, None);
        assert_eq!(cancelled.status, STATUS_CANCELLED);
        assert_eq!(cancelled.close_price, None);
        assert_eq!(cancelled.close_time, Some(ts(14, 0, 0)));
    }

    #[test]
    fn both_dialects_reconcile_identically() {
        let zh = summarize(ZH_REPORT, HeaderPolicy::StrictPair);
        let en = summarize(EN_REPORT, HeaderPolicy::StrictPair);
        assert_eq!(zh, en);
    }

    #[test]
    fn unmatched_order_takes_its_own_segments_as_both() {
        let orders = vec![order(9, ts(9, 0, 0))];
        let segments = vec![
            segment(9, None, "M15", SegmentSide::Right, 3, 1.0, 1.25),
            segment(9, None, "M15", SegmentSide::Left, 0, 1.0, 2.0),
        ];
        let summary = reconcile(&orders, &[], &segments);
        assert_eq!(summary[0].both.right_15min, 1);
        assert_relative_eq!(summary[0].both.first_segment_length.unwrap(), 0.25);
    }
}

mod output {
    use super::*;

    #[test]
    fn summary_csv_has_canonical_columns() {
        let dir = TempDir::new().unwrap();
        let sink = CsvSinkAdapter::new(dir.path().to_path_buf());
        let summary = summarize(ZH_REPORT, HeaderPolicy::Flexible);
        let path = write_relation(&sink, &summary).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let mut rdr = csv::Reader::from_reader(&bytes[3..]);
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, SummaryRecord::columns());
        assert_eq!(rdr.records().count(), summary.len());
    }

    #[test]
    fn segment_file_read_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "segments.csv", SEGMENTS);
        let batch = CsvSegmentAdapter::new(b';').read_segments(&path).unwrap();
        assert_eq!(batch.records.len(), 4);
        assert_eq!(batch.records[3].segment_side, SegmentSide::Right);
    }

    #[test]
    fn report_file_read_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "report.csv", EN_REPORT);
        let grid = CsvGridAdapter::new(b',').read_grid(&path).unwrap();
        assert_eq!(grid.row_count(), 11);
    }
}
