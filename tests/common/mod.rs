#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use reportrecon::domain::deal::DealRecord;
use reportrecon::domain::extractor::NormalizeContext;
use reportrecon::domain::grid::{Cell, Grid};
use reportrecon::domain::order::OrderRecord;
use reportrecon::domain::segment::{SegmentRecord, SegmentSide};
use std::fs;
use std::path::{Path, PathBuf};

/// Chinese-locale tester report with a blank separator row between sections.
pub const ZH_REPORT: &str = "\
策略测试报告,,
订单,,
开价时间,订单,交易品种,类型,交易量,价格,止损,止盈,时间,状态,注释
2024.01.01 10:00:00,100,EURUSD,buy,0.10 / 0.10,1.1000,,,2024.01.01 10:00:01,filled,
2024.01.01 12:00:00,101,EURUSD,sell,0.10 / 0.10,1.1050,,,2024.01.01 12:00:01,filled,tp
2024.01.01 13:00:00,102,EURUSD,buy limit,0.10 / 0,1.0900,,,2024.01.01 14:00:00,canceled,
,,,,,,,,,,
成交,,
时间,成交,交易品种,类型,方向,交易量,价格,订单,手续费,库存费,利润,余额,注释
2024.01.01 10:00:01,2,EURUSD,buy,in,0.1,1.1000,100,-0.35,0,0,9 999.65,
2024.01.01 12:00:01,3,EURUSD,sell,out,0.1,1.1050,101,-0.35,0,50,10 049.30,tp
";

/// Same trades as [`ZH_REPORT`] with English labels.
pub const EN_REPORT: &str = "\
Strategy Tester Report
Orders
Open Time,Order,Symbol,Type,Volume,Price,S / L,T / P,Time,State,Comment
2024.01.01 10:00:00,100,EURUSD,buy,0.10 / 0.10,1.1000,,,2024.01.01 10:00:01,filled,
2024.01.01 12:00:00,101,EURUSD,sell,0.10 / 0.10,1.1050,,,2024.01.01 12:00:01,filled,tp
2024.01.01 13:00:00,102,EURUSD,buy limit,0.10 / 0,1.0900,,,2024.01.01 14:00:00,canceled,
,,,,,,,,,,
Deals
Time,Deal,Symbol,Type,Direction,Volume,Price,Order,Commission,Swap,Profit,Balance,Comment
2024.01.01 10:00:01,2,EURUSD,buy,in,0.1,1.1000,100,-0.35,0,0,9 999.65,
2024.01.01 12:00:01,3,EURUSD,sell,out,0.1,1.1050,101,-0.35,0,50,10 049.30,tp
";

/// Segment export linking orders 100 and 101 as position 5.
pub const SEGMENTS: &str = "\
TradeTime;OrderTicket;PositionId;ReferencePrice;ReferenceTime;ReferenceBarIndex;Timeframe;SegmentSide;SegmentIndex;StartPrice;EndPrice;Amplitude;Direction
2024.01.01 10:00:00;100;5;1.1;2024.01.01 09:55:00;12;M5;Right;1;1.1000;1.1200;200;Up
2024.01.01 10:00:00;100;5;1.1;2024.01.01 09:55:00;12;M5;Right;0;1.1000;1.1500;500;Up
2024.01.01 10:00:00;100;5;1.1;2024.01.01 09:55:00;12;M15;Left;0;1.0950;1.1000;50;Up
2024.01.01 12:00:00;101;5;1.105;2024.01.01 11:30:00;40;M30;Right;0;1.1050;1.0850;200;Down
";

pub const SQLITE_INI: &str = "\
[store]
backend = sqlite
path = {db}

[extract]
header_mode = flexible
";

pub fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

pub fn ctx() -> NormalizeContext {
    NormalizeContext {
        fallback_time: NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    }
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// INI text for a sqlite store at `db`.
pub fn sqlite_ini(db: &Path) -> String {
    SQLITE_INI.replace("{db}", &db.display().to_string())
}

pub fn text_row(cells: &[&str]) -> Vec<Cell> {
    cells
        .iter()
        .map(|c| if c.is_empty() { Cell::Empty } else { Cell::from(*c) })
        .collect()
}

pub fn grid(rows: &[&[&str]]) -> Grid {
    Grid::new(rows.iter().map(|r| text_row(r)).collect())
}

pub fn order(id: i64, open_time: NaiveDateTime) -> OrderRecord {
    OrderRecord {
        order_id: id,
        symbol: "EURUSD".into(),
        order_type: "buy".into(),
        volume: 0.1,
        price: 1.1,
        stop_loss: 0.0,
        take_profit: 0.0,
        open_time,
        time: None,
        status: "filled".into(),
        comment: String::new(),
    }
}

pub fn deal(id: i64, order_id: i64, profit: f64, time: NaiveDateTime) -> DealRecord {
    DealRecord {
        deal_id: id,
        order_id,
        symbol: "EURUSD".into(),
        deal_type: "buy".into(),
        direction: "in".into(),
        volume: 0.1,
        price: 1.1,
        commission: -0.35,
        swap: 0.0,
        profit,
        balance: 10_000.0,
        time: Some(time),
        comment: String::new(),
    }
}

pub fn segment(
    ticket: i64,
    position: Option<i64>,
    timeframe: &str,
    side: SegmentSide,
    index: i64,
    start: f64,
    end: f64,
) -> SegmentRecord {
    SegmentRecord {
        order_ticket: ticket,
        position_id: position,
        timeframe: timeframe.into(),
        segment_side: side,
        segment_index: index,
        start_price: start,
        end_price: end,
        ..Default::default()
    }
}
