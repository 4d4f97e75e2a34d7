//! SQLite store adapter.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` text. Loads return rows in
//! first-insertion order; an upsert keeps the row's original position. Each operation takes
//! a pooled connection for its own duration only.

use crate::domain::coerce::parse_timestamp;
use crate::domain::deal::DealRecord;
use crate::domain::error::ReconError;
use crate::domain::order::OrderRecord;
use crate::domain::segment::{SegmentRecord, SegmentSide};
use crate::domain::settings::StoreSettings;
use crate::domain::summary::{LegFeatures, SummaryRecord};
use crate::domain::tabular::TIMESTAMP_OUTPUT_FORMAT;
use crate::ports::store_port::StorePort;
use chrono::NaiveDateTime;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{Row, params};
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS orders (
    order_id INTEGER NOT NULL UNIQUE,
    symbol TEXT NOT NULL,
    type TEXT NOT NULL,
    volume REAL NOT NULL,
    price REAL NOT NULL,
    sl REAL NOT NULL,
    tp REAL NOT NULL,
    open_time TEXT NOT NULL,
    time TEXT,
    status TEXT NOT NULL,
    comment TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS deals (
    deal_id INTEGER NOT NULL UNIQUE,
    order_id INTEGER NOT NULL,
    symbol TEXT NOT NULL,
    type TEXT NOT NULL,
    direction TEXT NOT NULL,
    volume REAL NOT NULL,
    price REAL NOT NULL,
    commission REAL NOT NULL,
    swap REAL NOT NULL,
    profit REAL NOT NULL,
    balance REAL NOT NULL,
    deal_time TEXT,
    comment TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_deals_order_id ON deals(order_id);
CREATE TABLE IF NOT EXISTS segments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    trade_time TEXT,
    order_ticket INTEGER NOT NULL,
    position_id INTEGER,
    reference_price REAL NOT NULL,
    reference_time TEXT,
    reference_bar_index INTEGER NOT NULL,
    timeframe TEXT NOT NULL,
    segment_side TEXT NOT NULL,
    segment_index INTEGER NOT NULL,
    start_price REAL NOT NULL,
    end_price REAL NOT NULL,
    amplitude REAL NOT NULL,
    direction TEXT NOT NULL,
    trade_action TEXT,
    trade_price REAL,
    trade_volume REAL,
    trade_comment TEXT,
    trade_status TEXT
);
CREATE INDEX IF NOT EXISTS idx_segments_ticket ON segments(order_ticket);
CREATE INDEX IF NOT EXISTS idx_segments_position ON segments(position_id);
CREATE TABLE IF NOT EXISTS trade_summary (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id INTEGER NOT NULL,
    position_id INTEGER,
    symbol TEXT NOT NULL,
    order_type TEXT NOT NULL,
    volume REAL NOT NULL,
    open_price REAL NOT NULL,
    close_price REAL,
    sl REAL NOT NULL,
    tp REAL NOT NULL,
    open_time TEXT NOT NULL,
    close_time TEXT,
    status TEXT NOT NULL,
    commission REAL NOT NULL,
    swap REAL NOT NULL,
    profit REAL NOT NULL,
    comment TEXT NOT NULL,
    right_segments_5min INTEGER NOT NULL,
    right_segments_15min INTEGER NOT NULL,
    right_segments_30min INTEGER NOT NULL,
    first_segment_length REAL,
    entry_right_segments_5min INTEGER NOT NULL,
    entry_right_segments_15min INTEGER NOT NULL,
    entry_right_segments_30min INTEGER NOT NULL,
    exit_right_segments_5min INTEGER NOT NULL,
    exit_right_segments_15min INTEGER NOT NULL,
    exit_right_segments_30min INTEGER NOT NULL,
    entry_first_segment_length REAL,
    exit_first_segment_length REAL
);";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn db_err(e: r2d2::Error) -> ReconError {
    ReconError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> ReconError {
    ReconError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn sql_ts(value: Option<NaiveDateTime>) -> Option<String> {
    value.map(|dt| dt.format(TIMESTAMP_OUTPUT_FORMAT).to_string())
}

fn read_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    let text: Option<String> = row.get(idx)?;
    match text {
        None => Ok(None),
        Some(s) => parse_timestamp(&s).map(Some).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                Box::new(std::io::Error::other(format!("bad timestamp '{s}'"))),
            )
        }),
    }
}

fn read_required_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    read_ts(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "timestamp".to_string(),
        Type::Null,
    ))
}

impl SqliteAdapter {
    pub fn from_settings(settings: &StoreSettings) -> Result<Self, ReconError> {
        let db_path = settings
            .path
            .as_ref()
            .ok_or_else(|| ReconError::ConfigMissing {
                section: "store".into(),
                key: "path".into(),
            })?;

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(settings.pool_size)
            .build(manager)
            .map_err(db_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, ReconError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(db_err)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, ReconError> {
        self.pool.get().map_err(db_err)
    }

    /// Runs `insert` for every item inside one transaction after an optional
    /// clear of `table`.
    fn write_all<T>(
        &self,
        table: &str,
        clear_first: bool,
        items: &[T],
        sql: &str,
        bind: impl Fn(&mut rusqlite::Statement<'_>, &T) -> rusqlite::Result<usize>,
    ) -> Result<usize, ReconError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        if clear_first {
            tx.execute(&format!("DELETE FROM {table}"), [])
                .map_err(query_err)?;
        }
        {
            let mut stmt = tx.prepare(sql).map_err(query_err)?;
            for item in items {
                bind(&mut stmt, item).map_err(query_err)?;
            }
        }
        tx.commit().map_err(query_err)?;
        info!(table, rows = items.len(), replaced = clear_first, "stored rows");
        Ok(items.len())
    }

    fn load<T>(
        &self,
        sql: &str,
        map: impl Fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, ReconError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(query_err)?;
        let rows = stmt
            .query_map([], |row| map(row))
            .map_err(query_err)?
            .collect::<rusqlite::Result<Vec<T>>>()
            .map_err(query_err)?;
        debug!(rows = rows.len(), "loaded rows");
        Ok(rows)
    }
}

impl StorePort for SqliteAdapter {
    fn initialize_schema(&self) -> Result<(), ReconError> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA).map_err(query_err)?;
        Ok(())
    }

    fn upsert_orders(&self, orders: &[OrderRecord]) -> Result<usize, ReconError> {
        self.write_all(
            "orders",
            false,
            orders,
            "INSERT INTO orders (order_id, symbol, type, volume, price, sl, tp, open_time, time, status, comment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(order_id) DO UPDATE SET
                symbol = excluded.symbol, type = excluded.type, volume = excluded.volume,
                price = excluded.price, sl = excluded.sl, tp = excluded.tp,
                open_time = excluded.open_time, time = excluded.time,
                status = excluded.status, comment = excluded.comment",
            |stmt, o| {
                stmt.execute(params![
                    o.order_id,
                    o.symbol,
                    o.order_type,
                    o.volume,
                    o.price,
                    o.stop_loss,
                    o.take_profit,
                    sql_ts(Some(o.open_time)),
                    sql_ts(o.time),
                    o.status,
                    o.comment
                ])
            },
        )
    }

    fn upsert_deals(&self, deals: &[DealRecord]) -> Result<usize, ReconError> {
        self.write_all(
            "deals",
            false,
            deals,
            "INSERT INTO deals (deal_id, order_id, symbol, type, direction, volume, price,
                                commission, swap, profit, balance, deal_time, comment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(deal_id) DO UPDATE SET
                order_id = excluded.order_id, symbol = excluded.symbol, type = excluded.type,
                direction = excluded.direction, volume = excluded.volume, price = excluded.price,
                commission = excluded.commission, swap = excluded.swap, profit = excluded.profit,
                balance = excluded.balance, deal_time = excluded.deal_time,
                comment = excluded.comment",
            |stmt, d| {
                stmt.execute(params![
                    d.deal_id,
                    d.order_id,
                    d.symbol,
                    d.deal_type,
                    d.direction,
                    d.volume,
                    d.price,
                    d.commission,
                    d.swap,
                    d.profit,
                    d.balance,
                    sql_ts(d.time),
                    d.comment
                ])
            },
        )
    }

    fn replace_segments(&self, segments: &[SegmentRecord]) -> Result<usize, ReconError> {
        self.write_all(
            "segments",
            true,
            segments,
            "INSERT INTO segments (trade_time, order_ticket, position_id, reference_price,
                                   reference_time, reference_bar_index, timeframe, segment_side,
                                   segment_index, start_price, end_price, amplitude, direction,
                                   trade_action, trade_price, trade_volume, trade_comment, trade_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            |stmt, s| {
                stmt.execute(params![
                    sql_ts(s.trade_time),
                    s.order_ticket,
                    s.position_id,
                    s.reference_price,
                    sql_ts(s.reference_time),
                    s.reference_bar_index,
                    s.timeframe,
                    s.segment_side.as_str(),
                    s.segment_index,
                    s.start_price,
                    s.end_price,
                    s.amplitude,
                    s.direction,
                    s.trade_action,
                    s.trade_price,
                    s.trade_volume,
                    s.trade_comment,
                    s.trade_status
                ])
            },
        )
    }

    fn replace_summary(&self, summary: &[SummaryRecord]) -> Result<usize, ReconError> {
        self.write_all(
            "trade_summary",
            true,
            summary,
            "INSERT INTO trade_summary (order_id, position_id, symbol, order_type, volume,
                open_price, close_price, sl, tp, open_time, close_time, status, commission, swap,
                profit, comment, right_segments_5min, right_segments_15min, right_segments_30min,
                first_segment_length, entry_right_segments_5min, entry_right_segments_15min,
                entry_right_segments_30min, exit_right_segments_5min, exit_right_segments_15min,
                exit_right_segments_30min, entry_first_segment_length, exit_first_segment_length)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                     ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28)",
            |stmt, s| {
                stmt.execute(params![
                    s.order_id,
                    s.position_id,
                    s.symbol,
                    s.order_type,
                    s.volume,
                    s.open_price,
                    s.close_price,
                    s.stop_loss,
                    s.take_profit,
                    sql_ts(Some(s.open_time)),
                    sql_ts(s.close_time),
                    s.status,
                    s.commission,
                    s.swap,
                    s.profit,
                    s.comment,
                    s.both.right_5min,
                    s.both.right_15min,
                    s.both.right_30min,
                    s.both.first_segment_length,
                    s.entry.right_5min,
                    s.entry.right_15min,
                    s.entry.right_30min,
                    s.exit.right_5min,
                    s.exit.right_15min,
                    s.exit.right_30min,
                    s.entry.first_segment_length,
                    s.exit.first_segment_length
                ])
            },
        )
    }

    fn load_orders(&self) -> Result<Vec<OrderRecord>, ReconError> {
        self.load(
            "SELECT order_id, symbol, type, volume, price, sl, tp, open_time, time, status, comment
             FROM orders ORDER BY rowid",
            |row| {
                Ok(OrderRecord {
                    order_id: row.get(0)?,
                    symbol: row.get(1)?,
                    order_type: row.get(2)?,
                    volume: row.get(3)?,
                    price: row.get(4)?,
                    stop_loss: row.get(5)?,
                    take_profit: row.get(6)?,
                    open_time: read_required_ts(row, 7)?,
                    time: read_ts(row, 8)?,
                    status: row.get(9)?,
                    comment: row.get(10)?,
                })
            },
        )
    }

    fn load_deals(&self) -> Result<Vec<DealRecord>, ReconError> {
        self.load(
            "SELECT deal_id, order_id, symbol, type, direction, volume, price, commission, swap,
                    profit, balance, deal_time, comment
             FROM deals ORDER BY rowid",
            |row| {
                Ok(DealRecord {
                    deal_id: row.get(0)?,
                    order_id: row.get(1)?,
                    symbol: row.get(2)?,
                    deal_type: row.get(3)?,
                    direction: row.get(4)?,
                    volume: row.get(5)?,
                    price: row.get(6)?,
                    commission: row.get(7)?,
                    swap: row.get(8)?,
                    profit: row.get(9)?,
                    balance: row.get(10)?,
                    time: read_ts(row, 11)?,
                    comment: row.get(12)?,
                })
            },
        )
    }

    fn load_segments(&self) -> Result<Vec<SegmentRecord>, ReconError> {
        self.load(
            "SELECT trade_time, order_ticket, position_id, reference_price, reference_time,
                    reference_bar_index, timeframe, segment_side, segment_index, start_price,
                    end_price, amplitude, direction, trade_action, trade_price, trade_volume,
                    trade_comment, trade_status
             FROM segments ORDER BY id",
            |row| {
                let side: String = row.get(7)?;
                Ok(SegmentRecord {
                    trade_time: read_ts(row, 0)?,
                    order_ticket: row.get(1)?,
                    position_id: row.get(2)?,
                    reference_price: row.get(3)?,
                    reference_time: read_ts(row, 4)?,
                    reference_bar_index: row.get(5)?,
                    timeframe: row.get(6)?,
                    segment_side: SegmentSide::parse(&side),
                    segment_index: row.get(8)?,
                    start_price: row.get(9)?,
                    end_price: row.get(10)?,
                    amplitude: row.get(11)?,
                    direction: row.get(12)?,
                    trade_action: row.get(13)?,
                    trade_price: row.get(14)?,
                    trade_volume: row.get(15)?,
                    trade_comment: row.get(16)?,
                    trade_status: row.get(17)?,
                })
            },
        )
    }

    fn load_summary(&self) -> Result<Vec<SummaryRecord>, ReconError> {
        self.load(
            "SELECT order_id, position_id, symbol, order_type, volume, open_price, close_price,
                    sl, tp, open_time, close_time, status, commission, swap, profit, comment,
                    right_segments_5min, right_segments_15min, right_segments_30min,
                    first_segment_length, entry_right_segments_5min, entry_right_segments_15min,
                    entry_right_segments_30min, exit_right_segments_5min,
                    exit_right_segments_15min, exit_right_segments_30min,
                    entry_first_segment_length, exit_first_segment_length
             FROM trade_summary ORDER BY id",
            |row| {
                Ok(SummaryRecord {
                    order_id: row.get(0)?,
                    position_id: row.get(1)?,
                    symbol: row.get(2)?,
                    order_type: row.get(3)?,
                    volume: row.get(4)?,
                    open_price: row.get(5)?,
                    close_price: row.get(6)?,
                    stop_loss: row.get(7)?,
                    take_profit: row.get(8)?,
                    open_time: read_required_ts(row, 9)?,
                    close_time: read_ts(row, 10)?,
                    status: row.get(11)?,
                    commission: row.get(12)?,
                    swap: row.get(13)?,
                    profit: row.get(14)?,
                    comment: row.get(15)?,
                    both: LegFeatures {
                        right_5min: row.get(16)?,
                        right_15min: row.get(17)?,
                        right_30min: row.get(18)?,
                        first_segment_length: row.get(19)?,
                    },
                    entry: LegFeatures {
                        right_5min: row.get(20)?,
                        right_15min: row.get(21)?,
                        right_30min: row.get(22)?,
                        first_segment_length: row.get(26)?,
                    },
                    exit: LegFeatures {
                        right_5min: row.get(23)?,
                        right_15min: row.get(24)?,
                        right_30min: row.get(25)?,
                        first_segment_length: row.get(27)?,
                    },
                })
            },
        )
    }
}
