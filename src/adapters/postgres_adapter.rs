//! PostgreSQL store adapter.

use crate::domain::deal::DealRecord;
use crate::domain::error::ReconError;
use crate::domain::order::OrderRecord;
use crate::domain::segment::{SegmentRecord, SegmentSide};
use crate::domain::settings::StoreSettings;
use crate::domain::summary::{LegFeatures, SummaryRecord};
use crate::ports::store_port::StorePort;
use postgres::types::ToSql;
use postgres::{NoTls, Row, Transaction};
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use tracing::{debug, info};

type Manager = PostgresConnectionManager<NoTls>;
type Params<'a> = Vec<&'a (dyn ToSql + Sync)>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS orders (
    order_id BIGINT PRIMARY KEY,
    seq BIGSERIAL,
    symbol TEXT NOT NULL,
    type TEXT NOT NULL,
    volume DOUBLE PRECISION NOT NULL,
    price DOUBLE PRECISION NOT NULL,
    sl DOUBLE PRECISION NOT NULL,
    tp DOUBLE PRECISION NOT NULL,
    open_time TIMESTAMP NOT NULL,
    time TIMESTAMP,
    status TEXT NOT NULL,
    comment TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS deals (
    deal_id BIGINT PRIMARY KEY,
    seq BIGSERIAL,
    order_id BIGINT NOT NULL,
    symbol TEXT NOT NULL,
    type TEXT NOT NULL,
    direction TEXT NOT NULL,
    volume DOUBLE PRECISION NOT NULL,
    price DOUBLE PRECISION NOT NULL,
    commission DOUBLE PRECISION NOT NULL,
    swap DOUBLE PRECISION NOT NULL,
    profit DOUBLE PRECISION NOT NULL,
    balance DOUBLE PRECISION NOT NULL,
    deal_time TIMESTAMP,
    comment TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_deals_order_id ON deals(order_id);
CREATE TABLE IF NOT EXISTS segments (
    id BIGSERIAL PRIMARY KEY,
    trade_time TIMESTAMP,
    order_ticket BIGINT NOT NULL,
    position_id BIGINT,
    reference_price DOUBLE PRECISION NOT NULL,
    reference_time TIMESTAMP,
    reference_bar_index BIGINT NOT NULL,
    timeframe TEXT NOT NULL,
    segment_side TEXT NOT NULL,
    segment_index BIGINT NOT NULL,
    start_price DOUBLE PRECISION NOT NULL,
    end_price DOUBLE PRECISION NOT NULL,
    amplitude DOUBLE PRECISION NOT NULL,
    direction TEXT NOT NULL,
    trade_action TEXT,
    trade_price DOUBLE PRECISION,
    trade_volume DOUBLE PRECISION,
    trade_comment TEXT,
    trade_status TEXT
);
CREATE INDEX IF NOT EXISTS idx_segments_ticket ON segments(order_ticket);
CREATE TABLE IF NOT EXISTS trade_summary (
    id BIGSERIAL PRIMARY KEY,
    order_id BIGINT NOT NULL,
    position_id BIGINT,
    symbol TEXT NOT NULL,
    order_type TEXT NOT NULL,
    volume DOUBLE PRECISION NOT NULL,
    open_price DOUBLE PRECISION NOT NULL,
    close_price DOUBLE PRECISION,
    sl DOUBLE PRECISION NOT NULL,
    tp DOUBLE PRECISION NOT NULL,
    open_time TIMESTAMP NOT NULL,
    close_time TIMESTAMP,
    status TEXT NOT NULL,
    commission DOUBLE PRECISION NOT NULL,
    swap DOUBLE PRECISION NOT NULL,
    profit DOUBLE PRECISION NOT NULL,
    comment TEXT NOT NULL,
    right_segments_5min BIGINT NOT NULL,
    right_segments_15min BIGINT NOT NULL,
    right_segments_30min BIGINT NOT NULL,
    first_segment_length DOUBLE PRECISION,
    entry_right_segments_5min BIGINT NOT NULL,
    entry_right_segments_15min BIGINT NOT NULL,
    entry_right_segments_30min BIGINT NOT NULL,
    exit_right_segments_5min BIGINT NOT NULL,
    exit_right_segments_15min BIGINT NOT NULL,
    exit_right_segments_30min BIGINT NOT NULL,
    entry_first_segment_length DOUBLE PRECISION,
    exit_first_segment_length DOUBLE PRECISION
);";

pub struct PostgresAdapter {
    pool: Pool<Manager>,
}

fn db_err(e: impl std::fmt::Display) -> ReconError {
    ReconError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: postgres::Error) -> ReconError {
    ReconError::DatabaseQuery {
        reason: e.to_string(),
    }
}

/// Feature counts are stored as BIGINT.
fn count(row: &Row, idx: usize) -> u32 {
    u32::try_from(row.get::<_, i64>(idx)).unwrap_or(u32::MAX)
}

impl PostgresAdapter {
    pub fn from_settings(settings: &StoreSettings) -> Result<Self, ReconError> {
        let connection_string =
            settings
                .connection_string
                .as_deref()
                .ok_or_else(|| ReconError::ConfigMissing {
                    section: "postgres".into(),
                    key: "connection_string".into(),
                })?;

        let pg_config: postgres::Config = connection_string.parse().map_err(db_err)?;
        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = Pool::builder()
            .max_size(settings.pool_size)
            .build(manager)
            .map_err(db_err)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<Manager>, ReconError> {
        self.pool.get().map_err(db_err)
    }

    fn write_all<T>(
        &self,
        table: &str,
        clear_first: bool,
        items: &[T],
        sql: &str,
        params: impl for<'a> Fn(&'a T) -> Params<'a>,
    ) -> Result<usize, ReconError> {
        let mut client = self.conn()?;
        let mut tx: Transaction<'_> = client.transaction().map_err(query_err)?;
        if clear_first {
            tx.execute(format!("DELETE FROM {table}").as_str(), &[])
                .map_err(query_err)?;
        }
        let stmt = tx.prepare(sql).map_err(query_err)?;
        for item in items {
            tx.execute(&stmt, &params(item)).map_err(query_err)?;
        }
        tx.commit().map_err(query_err)?;
        info!(table, rows = items.len(), replaced = clear_first, "stored rows");
        Ok(items.len())
    }

    fn load<T>(&self, sql: &str, map: impl Fn(&Row) -> T) -> Result<Vec<T>, ReconError> {
        let mut client = self.conn()?;
        let rows = client.query(sql, &[]).map_err(query_err)?;
        debug!(rows = rows.len(), "loaded rows");
        Ok(rows.iter().map(map).collect())
    }
}

impl StorePort for PostgresAdapter {
    fn initialize_schema(&self) -> Result<(), ReconError> {
        let mut client = self.conn()?;
        client.batch_execute(SCHEMA).map_err(query_err)
    }

    fn upsert_orders(&self, orders: &[OrderRecord]) -> Result<usize, ReconError> {
        self.write_all(
            "orders",
            false,
            orders,
            "INSERT INTO orders (order_id, symbol, type, volume, price, sl, tp, open_time, time, status, comment)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             ON CONFLICT (order_id) DO UPDATE SET
                symbol = EXCLUDED.symbol, type = EXCLUDED.type, volume = EXCLUDED.volume,
                price = EXCLUDED.price, sl = EXCLUDED.sl, tp = EXCLUDED.tp,
                open_time = EXCLUDED.open_time, time = EXCLUDED.time,
                status = EXCLUDED.status, comment = EXCLUDED.comment",
            |o| {
                vec![
                    &o.order_id as &(dyn ToSql + Sync),
                    &o.symbol,
                    &o.order_type,
                    &o.volume,
                    &o.price,
                    &o.stop_loss,
                    &o.take_profit,
                    &o.open_time,
                    &o.time,
                    &o.status,
                    &o.comment,
                ]
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
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             ON CONFLICT (deal_id) DO UPDATE SET
                order_id = EXCLUDED.order_id, symbol = EXCLUDED.symbol, type = EXCLUDED.type,
                direction = EXCLUDED.direction, volume = EXCLUDED.volume, price = EXCLUDED.price,
                commission = EXCLUDED.commission, swap = EXCLUDED.swap, profit = EXCLUDED.profit,
                balance = EXCLUDED.balance, deal_time = EXCLUDED.deal_time,
                comment = EXCLUDED.comment",
            |d| {
                vec![
                    &d.deal_id as &(dyn ToSql + Sync),
                    &d.order_id,
                    &d.symbol,
                    &d.deal_type,
                    &d.direction,
                    &d.volume,
                    &d.price,
                    &d.commission,
                    &d.swap,
                    &d.profit,
                    &d.balance,
                    &d.time,
                    &d.comment,
                ]
            },
        )
    }

    fn replace_segments(&self, segments: &[SegmentRecord]) -> Result<usize, ReconError> {
        let sides: Vec<&str> = segments.iter().map(|s| s.segment_side.as_str()).collect();
        let indexed: Vec<(&SegmentRecord, &&str)> = segments.iter().zip(sides.iter()).collect();
        self.write_all(
            "segments",
            true,
            &indexed,
            "INSERT INTO segments (trade_time, order_ticket, position_id, reference_price,
                                   reference_time, reference_bar_index, timeframe, segment_side,
                                   segment_index, start_price, end_price, amplitude, direction,
                                   trade_action, trade_price, trade_volume, trade_comment, trade_status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
            |(s, side)| {
                vec![
                    &s.trade_time as &(dyn ToSql + Sync),
                    &s.order_ticket,
                    &s.position_id,
                    &s.reference_price,
                    &s.reference_time,
                    &s.reference_bar_index,
                    &s.timeframe,
                    *side,
                    &s.segment_index,
                    &s.start_price,
                    &s.end_price,
                    &s.amplitude,
                    &s.direction,
                    &s.trade_action,
                    &s.trade_price,
                    &s.trade_volume,
                    &s.trade_comment,
                    &s.trade_status,
                ]
            },
        )
    }

    fn replace_summary(&self, summary: &[SummaryRecord]) -> Result<usize, ReconError> {
        let counts: Vec<[i64; 9]> = summary
            .iter()
            .map(|s| {
                [
                    s.both.right_5min,
                    s.both.right_15min,
                    s.both.right_30min,
                    s.entry.right_5min,
                    s.entry.right_15min,
                    s.entry.right_30min,
                    s.exit.right_5min,
                    s.exit.right_15min,
                    s.exit.right_30min,
                ]
                .map(i64::from)
            })
            .collect();
        let indexed: Vec<(&SummaryRecord, &[i64; 9])> = summary.iter().zip(counts.iter()).collect();
        self.write_all(
            "trade_summary",
            true,
            &indexed,
            "INSERT INTO trade_summary (order_id, position_id, symbol, order_type, volume,
                open_price, close_price, sl, tp, open_time, close_time, status, commission, swap,
                profit, comment, right_segments_5min, right_segments_15min, right_segments_30min,
                first_segment_length, entry_right_segments_5min, entry_right_segments_15min,
                entry_right_segments_30min, exit_right_segments_5min, exit_right_segments_15min,
                exit_right_segments_30min, entry_first_segment_length, exit_first_segment_length)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                     $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28)",
            |(s, c)| {
                vec![
                    &s.order_id as &(dyn ToSql + Sync),
                    &s.position_id,
                    &s.symbol,
                    &s.order_type,
                    &s.volume,
                    &s.open_price,
                    &s.close_price,
                    &s.stop_loss,
                    &s.take_profit,
                    &s.open_time,
                    &s.close_time,
                    &s.status,
                    &s.commission,
                    &s.swap,
                    &s.profit,
                    &s.comment,
                    &c[0],
                    &c[1],
                    &c[2],
                    &s.both.first_segment_length,
                    &c[3],
                    &c[4],
                    &c[5],
                    &c[6],
                    &c[7],
                    &c[8],
                    &s.entry.first_segment_length,
                    &s.exit.first_segment_length,
                ]
            },
        )
    }

    fn load_orders(&self) -> Result<Vec<OrderRecord>, ReconError> {
        self.load(
            "SELECT order_id, symbol, type, volume, price, sl, tp, open_time, time, status, comment
             FROM orders ORDER BY seq",
            |row| OrderRecord {
                order_id: row.get(0),
                symbol: row.get(1),
                order_type: row.get(2),
                volume: row.get(3),
                price: row.get(4),
                stop_loss: row.get(5),
                take_profit: row.get(6),
                open_time: row.get(7),
                time: row.get(8),
                status: row.get(9),
                comment: row.get(10),
            },
        )
    }

    fn load_deals(&self) -> Result<Vec<DealRecord>, ReconError> {
        self.load(
            "SELECT deal_id, order_id, symbol, type, direction, volume, price, commission, swap,
                    profit, balance, deal_time, comment
             FROM deals ORDER BY seq",
            |row| DealRecord {
                deal_id: row.get(0),
                order_id: row.get(1),
                symbol: row.get(2),
                deal_type: row.get(3),
                direction: row.get(4),
                volume: row.get(5),
                price: row.get(6),
                commission: row.get(7),
                swap: row.get(8),
                profit: row.get(9),
                balance: row.get(10),
                time: row.get(11),
                comment: row.get(12),
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
            |row| SegmentRecord {
                trade_time: row.get(0),
                order_ticket: row.get(1),
                position_id: row.get(2),
                reference_price: row.get(3),
                reference_time: row.get(4),
                reference_bar_index: row.get(5),
                timeframe: row.get(6),
                segment_side: SegmentSide::parse(row.get(7)),
                segment_index: row.get(8),
                start_price: row.get(9),
                end_price: row.get(10),
                amplitude: row.get(11),
                direction: row.get(12),
                trade_action: row.get(13),
                trade_price: row.get(14),
                trade_volume: row.get(15),
                trade_comment: row.get(16),
                trade_status: row.get(17),
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
            |row| SummaryRecord {
                order_id: row.get(0),
                position_id: row.get(1),
                symbol: row.get(2),
                order_type: row.get(3),
                volume: row.get(4),
                open_price: row.get(5),
                close_price: row.get(6),
                stop_loss: row.get(7),
                take_profit: row.get(8),
                open_time: row.get(9),
                close_time: row.get(10),
                status: row.get(11),
                commission: row.get(12),
                swap: row.get(13),
                profit: row.get(14),
                comment: row.get(15),
                both: LegFeatures {
                    right_5min: count(row, 16),
                    right_15min: count(row, 17),
                    right_30min: count(row, 18),
                    first_segment_length: row.get(19),
                },
                entry: LegFeatures {
                    right_5min: count(row, 20),
                    right_15min: count(row, 21),
                    right_30min: count(row, 22),
                    first_segment_length: row.get(26),
                },
                exit: LegFeatures {
                    right_5min: count(row, 23),
                    right_15min: count(row, 24),
                    right_30min: count(row, 25),
                    first_segment_length: row.get(27),
                },
            },
        )
    }
}
