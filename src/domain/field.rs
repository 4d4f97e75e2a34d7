//! Canonical field names and their target types.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Decimal,
    Text,
    Timestamp,
}

/// A named semantic slot that a report column can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    OrderId,
    DealId,
    Symbol,
    Type,
    Direction,
    Volume,
    Price,
    StopLoss,
    TakeProfit,
    OpenTime,
    Time,
    Status,
    Commission,
    Swap,
    Profit,
    Balance,
    Comment,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::OrderId => "order_id",
            Field::DealId => "deal_id",
            Field::Symbol => "symbol",
            Field::Type => "type",
            Field::Direction => "direction",
            Field::Volume => "volume",
            Field::Price => "price",
            Field::StopLoss => "sl",
            Field::TakeProfit => "tp",
            Field::OpenTime => "open_time",
            Field::Time => "time",
            Field::Status => "status",
            Field::Commission => "commission",
            Field::Swap => "swap",
            Field::Profit => "profit",
            Field::Balance => "balance",
            Field::Comment => "comment",
        }
    }

    pub fn field_type(self) -> FieldType {
        match self {
            Field::OrderId | Field::DealId => FieldType::Integer,
            Field::Volume
            | Field::Price
            | Field::StopLoss
            | Field::TakeProfit
            | Field::Commission
            | Field::Swap
            | Field::Profit
            | Field::Balance => FieldType::Decimal,
            Field::OpenTime | Field::Time => FieldType::Timestamp,
            Field::Symbol | Field::Type | Field::Direction | Field::Status | Field::Comment => {
                FieldType::Text
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields of the orders table, in output order.
pub const ORDER_FIELDS: &[Field] = &[
    Field::OrderId,
    Field::Symbol,
    Field::Type,
    Field::Volume,
    Field::Price,
    Field::StopLoss,
    Field::TakeProfit,
    Field::OpenTime,
    Field::Time,
    Field::Status,
    Field::Comment,
];

/// Fields of the deals table, in output order.
pub const DEAL_FIELDS: &[Field] = &[
    Field::DealId,
    Field::OrderId,
    Field::Symbol,
    Field::Type,
    Field::Direction,
    Field::Volume,
    Field::Price,
    Field::Commission,
    Field::Swap,
    Field::Profit,
    Field::Balance,
    Field::Time,
    Field::Comment,
];
