//! Vocabulary of the strategy-tester report dialects (Chinese and English
//! locale exports).
//!
//! Everything dialect-specific lives here as data so the locator and mapper
//! stay generic.

use crate::domain::column_mapper::{MappingRule, RuleTable};
use crate::domain::field::{DEAL_FIELDS, Field, ORDER_FIELDS};
use crate::domain::header_locator::{KeywordSet, SectionMarker, SectionSpec};

/// Detection and mapping inputs for one logical table.
#[derive(Debug, Clone)]
pub struct TableDialect {
    pub section: SectionSpec,
    pub rules: RuleTable,
    pub schema: &'static [Field],
    pub identifier: Field,
}

impl TableDialect {
    pub fn name(&self) -> &'static str {
        self.section.name
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.section.keywords = self.section.keywords.with_threshold(threshold);
        self
    }
}

const ORDER_KEYWORDS: &[&str] = &[
    "订单号", "订单", "order", "#", "时间", "time", "类型", "type", "交易量", "volume", "lot",
    "价格", "price", "止损", "s/l", "s / l", "止盈", "t/p", "t / p",
];

const DEAL_KEYWORDS: &[&str] = &[
    "成交号", "成交", "deal", "#", "订单号", "订单", "order", "时间", "time", "类型", "type",
    "方向", "direction", "交易量", "volume", "lot", "价格", "price", "利润", "profit",
];

fn rule(include: &str, field: Field) -> MappingRule {
    MappingRule::new(include, None, field)
}

fn rule_unless(include: &str, exclude: &str, field: Field) -> MappingRule {
    MappingRule::new(include, Some(exclude), field)
}

/// Ordered rules for the orders table. Specific before general.
pub fn order_rules() -> RuleTable {
    RuleTable::new(vec![
        rule("开价时间", Field::OpenTime),
        rule("开仓时间", Field::OpenTime),
        rule("open time", Field::OpenTime),
        rule("交易品种", Field::Symbol),
        rule("品种", Field::Symbol),
        rule("symbol", Field::Symbol),
        rule("订单", Field::OrderId),
        rule_unless("order", "type", Field::OrderId),
        rule("ticket", Field::OrderId),
        rule("类型", Field::Type),
        rule("type", Field::Type),
        rule("交易量", Field::Volume),
        rule("volume", Field::Volume),
        rule("lot", Field::Volume),
        rule("止损", Field::StopLoss),
        rule("s / l", Field::StopLoss),
        rule("s/l", Field::StopLoss),
        rule("止盈", Field::TakeProfit),
        rule("t / p", Field::TakeProfit),
        rule("t/p", Field::TakeProfit),
        rule("价格", Field::Price),
        rule("price", Field::Price),
        rule("时间", Field::Time),
        rule_unless("time", "open", Field::Time),
        rule("状态", Field::Status),
        rule("state", Field::Status),
        rule("status", Field::Status),
        rule("注释", Field::Comment),
        rule("comment", Field::Comment),
        rule("#", Field::OrderId),
    ])
}

/// Ordered rules for the deals table. Specific before general.
pub fn deal_rules() -> RuleTable {
    RuleTable::new(vec![
        rule("成交量", Field::Volume),
        rule("成交", Field::DealId),
        rule("deal", Field::DealId),
        rule("订单", Field::OrderId),
        rule("order", Field::OrderId),
        rule("交易品种", Field::Symbol),
        rule("品种", Field::Symbol),
        rule("symbol", Field::Symbol),
        rule("类型", Field::Type),
        rule("type", Field::Type),
        rule("方向", Field::Direction),
        rule("direction", Field::Direction),
        rule("交易量", Field::Volume),
        rule("volume", Field::Volume),
        rule("lot", Field::Volume),
        rule("价格", Field::Price),
        rule("price", Field::Price),
        rule("手续费", Field::Commission),
        rule("佣金", Field::Commission),
        rule("commission", Field::Commission),
        rule("库存费", Field::Swap),
        rule("掉期", Field::Swap),
        rule("swap", Field::Swap),
        rule("利润", Field::Profit),
        rule("盈利", Field::Profit),
        rule("profit", Field::Profit),
        rule("余额", Field::Balance),
        rule("balance", Field::Balance),
        rule("注释", Field::Comment),
        rule("comment", Field::Comment),
        rule("时间", Field::Time),
        rule("time", Field::Time),
        rule("#", Field::DealId),
    ])
}

pub fn orders_dialect() -> TableDialect {
    TableDialect {
        section: SectionSpec {
            name: "orders",
            keywords: KeywordSet::new(ORDER_KEYWORDS, &["订单", "order"])
                .with_excluded(&["成交", "deal"]),
            marker: SectionMarker::new(&["订单", "orders"], &["开价时间", "开仓时间", "open time"]),
        },
        rules: order_rules(),
        schema: ORDER_FIELDS,
        identifier: Field::OrderId,
    }
}

pub fn deals_dialect() -> TableDialect {
    TableDialect {
        section: SectionSpec {
            name: "deals",
            keywords: KeywordSet::new(DEAL_KEYWORDS, &["成交", "deal"]),
            marker: SectionMarker::new(&["成交", "deals"], &["时间", "time"]),
        },
        rules: deal_rules(),
        schema: DEAL_FIELDS,
        identifier: Field::DealId,
    }
}
