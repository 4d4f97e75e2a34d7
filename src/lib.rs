//! reportrecon: turns strategy-tester report exports into reconciled trade
//! summaries.
//!
//! Hexagonal architecture: extraction and reconciliation logic in [`domain`],
//! port traits in [`ports`], concrete file and database implementations in
//! [`adapters`], orchestration in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
