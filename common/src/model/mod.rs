//! Domain models for the wallet ledger

pub mod asset;
pub mod balance;
pub mod operation;
