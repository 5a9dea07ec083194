//! Common types and utilities for the wallet ledger
//!
//! This library contains the rounding engine, the per-client balance ledger and
//! the shared error type used by the wallet service. It provides a unified
//! approach to error handling, decimal arithmetic and balance models.

pub mod error;
pub mod model;
pub mod decimal;
pub mod db;

/// Re-export important types
pub use error::{Error, Result, ErrorExt};
pub use decimal::*;
pub use model::asset::{Asset, AssetPair};
pub use model::balance::{AssetBalance, ClientBalanceSet};
pub use model::operation::{BalanceUpdate, ClientBalanceUpdate, WalletOperation};
