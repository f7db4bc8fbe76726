//! Option-chain analytics for NiftyX
//!
//! Turns a raw NIFTY options-chain snapshot into the views the dashboard
//! shows. Every function here is pure: the caller passes the latest inputs
//! and gets fresh outputs back, nothing is cached between calls.
//!
//! # Core Components
//!
//! - [`normalizer`] - Alias-tolerant conversion of raw quote records
//! - [`aggregator`] - Per-strike OI/volume aggregation and PCR
//! - [`zones`] - OTM / ATM / ITM / TOTAL buckets around the ATM strike
//! - [`max_pain`] - Max-pain resolution and the writer-loss pain map
//! - [`pivot`] - Classic pivot levels from the previous session
//! - [`greeks`] - Delta-projected target LTP per strike
//! - [`stats`] - Window PCR, VWAP, IV skew, true range, PCR signal
//! - [`pipeline`] - [`compute_analytics`], the one recompute entry point
//!
//! # Key Invariants
//!
//! - Strike rows are strictly ascending with no duplicate strikes
//! - TOTAL = OTM + ATM + ITM for every summed zone field
//! - PCR is `None` when both sides are zero and `+inf` when only puts carry OI
//! - Missing inputs degrade to warnings, never to panics

pub mod aggregator;
pub mod black_scholes;
pub mod candles;
pub mod error;
pub mod export;
pub mod greeks;
pub mod max_pain;
pub mod mock;
pub mod normalizer;
pub mod pipeline;
pub mod pivot;
pub mod stats;
pub mod types;
pub mod zones;

pub use aggregator::{aggregate_strikes, QuoteFilter};
pub use error::AnalyticsError;
pub use greeks::{GreeksRow, GreeksTable, RawGreeksStrike};
pub use max_pain::{MaxPain, MaxPainSource};
pub use pipeline::{
    compute_analytics, AnalyticsConfig, AnalyticsResult, AnalyticsWarning, Filters, GreeksSnapshot, Snapshot,
};
pub use pivot::PivotLevels;
pub use stats::{ExternalStats, PcrSignal, SignalThresholds, WindowMode, WindowSpec};
pub use types::{IndexOhlc, MarketBreadth, Moneyness, OptionQuote, OptionSide, StrikeRow};
pub use zones::{Zone, ZoneKind, ZoneTable};

pub type Result<T> = std::result::Result<T, AnalyticsError>;
