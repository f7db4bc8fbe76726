//! Upstream feed for NiftyX
//!
//! Fetches the option chain and its companion endpoints, applies them to a
//! snapshot and recomputes the analytics after every poll cycle.
//!
//! - [`source`] - HTTP, file replay and in-memory data sources
//! - [`retry`] - Per-source retry policy with exponential backoff
//! - [`sequence`] - Request fencing so late responses cannot overwrite newer data
//! - [`decode`] - Payload decoders for each endpoint
//! - [`poller`] - The poll loop and the published [`CycleReport`]

pub mod decode;
pub mod error;
pub mod poller;
pub mod retry;
pub mod sequence;
pub mod source;

pub use error::FeedError;
pub use poller::{CycleReport, Poller, PollerSettings, SourceStatus};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use sequence::{SequenceFence, Ticket};
pub use source::{source_from_config, DataSource, FileSource, HttpSource, StaticSource};

pub type Result<T> = std::result::Result<T, FeedError>;
