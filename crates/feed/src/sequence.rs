//! Request sequence fencing
//!
//! Each request to a source takes a ticket before it is sent. A response is
//! applied only if its ticket is newer than the last applied one, so a slow
//! response can never overwrite data from a request issued after it.

use crate::error::FeedError;
use crate::Result;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct SequenceFence {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl SequenceFence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tickets start at 1 and increase strictly
    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Mark `ticket` applied if it is newer than everything applied so far
    pub fn try_apply(&self, ticket: Ticket) -> bool {
        self.applied.fetch_max(ticket.0, Ordering::SeqCst) < ticket.0
    }

    /// Like [`try_apply`](Self::try_apply) but reports the rejection as an error
    pub fn admit(&self, source_name: &str, ticket: Ticket) -> Result<()> {
        let previous = self.applied.fetch_max(ticket.0, Ordering::SeqCst);
        if previous < ticket.0 {
            Ok(())
        } else {
            Err(FeedError::StaleResponse {
                source_name: source_name.to_string(),
                ticket: ticket.0,
                applied: previous,
            })
        }
    }

    /// 0 until something has been applied
    pub fn last_applied(&self) -> u64 {
        self.applied.load(Ordering::SeqCst)
    }
}
