//! Minute candles of the underlying built from successive chain snapshots

use crate::stats::true_range;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Underlying price and total chain volume observed at one poll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingSnapshot {
    pub ts: DateTime<Utc>,
    pub price: f64,
    pub volume_sum: f64,
}

/// One-minute candle of the underlying
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    fn with_snapshot(open_time: DateTime<Utc>, snap: &UnderlyingSnapshot) -> Self {
        Self {
            open_time,
            open: snap.price,
            high: snap.price,
            low: snap.price,
            close: snap.price,
            volume: snap.volume_sum,
        }
    }

    fn update(&mut self, snap: &UnderlyingSnapshot) {
        self.high = self.high.max(snap.price);
        self.low = self.low.min(snap.price);
        self.close = snap.price;
        self.volume += snap.volume_sum;
    }

    /// True range of this candle against a previous close
    pub fn true_range(&self, prev_close: f64) -> Option<f64> {
        true_range(prev_close, self.high, self.low)
    }
}

/// In-memory minute candles built from successive poll snapshots
#[derive(Debug, Clone)]
pub struct CandleBuilder {
    closed: Vec<Candle>,
    current: Option<Candle>,
    max_candles: usize,
}

impl CandleBuilder {
    pub const INTERVAL_SECONDS: i64 = 60;

    pub fn new(max_candles: usize) -> Self {
        Self {
            closed: Vec::new(),
            current: None,
            max_candles,
        }
    }

    fn open_time(ts: DateTime<Utc>) -> DateTime<Utc> {
        let secs = ts.timestamp();
        let open = secs - secs.rem_euclid(Self::INTERVAL_SECONDS);
        Utc.timestamp_opt(open, 0).single().unwrap_or(ts)
    }

    /// Fold a snapshot in; non-finite prices are ignored.
    ///
    /// A snapshot older than the current candle is dropped so a late poll
    /// response cannot reopen a finished minute.
    pub fn add_snapshot(&mut self, snap: &UnderlyingSnapshot) {
        if !snap.price.is_finite() || snap.price <= 0.0 {
            return;
        }
        let open_time = Self::open_time(snap.ts);

        match self.current.as_mut() {
            Some(current) if current.open_time == open_time => current.update(snap),
            Some(current) if current.open_time > open_time => {}
            Some(current) => {
                self.closed.push(*current);
                self.current = Some(Candle::with_snapshot(open_time, snap));
            }
            None => self.current = Some(Candle::with_snapshot(open_time, snap)),
        }

        if self.max_candles > 0 && self.closed.len() > self.max_candles {
            let excess = self.closed.len() - self.max_candles;
            self.closed.drain(..excess);
        }
    }

    /// Closed candles followed by the one still forming
    pub fn candles(&self) -> Vec<Candle> {
        let mut out = self.closed.clone();
        out.extend(self.current);
        out
    }

    pub fn latest(&self) -> Option<Candle> {
        self.current.or_else(|| self.closed.last().copied())
    }

    pub fn len(&self) -> usize {
        self.closed.len() + usize::from(self.current.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.closed.clear();
        self.current = None;
    }
}

impl Default for CandleBuilder {
    fn default() -> Self {
        Self::new(24 * 60)
    }
}
