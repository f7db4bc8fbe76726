//! Poll cycle: fetch every source, fold results into the snapshot, recompute
//!
//! Sources are fetched concurrently. A failed source leaves its previously
//! applied data in place; the other sources still update. After each cycle
//! the analytics are recomputed and published on a `watch` channel.

use crate::decode::{
    decode_greeks, decode_index_ohlc, decode_market_breadth, decode_option_chain, decode_window_stats,
    GreeksPayload,
};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::sequence::{SequenceFence, Ticket};
use crate::source::{source_from_config, DataSource};
use crate::Result;
use analytics::candles::{CandleBuilder, UnderlyingSnapshot};
use analytics::greeks::strike_ladder;
use analytics::mock::{mock_greeks_chain, MockGreeksParams};
use analytics::normalizer::underlying_from_quotes;
use analytics::stats::round_to_strike;
use analytics::{
    compute_analytics, AnalyticsConfig, AnalyticsResult, ExternalStats, Filters, GreeksSnapshot, IndexOhlc,
    MarketBreadth, OptionQuote, SignalThresholds, Snapshot, WindowMode, WindowSpec,
};
use chrono::{DateTime, Utc};
use config::{MasterConfig, PollInterval, SourceKind};
use futures::future::join_all;
use observability::{FeedMetrics, FetchMetricsGuard, FetchOutcome};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

/// Everything the poller needs besides its sources
#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub analytics: AnalyticsConfig,
    pub filters: Filters,
    pub interval: PollInterval,
    pub mock_fallback: bool,
    pub mock: MockGreeksParams,
    pub max_candles: usize,
}

impl PollerSettings {
    pub fn from_config(cfg: &MasterConfig) -> Self {
        let step = cfg.dashboard.strike_step;
        let window = WindowSpec {
            mode: match cfg.window.mode {
                config::WindowMode::Fixed => WindowMode::Fixed,
                config::WindowMode::Dynamic => WindowMode::Dynamic,
            },
            fixed_below: cfg.window.fixed_below,
            fixed_above: cfg.window.fixed_above,
            atm_window: cfg.window.atm_window,
            step,
        };

        // unlocked bounds follow the ATM window
        let (strike_min, strike_max) = if cfg.window.lock {
            (cfg.window.strike_min, cfg.window.strike_max)
        } else {
            (None, None)
        };

        Self {
            analytics: AnalyticsConfig {
                strike_step: step,
                window,
                signals: SignalThresholds {
                    bullish_pcr: cfg.signals.bullish_pcr,
                    bearish_pcr: cfg.signals.bearish_pcr,
                },
                expected_move: cfg.greeks.expected_move,
                ladder_down: cfg.greeks.down_steps,
                ladder_up: cfg.greeks.up_steps,
            },
            filters: Filters {
                expiry: cfg.window.expiry.clone(),
                strike_min,
                strike_max,
                atm_override: None,
            },
            interval: cfg.polling.interval,
            mock_fallback: cfg.greeks.mock_fallback,
            mock: MockGreeksParams {
                days_to_expiry: cfg.greeks.mock.days_to_expiry,
                vol: cfg.greeks.mock.volatility,
                rate: cfg.greeks.mock.rate,
                dividend: 0.0,
            },
            max_candles: 1440,
        }
    }
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            analytics: AnalyticsConfig::default(),
            filters: Filters::default(),
            interval: PollInterval::Manual,
            mock_fallback: true,
            mock: MockGreeksParams::default(),
            max_candles: 1440,
        }
    }
}

/// Per-source result of one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct SourceStatus {
    pub kind: SourceKind,
    pub outcome: FetchOutcome,
    pub error: Option<String>,
}

/// Published after every cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<SourceStatus>,
    pub analytics: AnalyticsResult,
}

impl CycleReport {
    pub fn status(&self, kind: SourceKind) -> Option<&SourceStatus> {
        self.sources.iter().find(|s| s.kind == kind)
    }
}

enum Decoded {
    Chain(Vec<OptionQuote>),
    IndexOhlc(IndexOhlc),
    PrevIndexOhlc(IndexOhlc),
    Breadth(MarketBreadth),
    WindowStats(ExternalStats),
    Greeks(GreeksPayload),
}

fn decode(kind: SourceKind, payload: &Value) -> Result<Decoded> {
    let name = kind.as_str();
    Ok(match kind {
        SourceKind::OptionChain => Decoded::Chain(decode_option_chain(name, payload)?),
        SourceKind::IndexOhlc => Decoded::IndexOhlc(decode_index_ohlc(name, payload)?),
        SourceKind::PrevIndexOhlc => Decoded::PrevIndexOhlc(decode_index_ohlc(name, payload)?),
        SourceKind::MarketBreadth => Decoded::Breadth(decode_market_breadth(name, payload)?),
        SourceKind::WindowStats => Decoded::WindowStats(decode_window_stats(name, payload)?),
        SourceKind::Greeks => Decoded::Greeks(decode_greeks(name, payload)?),
    })
}

struct SourceSlot {
    kind: SourceKind,
    source: Arc<dyn DataSource>,
    retry: RetryPolicy,
    fence: SequenceFence,
    metrics: FeedMetrics,
}

struct FeedState {
    snapshot: Snapshot,
    candles: CandleBuilder,
    applied_at: HashMap<SourceKind, Instant>,
}

impl FeedState {
    fn apply(&mut self, decoded: Decoded) {
        match decoded {
            Decoded::Chain(quotes) => {
                if let Some(price) = underlying_from_quotes(&quotes) {
                    self.candles.add_snapshot(&UnderlyingSnapshot {
                        ts: Utc::now(),
                        price,
                        volume_sum: quotes.iter().map(|q| q.volume).sum(),
                    });
                    self.snapshot.latest_candle = self.candles.latest();
                }
                self.snapshot.quotes = quotes;
            }
            Decoded::IndexOhlc(ohlc) => self.snapshot.index_ohlc = Some(ohlc),
            Decoded::PrevIndexOhlc(ohlc) => self.snapshot.prev_index_ohlc = Some(ohlc),
            Decoded::Breadth(breadth) => self.snapshot.breadth = Some(breadth),
            Decoded::WindowStats(stats) => self.snapshot.window_stats = Some(stats),
            Decoded::Greeks(payload) => {
                self.snapshot.greeks = Some(GreeksSnapshot {
                    chain: payload.chain,
                    atm_strike: payload.atm_strike,
                    is_mock: false,
                })
            }
        }
    }

    /// ATM for the synthetic greeks chain
    fn reference_atm(&self, step: f64) -> Option<f64> {
        let snapshot = &self.snapshot;
        snapshot
            .window_stats
            .as_ref()
            .and_then(|s| s.atm)
            .or_else(|| underlying_from_quotes(&snapshot.quotes).map(|u| round_to_strike(u, step)))
            .or_else(|| {
                snapshot
                    .index_ohlc
                    .as_ref()
                    .and_then(IndexOhlc::current_value)
                    .map(|v| round_to_strike(v, step))
            })
            .filter(|a| a.is_finite() && *a > 0.0)
    }
}

pub struct Poller {
    slots: Vec<SourceSlot>,
    settings: PollerSettings,
    state: Mutex<FeedState>,
    cycles: AtomicU64,
    tx: watch::Sender<Option<Arc<CycleReport>>>,
}

impl Poller {
    pub fn new(settings: PollerSettings, sources: Vec<(SourceKind, Arc<dyn DataSource>, RetryPolicy)>) -> Self {
        let slots = sources
            .into_iter()
            .map(|(kind, source, retry)| SourceSlot {
                kind,
                source,
                retry,
                fence: SequenceFence::new(),
                metrics: FeedMetrics::new(kind.as_str()),
            })
            .collect();

        let (tx, _) = watch::channel(None);
        Self {
            slots,
            state: Mutex::new(FeedState {
                snapshot: Snapshot::default(),
                candles: CandleBuilder::new(settings.max_candles),
                applied_at: HashMap::new(),
            }),
            settings,
            cycles: AtomicU64::new(0),
            tx,
        }
    }

    /// Build sources for every enabled entry in `cfg`
    pub fn from_config(cfg: &MasterConfig) -> Result<Self> {
        let mut sources = Vec::new();
        for (kind, source_cfg) in cfg.sources.enabled() {
            let source = source_from_config(kind, source_cfg)?;
            let retry = RetryPolicy::from(&source_cfg.retry_for(kind));
            debug!(source = %kind, url = %source_cfg.url, attempts = retry.max_attempts, "Configured source");
            sources.push((kind, source, retry));
        }
        info!(sources = sources.len(), "Poller configured");
        Ok(Self::new(PollerSettings::from_config(cfg), sources))
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<CycleReport>>> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> Option<Arc<CycleReport>> {
        self.tx.borrow().clone()
    }

    pub fn settings(&self) -> &PollerSettings {
        &self.settings
    }

    /// Copy of the data currently applied
    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().snapshot.clone()
    }

    /// Fence check and write happen under one lock so a stale response can
    /// never land between them
    fn apply(&self, slot: &SourceSlot, ticket: Ticket, decoded: Decoded) -> Result<()> {
        let mut state = self.state.lock();
        slot.fence.admit(slot.kind.as_str(), ticket)?;
        state.apply(decoded);
        state.applied_at.insert(slot.kind, Instant::now());
        Ok(())
    }

    async fn fetch_source(&self, slot: &SourceSlot) -> SourceStatus {
        let name = slot.kind.as_str();
        let mut guard = FetchMetricsGuard::new(&slot.metrics);
        let ticket = slot.fence.issue();

        let fetched = retry_with_backoff(&slot.retry, name, |attempt| {
            if attempt > 1 {
                slot.metrics.record_retry();
            }
            slot.source.fetch()
        })
        .await;

        let result = fetched
            .and_then(|payload| decode(slot.kind, &payload))
            .and_then(|decoded| self.apply(slot, ticket, decoded));

        let (outcome, error) = match result {
            Ok(()) => {
                debug!(source = name, ticket = ticket.value(), "Applied");
                (FetchOutcome::Ok, None)
            }
            Err(e @ crate::FeedError::StaleResponse { .. }) => {
                debug!(source = name, error = %e, "Discarded stale response");
                (FetchOutcome::Stale, Some(e.to_string()))
            }
            Err(e) if e.is_malformed() => {
                warn!(source = name, error = %e, "Malformed response, keeping previous data");
                (FetchOutcome::Malformed, Some(e.to_string()))
            }
            Err(e) => {
                warn!(source = name, error = %e, "Fetch failed, keeping previous data");
                (FetchOutcome::Failed, Some(e.to_string()))
            }
        };
        guard.set_outcome(outcome);

        SourceStatus {
            kind: slot.kind,
            outcome,
            error,
        }
    }

    /// Install the synthetic greeks chain unless real greeks are already held
    fn apply_mock_greeks(&self, state: &mut FeedState) -> bool {
        if matches!(&state.snapshot.greeks, Some(g) if !g.is_mock) {
            debug!("Greeks source failed, keeping last real chain");
            return false;
        }

        let step = self.settings.analytics.strike_step;
        let Some(atm) = state.reference_atm(step) else {
            warn!("Greeks source failed and no ATM is known, no mock chain");
            return false;
        };

        let ladder = strike_ladder(
            atm,
            self.settings.analytics.ladder_down,
            self.settings.analytics.ladder_up,
            step,
        );
        state.snapshot.greeks = Some(GreeksSnapshot {
            chain: mock_greeks_chain(atm, &ladder, &self.settings.mock),
            atm_strike: Some(atm),
            is_mock: true,
        });
        info!(atm, strikes = ladder.len(), "Using mock greeks chain");
        true
    }

    /// Run one poll cycle and publish the result
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Arc<CycleReport> {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        let statuses = join_all(self.slots.iter().map(|slot| self.fetch_source(slot))).await;

        let greeks_failed = statuses.iter().any(|s| {
            s.kind == SourceKind::Greeks && matches!(s.outcome, FetchOutcome::Failed | FetchOutcome::Malformed)
        });

        let snapshot = {
            let mut state = self.state.lock();
            if greeks_failed && self.settings.mock_fallback && self.apply_mock_greeks(&mut state) {
                if let Some(slot) = self.slots.iter().find(|s| s.kind == SourceKind::Greeks) {
                    slot.metrics.record_mock_fallback();
                }
            }
            for slot in &self.slots {
                if let Some(at) = state.applied_at.get(&slot.kind) {
                    slot.metrics.set_snapshot_age(at.elapsed());
                }
            }
            state.snapshot.clone()
        };

        let analytics = compute_analytics(&snapshot, &self.settings.filters, &self.settings.analytics);
        let failed = statuses.iter().filter(|s| s.outcome != FetchOutcome::Ok).count();
        info!(
            cycle,
            sources = statuses.len(),
            failed,
            atm = ?analytics.atm_strike,
            rows = analytics.rows.len(),
            warnings = analytics.warnings.len(),
            "Poll cycle complete"
        );

        let report = Arc::new(CycleReport {
            cycle,
            generated_at: Utc::now(),
            sources: statuses,
            analytics,
        });
        // overlapping cycles may finish out of order; never replace a newer report
        self.tx.send_if_modified(|published| {
            if published.as_ref().is_some_and(|p| p.cycle >= cycle) {
                return false;
            }
            *published = Some(report.clone());
            true
        });
        report
    }

    /// Poll on the configured interval until `shutdown` flips to true.
    /// Manual polling runs a single cycle.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let Some(period) = self.settings.interval.as_duration() else {
            info!("Manual polling, running one cycle");
            self.refresh().await;
            return;
        };

        info!(interval_secs = period.as_secs(), sources = self.slots.len(), "Starting poller");
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.refresh().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Poller shutting down");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    fn chain(underlying: f64, strikes: &[f64]) -> Value {
        let mut rows = Vec::new();
        for &s in strikes {
            rows.push(json!({"strike": s, "optionType": "CE", "OI": 1000, "volume": 10,
                "expiry": "14-Oct-2025", "underlyingPrice": underlying}));
            rows.push(json!({"strike": s, "optionType": "PE", "OI": 1500, "volume": 20,
                "expiry": "14-Oct-2025", "underlyingPrice": underlying}));
        }
        Value::Array(rows)
    }

    fn source(kind: SourceKind, src: StaticSource) -> (SourceKind, Arc<dyn DataSource>, RetryPolicy) {
        (kind, Arc::new(src), RetryPolicy::single_attempt())
    }

    fn greeks_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn test_full_cycle() {
        let strikes = [25200.0, 25250.0, 25300.0, 25350.0, 25400.0];
        let poller = Poller::new(
            PollerSettings::default(),
            vec![
                source(SourceKind::OptionChain, StaticSource::new("option_chain", chain(25310.0, &strikes))),
                source(
                    SourceKind::PrevIndexOhlc,
                    StaticSource::new(
                        "prev_index_ohlc",
                        json!({"indexName": "NIFTY 50", "high": 25400, "low": 25100, "close": 25300}),
                    ),
                ),
                source(
                    SourceKind::MarketBreadth,
                    StaticSource::new("market_breadth", json!({"advances": 30, "declines": 20})),
                ),
            ],
        );

        let report = poller.refresh().await;
        assert_eq!(report.cycle, 1);
        assert!(report.sources.iter().all(|s| s.outcome == FetchOutcome::Ok));

        let a = &report.analytics;
        assert_eq!(a.atm_strike, Some(25300.0));
        assert_eq!(a.rows.len(), 5);
        assert!(a.zones.is_some());
        assert!(a.pivots.is_some());
        assert_eq!(a.advance_decline_ratio, Some(1.5));

        let published = poller.latest().unwrap();
        assert_eq!(published.cycle, 1);
    }

    #[tokio::test]
    async fn test_failed_source_keeps_previous_data() {
        let chain_src = StaticSource::scripted(
            "option_chain",
            vec![Ok(chain(25300.0, &[25300.0])), Err("connection refused".to_string())],
        );
        let poller = Poller::new(
            PollerSettings::default(),
            vec![
                source(SourceKind::OptionChain, chain_src),
                source(SourceKind::MarketBreadth, StaticSource::failing("market_breadth", "502")),
            ],
        );

        let first = poller.refresh().await;
        assert_eq!(first.status(SourceKind::OptionChain).unwrap().outcome, FetchOutcome::Ok);
        assert_eq!(first.status(SourceKind::MarketBreadth).unwrap().outcome, FetchOutcome::Failed);

        let second = poller.refresh().await;
        let status = second.status(SourceKind::OptionChain).unwrap();
        assert_eq!(status.outcome, FetchOutcome::Failed);
        assert!(status.error.as_deref().unwrap().contains("connection refused"));
        assert_eq!(poller.snapshot().quotes.len(), 2);
        assert_eq!(second.analytics.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let poller = Poller::new(
            PollerSettings::default(),
            vec![source(SourceKind::OptionChain, StaticSource::new("option_chain", json!("maintenance")))],
        );
        let report = poller.refresh().await;
        assert_eq!(report.sources[0].outcome, FetchOutcome::Malformed);
        assert!(report.analytics.atm_strike.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_greeks_failure_falls_back_to_mock() {
        let greeks = Arc::new(StaticSource::failing("greeks", "503 Service Unavailable"));
        let poller = Poller::new(
            PollerSettings::default(),
            vec![
                source(SourceKind::OptionChain, StaticSource::new("option_chain", chain(25290.0, &[25300.0]))),
                (SourceKind::Greeks, greeks.clone(), greeks_retry()),
            ],
        );

        let report = poller.refresh().await;
        assert_eq!(greeks.calls(), 3);
        assert_eq!(report.status(SourceKind::Greeks).unwrap().outcome, FetchOutcome::Failed);
        assert!(report.analytics.greeks_is_mock);

        let table = report.analytics.greeks.as_ref().unwrap();
        assert_eq!(table.atm_strike, 25300.0);
        assert_eq!(table.rows.len(), 22);
    }

    #[tokio::test]
    async fn test_real_greeks_survive_later_failure() {
        let payload = json!({"status": "success", "atm_strike": 25300, "data": [
            {"strike_price": 25300, "call_options": {"option_greeks": {"delta": 0.5}, "market_data": {"ltp": 110}}}
        ]});
        let greeks = StaticSource::scripted("greeks", vec![Ok(payload), Err("timeout".to_string())]);
        let poller = Poller::new(
            PollerSettings::default(),
            vec![
                source(SourceKind::OptionChain, StaticSource::new("option_chain", chain(25300.0, &[25300.0]))),
                source(SourceKind::Greeks, greeks),
            ],
        );

        assert!(!poller.refresh().await.analytics.greeks_is_mock);
        let second = poller.refresh().await;
        assert_eq!(second.status(SourceKind::Greeks).unwrap().outcome, FetchOutcome::Failed);
        assert!(!second.analytics.greeks_is_mock);
    }

    /// Answers every call with an HTML error page instead of JSON
    struct HtmlErrorSource {
        calls: AtomicU32,
    }

    #[async_trait]
    impl DataSource for HtmlErrorSource {
        fn name(&self) -> &str {
            "greeks"
        }

        async fn fetch(&self) -> crate::Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::from_str("<html>502 Bad Gateway</html>")?)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_greeks_is_malformed_without_retry() {
        let greeks = Arc::new(HtmlErrorSource {
            calls: AtomicU32::new(0),
        });
        let poller = Poller::new(
            PollerSettings::default(),
            vec![
                source(SourceKind::OptionChain, StaticSource::new("option_chain", chain(25290.0, &[25300.0]))),
                (SourceKind::Greeks, greeks.clone(), greeks_retry()),
            ],
        );

        let report = poller.refresh().await;
        assert_eq!(greeks.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.status(SourceKind::Greeks).unwrap().outcome, FetchOutcome::Malformed);
        assert!(report.analytics.greeks_is_mock);
    }

    /// First call answers after 5s, later calls immediately
    struct SlowFirstSource {
        calls: AtomicU32,
    }

    #[async_trait]
    impl DataSource for SlowFirstSource {
        fn name(&self) -> &str {
            "option_chain"
        }

        async fn fetch(&self) -> crate::Result<Value> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == 1 {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(chain(25000.0, &[25000.0]))
            } else {
                Ok(chain(25500.0, &[25500.0]))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_is_discarded() {
        let slow: Arc<dyn DataSource> = Arc::new(SlowFirstSource {
            calls: AtomicU32::new(0),
        });
        let poller = Poller::new(
            PollerSettings::default(),
            vec![(SourceKind::OptionChain, slow, RetryPolicy::single_attempt())],
        );

        let (first, second) = tokio::join!(poller.refresh(), poller.refresh());

        assert_eq!(second.status(SourceKind::OptionChain).unwrap().outcome, FetchOutcome::Ok);
        assert_eq!(first.status(SourceKind::OptionChain).unwrap().outcome, FetchOutcome::Stale);
        assert_eq!(poller.snapshot().quotes[0].strike, 25500.0);

        // the older cycle finished last but must not replace the newer report
        let published = poller.latest().unwrap();
        assert_eq!(published.cycle, second.cycle);
        assert_eq!(published.status(SourceKind::OptionChain).unwrap().outcome, FetchOutcome::Ok);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let settings = PollerSettings {
            interval: PollInterval::Secs30,
            ..PollerSettings::default()
        };
        let poller = Arc::new(Poller::new(
            settings,
            vec![source(SourceKind::OptionChain, StaticSource::new("option_chain", chain(25300.0, &[25300.0])))],
        ));
        let mut reports = poller.subscribe();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn({
            let poller = poller.clone();
            async move { poller.run(shutdown_rx).await }
        });

        reports.changed().await.unwrap();
        assert_eq!(reports.borrow().as_ref().unwrap().cycle, 1);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_manual_interval_runs_once() {
        let poller = Poller::new(
            PollerSettings::default(),
            vec![source(SourceKind::OptionChain, StaticSource::new("option_chain", chain(25300.0, &[25300.0])))],
        );
        let (_tx, rx) = watch::channel(false);
        poller.run(rx).await;
        assert_eq!(poller.latest().unwrap().cycle, 1);
    }

    #[test]
    fn test_settings_from_config() {
        let mut cfg = config::generate_default_config();
        cfg.window.strike_min = Some(25000.0);
        cfg.window.strike_max = Some(25600.0);

        let unlocked = PollerSettings::from_config(&cfg);
        assert_eq!(unlocked.filters.strike_min, None);

        cfg.window.lock = true;
        cfg.window.mode = config::WindowMode::Dynamic;
        let locked = PollerSettings::from_config(&cfg);
        assert_eq!(locked.filters.strike_min, Some(25000.0));
        assert_eq!(locked.analytics.window.mode, WindowMode::Dynamic);
        assert_eq!(locked.interval, PollInterval::Secs30);
    }
}
