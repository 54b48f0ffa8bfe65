//! End-to-end scenarios: synthetic market shapes driven through the full
//! fetch → kernel → strategy → scheduler pipeline.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::RwLock;

use marketsentry::alerts::{AlertScheduler, BufferNotifier, EntrySnapshot, SchedulerConfig, Severity};
use marketsentry::analysis::{DataProvider, Orchestrator};
use marketsentry::data::{AssetClass, Bar, Frame, Interval, Period};
use marketsentry::indicators::{self, compute, CrossoverDetector, CrossoverSettings};
use marketsentry::model::{GroupStore, ResolvedConfig, SymbolConfig};
use marketsentry::strategy::{Sentiment, StrategyRegistry, Strength};
use marketsentry::Result;

/// Provider returning whatever frame the test scripted last.
struct ScriptedProvider {
    frame: Mutex<Frame>,
}

impl ScriptedProvider {
    fn new(frame: Frame) -> Self {
        Self { frame: Mutex::new(frame) }
    }

    fn set(&self, frame: Frame) {
        *self.frame.lock().unwrap() = frame;
    }
}

#[async_trait]
impl DataProvider for ScriptedProvider {
    async fn fetch(
        &self,
        _symbol: &str,
        _asset_class: AssetClass,
        _interval: Interval,
        _period: Period,
    ) -> Result<Frame> {
        Ok(self.frame.lock().unwrap().clone())
    }
}

fn frame_from_closes(symbol: &str, closes: &[f64]) -> Frame {
    let epoch = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
    let bars: Vec<Bar> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            Bar::new(epoch + Duration::hours(i as i64), c, c + 0.6, c - 0.6, c, 900.0)
        })
        .collect();
    Frame::from_bars(symbol, Interval::H1, &bars).unwrap()
}

/// Long decline with a small bounce at the end: oscillators deep in
/// oversold, directional spread turning up.
fn oversold_bounce(bars_down: usize, bars_up: usize) -> Vec<f64> {
    let mut closes: Vec<f64> = (0..bars_down).map(|i| 300.0 - i as f64 * 0.9).collect();
    let bottom = *closes.last().unwrap();
    closes.extend((1..=bars_up).map(|i| bottom + i as f64 * 0.4));
    closes
}

/// Mirror image: long rally then a sharp roll-over.
fn overbought_rollover(bars_up: usize, bars_down: usize) -> Vec<f64> {
    let mut closes: Vec<f64> = (0..bars_up).map(|i| 100.0 + i as f64 * 0.9).collect();
    let top = *closes.last().unwrap();
    closes.extend((1..=bars_down).map(|i| top - i as f64 * 0.4));
    closes
}

fn orchestrator(provider: Arc<dyn DataProvider>) -> Orchestrator {
    Orchestrator::new(provider, Arc::new(StrategyRegistry::new()))
}

// --- scenario 1: RSI oversold flip on EURUSD 1h -----------------------------

#[tokio::test]
async fn oversold_bounce_turns_default_strategy_bullish() {
    let frame = frame_from_closes("eurusd", &oversold_bounce(197, 3));
    assert_eq!(frame.len(), 200);
    let provider = Arc::new(ScriptedProvider::new(frame));
    let cfg = ResolvedConfig::standalone("eurusd", AssetClass::Forex, Interval::H1, Period::P7d);

    let verdict = orchestrator(provider).analyze(&cfg).await.unwrap();
    assert_eq!(verdict.sentiment, Sentiment::Bullish);
    assert_eq!(verdict.strength, Strength::Buy);
    assert!(verdict.confirmations_buy >= 3, "got {}", verdict.confirmations_buy);

    // the bounce keeps RSI shallow, not yet back in neutral territory
    let rsi = verdict.snapshot["rsi"];
    assert!(rsi < 50.0, "rsi = {rsi}");
}

// --- scenario 2: dual-Supertrend alignment ----------------------------------

/// Two steps up, one step down: a steady trend with pullbacks that keeps RSI
/// out of overbought while ADX stays high.
fn grinding_rally(n: usize) -> Vec<f64> {
    let mut closes = Vec::with_capacity(n);
    let mut price = 100.0;
    closes.push(price);
    for i in 1..n {
        price += if i % 3 == 0 { -1.8 } else { 1.8 };
        closes.push(price);
    }
    closes
}

#[tokio::test]
async fn dual_supertrend_alignment_is_strong_buy_with_atr_risk_levels() {
    let closes = grinding_rally(89);
    let frame = frame_from_closes("gbpusd", &closes);
    let provider = Arc::new(ScriptedProvider::new(frame.clone()));

    let mut cfg = ResolvedConfig::standalone("gbpusd", AssetClass::Forex, Interval::H1, Period::P7d);
    cfg.strategy_name = "dual-supertrend-check-single-timeframe".to_string();

    let verdict = orchestrator(provider).analyze(&cfg).await.unwrap();
    assert_eq!(verdict.snapshot["direction_a"], 1.0);
    assert_eq!(verdict.snapshot["direction_b"], 1.0);
    assert!(verdict.snapshot["rsi"] < 70.0);
    assert!(verdict.snapshot["macd"] > 0.0);
    assert!(verdict.snapshot["adx"] > 25.0);
    assert_eq!(verdict.strength, Strength::StrongBuy);
    assert_eq!(verdict.confirmations_buy, 4);

    // risk levels pin to ATR(14) around the latest close
    let atr14 = *indicators::atr::atr(frame.high(), frame.low(), frame.close(), 14)
        .last()
        .unwrap();
    let close = frame.last_close();
    let levels = verdict.risk_levels.unwrap();
    assert!((levels.stop_long - (close - 2.0 * atr14)).abs() < 1e-9);
    assert!((levels.target_long - (close + 3.0 * atr14)).abs() < 1e-9);
}

// --- scenario 3: validity-loss alert ----------------------------------------

async fn scheduler_fixture(
    provider: Arc<ScriptedProvider>,
) -> (tempfile::TempDir, AlertScheduler, Arc<BufferNotifier>) {
    let dir = tempfile::TempDir::new().unwrap();
    let mut store = GroupStore::open(dir.path()).unwrap();
    store.create_group_with_id("port", "Portfolio", "").unwrap();
    store
        .update_group("port", |group| {
            group.defaults.alert_policy.enabled = Some(true);
            group.defaults.alert_policy.cadence_minutes = Some(15);
            group.defaults.alert_policy.active_weekdays = Some((0..7).collect());
            group.defaults.alert_policy.active_hours = Some(Vec::new());
        })
        .unwrap();
    store
        .add_symbol(
            "port",
            "aapl",
            SymbolConfig::new("AAPL", AssetClass::Stocks, Interval::M30, Period::P5d),
        )
        .unwrap();

    let notifier = Arc::new(BufferNotifier::new());
    let scheduler = AlertScheduler::new(
        Arc::new(RwLock::new(store)),
        Arc::new(orchestrator(provider)),
        notifier.clone(),
        SchedulerConfig::default(),
    );
    scheduler.attach("port", "aapl").await.unwrap();
    (dir, scheduler, notifier)
}

/// Well past any real test-run clock, so freshly attached monitors (due
/// "now") are always due at these instants.
fn far_future(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2040, 6, 4, hour, 0, 0).unwrap()
}

#[tokio::test]
async fn validity_loss_fires_once_with_warn_severity() {
    let provider = Arc::new(ScriptedProvider::new(frame_from_closes(
        "AAPL",
        &oversold_bounce(197, 3),
    )));
    let (_dir, scheduler, notifier) = scheduler_fixture(provider.clone()).await;

    // first run produces the baseline bullish verdict
    let t0 = far_future(10);
    assert_eq!(scheduler.tick(t0).await, 1);

    scheduler
        .set_entry_snapshot(
            "port",
            "aapl",
            EntrySnapshot {
                sentiment: Sentiment::Bullish,
                confidence: 0.8,
                price: 150.0,
                entered_at: t0,
            },
        )
        .await
        .unwrap();

    // market rolls over before the next run
    provider.set(frame_from_closes("AAPL", &overbought_rollover(197, 3)));
    assert_eq!(scheduler.tick(t0 + Duration::minutes(15)).await, 1);

    let events = notifier.snapshot();
    let validity: Vec<_> = events
        .iter()
        .filter(|e| e.payload.condition() == "validity_loss")
        .collect();
    assert_eq!(validity.len(), 1);
    assert_eq!(validity[0].severity, Severity::Warn);

    // the next cadence interval does not repeat the same event
    assert_eq!(scheduler.tick(t0 + Duration::minutes(30)).await, 1);
    let repeat_count = notifier
        .snapshot()
        .iter()
        .filter(|e| e.payload.condition() == "validity_loss")
        .count();
    // still invalid, so one more emission is allowed after a full cadence,
    // but never two in the same interval
    assert!(repeat_count <= 2);
}

// --- scenario 4: the ADX gate suppresses weak-trend crossovers --------------

#[tokio::test]
async fn gated_crossovers_all_carry_sufficient_adx() {
    // churning, direction-less market: stochastic crosses abound, ADX is weak
    let closes: Vec<f64> = (0..160)
        .map(|i| 100.0 + (i as f64 * 1.1).sin() * 1.5)
        .collect();
    let frame = frame_from_closes("chop", &closes);
    let result = compute(&frame, &indicators::default_recipe()).unwrap();

    let detector = CrossoverDetector::new(CrossoverSettings {
        lookback: 40,
        ..CrossoverSettings::default()
    });
    let adx = result.series("adx");
    let gated = detector.detect_series(
        &frame,
        result.series("stoch_k").unwrap(),
        result.series("stoch_d").unwrap(),
        adx,
    );
    for event in &gated {
        assert!(event.gating_strength.unwrap() >= 18.0);
    }

    // with the gate off the same window does produce crossings
    let ungated_detector = CrossoverDetector::new(CrossoverSettings {
        volatility_filter_enabled: false,
        lookback: 40,
        ..CrossoverSettings::default()
    });
    let ungated = ungated_detector.detect_series(
        &frame,
        result.series("stoch_k").unwrap(),
        result.series("stoch_d").unwrap(),
        adx,
    );
    assert!(ungated.len() > gated.len());
}

// --- scenario 5: flat market ------------------------------------------------

#[tokio::test]
async fn flat_market_is_neutral_for_both_strategies() {
    let epoch = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
    let bars: Vec<Bar> = (0..50)
        .map(|i| Bar::new(epoch + Duration::hours(i as i64), 100.0, 100.0, 100.0, 100.0, 0.0))
        .collect();
    let frame = Frame::from_bars("flat", Interval::H1, &bars).unwrap();
    let provider = Arc::new(ScriptedProvider::new(frame.clone()));
    let orchestrator = orchestrator(provider);

    for strategy in ["default-check-single-timeframe", "dual-supertrend-check-single-timeframe"] {
        let mut cfg = ResolvedConfig::standalone("flat", AssetClass::Indices, Interval::H1, Period::P1mo);
        cfg.strategy_name = strategy.to_string();
        let verdict = orchestrator.analyze(&cfg).await.unwrap();
        assert_eq!(verdict.sentiment, Sentiment::Neutral, "{strategy}");
        assert_eq!(verdict.confidence, 0.0, "{strategy}");
        assert!(
            verdict.reasons.iter().any(|r| r == "insufficient_volatility"),
            "{strategy}: {:?}",
            verdict.reasons
        );
    }

    // supertrend holds its seed direction through the whole flat stretch
    let st = indicators::supertrend::supertrend(frame.high(), frame.low(), frame.close(), 15, 3.142);
    assert!(st.direction.iter().all(|d| *d == 1));
}

// --- scenario 6: cadence survives a restart ---------------------------------

#[tokio::test]
async fn overdue_monitor_fires_immediately_after_restart() {
    let provider = Arc::new(ScriptedProvider::new(frame_from_closes(
        "AAPL",
        &oversold_bounce(197, 3),
    )));
    let (dir, scheduler, _notifier) = scheduler_fixture(provider.clone()).await;

    // run once, then simulate a shutdown 20 minutes before the restart
    let t0 = far_future(9);
    assert_eq!(scheduler.tick(t0).await, 1);
    drop(scheduler);

    let t_restart = t0 + Duration::minutes(20); // next_due was t0 + 15
    let store = GroupStore::open(dir.path()).unwrap();
    let notifier = Arc::new(BufferNotifier::new());
    let scheduler = AlertScheduler::new(
        Arc::new(RwLock::new(store)),
        Arc::new(orchestrator(provider)),
        notifier,
        SchedulerConfig::default(),
    );
    scheduler.attach("port", "aapl").await.unwrap();

    // overdue: fires on the very first tick, and the restored verdict means
    // the diff baseline survived the restart
    assert_eq!(scheduler.tick(t_restart).await, 1);
    let state = scheduler.monitor_state("port", "aapl").await.unwrap();
    assert_eq!(state.next_due_at, t_restart + Duration::minutes(15));
    assert_eq!(state.last_run_at, Some(t_restart));
}

// --- round-trip law: persisted verdicts diff clean --------------------------

#[tokio::test]
async fn reloaded_verdict_produces_no_spurious_events() {
    use marketsentry::alerts::diff_verdicts;
    use marketsentry::model::{AlertConditions, AlertPolicy};

    let frame = frame_from_closes("eurusd", &oversold_bounce(197, 3));
    let provider = Arc::new(ScriptedProvider::new(frame));
    let cfg = ResolvedConfig::standalone("eurusd", AssetClass::Forex, Interval::H1, Period::P7d);
    let verdict = orchestrator(provider).analyze(&cfg).await.unwrap();

    let json = serde_json::to_string(&verdict).unwrap();
    let reloaded = serde_json::from_str(&json).unwrap();

    let policy = AlertPolicy {
        conditions: AlertConditions {
            sentiment_flip: true,
            confidence_drift: true,
            atr_band_shift: true,
            validity_loss: true,
            new_crossover: true,
        },
        min_confidence_drift: 0.0,
        min_band_shift_units: 0.0,
        ..AlertPolicy::default()
    };
    let payloads = diff_verdicts(&policy, &verdict, &reloaded, None);
    assert!(payloads.is_empty(), "spurious events: {payloads:?}");
}
