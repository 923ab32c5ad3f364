//! Affection meter: tiers, tweens and floating delta indicators.
//!
//! The meter is advanced by a frame clock ([`Meter::on_frame`]) rather than
//! by its own timers, so a frame can be rendered at any instant and tests can
//! step time explicitly.

use std::f64::consts::PI;
use std::time::Duration;

use tokio::time::Instant;

use crate::session::{ResolvedState, DEFAULT_RELATIONSHIP, DEFAULT_SCENE};

/// Closeness shown before the first sync and used for unreadable values.
pub const DEFAULT_CLOSENESS: i32 = 30;
pub const MIN_CLOSENESS: i32 = 0;
pub const MAX_CLOSENESS: i32 = 100;

/// Duration of the label and bar tweens.
pub const TWEEN_DURATION: Duration = Duration::from_millis(800);

/// Lifetime of a delta indicator, from spawn to removal.
pub const INDICATOR_DURATION: Duration = Duration::from_millis(1500);

/// Clamp any server value into the displayable range.
pub fn clamp_closeness(value: i64) -> i32 {
    value.clamp(MIN_CLOSENESS as i64, MAX_CLOSENESS as i64) as i32
}

/// Color bucket of the affection bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Danger,
    Warning,
    Info,
    Success,
}

impl Tier {
    /// Bucket for a closeness value. Thresholds are checked from the top.
    pub fn for_closeness(closeness: i32) -> Self {
        if closeness >= 80 {
            Tier::Success
        } else if closeness >= 50 {
            Tier::Info
        } else if closeness >= 30 {
            Tier::Warning
        } else {
            Tier::Danger
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Danger => "danger",
            Tier::Warning => "warning",
            Tier::Info => "info",
            Tier::Success => "success",
        }
    }
}

/// Styling of a delta indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Success,
    Danger,
}

/// Interpolation curve for a [`Tween`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Slow start and end: `0.5 - cos(p * PI) / 2`.
    Swing,
}

impl Easing {
    fn apply(self, p: f64) -> f64 {
        match self {
            Easing::Linear => p,
            Easing::Swing => 0.5 - (p * PI).cos() / 2.0,
        }
    }
}

/// A value moving from `from` to `to` over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    start: Instant,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    pub fn new(from: f64, to: f64, start: Instant, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            easing,
        }
    }

    /// Fraction of the duration elapsed at `now`, in [0, 1].
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn value_at(&self, now: Instant) -> f64 {
        let p = self.progress(now);
        if p >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * self.easing.apply(p)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

/// Floating "+n" / "-n" marker spawned when closeness changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaIndicator {
    pub delta: i32,
    spawned_at: Instant,
}

impl DeltaIndicator {
    pub fn new(delta: i32, spawned_at: Instant) -> Self {
        Self { delta, spawned_at }
    }

    pub fn text(&self) -> String {
        if self.delta > 0 {
            format!("+{}", self.delta)
        } else {
            self.delta.to_string()
        }
    }

    pub fn sentiment(&self) -> Sentiment {
        if self.delta > 0 {
            Sentiment::Success
        } else {
            Sentiment::Danger
        }
    }

    /// Eased animation progress in [0, 1]; drives both rise and fade.
    pub fn progress(&self, now: Instant) -> f64 {
        Tween::new(0.0, 1.0, self.spawned_at, INDICATOR_DURATION, Easing::Swing).value_at(now)
    }

    pub fn opacity(&self, now: Instant) -> f64 {
        1.0 - self.progress(now)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.spawned_at) >= INDICATOR_DURATION
    }
}

/// What a single sync did to the meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub old: i32,
    pub new: i32,
    pub tier: Tier,
}

impl SyncOutcome {
    pub fn changed(&self) -> bool {
        self.old != self.new
    }
}

/// Displayed affection meter.
#[derive(Debug, Clone)]
pub struct Meter {
    label: i32,
    bar: f64,
    tier: Tier,
    relationship: String,
    scene: String,
    label_tween: Option<Tween>,
    bar_tween: Option<Tween>,
    indicators: Vec<DeltaIndicator>,
    indicators_spawned: usize,
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

impl Meter {
    pub fn new() -> Self {
        Self {
            label: DEFAULT_CLOSENESS,
            bar: DEFAULT_CLOSENESS as f64,
            tier: Tier::for_closeness(DEFAULT_CLOSENESS),
            relationship: DEFAULT_RELATIONSHIP.to_string(),
            scene: DEFAULT_SCENE.to_string(),
            label_tween: None,
            bar_tween: None,
            indicators: Vec::new(),
            indicators_spawned: 0,
        }
    }

    /// The number currently written on the label, mid-tween included.
    pub fn displayed_closeness(&self) -> i32 {
        self.label
    }

    /// Current bar width in percent.
    pub fn bar_width(&self) -> f64 {
        self.bar
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn relationship(&self) -> &str {
        &self.relationship
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn indicators(&self) -> &[DeltaIndicator] {
        &self.indicators
    }

    /// Total indicators created over the meter's lifetime.
    pub fn indicators_spawned(&self) -> usize {
        self.indicators_spawned
    }

    pub fn is_animating(&self) -> bool {
        self.label_tween.is_some() || self.bar_tween.is_some() || !self.indicators.is_empty()
    }

    /// Apply a resolved server state.
    ///
    /// A change against the displayed label spawns one indicator and starts
    /// both tweens; an unchanged value is written directly.
    pub fn sync(&mut self, resolved: &ResolvedState, now: Instant) -> SyncOutcome {
        let old = self.label;
        let new = resolved.closeness;

        if old != new {
            self.indicators.push(DeltaIndicator::new(new - old, now));
            self.indicators_spawned += 1;
            self.label_tween = Some(Tween::new(
                old as f64,
                new as f64,
                now,
                TWEEN_DURATION,
                Easing::Swing,
            ));
            self.bar_tween = Some(Tween::new(
                old as f64,
                new as f64,
                now,
                TWEEN_DURATION,
                Easing::Linear,
            ));
        } else {
            self.label_tween = None;
            self.bar_tween = None;
            self.label = new;
            self.bar = new as f64;
        }

        self.tier = Tier::for_closeness(new);
        self.relationship = resolved.relationship.clone();
        self.scene = resolved.scene.clone();

        SyncOutcome {
            old,
            new,
            tier: self.tier,
        }
    }

    /// Advance tweens and drop expired indicators.
    pub fn on_frame(&mut self, now: Instant) {
        if let Some(tween) = self.label_tween {
            if tween.is_finished(now) {
                self.label = tween.to.round() as i32;
                self.label_tween = None;
            } else {
                self.label = tween.value_at(now).round() as i32;
            }
        }

        if let Some(tween) = self.bar_tween {
            if tween.is_finished(now) {
                self.bar = tween.to;
                self.bar_tween = None;
            } else {
                self.bar = tween.value_at(now);
            }
        }

        self.indicators.retain(|i| !i.is_expired(now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(closeness: i32) -> ResolvedState {
        ResolvedState {
            closeness,
            relationship: "Friends".to_string(),
            scene: "Library".to_string(),
        }
    }

    #[test]
    fn test_tier_boundaries() {
        let cases = [
            (0, Tier::Danger),
            (29, Tier::Danger),
            (30, Tier::Warning),
            (49, Tier::Warning),
            (50, Tier::Info),
            (79, Tier::Info),
            (80, Tier::Success),
            (100, Tier::Success),
        ];
        for (value, tier) in cases {
            assert_eq!(Tier::for_closeness(value), tier, "closeness {value}");
        }
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp_closeness(-1), 0);
        assert_eq!(clamp_closeness(101), 100);
        assert_eq!(clamp_closeness(i64::MAX), 100);
        assert_eq!(clamp_closeness(42), 42);
    }

    #[test]
    fn test_indicator_text_and_sentiment() {
        let now = Instant::now();
        let up = DeltaIndicator::new(15, now);
        assert_eq!(up.text(), "+15");
        assert_eq!(up.sentiment(), Sentiment::Success);

        let down = DeltaIndicator::new(-10, now);
        assert_eq!(down.text(), "-10");
        assert_eq!(down.sentiment(), Sentiment::Danger);
    }

    #[test]
    fn test_linear_tween() {
        let start = Instant::now();
        let tween = Tween::new(30.0, 50.0, start, TWEEN_DURATION, Easing::Linear);
        assert_eq!(tween.value_at(start), 30.0);
        assert!((tween.value_at(start + Duration::from_millis(400)) - 40.0).abs() < 1e-9);
        assert_eq!(tween.value_at(start + TWEEN_DURATION), 50.0);
        assert_eq!(tween.value_at(start + Duration::from_secs(5)), 50.0);
    }

    #[test]
    fn test_swing_tween_is_symmetric() {
        let start = Instant::now();
        let tween = Tween::new(0.0, 100.0, start, TWEEN_DURATION, Easing::Swing);
        let mid = tween.value_at(start + Duration::from_millis(400));
        assert!((mid - 50.0).abs() < 1e-6);
        let early = tween.value_at(start + Duration::from_millis(100));
        assert!(early < 12.5, "swing starts slower than linear, got {early}");
    }

    #[test]
    fn test_unchanged_sync_sets_directly() {
        let now = Instant::now();
        let mut meter = Meter::new();
        let outcome = meter.sync(&resolved(30), now);

        assert!(!outcome.changed());
        assert_eq!(meter.indicators_spawned(), 0);
        assert!(meter.indicators().is_empty());
        assert_eq!(meter.displayed_closeness(), 30);
        assert_eq!(meter.bar_width(), 30.0);
        assert!(!meter.is_animating());
        assert_eq!(meter.relationship(), "Friends");
        assert_eq!(meter.scene(), "Library");
    }

    #[test]
    fn test_rise_to_45() {
        let start = Instant::now();
        let mut meter = Meter::new();
        let outcome = meter.sync(&resolved(45), start);

        assert_eq!(outcome.old, 30);
        assert_eq!(outcome.new, 45);
        assert_eq!(outcome.tier, Tier::Warning);
        assert_eq!(meter.indicators().len(), 1);
        assert_eq!(meter.indicators()[0].text(), "+15");
        assert_eq!(meter.indicators()[0].sentiment(), Sentiment::Success);

        // Label and bar start from the old value.
        meter.on_frame(start);
        assert_eq!(meter.displayed_closeness(), 30);
        assert_eq!(meter.bar_width(), 30.0);

        meter.on_frame(start + Duration::from_millis(400));
        assert!((meter.bar_width() - 37.5).abs() < 1e-9);
        let mid_label = meter.displayed_closeness();
        assert!((30..=45).contains(&mid_label));

        meter.on_frame(start + TWEEN_DURATION);
        assert_eq!(meter.displayed_closeness(), 45);
        assert_eq!(meter.bar_width(), 45.0);

        // The indicator outlives the tweens and then goes away.
        assert_eq!(meter.indicators().len(), 1);
        meter.on_frame(start + INDICATOR_DURATION);
        assert!(meter.indicators().is_empty());
        assert!(!meter.is_animating());
        assert_eq!(meter.indicators_spawned(), 1);
    }

    #[test]
    fn test_drop_to_20() {
        let start = Instant::now();
        let mut meter = Meter::new();
        let outcome = meter.sync(&resolved(20), start);

        assert_eq!(outcome.tier, Tier::Danger);
        assert_eq!(meter.tier(), Tier::Danger);
        assert_eq!(meter.indicators()[0].text(), "-10");
        assert_eq!(meter.indicators()[0].sentiment(), Sentiment::Danger);

        meter.on_frame(start + Duration::from_secs(2));
        assert_eq!(meter.displayed_closeness(), 20);
        assert_eq!(meter.bar_width(), 20.0);
    }

    #[test]
    fn test_indicator_fades() {
        let start = Instant::now();
        let indicator = DeltaIndicator::new(5, start);
        assert_eq!(indicator.opacity(start), 1.0);
        assert!(!indicator.is_expired(start + Duration::from_millis(1499)));
        assert!(indicator.is_expired(start + INDICATOR_DURATION));
        assert_eq!(indicator.opacity(start + INDICATOR_DURATION), 0.0);
    }
}
