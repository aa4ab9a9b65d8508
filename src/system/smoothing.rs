use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use super::census::TaskCounts;
use super::entity::{EntityId, EntityKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricKind {
    CpuUsage,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothingConfig {
    /// Above this distance from the stable value, track with `large_swing_weight`.
    pub large_swing_threshold: f64,
    pub large_swing_weight: f64,
    /// Above this (and up to the large threshold), track with `small_drift_weight`.
    /// At or below it the stable value does not move.
    pub small_drift_threshold: f64,
    pub small_drift_weight: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        SmoothingConfig {
            large_swing_threshold: 5.0,
            large_swing_weight: 0.3,
            small_drift_threshold: 1.0,
            small_drift_weight: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothingState {
    pub stable: f64,
    pub last_raw: f64,
    pub last_update: Instant,
}

impl SmoothingState {
    pub fn new(stable: f64, at: Instant) -> Self {
        Self {
            stable,
            last_raw: stable,
            last_update: at,
        }
    }

    pub fn update(&mut self, raw: f64, at: Instant, config: &SmoothingConfig) -> f64 {
        let diff = (raw - self.stable).abs();
        if diff > config.large_swing_threshold {
            self.stable =
                config.large_swing_weight * raw + (1.0 - config.large_swing_weight) * self.stable;
        } else if diff > config.small_drift_threshold {
            self.stable =
                config.small_drift_weight * raw + (1.0 - config.small_drift_weight) * self.stable;
        }
        self.last_raw = raw;
        self.last_update = at;
        self.stable
    }

    pub fn displayed(&self) -> f64 {
        self.stable.round()
    }
}

/// Per-entity, per-metric smoothing state.
#[derive(Debug, Default)]
pub struct Smoother {
    config: SmoothingConfig,
    states: HashMap<(EntityId, MetricKind), SmoothingState>,
}

impl Smoother {
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
        }
    }

    /// Feeds one raw value and returns the rounded stable value.
    /// The first value seen for an entity seeds its stable value directly.
    pub fn update(&mut self, entity: &EntityId, kind: MetricKind, raw: f64, at: Instant) -> f64 {
        let raw = if raw.is_finite() { raw } else { 0.0 };
        let key = (entity.clone(), kind);
        match self.states.get_mut(&key) {
            Some(state) => {
                state.update(raw, at, &self.config);
                state.displayed()
            }
            None => {
                let state = SmoothingState::new(raw, at);
                self.states.insert(key, state);
                state.displayed()
            }
        }
    }

    pub fn state(&self, entity: &EntityId, kind: MetricKind) -> Option<&SmoothingState> {
        self.states.get(&(entity.clone(), kind))
    }

    /// Rounded stable value, zero for an entity never fed.
    pub fn displayed(&self, entity: &EntityId, kind: MetricKind) -> f64 {
        self.state(entity, kind)
            .map(SmoothingState::displayed)
            .unwrap_or(0.0)
    }

    pub fn evict(&mut self, entity: &EntityId) {
        self.states.retain(|(id, _), _| id != entity);
    }

    pub fn retain_seen(&mut self, kind: EntityKind, seen: &HashSet<EntityId>) {
        self.states
            .retain(|(id, _), _| id.kind() != kind || seen.contains(id));
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CensusConfig {
    /// Raw counts are only considered once every `window` updates.
    pub window: u32,
    /// A bucket moves only when it changed by more than this since the last window.
    pub threshold: u32,
    /// Weight of the new raw count in the exponential filter.
    pub weight: f64,
}

impl Default for CensusConfig {
    fn default() -> Self {
        CensusConfig {
            window: 5,
            threshold: 2,
            weight: 0.7,
        }
    }
}

/// Windowed, thresholded filter over the four census buckets.
#[derive(Debug, Default)]
pub struct CensusSmoother {
    config: CensusConfig,
    smoothed: TaskCounts,
    last_raw: TaskCounts,
    cycles: u32,
}

impl CensusSmoother {
    pub fn new(config: CensusConfig) -> Self {
        Self {
            config,
            smoothed: TaskCounts::default(),
            last_raw: TaskCounts::default(),
            cycles: 0,
        }
    }

    pub fn update(&mut self, raw: TaskCounts) -> TaskCounts {
        self.cycles += 1;

        if self.cycles >= self.config.window.max(1) {
            self.cycles = 0;
            let raw_buckets = raw.buckets();
            let last_buckets = self.last_raw.buckets();
            let mut smoothed = self.smoothed.buckets();
            for i in 0..smoothed.len() {
                if raw_buckets[i].abs_diff(last_buckets[i]) > self.config.threshold {
                    smoothed[i] = (self.config.weight * raw_buckets[i] as f64
                        + (1.0 - self.config.weight) * smoothed[i] as f64)
                        as u32;
                }
            }
            self.smoothed = TaskCounts::from_buckets(smoothed);
            self.last_raw = raw;
        }

        // Cold start: nothing smoothed yet, adopt the raw census as is.
        if self.smoothed.is_zero() {
            self.smoothed = raw;
        }
        self.smoothed
    }

    pub fn current(&self) -> TaskCounts {
        self.smoothed
    }

    pub fn reset(&mut self) {
        self.smoothed = TaskCounts::default();
        self.last_raw = TaskCounts::default();
        self.cycles = 0;
    }
}

/// Opens at most once per `interval` of wall-clock time.
#[derive(Debug, Clone)]
pub struct RefreshGate {
    interval: Duration,
    last_open: Option<Instant>,
}

impl RefreshGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_open: None,
        }
    }

    /// True on the first call and whenever `interval` has passed since the
    /// last time it returned true.
    pub fn ready(&mut self, now: Instant) -> bool {
        let open = match self.last_open {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if open {
            self.last_open = Some(now);
        }
        open
    }

    pub fn reset(&mut self) {
        self.last_open = None;
    }
}
