//! Throughput telemetry for reader structures.
//!
//! A reader forwards every item it sees and timestamps it. Each tick the
//! timestamps outside the analysis window are discarded and the rate is
//! recomputed as the inverse of the mean gap between them.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::item::Item;

/// Tuning of reader telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Analysis window in seconds.
    pub window: Fixed64,
    /// While fewer than this many samples are held the window is widened.
    pub sparse_samples: usize,
    /// Window multiplier applied while samples are sparse.
    pub sparse_window_multiplier: u32,
    /// Rates at or below this are reported as no throughput.
    pub significant_rate: Fixed64,
    /// Rates are clamped to this ceiling.
    pub max_rate: Fixed64,
    /// Seconds after the latest observation before the last item is cleared.
    pub clear_after: Fixed64,
    /// Observation list capacity; the oldest entries are dropped beyond it.
    pub max_observations: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            window: f64_to_fixed64(10.0),
            sparse_samples: 5,
            sparse_window_multiplier: 4,
            significant_rate: f64_to_fixed64(0.05),
            max_rate: f64_to_fixed64(2.0 * 23.9),
            clear_after: f64_to_fixed64(1.0),
            max_observations: 256,
        }
    }
}

/// The two values a reader exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReaderOutputs {
    pub has_throughput: bool,
    pub last_item: Option<Item>,
}

/// Rolling observation list plus the last computed outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderTelemetry {
    observations: VecDeque<Fixed64>,
    last_item: Option<Item>,
    rate: Fixed64,
    has_throughput: bool,
}

impl ReaderTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an item passing through at time `now`.
    pub fn observe(&mut self, now: Fixed64, item: Item, config: &ReaderConfig) {
        self.observations.push_back(now);
        while self.observations.len() > config.max_observations.max(1) {
            self.observations.pop_front();
        }
        self.last_item = Some(item);
    }

    /// Recompute outputs at time `now`. `charge_in_flight` reports whether
    /// the reader still has unfinished work.
    pub fn update(&mut self, now: Fixed64, charge_in_flight: bool, config: &ReaderConfig) {
        let mut window = config.window;
        if self.observations.len() < config.sparse_samples {
            window = window
                .saturating_mul(Fixed64::saturating_from_num(config.sparse_window_multiplier));
        }
        let cutoff = now.saturating_sub(window);
        while self.observations.front().is_some_and(|&t| t < cutoff) {
            self.observations.pop_front();
        }

        self.rate = self.compute_rate(config);
        self.has_throughput = self.rate > config.significant_rate;

        if !self.has_throughput && !charge_in_flight {
            let stale = match self.observations.back() {
                Some(&latest) => latest < now - config.clear_after,
                None => true,
            };
            if stale {
                self.last_item = None;
            }
        }
    }

    fn compute_rate(&self, config: &ReaderConfig) -> Fixed64 {
        let (Some(&first), Some(&last)) = (self.observations.front(), self.observations.back())
        else {
            return Fixed64::ZERO;
        };
        let gaps = self.observations.len() - 1;
        if gaps == 0 {
            return Fixed64::ZERO;
        }
        let span = last - first;
        if span <= Fixed64::ZERO {
            return config.max_rate;
        }
        // Mean gap is span / gaps, so the rate is gaps / span.
        match Fixed64::from_num(gaps).checked_div(span) {
            Some(rate) => rate.min(config.max_rate),
            None => config.max_rate,
        }
    }

    pub fn outputs(&self) -> ReaderOutputs {
        ReaderOutputs {
            has_throughput: self.has_throughput,
            last_item: self.last_item,
        }
    }

    /// Items per second as of the last update.
    pub fn rate(&self) -> Fixed64 {
        self.rate
    }

    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::fixed::fixed64_to_f64;

    fn t(v: f64) -> Fixed64 {
        f64_to_fixed64(v)
    }

    fn item() -> Item {
        Item::Color(Color::Red)
    }

    #[test]
    fn steady_flow_reports_rate() {
        let config = ReaderConfig::default();
        let mut tel = ReaderTelemetry::new();
        for i in 0..6 {
            tel.observe(t(i as f64 * 0.5), item(), &config);
        }
        tel.update(t(2.5), false, &config);
        assert!((fixed64_to_f64(tel.rate()) - 2.0).abs() < 1e-6);
        assert!(tel.outputs().has_throughput);
        assert_eq!(tel.outputs().last_item, Some(item()));
    }

    #[test]
    fn single_sample_has_no_rate() {
        let config = ReaderConfig::default();
        let mut tel = ReaderTelemetry::new();
        tel.observe(t(1.0), item(), &config);
        tel.update(t(1.0), false, &config);
        assert_eq!(tel.rate(), Fixed64::ZERO);
        assert!(!tel.outputs().has_throughput);
        // Latest observation is fresh, so the item stays visible.
        assert_eq!(tel.outputs().last_item, Some(item()));
    }

    #[test]
    fn simultaneous_samples_clamp_to_max() {
        let config = ReaderConfig::default();
        let mut tel = ReaderTelemetry::new();
        tel.observe(t(1.0), item(), &config);
        tel.observe(t(1.0), item(), &config);
        tel.update(t(1.0), false, &config);
        assert_eq!(tel.rate(), config.max_rate);
    }

    #[test]
    fn sparse_samples_use_wider_window() {
        let config = ReaderConfig::default();
        let mut tel = ReaderTelemetry::new();
        tel.observe(t(0.0), item(), &config);
        tel.observe(t(1.0), item(), &config);
        // 20 s later the samples are outside 10 s but inside 40 s.
        tel.update(t(20.0), false, &config);
        assert_eq!(tel.observation_count(), 2);
        tel.update(t(41.0), false, &config);
        assert_eq!(tel.observation_count(), 0);
    }

    #[test]
    fn stale_item_cleared_when_idle() {
        let config = ReaderConfig::default();
        let mut tel = ReaderTelemetry::new();
        tel.observe(t(0.0), item(), &config);
        tel.update(t(0.5), false, &config);
        assert_eq!(tel.outputs().last_item, Some(item()));
        tel.update(t(2.0), true, &config);
        assert_eq!(tel.outputs().last_item, Some(item()));
        tel.update(t(2.0), false, &config);
        assert_eq!(tel.outputs().last_item, None);
    }

    #[test]
    fn huge_window_saturates_instead_of_overflowing() {
        let config = ReaderConfig {
            window: f64_to_fixed64(1.0e9),
            sparse_window_multiplier: u32::MAX,
            ..ReaderConfig::default()
        };
        let mut tel = ReaderTelemetry::new();
        tel.observe(t(0.0), item(), &config);
        tel.update(t(100.0), false, &config);
        assert_eq!(tel.observation_count(), 1);
    }

    #[test]
    fn observation_list_is_bounded() {
        let config = ReaderConfig {
            max_observations: 4,
            ..ReaderConfig::default()
        };
        let mut tel = ReaderTelemetry::new();
        for i in 0..10 {
            tel.observe(t(i as f64 * 0.1), item(), &config);
        }
        assert_eq!(tel.observation_count(), 4);
    }
}
