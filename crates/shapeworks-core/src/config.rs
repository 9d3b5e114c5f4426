//! Engine configuration: base processing speeds and reader tuning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::processor::ProcessorKind;
use crate::reader::ReaderConfig;

/// Base processing rate lookup, in charges per second.
pub trait BaseRates: std::fmt::Debug {
    fn base_speed(&self, kind: ProcessorKind) -> Fixed64;
}

/// Base speed per processor kind. Kinds without an entry fall back to
/// `fallback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorSpeeds {
    speeds: BTreeMap<ProcessorKind, Fixed64>,
    fallback: Fixed64,
}

impl ProcessorSpeeds {
    /// Every kind runs at `speed`.
    pub fn uniform(speed: Fixed64) -> Self {
        Self {
            speeds: BTreeMap::new(),
            fallback: speed,
        }
    }

    pub fn set(&mut self, kind: ProcessorKind, speed: Fixed64) {
        self.speeds.insert(kind, speed);
    }

    pub fn with(mut self, kind: ProcessorKind, speed: Fixed64) -> Self {
        self.set(kind, speed);
        self
    }

    pub fn get(&self, kind: ProcessorKind) -> Fixed64 {
        self.speeds.get(&kind).copied().unwrap_or(self.fallback)
    }
}

impl Default for ProcessorSpeeds {
    fn default() -> Self {
        let table: [(ProcessorKind, f64); 18] = [
            (ProcessorKind::Link, 2.0),
            (ProcessorKind::Balancer, 4.0),
            (ProcessorKind::Cutter, 0.5),
            (ProcessorKind::CutterQuad, 0.4),
            (ProcessorKind::CutterLaser, 0.5),
            (ProcessorKind::Rotater, 1.0),
            (ProcessorKind::RotaterCcw, 1.0),
            (ProcessorKind::Rotater180, 1.0),
            (ProcessorKind::Stacker, 0.4),
            (ProcessorKind::SmartStacker, 0.4),
            (ProcessorKind::ShapeMerger, 0.4),
            (ProcessorKind::Trash, 100.0),
            (ProcessorKind::Mixer, 0.5),
            (ProcessorKind::Painter, 0.5),
            (ProcessorKind::PainterDouble, 0.4),
            (ProcessorKind::PainterQuad, 0.3),
            (ProcessorKind::Hub, 100.0),
            (ProcessorKind::Reader, 6.0),
        ];
        Self {
            speeds: table
                .into_iter()
                .map(|(kind, speed)| (kind, f64_to_fixed64(speed)))
                .collect(),
            fallback: Fixed64::from_num(1),
        }
    }
}

impl BaseRates for ProcessorSpeeds {
    fn base_speed(&self, kind: ProcessorKind) -> Fixed64 {
        self.get(kind)
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub speeds: ProcessorSpeeds,
    pub reader: ReaderConfig,
    /// Per-kind event buffer capacity.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            speeds: ProcessorSpeeds::default(),
            reader: ReaderConfig::default(),
            event_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_kind() {
        let speeds = ProcessorSpeeds::default();
        for kind in ProcessorKind::ALL {
            assert!(speeds.base_speed(kind) > Fixed64::ZERO, "{kind:?}");
        }
        assert_eq!(speeds.get(ProcessorKind::Cutter), f64_to_fixed64(0.5));
    }

    #[test]
    fn uniform_speeds_with_override() {
        let speeds = ProcessorSpeeds::uniform(Fixed64::from_num(2))
            .with(ProcessorKind::Mixer, Fixed64::from_num(8));
        assert_eq!(speeds.get(ProcessorKind::Cutter), Fixed64::from_num(2));
        assert_eq!(speeds.get(ProcessorKind::Mixer), Fixed64::from_num(8));
    }
}
