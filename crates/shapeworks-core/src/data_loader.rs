//! Data-driven engine configuration from JSON.
//!
//! Feature-gated behind `data-loader`. Numbers in the file are plain
//! decimals; they are converted to [`Fixed64`] once, here. Every field is
//! optional and falls back to [`EngineConfig::default`].

use std::collections::BTreeMap;

use crate::config::{EngineConfig, ProcessorSpeeds};
use crate::fixed::{Fixed64, period_of};
use crate::processor::ProcessorKind;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("unknown processor kind: {0}")]
    UnknownProcessorKind(String),
    #[error("speed for {0} must be positive")]
    NonPositiveSpeed(String),
    #[error("speed for {0} is too small to give a charge duration")]
    SpeedTooSmall(String),
    #[error("{field} = {value} does not fit the fixed-point range")]
    OutOfRange { field: String, value: f64 },
}

// ---------------------------------------------------------------------------
// JSON data structures
// ---------------------------------------------------------------------------

/// Top-level configuration file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfigData {
    /// Base speed per processor kind name, e.g. `"cutter": 0.5`.
    #[serde(default)]
    pub speeds: BTreeMap<String, f64>,
    /// Speed for kinds absent from `speeds`. When set, the built-in table is
    /// not used.
    #[serde(default)]
    pub default_speed: Option<f64>,
    #[serde(default)]
    pub reader: ReaderData,
    #[serde(default)]
    pub event_capacity: Option<usize>,
}

/// Reader tuning; absent fields keep their defaults.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReaderData {
    pub window: Option<f64>,
    pub sparse_samples: Option<usize>,
    pub sparse_window_multiplier: Option<u32>,
    pub significant_rate: Option<f64>,
    pub max_rate: Option<f64>,
    pub clear_after: Option<f64>,
    pub max_observations: Option<usize>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load an engine configuration from a JSON string.
pub fn load_config_json(json: &str) -> Result<EngineConfig, DataLoadError> {
    let data: EngineConfigData = serde_json::from_str(json)?;
    build_config(data)
}

/// Load an engine configuration from JSON bytes.
pub fn load_config_json_bytes(bytes: &[u8]) -> Result<EngineConfig, DataLoadError> {
    let data: EngineConfigData = serde_json::from_slice(bytes)?;
    build_config(data)
}

fn to_fixed(field: &str, value: f64) -> Result<Fixed64, DataLoadError> {
    Fixed64::checked_from_num(value).ok_or_else(|| DataLoadError::OutOfRange {
        field: field.to_string(),
        value,
    })
}

fn positive_speed(name: &str, value: f64) -> Result<Fixed64, DataLoadError> {
    let speed = to_fixed(name, value)?;
    if speed <= Fixed64::ZERO {
        return Err(DataLoadError::NonPositiveSpeed(name.to_string()));
    }
    if period_of(speed).is_none() {
        return Err(DataLoadError::SpeedTooSmall(name.to_string()));
    }
    Ok(speed)
}

fn build_config(data: EngineConfigData) -> Result<EngineConfig, DataLoadError> {
    let mut config = EngineConfig::default();

    if let Some(fallback) = data.default_speed {
        config.speeds = ProcessorSpeeds::uniform(positive_speed("default_speed", fallback)?);
    }
    for (name, value) in &data.speeds {
        let kind = ProcessorKind::from_name(name)
            .ok_or_else(|| DataLoadError::UnknownProcessorKind(name.clone()))?;
        config.speeds.set(kind, positive_speed(name, *value)?);
    }

    let reader = &mut config.reader;
    let r = data.reader;
    if let Some(v) = r.window {
        reader.window = to_fixed("reader.window", v)?;
    }
    if let Some(v) = r.sparse_samples {
        reader.sparse_samples = v;
    }
    if let Some(v) = r.sparse_window_multiplier {
        reader.sparse_window_multiplier = v;
    }
    if let Some(v) = r.significant_rate {
        reader.significant_rate = to_fixed("reader.significant_rate", v)?;
    }
    if let Some(v) = r.max_rate {
        reader.max_rate = to_fixed("reader.max_rate", v)?;
    }
    if let Some(v) = r.clear_after {
        reader.clear_after = to_fixed("reader.clear_after", v)?;
    }
    if let Some(v) = r.max_observations {
        reader.max_observations = v;
    }

    if let Some(capacity) = data.event_capacity {
        config.event_capacity = capacity;
    }
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64;

    #[test]
    fn load_empty_json_gives_defaults() {
        let config = load_config_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn load_speed_overrides() {
        let json = r#"{"speeds": {"cutter": 2.0, "painter_quad": 0.25}}"#;
        let config = load_config_json(json).unwrap();
        assert_eq!(config.speeds.get(ProcessorKind::Cutter), f64_to_fixed64(2.0));
        assert_eq!(config.speeds.get(ProcessorKind::PainterQuad), f64_to_fixed64(0.25));
        // Untouched kinds keep the built-in table.
        assert_eq!(config.speeds.get(ProcessorKind::Link), f64_to_fixed64(2.0));
        assert_eq!(config.speeds.get(ProcessorKind::Hub), f64_to_fixed64(100.0));
    }

    #[test]
    fn default_speed_replaces_table() {
        let json = r#"{"default_speed": 3.0, "speeds": {"hub": 50.0}}"#;
        let config = load_config_json(json).unwrap();
        assert_eq!(config.speeds.get(ProcessorKind::Cutter), f64_to_fixed64(3.0));
        assert_eq!(config.speeds.get(ProcessorKind::Hub), f64_to_fixed64(50.0));
    }

    #[test]
    fn load_reader_tuning() {
        let json = r#"{"reader": {"window": 5.0, "max_observations": 16}, "event_capacity": 8}"#;
        let config = load_config_json(json).unwrap();
        assert_eq!(config.reader.window, f64_to_fixed64(5.0));
        assert_eq!(config.reader.max_observations, 16);
        assert_eq!(config.reader.sparse_samples, 5);
        assert_eq!(config.event_capacity, 8);
    }

    #[test]
    fn load_unknown_kind_fails() {
        let err = load_config_json(r#"{"speeds": {"furnace": 1.0}}"#).unwrap_err();
        assert!(matches!(err, DataLoadError::UnknownProcessorKind(name) if name == "furnace"));
    }

    #[test]
    fn load_non_positive_speed_fails() {
        let err = load_config_json(r#"{"speeds": {"mixer": 0.0}}"#).unwrap_err();
        assert!(matches!(err, DataLoadError::NonPositiveSpeed(_)));
    }

    #[test]
    fn load_out_of_range_values_fail() {
        let err = load_config_json(r#"{"speeds": {"cutter": 1e20}}"#).unwrap_err();
        assert!(matches!(err, DataLoadError::OutOfRange { ref field, .. } if field == "cutter"));

        let err = load_config_json(r#"{"reader": {"window": 1e30}}"#).unwrap_err();
        assert!(
            matches!(err, DataLoadError::OutOfRange { ref field, .. } if field == "reader.window")
        );

        let err = load_config_json(r#"{"default_speed": -1e12}"#).unwrap_err();
        assert!(matches!(err, DataLoadError::OutOfRange { .. }));
    }

    #[test]
    fn load_speed_without_charge_duration_fails() {
        let err = load_config_json(r#"{"speeds": {"cutter": 3e-10}}"#).unwrap_err();
        assert!(matches!(err, DataLoadError::SpeedTooSmall(name) if name == "cutter"));
        // Slow but representable speeds still load.
        let config = load_config_json(r#"{"speeds": {"cutter": 0.001}}"#).unwrap();
        assert!(period_of(config.speeds.get(ProcessorKind::Cutter)).is_some());
    }

    #[test]
    fn load_invalid_json_fails() {
        assert!(matches!(
            load_config_json("{not json"),
            Err(DataLoadError::JsonParse(_))
        ));
        assert!(load_config_json_bytes(br#"{"unknown": 1}"#).is_err());
    }
}
