//! Metric definitions, samples and the per-cycle sample sink.
//!
//! Definitions are immutable records built once at startup and shared by reference;
//! samples only live for the duration of one collection cycle.

use serde::Serialize;

pub const NAMESPACE: &str = "moonraker";

pub const UP: &str = "up";
pub const TEMPERATURE_CELSIUS: &str = "temperature_celsius";
pub const FAN_PERCENTAGE: &str = "fan_percentage";
pub const PRESSURE_ADVANCE_AMOUNT: &str = "pressure_advance_amount";
pub const PRESSURE_ADVANCE_SMOOTH_TIME: &str = "pressure_advance_smooth_time";

pub const LABEL_PRINTER: &str = "printer";
pub const LABEL_NAME: &str = "name";

const OBJECT_LABELS: &[&str] = &[LABEL_PRINTER, LABEL_NAME];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDef {
    /// Sample name emitted by the decoder, without namespace.
    pub key: &'static str,
    /// Fully qualified exported name.
    pub name: String,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
}

impl MetricDef {
    pub fn gauge(key: &'static str, help: &'static str, labels: &'static [&'static str]) -> Self {
        Self {
            key,
            name: format!("{NAMESPACE}_{key}"),
            help,
            kind: MetricKind::Gauge,
            labels,
        }
    }
}

/// The exporter's full metric set.
#[derive(Debug, Clone)]
pub struct MetricDefs {
    defs: Vec<MetricDef>,
}

impl MetricDefs {
    pub fn standard() -> Self {
        Self {
            defs: vec![
                MetricDef::gauge(UP, "Was the last Moonraker query successful.", &[]),
                MetricDef::gauge(TEMPERATURE_CELSIUS, "Temperature reading in degree Celsius.", OBJECT_LABELS),
                MetricDef::gauge(FAN_PERCENTAGE, "Fan speed as a fraction of full speed.", OBJECT_LABELS),
                MetricDef::gauge(PRESSURE_ADVANCE_AMOUNT, "Configured pressure advance amount.", OBJECT_LABELS),
                MetricDef::gauge(
                    PRESSURE_ADVANCE_SMOOTH_TIME,
                    "Configured pressure advance smooth time in seconds.",
                    OBJECT_LABELS,
                ),
            ],
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetricDef> {
        self.defs.iter().find(|d| d.key == key)
    }

    /// Every definition, in declaration order.
    pub fn describe(&self) -> &[MetricDef] {
        &self.defs
    }
}

/// Ordered label set; `printer` comes first, then `name`.
pub type Labels = Vec<(&'static str, String)>;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub metric_name: &'static str,
    pub labels: Labels,
    pub value: f64,
}

impl MetricSample {
    pub fn new(metric_name: &'static str, labels: Labels, value: f64) -> Self {
        Self { metric_name, labels, value }
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }
}

/// Receiver of one cycle's samples and liveness flag.
pub trait MetricSink {
    fn emit(&mut self, sample: MetricSample);

    fn set_up(&mut self, up: bool);
}

/// Samples gathered during a single cycle. Always starts empty and down.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SampleSet {
    samples: Vec<MetricSample>,
    up: bool,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    pub fn up(&self) -> bool {
        self.up
    }

    pub fn find(&self, metric_name: &str, object: &str) -> Option<&MetricSample> {
        self.samples
            .iter()
            .find(|s| s.metric_name == metric_name && s.label(LABEL_NAME) == Some(object))
    }
}

impl MetricSink for SampleSet {
    fn emit(&mut self, sample: MetricSample) {
        self.samples.push(sample);
    }

    fn set_up(&mut self, up: bool) {
        self.up = up;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_definitions() {
        let defs = MetricDefs::standard();
        let names: Vec<&str> = defs.describe().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "moonraker_up",
                "moonraker_temperature_celsius",
                "moonraker_fan_percentage",
                "moonraker_pressure_advance_amount",
                "moonraker_pressure_advance_smooth_time",
            ]
        );
        assert!(defs.get(UP).unwrap().labels.is_empty());
        assert_eq!(defs.get(FAN_PERCENTAGE).unwrap().labels, &["printer", "name"]);
        assert!(defs.get("print_duration").is_none());
    }

    #[test]
    fn test_sample_set_starts_empty_and_down() {
        let mut set = SampleSet::new();
        assert!(!set.up());
        assert!(set.samples().is_empty());

        set.emit(MetricSample::new(
            TEMPERATURE_CELSIUS,
            vec![(LABEL_PRINTER, "voron".into()), (LABEL_NAME, "extruder".into())],
            200.0,
        ));
        set.set_up(true);
        assert!(set.up());
        assert_eq!(set.find(TEMPERATURE_CELSIUS, "extruder").unwrap().value, 200.0);
        assert!(set.find(TEMPERATURE_CELSIUS, "heater_bed").is_none());
    }
}
