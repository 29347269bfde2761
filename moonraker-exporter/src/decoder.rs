/**
 * TYPE DECODER - Maps raw Moonraker object status onto typed metric samples
 *
 * ROLE : For each catalog object, looks up its entry in the status map, projects
 * it onto the shape selected by its type tag and derives the metric samples.
 *
 * | Type           | Exported                                                          |
 * |----------------|-------------------------------------------------------------------|
 * | Extruder       | temperature_celsius, pressure_advance_amount, pressure_advance_smooth_time |
 * | HeaterBed      | temperature_celsius                                               |
 * | Fan            | fan_percentage                                                    |
 * | TemperatureFan | temperature_celsius, fan_percentage                               |
 * | PrintStats     | decoded, nothing exported yet                                     |
 * | Unknown        | nothing, warning logged                                           |
 */

use crate::catalog::{ObjectDeclaration, TypeTag};
use crate::fields::{project, FieldBag};
use crate::metrics::{
    Labels, MetricSample, FAN_PERCENTAGE, LABEL_NAME, LABEL_PRINTER, PRESSURE_ADVANCE_AMOUNT,
    PRESSURE_ADVANCE_SMOOTH_TIME, TEMPERATURE_CELSIUS,
};
use crate::models::{DecodedObject, RawStatusMap};
use tracing::{trace, warn};

/// Projects one object's status according to its declared type.
/// Returns `None` for unknown types. An object missing from `raw` decodes to zero values.
pub fn decode_object(decl: &ObjectDeclaration, raw: &RawStatusMap) -> Option<DecodedObject> {
    let empty = FieldBag::new();
    let bag = raw.get(&decl.name).unwrap_or_else(|| {
        trace!(object = %decl.name, "object absent from status, using defaults");
        &empty
    });
    let name = decl.name.as_str();

    let decoded = match &decl.type_tag {
        TypeTag::Extruder => DecodedObject::Extruder(project(name, bag)),
        TypeTag::HeaterBed => DecodedObject::HeaterBed(project(name, bag)),
        TypeTag::Fan => DecodedObject::Fan(project(name, bag)),
        TypeTag::TemperatureFan => DecodedObject::TemperatureFan(project(name, bag)),
        TypeTag::PrintStats => DecodedObject::PrintStats(project(name, bag)),
        TypeTag::Unknown(raw_tag) => {
            warn!(object = %decl.name, type_tag = %raw_tag, "unrecognized object type, skipping");
            return None;
        }
    };
    Some(decoded)
}

/// Turns decoded objects into samples labelled with the configured printer tag.
#[derive(Debug, Clone)]
pub struct Decoder {
    printer: String,
}

impl Decoder {
    pub fn new(printer: impl Into<String>) -> Self {
        Self { printer: printer.into() }
    }

    pub fn printer(&self) -> &str {
        &self.printer
    }

    pub fn decode(&self, decl: &ObjectDeclaration, raw: &RawStatusMap) -> Vec<MetricSample> {
        match decode_object(decl, raw) {
            Some(decoded) => self.samples(&decl.name, &decoded),
            None => Vec::new(),
        }
    }

    pub fn samples(&self, name: &str, decoded: &DecodedObject) -> Vec<MetricSample> {
        let sample = |metric: &'static str, value: f64| MetricSample::new(metric, self.labels(name), value);

        match decoded {
            DecodedObject::Extruder(e) => vec![
                sample(TEMPERATURE_CELSIUS, e.temperature),
                sample(PRESSURE_ADVANCE_AMOUNT, e.pressure_advance),
                sample(PRESSURE_ADVANCE_SMOOTH_TIME, e.smooth_time),
            ],
            DecodedObject::HeaterBed(h) => vec![sample(TEMPERATURE_CELSIUS, h.temperature)],
            DecodedObject::Fan(f) => vec![sample(FAN_PERCENTAGE, f.speed)],
            DecodedObject::TemperatureFan(t) => vec![
                sample(TEMPERATURE_CELSIUS, t.temperature),
                sample(FAN_PERCENTAGE, t.speed),
            ],
            // print state has no metric mapping yet
            DecodedObject::PrintStats(_) => Vec::new(),
        }
    }

    fn labels(&self, name: &str) -> Labels {
        vec![(LABEL_PRINTER, self.printer.clone()), (LABEL_NAME, name.to_string())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn raw(value: Value) -> RawStatusMap {
        serde_json::from_value(value).unwrap()
    }

    fn values(samples: &[MetricSample]) -> Vec<(&'static str, f64)> {
        samples.iter().map(|s| (s.metric_name, s.value)).collect()
    }

    #[test]
    fn test_extruder() {
        let decoder = Decoder::new("voron");
        let decl = ObjectDeclaration::new("extruder", TypeTag::Extruder);
        let status = raw(json!({"extruder": {"temperature": 205.3, "pressure_advance": 0.04, "smooth_time": 0.04}}));

        let samples = decoder.decode(&decl, &status);
        assert_eq!(
            values(&samples),
            vec![
                (TEMPERATURE_CELSIUS, 205.3),
                (PRESSURE_ADVANCE_AMOUNT, 0.04),
                (PRESSURE_ADVANCE_SMOOTH_TIME, 0.04),
            ]
        );
        for s in &samples {
            assert_eq!(s.label(LABEL_PRINTER), Some("voron"));
            assert_eq!(s.label(LABEL_NAME), Some("extruder"));
        }
    }

    #[test]
    fn test_heater_bed_and_temperature_fan() {
        let decoder = Decoder::new("voron");
        let status = raw(json!({
            "heater_bed": {"temperature": 60.1, "target": 60.0, "power": 0.3},
            "temperature_fan chamber": {"temperature": 35.0, "target": 40.0, "speed": 0.25},
        }));

        let bed = decoder.decode(&ObjectDeclaration::new("heater_bed", TypeTag::HeaterBed), &status);
        assert_eq!(values(&bed), vec![(TEMPERATURE_CELSIUS, 60.1)]);

        let chamber = decoder.decode(
            &ObjectDeclaration::new("temperature_fan chamber", TypeTag::TemperatureFan),
            &status,
        );
        assert_eq!(values(&chamber), vec![(TEMPERATURE_CELSIUS, 35.0), (FAN_PERCENTAGE, 0.25)]);
        assert_eq!(chamber[0].label(LABEL_NAME), Some("temperature_fan chamber"));
    }

    #[test]
    fn test_missing_object_emits_zero() {
        let decoder = Decoder::new("voron");
        let samples = decoder.decode(&ObjectDeclaration::new("fan0", TypeTag::Fan), &RawStatusMap::new());
        assert_eq!(values(&samples), vec![(FAN_PERCENTAGE, 0.0)]);
        assert_eq!(samples[0].label(LABEL_NAME), Some("fan0"));
    }

    #[test]
    fn test_unknown_type_emits_nothing() {
        let decoder = Decoder::new("voron");
        let decl = ObjectDeclaration::new("laser", TypeTag::Unknown("LaserDiode".into()));
        let status = raw(json!({"laser": {"power": 1.0}}));
        assert!(decode_object(&decl, &status).is_none());
        assert!(decoder.decode(&decl, &status).is_empty());
    }

    #[test]
    fn test_print_stats_decodes_without_metrics() {
        let decl = ObjectDeclaration::new("print_stats", TypeTag::PrintStats);
        let status = raw(json!({"print_stats": {
            "filename": "benchy.gcode", "print_duration": 120.5, "total_duration": 130,
            "filament_used": 412.7, "state": "printing", "message": ""
        }}));

        let Some(DecodedObject::PrintStats(stats)) = decode_object(&decl, &status) else {
            panic!("expected print stats");
        };
        assert_eq!(stats.filename, "benchy.gcode");
        assert_eq!(stats.total_duration, 130.0);
        assert_eq!(stats.state, "printing");
        assert!(Decoder::new("voron").decode(&decl, &status).is_empty());
    }

    #[test]
    fn test_mistyped_fields_decode_to_zero() {
        let decl = ObjectDeclaration::new("extruder", TypeTag::Extruder);
        let status = raw(json!({"extruder": {"temperature": null, "can_extrude": "yes", "target": 210}}));
        let Some(DecodedObject::Extruder(e)) = decode_object(&decl, &status) else {
            panic!("expected extruder");
        };
        assert_eq!(e.temperature, 0.0);
        assert!(!e.can_extrude);
        assert_eq!(e.target, 210.0);
    }

    #[test]
    fn test_every_known_type_emits_except_print_stats() {
        let decoder = Decoder::new("");
        for tag in [TypeTag::Extruder, TypeTag::HeaterBed, TypeTag::Fan, TypeTag::TemperatureFan] {
            let decl = ObjectDeclaration::new("obj", tag.clone());
            assert!(!decoder.decode(&decl, &RawStatusMap::new()).is_empty(), "{tag:?}");
        }
    }

    #[test]
    fn test_decode_is_repeatable() {
        let decoder = Decoder::new("voron");
        let decl = ObjectDeclaration::new("extruder", TypeTag::Extruder);
        let status = raw(json!({"extruder": {"temperature": 200.0}}));
        assert_eq!(decoder.decode(&decl, &status), decoder.decode(&decl, &status));
    }
}
