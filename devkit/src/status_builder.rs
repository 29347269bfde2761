/*!
Helpers pour construire des payloads de statut Moonraker

Builds `{object_name: {field: value}}` maps shaped like real Klipper objects, and
catalog documents in the exporter's YAML format.
*/

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Default)]
pub struct StatusBuilder {
    status: Map<String, Value>,
}

impl StatusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extruder(self, name: &str, temperature: f64, pressure_advance: f64, smooth_time: f64) -> Self {
        self.object(
            name,
            json!({
                "temperature": temperature,
                "target": 0.0,
                "power": 0.0,
                "can_extrude": temperature >= 170.0,
                "pressure_advance": pressure_advance,
                "smooth_time": smooth_time
            }),
        )
    }

    pub fn heater_bed(self, name: &str, temperature: f64, target: f64) -> Self {
        self.object(name, json!({"temperature": temperature, "target": target, "power": 0.0}))
    }

    pub fn fan(self, name: &str, speed: f64) -> Self {
        self.object(name, json!({"speed": speed, "rpm": null}))
    }

    pub fn temperature_fan(self, name: &str, temperature: f64, target: f64, speed: f64) -> Self {
        self.object(name, json!({"temperature": temperature, "target": target, "speed": speed}))
    }

    pub fn print_stats(self, state: &str, filename: &str, print_duration: f64) -> Self {
        self.object(
            "print_stats",
            json!({
                "filename": filename,
                "total_duration": print_duration,
                "print_duration": print_duration,
                "filament_used": 0.0,
                "state": state,
                "message": ""
            }),
        )
    }

    /// Raw object status, for shapes not covered above.
    pub fn object(mut self, name: &str, fields: Value) -> Self {
        self.status.insert(name.to_string(), fields);
        self
    }

    /// The status map, as served by the stub.
    pub fn build(self) -> Value {
        Value::Object(self.status)
    }

    /// Full `/printer/objects/query` response envelope.
    pub fn envelope(self) -> Value {
        json!({"result": {"eventtime": 1234.56, "status": self.build()}})
    }
}

/// Catalog YAML for `(name, type)` pairs, in order.
pub fn catalog_yaml(objects: &[(&str, &str)]) -> String {
    if objects.is_empty() {
        return "objects: []\n".to_string();
    }
    let mut out = String::from("objects:\n");
    for (name, type_tag) in objects {
        out.push_str(&format!("  - name: \"{}\"\n    type: {}\n", name, type_tag));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_shapes() {
        let status = StatusBuilder::new()
            .extruder("extruder", 205.3, 0.04, 0.04)
            .fan("fan", 0.5)
            .build();
        assert_eq!(status["extruder"]["temperature"], 205.3);
        assert_eq!(status["extruder"]["can_extrude"], true);
        assert_eq!(status["fan"]["speed"], 0.5);
        assert!(status["fan"]["rpm"].is_null());
    }

    #[test]
    fn test_envelope() {
        let envelope = StatusBuilder::new().heater_bed("heater_bed", 60.0, 60.0).envelope();
        assert_eq!(envelope["result"]["status"]["heater_bed"]["target"], 60.0);
    }

    #[test]
    fn test_catalog_yaml() {
        let yaml = catalog_yaml(&[("extruder", "Extruder"), ("temperature_fan chamber", "TemperatureFan")]);
        assert_eq!(
            yaml,
            "objects:\n  - name: \"extruder\"\n    type: Extruder\n  - name: \"temperature_fan chamber\"\n    type: TemperatureFan\n"
        );
        assert_eq!(catalog_yaml(&[]), "objects: []\n");
    }
}
