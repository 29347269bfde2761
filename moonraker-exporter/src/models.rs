use crate::fields::{FieldBag, FieldKind, Projected, Shape};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status of every queried object, keyed by object name. Built fresh each cycle.
pub type RawStatusMap = HashMap<String, FieldBag>;

/// Envelope of `GET /printer/objects/query`: `{"result": {"status": {...}}}`.
#[derive(Debug, Deserialize)]
pub struct QueryEnvelope {
    pub result: QueryResult,
}

#[derive(Debug, Deserialize)]
pub struct QueryResult {
    pub status: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub eventtime: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extruder {
    pub temperature: f64,
    pub target: f64,
    pub power: f64,
    pub pressure_advance: f64,
    pub smooth_time: f64,
    pub can_extrude: bool,
}

impl Shape for Extruder {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("temperature", FieldKind::Float),
        ("target", FieldKind::Float),
        ("power", FieldKind::Float),
        ("pressure_advance", FieldKind::Float),
        ("smooth_time", FieldKind::Float),
        ("can_extrude", FieldKind::Bool),
    ];

    fn from_projected(f: &Projected) -> Self {
        Self {
            temperature: f.float("temperature"),
            target: f.float("target"),
            power: f.float("power"),
            pressure_advance: f.float("pressure_advance"),
            smooth_time: f.float("smooth_time"),
            can_extrude: f.boolean("can_extrude"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaterBed {
    pub temperature: f64,
    pub target: f64,
    pub power: f64,
}

impl Shape for HeaterBed {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("temperature", FieldKind::Float),
        ("target", FieldKind::Float),
        ("power", FieldKind::Float),
    ];

    fn from_projected(f: &Projected) -> Self {
        Self {
            temperature: f.float("temperature"),
            target: f.float("target"),
            power: f.float("power"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fan {
    /// Fraction of full speed, 0.0..=1.0.
    pub speed: f64,
    pub rpm: f64,
}

impl Shape for Fan {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[("speed", FieldKind::Float), ("rpm", FieldKind::Float)];

    fn from_projected(f: &Projected) -> Self {
        Self { speed: f.float("speed"), rpm: f.float("rpm") }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureFan {
    pub temperature: f64,
    pub target: f64,
    pub speed: f64,
}

impl Shape for TemperatureFan {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("temperature", FieldKind::Float),
        ("target", FieldKind::Float),
        ("speed", FieldKind::Float),
    ];

    fn from_projected(f: &Projected) -> Self {
        Self {
            temperature: f.float("temperature"),
            target: f.float("target"),
            speed: f.float("speed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintStats {
    pub filename: String,
    pub total_duration: f64,
    pub print_duration: f64,
    pub filament_used: f64,
    /// standby, printing, paused, complete, cancelled, error
    pub state: String,
    pub message: String,
}

impl Shape for PrintStats {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("filename", FieldKind::Text),
        ("total_duration", FieldKind::Float),
        ("print_duration", FieldKind::Float),
        ("filament_used", FieldKind::Float),
        ("state", FieldKind::Text),
        ("message", FieldKind::Text),
    ];

    fn from_projected(f: &Projected) -> Self {
        Self {
            filename: f.text("filename"),
            total_duration: f.float("total_duration"),
            print_duration: f.float("print_duration"),
            filament_used: f.float("filament_used"),
            state: f.text("state"),
            message: f.text("message"),
        }
    }
}

/// One catalog object decoded according to its declared type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DecodedObject {
    Extruder(Extruder),
    HeaterBed(HeaterBed),
    Fan(Fan),
    TemperatureFan(TemperatureFan),
    PrintStats(PrintStats),
}
