//! Prometheus text exposition format (0.0.4) renderer.

use crate::metrics::{MetricDefs, SampleSet, UP};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;
use tracing::warn;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Renders one cycle: `moonraker_up` first, then samples grouped by metric in first-seen order.
pub fn render(defs: &MetricDefs, set: &SampleSet) -> String {
    let mut output = String::new();

    if let Some(up) = defs.get(UP) {
        write_header(&mut output, &up.name, up.help, up.kind.as_str());
        let _ = writeln!(output, "{} {}", up.name, if set.up() { 1 } else { 0 });
    }

    // Samples of the same metric must be contiguous under a single HELP/TYPE block.
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    let mut unknown: HashSet<&str> = HashSet::new();
    for (idx, sample) in set.samples().iter().enumerate() {
        if defs.get(sample.metric_name).is_none() {
            if unknown.insert(sample.metric_name) {
                warn!(metric = sample.metric_name, "sample without metric definition dropped");
            }
            continue;
        }
        grouped
            .entry(sample.metric_name)
            .or_insert_with(|| {
                order.push(sample.metric_name);
                Vec::new()
            })
            .push(idx);
    }

    for key in order {
        let Some(def) = defs.get(key) else { continue };
        write_header(&mut output, &def.name, def.help, def.kind.as_str());
        for &idx in &grouped[key] {
            let sample = &set.samples()[idx];
            if sample.labels.is_empty() {
                let _ = writeln!(output, "{} {}", def.name, format_value(sample.value));
            } else {
                let labels: Vec<String> = sample
                    .labels
                    .iter()
                    .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
                    .collect();
                let _ = writeln!(output, "{}{{{}}} {}", def.name, labels.join(","), format_value(sample.value));
            }
        }
    }

    output
}

fn write_header(output: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(output, "# HELP {} {}", name, escape_help(help));
    let _ = writeln!(output, "# TYPE {} {}", name, kind);
}

fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v.is_sign_positive() { "+Inf" } else { "-Inf" }.to_string()
    } else if v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{}", v)
    }
}
