use crate::collector::CycleOutcome;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[derive(Debug, Serialize, Deserialize)]
pub struct ExporterHealth {
    pub uptime_seconds: u64,
    pub endpoint: String,
    pub printer: String,
    pub cycles_total: u64,
    pub cycles_failed: u64,
    pub last_cycle: Option<LastCycle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastCycle {
    pub at: String,
    pub up: bool,
    pub info_ok: bool,
    pub status_ok: bool,
    pub objects: usize,
    pub samples: usize,
}

/// Process-level bookkeeping of scrape cycles, served on `/system/health`.
/// Written after each cycle completes; never consulted by the collector.
#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    endpoint: String,
    printer: String,
    cycles_total: Arc<AtomicU64>,
    cycles_failed: Arc<AtomicU64>,
    last_cycle: Arc<Mutex<Option<LastCycle>>>,
}

impl HealthTracker {
    pub fn new(endpoint: impl Into<String>, printer: impl Into<String>) -> Self {
        Self {
            start_time: Instant::now(),
            endpoint: endpoint.into(),
            printer: printer.into(),
            cycles_total: Arc::new(AtomicU64::new(0)),
            cycles_failed: Arc::new(AtomicU64::new(0)),
            last_cycle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn record(&self, outcome: &CycleOutcome) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        if !outcome.liveness {
            self.cycles_failed.fetch_add(1, Ordering::Relaxed);
        }
        let at = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
        *self.last_cycle.lock() = Some(LastCycle {
            at,
            up: outcome.liveness,
            info_ok: outcome.info_ok,
            status_ok: outcome.status_ok,
            objects: outcome.objects,
            samples: outcome.samples,
        });
    }

    pub fn get_health(&self) -> ExporterHealth {
        ExporterHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            endpoint: self.endpoint.clone(),
            printer: self.printer.clone(),
            cycles_total: self.cycles_total.load(Ordering::Relaxed),
            cycles_failed: self.cycles_failed.load(Ordering::Relaxed),
            last_cycle: self.last_cycle.lock().clone(),
        }
    }
}
