//! Collection cycle: info probe, batched status fetch, per-object decode.
//!
//! A cycle owns its status map and sample sink; nothing but the catalog snapshot
//! is shared between concurrent cycles.

use crate::catalog::CatalogSource;
use crate::decoder::Decoder;
use crate::fetcher::StatusSource;
use crate::metrics::MetricSink;
use serde::Serialize;
use tracing::{debug, warn};

/// Result of one cycle, reported back to the caller of `run_cycle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleOutcome {
    /// Both upstream calls succeeded.
    pub liveness: bool,
    pub info_ok: bool,
    pub status_ok: bool,
    /// Catalog objects considered in this cycle.
    pub objects: usize,
    pub samples: usize,
}

pub struct Collector<S> {
    source: S,
    decoder: Decoder,
    catalog: CatalogSource,
}

impl<S: StatusSource> Collector<S> {
    pub fn new(source: S, decoder: Decoder, catalog: CatalogSource) -> Self {
        Self { source, decoder, catalog }
    }

    pub fn catalog(&self) -> &CatalogSource {
        &self.catalog
    }

    /// Runs one best-effort cycle into `sink`. Upstream failures only lower liveness.
    pub async fn run_cycle<M: MetricSink + Send>(&self, sink: &mut M) -> CycleOutcome {
        let catalog = self.catalog.current().await;

        let info_ok = match self.source.probe_info().await {
            Ok(()) => true,
            Err(e) => {
                warn!("moonraker info probe failed: {e}");
                false
            }
        };

        let names = catalog.names();
        let mut samples = 0;
        let status_ok = match self.source.fetch_status(&names).await {
            Ok(raw) => {
                for decl in catalog.iter() {
                    for sample in self.decoder.decode(decl, &raw) {
                        sink.emit(sample);
                        samples += 1;
                    }
                }
                true
            }
            Err(e) => {
                warn!("moonraker object status query failed: {e}");
                false
            }
        };

        let liveness = info_ok && status_ok;
        sink.set_up(liveness);
        debug!(liveness, samples, objects = catalog.len(), "collection cycle finished");

        CycleOutcome { liveness, info_ok, status_ok, objects: catalog.len(), samples }
    }
}
