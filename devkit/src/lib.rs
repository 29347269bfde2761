/*!
# Moonraker DevKit - Stubs et Utilitaires pour Tests

Bibliothèque facilitant les tests de l'exporter avec:
- Stub HTTP de l'API Moonraker (routes /printer/info et /printer/objects/query)
- Builders de payloads de statut et de catalogues
- Harness de test avec parsing du format texte Prometheus
*/

pub mod moonraker_stub;
pub mod status_builder;
pub mod test_utils;

pub use moonraker_stub::{MoonrakerStub, RecordedRequest, RouteMode};
pub use status_builder::{catalog_yaml, StatusBuilder};
pub use test_utils::{parse_exposition, Scrape, ScrapedSample, TestHarness};
