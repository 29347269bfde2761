/*!
Test Harness pour l'exporter Moonraker

Facilite l'écriture de tests d'intégration avec:
- Stub Moonraker démarré automatiquement
- Catalogues écrits dans un répertoire temporaire
- Serveur HTTP de l'exporter lancé sur un port local
- Parsing et assertions sur le texte Prometheus scrapé
*/

use crate::moonraker_stub::MoonrakerStub;
use crate::status_builder::catalog_yaml;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;

/// Harness de test complet pour l'exporter
pub struct TestHarness {
    pub stub: MoonrakerStub,
    dir: tempfile::TempDir,
    client: reqwest::Client,
}

impl TestHarness {
    /// Crée un nouveau harness de test (stub démarré)
    pub async fn new() -> Result<Self> {
        env_logger::builder().is_test(true).try_init().ok();

        Ok(Self {
            stub: MoonrakerStub::start().await?,
            dir: tempfile::tempdir()?,
            client: reqwest::Client::new(),
        })
    }

    /// Écrit un catalogue `objects.yaml` et retourne son chemin
    pub fn write_catalog(&self, objects: &[(&str, &str)]) -> Result<PathBuf> {
        self.write_catalog_text(&catalog_yaml(objects))
    }

    pub fn write_catalog_text(&self, text: &str) -> Result<PathBuf> {
        let path = self.dir.path().join("objects.yaml");
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    /// Variables d'environnement pointant l'exporter vers le stub
    pub fn env(&self, printer: &str, catalog: &Path) -> HashMap<String, String> {
        HashMap::from([
            ("MOONRAKER_ENDPOINT".to_string(), self.stub.endpoint()),
            ("PRINTER_NAME".to_string(), printer.to_string()),
            ("MOONRAKER_OBJECTS_CONFIG".to_string(), catalog.display().to_string()),
            ("LISTEN_ADDR".to_string(), "127.0.0.1:0".to_string()),
            ("MOONRAKER_TIMEOUT_SECS".to_string(), "2".to_string()),
        ])
    }

    /// Lance un router axum sur un port local et retourne son adresse
    pub async fn serve(&self, app: axum::Router) -> Result<SocketAddr> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("exporter under test stopped: {}", e);
            }
        });
        log::info!("exporter under test listening on {}", addr);
        Ok(addr)
    }

    /// GET /metrics et parse la réponse
    pub async fn scrape(&self, addr: SocketAddr) -> Result<Scrape> {
        let resp = self.client.get(format!("http://{}/metrics", addr)).send().await?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let text = resp.text().await?;
        Ok(Scrape { status, content_type, samples: parse_exposition(&text), text })
    }

    pub async fn get_json(&self, addr: SocketAddr, path: &str) -> Result<serde_json::Value> {
        let resp = self.client.get(format!("http://{}{}", addr, path)).send().await?;
        Ok(resp.json().await?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedSample {
    pub name: String,
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl ScrapedSample {
    fn has_labels(&self, wanted: &[(&str, &str)]) -> bool {
        wanted
            .iter()
            .all(|(k, v)| self.labels.iter().any(|(lk, lv)| lk == k && lv == v))
    }
}

#[derive(Debug)]
pub struct Scrape {
    pub status: u16,
    pub content_type: String,
    pub text: String,
    pub samples: Vec<ScrapedSample>,
}

impl Scrape {
    /// Valeur d'une série identifiée par nom + sous-ensemble de labels
    pub fn value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.samples
            .iter()
            .find(|s| s.name == name && s.has_labels(labels))
            .map(|s| s.value)
    }

    pub fn up(&self) -> Option<f64> {
        self.value("moonraker_up", &[])
    }

    pub fn count(&self, name: &str) -> usize {
        self.samples.iter().filter(|s| s.name == name).count()
    }

    /// Noms de métriques distincts, dans l'ordre d'apparition
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for s in &self.samples {
            if !names.contains(&s.name) {
                names.push(s.name.clone());
            }
        }
        names
    }

    /// Assert qu'une série a la valeur attendue
    pub fn assert_value(&self, name: &str, labels: &[(&str, &str)], expected: f64) {
        match self.value(name, labels) {
            Some(actual) => assert!(
                (actual - expected).abs() < 1e-9,
                "{name}{labels:?}: expected {expected}, got {actual}"
            ),
            None => panic!("series {name}{labels:?} not found in scrape:\n{}", self.text),
        }
    }
}

/// Minimal parser for the text exposition lines the exporter produces.
pub fn parse_exposition(text: &str) -> Vec<ScrapedSample> {
    text.lines()
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Option<ScrapedSample> {
    let (series, value) = line.rsplit_once(' ')?;
    let value = match value {
        "NaN" => f64::NAN,
        "+Inf" => f64::INFINITY,
        "-Inf" => f64::NEG_INFINITY,
        v => v.parse().ok()?,
    };
    let (name, labels) = match series.split_once('{') {
        Some((name, rest)) => (name, parse_labels(rest.strip_suffix('}')?)),
        None => (series, Vec::new()),
    };
    Some(ScrapedSample { name: name.to_string(), labels, value })
}

fn parse_labels(body: &str) -> Vec<(String, String)> {
    let mut labels = Vec::new();
    let mut rest = body;
    while let Some((key, after)) = rest.split_once("=\"") {
        let mut value = String::new();
        let mut chars = after.char_indices();
        let mut end = after.len();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, other)) => value.push(other),
                    None => {}
                },
                '"' => {
                    end = i + 1;
                    break;
                }
                c => value.push(c),
            }
        }
        labels.push((key.trim_start_matches(',').to_string(), value));
        rest = &after[end..];
    }
    labels
}
