//! Shared fixtures: a client over the scripted transport and sample files

#![allow(dead_code)]

use mlops_codex_core::port::http_transport::mocks::ScriptedTransport;
use mlops_codex_core::port::time_provider::mocks::ManualTimeProvider;
use mlops_codex_core::port::HttpMethod;
use mlops_codex_sdk::{ClientConfig, Credentials, MlopsCodexClient};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const BASE_URL: &str = "http://mlops.test/api";

pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub clock: Arc<ManualTimeProvider>,
    pub client: MlopsCodexClient,
}

impl Harness {
    /// Login already scripted to return `session-token`
    pub fn new() -> Self {
        Self::with_transport(ScriptedTransport::new())
    }

    pub fn with_transport(transport: ScriptedTransport) -> Self {
        let transport = Arc::new(transport);
        transport.on(
            HttpMethod::Post,
            "/login",
            200,
            json!({"Token": "session-token"}),
        );
        Self::bare(transport)
    }

    /// No routes scripted at all
    pub fn bare(transport: Arc<ScriptedTransport>) -> Self {
        let clock = Arc::new(ManualTimeProvider::new(1_700_000_000_000));
        let mut config = ClientConfig::new(BASE_URL);
        config.poll_interval = Duration::ZERO;

        let client = MlopsCodexClient::with_transport(
            config,
            Credentials::new("ds@acme.io", "secret", "acme"),
            transport.clone(),
            clock.clone(),
        );
        Self {
            transport,
            clock,
            client,
        }
    }

    /// Requests other than the login
    pub fn api_requests(&self) -> usize {
        self.transport.total_requests() - self.transport.count(HttpMethod::Post, "/login")
    }
}

pub struct Samples {
    _dir: TempDir,
    root: PathBuf,
}

impl Samples {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let samples = Self { _dir: dir, root };
        samples.write("app.py", "def train_model(base_path):\n    return None\n");
        samples.write("requirements.txt", "scikit-learn==1.3.0\n");
        samples.write("train.csv", "a,b,target\n1,2,0\n");
        samples.write("schema.json", "{\"a\": 1, \"b\": 2}");
        samples.write("features.csv", "a,b\n1,2\n");
        samples
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
