//! In-memory script source for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::install_script::{InstallScriptError, ScriptSource};

/// Serves scripts from a map; unknown URLs answer HTTP 404.
#[derive(Default)]
pub struct StaticScriptSource {
    scripts: HashMap<String, Vec<u8>>,
    fetched: Mutex<Vec<String>>,
}

impl StaticScriptSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_script(mut self, url: &str, body: &str) -> Self {
        self.scripts
            .insert(url.to_string(), body.as_bytes().to_vec());
        self
    }

    #[must_use]
    pub fn fetched(&self) -> Vec<String> {
        self.fetched
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ScriptSource for StaticScriptSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, InstallScriptError> {
        self.fetched
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(url.to_string());

        self.scripts
            .get(url)
            .cloned()
            .ok_or_else(|| InstallScriptError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}
