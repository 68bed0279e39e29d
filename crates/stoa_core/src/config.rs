/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::error::InboxError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, serde::Deserialize)]
pub struct InboxConfig {
    #[serde(alias = "base_url")]
    pub public_base_url: String,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// Refuse follows from these domains (exact or suffix, e.g. `example.com` or `*.example.com`).
    #[serde(default)]
    pub blocked_domains: Vec<String>,
    /// Refuse follows from these actors (exact actor id URL).
    #[serde(default)]
    pub blocked_actors: Vec<String>,
    /// Only the actor a message came from may delete it.
    #[serde(default = "default_true")]
    pub verify_delete_origin: bool,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_true() -> bool {
    true
}

impl InboxConfig {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            db_path: None,
            blocked_domains: Vec::new(),
            blocked_actors: Vec::new(),
            verify_delete_origin: true,
            http_timeout_secs: None,
            user_agent: None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, InboxError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| InboxError::Config(format!("read {}: {e}", path.display())))?;
        let cfg: InboxConfig = serde_json::from_str(&text)
            .map_err(|e| InboxError::Config(format!("parse {}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), InboxError> {
        let base = self.public_base_url.trim();
        if base.is_empty() {
            return Err(InboxError::Config("public_base_url is empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(InboxError::Config(format!(
                "public_base_url must be http(s): {base}"
            )));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(10).max(1))
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("stoa/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn db_path(&self) -> Result<PathBuf, InboxError> {
        match &self.db_path {
            Some(p) => Ok(p.clone()),
            None => Ok(default_data_dir()?.join("inbox.sqlite")),
        }
    }
}

pub fn default_data_dir() -> Result<PathBuf, InboxError> {
    if let Ok(v) = std::env::var("STOA_DATA_DIR") {
        return Ok(PathBuf::from(v));
    }
    let proj = ProjectDirs::from("net", "stoa", "Stoa")
        .ok_or_else(|| InboxError::Config("unable to determine platform data dir".to_string()))?;
    Ok(proj.data_local_dir().to_path_buf())
}
