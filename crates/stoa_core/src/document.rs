/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Read-only view over a parsed ActivityStreams document.
//!
//! Properties may be embedded objects or bare id references. Accessors never
//! fail and read missing data as empty; [`Document::load`] is the only place
//! that touches the network, through the injected [`Resolver`].

use crate::error::InboxError;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

#[async_trait]
pub trait Resolver: Send + Sync {
    /// Fetches the document behind `url`.
    async fn resolve(&self, url: &str) -> anyhow::Result<Value>;
}

#[derive(Clone)]
pub struct Document {
    value: Value,
    resolver: Arc<dyn Resolver>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").field("value", &self.value).finish()
    }
}

impl Document {
    pub fn new(value: Value, resolver: Arc<dyn Resolver>) -> Self {
        Self { value, resolver }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    fn sub(&self, value: Value) -> Document {
        Document {
            value,
            resolver: self.resolver.clone(),
        }
    }

    /// Arrays read as their first element.
    fn head(&self) -> &Value {
        match &self.value {
            Value::Array(arr) => arr.first().unwrap_or(&Value::Null),
            v => v,
        }
    }

    fn property(&self, key: &str) -> &Value {
        self.head().get(key).unwrap_or(&Value::Null)
    }

    fn str_property(&self, key: &str) -> &str {
        self.property(key).as_str().map(str::trim).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        match self.head() {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Object(map) => map.is_empty(),
            _ => true,
        }
    }

    /// True when the document is only an id that still has to be loaded.
    pub fn is_reference(&self) -> bool {
        matches!(self.head(), Value::String(s) if !s.trim().is_empty())
    }

    pub fn id(&self) -> &str {
        ref_id(self.head())
    }

    pub fn type_name(&self) -> &str {
        match self.property("type") {
            Value::String(s) => s.trim(),
            Value::Array(arr) => arr.iter().find_map(Value::as_str).unwrap_or(""),
            _ => "",
        }
    }

    pub fn actor(&self) -> Document {
        self.sub(self.property("actor").clone())
    }

    pub fn object(&self) -> Document {
        self.sub(self.property("object").clone())
    }

    /// Id of `actor`, embedded or referenced.
    pub fn actor_id(&self) -> &str {
        ref_id(self.property("actor"))
    }

    /// Id of `object`, embedded or referenced.
    pub fn object_id(&self) -> &str {
        ref_id(self.property("object"))
    }

    pub fn name(&self) -> &str {
        let name = self.str_property("name");
        if !name.is_empty() {
            return name;
        }
        self.str_property("preferredUsername")
    }

    pub fn summary(&self) -> &str {
        self.str_property("summary")
    }

    pub fn content(&self) -> &str {
        self.str_property("content")
    }

    pub fn icon_url(&self) -> String {
        media_url(self.property("icon")).unwrap_or_default()
    }

    pub fn image_url(&self) -> String {
        media_url(self.property("image")).unwrap_or_default()
    }

    pub fn attributed_to(&self) -> Vec<Document> {
        match self.property("attributedTo") {
            Value::Null => Vec::new(),
            Value::Array(arr) => arr.iter().map(|v| self.sub(v.clone())).collect(),
            v => vec![self.sub(v.clone())],
        }
    }

    pub fn in_reply_to(&self) -> Option<Document> {
        let doc = self.sub(self.property("inReplyTo").clone());
        if doc.is_empty() {
            None
        } else {
            Some(doc)
        }
    }

    /// Unix milliseconds.
    pub fn published(&self) -> Option<i64> {
        parse_timestamp_ms(self.str_property("published"))
    }

    pub fn updated(&self) -> Option<i64> {
        parse_timestamp_ms(self.str_property("updated"))
    }

    /// Dereferences a bare reference; embedded objects are returned as they are.
    pub async fn load(&self) -> Result<Document, InboxError> {
        match self.head() {
            Value::Object(map) if !map.is_empty() => Ok(self.sub(self.head().clone())),
            Value::String(url) if !url.trim().is_empty() => {
                let url = url.trim();
                debug!(url, "dereferencing document");
                let value = self
                    .resolver
                    .resolve(url)
                    .await
                    .map_err(|source| InboxError::Resolve {
                        url: url.to_string(),
                        source,
                    })?;
                if !value.is_object() {
                    return Err(InboxError::Resolve {
                        url: url.to_string(),
                        source: anyhow::anyhow!("resolved document is not an object"),
                    });
                }
                Ok(self.sub(value))
            }
            _ => Err(InboxError::Resolve {
                url: String::new(),
                source: anyhow::anyhow!("document is empty"),
            }),
        }
    }
}

fn ref_id(v: &Value) -> &str {
    match v {
        Value::String(s) => s.trim(),
        Value::Object(map) => map
            .get("id")
            .or_else(|| map.get("href"))
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or(""),
        Value::Array(arr) => arr.first().map(ref_id).unwrap_or(""),
        _ => "",
    }
}

fn media_url(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Object(map) => map
            .get("url")
            .or_else(|| map.get("href"))
            .and_then(media_url),
        Value::Array(arr) => arr.iter().find_map(media_url),
        _ => None,
    }
}

fn parse_timestamp_ms(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    let ts = OffsetDateTime::parse(s, &Rfc3339).ok()?;
    i64::try_from(ts.unix_timestamp_nanos() / 1_000_000).ok()
}

/// Documents held in memory, keyed by id.
#[derive(Default)]
pub struct MemoryResolver {
    docs: RwLock<HashMap<String, Value>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under its `id`.
    pub fn insert(&self, value: Value) {
        let Some(id) = value.get("id").and_then(Value::as_str).map(str::to_string) else {
            return;
        };
        if let Ok(mut docs) = self.docs.write() {
            docs.insert(id, value);
        }
    }
}

#[async_trait]
impl Resolver for MemoryResolver {
    async fn resolve(&self, url: &str) -> anyhow::Result<Value> {
        let docs = self
            .docs
            .read()
            .map_err(|_| anyhow::anyhow!("resolver lock poisoned"))?;
        docs.get(url)
            .cloned()
            .with_context(|| format!("document not found: {url}"))
    }
}

const ACTIVITY_ACCEPT: &str =
    "application/activity+json, application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"";

/// Unsigned GET against the remote server. One attempt; retrying belongs to
/// the remote side's redelivery.
pub struct HttpResolver {
    http: reqwest::Client,
}

impl HttpResolver {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("build http client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn resolve(&self, url: &str) -> anyhow::Result<Value> {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            anyhow::bail!("not an http(s) url: {url}");
        }
        let resp = self
            .http
            .get(url)
            .header(ACCEPT, ACTIVITY_ACCEPT)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("GET {url}: status {status}");
        }
        resp.json::<Value>()
            .await
            .with_context(|| format!("parse json {url}"))
    }
}
