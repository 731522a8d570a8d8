//! YAML Client
//!
//! Fetches YAML assets as plain text over HTTP and parses them into
//! [`serde_yaml::Value`] trees. No caching or retry happens here (that is
//! the loader's job) except for `$ref` targets, which are fetched once per
//! client and reused.
//!
//! `$ref` support: any mapping carrying a `$ref: "file#/key/path"` entry is
//! replaced by the referenced value. The file part is resolved relative to
//! the referencing document and must not escape its root folder; the key
//! path (a slash-separated mapping walk) addresses into the referenced
//! document.

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::error::{LoaderError, LoaderResult};

/// Recursion guard for `$ref` substitution and key-path walks
const MAX_REF_DEPTH: u32 = 1000;

/// Seam for fetching asset text, so tests can stub the network away
#[async_trait]
pub trait TextFetcher: Send + Sync {
    async fn fetch_text(&self, path: &str) -> LoaderResult<String>;
}

/// Fetches assets over HTTP GET relative to a base URL
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> LoaderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| LoaderError::Http {
                url: String::new(),
                source: e,
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TextFetcher for HttpFetcher {
    async fn fetch_text(&self, path: &str) -> LoaderResult<String> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        tracing::debug!(url = %url, "fetching yaml asset");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LoaderError::Http {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(LoaderError::HttpStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(|e| LoaderError::Http {
            url,
            source: e,
        })
    }
}

/// Fetch-and-parse layer over a [`TextFetcher`]
pub struct YamlClient {
    fetcher: Arc<dyn TextFetcher>,
    /// Resolved `$ref` target files, keyed by their full path
    refs: Mutex<HashMap<String, Value>>,
}

impl YamlClient {
    pub fn new(fetcher: Arc<dyn TextFetcher>) -> Self {
        Self {
            fetcher,
            refs: Mutex::new(HashMap::new()),
        }
    }

    /// Parse one YAML document.
    pub fn parse(path: &str, text: &str) -> LoaderResult<Value> {
        serde_yaml::from_str(text).map_err(|e| LoaderError::Parse {
            path: path.to_string(),
            source: e,
        })
    }

    /// Parse a multi-document YAML stream.
    pub fn parse_multi(path: &str, text: &str) -> LoaderResult<Vec<Value>> {
        let mut docs = Vec::new();
        for document in serde_yaml::Deserializer::from_str(text) {
            let value = Value::deserialize(document).map_err(|e| LoaderError::Parse {
                path: path.to_string(),
                source: e,
            })?;
            docs.push(value);
        }
        Ok(docs)
    }

    /// Fetch a file and parse it as one document.
    pub async fn load_yaml(&self, path: &str) -> LoaderResult<Value> {
        let text = self.fetcher.fetch_text(path).await?;
        Self::parse(path, &text)
    }

    /// Fetch a file and parse it as a document stream.
    pub async fn load_yaml_multi(&self, path: &str) -> LoaderResult<Vec<Value>> {
        let text = self.fetcher.fetch_text(path).await?;
        Self::parse_multi(path, &text)
    }

    /// Fetch a file and substitute every `$ref` it contains.
    pub async fn load_yaml_with_refs(&self, path: &str) -> LoaderResult<Value> {
        let yaml = self.load_yaml(path).await?;
        let root = yaml.clone();
        self.substitute_refs(yaml, &root, path, 1).await
    }

    /// Recursively walk the tree, replacing any mapping that carries a
    /// `$ref` key with the referenced value. Children are resolved before
    /// their parents so nested references inside a `$ref` target work.
    fn substitute_refs<'a>(
        &'a self,
        value: Value,
        root: &'a Value,
        reference_path: &'a str,
        depth: u32,
    ) -> BoxFuture<'a, LoaderResult<Value>> {
        async move {
            if depth > MAX_REF_DEPTH {
                return Err(LoaderError::RefDepth(reference_path.to_string()));
            }

            match value {
                Value::Mapping(mapping) => {
                    let mut resolved = Mapping::new();
                    let mut target: Option<String> = None;

                    for (key, child) in mapping {
                        let child = self
                            .substitute_refs(child, root, reference_path, depth + 1)
                            .await?;
                        if key.as_str() == Some("$ref") {
                            if let Some(reference) = child.as_str() {
                                target = Some(reference.to_string());
                            }
                        }
                        resolved.insert(key, child);
                    }

                    match target {
                        Some(reference) => self.fetch_ref(&reference, root, reference_path).await,
                        None => Ok(Value::Mapping(resolved)),
                    }
                }
                Value::Sequence(sequence) => {
                    let mut resolved = Vec::with_capacity(sequence.len());
                    for child in sequence {
                        resolved.push(
                            self.substitute_refs(child, root, reference_path, depth + 1)
                                .await?,
                        );
                    }
                    Ok(Value::Sequence(resolved))
                }
                other => Ok(other),
            }
        }
        .boxed()
    }

    /// Resolve one `$ref` string: load the referenced file (or use the
    /// current document when the file part is empty) and walk the key path.
    async fn fetch_ref(
        &self,
        reference: &str,
        root: &Value,
        reference_path: &str,
    ) -> LoaderResult<Value> {
        let (file, key_path) = parse_ref(reference);

        let target = if file.is_empty() {
            root.clone()
        } else {
            self.load_ref(&file, reference_path).await?
        };

        if key_path.is_empty() {
            return Ok(target);
        }
        walk_key_path(&target, &key_path).ok_or_else(|| LoaderError::RefNotFound {
            path: key_path,
            file: if file.is_empty() {
                reference_path.to_string()
            } else {
                file
            },
        })
    }

    /// Load a referenced file once, with its own references resolved, and
    /// cache it for the lifetime of the client.
    async fn load_ref(&self, filepath: &str, reference_path: &str) -> LoaderResult<Value> {
        let full_path = self.make_full_path(filepath, reference_path)?;

        {
            let refs = self.refs.lock().await;
            if let Some(cached) = refs.get(&full_path) {
                return Ok(cached.clone());
            }
        }

        let value = self.load_yaml_with_refs(&full_path).await?;
        self.refs
            .lock()
            .await
            .insert(full_path, value.clone());
        Ok(value)
    }

    /// Resolve a path relative to another asset's path, rejecting anything
    /// that climbs out of the referencing file's root folder.
    pub fn make_full_path(&self, relative: &str, relative_to: &str) -> LoaderResult<String> {
        let base_dir = match relative_to.rfind('/') {
            Some(i) => &relative_to[..i],
            None => "",
        };

        let mut segments: Vec<&str> = if relative.starts_with('/') {
            Vec::new()
        } else {
            base_dir.split('/').filter(|s| !s.is_empty()).collect()
        };

        for segment in relative.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        let full_path = segments.join("/");

        let caged = base_dir.is_empty()
            || full_path
                .strip_prefix(base_dir)
                .map(|rest| rest.starts_with('/'))
                .unwrap_or(false);
        if caged {
            Ok(full_path)
        } else {
            Err(LoaderError::PathEscape {
                path: relative.to_string(),
                root: base_dir.to_string(),
            })
        }
    }
}

/// Split a `$ref` string into its file and key-path halves.
fn parse_ref(reference: &str) -> (String, String) {
    match reference.split_once('#') {
        Some((file, key_path)) => (file.trim().to_string(), key_path.trim().to_string()),
        None => (reference.trim().to_string(), String::new()),
    }
}

/// Walk a slash-separated key path through nested mappings.
fn walk_key_path(value: &Value, key_path: &str) -> Option<Value> {
    let mut current = value;
    for key in key_path.split('/').filter(|s| !s.is_empty()) {
        current = current.as_mapping()?.get(&Value::String(key.to_string()))?;
    }
    Some(current.clone())
}
