//! Reading and rewriting `kustomization.yaml` files.
//!
//! Only the `resources` key is ever touched. Every other top-level key of an
//! existing file (patches, labels, generators a user added) is kept with its
//! position, so regeneration is safe on files that mix generated and
//! hand-authored content. Serialization is deterministic: equal input gives
//! byte-identical output, and unchanged files are not rewritten at all.

use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::path::Path;

use crate::constants::BASES_DIR;
use crate::core::KvendorError;
use crate::utils::{atomic_write, read_optional_text};

const API_VERSION: &str = "kustomize.config.k8s.io/v1beta1";
const KIND: &str = "Kustomization";
const RESOURCES_KEY: &str = "resources";

/// An in-memory `kustomization.yaml` document.
#[derive(Debug, Clone, PartialEq)]
pub struct Kustomization {
    doc: Mapping,
}

impl Default for Kustomization {
    fn default() -> Self {
        Self::new()
    }
}

impl Kustomization {
    /// A fresh document with the kustomize type header and no resources.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Mapping::new();
        doc.insert("apiVersion".into(), API_VERSION.into());
        doc.insert("kind".into(), KIND.into());
        doc.insert(RESOURCES_KEY.into(), Value::Sequence(Vec::new()));
        Self { doc }
    }

    /// Parses a document; an empty document is treated as a fresh one.
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        let parse_error = |reason: String| KvendorError::ConfigParse {
            file: origin.to_string(),
            reason,
        };

        let value: Value =
            serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
        match value {
            Value::Null => Ok(Self::new()),
            Value::Mapping(doc) => {
                let parsed = Self { doc };
                parsed.try_resources().map_err(parse_error)?;
                Ok(parsed)
            }
            _ => Err(parse_error("top level is not a mapping".to_string()).into()),
        }
    }

    /// Loads the file at `path`, or a fresh document when it does not exist.
    pub fn load_or_new(path: &Path) -> Result<Self> {
        match read_optional_text(path)? {
            Some(content) => Self::parse(&content, &path.display().to_string()),
            None => Ok(Self::new()),
        }
    }

    fn try_resources(&self) -> Result<Vec<String>, String> {
        match self.doc.get(RESOURCES_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Sequence(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(ToString::to_string)
                        .ok_or_else(|| format!("resources entry {item:?} is not a string"))
                })
                .collect(),
            Some(_) => Err("resources is not a list".to_string()),
        }
    }

    /// The current resource entries in file order.
    #[must_use]
    pub fn resources(&self) -> Vec<String> {
        self.try_resources().unwrap_or_default()
    }

    /// Replaces the resource entries, keeping the key's position.
    pub fn set_resources(&mut self, resources: Vec<String>) {
        let items = resources.into_iter().map(Value::String).collect();
        self.doc.insert(RESOURCES_KEY.into(), Value::Sequence(items));
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.doc).context("Failed to serialize kustomization")
    }

    /// Writes the document to `path` unless the file already has exactly this
    /// content. Returns whether the file was written.
    pub fn save(&self, path: &Path) -> Result<bool> {
        let rendered = self.to_yaml()?;
        if read_optional_text(path)?.as_deref() == Some(rendered.as_str()) {
            tracing::trace!("{} is up to date", path.display());
            return Ok(false);
        }
        atomic_write(path, rendered.as_bytes())?;
        Ok(true)
    }
}

/// Makes sure the cluster overlay at `path` references the `bases` directory.
///
/// A missing overlay is created with `resources: [bases]`; an overlay without
/// `bases` gets it inserted first; anything else is left byte-for-byte alone.
/// Returns whether the file was written.
pub fn ensure_overlay(path: &Path) -> Result<bool> {
    let mut overlay = Kustomization::load_or_new(path)?;
    let mut resources = overlay.resources();

    let references_bases =
        resources.iter().any(|r| r.trim_start_matches("./").trim_end_matches('/') == BASES_DIR);
    if references_bases {
        return Ok(false);
    }

    resources.insert(0, BASES_DIR.to_string());
    overlay.set_resources(resources);
    overlay.save(path)
}
