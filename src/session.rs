//! Canonicalization session state.
//!
//! Bundles the canonical label registry with the user synonym table so the
//! learned bindings survive a run. The session serializes to JSON; loading
//! it back restores insertion order, which matters because registry
//! resolution is first-match-wins.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::mapper::SynonymMap;
use crate::registry::CanonicalLabelRegistry;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonicalSession {
    pub registry: CanonicalLabelRegistry,
    pub synonyms: SynonymMap,
}

impl CanonicalSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge additional synonym entries into the session. New entries
    /// overwrite prior entries for the same source key, nothing is removed.
    pub fn merge_synonyms<I, K, V>(&mut self, additions: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.synonyms.merge(additions);
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let session: CanonicalSession = serde_json::from_str(&content)?;
        info!(
            "Loaded session with {} bindings and {} synonyms from {}",
            session.registry.len(),
            session.synonyms.len(),
            path.display()
        );
        Ok(session)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(
            "Saved session with {} bindings and {} synonyms to {}",
            self.registry.len(),
            self.synonyms.len(),
            path.display()
        );
        Ok(())
    }
}
