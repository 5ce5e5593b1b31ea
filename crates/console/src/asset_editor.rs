//! Tag and hotspot editing for assets.
//!
//! Each write replaces the whole collection on the backend. The local
//! collection is updated before the write and kept if the write fails;
//! the entry is then flagged unsynced until [`AssetEditor::sync`]
//! succeeds.

use std::collections::HashMap;
use std::sync::Arc;

use studio_client::messages::{HotspotsUpdate, TagsUpdate};
use studio_client::ArtifactBackend;
use studio_core::assets::{
    normalize_tags, supports_hotspots, validate_asset_type, with_hotspot_added,
    with_hotspot_removed, Hotspot,
};
use studio_core::error::CoreError;

use crate::error::ConsoleError;

#[derive(Debug, Clone)]
struct AssetEntry {
    asset_type: String,
    tags: Vec<String>,
    hotspots: Vec<Hotspot>,
    tags_unsynced: bool,
    hotspots_unsynced: bool,
}

pub struct AssetEditor {
    backend: Arc<dyn ArtifactBackend>,
    entries: HashMap<String, AssetEntry>,
}

impl AssetEditor {
    pub fn new(backend: Arc<dyn ArtifactBackend>) -> Self {
        Self {
            backend,
            entries: HashMap::new(),
        }
    }

    /// Load an asset's tags and hotspots from the backend.
    pub async fn open(&mut self, path: &str, asset_type: &str) -> Result<(), ConsoleError> {
        validate_asset_type(asset_type)?;
        let meta = self.backend.asset_metadata(path).await?;
        tracing::debug!(
            path,
            tags = meta.tags.len(),
            hotspots = meta.hotspots.len(),
            "Asset opened",
        );
        self.insert(path, asset_type, meta.tags, meta.hotspots);
        Ok(())
    }

    /// Start editing an asset whose collections are already known.
    pub fn track(
        &mut self,
        path: &str,
        asset_type: &str,
        tags: Vec<String>,
        hotspots: Vec<Hotspot>,
    ) -> Result<(), ConsoleError> {
        validate_asset_type(asset_type)?;
        self.insert(path, asset_type, tags, hotspots);
        Ok(())
    }

    pub fn tags(&self, path: &str) -> Option<&[String]> {
        self.entries.get(path).map(|e| e.tags.as_slice())
    }

    pub fn hotspots(&self, path: &str) -> Option<&[Hotspot]> {
        self.entries.get(path).map(|e| e.hotspots.as_slice())
    }

    /// Whether local edits have not reached the backend.
    pub fn is_unsynced(&self, path: &str) -> bool {
        self.entries
            .get(path)
            .is_some_and(|e| e.tags_unsynced || e.hotspots_unsynced)
    }

    /// Replace the tag set (trimmed, empties dropped) and write it.
    pub async fn set_tags<S: AsRef<str>>(
        &mut self,
        path: &str,
        tags: &[S],
    ) -> Result<(), ConsoleError> {
        let entry = self.entry_mut(path)?;
        entry.tags = normalize_tags(tags);
        entry.tags_unsynced = true;
        self.write_tags(path).await
    }

    /// Append a hotspot and write the full list.
    pub async fn add_hotspot(&mut self, path: &str, hotspot: Hotspot) -> Result<(), ConsoleError> {
        let entry = self.entry_mut(path)?;
        if !supports_hotspots(&entry.asset_type) {
            return Err(CoreError::Validation(format!(
                "Assets of type '{}' have no hotspots",
                entry.asset_type
            ))
            .into());
        }
        entry.hotspots = with_hotspot_added(&entry.hotspots, hotspot);
        entry.hotspots_unsynced = true;
        self.write_hotspots(path).await
    }

    /// Remove the hotspot at `index` and write the full list.
    pub async fn remove_hotspot(&mut self, path: &str, index: usize) -> Result<(), ConsoleError> {
        let entry = self.entry_mut(path)?;
        entry.hotspots = with_hotspot_removed(&entry.hotspots, index)?;
        entry.hotspots_unsynced = true;
        self.write_hotspots(path).await
    }

    /// Re-send the full tags and hotspots of an asset.
    pub async fn sync(&mut self, path: &str) -> Result<(), ConsoleError> {
        let entry = self.entry_mut(path)?;
        entry.tags_unsynced = true;
        let with_hotspots = supports_hotspots(&entry.asset_type);
        if with_hotspots {
            entry.hotspots_unsynced = true;
        }

        self.write_tags(path).await?;
        if with_hotspots {
            self.write_hotspots(path).await?;
        }
        Ok(())
    }

    // ---- private helpers ----

    fn insert(&mut self, path: &str, asset_type: &str, tags: Vec<String>, hotspots: Vec<Hotspot>) {
        self.entries.insert(
            path.to_string(),
            AssetEntry {
                asset_type: asset_type.to_string(),
                tags,
                hotspots,
                tags_unsynced: false,
                hotspots_unsynced: false,
            },
        );
    }

    fn entry_mut(&mut self, path: &str) -> Result<&mut AssetEntry, ConsoleError> {
        self.entries
            .get_mut(path)
            .ok_or_else(|| ConsoleError::AssetNotOpen(path.to_string()))
    }

    async fn write_tags(&mut self, path: &str) -> Result<(), ConsoleError> {
        let update = {
            let entry = self.entry_mut(path)?;
            TagsUpdate {
                path: path.to_string(),
                asset_type: entry.asset_type.clone(),
                tags: entry.tags.clone(),
            }
        };

        match self.backend.put_tags(&update).await {
            Ok(()) => {
                self.entry_mut(path)?.tags_unsynced = false;
                tracing::info!(path, tags = update.tags.len(), "Tags saved");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "Failed to save tags");
                Err(e.into())
            }
        }
    }

    async fn write_hotspots(&mut self, path: &str) -> Result<(), ConsoleError> {
        let update = HotspotsUpdate {
            path: path.to_string(),
            hotspots: self.entry_mut(path)?.hotspots.clone(),
        };

        match self.backend.put_hotspots(&update).await {
            Ok(()) => {
                self.entry_mut(path)?.hotspots_unsynced = false;
                tracing::info!(path, hotspots = update.hotspots.len(), "Hotspots saved");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "Failed to save hotspots");
                Err(e.into())
            }
        }
    }
}
