use std::path::PathBuf;

use crate::model::asset::AssetId;
use crate::pipeline::thumbnail_cache::Raster;

/// What the UI shows for one asset.
#[derive(Clone, Debug)]
pub enum Thumbnail {
    Raster(Raster),
    /// Shown when the asset could not be decoded or rendered.
    Fallback,
}

impl Thumbnail {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Thumbnail::Fallback)
    }
}

#[derive(Clone, Debug)]
pub struct LoadedItem {
    pub id: AssetId,
    pub thumbnail: Thumbnail,
}

#[derive(Clone, Debug)]
pub enum LoadMsg {
    Started { directory: PathBuf, total: usize },
    Batch { directory: PathBuf, items: Vec<LoadedItem> },
    Progress { directory: PathBuf, percent: u8 },
    ItemFailed { directory: PathBuf, id: AssetId, reason: String },
    Complete { directory: PathBuf, loaded: usize },
}

impl LoadMsg {
    pub fn directory(&self) -> &PathBuf {
        match self {
            LoadMsg::Started { directory, .. }
            | LoadMsg::Batch { directory, .. }
            | LoadMsg::Progress { directory, .. }
            | LoadMsg::ItemFailed { directory, .. }
            | LoadMsg::Complete { directory, .. } => directory,
        }
    }
}

/// Text for the loading indicator, e.g. `"42%"`.
pub fn progress_label(percent: u8) -> String {
    format!("{}%", percent)
}
