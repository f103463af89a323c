// Two-tier thumbnail cache: insertion-ordered memory map over a content-addressed PNG directory

use image::RgbaImage;
use image::imageops::FilterType;
use indexmap::IndexMap;
use sha1::{Digest, Sha1};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::{Result, ThumbError};
use crate::pipeline::fs_ops::{absolute_path, modified_time};
use crate::pipeline::xcur2png::png_writer::{read_png, write_png};

/// Slack allowed between a cached PNG's larger side and the requested size.
pub const SIZE_TOLERANCE: u32 = 2;

pub type Raster = Arc<RgbaImage>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    identity: String,
    target_size: u32,
}

impl CacheKey {
    pub fn new(identity: impl Into<String>, target_size: u32) -> Self {
        Self {
            identity: identity.into(),
            target_size,
        }
    }

    pub fn for_path(path: &Path, target_size: u32) -> Self {
        Self::new(absolute_path(path).to_string_lossy(), target_size)
    }

    pub fn for_cursor(theme: &str, cursor_type: &str, target_size: u32) -> Self {
        Self::new(format!("{}:{}", theme, cursor_type), target_size)
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn target_size(&self) -> u32 {
        self.target_size
    }

    /// `<sha1 of identity and size>_<size>.png`
    pub fn file_name(&self) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.identity.as_bytes());
        hasher.update(b":");
        hasher.update(self.target_size.to_string().as_bytes());
        format!("{:x}_{}.png", hasher.finalize(), self.target_size)
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub raster: Raster,
    pub disk_path: PathBuf,
    pub source_mtime: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    MemoryHit,
    DiskHit,
    Produced,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub memory_hits: usize,
    pub disk_hits: usize,
    pub produced: usize,
    pub disk_discarded: usize,
    pub write_failures: usize,
    pub evicted: usize,
}

pub struct ThumbnailCache {
    dir: PathBuf,
    max_items: usize,
    entries: IndexMap<CacheKey, CacheEntry>,
    stats: CacheStats,
}

impl ThumbnailCache {
    pub fn new(dir: impl Into<PathBuf>, max_items: usize) -> Self {
        Self {
            dir: dir.into(),
            max_items,
            entries: IndexMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn disk_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    pub fn get_or_create<F>(&mut self, key: CacheKey, source_path: &Path, produce: F) -> Result<Raster>
    where
        F: FnOnce() -> Result<RgbaImage>,
    {
        self.lookup(key, source_path, produce).map(|(raster, _)| raster)
    }

    /// Like [`get_or_create`](Self::get_or_create), also reporting which tier answered.
    pub fn lookup<F>(&mut self, key: CacheKey, source_path: &Path, produce: F) -> Result<(Raster, CacheOutcome)>
    where
        F: FnOnce() -> Result<RgbaImage>,
    {
        if let Some(entry) = self.entries.get(&key) {
            self.stats.memory_hits += 1;
            return Ok((Arc::clone(&entry.raster), CacheOutcome::MemoryHit));
        }

        let source_mtime =
            modified_time(source_path).map_err(|_| ThumbError::SourceUnavailable(source_path.to_path_buf()))?;
        let disk_path = self.disk_path(&key);

        if let Some(image) = self.load_from_disk(&key, &disk_path, source_mtime) {
            log::debug!("disk hit for {} at {}", key.identity, disk_path.display());
            self.stats.disk_hits += 1;
            let raster = self.insert(key, Arc::new(image), disk_path, source_mtime);
            return Ok((raster, CacheOutcome::DiskHit));
        }

        let image = downscale(produce()?, key.target_size);
        self.stats.produced += 1;

        if let Err(e) = write_png(&image, &disk_path) {
            log::warn!("cache write skipped for {}: {}", key.identity, e);
            self.stats.write_failures += 1;
        }

        let raster = self.insert(key, Arc::new(image), disk_path, source_mtime);
        Ok((raster, CacheOutcome::Produced))
    }

    fn insert(&mut self, key: CacheKey, raster: Raster, disk_path: PathBuf, source_mtime: SystemTime) -> Raster {
        let entry = CacheEntry {
            raster: Arc::clone(&raster),
            disk_path,
            source_mtime,
        };
        self.entries.insert(key, entry);
        raster
    }

    /// A disk copy counts only while it is strictly newer than its source and
    /// matches the requested size. Unusable copies are removed.
    fn load_from_disk(&mut self, key: &CacheKey, disk_path: &Path, source_mtime: SystemTime) -> Option<RgbaImage> {
        let disk_mtime = modified_time(disk_path).ok()?;
        if disk_mtime <= source_mtime {
            log::debug!("{} is older than its source", disk_path.display());
            return None;
        }

        let rejected = match read_png(disk_path) {
            Ok(image) if fits_target(&image, key.target_size) => return Some(image),
            Ok(image) => ThumbError::DiskCacheCorrupt {
                path: disk_path.to_path_buf(),
                reason: format!(
                    "{}x{} does not match target size {}",
                    image.width(),
                    image.height(),
                    key.target_size
                ),
            },
            Err(e) => ThumbError::DiskCacheCorrupt {
                path: disk_path.to_path_buf(),
                reason: e.to_string(),
            },
        };

        log::info!("{}; regenerating", rejected);
        self.stats.disk_discarded += 1;
        if let Err(e) = fs::remove_file(disk_path) {
            log::warn!("could not remove {}: {}", disk_path.display(), e);
        }
        None
    }

    /// Drops the oldest-inserted entries until at most `max_items` remain.
    /// Disk copies are left in place.
    pub fn evict(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.max_items);
        if excess > 0 {
            self.entries.drain(..excess);
            self.stats.evicted += excess;
            log::debug!("evicted {} thumbnails, {} remain", excess, self.entries.len());
        }
        excess
    }

    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.entries.shift_remove(key).is_some()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn entry(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

fn fits_target(image: &RgbaImage, target_size: u32) -> bool {
    let largest = image.width().max(image.height());
    largest > 0 && largest <= target_size + SIZE_TOLERANCE
}

/// Shrinks `image` so its larger side equals `target_size`, keeping the aspect
/// ratio. Images already within the target are returned untouched.
pub fn downscale(image: RgbaImage, target_size: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if target_size == 0 || width.max(height) <= target_size {
        return image;
    }

    let scale = |side: u32, long: u32| -> u32 {
        let scaled = (side as u64 * target_size as u64 + long as u64 / 2) / long as u64;
        (scaled as u32).max(1)
    };

    let (new_width, new_height) = if width >= height {
        (target_size, scale(height, width))
    } else {
        (scale(width, height), target_size)
    };

    image::imageops::resize(&image, new_width, new_height, FilterType::Lanczos3)
}
