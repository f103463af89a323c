// Thumbnail panel controller: owns the listing cache, the thumbnail cache and the current directory

use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};

use crate::batch_loader::{BatchLoader, StepOutcome};
use crate::config::{Config, SizeInput};
use crate::error::{Result, ThumbError};
use crate::event::LoadMsg;
use crate::model::asset::{AssetArena, AssetId, AssetKind, AssetRecord};
use crate::pipeline::decoder::{self, CursorDecoder};
use crate::pipeline::scanner::{DirectoryScanner, representative_cursor};
use crate::pipeline::thumbnail_cache::{CacheKey, Raster, ThumbnailCache};

pub struct Panel {
    kind: AssetKind,
    target_size: u32,
    scanner: DirectoryScanner,
    cache: ThumbnailCache,
    decoder: Box<dyn CursorDecoder>,
    arena: AssetArena,
    loader: BatchLoader,
    current_dir: Option<PathBuf>,
}

impl Panel {
    pub fn new(kind: AssetKind, config: &Config, tx: Sender<LoadMsg>) -> Self {
        Self::with_parts(
            kind,
            config.thumbnail_size,
            ThumbnailCache::new(config.thumbnail_dir(), config.max_cached_items),
            decoder::from_config(&config.decoder),
            BatchLoader::new(tx, config.batch_size, config.reload_cooldown()),
        )
    }

    pub fn with_parts(
        kind: AssetKind,
        target_size: u32,
        cache: ThumbnailCache,
        decoder: Box<dyn CursorDecoder>,
        loader: BatchLoader,
    ) -> Self {
        Self {
            kind,
            target_size,
            scanner: DirectoryScanner::new(kind),
            cache,
            decoder,
            arena: AssetArena::new(),
            loader,
            current_dir: None,
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn target_size(&self) -> u32 {
        self.target_size
    }

    pub fn set_target_size(&mut self, input: &SizeInput) {
        self.target_size = input.target_size();
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn record(&self, id: AssetId) -> Option<&AssetRecord> {
        self.arena.get(id)
    }

    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    /// Makes `directory` current and queues its load. Returns false when the
    /// selection repeats a load started moments ago.
    pub fn select_directory(&mut self, directory: &Path, force_refresh: bool) -> Result<bool> {
        self.current_dir = Some(directory.to_path_buf());

        if !force_refresh && self.loader.recently_started(directory) {
            log::debug!("{} was just loaded, skipping rescan", directory.display());
            return Ok(false);
        }

        let entries = self.scanner.scan(directory, force_refresh)?;
        let ids: Vec<AssetId> = entries
            .iter()
            .map(|entry| self.arena.register(self.kind, entry))
            .collect();

        Ok(self.loader.start(directory, ids, force_refresh))
    }

    /// One cooperative step; the host loop calls this until it returns `Idle`.
    pub fn step(&mut self) -> StepOutcome {
        let Panel {
            kind,
            target_size,
            cache,
            decoder,
            arena,
            loader,
            current_dir,
            ..
        } = self;

        let outcome = loader.step(current_dir.as_deref(), |id| {
            render(*kind, *target_size, arena, cache, &**decoder, id)
        });

        if let StepOutcome::Completed(_) | StepOutcome::Cancelled(_) = outcome {
            cache.evict();
        }
        outcome
    }

    pub fn run_to_completion(&mut self) -> usize {
        let mut steps = 0;
        while self.step() != StepOutcome::Idle {
            steps += 1;
        }
        steps
    }
}

fn render(
    kind: AssetKind,
    target_size: u32,
    arena: &AssetArena,
    cache: &mut ThumbnailCache,
    decoder: &dyn CursorDecoder,
    id: AssetId,
) -> Result<Raster> {
    let record = arena
        .get(id)
        .ok_or_else(|| ThumbError::SourceUnavailable(PathBuf::from(format!("{:?}", id))))?;

    match kind {
        AssetKind::Wallpaper => {
            let key = CacheKey::for_path(&record.path, target_size);
            cache.get_or_create(key, &record.path, || Ok(image::open(&record.path)?.to_rgba8()))
        }
        AssetKind::CursorTheme => {
            let (cursor_type, file) =
                representative_cursor(&record.path).ok_or(ThumbError::NoFrames)?;
            let theme = record
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| record.display_name.clone());
            let key = CacheKey::for_cursor(&theme, &cursor_type, target_size);
            cache.get_or_create(key, &file, || Ok(decoder.decode_representative(&file)?.image))
        }
    }
}
