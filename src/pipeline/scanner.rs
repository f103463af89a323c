// Directory listing with natural ordering and a per-directory listing cache

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, ThumbError};
use crate::model::asset::{AssetKind, ScanEntry};
use crate::model::theme::IndexTheme;
use crate::pipeline::xcur2png::xcursor_reader::XCURSOR_MAGIC;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
pub const CURSORS_SUBDIR: &str = "cursors";
/// Cursor names tried, in order, when picking the cursor that represents a theme.
pub const PREVIEW_CURSORS: &[&str] = &["left_ptr", "default", "arrow", "top_left_arrow"];

fn split_natural(name: &str) -> (&str, &str) {
    let prefix_end = name.find(|c: char| c.is_ascii_digit()).unwrap_or(name.len());
    let (prefix, rest) = name.split_at(prefix_end);
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    (prefix, &rest[..digits_end])
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Compares the leading non-digit prefixes, then the digit runs that follow
/// them as numbers (a missing run counts as zero). Full names break ties.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a_prefix, a_digits) = split_natural(a);
    let (b_prefix, b_digits) = split_natural(b);

    a_prefix
        .cmp(b_prefix)
        .then_with(|| cmp_digits(a_digits, b_digits))
        .then_with(|| a.cmp(b))
}

pub fn sort_natural(entries: &mut [ScanEntry]) {
    entries.sort_by(|a, b| natural_cmp(&a.display_name, &b.display_name));
}

/// Lists the direct children of `directory` accepted by `filter`, naturally sorted.
pub fn scan_directory<F>(directory: &Path, filter: F) -> Result<Vec<ScanEntry>>
where
    F: Fn(&Path) -> Option<ScanEntry>,
{
    if !directory.is_dir() {
        return Err(ThumbError::SourceUnavailable(directory.to_path_buf()));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(directory).min_depth(1).max_depth(1).follow_links(true) {
        match entry {
            Ok(entry) => {
                if let Some(item) = filter(entry.path()) {
                    entries.push(item);
                }
            }
            Err(e) => log::debug!("skipping unreadable entry in {}: {}", directory.display(), e),
        }
    }

    sort_natural(&mut entries);
    Ok(entries)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|valid| valid.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Checks the Xcursor magic without reading the whole file.
pub fn is_cursor_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let mut magic = [0u8; 4];
    fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map(|_| magic == XCURSOR_MAGIC)
        .unwrap_or(false)
}

pub fn wallpaper_entry(path: &Path) -> Option<ScanEntry> {
    if !path.is_file() || !is_image_file(path) {
        return None;
    }
    Some(ScanEntry {
        path: path.to_path_buf(),
        display_name: file_name(path)?,
    })
}

fn cursor_files(theme_dir: &Path) -> Vec<PathBuf> {
    let cursors = theme_dir.join(CURSORS_SUBDIR);
    let mut files: Vec<PathBuf> = match fs::read_dir(&cursors) {
        Ok(read) => read
            .flatten()
            .map(|e| e.path())
            .filter(|p| is_cursor_file(p))
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort_by(|a, b| {
        natural_cmp(
            &a.file_name().unwrap_or_default().to_string_lossy(),
            &b.file_name().unwrap_or_default().to_string_lossy(),
        )
    });
    files
}

/// A directory qualifies as a cursor theme when its `cursors/` holds at least
/// one Xcursor file. The display name comes from `index.theme` when present.
pub fn cursor_theme_entry(path: &Path) -> Option<ScanEntry> {
    if !path.is_dir() {
        return None;
    }
    let cursors = path.join(CURSORS_SUBDIR);
    let has_cursor = fs::read_dir(&cursors)
        .ok()?
        .flatten()
        .any(|e| is_cursor_file(&e.path()));
    if !has_cursor {
        return None;
    }

    let dir_name = file_name(path)?;
    let display_name = match IndexTheme::load(path) {
        Ok(index) if !index.name.is_empty() => index.name,
        _ => dir_name,
    };

    Some(ScanEntry {
        path: path.to_path_buf(),
        display_name,
    })
}

/// The cursor that stands for a theme in a preview: `(cursor_type, file)`.
pub fn representative_cursor(theme_dir: &Path) -> Option<(String, PathBuf)> {
    let cursors = theme_dir.join(CURSORS_SUBDIR);
    for name in PREVIEW_CURSORS {
        let candidate = cursors.join(name);
        if is_cursor_file(&candidate) {
            return Some((name.to_string(), candidate));
        }
    }

    let first = cursor_files(theme_dir).into_iter().next()?;
    Some((file_name(&first)?, first))
}

/// Scans directories for one kind of asset and remembers each listing until
/// a forced refresh. Filesystem changes are not noticed on their own.
pub struct DirectoryScanner {
    kind: AssetKind,
    listings: HashMap<PathBuf, Vec<ScanEntry>>,
}

impl DirectoryScanner {
    pub fn new(kind: AssetKind) -> Self {
        Self {
            kind,
            listings: HashMap::new(),
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn scan(&mut self, directory: &Path, force_refresh: bool) -> Result<&[ScanEntry]> {
        if force_refresh || !self.listings.contains_key(directory) {
            let entries = match self.kind {
                AssetKind::Wallpaper => scan_directory(directory, wallpaper_entry)?,
                AssetKind::CursorTheme => scan_directory(directory, cursor_theme_entry)?,
            };
            log::debug!("scanned {}: {} entries", directory.display(), entries.len());
            self.listings.insert(directory.to_path_buf(), entries);
        }

        Ok(self
            .listings
            .get(directory)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    pub fn cached(&self, directory: &Path) -> Option<&[ScanEntry]> {
        self.listings.get(directory).map(Vec::as_slice)
    }
}
