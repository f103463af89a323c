use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Wallpaper,
    CursorTheme,
}

/// One listed item of a scanned directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanEntry {
    pub path: PathBuf,
    pub display_name: String,
}

/// Opaque handle the UI keeps in place of a widget-keyed lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u32);

impl AssetId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetRecord {
    pub kind: AssetKind,
    pub path: PathBuf,
    pub display_name: String,
}

/// Owns every asset record handed out during the process lifetime.
/// Registering the same path twice returns the same handle.
#[derive(Debug, Default)]
pub struct AssetArena {
    records: Vec<AssetRecord>,
    by_path: HashMap<(AssetKind, PathBuf), AssetId>,
}

impl AssetArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: AssetKind, entry: &ScanEntry) -> AssetId {
        if let Some(&id) = self.by_path.get(&(kind, entry.path.clone())) {
            self.records[id.index()].display_name = entry.display_name.clone();
            return id;
        }

        let id = AssetId(self.records.len() as u32);
        self.records.push(AssetRecord {
            kind,
            path: entry.path.clone(),
            display_name: entry.display_name.clone(),
        });
        self.by_path.insert((kind, entry.path.clone()), id);
        id
    }

    pub fn get(&self, id: AssetId) -> Option<&AssetRecord> {
        self.records.get(id.index())
    }

    pub fn find(&self, kind: AssetKind, path: &Path) -> Option<AssetId> {
        self.by_path.get(&(kind, path.to_path_buf())).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, name: &str) -> ScanEntry {
        ScanEntry {
            path: PathBuf::from(path),
            display_name: name.to_string(),
        }
    }

    #[test]
    fn test_register_is_idempotent_per_path() {
        let mut arena = AssetArena::new();
        let a = arena.register(AssetKind::Wallpaper, &entry("/w/a.jpg", "a.jpg"));
        let b = arena.register(AssetKind::Wallpaper, &entry("/w/b.jpg", "b.jpg"));
        let again = arena.register(AssetKind::Wallpaper, &entry("/w/a.jpg", "renamed"));

        assert_ne!(a, b);
        assert_eq!(a, again);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a).unwrap().display_name, "renamed");
        assert_eq!(arena.find(AssetKind::Wallpaper, Path::new("/w/b.jpg")), Some(b));
        assert_eq!(arena.find(AssetKind::CursorTheme, Path::new("/w/b.jpg")), None);
    }
}
