use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};

use super::png_writer::{write_frame_info, write_png};
use super::xcursor_reader::{CursorFile, frame_to_rgba};
use crate::model::cursor::FrameInfo;
use crate::pipeline::fs_ops::ensure_dir;

pub const FRAME_INFO_FILE: &str = "cursor_info.txt";

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub prefix: String,
    pub initial_suffix: usize,
    pub write_info: bool,
    pub info_name: String,
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self {
            prefix: "frame".to_string(),
            initial_suffix: 1,
            write_info: true,
            info_name: FRAME_INFO_FILE.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_initial_suffix(mut self, suffix: usize) -> Self {
        self.initial_suffix = suffix;
        self
    }

    pub fn with_info(mut self, write: bool) -> Self {
        self.write_info = write;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

pub fn frame_file_name(prefix: &str, index: usize) -> String {
    format!("{}_{:03}.png", prefix, index)
}

/// Decodes `xcursor_path` and writes one straight-alpha PNG per frame plus
/// the frame-info sidecar into `output_dir`.
pub fn extract_to_pngs(
    xcursor_path: &Path,
    output_dir: &Path,
    options: &ExtractOptions,
) -> Result<Vec<PathBuf>> {
    if output_dir.exists() && !output_dir.is_dir() {
        return Err(anyhow!(
            "'{}' exists but is not a directory",
            output_dir.display()
        ));
    }
    ensure_dir(output_dir)
        .with_context(|| format!("Cannot create output directory '{}'", output_dir.display()))?;

    let xcursor = CursorFile::from_file(xcursor_path)
        .with_context(|| format!("'{}' is not a valid Xcursor file", xcursor_path.display()))?;

    log::info!(
        "Found {} frame(s) in {} (sizes {:?})",
        xcursor.images.len(),
        xcursor_path.display(),
        xcursor.get_sizes()
    );

    let mut extracted_files = Vec::with_capacity(xcursor.images.len());
    let mut infos: Vec<FrameInfo> = Vec::with_capacity(xcursor.images.len());

    for (i, frame) in xcursor.images.iter().enumerate() {
        let index = options.initial_suffix + i;
        let filepath = output_dir.join(frame_file_name(&options.prefix, index));

        write_png(&frame_to_rgba(frame), &filepath)
            .with_context(|| format!("Failed to save frame {}", index))?;

        log::debug!(
            "Saved frame {}: {}x{} (size={}, delay={}ms) -> {}",
            index,
            frame.width,
            frame.height,
            frame.size,
            frame.delay,
            filepath.display()
        );

        extracted_files.push(filepath);
        infos.push(frame.info());
    }

    if options.write_info {
        let info_path = output_dir.join(&options.info_name);
        write_frame_info(&info_path, xcursor_path, &infos, &xcursor.comments)
            .with_context(|| format!("Failed to write {}", info_path.display()))?;
    }

    Ok(extracted_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::xcur2png::png_writer::{parse_frame_info, read_png};
    use crate::pipeline::xcursor_writer::{XcursorBuilder, frame_from_rgba};
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_extract_options() {
        let opts = ExtractOptions::new()
            .with_prefix("test")
            .with_initial_suffix(10)
            .with_info(false);

        assert_eq!(opts.prefix, "test");
        assert_eq!(opts.initial_suffix, 10);
        assert!(!opts.write_info);
    }

    #[test]
    fn test_extract_options_default() {
        let opts = ExtractOptions::default();
        assert_eq!(opts.prefix, "frame");
        assert_eq!(opts.initial_suffix, 1);
        assert!(opts.write_info);
        assert_eq!(frame_file_name(&opts.prefix, 1), "frame_001.png");
    }

    #[test]
    fn test_extract_writes_frames_and_info() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("wait");
        let out = dir.path().join("out");

        let small = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 255, 128]));
        let large = RgbaImage::from_pixel(32, 32, Rgba([255, 0, 0, 255]));
        XcursorBuilder::new()
            .image(frame_from_rgba(&small, 16, (1, 2), 20))
            .image(frame_from_rgba(&large, 32, (3, 4), 20))
            .write_to(&input)
            .unwrap();

        let files = extract_to_pngs(&input, &out, &ExtractOptions::new()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(out.join("frame_001.png").exists());
        assert!(out.join("frame_002.png").exists());

        let first = read_png(&files[0]).unwrap();
        assert_eq!(*first.get_pixel(0, 0), Rgba([0, 0, 255, 128]));

        let info = std::fs::read_to_string(out.join(FRAME_INFO_FILE)).unwrap();
        let rows = parse_frame_info(&info);
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[1].xhot, rows[1].yhot, rows[1].width), (3, 4, 32));
    }

    #[test]
    fn test_extract_rejects_file_as_output_dir() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("taken");
        std::fs::write(&out, b"x").unwrap();

        let result = extract_to_pngs(&dir.path().join("missing"), &out, &ExtractOptions::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_invalid_cursor_fails() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("empty");
        std::fs::write(&input, b"").unwrap();

        let result = extract_to_pngs(&input, &dir.path().join("out"), &ExtractOptions::new());
        assert!(result.is_err());
    }
}
