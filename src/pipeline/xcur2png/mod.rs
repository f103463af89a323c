// Xcursor decoding, PNG encoding and the frame extraction boundary

pub mod extractor;
pub mod png_writer;
pub mod xcursor_reader;

use anyhow::Result;
use std::path::{Path, PathBuf};

pub use extractor::{ExtractOptions, extract_to_pngs};
pub use xcursor_reader::{CursorFile, frame_to_rgba, separate_alpha};

/// `extract(input_file, output_directory)`: numbered frame PNGs plus `cursor_info.txt`.
pub fn extract_cursor(xcursor_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    extract_to_pngs(xcursor_path, output_dir, &ExtractOptions::new())
}
