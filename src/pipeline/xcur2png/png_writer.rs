use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageReader, RgbaImage};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, ThumbError};
use crate::model::cursor::{CursorComment, FrameInfo};
use crate::pipeline::fs_ops::ensure_dir;

pub const FRAME_INFO_HEADER: &str = "Frame\tSize\tWidth\tHeight\tXHot\tYHot\tDelay";

/// Writes `image` as an 8-bit RGBA, non-interlaced PNG.
///
/// The file is written beside its destination and renamed into place, so a
/// failed write never leaves a truncated PNG at `path`.
pub fn write_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let encode_err = |source: image::ImageError| ThumbError::Encode {
        path: path.to_path_buf(),
        source,
    };
    let io_err = |e: std::io::Error| encode_err(image::ImageError::IoError(e));

    if let Some(parent) = path.parent() {
        ensure_dir(parent).map_err(io_err)?;
    }

    let partial = path.with_extension("png.partial");
    let result = (|| {
        let file = fs::File::create(&partial).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        PngEncoder::new(&mut writer)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(encode_err)?;
        writer.flush().map_err(io_err)?;
        fs::rename(&partial, path).map_err(io_err)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

pub fn read_png(path: &Path) -> Result<RgbaImage> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    Ok(reader.decode()?.to_rgba8())
}

pub fn format_frame_line(index: usize, info: &FrameInfo) -> String {
    format!(
        "{}\t{}x{}\t{}\t{}\t{}\t{}\t{}",
        index, info.size, info.size, info.width, info.height, info.xhot, info.yhot, info.delay
    )
}

pub fn write_frame_info(
    path: &Path,
    source: &Path,
    frames: &[FrameInfo],
    comments: &[CursorComment],
) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = BufWriter::new(fs::File::create(path)?);
    writeln!(file, "Cursor File: {}", source.display())?;
    writeln!(file, "Number of frames: {}", frames.len())?;
    writeln!(file)?;
    writeln!(file, "Frame Details:")?;
    writeln!(file, "{}", FRAME_INFO_HEADER)?;

    for (i, info) in frames.iter().enumerate() {
        writeln!(file, "{}", format_frame_line(i + 1, info))?;
    }

    if !comments.is_empty() {
        writeln!(file)?;
        writeln!(file, "Comments:")?;
        for comment in comments {
            writeln!(file, "Type {}: {}", comment.subtype, comment.text)?;
        }
    }

    file.flush()
}

/// Reads the frame table back out of a sidecar. Rows are returned in frame order;
/// lines that do not parse are skipped.
pub fn parse_frame_info(content: &str) -> Vec<FrameInfo> {
    let mut in_table = false;
    let mut frames = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line == FRAME_INFO_HEADER {
            in_table = true;
            continue;
        }
        if !in_table {
            continue;
        }
        if line.is_empty() {
            break;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() != 7 {
            continue;
        }

        let size = parts[1].split('x').next().and_then(|s| s.parse::<u32>().ok());
        let numbers: Option<Vec<u32>> = parts[2..].iter().map(|p| p.parse::<u32>().ok()).collect();

        if let (Some(size), Some(numbers)) = (size, numbers) {
            frames.push(FrameInfo {
                size,
                width: numbers[0],
                height: numbers[1],
                xhot: numbers[2],
                yhot: numbers[3],
                delay: numbers[4],
            });
        }
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cursor::CommentKind;
    use image::Rgba;
    use tempfile::tempdir;

    fn info(size: u32, delay: u32) -> FrameInfo {
        FrameInfo {
            size,
            width: size,
            height: size,
            xhot: 4,
            yhot: 5,
            delay,
        }
    }

    #[test]
    fn test_write_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("test.png");

        let mut image = RgbaImage::from_pixel(32, 16, Rgba([255, 0, 0, 255]));
        image.put_pixel(3, 2, Rgba([10, 20, 30, 40]));

        write_png(&image, &path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("png.partial").exists());

        let loaded = read_png(&path).unwrap();
        assert_eq!(loaded.dimensions(), (32, 16));
        assert_eq!(*loaded.get_pixel(3, 2), Rgba([10, 20, 30, 40]));
    }

    #[test]
    fn test_write_png_to_unwritable_destination() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();

        let image = RgbaImage::new(2, 2);
        let result = write_png(&image, &blocker.join("out.png"));
        assert!(matches!(result, Err(ThumbError::Encode { .. })));
    }

    #[test]
    fn test_format_frame_line() {
        let line = format_frame_line(1, &info(32, 50));
        assert_eq!(line, "1\t32x32\t32\t32\t4\t5\t50");
    }

    #[test]
    fn test_frame_info_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cursor_info.txt");
        let frames = vec![info(24, 0), info(48, 30)];
        let comments = vec![
            CursorComment::new(CommentKind::Copyright, "someone"),
            CursorComment {
                subtype: 9,
                text: "vendor".to_string(),
            },
        ];

        write_frame_info(&path, Path::new("/tmp/left_ptr"), &frames, &comments).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Cursor File: /tmp/left_ptr"));
        assert!(content.contains("Number of frames: 2"));
        assert!(content.contains("Type 1: someone"));
        assert!(content.contains("Type 9: vendor"));
        assert_eq!(parse_frame_info(&content), frames);
    }

    #[test]
    fn test_parse_frame_info_skips_garbage() {
        let content = format!("{}\n1\t32x32\t32\t32\t1\t1\t0\nbroken line\n", FRAME_INFO_HEADER);
        assert_eq!(parse_frame_info(&content).len(), 1);
        assert!(parse_frame_info("nothing here").is_empty());
    }
}
