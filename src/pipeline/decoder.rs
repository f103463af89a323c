// Cursor decoding capability: parse in-process, or delegate to a helper program

use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::DecoderConfig;
use crate::error::{Result, ThumbError};
use crate::model::cursor::FrameInfo;
use crate::pipeline::xcur2png::extractor::{FRAME_INFO_FILE, frame_file_name};
use crate::pipeline::xcur2png::png_writer::{parse_frame_info, read_png};
use crate::pipeline::xcur2png::xcursor_reader::{CursorFile, frame_to_rgba};

const MAX_EXTERNAL_FRAMES: usize = 4096;
const MAX_FRAME_DIMENSION: u32 = 0x7fff;

/// A cursor frame with alpha already separated.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub info: FrameInfo,
    pub image: RgbaImage,
}

pub trait CursorDecoder {
    fn decode_frames(&self, path: &Path) -> Result<Vec<DecodedFrame>>;

    /// The highest-fidelity frame: largest `max(width, height)`, first on ties.
    fn decode_representative(&self, path: &Path) -> Result<DecodedFrame> {
        pick_representative(self.decode_frames(path)?).ok_or(ThumbError::NoFrames)
    }
}

pub fn pick_representative(frames: Vec<DecodedFrame>) -> Option<DecodedFrame> {
    let mut best: Option<DecodedFrame> = None;
    for frame in frames {
        let larger = match &best {
            Some(b) => frame.image.width().max(frame.image.height()) > b.image.width().max(b.image.height()),
            None => true,
        };
        if larger {
            best = Some(frame);
        }
    }
    best
}

pub fn from_config(config: &DecoderConfig) -> Box<dyn CursorDecoder> {
    match config {
        DecoderConfig::InProcess => Box::new(InProcessDecoder),
        DecoderConfig::External { program, args } => {
            Box::new(ExternalDecoder::new(program).with_leading_args(args.iter().cloned()))
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InProcessDecoder;

impl CursorDecoder for InProcessDecoder {
    fn decode_frames(&self, path: &Path) -> Result<Vec<DecodedFrame>> {
        let xcursor = CursorFile::from_file(path)?;
        Ok(xcursor
            .images
            .iter()
            .map(|frame| DecodedFrame {
                info: frame.info(),
                image: frame_to_rgba(frame),
            })
            .collect())
    }

    fn decode_representative(&self, path: &Path) -> Result<DecodedFrame> {
        let xcursor = CursorFile::from_file(path)?;
        let frame = xcursor.representative_frame().ok_or(ThumbError::NoFrames)?;
        Ok(DecodedFrame {
            info: frame.info(),
            image: frame_to_rgba(frame),
        })
    }
}

/// Runs `program [args..] <input_file> <output_directory>` in a scratch
/// directory and reads back the numbered PNGs and the frame-info sidecar.
#[derive(Debug, Clone)]
pub struct ExternalDecoder {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl ExternalDecoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn failure(&self, message: impl std::fmt::Display) -> ThumbError {
        ThumbError::ExternalDecoderFailure(format!("{}: {}", self.program.display(), message))
    }

    fn read_output(&self, dir: &Path) -> Result<Vec<DecodedFrame>> {
        let sidecar = std::fs::read_to_string(dir.join(FRAME_INFO_FILE))
            .map_err(|e| self.failure(format!("missing {}: {}", FRAME_INFO_FILE, e)))?;

        let infos = parse_frame_info(&sidecar);
        if infos.is_empty() {
            return Err(self.failure("no frames reported"));
        }
        if infos.len() > MAX_EXTERNAL_FRAMES {
            return Err(self.failure(format!("implausible frame count {}", infos.len())));
        }

        infos
            .into_iter()
            .enumerate()
            .map(|(i, info)| {
                if info.width > MAX_FRAME_DIMENSION || info.height > MAX_FRAME_DIMENSION {
                    return Err(self.failure(format!("frame {} is {}x{}", i + 1, info.width, info.height)));
                }
                let png = dir.join(frame_file_name("frame", i + 1));
                let image = read_png(&png).map_err(|e| self.failure(format!("{}: {}", png.display(), e)))?;
                if image.dimensions() != (info.width, info.height) {
                    return Err(self.failure(format!(
                        "frame {} is {}x{} but sidecar says {}x{}",
                        i + 1,
                        image.width(),
                        image.height(),
                        info.width,
                        info.height
                    )));
                }
                Ok(DecodedFrame { info, image })
            })
            .collect()
    }
}

impl CursorDecoder for ExternalDecoder {
    fn decode_frames(&self, path: &Path) -> Result<Vec<DecodedFrame>> {
        if !path.exists() {
            return Err(ThumbError::SourceUnavailable(path.to_path_buf()));
        }

        let scratch = tempfile::Builder::new()
            .prefix("cursor-frames-")
            .tempdir()
            .map_err(|e| self.failure(format!("cannot create scratch directory: {}", e)))?;

        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .arg(path)
            .arg(scratch.path())
            .output()
            .map_err(|e| self.failure(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!("{} ({})", output.status, stderr.trim())));
        }

        self.read_output(scratch.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::xcursor_writer::{XcursorBuilder, frame_from_rgba};
    use image::Rgba;
    use tempfile::tempdir;

    fn write_cursor(path: &Path, sizes: &[u32]) {
        let mut builder = XcursorBuilder::new();
        for &size in sizes {
            let img = RgbaImage::from_pixel(size, size, Rgba([size as u8, 0, 0, 255]));
            builder = builder.image(frame_from_rgba(&img, size, (0, 0), 0));
        }
        builder.write_to(path).unwrap();
    }

    #[test]
    fn test_in_process_representative_is_largest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("left_ptr");
        write_cursor(&path, &[24, 48, 32]);

        let frame = InProcessDecoder.decode_representative(&path).unwrap();
        assert_eq!(frame.image.dimensions(), (48, 48));
        assert_eq!(frame.image.get_pixel(0, 0)[0], 48);

        let all = InProcessDecoder.decode_frames(&path).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(pick_representative(all).unwrap().info.size, 48);
    }

    #[test]
    fn test_in_process_missing_source() {
        let dir = tempdir().unwrap();
        let result = InProcessDecoder.decode_frames(&dir.path().join("gone"));
        assert!(matches!(result, Err(ThumbError::SourceUnavailable(_))));
    }

    #[test]
    fn test_external_missing_program() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("left_ptr");
        write_cursor(&path, &[24]);

        let decoder = ExternalDecoder::new(dir.path().join("no-such-helper"));
        let result = decoder.decode_frames(&path);
        assert!(matches!(result, Err(ThumbError::ExternalDecoderFailure(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_external_non_zero_exit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("left_ptr");
        write_cursor(&path, &[24]);

        let decoder = ExternalDecoder::new("sh").with_leading_args(["-c", "exit 3", "sh"]);
        let result = decoder.decode_frames(&path);
        assert!(matches!(result, Err(ThumbError::ExternalDecoderFailure(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_external_reads_helper_output() {
        use crate::pipeline::xcur2png::extractor::{ExtractOptions, extract_to_pngs};

        let dir = tempdir().unwrap();
        let path = dir.path().join("left_ptr");
        write_cursor(&path, &[16, 32]);

        // a pre-extracted copy stands in for the helper's output
        let canned = dir.path().join("canned");
        extract_to_pngs(&path, &canned, &ExtractOptions::new()).unwrap();
        let script = format!("cp '{}'/* \"$2\"/", canned.display());

        let decoder = ExternalDecoder::new("sh").with_leading_args(["-c".to_string(), script, "sh".to_string()]);
        let frames = decoder.decode_frames(&path).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(decoder.decode_representative(&path).unwrap().info.size, 32);
    }

    #[cfg(unix)]
    #[test]
    fn test_external_rejects_mismatched_sidecar() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("left_ptr");
        write_cursor(&path, &[16]);

        let canned = dir.path().join("canned");
        crate::pipeline::xcur2png::extract_cursor(&path, &canned).unwrap();
        let info = canned.join(FRAME_INFO_FILE);
        let content = std::fs::read_to_string(&info).unwrap().replace("\t16\t16\t", "\t99\t99\t");
        std::fs::write(&info, content).unwrap();

        let script = format!("cp '{}'/* \"$2\"/", canned.display());
        let decoder = ExternalDecoder::new("sh").with_leading_args(["-c".to_string(), script, "sh".to_string()]);
        assert!(matches!(
            decoder.decode_frames(&path),
            Err(ThumbError::ExternalDecoderFailure(_))
        ));
    }
}
