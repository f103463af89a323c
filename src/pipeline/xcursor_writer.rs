use image::{Rgba, RgbaImage};
use std::fs;
use std::io;
use std::path::Path;

use crate::model::cursor::{CommentKind, CursorComment, CursorFrame};
use crate::pipeline::xcur2png::xcursor_reader::{
    XCURSOR_COMMENT_HEADER_LEN, XCURSOR_COMMENT_TYPE, XCURSOR_FILE_HEADER_LEN,
    XCURSOR_IMAGE_HEADER_LEN, XCURSOR_IMAGE_TYPE, XCURSOR_MAGIC, XCURSOR_VERSION,
};

const TOC_ENTRY_LEN: usize = 12;

pub fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Straight RGBA to packed, pre-multiplied ARGB.
pub fn premultiply(pixel: Rgba<u8>) -> u32 {
    let [r, g, b, a] = pixel.0;
    let scale = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
    pack_argb(a, scale(r), scale(g), scale(b))
}

pub fn frame_from_rgba(image: &RgbaImage, size: u32, hotspot: (u32, u32), delay: u32) -> CursorFrame {
    CursorFrame {
        size,
        width: image.width(),
        height: image.height(),
        xhot: hotspot.0,
        yhot: hotspot.1,
        delay,
        pixels: image.pixels().map(|p| premultiply(*p)).collect(),
    }
}

/// Assembles an Xcursor file: images first, then comments, in insertion order.
#[derive(Debug, Default, Clone)]
pub struct XcursorBuilder {
    images: Vec<CursorFrame>,
    comments: Vec<CursorComment>,
}

impl XcursorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(mut self, frame: CursorFrame) -> Self {
        self.images.push(frame);
        self
    }

    pub fn comment(mut self, kind: CommentKind, text: impl Into<String>) -> Self {
        self.comments.push(CursorComment::new(kind, text));
        self
    }

    /// A comment with a subtype outside the three standard ones.
    pub fn raw_comment(mut self, subtype: u32, text: impl Into<String>) -> Self {
        self.comments.push(CursorComment {
            subtype,
            text: text.into(),
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let ntoc = self.images.len() + self.comments.len();
        let mut output = Vec::new();

        output.extend_from_slice(XCURSOR_MAGIC);
        put(&mut output, XCURSOR_FILE_HEADER_LEN);
        put(&mut output, XCURSOR_VERSION);
        put(&mut output, ntoc as u32);

        let mut offset = XCURSOR_FILE_HEADER_LEN as usize + ntoc * TOC_ENTRY_LEN;

        for image in &self.images {
            put(&mut output, XCURSOR_IMAGE_TYPE);
            put(&mut output, image.size);
            put(&mut output, offset as u32);
            offset += XCURSOR_IMAGE_HEADER_LEN as usize + image.pixels.len() * 4;
        }
        for comment in &self.comments {
            put(&mut output, XCURSOR_COMMENT_TYPE);
            put(&mut output, comment.subtype);
            put(&mut output, offset as u32);
            offset += XCURSOR_COMMENT_HEADER_LEN as usize + comment.text.len();
        }

        for image in &self.images {
            for field in [
                XCURSOR_IMAGE_HEADER_LEN,
                XCURSOR_IMAGE_TYPE,
                image.size,
                1,
                image.width,
                image.height,
                image.xhot,
                image.yhot,
                image.delay,
            ] {
                put(&mut output, field);
            }
            for pixel in &image.pixels {
                put(&mut output, *pixel);
            }
        }
        for comment in &self.comments {
            for field in [
                XCURSOR_COMMENT_HEADER_LEN,
                XCURSOR_COMMENT_TYPE,
                comment.subtype,
                1,
                comment.text.len() as u32,
            ] {
                put(&mut output, field);
            }
            output.extend_from_slice(comment.text.as_bytes());
        }

        output
    }

    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.build())
    }
}

fn put(output: &mut Vec<u8>, value: u32) {
    output.extend_from_slice(&value.to_le_bytes());
}
