use byteorder::{LittleEndian, ReadBytesExt};
use image::{Rgba, RgbaImage};
use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::{Result, ThumbError};
use crate::model::cursor::{CursorComment, CursorFrame};

pub const XCURSOR_MAGIC: &[u8] = b"Xcur";
pub const XCURSOR_VERSION: u32 = 0x0001_0000;
pub const XCURSOR_FILE_HEADER_LEN: u32 = 16;
pub const XCURSOR_IMAGE_TYPE: u32 = 0xfffd_0002;
pub const XCURSOR_COMMENT_TYPE: u32 = 0xfffe_0001;
pub const XCURSOR_IMAGE_HEADER_LEN: u32 = 36;
pub const XCURSOR_COMMENT_HEADER_LEN: u32 = 20;

const XCURSOR_IMAGE_MAX_SIZE: u32 = 0x7fff;
const XCURSOR_MAX_TOC: u32 = 0x1_0000;

/// A parsed Xcursor file. Frames keep table-of-contents order.
#[derive(Debug, Clone)]
pub struct CursorFile {
    pub images: Vec<CursorFrame>,
    pub comments: Vec<CursorComment>,
}

#[derive(Debug, Clone, Copy)]
struct TocEntry {
    chunk_type: u32,
    subtype: u32,
    position: u32,
}

impl CursorFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ThumbError::SourceUnavailable(path.to_path_buf()),
            _ => ThumbError::Io(e),
        })?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let toc = read_header(&mut cursor)?;

        let mut images = Vec::new();
        let mut comments = Vec::new();

        for entry in toc {
            match entry.chunk_type {
                XCURSOR_IMAGE_TYPE => match read_image(&mut cursor, entry) {
                    Ok(frame) => images.push(frame),
                    Err(reason) => {
                        log::debug!("skipping image chunk at {}: {}", entry.position, reason);
                    }
                },
                XCURSOR_COMMENT_TYPE => match read_comment(&mut cursor, entry) {
                    Ok(comment) => comments.push(comment),
                    Err(reason) => {
                        log::debug!("skipping comment chunk at {}: {}", entry.position, reason);
                    }
                },
                _ => {}
            }
        }

        if images.is_empty() {
            return Err(ThumbError::NoFrames);
        }

        Ok(CursorFile { images, comments })
    }

    /// Nominal sizes present in the file, ascending.
    pub fn get_sizes(&self) -> Vec<u32> {
        let mut sizes: Vec<u32> = self.images.iter().map(|img| img.size).collect();
        sizes.sort_unstable();
        sizes.dedup();
        sizes
    }

    pub fn get_images_for_size(&self, size: u32) -> Vec<&CursorFrame> {
        self.images.iter().filter(|img| img.size == size).collect()
    }

    /// The frame with the largest `max(width, height)`; the first one wins a tie.
    pub fn representative_frame(&self) -> Option<&CursorFrame> {
        self.images.iter().fold(None, |best: Option<&CursorFrame>, frame| match best {
            Some(b) if b.max_dimension() >= frame.max_dimension() => Some(b),
            _ => Some(frame),
        })
    }
}

fn read_header(cursor: &mut Cursor<&[u8]>) -> Result<Vec<TocEntry>> {
    let malformed = |what: &str| ThumbError::MalformedHeader(what.to_string());

    let mut magic = [0u8; 4];
    cursor
        .read_exact(&mut magic)
        .map_err(|_| malformed("file too short for magic"))?;
    if magic != XCURSOR_MAGIC {
        return Err(malformed("invalid Xcursor magic bytes"));
    }

    let header_size = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| malformed("missing header size"))?;
    if header_size < XCURSOR_FILE_HEADER_LEN {
        return Err(ThumbError::MalformedHeader(format!(
            "invalid header size: {}",
            header_size
        )));
    }

    let version = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| malformed("missing version"))?;
    if version != XCURSOR_VERSION {
        return Err(ThumbError::MalformedHeader(format!(
            "unsupported version: 0x{:08x}",
            version
        )));
    }

    let ntoc = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| malformed("missing toc count"))?;
    if ntoc > XCURSOR_MAX_TOC {
        return Err(ThumbError::MalformedHeader(format!(
            "too many toc entries: {}",
            ntoc
        )));
    }

    cursor.set_position(header_size as u64);

    let mut toc = Vec::with_capacity(ntoc as usize);
    for _ in 0..ntoc {
        let mut read = || {
            cursor
                .read_u32::<LittleEndian>()
                .map_err(|_| malformed("truncated table of contents"))
        };
        let chunk_type = read()?;
        let subtype = read()?;
        let position = read()?;
        toc.push(TocEntry {
            chunk_type,
            subtype,
            position,
        });
    }

    Ok(toc)
}

/// Reads the common chunk header and checks it against the toc entry.
fn seek_chunk(
    cursor: &mut Cursor<&[u8]>,
    entry: TocEntry,
    min_header: u32,
) -> std::result::Result<u32, String> {
    cursor.set_position(entry.position as u64);

    let header = cursor.read_u32::<LittleEndian>().map_err(|e| e.to_string())?;
    let chunk_type = cursor.read_u32::<LittleEndian>().map_err(|e| e.to_string())?;
    let subtype = cursor.read_u32::<LittleEndian>().map_err(|e| e.to_string())?;
    let version = cursor.read_u32::<LittleEndian>().map_err(|e| e.to_string())?;

    if header < min_header {
        return Err(format!("chunk header too small: {}", header));
    }
    if chunk_type != entry.chunk_type || subtype != entry.subtype {
        return Err("chunk does not match its toc entry".to_string());
    }
    Ok(version)
}

fn read_image(cursor: &mut Cursor<&[u8]>, entry: TocEntry) -> std::result::Result<CursorFrame, String> {
    let version = seek_chunk(cursor, entry, XCURSOR_IMAGE_HEADER_LEN)?;
    if version != 1 {
        return Err(format!("unsupported image version: {}", version));
    }

    let mut fields = [0u32; 5];
    for field in fields.iter_mut() {
        *field = cursor.read_u32::<LittleEndian>().map_err(|e| e.to_string())?;
    }
    let [width, height, xhot, yhot, delay] = fields;

    if width == 0 || height == 0 || width > XCURSOR_IMAGE_MAX_SIZE || height > XCURSOR_IMAGE_MAX_SIZE {
        return Err(format!("invalid dimensions {}x{}", width, height));
    }
    if xhot > width || yhot > height {
        return Err(format!("hotspot ({}, {}) outside {}x{}", xhot, yhot, width, height));
    }

    let count = width as usize * height as usize;
    let remaining = cursor.get_ref().len() as u64 - cursor.position().min(cursor.get_ref().len() as u64);
    if (count as u64) * 4 > remaining {
        return Err(format!("pixel data truncated ({} of {} bytes)", remaining, count * 4));
    }

    let mut pixels = Vec::with_capacity(count);
    for _ in 0..count {
        pixels.push(cursor.read_u32::<LittleEndian>().map_err(|e| e.to_string())?);
    }

    Ok(CursorFrame {
        size: entry.subtype,
        width,
        height,
        xhot,
        yhot,
        delay,
        pixels,
    })
}

fn read_comment(cursor: &mut Cursor<&[u8]>, entry: TocEntry) -> std::result::Result<CursorComment, String> {
    let version = seek_chunk(cursor, entry, XCURSOR_COMMENT_HEADER_LEN)?;
    if version != 1 {
        return Err(format!("unsupported comment version: {}", version));
    }

    let length = cursor.read_u32::<LittleEndian>().map_err(|e| e.to_string())?;
    let mut text = vec![0u8; length.min(0x10_0000) as usize];
    cursor.read_exact(&mut text).map_err(|e| e.to_string())?;

    Ok(CursorComment {
        subtype: entry.subtype,
        text: String::from_utf8_lossy(&text).into_owned(),
    })
}

/// Reverses pre-multiplied alpha for one packed ARGB pixel, returning straight RGBA.
pub fn separate_alpha(pixel: u32) -> Rgba<u8> {
    let alpha = pixel >> 24;
    if alpha == 0 {
        return Rgba([0, 0, 0, 0]);
    }

    let unmultiply = |channel: u32| ((channel * 255 + alpha / 2) / alpha).min(255) as u8;

    Rgba([
        unmultiply((pixel >> 16) & 0xff),
        unmultiply((pixel >> 8) & 0xff),
        unmultiply(pixel & 0xff),
        alpha as u8,
    ])
}

pub fn frame_to_rgba(frame: &CursorFrame) -> RgbaImage {
    RgbaImage::from_fn(frame.width, frame.height, |x, y| {
        separate_alpha(frame.pixels[(y * frame.width + x) as usize])
    })
}
