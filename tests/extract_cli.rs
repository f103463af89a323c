use std::path::Path;
use std::process::Command;

use asset_thumbs::model::cursor::CommentKind;
use asset_thumbs::pipeline::decoder::{CursorDecoder, ExternalDecoder};
use asset_thumbs::pipeline::xcursor_writer::{XcursorBuilder, frame_from_rgba};
use asset_thumbs::ThumbError;
use image::{Rgba, RgbaImage};
use tempfile::tempdir;

const BIN: &str = env!("CARGO_BIN_EXE_asset-thumbs");

fn write_cursor(path: &Path) {
    let small = RgbaImage::from_pixel(16, 16, Rgba([255, 0, 0, 255]));
    let large = RgbaImage::from_pixel(32, 32, Rgba([0, 255, 0, 128]));
    XcursorBuilder::new()
        .image(frame_from_rgba(&small, 16, (1, 1), 50))
        .image(frame_from_rgba(&large, 32, (2, 2), 50))
        .comment(CommentKind::License, "CC0")
        .write_to(path)
        .unwrap();
}

#[test]
fn extract_writes_numbered_frames() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("watch");
    let out = dir.path().join("out");
    write_cursor(&input);

    let status = Command::new(BIN).arg("extract").arg(&input).arg(&out).status().unwrap();
    assert!(status.success());
    assert!(out.join("frame_001.png").exists());
    assert!(out.join("frame_002.png").exists());

    let info = std::fs::read_to_string(out.join("cursor_info.txt")).unwrap();
    assert!(info.contains("32x32"));
    assert!(info.contains("CC0"));
}

#[test]
fn extract_fails_on_garbage() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("garbage");
    std::fs::write(&input, b"not a cursor at all").unwrap();

    let status = Command::new(BIN)
        .arg("extract")
        .arg(&input)
        .arg(dir.path().join("out"))
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn extract_reports_failure_once() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("garbage");
    std::fs::write(&input, b"not a cursor at all").unwrap();

    let output = Command::new(BIN)
        .arg("extract")
        .arg(&input)
        .arg(dir.path().join("out"))
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("is not a valid Xcursor file").count(), 1, "{}", stderr);
}

#[test]
fn binary_serves_as_external_decoder() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("watch");
    write_cursor(&input);

    let decoder = ExternalDecoder::new(BIN).with_leading_args(["extract"]);
    let frames = decoder.decode_frames(&input).unwrap();
    assert_eq!(frames.len(), 2);

    let best = decoder.decode_representative(&input).unwrap();
    assert_eq!(best.image.dimensions(), (32, 32));
    assert_eq!((best.info.xhot, best.info.yhot, best.info.delay), (2, 2, 50));
    assert_eq!(*best.image.get_pixel(0, 0), Rgba([0, 255, 0, 128]));

    let missing = decoder.decode_frames(&dir.path().join("gone"));
    assert!(matches!(missing, Err(ThumbError::SourceUnavailable(_))));
}
