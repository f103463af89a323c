/// One image chunk of an Xcursor file, as stored on disk.
///
/// `pixels` is row-major packed ARGB with the color channels pre-multiplied
/// by alpha. `pixels.len() == width * height` always holds for frames produced
/// by the reader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorFrame {
    pub size: u32,
    pub width: u32,
    pub height: u32,
    pub xhot: u32,
    pub yhot: u32,
    pub delay: u32,
    pub pixels: Vec<u32>,
}

impl CursorFrame {
    pub fn max_dimension(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn info(&self) -> FrameInfo {
        FrameInfo {
            size: self.size,
            width: self.width,
            height: self.height,
            xhot: self.xhot,
            yhot: self.yhot,
            delay: self.delay,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentKind {
    Copyright,
    License,
    Other,
}

impl CommentKind {
    pub fn from_subtype(subtype: u32) -> Self {
        match subtype {
            1 => CommentKind::Copyright,
            2 => CommentKind::License,
            _ => CommentKind::Other,
        }
    }

    pub fn subtype(self) -> u32 {
        match self {
            CommentKind::Copyright => 1,
            CommentKind::License => 2,
            CommentKind::Other => 3,
        }
    }
}

/// A comment chunk. `subtype` is kept as read so unknown types survive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorComment {
    pub subtype: u32,
    pub text: String,
}

impl CursorComment {
    pub fn new(kind: CommentKind, text: impl Into<String>) -> Self {
        Self {
            subtype: kind.subtype(),
            text: text.into(),
        }
    }

    pub fn kind(&self) -> CommentKind {
        CommentKind::from_subtype(self.subtype)
    }
}

/// Per-frame metadata without pixels, as listed in the frame-info sidecar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInfo {
    pub size: u32,
    pub width: u32,
    pub height: u32,
    pub xhot: u32,
    pub yhot: u32,
    pub delay: u32,
}
