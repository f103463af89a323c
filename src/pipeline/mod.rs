pub mod decoder;
pub mod fs_ops;
pub mod scanner;
pub mod thumbnail_cache;
pub mod xcur2png;
pub mod xcursor_writer;
