pub mod asset;
pub mod cursor;
pub mod theme;
