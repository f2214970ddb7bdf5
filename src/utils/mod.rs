pub mod bytes;
pub mod fuzzy;

pub use bytes::format_bytes;
