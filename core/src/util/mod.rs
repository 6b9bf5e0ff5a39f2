mod ring_bytes;
mod text;

pub use ring_bytes::RingBytes;
pub use text::{preview_chars, truncate_for_prompt};
