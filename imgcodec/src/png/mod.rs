//! The PNG codec: chunked framing with CRC-32 checksums, five scanline
//! predictors, optional Adam7 interlacing, and automatic color mode
//! selection between grayscale, truecolor, indexed, and their alpha
//! variants. Only a bit depth of 8 is implemented.

pub use crate::png::decode::decode_png;
pub use crate::png::encode::encode_png;
pub use crate::png::meta::{Interlace, PngOptions};

mod chunk;
mod color;
mod crc;
mod decode;
mod encode;
mod filter;
mod meta;
mod pass;
