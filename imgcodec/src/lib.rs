//! This crate implements encoders and decoders for two raster image
//! formats: [PNG](https://www.w3.org/TR/2003/REC-PNG-20031110/) and
//! [QOI](https://qoiformat.org).
//!
//! The primary exports are the `encode_png`/`decode_png` and
//! `encode_qoi`/`decode_qoi` function pairs. All four work over in-memory
//! byte buffers; the raw pixel format on the decoded side is always a flat
//! sequence of `[r, g, b, a]` bytes.
//!
//! The PNG encoder selects the smallest exact color mode automatically
//! (grayscale, indexed, truecolor, with alpha or a transparency key only
//! where needed), supports Adam7 interlacing, and applies the spec's
//! scanline filters. Only a bit depth of 8 is implemented. The QOI codec
//! additionally offers a resumable streaming decoder for input that arrives
//! in chunks.
//!
//! # PNG round trip example
//!
//! ```rust
//! use imgcodec::{decode_png, encode_png, Interlace, PngOptions};
//!
//! // A 1x1 image of one opaque black pixel.
//! let pixels = vec![0, 0, 0, 255];
//!
//! let options = PngOptions {
//!   width: 1,
//!   height: 1,
//!   compression: 0,
//!   filter: 0,
//!   interlace: Interlace::None,
//! };
//!
//! let encoded = encode_png(&pixels, &options).expect("Failed to encode image");
//! let (header, decoded) = decode_png(&encoded).expect("Failed to decode image");
//!
//! assert_eq!(header.width, 1);
//! assert_eq!(decoded, pixels);
//! ```
//!
//! # Streaming QOI decode example
//!
//! ```rust
//! use imgcodec::{encode_qoi, Channels, Colorspace, QoiOptions, QoiStreamDecoder};
//!
//! let options = QoiOptions {
//!   width: 2,
//!   height: 1,
//!   channels: Channels::Rgb,
//!   colorspace: Colorspace::Srgb,
//! };
//!
//! let encoded = encode_qoi(&[10, 20, 30, 40, 50, 60], &options)
//!   .expect("Failed to encode image");
//!
//! // Chunk boundaries may fall anywhere, even inside the header or an
//! // opcode; the decoder carries partial state across pushes.
//! let mut decoder = QoiStreamDecoder::new();
//! let mut pixels = Vec::new();
//!
//! for chunk in encoded.chunks(5) {
//!   decoder.push(chunk, &mut pixels).expect("Failed to decode chunk");
//! }
//!
//! decoder.finish().expect("Stream was incomplete");
//! assert_eq!(pixels, vec![10, 20, 30, 255, 40, 50, 60, 255]);
//! ```

pub use crate::error::{Error, ErrorKind};
pub use crate::png::{decode_png, encode_png, Interlace, PngOptions};
pub use crate::qoi::{
  decode_qoi, decode_qoi_stream, encode_qoi, Channels, Colorspace, QoiOptions,
  QoiStreamDecoder,
};

mod error;
mod png;
mod qoi;
