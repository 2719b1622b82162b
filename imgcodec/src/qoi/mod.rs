//! The QOI ("Quite OK Image") codec: a byte-oriented run/diff/index encoding
//! with a 14 byte header, a 64 slot running color cache, and an 8 byte end
//! marker.

pub use crate::qoi::decode::decode_qoi;
pub use crate::qoi::encode::encode_qoi;
pub use crate::qoi::meta::{Channels, Colorspace, QoiOptions};
pub use crate::qoi::stream::{decode_qoi_stream, QoiStreamDecoder};

mod decode;
mod encode;
mod meta;
mod op;
mod pixel;
mod state;
mod stream;
