use crate::error::Error;
use crate::qoi::meta::{Channels, QoiOptions, QOI_BYTES_END, QOI_HEADER_LEN, QOI_MAX_RUN};
use crate::qoi::op::Op;
use crate::qoi::pixel::{Pixel, PixelDelta};
use crate::qoi::state::State;

/// Encodes an image's raw pixel data into a QOI byte stream.
///
/// The input is a flat sequence of 3 or 4 byte pixels according to
/// `options.channels`; 3 channel pixels are treated as fully opaque. The
/// returned bytes are the complete stream: header, opcodes, and the 8 byte
/// end marker.
pub fn encode_qoi(input: &[u8], options: &QoiOptions) -> Result<Vec<u8>, Error> {
  if options.width == 0 {
    return Err(Error::InvalidWidth(options.width));
  }
  if options.height == 0 {
    return Err(Error::InvalidHeight(options.height));
  }

  let bytes_per_pixel = options.channels.bytes_per_pixel();

  if input.len() % bytes_per_pixel != 0 {
    return Err(Error::UnalignedInput);
  }

  let num_pixels = options.num_pixels();

  if input.len() / bytes_per_pixel != num_pixels {
    return Err(Error::BufferLengthMismatch { expected: num_pixels });
  }

  // Worst case, every pixel becomes a literal op of one tag byte plus its
  // channel bytes.
  let capacity = QOI_HEADER_LEN + num_pixels * (bytes_per_pixel + 1) + QOI_BYTES_END.len();
  let mut out = Vec::with_capacity(capacity);
  options.write_header(&mut out);

  let mut state = State::new();

  for raw in input.chunks_exact(bytes_per_pixel) {
    let pixel = match options.channels {
      Channels::Rgb => Pixel { r: raw[0], g: raw[1], b: raw[2], a: 255 },
      Channels::Rgba => Pixel { r: raw[0], g: raw[1], b: raw[2], a: raw[3] },
    };

    encode_pixel(&mut state, pixel, &mut out);
    state.prev_pixel = pixel;
  }

  if state.run_count > 0 {
    Op::Run(state.run_count - 1).write_to(&mut out);
  }

  out.extend_from_slice(&QOI_BYTES_END);

  tracing::debug!(
    width = options.width,
    height = options.height,
    encoded_len = out.len(),
    "encoded QOI stream"
  );

  Ok(out)
}

// Encodes one pixel against the running state, appending whichever op the
// QOI scheme selects: extend/flush a run, hit the color cache, emit a delta,
// or fall back to a literal.
fn encode_pixel(state: &mut State, pixel: Pixel, out: &mut Vec<u8>) {
  if pixel == state.prev_pixel {
    state.run_count += 1;

    if state.run_count == QOI_MAX_RUN {
      Op::Run(QOI_MAX_RUN - 1).write_to(out);
      state.run_count = 0;
    }

    return;
  }

  if state.run_count > 0 {
    Op::Run(state.run_count - 1).write_to(out);
    state.run_count = 0;
  }

  if let Some(slot) = state.cache_match_or_replace(pixel) {
    Op::Index(slot as u8).write_to(out);
    return;
  }

  if let Some(delta) = pixel.delta(&state.prev_pixel) {
    match delta {
      PixelDelta::Diff(diff_r, diff_g, diff_b) => {
        Op::Diff(diff_r, diff_g, diff_b).write_to(out);
      }
      PixelDelta::Luma(luma_g, luma_rg, luma_bg) => {
        Op::Luma(luma_g, luma_rg, luma_bg).write_to(out);
      }
    }

    return;
  }

  if pixel.a == state.prev_pixel.a {
    Op::Rgb(pixel.r, pixel.g, pixel.b).write_to(out);
    return;
  }

  Op::Rgba(pixel.r, pixel.g, pixel.b, pixel.a).write_to(out);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::qoi::meta::Colorspace;

  #[test]
  fn test_encoding_rgb_op() {
    let mut dest = Vec::new();
    let mut state = State::new();
    let pixel = Pixel { r: 101, g: 102, b: 103, a: 255 };

    encode_pixel(&mut state, pixel, &mut dest);
    assert_eq!(dest, vec![0xfe, 101, 102, 103]);
  }

  #[test]
  fn test_encoding_rgba_op() {
    let mut dest = Vec::new();
    let mut state = State::new();
    let pixel = Pixel { r: 101, g: 102, b: 103, a: 104 };

    encode_pixel(&mut state, pixel, &mut dest);
    assert_eq!(dest, vec![0xff, 101, 102, 103, 104]);
  }

  #[test]
  fn test_encoding_run_op() {
    let mut dest = Vec::new();
    let mut state = State::new();
    let mut pixel = Pixel { r: 101, g: 102, b: 103, a: 104 };

    state.prev_pixel = pixel;
    encode_pixel(&mut state, pixel, &mut dest);
    assert_eq!(dest.len(), 0);

    // A non-matching pixel flushes the pending run first.
    pixel.a = 0;
    encode_pixel(&mut state, pixel, &mut dest);
    assert_eq!(dest[0], 0xc0);
  }

  #[test]
  fn test_encoding_trailing_run_op() {
    let source = [101, 102, 103, 101, 102, 103];
    let options = QoiOptions {
      width: 2,
      height: 1,
      channels: Channels::Rgb,
      colorspace: Colorspace::Srgb,
    };

    let dest = encode_qoi(&source, &options).expect("Failed to encode image");

    // Header, Op::Rgb(101, 102, 103), then a run of one.
    let run_at = QOI_HEADER_LEN + 4;
    assert_eq!(dest[run_at], 0xc0);
    assert_eq!(&dest[run_at + 1..], &QOI_BYTES_END);
  }

  #[test]
  fn test_encoding_max_run_ops() {
    let mut dest = Vec::new();
    let mut state = State::new();
    let pixel = Pixel { r: 101, g: 102, b: 103, a: 104 };

    state.prev_pixel = pixel;
    state.run_count = 61;
    encode_pixel(&mut state, pixel, &mut dest);
    assert_eq!(dest, vec![0xc0 | 61]);

    encode_pixel(&mut state, pixel, &mut dest);
    assert_eq!(dest.len(), 1);
  }

  #[test]
  fn test_encoding_index_op() {
    let mut dest = Vec::new();
    let mut state = State::new();
    let pixel = Pixel { r: 101, g: 102, b: 103, a: 104 };

    state.cache_insert(pixel);
    encode_pixel(&mut state, pixel, &mut dest);
    assert_eq!(dest, vec![54]); // pixel.cache_slot() == 54
  }

  #[test]
  fn test_encoding_diff_op() {
    let mut dest = Vec::new();
    let mut state = State::new();
    let pixel_a = Pixel { r: 100, g: 100, b: 100, a: 255 };
    let pixel_b = Pixel { r: 101, g: 101, b: 101, a: 255 };
    let pixel_c = Pixel { r: 99, g: 99, b: 99, a: 255 };

    state.prev_pixel = pixel_a;
    encode_pixel(&mut state, pixel_b, &mut dest);
    assert_eq!(dest, vec![0x40 | 3 << 4 | 3 << 2 | 3]); // (101 - 100) + 2 = 3

    state.prev_pixel = pixel_b;
    encode_pixel(&mut state, pixel_c, &mut dest);
    assert_eq!(dest[1], 0x40); // (99 - 101) + 2 = 0
  }

  #[test]
  fn test_encoding_luma_op() {
    let mut dest = Vec::new();
    let mut state = State::new();
    let pixel_a = Pixel { r: 100, g: 100, b: 100, a: 255 };
    let pixel_b = Pixel { r: 100, g: 108, b: 100, a: 255 };

    state.prev_pixel = pixel_a;
    encode_pixel(&mut state, pixel_b, &mut dest);
    assert_eq!(dest, vec![0x80 | 40, 0]); // dg = 8, biased to 40; rg = bg = 0
  }

  #[test]
  fn test_encoding_rejects_zero_dimensions() {
    let options = QoiOptions {
      width: 0,
      height: 1,
      channels: Channels::Rgba,
      colorspace: Colorspace::Srgb,
    };

    assert!(matches!(
      encode_qoi(&[], &options),
      Err(Error::InvalidWidth(0))
    ));
  }

  #[test]
  fn test_encoding_rejects_bad_buffer_length() {
    let options = QoiOptions {
      width: 999,
      height: 1,
      channels: Channels::Rgba,
      colorspace: Colorspace::Srgb,
    };

    assert!(matches!(
      encode_qoi(&[101, 102, 103, 255], &options),
      Err(Error::BufferLengthMismatch { expected: 999 })
    ));
  }
}
