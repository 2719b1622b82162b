use crate::error::Error;
use crate::qoi::meta::{QoiOptions, QOI_BYTES_END, QOI_HEADER_LEN};
use crate::qoi::op::Op;
use crate::qoi::pixel::{Pixel, PixelDelta};
use crate::qoi::state::State;

/// Decodes a complete QOI byte stream into raw RGBA pixel data.
///
/// The decoded output is always a flat sequence of 4 byte RGBA pixels, even
/// for streams encoded from 3 channel input, and the header's options are
/// returned alongside it.
pub fn decode_qoi(input: &[u8]) -> Result<(QoiOptions, Vec<u8>), Error> {
  if input.len() < QOI_HEADER_LEN + QOI_BYTES_END.len() {
    return Err(Error::TooShort);
  }

  let options = QoiOptions::from_header(&input[..QOI_HEADER_LEN])?;
  let expected = options.num_pixels();

  let mut out = Vec::with_capacity(expected * 4);
  let mut state = State::new();
  let mut pos = QOI_HEADER_LEN;
  let mut decoded = 0;

  while decoded < expected {
    // Every opcode sits at least 8 bytes from the end of a well formed
    // stream, so the end marker look-ahead below can always read its full
    // width before the byte is interpreted as an opcode.
    if input.len() - pos < QOI_BYTES_END.len() {
      return Err(Error::UnexpectedEof);
    }

    if input[pos..pos + QOI_BYTES_END.len()] == QOI_BYTES_END {
      return Err(Error::PixelCountMismatch { decoded, expected });
    }

    let (op, consumed) = Op::read_at(input, pos)?;
    pos += consumed;

    decoded += apply_op(&mut state, op, decoded, expected, |pixel| {
      out.extend_from_slice(&[pixel.r, pixel.g, pixel.b, pixel.a]);
    })?;
  }

  if input.len() - pos < QOI_BYTES_END.len() {
    return Err(Error::UnexpectedEof);
  }
  if input[pos..pos + QOI_BYTES_END.len()] != QOI_BYTES_END {
    return Err(Error::TrailingData);
  }

  tracing::debug!(
    width = options.width,
    height = options.height,
    pixels = decoded,
    "decoded QOI stream"
  );

  Ok((options, out))
}

// Applies one decoded op to the running state, handing every produced pixel
// to `emit` and returning how many pixels were produced. Every op except
// INDEX and RUN inserts its pixel into the cache; the previous pixel
// register is updated regardless.
pub(crate) fn apply_op<F: FnMut(Pixel)>(
  state: &mut State,
  op: Op,
  decoded: usize,
  expected: usize,
  mut emit: F,
) -> Result<usize, Error> {
  let (pixel, update_cache) = match op {
    Op::Run(biased_count) => {
      let run_len = biased_count as usize + 1;

      if decoded + run_len > expected {
        return Err(Error::PixelCountMismatch {
          decoded: decoded + run_len,
          expected,
        });
      }

      for _ in 0..run_len {
        emit(state.prev_pixel);
      }

      return Ok(run_len);
    }
    Op::Index(slot) => (state.cache[slot as usize], false),
    Op::Diff(diff_r, diff_g, diff_b) => (
      Pixel::from_delta(PixelDelta::Diff(diff_r, diff_g, diff_b), &state.prev_pixel),
      true,
    ),
    Op::Luma(luma_g, luma_rg, luma_bg) => (
      Pixel::from_delta(PixelDelta::Luma(luma_g, luma_rg, luma_bg), &state.prev_pixel),
      true,
    ),
    Op::Rgb(r, g, b) => (Pixel { r, g, b, a: state.prev_pixel.a }, true),
    Op::Rgba(r, g, b, a) => (Pixel { r, g, b, a }, true),
  };

  if update_cache {
    state.cache_insert(pixel);
  }

  state.prev_pixel = pixel;
  emit(pixel);

  Ok(1)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::qoi::encode::encode_qoi;
  use crate::qoi::meta::{Channels, Colorspace};

  fn stream_with_body(width: u32, height: u32, body: &[u8]) -> Vec<u8> {
    let options = QoiOptions {
      width,
      height,
      channels: Channels::Rgba,
      colorspace: Colorspace::Srgb,
    };

    let mut stream = Vec::new();
    options.write_header(&mut stream);
    stream.extend_from_slice(body);
    stream.extend_from_slice(&QOI_BYTES_END);
    stream
  }

  #[test]
  fn test_decoding_too_short_stream() {
    let result = decode_qoi(&[0; QOI_HEADER_LEN + 7]);
    assert!(matches!(result, Err(Error::TooShort)));
  }

  #[test]
  fn test_decoding_invalid_magic() {
    let mut stream = stream_with_body(1, 1, &[0xff, 1, 2, 3, 4]);
    stream[0] = b'x';

    assert!(matches!(decode_qoi(&stream), Err(Error::InvalidMagic)));
  }

  #[test]
  fn test_decoding_rgba_op() {
    let stream = stream_with_body(1, 1, &[0xff, 101, 102, 103, 104]);
    let (_, pixels) = decode_qoi(&stream).expect("Failed to decode stream");

    assert_eq!(pixels, vec![101, 102, 103, 104]);
  }

  #[test]
  fn test_decoding_rgb_op_retains_alpha() {
    let stream = stream_with_body(
      2,
      1,
      &[0xff, 1, 2, 3, 104, 0xfe, 101, 102, 103],
    );
    let (_, pixels) = decode_qoi(&stream).expect("Failed to decode stream");

    assert_eq!(&pixels[4..], &[101, 102, 103, 104]);
  }

  #[test]
  fn test_decoding_run_op() {
    let stream = stream_with_body(3, 1, &[0xff, 9, 8, 7, 255, 0xc0 | 1]);
    let (_, pixels) = decode_qoi(&stream).expect("Failed to decode stream");

    assert_eq!(pixels, vec![9, 8, 7, 255, 9, 8, 7, 255, 9, 8, 7, 255]);
  }

  #[test]
  fn test_decoding_index_op() {
    let pixel = Pixel { r: 101, g: 102, b: 103, a: 104 };
    let slot = pixel.cache_slot() as u8;
    let stream = stream_with_body(
      3,
      1,
      &[0xff, 101, 102, 103, 104, 0xff, 0, 0, 0, 255, slot],
    );
    let (_, pixels) = decode_qoi(&stream).expect("Failed to decode stream");

    assert_eq!(&pixels[8..], &[101, 102, 103, 104]);
  }

  #[test]
  fn test_decoding_early_end_marker() {
    let stream = stream_with_body(2, 1, &[0xff, 1, 2, 3, 4]);

    assert!(matches!(
      decode_qoi(&stream),
      Err(Error::PixelCountMismatch { decoded: 1, expected: 2 })
    ));
  }

  #[test]
  fn test_decoding_overlong_run() {
    // A run of 62 against a 1x1 image overshoots the pixel count.
    let stream = stream_with_body(1, 1, &[0xc0 | 61]);

    assert!(matches!(
      decode_qoi(&stream),
      Err(Error::PixelCountMismatch { decoded: 62, expected: 1 })
    ));
  }

  #[test]
  fn test_decoding_truncated_stream() {
    let options = QoiOptions {
      width: 2,
      height: 2,
      channels: Channels::Rgba,
      colorspace: Colorspace::Srgb,
    };

    let mut stream = Vec::new();
    options.write_header(&mut stream);
    // One literal, then nothing: not even room for the end marker.
    stream.extend_from_slice(&[0xff, 1, 2, 3, 4, 0, 0, 0]);

    assert!(matches!(decode_qoi(&stream), Err(Error::UnexpectedEof)));
  }

  #[test]
  fn test_decoding_trailing_garbage() {
    let mut stream = stream_with_body(1, 1, &[0xff, 1, 2, 3, 4]);
    let len = stream.len();
    stream[len - 8..].copy_from_slice(&[9, 9, 9, 9, 9, 9, 9, 9]);

    assert!(matches!(decode_qoi(&stream), Err(Error::TrailingData)));
  }

  #[test]
  fn test_round_trip_rgba() {
    let options = QoiOptions {
      width: 4,
      height: 2,
      channels: Channels::Rgba,
      colorspace: Colorspace::Srgb,
    };
    let pixels: Vec<u8> = (0..4 * 2 * 4).map(|i| (i * 31) as u8).collect();

    let encoded = encode_qoi(&pixels, &options).expect("Failed to encode image");
    let (decoded_options, decoded) = decode_qoi(&encoded).expect("Failed to decode image");

    assert_eq!(decoded_options, options);
    assert_eq!(decoded, pixels);
  }

  #[test]
  fn test_round_trip_rgb_expands_alpha() {
    let options = QoiOptions {
      width: 2,
      height: 1,
      channels: Channels::Rgb,
      colorspace: Colorspace::Linear,
    };

    let encoded =
      encode_qoi(&[10, 20, 30, 40, 50, 60], &options).expect("Failed to encode image");
    let (_, decoded) = decode_qoi(&encoded).expect("Failed to decode image");

    assert_eq!(decoded, vec![10, 20, 30, 255, 40, 50, 60, 255]);
  }
}
