use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::Error;
use crate::png::chunk::{
  write_chunk, MAX_CHUNK_LEN, PNG_SIGNATURE, TYPE_IDAT, TYPE_IEND, TYPE_IHDR, TYPE_PLTE,
  TYPE_TRNS,
};
use crate::png::color::{select_color_mode, TransparencyKey};
use crate::png::filter::{filter_sub_image, FilterType};
use crate::png::meta::{ColorType, Interlace, PngOptions};
use crate::png::pass::{interlace, pass_sizes};

/// Encodes an image's raw RGBA pixel data into a complete PNG byte stream.
///
/// The smallest exact color mode is selected automatically: grayscale,
/// indexed, or truecolor, with an alpha channel or a tRNS transparency key
/// only where the pixels demand one. Pixels are interlaced when
/// `options.interlace` selects Adam7.
pub fn encode_png(input: &[u8], options: &PngOptions) -> Result<Vec<u8>, Error> {
  if options.width == 0 || options.width > i32::MAX as u32 {
    return Err(Error::InvalidWidth(options.width));
  }
  if options.height == 0 || options.height > i32::MAX as u32 {
    return Err(Error::InvalidHeight(options.height));
  }
  if options.compression != 0 {
    return Err(Error::UnsupportedCompression(options.compression));
  }
  if options.filter != 0 {
    return Err(Error::UnsupportedFilter(options.filter));
  }
  if input.len() % 4 != 0 {
    return Err(Error::UnalignedInput);
  }

  let num_pixels = options.num_pixels();

  if input.len() / 4 != num_pixels {
    return Err(Error::BufferLengthMismatch { expected: num_pixels });
  }

  let width = options.width as usize;
  let height = options.height as usize;

  let mut pixels = input.to_vec();
  let (mode, reduced_len) = select_color_mode(&mut pixels);
  pixels.truncate(reduced_len);

  let pixel_size = mode.color_type.bytes_per_pixel();

  tracing::debug!(
    color_type = mode.color_type as u8,
    pixel_size,
    "selected PNG color mode"
  );

  let sizes = pass_sizes(width, height, options.interlace);

  if options.interlace == Interlace::Adam7 {
    interlace(&mut pixels, pixel_size, width, &sizes);
  }

  // Index streams compress well unfiltered; everything else gets Paeth.
  let filter = match mode.color_type {
    ColorType::Indexed => FilterType::None,
    _ => FilterType::Paeth,
  };

  let total_lines: usize = sizes
    .iter()
    .filter(|&&(w, h)| w > 0 && h > 0)
    .map(|&(_, h)| h)
    .sum();

  let mut filtered = Vec::with_capacity(pixels.len() + total_lines);
  let mut base = 0;

  for &(w, h) in &sizes {
    if w == 0 || h == 0 {
      continue;
    }

    let len = w * h * pixel_size;
    filter_sub_image(&mut filtered, &pixels[base..base + len], w, h, pixel_size, filter);
    base += len;
  }

  let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
  encoder.write_all(&filtered)?;
  let compressed = encoder.finish()?;

  tracing::debug!(
    filtered_len = filtered.len(),
    compressed_len = compressed.len(),
    "compressed IDAT payload"
  );

  let indexed = mode.color_type == ColorType::Indexed;
  let mut out = Vec::with_capacity(encoded_capacity(reduced_len, options, indexed));
  out.extend_from_slice(&PNG_SIGNATURE);

  write_chunk(&mut out, TYPE_IHDR, |data| {
    data.extend_from_slice(&options.width.to_be_bytes());
    data.extend_from_slice(&options.height.to_be_bytes());
    data.extend_from_slice(&[
      8,
      mode.color_type as u8,
      options.compression,
      options.filter,
      options.interlace as u8,
    ]);
  });

  match (&mode.transparency_key, &mode.palette) {
    (Some(TransparencyKey::Gray(gray)), _) => {
      let gray = *gray;
      write_chunk(&mut out, TYPE_TRNS, |data| {
        data.extend_from_slice(&[0, gray]);
      });
    }
    (Some(TransparencyKey::Rgb(r, g, b)), _) => {
      let (r, g, b) = (*r, *g, *b);
      write_chunk(&mut out, TYPE_TRNS, |data| {
        data.extend_from_slice(&[0, r, 0, g, 0, b]);
      });
    }
    (None, Some(palette)) => {
      write_chunk(&mut out, TYPE_PLTE, |data| {
        for &color in palette {
          data.extend_from_slice(&color.to_be_bytes()[..3]);
        }
      });

      // A tRNS chunk only exists when some entry is not fully opaque, and
      // then it carries every entry's alpha.
      if palette.iter().any(|&color| color & 0xff != 0xff) {
        write_chunk(&mut out, TYPE_TRNS, |data| {
          for &color in palette {
            data.push((color & 0xff) as u8);
          }
        });
      }
    }
    (None, None) => {}
  }

  for piece in compressed.chunks(MAX_CHUNK_LEN) {
    write_chunk(&mut out, TYPE_IDAT, |data| {
      data.extend_from_slice(piece);
    });
  }

  write_chunk(&mut out, TYPE_IEND, |_| {});

  Ok(out)
}

// A worst case output size used to reserve capacity up front: signature,
// IHDR, the largest possible PLTE and tRNS, filter bytes per scanline (per
// pass when interlaced), stored DEFLATE block growth, per IDAT chunk
// overhead, and IEND.
fn encoded_capacity(data_len: usize, options: &PngOptions, indexed: bool) -> usize {
  let height = options.height as usize;

  let filter_bytes = match options.interlace {
    Interlace::None => height,
    Interlace::Adam7 => {
      (height + 7) / 8
        + (height + 7) / 8
        + (height + 3) / 8
        + (height + 3) / 4
        + (height + 1) / 4
        + (height + 1) / 2
        + height / 2
    }
  };

  let mut size = data_len + filter_bytes;
  size += (size + 32767) / 32768 * 5 + 12;
  size += (size + MAX_CHUNK_LEN - 1) / MAX_CHUNK_LEN * 12;

  8 + 25 + if indexed { 780 } else { 0 } + size + 12
}

#[cfg(test)]
mod tests {
  use super::*;

  fn options(width: u32, height: u32) -> PngOptions {
    PngOptions { width, height, compression: 0, filter: 0, interlace: Interlace::None }
  }

  #[test]
  fn test_rejects_zero_width() {
    let result = encode_png(&[0; 4], &options(0, 1));
    assert!(matches!(result, Err(Error::InvalidWidth(0))));
  }

  #[test]
  fn test_rejects_zero_height() {
    let result = encode_png(&[0; 4], &options(1, 0));
    assert!(matches!(result, Err(Error::InvalidHeight(0))));
  }

  #[test]
  fn test_rejects_unaligned_input() {
    let result = encode_png(&[0; 3], &options(1, 1));
    assert!(matches!(result, Err(Error::UnalignedInput)));
  }

  #[test]
  fn test_rejects_pixel_count_mismatch() {
    let result = encode_png(&[0; 8], &options(1, 1));
    assert!(matches!(
      result,
      Err(Error::BufferLengthMismatch { expected: 1 })
    ));
  }

  #[test]
  fn test_rejects_nonzero_compression_method() {
    let mut bad = options(1, 1);
    bad.compression = 1;

    assert!(matches!(
      encode_png(&[0; 4], &bad),
      Err(Error::UnsupportedCompression(1))
    ));
  }

  #[test]
  fn test_rejects_nonzero_filter_method() {
    let mut bad = options(1, 1);
    bad.filter = 1;

    assert!(matches!(
      encode_png(&[0; 4], &bad),
      Err(Error::UnsupportedFilter(1))
    ));
  }

  #[test]
  fn test_writes_signature_and_ihdr() {
    let encoded = encode_png(&[0, 0, 0, 255], &options(1, 1)).expect("Failed to encode image");

    assert_eq!(&encoded[..8], &PNG_SIGNATURE);
    // IHDR length and type.
    assert_eq!(&encoded[8..16], &[0, 0, 0, 13, b'I', b'H', b'D', b'R']);
    // Width 1, height 1.
    assert_eq!(&encoded[16..24], &[0, 0, 0, 1, 0, 0, 0, 1]);
    // Bit depth 8, grayscale, compression 0, filter 0, no interlacing.
    assert_eq!(&encoded[24..29], &[8, 0, 0, 0, 0]);
  }

  #[test]
  fn test_ends_with_iend() {
    let encoded = encode_png(&[0, 0, 0, 255], &options(1, 1)).expect("Failed to encode image");

    let tail = &encoded[encoded.len() - 12..];
    assert_eq!(&tail[4..8], b"IEND");
  }
}
