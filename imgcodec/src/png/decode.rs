use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::Error;
use crate::png::chunk::{
  read_chunk, PNG_SIGNATURE, TYPE_IDAT, TYPE_IEND, TYPE_IHDR, TYPE_PLTE, TYPE_TRNS,
};
use crate::png::color::{
  fold_palette, from_grayscale, from_grayscale_alpha, from_indexed, from_truecolor,
  make_pixels_transparent,
};
use crate::png::filter::{strip_filter_bytes, unfilter_sub_image};
use crate::png::meta::{ColorType, Interlace, PngOptions};
use crate::png::pass::{deinterlace, pass_sizes};

/// Decodes a complete PNG byte stream into raw RGBA pixel data.
///
/// Whatever color mode the file stores, the decoded output is always a flat
/// sequence of 4 byte RGBA pixels, and the IHDR's options are returned
/// alongside it.
pub fn decode_png(input: &[u8]) -> Result<(PngOptions, Vec<u8>), Error> {
  if input.len() < PNG_SIGNATURE.len() || input[..8] != PNG_SIGNATURE {
    return Err(Error::InvalidSignature);
  }

  let ihdr = read_chunk(input, PNG_SIGNATURE.len())?;

  if ihdr.ty != TYPE_IHDR {
    return Err(Error::ExpectedIhdr(ihdr.ty));
  }
  if ihdr.data.len() < 13 {
    return Err(Error::UnexpectedEof);
  }

  let width = u32::from_be_bytes([ihdr.data[0], ihdr.data[1], ihdr.data[2], ihdr.data[3]]);
  if width == 0 || width > i32::MAX as u32 {
    return Err(Error::InvalidImageWidth(width));
  }

  let height = u32::from_be_bytes([ihdr.data[4], ihdr.data[5], ihdr.data[6], ihdr.data[7]]);
  if height == 0 || height > i32::MAX as u32 {
    return Err(Error::InvalidImageHeight(height));
  }

  let color_type = ColorType::from_header(ihdr.data[8], ihdr.data[9])?;

  let compression = ihdr.data[10];
  if compression != 0 {
    return Err(Error::UnsupportedCompression(compression));
  }

  let filter = ihdr.data[11];
  if filter != 0 {
    return Err(Error::UnsupportedFilter(filter));
  }

  let interlace = Interlace::try_from(ihdr.data[12])?;
  let options = PngOptions { width, height, compression, filter, interlace };
  let pixel_size = color_type.bytes_per_pixel();

  // Scan the remaining chunks: IDAT data is concatenated and must be
  // contiguous, PLTE and tRNS may each occur once, unknown chunk types are
  // skipped, and the scan stops at IEND.
  let mut idat: Vec<u8> = Vec::new();
  let mut plte: Option<Vec<u8>> = None;
  let mut trns: Option<Vec<u8>> = None;
  let mut last_was_idat = false;
  let mut last_type = ihdr.ty;
  let mut offset = ihdr.next;

  while offset < input.len() {
    let chunk = read_chunk(input, offset)?;
    offset = chunk.next;

    if chunk.ty == TYPE_IDAT {
      if !last_was_idat && !idat.is_empty() {
        return Err(Error::NonContiguousIdat(last_type));
      }

      idat.extend_from_slice(chunk.data);
      last_was_idat = true;
    } else {
      last_was_idat = false;

      if chunk.ty == TYPE_PLTE {
        if plte.is_some() {
          return Err(Error::DuplicatePlte);
        }
        plte = Some(chunk.data.to_vec());
      } else if chunk.ty == TYPE_TRNS {
        if trns.is_some() {
          return Err(Error::DuplicateTrns);
        }
        trns = Some(chunk.data.to_vec());
      } else if chunk.ty == TYPE_IEND {
        break;
      }
    }

    last_type = chunk.ty;
  }

  // Post-scan validation, and the decode side palette with tRNS alphas
  // folded in for indexed images.
  let palette = match color_type {
    ColorType::Indexed => {
      let plte = plte.as_ref().ok_or(Error::MissingPlte)?;

      if plte.len() % 3 != 0 || plte.len() > 256 * 3 {
        return Err(Error::InvalidPlteLength(plte.len()));
      }
      if let Some(trns) = &trns {
        if trns.len() != plte.len() / 3 {
          return Err(Error::InvalidTrnsLength(trns.len()));
        }
      }

      Some(fold_palette(plte, trns.as_deref()))
    }
    ColorType::Grayscale => {
      if let Some(trns) = &trns {
        if trns.len() != 2 {
          return Err(Error::InvalidTrnsLength(trns.len()));
        }
      }
      None
    }
    ColorType::Truecolor => {
      if let Some(trns) = &trns {
        if trns.len() != 6 {
          return Err(Error::InvalidTrnsLength(trns.len()));
        }
      }
      None
    }
    _ => None,
  };

  let mut mid = Vec::new();
  ZlibDecoder::new(idat.as_slice()).read_to_end(&mut mid)?;

  tracing::debug!(
    idat_len = idat.len(),
    inflated_len = mid.len(),
    "inflated IDAT payload"
  );

  let sizes = pass_sizes(width as usize, height as usize, interlace);

  let expected_mid: usize = sizes
    .iter()
    .filter(|&&(w, h)| w > 0 && h > 0)
    .map(|&(w, h)| h * (1 + w * pixel_size))
    .sum();

  if mid.len() != expected_mid {
    return Err(Error::InflatedSizeMismatch { actual: mid.len(), expected: expected_mid });
  }

  // Reverse the scanline filters one sub-image at a time, then drop the
  // filter tag bytes, leaving concatenated pass order pixels at the front.
  let mut base = 0;

  for &(w, h) in &sizes {
    if w == 0 || h == 0 {
      continue;
    }

    let len = h * (1 + w * pixel_size);
    unfilter_sub_image(&mut mid[base..base + len], w, h, pixel_size)?;
    base += len;
  }

  let compact_len = strip_filter_bytes(&mut mid, &sizes, pixel_size);

  // Move the reduced pixels to the tail of the final RGBA buffer, restoring
  // natural raster order on the way, so expansion can run front to back over
  // one allocation.
  let mut out = vec![0; options.num_pixels() * 4];
  let tail = out.len() - compact_len;

  match interlace {
    Interlace::None => out[tail..].copy_from_slice(&mid[..compact_len]),
    Interlace::Adam7 => {
      deinterlace(&mid[..compact_len], &mut out[tail..], pixel_size, width as usize, &sizes);
    }
  }

  match color_type {
    ColorType::Grayscale => {
      from_grayscale(&mut out, tail);

      if let Some(trns) = &trns {
        // The key is a 16 bit sample; a high byte means it can never match
        // 8 bit data.
        if trns[0] == 0 {
          make_pixels_transparent(&mut out, trns[1], trns[1], trns[1]);
        }
      }
    }
    ColorType::Truecolor => {
      from_truecolor(&mut out, tail);

      if let Some(trns) = &trns {
        if trns[0] == 0 && trns[2] == 0 && trns[4] == 0 {
          make_pixels_transparent(&mut out, trns[1], trns[3], trns[5]);
        }
      }
    }
    ColorType::Indexed => {
      if let Some(palette) = &palette {
        from_indexed(&mut out, tail, palette)?;
      }
    }
    ColorType::GrayscaleAlpha => from_grayscale_alpha(&mut out, tail),
    ColorType::TruecolorAlpha => {}
  }

  Ok((options, out))
}
