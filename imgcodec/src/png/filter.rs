use crate::error::Error;

/// The five scanline predictors fixed by the PNG spec. Every scanline on the
/// wire is one of these tags followed by the per byte differences from the
/// predicted values.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterType {
  None = 0,
  Sub = 1,
  Up = 2,
  Average = 3,
  Paeth = 4,
}

impl FilterType {
  pub fn from_u8(byte: u8) -> Result<Self, Error> {
    match byte {
      0 => Ok(FilterType::None),
      1 => Ok(FilterType::Sub),
      2 => Ok(FilterType::Up),
      3 => Ok(FilterType::Average),
      4 => Ok(FilterType::Paeth),
      _ => Err(Error::InvalidFilterType(byte)),
    }
  }
}

// The Paeth predictor: whichever of left (a), up (b), and up-left (c) is
// closest to a + b - c, ties broken in the order a, b, c.
fn paeth(a: u8, b: u8, c: u8) -> u8 {
  let p = a as i16 + b as i16 - c as i16;
  let pa = (p - a as i16).abs();
  let pb = (p - b as i16).abs();
  let pc = (p - c as i16).abs();

  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

// Computes one predicted byte from the left, up, and up-left neighbors, all
// zero where the neighbor falls outside the sub-image.
fn predict(filter: FilterType, a: u8, b: u8, c: u8) -> u8 {
  match filter {
    FilterType::None => 0,
    FilterType::Sub => a,
    FilterType::Up => b,
    FilterType::Average => ((a as u16 + b as u16) / 2) as u8,
    FilterType::Paeth => paeth(a, b, c),
  }
}

// Filters one sub-image's raw pixel data into the scanline stream: each row
// becomes the filter tag byte followed by `raw - predicted` mod 256.
// Predictions read the raw values of already emitted neighbors.
pub fn filter_sub_image(
  out: &mut Vec<u8>,
  raw: &[u8],
  width: usize,
  height: usize,
  pixel_size: usize,
  filter: FilterType,
) {
  let stride = width * pixel_size;

  for y in 0..height {
    out.push(filter as u8);

    let row = &raw[y * stride..(y + 1) * stride];
    let prev = if y > 0 { Some(&raw[(y - 1) * stride..y * stride]) } else { None };

    for x in 0..stride {
      let a = if x >= pixel_size { row[x - pixel_size] } else { 0 };
      let b = prev.map_or(0, |line| line[x]);
      let c = if x >= pixel_size {
        prev.map_or(0, |line| line[x - pixel_size])
      } else {
        0
      };

      out.push(row[x].wrapping_sub(predict(filter, a, b, c)));
    }
  }
}

// Reverses the filtering of one sub-image in place. `lines` holds the
// sub-image's scanlines, each prefixed with its filter tag byte; rows are
// reconstructed strictly top to bottom, left to right, so every prediction
// reads already reconstructed bytes.
pub fn unfilter_sub_image(
  lines: &mut [u8],
  width: usize,
  height: usize,
  pixel_size: usize,
) -> Result<(), Error> {
  let stride = width * pixel_size;
  let line_len = stride + 1;

  for y in 0..height {
    let filter = FilterType::from_u8(lines[y * line_len])?;
    let data_at = y * line_len + 1;

    for x in 0..stride {
      let a = if x >= pixel_size { lines[data_at + x - pixel_size] } else { 0 };
      let b = if y > 0 { lines[data_at - line_len + x] } else { 0 };
      let c = if y > 0 && x >= pixel_size {
        lines[data_at - line_len + x - pixel_size]
      } else {
        0
      };

      lines[data_at + x] = lines[data_at + x].wrapping_add(predict(filter, a, b, c));
    }
  }

  Ok(())
}

// Compacts unfiltered scanline data to the front of the buffer, dropping the
// filter tag byte that leads each row. Returns the compacted length.
pub fn strip_filter_bytes(
  mid: &mut [u8],
  sizes: &[(usize, usize)],
  pixel_size: usize,
) -> usize {
  let mut write = 0;
  let mut read = 0;

  for &(width, height) in sizes {
    if width == 0 || height == 0 {
      continue;
    }

    let stride = width * pixel_size;

    for _ in 0..height {
      read += 1;
      mid.copy_within(read..read + stride, write);
      write += stride;
      read += stride;
    }
  }

  write
}

#[cfg(test)]
mod tests {
  use super::*;

  // Filters and immediately unfilters one sub-image, asserting the original
  // bytes survive.
  fn assert_filter_round_trip(raw: &[u8], width: usize, height: usize, pixel_size: usize, filter: FilterType) {
    let mut stream = Vec::new();
    filter_sub_image(&mut stream, raw, width, height, pixel_size, filter);
    assert_eq!(stream.len(), height * (width * pixel_size + 1));

    unfilter_sub_image(&mut stream, width, height, pixel_size).expect("Failed to unfilter");

    let compacted = strip_filter_bytes(&mut stream, &[(width, height)], pixel_size);
    assert_eq!(compacted, raw.len());
    assert_eq!(&stream[..compacted], raw);
  }

  #[test]
  fn test_each_filter_type_round_trips() {
    let raw: Vec<u8> = (0u32..4 * 3 * 3).map(|i| (i * 89 % 256) as u8).collect();

    for filter in [
      FilterType::None,
      FilterType::Sub,
      FilterType::Up,
      FilterType::Average,
      FilterType::Paeth,
    ] {
      assert_filter_round_trip(&raw, 4, 3, 3, filter);
    }
  }

  #[test]
  fn test_round_trip_with_single_pixel_rows() {
    let raw = [7, 200, 13];
    assert_filter_round_trip(&raw, 1, 3, 1, FilterType::Paeth);
  }

  #[test]
  fn test_paeth_tie_breaks_toward_left() {
    // a, b, and c all predict equally well; the spec picks a.
    assert_eq!(paeth(5, 5, 5), 5);
    assert_eq!(paeth(10, 20, 15), 10);
  }

  #[test]
  fn test_paeth_picks_closest_neighbor() {
    // p = 30 + 1 - 2 = 29, so b (distance 28) loses to a (distance 1)...
    assert_eq!(paeth(30, 1, 2), 30);
    // ...and with p = 0 + 30 - 2 = 28, b (distance 2) beats a (distance 28).
    assert_eq!(paeth(0, 30, 2), 30);
  }

  #[test]
  fn test_sub_filter_references_previous_pixel() {
    // Two 2 byte pixels in one row: the second pixel's bytes are predicted
    // by the first's.
    let raw = [10, 20, 13, 25];
    let mut stream = Vec::new();
    filter_sub_image(&mut stream, &raw, 2, 1, 2, FilterType::Sub);

    assert_eq!(stream, vec![1, 10, 20, 3, 5]);
  }

  #[test]
  fn test_up_filter_references_previous_row() {
    let raw = [10, 20, 14, 26];
    let mut stream = Vec::new();
    filter_sub_image(&mut stream, &raw, 2, 2, 1, FilterType::Up);

    assert_eq!(stream, vec![2, 10, 20, 2, 4, 6]);
  }

  #[test]
  fn test_unknown_filter_type_is_rejected() {
    let mut lines = vec![9, 1, 2, 3];

    assert!(matches!(
      unfilter_sub_image(&mut lines, 3, 1, 1),
      Err(Error::InvalidFilterType(9))
    ));
  }
}
