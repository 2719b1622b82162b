use crate::error::Error;

/// Options describing a PNG image. These are the caller's input when
/// encoding, and are reconstructed from the IHDR chunk when decoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PngOptions {
  /// The image's width. Must be in `1..=2^31 - 1`.
  pub width: u32,
  /// The image's height. Must be in `1..=2^31 - 1`.
  pub height: u32,
  /// The PNG spec only standardises one compression method, zlib, which is
  /// selected with the value zero.
  pub compression: u8,
  /// The PNG spec only standardises one filter method, which is selected
  /// with the value zero.
  pub filter: u8,
  /// Whether the image's pixels are stored interlaced, see [Interlace].
  pub interlace: Interlace,
}

impl PngOptions {
  /// Returns the total number of pixels that make up the image.
  pub fn num_pixels(&self) -> usize {
    self.width as usize * self.height as usize
  }
}

/// The PNG spec offers either no interlacing, selected with the value zero,
/// or Adam7 interlacing, selected with the value one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Interlace {
  None = 0,
  Adam7 = 1,
}

/// A `TryFrom` implementation for converting any `u8` into an `Interlace`
/// value. `0` maps to `Interlace::None` and `1` maps to `Interlace::Adam7`.
/// All other `u8` values are unrecognized.
impl TryFrom<u8> for Interlace {
  type Error = Error;

  fn try_from(byte: u8) -> Result<Self, Self::Error> {
    match byte {
      0 => Ok(Interlace::None),
      1 => Ok(Interlace::Adam7),
      _ => Err(Error::UnsupportedInterlace(byte)),
    }
  }
}

// The color type byte stored in the IHDR chunk, which fixes how many bytes
// each pixel occupies on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ColorType {
  Grayscale = 0,
  Truecolor = 2,
  Indexed = 3,
  GrayscaleAlpha = 4,
  TruecolorAlpha = 6,
}

impl ColorType {
  // Validates the (bit depth, color type) pair against the PNG spec's legal
  // combinations, then narrows to the single supported depth.
  pub fn from_header(bit_depth: u8, color_type: u8) -> Result<Self, Error> {
    let legal_depths: &[u8] = match color_type {
      2 | 4 | 6 => &[8, 16],
      3 => &[1, 2, 4, 8],
      0 => &[1, 2, 4, 8, 16],
      _ => &[],
    };

    if !legal_depths.contains(&bit_depth) {
      return Err(Error::InvalidColorTypeCombo { bit_depth, color_type });
    }

    if bit_depth != 8 {
      return Err(Error::UnsupportedBitDepth(bit_depth));
    }

    Ok(match color_type {
      0 => ColorType::Grayscale,
      2 => ColorType::Truecolor,
      3 => ColorType::Indexed,
      4 => ColorType::GrayscaleAlpha,
      // Validated above.
      _ => ColorType::TruecolorAlpha,
    })
  }

  // How many bytes one pixel of this color type occupies at bit depth 8.
  pub fn bytes_per_pixel(&self) -> usize {
    match self {
      ColorType::Grayscale | ColorType::Indexed => 1,
      ColorType::GrayscaleAlpha => 2,
      ColorType::Truecolor => 3,
      ColorType::TruecolorAlpha => 4,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_color_type_legal_pairs() {
    assert_eq!(
      ColorType::from_header(8, 0).unwrap(),
      ColorType::Grayscale
    );
    assert_eq!(
      ColorType::from_header(8, 6).unwrap(),
      ColorType::TruecolorAlpha
    );
  }

  #[test]
  fn test_color_type_illegal_pair() {
    assert!(matches!(
      ColorType::from_header(2, 2),
      Err(Error::InvalidColorTypeCombo { bit_depth: 2, color_type: 2 })
    ));
    assert!(matches!(
      ColorType::from_header(8, 5),
      Err(Error::InvalidColorTypeCombo { bit_depth: 8, color_type: 5 })
    ));
  }

  #[test]
  fn test_color_type_unsupported_depth() {
    // (16, 2) is a legal pair per the PNG spec, just not implemented.
    assert!(matches!(
      ColorType::from_header(16, 2),
      Err(Error::UnsupportedBitDepth(16))
    ));
  }
}
