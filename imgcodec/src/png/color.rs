use std::collections::{HashMap, HashSet};

use crate::error::Error;
use crate::png::meta::ColorType;

// A single RGB (or gray) value reserved to represent full transparency when
// no per pixel alpha channel is stored. Written as the tRNS chunk.
pub enum TransparencyKey {
  Gray(u8),
  Rgb(u8, u8, u8),
}

// The outcome of color mode selection: which wire representation the pixels
// were reduced to, plus the palette or transparency key that representation
// needs to round trip.
pub struct ColorMode {
  pub color_type: ColorType,
  // RGBA palette entries, most frequent first. Present only for Indexed.
  pub palette: Option<Vec<u32>>,
  pub transparency_key: Option<TransparencyKey>,
}

// Scans the RGBA input once and reduces it, in place, to the smallest wire
// representation that can reproduce it exactly. Returns the chosen mode and
// the reduced byte length; the bytes past that length are garbage.
//
// The scan tracks whether every pixel is achromatic, whether every pixel is
// fully opaque, whether any pixel is "hazy" (neither fully opaque nor fully
// transparent), and the distinct color population up to a 256 color cap.
// Once the first three are settled and the cap is exceeded no branch can
// still choose an indexed or grayscale form, so the scan short-circuits.
pub fn select_color_mode(input: &mut [u8]) -> (ColorMode, usize) {
  let mut is_gray = true;
  let mut is_opaque = true;
  let mut is_hazy = false;
  let mut colors: HashMap<u32, (u64, usize)> = HashMap::new();

  for pixel in input.chunks_exact(4) {
    let (r, g, b, a) = (pixel[0], pixel[1], pixel[2], pixel[3]);

    if is_gray && (r != g || r != b) {
      is_gray = false;
    }
    if is_opaque && a != 255 {
      is_opaque = false;
    }
    if !is_hazy && a != 255 && a != 0 {
      is_hazy = true;
    }

    let order = colors.len();
    colors
      .entry(u32::from_be_bytes([r, g, b, a]))
      .and_modify(|(count, _)| *count += 1)
      .or_insert((1, order));

    if !is_gray && !is_opaque && is_hazy && colors.len() > 256 {
      break;
    }
  }

  if is_gray {
    if is_opaque {
      let len = to_grayscale(input);
      return (mode(ColorType::Grayscale, None, None), len);
    }

    if is_hazy {
      let len = to_grayscale_alpha(input);
      return (mode(ColorType::GrayscaleAlpha, None, None), len);
    }

    // Alpha is strictly binary: try to reserve an unused gray value as a
    // transparency key, falling back to an explicit alpha channel.
    if let Some(gray) = reserve_gray_key(input, &colors) {
      let len = to_grayscale(input);
      return (
        mode(ColorType::Grayscale, None, Some(TransparencyKey::Gray(gray))),
        len,
      );
    }

    let len = to_grayscale_alpha(input);
    return (mode(ColorType::GrayscaleAlpha, None, None), len);
  }

  if colors.len() < 256 {
    let palette = build_palette(&colors);
    let len = to_indexed(input, &palette);
    return (mode(ColorType::Indexed, Some(palette), None), len);
  }

  if is_opaque {
    let len = to_truecolor(input);
    return (mode(ColorType::Truecolor, None, None), len);
  }

  if is_hazy {
    return (mode(ColorType::TruecolorAlpha, None, None), input.len());
  }

  if let Some((r, g, b)) = reserve_rgb_key(input, &colors) {
    let len = to_truecolor(input);
    return (
      mode(ColorType::Truecolor, None, Some(TransparencyKey::Rgb(r, g, b))),
      len,
    );
  }

  (mode(ColorType::TruecolorAlpha, None, None), input.len())
}

fn mode(
  color_type: ColorType,
  palette: Option<Vec<u32>>,
  transparency_key: Option<TransparencyKey>,
) -> ColorMode {
  ColorMode { color_type, palette, transparency_key }
}

// Palette entries ordered by descending frequency, ties broken by first
// encountered order.
fn build_palette(colors: &HashMap<u32, (u64, usize)>) -> Vec<u32> {
  let mut entries: Vec<(u32, u64, usize)> = colors
    .iter()
    .map(|(&color, &(count, order))| (color, count, order))
    .collect();

  entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
  entries.into_iter().map(|(color, ..)| color).collect()
}

// Finds the lexicographically first gray value no fully opaque pixel uses,
// and rewrites every fully transparent pixel to it. All pixels are known to
// be achromatic here, so only the red sample needs checking.
fn reserve_gray_key(input: &mut [u8], colors: &HashMap<u32, (u64, usize)>) -> Option<u8> {
  let opaque: HashSet<u8> = colors
    .keys()
    .filter(|&&color| color & 0xff == 0xff)
    .map(|&color| (color >> 24) as u8)
    .collect();

  let gray = (0..=255u8).find(|value| !opaque.contains(value))?;
  rewrite_transparent_pixels(input, gray, gray, gray);

  Some(gray)
}

// Finds the lexicographically first (r, g, b) triple no fully opaque pixel
// uses, and rewrites every fully transparent pixel to it. Returns `None`
// only when all 2^24 triples occur opaque somewhere in the image.
fn reserve_rgb_key(
  input: &mut [u8],
  colors: &HashMap<u32, (u64, usize)>,
) -> Option<(u8, u8, u8)> {
  let opaque: HashSet<u32> = colors
    .keys()
    .filter(|&&color| color & 0xff == 0xff)
    .map(|&color| color >> 8)
    .collect();

  for r in 0..=255u32 {
    for g in 0..=255u32 {
      for b in 0..=255u32 {
        if !opaque.contains(&(r << 16 | g << 8 | b)) {
          rewrite_transparent_pixels(input, r as u8, g as u8, b as u8);
          return Some((r as u8, g as u8, b as u8));
        }
      }
    }
  }

  None
}

fn rewrite_transparent_pixels(input: &mut [u8], r: u8, g: u8, b: u8) {
  for pixel in input.chunks_exact_mut(4) {
    if pixel[3] == 0 {
      pixel[0] = r;
      pixel[1] = g;
      pixel[2] = b;
    }
  }
}

// The to_* reductions below scan forward writing strictly behind the read
// cursor, so they can reuse the input's own storage.

fn to_grayscale(input: &mut [u8]) -> usize {
  let num_pixels = input.len() / 4;

  for i in 1..num_pixels {
    input[i] = input[i * 4];
  }

  num_pixels
}

fn to_grayscale_alpha(input: &mut [u8]) -> usize {
  let num_pixels = input.len() / 4;
  input[1] = input[3];

  for i in 1..num_pixels {
    input[i * 2] = input[i * 4];
    input[i * 2 + 1] = input[i * 4 + 3];
  }

  num_pixels * 2
}

fn to_truecolor(input: &mut [u8]) -> usize {
  let num_pixels = input.len() / 4;

  for i in 1..num_pixels {
    input[i * 3] = input[i * 4];
    input[i * 3 + 1] = input[i * 4 + 1];
    input[i * 3 + 2] = input[i * 4 + 2];
  }

  num_pixels * 3
}

fn to_indexed(input: &mut [u8], palette: &[u32]) -> usize {
  let lookup: HashMap<u32, u8> = palette
    .iter()
    .enumerate()
    .map(|(index, &color)| (color, index as u8))
    .collect();

  let num_pixels = input.len() / 4;

  for i in 0..num_pixels {
    let color = u32::from_be_bytes([
      input[i * 4],
      input[i * 4 + 1],
      input[i * 4 + 2],
      input[i * 4 + 3],
    ]);

    // The palette holds every observed color.
    input[i] = lookup.get(&color).copied().unwrap_or(0);
  }

  num_pixels
}

// The from_* expansions reconstruct RGBA from reduced data sitting at the
// tail of the same buffer, writing from the front. The write cursor never
// overtakes the read cursor until the final pixel, whose samples are copied
// to locals before the write.

pub fn from_grayscale(out: &mut [u8], tail: usize) {
  let mut o = 0;

  for i in tail..out.len() {
    let gray = out[i];
    out[o] = gray;
    out[o + 1] = gray;
    out[o + 2] = gray;
    out[o + 3] = 255;
    o += 4;
  }
}

pub fn from_grayscale_alpha(out: &mut [u8], tail: usize) {
  let mut o = 0;
  let mut i = tail;

  while i < out.len() {
    let gray = out[i];
    let alpha = out[i + 1];
    out[o] = gray;
    out[o + 1] = gray;
    out[o + 2] = gray;
    out[o + 3] = alpha;
    o += 4;
    i += 2;
  }
}

pub fn from_truecolor(out: &mut [u8], tail: usize) {
  let mut o = 0;
  let mut i = tail;

  while i < out.len() {
    let (r, g, b) = (out[i], out[i + 1], out[i + 2]);
    out[o] = r;
    out[o + 1] = g;
    out[o + 2] = b;
    out[o + 3] = 255;
    o += 4;
    i += 3;
  }
}

pub fn from_indexed(out: &mut [u8], tail: usize, palette: &[u32]) -> Result<(), Error> {
  let mut o = 0;

  for i in tail..out.len() {
    let index = out[i];
    let color = *palette
      .get(index as usize)
      .ok_or(Error::InvalidPaletteIndex { index, len: palette.len() })?;

    out[o..o + 4].copy_from_slice(&color.to_be_bytes());
    o += 4;
  }

  Ok(())
}

// Builds the decode side palette: RGBA entries from PLTE triples with tRNS
// alphas folded in, 255 where the tRNS chunk is absent or shorter.
pub fn fold_palette(plte: &[u8], trns: Option<&[u8]>) -> Vec<u32> {
  plte
    .chunks_exact(3)
    .enumerate()
    .map(|(index, rgb)| {
      let alpha = trns.and_then(|t| t.get(index)).copied().unwrap_or(255);
      u32::from_be_bytes([rgb[0], rgb[1], rgb[2], alpha])
    })
    .collect()
}

// Rewrites every pixel exactly matching the transparency key to fully
// transparent.
pub fn make_pixels_transparent(out: &mut [u8], r: u8, g: u8, b: u8) {
  for pixel in out.chunks_exact_mut(4) {
    if pixel[0] == r && pixel[1] == g && pixel[2] == b {
      pixel[3] = 0;
    }
  }
}
