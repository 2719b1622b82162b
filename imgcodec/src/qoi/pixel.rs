// An enumeration of the delta encodings a pixel may reduce to against its
// predecessor, with the wire bias already applied.
pub enum PixelDelta {
  // A `QOI_OP_DIFF` delta: 2 bit channel differences, bias +2.
  Diff(u8, u8, u8),
  // A `QOI_OP_LUMA` delta: 6 bit green difference (bias +32) plus 4 bit
  // red-green and blue-green differences (bias +8).
  Luma(u8, u8, u8),
}

/// A single RGBA pixel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pixel {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl Default for Pixel {
  // Streams start from an opaque black previous pixel.
  fn default() -> Self {
    Self { r: 0, g: 0, b: 0, a: 255 }
  }
}

impl Pixel {
  // Attempts to reduce `self` to a delta against `prev`. Returns `None` when
  // the alpha channels differ or no delta is within range, in which case a
  // literal op is required.
  pub fn delta(&self, prev: &Pixel) -> Option<PixelDelta> {
    if self.a != prev.a {
      return None;
    }

    let dr = self.r.wrapping_sub(prev.r);
    let dg = self.g.wrapping_sub(prev.g);
    let db = self.b.wrapping_sub(prev.b);

    let diff_r = dr.wrapping_add(2);
    let diff_g = dg.wrapping_add(2);
    let diff_b = db.wrapping_add(2);

    if diff_r <= 3 && diff_g <= 3 && diff_b <= 3 {
      return Some(PixelDelta::Diff(diff_r, diff_g, diff_b));
    }

    let luma_g = dg.wrapping_add(32);

    if luma_g > 63 {
      return None;
    }

    let luma_rg = dr.wrapping_add(8).wrapping_sub(dg);
    let luma_bg = db.wrapping_add(8).wrapping_sub(dg);

    if luma_rg <= 15 && luma_bg <= 15 {
      return Some(PixelDelta::Luma(luma_g, luma_rg, luma_bg));
    }

    None
  }

  // Reconstructs the pixel a delta encodes, relative to `prev`. All channel
  // arithmetic wraps mod 256.
  pub fn from_delta(delta: PixelDelta, prev: &Pixel) -> Self {
    match delta {
      PixelDelta::Diff(diff_r, diff_g, diff_b) => Self {
        r: prev.r.wrapping_add(diff_r.wrapping_sub(2)),
        g: prev.g.wrapping_add(diff_g.wrapping_sub(2)),
        b: prev.b.wrapping_add(diff_b.wrapping_sub(2)),
        a: prev.a,
      },
      PixelDelta::Luma(luma_g, luma_rg, luma_bg) => {
        let dg = luma_g.wrapping_sub(32);

        Self {
          r: prev.r.wrapping_add(luma_rg.wrapping_sub(8).wrapping_add(dg)),
          g: prev.g.wrapping_add(dg),
          b: prev.b.wrapping_add(luma_bg.wrapping_sub(8).wrapping_add(dg)),
          a: prev.a,
        }
      }
    }
  }

  // The QOI position hash, selecting this pixel's slot in the running color
  // cache.
  pub fn cache_slot(&self) -> usize {
    (self.r as usize * 3
      + self.g as usize * 5
      + self.b as usize * 7
      + self.a as usize * 11)
      % 64
  }
}
