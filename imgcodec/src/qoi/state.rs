use crate::qoi::pixel::Pixel;

// The stateful registers maintained while decoding or encoding one stream:
// the 64 slot running color cache, the previous pixel, and the length of any
// run in progress. Re-initialized at the start of every stream, never shared
// across streams.
pub struct State {
  // Recently seen pixels, indexed by their position hash.
  pub cache: [Pixel; 64],
  // The previously decoded/encoded pixel.
  pub prev_pixel: Pixel,
  // Length of the current run (Op::Run), if any.
  pub run_count: u8,
}

impl State {
  pub fn new() -> Self {
    Self {
      cache: [Pixel { r: 0, g: 0, b: 0, a: 0 }; 64],
      prev_pixel: Pixel::default(),
      run_count: 0,
    }
  }

  // Inserts the given pixel into the cache, overwriting whatever occupied
  // its slot.
  pub fn cache_insert(&mut self, pixel: Pixel) {
    self.cache[pixel.cache_slot()] = pixel;
  }

  // Checks whether the given pixel already occupies its slot and returns the
  // slot index if so. Otherwise the pixel replaces the previous occupant and
  // no index is returned.
  pub fn cache_match_or_replace(&mut self, pixel: Pixel) -> Option<usize> {
    let slot = pixel.cache_slot();

    if self.cache[slot] == pixel {
      return Some(slot);
    }

    self.cache[slot] = pixel;

    None
  }
}
