use crate::png::meta::Interlace;

// One Adam7 pass: the origin of its first pixel and the stride between
// members, in both axes.
struct Pass {
  start_x: usize,
  stride_x: usize,
  start_y: usize,
  stride_y: usize,
}

// The seven passes in the order their sub-images appear in the stream.
const ADAM7_PASSES: [Pass; 7] = [
  Pass { start_x: 0, stride_x: 8, start_y: 0, stride_y: 8 },
  Pass { start_x: 4, stride_x: 8, start_y: 0, stride_y: 8 },
  Pass { start_x: 0, stride_x: 4, start_y: 4, stride_y: 8 },
  Pass { start_x: 2, stride_x: 4, start_y: 0, stride_y: 4 },
  Pass { start_x: 0, stride_x: 2, start_y: 2, stride_y: 4 },
  Pass { start_x: 1, stride_x: 2, start_y: 0, stride_y: 2 },
  Pass { start_x: 0, stride_x: 1, start_y: 1, stride_y: 2 },
];

// One axis of a pass's sub-image: how many of `dimension` pixels the pass
// claims, clamped to zero when the image is smaller than the pass origin.
fn pass_dimension(dimension: usize, start: usize, stride: usize) -> usize {
  (dimension.saturating_sub(start) + stride - 1) / stride
}

// The (width, height) of every sub-image the stream carries: the seven
// shrunken Adam7 rasters, or the image itself when not interlaced. The sum
// of width * height over the result always equals the full pixel count.
pub fn pass_sizes(width: usize, height: usize, interlace: Interlace) -> Vec<(usize, usize)> {
  match interlace {
    Interlace::None => vec![(width, height)],
    Interlace::Adam7 => ADAM7_PASSES
      .iter()
      .map(|pass| {
        (
          pass_dimension(width, pass.start_x, pass.stride_x),
          pass_dimension(height, pass.start_y, pass.stride_y),
        )
      })
      .collect(),
  }
}

// The pixel offset at which each pass's sub-image begins, within the
// concatenated pass layout.
pub fn pass_offsets(sizes: &[(usize, usize)]) -> Vec<usize> {
  let mut offsets = Vec::with_capacity(sizes.len());
  let mut total = 0;

  for &(width, height) in sizes {
    offsets.push(total);
    total += width * height;
  }

  offsets
}

// Maps a pixel's natural raster index to its index within the concatenated
// pass layout. Passes are searched in reverse definition order so the
// highest-index pass claiming the pixel wins; every pixel left unclaimed
// satisfies pass 0's congruences.
pub fn pass_position(index: usize, offsets: &[usize], width: usize) -> usize {
  let x = index % width;
  let y = index / width;

  for (j, pass) in ADAM7_PASSES.iter().enumerate().skip(1).rev() {
    if x >= pass.start_x
      && (x - pass.start_x) % pass.stride_x == 0
      && y >= pass.start_y
      && (y - pass.start_y) % pass.stride_y == 0
    {
      return offsets[j]
        + (y - pass.start_y) / pass.stride_y
          * pass_dimension(width, pass.start_x, pass.stride_x)
        + (x - pass.start_x) / pass.stride_x;
    }
  }

  let pass = &ADAM7_PASSES[0];
  offsets[0]
    + y / pass.stride_y * pass_dimension(width, pass.start_x, pass.stride_x)
    + x / pass.stride_x
}

// Permutes the pixel buffer from natural raster order into concatenated pass
// order, in place. Follows permutation cycles with a visited bitmap instead
// of allocating a second full size buffer.
pub fn interlace(buffer: &mut [u8], pixel_size: usize, width: usize, sizes: &[(usize, usize)]) {
  let offsets = pass_offsets(sizes);
  let num_pixels = buffer.len() / pixel_size;
  let mut moved = vec![false; num_pixels];

  for i in 0..num_pixels {
    let mut j = i;

    while !moved[i] {
      let k = pass_position(j, &offsets, width);

      if j == k {
        moved[i] = true;
      } else {
        for byte in 0..pixel_size {
          buffer.swap(i * pixel_size + byte, k * pixel_size + byte);
        }

        moved[k] = true;
        j = k;
      }
    }
  }
}

// The decode direction dual of [interlace]: gathers pixels from concatenated
// pass order in `src` back into natural raster order, writing them to `dst`.
pub fn deinterlace(
  src: &[u8],
  dst: &mut [u8],
  pixel_size: usize,
  width: usize,
  sizes: &[(usize, usize)],
) {
  let offsets = pass_offsets(sizes);
  let num_pixels = src.len() / pixel_size;

  for i in 0..num_pixels {
    let k = pass_position(i, &offsets, width);
    dst[i * pixel_size..(i + 1) * pixel_size]
      .copy_from_slice(&src[k * pixel_size..(k + 1) * pixel_size]);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pass_sizes_for_8x8() {
    assert_eq!(
      pass_sizes(8, 8, Interlace::Adam7),
      vec![(1, 1), (1, 1), (2, 1), (2, 2), (4, 2), (4, 4), (8, 4)]
    );
  }

  #[test]
  fn test_pass_sizes_for_10x10() {
    assert_eq!(
      pass_sizes(10, 10, Interlace::Adam7),
      vec![(2, 2), (1, 2), (3, 1), (2, 3), (5, 2), (5, 5), (10, 5)]
    );
  }

  #[test]
  fn test_pass_sizes_for_13x13() {
    assert_eq!(
      pass_sizes(13, 13, Interlace::Adam7),
      vec![(2, 2), (2, 2), (4, 2), (3, 4), (7, 3), (6, 7), (13, 6)]
    );
  }

  #[test]
  fn test_pass_sizes_sum_to_pixel_count() {
    for (width, height) in [(1, 1), (2, 3), (7, 5), (8, 8), (13, 13), (31, 17)] {
      let total: usize = pass_sizes(width, height, Interlace::Adam7)
        .iter()
        .map(|&(w, h)| w * h)
        .sum();

      assert_eq!(total, width * height, "for {}x{}", width, height);
    }
  }

  #[test]
  fn test_pass_sizes_without_interlacing() {
    assert_eq!(pass_sizes(640, 480, Interlace::None), vec![(640, 480)]);
  }

  #[test]
  fn test_pass_position_is_a_permutation() {
    for (width, height) in [(1, 1), (3, 2), (8, 8), (10, 10), (13, 13)] {
      let sizes = pass_sizes(width, height, Interlace::Adam7);
      let offsets = pass_offsets(&sizes);
      let mut seen = vec![false; width * height];

      for i in 0..width * height {
        let k = pass_position(i, &offsets, width);
        assert!(!seen[k], "position {} hit twice for {}x{}", k, width, height);
        seen[k] = true;
      }
    }
  }

  #[test]
  fn test_deinterlace_inverts_interlace() {
    for (width, height) in [(1, 1), (4, 4), (8, 8), (10, 10), (13, 13), (17, 3)] {
      let pixel_size = 4;
      let sizes = pass_sizes(width, height, Interlace::Adam7);

      let original: Vec<u8> = (0..width * height * pixel_size)
        .map(|i| (i / pixel_size) as u8)
        .collect();

      let mut buffer = original.clone();
      interlace(&mut buffer, pixel_size, width, &sizes);

      let mut restored = vec![0; buffer.len()];
      deinterlace(&buffer, &mut restored, pixel_size, width, &sizes);

      assert_eq!(restored, original, "for {}x{}", width, height);
    }
  }

  #[test]
  fn test_interlace_moves_first_pixel_nowhere() {
    // Pixel (0, 0) belongs to pass 0 at offset 0 in every geometry.
    let sizes = pass_sizes(8, 8, Interlace::Adam7);
    let offsets = pass_offsets(&sizes);

    assert_eq!(pass_position(0, &offsets, 8), 0);
  }
}
