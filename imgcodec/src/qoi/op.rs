use crate::error::Error;

// An enumeration of each possible QOI encoding "chunk", or Op.
pub enum Op {
  // `QOI_OP_DIFF`, contains the red, green, and blue difference from the
  // previous pixel with a bias of +2.
  //
  // | 7 6   5  4  3  2  1  0 |
  // |------------------------|
  // | 0 1 |  dr |  dg |  db  |
  //
  Diff(u8, u8, u8),

  // `QOI_OP_INDEX`, index into the running color cache.
  //
  // | 7 6   5  4  3  2  1  0 |
  // |------------------------|
  // | 0 0 |      index       |
  //
  Index(u8),

  // `QOI_OP_LUMA`, contains the green difference from the previous pixel
  // with a bias of +32, and the red-green and blue-green differences with a
  // bias of +8.
  //
  // | 7 6   5  4  3  2  1  0 | 7  6  5  4   3  2  1  0 |
  // |------------------------|-------------------------|
  // | 1 0 |       dg         |   dr - dg  |   db - dg  |
  //
  Luma(u8, u8, u8),

  // `QOI_OP_RGB`, contains the red, green, and blue values of a pixel. The
  // alpha value is retained from the previous pixel.
  //
  // | 7  6  5  4  3  2  1  0 | 7..0 | 7..0 | 7..0 |
  // |------------------------|------|------|------|
  // | 1  1  1  1  1  1  1  0 |   r  |   g  |   b  |
  //
  Rgb(u8, u8, u8),

  // `QOI_OP_RGBA`, contains the red, green, blue, and alpha values of a
  // pixel.
  //
  // | 7  6  5  4  3  2  1  0 | 7..0 | 7..0 | 7..0 | 7..0 |
  // |------------------------|------|------|------|------|
  // | 1  1  1  1  1  1  1  1 |   r  |   g  |   b  |   a  |
  //
  Rgba(u8, u8, u8, u8),

  // `QOI_OP_RUN`, contains the length of the run minus one, so the wire
  // values 0..=61 mean runs of 1..=62. The values 62 and 63 never appear
  // here since those bit patterns collide with the RGB and RGBA literal
  // tags; longer runs are split into multiple ops.
  //
  // | 7 6   5  4  3  2  1  0 |
  // |------------------------|
  // | 1 1 |    run - 1       |
  Run(u8),
}

impl Op {
  const MASK_DIFF: u8 = 0x03;
  const MASK_LUMA_1: u8 = 0x3f;
  const MASK_LUMA_2: u8 = 0x0f;
  const MASK_RUN: u8 = 0x3f;
  const MASK_TAG: u8 = 0xc0;

  const TAG_DIFF: u8 = 0x40;
  const TAG_INDEX: u8 = 0x00;
  const TAG_LUMA: u8 = 0x80;
  const TAG_RGB: u8 = 0xfe;
  const TAG_RGBA: u8 = 0xff;
  const TAG_RUN: u8 = 0xc0;

  // Encodes the `Op` and appends its bytes to the output.
  pub fn write_to(&self, out: &mut Vec<u8>) {
    match *self {
      Op::Diff(diff_r, diff_g, diff_b) => {
        out.push(Op::TAG_DIFF | (diff_r << 4) | (diff_g << 2) | diff_b);
      }
      Op::Index(index) => {
        out.push(Op::TAG_INDEX | index);
      }
      Op::Luma(luma_g, luma_rg, luma_bg) => {
        out.push(Op::TAG_LUMA | luma_g);
        out.push((luma_rg << 4) | luma_bg);
      }
      Op::Rgb(r, g, b) => {
        out.extend_from_slice(&[Op::TAG_RGB, r, g, b]);
      }
      Op::Rgba(r, g, b, a) => {
        out.extend_from_slice(&[Op::TAG_RGBA, r, g, b, a]);
      }
      Op::Run(biased_count) => {
        out.push(Op::TAG_RUN | biased_count);
      }
    }
  }

  // Attempts to decode one `Op` starting at `pos`, returning it along with
  // the number of bytes it consumed. Fails with `UnexpectedEof` when the
  // opcode extends past the end of the input.
  pub fn read_at(input: &[u8], pos: usize) -> Result<(Self, usize), Error> {
    let byte = *input.get(pos).ok_or(Error::UnexpectedEof)?;

    if byte == Op::TAG_RGB {
      let rest = input
        .get(pos + 1..pos + 4)
        .ok_or(Error::UnexpectedEof)?;
      return Ok((Op::Rgb(rest[0], rest[1], rest[2]), 4));
    }

    if byte == Op::TAG_RGBA {
      let rest = input
        .get(pos + 1..pos + 5)
        .ok_or(Error::UnexpectedEof)?;
      return Ok((Op::Rgba(rest[0], rest[1], rest[2], rest[3]), 5));
    }

    match byte & Op::MASK_TAG {
      Op::TAG_DIFF => Ok((
        Op::Diff(
          byte >> 4 & Op::MASK_DIFF,
          byte >> 2 & Op::MASK_DIFF,
          byte & Op::MASK_DIFF,
        ),
        1,
      )),
      Op::TAG_INDEX => Ok((Op::Index(byte), 1)),
      Op::TAG_LUMA => {
        let next = *input.get(pos + 1).ok_or(Error::UnexpectedEof)?;

        Ok((
          Op::Luma(
            byte & Op::MASK_LUMA_1,
            next >> 4 & Op::MASK_LUMA_2,
            next & Op::MASK_LUMA_2,
          ),
          2,
        ))
      }
      // Op::TAG_RUN; RGB/RGBA already matched above.
      _ => Ok((Op::Run(byte & Op::MASK_RUN), 1)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_single_byte_ops_round_trip() {
    for op in [Op::Diff(3, 0, 2), Op::Index(17), Op::Run(61)] {
      let mut bytes = Vec::new();
      op.write_to(&mut bytes);
      assert_eq!(bytes.len(), 1);

      let (decoded, consumed) = Op::read_at(&bytes, 0).unwrap();
      assert_eq!(consumed, 1);

      match (op, decoded) {
        (Op::Diff(a, b, c), Op::Diff(x, y, z)) => assert_eq!((a, b, c), (x, y, z)),
        (Op::Index(a), Op::Index(x)) => assert_eq!(a, x),
        (Op::Run(a), Op::Run(x)) => assert_eq!(a, x),
        _ => panic!("Decoded a different op than was written"),
      }
    }
  }

  #[test]
  fn test_literal_ops_round_trip() {
    let mut bytes = Vec::new();
    Op::Rgb(101, 102, 103).write_to(&mut bytes);
    Op::Rgba(1, 2, 3, 4).write_to(&mut bytes);

    let (rgb, consumed) = Op::read_at(&bytes, 0).unwrap();
    assert_eq!(consumed, 4);
    assert!(matches!(rgb, Op::Rgb(101, 102, 103)));

    let (rgba, consumed) = Op::read_at(&bytes, 4).unwrap();
    assert_eq!(consumed, 5);
    assert!(matches!(rgba, Op::Rgba(1, 2, 3, 4)));
  }

  #[test]
  fn test_truncated_op() {
    let mut bytes = Vec::new();
    Op::Rgba(1, 2, 3, 4).write_to(&mut bytes);

    assert!(matches!(
      Op::read_at(&bytes[..3], 0),
      Err(Error::UnexpectedEof)
    ));
  }
}
