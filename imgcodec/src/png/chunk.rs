use crate::error::Error;
use crate::png::crc::calc_crc;

pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

pub const TYPE_IHDR: [u8; 4] = *b"IHDR";
pub const TYPE_PLTE: [u8; 4] = *b"PLTE";
pub const TYPE_TRNS: [u8; 4] = *b"tRNS";
pub const TYPE_IDAT: [u8; 4] = *b"IDAT";
pub const TYPE_IEND: [u8; 4] = *b"IEND";

// The most data one chunk can carry, and therefore the point at which an
// IDAT payload must be split across chunks.
pub const MAX_CHUNK_LEN: usize = (1 << 31) - 1;

// One parsed chunk: its type, a view of its data, and the offset of the
// chunk that follows it.
pub struct Chunk<'a> {
  pub ty: [u8; 4],
  pub data: &'a [u8],
  pub next: usize,
}

// Parses the chunk starting at `offset`, verifying its CRC-32 over the type
// and data bytes against the stored value.
pub fn read_chunk(input: &[u8], offset: usize) -> Result<Chunk<'_>, Error> {
  let header = input
    .get(offset..offset + 8)
    .ok_or(Error::UnexpectedEof)?;
  let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
  let ty = [header[4], header[5], header[6], header[7]];

  let data = input
    .get(offset + 8..offset + 8 + length)
    .ok_or(Error::UnexpectedEof)?;
  let stored = input
    .get(offset + 8 + length..offset + 12 + length)
    .ok_or(Error::UnexpectedEof)?;
  let stored = u32::from_be_bytes([stored[0], stored[1], stored[2], stored[3]]);

  if calc_crc(&input[offset + 4..offset + 8 + length]) != stored {
    return Err(Error::CrcMismatch(ty));
  }

  Ok(Chunk { ty, data, next: offset + 12 + length })
}

// Appends one chunk to the output: length and CRC are computed from whatever
// `data_fn` writes between them.
pub fn write_chunk(out: &mut Vec<u8>, ty: [u8; 4], data_fn: impl FnOnce(&mut Vec<u8>)) {
  let length_at = out.len();
  out.extend_from_slice(&[0; 4]);
  out.extend_from_slice(&ty);

  let data_at = out.len();
  data_fn(out);

  let length = (out.len() - data_at) as u32;
  out[length_at..length_at + 4].copy_from_slice(&length.to_be_bytes());

  let crc = calc_crc(&out[length_at + 4..]);
  out.extend_from_slice(&crc.to_be_bytes());
}
