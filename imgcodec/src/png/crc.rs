// The 256 entry lookup table for the reflected IEEE 802.3 polynomial, built
// once at compile time and shared read-only.
const CRC_TABLE: [u32; 256] = {
  let mut table = [0u32; 256];
  let mut i = 0;

  while i < 256 {
    let mut x = i as u32;
    let mut j = 0;

    while j < 8 {
      x = if x & 1 != 0 { 0xedb8_8320 ^ (x >> 1) } else { x >> 1 };
      j += 1;
    }

    table[i] = x;
    i += 1;
  }

  table
};

// Computes the CRC-32 checksum of a byte buffer, as stored in PNG chunks.
pub fn calc_crc(buffer: &[u8]) -> u32 {
  let mut crc = !0u32;

  for &byte in buffer {
    crc = CRC_TABLE[((crc ^ byte as u32) & 0xff) as usize] ^ (crc >> 8);
  }

  !crc
}
