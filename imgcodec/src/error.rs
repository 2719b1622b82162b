use std::io;

use thiserror::Error;

/// The broad failure categories an `Error` falls into, see [Error::kind].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
  /// Malformed input that can never decode, such as a bad signature, a CRC
  /// mismatch, or a structurally invalid chunk/opcode stream.
  Format,
  /// Caller-supplied values rejected before any transform work begins.
  Range,
  /// Input that may be valid per its format specification but is outside
  /// this implementation's capability.
  Unsupported,
  /// Propagated from the compression collaborator or an output sink.
  Io,
}

/// An enumeration of all error values this crate may produce.
#[derive(Debug, Error)]
pub enum Error {
  /// The first eight bytes of a PNG were not the fixed signature.
  #[error("PNG had invalid signature")]
  InvalidSignature,
  /// The first chunk of a PNG was not an IHDR chunk.
  #[error("An IHDR chunk was expected. Found: {}", chunk_name(.0))]
  ExpectedIhdr([u8; 4]),
  /// A chunk's stored CRC-32 did not match the computed one.
  #[error("The CRC32 checksum didn't match for chunk: {}", chunk_name(.0))]
  CrcMismatch([u8; 4]),
  /// The IHDR width field was zero or above 2^31 - 1.
  #[error("PNG has an invalid Width: {0}")]
  InvalidImageWidth(u32),
  /// The IHDR height field was zero or above 2^31 - 1.
  #[error("PNG has an invalid Height: {0}")]
  InvalidImageHeight(u32),
  /// The IHDR bit depth and color type fields do not form a legal pair.
  #[error("PNG has invalid bitDepth ({bit_depth}) and colorType ({color_type}) combination")]
  InvalidColorTypeCombo {
    bit_depth: u8,
    color_type: u8,
  },
  /// Another chunk type appeared between two IDAT chunks.
  #[error("A non-IDAT chunk ({}) was found between IDAT chunks", chunk_name(.0))]
  NonContiguousIdat([u8; 4]),
  /// More than one PLTE chunk appeared in the stream.
  #[error("A PLTE chunk was already received")]
  DuplicatePlte,
  /// More than one tRNS chunk appeared in the stream.
  #[error("A tRNS chunk was already received")]
  DuplicateTrns,
  /// An indexed-color PNG carried no PLTE chunk.
  #[error("A PLTE chunk was expected")]
  MissingPlte,
  /// The PLTE chunk length was not a multiple of 3, or above 768 bytes.
  #[error("The PLTE chunk has an invalid length: {0}")]
  InvalidPlteLength(usize),
  /// The tRNS chunk length did not match the image's color type.
  #[error("The tRNS chunk has an invalid length: {0}")]
  InvalidTrnsLength(usize),
  /// A scanline began with a filter type byte outside 0..=4.
  #[error("Scanline has an unknown filter type: {0}")]
  InvalidFilterType(u8),
  /// The inflated IDAT payload does not match the scanline geometry implied
  /// by the IHDR fields.
  #[error("Decompressed data length ({actual}) does not match image geometry ({expected})")]
  InflatedSizeMismatch {
    actual: usize,
    expected: usize,
  },
  /// An indexed pixel referenced a palette entry that does not exist.
  #[error("Pixel references palette entry {index} outside the {len} entry palette")]
  InvalidPaletteIndex {
    index: u8,
    len: usize,
  },

  /// The QOI stream was shorter than a header plus an end marker.
  #[error("QOI stream is too short to be valid")]
  TooShort,
  /// The first four bytes of a QOI stream were not the magic number.
  #[error("QOI stream has an invalid magic number")]
  InvalidMagic,
  /// Failed to derive a supported channel count from a QOI header.
  #[error("invalid image channels {0}, expected 3 for RGB or 4 for RGBA")]
  InvalidChannels(u8),
  /// Failed to derive a supported colorspace from a QOI header.
  #[error("invalid image colorspace {0}, expected 0 for sRGB or 1 for linear")]
  InvalidColorspace(u8),
  /// The opcode stream did not produce the pixel count the header promised.
  #[error("QOI stream produced {decoded} pixels, expected {expected}")]
  PixelCountMismatch {
    decoded: usize,
    expected: usize,
  },
  /// Bytes other than the end marker followed the final pixel.
  #[error("QOI stream has trailing bytes where the end marker was expected")]
  TrailingData,

  /// The input ended in the middle of a chunk, opcode, or header.
  #[error("Unexpected end of input, expected more bytes")]
  UnexpectedEof,

  /// A caller-supplied width was zero or above 2^31 - 1.
  #[error("Width ({0}) must be an integer value greater than zero")]
  InvalidWidth(u32),
  /// A caller-supplied height was zero or above 2^31 - 1.
  #[error("Height ({0}) must be an integer value greater than zero")]
  InvalidHeight(u32),
  /// The pixel buffer's length was not a whole number of pixels.
  #[error("Unexpected number of bytes from input")]
  UnalignedInput,
  /// The pixel buffer's length disagreed with `width * height`.
  #[error("Number of pixels ({expected}) does not match input length")]
  BufferLengthMismatch {
    expected: usize,
  },

  /// Only a bit depth of 8 is implemented.
  #[error("Bit Depths other than 8 aren't implemented yet, found: {0}")]
  UnsupportedBitDepth(u8),
  /// The PNG spec only standardises compression method zero.
  #[error("Unsupported Compression Method: {0}")]
  UnsupportedCompression(u8),
  /// The PNG spec only standardises filter method zero.
  #[error("Unsupported Filter Method: {0}")]
  UnsupportedFilter(u8),
  /// Interlace methods other than none (0) and Adam7 (1) are unrecognized.
  #[error("Unsupported Interlace Method: {0}")]
  UnsupportedInterlace(u8),

  /// Any `std::io::Error` that occurs while piping data through the
  /// compression collaborator or writing to an output sink.
  #[error(transparent)]
  Io(#[from] io::Error),
}

impl Error {
  /// Returns which of the spec's failure categories this error belongs to.
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::InvalidSignature
      | Error::ExpectedIhdr(_)
      | Error::CrcMismatch(_)
      | Error::InvalidImageWidth(_)
      | Error::InvalidImageHeight(_)
      | Error::InvalidColorTypeCombo { .. }
      | Error::NonContiguousIdat(_)
      | Error::DuplicatePlte
      | Error::DuplicateTrns
      | Error::MissingPlte
      | Error::InvalidFilterType(_)
      | Error::InflatedSizeMismatch { .. }
      | Error::InvalidPaletteIndex { .. }
      | Error::TooShort
      | Error::InvalidMagic
      | Error::InvalidChannels(_)
      | Error::InvalidColorspace(_)
      | Error::PixelCountMismatch { .. }
      | Error::TrailingData
      | Error::UnexpectedEof => ErrorKind::Format,
      Error::InvalidWidth(_)
      | Error::InvalidHeight(_)
      | Error::UnalignedInput
      | Error::BufferLengthMismatch { .. }
      | Error::InvalidPlteLength(_)
      | Error::InvalidTrnsLength(_) => ErrorKind::Range,
      Error::UnsupportedBitDepth(_)
      | Error::UnsupportedCompression(_)
      | Error::UnsupportedFilter(_)
      | Error::UnsupportedInterlace(_) => ErrorKind::Unsupported,
      Error::Io(_) => ErrorKind::Io,
    }
  }
}

// Chunk types are almost always printable ASCII, but a corrupted stream may
// put anything in those four bytes.
fn chunk_name(ty: &[u8; 4]) -> String {
  String::from_utf8_lossy(ty).into_owned()
}
