use std::io;

use crate::error::Error;
use crate::qoi::decode::apply_op;
use crate::qoi::meta::{QoiOptions, QOI_BYTES_END, QOI_HEADER_LEN};
use crate::qoi::op::Op;
use crate::qoi::state::State;

/// A resumable, push based QOI decoder.
///
/// Input may arrive in arbitrarily sized chunks: a chunk boundary can fall
/// inside the 14 byte header, inside a multi byte opcode, or inside the end
/// marker, and decoding resumes correctly on the next [QoiStreamDecoder::push].
/// Unconsumed bytes are carried between calls along with the color cache and
/// previous pixel register.
///
/// Call [QoiStreamDecoder::finish] after the final chunk to validate that
/// the stream was complete.
pub struct QoiStreamDecoder {
  options: Option<QoiOptions>,
  state: State,
  // Bytes carried over from previous pushes: at most a partial header, a
  // partial opcode, or a partial end marker.
  carry: Vec<u8>,
  decoded: usize,
  finished: bool,
}

impl QoiStreamDecoder {
  pub fn new() -> Self {
    Self {
      options: None,
      state: State::new(),
      carry: Vec::new(),
      decoded: 0,
      finished: false,
    }
  }

  /// The image's options, available once enough bytes have been pushed to
  /// parse the header.
  pub fn options(&self) -> Option<&QoiOptions> {
    self.options.as_ref()
  }

  /// Feeds the decoder another chunk of the encoded stream, writing any
  /// pixels that become fully decodable to `out` as RGBA quads.
  pub fn push<W: io::Write>(&mut self, input: &[u8], mut out: W) -> Result<(), Error> {
    self.carry.extend_from_slice(input);
    let mut pos = 0;

    if self.options.is_none() {
      if self.carry.len() < QOI_HEADER_LEN {
        return Ok(());
      }

      self.options = Some(QoiOptions::from_header(&self.carry[..QOI_HEADER_LEN])?);
      pos = QOI_HEADER_LEN;
    }

    let expected = match &self.options {
      Some(options) => options.num_pixels(),
      None => return Ok(()),
    };

    let mut produced = Vec::new();

    // An opcode is only interpreted once 8 look-ahead bytes are buffered, so
    // the end marker check can never read past what we hold and a partial
    // opcode simply waits for the next chunk.
    while self.decoded < expected && self.carry.len() - pos >= QOI_BYTES_END.len() {
      if self.carry[pos..pos + QOI_BYTES_END.len()] == QOI_BYTES_END {
        return Err(Error::PixelCountMismatch { decoded: self.decoded, expected });
      }

      let (op, consumed) = Op::read_at(&self.carry, pos)?;
      pos += consumed;

      self.decoded += apply_op(&mut self.state, op, self.decoded, expected, |pixel| {
        produced.extend_from_slice(&[pixel.r, pixel.g, pixel.b, pixel.a]);
      })?;
    }

    if self.decoded == expected
      && !self.finished
      && self.carry.len() - pos >= QOI_BYTES_END.len()
    {
      if self.carry[pos..pos + QOI_BYTES_END.len()] != QOI_BYTES_END {
        return Err(Error::TrailingData);
      }

      pos += QOI_BYTES_END.len();
      self.finished = true;
    }

    if self.finished && self.carry.len() > pos {
      return Err(Error::TrailingData);
    }

    self.carry.drain(..pos);
    out.write_all(&produced)?;

    Ok(())
  }

  /// Consumes the decoder, validating that a complete stream was pushed:
  /// header, `width * height` pixels, and the end marker.
  pub fn finish(self) -> Result<QoiOptions, Error> {
    let options = match self.options {
      Some(options) => options,
      None => return Err(Error::TooShort),
    };

    if !self.finished {
      return Err(Error::UnexpectedEof);
    }

    Ok(options)
  }
}

impl Default for QoiStreamDecoder {
  fn default() -> Self {
    Self::new()
  }
}

/// Decodes a QOI stream from an incremental byte source, writing RGBA pixel
/// data to `writer` as it becomes available.
///
/// `on_header` is invoked exactly once, as soon as the 14 byte header has
/// been read, before any pixel data is produced.
pub fn decode_qoi_stream<R, W, F>(
  mut reader: R,
  mut writer: W,
  on_header: F,
) -> Result<QoiOptions, Error>
where
  R: io::Read,
  W: io::Write,
  F: FnOnce(&QoiOptions),
{
  let mut decoder = QoiStreamDecoder::new();
  let mut on_header = Some(on_header);
  let mut buf = [0; 8 * 1024];

  loop {
    let read = reader.read(&mut buf)?;

    if read == 0 {
      break;
    }

    decoder.push(&buf[..read], &mut writer)?;

    if let Some(options) = decoder.options() {
      if let Some(callback) = on_header.take() {
        callback(options);
      }
    }
  }

  writer.flush()?;
  decoder.finish()
}
