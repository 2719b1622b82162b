//! A [WebAssembly](https://developer.mozilla.org/en-US/docs/WebAssembly)
//! wrapper of the imgcodec crate, exposing both the PNG and QOI codecs to
//! any host that can instantiate a WASM module, such as a web browser.
//!
//! Rich data types cannot cross the WASM FFI boundary, so images travel as
//! raw memory: the host copies bytes into the instance with
//! `imgcodec_malloc`, calls an encode or decode export, and receives results
//! through the imported callback functions, deallocating buffers with
//! `imgcodec_dealloc` once they have been copied back out.
//!
//! Decoded pixel data is always RGBA, so the byte size of a decode result is
//! `width * height * 4`.
//!
//! # JavaScript decode example
//!
//! ```js
//! let wasm = await WebAssembly.instantiateStreaming(fetch('./imgcodec.wasm'), {
//!   env: {
//!     on_decode_complete: (pointer, width, height) => {
//!       let size = width * height * 4;
//!       let pixels = wasm.instance.exports.memory.buffer.slice(pointer, pointer + size);
//!       wasm.instance.exports.imgcodec_dealloc(pointer, size);
//!     },
//!     on_decode_error: (code) => console.error(code),
//!     on_encode_complete: () => {},
//!     on_encode_error: () => {},
//!   },
//! });
//!
//! let encodedImage = new Uint8Array(..); // A PNG or QOI file.
//! let size = encodedImage.byteLength;
//! let pointer = wasm.instance.exports.imgcodec_malloc(size);
//! new Uint8Array(wasm.instance.exports.memory.buffer, pointer, size).set(encodedImage);
//!
//! wasm.instance.exports.png_image_decode(pointer, size);
//! // or: wasm.instance.exports.qoi_image_decode(pointer, size);
//!
//! wasm.instance.exports.imgcodec_dealloc(pointer, size);
//! ```

use std::mem;

use imgcodec::{
  decode_png, decode_qoi, encode_png, encode_qoi, Channels, Colorspace, Error, ErrorKind,
  Interlace, PngOptions, QoiOptions,
};

// Maps a crate error onto an integer that can be trivially passed through
// the WASM FFI boundary: one code per failure category.
struct ErrorCode {
  code: u8,
}

impl From<Error> for ErrorCode {
  fn from(error: Error) -> Self {
    let code = match error.kind() {
      ErrorKind::Format => 1,
      ErrorKind::Range => 2,
      ErrorKind::Unsupported => 3,
      ErrorKind::Io => 4,
    };

    ErrorCode { code }
  }
}

// External functions that are expected to be imported into the WASM instance
// from the host.
extern "C" {
  fn on_decode_complete(buf_ptr: *mut u8, width: u32, height: u32);
  fn on_decode_error(err_code: u8);
  fn on_encode_complete(buf_ptr: *mut u8, size: usize);
  fn on_encode_error(err_code: u8);
}

/// Allocates a chunk of linear memory of the given `size`, intended to
/// contain byte (u8) values.
#[no_mangle]
pub extern "C" fn imgcodec_malloc(size: usize) -> *mut u8 {
  let mut buf = Vec::with_capacity(size);
  let ptr = buf.as_mut_ptr();

  mem::forget(buf);

  ptr
}

/// Deallocates the memory starting at `ptr` up to `size`.
///
/// # Safety
///
/// This function must be called exactly once per allocation handed out by
/// `imgcodec_malloc` or a completion callback, with the matching `size`.
/// Any other use corrupts the WASM instance's memory.
#[no_mangle]
pub unsafe extern "C" fn imgcodec_dealloc(ptr: *mut u8, size: usize) {
  Vec::from_raw_parts(ptr, size, size);
}

// Hands an encoded result to the host and forgets the backing buffers so
// they stay alive until the host deallocates them.
unsafe fn complete_encode(source: Vec<u8>, mut dest: Vec<u8>) {
  let size = dest.len();
  let ptr = dest.as_mut_ptr();

  mem::forget(source);
  mem::forget(dest);

  on_encode_complete(ptr, size);
}

// Hands decoded pixel data to the host along with the image's dimensions.
unsafe fn complete_decode(source: Vec<u8>, mut dest: Vec<u8>, width: u32, height: u32) {
  let ptr = dest.as_mut_ptr();

  mem::forget(source);
  mem::forget(dest);

  on_decode_complete(ptr, width, height);
}

/// Encodes `width * height` RGBA pixels at `buf_ptr` as a PNG image.
/// `interlace` selects Adam7 interlacing with the value 1.
///
/// Calls `on_encode_complete` with a pointer to the encoded bytes and their
/// size, or `on_encode_error` with an error code.
///
/// # Safety
///
/// `buf_ptr` and `buf_size` must describe memory obtained from
/// `imgcodec_malloc`; anything else corrupts the WASM instance's memory.
#[no_mangle]
pub unsafe extern "C" fn png_image_encode(
  width: u32,
  height: u32,
  interlace: u8,
  buf_ptr: *mut u8,
  buf_size: usize,
) {
  let interlace = match Interlace::try_from(interlace) {
    Ok(interlace) => interlace,
    Err(e) => {
      on_encode_error(ErrorCode::from(e).code);
      return;
    }
  };

  let options = PngOptions { width, height, compression: 0, filter: 0, interlace };
  let source = Vec::from_raw_parts(buf_ptr, buf_size, buf_size);

  match encode_png(&source, &options) {
    Ok(dest) => complete_encode(source, dest),
    Err(e) => {
      mem::forget(source);
      on_encode_error(ErrorCode::from(e).code);
    }
  }
}

/// Decodes the PNG image at `buf_ptr` into RGBA pixel data.
///
/// Calls `on_decode_complete` with a pointer to the pixel bytes and the
/// image's dimensions, or `on_decode_error` with an error code.
///
/// # Safety
///
/// `buf_ptr` and `buf_size` must describe memory obtained from
/// `imgcodec_malloc`; anything else corrupts the WASM instance's memory.
#[no_mangle]
pub unsafe extern "C" fn png_image_decode(buf_ptr: *mut u8, buf_size: usize) {
  let source = Vec::from_raw_parts(buf_ptr, buf_size, buf_size);

  match decode_png(&source) {
    Ok((options, dest)) => complete_decode(source, dest, options.width, options.height),
    Err(e) => {
      mem::forget(source);
      on_decode_error(ErrorCode::from(e).code);
    }
  }
}

/// Encodes `width * height` pixels at `buf_ptr` as a QOI image. `channels`
/// is 3 for RGB input or 4 for RGBA, and `colorspace` is 0 for sRGB or 1 for
/// linear.
///
/// Calls `on_encode_complete` with a pointer to the encoded bytes and their
/// size, or `on_encode_error` with an error code.
///
/// # Safety
///
/// `buf_ptr` and `buf_size` must describe memory obtained from
/// `imgcodec_malloc`; anything else corrupts the WASM instance's memory.
#[no_mangle]
pub unsafe extern "C" fn qoi_image_encode(
  width: u32,
  height: u32,
  channels: u8,
  colorspace: u8,
  buf_ptr: *mut u8,
  buf_size: usize,
) {
  let channels = match Channels::try_from(channels) {
    Ok(channels) => channels,
    Err(e) => {
      on_encode_error(ErrorCode::from(e).code);
      return;
    }
  };
  let colorspace = match Colorspace::try_from(colorspace) {
    Ok(colorspace) => colorspace,
    Err(e) => {
      on_encode_error(ErrorCode::from(e).code);
      return;
    }
  };

  let options = QoiOptions { width, height, channels, colorspace };
  let source = Vec::from_raw_parts(buf_ptr, buf_size, buf_size);

  match encode_qoi(&source, &options) {
    Ok(dest) => complete_encode(source, dest),
    Err(e) => {
      mem::forget(source);
      on_encode_error(ErrorCode::from(e).code);
    }
  }
}

/// Decodes the QOI image at `buf_ptr` into RGBA pixel data.
///
/// Calls `on_decode_complete` with a pointer to the pixel bytes and the
/// image's dimensions, or `on_decode_error` with an error code.
///
/// # Safety
///
/// `buf_ptr` and `buf_size` must describe memory obtained from
/// `imgcodec_malloc`; anything else corrupts the WASM instance's memory.
#[no_mangle]
pub unsafe extern "C" fn qoi_image_decode(buf_ptr: *mut u8, buf_size: usize) {
  let source = Vec::from_raw_parts(buf_ptr, buf_size, buf_size);

  match decode_qoi(&source) {
    Ok((options, dest)) => complete_decode(source, dest, options.width, options.height),
    Err(e) => {
      mem::forget(source);
      on_decode_error(ErrorCode::from(e).code);
    }
  }
}
