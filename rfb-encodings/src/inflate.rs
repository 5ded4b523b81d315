//! Resumable zlib inflation.
//!
//! The [`Inflate`] trait is the decompressor seen by the ZRLE stream
//! reader: compressed input is handed over once per rectangle, and
//! decompressed bytes are pulled out in requests of a chosen size. The
//! protocol uses a single zlib stream for the lifetime of a connection,
//! with the server performing a sync flush at the end of every rectangle,
//! so state carries over between inputs.
//!
//! [`Inflator`] implements the trait on top of [`flate2::Decompress`].

use bytes::{Buf, Bytes, BytesMut};
use flate2::{Decompress, FlushDecompress, Status};
use thiserror::Error;

/// Upper bound on a single `decompress` call's output window.
const OUTPUT_STEP: usize = 32 * 1024;

/// Errors reported by an [`Inflate`] implementation.
#[derive(Debug, Error)]
pub enum InflateError {
    /// Fewer bytes could be produced than an exact request asked for.
    ///
    /// The bytes that were produced are retained for the next request.
    #[error("Inflater short: requested {requested} bytes, {available} available")]
    Short { requested: usize, available: usize },

    /// The compressed data is invalid.
    #[error("Corrupt zlib data: {0}")]
    Corrupt(#[from] flate2::DecompressError),
}

/// A resumable, fallible producer of decompressed bytes.
pub trait Inflate {
    /// Supply compressed input, or `None` to drop any unconsumed input and
    /// buffered output.
    ///
    /// `Some` appends to whatever input has not been consumed yet.
    fn set_input(&mut self, data: Option<Bytes>);

    /// Produce up to `max_bytes` of decompressed output.
    ///
    /// With `allow_partial = false` the result is exactly `max_bytes` long
    /// or the call fails with [`InflateError::Short`] without losing any
    /// bytes already inflated. With `allow_partial = true` whatever is
    /// available (possibly nothing) is returned.
    fn inflate(&mut self, max_bytes: usize, allow_partial: bool) -> Result<Bytes, InflateError>;

    /// Discard all state and start a fresh zlib stream.
    fn reset(&mut self);
}

/// [`Inflate`] backed by `flate2`.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use flate2::{write::ZlibEncoder, Compression};
/// use rfb_encodings::{Inflate, Inflator};
/// use std::io::Write;
///
/// let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
/// encoder.write_all(b"hello").unwrap();
/// let compressed = encoder.finish().unwrap();
///
/// let mut inflator = Inflator::new();
/// inflator.set_input(Some(Bytes::from(compressed)));
/// assert!(inflator.inflate(8, false).is_err());
/// assert_eq!(&inflator.inflate(5, false).unwrap()[..], b"hello");
/// ```
pub struct Inflator {
    stream: Decompress,
    /// Compressed bytes not yet consumed by zlib.
    input: Bytes,
    /// Decompressed bytes not yet handed out.
    pending: BytesMut,
    scratch: Vec<u8>,
}

impl Default for Inflator {
    fn default() -> Self {
        Self::new()
    }
}

impl Inflator {
    /// Create an inflater expecting a zlib header.
    pub fn new() -> Self {
        Self {
            stream: Decompress::new(true), // true = zlib wrapper
            input: Bytes::new(),
            pending: BytesMut::new(),
            scratch: Vec::new(),
        }
    }

    /// Compressed bytes supplied but not yet consumed.
    pub fn input_remaining(&self) -> usize {
        self.input.len()
    }

    /// Decompressed bytes produced but not yet returned.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Inflate into `pending` until it holds `target` bytes or zlib stops
    /// making progress.
    fn pump(&mut self, target: usize) -> Result<(), InflateError> {
        while self.pending.len() < target {
            let window = (target - self.pending.len()).min(OUTPUT_STEP);
            self.scratch.resize(window, 0);

            let before_in = self.stream.total_in();
            let before_out = self.stream.total_out();
            let status =
                self.stream
                    .decompress(&self.input, &mut self.scratch, FlushDecompress::Sync)?;
            let consumed = (self.stream.total_in() - before_in) as usize;
            let produced = (self.stream.total_out() - before_out) as usize;

            self.input.advance(consumed);
            self.pending.extend_from_slice(&self.scratch[..produced]);

            if status == Status::StreamEnd || (consumed == 0 && produced == 0) {
                break;
            }
        }
        Ok(())
    }
}

impl Inflate for Inflator {
    fn set_input(&mut self, data: Option<Bytes>) {
        match data {
            Some(data) if self.input.is_empty() => self.input = data,
            Some(data) => {
                let mut joined = BytesMut::with_capacity(self.input.len() + data.len());
                joined.extend_from_slice(&self.input);
                joined.extend_from_slice(&data);
                self.input = joined.freeze();
            }
            None => {
                self.input = Bytes::new();
                self.pending.clear();
            }
        }
    }

    fn inflate(&mut self, max_bytes: usize, allow_partial: bool) -> Result<Bytes, InflateError> {
        self.pump(max_bytes)?;

        let available = self.pending.len();
        if available >= max_bytes {
            return Ok(self.pending.split_to(max_bytes).freeze());
        }
        if allow_partial {
            return Ok(self.pending.split().freeze());
        }
        Err(InflateError::Short {
            requested: max_bytes,
            available,
        })
    }

    fn reset(&mut self) {
        self.stream.reset(true);
        self.input = Bytes::new();
        self.pending.clear();
    }
}
