//! ZRLE encoding decoder - Zlib-compressed RLE with 64x64 tiling.
//!
//! ZRLE (Zlib Run-Length Encoding, type 16) combines zlib compression with
//! run-length and palette encoding. A rectangle is split into 64x64 tiles
//! (smaller at the right and bottom edges), each with its own
//! [`SubEncoding`].
//!
//! # Wire Format
//!
//! ```text
//! +------------------+
//! | length           |  4 bytes (u32 big-endian) - length of zlib data
//! +------------------+
//! | zlib_data        |  'length' bytes of zlib-compressed tile data
//! +------------------+
//! ```
//!
//! After decompression the data holds the tiles in row-major order, each a
//! selector byte followed by its pixels. Pixels are "CPIXELs": at most 3
//! bytes, with the padding byte of 32 bpp formats dropped.
//!
//! # Zlib Stream
//!
//! ZRLE uses one continuous zlib stream for the whole connection. Only the
//! first rectangle carries a zlib header; the server sync-flushes at the end
//! of each rectangle. The decoder's inflater therefore persists across
//! rectangles and is only reset by [`ZrleDecoder::reset`].
//!
//! # Non-blocking Operation
//!
//! [`ZrleDecoder::decode_rect`] never waits for the network. It returns
//! [`DecodeStatus::NeedData`] until the length prefix and then the whole
//! compressed payload are queued, and is simply called again once more bytes
//! have arrived. Once the payload is present, every tile is decoded within
//! that call.
//!
//! # Example
//!
//! ```
//! use rfb_encodings::{DecodeStatus, Phase, ZrleDecoder};
//! use rfb_pixelbuffer::{ManagedPixelBuffer, PixelFormat};
//! use rfb_protocol::{RecvQueue, Rectangle};
//!
//! let mut decoder = ZrleDecoder::new();
//! let mut queue = RecvQueue::new();
//! let mut framebuffer = ManagedPixelBuffer::new(64, 64, PixelFormat::rgb888());
//! let rect = Rectangle { x: 0, y: 0, width: 64, height: 64, encoding: 16 };
//!
//! // Only half of the length prefix has arrived
//! queue.push(&[0x00, 0x00]);
//! let status = decoder.decode_rect(&rect, &mut queue, &mut framebuffer, 24, 32).unwrap();
//! assert_eq!(status, DecodeStatus::NeedData);
//! assert_eq!(decoder.phase(), Phase::AwaitingLength);
//! ```

mod rle;
mod stream;
mod subencoding;
mod tile;

pub use subencoding::SubEncoding;
pub use tile::TILE_SIZE;

use crate::{DecodeError, DecodeStatus, DecoderConfig, Inflate, Inflator, DEFAULT_CHUNK_SIZE};
use rfb_common::Rect;
use rfb_pixelbuffer::DisplaySurface;
use rfb_protocol::{ReadQueue, Rectangle};
use stream::{ChunkStream, Inflating};
use subencoding::decode_tile;
use tile::{TileBuffer, TileGrid, WirePixel};
use tracing::{debug, trace, warn};

/// Where the decoder is within the current rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the 4-byte compressed length.
    AwaitingLength,
    /// Length read; waiting for the whole compressed payload.
    AwaitingPayload { compressed_len: u32 },
    /// Payload handed to the inflater and tiles being decoded.
    ///
    /// Only observable after a decode failed part-way; the decoder then
    /// needs [`ZrleDecoder::reset`].
    Decoding { compressed_len: u32 },
}

/// Streaming ZRLE decoder.
///
/// One decoder serves one connection: it owns the connection's zlib stream,
/// so rectangles must be decoded in the order they arrive. The inflater is
/// pluggable for testing; the default is the `flate2`-backed [`Inflator`].
pub struct ZrleDecoder<I: Inflate = Inflator> {
    config: DecoderConfig,
    phase: Phase,
    inflater: I,
    stream: ChunkStream,
    tile: TileBuffer,
}

impl Default for ZrleDecoder<Inflator> {
    fn default() -> Self {
        Self::new()
    }
}

impl ZrleDecoder<Inflator> {
    /// Create a decoder with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder with a custom configuration.
    pub fn with_config(config: DecoderConfig) -> Self {
        Self::with_inflater(config, Inflator::new())
    }
}

impl<I: Inflate> ZrleDecoder<I> {
    /// Create a decoder around a caller-supplied inflater.
    pub fn with_inflater(config: DecoderConfig, inflater: I) -> Self {
        let stream = ChunkStream::new(config.initial_chunk_size, config.adaptive_chunk_sizing);
        Self {
            config,
            phase: Phase::AwaitingLength,
            inflater,
            stream,
            tile: TileBuffer::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn inflater(&self) -> &I {
        &self.inflater
    }

    /// Compressed length of the rectangle in progress, once read.
    pub fn compressed_length(&self) -> Option<u32> {
        match self.phase {
            Phase::AwaitingLength => None,
            Phase::AwaitingPayload { compressed_len } | Phase::Decoding { compressed_len } => {
                Some(compressed_len)
            }
        }
    }

    /// Whether the current rectangle's payload has been handed to the
    /// inflater.
    pub fn payload_received(&self) -> bool {
        matches!(self.phase, Phase::Decoding { .. })
    }

    /// Current decompressed chunk request size.
    pub fn chunk_hint(&self) -> usize {
        self.stream.hint()
    }

    /// Forget any rectangle in progress and start a fresh zlib stream.
    ///
    /// Call when a new connection starts, or to recover after an error on a
    /// stream the server has also reset.
    pub fn reset(&mut self) {
        self.phase = Phase::AwaitingLength;
        self.inflater.reset();
        self.stream.reset();
    }

    /// Decode one ZRLE rectangle from `queue` onto `display`.
    ///
    /// `depth` and `bits_per_pixel` come from the negotiated pixel format.
    /// Returns [`DecodeStatus::NeedData`] without consuming anything beyond
    /// the length prefix while bytes are missing; call again with the same
    /// `rect` once more data has been queued.
    ///
    /// # Errors
    ///
    /// Any [`DecodeError`] leaves the zlib stream in an unknown position.
    /// Once tile decoding has started, later calls fail with
    /// [`DecodeError::Desynchronized`] until [`reset`](Self::reset).
    pub fn decode_rect<Q: ReadQueue + ?Sized>(
        &mut self,
        rect: &Rectangle,
        queue: &mut Q,
        display: &mut dyn DisplaySurface,
        depth: u8,
        bits_per_pixel: u8,
    ) -> Result<DecodeStatus, DecodeError> {
        let wire = WirePixel::new(bits_per_pixel, depth)?;

        let compressed_len = match self.phase {
            Phase::Decoding { .. } => return Err(DecodeError::Desynchronized),
            Phase::AwaitingPayload { compressed_len } => compressed_len,
            Phase::AwaitingLength => {
                if queue.must_wait(4) {
                    return Ok(DecodeStatus::NeedData);
                }
                let compressed_len = queue.read_u32()?;
                self.stream.begin_rect(compressed_len);
                debug!(
                    x = rect.x,
                    y = rect.y,
                    width = rect.width,
                    height = rect.height,
                    compressed_len,
                    chunk_hint = self.stream.hint(),
                    "ZRLE rectangle"
                );
                self.phase = Phase::AwaitingPayload { compressed_len };
                compressed_len
            }
        };

        if queue.must_wait(compressed_len as usize) {
            trace!(
                compressed_len,
                available = queue.available(),
                "ZRLE payload incomplete"
            );
            return Ok(DecodeStatus::NeedData);
        }
        let payload = queue.read_bytes(compressed_len as usize)?;

        self.phase = Phase::Decoding { compressed_len };
        self.inflater.set_input(Some(payload));

        let area = Rect::new(
            i32::from(rect.x),
            i32::from(rect.y),
            u32::from(rect.width),
            u32::from(rect.height),
        );
        self.decode_tiles(area, wire, display)?;
        self.finish_rect()?;

        self.phase = Phase::AwaitingLength;
        debug!(x = rect.x, y = rect.y, "ZRLE rectangle complete");
        Ok(DecodeStatus::Complete)
    }

    fn decode_tiles(
        &mut self,
        area: Rect,
        wire: WirePixel,
        display: &mut dyn DisplaySurface,
    ) -> Result<(), DecodeError> {
        let mut source = Inflating {
            stream: &mut self.stream,
            inflater: &mut self.inflater,
        };

        for tile in TileGrid::new(area) {
            if tile.is_empty() {
                return Err(DecodeError::GeometryMismatch {
                    width: tile.width,
                    height: tile.height,
                });
            }
            let mode = decode_tile(&mut source, &mut self.tile, tile, wire, display)?;
            trace!(
                x = tile.x,
                y = tile.y,
                width = tile.width,
                height = tile.height,
                ?mode,
                "ZRLE tile"
            );
        }
        Ok(())
    }

    /// Drop whatever the tiles did not consume and release the payload.
    fn finish_rect(&mut self) -> Result<(), DecodeError> {
        let mut trailing = self.stream.discard();
        loop {
            let extra = self.inflater.inflate(DEFAULT_CHUNK_SIZE, true)?;
            if extra.is_empty() {
                break;
            }
            trailing += extra.len();
        }
        self.inflater.set_input(None);

        if trailing > 0 {
            if self.config.reject_trailing_data {
                return Err(DecodeError::TrailingData(trailing));
            }
            warn!(trailing, "Discarding trailing bytes after ZRLE rectangle");
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use anyhow::Result;
    use rfb_common::Rect;
    use rfb_pixelbuffer::DisplaySurface;

    /// Records every fill and blit it receives.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub(crate) fills: Vec<(Rect, [u8; 3])>,
        pub(crate) blits: Vec<(Rect, Vec<u8>)>,
    }

    impl DisplaySurface for RecordingSurface {
        fn fill_rect(&mut self, rect: Rect, rgb: [u8; 3]) -> Result<()> {
            self.fills.push((rect, rgb));
            Ok(())
        }

        fn blit_image(&mut self, rect: Rect, rgba: &[u8], offset: usize) -> Result<()> {
            let len = rect.area() as usize * 4;
            self.blits.push((rect, rgba[offset..offset + len].to_vec()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingSurface;
    use super::*;
    use crate::InflateError;
    use bytes::Bytes;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use pretty_assertions::assert_eq;
    use rfb_protocol::RecvQueue;
    use std::io::Write;

    /// Compresses tile data the way a server does: one zlib stream, sync
    /// flushed after each rectangle.
    struct Server {
        zlib: ZlibEncoder<Vec<u8>>,
    }

    impl Server {
        fn new() -> Self {
            Self {
                zlib: ZlibEncoder::new(Vec::new(), Compression::default()),
            }
        }

        /// Length-prefixed ZRLE data for one rectangle.
        fn rect(&mut self, tiles: &[u8]) -> Vec<u8> {
            self.zlib.write_all(tiles).unwrap();
            self.zlib.flush().unwrap();
            let compressed = std::mem::take(self.zlib.get_mut());
            let mut out = (compressed.len() as u32).to_be_bytes().to_vec();
            out.extend(compressed);
            out
        }
    }

    fn rectangle(x: u16, y: u16, width: u16, height: u16) -> Rectangle {
        Rectangle {
            x,
            y,
            width,
            height,
            encoding: crate::ENCODING_ZRLE,
        }
    }

    fn decode(
        decoder: &mut ZrleDecoder,
        rect: &Rectangle,
        queue: &mut RecvQueue,
        surface: &mut RecordingSurface,
    ) -> Result<DecodeStatus, DecodeError> {
        decoder.decode_rect(rect, queue, surface, 24, 32)
    }

    #[test]
    fn test_solid_rectangle() {
        let mut decoder = ZrleDecoder::new();
        let mut queue = RecvQueue::new();
        let mut surface = RecordingSurface::default();
        queue.push(&Server::new().rect(&[1, 10, 20, 30]));

        let rect = rectangle(10, 20, 64, 64);
        let status = decode(&mut decoder, &rect, &mut queue, &mut surface).unwrap();

        assert_eq!(status, DecodeStatus::Complete);
        assert_eq!(surface.fills, vec![(Rect::new(10, 20, 64, 64), [10, 20, 30])]);
        assert!(surface.blits.is_empty());
        assert_eq!(decoder.phase(), Phase::AwaitingLength);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_multi_tile_rectangle() {
        let mut decoder = ZrleDecoder::new();
        let mut queue = RecvQueue::new();
        let mut surface = RecordingSurface::default();
        // 70x65: four tiles, 64x64, 6x64, 64x1, 6x1
        queue.push(&Server::new().rect(&[
            1, 1, 1, 1, //
            1, 2, 2, 2, //
            1, 3, 3, 3, //
            1, 4, 4, 4,
        ]));

        let rect = rectangle(0, 0, 70, 65);
        decode(&mut decoder, &rect, &mut queue, &mut surface).unwrap();

        assert_eq!(
            surface.fills,
            vec![
                (Rect::new(0, 0, 64, 64), [1, 1, 1]),
                (Rect::new(64, 0, 6, 64), [2, 2, 2]),
                (Rect::new(0, 64, 64, 1), [3, 3, 3]),
                (Rect::new(64, 64, 6, 1), [4, 4, 4]),
            ]
        );
    }

    #[test]
    fn test_waits_for_length_then_payload() {
        let mut decoder = ZrleDecoder::new();
        let mut queue = RecvQueue::new();
        let mut surface = RecordingSurface::default();
        let data = Server::new().rect(&[1, 10, 20, 30]);
        let rect = rectangle(0, 0, 8, 8);

        queue.push(&data[..2]);
        assert_eq!(
            decode(&mut decoder, &rect, &mut queue, &mut surface).unwrap(),
            DecodeStatus::NeedData
        );
        assert_eq!(decoder.phase(), Phase::AwaitingLength);
        assert_eq!(queue.available(), 2);

        queue.push(&data[2..6]);
        assert_eq!(
            decode(&mut decoder, &rect, &mut queue, &mut surface).unwrap(),
            DecodeStatus::NeedData
        );
        let expected_len = (data.len() - 4) as u32;
        assert_eq!(decoder.compressed_length(), Some(expected_len));
        assert!(!decoder.payload_received());
        assert_eq!(queue.available(), 2);

        queue.push(&data[6..]);
        assert_eq!(
            decode(&mut decoder, &rect, &mut queue, &mut surface).unwrap(),
            DecodeStatus::Complete
        );
        assert_eq!(decoder.compressed_length(), None);
        assert_eq!(surface.fills, vec![(Rect::new(0, 0, 8, 8), [10, 20, 30])]);
    }

    #[test]
    fn test_rectangles_share_zlib_stream() {
        let mut server = Server::new();
        let mut decoder = ZrleDecoder::new();
        let mut queue = RecvQueue::new();
        let mut surface = RecordingSurface::default();

        queue.push(&server.rect(&[1, 1, 2, 3]));
        queue.push(&server.rect(&[0, 4, 5, 6]));

        let first = rectangle(0, 0, 4, 4);
        let second = rectangle(4, 0, 1, 1);
        decode(&mut decoder, &first, &mut queue, &mut surface).unwrap();
        decode(&mut decoder, &second, &mut queue, &mut surface).unwrap();

        assert_eq!(surface.fills, vec![(Rect::new(0, 0, 4, 4), [1, 2, 3])]);
        assert_eq!(
            surface.blits,
            vec![(Rect::new(4, 0, 1, 1), vec![4, 5, 6, 255])]
        );
    }

    #[test]
    fn test_empty_rectangle_consumes_payload() {
        let mut server = Server::new();
        let mut decoder = ZrleDecoder::new();
        let mut queue = RecvQueue::new();
        let mut surface = RecordingSurface::default();

        queue.push(&server.rect(&[]));
        queue.push(&server.rect(&[1, 7, 7, 7]));

        let empty = rectangle(0, 0, 0, 10);
        assert_eq!(
            decode(&mut decoder, &empty, &mut queue, &mut surface).unwrap(),
            DecodeStatus::Complete
        );
        assert!(surface.fills.is_empty());

        let next = rectangle(0, 0, 2, 2);
        decode(&mut decoder, &next, &mut queue, &mut surface).unwrap();
        assert_eq!(surface.fills, vec![(Rect::new(0, 0, 2, 2), [7, 7, 7])]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unsupported_pixel_format_consumes_nothing() {
        let mut decoder = ZrleDecoder::new();
        let mut queue = RecvQueue::new();
        let mut surface = RecordingSurface::default();
        queue.push(&Server::new().rect(&[1, 0]));

        let err = decoder
            .decode_rect(&rectangle(0, 0, 1, 1), &mut queue, &mut surface, 1, 1)
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnsupportedPixelFormat { bits_per_pixel: 1 }
        ));
        assert_eq!(decoder.phase(), Phase::AwaitingLength);
        assert!(queue.available() > 4);
    }

    #[test]
    fn test_error_desynchronizes_until_reset() {
        let mut decoder = ZrleDecoder::new();
        let mut queue = RecvQueue::new();
        let mut surface = RecordingSurface::default();
        let rect = rectangle(0, 0, 1, 1);

        queue.push(&Server::new().rect(&[129, 0, 0, 0]));
        let err = decode(&mut decoder, &rect, &mut queue, &mut surface).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownSubEncoding(129)));
        assert!(decoder.payload_received());

        queue.push(&Server::new().rect(&[1, 5, 5, 5]));
        let err = decode(&mut decoder, &rect, &mut queue, &mut surface).unwrap_err();
        assert!(matches!(err, DecodeError::Desynchronized));

        // The server starts a new stream with a fresh zlib header
        decoder.reset();
        decode(&mut decoder, &rect, &mut queue, &mut surface).unwrap();
        assert_eq!(surface.fills, vec![(Rect::new(0, 0, 1, 1), [5, 5, 5])]);
    }

    #[test]
    fn test_trailing_data_is_discarded() {
        let mut server = Server::new();
        let mut decoder = ZrleDecoder::new();
        let mut queue = RecvQueue::new();
        let mut surface = RecordingSurface::default();

        queue.push(&server.rect(&[1, 1, 1, 1, 0xAA, 0xBB]));
        queue.push(&server.rect(&[1, 2, 2, 2]));

        let rect = rectangle(0, 0, 1, 1);
        decode(&mut decoder, &rect, &mut queue, &mut surface).unwrap();
        decode(&mut decoder, &rect, &mut queue, &mut surface).unwrap();

        assert_eq!(
            surface.fills,
            vec![
                (Rect::new(0, 0, 1, 1), [1, 1, 1]),
                (Rect::new(0, 0, 1, 1), [2, 2, 2]),
            ]
        );
    }

    #[test]
    fn test_trailing_data_rejected_when_configured() {
        let config = DecoderConfig {
            reject_trailing_data: true,
            ..Default::default()
        };
        let mut decoder = ZrleDecoder::with_config(config);
        let mut queue = RecvQueue::new();
        let mut surface = RecordingSurface::default();

        queue.push(&Server::new().rect(&[1, 1, 1, 1, 0xAA, 0xBB]));
        let err = decode(&mut decoder, &rectangle(0, 0, 1, 1), &mut queue, &mut surface)
            .unwrap_err();
        assert!(matches!(err, DecodeError::TrailingData(2)));
    }

    #[test]
    fn test_corrupt_payload() {
        let mut decoder = ZrleDecoder::new();
        let mut queue = RecvQueue::new();
        let mut surface = RecordingSurface::default();
        queue.push(&[0, 0, 0, 4, 0xFF, 0xFF, 0xFF, 0xFF]);

        let err = decode(&mut decoder, &rectangle(0, 0, 1, 1), &mut queue, &mut surface)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Inflate(_)));
        assert!(err.is_protocol_error());
    }

    /// Ignores its input and serves fixed decompressed bytes, recording the
    /// size of every exact request.
    struct ScriptedInflater {
        data: Bytes,
        exact_requests: Vec<usize>,
    }

    impl Inflate for ScriptedInflater {
        fn set_input(&mut self, _data: Option<Bytes>) {}

        fn inflate(&mut self, max_bytes: usize, allow_partial: bool) -> Result<Bytes, InflateError> {
            if allow_partial {
                let n = max_bytes.min(self.data.len());
                return Ok(self.data.split_to(n));
            }
            self.exact_requests.push(max_bytes);
            if self.data.len() < max_bytes {
                return Err(InflateError::Short {
                    requested: max_bytes,
                    available: self.data.len(),
                });
            }
            Ok(self.data.split_to(max_bytes))
        }

        fn reset(&mut self) {}
    }

    fn scripted(config: DecoderConfig, data: &[u8]) -> ZrleDecoder<ScriptedInflater> {
        ZrleDecoder::with_inflater(
            config,
            ScriptedInflater {
                data: Bytes::copy_from_slice(data),
                exact_requests: Vec::new(),
            },
        )
    }

    #[test]
    fn test_chunk_request_halves_on_short_inflater() {
        let mut decoder = scripted(DecoderConfig::default(), &[1, 10, 20, 30]);
        let mut queue = RecvQueue::new();
        let mut surface = RecordingSurface::default();
        queue.push(&100u32.to_be_bytes());
        queue.push(&[0u8; 100]);

        let status = decoder
            .decode_rect(&rectangle(0, 0, 64, 64), &mut queue, &mut surface, 24, 32)
            .unwrap();
        assert_eq!(status, DecodeStatus::Complete);

        assert_eq!(
            decoder.inflater().exact_requests,
            vec![65, 33, 17, 9, 5, 3, 3, 2, 1]
        );
        assert_eq!(decoder.chunk_hint(), 1);
        assert_eq!(surface.fills, vec![(Rect::new(0, 0, 64, 64), [10, 20, 30])]);
    }

    #[test]
    fn test_fixed_chunk_size() {
        let config = DecoderConfig {
            initial_chunk_size: 8,
            adaptive_chunk_sizing: false,
            ..Default::default()
        };
        let mut decoder = scripted(config, &[1, 10, 20, 30]);
        let mut queue = RecvQueue::new();
        let mut surface = RecordingSurface::default();
        queue.push(&3u32.to_be_bytes());
        queue.push(&[0u8; 3]);

        let status = decoder
            .decode_rect(&rectangle(0, 0, 64, 64), &mut queue, &mut surface, 24, 32)
            .unwrap();
        assert_eq!(status, DecodeStatus::Complete);

        assert_eq!(decoder.inflater().exact_requests, vec![8, 4]);
        assert_eq!(decoder.chunk_hint(), 8);
    }

    #[test]
    fn test_exhausted_inflater() {
        let mut decoder = scripted(DecoderConfig::default(), &[0, 1, 2]);
        let mut queue = RecvQueue::new();
        let mut surface = RecordingSurface::default();
        queue.push(&[0, 0, 0, 1, 0]);

        let err = decoder
            .decode_rect(&rectangle(0, 0, 2, 2), &mut queue, &mut surface, 24, 32)
            .unwrap_err();
        assert!(matches!(err, DecodeError::ProtocolExhaustion));
        assert!(surface.blits.is_empty());
    }
}
