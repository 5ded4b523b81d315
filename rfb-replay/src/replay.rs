//! Feeds a capture through the ZRLE decoder.
//!
//! [`Replayer`] is push-driven like a real connection: bytes are queued as
//! they are read, and every rectangle the decoder cannot finish yet is
//! retried on the next feed. The feed size therefore controls how often the
//! decoder has to suspend and resume mid-rectangle.

use crate::capture::CaptureHeader;
use crate::config::Config;
use crate::errors::ReplayError;
use rfb_encodings::{DecodeStatus, Decoder, ZrleDecoder};
use rfb_pixelbuffer::{ManagedPixelBuffer, PixelBuffer, PixelFormat as ClientFormat};
use rfb_protocol::{ReadQueue, Rectangle, RecvQueue};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::io::AsyncRead;
use tracing::{debug, info, trace, warn};

/// Counters gathered during a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Rectangles decoded.
    pub rectangles: u64,
    /// Pixels covered by those rectangles.
    pub pixels: u64,
    /// Capture bytes read, header included.
    pub bytes: u64,
    /// Decode calls that had to wait for more data.
    pub need_data: u64,
    pub elapsed: Duration,
}

impl fmt::Display for ReplayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rectangles, {} pixels from {} bytes in {:.1?} ({} waits for data)",
            self.rectangles, self.pixels, self.bytes, self.elapsed, self.need_data
        )
    }
}

/// Result of a complete replay.
#[derive(Debug)]
pub struct Replay {
    pub header: CaptureHeader,
    pub framebuffer: ManagedPixelBuffer,
    pub stats: ReplayStats,
}

struct Session {
    header: CaptureHeader,
    framebuffer: ManagedPixelBuffer,
}

/// Incremental capture decoder.
pub struct Replayer {
    decoder: Box<dyn Decoder>,
    queue: RecvQueue,
    session: Option<Session>,
    /// Rectangle whose header has been read but whose data is incomplete.
    pending: Option<Rectangle>,
    stats: ReplayStats,
    started: Instant,
}

impl Replayer {
    pub fn new(config: &Config) -> Self {
        Self::with_decoder(Box::new(ZrleDecoder::with_config(config.decoder.clone())))
    }

    pub fn with_decoder(decoder: Box<dyn Decoder>) -> Self {
        Self {
            decoder,
            queue: RecvQueue::new(),
            session: None,
            pending: None,
            stats: ReplayStats::default(),
            started: Instant::now(),
        }
    }

    pub fn header(&self) -> Option<&CaptureHeader> {
        self.session.as_ref().map(|s| &s.header)
    }

    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    /// Queue `data` and decode as far as it allows.
    ///
    /// # Errors
    ///
    /// Returns the first header, encoding or decode error encountered. The
    /// replay cannot continue after an error.
    pub fn feed(&mut self, data: &[u8]) -> Result<(), ReplayError> {
        self.queue.push(data);
        self.pump()
    }

    /// Read up to `max_bytes` from `reader` and decode as far as they allow.
    ///
    /// Returns the number of bytes read; 0 means end of input.
    ///
    /// # Errors
    ///
    /// Returns read errors as well as everything [`feed`](Self::feed) can.
    pub async fn feed_from<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
        max_bytes: usize,
    ) -> Result<usize, ReplayError> {
        let n = self.queue.fill_from(reader, max_bytes).await?;
        if n > 0 {
            trace!("Read {} capture bytes", n);
            self.pump()?;
        }
        Ok(n)
    }

    fn pump(&mut self) -> Result<(), ReplayError> {
        if self.session.is_none() {
            match CaptureHeader::read_from(&mut self.queue)? {
                Some(header) => {
                    info!(
                        "Capture {}x{}, {} bpp depth {}",
                        header.width,
                        header.height,
                        header.pixel_format.bits_per_pixel,
                        header.pixel_format.depth
                    );
                    if !header.has_rgb_byte_order() {
                        warn!(
                            "Capture pixel format (shifts {}/{}/{}, big_endian {}) does not send \
                             pixels in RGB byte order; colour channels will be swapped",
                            header.pixel_format.red_shift,
                            header.pixel_format.green_shift,
                            header.pixel_format.blue_shift,
                            header.pixel_format.big_endian
                        );
                    }
                    let framebuffer = ManagedPixelBuffer::new(
                        u32::from(header.width),
                        u32::from(header.height),
                        ClientFormat::rgb888(),
                    );
                    self.session = Some(Session {
                        header,
                        framebuffer,
                    });
                }
                None => return Ok(()),
            }
        }

        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        loop {
            let rect = match self.pending.take() {
                Some(rect) => rect,
                None => match Rectangle::read_from(&mut self.queue)? {
                    Some(rect) => {
                        if rect.encoding != self.decoder.encoding_type() {
                            return Err(ReplayError::UnsupportedEncoding(rect.encoding));
                        }
                        debug!(
                            "Rectangle {}x{} at ({}, {})",
                            rect.width, rect.height, rect.x, rect.y
                        );
                        rect
                    }
                    None => return Ok(()),
                },
            };

            let status = self.decoder.decode(
                &rect,
                &mut self.queue,
                &session.header.pixel_format,
                &mut session.framebuffer,
            )?;

            match status {
                DecodeStatus::Complete => {
                    self.stats.rectangles += 1;
                    self.stats.pixels += rect.area() as u64;
                }
                DecodeStatus::NeedData => {
                    self.stats.need_data += 1;
                    self.pending = Some(rect);
                    return Ok(());
                }
            }
        }
    }

    /// End the replay at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Truncated`] if the input stopped inside the
    /// capture header, a rectangle header or a rectangle's data.
    pub fn finish(mut self) -> Result<Replay, ReplayError> {
        let Some(session) = self.session.take() else {
            return Err(ReplayError::Truncated(format!(
                "capture header ({} bytes)",
                self.queue.available()
            )));
        };
        if let Some(rect) = self.pending {
            return Err(ReplayError::Truncated(format!(
                "data of {}x{} rectangle at ({}, {})",
                rect.width, rect.height, rect.x, rect.y
            )));
        }
        if !self.queue.is_empty() {
            return Err(ReplayError::Truncated(format!(
                "rectangle header ({} of {} bytes)",
                self.queue.available(),
                Rectangle::WIRE_SIZE
            )));
        }

        self.stats.bytes = self.queue.total_received();
        self.stats.elapsed = self.started.elapsed();

        Ok(Replay {
            header: session.header,
            framebuffer: session.framebuffer,
            stats: self.stats,
        })
    }
}

/// Replay the capture at `path`, writing the final framebuffer to the
/// configured output if there is one.
///
/// # Errors
///
/// Returns an error if the capture cannot be read or decoded, or the PNG
/// cannot be written.
pub async fn replay_file(path: &Path, config: &Config) -> Result<Replay, ReplayError> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut replayer = Replayer::new(config);

    while replayer
        .feed_from(&mut file, config.replay.feed_chunk_size)
        .await?
        > 0
    {}

    let replay = replayer.finish()?;
    if let Some(output) = &config.replay.output {
        write_png(&replay.framebuffer, output)?;
        info!("Wrote {}", output.display());
    }
    Ok(replay)
}

/// Save a framebuffer as a PNG file.
///
/// # Errors
///
/// Returns an error if encoding or writing the image fails.
pub fn write_png(framebuffer: &ManagedPixelBuffer, path: &Path) -> Result<(), ReplayError> {
    let (width, height) = framebuffer.dimensions();
    let image = image::RgbaImage::from_raw(width, height, framebuffer.to_rgba()).ok_or_else(|| {
        ReplayError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("framebuffer does not hold {}x{} pixels", width, height),
        ))
    })?;
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}
