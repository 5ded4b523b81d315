//! Offline replay of captured ZRLE sessions.
//!
//! A capture holds the framebuffer geometry, the server pixel format and
//! the rectangles a server sent, byte for byte. Replaying one drives
//! [`rfb_encodings::ZrleDecoder`] exactly as a live connection would, with
//! data arriving in configurable pieces, and renders the final framebuffer.
//!
//! # Quick Start
//!
//! ```no_run
//! use rfb_replay::{replay_file, Config};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let replay = replay_file(Path::new("session.zrle"), &Config::default()).await?;
//!     println!("{}", replay.stats);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`capture`] - Capture file layout and an in-memory writer
//! - [`replay`] - [`Replayer`] and [`replay_file`]
//! - [`config`] - TOML configuration with command-line overrides
//! - [`args`] - Command-line arguments
//! - [`errors`] - [`ReplayError`]

pub mod args;
pub mod capture;
pub mod config;
pub mod errors;
pub mod replay;

pub use capture::{CaptureHeader, CaptureWriter};
pub use config::{Config, ReplayConfig};
pub use errors::ReplayError;
pub use replay::{replay_file, write_png, Replay, ReplayStats, Replayer};
