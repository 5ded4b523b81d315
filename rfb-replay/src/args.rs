//! Command-line argument parsing for the replay tool.
//!
//! # Examples
//!
//! ```
//! use rfb_replay::args::Args;
//!
//! let args = Args::try_parse_from(["rfb-replay", "session.zrle", "-o", "out.png", "-vv"]).unwrap();
//! assert_eq!(args.verbose, 2);
//! assert!(args.output.is_some());
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Replay a captured ZRLE stream and render the final framebuffer.
#[derive(Parser, Debug, Clone)]
#[command(name = "rfb-replay", author, version, about, long_about = None)]
pub struct Args {
    /// Capture file to replay
    #[arg(value_name = "CAPTURE")]
    pub capture: PathBuf,

    /// Configuration file path (TOML format)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bytes read from the capture and queued per step
    #[arg(long, value_name = "BYTES")]
    pub chunk_size: Option<usize>,

    /// Write the final framebuffer to this PNG file
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Fail on decompressed bytes left over after a rectangle
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose logging (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Parse command-line arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse arguments from an iterator.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are invalid.
    pub fn try_parse_from<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Default log filter for the verbosity level.
    pub fn log_filter(&self) -> String {
        let level = match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        format!("rfb_replay={level},rfb_encodings={level}")
    }
}
