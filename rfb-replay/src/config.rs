//! Configuration for the replay tool.
//!
//! Loaded from a TOML file with optional `[decoder]` and `[replay]` tables,
//! then overridden by command-line arguments:
//!
//! ```toml
//! [decoder]
//! initial_chunk_size = 10241
//! adaptive_chunk_sizing = true
//! reject_trailing_data = false
//!
//! [replay]
//! feed_chunk_size = 4096
//! output = "frame.png"
//! ```

use crate::args::Args;
use crate::errors::ReplayError;
use rfb_encodings::DecoderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete replay configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decoder settings.
    pub decoder: DecoderConfig,
    /// Replay settings.
    pub replay: ReplayConfig,
}

/// How the capture is fed to the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Bytes read from the capture and queued per step. Small values
    /// exercise the decoder's resumption paths.
    pub feed_chunk_size: usize,
    /// PNG file to write the final framebuffer to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

fn default_feed_chunk_size() -> usize {
    4096
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            feed_chunk_size: default_feed_chunk_size(),
            output: None,
        }
    }
}

impl Config {
    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| {
            ReplayError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Build the configuration for a run: the config file named in `args`
    /// (if any), overridden by explicit arguments, then validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the result
    /// is invalid.
    pub fn from_args(args: &Args) -> Result<Self, ReplayError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(chunk_size) = args.chunk_size {
            config.replay.feed_chunk_size = chunk_size;
        }
        if let Some(output) = &args.output {
            config.replay.output = Some(output.clone());
        }
        if args.strict {
            config.decoder.reject_trailing_data = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), ReplayError> {
        self.decoder.validate().map_err(ReplayError::Config)?;

        if self.replay.feed_chunk_size == 0 {
            return Err(ReplayError::Config(
                "feed_chunk_size cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}
