//! Term Video - play video streams as grayscale glyphs or truecolor blocks in the terminal
//!
//! Each decoded RGB frame is box-filtered down to a character grid, rendered
//! to text, and paced by a playback loop that reacts to pause and speed keys.

pub mod cli;
pub mod config;
pub mod decoder;
pub mod downsample;
pub mod frame;
pub mod input;
pub mod playback;
pub mod renderer;
pub mod terminal;

use std::path::PathBuf;

pub use cli::{Cli, RampPreset, SessionSettings};
pub use config::PlayerConfig;
pub use decoder::{open_source, FfmpegDecoder, FrameSource, StillImageSource};
pub use downsample::{downsample, DownsampleError, DownsampleTarget};
pub use frame::{Frame, FrameError};
pub use input::{CrosstermKeys, Key, KeySource, NoKeys, ScriptedKeys};
pub use playback::{
    base_delay_micros, PlaybackController, PlaybackState, PlaybackSummary, StopReason,
};
pub use renderer::{render_grayscale, render_truecolor, GlyphRamp, RenderMode, Renderer};
pub use terminal::{FrameSink, RawModeGuard, TerminalSink};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default ASCII character ramp for luminance mapping
pub const DEFAULT_ASCII_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Extended ASCII character ramp with more granular detail
pub const EXTENDED_ASCII_RAMP: &[char] = &[
    ' ', '`', '.', '\'', '^', '"', ',', ':', ';', 'I', 'l', '!', 'i', '>', '<',
    '~', '+', '_', '-', '?', ']', '[', '}', '{', '1', ')', '(', '|', '\\', '/',
    't', 'f', 'j', 'r', 'x', 'n', 'u', 'v', 'c', 'z', 'X', 'Y', 'U', 'J', 'C',
    'L', 'Q', '0', 'O', 'Z', 'm', 'w', 'q', 'p', 'd', 'b', 'k', 'h', 'a', 'o',
    '*', '#', 'M', 'W', '&', '8', '%', 'B', '@',
];

/// Shade block ramp for a more solid appearance
pub const BLOCK_ASCII_RAMP: &[char] = &[' ', '░', '▒', '▓', '█'];

/// Error types used throughout the application
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigFile(#[from] serde_json::Error),

    #[error("Failed to open '{}': {reason}", .path.display())]
    DecoderInit { path: PathBuf, reason: String },

    #[error("Video decoding error: {0}")]
    Decode(String),

    #[error(transparent)]
    Downsample(#[from] DownsampleError),

    #[error("Invalid frame: {0}")]
    Frame(#[from] FrameError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        base_delay_micros, downsample, open_source, render_grayscale, render_truecolor, Cli,
        DownsampleError, DownsampleTarget, Frame, FrameSink, FrameSource, GlyphRamp, Key,
        KeySource, NoKeys, PlaybackController, PlaybackState, PlaybackSummary, PlayerConfig,
        PlayerError, RenderMode, Renderer, Result, ScriptedKeys, StillImageSource, StopReason,
        TerminalSink,
    };
}
