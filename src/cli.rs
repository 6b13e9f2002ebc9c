use crate::config::PlayerConfig;
use crate::downsample::DownsampleTarget;
use crate::renderer::{GlyphRamp, RenderMode};
use crate::{Result, BLOCK_ASCII_RAMP, DEFAULT_ASCII_RAMP, EXTENDED_ASCII_RAMP};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the media file to play
    #[arg(required = true)]
    pub file_path: PathBuf,

    /// Character grid to render into
    #[arg(
        short,
        long,
        required = true,
        num_args = 2,
        value_names = ["WIDTH", "HEIGHT"]
    )]
    pub resolution: Vec<u32>,

    /// Fixed delay between frames in seconds (default: derived from the frame rate)
    #[arg(short, long, value_name = "SECONDS")]
    pub delay: Option<u64>,

    /// Render 24-bit colored blocks instead of grayscale characters
    #[arg(short, long)]
    pub color: bool,

    /// Glyph ramp used in grayscale mode
    #[arg(long, value_enum)]
    pub ramp: Option<RampPreset>,

    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show source information only (don't play)
    #[arg(long)]
    pub info: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RampPreset {
    /// Ten ASCII characters from space to '@'
    Standard,
    /// Seventy ASCII characters for finer shading
    Extended,
    /// Unicode shade blocks
    Blocks,
}

impl RampPreset {
    pub fn glyphs(self) -> &'static [char] {
        match self {
            RampPreset::Standard => DEFAULT_ASCII_RAMP,
            RampPreset::Extended => EXTENDED_ASCII_RAMP,
            RampPreset::Blocks => BLOCK_ASCII_RAMP,
        }
    }
}

/// Everything a playback session needs, after merging flags and config file
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub source: PathBuf,
    pub target: DownsampleTarget,
    pub mode: RenderMode,
    pub ramp: GlyphRamp,
    pub delay_override_secs: Option<u64>,
    pub pause_poll: Duration,
    pub clear_screen: bool,
}

impl Cli {
    /// Validate command line arguments
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.file_path.exists() {
            return Err(format!("Media file does not exist: {}", self.file_path.display()));
        }

        match self.resolution.as_slice() {
            [width, height] => {
                if *width == 0 || *height == 0 {
                    return Err("Grid width and height must be greater than 0".to_string());
                }
            }
            _ => return Err("Resolution takes exactly two values: WIDTH HEIGHT".to_string()),
        }

        if self.delay == Some(0) {
            return Err("Delay must be greater than 0 seconds".to_string());
        }

        if let Some(ref path) = self.config {
            if !path.exists() {
                return Err(format!("Config file does not exist: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Logger configured from `RUST_LOG`, quiet by default so log lines don't tear frames
    pub fn log_builder(&self) -> env_logger::Builder {
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
        self.apply_verbosity(&mut builder);
        builder
    }

    /// `--verbose` wins over whatever level `RUST_LOG` asked for
    pub fn apply_verbosity(&self, builder: &mut env_logger::Builder) {
        if self.verbose {
            builder.filter_level(log::LevelFilter::Debug);
        }
    }

    /// Target grid; only meaningful after [`Cli::validate`]
    pub fn target(&self) -> DownsampleTarget {
        let width = self.resolution.first().copied().unwrap_or(0);
        let height = self.resolution.get(1).copied().unwrap_or(0);
        DownsampleTarget::new(width, height)
    }

    /// Merge flags over the config file values
    pub fn settings(&self, config: &PlayerConfig) -> Result<SessionSettings> {
        let ramp = match (self.ramp, config.ramp.as_deref()) {
            (Some(preset), _) => GlyphRamp::new(preset.glyphs().to_vec())?,
            (None, Some(custom)) => GlyphRamp::parse(custom)?,
            (None, None) => GlyphRamp::default(),
        };

        Ok(SessionSettings {
            source: self.file_path.clone(),
            target: self.target(),
            mode: RenderMode::from_color_flag(self.color || config.color),
            ramp,
            delay_override_secs: self.delay.or(config.delay_secs),
            pause_poll: Duration::from_millis(config.pause_poll_ms),
            clear_screen: config.clear_screen,
        })
    }
}
