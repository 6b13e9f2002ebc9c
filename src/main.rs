use term_video::decoder::{open_source, FrameSource};
use term_video::input::{CrosstermKeys, KeySource, NoKeys};
use term_video::playback::{base_delay_micros, PlaybackController, StopReason};
use term_video::terminal::{RawModeGuard, TerminalSink};
use term_video::{Cli, PlayerConfig, Renderer};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    cli.log_builder().init();

    // Validate CLI arguments before touching the decoder
    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    let config = match cli.config {
        Some(ref path) => match PlayerConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
        None => PlayerConfig::default(),
    };

    let settings = match cli.settings(&config) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!("Starting term-video v{}", term_video::VERSION);
    info!("Playing: {}", settings.source.display());

    let mut source = match open_source(&settings.source) {
        Ok(source) => source,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let (width, height) = source.dimensions();
    let fps = source.frame_rate();
    let base_delay = base_delay_micros(settings.delay_override_secs, fps);

    if cli.info {
        println!("Source Information:");
        println!("  File: {}", settings.source.display());
        println!("  Dimensions: {}x{}", width, height);
        println!("  Frame Rate: {:.2} FPS", fps);
        println!("  Frame Delay: {} us", base_delay);
        source.close();
        return Ok(());
    }

    // Pre-flight: reject grids larger than the source before the terminal changes mode
    if let Err(e) = settings.target.validate_for(width, height) {
        source.close();
        error!("{}", e);
        std::process::exit(1);
    }

    let interactive = atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout);
    if !interactive {
        warn!("Not attached to a terminal; keyboard controls are disabled");
    }

    let mut guard = if interactive {
        match RawModeGuard::enable() {
            Ok(guard) => Some(guard),
            Err(e) => {
                source.close();
                return Err(e).context("failed to prepare terminal");
            }
        }
    } else {
        None
    };

    let keys: Box<dyn KeySource> = if interactive {
        Box::new(CrosstermKeys::new())
    } else {
        Box::new(NoKeys)
    };

    let sink = TerminalSink::new(std::io::stdout(), settings.clear_screen).with_raw_mode(interactive);
    let renderer = Renderer::new(settings.mode, settings.ramp.clone());

    let player = PlaybackController::new(source, keys, sink, renderer, settings.target, base_delay)
        .with_pause_poll(settings.pause_poll);

    let outcome = player.run().await;

    // Restore the terminal before reporting anything
    if let Some(ref mut guard) = guard {
        guard.restore().context("failed to restore terminal")?;
    }

    match outcome {
        Ok(summary) => {
            match summary.stop_reason {
                StopReason::EndOfStream => info!("Playback completed"),
                StopReason::Quit => info!("Playback stopped by user"),
            }
            info!("Total frames: {}", summary.frames_rendered);
            Ok(())
        }
        Err(e) => {
            error!("Playback error: {}", e);
            std::process::exit(1);
        }
    }
}
