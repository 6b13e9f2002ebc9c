use crate::decoder::FrameSource;
use crate::downsample::{downsample, DownsampleTarget};
use crate::input::{Key, KeySource};
use crate::renderer::Renderer;
use crate::terminal::FrameSink;
use crate::Result;
use log::{debug, info, warn};
use std::time::Duration;

/// Key that toggles between playing and paused
pub const PAUSE_KEY: char = ' ';

/// Key that doubles playback speed
pub const SPEED_UP_KEY: char = 'a';

/// Key that ends the session
pub const QUIT_KEY: char = 'q';

/// Playback command decoded from a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    SpeedUp,
    Quit,
}

/// Map a key to the command it triggers, if any
pub fn command_for(key: Key) -> Option<Command> {
    match key {
        Key::Char(PAUSE_KEY) => Some(Command::TogglePause),
        Key::Char(SPEED_UP_KEY) => Some(Command::SpeedUp),
        Key::Char(QUIT_KEY) | Key::Escape | Key::Interrupt => Some(Command::Quit),
        Key::Char(_) => None,
    }
}

/// Microseconds between frames: a whole-second override, or one frame period
/// at the source frame rate. Rates that are not positive fall back to
/// [`crate::decoder::FALLBACK_FPS`].
pub fn base_delay_micros(override_secs: Option<u64>, fps: f64) -> u64 {
    if let Some(secs) = override_secs {
        return secs.saturating_mul(1_000_000);
    }

    let fps = if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        warn!(
            "Invalid frame rate {}, falling back to {} FPS",
            fps,
            crate::decoder::FALLBACK_FPS
        );
        crate::decoder::FALLBACK_FPS
    };

    (1_000_000.0 / fps) as u64
}

/// Pause flag and speed for one playback session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    paused: bool,
    speed_multiplier: u64,
    base_delay_micros: u64,
}

impl PlaybackState {
    pub fn new(base_delay_micros: u64) -> Self {
        Self {
            paused: false,
            speed_multiplier: 1,
            base_delay_micros,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn speed_multiplier(&self) -> u64 {
        self.speed_multiplier
    }

    pub fn base_delay_micros(&self) -> u64 {
        self.base_delay_micros
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Double the speed. There is no way back down; the multiplier saturates
    /// at `u64::MAX`, where the frame delay reaches zero.
    pub fn speed_up(&mut self) {
        self.speed_multiplier = self.speed_multiplier.saturating_mul(2);
    }

    /// Pacing sleep after a rendered frame
    pub fn frame_delay(&self) -> Duration {
        Duration::from_micros(self.base_delay_micros / self.speed_multiplier)
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    Quit,
}

/// Outcome of a completed session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub frames_rendered: u64,
    pub stop_reason: StopReason,
    pub final_state: PlaybackState,
}

/// Drives decode, downsample, render and pacing for a single session.
///
/// The controller owns its frame source and closes it exactly once when
/// [`PlaybackController::run`] returns, whatever the outcome.
pub struct PlaybackController<S, K, O> {
    source: S,
    keys: K,
    sink: O,
    renderer: Renderer,
    target: DownsampleTarget,
    state: PlaybackState,
    pause_poll: Duration,
}

impl<S, K, O> PlaybackController<S, K, O>
where
    S: FrameSource,
    K: KeySource,
    O: FrameSink,
{
    pub fn new(
        source: S,
        keys: K,
        sink: O,
        renderer: Renderer,
        target: DownsampleTarget,
        base_delay_micros: u64,
    ) -> Self {
        Self {
            source,
            keys,
            sink,
            renderer,
            target,
            state: PlaybackState::new(base_delay_micros),
            pause_poll: Duration::ZERO,
        }
    }

    /// Sleep between polls while paused. Zero busy-polls.
    pub fn with_pause_poll(mut self, pause_poll: Duration) -> Self {
        self.pause_poll = pause_poll;
        self
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Play until end of stream, a quit key or an error, then close the source
    pub async fn run(mut self) -> Result<PlaybackSummary> {
        let outcome = self.play().await;
        self.source.close();
        debug!("Frame source closed");

        let (frames_rendered, stop_reason) = outcome?;
        info!(
            "Playback finished after {} frames ({:?})",
            frames_rendered, stop_reason
        );

        Ok(PlaybackSummary {
            frames_rendered,
            stop_reason,
            final_state: self.state,
        })
    }

    async fn play(&mut self) -> Result<(u64, StopReason)> {
        let (width, height) = self.source.dimensions();
        self.target.validate_for(width, height)?;

        info!(
            "Starting playback: {}x{} -> {}x{}, {:?} mode, {}us per frame",
            width,
            height,
            self.target.width,
            self.target.height,
            self.renderer.mode(),
            self.state.base_delay_micros()
        );

        let mut frames_rendered = 0u64;

        loop {
            if let Some(key) = self.keys.poll_key()? {
                if let Some(command) = command_for(key) {
                    if self.apply(command) {
                        return Ok((frames_rendered, StopReason::Quit));
                    }
                }
            }

            if self.state.is_paused() {
                if !self.pause_poll.is_zero() {
                    tokio::time::sleep(self.pause_poll).await;
                }
                continue;
            }

            let Some(frame) = self.source.next_frame()? else {
                info!("End of stream");
                return Ok((frames_rendered, StopReason::EndOfStream));
            };

            let small = downsample(&frame, self.target)?;
            drop(frame);

            let text = self.renderer.render(&small);
            self.sink.present(&text)?;
            frames_rendered += 1;

            tokio::time::sleep(self.state.frame_delay()).await;
        }
    }

    /// Apply a command; returns true when the session should end
    fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::TogglePause => {
                self.state.toggle_pause();
                if self.state.is_paused() {
                    info!("Playback paused");
                } else {
                    info!("Playback resumed");
                }
                false
            }
            Command::SpeedUp => {
                self.state.speed_up();
                info!("Speed increased to {}x", self.state.speed_multiplier());
                false
            }
            Command::Quit => {
                info!("Quit requested by user");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downsample::DownsampleError;
    use crate::frame::Frame;
    use crate::input::ScriptedKeys;
    use crate::renderer::{GlyphRamp, RenderMode};
    use crate::PlayerError;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// In-memory source that counts close calls
    struct SyntheticSource {
        frames: VecDeque<Result<Frame>>,
        dimensions: (u32, u32),
        closes: Rc<Cell<u32>>,
    }

    impl SyntheticSource {
        fn uniform(count: usize, width: u32, height: u32, rgb: (u8, u8, u8)) -> (Self, Rc<Cell<u32>>) {
            let frames = (0..count)
                .map(|_| Ok(Frame::filled(width, height, rgb).unwrap()))
                .collect();
            let closes = Rc::new(Cell::new(0));
            let source = Self {
                frames,
                dimensions: (width, height),
                closes: closes.clone(),
            };
            (source, closes)
        }
    }

    impl FrameSource for SyntheticSource {
        fn next_frame(&mut self) -> Result<Option<Frame>> {
            self.frames.pop_front().transpose()
        }

        fn frame_rate(&self) -> f64 {
            1000.0
        }

        fn dimensions(&self) -> (u32, u32) {
            self.dimensions
        }

        fn close(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    fn grayscale() -> Renderer {
        Renderer::new(RenderMode::Grayscale, GlyphRamp::default())
    }

    fn controller(
        source: SyntheticSource,
        keys: ScriptedKeys,
        target: DownsampleTarget,
    ) -> PlaybackController<SyntheticSource, ScriptedKeys, Vec<String>> {
        PlaybackController::new(source, keys, Vec::new(), grayscale(), target, 100)
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(command_for(Key::Char(' ')), Some(Command::TogglePause));
        assert_eq!(command_for(Key::Char('a')), Some(Command::SpeedUp));
        assert_eq!(command_for(Key::Char('q')), Some(Command::Quit));
        assert_eq!(command_for(Key::Escape), Some(Command::Quit));
        assert_eq!(command_for(Key::Interrupt), Some(Command::Quit));
        assert_eq!(command_for(Key::Char('x')), None);
    }

    #[test]
    fn test_playback_state_default() {
        let state = PlaybackState::new(40_000);
        assert!(!state.is_paused());
        assert_eq!(state.speed_multiplier(), 1);
        assert_eq!(state.frame_delay(), Duration::from_micros(40_000));
    }

    #[test]
    fn test_double_toggle_restores_state() {
        let mut state = PlaybackState::new(1_000);
        state.toggle_pause();
        assert!(state.is_paused());
        state.toggle_pause();
        assert!(!state.is_paused());
    }

    #[test]
    fn test_speed_doubles_regardless_of_pause() {
        let mut state = PlaybackState::new(1_000_000);
        state.speed_up();
        state.toggle_pause();
        state.speed_up();

        assert_eq!(state.speed_multiplier(), 4);
        assert_eq!(state.frame_delay(), Duration::from_micros(250_000));
    }

    #[test]
    fn test_speed_saturates() {
        let mut state = PlaybackState::new(1_000_000);
        for _ in 0..80 {
            state.speed_up();
        }
        assert_eq!(state.speed_multiplier(), u64::MAX);
        assert_eq!(state.frame_delay(), Duration::ZERO);
    }

    #[test]
    fn test_base_delay_from_fps_and_override() {
        assert_eq!(base_delay_micros(None, 25.0), 40_000);
        assert_eq!(base_delay_micros(None, 30.0), 33_333);
        assert_eq!(base_delay_micros(Some(2), 30.0), 2_000_000);
        assert_eq!(base_delay_micros(None, 0.0), 40_000);
        assert_eq!(base_delay_micros(None, f64::NAN), 40_000);
    }

    #[tokio::test]
    async fn test_plays_until_end_of_stream() {
        let (source, closes) = SyntheticSource::uniform(3, 8, 4, (255, 255, 255));
        let player = controller(source, ScriptedKeys::default(), DownsampleTarget::new(4, 2));

        let summary = player.run().await.unwrap();

        assert_eq!(summary.frames_rendered, 3);
        assert_eq!(summary.stop_reason, StopReason::EndOfStream);
        assert_eq!(closes.get(), 1);
    }

    #[tokio::test]
    async fn test_rendered_frames_reach_sink() {
        let (source, _closes) = SyntheticSource::uniform(2, 6, 6, (0, 0, 0));
        let mut frames: Vec<String> = Vec::new();
        {
            let player = PlaybackController::new(
                source,
                ScriptedKeys::default(),
                &mut frames,
                grayscale(),
                DownsampleTarget::new(3, 2),
                10,
            );
            player.run().await.unwrap();
        }

        assert_eq!(frames, vec!["   \n   \n".to_string(); 2]);
    }

    #[tokio::test]
    async fn test_paused_cycles_skip_frames() {
        let (source, closes) = SyntheticSource::uniform(2, 4, 4, (10, 10, 10));
        // pause, two idle paused polls, resume
        let keys = ScriptedKeys::new([
            Some(Key::Char(' ')),
            None,
            None,
            Some(Key::Char(' ')),
        ]);
        let player = controller(source, keys, DownsampleTarget::new(2, 2));

        let summary = player.run().await.unwrap();

        assert_eq!(summary.frames_rendered, 2);
        assert!(!summary.final_state.is_paused());
        assert_eq!(closes.get(), 1);
    }

    #[tokio::test]
    async fn test_speed_key_scales_delay() {
        let (source, _closes) = SyntheticSource::uniform(3, 4, 4, (10, 10, 10));
        let keys = ScriptedKeys::new([Some(Key::Char('a')), Some(Key::Char('a'))]);
        let player = controller(source, keys, DownsampleTarget::new(1, 1));

        let summary = player.run().await.unwrap();

        assert_eq!(summary.final_state.speed_multiplier(), 4);
        assert_eq!(summary.final_state.frame_delay(), Duration::from_micros(25));
    }

    #[tokio::test]
    async fn test_quit_key_stops_early() {
        let (source, closes) = SyntheticSource::uniform(10, 4, 4, (10, 10, 10));
        let keys = ScriptedKeys::new([None, Some(Key::Char('q'))]);
        let player = controller(source, keys, DownsampleTarget::new(2, 2));

        let summary = player.run().await.unwrap();

        assert_eq!(summary.frames_rendered, 1);
        assert_eq!(summary.stop_reason, StopReason::Quit);
        assert_eq!(closes.get(), 1);
    }

    #[tokio::test]
    async fn test_degenerate_target_fails_before_first_frame() {
        let (source, closes) = SyntheticSource::uniform(2, 4, 4, (10, 10, 10));
        let mut frames: Vec<String> = Vec::new();
        let result = {
            let player = PlaybackController::new(
                source,
                ScriptedKeys::default(),
                &mut frames,
                grayscale(),
                DownsampleTarget::new(5, 2),
                10,
            );
            player.run().await
        };

        assert!(matches!(
            result,
            Err(PlayerError::Downsample(DownsampleError::DegenerateBlock { .. }))
        ));
        assert!(frames.is_empty());
        assert_eq!(closes.get(), 1);
    }

    #[tokio::test]
    async fn test_frame_shrinking_mid_stream_is_degenerate() {
        let (mut source, closes) = SyntheticSource::uniform(1, 8, 8, (10, 10, 10));
        source
            .frames
            .push_back(Ok(Frame::filled(2, 2, (10, 10, 10)).unwrap()));
        let mut frames: Vec<String> = Vec::new();
        let result = {
            let player = PlaybackController::new(
                source,
                ScriptedKeys::default(),
                &mut frames,
                grayscale(),
                DownsampleTarget::new(4, 4),
                10,
            );
            player.run().await
        };

        assert!(matches!(
            result,
            Err(PlayerError::Downsample(DownsampleError::DegenerateBlock { .. }))
        ));
        assert_eq!(frames.len(), 1);
        assert_eq!(closes.get(), 1);
    }

    #[tokio::test]
    async fn test_decode_error_mid_stream_still_closes() {
        let (mut source, closes) = SyntheticSource::uniform(1, 4, 4, (10, 10, 10));
        source
            .frames
            .push_back(Err(PlayerError::Decode("corrupt packet".to_string())));
        let player = controller(source, ScriptedKeys::default(), DownsampleTarget::new(2, 2));

        let result = player.run().await;

        assert!(matches!(result, Err(PlayerError::Decode(_))));
        assert_eq!(closes.get(), 1);
    }

    #[tokio::test]
    async fn test_pause_poll_interval_is_used() {
        let (source, _closes) = SyntheticSource::uniform(1, 2, 2, (10, 10, 10));
        let keys = ScriptedKeys::new([Some(Key::Char(' ')), None, Some(Key::Char(' '))]);
        let player = controller(source, keys, DownsampleTarget::new(1, 1))
            .with_pause_poll(Duration::from_millis(5));

        let started = std::time::Instant::now();
        let summary = player.run().await.unwrap();

        assert_eq!(summary.frames_rendered, 1);
        assert!(started.elapsed() >= Duration::from_millis(10));
    }
}
