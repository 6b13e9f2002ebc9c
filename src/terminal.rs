use crate::Result;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Print, ResetColor},
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use log::debug;
use std::io::Write;

/// Destination for rendered frames
pub trait FrameSink {
    fn present(&mut self, text: &str) -> Result<()>;
}

impl<T: FrameSink + ?Sized> FrameSink for &mut T {
    fn present(&mut self, text: &str) -> Result<()> {
        (**self).present(text)
    }
}

/// Collects frames in memory
impl FrameSink for Vec<String> {
    fn present(&mut self, text: &str) -> Result<()> {
        self.push(text.to_string());
        Ok(())
    }
}

/// Writes frames to a terminal-like writer
pub struct TerminalSink<W: Write> {
    out: W,
    clear_screen: bool,
    raw_mode: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self {
            out,
            clear_screen,
            raw_mode: false,
        }
    }

    /// Raw mode disables the terminal's newline translation, so rows are
    /// written with an explicit carriage return
    pub fn with_raw_mode(mut self, raw_mode: bool) -> Self {
        self.raw_mode = raw_mode;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for TerminalSink<W> {
    fn present(&mut self, text: &str) -> Result<()> {
        if self.clear_screen {
            queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        }

        if self.raw_mode {
            queue!(self.out, Print(text.replace('\n', "\r\n")))?;
        } else {
            queue!(self.out, Print(text))?;
        }

        self.out.flush()?;
        Ok(())
    }
}

/// Puts the terminal in raw mode with a hidden cursor until dropped
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    pub fn enable() -> Result<Self> {
        enable_raw_mode()?;
        execute!(std::io::stdout(), Hide, Clear(ClearType::All))?;
        debug!("Terminal switched to raw mode");
        Ok(Self { active: true })
    }

    /// Restore the terminal; later calls are no-ops
    pub fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        execute!(std::io::stdout(), Show, ResetColor)?;
        disable_raw_mode()?;
        debug!("Terminal restored to normal state");
        Ok(())
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Ensure terminal is restored on every exit path
        let _ = self.restore();
    }
}
