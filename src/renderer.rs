use crate::frame::Frame;
use crate::{PlayerError, Result, DEFAULT_ASCII_RAMP};
use crossterm::style::{Color, ResetColor, SetForegroundColor};
use crossterm::Command;

/// Glyph drawn for every cell in truecolor mode
pub const BLOCK_GLYPH: char = '█';

/// How a downsampled frame is turned into text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// One density glyph per pixel, chosen by luma
    Grayscale,
    /// One 24-bit colored block per pixel
    Truecolor,
}

impl RenderMode {
    pub fn from_color_flag(color: bool) -> Self {
        if color {
            RenderMode::Truecolor
        } else {
            RenderMode::Grayscale
        }
    }
}

/// Ordered glyphs from least to most visually dense
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphRamp {
    glyphs: Vec<char>,
}

impl GlyphRamp {
    pub fn new(glyphs: Vec<char>) -> Result<Self> {
        if glyphs.len() < 2 {
            return Err(PlayerError::Config(format!(
                "glyph ramp needs at least 2 characters, got {}",
                glyphs.len()
            )));
        }
        Ok(Self { glyphs })
    }

    pub fn parse(ramp: &str) -> Result<Self> {
        Self::new(ramp.chars().collect())
    }

    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    pub fn darkest(&self) -> char {
        self.glyphs[0]
    }

    pub fn brightest(&self) -> char {
        self.glyphs[self.glyphs.len() - 1]
    }

    /// Glyph for a luma value in thousandths (see [`luma_milli`])
    pub fn glyph_for(&self, luma_milli: u32) -> char {
        self.glyphs[glyph_index(luma_milli, self.glyphs.len())]
    }
}

impl Default for GlyphRamp {
    fn default() -> Self {
        Self {
            glyphs: DEFAULT_ASCII_RAMP.to_vec(),
        }
    }
}

/// Rec. 601 luma `0.299R + 0.587G + 0.114B`, scaled by 1000 so it stays exact.
/// Ranges over `0..=255_000`.
pub fn luma_milli(r: u8, g: u8, b: u8) -> u32 {
    299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b)
}

/// `floor((n - 1) * L / 255)` clamped to the ramp
pub fn glyph_index(luma_milli: u32, ramp_len: usize) -> usize {
    let last = ramp_len.saturating_sub(1);
    let index = (last as u64 * u64::from(luma_milli) / 255_000) as usize;
    index.min(last)
}

/// One glyph per pixel, newline after each row
pub fn render_grayscale(frame: &Frame, ramp: &GlyphRamp) -> String {
    let cells = frame.width() as usize * frame.height() as usize;
    let mut out = String::with_capacity(cells + frame.height() as usize);

    for y in 0..frame.height() {
        for px in frame.row(y).chunks_exact(3) {
            out.push(ramp.glyph_for(luma_milli(px[0], px[1], px[2])));
        }
        out.push('\n');
    }

    out
}

/// `ESC[38;2;R;G;Bm█` per pixel, `ESC[0m` and a newline after each row
pub fn render_truecolor(frame: &Frame) -> String {
    // Longest cell is "\x1b[38;2;255;255;255m█" at 22 bytes
    let cells = frame.width() as usize * frame.height() as usize;
    let mut out = String::with_capacity(cells * 22 + frame.height() as usize * 5);

    for y in 0..frame.height() {
        for px in frame.row(y).chunks_exact(3) {
            let color = Color::Rgb {
                r: px[0],
                g: px[1],
                b: px[2],
            };
            push_ansi(&mut out, SetForegroundColor(color));
            out.push(BLOCK_GLYPH);
        }
        push_ansi(&mut out, ResetColor);
        out.push('\n');
    }

    out
}

fn push_ansi(out: &mut String, command: impl Command) {
    // Formatting into a String cannot fail
    let _ = command.write_ansi(out);
}

/// Converts downsampled frames into printable text blocks
#[derive(Debug, Clone)]
pub struct Renderer {
    mode: RenderMode,
    ramp: GlyphRamp,
}

impl Renderer {
    pub fn new(mode: RenderMode, ramp: GlyphRamp) -> Self {
        Self { mode, ramp }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn ramp(&self) -> &GlyphRamp {
        &self.ramp
    }

    pub fn render(&self, frame: &Frame) -> String {
        match self.mode {
            RenderMode::Grayscale => render_grayscale(frame, &self.ramp),
            RenderMode::Truecolor => render_truecolor(frame),
        }
    }
}
