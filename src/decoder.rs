use crate::frame::Frame;
use crate::{PlayerError, Result};
use ffmpeg_next as ffmpeg;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Frame rate assumed when a stream does not report a usable one
pub const FALLBACK_FPS: f64 = 25.0;

/// A decoded RGB24 frame stream.
///
/// Opening the stream is the constructor's job; after that the playback loop
/// owns the source exclusively and calls [`FrameSource::close`] exactly once.
pub trait FrameSource {
    /// Next decoded frame, or `None` at end of stream
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Frames per second reported by the source
    fn frame_rate(&self) -> f64;

    /// Width and height of the frames this source produces
    fn dimensions(&self) -> (u32, u32);

    /// Release decoder resources
    fn close(&mut self);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }

    fn frame_rate(&self) -> f64 {
        (**self).frame_rate()
    }

    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

struct FfmpegStream {
    input_context: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: Option<ffmpeg::software::scaling::Context>,
    eof_sent: bool,
}

/// Video decoder backed by FFmpeg, producing RGB24 frames
pub struct FfmpegDecoder {
    path: PathBuf,
    stream: Option<FfmpegStream>,
    fps: f64,
    width: u32,
    height: u32,
    frame_count: u64,
}

impl FfmpegDecoder {
    /// Open `path` and prepare a decoder for its best video stream
    pub fn open(path: &Path) -> Result<Self> {
        let init_error = |reason: String| PlayerError::DecoderInit {
            path: path.to_path_buf(),
            reason,
        };

        if let Err(e) = ffmpeg::init() {
            // Registration failures are not always fatal; opening the input decides
            debug!("FFmpeg init error: {:?}", e);
        }

        debug!("Attempting to open video file: {}", path.display());
        let input_context = ffmpeg::format::input(&path).map_err(|e| init_error(e.to_string()))?;

        let stream = input_context
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| init_error("no video stream found".to_string()))?;
        let stream_index = stream.index();

        let context_decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| init_error(format!("failed to create codec context: {}", e)))?;
        let decoder = context_decoder
            .decoder()
            .video()
            .map_err(|e| init_error(format!("failed to create video decoder: {}", e)))?;

        let rate = stream.avg_frame_rate();
        let fps = if rate.denominator() != 0 && rate.numerator() > 0 {
            f64::from(rate.numerator()) / f64::from(rate.denominator())
        } else {
            warn!("Stream reports no frame rate, assuming {} FPS", FALLBACK_FPS);
            FALLBACK_FPS
        };

        let (width, height) = (decoder.width(), decoder.height());
        if width == 0 || height == 0 {
            return Err(init_error("video stream has no frame size".to_string()));
        }

        info!(
            "Opened video stream {} of '{}': {}x{}, {:.2} FPS",
            stream_index,
            path.display(),
            width,
            height,
            fps
        );

        Ok(Self {
            path: path.to_path_buf(),
            stream: Some(FfmpegStream {
                input_context,
                stream_index,
                decoder,
                scaler: None,
                eof_sent: false,
            }),
            fps,
            width,
            height,
            frame_count: 0,
        })
    }

    /// Number of frames decoded so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl FfmpegStream {
    fn decode_next(&mut self) -> std::result::Result<Option<ffmpeg::frame::Video>, ffmpeg::Error> {
        let mut decoded = ffmpeg::frame::Video::empty();

        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => return Ok(Some(decoded)),
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::ffi::EAGAIN => {}
                Err(e) => return Err(e),
            }

            // Decoder wants more input
            if self.eof_sent {
                return Ok(None);
            }

            let mut fed = false;
            for (stream, packet) in self.input_context.packets() {
                if stream.index() == self.stream_index {
                    self.decoder.send_packet(&packet)?;
                    fed = true;
                    break;
                }
            }

            if !fed {
                self.decoder.send_eof()?;
                self.eof_sent = true;
            }
        }
    }

    fn to_rgb(&mut self, frame: &ffmpeg::frame::Video) -> Result<Frame> {
        let (width, height) = (frame.width(), frame.height());

        let stale = self.scaler.as_ref().map_or(true, |scaler| {
            !scaler_matches(scaler.input(), frame.format(), width, height)
        });

        if stale {
            if self.scaler.is_some() {
                info!(
                    "Stream changed to {}x{} ({:?}), rebuilding RGB converter",
                    width,
                    height,
                    frame.format()
                );
            }
            let scaler = ffmpeg::software::scaling::Context::get(
                frame.format(),
                width,
                height,
                ffmpeg::format::Pixel::RGB24,
                width,
                height,
                ffmpeg::software::scaling::Flags::BILINEAR,
            )
            .map_err(|e| PlayerError::Decode(format!("failed to create scaling context: {}", e)))?;
            self.scaler = Some(scaler);
        }

        let mut rgb_frame = ffmpeg::frame::Video::empty();
        if let Some(ref mut scaler) = self.scaler {
            scaler
                .run(frame, &mut rgb_frame)
                .map_err(|e| PlayerError::Decode(format!("failed to convert frame to RGB: {}", e)))?;
        }

        // Keep FFmpeg's row padding; Frame addresses pixels through the stride
        let stride = rgb_frame.stride(0);
        let data = rgb_frame.data(0).to_vec();
        Ok(Frame::new(width, height, stride, data)?)
    }
}

/// Whether a scaler built for `input` can convert a frame with this layout
fn scaler_matches(
    input: &ffmpeg::software::scaling::context::Definition,
    format: ffmpeg::format::Pixel,
    width: u32,
    height: u32,
) -> bool {
    input.format == format && input.width == width && input.height == height
}

impl FrameSource for FfmpegDecoder {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };

        let decoded = stream
            .decode_next()
            .map_err(|e| PlayerError::Decode(format!("failed to decode frame: {}", e)))?;

        match decoded {
            Some(video) => {
                let frame = stream.to_rgb(&video)?;
                self.frame_count += 1;
                debug!(
                    "Decoded frame {}: {}x{}",
                    self.frame_count,
                    frame.width(),
                    frame.height()
                );
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!(
                "Closed decoder for '{}' after {} frames",
                self.path.display(),
                self.frame_count
            );
        }
    }
}

/// A still picture presented as a stream of identical frames
pub struct StillImageSource {
    frame: Frame,
    remaining: u32,
    fps: f64,
    closed: bool,
}

impl StillImageSource {
    /// Load an image file; it is yielded once before end of stream
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path).map_err(|e| PlayerError::DecoderInit {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let frame = Frame::packed(width, height, rgb.into_raw())?;

        info!("Opened still image '{}': {}x{}", path.display(), width, height);
        Ok(Self::from_frame(frame, 1, FALLBACK_FPS))
    }

    /// Yield `frame` `repeat` times at `fps`
    pub fn from_frame(frame: Frame, repeat: u32, fps: f64) -> Self {
        Self {
            frame,
            remaining: repeat,
            fps,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl FrameSource for StillImageSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.closed || self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(self.frame.clone()))
    }

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.frame.width(), self.frame.height())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Open a media source, using the image decoder for still picture formats
/// and FFmpeg for everything else
pub fn open_source(path: &Path) -> Result<Box<dyn FrameSource>> {
    if !path.exists() {
        return Err(PlayerError::DecoderInit {
            path: path.to_path_buf(),
            reason: "file does not exist".to_string(),
        });
    }

    if image::ImageFormat::from_path(path).is_ok() {
        debug!("Treating '{}' as a still image", path.display());
        Ok(Box::new(StillImageSource::open(path)?))
    } else {
        Ok(Box::new(FfmpegDecoder::open(path)?))
    }
}
