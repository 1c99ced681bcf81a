use crate::capture::domain::camera_backend::{CameraBackend, LiveStream};
use crate::shared::frame::Frame;

const DEFAULT_FRAMERATE: u32 = 30;

/// Captures from a local camera through libavdevice (via ffmpeg-next).
///
/// The input format defaults to the platform's native capture API:
/// `v4l2` on Linux, `avfoundation` on macOS, `dshow` on Windows.
pub struct FfmpegCamera {
    device: String,
    input_format: String,
    width: u32,
    height: u32,
    framerate: u32,
}

impl FfmpegCamera {
    /// `width` x `height` is requested from the device; drivers may pick the
    /// nearest supported mode.
    pub fn new(device: impl Into<String>, input_format: Option<String>, width: u32, height: u32) -> Self {
        Self {
            device: device.into(),
            input_format: input_format.unwrap_or_else(|| default_input_format().to_string()),
            width,
            height,
            framerate: DEFAULT_FRAMERATE,
        }
    }
}

pub fn default_input_format() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "avfoundation"
    }
    #[cfg(target_os = "windows")]
    {
        "dshow"
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        "v4l2"
    }
}

/// libavdevice reports aliases as a comma-separated list, e.g. `video4linux2,v4l2`.
fn format_matches(reported: &str, wanted: &str) -> bool {
    reported.split(',').any(|name| name == wanted)
}

impl CameraBackend for FfmpegCamera {
    fn open(&mut self) -> Result<Box<dyn LiveStream>, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let format = ffmpeg_next::device::input::video()
            .find(|f| format_matches(f.name(), &self.input_format))
            .ok_or_else(|| format!("capture backend '{}' is not available", self.input_format))?;

        let mut options = ffmpeg_next::Dictionary::new();
        options.set("video_size", &format!("{}x{}", self.width, self.height));
        options.set("framerate", &self.framerate.to_string());

        let ictx = ffmpeg_next::format::open_with(&self.device, &format, options)?.input();

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("Camera exposes no video stream")?;
        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Opened {} ({}) at {width}x{height}",
            self.device,
            self.input_format
        );

        Ok(Box::new(FfmpegLiveStream {
            ictx,
            decoder,
            scaler,
            video_stream_index,
            width,
            height,
        }))
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.device, self.input_format)
    }
}

struct FfmpegLiveStream {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    width: u32,
    height: u32,
}

// Safety: the stream is owned by one CaptureSource and used from one thread
// at a time. The raw pointers inside ffmpeg types are not shared.
unsafe impl Send for FfmpegLiveStream {}

impl LiveStream for FfmpegLiveStream {
    fn read_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        let Self {
            ictx,
            decoder,
            scaler,
            video_stream_index,
            width,
            height,
        } = self;

        for (stream, packet) in ictx.packets() {
            if stream.index() != *video_stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
            if decoder.receive_frame(&mut decoded).is_ok() {
                let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
                scaler.run(&decoded, &mut rgb_frame)?;
                let pixels = extract_rgb_pixels(&rgb_frame, *width, *height);
                return Ok(Frame::new(pixels, *width, *height, 3, 0));
            }
        }
        Err("camera stream ended".into())
    }
}

fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
