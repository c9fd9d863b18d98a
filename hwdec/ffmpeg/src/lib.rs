/*!
    FFmpeg backend for hardware video decoding.

    Implements [`DecodeBackend`] and [`ScaleBackend`] on top of libavcodec,
    libavutil and libswscale. The wrappers in this crate own their FFmpeg
    objects and free them on drop; nothing here keeps process-wide state
    apart from FFmpeg's own log level.

    ```ignore
    use hwdec_ffmpeg::FfmpegBackend;

    let backend = FfmpegBackend::new()?;
    for name in hwdec_ffmpeg::available_device_types() {
        println!("{name}");
    }
    ```
*/

use ffmpeg_next::util::log::{self, Level};

use hwdec_types::{BackendError, BackendResult};

mod backend;
mod codec;
mod format;
mod hw;
mod parser;
mod scale;

pub use codec::CodecContext;
pub use ffmpeg_next::util::frame::video::Video as Frame;
pub use hw::DeviceContext;
pub use parser::ParserContext;
pub use scale::ScalingContext;

/**
    Handle to the FFmpeg libraries.

    Constructing one initializes FFmpeg; the handle itself is stateless and
    can be cloned freely.
*/
#[derive(Clone, Debug)]
pub struct FfmpegBackend {
    _private: (),
}

impl FfmpegBackend {
    pub fn new() -> BackendResult<Self> {
        ffmpeg_next::init().map_err(|e| BackendError::new(e.to_string()))?;
        Ok(Self { _private: () })
    }
}

/**
    Silence (or restore) FFmpeg's own log output for the whole process.
*/
pub fn set_quiet(quiet: bool) {
    log::set_level(if quiet { Level::Quiet } else { Level::Info });
}

/**
    Names of the hardware device types this FFmpeg build supports.
*/
pub fn available_device_types() -> Vec<String> {
    hw::device_types().into_iter().map(hw::type_name).collect()
}

/// Converts a negative FFmpeg return code into a [`BackendError`].
pub(crate) fn av_error(code: i32) -> BackendError {
    BackendError::new(ffmpeg_next::Error::from(code).to_string())
}
