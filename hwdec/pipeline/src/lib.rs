/*!
    Hardware decode pipeline.

    Ties a [`HardwareDecodeSession`] to a [`ColorConverter`]: raw stream
    bytes go in, owned BGR24 frames come out. This is the shape most
    callers want when they do not need to manage output buffers or frame
    lifetimes themselves.

    ```ignore
    let mut pipeline = hwdec_pipeline::open("h264", "cuda")?;
    for chunk in stream.chunks(1024) {
        for frame in pipeline.push(chunk)? {
            show(&frame.data, frame.width, frame.height, frame.stride);
        }
    }
    for frame in pipeline.finish()? {
        show(&frame.data, frame.width, frame.height, frame.stride);
    }
    ```
*/

pub use hwdec_convert::{ColorConverter, ConverterConfig};
pub use hwdec_decode::{BitstreamParser, DecoderConfig, HardwareDecodeSession, HwDevice};
pub use hwdec_types::{
    CodecId, ConvertedFrame, DecodeBackend, DecodeStage, DecodedFrame, Error, InitError,
    PixelFormat, Residency, Result, ScaleBackend, ScalingAlgorithm,
};

mod frame;
mod pipeline;

#[cfg(feature = "ffmpeg")]
mod ffmpeg;

pub use frame::RgbFrame;
pub use pipeline::Pipeline;

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegConverter, FfmpegPipeline, FfmpegSession, open, open_with};
#[cfg(feature = "ffmpeg")]
pub use hwdec_ffmpeg::{FfmpegBackend, available_device_types, set_quiet};
