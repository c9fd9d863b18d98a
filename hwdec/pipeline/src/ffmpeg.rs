use hwdec_convert::{ColorConverter, ConverterConfig};
use hwdec_decode::{DecoderConfig, HardwareDecodeSession};
use hwdec_ffmpeg::FfmpegBackend;
use hwdec_types::{Error, Result};

use crate::pipeline::Pipeline;

pub type FfmpegSession = HardwareDecodeSession<FfmpegBackend>;
pub type FfmpegConverter = ColorConverter<FfmpegBackend>;
pub type FfmpegPipeline = Pipeline<FfmpegBackend, FfmpegBackend>;

/**
    Open an FFmpeg pipeline for `codec` (e.g. `h264`, `hevc`) on the
    hardware device type named `device` (e.g. `cuda`, `vaapi`).
*/
pub fn open(codec: &str, device: &str) -> Result<FfmpegPipeline> {
    open_with(&DecoderConfig::new(codec, device), ConverterConfig::default())
}

pub fn open_with(config: &DecoderConfig, converter: ConverterConfig) -> Result<FfmpegPipeline> {
    let backend = FfmpegBackend::new().map_err(|e| Error::backend_init("initialize ffmpeg", e))?;
    Pipeline::open(backend.clone(), backend, config, converter)
}
