/*!
    Pixel format conversion for decoded frames.

    Decoders hand out frames in whatever surface layout the hardware
    produced (NV12, YUV 4:2:0, P010, ...). This crate converts them into a
    single packed destination layout, BGR24, written into a buffer the
    caller owns and sizes with [`ColorConverter::predict_size`].

    ```ignore
    use hwdec_convert::{ColorConverter, ConverterConfig};

    let mut converter = ColorConverter::new(backend, ConverterConfig::default());
    let mut buffer = vec![0u8; converter.predict_size(frame.width, frame.height)?];
    let converted = converter.convert(&frame, &mut buffer)?;
    ```

    # Lazy Initialization

    The conversion context is created on the first call to `convert` and
    kept until a frame arrives whose width, height or source format
    differs, at which point it is rebuilt.
*/

pub use hwdec_types::{
    ConvertedFrame, DecodeStage, DecodedFrame, Error, PixelFormat, Result, ScaleBackend,
    ScalingAlgorithm,
};

mod config;
mod converter;

pub use config::ConverterConfig;
pub use converter::ColorConverter;
