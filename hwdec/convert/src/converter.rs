use tracing::debug;

use hwdec_types::{
    ConvertedFrame, DecodeStage, DecodedFrame, Error, Result, ScaleBackend, ScalerKey,
};

use crate::config::ConverterConfig;

/**
    Converts decoded frames into packed BGR24.

    Holds at most one conversion context, keyed by source width, height and
    pixel format. The context is reused while the key stays the same.
*/
pub struct ColorConverter<B: ScaleBackend> {
    context: Option<(ScalerKey, B::Scaler)>,
    backend: B,
    config: ConverterConfig,
    contexts_created: u64,
}

impl<B: ScaleBackend> ColorConverter<B> {
    pub fn new(backend: B, config: ConverterConfig) -> Self {
        Self {
            context: None,
            backend,
            config,
            contexts_created: 0,
        }
    }

    /**
        Number of bytes a `width` x `height` frame occupies in the
        destination layout, rows packed at 1-byte alignment.

        Equals [`ConvertedFrame::byte_len`] of the frame `convert` writes
        for the same dimensions.
    */
    pub fn predict_size(&self, width: u32, height: u32) -> Result<usize> {
        self.backend
            .image_layout(ConverterConfig::DESTINATION, width, height)
            .map(|layout| layout.size)
            .map_err(|e| Error::decode(DecodeStage::Convert, e.message))
    }

    /**
        Convert `frame` into `output`.

        `output` must hold at least [`predict_size`](Self::predict_size)
        bytes for the frame's dimensions; only that prefix is written.
        Frames whose planes do not cover their geometry are rejected
        before they reach the backend.
    */
    pub fn convert(&mut self, frame: &DecodedFrame<'_>, output: &mut [u8]) -> Result<ConvertedFrame> {
        let layout = self
            .backend
            .image_layout(ConverterConfig::DESTINATION, frame.width, frame.height)
            .map_err(|e| Error::decode(DecodeStage::Convert, e.message))?;
        if output.len() < layout.size {
            return Err(Error::decode(
                DecodeStage::Convert,
                format!(
                    "output buffer holds {} bytes, {}x{} needs {}",
                    output.len(),
                    frame.width,
                    frame.height,
                    layout.size
                ),
            ));
        }

        frame
            .check_planes()
            .map_err(|e| Error::decode(DecodeStage::Convert, e.message))?;

        let key = ScalerKey {
            width: frame.width,
            height: frame.height,
            source: frame.format,
            destination: ConverterConfig::DESTINATION,
        };
        self.prepare_context(key)?;
        let Some((_, scaler)) = self.context.as_mut() else {
            return Err(Error::decode(DecodeStage::Convert, "no conversion context"));
        };
        self.backend
            .scale(scaler, frame, &mut output[..layout.size], &layout)
            .map_err(|e| Error::decode(DecodeStage::Convert, e.message))?;

        Ok(ConvertedFrame {
            width: frame.width,
            height: frame.height,
            stride: layout.stride,
        })
    }

    fn prepare_context(&mut self, key: ScalerKey) -> Result<()> {
        if matches!(&self.context, Some((current, _)) if *current == key) {
            return Ok(());
        }

        // drop the old context before building its replacement
        self.context = None;
        let scaler = self
            .backend
            .create_scaler(&key, self.config.algorithm)
            .map_err(|e| Error::decode(DecodeStage::Convert, e.message))?;
        self.contexts_created += 1;
        debug!(
            width = key.width,
            height = key.height,
            source = ?key.source,
            algorithm = ?self.config.algorithm,
            "created conversion context"
        );
        self.context = Some((key, scaler));
        Ok(())
    }

    /// Number of conversion contexts created so far.
    pub fn contexts_created(&self) -> u64 {
        self.contexts_created
    }

    pub fn config(&self) -> ConverterConfig {
        self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwdec_types::PixelFormat;
    use hwdec_types::mock::{FailPoint, MockBackend, Resource};

    /// Planes for `format` with a luma ramp (row `y` has value `y`).
    fn planes(width: u32, height: u32, format: PixelFormat) -> Vec<(Vec<u8>, usize)> {
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
        let luma: Vec<u8> = (0..w * h).map(|i| (i / w) as u8).collect();
        match format {
            PixelFormat::Nv12 => vec![(luma, w), (vec![128; cw * 2 * ch], cw * 2)],
            PixelFormat::Yuv420p => vec![
                (luma, w),
                (vec![128; cw * ch], cw),
                (vec![128; cw * ch], cw),
            ],
            _ => Vec::new(),
        }
    }

    fn view(
        planes: &[(Vec<u8>, usize)],
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> DecodedFrame<'_> {
        let refs: Vec<(&[u8], usize)> = planes.iter().map(|(d, s)| (&d[..], *s)).collect();
        DecodedFrame::new(width, height, format, &refs)
    }

    fn converter() -> ColorConverter<MockBackend> {
        ColorConverter::new(MockBackend::new(), ConverterConfig::default())
    }

    #[test]
    fn predicts_packed_bgr24_size() {
        let converter = converter();
        assert_eq!(converter.predict_size(1920, 1080).unwrap(), 1920 * 1080 * 3);
        assert_eq!(converter.predict_size(1, 1).unwrap(), 3);
        assert_eq!(converter.predict_size(33, 7).unwrap(), 33 * 7 * 3);
    }

    #[test]
    fn writes_exactly_the_predicted_size() {
        let mut converter = converter();
        let data = planes(17, 9, PixelFormat::Yuv420p);
        let size = converter.predict_size(17, 9).unwrap();
        let mut output = vec![0xEEu8; size + 8];

        let converted = converter
            .convert(&view(&data, 17, 9, PixelFormat::Yuv420p), &mut output)
            .unwrap();

        assert_eq!(converted.width, 17);
        assert_eq!(converted.height, 9);
        assert_eq!(converted.stride, 17 * 3);
        assert_eq!(converted.byte_len(), size);
        assert!(output[size..].iter().all(|&b| b == 0xEE));
        // last row is gray level 8
        assert_eq!(&output[size - 3..size], &[8, 8, 8]);
    }

    #[test]
    fn reuses_context_for_same_geometry() {
        let mut converter = converter();
        let data = planes(16, 16, PixelFormat::Nv12);
        let mut output = vec![0u8; converter.predict_size(16, 16).unwrap()];

        for _ in 0..5 {
            converter
                .convert(&view(&data, 16, 16, PixelFormat::Nv12), &mut output)
                .unwrap();
        }
        assert_eq!(converter.contexts_created(), 1);
        assert_eq!(converter.backend().ledger().acquired(Resource::Scaler), 1);
    }

    #[test]
    fn recreates_context_when_key_changes() {
        let backend = MockBackend::new();
        let ledger = backend.ledger();
        let mut converter = ColorConverter::new(backend, ConverterConfig::default());
        let small = planes(16, 16, PixelFormat::Nv12);
        let large = planes(32, 16, PixelFormat::Nv12);
        let large_planar = planes(32, 16, PixelFormat::Yuv420p);
        let mut output = vec![0u8; converter.predict_size(32, 16).unwrap()];

        converter
            .convert(&view(&small, 16, 16, PixelFormat::Nv12), &mut output)
            .unwrap();
        converter
            .convert(&view(&large, 32, 16, PixelFormat::Nv12), &mut output)
            .unwrap();
        converter
            .convert(&view(&large_planar, 32, 16, PixelFormat::Yuv420p), &mut output)
            .unwrap();
        converter
            .convert(&view(&large_planar, 32, 16, PixelFormat::Yuv420p), &mut output)
            .unwrap();

        assert_eq!(converter.contexts_created(), 3);
        assert_eq!(ledger.acquired(Resource::Scaler), 3);
        assert_eq!(ledger.released(Resource::Scaler), 2);

        drop(converter);
        assert_eq!(ledger.outstanding(), 0);
    }

    #[test]
    fn too_small_buffer_is_a_convert_failure() {
        let mut converter = converter();
        let data = planes(8, 8, PixelFormat::Nv12);
        let mut output = vec![0u8; 8 * 8 * 3 - 1];

        let err = converter
            .convert(&view(&data, 8, 8, PixelFormat::Nv12), &mut output)
            .unwrap_err();

        assert_eq!(err.stage(), Some(DecodeStage::Convert));
        assert_eq!(converter.contexts_created(), 0);
    }

    #[test]
    fn incomplete_planes_never_reach_the_backend() {
        let mut converter = converter();
        let mut output = vec![0u8; converter.predict_size(64, 64).unwrap()];

        // one 4-byte plane for a frame that needs 64x64 luma plus chroma
        let stub = [0u8; 4];
        let short = DecodedFrame::new(64, 64, PixelFormat::Nv12, &[(&stub[..], 64)]);
        let err = converter.convert(&short, &mut output).unwrap_err();
        assert_eq!(err.stage(), Some(DecodeStage::Convert));

        let mut data = planes(64, 64, PixelFormat::Nv12);
        data[1].0.truncate(64);
        let err = converter
            .convert(&view(&data, 64, 64, PixelFormat::Nv12), &mut output)
            .unwrap_err();
        assert_eq!(err.stage(), Some(DecodeStage::Convert));

        assert_eq!(converter.contexts_created(), 0);
        assert_eq!(converter.backend().ledger().acquired(Resource::Scaler), 0);
    }

    #[test]
    fn context_creation_failure_is_a_convert_failure() {
        let backend = MockBackend::new().failing_at(FailPoint::CreateScaler);
        let mut converter = ColorConverter::new(backend, ConverterConfig::default());
        let data = planes(8, 8, PixelFormat::Nv12);
        let mut output = vec![0u8; 8 * 8 * 3];

        let err = converter
            .convert(&view(&data, 8, 8, PixelFormat::Nv12), &mut output)
            .unwrap_err();

        assert!(err.is_decode());
        assert_eq!(err.stage(), Some(DecodeStage::Convert));
    }

    #[test]
    fn device_surfaces_cannot_be_converted() {
        let mut converter = converter();
        let mut output = vec![0u8; 8 * 8 * 3];

        let err = converter
            .convert(&view(&[], 8, 8, PixelFormat::Vaapi), &mut output)
            .unwrap_err();
        assert_eq!(err.stage(), Some(DecodeStage::Convert));
    }

    #[test]
    fn failed_context_is_retried_on_next_call() {
        let mut converter = converter();
        let data = planes(8, 8, PixelFormat::Nv12);
        let mut output = vec![0u8; 8 * 8 * 3];

        assert!(
            converter
                .convert(&view(&[], 8, 8, PixelFormat::Cuda), &mut output)
                .is_err()
        );
        converter
            .convert(&view(&data, 8, 8, PixelFormat::Nv12), &mut output)
            .unwrap();
        assert_eq!(converter.contexts_created(), 1);
    }
}
