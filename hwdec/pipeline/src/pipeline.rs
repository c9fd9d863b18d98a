use tracing::debug;

use hwdec_convert::{ColorConverter, ConverterConfig};
use hwdec_decode::{DecoderConfig, HardwareDecodeSession};
use hwdec_types::{DecodeBackend, DecodedFrame, Result, ScaleBackend};

use crate::frame::RgbFrame;

/**
    Streaming decode followed by BGR24 conversion.

    Feed the stream with [`push`](Self::push) in chunks of any size, then
    call [`finish`](Self::finish) once at end of stream to collect the
    frames still buffered in the parser and the decoder.
*/
pub struct Pipeline<D: DecodeBackend, S: ScaleBackend> {
    session: HardwareDecodeSession<D>,
    converter: ColorConverter<S>,
}

impl<D: DecodeBackend, S: ScaleBackend> Pipeline<D, S> {
    pub fn new(session: HardwareDecodeSession<D>, converter: ColorConverter<S>) -> Self {
        Self { session, converter }
    }

    /**
        Open a session on `decoder` and a converter on `scaler`.
    */
    pub fn open(
        decoder: D,
        scaler: S,
        config: &DecoderConfig,
        converter: ConverterConfig,
    ) -> Result<Self> {
        let session = HardwareDecodeSession::new(decoder, config)?;
        Ok(Self::new(session, ColorConverter::new(scaler, converter)))
    }

    /**
        Parse and decode all of `chunk`, returning every frame that
        completed. Returns an empty list if the chunk finished no frame.
    */
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<RgbFrame>> {
        let mut frames = Vec::new();
        let mut data = chunk;
        while !data.is_empty() {
            let consumed = self.session.parse(data);
            data = &data[consumed..];
            if self.session.is_frame_available() {
                if let Some(frame) = self.session.decode()? {
                    frames.push(convert(&mut self.converter, &frame)?);
                }
            } else if consumed == 0 {
                break;
            }
        }
        Ok(frames)
    }

    /**
        Flush the parser and drain the decoder.

        The pipeline accepts no further input afterwards.
    */
    pub fn finish(&mut self) -> Result<Vec<RgbFrame>> {
        let mut frames = Vec::new();
        self.session.parse(&[]);
        if self.session.is_frame_available() {
            if let Some(frame) = self.session.decode()? {
                frames.push(convert(&mut self.converter, &frame)?);
            }
        }
        while let Some(frame) = self.session.drain()? {
            frames.push(convert(&mut self.converter, &frame)?);
        }
        debug!(
            frames = self.session.frames_decoded(),
            bytes = self.session.bytes_consumed(),
            contexts = self.converter.contexts_created(),
            "pipeline finished"
        );
        Ok(frames)
    }

    pub fn session(&self) -> &HardwareDecodeSession<D> {
        &self.session
    }

    pub fn converter(&self) -> &ColorConverter<S> {
        &self.converter
    }
}

fn convert<S: ScaleBackend>(
    converter: &mut ColorConverter<S>,
    frame: &DecodedFrame<'_>,
) -> Result<RgbFrame> {
    let mut data = vec![0u8; converter.predict_size(frame.width, frame.height)?];
    let converted = converter.convert(frame, &mut data)?;
    Ok(RgbFrame {
        data,
        width: converted.width,
        height: converted.height,
        stride: converted.stride,
    })
}
