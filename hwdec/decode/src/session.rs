/*!
    Hardware decode session.
*/

use tracing::{debug, trace, warn};

use hwdec_types::{
    CodecId, DecodeBackend, DecodeStage, DecodedFrame, Error, InitError, PixelFormat, Received,
    Residency, Result,
};

use crate::{config::DecoderConfig, parser::BitstreamParser};

/**
    A hardware decode session.

    Owns one device context, one codec context bound to it, one parser and
    two frame buffers (device- and host-resident). Construction either
    yields a fully working session or an error; there is no half-built
    state to misuse.

    Fields are declared in teardown order: the parser goes first, then the
    codec context, the frame buffers, and finally the device reference.
*/
pub struct HardwareDecodeSession<B: DecodeBackend> {
    parser: BitstreamParser<B>,
    codec: B::Codec,
    frame: B::Frame,
    sw_frame: B::Frame,
    device: B::Device,
    backend: B,
    codec_id: CodecId,
    decoder_name: String,
    device_name: String,
    hw_format: PixelFormat,
    draining: bool,
    frames_decoded: u64,
}

impl<B: DecodeBackend> HardwareDecodeSession<B> {
    /**
        Open a session for the codec and device type named in `config`.

        Fails with [`Error::Init`] if the device type is unknown, the codec
        name is not H.264/HEVC, no decoder or matching hardware
        configuration exists, or any allocation fails. Resources acquired
        before a failure are released before this returns.
    */
    pub fn new(backend: B, config: &DecoderConfig) -> Result<Self> {
        let Some(kind) = backend.find_device_type(&config.device) else {
            let available = backend.device_type_names();
            warn!(
                "device type {} is not supported, available device types: {}",
                config.device,
                available.join(" ")
            );
            return Err(InitError::UnsupportedDevice {
                name: config.device.clone(),
                available,
            }
            .into());
        };

        let codec_id = CodecId::from_name(&config.codec)
            .ok_or_else(|| InitError::UnsupportedCodec(config.codec.clone()))?;

        let decoder = backend
            .find_decoder(codec_id)
            .ok_or(InitError::DecoderNotFound(codec_id))?;

        let device_name = backend.device_type_name(kind);
        let hw_format = decoder
            .hw_format_for(&kind)
            .ok_or_else(|| InitError::NoHwConfig {
                decoder: decoder.name.clone(),
                device: device_name.clone(),
            })?;

        let device = backend
            .create_device(kind)
            .map_err(|e| Error::backend_init("create hardware device", e))?;
        let codec = backend
            .open_codec(&decoder, &device, hw_format)
            .map_err(|e| Error::backend_init("open codec", e))?;
        let parser = BitstreamParser::new(&backend, codec_id)?;
        let frame = backend
            .alloc_frame()
            .map_err(|e| Error::backend_init("allocate frame", e))?;
        let sw_frame = backend
            .alloc_frame()
            .map_err(|e| Error::backend_init("allocate frame", e))?;

        debug!(
            codec = %codec_id,
            decoder = %decoder.name,
            device = %device_name,
            hw_format = ?hw_format,
            "opened hardware decode session"
        );

        Ok(Self {
            parser,
            codec,
            frame,
            sw_frame,
            device,
            backend,
            codec_id,
            decoder_name: decoder.name,
            device_name,
            hw_format,
            draining: false,
            frames_decoded: 0,
        })
    }

    /**
        Feed raw stream bytes. Returns how many were consumed; the parser
        stops at an access-unit boundary, so callers must offer the rest
        again. Passing an empty slice flushes the final buffered unit.
    */
    pub fn parse(&mut self, data: &[u8]) -> usize {
        self.parser.parse(&self.backend, &mut self.codec, data)
    }

    /**
        Returns true if a complete packet is ready for [`decode`](Self::decode).
    */
    pub fn is_frame_available(&self) -> bool {
        self.parser.is_frame_available()
    }

    /**
        Submit the ready packet and try to retrieve one frame.

        Returns `Ok(None)` when the codec produced no frame this cycle.
        A returned frame is host-resident and borrows the session, so it
        cannot outlive the next call.
    */
    pub fn decode(&mut self) -> Result<Option<DecodedFrame<'_>>> {
        if !self.parser.is_frame_available() {
            return Err(Error::decode(DecodeStage::Submit, "no packet ready"));
        }

        let sent = self
            .backend
            .send_packet(&mut self.codec, self.parser.packet());
        self.parser.consume_packet();
        sent.map_err(|e| Error::decode(DecodeStage::Submit, e.message))?;

        self.receive(DecodeStage::Receive)
    }

    /**
        Retrieve one frame still buffered in the codec after end of stream.

        The first call signals end of stream; keep calling until it returns
        `Ok(None)`. The session accepts no further packets afterwards.
    */
    pub fn drain(&mut self) -> Result<Option<DecodedFrame<'_>>> {
        if !self.draining {
            self.backend
                .send_eof(&mut self.codec)
                .map_err(|e| Error::decode(DecodeStage::Drain, e.message))?;
            self.draining = true;
        }
        self.receive(DecodeStage::Drain)
    }

    fn receive(&mut self, stage: DecodeStage) -> Result<Option<DecodedFrame<'_>>> {
        match self.backend.receive_frame(&mut self.codec, &mut self.frame) {
            Ok(Received::Frame) => {}
            Ok(Received::Again | Received::Eof) => {
                self.release_frames();
                return Ok(None);
            }
            Err(e) => return Err(Error::decode(stage, e.message)),
        }

        let format = self.backend.frame_format(&self.frame);
        if format.is_hardware() && format != self.hw_format {
            self.release_frames();
            return Err(Error::decode(
                DecodeStage::Transfer,
                format!("unexpected surface format {format:?}"),
            ));
        }

        let origin = if format == self.hw_format {
            if let Err(e) = self
                .backend
                .transfer_to_host(&self.frame, &mut self.sw_frame)
            {
                self.release_frames();
                return Err(Error::decode(DecodeStage::Transfer, e.message));
            }
            Residency::Device
        } else {
            Residency::Host
        };

        self.frames_decoded += 1;

        let host = match origin {
            Residency::Device => &self.sw_frame,
            Residency::Host => &self.frame,
        };
        let view = self.backend.frame_view(host).with_origin(origin);
        trace!(
            width = view.width,
            height = view.height,
            format = ?view.format,
            origin = ?origin,
            "decoded frame {}",
            self.frames_decoded
        );
        Ok(Some(view))
    }

    fn release_frames(&mut self) {
        self.backend.release_frame(&mut self.frame);
        self.backend.release_frame(&mut self.sw_frame);
    }

    pub fn codec(&self) -> CodecId {
        self.codec_id
    }

    /// Name of the decoder implementation in use.
    pub fn decoder_name(&self) -> &str {
        &self.decoder_name
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Surface format negotiated for this session's device.
    pub fn hw_format(&self) -> PixelFormat {
        self.hw_format
    }

    /// Number of frames returned so far.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Total stream bytes consumed by the parser.
    pub fn bytes_consumed(&self) -> u64 {
        self.parser.bytes_consumed()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: DecodeBackend> std::fmt::Debug for HardwareDecodeSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwareDecodeSession")
            .field("codec", &self.codec_id)
            .field("decoder", &self.decoder_name)
            .field("device", &self.device_name)
            .field("hw_format", &self.hw_format)
            .field("frames_decoded", &self.frames_decoded)
            .finish_non_exhaustive()
    }
}
