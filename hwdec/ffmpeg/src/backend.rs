/*!
    Capability trait implementations.
*/

use ffmpeg_next::ffi;

use hwdec_types::{
    BackendError, BackendResult, CodecId, DecodeBackend, DecodedFrame, DecoderInfo, ImageLayout,
    MAX_PLANES, PixelFormat, Received, ScaleBackend, ScalerKey, ScalingAlgorithm,
};

use crate::{
    Frame, FfmpegBackend, av_error, codec::CodecContext, codec, format, hw, hw::DeviceContext,
    parser::ParserContext, scale, scale::ScalingContext,
};

impl DecodeBackend for FfmpegBackend {
    type DeviceKind = ffi::AVHWDeviceType;
    type Device = DeviceContext;
    type Codec = CodecContext;
    type Parser = ParserContext;
    type Frame = Frame;

    fn device_type_names(&self) -> Vec<String> {
        crate::available_device_types()
    }

    fn find_device_type(&self, name: &str) -> Option<ffi::AVHWDeviceType> {
        hw::find_type_by_name(name)
    }

    fn device_type_name(&self, kind: ffi::AVHWDeviceType) -> String {
        hw::type_name(kind)
    }

    fn find_decoder(&self, codec: CodecId) -> Option<DecoderInfo<ffi::AVHWDeviceType>> {
        codec::find_decoder(codec)
    }

    fn create_device(&self, kind: ffi::AVHWDeviceType) -> BackendResult<DeviceContext> {
        DeviceContext::create(kind)
    }

    fn open_codec(
        &self,
        decoder: &DecoderInfo<ffi::AVHWDeviceType>,
        device: &DeviceContext,
        hw_format: PixelFormat,
    ) -> BackendResult<CodecContext> {
        CodecContext::open(&decoder.name, device, format::to_av(hw_format))
    }

    fn create_parser(&self, codec: CodecId) -> BackendResult<ParserContext> {
        ParserContext::new(codec)
    }

    fn alloc_frame(&self) -> BackendResult<Frame> {
        let frame = Frame::empty();
        if unsafe { frame.as_ptr().is_null() } {
            return Err(BackendError::new("cannot allocate frame"));
        }
        Ok(frame)
    }

    fn parse(
        &self,
        parser: &mut ParserContext,
        codec: &mut CodecContext,
        data: &[u8],
        packet: &mut Vec<u8>,
    ) -> usize {
        parser.parse(codec, data, packet)
    }

    fn send_packet(&self, codec: &mut CodecContext, packet: &[u8]) -> BackendResult<()> {
        codec.send_packet(packet)
    }

    fn send_eof(&self, codec: &mut CodecContext) -> BackendResult<()> {
        codec.send_eof()
    }

    fn receive_frame(&self, codec: &mut CodecContext, frame: &mut Frame) -> BackendResult<Received> {
        codec.receive_frame(unsafe { frame.as_mut_ptr() })
    }

    fn frame_format(&self, frame: &Frame) -> PixelFormat {
        format::from_raw(unsafe { (*frame.as_ptr()).format })
    }

    fn transfer_to_host(&self, device_frame: &Frame, host_frame: &mut Frame) -> BackendResult<()> {
        unsafe {
            ffi::av_frame_unref(host_frame.as_mut_ptr());
            let ret = ffi::av_hwframe_transfer_data(host_frame.as_mut_ptr(), device_frame.as_ptr(), 0);
            if ret < 0 {
                return Err(av_error(ret));
            }
        }
        Ok(())
    }

    fn release_frame(&self, frame: &mut Frame) {
        unsafe { ffi::av_frame_unref(frame.as_mut_ptr()) };
    }

    fn frame_view<'f>(&self, frame: &'f Frame) -> DecodedFrame<'f> {
        let count = frame.planes().min(MAX_PLANES);
        let mut planes: [(&'f [u8], usize); MAX_PLANES] = [(&[], 0); MAX_PLANES];
        for (i, plane) in planes.iter_mut().enumerate().take(count) {
            *plane = (frame.data(i), frame.stride(i));
        }
        DecodedFrame::new(
            frame.width(),
            frame.height(),
            self.frame_format(frame),
            &planes[..count],
        )
    }
}

impl ScaleBackend for FfmpegBackend {
    type Scaler = ScalingContext;

    fn create_scaler(
        &self,
        key: &ScalerKey,
        algorithm: ScalingAlgorithm,
    ) -> BackendResult<ScalingContext> {
        ScalingContext::new(key, algorithm)
    }

    fn scale(
        &self,
        scaler: &mut ScalingContext,
        source: &DecodedFrame<'_>,
        output: &mut [u8],
        layout: &ImageLayout,
    ) -> BackendResult<()> {
        scaler.run(source, output, layout)
    }

    fn image_layout(
        &self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> BackendResult<ImageLayout> {
        scale::image_layout(format, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_device_type_is_not_found() {
        let backend = FfmpegBackend::new().unwrap();
        assert!(backend.find_device_type("no-such-device").is_none());
        assert!(backend.find_device_type("vaapi\0").is_none());
    }

    #[test]
    fn device_type_names_round_trip() {
        let backend = FfmpegBackend::new().unwrap();
        for name in backend.device_type_names() {
            let kind = backend.find_device_type(&name).unwrap();
            assert_eq!(backend.device_type_name(kind), name);
        }
    }

    #[test]
    fn h264_decoder_is_available() {
        let backend = FfmpegBackend::new().unwrap();
        let decoder = backend.find_decoder(CodecId::H264).unwrap();
        assert_eq!(decoder.codec, CodecId::H264);
        assert!(!decoder.name.is_empty());
    }

    #[test]
    fn fresh_frames_are_empty() {
        let backend = FfmpegBackend::new().unwrap();
        let frame = backend.alloc_frame().unwrap();
        let view = backend.frame_view(&frame);
        assert_eq!(view.plane_count(), 0);
        assert_eq!(view.width, 0);
    }
}
