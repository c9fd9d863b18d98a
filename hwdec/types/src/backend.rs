/*!
    Capability traits implemented by acceleration backends.

    The decode session and the color converter only talk to the outside
    world through these traits. Handles returned by a backend own their
    underlying resource and release it when dropped.
*/

use std::fmt;

use crate::{BackendError, CodecId, DecodedFrame, PixelFormat};

/**
    Result type for backend capabilities.
*/
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/**
    Outcome of asking a codec for a decoded frame.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Received {
    /// A frame was written into the supplied frame buffer
    Frame,
    /// The codec needs more input before it can produce a frame
    Again,
    /// The codec has been drained and will produce no more frames
    Eof,
}

/**
    One hardware configuration advertised by a decoder.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HwConfig<K> {
    /// Whether the configuration is set up through a device context
    pub device_ctx: bool,
    /// Device type the configuration applies to
    pub device: K,
    /// Surface format frames are emitted in on that device
    pub pixel_format: PixelFormat,
}

/**
    A decoder implementation and its hardware configurations.
*/
#[derive(Clone, Debug)]
pub struct DecoderInfo<K> {
    /// Backend name of the decoder (e.g. `h264`)
    pub name: String,
    /// Codec family the decoder handles
    pub codec: CodecId,
    /// Hardware configurations in the backend's preference order
    pub hw_configs: Vec<HwConfig<K>>,
}

impl<K: PartialEq> DecoderInfo<K> {
    /**
        Returns the surface format of the first device-context based
        configuration for `device`.
    */
    pub fn hw_format_for(&self, device: &K) -> Option<PixelFormat> {
        self.hw_configs
            .iter()
            .find(|config| config.device_ctx && config.device == *device)
            .map(|config| config.pixel_format)
    }
}

/**
    Decoding capabilities: device lookup, codec negotiation, parsing,
    packet submission, frame retrieval and host transfer.
*/
pub trait DecodeBackend {
    /// Identifier of a device type in the backend's registry.
    type DeviceKind: Copy + PartialEq + fmt::Debug;
    /// Reference-counted device context; dropping releases one reference.
    type Device;
    /// Opened codec context bound to a device.
    type Codec;
    /// Streaming bitstream parser.
    type Parser;
    /// Reusable frame buffer.
    type Frame;

    /// Names of every device type the backend supports.
    fn device_type_names(&self) -> Vec<String>;

    /// Exact-name lookup of a device type.
    fn find_device_type(&self, name: &str) -> Option<Self::DeviceKind>;

    fn device_type_name(&self, kind: Self::DeviceKind) -> String;

    /// Locate a decoder for `codec` together with its hardware configurations.
    fn find_decoder(&self, codec: CodecId) -> Option<DecoderInfo<Self::DeviceKind>>;

    fn create_device(&self, kind: Self::DeviceKind) -> BackendResult<Self::Device>;

    /**
        Allocate and open a codec context bound to `device`.

        `hw_format` belongs to this codec instance alone: whatever format
        selection the backend performs must consult it through the returned
        handle, never through shared state.
    */
    fn open_codec(
        &self,
        decoder: &DecoderInfo<Self::DeviceKind>,
        device: &Self::Device,
        hw_format: PixelFormat,
    ) -> BackendResult<Self::Codec>;

    fn create_parser(&self, codec: CodecId) -> BackendResult<Self::Parser>;

    fn alloc_frame(&self) -> BackendResult<Self::Frame>;

    /**
        Feed `data` to the parser and return how many bytes it consumed.

        `packet` is cleared, then filled with a complete access unit if one
        was recognized. An empty `data` flushes whatever the parser holds.
    */
    fn parse(
        &self,
        parser: &mut Self::Parser,
        codec: &mut Self::Codec,
        data: &[u8],
        packet: &mut Vec<u8>,
    ) -> usize;

    fn send_packet(&self, codec: &mut Self::Codec, packet: &[u8]) -> BackendResult<()>;

    /// Signal end of stream so buffered frames can be drained.
    fn send_eof(&self, codec: &mut Self::Codec) -> BackendResult<()>;

    fn receive_frame(
        &self,
        codec: &mut Self::Codec,
        frame: &mut Self::Frame,
    ) -> BackendResult<Received>;

    fn frame_format(&self, frame: &Self::Frame) -> PixelFormat;

    /// Copy a device-resident frame into `host_frame`.
    fn transfer_to_host(
        &self,
        device_frame: &Self::Frame,
        host_frame: &mut Self::Frame,
    ) -> BackendResult<()>;

    /// Drop the pixel buffers a frame references, keeping the frame itself.
    fn release_frame(&self, frame: &mut Self::Frame);

    /// View a host-resident frame.
    fn frame_view<'f>(&self, frame: &'f Self::Frame) -> DecodedFrame<'f>;
}

/**
    Scaling algorithm used by a conversion context.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScalingAlgorithm {
    FastBilinear,
    #[default]
    Bilinear,
    Bicubic,
    Point,
    Area,
    Lanczos,
}

/**
    Geometry and formats a conversion context is built for.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScalerKey {
    pub width: u32,
    pub height: u32,
    pub source: PixelFormat,
    pub destination: PixelFormat,
}

/**
    Byte layout of a single-plane image at 1-byte row alignment.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageLayout {
    /// Total bytes the image occupies.
    pub size: usize,
    /// Bytes per row.
    pub stride: usize,
}

impl ImageLayout {
    /**
        Layout of a packed format without row padding.

        Returns `None` for formats that are not packed.
    */
    pub fn packed(format: PixelFormat, width: u32, height: u32) -> Option<Self> {
        let bytes_per_pixel = format.packed_bytes_per_pixel()?;
        let stride = width as usize * bytes_per_pixel;
        Some(Self {
            size: stride * height as usize,
            stride,
        })
    }
}

/**
    Pixel format conversion capabilities.
*/
pub trait ScaleBackend {
    /// Conversion context for one [`ScalerKey`].
    type Scaler;

    fn create_scaler(
        &self,
        key: &ScalerKey,
        algorithm: ScalingAlgorithm,
    ) -> BackendResult<Self::Scaler>;

    /**
        Convert `source` into `output`, which is laid out as `layout`
        describes and is at least `layout.size` bytes long.
    */
    fn scale(
        &self,
        scaler: &mut Self::Scaler,
        source: &DecodedFrame<'_>,
        output: &mut [u8],
        layout: &ImageLayout,
    ) -> BackendResult<()>;

    /**
        Compute the layout of an image without touching pixel data.
    */
    fn image_layout(
        &self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> BackendResult<ImageLayout> {
        ImageLayout::packed(format, width, height)
            .ok_or_else(|| BackendError::new(format!("no packed layout for {format:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> DecoderInfo<u8> {
        DecoderInfo {
            name: "h264".into(),
            codec: CodecId::H264,
            hw_configs: vec![
                HwConfig {
                    device_ctx: false,
                    device: 1,
                    pixel_format: PixelFormat::Dxva2,
                },
                HwConfig {
                    device_ctx: true,
                    device: 2,
                    pixel_format: PixelFormat::Vaapi,
                },
                HwConfig {
                    device_ctx: true,
                    device: 2,
                    pixel_format: PixelFormat::Other(5),
                },
            ],
        }
    }

    #[test]
    fn hw_format_takes_first_device_ctx_match() {
        assert_eq!(decoder().hw_format_for(&2), Some(PixelFormat::Vaapi));
    }

    #[test]
    fn hw_format_requires_device_ctx_method() {
        assert_eq!(decoder().hw_format_for(&1), None);
        assert_eq!(decoder().hw_format_for(&3), None);
    }

    #[test]
    fn packed_layout() {
        let layout = ImageLayout::packed(PixelFormat::Bgr24, 1920, 1080).unwrap();
        assert_eq!(layout.stride, 1920 * 3);
        assert_eq!(layout.size, 1920 * 1080 * 3);

        // odd widths get no padding
        let layout = ImageLayout::packed(PixelFormat::Bgr24, 3, 2).unwrap();
        assert_eq!(layout.size, 18);

        assert!(ImageLayout::packed(PixelFormat::Nv12, 4, 4).is_none());
    }

    #[test]
    fn default_scaling_algorithm() {
        assert_eq!(ScalingAlgorithm::default(), ScalingAlgorithm::Bilinear);
    }
}
