/*!
    Decoder configuration types.
*/

/**
    Hardware device type for hardware-accelerated decoding.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum HwDevice {
    /// VideoToolbox (macOS)
    VideoToolbox,
    /// VAAPI (Linux - AMD, Intel)
    Vaapi,
    /// CUDA/NVDEC (NVIDIA)
    Cuda,
    /// Quick Sync Video (Intel)
    Qsv,
    /// DXVA2 (Windows)
    Dxva2,
    /// Direct3D 11 video acceleration (Windows)
    D3d11va,
    /// VDPAU (Linux - NVIDIA, older drivers)
    Vdpau,
}

impl HwDevice {
    /**
        Returns the device type name used by the acceleration library.
    */
    pub const fn name(self) -> &'static str {
        match self {
            Self::VideoToolbox => "videotoolbox",
            Self::Vaapi => "vaapi",
            Self::Cuda => "cuda",
            Self::Qsv => "qsv",
            Self::Dxva2 => "dxva2",
            Self::D3d11va => "d3d11va",
            Self::Vdpau => "vdpau",
        }
    }

    /**
        Returns the device most likely to exist on the current platform.
    */
    pub const fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::VideoToolbox
        } else if cfg!(target_os = "windows") {
            Self::Dxva2
        } else {
            Self::Vaapi
        }
    }
}

/**
    Configuration for a hardware decode session.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Codec name; classified by substring (`264`, `265`, `hevc`, `HEVC`).
    pub codec: String,
    /// Exact device type name (e.g. `vaapi`, `cuda`, `dxva2`).
    pub device: String,
}

impl DecoderConfig {
    /**
        Create a config from a codec name and a device type name.
    */
    pub fn new(codec: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            codec: codec.into(),
            device: device.into(),
        }
    }

    /**
        Create a config for a specific hardware device.
    */
    pub fn with_hw_device(codec: impl Into<String>, device: HwDevice) -> Self {
        Self::new(codec, device.name())
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::with_hw_device("h264", HwDevice::platform_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_names() {
        assert_eq!(HwDevice::Vaapi.name(), "vaapi");
        assert_eq!(HwDevice::D3d11va.name(), "d3d11va");
        assert_eq!(HwDevice::VideoToolbox.name(), "videotoolbox");
    }

    #[test]
    fn config_from_hw_device() {
        let config = DecoderConfig::with_hw_device("hevc", HwDevice::Cuda);
        assert_eq!(config, DecoderConfig::new("hevc", "cuda"));
    }

    #[test]
    fn default_is_h264_on_platform_device() {
        let config = DecoderConfig::default();
        assert_eq!(config.codec, "h264");
        assert_eq!(config.device, HwDevice::platform_default().name());
    }
}
