/*!
    Pixel format types.
*/

/**
    Video pixel formats.

    Covers the software layouts hardware decoders hand back after transfer,
    the packed RGB layouts the converter can produce, and the opaque
    surface formats frames carry while they are still device-resident.
    Anything else a backend encounters is kept as [`PixelFormat::Other`]
    with the backend's own numeric identifier.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp
    Yuv420p,
    /// Planar YUV 4:2:0, full range (JPEG) variant
    Yuvj420p,
    /// Semi-planar YUV 4:2:0, 12bpp (common hardware transfer output)
    Nv12,
    /// Semi-planar YUV 4:2:0, 10-bit in 16-bit words
    P010,
    /// Planar YUV 4:2:0, 10-bit
    Yuv420p10,
    /// Planar YUV 4:2:2, 16bpp
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp
    Yuv444p,
    /// Packed RGB, 24bpp
    Rgb24,
    /// Packed BGR, 24bpp
    Bgr24,
    /// Packed BGRA, 32bpp
    Bgra,
    /// Packed RGBA, 32bpp
    Rgba,
    /// VAAPI surface
    Vaapi,
    /// CUDA device memory
    Cuda,
    /// DXVA2 surface
    Dxva2,
    /// Direct3D 11 texture
    D3d11,
    /// VideoToolbox pixel buffer
    VideoToolbox,
    /// Intel Quick Sync surface
    Qsv,
    /// VDPAU surface
    Vdpau,
    /// Backend-specific format without a named variant
    Other(i32),
}

impl PixelFormat {
    /**
        Returns true for surface formats whose data lives in accelerator
        memory and cannot be read by the host.
    */
    pub const fn is_hardware(self) -> bool {
        matches!(
            self,
            Self::Vaapi
                | Self::Cuda
                | Self::Dxva2
                | Self::D3d11
                | Self::VideoToolbox
                | Self::Qsv
                | Self::Vdpau
        )
    }

    /**
        Returns the number of bytes per pixel for packed formats.

        Planar, hardware and unknown formats return `None`.
    */
    pub const fn packed_bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::Rgb24 | Self::Bgr24 => Some(3),
            Self::Bgra | Self::Rgba => Some(4),
            _ => None,
        }
    }

    /**
        Returns the number of data planes for software formats.
    */
    pub const fn plane_count(self) -> Option<usize> {
        match self {
            Self::Yuv420p | Self::Yuvj420p | Self::Yuv420p10 | Self::Yuv422p | Self::Yuv444p => {
                Some(3)
            }
            Self::Nv12 | Self::P010 => Some(2),
            Self::Rgb24 | Self::Bgr24 | Self::Bgra | Self::Rgba => Some(1),
            _ => None,
        }
    }

    /**
        Returns the minimum bytes per row and the number of rows of plane
        `index` for a `width` x `height` image.

        Returns `None` for planes the format does not have, and for
        hardware and unknown formats.
    */
    pub fn plane_geometry(self, index: usize, width: u32, height: u32) -> Option<(usize, usize)> {
        let (w, h) = (width as usize, height as usize);
        let (half_w, half_h) = (w.div_ceil(2), h.div_ceil(2));
        let geometry = match (self, index) {
            (Self::Yuv420p | Self::Yuvj420p | Self::Yuv422p | Self::Yuv444p, 0) => (w, h),
            (Self::Yuv420p | Self::Yuvj420p, 1 | 2) => (half_w, half_h),
            (Self::Yuv422p, 1 | 2) => (half_w, h),
            (Self::Yuv444p, 1 | 2) => (w, h),
            (Self::Yuv420p10, 0) => (w * 2, h),
            (Self::Yuv420p10, 1 | 2) => (half_w * 2, half_h),
            (Self::Nv12, 0) => (w, h),
            (Self::Nv12, 1) => (half_w * 2, half_h),
            (Self::P010, 0) => (w * 2, h),
            (Self::P010, 1) => (half_w * 4, half_h),
            (Self::Rgb24 | Self::Bgr24, 0) => (w * 3, h),
            (Self::Bgra | Self::Rgba, 0) => (w * 4, h),
            _ => return None,
        };
        Some(geometry)
    }
}
