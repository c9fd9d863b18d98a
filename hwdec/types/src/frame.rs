/*!
    Decoded and converted frame types.
*/

use crate::{BackendError, PixelFormat};

/**
    Maximum number of data planes a frame view carries.
*/
pub const MAX_PLANES: usize = 4;

/**
    Where a decoder placed a frame's pixel data.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Residency {
    /// Pixel data lives in accelerator memory
    Device,
    /// Pixel data lives in normal addressable memory
    Host,
}

/**
    A borrowed view of a host-resident decoded frame.

    The planes point into a frame buffer owned by the decode session, so
    a view can only live until the next call that touches the session.
    `origin` records where the decoder produced the frame; the plane data
    itself is always host-readable.
*/
#[derive(Clone, Copy, Debug)]
pub struct DecodedFrame<'a> {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format of the plane data.
    pub format: PixelFormat,
    /// Residency of the frame as the decoder emitted it.
    pub origin: Residency,
    planes: [&'a [u8]; MAX_PLANES],
    strides: [usize; MAX_PLANES],
    plane_count: usize,
}

impl<'a> DecodedFrame<'a> {
    /**
        Create a view over host-resident planes.

        Each entry is a plane's bytes together with its stride (linesize).
        Planes beyond [`MAX_PLANES`] are ignored.
    */
    pub fn new(width: u32, height: u32, format: PixelFormat, planes: &[(&'a [u8], usize)]) -> Self {
        let mut data: [&'a [u8]; MAX_PLANES] = [&[]; MAX_PLANES];
        let mut strides = [0usize; MAX_PLANES];
        let plane_count = planes.len().min(MAX_PLANES);
        for (i, (plane, stride)) in planes.iter().take(plane_count).enumerate() {
            data[i] = plane;
            strides[i] = *stride;
        }
        Self {
            width,
            height,
            format,
            origin: Residency::Host,
            planes: data,
            strides,
            plane_count,
        }
    }

    /**
        Set the residency the decoder produced this frame with.
    */
    pub fn with_origin(mut self, origin: Residency) -> Self {
        self.origin = origin;
        self
    }

    /**
        Returns the data of plane `index`, or an empty slice past the last plane.
    */
    pub fn plane(&self, index: usize) -> &'a [u8] {
        if index < self.plane_count {
            self.planes[index]
        } else {
            &[]
        }
    }

    /**
        Returns the stride (bytes per row) of plane `index`.
    */
    pub fn stride(&self, index: usize) -> usize {
        if index < self.plane_count {
            self.strides[index]
        } else {
            0
        }
    }

    pub fn plane_count(&self) -> usize {
        self.plane_count
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /**
        Check that the planes cover the frame's geometry.

        Every plane the format defines must be present, its stride must
        hold a full row, and its data must reach the end of the last row.
        Formats without known geometry are not checked here.
    */
    pub fn check_planes(&self) -> Result<(), BackendError> {
        let Some(expected) = self.format.plane_count() else {
            return Ok(());
        };
        if self.plane_count < expected {
            return Err(BackendError::new(format!(
                "{:?} frame needs {expected} planes, got {}",
                self.format, self.plane_count
            )));
        }
        for index in 0..expected {
            let Some((row_bytes, rows)) = self.format.plane_geometry(index, self.width, self.height)
            else {
                continue;
            };
            let stride = self.strides[index];
            if stride < row_bytes {
                return Err(BackendError::new(format!(
                    "plane {index} stride {stride} is shorter than a row of {row_bytes} bytes"
                )));
            }
            let needed = match rows {
                0 => 0,
                rows => stride * (rows - 1) + row_bytes,
            };
            let len = self.planes[index].len();
            if len < needed {
                return Err(BackendError::new(format!(
                    "plane {index} holds {len} bytes, needs {needed}"
                )));
            }
        }
        Ok(())
    }
}

/**
    Descriptor of a frame the converter wrote into a caller-owned buffer.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvertedFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Bytes per output row.
    pub stride: usize,
}

impl ConvertedFrame {
    /**
        Returns the number of bytes the frame occupies in the output buffer.
    */
    pub fn byte_len(&self) -> usize {
        self.stride * self.height as usize
    }
}

static_assertions::assert_impl_all!(DecodedFrame<'static>: Send, Sync);
static_assertions::assert_impl_all!(ConvertedFrame: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_frame_planes() {
        let luma = vec![0u8; 64 * 16];
        let chroma = vec![0u8; 64 * 8];
        let frame = DecodedFrame::new(
            60,
            16,
            PixelFormat::Nv12,
            &[(&luma[..], 64), (&chroma[..], 64)],
        );

        assert_eq!(frame.plane_count(), 2);
        assert_eq!(frame.plane(0).len(), 64 * 16);
        assert_eq!(frame.stride(1), 64);
        assert!(frame.plane(2).is_empty());
        assert_eq!(frame.stride(3), 0);
        assert_eq!(frame.origin, Residency::Host);
        assert_eq!(frame.dimensions(), (60, 16));
    }

    #[test]
    fn decoded_frame_origin() {
        let frame = DecodedFrame::new(2, 2, PixelFormat::Nv12, &[]).with_origin(Residency::Device);
        assert_eq!(frame.origin, Residency::Device);
        assert_eq!(frame.plane_count(), 0);
    }

    #[test]
    fn extra_planes_are_ignored() {
        let p = [0u8; 4];
        let frame = DecodedFrame::new(
            1,
            1,
            PixelFormat::Other(99),
            &[(&p[..], 4), (&p[..], 4), (&p[..], 4), (&p[..], 4), (&p[..], 4)],
        );
        assert_eq!(frame.plane_count(), MAX_PLANES);
    }

    #[test]
    fn complete_planes_pass_check() {
        let luma = vec![0u8; 64 * 16];
        // last chroma row without its padding
        let chroma = vec![0u8; 64 * 7 + 60];
        let frame = DecodedFrame::new(
            60,
            16,
            PixelFormat::Nv12,
            &[(&luma[..], 64), (&chroma[..], 64)],
        );
        assert!(frame.check_planes().is_ok());
    }

    #[test]
    fn missing_plane_fails_check() {
        let luma = [0u8; 64 * 64];
        let frame = DecodedFrame::new(64, 64, PixelFormat::Nv12, &[(&luma[..], 64)]);
        let err = frame.check_planes().unwrap_err();
        assert!(err.message.contains("needs 2 planes"));
    }

    #[test]
    fn short_plane_fails_check() {
        let luma = [0u8; 4];
        let chroma = [0u8; 64 * 32];
        let frame = DecodedFrame::new(
            64,
            64,
            PixelFormat::Nv12,
            &[(&luma[..], 64), (&chroma[..], 64)],
        );
        let err = frame.check_planes().unwrap_err();
        assert_eq!(err.message, "plane 0 holds 4 bytes, needs 4096");
    }

    #[test]
    fn narrow_stride_fails_check() {
        let data = [0u8; 8 * 8 * 3];
        let frame = DecodedFrame::new(8, 8, PixelFormat::Bgr24, &[(&data[..], 8)]);
        assert!(frame.check_planes().is_err());
    }

    #[test]
    fn opaque_formats_are_not_checked() {
        let frame = DecodedFrame::new(64, 64, PixelFormat::Vaapi, &[]);
        assert!(frame.check_planes().is_ok());
        let frame = DecodedFrame::new(64, 64, PixelFormat::Other(7), &[]);
        assert!(frame.check_planes().is_ok());
    }

    #[test]
    fn converted_frame_byte_len() {
        let frame = ConvertedFrame {
            width: 1920,
            height: 1080,
            stride: 1920 * 3,
        };
        assert_eq!(frame.byte_len(), 1920 * 1080 * 3);
    }
}
