/*!
    Software scaling context.
*/

use std::os::raw::c_int;
use std::ptr;

use ffmpeg_next::ffi;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling::{Context, Flags};

use hwdec_types::{
    BackendError, BackendResult, DecodedFrame, ImageLayout, MAX_PLANES, PixelFormat, ScalerKey,
    ScalingAlgorithm,
};

use crate::{av_error, format};

/**
    Scaling context for one source geometry and format.
*/
pub struct ScalingContext {
    context: Context,
    key: ScalerKey,
}

impl ScalingContext {
    pub(crate) fn new(key: &ScalerKey, algorithm: ScalingAlgorithm) -> BackendResult<Self> {
        let context = Context::get(
            Pixel::from(format::to_av(key.source)),
            key.width,
            key.height,
            Pixel::from(format::to_av(key.destination)),
            key.width,
            key.height,
            flags(algorithm),
        )
        .map_err(|e| BackendError::new(e.to_string()))?;

        Ok(Self { context, key: *key })
    }

    /**
        Convert `source` into `output`.

        `layout` must be the destination layout for this context's key.
        Source planes are checked against FFmpeg's own description of the
        source format before any pointer is handed to swscale.
    */
    pub(crate) fn run(
        &mut self,
        source: &DecodedFrame<'_>,
        output: &mut [u8],
        layout: &ImageLayout,
    ) -> BackendResult<()> {
        if (source.width, source.height, source.format)
            != (self.key.width, self.key.height, self.key.source)
        {
            return Err(BackendError::new("frame does not match conversion context"));
        }
        check_source(source)?;

        let expected = image_layout(self.key.destination, self.key.width, self.key.height)?;
        if *layout != expected {
            return Err(BackendError::new("layout does not match conversion context"));
        }
        if output.len() < expected.size {
            return Err(BackendError::new("output buffer too small"));
        }

        let mut dst_data: [*mut u8; 4] = [ptr::null_mut(); 4];
        let mut dst_linesize: [c_int; 4] = [0; 4];
        let filled = unsafe {
            ffi::av_image_fill_arrays(
                dst_data.as_mut_ptr(),
                dst_linesize.as_mut_ptr(),
                output.as_mut_ptr(),
                format::to_av(self.key.destination),
                self.key.width as c_int,
                self.key.height as c_int,
                1,
            )
        };
        if filled < 0 {
            return Err(av_error(filled));
        }

        let mut src_data: [*const u8; 4] = [ptr::null(); 4];
        let mut src_linesize: [c_int; 4] = [0; 4];
        for i in 0..source.plane_count().min(MAX_PLANES) {
            src_data[i] = source.plane(i).as_ptr();
            src_linesize[i] = source.stride(i) as c_int;
        }

        let rows = unsafe {
            ffi::sws_scale(
                self.context.as_mut_ptr(),
                src_data.as_ptr(),
                src_linesize.as_ptr(),
                0,
                self.key.height as c_int,
                dst_data.as_ptr(),
                dst_linesize.as_ptr(),
            )
        };
        if rows < 0 {
            return Err(av_error(rows));
        }
        Ok(())
    }
}

/**
    Size and row stride FFmpeg uses for an image at 1-byte alignment.
*/
pub(crate) fn image_layout(
    pixel_format: PixelFormat,
    width: u32,
    height: u32,
) -> BackendResult<ImageLayout> {
    let mut data: [*mut u8; 4] = [ptr::null_mut(); 4];
    let mut linesize: [c_int; 4] = [0; 4];
    let size = unsafe {
        ffi::av_image_fill_arrays(
            data.as_mut_ptr(),
            linesize.as_mut_ptr(),
            ptr::null(),
            format::to_av(pixel_format),
            width as c_int,
            height as c_int,
            1,
        )
    };
    if size < 0 {
        return Err(av_error(size));
    }
    Ok(ImageLayout {
        size: size as usize,
        stride: linesize[0] as usize,
    })
}

/**
    Check that `source` carries every plane its format needs, with strides
    of at least one row and enough bytes for every row.
*/
fn check_source(source: &DecodedFrame<'_>) -> BackendResult<()> {
    source.check_planes()?;

    let pixel_format = format::to_av(source.format);
    let planes = unsafe { ffi::av_pix_fmt_count_planes(pixel_format) };
    if planes <= 0 {
        return Err(BackendError::new(format!(
            "{:?} has no host-readable planes",
            source.format
        )));
    }
    let planes = planes as usize;
    if planes > MAX_PLANES || source.plane_count() < planes {
        return Err(BackendError::new(format!(
            "{:?} frame needs {planes} planes, got {}",
            source.format,
            source.plane_count()
        )));
    }

    let mut min_linesizes: [c_int; 4] = [0; 4];
    let ret = unsafe {
        ffi::av_image_fill_linesizes(
            min_linesizes.as_mut_ptr(),
            pixel_format,
            source.width as c_int,
        )
    };
    if ret < 0 {
        return Err(av_error(ret));
    }

    let mut linesizes = [0; 4];
    for i in 0..planes {
        let stride = source.stride(i);
        if stride < min_linesizes[i] as usize || stride > c_int::MAX as usize {
            return Err(BackendError::new(format!(
                "plane {i} stride {stride} does not fit a row of {} bytes",
                min_linesizes[i]
            )));
        }
        linesizes[i] = stride as _;
    }

    let mut sizes = [0; 4];
    let ret = unsafe {
        ffi::av_image_fill_plane_sizes(
            sizes.as_mut_ptr(),
            pixel_format,
            source.height as c_int,
            linesizes.as_ptr(),
        )
    };
    if ret < 0 {
        return Err(av_error(ret));
    }
    for i in 0..planes {
        let needed = sizes[i] as usize;
        let len = source.plane(i).len();
        if len < needed {
            return Err(BackendError::new(format!(
                "plane {i} holds {len} bytes, needs {needed}"
            )));
        }
    }
    Ok(())
}

fn flags(algorithm: ScalingAlgorithm) -> Flags {
    match algorithm {
        ScalingAlgorithm::FastBilinear => Flags::FAST_BILINEAR,
        ScalingAlgorithm::Bilinear => Flags::BILINEAR,
        ScalingAlgorithm::Bicubic => Flags::BICUBIC,
        ScalingAlgorithm::Point => Flags::POINT,
        ScalingAlgorithm::Area => Flags::AREA,
        ScalingAlgorithm::Lanczos => Flags::LANCZOS,
    }
}
