/*!
    Mapping between FFmpeg pixel formats and [`PixelFormat`].
*/

use ffmpeg_next::ffi::AVPixelFormat;

use hwdec_types::PixelFormat;

const FORMATS: &[(AVPixelFormat, PixelFormat)] = &[
    (AVPixelFormat::AV_PIX_FMT_YUV420P, PixelFormat::Yuv420p),
    (AVPixelFormat::AV_PIX_FMT_YUVJ420P, PixelFormat::Yuvj420p),
    (AVPixelFormat::AV_PIX_FMT_NV12, PixelFormat::Nv12),
    (AVPixelFormat::AV_PIX_FMT_P010LE, PixelFormat::P010),
    (AVPixelFormat::AV_PIX_FMT_YUV420P10LE, PixelFormat::Yuv420p10),
    (AVPixelFormat::AV_PIX_FMT_YUV422P, PixelFormat::Yuv422p),
    (AVPixelFormat::AV_PIX_FMT_YUV444P, PixelFormat::Yuv444p),
    (AVPixelFormat::AV_PIX_FMT_RGB24, PixelFormat::Rgb24),
    (AVPixelFormat::AV_PIX_FMT_BGR24, PixelFormat::Bgr24),
    (AVPixelFormat::AV_PIX_FMT_BGRA, PixelFormat::Bgra),
    (AVPixelFormat::AV_PIX_FMT_RGBA, PixelFormat::Rgba),
    (AVPixelFormat::AV_PIX_FMT_VAAPI, PixelFormat::Vaapi),
    (AVPixelFormat::AV_PIX_FMT_CUDA, PixelFormat::Cuda),
    (AVPixelFormat::AV_PIX_FMT_DXVA2_VLD, PixelFormat::Dxva2),
    (AVPixelFormat::AV_PIX_FMT_D3D11, PixelFormat::D3d11),
    (AVPixelFormat::AV_PIX_FMT_VIDEOTOOLBOX, PixelFormat::VideoToolbox),
    (AVPixelFormat::AV_PIX_FMT_QSV, PixelFormat::Qsv),
    (AVPixelFormat::AV_PIX_FMT_VDPAU, PixelFormat::Vdpau),
];

pub(crate) fn from_av(format: AVPixelFormat) -> PixelFormat {
    FORMATS
        .iter()
        .find(|(av, _)| *av == format)
        .map(|(_, ours)| *ours)
        .unwrap_or(PixelFormat::Other(format as i32))
}

/**
    Convert a raw `AVFrame::format` value.
*/
pub(crate) fn from_raw(raw: i32) -> PixelFormat {
    FORMATS
        .iter()
        .find(|(av, _)| *av as i32 == raw)
        .map(|(_, ours)| *ours)
        .unwrap_or(PixelFormat::Other(raw))
}

pub(crate) fn to_av(format: PixelFormat) -> AVPixelFormat {
    if let PixelFormat::Other(raw) = format {
        // SAFETY: `Other` values are only ever produced by `from_av` and
        // `from_raw` from formats FFmpeg itself reported.
        return unsafe { std::mem::transmute::<i32, AVPixelFormat>(raw) };
    }
    FORMATS
        .iter()
        .find(|(_, ours)| *ours == format)
        .map(|(av, _)| *av)
        .unwrap_or(AVPixelFormat::AV_PIX_FMT_NONE)
}
