/*!
    Codec lookup and the decoding context.
*/

use std::ffi::{CStr, CString, c_void};
use std::os::raw::c_int;
use std::ptr;

use ffmpeg_next::ffi;
use tracing::error;

use hwdec_types::{BackendError, BackendResult, CodecId, DecoderInfo, HwConfig, Received};

use crate::{av_error, format, hw::DeviceContext};

/**
    Surface format negotiated for one codec context.

    Lives in a box owned by the [`CodecContext`] and is reachable from the
    `get_format` callback through `AVCodecContext::opaque`, so every
    context answers format selection with its own negotiation result.
*/
struct Negotiation {
    hw_format: ffi::AVPixelFormat,
}

/**
    An opened decoding context bound to a hardware device.

    Owns the in-flight packet descriptor used to submit access units.
    Dropping closes and frees the context, which also releases its
    device reference.
*/
pub struct CodecContext {
    ptr: *mut ffi::AVCodecContext,
    packet: *mut ffi::AVPacket,
    negotiation: Box<Negotiation>,
}

impl CodecContext {
    /**
        Allocate a context for the decoder named `name`, bind it to
        `device`, and open it.
    */
    pub(crate) fn open(
        name: &str,
        device: &DeviceContext,
        hw_format: ffi::AVPixelFormat,
    ) -> BackendResult<Self> {
        let codec = find_decoder_by_name(name)
            .ok_or_else(|| BackendError::new(format!("cannot find decoder {name}")))?;

        unsafe {
            let ptr = ffi::avcodec_alloc_context3(codec);
            if ptr.is_null() {
                return Err(BackendError::new("cannot allocate context"));
            }

            // Wrapped right away so every early return below frees it
            let mut context = Self {
                ptr,
                packet: ptr::null_mut(),
                negotiation: Box::new(Negotiation { hw_format }),
            };

            install_format_selection(ptr, &mut context.negotiation);
            (*ptr).hw_device_ctx = device.create_ref();
            if (*ptr).hw_device_ctx.is_null() {
                return Err(BackendError::new("cannot reference device context"));
            }

            let ret = ffi::avcodec_open2(ptr, codec, ptr::null_mut());
            if ret < 0 {
                return Err(av_error(ret));
            }

            context.packet = ffi::av_packet_alloc();
            if context.packet.is_null() {
                return Err(BackendError::new("cannot allocate packet"));
            }

            Ok(context)
        }
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut ffi::AVCodecContext {
        self.ptr
    }

    /**
        Submit one access unit. FFmpeg copies the data, since the packet
        does not reference a buffer of its own.
    */
    pub(crate) fn send_packet(&mut self, data: &[u8]) -> BackendResult<()> {
        let size = c_int::try_from(data.len())
            .map_err(|_| BackendError::new("packet too large"))?;
        unsafe {
            (*self.packet).data = data.as_ptr() as *mut u8;
            (*self.packet).size = size;
            let ret = ffi::avcodec_send_packet(self.ptr, self.packet);
            (*self.packet).data = ptr::null_mut();
            (*self.packet).size = 0;
            if ret < 0 {
                return Err(av_error(ret));
            }
        }
        Ok(())
    }

    pub(crate) fn send_eof(&mut self) -> BackendResult<()> {
        let ret = unsafe { ffi::avcodec_send_packet(self.ptr, ptr::null()) };
        if ret < 0 && ret != ffi::AVERROR_EOF {
            return Err(av_error(ret));
        }
        Ok(())
    }

    pub(crate) fn receive_frame(&mut self, frame: *mut ffi::AVFrame) -> BackendResult<Received> {
        let ret = unsafe { ffi::avcodec_receive_frame(self.ptr, frame) };
        if ret >= 0 {
            Ok(Received::Frame)
        } else if ret == ffi::AVERROR(ffi::EAGAIN) {
            Ok(Received::Again)
        } else if ret == ffi::AVERROR_EOF {
            Ok(Received::Eof)
        } else {
            Err(av_error(ret))
        }
    }
}

impl Drop for CodecContext {
    fn drop(&mut self) {
        unsafe {
            if !self.packet.is_null() {
                ffi::av_packet_free(&mut self.packet);
            }
            if !self.ptr.is_null() {
                ffi::avcodec_free_context(&mut self.ptr);
            }
        }
    }
}

// SAFETY: The context is exclusively owned and only ever used through
// `&mut self`, so it is never touched from two threads at once.
unsafe impl Send for CodecContext {}

/**
    Point `ctx` at `negotiation` and route its format selection through
    [`select_hw_format`].

    # Safety

    `ctx` must be a valid context, and `negotiation` must outlive it or be
    detached before it moves.
*/
unsafe fn install_format_selection(ctx: *mut ffi::AVCodecContext, negotiation: &mut Negotiation) {
    unsafe {
        (*ctx).opaque = negotiation as *mut Negotiation as *mut c_void;
        (*ctx).get_format = Some(select_hw_format);
    }
}

/**
    `get_format` callback: picks the surface format negotiated for the
    context it is called on.
*/
unsafe extern "C" fn select_hw_format(
    ctx: *mut ffi::AVCodecContext,
    formats: *const ffi::AVPixelFormat,
) -> ffi::AVPixelFormat {
    unsafe {
        let negotiation = (*ctx).opaque as *const Negotiation;
        if !negotiation.is_null() && !formats.is_null() {
            let wanted = (*negotiation).hw_format;
            let mut p = formats;
            while *p != ffi::AVPixelFormat::AV_PIX_FMT_NONE {
                if *p == wanted {
                    return *p;
                }
                p = p.add(1);
            }
        }
    }

    error!("failed to get HW surface format");
    ffi::AVPixelFormat::AV_PIX_FMT_NONE
}

// AV_CODEC_HW_CONFIG_METHOD_HW_DEVICE_CTX
const HW_CONFIG_METHOD_HW_DEVICE_CTX: c_int = 0x01;

fn codec_id(codec: CodecId) -> ffi::AVCodecID {
    match codec {
        CodecId::H264 => ffi::AVCodecID::AV_CODEC_ID_H264,
        CodecId::H265 => ffi::AVCodecID::AV_CODEC_ID_HEVC,
    }
}

pub(crate) fn parser_codec_id(codec: CodecId) -> c_int {
    codec_id(codec) as c_int
}

fn find_decoder_by_name(name: &str) -> Option<*const ffi::AVCodec> {
    let name = CString::new(name).ok()?;
    let codec = unsafe { ffi::avcodec_find_decoder_by_name(name.as_ptr()) };
    (!codec.is_null()).then_some(codec)
}

/**
    Find the default decoder for `codec` and enumerate its hardware
    configurations.
*/
pub(crate) fn find_decoder(codec: CodecId) -> Option<DecoderInfo<ffi::AVHWDeviceType>> {
    unsafe {
        let decoder = ffi::avcodec_find_decoder(codec_id(codec));
        if decoder.is_null() {
            return None;
        }

        let name = CStr::from_ptr((*decoder).name).to_string_lossy().into_owned();

        let mut hw_configs = Vec::new();
        for i in 0.. {
            let config = ffi::avcodec_get_hw_config(decoder, i);
            if config.is_null() {
                break;
            }
            let methods = (*config).methods;
            hw_configs.push(HwConfig {
                device_ctx: (methods & HW_CONFIG_METHOD_HW_DEVICE_CTX) != 0,
                device: (*config).device_type,
                pixel_format: format::from_av((*config).pix_fmt),
            });
        }

        Some(DecoderInfo {
            name,
            codec,
            hw_configs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ffmpeg_next::ffi::AVPixelFormat::*;

    struct BareContext(*mut ffi::AVCodecContext);

    impl BareContext {
        fn new() -> Self {
            let ptr = unsafe { ffi::avcodec_alloc_context3(ptr::null()) };
            assert!(!ptr.is_null());
            Self(ptr)
        }

        fn select(&self, offered: &[ffi::AVPixelFormat]) -> ffi::AVPixelFormat {
            unsafe {
                let callback = (*self.0).get_format.unwrap();
                callback(self.0, offered.as_ptr())
            }
        }
    }

    impl Drop for BareContext {
        fn drop(&mut self) {
            unsafe { ffi::avcodec_free_context(&mut self.0) };
        }
    }

    #[test]
    fn each_context_selects_its_own_surface_format() {
        let mut vaapi = Negotiation {
            hw_format: AV_PIX_FMT_VAAPI,
        };
        let mut cuda = Negotiation {
            hw_format: AV_PIX_FMT_CUDA,
        };
        let first = BareContext::new();
        let second = BareContext::new();
        unsafe {
            install_format_selection(first.0, &mut vaapi);
            install_format_selection(second.0, &mut cuda);
        }

        let offered = [AV_PIX_FMT_VAAPI, AV_PIX_FMT_CUDA, AV_PIX_FMT_NV12, AV_PIX_FMT_NONE];
        assert_eq!(first.select(&offered), AV_PIX_FMT_VAAPI);
        assert_eq!(second.select(&offered), AV_PIX_FMT_CUDA);

        // Reversed order must not change either answer
        let reversed = [AV_PIX_FMT_CUDA, AV_PIX_FMT_VAAPI, AV_PIX_FMT_NONE];
        assert_eq!(first.select(&reversed), AV_PIX_FMT_VAAPI);
        assert_eq!(second.select(&reversed), AV_PIX_FMT_CUDA);
    }

    #[test]
    fn missing_surface_format_selects_none() {
        let mut vaapi = Negotiation {
            hw_format: AV_PIX_FMT_VAAPI,
        };
        let context = BareContext::new();
        unsafe { install_format_selection(context.0, &mut vaapi) };

        let software = [AV_PIX_FMT_YUV420P, AV_PIX_FMT_NV12, AV_PIX_FMT_NONE];
        assert_eq!(context.select(&software), AV_PIX_FMT_NONE);
        assert_eq!(context.select(&[AV_PIX_FMT_NONE]), AV_PIX_FMT_NONE);
    }

    #[test]
    fn context_without_negotiation_selects_none() {
        let context = BareContext::new();
        unsafe { (*context.0).get_format = Some(select_hw_format) };

        let offered = [AV_PIX_FMT_VAAPI, AV_PIX_FMT_NONE];
        assert_eq!(context.select(&offered), AV_PIX_FMT_NONE);
    }
}
