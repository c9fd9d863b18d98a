/*!
    Hardware device support.
*/

use std::ffi::{CStr, CString};
use std::ptr;

use ffmpeg_next::ffi;

use hwdec_types::BackendResult;

use crate::av_error;

/**
    Hardware device context wrapper.

    The context is reference-counted by FFmpeg; codec contexts take their
    own reference through [`DeviceContext::create_ref`], and dropping this
    wrapper releases only the reference it holds.
*/
pub struct DeviceContext {
    ctx: *mut ffi::AVBufferRef,
}

impl DeviceContext {
    /**
        Create a device context for the given device type.
    */
    pub(crate) fn create(device_type: ffi::AVHWDeviceType) -> BackendResult<Self> {
        unsafe {
            let mut hw_device_ctx: *mut ffi::AVBufferRef = ptr::null_mut();
            let ret = ffi::av_hwdevice_ctx_create(
                &mut hw_device_ctx,
                device_type,
                ptr::null(),
                ptr::null_mut(),
                0,
            );

            if ret < 0 {
                return Err(av_error(ret));
            }
            if hw_device_ctx.is_null() {
                return Err(hwdec_types::BackendError::new(
                    "failed to create specified HW device",
                ));
            }

            Ok(Self { ctx: hw_device_ctx })
        }
    }

    /**
        Create a new reference to the context for use in a decoder.
    */
    pub(crate) fn create_ref(&self) -> *mut ffi::AVBufferRef {
        unsafe { ffi::av_buffer_ref(self.ctx) }
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        if !self.ctx.is_null() {
            unsafe {
                ffi::av_buffer_unref(&mut self.ctx);
            }
        }
    }
}

// SAFETY: The FFmpeg buffer reference is internally reference-counted
// and thread-safe for the operations we perform.
unsafe impl Send for DeviceContext {}

/**
    Look up a device type by its exact name.
*/
pub(crate) fn find_type_by_name(name: &str) -> Option<ffi::AVHWDeviceType> {
    let name = CString::new(name).ok()?;
    let device_type = unsafe { ffi::av_hwdevice_find_type_by_name(name.as_ptr()) };
    (device_type != ffi::AVHWDeviceType::AV_HWDEVICE_TYPE_NONE).then_some(device_type)
}

/**
    Every device type compiled into FFmpeg.
*/
pub(crate) fn device_types() -> Vec<ffi::AVHWDeviceType> {
    let mut types = Vec::new();
    let mut current = ffi::AVHWDeviceType::AV_HWDEVICE_TYPE_NONE;
    loop {
        current = unsafe { ffi::av_hwdevice_iterate_types(current) };
        if current == ffi::AVHWDeviceType::AV_HWDEVICE_TYPE_NONE {
            break;
        }
        types.push(current);
    }
    types
}

pub(crate) fn type_name(device_type: ffi::AVHWDeviceType) -> String {
    unsafe {
        let name = ffi::av_hwdevice_get_type_name(device_type);
        if name.is_null() {
            "unknown".to_string()
        } else {
            CStr::from_ptr(name).to_string_lossy().into_owned()
        }
    }
}
