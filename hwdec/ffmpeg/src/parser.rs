/*!
    Bitstream parser wrapper.
*/

use std::os::raw::c_int;
use std::{ptr, slice};

use ffmpeg_next::ffi;
use tracing::warn;

use hwdec_types::{BackendError, BackendResult, CodecId};

use crate::codec::{CodecContext, parser_codec_id};

/**
    Splits a raw elementary stream into access units.
*/
pub struct ParserContext {
    ptr: *mut ffi::AVCodecParserContext,
    scratch: Vec<u8>,
}

impl ParserContext {
    pub(crate) fn new(codec: CodecId) -> BackendResult<Self> {
        let ptr = unsafe { ffi::av_parser_init(parser_codec_id(codec)) };
        if ptr.is_null() {
            return Err(BackendError::new("cannot init parser"));
        }
        Ok(Self {
            ptr,
            scratch: Vec::new(),
        })
    }

    /**
        Feed bytes to the parser, copying a completed access unit into
        `packet`. Returns the number of bytes consumed.
    */
    pub(crate) fn parse(
        &mut self,
        codec: &mut CodecContext,
        data: &[u8],
        packet: &mut Vec<u8>,
    ) -> usize {
        self.parse_into(codec.as_mut_ptr(), data, packet)
    }

    fn parse_into(
        &mut self,
        avctx: *mut ffi::AVCodecContext,
        data: &[u8],
        packet: &mut Vec<u8>,
    ) -> usize {
        packet.clear();

        let len = data.len().min(c_int::MAX as usize - PADDING);
        pad_input(&mut self.scratch, &data[..len]);

        let mut out: *mut u8 = ptr::null_mut();
        let mut out_size: c_int = 0;

        let ret = unsafe {
            ffi::av_parser_parse2(
                self.ptr,
                avctx,
                &mut out,
                &mut out_size,
                self.scratch.as_ptr(),
                len as c_int,
                ffi::AV_NOPTS_VALUE,
                ffi::AV_NOPTS_VALUE,
                0,
            )
        };

        if out_size > 0 && !out.is_null() {
            // The parser's output buffer is only valid until the next call
            packet.extend_from_slice(unsafe { slice::from_raw_parts(out, out_size as usize) });
        }

        if ret < 0 {
            warn!(code = ret, "parser rejected input, skipping {len} bytes");
            return len;
        }
        ret as usize
    }
}

const PADDING: usize = ffi::AV_INPUT_BUFFER_PADDING_SIZE as usize;

/**
    Copy `data` into `scratch` followed by the zeroed padding FFmpeg's
    bitstream readers may overread into.
*/
fn pad_input(scratch: &mut Vec<u8>, data: &[u8]) {
    scratch.clear();
    scratch.reserve(data.len() + PADDING);
    scratch.extend_from_slice(data);
    scratch.resize(data.len() + PADDING, 0);
}

impl Drop for ParserContext {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { ffi::av_parser_close(self.ptr) };
            self.ptr = ptr::null_mut();
        }
    }
}

// SAFETY: Exclusively owned and only used through `&mut self`.
unsafe impl Send for ParserContext {}

#[cfg(test)]
mod tests {
    use super::*;

    // Access unit delimiters followed by a truncated start code.
    const STREAM: &[u8] = &[
        0, 0, 0, 1, 0x09, 0x10, 0, 0, 0, 1, 0x09, 0x10, 0, 0, 0, 1, 0x09, 0x10, 0, 0,
    ];

    #[test]
    fn padded_input_keeps_data_and_zeroes_tail() {
        let mut scratch = vec![0xFF; 64];
        pad_input(&mut scratch, &[1, 2, 3]);
        assert_eq!(scratch.len(), 3 + PADDING);
        assert_eq!(&scratch[..3], &[1, 2, 3]);
        assert!(scratch[3..].iter().all(|&b| b == 0));

        pad_input(&mut scratch, &[]);
        assert_eq!(scratch.len(), PADDING);
        assert!(scratch.iter().all(|&b| b == 0));
    }

    #[test]
    fn parser_consumes_within_unpadded_input() {
        ffmpeg_next::init().unwrap();
        let mut parser = ParserContext::new(CodecId::H264).unwrap();
        let mut avctx = unsafe { ffi::avcodec_alloc_context3(ptr::null()) };
        assert!(!avctx.is_null());

        let mut packet = Vec::new();
        let mut rest = STREAM;
        let mut guard = 0;
        while !rest.is_empty() && guard < 64 {
            let consumed = parser.parse_into(avctx, rest, &mut packet);
            assert!(consumed <= rest.len());
            assert!(packet.len() <= STREAM.len());
            rest = &rest[consumed..];
            guard += 1;
        }
        assert!(guard > 0);

        drop(parser);
        unsafe { ffi::avcodec_free_context(&mut avctx) };
    }
}
