/*!
    Hardware video decoding.

    This crate turns a continuous H.264/HEVC elementary stream into decoded
    frames. A [`HardwareDecodeSession`] owns one device context, one codec
    context and one parser for its whole lifetime, and normalizes every
    frame it returns to host memory.

    The session is generic over a [`DecodeBackend`]; the FFmpeg
    implementation lives in `hwdec-ffmpeg`.

    # Example

    ```ignore
    use hwdec_decode::{DecoderConfig, HardwareDecodeSession};
    use hwdec_ffmpeg::FfmpegBackend;

    let config = DecoderConfig::new("h264", "vaapi");
    let mut session = HardwareDecodeSession::new(FfmpegBackend::new()?, &config)?;

    let mut data = &chunk[..];
    while !data.is_empty() {
        let consumed = session.parse(data);
        data = &data[consumed..];
        if session.is_frame_available() {
            if let Some(frame) = session.decode()? {
                // frame is only valid until the next call on the session
            }
        }
    }

    // End of stream: flush the parser, then drain the decoder
    session.parse(&[]);
    while let Some(frame) = session.drain()? {
        // ...
    }
    ```

    # Frames That Don't Arrive

    A decode cycle that yields no frame (the codec wants more input, or it
    has been drained) returns `Ok(None)`. That is a normal outcome, not an
    error.
*/

pub use hwdec_types::{
    CodecId, DecodeBackend, DecodeStage, DecodedFrame, Error, InitError, PixelFormat, Residency,
    Result,
};

mod config;
mod parser;
mod session;

pub use config::{DecoderConfig, HwDevice};
pub use parser::BitstreamParser;
pub use session::HardwareDecodeSession;
