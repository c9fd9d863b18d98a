/*!
    Error types for the hardware decoding crates.
*/

use std::fmt;

use thiserror::Error;

use crate::CodecId;

/**
    Error type for the hardware decoding crates.

    Construction problems are reported as [`Error::Init`] and leave no
    session behind. Everything that goes wrong afterwards is an
    [`Error::Decode`] tagged with the stage that failed.
*/
#[derive(Debug, Error)]
pub enum Error {
    #[error("initialization failed: {0}")]
    Init(#[from] InitError),

    #[error("decode failed during {stage}: {message}")]
    Decode { stage: DecodeStage, message: String },
}

/**
    Reasons a decode session can fail to come up.
*/
#[derive(Debug, Error)]
pub enum InitError {
    #[error("device type {name} is not supported, available device types: {}", .available.join(" "))]
    UnsupportedDevice { name: String, available: Vec<String> },

    #[error("unsupported codec type: {0}")]
    UnsupportedCodec(String),

    #[error("cannot find decoder for {0}")]
    DecoderNotFound(CodecId),

    #[error("decoder {decoder} does not support device type {device}")]
    NoHwConfig { decoder: String, device: String },

    #[error("cannot {what}: {source}")]
    Backend {
        what: &'static str,
        #[source]
        source: BackendError,
    },
}

/**
    The step of a decode cycle (or conversion) that failed.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecodeStage {
    /// Submitting a packet (or end of stream) to the codec
    Submit,
    /// Retrieving a frame from the codec
    Receive,
    /// Copying a device-resident frame into host memory
    Transfer,
    /// Retrieving buffered frames after end of stream
    Drain,
    /// Converting a frame into the destination layout
    Convert,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submit => "packet submission",
            Self::Receive => "frame retrieval",
            Self::Transfer => "host transfer",
            Self::Drain => "drain",
            Self::Convert => "conversion",
        };
        f.write_str(name)
    }
}

/**
    Error reported by a backend capability.

    Carries the backend's own description (for FFmpeg, the `av_strerror`
    text) so it can be attached to an [`Error`] with stage context.
*/
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Error {
    /**
        Create a decode error for the given stage.
    */
    pub fn decode(stage: DecodeStage, message: impl Into<String>) -> Self {
        Self::Decode {
            stage,
            message: message.into(),
        }
    }

    /**
        Wrap a backend failure during construction.
    */
    pub fn backend_init(what: &'static str, source: BackendError) -> Self {
        Self::Init(InitError::Backend { what, source })
    }

    /**
        Returns true if this error came from session construction.
    */
    pub fn is_init(&self) -> bool {
        matches!(self, Self::Init(_))
    }

    /**
        Returns true if this error came from a decode cycle or conversion.
    */
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /**
        Returns the failing stage for decode errors.
    */
    pub fn stage(&self) -> Option<DecodeStage> {
        match self {
            Self::Decode { stage, .. } => Some(*stage),
            Self::Init(_) => None,
        }
    }
}

/**
    Result type alias for the hardware decoding crates.
*/
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn error_display() {
        let e = Error::from(InitError::UnsupportedCodec("vp9".into()));
        assert_eq!(
            format!("{e}"),
            "initialization failed: unsupported codec type: vp9"
        );

        let e = Error::decode(DecodeStage::Transfer, "device lost");
        assert_eq!(
            format!("{e}"),
            "decode failed during host transfer: device lost"
        );
    }

    #[test]
    fn unsupported_device_lists_alternatives() {
        let e = InitError::UnsupportedDevice {
            name: "dxva3".into(),
            available: vec!["vaapi".into(), "cuda".into()],
        };
        let text = format!("{e}");
        assert!(text.contains("dxva3"));
        assert!(text.ends_with("vaapi cuda"));
    }

    #[test]
    fn error_kind_checks() {
        let init = Error::from(InitError::DecoderNotFound(CodecId::H265));
        assert!(init.is_init());
        assert!(!init.is_decode());
        assert_eq!(init.stage(), None);

        let decode = Error::decode(DecodeStage::Receive, "bad frame");
        assert!(decode.is_decode());
        assert_eq!(decode.stage(), Some(DecodeStage::Receive));
    }

    #[test]
    fn backend_error_is_source() {
        let e = Error::backend_init("open codec", BackendError::new("Invalid argument"));
        assert_eq!(format!("{e}"), "initialization failed: cannot open codec: Invalid argument");

        let Error::Init(inner) = &e else {
            panic!("expected init error");
        };
        assert!(StdError::source(inner).is_some());
    }
}
