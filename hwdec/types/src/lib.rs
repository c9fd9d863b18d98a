/*!
    Shared types for the hardware decoding crates.

    This crate defines the vocabulary that crosses crate boundaries. It has
    no dependency on FFmpeg, so the decode session and the color converter
    can be written (and tested) against the capability traits alone.

    # Core Types

    - [`CodecId`] - Codec families the session knows how to drive
    - [`PixelFormat`] - Source, hardware surface and destination pixel formats
    - [`DecodedFrame`] - Borrowed view of a host-resident decoded frame
    - [`ConvertedFrame`] - Descriptor of a frame written by the converter

    # Backend Capabilities

    - [`DecodeBackend`] - Device lookup, codec negotiation, parsing, decoding
    - [`ScaleBackend`] - Conversion contexts and buffer layout

    # Error Handling

    - [`Error`], [`InitError`], [`DecodeStage`] and [`Result`]
*/

mod backend;
mod codec;
mod error;
mod format;
mod frame;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use backend::{
    BackendResult, DecodeBackend, DecoderInfo, HwConfig, ImageLayout, Received, ScaleBackend,
    ScalerKey, ScalingAlgorithm,
};
pub use codec::CodecId;
pub use error::{BackendError, DecodeStage, Error, InitError, Result};
pub use format::PixelFormat;
pub use frame::{ConvertedFrame, DecodedFrame, MAX_PLANES, Residency};
