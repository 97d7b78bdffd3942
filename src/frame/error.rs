//! Error types raised while encoding, decoding, or checking frame headers.
//!
//! - [`InvalidFrame`]: a malformed flag/type combination or a buffer too short
//!   for the field being read.
//! - [`ProtocolViolation`]: a well-formed frame arriving where the protocol
//!   does not allow it.
//! - [`FrameError`]: either of the above, returned by checks that can hit both.

use thiserror::Error;

use super::FrameType;

/// Malformed frame contents.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum InvalidFrame {
    /// The Metadata flag was set on a type that cannot carry metadata.
    #[error("metadata not permitted for type {frame_type}")]
    MetadataNotPermitted { frame_type: FrameType },
    /// A payload frame set neither Next nor Complete.
    #[error("payload frame must set Next or Complete")]
    AmbiguousPayload,
    /// The Next/Complete flags contradict the virtual payload type requested.
    #[error("flags {flags:#05x} do not match frame type {frame_type}")]
    PayloadFlagsMismatch { frame_type: FrameType, flags: u16 },
    /// The 6-bit type code is not assigned.
    #[error("unknown frame type code {code:#04x}")]
    UnknownType { code: u8 },
    /// The buffer ended before the field being read.
    #[error("frame truncated: have {have} bytes, need {need}")]
    Truncated { have: usize, need: usize },
    /// Metadata does not fit the 24-bit length field.
    #[error("metadata length {len} exceeds the 24-bit length field")]
    MetadataTooLarge { len: usize },
}

/// A frame that is valid on its own but breaks the protocol in context.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// The decoded type differs from the one the caller expected.
    #[error("expected frame type {expected}, but saw {found}")]
    TypeMismatch { expected: FrameType, found: FrameType },
    /// A fragment belongs to a different stream than the frame being assembled.
    #[error("interleaved fragment stream mismatch: assembling {expected}, received {found}")]
    StreamMismatch { expected: u32, found: u32 },
    /// A fragment continuing a frame was not a payload frame.
    #[error("continuation fragment must be a payload frame, saw {found}")]
    UnexpectedContinuation { found: FrameType },
    /// A continuation carried metadata after data had already been buffered.
    #[error("metadata fragment for stream {stream_id} arrived after data")]
    MetadataAfterData { stream_id: u32 },
    /// The Follows flag was set on a type that cannot be fragmented.
    #[error("frame type {frame_type} cannot be fragmented")]
    NotFragmentable { frame_type: FrameType },
}

/// Union of header-level failures.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The frame could not be decoded.
    #[error(transparent)]
    Invalid(#[from] InvalidFrame),
    /// The frame decoded but violates the protocol.
    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),
}
