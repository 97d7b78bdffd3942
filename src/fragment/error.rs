//! Error types emitted by the fragmentation layer.
//!
//! Outbound and inbound failures are kept apart so callers can tell a local
//! configuration problem ([`FragmentationError`]) from a misbehaving peer
//! ([`ReassemblyError`]).

use std::num::NonZeroUsize;

use thiserror::Error;

use crate::frame::{FrameError, FrameType, InvalidFrame, ProtocolViolation};

/// Errors produced while fragmenting outbound frames.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The frame failed header checks or could not be split into sections.
    #[error("cannot fragment frame: {0}")]
    Frame(#[from] FrameError),
    /// The bound cannot hold a header, the fixed fields, and one content byte.
    #[error("fragment size too small to hold a header: {max} < {required}")]
    FragmentTooSmall { max: usize, required: usize },
    /// The frame exceeds the bound but its type cannot be fragmented.
    #[error("frame type {frame_type} cannot be fragmented")]
    NotFragmentable { frame_type: FrameType },
}

impl From<InvalidFrame> for FragmentationError {
    fn from(error: InvalidFrame) -> Self { Self::Frame(error.into()) }
}

/// Errors produced while reassembling inbound fragments.
///
/// Every variant discards the accumulation in progress.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// A fragment could not be decoded.
    #[error("invalid fragment: {0}")]
    Invalid(#[from] InvalidFrame),
    /// A fragment arrived where the protocol forbids it.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),
    /// The reassembled frame would exceed the configured maximum.
    #[error("assembled frame too large for stream {stream_id}: {attempted} > {limit}")]
    AssembledFrameTooLarge {
        stream_id: u32,
        attempted: usize,
        limit: NonZeroUsize,
    },
}
