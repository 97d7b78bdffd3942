#![doc(html_root_url = "https://docs.rs/rsocket-frame/latest")]
//! Public API for the `rsocket-frame` library.
//!
//! This crate implements the RSocket wire framing layer: the frame type
//! registry, the six-byte header codec, stream identifier editing, and the
//! fragmentation and reassembly of frames larger than a negotiated bound.
//! A length-prefixed codec and a small connection wrapper tie the pieces to
//! byte-stream transports.

pub mod byte_order;
pub mod codec;
pub mod config;
pub mod connection;
pub mod fragment;
pub mod frame;
pub mod metrics;

pub use codec::{FrameLengthCodec, FrameLengthError};
pub use config::{FrameTypeCheck, FramingConfig};
pub use connection::{ConnectionError, FrameConnection};
pub use fragment::{
    FragmentationError,
    Fragmenter,
    Fragments,
    FrameLength,
    Reassembler,
    ReassemblyError,
};
pub use frame::{
    FrameBody,
    FrameError,
    FrameFlags,
    FrameHeader,
    FrameHeaderCodec,
    FrameType,
    InvalidFrame,
    ProtocolViolation,
};
pub use self::metrics::{
    FRAGMENTS_EMITTED,
    FRAMES_FRAGMENTED,
    FRAMES_REASSEMBLED,
    REASSEMBLY_DISCARDED,
};
