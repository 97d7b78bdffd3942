//! Frame header codec, type registry, and body layout.
//!
//! Every RSocket frame starts with the same six-byte header. This module owns
//! that layout: the [`FrameType`] registry, the [`FrameFlags`] bit set, the
//! [`FrameHeaderCodec`] that packs and inspects headers, the stream-identifier
//! editor, and the [`FrameBody`] split used by fragmentation.

pub mod body;
pub mod error;
pub mod flags;
pub mod frame_type;
pub mod header;
pub mod stream_id;

pub use body::{FrameBody, METADATA_LENGTH_SIZE};
pub use error::{FrameError, InvalidFrame, ProtocolViolation};
pub use flags::FrameFlags;
pub use frame_type::{FrameType, PAYLOAD_CODE};
pub use header::{FrameHeader, FrameHeaderCodec, HEADER_SIZE};
pub use stream_id::{
    STREAM_ID_SIZE,
    StreamIdPrefixed,
    peek_stream_id,
    prepend_stream_id,
    replace_stream_id,
    strip_stream_id,
};
