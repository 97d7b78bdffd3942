//! In-place editing of the leading stream identifier.
//!
//! These helpers touch only the first four bytes of a buffer and never decode
//! the rest of the header, so routing and resumption code can relocate frames
//! between streams without re-encoding them. In-place edits take `&mut [u8]`:
//! exclusive access for the duration of the call is the only synchronisation
//! they need.

use bytes::{Buf, BufMut, Bytes, BytesMut, buf::Chain};

use super::InvalidFrame;
use crate::byte_order::{array_at, read_network_u32, write_network_u32};

/// Width of the stream identifier field.
pub const STREAM_ID_SIZE: usize = 4;

fn truncated(have: usize) -> InvalidFrame {
    InvalidFrame::Truncated {
        have,
        need: STREAM_ID_SIZE,
    }
}

/// Read the stream identifier without consuming anything.
///
/// # Errors
///
/// Returns [`InvalidFrame::Truncated`] if `frame` is shorter than four bytes.
///
/// # Examples
///
/// ```
/// use rsocket_frame::frame::peek_stream_id;
///
/// assert_eq!(peek_stream_id(&[0, 0, 1, 2, 0x28, 0]), Ok(258));
/// ```
pub fn peek_stream_id(frame: &[u8]) -> Result<u32, InvalidFrame> {
    array_at::<STREAM_ID_SIZE>(frame, 0)
        .map(read_network_u32)
        .ok_or_else(|| truncated(frame.len()))
}

/// Overwrite the stream identifier in place, returning the previous value.
///
/// # Errors
///
/// Returns [`InvalidFrame::Truncated`] if `frame` is shorter than four bytes;
/// the buffer is not modified in that case.
pub fn replace_stream_id(frame: &mut [u8], stream_id: u32) -> Result<u32, InvalidFrame> {
    let have = frame.len();
    let field = frame
        .get_mut(..STREAM_ID_SIZE)
        .ok_or_else(|| truncated(have))?;
    let previous = array_at::<STREAM_ID_SIZE>(field, 0)
        .map(read_network_u32)
        .ok_or_else(|| truncated(have))?;
    field.copy_from_slice(&write_network_u32(stream_id));
    Ok(previous)
}

/// View of `frame` after the stream identifier.
///
/// The returned [`Bytes`] shares storage with `frame`.
///
/// # Errors
///
/// Returns [`InvalidFrame::Truncated`] if `frame` is shorter than four bytes.
pub fn strip_stream_id(frame: &Bytes) -> Result<Bytes, InvalidFrame> {
    if frame.len() < STREAM_ID_SIZE {
        return Err(truncated(frame.len()));
    }
    Ok(frame.slice(STREAM_ID_SIZE..))
}

/// Put a stream identifier in front of identifier-less content.
///
/// `body` is not copied; see [`StreamIdPrefixed`].
#[must_use]
pub fn prepend_stream_id(stream_id: u32, body: Bytes) -> StreamIdPrefixed {
    StreamIdPrefixed { stream_id, body }
}

/// A stream identifier logically followed by a shared body buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamIdPrefixed {
    stream_id: u32,
    body: Bytes,
}

impl StreamIdPrefixed {
    /// The prepended identifier.
    #[must_use]
    pub const fn stream_id(&self) -> u32 { self.stream_id }

    /// The content following the identifier.
    #[must_use]
    pub fn body(&self) -> &Bytes { &self.body }

    /// Total length, identifier included.
    #[must_use]
    pub fn len(&self) -> usize { STREAM_ID_SIZE + self.body.len() }

    /// Always `false`: the identifier alone is four bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool { false }

    /// Convert into a [`Buf`] that yields the identifier then the body,
    /// suitable for vectored writes.
    #[must_use]
    pub fn into_buf(self) -> Chain<Bytes, Bytes> {
        let id = Bytes::copy_from_slice(&write_network_u32(self.stream_id));
        id.chain(self.body)
    }

    /// Copy into one contiguous buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.len());
        buf.put_slice(&write_network_u32(self.stream_id));
        buf.put_slice(&self.body);
        buf.freeze()
    }
}
