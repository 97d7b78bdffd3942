//! Length-prefixed framing for byte-stream transports.
//!
//! TCP and similar transports carry RSocket frames behind a 24-bit big-endian
//! length field. [`FrameLengthCodec`] adapts `tokio_util`'s
//! [`LengthDelimitedCodec`] to that layout so a [`Framed`] stream yields and
//! accepts bare frames as [`Bytes`].
//!
//! Failures surface as [`io::Error`] values wrapping a [`FrameLengthError`],
//! as `tokio_util` codecs require:
//!
//! - oversized frames map to [`io::ErrorKind::InvalidData`];
//! - truncated input at end of stream maps to [`io::ErrorKind::UnexpectedEof`].
//!
//! [`Framed`]: tokio_util::codec::Framed

use std::io;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::{
    byte_order::{array_at, read_network_u24},
    config::MAX_FRAME_SIZE,
    fragment::FRAME_LENGTH_SIZE,
};

/// Framing failures reported by [`FrameLengthCodec`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FrameLengthError {
    /// Frame exceeds the configured maximum.
    #[error("frame of {size} bytes exceeds maximum of {max} bytes")]
    Oversized {
        /// Frame size in bytes, excluding the length prefix.
        size: usize,
        /// Configured maximum.
        max: usize,
    },
    /// Stream ended inside a length prefix.
    #[error("premature EOF during length prefix: {bytes_received} of {header_size} bytes")]
    MidHeader {
        /// Prefix bytes received before EOF.
        bytes_received: usize,
        /// Width of the length prefix.
        header_size: usize,
    },
    /// Stream ended inside a frame.
    #[error("premature EOF: {bytes_received} bytes of {expected} byte frame received")]
    MidFrame {
        /// Frame bytes received before EOF.
        bytes_received: usize,
        /// Length announced by the prefix.
        expected: usize,
    },
}

impl From<FrameLengthError> for io::Error {
    fn from(err: FrameLengthError) -> Self {
        match err {
            FrameLengthError::Oversized { .. } => io::Error::new(io::ErrorKind::InvalidData, err),
            FrameLengthError::MidHeader { .. } | FrameLengthError::MidFrame { .. } => {
                io::Error::new(io::ErrorKind::UnexpectedEof, err)
            }
        }
    }
}

/// Codec for frames preceded by a 24-bit length.
#[derive(Debug)]
pub struct FrameLengthCodec {
    inner: LengthDelimitedCodec,
    max_frame_length: usize,
}

impl FrameLengthCodec {
    /// Construct a codec accepting frames of up to `max_frame_length` bytes.
    ///
    /// The limit is clamped to what the length field can describe.
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        let max_frame_length = max_frame_length.min(MAX_FRAME_SIZE);
        let inner = LengthDelimitedCodec::builder()
            .length_field_length(FRAME_LENGTH_SIZE)
            .max_frame_length(max_frame_length)
            .new_codec();
        Self {
            inner,
            max_frame_length,
        }
    }

    /// Return the maximum frame length accepted by this codec.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }
}

impl Default for FrameLengthCodec {
    fn default() -> Self { Self::new(MAX_FRAME_SIZE) }
}

impl Decoder for FrameLengthCodec {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // The inner codec consumes the prefix as soon as it is readable, so it
        // only sees complete frames and the buffer stays classifiable at EOF.
        if let Some(len) = announced_len(src) {
            if len > self.max_frame_length {
                return Err(FrameLengthError::Oversized {
                    size: len,
                    max: self.max_frame_length,
                }
                .into());
            }
            let total = FRAME_LENGTH_SIZE.saturating_add(len);
            if src.len() < total {
                src.reserve(total - src.len());
                return Ok(None);
            }
        }
        self.inner.decode(src).map(|opt| opt.map(BytesMut::freeze))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                let err = eof_error(src);
                tracing::debug!(error = %err, "stream ended inside a frame");
                Err(err.into())
            }
        }
    }
}

impl Encoder<Bytes> for FrameLengthCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_frame_length {
            return Err(FrameLengthError::Oversized {
                size: item.len(),
                max: self.max_frame_length,
            }
            .into());
        }
        self.inner.encode(item, dst)
    }
}

fn announced_len(src: &[u8]) -> Option<usize> {
    array_at::<FRAME_LENGTH_SIZE>(src, 0).map(|prefix| read_network_u24(prefix) as usize)
}

/// Classify a truncated buffer left at end of stream.
fn eof_error(src: &[u8]) -> FrameLengthError {
    let bytes_received = src.len();
    match announced_len(src) {
        Some(expected) => FrameLengthError::MidFrame {
            bytes_received: bytes_received.saturating_sub(FRAME_LENGTH_SIZE),
            expected,
        },
        None => FrameLengthError::MidHeader {
            bytes_received,
            header_size: FRAME_LENGTH_SIZE,
        },
    }
}
