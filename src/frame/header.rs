//! Fixed six-byte frame header codec.
//!
//! ```text
//!  0                   1                   2                   3
//! +-------------------------------+-----------+-------------------+
//! |        stream id (u32 BE)     | type (6)  |     flags (10)    |
//! +-------------------------------+-----------+-------------------+
//! ```
//!
//! Reads never advance a cursor: every accessor inspects the buffer in place,
//! so the same frame can be inspected repeatedly and handed on untouched.

use bytes::{BufMut, BytesMut};

use super::{
    FrameError,
    FrameFlags,
    FrameType,
    InvalidFrame,
    ProtocolViolation,
    flags::FLAGS_MASK,
    frame_type::MAX_TYPE_CODE,
    stream_id::{STREAM_ID_SIZE, peek_stream_id},
};
use crate::{
    byte_order::{array_at, read_network_u16, write_network_u16, write_network_u32},
    config::FrameTypeCheck,
};

/// Size of the frame header in bytes.
pub const HEADER_SIZE: usize = STREAM_ID_SIZE + 2;

const FRAME_TYPE_BITS: u16 = 6;
const FRAME_TYPE_SHIFT: u16 = 16 - FRAME_TYPE_BITS;

/// Header fields decoded together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// Stream the frame belongs to; zero for connection-level frames.
    pub stream_id: u32,
    /// Decoded type, with payload variants already resolved.
    pub frame_type: FrameType,
    /// The 10 flag bits.
    pub flags: FrameFlags,
}

/// Encoder and inspector for frame headers.
///
/// The codec only carries the [`FrameTypeCheck`] setting; encoding and
/// decoding results never depend on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeaderCodec {
    type_check: FrameTypeCheck,
}

impl FrameHeaderCodec {
    /// Create a codec with an explicit type-check setting.
    #[must_use]
    pub const fn new(type_check: FrameTypeCheck) -> Self { Self { type_check } }

    /// The type-check setting this codec enforces.
    #[must_use]
    pub const fn type_check(&self) -> FrameTypeCheck { self.type_check }

    /// Encode a header.
    ///
    /// Flag bits above the 10-bit field are silently dropped. Virtual payload
    /// types, and [`FrameType::Payload`] itself, are written with the shared
    /// payload code and must carry matching Next/Complete bits.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFrame::MetadataNotPermitted`] when the Metadata flag is
    /// set on a type that cannot carry metadata, and
    /// [`InvalidFrame::AmbiguousPayload`] or
    /// [`InvalidFrame::PayloadFlagsMismatch`] when payload flags would not
    /// decode back to `frame_type`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rsocket_frame::frame::{FrameHeaderCodec, FrameType};
    ///
    /// let codec = FrameHeaderCodec::default();
    /// let header = codec.encode(7, FrameType::Cancel, 0).expect("valid header");
    /// assert_eq!(header, [0, 0, 0, 7, 0x24, 0x00]);
    /// ```
    pub fn encode(
        &self,
        stream_id: u32,
        frame_type: FrameType,
        flags: u16,
    ) -> Result<[u8; HEADER_SIZE], InvalidFrame> {
        let flags = FrameFlags::truncate(flags);
        validate(frame_type, flags)?;

        Ok(pack_header(stream_id, frame_type.encoded_code(), flags))
    }

    /// Encode a header and append it to `dst`.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`FrameHeaderCodec::encode`]; `dst`
    /// is left untouched on error.
    pub fn encode_into(
        &self,
        dst: &mut BytesMut,
        stream_id: u32,
        frame_type: FrameType,
        flags: u16,
    ) -> Result<(), InvalidFrame> {
        let header = self.encode(stream_id, frame_type, flags)?;
        dst.put_slice(&header);
        Ok(())
    }

    /// Read the 10 flag bits.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFrame::Truncated`] if `frame` is shorter than a header.
    pub fn decode_flags(&self, frame: &[u8]) -> Result<FrameFlags, InvalidFrame> {
        Ok(FrameFlags::truncate(type_and_flags(frame)?))
    }

    /// Read the 6-bit type code without resolving payload variants.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFrame::Truncated`] if `frame` is shorter than a header.
    pub fn decode_type_code(&self, frame: &[u8]) -> Result<u8, InvalidFrame> {
        let code = type_and_flags(frame)? >> FRAME_TYPE_SHIFT;
        Ok(u8::try_from(code).unwrap_or(u8::MAX))
    }

    /// Decode the frame type, resolving the shared payload code through the
    /// Next/Complete flags of the same header.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFrame::Truncated`] for short buffers,
    /// [`InvalidFrame::UnknownType`] for unassigned codes, and
    /// [`InvalidFrame::AmbiguousPayload`] for a payload frame with neither
    /// Next nor Complete set.
    pub fn decode_type(&self, frame: &[u8]) -> Result<FrameType, InvalidFrame> {
        let frame_type = FrameType::from_code(self.decode_type_code(frame)?)?;
        if frame_type == FrameType::Payload {
            return FrameType::resolve_payload(self.decode_flags(frame)?);
        }
        Ok(frame_type)
    }

    /// Decode every header field at once.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`FrameHeaderCodec::decode_type`].
    pub fn decode(&self, frame: &[u8]) -> Result<FrameHeader, InvalidFrame> {
        Ok(FrameHeader {
            stream_id: peek_stream_id(frame)?,
            frame_type: self.decode_type(frame)?,
            flags: self.decode_flags(frame)?,
        })
    }

    /// Whether the Metadata flag is set.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFrame::Truncated`] if `frame` is shorter than a header.
    pub fn has_metadata(&self, frame: &[u8]) -> Result<bool, InvalidFrame> {
        Ok(self.decode_flags(frame)?.contains(FrameFlags::METADATA))
    }

    /// Check that `frame` decodes to `expected`.
    ///
    /// Does nothing when the codec was built with
    /// [`FrameTypeCheck::Disabled`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolViolation::TypeMismatch`] when the decoded type
    /// differs, or the decoding error when the header cannot be decoded.
    pub fn assert_type(&self, expected: FrameType, frame: &[u8]) -> Result<(), FrameError> {
        if !self.type_check.is_enabled() {
            return Ok(());
        }
        let found = self.decode_type(frame)?;
        if found != expected {
            tracing::debug!(%expected, %found, "frame type assertion failed");
            return Err(ProtocolViolation::TypeMismatch { expected, found }.into());
        }
        Ok(())
    }
}

impl Default for FrameHeaderCodec {
    fn default() -> Self { Self::new(FrameTypeCheck::process_default()) }
}

fn validate(frame_type: FrameType, flags: FrameFlags) -> Result<(), InvalidFrame> {
    if flags.contains(FrameFlags::METADATA) && !frame_type.can_carry_metadata() {
        return Err(InvalidFrame::MetadataNotPermitted { frame_type });
    }
    if frame_type.is_payload() {
        let resolved = FrameType::resolve_payload(flags)?;
        if frame_type != FrameType::Payload && resolved != frame_type {
            return Err(InvalidFrame::PayloadFlagsMismatch {
                frame_type,
                flags: flags.bits(),
            });
        }
    }
    Ok(())
}

/// Pack header fields without validating them.
pub(crate) fn pack_header(stream_id: u32, type_code: u8, flags: FrameFlags) -> [u8; HEADER_SIZE] {
    let type_and_flags =
        (u16::from(type_code & MAX_TYPE_CODE) << FRAME_TYPE_SHIFT) | (flags.bits() & FLAGS_MASK);
    let [s0, s1, s2, s3] = write_network_u32(stream_id);
    let [t0, t1] = write_network_u16(type_and_flags);
    [s0, s1, s2, s3, t0, t1]
}

fn type_and_flags(frame: &[u8]) -> Result<u16, InvalidFrame> {
    array_at::<2>(frame, STREAM_ID_SIZE)
        .map(read_network_u16)
        .ok_or(InvalidFrame::Truncated {
            have: frame.len(),
            need: HEADER_SIZE,
        })
}
