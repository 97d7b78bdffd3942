//! Body layout shared by request and payload frames.
//!
//! ```text
//! header | fixed fields | [metadata length (u24)] [metadata] | data
//! ```
//!
//! Fixed fields are the initial request-N of `REQUEST_STREAM` and
//! `REQUEST_CHANNEL`. The metadata section is present exactly when the
//! Metadata flag is set, and may be empty.

use bytes::{BufMut, Bytes, BytesMut};

use super::{FrameFlags, FrameHeaderCodec, FrameType, HEADER_SIZE, InvalidFrame};
use crate::byte_order::{
    U24_MAX,
    array_at,
    read_network_u24,
    write_network_u24,
    write_network_u32,
};

/// Width of the metadata length field.
pub const METADATA_LENGTH_SIZE: usize = 3;

/// Parsed body of a request or payload frame.
///
/// All parts share storage with the frame they were parsed from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameBody {
    /// Type-specific fields preceding metadata.
    pub fixed: Bytes,
    /// Metadata section; `Some` iff the Metadata flag is set.
    pub metadata: Option<Bytes>,
    /// Data following metadata.
    pub data: Bytes,
}

impl FrameBody {
    /// Body with data only.
    #[must_use]
    pub fn data(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Body with metadata and data.
    #[must_use]
    pub fn with_metadata(metadata: impl Into<Bytes>, data: impl Into<Bytes>) -> Self {
        Self {
            fixed: Bytes::new(),
            metadata: Some(metadata.into()),
            data: data.into(),
        }
    }

    /// Set the initial request-N field used by stream and channel requests.
    #[must_use]
    pub fn with_initial_request_n(mut self, request_n: u32) -> Self {
        self.fixed = Bytes::copy_from_slice(&write_network_u32(request_n));
        self
    }

    /// Split the body of `frame`, whose type is `frame_type`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFrame::Truncated`] when the frame ends inside the
    /// header, the fixed fields, the metadata length, or the declared
    /// metadata.
    pub fn parse(
        frame: &Bytes,
        frame_type: FrameType,
        flags: FrameFlags,
    ) -> Result<Self, InvalidFrame> {
        let fixed_end = HEADER_SIZE + frame_type.fixed_len();
        if frame.len() < fixed_end {
            return Err(InvalidFrame::Truncated {
                have: frame.len(),
                need: fixed_end,
            });
        }
        let fixed = frame.slice(HEADER_SIZE..fixed_end);

        if !flags.contains(FrameFlags::METADATA) {
            return Ok(Self {
                fixed,
                metadata: None,
                data: frame.slice(fixed_end..),
            });
        }

        let metadata_start = fixed_end + METADATA_LENGTH_SIZE;
        let metadata_len = array_at::<METADATA_LENGTH_SIZE>(frame, fixed_end)
            .map(read_network_u24)
            .ok_or(InvalidFrame::Truncated {
                have: frame.len(),
                need: metadata_start,
            })? as usize;
        let metadata_end = metadata_start + metadata_len;
        if frame.len() < metadata_end {
            return Err(InvalidFrame::Truncated {
                have: frame.len(),
                need: metadata_end,
            });
        }

        Ok(Self {
            fixed,
            metadata: Some(frame.slice(metadata_start..metadata_end)),
            data: frame.slice(metadata_end..),
        })
    }

    /// Decode the header of `frame` and split its body.
    ///
    /// # Errors
    ///
    /// Returns any header decoding error, or those of [`FrameBody::parse`].
    pub fn parse_frame(codec: &FrameHeaderCodec, frame: &Bytes) -> Result<Self, InvalidFrame> {
        let header = codec.decode(frame)?;
        Self::parse(frame, header.frame_type, header.flags)
    }

    /// Encoded body length, excluding the header.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let metadata = self
            .metadata
            .as_ref()
            .map_or(0, |metadata| METADATA_LENGTH_SIZE + metadata.len());
        self.fixed.len() + metadata + self.data.len()
    }

    /// Append the body to `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFrame::MetadataTooLarge`] if the metadata does not fit
    /// the 24-bit length field; nothing is written in that case.
    pub fn encode_into(&self, dst: &mut BytesMut) -> Result<(), InvalidFrame> {
        let metadata_len = self
            .metadata
            .as_ref()
            .map(|metadata| encode_metadata_len(metadata.len()))
            .transpose()?;
        dst.reserve(self.encoded_len());
        dst.put_slice(&self.fixed);
        if let (Some(len), Some(metadata)) = (metadata_len, self.metadata.as_ref()) {
            dst.put_slice(&len);
            dst.put_slice(metadata);
        }
        dst.put_slice(&self.data);
        Ok(())
    }

    /// Encode a complete frame: header followed by this body.
    ///
    /// The Metadata flag is set or cleared to match `self.metadata`, so
    /// callers pass only the remaining flags.
    ///
    /// # Errors
    ///
    /// Returns header validation errors from
    /// [`FrameHeaderCodec::encode`] or the errors of
    /// [`FrameBody::encode_into`].
    pub fn encode_frame(
        &self,
        codec: &FrameHeaderCodec,
        stream_id: u32,
        frame_type: FrameType,
        flags: FrameFlags,
    ) -> Result<Bytes, InvalidFrame> {
        let mut flags = flags;
        flags.set(FrameFlags::METADATA, self.metadata.is_some());
        let mut frame = BytesMut::with_capacity(HEADER_SIZE + self.encoded_len());
        codec.encode_into(&mut frame, stream_id, frame_type, flags.bits())?;
        self.encode_into(&mut frame)?;
        Ok(frame.freeze())
    }
}

pub(crate) fn encode_metadata_len(
    len: usize,
) -> Result<[u8; METADATA_LENGTH_SIZE], InvalidFrame> {
    u32::try_from(len)
        .ok()
        .filter(|len| *len <= U24_MAX)
        .and_then(write_network_u24)
        .ok_or(InvalidFrame::MetadataTooLarge { len })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::config::FrameTypeCheck;

    fn codec() -> FrameHeaderCodec { FrameHeaderCodec::new(FrameTypeCheck::Enabled) }

    #[test]
    fn payload_body_round_trips_with_metadata() {
        let body = FrameBody::with_metadata(&b"meta"[..], &b"data"[..]);
        let frame = body
            .encode_frame(
                &codec(),
                3,
                FrameType::NextComplete,
                FrameFlags::NEXT | FrameFlags::COMPLETE,
            )
            .expect("encode payload");

        assert_eq!(frame.len(), HEADER_SIZE + 3 + 4 + 4);
        assert!(codec().has_metadata(&frame).expect("header present"));
        assert_eq!(FrameBody::parse_frame(&codec(), &frame), Ok(body));
    }

    #[test]
    fn request_stream_keeps_initial_request_n_before_metadata() {
        let body = FrameBody::with_metadata(&b"m"[..], &b"d"[..]).with_initial_request_n(42);
        let frame = body
            .encode_frame(&codec(), 5, FrameType::RequestStream, FrameFlags::empty())
            .expect("encode request");

        assert_eq!(&frame[HEADER_SIZE..HEADER_SIZE + 4], &[0, 0, 0, 42]);
        assert_eq!(&frame[HEADER_SIZE + 4..HEADER_SIZE + 7], &[0, 0, 1]);
        let parsed = FrameBody::parse_frame(&codec(), &frame).expect("parse request");
        assert_eq!(parsed, body);
    }

    #[test]
    fn empty_metadata_section_is_preserved() {
        let body = FrameBody::with_metadata(Bytes::new(), &b"d"[..]);
        let frame = body
            .encode_frame(&codec(), 1, FrameType::Next, FrameFlags::NEXT)
            .expect("encode payload");
        let parsed = FrameBody::parse_frame(&codec(), &frame).expect("parse payload");
        assert_eq!(parsed.metadata, Some(Bytes::new()));
    }

    #[test]
    fn encode_frame_clears_stale_metadata_flag() {
        let frame = FrameBody::data(&b"d"[..])
            .encode_frame(
                &codec(),
                1,
                FrameType::Next,
                FrameFlags::NEXT | FrameFlags::METADATA,
            )
            .expect("encode payload");
        assert!(!codec().has_metadata(&frame).expect("header present"));
    }

    #[rstest]
    #[case::missing_length(vec![0, 0, 0, 1, 0x29, 0x20, 0, 0], 9)]
    #[case::short_metadata(vec![0, 0, 0, 1, 0x29, 0x20, 0, 0, 4, 1, 2], 13)]
    fn truncated_metadata_is_rejected(#[case] frame: Vec<u8>, #[case] need: usize) {
        let frame = Bytes::from(frame);
        let have = frame.len();
        assert_eq!(
            FrameBody::parse_frame(&codec(), &frame),
            Err(InvalidFrame::Truncated { have, need })
        );
    }

    #[test]
    fn oversized_metadata_length_is_rejected() {
        assert_eq!(
            encode_metadata_len(U24_MAX as usize + 1),
            Err(InvalidFrame::MetadataTooLarge {
                len: U24_MAX as usize + 1
            })
        );
    }
}
