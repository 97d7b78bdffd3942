//! Inbound helper that stitches fragments back into complete frames.
//!
//! [`Reassembler`] mirrors the outbound [`Fragmenter`](crate::fragment::Fragmenter).
//! A connection never interleaves fragments of two frames, so a single
//! accumulator suffices: the reassembler is either idle or assembling exactly
//! one frame. It guards against unbounded allocation with a configurable cap
//! on the assembled size and drops the partial frame on any error. There is
//! no time-based eviction; abandoning a stalled frame is left to the
//! connection layer.

use std::num::NonZeroUsize;

use bytes::{Bytes, BytesMut};

use super::ReassemblyError;
use crate::{
    config::FramingConfig,
    frame::{
        FrameBody,
        FrameFlags,
        FrameHeader,
        FrameHeaderCodec,
        FrameType,
        HEADER_SIZE,
        METADATA_LENGTH_SIZE,
        ProtocolViolation,
        header::pack_header,
    },
};

#[derive(Debug)]
struct PartialFrame {
    stream_id: u32,
    type_code: u8,
    is_payload: bool,
    flags: FrameFlags,
    fixed: Bytes,
    metadata: Option<BytesMut>,
    data: BytesMut,
}

impl PartialFrame {
    fn new(header: FrameHeader, body: FrameBody) -> Self {
        Self {
            stream_id: header.stream_id,
            type_code: header.frame_type.encoded_code(),
            is_payload: header.frame_type.is_payload(),
            flags: header.flags.difference(FrameFlags::FOLLOWS),
            fixed: body.fixed,
            metadata: body.metadata.map(|metadata| BytesMut::from(&metadata[..])),
            data: BytesMut::from(&body.data[..]),
        }
    }

    fn assembled_len(&self) -> usize {
        let metadata = self
            .metadata
            .as_ref()
            .map_or(0, |metadata| METADATA_LENGTH_SIZE + metadata.len());
        HEADER_SIZE + self.fixed.len() + metadata + self.data.len()
    }

    /// Bytes `body` adds to the assembled frame; continuation length fields
    /// are dropped, but the first metadata chunk opens a section.
    fn growth(&self, body: &FrameBody) -> usize {
        let metadata = body.metadata.as_ref().map_or(0, |chunk| {
            let section = if self.metadata.is_none() {
                METADATA_LENGTH_SIZE
            } else {
                0
            };
            section + chunk.len()
        });
        metadata + body.data.len()
    }

    /// Append a continuation's sections. Metadata may only continue while no
    /// data has been buffered.
    fn push(&mut self, body: &FrameBody) -> Result<(), ProtocolViolation> {
        if body.metadata.is_some() && !self.data.is_empty() {
            return Err(ProtocolViolation::MetadataAfterData {
                stream_id: self.stream_id,
            });
        }
        if let Some(chunk) = &body.metadata {
            self.metadata
                .get_or_insert_with(BytesMut::new)
                .extend_from_slice(chunk);
        }
        self.data.extend_from_slice(&body.data);
        Ok(())
    }

    /// Combine the captured header with the terminating fragment's flags.
    fn finish(self, terminating: FrameFlags) -> Result<Bytes, ReassemblyError> {
        let mut flags = self.flags;
        flags.set(FrameFlags::METADATA, self.metadata.is_some());
        if self.is_payload {
            flags.remove(FrameFlags::NEXT | FrameFlags::COMPLETE);
            flags.insert(terminating.terminal());
        } else {
            flags.set(
                FrameFlags::COMPLETE,
                terminating.contains(FrameFlags::COMPLETE),
            );
        }

        let body = FrameBody {
            fixed: self.fixed,
            metadata: self.metadata.map(BytesMut::freeze),
            data: self.data.freeze(),
        };
        let mut frame = BytesMut::with_capacity(HEADER_SIZE + body.encoded_len());
        frame.extend_from_slice(&pack_header(self.stream_id, self.type_code, flags));
        body.encode_into(&mut frame)?;
        Ok(frame.freeze())
    }
}

/// Stateful single-frame reassembler.
///
/// Not safe for concurrent use: a connection's inbound pipeline must feed
/// fragments from one task, in arrival order.
#[derive(Debug)]
pub struct Reassembler {
    max_assembled_size: NonZeroUsize,
    codec: FrameHeaderCodec,
    partial: Option<PartialFrame>,
}

impl Reassembler {
    /// Create a reassembler that caps assembled frames at `max_assembled_size` bytes.
    #[must_use]
    pub fn new(max_assembled_size: NonZeroUsize) -> Self {
        Self::with_codec(max_assembled_size, FrameHeaderCodec::default())
    }

    /// Create a reassembler decoding headers with `codec`.
    #[must_use]
    pub const fn with_codec(max_assembled_size: NonZeroUsize, codec: FrameHeaderCodec) -> Self {
        Self {
            max_assembled_size,
            codec,
            partial: None,
        }
    }

    /// Build a reassembler from `config`.
    #[must_use]
    pub const fn from_config(config: &FramingConfig) -> Self {
        Self::with_codec(config.max_assembled_size, config.codec())
    }

    /// Return the assembled size cap.
    #[must_use]
    pub const fn max_assembled_size(&self) -> NonZeroUsize { self.max_assembled_size }

    /// Whether a fragmented frame is in progress.
    #[must_use]
    pub const fn is_assembling(&self) -> bool { self.partial.is_some() }

    /// Stream of the frame in progress, if any.
    #[must_use]
    pub fn assembling_stream(&self) -> Option<u32> {
        self.partial.as_ref().map(|partial| partial.stream_id)
    }

    /// Size the assembled frame would have if it completed now.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.partial.as_ref().map_or(0, PartialFrame::assembled_len)
    }

    /// Drop any frame in progress.
    pub fn reset(&mut self) {
        if let Some(partial) = self.partial.take() {
            tracing::debug!(stream_id = partial.stream_id, "reassembly reset");
        }
    }

    /// Process one wire frame.
    ///
    /// Returns `Ok(Some(frame))` when `fragment` is unfragmented or completes
    /// the frame in progress, and `Ok(None)` while more fragments are needed.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError`] when the fragment cannot be decoded, belongs
    /// to another stream, is not a valid continuation, or would push the
    /// assembled frame past the configured cap. The frame in progress is
    /// discarded and the reassembler is idle afterwards.
    pub fn consume(&mut self, fragment: Bytes) -> Result<Option<Bytes>, ReassemblyError> {
        let result = self.consume_inner(fragment);
        if let Err(err) = &result {
            if let Some(partial) = self.partial.take() {
                tracing::warn!(
                    stream_id = partial.stream_id,
                    buffered = partial.assembled_len(),
                    error = %err,
                    "discarding partially assembled frame"
                );
                crate::metrics::inc_reassembly_discarded();
            }
        }
        result
    }

    fn consume_inner(&mut self, fragment: Bytes) -> Result<Option<Bytes>, ReassemblyError> {
        let header = self.codec.decode(&fragment)?;
        let follows = header.flags.contains(FrameFlags::FOLLOWS);

        let Some(partial) = self.partial.as_mut() else {
            if !follows {
                return Ok(Some(fragment));
            }
            return self.start(header, &fragment).map(|()| None);
        };

        if header.stream_id != partial.stream_id {
            return Err(ProtocolViolation::StreamMismatch {
                expected: partial.stream_id,
                found: header.stream_id,
            }
            .into());
        }
        if !header.frame_type.is_payload() {
            return Err(ProtocolViolation::UnexpectedContinuation {
                found: header.frame_type,
            }
            .into());
        }

        let body = FrameBody::parse(&fragment, FrameType::Payload, header.flags)?;
        let attempted = partial.assembled_len().saturating_add(partial.growth(&body));
        check_limit(self.max_assembled_size, header.stream_id, attempted)?;
        partial.push(&body)?;

        if follows {
            return Ok(None);
        }
        let Some(partial) = self.partial.take() else {
            return Ok(None);
        };
        let frame = partial.finish(header.flags)?;
        tracing::debug!(
            stream_id = header.stream_id,
            frame_len = frame.len(),
            "frame reassembled"
        );
        crate::metrics::inc_frames_reassembled();
        Ok(Some(frame))
    }

    fn start(&mut self, header: FrameHeader, fragment: &Bytes) -> Result<(), ReassemblyError> {
        if !header.frame_type.can_fragment() {
            return Err(ProtocolViolation::NotFragmentable {
                frame_type: header.frame_type,
            }
            .into());
        }
        let body = FrameBody::parse(fragment, header.frame_type, header.flags)?;
        let partial = PartialFrame::new(header, body);
        check_limit(self.max_assembled_size, header.stream_id, partial.assembled_len())?;
        tracing::debug!(
            stream_id = header.stream_id,
            frame_type = %header.frame_type,
            "reassembly started"
        );
        self.partial = Some(partial);
        Ok(())
    }
}

fn check_limit(
    limit: NonZeroUsize,
    stream_id: u32,
    attempted: usize,
) -> Result<(), ReassemblyError> {
    if attempted > limit.get() {
        return Err(ReassemblyError::AssembledFrameTooLarge {
            stream_id,
            attempted,
            limit,
        });
    }
    Ok(())
}
