//! Outbound helper that splits oversized frames into wire-sized fragments.
//!
//! [`Fragmenter`] checks a frame against the negotiated bound and, when it is
//! too large, returns a lazy [`Fragments`] sequence. Fragments are built one at
//! a time as the consumer pulls them, in original byte order:
//!
//! - the first keeps the original type, its fixed fields, and (when present)
//!   the start of the metadata section;
//! - the rest are `PAYLOAD` continuations carrying the remaining metadata,
//!   then the data;
//! - every fragment but the last sets Follows, and only the last carries the
//!   frame's terminating Next/Complete bits.
//!
//! Each fragment is a well-formed frame in its own right: a fragment holding
//! metadata carries its own metadata length.

use std::{iter::FusedIterator, num::NonZeroUsize};

use bytes::{BufMut, Bytes, BytesMut};

use super::FragmentationError;
use crate::{
    byte_order::{U24_MAX, write_network_u32},
    config::{FramingConfig, MAX_FRAME_SIZE},
    frame::{
        FrameBody,
        FrameFlags,
        FrameHeaderCodec,
        FrameType,
        HEADER_SIZE,
        METADATA_LENGTH_SIZE,
        PAYLOAD_CODE,
        header::pack_header,
    },
};

/// Width of the frame length prefix used by byte-stream transports.
pub const FRAME_LENGTH_SIZE: usize = 3;

/// Whether emitted fragments carry RSocket's 24-bit frame length prefix.
///
/// The prefix is not counted against the fragment size bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameLength {
    /// Emit bare frames; the transport delimits them.
    #[default]
    Omitted,
    /// Prefix each fragment with its length.
    Prefixed,
}

/// Splits frames larger than a fixed bound.
#[derive(Clone, Copy, Debug)]
pub struct Fragmenter {
    max_fragment_size: NonZeroUsize,
    codec: FrameHeaderCodec,
}

impl Fragmenter {
    /// Create a fragmenter that caps frames at `max_fragment_size` bytes.
    ///
    /// The bound is clamped to the largest frame a 24-bit length can describe.
    #[must_use]
    pub fn new(max_fragment_size: NonZeroUsize) -> Self {
        Self::with_codec(max_fragment_size, FrameHeaderCodec::default())
    }

    /// Create a fragmenter that checks frame types with `codec`.
    #[must_use]
    pub fn with_codec(max_fragment_size: NonZeroUsize, codec: FrameHeaderCodec) -> Self {
        let clamped = max_fragment_size.get().min(MAX_FRAME_SIZE);
        Self {
            max_fragment_size: NonZeroUsize::new(clamped).unwrap_or(NonZeroUsize::MIN),
            codec,
        }
    }

    /// Build a fragmenter from `config`, or `None` when fragmentation is off.
    #[must_use]
    pub fn from_config(config: &FramingConfig) -> Option<Self> {
        config
            .max_fragment_size
            .map(|max| Self::with_codec(max, config.codec()))
    }

    /// Return the maximum encoded size of a fragment.
    #[must_use]
    pub const fn max_fragment_size(&self) -> NonZeroUsize { self.max_fragment_size }

    /// Split `frame`, whose type is `frame_type`, into fragments.
    ///
    /// A frame that already fits is returned as the only element, unchanged
    /// apart from the optional length prefix.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::Frame`] when `frame` does not decode as
    /// `frame_type` or its body is malformed,
    /// [`FragmentationError::NotFragmentable`] when an oversized frame has a
    /// type that cannot be split, and [`FragmentationError::FragmentTooSmall`]
    /// when the bound cannot make progress.
    pub fn fragment(
        &self,
        frame: Bytes,
        frame_type: FrameType,
        length: FrameLength,
    ) -> Result<Fragments, FragmentationError> {
        self.codec.assert_type(frame_type, &frame)?;

        let max = self.max_fragment_size.get();
        if frame.len() <= max {
            return Ok(Fragments::whole(frame, length));
        }

        let header = self.codec.decode(&frame)?;
        if !header.frame_type.can_fragment() {
            return Err(FragmentationError::NotFragmentable {
                frame_type: header.frame_type,
            });
        }

        let body = FrameBody::parse(&frame, header.frame_type, header.flags)?;
        let metadata_overhead = if body.metadata.is_some() {
            METADATA_LENGTH_SIZE
        } else {
            0
        };
        let required = HEADER_SIZE + body.fixed.len() + metadata_overhead + 1;
        if max < required {
            return Err(FragmentationError::FragmentTooSmall { max, required });
        }

        let plan = FlagPlan::new(header.frame_type, header.flags);
        let first_type = if header.frame_type.is_payload() {
            FrameType::Payload
        } else {
            header.frame_type
        };
        let mut first_flags = plan.first;
        first_flags.set(FrameFlags::METADATA, body.metadata.is_some());
        self.codec
            .encode(header.stream_id, first_type, first_flags.bits())?;

        tracing::debug!(
            stream_id = header.stream_id,
            frame_type = %header.frame_type,
            frame_len = frame.len(),
            max,
            "fragmenting frame"
        );
        crate::metrics::inc_frames_fragmented();

        Ok(Fragments {
            length,
            state: State::Split(Splitter {
                max,
                stream_id: header.stream_id,
                first_code: header.frame_type.encoded_code(),
                plan,
                fixed: Some(body.fixed),
                metadata: body.metadata,
                data: body.data,
            }),
        })
    }
}

/// Flags for each fragment position, derived from the original flags.
#[derive(Clone, Copy, Debug)]
struct FlagPlan {
    first: FrameFlags,
    middle: FrameFlags,
    last: FrameFlags,
}

impl FlagPlan {
    fn new(frame_type: FrameType, original: FrameFlags) -> Self {
        let original = original.difference(FrameFlags::FOLLOWS | FrameFlags::METADATA);
        let mut first = original.difference(FrameFlags::COMPLETE) | FrameFlags::FOLLOWS;
        let last = if frame_type.is_payload() {
            first.insert(FrameFlags::NEXT);
            original.terminal()
        } else {
            FrameFlags::NEXT | (original & FrameFlags::COMPLETE)
        };
        Self {
            first,
            middle: FrameFlags::NEXT | FrameFlags::FOLLOWS,
            last,
        }
    }
}

/// Lazy, finite sequence of wire frames produced by [`Fragmenter::fragment`].
///
/// The sequence is consumed as it is iterated and cannot be restarted.
#[derive(Debug)]
pub struct Fragments {
    length: FrameLength,
    state: State,
}

#[derive(Debug)]
enum State {
    Whole(Bytes),
    Split(Splitter),
    Done,
}

impl Fragments {
    fn whole(frame: Bytes, length: FrameLength) -> Self {
        Self {
            length,
            state: State::Whole(frame),
        }
    }

    /// Whether the frame was split into more than one fragment.
    #[must_use]
    pub fn is_fragmented(&self) -> bool { matches!(self.state, State::Split(_)) }

    fn frame_with_length(&self, frame: Bytes) -> Bytes {
        match self.length {
            FrameLength::Omitted => frame,
            FrameLength::Prefixed => {
                let mut buf = BytesMut::with_capacity(FRAME_LENGTH_SIZE + frame.len());
                buf.put_slice(&u24_field(frame.len()));
                buf.put_slice(&frame);
                buf.freeze()
            }
        }
    }
}

impl Iterator for Fragments {
    type Item = Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = match std::mem::replace(&mut self.state, State::Done) {
            State::Whole(frame) => frame,
            State::Split(mut splitter) => {
                let (fragment, is_last) = splitter.next_fragment();
                if !is_last {
                    self.state = State::Split(splitter);
                }
                crate::metrics::inc_fragments_emitted();
                fragment
            }
            State::Done => return None,
        };
        Some(self.frame_with_length(frame))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.state {
            State::Whole(_) => (1, Some(1)),
            State::Split(_) => (1, None),
            State::Done => (0, Some(0)),
        }
    }
}

impl FusedIterator for Fragments {}

/// Cursor over the unsent sections of the source frame.
#[derive(Debug)]
struct Splitter {
    max: usize,
    stream_id: u32,
    first_code: u8,
    plan: FlagPlan,
    /// Fixed fields; taken by the first fragment.
    fixed: Option<Bytes>,
    /// Remaining metadata; `Some` until the section is fully sent.
    metadata: Option<Bytes>,
    data: Bytes,
}

impl Splitter {
    /// Build the next fragment and report whether it is the last one.
    fn next_fragment(&mut self) -> (Bytes, bool) {
        let first = self.fixed.take();
        let is_first = first.is_some();
        let fixed = first.unwrap_or_default();

        let mut budget = self.max - HEADER_SIZE - fixed.len();
        let carries_metadata = match &self.metadata {
            Some(metadata) => is_first || !metadata.is_empty(),
            None => false,
        };
        let metadata_chunk = if carries_metadata {
            budget -= METADATA_LENGTH_SIZE;
            let metadata = self.metadata.as_mut().map_or_else(Bytes::new, |metadata| {
                metadata.split_to(budget.min(metadata.len()))
            });
            budget -= metadata.len();
            Some(metadata)
        } else {
            None
        };
        if self.metadata.as_ref().is_some_and(Bytes::is_empty) {
            self.metadata = None;
        }
        let data_chunk = self.data.split_to(budget.min(self.data.len()));

        let is_last = self.metadata.is_none() && self.data.is_empty();
        let (code, mut flags) = match (is_first, is_last) {
            (true, _) => (self.first_code, self.plan.first),
            (false, false) => (PAYLOAD_CODE, self.plan.middle),
            (false, true) => (PAYLOAD_CODE, self.plan.last),
        };
        flags.set(FrameFlags::METADATA, metadata_chunk.is_some());

        let metadata_len = metadata_chunk
            .as_ref()
            .map_or(0, |chunk| METADATA_LENGTH_SIZE + chunk.len());
        let mut fragment =
            BytesMut::with_capacity(HEADER_SIZE + fixed.len() + metadata_len + data_chunk.len());
        fragment.put_slice(&pack_header(self.stream_id, code, flags));
        fragment.put_slice(&fixed);
        if let Some(chunk) = metadata_chunk {
            fragment.put_slice(&u24_field(chunk.len()));
            fragment.put_slice(&chunk);
        }
        fragment.put_slice(&data_chunk);
        (fragment.freeze(), is_last)
    }
}

/// Encode a length already bounded by [`MAX_FRAME_SIZE`].
fn u24_field(len: usize) -> [u8; 3] {
    let len = u32::try_from(len).map_or(U24_MAX, |len| len.min(U24_MAX));
    let [_, high, mid, low] = write_network_u32(len);
    [high, mid, low]
}
