//! Frame builders and fragment drivers.

use std::num::NonZeroUsize;

use bytes::Bytes;
use rsocket_frame::{
    FrameBody,
    FrameFlags,
    FrameHeaderCodec,
    FrameLength,
    FrameType,
    FrameTypeCheck,
    Fragmenter,
    Reassembler,
    ReassemblyError,
};

/// Header codec with type assertions enabled, independent of the environment.
#[must_use]
pub fn enabled_codec() -> FrameHeaderCodec { FrameHeaderCodec::new(FrameTypeCheck::Enabled) }

/// Encode a payload frame whose type follows from the Next/Complete bits in
/// `flags`.
///
/// # Panics
///
/// Panics if `flags` sets neither Next nor Complete.
#[must_use]
pub fn payload_frame(
    stream_id: u32,
    metadata: Option<&[u8]>,
    data: &[u8],
    flags: FrameFlags,
) -> Bytes {
    let frame_type = FrameType::resolve_payload(flags).expect("payload needs Next or Complete");
    encode(stream_id, frame_type, None, metadata, data, flags)
}

/// Encode a request frame; `request_n` fills the fixed field of stream and
/// channel requests.
///
/// # Panics
///
/// Panics if the header is invalid for `frame_type`, or if `request_n` is
/// given for a type without a request-N field (or omitted for one with it).
#[must_use]
pub fn request_frame(
    frame_type: FrameType,
    stream_id: u32,
    request_n: Option<u32>,
    metadata: Option<&[u8]>,
    data: &[u8],
    flags: FrameFlags,
) -> Bytes {
    assert_eq!(
        request_n.is_some(),
        frame_type.fixed_len() > 0,
        "request-N presence must match {frame_type}"
    );
    encode(stream_id, frame_type, request_n, metadata, data, flags)
}

fn encode(
    stream_id: u32,
    frame_type: FrameType,
    request_n: Option<u32>,
    metadata: Option<&[u8]>,
    data: &[u8],
    flags: FrameFlags,
) -> Bytes {
    let mut body = FrameBody {
        metadata: metadata.map(Bytes::copy_from_slice),
        data: Bytes::copy_from_slice(data),
        ..FrameBody::default()
    };
    if let Some(request_n) = request_n {
        body = body.with_initial_request_n(request_n);
    }
    body.encode_frame(&enabled_codec(), stream_id, frame_type, flags)
        .expect("valid frame")
}

/// Split `frame` at `max_fragment_size` and collect the bare fragments.
///
/// # Panics
///
/// Panics if `max_fragment_size` is zero or fragmentation fails.
#[must_use]
pub fn fragment_all(frame: &Bytes, frame_type: FrameType, max_fragment_size: usize) -> Vec<Bytes> {
    let max = NonZeroUsize::new(max_fragment_size).expect("fragment size must be non-zero");
    Fragmenter::with_codec(max, enabled_codec())
        .fragment(frame.clone(), frame_type, FrameLength::Omitted)
        .expect("fragment frame")
        .collect()
}

/// Feed `fragments` through a fresh reassembler and collect emitted frames.
///
/// # Errors
///
/// Returns the first [`ReassemblyError`] raised.
///
/// # Panics
///
/// Panics if `max_assembled_size` is zero.
pub fn reassemble_all(
    fragments: impl IntoIterator<Item = Bytes>,
    max_assembled_size: usize,
) -> Result<Vec<Bytes>, ReassemblyError> {
    let limit = NonZeroUsize::new(max_assembled_size).expect("limit must be non-zero");
    let mut reassembler = Reassembler::with_codec(limit, enabled_codec());
    let mut frames = Vec::new();
    for fragment in fragments {
        if let Some(frame) = reassembler.consume(fragment)? {
            frames.push(frame);
        }
    }
    Ok(frames)
}
