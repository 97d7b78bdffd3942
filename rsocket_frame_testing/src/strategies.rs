//! `proptest` strategies over fragmentable frames.

use bytes::Bytes;
use proptest::{
    collection::vec,
    option,
    prelude::{Strategy, any},
    sample::select,
    test_runner::TestRunner,
};
use rsocket_frame::{FrameFlags, FrameType};

use crate::frames::{payload_frame, request_frame};

const FRAGMENTABLE: [FrameType; 7] = [
    FrameType::RequestResponse,
    FrameType::RequestFnf,
    FrameType::RequestStream,
    FrameType::RequestChannel,
    FrameType::Next,
    FrameType::Complete,
    FrameType::NextComplete,
];

/// Runner with a fixed seed so failures reproduce across runs.
#[must_use]
pub fn deterministic_runner() -> TestRunner { TestRunner::deterministic() }

/// Arbitrary well-formed frame of a fragmentable type, with its type.
///
/// Frames carry up to 300 bytes of optional metadata and up to 600 bytes of
/// data; the Ignore bit and, for channels, the Complete bit vary.
pub fn fragmentable_frame() -> impl Strategy<Value = (FrameType, Bytes)> {
    (
        select(FRAGMENTABLE.to_vec()),
        any::<u32>(),
        option::of(vec(any::<u8>(), 0..300)),
        vec(any::<u8>(), 0..600),
        any::<bool>(),
        any::<bool>(),
        any::<u32>(),
    )
        .prop_map(
            |(frame_type, stream_id, metadata, data, ignore, complete, request_n)| {
                let mut flags = FrameFlags::empty();
                flags.set(FrameFlags::IGNORE, ignore);
                let frame = match frame_type.implied_flags() {
                    Some(implied) => {
                        payload_frame(stream_id, metadata.as_deref(), &data, flags | implied)
                    }
                    None => {
                        if frame_type == FrameType::RequestChannel {
                            flags.set(FrameFlags::COMPLETE, complete);
                        }
                        let request_n = (frame_type.fixed_len() > 0).then_some(request_n);
                        request_frame(
                            frame_type,
                            stream_id,
                            request_n,
                            metadata.as_deref(),
                            &data,
                            flags,
                        )
                    }
                };
                (frame_type, frame)
            },
        )
}
