//! Tests for inbound reassembly, stream checks, and size limits.

use std::num::NonZeroUsize;

use bytes::Bytes;
use rstest::rstest;
use tracing_test::traced_test;

use crate::{
    config::FrameTypeCheck,
    fragment::{FrameLength, Fragmenter, Reassembler, ReassemblyError},
    frame::{
        FrameBody,
        FrameFlags,
        FrameHeaderCodec,
        FrameType,
        ProtocolViolation,
        replace_stream_id,
    },
};

fn codec() -> FrameHeaderCodec { FrameHeaderCodec::new(FrameTypeCheck::Enabled) }

fn reassembler(limit: usize) -> Reassembler {
    Reassembler::with_codec(NonZeroUsize::new(limit).expect("non-zero"), codec())
}

fn split(frame: &Bytes, frame_type: FrameType, max: usize) -> Vec<Bytes> {
    Fragmenter::with_codec(NonZeroUsize::new(max).expect("non-zero"), codec())
        .fragment(frame.clone(), frame_type, FrameLength::Omitted)
        .expect("fragment")
        .collect()
}

/// Feed every fragment and return the single frame that comes out.
fn feed(reassembler: &mut Reassembler, fragments: Vec<Bytes>) -> Bytes {
    let mut emitted = Vec::new();
    for fragment in fragments {
        if let Some(frame) = reassembler.consume(fragment).expect("fragment accepted") {
            emitted.push(frame);
        }
    }
    assert_eq!(emitted.len(), 1, "exactly one frame should be emitted");
    emitted.remove(0)
}

fn payload(stream_id: u32, metadata: Option<usize>, data: usize, flags: FrameFlags) -> Bytes {
    let body = FrameBody {
        metadata: metadata.map(|len| Bytes::from(vec![b'm'; len])),
        data: Bytes::from(vec![b'd'; data]),
        ..FrameBody::default()
    };
    let frame_type = FrameType::resolve_payload(flags).expect("payload flags");
    body.encode_frame(&codec(), stream_id, frame_type, flags)
        .expect("encode payload")
}

#[rstest]
#[case::next_complete_with_metadata(Some(128), 128, FrameFlags::NEXT | FrameFlags::COMPLETE)]
#[case::next_only(None, 300, FrameFlags::NEXT)]
#[case::complete_only(Some(40), 90, FrameFlags::COMPLETE)]
#[case::empty_metadata(Some(0), 200, FrameFlags::NEXT)]
#[case::metadata_only(Some(250), 0, FrameFlags::NEXT | FrameFlags::COMPLETE)]
fn payload_frames_reassemble_bit_exact(
    #[case] metadata: Option<usize>,
    #[case] data: usize,
    #[case] flags: FrameFlags,
) {
    let frame = payload(5, metadata, data, flags);
    let frame_type = codec().decode_type(&frame).expect("payload type");
    let fragments = split(&frame, frame_type, 64);
    assert!(fragments.len() > 1);

    let mut reassembler = reassembler(1024);
    assert_eq!(feed(&mut reassembler, fragments), frame);
    assert!(!reassembler.is_assembling());
    assert_eq!(reassembler.buffered_len(), 0);
}

#[rstest]
#[case::stream(FrameType::RequestStream, FrameFlags::empty())]
#[case::channel(FrameType::RequestChannel, FrameFlags::COMPLETE)]
#[case::channel_with_metadata(FrameType::RequestChannel, FrameFlags::METADATA)]
#[case::fire_and_forget(FrameType::RequestFnf, FrameFlags::METADATA)]
#[case::request_response(FrameType::RequestResponse, FrameFlags::IGNORE)]
fn request_frames_reassemble_bit_exact(#[case] frame_type: FrameType, #[case] flags: FrameFlags) {
    let mut body = FrameBody::data(vec![4_u8; 150]);
    if flags.contains(FrameFlags::METADATA) {
        body.metadata = Some(Bytes::from(vec![2_u8; 70]));
    }
    if frame_type.fixed_len() > 0 {
        body = body.with_initial_request_n(17);
    }
    let frame = body
        .encode_frame(&codec(), 21, frame_type, flags)
        .expect("encode request");
    let fragments = split(&frame, frame_type, 48);
    assert!(fragments.len() > 1);

    let mut reassembler = reassembler(1024);
    assert_eq!(feed(&mut reassembler, fragments), frame);
}

#[test]
fn unfragmented_frames_pass_through() {
    let frame = payload(3, Some(2), 2, FrameFlags::NEXT);
    let mut reassembler = reassembler(64);
    assert_eq!(reassembler.consume(frame.clone()), Ok(Some(frame)));
    assert!(!reassembler.is_assembling());
}

#[test]
fn partial_state_is_observable() {
    let frame = payload(8, None, 200, FrameFlags::NEXT);
    let fragments = split(&frame, FrameType::Next, 64);
    let mut reassembler = reassembler(1024);

    assert_eq!(reassembler.consume(fragments[0].clone()), Ok(None));
    assert!(reassembler.is_assembling());
    assert_eq!(reassembler.assembling_stream(), Some(8));
    assert_eq!(reassembler.buffered_len(), 64);

    reassembler.reset();
    assert!(!reassembler.is_assembling());
    assert_eq!(reassembler.assembling_stream(), None);
}

#[traced_test]
#[test]
fn fragment_from_another_stream_is_a_protocol_violation() {
    let frame = payload(1, None, 200, FrameFlags::NEXT);
    let fragments = split(&frame, FrameType::Next, 64);
    let mut reassembler = reassembler(1024);
    assert_eq!(reassembler.consume(fragments[0].clone()), Ok(None));

    let mut foreign = fragments[1].to_vec();
    replace_stream_id(&mut foreign, 2).expect("stream id present");
    assert_eq!(
        reassembler.consume(Bytes::from(foreign)),
        Err(ReassemblyError::Protocol(ProtocolViolation::StreamMismatch {
            expected: 1,
            found: 2,
        }))
    );
    assert!(!reassembler.is_assembling());
    assert!(logs_contain("discarding partially assembled frame"));

    // A fresh frame is accepted afterwards.
    let fresh = payload(4, None, 1, FrameFlags::COMPLETE);
    assert_eq!(reassembler.consume(fresh.clone()), Ok(Some(fresh)));
}

#[test]
fn assembled_size_cap_discards_the_frame() {
    let frame = payload(6, Some(10), 300, FrameFlags::NEXT | FrameFlags::COMPLETE);
    let fragments = split(&frame, FrameType::NextComplete, 64);
    let mut reassembler = reassembler(100);

    assert_eq!(reassembler.consume(fragments[0].clone()), Ok(None));
    let err = reassembler
        .consume(fragments[1].clone())
        .expect_err("second fragment crosses the cap");
    assert!(matches!(
        err,
        ReassemblyError::AssembledFrameTooLarge {
            stream_id: 6,
            attempted: 122,
            limit,
        } if limit.get() == 100
    ));
    assert!(!reassembler.is_assembling());
}

#[test]
fn assembled_size_cap_applies_to_the_first_fragment() {
    let frame = payload(6, None, 200, FrameFlags::NEXT);
    let fragments = split(&frame, FrameType::Next, 64);
    let mut reassembler = reassembler(32);

    assert!(matches!(
        reassembler.consume(fragments[0].clone()),
        Err(ReassemblyError::AssembledFrameTooLarge { attempted: 64, .. })
    ));
    assert!(!reassembler.is_assembling());
}

#[traced_test]
#[test]
fn metadata_after_buffered_data_is_rejected() {
    let first = payload(1, None, 2, FrameFlags::NEXT | FrameFlags::FOLLOWS);
    let late_metadata = payload(1, Some(1), 1, FrameFlags::NEXT);
    let mut reassembler = reassembler(1024);
    assert_eq!(reassembler.consume(first), Ok(None));

    assert_eq!(
        reassembler.consume(late_metadata),
        Err(ReassemblyError::Protocol(
            ProtocolViolation::MetadataAfterData { stream_id: 1 }
        ))
    );
    assert!(!reassembler.is_assembling());
    assert!(logs_contain("discarding partially assembled frame"));
}

#[test]
fn metadata_continuation_before_data_is_accepted() {
    let first = payload(1, Some(2), 0, FrameFlags::NEXT | FrameFlags::FOLLOWS);
    let rest = payload(1, Some(1), 3, FrameFlags::NEXT);
    let mut reassembler = reassembler(1024);
    assert_eq!(reassembler.consume(first), Ok(None));

    assert_eq!(
        reassembler.consume(rest),
        Ok(Some(payload(1, Some(3), 3, FrameFlags::NEXT)))
    );
}

#[test]
fn non_payload_continuation_is_rejected() {
    let frame = payload(1, None, 200, FrameFlags::NEXT);
    let fragments = split(&frame, FrameType::Next, 64);
    let mut reassembler = reassembler(1024);
    assert_eq!(reassembler.consume(fragments[0].clone()), Ok(None));

    let cancel = Bytes::copy_from_slice(
        &codec()
            .encode(1, FrameType::Cancel, 0)
            .expect("cancel header"),
    );
    assert_eq!(
        reassembler.consume(cancel),
        Err(ReassemblyError::Protocol(
            ProtocolViolation::UnexpectedContinuation {
                found: FrameType::Cancel
            }
        ))
    );
    assert!(!reassembler.is_assembling());
}

#[test]
fn follows_on_an_unfragmentable_type_is_rejected() {
    let mut setup = codec()
        .encode(0, FrameType::Setup, 0)
        .expect("setup header")
        .to_vec();
    // Force the Follows bit, which SETUP may not carry.
    setup[5] |= 0x80;
    let mut reassembler = reassembler(1024);
    assert_eq!(
        reassembler.consume(Bytes::from(setup)),
        Err(ReassemblyError::Protocol(ProtocolViolation::NotFragmentable {
            frame_type: FrameType::Setup
        }))
    );
}

#[test]
fn undecodable_fragment_is_reported() {
    let mut reassembler = reassembler(1024);
    assert!(matches!(
        reassembler.consume(Bytes::from_static(&[0, 0, 0])),
        Err(ReassemblyError::Invalid(_))
    ));
}
