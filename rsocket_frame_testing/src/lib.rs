//! Utilities for exercising `rsocket-frame` in tests.
//!
//! The helpers build well-formed frames, drive them through a fragmenter and
//! reassembler, connect two [`FrameConnection`](rsocket_frame::FrameConnection)s
//! over an in-memory duplex, and capture counters with a debugging metrics
//! recorder.
//!
//! ```rust
//! use rsocket_frame::{FrameFlags, FrameType};
//! use rsocket_frame_testing::{fragment_all, payload_frame, reassemble_all};
//!
//! let frame = payload_frame(1, Some(&[1_u8; 100][..]), &[2; 100], FrameFlags::NEXT);
//! let fragments = fragment_all(&frame, FrameType::Next, 64);
//! assert!(fragments.len() > 1);
//! let frames = reassemble_all(fragments, 1024).expect("reassemble");
//! assert_eq!(frames, vec![frame]);
//! ```

pub mod frames;
pub mod metrics;
pub mod strategies;
pub mod transport;

pub use frames::{enabled_codec, fragment_all, payload_frame, reassemble_all, request_frame};
pub use self::metrics::{counter_value, with_recorder};
pub use strategies::{deterministic_runner, fragmentable_frame};
pub use transport::{DEFAULT_CAPACITY, connection_pair};
