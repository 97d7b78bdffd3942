//! Metric helpers for `rsocket-frame`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. With the
//! `metrics` feature disabled the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking frames split by the fragmenter.
pub const FRAMES_FRAGMENTED: &str = "rsocket_frame_frames_fragmented_total";
/// Name of the counter tracking fragments emitted for split frames.
pub const FRAGMENTS_EMITTED: &str = "rsocket_frame_fragments_emitted_total";
/// Name of the counter tracking frames rebuilt from fragments.
pub const FRAMES_REASSEMBLED: &str = "rsocket_frame_frames_reassembled_total";
/// Name of the counter tracking partial frames dropped after an error.
pub const REASSEMBLY_DISCARDED: &str = "rsocket_frame_reassembly_discarded_total";

/// Record a frame that needed fragmenting.
pub fn inc_frames_fragmented() {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_FRAGMENTED).increment(1);
}

/// Record one emitted fragment.
pub fn inc_fragments_emitted() {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_EMITTED).increment(1);
}

/// Record a completed reassembly.
pub fn inc_frames_reassembled() {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_REASSEMBLED).increment(1);
}

/// Record a partial frame discarded by the reassembler.
pub fn inc_reassembly_discarded() {
    #[cfg(feature = "metrics")]
    counter!(REASSEMBLY_DISCARDED).increment(1);
}
