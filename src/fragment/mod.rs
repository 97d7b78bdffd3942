//! Fragmentation and reassembly of oversized frames.
//!
//! Outbound, [`Fragmenter`] splits frames that exceed the negotiated bound
//! into a sequence of wire frames chained by the Follows flag. Inbound,
//! [`Reassembler`] stitches such a sequence back into the original frame,
//! bit for bit. Both sides share the error types in [`error`].

pub mod error;
pub mod fragmenter;
pub mod reassembler;

pub use error::{FragmentationError, ReassemblyError};
pub use fragmenter::{FRAME_LENGTH_SIZE, FrameLength, Fragmenter, Fragments};
pub use reassembler::Reassembler;
