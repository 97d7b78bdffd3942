//! Flag bits carried in the low 10 bits of the type/flags word.

use bitflags::bitflags;

bitflags! {
    /// Frame flags (10 significant bits).
    ///
    /// Unknown and reserved bits are retained so frames can be relocated or
    /// reassembled without losing information. Values wider than 10 bits are
    /// truncated by [`FrameFlags::truncate`], which is what the header
    /// encoder applies.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FrameFlags: u16 {
        /// The receiver may ignore this frame if it does not understand it.
        const IGNORE = 0b10_0000_0000;
        /// The body contains a metadata section.
        const METADATA = 0b01_0000_0000;
        /// More fragments of this logical frame follow.
        const FOLLOWS = 0b00_1000_0000;
        /// Stream completion.
        const COMPLETE = 0b00_0100_0000;
        /// Payload present (`onNext`).
        const NEXT = 0b00_0010_0000;
        /// Reserved bits with no meaning at this layer.
        const RESERVED = 0b00_0001_1111;
    }
}

/// Mask covering the 10 flag bits of the type/flags word.
pub const FLAGS_MASK: u16 = 0b0000_0011_1111_1111;

impl FrameFlags {
    /// Keep only the low 10 bits of `raw`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rsocket_frame::frame::FrameFlags;
    ///
    /// let flags = FrameFlags::truncate(0b111_1011_0111);
    /// assert_eq!(flags.bits(), 0b11_1011_0111);
    /// ```
    #[must_use]
    pub const fn truncate(raw: u16) -> Self { Self::from_bits_retain(raw & FLAGS_MASK) }

    /// The Next and Complete bits of `self`.
    #[must_use]
    pub fn terminal(self) -> Self { self & (Self::NEXT | Self::COMPLETE) }
}

impl Default for FrameFlags {
    fn default() -> Self { Self::empty() }
}
