//! Registry of frame types and their wire codes.
//!
//! `NEXT`, `COMPLETE` and `NEXT_COMPLETE` are virtual: they share the
//! `PAYLOAD` wire code and are told apart only by the Next/Complete flags.
//! Decoding never yields [`FrameType::Payload`]; see
//! [`FrameHeaderCodec::decode_type`](crate::frame::FrameHeaderCodec::decode_type).

use std::fmt;

use super::{FrameFlags, InvalidFrame};

/// Logical frame type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameType {
    /// Reserved code 0x00.
    Reserved,
    /// Connection setup.
    Setup,
    /// Lease grant.
    Lease,
    /// Connection keepalive.
    Keepalive,
    /// Single-response request.
    RequestResponse,
    /// Fire-and-forget request.
    RequestFnf,
    /// Request for a finite or infinite stream.
    RequestStream,
    /// Bidirectional channel request.
    RequestChannel,
    /// Additional request credit.
    RequestN,
    /// Cancel an outstanding request.
    Cancel,
    /// Raw payload code; only used when encoding.
    Payload,
    /// Stream or connection error.
    Error,
    /// Connection-level metadata push.
    MetadataPush,
    /// Resumption request.
    Resume,
    /// Resumption acknowledgement.
    ResumeOk,
    /// Payload carrying an element (Next set).
    Next,
    /// Payload signalling completion (Complete set).
    Complete,
    /// Payload carrying a final element (Next and Complete set).
    NextComplete,
    /// Extension frame.
    Ext,
}

/// Wire code shared by all payload variants.
pub const PAYLOAD_CODE: u8 = 0x0A;

/// Largest value representable in the 6-bit type field.
pub const MAX_TYPE_CODE: u8 = 0x3F;

impl FrameType {
    /// Every logical type, real and virtual.
    pub const ALL: [Self; 19] = [
        Self::Reserved,
        Self::Setup,
        Self::Lease,
        Self::Keepalive,
        Self::RequestResponse,
        Self::RequestFnf,
        Self::RequestStream,
        Self::RequestChannel,
        Self::RequestN,
        Self::Cancel,
        Self::Payload,
        Self::Error,
        Self::MetadataPush,
        Self::Resume,
        Self::ResumeOk,
        Self::Next,
        Self::Complete,
        Self::NextComplete,
        Self::Ext,
    ];

    /// The 6-bit code written to the wire.
    #[must_use]
    pub const fn encoded_code(self) -> u8 {
        match self {
            Self::Reserved => 0x00,
            Self::Setup => 0x01,
            Self::Lease => 0x02,
            Self::Keepalive => 0x03,
            Self::RequestResponse => 0x04,
            Self::RequestFnf => 0x05,
            Self::RequestStream => 0x06,
            Self::RequestChannel => 0x07,
            Self::RequestN => 0x08,
            Self::Cancel => 0x09,
            Self::Payload | Self::Next | Self::Complete | Self::NextComplete => PAYLOAD_CODE,
            Self::Error => 0x0B,
            Self::MetadataPush => 0x0C,
            Self::Resume => 0x0D,
            Self::ResumeOk => 0x0E,
            Self::Ext => MAX_TYPE_CODE,
        }
    }

    /// Look up the type registered for a wire code.
    ///
    /// The shared payload code resolves to [`FrameType::Payload`]; callers
    /// holding the flags should disambiguate with [`FrameType::resolve_payload`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFrame::UnknownType`] for unassigned codes.
    pub const fn from_code(code: u8) -> Result<Self, InvalidFrame> {
        let frame_type = match code {
            0x00 => Self::Reserved,
            0x01 => Self::Setup,
            0x02 => Self::Lease,
            0x03 => Self::Keepalive,
            0x04 => Self::RequestResponse,
            0x05 => Self::RequestFnf,
            0x06 => Self::RequestStream,
            0x07 => Self::RequestChannel,
            0x08 => Self::RequestN,
            0x09 => Self::Cancel,
            PAYLOAD_CODE => Self::Payload,
            0x0B => Self::Error,
            0x0C => Self::MetadataPush,
            0x0D => Self::Resume,
            0x0E => Self::ResumeOk,
            MAX_TYPE_CODE => Self::Ext,
            _ => return Err(InvalidFrame::UnknownType { code }),
        };
        Ok(frame_type)
    }

    /// Pick the payload variant named by the Next/Complete bits of `flags`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFrame::AmbiguousPayload`] when neither bit is set.
    pub fn resolve_payload(flags: FrameFlags) -> Result<Self, InvalidFrame> {
        let next = flags.contains(FrameFlags::NEXT);
        let complete = flags.contains(FrameFlags::COMPLETE);
        match (next, complete) {
            (true, true) => Ok(Self::NextComplete),
            (false, true) => Ok(Self::Complete),
            (true, false) => Ok(Self::Next),
            (false, false) => Err(InvalidFrame::AmbiguousPayload),
        }
    }

    /// Whether frames of this type may set the Metadata flag.
    #[must_use]
    pub const fn can_carry_metadata(self) -> bool {
        matches!(
            self,
            Self::Setup
                | Self::Lease
                | Self::RequestResponse
                | Self::RequestFnf
                | Self::RequestStream
                | Self::RequestChannel
                | Self::Payload
                | Self::MetadataPush
                | Self::Next
                | Self::Complete
                | Self::NextComplete
                | Self::Ext
        )
    }

    /// Whether frames of this type may be split with the Follows flag.
    #[must_use]
    pub const fn can_fragment(self) -> bool {
        matches!(
            self,
            Self::RequestResponse
                | Self::RequestFnf
                | Self::RequestStream
                | Self::RequestChannel
                | Self::Payload
                | Self::Next
                | Self::Complete
                | Self::NextComplete
        )
    }

    /// Whether this type is encoded with the shared payload code.
    #[must_use]
    pub const fn is_payload(self) -> bool { self.encoded_code() == PAYLOAD_CODE }

    /// Next/Complete bits implied by a virtual payload type.
    ///
    /// Returns `None` for types whose flags are not fixed by the type itself.
    #[must_use]
    pub const fn implied_flags(self) -> Option<FrameFlags> {
        match self {
            Self::Next => Some(FrameFlags::NEXT),
            Self::Complete => Some(FrameFlags::COMPLETE),
            Self::NextComplete => Some(FrameFlags::NEXT.union(FrameFlags::COMPLETE)),
            _ => None,
        }
    }

    /// Length of the fixed fields that precede metadata in the body.
    #[must_use]
    pub const fn fixed_len(self) -> usize {
        match self {
            Self::RequestStream | Self::RequestChannel => 4,
            _ => 0,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Reserved => "RESERVED",
            Self::Setup => "SETUP",
            Self::Lease => "LEASE",
            Self::Keepalive => "KEEPALIVE",
            Self::RequestResponse => "REQUEST_RESPONSE",
            Self::RequestFnf => "REQUEST_FNF",
            Self::RequestStream => "REQUEST_STREAM",
            Self::RequestChannel => "REQUEST_CHANNEL",
            Self::RequestN => "REQUEST_N",
            Self::Cancel => "CANCEL",
            Self::Payload => "PAYLOAD",
            Self::Error => "ERROR",
            Self::MetadataPush => "METADATA_PUSH",
            Self::Resume => "RESUME",
            Self::ResumeOk => "RESUME_OK",
            Self::Next => "NEXT",
            Self::Complete => "COMPLETE",
            Self::NextComplete => "NEXT_COMPLETE",
            Self::Ext => "EXT",
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn real_types_round_trip_through_codes() {
        for frame_type in FrameType::ALL.into_iter().filter(|t| !t.is_payload()) {
            assert_eq!(FrameType::from_code(frame_type.encoded_code()), Ok(frame_type));
        }
    }

    #[test]
    fn payload_code_resolves_to_raw_payload() {
        assert_eq!(FrameType::from_code(PAYLOAD_CODE), Ok(FrameType::Payload));
    }

    #[rstest]
    #[case(0x0F)]
    #[case(0x20)]
    #[case(0x3E)]
    fn unassigned_codes_are_rejected(#[case] code: u8) {
        assert_eq!(
            FrameType::from_code(code),
            Err(InvalidFrame::UnknownType { code })
        );
    }

    #[rstest]
    #[case(FrameFlags::NEXT, FrameType::Next)]
    #[case(FrameFlags::COMPLETE, FrameType::Complete)]
    #[case(FrameFlags::NEXT | FrameFlags::COMPLETE, FrameType::NextComplete)]
    #[case(FrameFlags::NEXT | FrameFlags::METADATA | FrameFlags::FOLLOWS, FrameType::Next)]
    fn payload_variants_follow_flags(#[case] flags: FrameFlags, #[case] expected: FrameType) {
        assert_eq!(FrameType::resolve_payload(flags), Ok(expected));
        assert_eq!(expected.implied_flags(), Some(flags.terminal()));
    }

    #[test]
    fn payload_without_next_or_complete_is_ambiguous() {
        assert_eq!(
            FrameType::resolve_payload(FrameFlags::METADATA),
            Err(InvalidFrame::AmbiguousPayload)
        );
    }

    #[test]
    fn only_request_and_payload_types_fragment() {
        let fragmentable: Vec<_> = FrameType::ALL
            .into_iter()
            .filter(|t| t.can_fragment())
            .collect();
        assert!(fragmentable.iter().all(|t| t.can_carry_metadata()));
        assert!(!FrameType::Setup.can_fragment());
        assert!(!FrameType::Cancel.can_fragment());
        assert_eq!(fragmentable.len(), 8);
    }

    #[test]
    fn display_uses_protocol_names() {
        assert_eq!(FrameType::NextComplete.to_string(), "NEXT_COMPLETE");
        assert_eq!(FrameType::RequestFnf.to_string(), "REQUEST_FNF");
    }
}
