//! Helpers for explicit network byte-order conversions.
//!
//! RSocket frames use three big-endian widths: the 16-bit type/flags word, the
//! 24-bit metadata and frame length fields, and the 32-bit stream identifier
//! and request-N fields. These helpers keep Clippy expectations scoped to the
//! conversion points so protocol code can stay explicit about wire endianness.

/// Largest value representable by a 24-bit length field.
pub const U24_MAX: u32 = 0x00FF_FFFF;

/// Serialise a `u16` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use rsocket_frame::byte_order::write_network_u16;
///
/// assert_eq!(write_network_u16(0x1234), [0x12, 0x34]);
/// ```
#[must_use]
pub fn write_network_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u16` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use rsocket_frame::byte_order::read_network_u16;
///
/// assert_eq!(read_network_u16([0x12, 0x34]), 0x1234);
/// ```
#[must_use]
pub fn read_network_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u16::from_be_bytes(bytes)
}

/// Serialise the low 24 bits of `value` in network byte order.
///
/// Returns `None` when `value` does not fit in 24 bits.
///
/// # Examples
///
/// ```
/// use rsocket_frame::byte_order::write_network_u24;
///
/// assert_eq!(write_network_u24(0x12_3456), Some([0x12, 0x34, 0x56]));
/// assert_eq!(write_network_u24(0x0100_0000), None);
/// ```
#[must_use]
pub fn write_network_u24(value: u32) -> Option<[u8; 3]> {
    if value > U24_MAX {
        return None;
    }
    let [_, high, mid, low] = write_network_u32(value);
    Some([high, mid, low])
}

/// Parse a network-order 24-bit value.
///
/// # Examples
///
/// ```
/// use rsocket_frame::byte_order::read_network_u24;
///
/// assert_eq!(read_network_u24([0x12, 0x34, 0x56]), 0x12_3456);
/// ```
#[must_use]
pub fn read_network_u24(bytes: [u8; 3]) -> u32 {
    let [high, mid, low] = bytes;
    read_network_u32([0, high, mid, low])
}

/// Serialise a `u32` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use rsocket_frame::byte_order::write_network_u32;
///
/// assert_eq!(write_network_u32(0x1234_5678), [0x12, 0x34, 0x56, 0x78]);
/// ```
#[must_use]
pub fn write_network_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use rsocket_frame::byte_order::read_network_u32;
///
/// assert_eq!(read_network_u32([0x12, 0x34, 0x56, 0x78]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_network_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u32::from_be_bytes(bytes)
}

/// Copy `N` bytes starting at `offset`, or `None` if `buf` is too short.
pub(crate) fn array_at<const N: usize>(buf: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    buf.get(offset..end)
        .and_then(|slice| <[u8; N]>::try_from(slice).ok())
}

#[cfg(test)]
mod tests {
    //! Round-trip tests for network byte-order conversion helpers.

    use rstest::rstest;

    use super::{
        U24_MAX,
        array_at,
        read_network_u16,
        read_network_u24,
        read_network_u32,
        write_network_u16,
        write_network_u24,
        write_network_u32,
    };

    #[rstest]
    #[case::u16(
        0x1234u32,
        &write_network_u16(0x1234)[..],
        &[0x12, 0x34],
        u32::from(read_network_u16([0x12, 0x34]))
    )]
    #[case::u24(
        0x12_3456u32,
        &write_network_u24(0x12_3456).unwrap_or_default()[..],
        &[0x12, 0x34, 0x56],
        read_network_u24([0x12, 0x34, 0x56])
    )]
    #[case::u32(
        0x1234_5678u32,
        &write_network_u32(0x1234_5678)[..],
        &[0x12, 0x34, 0x56, 0x78],
        read_network_u32([0x12, 0x34, 0x56, 0x78])
    )]
    fn network_byte_order_round_trip(
        #[case] value: u32,
        #[case] written: &[u8],
        #[case] expected_bytes: &[u8],
        #[case] read_back: u32,
    ) {
        assert_eq!(written, expected_bytes);
        assert_eq!(read_back, value);
    }

    #[test]
    fn u24_rejects_wider_values() {
        assert_eq!(write_network_u24(U24_MAX), Some([0xFF, 0xFF, 0xFF]));
        assert_eq!(write_network_u24(U24_MAX + 1), None);
    }

    #[test]
    fn array_at_respects_bounds() {
        let buf = [1_u8, 2, 3, 4, 5];
        assert_eq!(array_at::<2>(&buf, 3), Some([4, 5]));
        assert_eq!(array_at::<2>(&buf, 4), None);
        assert_eq!(array_at::<4>(&buf, usize::MAX), None);
    }
}
