//! Leading zero bit counting, most significant bit first.

/// Count the zero bits of `byte` before its first set bit, scanning from bit
/// 7 down to bit 0. A zero byte counts as 8.
#[inline]
pub fn leading_zeros_in_byte(byte: u8) -> u32 {
    let mut count = 0;

    for bit in (0..8).rev() {
        if byte & (1 << bit) != 0 {
            break;
        }
        count += 1;
    }

    count
}

/// Count the leading zero bits of a byte sequence.
///
/// Bytes are scanned in order and counting stops after the first byte that is
/// not entirely zero, so `[0x00, 0x03, 0x00]` counts 14 and never looks at the
/// final byte. Counts past `u32::MAX` saturate.
#[inline]
pub fn leading_zeros_in_sequence(bytes: &[u8]) -> u32 {
    let (whole, partial) = match bytes.iter().position(|&b| b != 0) {
        Some(i) => (i, leading_zeros_in_byte(bytes[i])),
        None => (bytes.len(), 0),
    };

    (whole as u64)
        .saturating_mul(8)
        .saturating_add(u64::from(partial))
        .min(u64::from(u32::MAX)) as u32
}
