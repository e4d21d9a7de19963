/// Internet checksum (RFC 1071) over `data`.
///
/// Words are summed little-endian and the result is byte-swapped at the end, which yields the
/// value to be stored big-endian in the ICMP checksum field. An odd trailing byte is padded with
/// zero.
pub(crate) fn checksum(data: &[u8]) -> u16 {
    let mut chunks = data.chunks_exact(2);
    let mut sum: u32 = chunks
        .by_ref()
        .map(|word| u32::from(u16::from_le_bytes([word[0], word[1]])))
        .fold(0u32, u32::wrapping_add);
    if let [last] = chunks.remainder() {
        sum = sum.wrapping_add(u32::from(*last));
    }
    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xffff);
    }
    #[allow(clippy::cast_possible_truncation)]
    let folded = sum as u16;
    (!folded).swap_bytes()
}
