/// Bit `index` of `data`, MSB first within each byte. Bits past the end read as 0.
#[inline]
pub fn bit_at(data: &[u8], index: u64) -> u8 {
    let byte = (index / 8) as usize;
    let offset = (index % 8) as u32;
    match data.get(byte) {
        Some(b) => (b >> (7 - offset)) & 1,
        None => 0,
    }
}

/// True when any bit in `[from, to)` is set.
pub fn any_set(data: &[u8], from: u64, to: u64) -> bool {
    (from..to).any(|i| bit_at(data, i) == 1)
}
