/// Render `data` as `OFFSET: HEX... |ASCII|` lines, `width` bytes per line.
///
/// Offsets start at `base` and are printed as eight upper-case hex digits.
/// Non-printable bytes show as `.` in the ASCII column.
pub fn format_slice(data: &[u8], base: usize, width: usize) -> String {
    if data.is_empty() {
        return format!("{:08X}: <empty>", base);
    }
    let width = width.max(1);
    let hex_width = width * 3 - 1;
    data.chunks(width)
        .enumerate()
        .map(|(i, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{:02X}", b)).collect();
            let ascii: String = chunk
                .iter()
                .map(|&b| if (32..127).contains(&b) { b as char } else { '.' })
                .collect();
            format!(
                "{:08X}: {:<hex_width$} |{}|",
                base + i * width,
                hex.join(" "),
                ascii,
                hex_width = hex_width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(format_slice(&[], 0x20, 16), "00000020: <empty>");
    }

    #[test]
    fn test_partial_line_is_padded() {
        let out = format_slice(b"C123\x02\x00", 0, 8);
        assert_eq!(out, "00000000: 43 31 32 33 02 00       |C123..|");
    }

    #[test]
    fn test_multi_line_offsets() {
        let data: Vec<u8> = (0..20).collect();
        let out = format_slice(&data, 0x100, 16);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000100: 00 01"));
        assert!(lines[1].starts_with("00000110: 10 11 12 13"));
    }
}
