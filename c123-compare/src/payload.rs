use crate::bits::{any_set, bit_at};
use crate::report::{
    BitDiff, BitMismatch, ByteDiff, ByteMismatch, ComparisonReport, LengthCheck, PaddingCheck,
    Window,
};
use crate::roundtrip::{verify_round_trip, Decoder, RoundTripOutcome};
use crate::CompareError;
use c123_container::Container;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Bytes shown around a point of interest.
pub const DEBUG_BYTES: usize = 32;
/// Individual byte or bit mismatches listed before the rest are only counted.
pub const MISMATCH_LIMIT: usize = 8;

#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Size of the uncompressed input, for the compression ratio.
    pub input_bytes: u64,
    /// Original input; enables the decoder round trip.
    pub input_file: Option<PathBuf>,
    pub context_bytes: usize,
    pub mismatch_limit: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self::new(0)
    }
}

impl CompareOptions {
    pub fn new(input_bytes: u64) -> Self {
        Self {
            input_bytes,
            input_file: None,
            context_bytes: DEBUG_BYTES,
            mismatch_limit: MISMATCH_LIMIT,
        }
    }

    pub fn with_input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_file = Some(path.into());
        self
    }
}

/// Run every payload-level check. Never short-circuits and never fails.
pub fn compare_payloads(
    container: &Container,
    hardware: &[u8],
    options: &CompareOptions,
) -> ComparisonReport {
    let reference = container.payload();
    let declared_bits = reference.bit_len();
    let expected_bytes = reference.byte_len();
    let half = options.context_bytes / 2;

    let length = check_length(hardware, expected_bytes, options.context_bytes);
    let bytes = diff_bytes(reference.bytes(), hardware, options.mismatch_limit, half);
    let bits = diff_bits(reference.bytes(), hardware, declared_bits, options.mismatch_limit);
    let padding = check_padding(hardware, declared_bits, options.context_bytes);

    let compression_ratio = if reference.is_empty() {
        None
    } else {
        Some(options.input_bytes as f64 / expected_bytes as f64)
    };

    let report = ComparisonReport {
        version: container.version(),
        dimensions: container.dimensions(),
        declared_bits,
        expected_bytes,
        reference_bytes: reference.byte_len(),
        hardware_bytes: hardware.len(),
        length,
        bytes,
        bits,
        padding,
        input_bytes: options.input_bytes,
        compression_ratio,
        round_trip: RoundTripOutcome::NotRequested,
    };
    debug!(
        byte_mismatches = report.bytes.total,
        bit_mismatches = report.bits.total,
        "payload comparison finished"
    );
    report
}

/// Payload checks plus, when `options.input_file` is set, the decoder round trip.
pub fn compare(
    container: &Container,
    hardware: &[u8],
    options: &CompareOptions,
    decoder: Option<&dyn Decoder>,
) -> Result<ComparisonReport, CompareError> {
    let mut report = compare_payloads(container, hardware, options);
    if let Some(input) = &options.input_file {
        report.round_trip = verify_round_trip(container, hardware, input, decoder)?;
    }
    info!(passed = report.passed(), "comparison complete");
    Ok(report)
}

/// Write the reference payload bytes to `path`, creating parent directories.
pub fn export_payload(container: &Container, path: &Path) -> Result<(), CompareError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, container.payload().bytes())?;
    Ok(())
}

fn check_length(hardware: &[u8], expected: usize, context: usize) -> LengthCheck {
    use std::cmp::Ordering;
    match hardware.len().cmp(&expected) {
        Ordering::Equal => LengthCheck::Match,
        Ordering::Greater => LengthCheck::Excess {
            extra: hardware.len() - expected,
            window: Window::of(hardware, expected, expected + context),
        },
        Ordering::Less => LengthCheck::Shortfall {
            missing: expected - hardware.len(),
            window: Window::of(hardware, hardware.len().saturating_sub(context), hardware.len()),
        },
    }
}

fn diff_bytes(reference: &[u8], hardware: &[u8], limit: usize, half: usize) -> ByteDiff {
    let compared = reference.len().min(hardware.len());
    let mut diff = ByteDiff {
        compared,
        ..ByteDiff::default()
    };

    for (offset, (&r, &h)) in reference.iter().zip(hardware).enumerate() {
        if r == h {
            continue;
        }
        diff.total += 1;
        if diff.reported.len() < limit {
            diff.reported.push(ByteMismatch {
                offset,
                hardware: h,
                reference: r,
            });
        }
    }

    if let Some(first) = diff.first().map(|m| m.offset) {
        let start = first.saturating_sub(half);
        let end = (first + half).min(compared);
        diff.reference_window = Some(Window::of(reference, start, end));
        diff.hardware_window = Some(Window::of(hardware, start, end));
    }
    diff
}

fn diff_bits(reference: &[u8], hardware: &[u8], declared_bits: u64, limit: usize) -> BitDiff {
    let compared = declared_bits.min(hardware.len() as u64 * 8);
    let mut diff = BitDiff {
        compared,
        ..BitDiff::default()
    };

    let whole_bytes = ((compared + 7) / 8) as usize;
    for byte in 0..whole_bytes {
        let r = reference.get(byte).copied().unwrap_or(0);
        let h = hardware.get(byte).copied().unwrap_or(0);
        if r == h {
            continue;
        }
        let base = byte as u64 * 8;
        for bit in base..(base + 8).min(compared) {
            let (rb, hb) = (bit_at(reference, bit), bit_at(hardware, bit));
            if rb == hb {
                continue;
            }
            diff.total += 1;
            if diff.reported.len() < limit {
                diff.reported.push(BitMismatch {
                    bit,
                    hardware: hb,
                    reference: rb,
                });
            }
        }
    }
    diff
}

fn check_padding(hardware: &[u8], declared_bits: u64, context: usize) -> PaddingCheck {
    let available = hardware.len() as u64 * 8;
    if available < declared_bits {
        return PaddingCheck::Missing {
            missing_bits: declared_bits - available,
        };
    }
    if available == declared_bits {
        return PaddingCheck::Exact;
    }
    let trailing_start = (declared_bits / 8) as usize;
    PaddingCheck::Extra {
        extra_bits: available - declared_bits,
        non_zero: any_set(hardware, declared_bits, available),
        window: Window::of(hardware, trailing_start, trailing_start + context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c123_container::{ContainerHeader, HeaderV2};

    fn container(payload: &[u8], bits: u32) -> Container {
        let header = ContainerHeader::V2(HeaderV2 {
            nx: 4,
            ny: 4,
            nz: 1,
            depth: 8,
            ..HeaderV2::default()
        })
        .with_payload_bits(bits);
        Container::new(header, payload.to_vec()).unwrap()
    }

    #[test]
    fn test_identical_payload_passes() {
        let c = container(&[0xAB, 0xC0], 10);
        let report = compare_payloads(&c, &[0xAB, 0xC0], &CompareOptions::new(16));
        assert!(report.passed());
        assert_eq!(report.length, LengthCheck::Match);
        // Six all-zero padding bits beyond the declared ten are informational.
        assert!(matches!(
            report.padding,
            PaddingCheck::Extra {
                extra_bits: 6,
                non_zero: false,
                ..
            }
        ));
        assert_eq!(report.compression_ratio, Some(8.0));
    }

    #[test]
    fn test_trailing_padding_bits_are_not_compared() {
        // Declared 10 bits: only the top two bits of byte 1 matter for the bit scan.
        let c = container(&[0xAB, 0xC0], 10);
        let report = compare_payloads(&c, &[0xAB, 0xC1], &CompareOptions::new(16));
        assert_eq!(report.bits.total, 0);
        assert_eq!(report.bits.compared, 10);
        // The byte scan still sees the difference.
        assert_eq!(report.bytes.total, 1);
        assert!(!report.passed());
    }

    #[test]
    fn test_mismatch_cap_counts_everything() {
        let reference = vec![0u8; 20];
        let hardware = vec![0xFFu8; 20];
        let c = container(&reference, 160);
        let report = compare_payloads(&c, &hardware, &CompareOptions::new(40));
        assert_eq!(report.bytes.total, 20);
        assert_eq!(report.bytes.reported.len(), MISMATCH_LIMIT);
        assert_eq!(report.bits.total, 160);
        assert_eq!(report.bits.reported.len(), MISMATCH_LIMIT);
        assert_eq!(report.bits.reported[0].bit, 0);
    }

    #[test]
    fn test_shortfall_is_missing_bits() {
        let c = container(&[1, 2, 3], 24);
        let report = compare_payloads(&c, &[1, 2], &CompareOptions::new(8));
        assert!(matches!(report.length, LengthCheck::Shortfall { missing: 1, .. }));
        assert_eq!(report.padding, PaddingCheck::Missing { missing_bits: 8 });
        assert_eq!(report.bytes.total, 0);
        assert!(!report.passed());
    }

    #[test]
    fn test_empty_reference_has_no_ratio() {
        let c = container(&[], 0);
        let report = compare_payloads(&c, &[], &CompareOptions::new(8));
        assert_eq!(report.compression_ratio, None);
        assert!(report.passed());
        assert!(report
            .to_string()
            .contains("Compression ratio unavailable: reference payload is empty"));
    }
}
