//! Lossless round trip through the reference decoder.
//!
//! Both the reference container and a synthesized container (reference
//! header + hardware payload) are decoded in a scratch directory and each
//! result is compared to the original input on its own.

use crate::payload::DEBUG_BYTES;
use crate::report::Window;
use crate::CompareError;
use c123_container::Container;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RoundTripError {
    #[error("Decoding failed with exit code {code}.\nSTDOUT:{stdout}\nSTDERR:{stderr}")]
    DecoderExit {
        /// `-1` when the process was terminated by a signal.
        code: i32,
        stdout: String,
        stderr: String,
    },
    #[error("Could not launch decoder {}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Decoder wrote no output at {}", .0.display())]
    NoOutput(PathBuf),
}

/// Anything that turns a container file back into raw samples.
pub trait Decoder {
    /// Human-readable identity, used in skip messages.
    fn describe(&self) -> String;

    /// Whether the decoder can be invoked at all.
    fn available(&self) -> bool {
        true
    }

    fn decode(&self, container: &Path, output: &Path) -> Result<(), RoundTripError>;
}

/// Runs `<program> -i <container> -o <output>` and waits for it.
#[derive(Debug, Clone)]
pub struct ExternalDecoder {
    program: PathBuf,
}

impl ExternalDecoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Decoder for ExternalDecoder {
    fn describe(&self) -> String {
        self.program.display().to_string()
    }

    fn available(&self) -> bool {
        self.program.exists()
    }

    fn decode(&self, container: &Path, output: &Path) -> Result<(), RoundTripError> {
        debug!(decoder = %self.program.display(), container = %container.display(), "decoding");
        let result = Command::new(&self.program)
            .arg("-i")
            .arg(container)
            .arg("-o")
            .arg(output)
            .output()
            .map_err(|source| RoundTripError::Launch {
                path: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(RoundTripError::DecoderExit {
                code: result.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&result.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

/// How one decoded stream relates to the original input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamComparison {
    Match,
    Differ {
        input_len: usize,
        decoded_len: usize,
        /// `(offset, input, decoded)` for the first differing byte.
        first_mismatch: Option<(usize, u8, u8)>,
        input_window: Option<Window>,
        decoded_window: Option<Window>,
    },
}

impl StreamComparison {
    pub fn of(original: &[u8], decoded: &[u8]) -> Self {
        if original == decoded {
            return StreamComparison::Match;
        }

        let first = original.iter().zip(decoded).position(|(a, b)| a != b);

        let (first_mismatch, input_window, decoded_window) = match first {
            Some(idx) => {
                let start = idx.saturating_sub(DEBUG_BYTES / 2);
                let end = idx + DEBUG_BYTES / 2;
                (
                    Some((idx, original[idx], decoded[idx])),
                    Some(Window::of(original, start, end)),
                    Some(Window::of(decoded, start, end)),
                )
            }
            None => (None, None, None),
        };

        StreamComparison::Differ {
            input_len: original.len(),
            decoded_len: decoded.len(),
            first_mismatch,
            input_window,
            decoded_window,
        }
    }

    pub fn matches(&self) -> bool {
        matches!(self, StreamComparison::Match)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideOutcome {
    pub label: &'static str,
    pub comparison: StreamComparison,
}

impl fmt::Display for SideOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.comparison {
            StreamComparison::Match => {
                writeln!(f, "{}: decoded samples match the input stream", self.label)
            }
            StreamComparison::Differ {
                input_len,
                decoded_len,
                first_mismatch,
                input_window,
                decoded_window,
            } => {
                writeln!(f, "{}: decoded samples differ from the input stream", self.label)?;
                if input_len != decoded_len {
                    writeln!(
                        f,
                        "  Length mismatch: input={} bytes, decoded={} bytes",
                        input_len, decoded_len
                    )?;
                }
                if let Some((idx, input, decoded)) = first_mismatch {
                    writeln!(
                        f,
                        "  First mismatch at byte {}: input=0x{:02X} decoded=0x{:02X}",
                        idx, input, decoded
                    )?;
                }
                if let Some(window) = input_window {
                    writeln!(f, "  Input slice:\n{}", window)?;
                }
                if let Some(window) = decoded_window {
                    writeln!(f, "  Decoded slice:\n{}", window)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundTripOutcome {
    /// No input file was supplied.
    NotRequested,
    /// Decoder absent; reported as a warning only.
    Skipped(String),
    InputMissing(PathBuf),
    DecoderFailed(String),
    Ran {
        reference: SideOutcome,
        hardware: SideOutcome,
    },
}

impl RoundTripOutcome {
    pub fn both_matched(&self) -> bool {
        match self {
            RoundTripOutcome::Ran {
                reference,
                hardware,
            } => reference.comparison.matches() && hardware.comparison.matches(),
            _ => false,
        }
    }

    /// A fatal reason, if this outcome fails the run.
    pub fn failure(&self) -> Option<String> {
        match self {
            RoundTripOutcome::NotRequested | RoundTripOutcome::Skipped(_) => None,
            RoundTripOutcome::InputMissing(path) => {
                Some(format!("input file {} does not exist", path.display()))
            }
            RoundTripOutcome::DecoderFailed(reason) => Some(reason.clone()),
            RoundTripOutcome::Ran {
                reference,
                hardware,
            } => {
                let failed: Vec<&str> = [reference, hardware]
                    .iter()
                    .filter(|side| !side.comparison.matches())
                    .map(|side| side.label)
                    .collect();
                if failed.is_empty() {
                    None
                } else {
                    Some(format!("{} mismatch", failed.join(" and ")))
                }
            }
        }
    }
}

impl fmt::Display for RoundTripOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundTripOutcome::NotRequested => Ok(()),
            RoundTripOutcome::Skipped(reason) => writeln!(f, "{}", reason),
            RoundTripOutcome::InputMissing(path) => writeln!(
                f,
                "Input reference file '{}' does not exist; skipping round-trip check",
                path.display()
            ),
            RoundTripOutcome::DecoderFailed(reason) => {
                writeln!(f, "Decoder invocation failed: {}", reason)
            }
            RoundTripOutcome::Ran {
                reference,
                hardware,
            } => write!(f, "{}{}", reference, hardware),
        }
    }
}

/// Decodes the reference container and the hardware payload spliced under
/// the reference header, then compares each result with `input_file`.
///
/// Precondition failures never error: a missing input file fails the
/// round trip and a missing decoder skips it. Only scratch-directory I/O
/// surfaces as `Err`.
pub fn verify_round_trip(
    container: &Container,
    hardware: &[u8],
    input_file: &Path,
    decoder: Option<&dyn Decoder>,
) -> Result<RoundTripOutcome, CompareError> {
    if !input_file.exists() {
        warn!(input = %input_file.display(), "round-trip input missing");
        return Ok(RoundTripOutcome::InputMissing(input_file.to_path_buf()));
    }
    let decoder = match decoder {
        None => {
            warn!("no decoder configured, round trip skipped");
            return Ok(RoundTripOutcome::Skipped(
                "Decoder path not provided; skipping round-trip verification".to_string(),
            ));
        }
        Some(d) if !d.available() => {
            warn!(decoder = %d.describe(), "decoder not found, round trip skipped");
            return Ok(RoundTripOutcome::Skipped(format!(
                "Decoder binary '{}' not found; skipping round-trip verification",
                d.describe()
            )));
        }
        Some(d) => d,
    };

    let scratch = tempfile::tempdir()?;
    let reference_container = scratch.path().join("reference.c123");
    let hardware_container = scratch.path().join("hardware_payload.c123");
    let reference_decoded = scratch.path().join("decoded_reference.bsq");
    let hardware_decoded = scratch.path().join("decoded_hardware.bsq");

    fs::write(&reference_container, container.to_bytes())?;
    fs::write(&hardware_container, container.splice_payload(hardware))?;

    let decoded = decode_pair(
        decoder,
        [
            (&reference_container, &reference_decoded),
            (&hardware_container, &hardware_decoded),
        ],
    );
    if let Err(err) = decoded {
        warn!(error = %err, "decoder invocation failed");
        return Ok(RoundTripOutcome::DecoderFailed(err.to_string()));
    }

    let original = fs::read(input_file)?;
    let reference = SideOutcome {
        label: "Reference round-trip",
        comparison: StreamComparison::of(&original, &fs::read(&reference_decoded)?),
    };
    let hardware = SideOutcome {
        label: "Hardware round-trip",
        comparison: StreamComparison::of(&original, &fs::read(&hardware_decoded)?),
    };
    Ok(RoundTripOutcome::Ran {
        reference,
        hardware,
    })
}

fn decode_pair(
    decoder: &dyn Decoder,
    jobs: [(&PathBuf, &PathBuf); 2],
) -> Result<(), RoundTripError> {
    for (container, output) in jobs {
        decoder.decode(container, output)?;
        if !output.exists() {
            return Err(RoundTripError::NoOutput(output.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_comparison_match() {
        assert!(StreamComparison::of(b"abc", b"abc").matches());
    }

    #[test]
    fn test_stream_comparison_locates_first_difference() {
        let cmp = StreamComparison::of(&[1, 2, 3, 4], &[1, 2, 9, 4]);
        match cmp {
            StreamComparison::Differ {
                first_mismatch,
                input_len,
                decoded_len,
                ..
            } => {
                assert_eq!(first_mismatch, Some((2, 3, 9)));
                assert_eq!(input_len, 4);
                assert_eq!(decoded_len, 4);
            }
            StreamComparison::Match => panic!("expected a difference"),
        }
    }

    #[test]
    fn test_stream_comparison_length_only() {
        let cmp = StreamComparison::of(&[1, 2, 3], &[1, 2]);
        let side = SideOutcome {
            label: "Hardware round-trip",
            comparison: cmp,
        };
        let text = side.to_string();
        assert!(text.contains("decoded samples differ"));
        assert!(text.contains("Length mismatch: input=3 bytes, decoded=2 bytes"));
        assert!(!text.contains("First mismatch"));
    }

    #[test]
    fn test_skipped_is_not_a_failure() {
        assert_eq!(RoundTripOutcome::Skipped("x".into()).failure(), None);
        assert!(RoundTripOutcome::InputMissing(PathBuf::from("in.raw"))
            .failure()
            .is_some());
    }

    #[test]
    fn test_external_decoder_missing_binary() {
        let decoder = ExternalDecoder::new("/nonexistent/c123_decode");
        assert!(!decoder.available());
    }
}
