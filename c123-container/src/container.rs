use crate::header::ContainerHeader;
use crate::{ContainerError, FormatError};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Compressed payload and its exact length in bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Vec<u8>,
    bit_len: u64,
}

impl Payload {
    /// `bytes` must hold exactly `⌈bit_len / 8⌉` bytes.
    pub fn new(bytes: Vec<u8>, bit_len: u64) -> Result<Self, FormatError> {
        let expected = (bit_len + 7) / 8;
        if bytes.len() as u64 != expected {
            return Err(FormatError::PayloadTruncated {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes, bit_len })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bits the last byte carries beyond the declared length.
    pub fn padding_bits(&self) -> u64 {
        self.bytes.len() as u64 * 8 - self.bit_len
    }
}

/// A parsed container: header, the raw header bytes it came from, and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    header: ContainerHeader,
    header_bytes: Vec<u8>,
    payload: Payload,
}

impl Container {
    /// Build a container around `payload`; the header's bit length is kept.
    pub fn new(header: ContainerHeader, payload: Vec<u8>) -> Result<Self, FormatError> {
        let payload = Payload::new(payload, u64::from(header.payload_bits()))?;
        Ok(Self {
            header_bytes: header.to_bytes(),
            header,
            payload,
        })
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let header = ContainerHeader::decode(bytes)?;
        let start = header.header_size();
        let expected = header.payload_bytes();
        let available = bytes.len() - start;
        if (available as u64) < expected {
            return Err(FormatError::PayloadTruncated {
                expected,
                actual: available,
            });
        }
        // expected <= available, so it fits in usize.
        let end = start + expected as usize;
        let payload = Payload {
            bytes: bytes[start..end].to_vec(),
            bit_len: u64::from(header.payload_bits()),
        };
        if end < bytes.len() {
            debug!(trailing = bytes.len() - end, "ignoring bytes after payload");
        }
        Ok(Self {
            header,
            header_bytes: bytes[..start].to_vec(),
            payload,
        })
    }

    pub fn open(path: &Path) -> Result<Self, ContainerError> {
        let bytes = fs::read(path)?;
        let container = Self::parse(&bytes)?;
        debug!(
            path = %path.display(),
            version = container.version(),
            payload_bits = container.payload.bit_len(),
            "parsed container"
        );
        Ok(container)
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Header bytes exactly as they appeared in the source buffer.
    pub fn header_bytes(&self) -> &[u8] {
        &self.header_bytes
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn version(&self) -> u16 {
        self.header.version()
    }

    /// `(NX, NY, NZ, D)`.
    pub fn dimensions(&self) -> (u16, u16, u16, u16) {
        self.header.dimensions()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header_bytes.len() + self.payload.byte_len());
        out.extend_from_slice(&self.header_bytes);
        out.extend_from_slice(self.payload.bytes());
        out
    }

    /// The original header followed by an arbitrary payload, byte for byte.
    ///
    /// Used to feed a foreign payload through the reference decoder under the
    /// reference header; no length check is made.
    pub fn splice_payload(&self, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header_bytes.len() + payload.len());
        out.extend_from_slice(&self.header_bytes);
        out.extend_from_slice(payload);
        out
    }
}
