use crate::FormatError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{self, Cursor, Read, Write};

pub const MAGIC: [u8; 4] = *b"C123";

pub const FLAG_REDUCED: u16 = 0x0001;
pub const FLAG_COLUMN_ORIENTED: u16 = 0x0002;

/// Fixed byte layout of one header version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionLayout {
    pub version: u16,
    pub header_size: usize,
    /// Byte offset of the u32 payload bit length.
    pub payload_bits_offset: usize,
}

/// Version registry.
///
/// v2: magic, 7×u16 (version first), 3×u32.
/// v3: magic, 8×u16 (version first), 5×i16, 4×u16, 2×u32.
pub const LAYOUTS: [VersionLayout; 2] = [
    VersionLayout {
        version: 2,
        header_size: 4 + 7 * 2 + 3 * 4,
        payload_bits_offset: 4 + 7 * 2,
    },
    VersionLayout {
        version: 3,
        header_size: 4 + 8 * 2 + 5 * 2 + 4 * 2 + 2 * 4,
        payload_bits_offset: 4 + 8 * 2 + 5 * 2 + 4 * 2,
    },
];

pub const MIN_HEADER_SIZE: usize = LAYOUTS[0].header_size;

pub fn layout_for(version: u16) -> Option<&'static VersionLayout> {
    LAYOUTS.iter().find(|l| l.version == version)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderV2 {
    pub nx: u16,
    pub ny: u16,
    pub nz: u16,
    pub depth: u16,
    pub p: u16,
    pub local_sum_mode: u16,
    pub payload_bits: u32,
    pub reserved0: u32,
    pub reserved1: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderV3 {
    pub nx: u16,
    pub ny: u16,
    pub nz: u16,
    pub depth: u16,
    pub p: u16,
    pub local_sum_mode: u16,
    pub flags: u16,
    pub v_min: i16,
    pub v_max: i16,
    pub omega: i16,
    pub register_bits: i16,
    pub tinc_log: i16,
    pub u_max: u16,
    pub counter_size: u16,
    pub initial_count_exponent: u16,
    pub kz_prime: u16,
    pub payload_bits: u32,
    pub reserved0: u32,
}

impl HeaderV3 {
    pub fn reduced(&self) -> bool {
        self.flags & FLAG_REDUCED != 0
    }

    pub fn column_oriented(&self) -> bool {
        self.flags & FLAG_COLUMN_ORIENTED != 0
    }
}

/// Predictor and entropy-coder settings recorded in (or implied by) a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoderParams {
    pub v_min: i16,
    pub v_max: i16,
    pub omega: i16,
    pub register_bits: i16,
    pub tinc_log: i16,
    pub u_max: u16,
    pub counter_size: u16,
    pub initial_count_exponent: u16,
    pub kz_prime: u16,
}

impl CoderParams {
    /// Settings the encoder used before version 3 started recording them.
    pub const V2_DEFAULTS: CoderParams = CoderParams {
        v_min: -6,
        v_max: 9,
        omega: 19,
        register_bits: 64,
        tinc_log: 4,
        u_max: 9,
        counter_size: 8,
        initial_count_exponent: 6,
        kz_prime: 8,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerHeader {
    V2(HeaderV2),
    V3(HeaderV3),
}

impl ContainerHeader {
    /// Decode a header from the start of `bytes`.
    ///
    /// Checks run in order: minimum length, magic, version lookup, length for
    /// that version, then the full layout (whose embedded magic is checked
    /// again).
    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < MIN_HEADER_SIZE {
            return Err(FormatError::Truncated {
                len: bytes.len(),
                needed: MIN_HEADER_SIZE,
            });
        }
        let magic = read_magic(bytes);
        if magic != MAGIC {
            return Err(FormatError::BadMagic(magic));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        let layout = layout_for(version).ok_or(FormatError::UnsupportedVersion(version))?;
        if bytes.len() < layout.header_size {
            return Err(FormatError::HeaderTruncated {
                version,
                len: bytes.len(),
                needed: layout.header_size,
            });
        }

        let mut cursor = Cursor::new(&bytes[..layout.header_size]);
        let decoded = Self::read_layout(&mut cursor, version)
            .map_err(|_| FormatError::HeaderTruncated {
                version,
                len: bytes.len(),
                needed: layout.header_size,
            })?
            .ok_or(FormatError::UnsupportedVersion(version))?;
        match decoded {
            (embedded, _) if embedded != MAGIC => Err(FormatError::BadMagic(embedded)),
            (_, header) => {
                let off = layout.payload_bits_offset;
                debug_assert_eq!(
                    bytes[off..off + 4],
                    header.payload_bits().to_le_bytes(),
                    "field reader out of step with the layout registry"
                );
                Ok(header)
            }
        }
    }

    /// `None` for a version this reader has no field layout for.
    fn read_layout<R: Read>(r: &mut R, version: u16) -> io::Result<Option<([u8; 4], Self)>> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        let _version = r.read_u16::<LittleEndian>()?;
        let header = match version {
            2 => ContainerHeader::V2(HeaderV2 {
                nx: r.read_u16::<LittleEndian>()?,
                ny: r.read_u16::<LittleEndian>()?,
                nz: r.read_u16::<LittleEndian>()?,
                depth: r.read_u16::<LittleEndian>()?,
                p: r.read_u16::<LittleEndian>()?,
                local_sum_mode: r.read_u16::<LittleEndian>()?,
                payload_bits: r.read_u32::<LittleEndian>()?,
                reserved0: r.read_u32::<LittleEndian>()?,
                reserved1: r.read_u32::<LittleEndian>()?,
            }),
            3 => ContainerHeader::V3(HeaderV3 {
                nx: r.read_u16::<LittleEndian>()?,
                ny: r.read_u16::<LittleEndian>()?,
                nz: r.read_u16::<LittleEndian>()?,
                depth: r.read_u16::<LittleEndian>()?,
                p: r.read_u16::<LittleEndian>()?,
                local_sum_mode: r.read_u16::<LittleEndian>()?,
                flags: r.read_u16::<LittleEndian>()?,
                v_min: r.read_i16::<LittleEndian>()?,
                v_max: r.read_i16::<LittleEndian>()?,
                omega: r.read_i16::<LittleEndian>()?,
                register_bits: r.read_i16::<LittleEndian>()?,
                tinc_log: r.read_i16::<LittleEndian>()?,
                u_max: r.read_u16::<LittleEndian>()?,
                counter_size: r.read_u16::<LittleEndian>()?,
                initial_count_exponent: r.read_u16::<LittleEndian>()?,
                kz_prime: r.read_u16::<LittleEndian>()?,
                payload_bits: r.read_u32::<LittleEndian>()?,
                reserved0: r.read_u32::<LittleEndian>()?,
            }),
            _ => return Ok(None),
        };
        Ok(Some((magic, header)))
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&MAGIC)?;
        w.write_u16::<LittleEndian>(self.version())?;
        match self {
            ContainerHeader::V2(h) => {
                for v in [h.nx, h.ny, h.nz, h.depth, h.p, h.local_sum_mode] {
                    w.write_u16::<LittleEndian>(v)?;
                }
                for v in [h.payload_bits, h.reserved0, h.reserved1] {
                    w.write_u32::<LittleEndian>(v)?;
                }
            }
            ContainerHeader::V3(h) => {
                for v in [h.nx, h.ny, h.nz, h.depth, h.p, h.local_sum_mode, h.flags] {
                    w.write_u16::<LittleEndian>(v)?;
                }
                for v in [h.v_min, h.v_max, h.omega, h.register_bits, h.tinc_log] {
                    w.write_i16::<LittleEndian>(v)?;
                }
                for v in [h.u_max, h.counter_size, h.initial_count_exponent, h.kz_prime] {
                    w.write_u16::<LittleEndian>(v)?;
                }
                for v in [h.payload_bits, h.reserved0] {
                    w.write_u32::<LittleEndian>(v)?;
                }
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.layout().header_size);
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        buf
    }

    pub fn version(&self) -> u16 {
        match self {
            ContainerHeader::V2(_) => 2,
            ContainerHeader::V3(_) => 3,
        }
    }

    pub fn layout(&self) -> &'static VersionLayout {
        match self {
            ContainerHeader::V2(_) => &LAYOUTS[0],
            ContainerHeader::V3(_) => &LAYOUTS[1],
        }
    }

    pub fn header_size(&self) -> usize {
        self.layout().header_size
    }

    /// `(NX, NY, NZ, D)`.
    pub fn dimensions(&self) -> (u16, u16, u16, u16) {
        match self {
            ContainerHeader::V2(h) => (h.nx, h.ny, h.nz, h.depth),
            ContainerHeader::V3(h) => (h.nx, h.ny, h.nz, h.depth),
        }
    }

    pub fn payload_bits(&self) -> u32 {
        match self {
            ContainerHeader::V2(h) => h.payload_bits,
            ContainerHeader::V3(h) => h.payload_bits,
        }
    }

    /// `⌈payload_bits / 8⌉`.
    pub fn payload_bytes(&self) -> u64 {
        (u64::from(self.payload_bits()) + 7) / 8
    }

    pub fn with_payload_bits(mut self, bits: u32) -> Self {
        match &mut self {
            ContainerHeader::V2(h) => h.payload_bits = bits,
            ContainerHeader::V3(h) => h.payload_bits = bits,
        }
        self
    }

    pub fn coder_params(&self) -> CoderParams {
        match self {
            ContainerHeader::V2(_) => CoderParams::V2_DEFAULTS,
            ContainerHeader::V3(h) => CoderParams {
                v_min: h.v_min,
                v_max: h.v_max,
                omega: h.omega,
                register_bits: h.register_bits,
                tinc_log: h.tinc_log,
                u_max: h.u_max,
                counter_size: h.counter_size,
                initial_count_exponent: h.initial_count_exponent,
                kz_prime: h.kz_prime,
            },
        }
    }
}

fn read_magic(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}
