use uuid::Uuid;

use crate::util::BytesExt;

/// The trailer of a VHD image. Fields are decoded to host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VhdFooter {
    pub cookie: [u8; 8],
    pub features: u32,
    pub file_format_version: u32,
    pub data_offset: u64,
    pub time_stamp: u32,
    pub creator_application: u32,
    pub creator_version: u32,
    pub creator_host_os: u32,
    pub original_size: u64,
    pub current_size: u64,
    pub cylinders: u16,
    pub heads: u8,
    pub sectors_per_track: u8,
    pub disk_type: u32,
    pub checksum: u32,
    pub unique_id: Uuid,
    pub saved_state: u8,
}

impl VhdFooter {
    pub const COOKIE: &'static [u8; 8] = b"conectix";
    pub const DISK_TYPE_FIXED: u32 = 2;

    /// Footer length written since Virtual PC 2004.
    pub const LEN: usize = 512;
    /// Footer length written by older Virtual PC releases.
    pub const LEN_LEGACY: usize = 511;

    const CHECKSUM_OFFSET: usize = 64;
    const UNIQUE_ID_OFFSET: usize = 68;
    const SAVED_STATE_OFFSET: usize = 84;

    /// Decodes the footer fields from `buf`. No validation is performed.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let cookie = buf.get(0..8)?.try_into().ok()?;
        let unique_id = buf
            .get(Self::UNIQUE_ID_OFFSET..Self::UNIQUE_ID_OFFSET + 16)?
            .try_into()
            .ok()?;

        Some(Self {
            cookie,
            features: buf.read_be(8)?,
            file_format_version: buf.read_be(12)?,
            data_offset: buf.read_be(16)?,
            time_stamp: buf.read_be(24)?,
            creator_application: buf.read_be(28)?,
            creator_version: buf.read_be(32)?,
            creator_host_os: buf.read_be(36)?,
            original_size: buf.read_be(40)?,
            current_size: buf.read_be(48)?,
            cylinders: buf.read_be(56)?,
            heads: buf.read_be(58)?,
            sectors_per_track: buf.read_be(59)?,
            disk_type: buf.read_be(60)?,
            checksum: buf.read_be(Self::CHECKSUM_OFFSET)?,
            unique_id: Uuid::from_bytes(unique_id),
            saved_state: buf.read_be(Self::SAVED_STATE_OFFSET)?,
        })
    }

    pub fn has_valid_cookie(buf: &[u8]) -> bool {
        buf.get(0..8) == Some(&Self::COOKIE[..])
    }

    pub fn is_fixed(&self) -> bool {
        self.disk_type == Self::DISK_TYPE_FIXED
    }
}

/// One's complement of the byte sum of `footer`, skipping the checksum field itself.
pub fn vhd_checksum(footer: &[u8]) -> u32 {
    let skip = VhdFooter::CHECKSUM_OFFSET..VhdFooter::CHECKSUM_OFFSET + 4;
    let sum = footer
        .iter()
        .enumerate()
        .filter(|(i, _)| !skip.contains(i))
        .fold(0u32, |sum, (_, &b)| sum.wrapping_add(b as u32));
    !sum
}
