use std::io;

use unix_path::Path;

use crate::footer::vhd_checksum;
use crate::handle::{FileHandle, OpenFlags, OpenTarget};

/// Builds a VHD footer with the given current size, geometry and disk type, cut to `len` bytes.
pub fn footer_with(current_size: u64, chs: (u16, u8, u8), disk_type: u32, len: usize) -> Vec<u8> {
    let mut footer = vec![0u8; 512];
    footer[0..8].copy_from_slice(b"conectix");
    footer[8..12].copy_from_slice(&0x0000_0002u32.to_be_bytes());
    footer[12..16].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    footer[16..24].copy_from_slice(&u64::MAX.to_be_bytes());
    footer[24..28].copy_from_slice(&0x27a6_a65du32.to_be_bytes());
    footer[28..32].copy_from_slice(b"qemu");
    footer[32..36].copy_from_slice(&0x0005_0003u32.to_be_bytes());
    footer[36..40].copy_from_slice(b"Wi2k");
    footer[40..48].copy_from_slice(&current_size.to_be_bytes());
    footer[48..56].copy_from_slice(&current_size.to_be_bytes());
    footer[56..58].copy_from_slice(&chs.0.to_be_bytes());
    footer[58] = chs.1;
    footer[59] = chs.2;
    footer[60..64].copy_from_slice(&disk_type.to_be_bytes());
    footer[68..84].copy_from_slice(&0x987b_b1cd_8414_41fc_a4ab_d069_452b_f223u128.to_be_bytes());

    let checksum = vhd_checksum(&footer);
    footer[64..68].copy_from_slice(&checksum.to_be_bytes());
    footer.truncate(len);
    footer
}

pub fn fixed_footer(current_size: u64, chs: (u16, u8, u8), len: usize) -> Vec<u8> {
    footer_with(current_size, chs, 2, len)
}

/// `payload` zero bytes followed by `footer`.
pub fn image_with_footer(payload: usize, footer: &[u8]) -> Vec<u8> {
    let mut image = vec![0u8; payload];
    image.extend_from_slice(footer);
    image
}

/// In-memory handle with knobs for simulating misbehaving storage.
pub struct MemFile {
    pub data: Vec<u8>,
    pub pos: usize,
    pub open: bool,
    pub regular: bool,
    /// Caps the bytes returned by a single `read` call.
    pub max_read: Option<usize>,
    /// Makes `open` fail while a file is already open, leaving that file open.
    pub reopen_fails: bool,
    pub opens: usize,
}

impl MemFile {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            open: true,
            regular: true,
            max_read: None,
            reopen_fails: false,
            opens: 0,
        }
    }
}

impl FileHandle for MemFile {
    type Dir = ();
    type Volume = ();

    fn open(&mut self, target: OpenTarget<'_, (), ()>, _flags: OpenFlags) -> io::Result<()> {
        self.opens += 1;
        if self.reopen_fails && self.open {
            return Err(io::Error::other("already open"));
        }
        match target {
            OpenTarget::Path(path) if path == Path::new("missing") => {
                self.open = false;
                Err(io::Error::from(io::ErrorKind::NotFound))
            }
            _ => {
                self.open = true;
                self.pos = 0;
                Ok(())
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        if !self.open {
            return Err(io::Error::other("not open"));
        }
        self.open = false;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.open {
            return Err(io::Error::other("not open"));
        }
        let remaining = &self.data[self.pos.min(self.data.len())..];
        let mut n = buf.len().min(remaining.len());
        if let Some(max) = self.max_read {
            n = n.min(max);
        }
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }

    fn seek_from_end(&mut self, offset: i64) -> io::Result<u64> {
        if !self.open {
            return Err(io::Error::other("not open"));
        }
        let pos = self
            .data
            .len()
            .checked_add_signed(offset as isize)
            .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))?;
        self.pos = pos;
        Ok(pos as u64)
    }

    fn raw_size(&self) -> u64 {
        if self.open { self.data.len() as u64 } else { 0 }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn is_regular_file(&self) -> bool {
        self.regular
    }
}
