use positioned_io2::ReadAt;
use std::io;
use thiserror::Error;

pub use detect::{Chs, ContainerFormat, ContainerState, Detector, Probe};
pub use footer::VhdFooter;
pub use handle::{FileHandle, OpenFlags, OpenTarget};
pub use host::{HostDir, HostFile, HostVolume};

mod detect;
pub mod endian;
pub mod footer;
pub mod handle;
pub mod host;
mod util;

#[cfg(test)]
mod testutil;

#[derive(Error, Debug)]
pub enum OpenError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Unsupported {format} container (disk type {disk_type})")]
    UnsupportedContainer {
        format: ContainerFormat,
        disk_type: u32,
    },
}

pub type Result<T> = std::result::Result<T, OpenError>;

/// A file that reads like a flat disk image, whether or not it is wrapped in a container.
///
/// The container trailer is resolved when the file is opened. Until the next
/// [`open`](Self::open) or [`close`](Self::close), [`size`](Self::size) reports the
/// logical image size and [`chs`](Self::chs) the recorded geometry.
pub struct ContainerFile<F: FileHandle> {
    file: F,
    detector: Detector,
    state: ContainerState,
}

impl<F: FileHandle> ContainerFile<F> {
    /// Wraps an unopened handle.
    pub fn new(file: F) -> Self {
        Self::with_detector(file, Detector::default())
    }

    pub fn with_detector(file: F, detector: Detector) -> Self {
        Self {
            file,
            detector,
            state: ContainerState::default(),
        }
    }

    pub fn open(
        &mut self,
        target: OpenTarget<'_, F::Dir, F::Volume>,
        flags: OpenFlags,
    ) -> Result<()> {
        if let Err(e) = self.file.open(target, flags) {
            // The handle may still hold a previously opened file, don't report its container
            self.state = ContainerState::default();
            return Err(e.into());
        }
        self.validate()
    }

    pub fn close(&mut self) -> io::Result<()> {
        self.state = ContainerState::default();
        self.file.close()
    }

    /// Replaces the underlying handle and validates it as if it had just been opened.
    pub fn assign(&mut self, file: F) -> Result<()> {
        self.file = file;
        self.validate()
    }

    fn validate(&mut self) -> Result<()> {
        self.state = ContainerState::default();

        match self.detector.probe(&mut self.file) {
            Probe::NotContainer => {
                self.rewind();
                Ok(())
            }
            Probe::Supported(state) => {
                self.state = state;
                self.rewind();
                Ok(())
            }
            Probe::Unsupported { format, disk_type } => {
                // Keep the format around so callers can tell why the open failed
                self.state.format = format;
                if let Err(e) = self.file.close() {
                    tracing::warn!(%format, error = %e, "failed to close unsupported container");
                }
                Err(OpenError::UnsupportedContainer { format, disk_type })
            }
        }
    }

    /// Probing leaves the cursor at the end of the file, put it back at the start.
    fn rewind(&mut self) {
        if !self.file.is_open() {
            return;
        }
        let Ok(len) = i64::try_from(self.file.raw_size()) else {
            return;
        };
        if let Err(e) = self.file.seek_from_end(-len) {
            tracing::trace!(error = %e, "failed to rewind after probing");
        }
    }

    /// Logical image size for a recognised container, otherwise the raw file size.
    pub fn size(&self) -> u64 {
        if self.is_supported() {
            self.state.logical_size
        } else {
            self.file.raw_size()
        }
    }

    pub fn container_format(&self) -> ContainerFormat {
        self.state.format
    }

    pub fn container_name(&self) -> &'static str {
        self.state.format.name()
    }

    /// Disk geometry from the container metadata, if it recorded any.
    pub fn chs(&self) -> Option<Chs> {
        if !self.is_supported() || self.state.chs.is_zero() {
            return None;
        }
        Some(self.state.chs)
    }

    /// True when the file was identified as a container this crate can't serve and was closed.
    pub fn is_unsupported_container_type(&self) -> bool {
        !self.file.is_open() && self.state.format != ContainerFormat::None
    }

    pub fn state(&self) -> ContainerState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.file.is_open()
    }

    pub fn handle(&self) -> &F {
        &self.file
    }

    pub fn handle_mut(&mut self) -> &mut F {
        &mut self.file
    }

    pub fn into_inner(self) -> F {
        self.file
    }

    fn is_supported(&self) -> bool {
        self.state.format != ContainerFormat::None && self.file.is_open()
    }
}

impl<F: FileHandle> From<F> for ContainerFile<F> {
    /// Wraps an already open handle. A rejected container leaves the handle closed,
    /// see [`ContainerFile::is_unsupported_container_type`].
    fn from(file: F) -> Self {
        let mut container = Self::new(file);
        if let Err(e) = container.validate() {
            tracing::debug!(error = %e, "wrapped handle rejected");
        }
        container
    }
}

impl<F: FileHandle> io::Read for ContainerFile<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// Positional reads stop at [`ContainerFile::size`], so the trailer is never part of the image.
impl<F: FileHandle + ReadAt> ReadAt for ContainerFile<F> {
    fn read_at(&self, pos: u64, buf: &mut [u8]) -> io::Result<usize> {
        let size = self.size();
        if pos >= size {
            return Ok(0);
        }
        let len = std::cmp::min(buf.len() as u64, size - pos) as usize;
        self.file.read_at(pos, &mut buf[..len])
    }
}
