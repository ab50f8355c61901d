//! The byte-addressable file capability a [`ContainerFile`](crate::ContainerFile) is built on.

use std::io;

use unix_path::Path;

/// Where to open a file from.
///
/// `Dir` and `Volume` are whatever the handle implementation uses to address
/// directories and mounted volumes.
pub enum OpenTarget<'a, D: ?Sized, V: ?Sized> {
    /// A path relative to the implementation's current working location.
    Path(&'a Path),
    /// A path relative to an open directory.
    InDir(&'a D, &'a Path),
    /// The `n`th entry of an open directory.
    DirIndex(&'a D, u32),
    /// A path on a specific volume.
    InVolume(&'a V, &'a Path),
}

impl<D: ?Sized, V: ?Sized> Clone for OpenTarget<'_, D, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: ?Sized, V: ?Sized> Copy for OpenTarget<'_, D, V> {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    pub write: bool,
    pub create: bool,
}

impl OpenFlags {
    pub const READ_ONLY: Self = Self {
        write: false,
        create: false,
    };
}

/// An open-able, readable file that can seek relative to its end.
pub trait FileHandle {
    type Dir: ?Sized;
    type Volume: ?Sized;

    /// Opens `target`. A failed open may leave a previously opened file open.
    fn open(
        &mut self,
        target: OpenTarget<'_, Self::Dir, Self::Volume>,
        flags: OpenFlags,
    ) -> io::Result<()>;

    fn close(&mut self) -> io::Result<()>;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Moves the cursor to `offset` bytes from the end of the file and returns the new position.
    fn seek_from_end(&mut self, offset: i64) -> io::Result<u64>;

    /// Length of the file on disk, 0 when closed.
    fn raw_size(&self) -> u64;

    fn is_open(&self) -> bool;

    fn is_regular_file(&self) -> bool;
}
