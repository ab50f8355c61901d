//! [`FileHandle`] over the host operating system's filesystem.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path as StdPath, PathBuf};

use positioned_io2::ReadAt;
use unix_path::Path;

use crate::handle::{FileHandle, OpenFlags, OpenTarget};

/// A directory on the host, used to open files by name or by index.
#[derive(Debug, Clone)]
pub struct HostDir {
    path: PathBuf,
}

impl HostDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Entries are ordered by file name so indices stay stable between calls.
    fn entry(&self, index: u32) -> io::Result<PathBuf> {
        let mut entries = std::fs::read_dir(&self.path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        entries.into_iter().nth(index as usize).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no entry {index} in {}", self.path.display()),
            )
        })
    }
}

/// A mount point on the host. Absolute handle paths resolve under `root`.
#[derive(Debug, Clone)]
pub struct HostVolume {
    root: PathBuf,
}

impl HostVolume {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn host_path(base: Option<&StdPath>, path: &Path) -> io::Result<PathBuf> {
    let s = path.to_str().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path is not valid UTF-8")
    })?;
    Ok(match base {
        Some(base) => base.join(s.trim_start_matches('/')),
        None => PathBuf::from(s),
    })
}

#[derive(Debug, Default)]
pub struct HostFile {
    file: Option<File>,
    is_file: bool,
}

impl HostFile {
    pub fn new() -> Self {
        Self::default()
    }

    fn file(&self) -> io::Result<&File> {
        self.file.as_ref().ok_or_else(not_open)
    }

    fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file.as_mut().ok_or_else(not_open)
    }
}

impl From<File> for HostFile {
    fn from(file: File) -> Self {
        let is_file = file.metadata().map(|m| m.is_file()).unwrap_or(false);
        Self {
            file: Some(file),
            is_file,
        }
    }
}

fn not_open() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "file is not open")
}

impl FileHandle for HostFile {
    type Dir = HostDir;
    type Volume = HostVolume;

    fn open(
        &mut self,
        target: OpenTarget<'_, HostDir, HostVolume>,
        flags: OpenFlags,
    ) -> io::Result<()> {
        self.file = None;
        self.is_file = false;

        let path = match target {
            OpenTarget::Path(path) => host_path(None, path)?,
            OpenTarget::InDir(dir, path) => host_path(Some(dir.path.as_path()), path)?,
            OpenTarget::DirIndex(dir, index) => dir.entry(index)?,
            OpenTarget::InVolume(vol, path) => host_path(Some(vol.root.as_path()), path)?,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(flags.write)
            .create(flags.write && flags.create)
            .open(&path)?;
        *self = Self::from(file);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.is_file = false;
        match self.file.take() {
            Some(_) => Ok(()),
            None => Err(not_open()),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file_mut()?.read(buf)
    }

    fn seek_from_end(&mut self, offset: i64) -> io::Result<u64> {
        self.file_mut()?.seek(SeekFrom::End(offset))
    }

    fn raw_size(&self) -> u64 {
        self.file()
            .and_then(|f| f.metadata())
            .map(|m| m.len())
            .unwrap_or(0)
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn is_regular_file(&self) -> bool {
        self.file.is_some() && self.is_file
    }
}

impl ReadAt for HostFile {
    fn read_at(&self, pos: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.file()?.read_at(pos, buf)
    }
}
