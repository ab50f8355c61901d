use std::fmt;

use crate::footer::{VhdFooter, vhd_checksum};
use crate::handle::FileHandle;
use crate::util::HandleExt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// Plain flat image.
    #[default]
    None,
    Vhd,
}

impl ContainerFormat {
    pub const ALL: &'static [ContainerFormat] = &[ContainerFormat::Vhd];

    pub fn name(self) -> &'static str {
        match self {
            ContainerFormat::None => "none",
            ContainerFormat::Vhd => "vhd",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cylinder/head/sector disk geometry. All zero means no geometry was recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chs {
    pub cylinders: u16,
    pub heads: u8,
    pub sectors: u8,
}

impl Chs {
    pub fn is_zero(&self) -> bool {
        *self == Chs::default()
    }
}

/// What is known about the container wrapping an open file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerState {
    pub format: ContainerFormat,
    pub chs: Chs,
    pub logical_size: u64,
}

/// Result of probing a file for a container trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    NotContainer,
    Supported(ContainerState),
    /// A valid trailer of a variant this crate can't serve, e.g. a dynamic VHD.
    Unsupported {
        format: ContainerFormat,
        disk_type: u32,
    },
}

impl Probe {
    pub fn state(&self) -> Option<ContainerState> {
        match self {
            Probe::Supported(state) => Some(*state),
            _ => None,
        }
    }
}

/// Outcome of validating a single trailer candidate.
enum Validation {
    Mismatch,
    Unsupported { disk_type: u32 },
    Supported { chs: Chs, logical_size: u64 },
}

/// A container format recognised by a fixed-size record at the end of the file.
struct TrailerProbe {
    format: ContainerFormat,
    /// Candidate trailer lengths, tried in order.
    lengths: &'static [usize],
    validate: fn(&[u8], u64) -> Validation,
}

const TRAILER_PROBES: &[TrailerProbe] = &[TrailerProbe {
    format: ContainerFormat::Vhd,
    lengths: &[VhdFooter::LEN, VhdFooter::LEN_LEGACY],
    validate: validate_vhd,
}];

fn validate_vhd(buf: &[u8], raw_size: u64) -> Validation {
    if !VhdFooter::has_valid_cookie(buf) {
        return Validation::Mismatch;
    }
    let Some(footer) = VhdFooter::decode(buf) else {
        return Validation::Mismatch;
    };

    let checksum = vhd_checksum(buf);
    if checksum != footer.checksum {
        tracing::debug!(
            expected = footer.checksum,
            actual = checksum,
            "vhd footer checksum mismatch"
        );
        return Validation::Mismatch;
    }

    if !footer.is_fixed() {
        return Validation::Unsupported {
            disk_type: footer.disk_type,
        };
    }

    // The payload and the footer should agree, take whichever is smaller
    let payload = raw_size.saturating_sub(buf.len() as u64);
    Validation::Supported {
        chs: Chs {
            cylinders: footer.cylinders,
            heads: footer.heads,
            sectors: footer.sectors_per_track,
        },
        logical_size: footer.current_size.min(payload),
    }
}

/// Recognises container trailers on open files.
#[derive(Debug, Clone)]
pub struct Detector {
    formats: Vec<ContainerFormat>,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(ContainerFormat::ALL.iter().copied())
    }
}

impl Detector {
    /// Creates a detector that only probes for `formats`, in the given order.
    pub fn new(formats: impl IntoIterator<Item = ContainerFormat>) -> Self {
        Self {
            formats: formats
                .into_iter()
                .filter(|f| *f != ContainerFormat::None)
                .collect(),
        }
    }

    pub fn formats(&self) -> &[ContainerFormat] {
        &self.formats
    }

    /// Looks for a known container trailer at the end of `handle`.
    ///
    /// I/O errors and checksum mismatches are not reported; the candidate is skipped
    /// and the file is treated as a plain image if nothing else matches.
    pub fn probe<F: FileHandle + ?Sized>(&self, handle: &mut F) -> Probe {
        if !handle.is_open() || !handle.is_regular_file() {
            return Probe::NotContainer;
        }

        let raw_size = handle.raw_size();
        for &format in &self.formats {
            let Some(probe) = TRAILER_PROBES.iter().find(|p| p.format == format) else {
                continue;
            };

            for &len in probe.lengths {
                let buf = match handle.read_tail(len) {
                    Ok(buf) => buf,
                    Err(e) => {
                        tracing::trace!(%format, len, error = %e, "trailer unreadable");
                        continue;
                    }
                };

                match (probe.validate)(&buf, raw_size) {
                    Validation::Mismatch => continue,
                    Validation::Unsupported { disk_type } => {
                        tracing::warn!(%format, disk_type, "unsupported container variant");
                        return Probe::Unsupported { format, disk_type };
                    }
                    Validation::Supported { chs, logical_size } => {
                        tracing::debug!(
                            %format,
                            len,
                            logical_size,
                            cylinders = chs.cylinders,
                            heads = chs.heads,
                            sectors = chs.sectors,
                            "container detected"
                        );
                        return Probe::Supported(ContainerState {
                            format,
                            chs,
                            logical_size,
                        });
                    }
                }
            }
        }

        Probe::NotContainer
    }
}
