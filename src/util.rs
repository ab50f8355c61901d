use std::io;

use crate::endian::SwapEndian;
use crate::handle::FileHandle;

/// Integers that can be built from their in-memory byte representation.
pub trait FromNativeBytes: SwapEndian {
    const SIZE: usize;

    /// Builds the value from the first `SIZE` bytes, or `None` if there are fewer.
    fn from_native(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_from_native_bytes {
    ($($ty:ty),*) => {
        $(
            impl FromNativeBytes for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn from_native(bytes: &[u8]) -> Option<Self> {
                    let raw: [u8; std::mem::size_of::<$ty>()] =
                        bytes.get(..Self::SIZE)?.try_into().ok()?;
                    Some(<$ty>::from_ne_bytes(raw))
                }
            }
        )*
    };
}

impl_from_native_bytes!(u8, u16, u32, u64);

pub trait BytesExt {
    /// Reads a big-endian integer at `offset`, or `None` if it would run past the end of the slice.
    fn read_be<T: FromNativeBytes>(&self, offset: usize) -> Option<T>;
}

impl BytesExt for [u8] {
    fn read_be<T: FromNativeBytes>(&self, offset: usize) -> Option<T> {
        let bytes = self.get(offset..offset.checked_add(T::SIZE)?)?;
        Some(T::from_native(bytes)?.be_to_host())
    }
}

pub trait HandleExt {
    /// Reads the last `len` bytes of the file.
    fn read_tail(&mut self, len: usize) -> io::Result<Vec<u8>>;
}

impl<F: FileHandle + ?Sized> HandleExt for F {
    fn read_tail(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let offset = i64::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "tail length too large"))?;
        self.seek_from_end(-offset)?;

        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            match self.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "short read at end of file",
                    ));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(buf)
    }
}
