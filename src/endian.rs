/// Byte order reversal for fixed-width integers.
pub trait SwapEndian: Copy {
    /// Returns the value with its bytes in reverse order. Single byte types are returned as is.
    fn swap_endian(self) -> Self;

    /// Converts a value loaded in native order from big-endian storage into host order.
    fn be_to_host(self) -> Self {
        if cfg!(target_endian = "little") {
            self.swap_endian()
        } else {
            self
        }
    }
}

macro_rules! impl_swap_endian {
    ($($ty:ty),*) => {
        $(
            impl SwapEndian for $ty {
                fn swap_endian(self) -> Self {
                    if std::mem::size_of::<$ty>() == 1 {
                        return self;
                    }
                    self.swap_bytes()
                }
            }
        )*
    };
}

impl_swap_endian!(u8, i8, u16, i16, u32, i32, u64, i64, u128);
