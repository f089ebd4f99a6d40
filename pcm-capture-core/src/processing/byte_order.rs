//! Integer ↔ byte conversion in a chosen byte order.
//!
//! Scalar decoding accepts fewer bytes than the word width and zero-extends
//! the missing high-order bytes; more bytes than the width is an error.
//! Batch decoding requires an exact multiple of the width.

use crate::models::error::CodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the host.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    pub const fn from_big_endian(big_endian: bool) -> Self {
        if big_endian {
            Self::Big
        } else {
            Self::Little
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
}

/// A fixed-width integer the codec can convert.
pub trait Word: Copy + sealed::Sealed {
    const WIDTH: usize;

    fn write_to(self, order: ByteOrder, out: &mut Vec<u8>);

    /// Decodes at most `WIDTH` bytes. Callers check the length.
    fn read_from(bytes: &[u8], order: ByteOrder) -> Self;
}

macro_rules! impl_word {
    ($($t:ty),*) => {$(
        impl Word for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            fn write_to(self, order: ByteOrder, out: &mut Vec<u8>) {
                match order {
                    ByteOrder::Little => out.extend_from_slice(&self.to_le_bytes()),
                    ByteOrder::Big => out.extend_from_slice(&self.to_be_bytes()),
                }
            }

            fn read_from(bytes: &[u8], order: ByteOrder) -> Self {
                let mut acc: $t = 0;
                match order {
                    ByteOrder::Big => {
                        for &b in bytes {
                            acc = (acc << 8) | b as $t;
                        }
                    }
                    ByteOrder::Little => {
                        for &b in bytes.iter().rev() {
                            acc = (acc << 8) | b as $t;
                        }
                    }
                }
                acc
            }
        }
    )*};
}

impl_word!(i16, i32, i64);

pub fn to_bytes<W: Word>(value: W, order: ByteOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(W::WIDTH);
    value.write_to(order, &mut out);
    out
}

pub fn from_bytes<W: Word>(bytes: &[u8], order: ByteOrder) -> Result<W, CodecError> {
    if bytes.len() > W::WIDTH {
        return Err(CodecError::InvalidLength {
            len: bytes.len(),
            width: W::WIDTH,
        });
    }
    Ok(W::read_from(bytes, order))
}

pub fn to_native_bytes<W: Word>(value: W) -> Vec<u8> {
    to_bytes(value, ByteOrder::native())
}

pub fn from_native_bytes<W: Word>(bytes: &[u8]) -> Result<W, CodecError> {
    from_bytes(bytes, ByteOrder::native())
}

pub fn samples_to_bytes<W: Word>(samples: &[W], order: ByteOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * W::WIDTH);
    for &sample in samples {
        sample.write_to(order, &mut out);
    }
    out
}

pub fn bytes_to_samples<W: Word>(bytes: &[u8], order: ByteOrder) -> Result<Vec<W>, CodecError> {
    if bytes.len() % W::WIDTH != 0 {
        return Err(CodecError::InvalidLength {
            len: bytes.len(),
            width: W::WIDTH,
        });
    }
    Ok(bytes
        .chunks_exact(W::WIDTH)
        .map(|chunk| W::read_from(chunk, order))
        .collect())
}
