// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Length-prefixed wrappers: `TPM2B_*` byte buffers, `TPM2B_*` wrapped
//! structures and `TPML_*` lists.

use crate::cursor::Reader;
use crate::cursor::Width;
use crate::cursor::Writer;
use crate::error::ErrorKind;
use crate::error::Result;
use crate::error::ResultExt;
use crate::marshal::Marshal;

/// Declares a `TPM2B_*` byte buffer: a 2-byte size followed by at most
/// `MAX` bytes.
///
/// ```
/// tpm20proto::tpm2b_buffer! {
///     /// `TPM2B_IV`
///     pub struct Iv[16];
/// }
///
/// assert!(Iv::new(&[0; 16]).is_ok());
/// assert!(Iv::new(&[0; 17]).is_err());
/// ```
#[macro_export]
macro_rules! tpm2b_buffer {
    ($(#[$a:meta])* $v:vis struct $name:ident[$max:expr];) => {
        #[derive(Clone, PartialEq, Eq, Default)]
        $(#[$a])*
        $v struct $name(Vec<u8>);

        impl $name {
            /// The largest number of bytes the buffer may hold.
            pub const MAX_SIZE: usize = $max;

            /// Copies `bytes` into a new buffer.
            pub fn new(bytes: &[u8]) -> $crate::Result<Self> {
                Self::check_size(bytes.len())?;
                Ok(Self(bytes.to_vec()))
            }

            fn check_size(size: usize) -> $crate::Result<()> {
                if size > Self::MAX_SIZE {
                    return Err($crate::Error::new($crate::ErrorKind::SizeTooLarge {
                        size,
                        max: Self::MAX_SIZE,
                    })
                    .typed::<Self>());
                }
                Ok(())
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn into_inner(self) -> Vec<u8> {
                self.0
            }
        }

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}(", stringify!($name))?;
                for b in &self.0 {
                    write!(f, "{:02x}", b)?;
                }
                write!(f, ")")
            }
        }

        impl $crate::Marshal for $name {
            fn encode(&self, w: &mut $crate::Writer) -> $crate::Result<()> {
                w.write_sized_bytes(&self.0)
                    .map_err($crate::Error::typed::<Self>)
            }

            fn decode(r: &mut $crate::Reader<'_>) -> $crate::Result<Self> {
                let bytes = r.read_sized_bytes().map_err($crate::Error::typed::<Self>)?;
                Self::check_size(bytes.len())?;
                Ok(Self(bytes.to_vec()))
            }
        }
    };
}

/// A `TPML_*` list: a 4-byte element count followed by at most `MAX`
/// elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpmList<T, const MAX: usize>(Vec<T>);

impl<T, const MAX: usize> Default for TpmList<T, MAX> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T, const MAX: usize> TpmList<T, MAX> {
    pub fn new(items: Vec<T>) -> Result<Self> {
        Self::check_count(items.len())?;
        Ok(Self(items))
    }

    fn check_count(count: usize) -> Result<()> {
        if count > MAX {
            return Err(ErrorKind::SizeTooLarge {
                size: count,
                max: MAX,
            }
            .into());
        }
        Ok(())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T: Marshal, const MAX: usize> Marshal for TpmList<T, MAX> {
    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.write_count(self.0.len(), Width::U32).typed::<Self>()?;
        for item in &self.0 {
            item.encode(w).typed::<Self>()?;
        }
        Ok(())
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let count = r.read_count(Width::U32).typed::<Self>()?;
        Self::check_count(count).typed::<Self>()?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::decode(r).typed::<Self>()?);
        }
        Ok(Self(items))
    }
}

impl<'a, T, const MAX: usize> IntoIterator for &'a TpmList<T, MAX> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A `TPM2B_*` wrapper around a structure: a 2-byte size followed by the
/// structure, which must fill exactly that many bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tpm2bStruct<T>(pub T);

impl<T> Tpm2bStruct<T> {
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Tpm2bStruct<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Marshal> Marshal for Tpm2bStruct<T> {
    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.write_sized(|w| self.0.encode(w)).typed::<Self>()
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        r.read_sized(T::decode).map(Self).typed::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    tpm2b_buffer! {
        struct Small[4];
    }

    crate::tpm_struct! {
        #[derive(Default)]
        struct Pair {
            a: u32,
            b: u32,
        }
    }

    #[test]
    fn buffer_wire_form() {
        let buf = Small::new(&[0xde, 0xad, 0xbe, 0xef]).unwrap();
        let bytes = buf.encode_to_bytes().unwrap();
        assert_eq!(bytes, [0x00, 0x04, 0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(Small::decode_from_bytes(&bytes).unwrap(), buf);
        assert_eq!(format!("{:?}", buf), "Small(deadbeef)");
    }

    #[test]
    fn buffer_max_size() {
        let err = Small::new(&[0; 5]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::SizeTooLarge { size: 5, max: 4 });

        let err = Small::decode_from_bytes(&[0, 5, 1, 2, 3, 4, 5]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::SizeTooLarge { size: 5, max: 4 });
    }

    #[test]
    fn list_count_prefix() {
        let list = TpmList::<u16, 4>::new(vec![1, 2]).unwrap();
        let bytes = list.encode_to_bytes().unwrap();
        assert_eq!(bytes, [0, 0, 0, 2, 0, 1, 0, 2]);
        let decoded = TpmList::<u16, 4>::decode_from_bytes(&bytes).unwrap();
        assert_eq!(decoded.as_slice(), &[1, 2]);
        assert!(TpmList::<u16, 4>::new(vec![0; 5]).is_err());
    }

    #[test]
    fn list_count_is_bounded_before_allocating() {
        let err = TpmList::<u16, 4>::decode_from_bytes(&[0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::SizeTooLarge { max: 4, .. }));
    }

    #[test]
    fn sized_struct() {
        let v = Tpm2bStruct(Pair { a: 1, b: 2 });
        let bytes = v.encode_to_bytes().unwrap();
        assert_eq!(bytes, [0, 8, 0, 0, 0, 1, 0, 0, 0, 2]);
        assert_eq!(Tpm2bStruct::<Pair>::decode_from_bytes(&bytes).unwrap(), v);
        assert_eq!(v.a, 1);
    }

    #[test]
    fn sized_struct_shorter_than_declared() {
        // Declares 10 bytes; the structure is exhausted after 8.
        let bytes = [0, 10, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0];
        let err: Error = Tpm2bStruct::<Pair>::decode_from_bytes(&bytes).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::SizedRegionMismatch {
                declared: 10,
                consumed: 8
            }
        );
    }

    #[test]
    fn sized_struct_longer_than_declared() {
        let bytes = [0, 6, 0, 0, 0, 1, 0, 0, 0, 2];
        let err = Tpm2bStruct::<Pair>::decode_from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::SizedRegionMismatch { declared: 6, .. }
        ));
    }
}
