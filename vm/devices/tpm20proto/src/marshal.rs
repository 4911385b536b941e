// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The [`Marshal`] trait and its implementations for wire primitives.

use crate::cursor::Reader;
use crate::cursor::Writer;
use crate::error::ErrorKind;
use crate::error::Result;

/// A type with a TPM wire encoding.
///
/// Fields are encoded in declaration order. A union's selector is always
/// derived from the value being encoded, and always decoded before the union
/// payload.
pub trait Marshal: Sized {
    /// Appends the wire encoding of `self`.
    fn encode(&self, w: &mut Writer) -> Result<()>;

    /// Reads a value from the current position of `r`.
    fn decode(r: &mut Reader<'_>) -> Result<Self>;

    /// Encodes `self` into a new buffer.
    fn encode_to_bytes(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        self.encode(&mut w)?;
        Ok(w.into_bytes())
    }

    /// Decodes a value that must span all of `bytes`.
    fn decode_from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let value = Self::decode(&mut r)?;
        if let Err(err) = r.finish() {
            tracing::debug!(
                ty = std::any::type_name::<Self>(),
                position = r.position(),
                len = bytes.len(),
                "unconsumed input after decode"
            );
            return Err(err.typed::<Self>());
        }
        Ok(value)
    }
}

macro_rules! marshal_uint {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            impl Marshal for $ty {
                fn encode(&self, w: &mut Writer) -> Result<()> {
                    w.$write(*self);
                    Ok(())
                }

                fn decode(r: &mut Reader<'_>) -> Result<Self> {
                    r.$read()
                }
            }
        )*
    };
}

marshal_uint! {
    u8 => write_u8, read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
}

// Signed fields are two's complement in the unsigned wire slot.
macro_rules! marshal_int {
    ($($ty:ty => $uty:ty;)*) => {
        $(
            impl Marshal for $ty {
                fn encode(&self, w: &mut Writer) -> Result<()> {
                    (*self as $uty).encode(w)
                }

                fn decode(r: &mut Reader<'_>) -> Result<Self> {
                    Ok(<$uty>::decode(r)? as $ty)
                }
            }
        )*
    };
}

marshal_int! {
    i8 => u8;
    i16 => u16;
    i32 => u32;
    i64 => u64;
}

/// `TPMI_YES_NO`
impl Marshal for bool {
    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.write_u8((*self).into());
        Ok(())
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        match r.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(ErrorKind::InvalidValue {
                what: "TPMI_YES_NO",
                value: v.into(),
            }
            .into()),
        }
    }
}

/// Fixed-length byte arrays, written with no length prefix.
impl<const N: usize> Marshal for [u8; N] {
    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.write_bytes(self);
        Ok(())
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let mut v = [0; N];
        v.copy_from_slice(r.read_bytes(N)?);
        Ok(v)
    }
}

/// Declares a structure from its field list and implements [`Marshal`] for
/// it. Fields are encoded in the order they are listed.
///
/// The generated type derives `Debug`, `Clone`, `PartialEq` and `Eq`; add
/// further derives with ordinary attributes.
///
/// ```
/// tpm20proto::tpm_struct! {
///     /// `TPMS_CLOCK_INFO`
///     #[derive(Default)]
///     pub struct ClockInfo {
///         pub clock: u64,
///         pub reset_count: u32,
///         pub restart_count: u32,
///         pub safe: bool,
///     }
/// }
/// ```
#[macro_export]
macro_rules! tpm_struct {
    (
        $(#[$a:meta])*
        $v:vis struct $name:ident {
            $(
                $(#[$fa:meta])*
                $fv:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        $(#[$a])*
        $v struct $name {
            $(
                $(#[$fa])*
                $fv $field: $ty,
            )*
        }

        impl $crate::Marshal for $name {
            fn encode(&self, w: &mut $crate::Writer) -> $crate::Result<()> {
                $(
                    $crate::Marshal::encode(&self.$field, w)
                        .map_err($crate::Error::typed::<Self>)?;
                )*
                let _ = w;
                Ok(())
            }

            fn decode(r: &mut $crate::Reader<'_>) -> $crate::Result<Self> {
                $(
                    let $field = <$ty as $crate::Marshal>::decode(r)
                        .map_err($crate::Error::typed::<Self>)?;
                )*
                let _ = r;
                Ok(Self { $($field,)* })
            }
        }
    };
}
