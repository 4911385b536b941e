// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! TPM unions: a payload whose layout is chosen by a selector decoded before
//! it.
//!
//! Each TPM union is a closed Rust enum implementing [`TpmUnion`]. The
//! selector is never stored alongside the payload; it is derived from the
//! variant when encoding. When the selector immediately precedes the payload
//! (`TPMT_*` types), [`encode_union`] and [`decode_union`] handle both. When
//! it is a sibling field further up the containing structure, the container
//! decodes the selector itself and passes it to
//! [`TpmUnion::decode_variant`].

use crate::cursor::Reader;
use crate::cursor::Width;
use crate::cursor::Writer;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::error::Result;
use crate::error::ResultExt;
use crate::marshal::Marshal;
use std::fmt;

/// A selector value together with its wire width.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct UnionSelector {
    value: u32,
    width: Width,
}

impl UnionSelector {
    pub const fn new(value: u32, width: Width) -> Self {
        Self { value, width }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn encode(&self, w: &mut Writer) -> Result<()> {
        w.write_uint(self.value.into(), self.width)
    }
}

impl fmt::Debug for UnionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#0width$x}", self.value, width = 2 + 2 * self.width.bytes())
    }
}

/// A TPM union represented as a closed enum.
pub trait TpmUnion: Sized {
    /// The TPM name of the union, such as `TPMU_SIGNATURE`.
    const NAME: &'static str;

    /// The type of the selector that picks the variant.
    type Selector: Marshal + Copy + Into<UnionSelector>;

    /// The selector for this variant.
    fn selector(&self) -> Self::Selector;

    /// Writes the variant's payload, without the selector.
    fn encode_variant(&self, w: &mut Writer) -> Result<()>;

    /// Reads the payload of the variant chosen by `selector`.
    fn decode_variant(selector: Self::Selector, r: &mut Reader<'_>) -> Result<Self>;
}

/// Writes the selector of `value` followed by its payload.
pub fn encode_union<U: TpmUnion>(value: &U, w: &mut Writer) -> Result<()> {
    value.selector().encode(w).typed::<U>()?;
    value.encode_variant(w).typed::<U>()
}

/// Reads a selector and then the payload it chooses.
pub fn decode_union<U: TpmUnion>(r: &mut Reader<'_>) -> Result<U> {
    let selector = U::Selector::decode(r).typed::<U>()?;
    U::decode_variant(selector, r).typed::<U>()
}

/// The error for a selector with no variant in `U`.
pub fn unknown_selector<U: TpmUnion>(selector: U::Selector) -> Error {
    let selector: UnionSelector = selector.into();
    tracing::debug!(union = U::NAME, ?selector, "unknown union selector");
    Error::new(ErrorKind::UnknownUnionSelector {
        union: U::NAME,
        selector: selector.value(),
    })
}

crate::tpm_struct! {
    /// `TPMS_EMPTY`, the payload of variants that carry no data.
    #[derive(Copy, Default)]
    pub struct TpmsEmpty {}
}

/// Declares a TPM union as a closed enum with one payload per selector value
/// and implements [`TpmUnion`] for it.
///
/// Prefix the declaration with `tagged` when the selector immediately
/// precedes the payload on the wire; the generated type then also implements
/// [`Marshal`] as selector followed by payload.
///
/// ```
/// use tpm20proto::types::AlgId;
/// use tpm20proto::types::TpmsSchemeHash;
/// use tpm20proto::TpmsEmpty;
///
/// tpm20proto::tpm_union! {
///     /// `TPMT_KEYEDHASH_SCHEME` restricted to HMAC.
///     pub tagged enum HmacOnly: "TPMU_SCHEME_KEYEDHASH" (AlgId) {
///         Hmac(TpmsSchemeHash) = AlgId::HMAC,
///         Null(TpmsEmpty) = AlgId::NULL,
///     }
/// }
/// ```
#[macro_export]
macro_rules! tpm_union {
    (
        $(#[$a:meta])*
        $v:vis tagged enum $name:ident : $union:literal ($selector:ty) {
            $($body:tt)*
        }
    ) => {
        $crate::tpm_union! {
            $(#[$a])*
            $v enum $name : $union ($selector) {
                $($body)*
            }
        }

        $crate::impl_tagged_marshal!($name);
    };
    (
        $(#[$a:meta])*
        $v:vis enum $name:ident : $union:literal ($selector:ty) {
            $(
                $(#[$va:meta])*
                $variant:ident($payload:ty) = $sel:path,
            )*
        }
    ) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        $(#[$a])*
        $v enum $name {
            $(
                $(#[$va])*
                $variant($payload),
            )*
        }

        impl $crate::TpmUnion for $name {
            const NAME: &'static str = $union;
            type Selector = $selector;

            fn selector(&self) -> $selector {
                match self {
                    $( Self::$variant(_) => $sel, )*
                }
            }

            fn encode_variant(&self, w: &mut $crate::Writer) -> $crate::Result<()> {
                match self {
                    $( Self::$variant(v) => $crate::Marshal::encode(v, w), )*
                }
            }

            fn decode_variant(
                selector: $selector,
                r: &mut $crate::Reader<'_>,
            ) -> $crate::Result<Self> {
                #![allow(unreachable_patterns)]
                match selector {
                    $( $sel => Ok(Self::$variant(<$payload as $crate::Marshal>::decode(r)?)), )*
                    _ => Err($crate::union::unknown_selector::<Self>(selector)),
                }
            }
        }
    };
}

/// Implements [`Marshal`] for a [`TpmUnion`] whose selector immediately
/// precedes its payload.
#[macro_export]
macro_rules! impl_tagged_marshal {
    ($name:ty) => {
        impl $crate::Marshal for $name {
            fn encode(&self, w: &mut $crate::Writer) -> $crate::Result<()> {
                $crate::union::encode_union(self, w)
            }

            fn decode(r: &mut $crate::Reader<'_>) -> $crate::Result<Self> {
                $crate::union::decode_union(r)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AlgId;

    crate::tpm_struct! {
        struct Point {
            x: u16,
            y: u16,
        }
    }

    crate::tpm_union! {
        tagged enum Shape: "TPMU_SHAPE" (AlgId) {
            Point(Point) = AlgId::RSASSA,
            Count(u32) = AlgId::SHA256,
            Nothing(TpmsEmpty) = AlgId::NULL,
        }
    }

    #[test]
    fn selector_precedes_payload() {
        let shape = Shape::Point(Point { x: 1, y: 2 });
        let bytes = shape.encode_to_bytes().unwrap();
        assert_eq!(bytes, [0x00, 0x14, 0x00, 0x01, 0x00, 0x02]);
        assert_eq!(Shape::decode_from_bytes(&bytes).unwrap(), shape);
    }

    #[test]
    fn empty_variant() {
        let bytes = Shape::Nothing(TpmsEmpty {}).encode_to_bytes().unwrap();
        assert_eq!(bytes, [0x00, 0x10]);
        assert!(matches!(
            Shape::decode_from_bytes(&bytes).unwrap(),
            Shape::Nothing(_)
        ));
    }

    #[test]
    fn selector_fidelity() {
        for shape in [
            Shape::Point(Point { x: 3, y: 4 }),
            Shape::Count(7),
            Shape::Nothing(TpmsEmpty {}),
        ] {
            let bytes = shape.encode_to_bytes().unwrap();
            let decoded = Shape::decode_from_bytes(&bytes).unwrap();
            assert_eq!(decoded.selector(), shape.selector());
            assert_eq!(decoded, shape);
        }
    }

    #[test]
    fn unknown_selector_is_an_error() {
        let err = Shape::decode_from_bytes(&[0x00, 0x99, 0, 0]).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::UnknownUnionSelector {
                union: "TPMU_SHAPE",
                selector: 0x99
            }
        );
    }

    #[test]
    fn selector_debug_is_padded_hex() {
        let sel = UnionSelector::new(0x14, Width::U16);
        assert_eq!(format!("{:?}", sel), "0x0014");
    }
}
