// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Open enumerations of TPM constants.

/// Declares an open enumeration: a `#[repr(transparent)]` wrapper around its
/// wire integer with associated constants for the known values.
///
/// Unlike a Rust `enum`, any wire value decodes successfully, so a TPM that
/// reports an algorithm or tag this crate does not know about is still
/// representable. Known values print by name in `Debug` output.
///
/// The generated type implements [`Marshal`](crate::Marshal), converts into
/// `u32` and into a [`UnionSelector`](crate::UnionSelector).
///
/// ```
/// tpm20proto::tpm_enum! {
///     /// `TPM_SE`
///     pub enum SessionType: u8 {
///         HMAC = 0x00,
///         POLICY = 0x01,
///         TRIAL = 0x03,
///     }
/// }
///
/// assert_eq!(format!("{:?}", SessionType::TRIAL), "TRIAL");
/// assert_eq!(format!("{:?}", SessionType(7)), "7");
/// ```
#[macro_export]
macro_rules! tpm_enum {
    (
        $(#[$a:meta])*
        $v:vis enum $name:ident : $storage:ty {
            $(
                $(#[$va:meta])*
                $variant:ident = $value:expr,
            )*
        }
    ) => {
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
        #[repr(transparent)]
        $(#[$a])*
        $v struct $name(pub $storage);

        impl $name {
            $(
                $(#[$va])*
                pub const $variant: $name = $name($value);
            )*

            /// The name of this value, if it is a known constant.
            pub fn name(&self) -> Option<&'static str> {
                #![allow(unreachable_patterns)]
                match *self {
                    $( Self::$variant => Some(stringify!($variant)), )*
                    _ => None,
                }
            }
        }

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, fmt: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match self.name() {
                    Some(s) => fmt.pad(s),
                    None => ::core::fmt::Debug::fmt(&self.0, fmt),
                }
            }
        }

        impl $crate::Marshal for $name {
            fn encode(&self, w: &mut $crate::Writer) -> $crate::Result<()> {
                $crate::Marshal::encode(&self.0, w)
            }

            fn decode(r: &mut $crate::Reader<'_>) -> $crate::Result<Self> {
                Ok(Self(<$storage as $crate::Marshal>::decode(r)?))
            }
        }

        impl From<$storage> for $name {
            fn from(v: $storage) -> Self {
                Self(v)
            }
        }

        impl From<$name> for u32 {
            fn from(v: $name) -> u32 {
                v.0.into()
            }
        }

        impl From<$name> for $crate::UnionSelector {
            fn from(v: $name) -> Self {
                $crate::UnionSelector::new(
                    v.0.into(),
                    <$storage as $crate::FixedWidth>::WIDTH,
                )
            }
        }
    };
}
