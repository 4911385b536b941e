// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Signing, asymmetric, KDF and symmetric scheme selections.
//!
//! Most TPM schemes share the `TPMS_SCHEME_HASH` layout and differ only in
//! their algorithm ID. Each `TPMT_*_SCHEME` here is an enum with one variant
//! for all of those, carrying a small closed enum for the algorithm, plus a
//! variant for each scheme with its own layout.

use super::AlgId;
use crate::cursor::Reader;
use crate::cursor::Writer;
use crate::error::Result;
use crate::impl_tagged_marshal;
use crate::marshal::Marshal;
use crate::tpm_struct;
use crate::tpm_union;
use crate::union::unknown_selector;
use crate::union::TpmUnion;
use crate::union::TpmsEmpty;

/// Declares a closed set of algorithms that select the same layout.
macro_rules! scheme_kind {
    (
        $(#[$a:meta])*
        $v:vis enum $name:ident {
            $($variant:ident = $alg:path,)*
        }
    ) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        $(#[$a])*
        $v enum $name {
            $($variant,)*
        }

        impl $name {
            /// The algorithm ID this scheme is selected by.
            pub fn alg(self) -> $crate::types::AlgId {
                match self {
                    $(Self::$variant => $alg,)*
                }
            }

            pub fn from_alg(alg: $crate::types::AlgId) -> Option<Self> {
                match alg {
                    $($alg => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

pub(crate) use scheme_kind;

tpm_struct! {
    /// `TPMS_SCHEME_HASH`
    #[derive(Copy, Default)]
    pub struct TpmsSchemeHash {
        pub hash_alg: AlgId,
    }
}

tpm_struct! {
    /// `TPMS_SCHEME_ECDAA`
    #[derive(Copy, Default)]
    pub struct TpmsSchemeEcdaa {
        pub hash_alg: AlgId,
        pub count: u16,
    }
}

tpm_struct! {
    /// `TPMS_SCHEME_XOR`
    #[derive(Copy, Default)]
    pub struct TpmsSchemeXor {
        pub hash_alg: AlgId,
        pub kdf: AlgId,
    }
}

impl TpmsSchemeHash {
    pub fn new(hash_alg: AlgId) -> Self {
        Self { hash_alg }
    }
}

scheme_kind! {
    /// Signing schemes with a `TPMS_SCHEME_HASH` body.
    pub enum SigSchemeKind {
        RsaSsa = AlgId::RSASSA,
        RsaPss = AlgId::RSAPSS,
        Ecdsa = AlgId::ECDSA,
        Sm2 = AlgId::SM2,
        EcSchnorr = AlgId::ECSCHNORR,
        Hmac = AlgId::HMAC,
    }
}

/// `TPMT_SIG_SCHEME`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TpmtSigScheme {
    Hash(SigSchemeKind, TpmsSchemeHash),
    Ecdaa(TpmsSchemeEcdaa),
    #[default]
    Null,
}

impl TpmUnion for TpmtSigScheme {
    const NAME: &'static str = "TPMU_SIG_SCHEME";
    type Selector = AlgId;

    fn selector(&self) -> AlgId {
        match self {
            Self::Hash(kind, _) => kind.alg(),
            Self::Ecdaa(_) => AlgId::ECDAA,
            Self::Null => AlgId::NULL,
        }
    }

    fn encode_variant(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Hash(_, scheme) => scheme.encode(w),
            Self::Ecdaa(scheme) => scheme.encode(w),
            Self::Null => Ok(()),
        }
    }

    fn decode_variant(selector: AlgId, r: &mut Reader<'_>) -> Result<Self> {
        if let Some(kind) = SigSchemeKind::from_alg(selector) {
            return Ok(Self::Hash(kind, TpmsSchemeHash::decode(r)?));
        }
        match selector {
            AlgId::ECDAA => Ok(Self::Ecdaa(TpmsSchemeEcdaa::decode(r)?)),
            AlgId::NULL => Ok(Self::Null),
            _ => Err(unknown_selector::<Self>(selector)),
        }
    }
}

impl_tagged_marshal!(TpmtSigScheme);

scheme_kind! {
    /// RSA schemes with a `TPMS_SCHEME_HASH` body.
    pub enum RsaSchemeKind {
        RsaSsa = AlgId::RSASSA,
        RsaPss = AlgId::RSAPSS,
        Oaep = AlgId::OAEP,
    }
}

/// `TPMT_RSA_SCHEME`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TpmtRsaScheme {
    Hash(RsaSchemeKind, TpmsSchemeHash),
    Rsaes,
    #[default]
    Null,
}

impl TpmUnion for TpmtRsaScheme {
    const NAME: &'static str = "TPMU_ASYM_SCHEME";
    type Selector = AlgId;

    fn selector(&self) -> AlgId {
        match self {
            Self::Hash(kind, _) => kind.alg(),
            Self::Rsaes => AlgId::RSAES,
            Self::Null => AlgId::NULL,
        }
    }

    fn encode_variant(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Hash(_, scheme) => scheme.encode(w),
            Self::Rsaes | Self::Null => Ok(()),
        }
    }

    fn decode_variant(selector: AlgId, r: &mut Reader<'_>) -> Result<Self> {
        if let Some(kind) = RsaSchemeKind::from_alg(selector) {
            return Ok(Self::Hash(kind, TpmsSchemeHash::decode(r)?));
        }
        match selector {
            AlgId::RSAES => Ok(Self::Rsaes),
            AlgId::NULL => Ok(Self::Null),
            _ => Err(unknown_selector::<Self>(selector)),
        }
    }
}

impl_tagged_marshal!(TpmtRsaScheme);

scheme_kind! {
    /// ECC schemes with a `TPMS_SCHEME_HASH` body.
    pub enum EccSchemeKind {
        Ecdsa = AlgId::ECDSA,
        Ecdh = AlgId::ECDH,
        Sm2 = AlgId::SM2,
        EcSchnorr = AlgId::ECSCHNORR,
        Ecmqv = AlgId::ECMQV,
    }
}

/// `TPMT_ECC_SCHEME`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TpmtEccScheme {
    Hash(EccSchemeKind, TpmsSchemeHash),
    Ecdaa(TpmsSchemeEcdaa),
    #[default]
    Null,
}

impl TpmUnion for TpmtEccScheme {
    const NAME: &'static str = "TPMU_ASYM_SCHEME";
    type Selector = AlgId;

    fn selector(&self) -> AlgId {
        match self {
            Self::Hash(kind, _) => kind.alg(),
            Self::Ecdaa(_) => AlgId::ECDAA,
            Self::Null => AlgId::NULL,
        }
    }

    fn encode_variant(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Hash(_, scheme) => scheme.encode(w),
            Self::Ecdaa(scheme) => scheme.encode(w),
            Self::Null => Ok(()),
        }
    }

    fn decode_variant(selector: AlgId, r: &mut Reader<'_>) -> Result<Self> {
        if let Some(kind) = EccSchemeKind::from_alg(selector) {
            return Ok(Self::Hash(kind, TpmsSchemeHash::decode(r)?));
        }
        match selector {
            AlgId::ECDAA => Ok(Self::Ecdaa(TpmsSchemeEcdaa::decode(r)?)),
            AlgId::NULL => Ok(Self::Null),
            _ => Err(unknown_selector::<Self>(selector)),
        }
    }
}

impl_tagged_marshal!(TpmtEccScheme);

scheme_kind! {
    /// Key derivation functions, all with a `TPMS_SCHEME_HASH` body.
    pub enum KdfKind {
        Mgf1 = AlgId::MGF1,
        Kdf1Sp800_56a = AlgId::KDF1_SP800_56A,
        Kdf2 = AlgId::KDF2,
        Kdf1Sp800_108 = AlgId::KDF1_SP800_108,
    }
}

/// `TPMT_KDF_SCHEME`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TpmtKdfScheme {
    Hash(KdfKind, TpmsSchemeHash),
    #[default]
    Null,
}

impl TpmUnion for TpmtKdfScheme {
    const NAME: &'static str = "TPMU_KDF_SCHEME";
    type Selector = AlgId;

    fn selector(&self) -> AlgId {
        match self {
            Self::Hash(kind, _) => kind.alg(),
            Self::Null => AlgId::NULL,
        }
    }

    fn encode_variant(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Hash(_, scheme) => scheme.encode(w),
            Self::Null => Ok(()),
        }
    }

    fn decode_variant(selector: AlgId, r: &mut Reader<'_>) -> Result<Self> {
        match (KdfKind::from_alg(selector), selector) {
            (Some(kind), _) => Ok(Self::Hash(kind, TpmsSchemeHash::decode(r)?)),
            (None, AlgId::NULL) => Ok(Self::Null),
            (None, _) => Err(unknown_selector::<Self>(selector)),
        }
    }
}

impl_tagged_marshal!(TpmtKdfScheme);

tpm_union! {
    /// `TPMT_KEYEDHASH_SCHEME`
    pub tagged enum TpmtKeyedHashScheme: "TPMU_SCHEME_KEYEDHASH" (AlgId) {
        Hmac(TpmsSchemeHash) = AlgId::HMAC,
        Xor(TpmsSchemeXor) = AlgId::XOR,
        Null(TpmsEmpty) = AlgId::NULL,
    }
}

impl Default for TpmtKeyedHashScheme {
    fn default() -> Self {
        Self::Null(TpmsEmpty {})
    }
}

scheme_kind! {
    /// Block ciphers usable for storage keys.
    pub enum SymCipherKind {
        Aes = AlgId::AES,
        Sm4 = AlgId::SM4,
        Camellia = AlgId::CAMELLIA,
    }
}

/// `TPMT_SYM_DEF_OBJECT`
///
/// `keyBits` and `mode` are both unions selected by the algorithm; for the
/// block ciphers they are a bit count and a `TPM_ALG_ID`, and for
/// `TPM_ALG_NULL` they are absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TpmtSymDefObject {
    Cipher {
        algorithm: SymCipherKind,
        key_bits: u16,
        mode: AlgId,
    },
    #[default]
    Null,
}

impl TpmUnion for TpmtSymDefObject {
    const NAME: &'static str = "TPMU_SYM_KEY_BITS";
    type Selector = AlgId;

    fn selector(&self) -> AlgId {
        match self {
            Self::Cipher { algorithm, .. } => algorithm.alg(),
            Self::Null => AlgId::NULL,
        }
    }

    fn encode_variant(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Cipher { key_bits, mode, .. } => {
                key_bits.encode(w)?;
                mode.encode(w)
            }
            Self::Null => Ok(()),
        }
    }

    fn decode_variant(selector: AlgId, r: &mut Reader<'_>) -> Result<Self> {
        match (SymCipherKind::from_alg(selector), selector) {
            (Some(algorithm), _) => Ok(Self::Cipher {
                algorithm,
                key_bits: u16::decode(r)?,
                mode: AlgId::decode(r)?,
            }),
            (None, AlgId::NULL) => Ok(Self::Null),
            (None, _) => Err(unknown_selector::<Self>(selector)),
        }
    }
}

impl_tagged_marshal!(TpmtSymDefObject);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn rsassa_sha256() {
        let scheme = TpmtRsaScheme::Hash(RsaSchemeKind::RsaSsa, TpmsSchemeHash::new(AlgId::SHA256));
        let bytes = scheme.encode_to_bytes().unwrap();
        assert_eq!(bytes, [0x00, 0x14, 0x00, 0x0b]);
        assert_eq!(TpmtRsaScheme::decode_from_bytes(&bytes).unwrap(), scheme);
    }

    #[test]
    fn null_schemes_have_no_body() {
        assert_eq!(TpmtRsaScheme::Null.encode_to_bytes().unwrap(), [0x00, 0x10]);
        assert_eq!(TpmtSigScheme::default().encode_to_bytes().unwrap(), [0x00, 0x10]);
        assert_eq!(TpmtKdfScheme::Null.encode_to_bytes().unwrap(), [0x00, 0x10]);
        assert_eq!(
            TpmtKeyedHashScheme::default().encode_to_bytes().unwrap(),
            [0x00, 0x10]
        );
    }

    #[test]
    fn ecdaa_has_its_own_layout() {
        let scheme = TpmtSigScheme::Ecdaa(TpmsSchemeEcdaa {
            hash_alg: AlgId::SHA256,
            count: 3,
        });
        let bytes = scheme.encode_to_bytes().unwrap();
        assert_eq!(bytes, [0x00, 0x1a, 0x00, 0x0b, 0x00, 0x03]);
        assert_eq!(TpmtSigScheme::decode_from_bytes(&bytes).unwrap(), scheme);
    }

    #[test]
    fn shared_layout_keeps_distinct_selectors() {
        for kind in [
            SigSchemeKind::RsaSsa,
            SigSchemeKind::RsaPss,
            SigSchemeKind::Ecdsa,
            SigSchemeKind::Sm2,
            SigSchemeKind::EcSchnorr,
            SigSchemeKind::Hmac,
        ] {
            let scheme = TpmtSigScheme::Hash(kind, TpmsSchemeHash::new(AlgId::SHA384));
            let bytes = scheme.encode_to_bytes().unwrap();
            assert_eq!(TpmtSigScheme::decode_from_bytes(&bytes).unwrap(), scheme);
        }
    }

    #[test]
    fn aes_128_cfb() {
        let sym = TpmtSymDefObject::Cipher {
            algorithm: SymCipherKind::Aes,
            key_bits: 128,
            mode: AlgId::CFB,
        };
        let bytes = sym.encode_to_bytes().unwrap();
        assert_eq!(bytes, [0x00, 0x06, 0x00, 0x80, 0x00, 0x43]);
        assert_eq!(TpmtSymDefObject::decode_from_bytes(&bytes).unwrap(), sym);
    }

    #[test]
    fn keyed_hash_xor() {
        let scheme = TpmtKeyedHashScheme::Xor(TpmsSchemeXor {
            hash_alg: AlgId::SHA256,
            kdf: AlgId::KDF1_SP800_108,
        });
        let bytes = scheme.encode_to_bytes().unwrap();
        assert_eq!(bytes, [0x00, 0x0a, 0x00, 0x0b, 0x00, 0x22]);
    }

    #[test]
    fn unknown_scheme() {
        let err = TpmtRsaScheme::decode_from_bytes(&[0x00, 0x18, 0x00, 0x0b]).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::UnknownUnionSelector {
                union: "TPMU_ASYM_SCHEME",
                selector: 0x18
            }
        );
    }
}
