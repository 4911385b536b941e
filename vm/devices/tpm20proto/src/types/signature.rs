// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Digests and signatures.

use super::scheme::scheme_kind;
use super::AlgId;
use super::Tpm2bEccParameter;
use super::Tpm2bPublicKeyRsa;
use crate::cursor::Reader;
use crate::cursor::Writer;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::error::Result;
use crate::impl_tagged_marshal;
use crate::marshal::Marshal;
use crate::tpm_struct;
use crate::union::unknown_selector;
use crate::union::TpmUnion;

/// `TPMT_HA`: a hash algorithm and a digest of exactly that algorithm's size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpmtHa {
    pub hash_alg: AlgId,
    pub digest: Vec<u8>,
}

impl Default for TpmtHa {
    fn default() -> Self {
        Self {
            hash_alg: AlgId::NULL,
            digest: Vec::new(),
        }
    }
}

impl TpmtHa {
    pub fn new(hash_alg: AlgId, digest: &[u8]) -> Result<Self> {
        let ha = Self {
            hash_alg,
            digest: digest.to_vec(),
        };
        ha.check()?;
        Ok(ha)
    }

    fn check(&self) -> Result<()> {
        let size = self
            .hash_alg
            .digest_size()
            .ok_or_else(|| unknown_selector::<Self>(self.hash_alg))?;
        if self.digest.len() != size {
            return Err(Error::new(ErrorKind::InvalidValue {
                what: "digest length",
                value: self.digest.len() as u32,
            })
            .typed::<Self>());
        }
        Ok(())
    }
}

impl TpmUnion for TpmtHa {
    const NAME: &'static str = "TPMU_HA";
    type Selector = AlgId;

    fn selector(&self) -> AlgId {
        self.hash_alg
    }

    fn encode_variant(&self, w: &mut Writer) -> Result<()> {
        self.check()?;
        w.write_bytes(&self.digest);
        Ok(())
    }

    fn decode_variant(hash_alg: AlgId, r: &mut Reader<'_>) -> Result<Self> {
        let size = hash_alg
            .digest_size()
            .ok_or_else(|| unknown_selector::<Self>(hash_alg))?;
        Ok(Self {
            hash_alg,
            digest: r.read_bytes(size)?.to_vec(),
        })
    }
}

impl_tagged_marshal!(TpmtHa);

tpm_struct! {
    /// `TPMS_SIGNATURE_RSA`, shared by `TPMS_SIGNATURE_RSASSA` and
    /// `TPMS_SIGNATURE_RSAPSS`.
    #[derive(Default)]
    pub struct TpmsSignatureRsa {
        pub hash: AlgId,
        pub sig: Tpm2bPublicKeyRsa,
    }
}

tpm_struct! {
    /// `TPMS_SIGNATURE_ECC`, shared by every ECC signature scheme.
    #[derive(Default)]
    pub struct TpmsSignatureEcc {
        pub hash: AlgId,
        pub signature_r: Tpm2bEccParameter,
        pub signature_s: Tpm2bEccParameter,
    }
}

scheme_kind! {
    pub enum RsaSignatureKind {
        RsaSsa = AlgId::RSASSA,
        RsaPss = AlgId::RSAPSS,
    }
}

scheme_kind! {
    pub enum EccSignatureKind {
        Ecdsa = AlgId::ECDSA,
        Ecdaa = AlgId::ECDAA,
        Sm2 = AlgId::SM2,
        EcSchnorr = AlgId::ECSCHNORR,
    }
}

/// `TPMT_SIGNATURE`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TpmtSignature {
    Rsa(RsaSignatureKind, TpmsSignatureRsa),
    Ecc(EccSignatureKind, TpmsSignatureEcc),
    Hmac(TpmtHa),
    #[default]
    Null,
}

impl TpmUnion for TpmtSignature {
    const NAME: &'static str = "TPMU_SIGNATURE";
    type Selector = AlgId;

    fn selector(&self) -> AlgId {
        match self {
            Self::Rsa(kind, _) => kind.alg(),
            Self::Ecc(kind, _) => kind.alg(),
            Self::Hmac(_) => AlgId::HMAC,
            Self::Null => AlgId::NULL,
        }
    }

    fn encode_variant(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Rsa(_, sig) => sig.encode(w),
            Self::Ecc(_, sig) => sig.encode(w),
            Self::Hmac(ha) => ha.encode(w),
            Self::Null => Ok(()),
        }
    }

    fn decode_variant(selector: AlgId, r: &mut Reader<'_>) -> Result<Self> {
        if let Some(kind) = RsaSignatureKind::from_alg(selector) {
            return Ok(Self::Rsa(kind, TpmsSignatureRsa::decode(r)?));
        }
        if let Some(kind) = EccSignatureKind::from_alg(selector) {
            return Ok(Self::Ecc(kind, TpmsSignatureEcc::decode(r)?));
        }
        match selector {
            AlgId::HMAC => Ok(Self::Hmac(TpmtHa::decode(r)?)),
            AlgId::NULL => Ok(Self::Null),
            _ => Err(unknown_selector::<Self>(selector)),
        }
    }
}

impl_tagged_marshal!(TpmtSignature);

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn rsassa_signature_starts_with_selector() {
        let sig = TpmtSignature::Rsa(
            RsaSignatureKind::RsaSsa,
            TpmsSignatureRsa {
                hash: AlgId::SHA256,
                sig: Tpm2bPublicKeyRsa::new(&[0x11, 0x22]).unwrap(),
            },
        );
        let bytes = sig.encode_to_bytes().unwrap();
        expect!["0014000b00021122"].assert_eq(&hex::encode(&bytes));
        assert_eq!(TpmtSignature::decode_from_bytes(&bytes).unwrap(), sig);
    }

    #[test]
    fn ecdsa_signature() {
        let sig = TpmtSignature::Ecc(
            EccSignatureKind::Ecdsa,
            TpmsSignatureEcc {
                hash: AlgId::SHA384,
                signature_r: Tpm2bEccParameter::new(&[1; 3]).unwrap(),
                signature_s: Tpm2bEccParameter::new(&[2; 3]).unwrap(),
            },
        );
        let bytes = sig.encode_to_bytes().unwrap();
        expect!["0018000c00030101010003020202"].assert_eq(&hex::encode(&bytes));
        assert_eq!(TpmtSignature::decode_from_bytes(&bytes).unwrap(), sig);
    }

    #[test]
    fn hmac_signature_nests_tpmt_ha() {
        let sig = TpmtSignature::Hmac(TpmtHa::new(AlgId::SHA1, &[0xab; 20]).unwrap());
        let bytes = sig.encode_to_bytes().unwrap();
        assert_eq!(&bytes[..4], &[0x00, 0x05, 0x00, 0x04]);
        assert_eq!(bytes.len(), 24);
        assert_eq!(TpmtSignature::decode_from_bytes(&bytes).unwrap(), sig);
    }

    #[test]
    fn null_signature() {
        let bytes = TpmtSignature::Null.encode_to_bytes().unwrap();
        assert_eq!(bytes, [0x00, 0x10]);
        assert_eq!(
            TpmtSignature::decode_from_bytes(&bytes).unwrap(),
            TpmtSignature::Null
        );
    }

    #[test]
    fn digest_length_must_match_algorithm() {
        let err = TpmtHa::new(AlgId::SHA256, &[0; 20]).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidValue {
                what: "digest length",
                value: 20
            }
        ));

        let err = TpmtHa::decode_from_bytes(&[0x00, 0x01]).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnknownUnionSelector {
                union: "TPMU_HA",
                selector: 1
            }
        ));
    }

    #[test]
    fn unknown_signature_algorithm() {
        let err = TpmtSignature::decode_from_bytes(&[0x00, 0x99]).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnknownUnionSelector {
                union: "TPMU_SIGNATURE",
                ..
            }
        ));
    }
}
