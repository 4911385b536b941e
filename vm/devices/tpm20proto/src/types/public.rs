// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Object public areas and the structures `TPM2_CreatePrimary` returns.

use super::AlgId;
use super::EccCurve;
use super::StructureTag;
use super::Tpm2bAuth;
use super::Tpm2bData;
use super::Tpm2bDigest;
use super::Tpm2bEccParameter;
use super::Tpm2bName;
use super::Tpm2bPublicKeyRsa;
use super::Tpm2bSensitiveData;
use super::TpmHandle;
use super::TpmaLocality;
use super::TpmaObject;
use super::TpmlPcrSelection;
use super::TpmtEccScheme;
use super::TpmtKdfScheme;
use super::TpmtKeyedHashScheme;
use super::TpmtRsaScheme;
use super::TpmtSymDefObject;
use crate::cursor::Reader;
use crate::cursor::Writer;
use crate::error::Result;
use crate::error::ResultExt;
use crate::marshal::Marshal;
use crate::tpm_struct;
use crate::union::unknown_selector;
use crate::union::TpmUnion;
use crate::wire::Tpm2bStruct;

tpm_struct! {
    /// `TPMS_RSA_PARMS`
    #[derive(Default)]
    pub struct TpmsRsaParms {
        pub symmetric: TpmtSymDefObject,
        pub scheme: TpmtRsaScheme,
        pub key_bits: u16,
        /// Zero selects the default exponent, 2^16 + 1.
        pub exponent: u32,
    }
}

tpm_struct! {
    /// `TPMS_ECC_PARMS`
    #[derive(Default)]
    pub struct TpmsEccParms {
        pub symmetric: TpmtSymDefObject,
        pub scheme: TpmtEccScheme,
        pub curve_id: EccCurve,
        pub kdf: TpmtKdfScheme,
    }
}

tpm_struct! {
    /// `TPMS_KEYEDHASH_PARMS`
    #[derive(Default)]
    pub struct TpmsKeyedHashParms {
        pub scheme: TpmtKeyedHashScheme,
    }
}

tpm_struct! {
    /// `TPMS_SYMCIPHER_PARMS`
    #[derive(Default)]
    pub struct TpmsSymCipherParms {
        pub sym: TpmtSymDefObject,
    }
}

tpm_struct! {
    /// `TPMS_ECC_POINT`
    #[derive(Default)]
    pub struct TpmsEccPoint {
        pub x: Tpm2bEccParameter,
        pub y: Tpm2bEccParameter,
    }
}

/// The type-specific part of `TPMT_PUBLIC`: `parameters`
/// (`TPMU_PUBLIC_PARMS`) and `unique` (`TPMU_PUBLIC_ID`), both selected by
/// the `type` field at the start of the public area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicDetails {
    Rsa {
        parameters: TpmsRsaParms,
        unique: Tpm2bPublicKeyRsa,
    },
    Ecc {
        parameters: TpmsEccParms,
        unique: TpmsEccPoint,
    },
    KeyedHash {
        parameters: TpmsKeyedHashParms,
        unique: Tpm2bDigest,
    },
    SymCipher {
        parameters: TpmsSymCipherParms,
        unique: Tpm2bDigest,
    },
}

impl TpmUnion for PublicDetails {
    const NAME: &'static str = "TPMU_PUBLIC_PARMS";
    type Selector = AlgId;

    fn selector(&self) -> AlgId {
        match self {
            Self::Rsa { .. } => AlgId::RSA,
            Self::Ecc { .. } => AlgId::ECC,
            Self::KeyedHash { .. } => AlgId::KEYEDHASH,
            Self::SymCipher { .. } => AlgId::SYMCIPHER,
        }
    }

    fn encode_variant(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Rsa { parameters, unique } => {
                parameters.encode(w)?;
                unique.encode(w)
            }
            Self::Ecc { parameters, unique } => {
                parameters.encode(w)?;
                unique.encode(w)
            }
            Self::KeyedHash { parameters, unique } => {
                parameters.encode(w)?;
                unique.encode(w)
            }
            Self::SymCipher { parameters, unique } => {
                parameters.encode(w)?;
                unique.encode(w)
            }
        }
    }

    fn decode_variant(selector: AlgId, r: &mut Reader<'_>) -> Result<Self> {
        Ok(match selector {
            AlgId::RSA => Self::Rsa {
                parameters: TpmsRsaParms::decode(r)?,
                unique: Tpm2bPublicKeyRsa::decode(r)?,
            },
            AlgId::ECC => Self::Ecc {
                parameters: TpmsEccParms::decode(r)?,
                unique: TpmsEccPoint::decode(r)?,
            },
            AlgId::KEYEDHASH => Self::KeyedHash {
                parameters: TpmsKeyedHashParms::decode(r)?,
                unique: Tpm2bDigest::decode(r)?,
            },
            AlgId::SYMCIPHER => Self::SymCipher {
                parameters: TpmsSymCipherParms::decode(r)?,
                unique: Tpm2bDigest::decode(r)?,
            },
            _ => return Err(unknown_selector::<Self>(selector)),
        })
    }
}

/// `TPMT_PUBLIC`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpmtPublic {
    pub name_alg: AlgId,
    pub object_attributes: TpmaObject,
    pub auth_policy: Tpm2bDigest,
    /// Also determines the `type` field.
    pub details: PublicDetails,
}

impl TpmtPublic {
    /// The `type` field, the algorithm of the object.
    pub fn object_type(&self) -> AlgId {
        self.details.selector()
    }

    fn encode_fields(&self, w: &mut Writer) -> Result<()> {
        self.details.selector().encode(w)?;
        self.name_alg.encode(w)?;
        self.object_attributes.encode(w)?;
        self.auth_policy.encode(w)?;
        self.details.encode_variant(w)
    }

    fn decode_fields(r: &mut Reader<'_>) -> Result<Self> {
        let ty = AlgId::decode(r)?;
        let name_alg = AlgId::decode(r)?;
        let object_attributes = TpmaObject::decode(r)?;
        let auth_policy = Tpm2bDigest::decode(r)?;
        let details = PublicDetails::decode_variant(ty, r)?;
        Ok(Self {
            name_alg,
            object_attributes,
            auth_policy,
            details,
        })
    }
}

impl Marshal for TpmtPublic {
    fn encode(&self, w: &mut Writer) -> Result<()> {
        self.encode_fields(w).typed::<Self>()
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        Self::decode_fields(r).typed::<Self>()
    }
}

/// `TPM2B_PUBLIC`
pub type Tpm2bPublic = Tpm2bStruct<TpmtPublic>;

tpm_struct! {
    /// `TPMS_SENSITIVE_CREATE`
    #[derive(Default)]
    pub struct TpmsSensitiveCreate {
        pub user_auth: Tpm2bAuth,
        pub data: Tpm2bSensitiveData,
    }
}

/// `TPM2B_SENSITIVE_CREATE`
pub type Tpm2bSensitiveCreate = Tpm2bStruct<TpmsSensitiveCreate>;

tpm_struct! {
    /// `TPMS_CREATION_DATA`
    #[derive(Default)]
    pub struct TpmsCreationData {
        pub pcr_select: TpmlPcrSelection,
        pub pcr_digest: Tpm2bDigest,
        pub locality: TpmaLocality,
        pub parent_name_alg: AlgId,
        pub parent_name: Tpm2bName,
        pub parent_qualified_name: Tpm2bName,
        pub outside_info: Tpm2bData,
    }
}

/// `TPM2B_CREATION_DATA`
pub type Tpm2bCreationData = Tpm2bStruct<TpmsCreationData>;

tpm_struct! {
    /// `TPMT_TK_CREATION`
    pub struct TpmtTkCreation {
        /// Always `TPM_ST_CREATION`.
        pub tag: StructureTag,
        pub hierarchy: TpmHandle,
        pub digest: Tpm2bDigest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RsaSchemeKind;
    use crate::types::SymCipherKind;
    use crate::types::TpmsSchemeHash;
    use crate::ErrorKind;

    /// The public area of a restricted RSA signing key, as sent in
    /// `TPM2_CreatePrimary`.
    fn ak_template() -> TpmtPublic {
        TpmtPublic {
            name_alg: AlgId::SHA256,
            object_attributes: TpmaObject::new()
                .with_fixed_tpm(true)
                .with_fixed_parent(true)
                .with_sensitive_data_origin(true)
                .with_user_with_auth(true)
                .with_no_da(true)
                .with_restricted(true)
                .with_sign_encrypt(true),
            auth_policy: Tpm2bDigest::default(),
            details: PublicDetails::Rsa {
                parameters: TpmsRsaParms {
                    symmetric: TpmtSymDefObject::Null,
                    scheme: TpmtRsaScheme::Hash(
                        RsaSchemeKind::RsaSsa,
                        TpmsSchemeHash::new(AlgId::SHA256),
                    ),
                    key_bits: 2048,
                    exponent: 0,
                },
                unique: Tpm2bPublicKeyRsa::new(&[0; 256]).unwrap(),
            },
        }
    }

    #[test]
    fn rsa_template_layout() {
        let bytes = Tpm2bPublic::new(ak_template()).encode_to_bytes().unwrap();
        assert_eq!(bytes.len(), 282);
        assert_eq!(
            &bytes[..24],
            &[
                0x01, 0x18, 0x00, 0x01, 0x00, 0x0b, 0x00, 0x05, 0x04, 0x72, 0x00, 0x00, 0x00,
                0x10, 0x00, 0x14, 0x00, 0x0b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00,
            ]
        );
        assert_eq!(&bytes[24..26], &[0x01, 0x00]);
        let decoded = Tpm2bPublic::decode_from_bytes(&bytes).unwrap();
        assert_eq!(decoded.object_type(), AlgId::RSA);
        assert_eq!(decoded.into_inner(), ak_template());
    }

    #[test]
    fn storage_key_parameters() {
        let parameters = TpmsRsaParms {
            symmetric: TpmtSymDefObject::Cipher {
                algorithm: SymCipherKind::Aes,
                key_bits: 128,
                mode: AlgId::CFB,
            },
            scheme: TpmtRsaScheme::Null,
            key_bits: 2048,
            exponent: 0,
        };
        assert_eq!(
            parameters.encode_to_bytes().unwrap(),
            [0x00, 0x06, 0x00, 0x80, 0x00, 0x43, 0x00, 0x10, 0x08, 0x00, 0, 0, 0, 0]
        );
    }

    #[test]
    fn ecc_public_area() {
        let public = TpmtPublic {
            name_alg: AlgId::SHA256,
            object_attributes: TpmaObject::new().with_sign_encrypt(true),
            auth_policy: Tpm2bDigest::default(),
            details: PublicDetails::Ecc {
                parameters: TpmsEccParms {
                    curve_id: EccCurve::NIST_P256,
                    ..Default::default()
                },
                unique: TpmsEccPoint {
                    x: Tpm2bEccParameter::new(&[1; 32]).unwrap(),
                    y: Tpm2bEccParameter::new(&[2; 32]).unwrap(),
                },
            },
        };
        let bytes = public.encode_to_bytes().unwrap();
        assert_eq!(&bytes[..2], &[0x00, 0x23]);
        // type, nameAlg, attributes, empty policy, then three NULL selectors
        // around the curve.
        assert_eq!(&bytes[10..18], &[0x00, 0x10, 0x00, 0x10, 0x00, 0x03, 0x00, 0x10]);
        assert_eq!(TpmtPublic::decode_from_bytes(&bytes).unwrap(), public);
    }

    #[test]
    fn unknown_object_type() {
        let mut bytes = ak_template().encode_to_bytes().unwrap();
        bytes[1] = 0x05;
        let err = TpmtPublic::decode_from_bytes(&bytes).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::UnknownUnionSelector {
                union: "TPMU_PUBLIC_PARMS",
                selector: 0x05
            }
        );
        assert_eq!(err.types().len(), 1);
        assert!(err.types()[0].ends_with("TpmtPublic"));
    }

    #[test]
    fn creation_data_from_captured_response() {
        const CREATION_DATA: [u8; 57] = [
            0x00, 0x37, 0x00, 0x00, 0x00, 0x00, 0x00, 0x20, 0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc,
            0x1c, 0x14, 0x9a, 0xfb, 0xf4, 0xc8, 0x99, 0x6f, 0xb9, 0x24, 0x27, 0xae, 0x41, 0xe4,
            0x64, 0x9b, 0x93, 0x4c, 0xa4, 0x95, 0x99, 0x1b, 0x78, 0x52, 0xb8, 0x55, 0x01, 0x00,
            0x10, 0x00, 0x04, 0x40, 0x00, 0x00, 0x0b, 0x00, 0x04, 0x40, 0x00, 0x00, 0x0b, 0x00,
            0x00,
        ];

        let data = Tpm2bCreationData::decode_from_bytes(&CREATION_DATA).unwrap();
        assert!(data.pcr_select.is_empty());
        assert_eq!(data.pcr_digest.len(), 32);
        assert!(data.locality.loc_zero());
        assert_eq!(data.parent_name_alg, AlgId::NULL);
        assert_eq!(data.parent_name.as_bytes(), &[0x40, 0x00, 0x00, 0x0b]);
        assert!(data.outside_info.is_empty());
        assert_eq!(data.encode_to_bytes().unwrap(), CREATION_DATA);
    }
}
