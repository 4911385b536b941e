// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! NV index public areas.

use super::AlgId;
use super::Tpm2bDigest;
use super::TpmHandle;
use super::TpmaNv;
use crate::tpm_struct;
use crate::wire::Tpm2bStruct;

tpm_struct! {
    /// `TPMS_NV_PUBLIC`
    #[derive(Default)]
    pub struct TpmsNvPublic {
        pub nv_index: TpmHandle,
        pub name_alg: AlgId,
        pub attributes: TpmaNv,
        pub auth_policy: Tpm2bDigest,
        pub data_size: u16,
    }
}

/// `TPM2B_NV_PUBLIC`
pub type Tpm2bNvPublic = Tpm2bStruct<TpmsNvPublic>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TPM20_HT_NV_INDEX;
    use crate::Marshal;

    #[test]
    fn nv_public_wire_form() {
        let public = Tpm2bNvPublic::new(TpmsNvPublic {
            nv_index: TpmHandle::new(TPM20_HT_NV_INDEX, 0xc101d0),
            name_alg: AlgId::SHA256,
            attributes: TpmaNv::new()
                .with_nv_authread(true)
                .with_nv_authwrite(true)
                .with_nv_ownerread(true)
                .with_nv_platformcreate(true)
                .with_nv_no_da(true),
            auth_policy: Tpm2bDigest::default(),
            data_size: 4096,
        });
        let bytes = public.encode_to_bytes().unwrap();
        assert_eq!(
            bytes,
            [
                0x00, 0x0e, 0x01, 0xc1, 0x01, 0xd0, 0x00, 0x0b, 0x42, 0x06, 0x00, 0x04, 0x00,
                0x00, 0x10, 0x00
            ]
        );
        assert_eq!(Tpm2bNvPublic::decode_from_bytes(&bytes).unwrap(), public);
    }

    #[test]
    fn declared_size_must_match_contents() {
        // Declares 15 bytes around a 14-byte public area.
        let bytes = [
            0x00, 0x0f, 0x01, 0xc1, 0x01, 0xd0, 0x00, 0x0b, 0x42, 0x06, 0x00, 0x04, 0x00, 0x00,
            0x10, 0x00, 0xff,
        ];
        let err = Tpm2bNvPublic::decode_from_bytes(&bytes).unwrap_err();
        assert_eq!(
            err.kind(),
            &crate::ErrorKind::SizedRegionMismatch {
                declared: 15,
                consumed: 14
            }
        );
    }
}
