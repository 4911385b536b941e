// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `TPMA_*` attribute bitfields.

use crate::cursor::Reader;
use crate::cursor::Writer;
use crate::error::Result;
use crate::marshal::Marshal;
use bitfield_struct::bitfield;

macro_rules! marshal_bitfield {
    ($($name:ident: $storage:ty,)*) => {
        $(
            impl Marshal for $name {
                fn encode(&self, w: &mut Writer) -> Result<()> {
                    self.into_bits().encode(w)
                }

                fn decode(r: &mut Reader<'_>) -> Result<Self> {
                    Ok(Self::from_bits(<$storage>::decode(r)?))
                }
            }
        )*
    };
}

marshal_bitfield! {
    TpmaObject: u32,
    TpmaNv: u32,
    TpmaSession: u8,
    TpmaLocality: u8,
}

/// `TPMA_OBJECT`
///
/// See Table 31, Section 8.3, "Trusted Platform Module Library Part 2: Structures", revision 1.38.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct TpmaObject {
    _reserved0: bool,
    pub fixed_tpm: bool,
    pub st_clear: bool,
    _reserved1: bool,
    pub fixed_parent: bool,
    pub sensitive_data_origin: bool,
    pub user_with_auth: bool,
    pub admin_with_policy: bool,
    #[bits(2)]
    _reserved2: u8,
    pub no_da: bool,
    pub encrypted_duplication: bool,
    #[bits(4)]
    _reserved3: u8,
    pub restricted: bool,
    pub decrypt: bool,
    pub sign_encrypt: bool,
    pub x509_sign: bool,
    #[bits(12)]
    _reserved4: u16,
}

/// `TPMA_NV`
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct TpmaNv {
    pub nv_ppwrite: bool,
    pub nv_ownerwrite: bool,
    pub nv_authwrite: bool,
    pub nv_policywrite: bool,
    /// bits 7:4: `TPM_NT`. 0 ordinary, 1 counter, 2 bits, 4 extend, 8 pin
    /// fail, 9 pin pass.
    #[bits(4)]
    pub nt: u8,
    // bits 9:8 are reserved
    #[bits(2)]
    _reserved1: u8,
    pub nv_policy_delete: bool,
    pub nv_writelocked: bool,
    pub nv_writeall: bool,
    pub nv_writedefine: bool,
    pub nv_write_stclear: bool,
    pub nv_globallock: bool,
    pub nv_ppread: bool,
    pub nv_ownerread: bool,
    pub nv_authread: bool,
    pub nv_policyread: bool,
    // bits 24:20 are reserved
    #[bits(5)]
    _reserved2: u8,
    pub nv_no_da: bool,
    pub nv_orderly: bool,
    pub nv_clear_stclear: bool,
    pub nv_readlocked: bool,
    pub nv_written: bool,
    pub nv_platformcreate: bool,
    pub nv_read_stclear: bool,
}

/// `TPMA_SESSION`
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct TpmaSession {
    pub continue_session: bool,
    pub audit_exclusive: bool,
    pub audit_reset: bool,
    #[bits(2)]
    _reserved: u8,
    pub decrypt: bool,
    pub encrypt: bool,
    pub audit: bool,
}

/// `TPMA_LOCALITY`
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct TpmaLocality {
    pub loc_zero: bool,
    pub loc_one: bool,
    pub loc_two: bool,
    pub loc_three: bool,
    pub loc_four: bool,
    #[bits(3)]
    pub extended: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_attributes_match_captured_key() {
        // Attributes of a restricted signing key created by CreatePrimary.
        let attrs = TpmaObject::new()
            .with_fixed_tpm(true)
            .with_fixed_parent(true)
            .with_sensitive_data_origin(true)
            .with_user_with_auth(true)
            .with_no_da(true)
            .with_restricted(true)
            .with_sign_encrypt(true);
        assert_eq!(attrs.into_bits(), 0x0005_0472);
        assert_eq!(attrs.encode_to_bytes().unwrap(), [0x00, 0x05, 0x04, 0x72]);
    }

    #[test]
    fn nv_attributes() {
        let attrs = TpmaNv::decode_from_bytes(&[0x42, 0x06, 0x00, 0x04]).unwrap();
        assert!(attrs.nv_authwrite());
        assert!(attrs.nv_ownerread());
        assert!(attrs.nv_authread());
        assert!(attrs.nv_no_da());
        assert!(attrs.nv_platformcreate());
        assert_eq!(attrs.nt(), 0);
        assert!(!attrs.nv_written());
    }

    #[test]
    fn session_attributes() {
        let attrs = TpmaSession::new().with_continue_session(true);
        assert_eq!(attrs.encode_to_bytes().unwrap(), [0x01]);
        let attrs = TpmaSession::decode_from_bytes(&[0x60]).unwrap();
        assert!(attrs.decrypt() && attrs.encrypt());
    }
}
