// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Attestation structures (`TPMS_ATTEST` and its payloads).

use super::AlgId;
use super::StructureTag;
use super::Tpm2bData;
use super::Tpm2bDigest;
use super::Tpm2bMaxNvBuffer;
use super::Tpm2bName;
use super::TpmlPcrSelection;
use super::TPM_GENERATED_VALUE;
use crate::cursor::Reader;
use crate::cursor::Writer;
use crate::error::ErrorKind;
use crate::error::Result;
use crate::error::ResultExt;
use crate::marshal::Marshal;
use crate::tpm_struct;
use crate::tpm_union;
use crate::union::TpmUnion;
use crate::wire::Tpm2bStruct;

tpm_struct! {
    /// `TPMS_CLOCK_INFO`
    #[derive(Copy, Default)]
    pub struct TpmsClockInfo {
        pub clock: u64,
        pub reset_count: u32,
        pub restart_count: u32,
        pub safe: bool,
    }
}

tpm_struct! {
    /// `TPMS_TIME_INFO`
    #[derive(Copy, Default)]
    pub struct TpmsTimeInfo {
        pub time: u64,
        pub clock_info: TpmsClockInfo,
    }
}

tpm_struct! {
    /// `TPMS_TIME_ATTEST_INFO`
    #[derive(Copy, Default)]
    pub struct TpmsTimeAttestInfo {
        pub time: TpmsTimeInfo,
        pub firmware_version: u64,
    }
}

tpm_struct! {
    /// `TPMS_CERTIFY_INFO`
    #[derive(Default)]
    pub struct TpmsCertifyInfo {
        pub name: Tpm2bName,
        pub qualified_name: Tpm2bName,
    }
}

tpm_struct! {
    /// `TPMS_QUOTE_INFO`
    #[derive(Default)]
    pub struct TpmsQuoteInfo {
        pub pcr_select: TpmlPcrSelection,
        pub pcr_digest: Tpm2bDigest,
    }
}

tpm_struct! {
    /// `TPMS_COMMAND_AUDIT_INFO`
    #[derive(Default)]
    pub struct TpmsCommandAuditInfo {
        pub audit_counter: u64,
        pub digest_alg: AlgId,
        pub audit_digest: Tpm2bDigest,
        pub command_digest: Tpm2bDigest,
    }
}

tpm_struct! {
    /// `TPMS_SESSION_AUDIT_INFO`
    #[derive(Default)]
    pub struct TpmsSessionAuditInfo {
        pub exclusive_session: bool,
        pub session_digest: Tpm2bDigest,
    }
}

tpm_struct! {
    /// `TPMS_CREATION_INFO`
    #[derive(Default)]
    pub struct TpmsCreationInfo {
        pub object_name: Tpm2bName,
        pub creation_hash: Tpm2bDigest,
    }
}

tpm_struct! {
    /// `TPMS_NV_CERTIFY_INFO`
    #[derive(Default)]
    pub struct TpmsNvCertifyInfo {
        pub index_name: Tpm2bName,
        pub offset: u16,
        pub nv_contents: Tpm2bMaxNvBuffer,
    }
}

tpm_union! {
    /// `TPMU_ATTEST`, selected by the `type` field of `TPMS_ATTEST`.
    pub enum TpmuAttest: "TPMU_ATTEST" (StructureTag) {
        Certify(TpmsCertifyInfo) = StructureTag::ATTEST_CERTIFY,
        Creation(TpmsCreationInfo) = StructureTag::ATTEST_CREATION,
        Quote(TpmsQuoteInfo) = StructureTag::ATTEST_QUOTE,
        CommandAudit(TpmsCommandAuditInfo) = StructureTag::ATTEST_COMMAND_AUDIT,
        SessionAudit(TpmsSessionAuditInfo) = StructureTag::ATTEST_SESSION_AUDIT,
        Time(TpmsTimeAttestInfo) = StructureTag::ATTEST_TIME,
        Nv(TpmsNvCertifyInfo) = StructureTag::ATTEST_NV,
    }
}

/// `TPMS_ATTEST`
///
/// The leading `magic` is always `TPM_GENERATED_VALUE` and is checked on
/// decode. The `type` field is the selector of `attested`, which follows
/// four other fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpmsAttest {
    pub qualified_signer: Tpm2bName,
    pub extra_data: Tpm2bData,
    pub clock_info: TpmsClockInfo,
    pub firmware_version: u64,
    pub attested: TpmuAttest,
}

impl TpmsAttest {
    fn encode_fields(&self, w: &mut Writer) -> Result<()> {
        w.write_u32(TPM_GENERATED_VALUE);
        self.attested.selector().encode(w)?;
        self.qualified_signer.encode(w)?;
        self.extra_data.encode(w)?;
        self.clock_info.encode(w)?;
        self.firmware_version.encode(w)?;
        self.attested.encode_variant(w)
    }

    fn decode_fields(r: &mut Reader<'_>) -> Result<Self> {
        let magic = r.read_u32()?;
        if magic != TPM_GENERATED_VALUE {
            return Err(ErrorKind::InvalidValue {
                what: "TPM_GENERATED",
                value: magic,
            }
            .into());
        }
        let ty = StructureTag::decode(r)?;
        let qualified_signer = Tpm2bName::decode(r)?;
        let extra_data = Tpm2bData::decode(r)?;
        let clock_info = TpmsClockInfo::decode(r)?;
        let firmware_version = u64::decode(r)?;
        let attested = TpmuAttest::decode_variant(ty, r)?;
        Ok(Self {
            qualified_signer,
            extra_data,
            clock_info,
            firmware_version,
            attested,
        })
    }
}

impl Marshal for TpmsAttest {
    fn encode(&self, w: &mut Writer) -> Result<()> {
        self.encode_fields(w).typed::<Self>()
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        Self::decode_fields(r).typed::<Self>()
    }
}

/// `TPM2B_ATTEST`
pub type Tpm2bAttest = Tpm2bStruct<TpmsAttest>;
