// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Command and response parameter areas.
//!
//! Each command is a pair of structures: the parameters that follow the
//! handle and authorization areas of the command, and the parameters of its
//! response. Handles are passed to and returned from
//! [`encode_command`](crate::framing::encode_command) and
//! [`decode_response`](crate::framing::decode_response) separately, since
//! they are not covered by the parameter size.
//!
//! See "Trusted Platform Module Library Part 3: Commands", revision 1.38.


use crate::error::Result;
use crate::marshal::Marshal;
use crate::tpm_struct;
use crate::types::CommandCode;
use crate::types::StartupType;
use crate::types::Tpm2bAttest;
use crate::types::Tpm2bAuth;
use crate::types::Tpm2bCreationData;
use crate::types::Tpm2bData;
use crate::types::Tpm2bDigest;
use crate::types::Tpm2bMaxNvBuffer;
use crate::types::Tpm2bName;
use crate::types::Tpm2bNvPublic;
use crate::types::Tpm2bPublic;
use crate::types::Tpm2bSensitiveCreate;
use crate::types::TpmHandle;
use crate::types::TpmlDigest;
use crate::types::TpmlPcrSelection;
use crate::types::TpmsNvPublic;
use crate::types::TpmtPublic;
use crate::types::TpmtSigScheme;
use crate::types::TpmtSignature;
use crate::types::TpmtTkCreation;
use crate::wire::Tpm2bStruct;

/// The parameter area of a TPM command.
pub trait TpmCommand: Marshal {
    const CODE: CommandCode;

    /// The number of handles in the command's handle area.
    const HANDLES: usize;

    type Response: TpmResponse;
}

/// The parameter area of a TPM response.
pub trait TpmResponse: Marshal {
    /// The number of handles in the response's handle area.
    const HANDLES: usize;
}

macro_rules! impl_command {
    ($($cmd:ident($handles:literal) => $reply:ident($reply_handles:literal) = $code:ident,)*) => {
        $(
            impl TpmCommand for $cmd {
                const CODE: CommandCode = CommandCode::$code;
                const HANDLES: usize = $handles;
                type Response = $reply;
            }

            impl TpmResponse for $reply {
                const HANDLES: usize = $reply_handles;
            }
        )*
    };
}

impl_command! {
    StartupCmd(0) => StartupReply(0) = STARTUP,
    ShutdownCmd(0) => ShutdownReply(0) = SHUTDOWN,
    SelfTestCmd(0) => SelfTestReply(0) = SELF_TEST,
    GetRandomCmd(0) => GetRandomReply(0) = GET_RANDOM,
    PcrReadCmd(0) => PcrReadReply(0) = PCR_READ,
    CreatePrimaryCmd(1) => CreatePrimaryReply(1) = CREATE_PRIMARY,
    ReadPublicCmd(1) => ReadPublicReply(0) = READ_PUBLIC,
    FlushContextCmd(0) => FlushContextReply(0) = FLUSH_CONTEXT,
    NvDefineSpaceCmd(1) => NvDefineSpaceReply(0) = NV_DEFINE_SPACE,
    NvUndefineSpaceCmd(2) => NvUndefineSpaceReply(0) = NV_UNDEFINE_SPACE,
    NvWriteCmd(2) => NvWriteReply(0) = NV_WRITE,
    NvReadCmd(2) => NvReadReply(0) = NV_READ,
    NvReadPublicCmd(1) => NvReadPublicReply(0) = NV_READ_PUBLIC,
    QuoteCmd(1) => QuoteReply(0) = QUOTE,
}

// === Startup, Shutdown, SelfTest === //

tpm_struct! {
    /// `TPM2_Startup`
    pub struct StartupCmd {
        pub startup_type: StartupType,
    }
}

tpm_struct! {
    pub struct StartupReply {}
}

tpm_struct! {
    /// `TPM2_Shutdown`
    pub struct ShutdownCmd {
        pub shutdown_type: StartupType,
    }
}

tpm_struct! {
    pub struct ShutdownReply {}
}

tpm_struct! {
    /// `TPM2_SelfTest`
    pub struct SelfTestCmd {
        pub full_test: bool,
    }
}

tpm_struct! {
    pub struct SelfTestReply {}
}

// === GetRandom === //

tpm_struct! {
    /// `TPM2_GetRandom`
    pub struct GetRandomCmd {
        pub bytes_requested: u16,
    }
}

tpm_struct! {
    pub struct GetRandomReply {
        pub random_bytes: Tpm2bDigest,
    }
}

// === PCR_Read === //

tpm_struct! {
    /// `TPM2_PCR_Read`
    pub struct PcrReadCmd {
        pub pcr_selection_in: TpmlPcrSelection,
    }
}

tpm_struct! {
    pub struct PcrReadReply {
        pub pcr_update_counter: u32,
        pub pcr_selection_out: TpmlPcrSelection,
        pub pcr_values: TpmlDigest,
    }
}

// === CreatePrimary === //

tpm_struct! {
    /// `TPM2_CreatePrimary`, with the hierarchy as its one handle.
    pub struct CreatePrimaryCmd {
        pub in_sensitive: Tpm2bSensitiveCreate,
        pub in_public: Tpm2bPublic,
        pub outside_info: Tpm2bData,
        pub creation_pcr: TpmlPcrSelection,
    }
}

impl CreatePrimaryCmd {
    /// Creates a primary object from `in_public` with an empty auth value
    /// and no outside info or creation PCRs.
    pub fn new(in_public: TpmtPublic) -> Self {
        Self {
            in_sensitive: Tpm2bSensitiveCreate::default(),
            in_public: Tpm2bStruct::new(in_public),
            outside_info: Tpm2bData::default(),
            creation_pcr: TpmlPcrSelection::default(),
        }
    }
}

tpm_struct! {
    /// The response to `TPM2_CreatePrimary`, after the `objectHandle`.
    pub struct CreatePrimaryReply {
        pub out_public: Tpm2bPublic,
        pub creation_data: Tpm2bCreationData,
        pub creation_hash: Tpm2bDigest,
        pub creation_ticket: TpmtTkCreation,
        pub name: Tpm2bName,
    }
}

// === ReadPublic === //

tpm_struct! {
    /// `TPM2_ReadPublic`, with the object as its one handle.
    pub struct ReadPublicCmd {}
}

tpm_struct! {
    pub struct ReadPublicReply {
        pub out_public: Tpm2bPublic,
        pub name: Tpm2bName,
        pub qualified_name: Tpm2bName,
    }
}

// === FlushContext === //

tpm_struct! {
    /// `TPM2_FlushContext`. The handle to flush is a parameter, not in the
    /// handle area.
    pub struct FlushContextCmd {
        pub flush_handle: TpmHandle,
    }
}

tpm_struct! {
    pub struct FlushContextReply {}
}

// === NV_DefineSpace, NV_UndefineSpace === //

tpm_struct! {
    /// `TPM2_NV_DefineSpace`, with the owner or platform hierarchy as its
    /// handle.
    pub struct NvDefineSpaceCmd {
        pub auth: Tpm2bAuth,
        pub public_info: Tpm2bNvPublic,
    }
}

impl NvDefineSpaceCmd {
    /// Defines an index with the given auth value, which the TPM takes as a
    /// big-endian byte string.
    pub fn new(auth_value: u64, public_info: TpmsNvPublic) -> Result<Self> {
        Ok(Self {
            auth: Tpm2bAuth::new(&auth_value.to_be_bytes())?,
            public_info: Tpm2bStruct::new(public_info),
        })
    }
}

tpm_struct! {
    pub struct NvDefineSpaceReply {}
}

tpm_struct! {
    /// `TPM2_NV_UndefineSpace`, with the hierarchy and the index as handles.
    pub struct NvUndefineSpaceCmd {}
}

tpm_struct! {
    pub struct NvUndefineSpaceReply {}
}

// === NV_Write, NV_Read === //

tpm_struct! {
    /// `TPM2_NV_Write`, with the authorizing entity and the index as handles.
    pub struct NvWriteCmd {
        pub data: Tpm2bMaxNvBuffer,
        pub offset: u16,
    }
}

impl NvWriteCmd {
    pub fn new(data: &[u8], offset: u16) -> Result<Self> {
        Ok(Self {
            data: Tpm2bMaxNvBuffer::new(data)?,
            offset,
        })
    }
}

tpm_struct! {
    pub struct NvWriteReply {}
}

tpm_struct! {
    /// `TPM2_NV_Read`, with the authorizing entity and the index as handles.
    pub struct NvReadCmd {
        pub size: u16,
        pub offset: u16,
    }
}

tpm_struct! {
    pub struct NvReadReply {
        pub data: Tpm2bMaxNvBuffer,
    }
}

// === NV_ReadPublic === //

tpm_struct! {
    /// `TPM2_NV_ReadPublic`, with the index as its one handle.
    pub struct NvReadPublicCmd {}
}

tpm_struct! {
    pub struct NvReadPublicReply {
        pub nv_public: Tpm2bNvPublic,
        pub nv_name: Tpm2bName,
    }
}

// === Quote === //

tpm_struct! {
    /// `TPM2_Quote`, with the signing key as its one handle.
    pub struct QuoteCmd {
        pub qualifying_data: Tpm2bData,
        pub in_scheme: TpmtSigScheme,
        pub pcr_select: TpmlPcrSelection,
    }
}

tpm_struct! {
    pub struct QuoteReply {
        pub quoted: Tpm2bAttest,
        pub signature: TpmtSignature,
    }
}
