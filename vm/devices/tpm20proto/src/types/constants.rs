// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! TPM constants (`TPM_ALG_ID`, `TPM_ST`, `TPM_CC`, `TPM_RC`, handles).

use crate::tpm_enum;

tpm_enum! {
    /// `TPM_ALG_ID`
    ///
    /// See Table 9, Section 6.3, "Trusted Platform Module Library Part 2: Structures", revision 1.38.
    pub enum AlgId: u16 {
        ERROR = 0x0000,
        RSA = 0x0001,
        TDES = 0x0003,
        SHA1 = 0x0004,
        HMAC = 0x0005,
        AES = 0x0006,
        MGF1 = 0x0007,
        KEYEDHASH = 0x0008,
        XOR = 0x000a,
        SHA256 = 0x000b,
        SHA384 = 0x000c,
        SHA512 = 0x000d,
        NULL = 0x0010,
        SM3_256 = 0x0012,
        SM4 = 0x0013,
        RSASSA = 0x0014,
        RSAES = 0x0015,
        RSAPSS = 0x0016,
        OAEP = 0x0017,
        ECDSA = 0x0018,
        ECDH = 0x0019,
        ECDAA = 0x001a,
        SM2 = 0x001b,
        ECSCHNORR = 0x001c,
        ECMQV = 0x001d,
        KDF1_SP800_56A = 0x0020,
        KDF2 = 0x0021,
        KDF1_SP800_108 = 0x0022,
        ECC = 0x0023,
        SYMCIPHER = 0x0025,
        CAMELLIA = 0x0026,
        SHA3_256 = 0x0027,
        SHA3_384 = 0x0028,
        SHA3_512 = 0x0029,
        CTR = 0x0040,
        OFB = 0x0041,
        CBC = 0x0042,
        CFB = 0x0043,
        ECB = 0x0044,
    }
}

impl AlgId {
    /// The digest size of a hash algorithm. `TPM_ALG_NULL` has an empty
    /// digest; non-hash algorithms have none.
    pub fn digest_size(self) -> Option<usize> {
        let size = match self {
            AlgId::SHA1 => 20,
            AlgId::SHA256 | AlgId::SM3_256 | AlgId::SHA3_256 => 32,
            AlgId::SHA384 | AlgId::SHA3_384 => 48,
            AlgId::SHA512 | AlgId::SHA3_512 => 64,
            AlgId::NULL => 0,
            _ => return None,
        };
        Some(size)
    }
}

tpm_enum! {
    /// `TPM_ST`
    ///
    /// See Table 19, Section 6.9, "Trusted Platform Module Library Part 2: Structures", revision 1.38.
    pub enum StructureTag: u16 {
        RSP_COMMAND = 0x00c4,
        NULL = 0x8000,
        /// A command or response with no attached sessions. Failed commands
        /// always respond with this tag.
        NO_SESSIONS = 0x8001,
        /// A command or response with one or more attached sessions.
        SESSIONS = 0x8002,
        ATTEST_NV = 0x8014,
        ATTEST_COMMAND_AUDIT = 0x8015,
        ATTEST_SESSION_AUDIT = 0x8016,
        ATTEST_CERTIFY = 0x8017,
        ATTEST_QUOTE = 0x8018,
        ATTEST_TIME = 0x8019,
        ATTEST_CREATION = 0x801a,
        ATTEST_NV_DIGEST = 0x801c,
        CREATION = 0x8021,
        VERIFIED = 0x8022,
        AUTH_SECRET = 0x8023,
        HASHCHECK = 0x8024,
        AUTH_SIGNED = 0x8025,
        FU_MANIFEST = 0x8029,
    }
}

tpm_enum! {
    /// `TPM_CC`, for the commands this crate defines parameters for.
    pub enum CommandCode: u32 {
        NV_UNDEFINE_SPACE = 0x0000_0122,
        NV_DEFINE_SPACE = 0x0000_012a,
        CREATE_PRIMARY = 0x0000_0131,
        NV_WRITE = 0x0000_0137,
        SELF_TEST = 0x0000_0143,
        STARTUP = 0x0000_0144,
        SHUTDOWN = 0x0000_0145,
        NV_READ = 0x0000_014e,
        QUOTE = 0x0000_0158,
        FLUSH_CONTEXT = 0x0000_0165,
        NV_READ_PUBLIC = 0x0000_0169,
        READ_PUBLIC = 0x0000_0173,
        GET_CAPABILITY = 0x0000_017a,
        GET_RANDOM = 0x0000_017b,
        PCR_READ = 0x0000_017e,
    }
}

const FLAG_FMT1: u32 = 0x0080;
const FLAG_VER1: u32 = 0x0100;
const FLAG_WARN: u32 = 0x0800 + FLAG_VER1;

tpm_enum! {
    /// `TPM_RC`
    ///
    /// See Table 16, Section 6.6, "Trusted Platform Module Library Part 2: Structures", revision 1.38.
    pub enum ResponseCode: u32 {
        SUCCESS = 0x000,
        /// The given handle value is not valid or cannot be used for this
        /// command.
        VALUE = FLAG_FMT1 + 0x004,
        /// Hierarchy is not enabled or is not correct for the use.
        HIERARCHY = FLAG_FMT1 + 0x005,
        /// The handle is not correct for the use.
        HANDLE = FLAG_FMT1 + 0x00b,
        /// The authorization HMAC check failed.
        AUTH_FAIL = FLAG_FMT1 + 0x00e,
        /// Structure is the wrong size.
        SIZE = FLAG_FMT1 + 0x015,
        /// The TPM was unable to unmarshal a value because there were not
        /// enough bytes in the input buffer.
        INSUFFICIENT = FLAG_FMT1 + 0x01a,
        INTEGRITY = FLAG_FMT1 + 0x01f,
        INITIALIZE = FLAG_VER1,
        /// TPM is in failure mode.
        FAILURE = FLAG_VER1 + 0x001,
        AUTH_CONTEXT = FLAG_VER1 + 0x045,
        /// The NV index is used before being initialized or the state saved
        /// by `TPM2_Shutdown` could not be restored.
        NV_UNINITIALIZED = FLAG_VER1 + 0x04a,
        SENSITIVE = FLAG_VER1 + 0x055,
        CONTEXT_GAP = FLAG_WARN + 0x001,
        OBJECT_MEMORY = FLAG_WARN + 0x002,
        SESSION_MEMORY = FLAG_WARN + 0x003,
        MEMORY = FLAG_WARN + 0x004,
        SESSION_HANDLES = FLAG_WARN + 0x005,
        OBJECT_HANDLES = FLAG_WARN + 0x006,
        /// The TPM has suspended operation on the command. Forward progress
        /// was made and the command may be retried.
        YIELDED = FLAG_WARN + 0x008,
        CANCELED = FLAG_WARN + 0x009,
        /// TPM is performing self tests.
        TESTING = FLAG_WARN + 0x00a,
        NV_RATE = FLAG_WARN + 0x020,
        LOCKOUT = FLAG_WARN + 0x021,
        RETRY = FLAG_WARN + 0x022,
        NV_UNAVAILABLE = FLAG_WARN + 0x023,
    }
}

impl ResponseCode {
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Whether the code is a warning, which means the command may succeed if
    /// retried.
    pub fn is_warning(self) -> bool {
        self.0 & FLAG_FMT1 == 0 && self.0 & FLAG_WARN == FLAG_WARN
    }
}

tpm_enum! {
    /// `TPM_SU`
    pub enum StartupType: u16 {
        CLEAR = 0x0000,
        STATE = 0x0001,
    }
}

tpm_enum! {
    /// `TPM_ECC_CURVE`
    pub enum EccCurve: u16 {
        NONE = 0x0000,
        NIST_P192 = 0x0001,
        NIST_P224 = 0x0002,
        NIST_P256 = 0x0003,
        NIST_P384 = 0x0004,
        NIST_P521 = 0x0005,
        BN_P256 = 0x0010,
        BN_P638 = 0x0011,
        SM2_P256 = 0x0020,
    }
}

pub const TPM20_HT_NV_INDEX: u8 = 0x01;
pub const TPM20_HT_HMAC_SESSION: u8 = 0x02;
pub const TPM20_HT_POLICY_SESSION: u8 = 0x03;
pub const TPM20_HT_PERMANENT: u8 = 0x40;
pub const TPM20_HT_TRANSIENT: u8 = 0x80;
pub const TPM20_HT_PERSISTENT: u8 = 0x81;

tpm_enum! {
    /// `TPM_HANDLE`, with the permanent handles as named values.
    pub enum TpmHandle: u32 {
        RH_OWNER = 0x4000_0001,
        RH_NULL = 0x4000_0007,
        // `TPM_RS_PW` (not `TPM_RH_PW`)
        // See Table 28, Section 7.4, "Trusted Platform Module Library Part 2: Structures", revision 1.38.
        RS_PW = 0x4000_0009,
        RH_LOCKOUT = 0x4000_000a,
        RH_ENDORSEMENT = 0x4000_000b,
        RH_PLATFORM = 0x4000_000c,
        RH_PLATFORM_NV = 0x4000_000d,
    }
}

impl TpmHandle {
    /// Builds a handle from its type (`TPM_HT`) and offset.
    pub const fn new(kind: u8, offset: u32) -> TpmHandle {
        TpmHandle((kind as u32) << 24 | offset)
    }

    /// The handle type (`TPM_HT`), from the top byte.
    pub const fn kind(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

// Based on Section 2.2, "Registry of Reserved TPM 2.0 Handles and Localities", version 1.1.
pub const NV_INDEX_RANGE_BASE_PLATFORM_MANUFACTURER: u32 =
    (TPM20_HT_NV_INDEX as u32) << 24 | 0x400000;
pub const NV_INDEX_RANGE_BASE_TCG_ASSIGNED: u32 = (TPM20_HT_NV_INDEX as u32) << 24 | 0xc00000;

/// `TPM_GENERATED_VALUE`, the magic that starts every `TPMS_ATTEST`.
pub const TPM_GENERATED_VALUE: u32 = 0xff54_4347;
