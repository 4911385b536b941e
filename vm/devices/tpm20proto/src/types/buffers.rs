// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `TPM2B_*` byte buffers.
//!
//! Maximum sizes are those of a TPM supporting SHA-512 and 4096-bit RSA keys.

use crate::tpm2b_buffer;

/// The size of the largest digest (SHA-512).
pub const MAX_DIGEST_SIZE: usize = 64;

// The suggested minimal size for the buffer in `TPM2B_MAX_BUFFER`.
// See Table 79, Section 10.4.8, "Trusted Platform Module Library Part 2: Structures", revision 1.38.
pub const MAX_DIGEST_BUFFER_SIZE: usize = 1024;

pub const MAX_NV_BUFFER_SIZE: usize = 2048;
pub const MAX_RSA_KEY_BYTES: usize = 512;
pub const MAX_ECC_KEY_BYTES: usize = 128;

tpm2b_buffer! {
    /// `TPM2B_DIGEST`
    pub struct Tpm2bDigest[MAX_DIGEST_SIZE];
}

tpm2b_buffer! {
    /// `TPM2B_DATA`
    pub struct Tpm2bData[MAX_DIGEST_SIZE + 2];
}

tpm2b_buffer! {
    /// `TPM2B_NONCE`
    pub struct Tpm2bNonce[MAX_DIGEST_SIZE];
}

tpm2b_buffer! {
    /// `TPM2B_AUTH`
    pub struct Tpm2bAuth[MAX_DIGEST_SIZE];
}

tpm2b_buffer! {
    /// `TPM2B_NAME`: a hash algorithm followed by a digest, or a bare handle.
    pub struct Tpm2bName[MAX_DIGEST_SIZE + 2];
}

tpm2b_buffer! {
    /// `TPM2B_MAX_BUFFER`
    pub struct Tpm2bMaxBuffer[MAX_DIGEST_BUFFER_SIZE];
}

tpm2b_buffer! {
    /// `TPM2B_MAX_NV_BUFFER`
    pub struct Tpm2bMaxNvBuffer[MAX_NV_BUFFER_SIZE];
}

tpm2b_buffer! {
    /// `TPM2B_PUBLIC_KEY_RSA`, also the body of an RSA signature.
    pub struct Tpm2bPublicKeyRsa[MAX_RSA_KEY_BYTES];
}

tpm2b_buffer! {
    /// `TPM2B_ECC_PARAMETER`
    pub struct Tpm2bEccParameter[MAX_ECC_KEY_BYTES];
}

tpm2b_buffer! {
    /// `TPM2B_SENSITIVE_DATA`
    pub struct Tpm2bSensitiveData[256];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::Marshal;

    #[test]
    fn digest_limits() {
        assert!(Tpm2bDigest::new(&[0; 64]).is_ok());
        let err = Tpm2bDigest::new(&[0; 65]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::SizeTooLarge { size: 65, max: 64 });
    }

    #[test]
    fn empty_buffer_is_two_zero_bytes() {
        assert_eq!(Tpm2bAuth::default().encode_to_bytes().unwrap(), [0, 0]);
    }

    #[test]
    fn nv_buffer_round_trip() {
        let data = Tpm2bMaxNvBuffer::new(&[1; 128]).unwrap();
        let bytes = data.encode_to_bytes().unwrap();
        assert_eq!(&bytes[..2], &[0x00, 0x80]);
        assert_eq!(Tpm2bMaxNvBuffer::decode_from_bytes(&bytes).unwrap(), data);
    }
}
