// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! TPM 2.0 structures, as defined in "Trusted Platform Module Library Part 2:
//! Structures".
//!
//! Names follow the TPM ones with the prefix kept as a type-name prefix, so
//! `TPM2B_DIGEST` is [`Tpm2bDigest`] and `TPMT_PUBLIC` is [`TpmtPublic`].

mod attest;
mod attributes;
mod buffers;
mod constants;
mod nv;
mod pcr;
mod public;
mod scheme;
mod signature;

pub use attest::*;
pub use attributes::*;
pub use buffers::*;
pub use constants::*;
pub use nv::*;
pub use pcr::*;
pub use public::*;
pub use scheme::*;
pub use signature::*;
