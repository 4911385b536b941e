// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Marshaling and unmarshaling of TPM 2.0 structures.
//!
//! TPM commands and responses are big-endian byte streams of fixed-width
//! integers, length-prefixed (`TPM2B_*`) buffers and sub-structures, counted
//! lists (`TPML_*`), and unions whose variant is chosen by a selector decoded
//! earlier in the stream. Every structure in [`types`] and [`commands`]
//! implements [`Marshal`], the single entry point for both directions:
//!
//! ```
//! use tpm20proto::types::AlgId;
//! use tpm20proto::types::Tpm2bDigest;
//! use tpm20proto::types::TpmtHa;
//! use tpm20proto::Marshal;
//!
//! let digest = Tpm2bDigest::new(&[0xaa; 4]).unwrap();
//! assert_eq!(digest.encode_to_bytes().unwrap(), [0, 4, 0xaa, 0xaa, 0xaa, 0xaa]);
//!
//! let ha = TpmtHa::decode_from_bytes(&[0x00, 0x10]).unwrap();
//! assert_eq!(ha.hash_alg, AlgId::NULL);
//! ```
//!
//! Decoding never trusts the input: every read is bounds checked, every
//! length-prefixed structure must consume exactly its declared size, and a
//! top-level decode fails if bytes are left over.
//!
//! [`framing`] adds the command and response headers, handle areas and
//! authorization areas, for callers exchanging whole buffers with a TPM.

pub mod commands;
mod cursor;
mod enums;
mod error;
pub mod framing;
mod marshal;
pub mod region;
pub mod registry;
pub mod types;
pub mod union;
pub mod wire;

pub use cursor::DecodeLimits;
pub use cursor::FixedWidth;
pub use cursor::Reader;
pub use cursor::Width;
pub use cursor::Writer;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
pub use error::ResultExt;
pub use marshal::Marshal;
pub use union::TpmUnion;
pub use union::TpmsEmpty;
pub use union::UnionSelector;
