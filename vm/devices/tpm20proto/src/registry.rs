// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A runtime registry of union variants.
//!
//! The closed enums in [`crate::types`] cover every variant this crate knows
//! about. The registry exists for callers that need to add variants at
//! runtime (vendor algorithms, for example) or that only learn which union
//! they are decoding while running, such as an inspection tool.

use crate::cursor::Reader;
use crate::cursor::Writer;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::error::Result;
use crate::marshal::Marshal;
use crate::types;
use crate::types::AlgId;
use crate::types::StructureTag;
use crate::union::TpmsEmpty;
use crate::union::UnionSelector;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::OnceLock;

/// Object-safe marshaling, implemented for every [`Marshal`] type that can be
/// stored in the registry.
pub trait DynMarshal: Any + Debug + Send + Sync {
    fn encode_dyn(&self, w: &mut Writer) -> Result<()>;

    /// Replaces `self` with a value decoded from `r`.
    fn decode_in_place(&mut self, r: &mut Reader<'_>) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &'static str;
}

impl<T: Marshal + Any + Debug + Send + Sync> DynMarshal for T {
    fn encode_dyn(&self, w: &mut Writer) -> Result<()> {
        self.encode(w)
    }

    fn decode_in_place(&mut self, r: &mut Reader<'_>) -> Result<()> {
        *self = T::decode(r)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

type Constructor = fn() -> Box<dyn DynMarshal>;

struct Entry {
    selector: UnionSelector,
    constructor: Constructor,
}

/// Maps `(union, selector)` pairs to payload types.
pub struct UnionRegistry {
    entries: HashMap<(&'static str, u32), Entry>,
}

impl Debug for UnionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Builds a [`UnionRegistry`].
#[derive(Default)]
pub struct UnionRegistryBuilder {
    entries: HashMap<(&'static str, u32), Entry>,
}

impl Debug for UnionRegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionRegistryBuilder")
            .field("entries", &self.entries.len())
            .finish()
    }
}

fn construct<T: DynMarshal + Default>() -> Box<dyn DynMarshal> {
    Box::new(T::default())
}

impl UnionRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `constructor` as the source of empty payloads for
    /// `selector` in `union`, replacing any previous registration.
    pub fn register(
        mut self,
        union: &'static str,
        selector: impl Into<UnionSelector>,
        constructor: Constructor,
    ) -> Self {
        let selector = selector.into();
        self.entries.insert(
            (union, selector.value()),
            Entry {
                selector,
                constructor,
            },
        );
        self
    }

    /// Registers `T` as the payload for `selector` in `union`.
    pub fn register_type<T: DynMarshal + Default>(
        self,
        union: &'static str,
        selector: impl Into<UnionSelector>,
    ) -> Self {
        self.register(union, selector, construct::<T>)
    }

    /// Adds the variants of the unions this crate defines.
    pub fn with_builtin(self) -> Self {
        const SIGNATURE: &str = "TPMU_SIGNATURE";
        const SIG_SCHEME: &str = "TPMU_SIG_SCHEME";
        const ATTEST: &str = "TPMU_ATTEST";
        const PUBLIC_ID: &str = "TPMU_PUBLIC_ID";

        self.register_type::<types::TpmsSignatureRsa>(SIGNATURE, AlgId::RSASSA)
            .register_type::<types::TpmsSignatureRsa>(SIGNATURE, AlgId::RSAPSS)
            .register_type::<types::TpmsSignatureEcc>(SIGNATURE, AlgId::ECDSA)
            .register_type::<types::TpmsSignatureEcc>(SIGNATURE, AlgId::ECDAA)
            .register_type::<types::TpmsSignatureEcc>(SIGNATURE, AlgId::SM2)
            .register_type::<types::TpmsSignatureEcc>(SIGNATURE, AlgId::ECSCHNORR)
            .register_type::<types::TpmtHa>(SIGNATURE, AlgId::HMAC)
            .register_type::<TpmsEmpty>(SIGNATURE, AlgId::NULL)
            .register_type::<types::TpmsSchemeHash>(SIG_SCHEME, AlgId::RSASSA)
            .register_type::<types::TpmsSchemeHash>(SIG_SCHEME, AlgId::RSAPSS)
            .register_type::<types::TpmsSchemeHash>(SIG_SCHEME, AlgId::ECDSA)
            .register_type::<types::TpmsSchemeEcdaa>(SIG_SCHEME, AlgId::ECDAA)
            .register_type::<types::TpmsSchemeHash>(SIG_SCHEME, AlgId::SM2)
            .register_type::<types::TpmsSchemeHash>(SIG_SCHEME, AlgId::ECSCHNORR)
            .register_type::<types::TpmsSchemeHash>(SIG_SCHEME, AlgId::HMAC)
            .register_type::<TpmsEmpty>(SIG_SCHEME, AlgId::NULL)
            .register_type::<types::TpmsCertifyInfo>(ATTEST, StructureTag::ATTEST_CERTIFY)
            .register_type::<types::TpmsQuoteInfo>(ATTEST, StructureTag::ATTEST_QUOTE)
            .register_type::<types::TpmsSessionAuditInfo>(
                ATTEST,
                StructureTag::ATTEST_SESSION_AUDIT,
            )
            .register_type::<types::TpmsCommandAuditInfo>(
                ATTEST,
                StructureTag::ATTEST_COMMAND_AUDIT,
            )
            .register_type::<types::TpmsTimeAttestInfo>(ATTEST, StructureTag::ATTEST_TIME)
            .register_type::<types::TpmsCreationInfo>(ATTEST, StructureTag::ATTEST_CREATION)
            .register_type::<types::TpmsNvCertifyInfo>(ATTEST, StructureTag::ATTEST_NV)
            .register_type::<types::Tpm2bDigest>(PUBLIC_ID, AlgId::KEYEDHASH)
            .register_type::<types::Tpm2bDigest>(PUBLIC_ID, AlgId::SYMCIPHER)
            .register_type::<types::Tpm2bPublicKeyRsa>(PUBLIC_ID, AlgId::RSA)
            .register_type::<types::TpmsEccPoint>(PUBLIC_ID, AlgId::ECC)
    }

    pub fn build(self) -> UnionRegistry {
        tracing::debug!(entries = self.entries.len(), "union registry built");
        UnionRegistry {
            entries: self.entries,
        }
    }
}

impl UnionRegistry {
    /// The process-wide registry of built-in variants.
    pub fn global() -> &'static UnionRegistry {
        static REGISTRY: OnceLock<UnionRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| UnionRegistryBuilder::new().with_builtin().build())
    }

    fn entry(&self, union: &'static str, selector: u32) -> Result<&Entry> {
        self.entries.get(&(union, selector)).ok_or_else(|| {
            tracing::debug!(union, selector, "no registered union variant");
            Error::new(ErrorKind::UnknownUnionSelector { union, selector })
        })
    }

    /// Whether a payload is registered for `selector` in `union`.
    pub fn contains(&self, union: &'static str, selector: u32) -> bool {
        self.entries.contains_key(&(union, selector))
    }

    /// Creates an empty payload for `selector` in `union`.
    pub fn create(&self, union: &'static str, selector: u32) -> Result<Box<dyn DynMarshal>> {
        Ok((self.entry(union, selector)?.constructor)())
    }

    /// Decodes the payload for `selector` in `union` from `r`.
    pub fn decode(
        &self,
        union: &'static str,
        selector: u32,
        r: &mut Reader<'_>,
    ) -> Result<RegisteredVariant> {
        let entry = self.entry(union, selector)?;
        let mut value = (entry.constructor)();
        value.decode_in_place(r)?;
        Ok(RegisteredVariant {
            union,
            selector: entry.selector,
            value,
        })
    }
}

/// A union payload produced by the registry, along with its selector.
#[derive(Debug)]
pub struct RegisteredVariant {
    union: &'static str,
    selector: UnionSelector,
    value: Box<dyn DynMarshal>,
}

impl RegisteredVariant {
    pub fn union(&self) -> &'static str {
        self.union
    }

    pub fn selector(&self) -> UnionSelector {
        self.selector
    }

    pub fn value(&self) -> &dyn DynMarshal {
        &*self.value
    }

    /// The payload as `T`, if that is its type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref()
    }

    /// Writes the selector followed by the payload.
    pub fn encode(&self, w: &mut Writer) -> Result<()> {
        self.selector.encode(w)?;
        self.value.encode_dyn(w)
    }
}
