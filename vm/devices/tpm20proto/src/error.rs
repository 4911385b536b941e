// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for marshaling and unmarshaling TPM structures.

use std::fmt;
use thiserror::Error;

/// The cause of a marshaling failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("buffer underrun: needed {needed} bytes, {remaining} remaining")]
    BufferUnderrun { needed: usize, remaining: usize },
    #[error("{remaining} trailing bytes after a complete structure")]
    TrailingData { remaining: usize },
    #[error("sized structure declared {declared} bytes but consumed {consumed}")]
    SizedRegionMismatch { declared: usize, consumed: usize },
    #[error("no variant of {union} for selector {selector:#x}")]
    UnknownUnionSelector { union: &'static str, selector: u32 },
    #[error("value {value:#x} does not fit in {width} bytes")]
    ValueTooWide { value: u64, width: usize },
    #[error("size {size} exceeds the maximum of {max}")]
    SizeTooLarge { size: usize, max: usize },
    #[error("invalid {what} value {value:#x}")]
    InvalidValue { what: &'static str, value: u32 },
    #[error("sized structures nested deeper than {max}")]
    RegionDepthExceeded { max: usize },
    #[error("sized structure closed without being opened")]
    UnbalancedRegion,
}

/// A marshaling error.
///
/// Carries the [`ErrorKind`] that caused it, plus the names of the structures
/// the error propagated through, innermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error(Box<ErrorInner>);

#[derive(Debug, Clone, PartialEq, Eq)]
struct ErrorInner {
    types: Vec<&'static str>,
    kind: ErrorKind,
}

impl Error {
    /// Creates a new error.
    pub fn new(kind: ErrorKind) -> Self {
        Self(Box::new(ErrorInner {
            types: Vec::new(),
            kind,
        }))
    }

    /// Returns a new error with an additional type context added.
    pub fn typed<T>(mut self) -> Self {
        let name = std::any::type_name::<T>();
        // Unions and wrappers re-tag on the way out; keep one entry per level.
        if self.0.types.last() != Some(&name) {
            self.0.types.push(name);
        }
        self
    }

    /// The underlying cause.
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }

    /// The structures the error propagated through, innermost first.
    pub fn types(&self) -> &[&'static str] {
        &self.0.types
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(&ty) = self.0.types.last() {
            write!(f, "marshaling failed in {}", ty)?;
            for &ty in self.0.types.iter().rev().skip(1) {
                write!(f, "/{}", ty)?;
            }
            Ok(())
        } else {
            write!(f, "marshaling failed")
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0.kind)
    }
}

/// Extension trait to add type context to [`Error`].
pub trait ResultExt {
    /// Add type `T`'s name to the error.
    fn typed<T>(self) -> Self;
}

impl<T> ResultExt for Result<T> {
    fn typed<U>(self) -> Self {
        self.map_err(Error::typed::<U>)
    }
}

/// A marshaling result.
pub type Result<T> = std::result::Result<T, Error>;
