// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bookkeeping for length-prefixed (`TPM2B_*`) sub-structures.

use crate::error::Error;
use crate::error::ErrorKind;
use crate::error::Result;

/// An open sized region: the offset its content starts at and the number of
/// bytes its length prefix declared.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SizedRegion {
    pub start: usize,
    pub declared: usize,
}

impl SizedRegion {
    /// The offset one past the last byte of the region.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.declared)
    }

    fn consumed(&self, position: usize) -> usize {
        position.saturating_sub(self.start)
    }
}

/// Tracks nested sized regions during a decode.
///
/// Every region entered must be exited at exactly `start + declared`,
/// otherwise the structure inside it was truncated or overran its prefix.
#[derive(Debug, Clone)]
pub struct SizedRegionTracker {
    stack: Vec<SizedRegion>,
    max_depth: usize,
}

impl SizedRegionTracker {
    /// Creates a tracker that allows at most `max_depth` nested regions.
    pub fn new(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            max_depth,
        }
    }

    /// Opens a region of `declared` bytes starting at `position`.
    pub fn enter(&mut self, position: usize, declared: usize) -> Result<SizedRegion> {
        if self.stack.len() >= self.max_depth {
            return Err(ErrorKind::RegionDepthExceeded {
                max: self.max_depth,
            }
            .into());
        }
        if let Some(outer) = self.innermost() {
            if declared > outer.end().saturating_sub(position) {
                return Err(Self::mismatch(outer, position.saturating_add(declared)));
            }
        }
        if position.checked_add(declared).is_none() {
            return Err(ErrorKind::SizeTooLarge {
                size: declared,
                max: usize::MAX - position,
            }
            .into());
        }
        let region = SizedRegion {
            start: position,
            declared,
        };
        self.stack.push(region);
        Ok(region)
    }

    /// Closes the innermost region, checking that exactly its declared number
    /// of bytes was consumed.
    pub fn exit(&mut self, position: usize) -> Result<()> {
        let region = self
            .stack
            .pop()
            .ok_or_else(|| Error::new(ErrorKind::UnbalancedRegion))?;
        if position != region.end() {
            return Err(Self::mismatch(&region, position));
        }
        Ok(())
    }

    /// The innermost open region.
    pub fn innermost(&self) -> Option<&SizedRegion> {
        self.stack.last()
    }

    /// The number of open regions.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn mismatch(region: &SizedRegion, position: usize) -> Error {
        tracing::trace!(
            start = region.start,
            declared = region.declared,
            position,
            "sized region mismatch"
        );
        Error::new(ErrorKind::SizedRegionMismatch {
            declared: region.declared,
            consumed: region.consumed(position),
        })
    }
}

impl Default for SizedRegionTracker {
    fn default() -> Self {
        Self::new(crate::cursor::DecodeLimits::default().max_region_depth)
    }
}
