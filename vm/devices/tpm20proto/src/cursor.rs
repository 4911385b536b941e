// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Big-endian byte cursors over TPM command and response buffers.

use crate::error::Error;
use crate::error::ErrorKind;
use crate::error::Result;
use crate::region::SizedRegionTracker;
use zerocopy::BigEndian;
use zerocopy::FromBytes;
use zerocopy::IntoBytes;
use zerocopy::U16;
use zerocopy::U32;
use zerocopy::U64;

/// The wire width of a fixed-size unsigned integer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Width {
    U8,
    U16,
    U32,
    U64,
}

impl Width {
    /// The number of bytes the width occupies on the wire.
    pub const fn bytes(self) -> usize {
        match self {
            Width::U8 => 1,
            Width::U16 => 2,
            Width::U32 => 4,
            Width::U64 => 8,
        }
    }

    /// The largest value representable in this width.
    pub const fn max(self) -> u64 {
        u64::MAX >> (64 - 8 * self.bytes())
    }
}

/// Integer types with a fixed wire width.
pub trait FixedWidth {
    const WIDTH: Width;
}

impl FixedWidth for u8 {
    const WIDTH: Width = Width::U8;
}

impl FixedWidth for u16 {
    const WIDTH: Width = Width::U16;
}

impl FixedWidth for u32 {
    const WIDTH: Width = Width::U32;
}

impl FixedWidth for u64 {
    const WIDTH: Width = Width::U64;
}

/// Limits applied while decoding untrusted input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodeLimits {
    /// The maximum nesting of sized sub-structures.
    pub max_region_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_region_depth: 16,
        }
    }
}

/// Appends big-endian encodings to a growable buffer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf
            .extend_from_slice(U16::<BigEndian>::new(value).as_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf
            .extend_from_slice(U32::<BigEndian>::new(value).as_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf
            .extend_from_slice(U64::<BigEndian>::new(value).as_bytes());
    }

    /// Writes `value` in `width` bytes.
    ///
    /// Fails with [`ErrorKind::ValueTooWide`] if `value` does not fit, rather
    /// than truncating it.
    pub fn write_uint(&mut self, value: u64, width: Width) -> Result<()> {
        let too_wide = |_| {
            Error::new(ErrorKind::ValueTooWide {
                value,
                width: width.bytes(),
            })
        };
        match width {
            Width::U8 => self.write_u8(u8::try_from(value).map_err(too_wide)?),
            Width::U16 => self.write_u16(u16::try_from(value).map_err(too_wide)?),
            Width::U32 => self.write_u32(u32::try_from(value).map_err(too_wide)?),
            Width::U64 => self.write_u64(value),
        }
        Ok(())
    }

    /// Writes raw bytes with no prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a 2-byte length followed by `bytes`.
    pub fn write_sized_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_count(bytes.len(), Width::U16)?;
        self.write_bytes(bytes);
        Ok(())
    }

    /// Writes an element or byte count in `width` bytes.
    pub fn write_count(&mut self, count: usize, width: Width) -> Result<()> {
        if count as u64 > width.max() {
            return Err(ErrorKind::SizeTooLarge {
                size: count,
                max: width.max() as usize,
            }
            .into());
        }
        self.write_uint(count as u64, width)
    }

    /// Writes a 2-byte length prefix followed by whatever `f` writes, with
    /// the prefix set to the number of bytes `f` wrote.
    pub fn write_sized(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        self.write_prefixed(Width::U16, f)
    }

    /// Like [`Self::write_sized`], with a prefix of `width` bytes.
    pub fn write_prefixed(
        &mut self,
        width: Width,
        f: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let at = self.buf.len();
        let start = at + width.bytes();
        self.buf.resize(start, 0);
        let r = f(self).and_then(|()| {
            let size = self.buf.len() - start;
            if size as u64 > width.max() {
                return Err(ErrorKind::SizeTooLarge {
                    size,
                    max: width.max() as usize,
                }
                .into());
            }
            let prefix = U64::<BigEndian>::new(size as u64);
            self.buf[at..start].copy_from_slice(&prefix.as_bytes()[8 - width.bytes()..]);
            Ok(())
        });
        if r.is_err() {
            self.buf.truncate(at);
        }
        r
    }

    /// The number of bytes written so far.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads big-endian encodings from a borrowed buffer.
///
/// While a sized region is open, reads are bounded by the region rather than
/// by the end of the buffer.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    regions: SizedRegionTracker,
    limits: DecodeLimits,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_limits(data, DecodeLimits::default())
    }

    pub fn with_limits(data: &'a [u8], limits: DecodeLimits) -> Self {
        Self {
            data,
            pos: 0,
            regions: SizedRegionTracker::new(limits.max_region_depth),
            limits,
        }
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// The offset of the next byte to be read.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The number of unread bytes left in the whole buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The number of open sized regions.
    pub fn region_depth(&self) -> usize {
        self.regions.depth()
    }

    fn check_available(&self, needed: usize) -> Result<()> {
        if let Some(region) = self.regions.innermost() {
            if needed > region.end().saturating_sub(self.pos) {
                return Err(SizedRegionTracker::mismatch(
                    region,
                    self.pos.saturating_add(needed),
                ));
            }
        }
        let remaining = self.remaining();
        if needed > remaining {
            return Err(ErrorKind::BufferUnderrun { needed, remaining }.into());
        }
        Ok(())
    }

    /// Reads `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.check_available(len)?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_be<T: FromBytes>(&mut self) -> Result<T> {
        let needed = size_of::<T>();
        let bytes = self.read_bytes(needed)?;
        T::read_from_bytes(bytes).map_err(|_| {
            Error::new(ErrorKind::BufferUnderrun {
                needed,
                remaining: bytes.len(),
            })
        })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_be::<u8>()
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.read_be::<U16<BigEndian>>()?.get())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read_be::<U32<BigEndian>>()?.get())
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(self.read_be::<U64<BigEndian>>()?.get())
    }

    /// Reads an unsigned integer of `width` bytes.
    pub fn read_uint(&mut self, width: Width) -> Result<u64> {
        Ok(match width {
            Width::U8 => self.read_u8()?.into(),
            Width::U16 => self.read_u16()?.into(),
            Width::U32 => self.read_u32()?.into(),
            Width::U64 => self.read_u64()?,
        })
    }

    /// Reads an element or byte count of `width` bytes.
    pub fn read_count(&mut self, width: Width) -> Result<usize> {
        let value = self.read_uint(width)?;
        usize::try_from(value).map_err(|_| {
            Error::new(ErrorKind::ValueTooWide {
                value,
                width: size_of::<usize>(),
            })
        })
    }

    /// Reads a 2-byte length followed by that many bytes.
    pub fn read_sized_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_count(Width::U16)?;
        self.read_bytes(len)
    }

    /// Opens a sized region of `declared` bytes at the current position.
    pub fn enter_region(&mut self, declared: usize) -> Result<()> {
        self.check_available(declared)?;
        self.regions.enter(self.pos, declared)?;
        Ok(())
    }

    /// Closes the innermost sized region, which must have been consumed
    /// exactly.
    pub fn exit_region(&mut self) -> Result<()> {
        self.regions.exit(self.pos)
    }

    /// Reads a 2-byte length prefix and runs `f` inside a region of that
    /// length.
    pub fn read_sized<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.read_prefixed(Width::U16, f)
    }

    /// Like [`Self::read_sized`], with a prefix of `width` bytes.
    pub fn read_prefixed<T>(
        &mut self,
        width: Width,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let declared = self.read_count(width)?;
        self.enter_region(declared)?;
        let value = f(self)?;
        self.exit_region()?;
        Ok(value)
    }

    /// Checks that a top-level decode consumed the whole buffer.
    pub fn finish(&self) -> Result<()> {
        if self.regions.depth() != 0 {
            return Err(ErrorKind::UnbalancedRegion.into());
        }
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(ErrorKind::TrailingData { remaining }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_integers_big_endian() {
        let mut w = Writer::new();
        w.write_u8(0x01);
        w.write_u16(0x0203);
        w.write_u32(0x04050607);
        w.write_u64(0x08090a0b0c0d0e0f);
        assert_eq!(
            w.as_bytes(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]
        );
    }

    #[test]
    fn write_uint_rejects_values_that_do_not_fit() {
        let mut w = Writer::new();
        w.write_uint(0xff, Width::U8).unwrap();
        let err = w.write_uint(0x100, Width::U8).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::ValueTooWide {
                value: 0x100,
                width: 1
            }
        );
        let err = w.write_uint(0x1_0000_0000, Width::U32).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ValueTooWide { width: 4, .. }));
        assert_eq!(w.as_bytes(), &[0xff]);
    }

    #[test]
    fn sized_bytes() {
        let mut w = Writer::new();
        w.write_sized_bytes(&[0xde, 0xad, 0xbe, 0xef]).unwrap();
        w.write_sized_bytes(&[]).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes, [0x00, 0x04, 0xde, 0xad, 0xbe, 0xef, 0x00, 0x00]);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_sized_bytes().unwrap(), &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(r.read_sized_bytes().unwrap(), &[] as &[u8]);
        r.finish().unwrap();
    }

    #[test]
    fn sized_bytes_too_long() {
        let mut w = Writer::new();
        w.write_sized_bytes(&vec![0; 0xffff]).unwrap();
        let err = w.write_sized_bytes(&vec![0; 0x10000]).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::SizeTooLarge {
                size: 0x10000,
                max: 0xffff
            }
        );
        assert_eq!(w.position(), 0x10001);
    }

    #[test]
    fn write_sized_backfills_length() {
        let mut w = Writer::new();
        w.write_sized(|w| {
            w.write_u32(5);
            w.write_u8(1);
            Ok(())
        })
        .unwrap();
        assert_eq!(w.as_bytes(), &[0, 5, 0, 0, 0, 5, 1]);
    }

    #[test]
    fn write_prefixed_discards_partial_output_on_error() {
        let mut w = Writer::new();
        w.write_u8(7);
        let err = w
            .write_prefixed(Width::U8, |w| {
                w.write_bytes(&[0; 256]);
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::SizeTooLarge { size: 256, .. }));
        assert_eq!(w.as_bytes(), &[7]);
    }

    #[test]
    fn read_past_end_is_underrun() {
        let mut r = Reader::new(&[0, 1, 2]);
        assert_eq!(r.read_u16().unwrap(), 1);
        let err = r.read_u32().unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::BufferUnderrun {
                needed: 4,
                remaining: 1
            }
        );
        // A failed read does not advance.
        assert_eq!(r.position(), 2);
    }

    #[test]
    fn huge_read_lengths_fail() {
        let mut r = Reader::new(&[0, 1, 0xaa]);
        r.read_u8().unwrap();
        let err = r.read_bytes(usize::MAX).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::BufferUnderrun {
                needed: usize::MAX,
                remaining: 2
            }
        );

        let mut r = Reader::new(&[0, 1, 0xaa]);
        r.enter_region(3).unwrap();
        r.read_u8().unwrap();
        let err = r.read_bytes(usize::MAX).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::SizedRegionMismatch {
                declared: 3,
                consumed: usize::MAX
            }
        );
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn read_uint_widths() {
        let data = [1, 0, 2, 0, 0, 0, 3, 0, 0, 0, 0, 0, 0, 0, 4];
        let mut r = Reader::new(&data);
        assert_eq!(r.read_uint(Width::U8).unwrap(), 1);
        assert_eq!(r.read_uint(Width::U16).unwrap(), 2);
        assert_eq!(r.read_uint(Width::U32).unwrap(), 3);
        assert_eq!(r.read_uint(Width::U64).unwrap(), 4);
        r.finish().unwrap();
    }

    #[test]
    fn sized_region_exact() {
        let data = [0, 4, 0, 0, 0, 9];
        let mut r = Reader::new(&data);
        let v = r.read_sized(|r| r.read_u32()).unwrap();
        assert_eq!(v, 9);
        r.finish().unwrap();
    }

    #[test]
    fn sized_region_underconsumed() {
        // Declares 10 bytes, content consumes 8.
        let data = [0, 10, 0, 0, 0, 1, 0, 0, 0, 2, 0xaa, 0xbb];
        let mut r = Reader::new(&data);
        let err = r
            .read_sized(|r| {
                r.read_u32()?;
                r.read_u32()
            })
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::SizedRegionMismatch {
                declared: 10,
                consumed: 8
            }
        );
    }

    #[test]
    fn sized_region_overrun() {
        let data = [0, 2, 0, 0, 0, 1];
        let mut r = Reader::new(&data);
        let err = r.read_sized(|r| r.read_u32()).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::SizedRegionMismatch {
                declared: 2,
                consumed: 4
            }
        );
    }

    #[test]
    fn sized_region_longer_than_buffer() {
        let data = [0, 8, 0, 0];
        let mut r = Reader::new(&data);
        let err = r.read_sized(|r| r.read_u16()).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::BufferUnderrun {
                needed: 8,
                remaining: 2
            }
        );
    }

    #[test]
    fn region_depth_limit() {
        let data = [0, 4, 0, 2, 0, 0];
        let mut r = Reader::with_limits(&data, DecodeLimits { max_region_depth: 1 });
        let err = r
            .read_sized(|r| r.read_sized(|r| r.read_u16()))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::RegionDepthExceeded { max: 1 });
    }

    #[test]
    fn finish_reports_trailing_bytes() {
        let mut r = Reader::new(&[0, 0, 0, 5, 0xaa, 0xbb]);
        r.read_u32().unwrap();
        let err = r.finish().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TrailingData { remaining: 2 });
    }

    #[test]
    fn finish_with_open_region() {
        let mut r = Reader::new(&[0, 0]);
        r.enter_region(0).unwrap();
        assert_eq!(r.region_depth(), 1);
        assert_eq!(r.finish().unwrap_err().kind(), &ErrorKind::UnbalancedRegion);
        r.exit_region().unwrap();
        r.read_u16().unwrap();
        r.finish().unwrap();
    }
}
