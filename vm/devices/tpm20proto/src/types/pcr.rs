// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! PCR selections and digest lists.

use super::AlgId;
use super::Tpm2bDigest;
use crate::cursor::Reader;
use crate::cursor::Width;
use crate::cursor::Writer;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::error::Result;
use crate::error::ResultExt;
use crate::marshal::Marshal;
use crate::wire::TpmList;

/// The largest `sizeofSelect`, enough for 32 PCRs.
pub const PCR_SELECT_MAX: usize = 4;

/// The number of bytes of bitmap needed for the 24 PCRs of a PC client TPM.
pub const PCR_SELECT_MIN: usize = 3;

/// `TPMS_PCR_SELECTION`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TpmsPcrSelection {
    pub hash: AlgId,
    /// `pcrSelect`, one bit per PCR, with a 1-byte size on the wire.
    pub select: Vec<u8>,
}

impl TpmsPcrSelection {
    /// Selects `pcrs` in a bank, using the smallest bitmap a PC client TPM
    /// accepts.
    pub fn new(hash: AlgId, pcrs: &[u32]) -> Result<Self> {
        let mut select = vec![0u8; PCR_SELECT_MIN];
        for &pcr in pcrs {
            let byte = (pcr / 8) as usize;
            if byte >= PCR_SELECT_MAX {
                return Err(ErrorKind::InvalidValue {
                    what: "PCR index",
                    value: pcr,
                }
                .into());
            }
            if byte >= select.len() {
                select.resize(byte + 1, 0);
            }
            select[byte] |= 1 << (pcr % 8);
        }
        Ok(Self { hash, select })
    }

    /// The selected PCR indices, in ascending order.
    pub fn pcrs(&self) -> impl Iterator<Item = u32> + '_ {
        self.select.iter().enumerate().flat_map(|(i, &byte)| {
            (0..8)
                .filter(move |&bit| byte & (1 << bit) != 0)
                .map(move |bit| i as u32 * 8 + bit)
        })
    }
}

impl Marshal for TpmsPcrSelection {
    fn encode(&self, w: &mut Writer) -> Result<()> {
        self.hash.encode(w)?;
        if self.select.len() > PCR_SELECT_MAX {
            return Err(Error::new(ErrorKind::SizeTooLarge {
                size: self.select.len(),
                max: PCR_SELECT_MAX,
            })
            .typed::<Self>());
        }
        w.write_count(self.select.len(), Width::U8)?;
        w.write_bytes(&self.select);
        Ok(())
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self> {
        let hash = AlgId::decode(r).typed::<Self>()?;
        let size = r.read_count(Width::U8).typed::<Self>()?;
        if size > PCR_SELECT_MAX {
            return Err(Error::new(ErrorKind::SizeTooLarge {
                size,
                max: PCR_SELECT_MAX,
            })
            .typed::<Self>());
        }
        let select = r.read_bytes(size).typed::<Self>()?.to_vec();
        Ok(Self { hash, select })
    }
}

/// `TPML_PCR_SELECTION`, one selection per hash bank.
pub type TpmlPcrSelection = TpmList<TpmsPcrSelection, 16>;

/// `TPML_DIGEST`
pub type TpmlDigest = TpmList<Tpm2bDigest, 8>;
