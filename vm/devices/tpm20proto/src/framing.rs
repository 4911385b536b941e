// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Command and response framing: the header, handle area and authorization
//! area around a command's parameters.
//!
//! See Section 18, "Trusted Platform Module Library Part 1: Architecture",
//! revision 1.38.

use crate::commands::TpmCommand;
use crate::commands::TpmResponse;
use crate::cursor::Reader;
use crate::cursor::Width;
use crate::cursor::Writer;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::error::Result;
use crate::error::ResultExt;
use crate::marshal::Marshal;
use crate::tpm_struct;
use crate::types::CommandCode;
use crate::types::ResponseCode;
use crate::types::StructureTag;
use crate::types::Tpm2bAuth;
use crate::types::Tpm2bNonce;
use crate::types::TpmHandle;
use crate::types::TpmaSession;

tpm_struct! {
    /// The header of every command.
    #[derive(Copy)]
    pub struct CommandHeader {
        pub tag: StructureTag,
        /// The size of the whole command, header included.
        pub size: u32,
        pub command_code: CommandCode,
    }
}

tpm_struct! {
    /// The header of every response.
    #[derive(Copy)]
    pub struct ResponseHeader {
        pub tag: StructureTag,
        /// The size of the whole response, header included.
        pub size: u32,
        pub response_code: ResponseCode,
    }
}

/// The size of [`CommandHeader`] and [`ResponseHeader`] on the wire.
pub const HEADER_SIZE: usize = 10;

tpm_struct! {
    /// `TPMS_AUTH_COMMAND`
    pub struct TpmsAuthCommand {
        pub session_handle: TpmHandle,
        pub nonce: Tpm2bNonce,
        pub session_attributes: TpmaSession,
        pub hmac: Tpm2bAuth,
    }
}

impl TpmsAuthCommand {
    /// A password session (`TPM_RS_PW`) carrying `auth` in the clear.
    pub fn password(auth: &[u8]) -> Result<Self> {
        Ok(Self {
            session_handle: TpmHandle::RS_PW,
            nonce: Tpm2bNonce::default(),
            session_attributes: TpmaSession::new(),
            hmac: Tpm2bAuth::new(auth)?,
        })
    }
}

tpm_struct! {
    /// `TPMS_AUTH_RESPONSE`
    pub struct TpmsAuthResponse {
        pub nonce: Tpm2bNonce,
        pub session_attributes: TpmaSession,
        pub hmac: Tpm2bAuth,
    }
}

/// Error returned by [`decode_response`].
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("response header declares {size} bytes but {actual} were received, command succeeded: {command_succeeded}")]
    HeaderSizeMismatch {
        size: u32,
        actual: usize,
        command_succeeded: bool,
    },
    #[error("unexpected session tag {tag:?} in the response header, expected {expected:?}, command succeeded: {command_succeeded}")]
    SessionTagMismatch {
        tag: StructureTag,
        expected: StructureTag,
        command_succeeded: bool,
    },
    #[error("command failed with response code {code:?}")]
    Command { code: ResponseCode },
    #[error("failed to decode the response")]
    Decode(#[from] Error),
}

/// Encodes a complete command: header, handle area, authorization area and
/// parameters.
///
/// The command is tagged `TPM_ST_SESSIONS` when `auths` is non-empty and
/// `TPM_ST_NO_SESSIONS` otherwise.
pub fn encode_command<C: TpmCommand>(
    cmd: &C,
    handles: &[TpmHandle],
    auths: &[TpmsAuthCommand],
) -> Result<Vec<u8>> {
    if handles.len() != C::HANDLES {
        return Err(Error::new(ErrorKind::InvalidValue {
            what: "handle count",
            value: handles.len() as u32,
        })
        .typed::<C>());
    }

    let mut body = Writer::new();
    for handle in handles {
        handle.encode(&mut body)?;
    }
    let tag = if auths.is_empty() {
        StructureTag::NO_SESSIONS
    } else {
        body.write_prefixed(Width::U32, |w| {
            auths.iter().try_for_each(|auth| auth.encode(w))
        })?;
        StructureTag::SESSIONS
    };
    cmd.encode(&mut body)?;

    let size = HEADER_SIZE + body.position();
    let header = CommandHeader {
        tag,
        size: u32::try_from(size).map_err(|_| {
            Error::new(ErrorKind::SizeTooLarge {
                size,
                max: u32::MAX as usize,
            })
        })?,
        command_code: C::CODE,
    };

    let mut w = Writer::new();
    header.encode(&mut w)?;
    w.write_bytes(body.as_bytes());
    tracing::trace!(command = ?C::CODE, size, "encoded command");
    Ok(w.into_bytes())
}

/// A decoded successful response.
#[derive(Debug)]
pub struct Response<R> {
    pub header: ResponseHeader,
    pub handles: Vec<TpmHandle>,
    pub parameters: R,
    pub auths: Vec<TpmsAuthResponse>,
}

/// Decodes the response to command `C`.
///
/// `sessions` is whether the command was sent with an authorization area; a
/// successful response carries the same session tag as its command. A failed
/// command always responds with `TPM_ST_NO_SESSIONS` and just the header
/// (see Section 6, "Trusted Platform Module Library Part 3: Commands",
/// revision 1.38), which is returned as [`ResponseError::Command`].
pub fn decode_response<C: TpmCommand>(
    bytes: &[u8],
    sessions: bool,
) -> std::result::Result<Response<C::Response>, ResponseError> {
    let mut r = Reader::new(bytes);
    let header = ResponseHeader::decode(&mut r)?;
    let command_succeeded = header.response_code.is_success();

    let (expected_tag, expected_size) = if !command_succeeded {
        (StructureTag::NO_SESSIONS, HEADER_SIZE)
    } else if sessions {
        (StructureTag::SESSIONS, bytes.len())
    } else {
        (StructureTag::NO_SESSIONS, bytes.len())
    };

    if header.tag != expected_tag {
        return Err(ResponseError::SessionTagMismatch {
            tag: header.tag,
            expected: expected_tag,
            command_succeeded,
        });
    }
    if header.size as usize != expected_size || expected_size != bytes.len() {
        return Err(ResponseError::HeaderSizeMismatch {
            size: header.size,
            actual: bytes.len(),
            command_succeeded,
        });
    }
    if !command_succeeded {
        tracing::debug!(
            command = ?C::CODE,
            response_code = ?header.response_code,
            "command failed"
        );
        return Err(ResponseError::Command {
            code: header.response_code,
        });
    }

    let handles = (0..<C::Response as TpmResponse>::HANDLES)
        .map(|_| TpmHandle::decode(&mut r))
        .collect::<Result<Vec<_>>>()?;

    let (parameters, auths) = if sessions {
        // `parameterSize` covers the parameters but not the authorization
        // area after them.
        let parameters = r
            .read_prefixed(Width::U32, C::Response::decode)
            .typed::<C::Response>()?;
        let mut auths = Vec::new();
        while r.remaining() > 0 {
            auths.push(TpmsAuthResponse::decode(&mut r)?);
        }
        (parameters, auths)
    } else {
        (C::Response::decode(&mut r)?, Vec::new())
    };
    r.finish()?;

    Ok(Response {
        header,
        handles,
        parameters,
        auths,
    })
}
