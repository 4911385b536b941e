// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Command line utility to decode TPM 2.0 structures and responses into a
//! human-readable form.

use clap::Args;
use clap::Parser;
use clap::ValueEnum;
use std::fmt::Debug;
use std::path::PathBuf;
use thiserror::Error;
use tpm20proto::commands;
use tpm20proto::commands::TpmCommand;
use tpm20proto::framing::decode_response;
use tpm20proto::framing::ResponseError;
use tpm20proto::registry::UnionRegistry;
use tpm20proto::types;
use tpm20proto::Marshal;
use tpm20proto::Reader;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter.
const LOG_ENV: &str = "TPM20PROTO_LOG";

#[derive(Debug, Error)]
enum Error {
    #[error("input file IO")]
    InputFile(#[source] std::io::Error),
    #[error("input is not valid hex")]
    Hex(#[from] hex::FromHexError),
    #[error("no input given, pass hex bytes or --file")]
    MissingInput,
    #[error("malformed input")]
    Decode(#[from] tpm20proto::Error),
    #[error("malformed response")]
    Response(#[source] ResponseError),
    #[error("the command failed with response code {0:#x}")]
    CommandFailed(u32),
}

impl From<ResponseError> for Error {
    fn from(err: ResponseError) -> Self {
        match err {
            ResponseError::Command { code } => Error::CommandFailed(code.0),
            err => Error::Response(err),
        }
    }
}

/// Exit codes, so scripts can tell malformed input from a failed command.
#[derive(Debug, Clone, Copy)]
#[repr(i32)]
enum ExitCode {
    Error = 1,
    ErrorMalformed = 2,
    ErrorCommandFailed = 3,
}

#[derive(Args)]
struct InputArg {
    /// Input bytes as a hex string
    #[clap(conflicts_with = "file")]
    hex: Option<String>,
    /// Read the raw input bytes from a file instead
    #[clap(short = 'f', long)]
    file: Option<PathBuf>,
}

impl InputArg {
    fn read(self) -> Result<Vec<u8>, Error> {
        let bytes = match (self.hex, self.file) {
            (Some(hex), _) => {
                let hex: String = hex.split_whitespace().collect();
                hex::decode(hex)?
            }
            (None, Some(path)) => fs_err::read(path).map_err(Error::InputFile)?,
            (None, None) => return Err(Error::MissingInput),
        };
        tracing::debug!(len = bytes.len(), "read input");
        Ok(bytes)
    }
}

/// Structures that can be decoded on their own.
#[derive(Copy, Clone, ValueEnum)]
enum Structure {
    /// TPM2B_PUBLIC
    Public,
    /// TPM2B_NV_PUBLIC
    NvPublic,
    /// TPM2B_CREATION_DATA
    CreationData,
    /// TPMS_ATTEST
    Attest,
    /// TPMT_SIGNATURE
    Signature,
    /// TPMT_HA
    Ha,
    /// TPML_PCR_SELECTION
    PcrSelection,
}

/// Commands whose responses can be decoded.
#[derive(Copy, Clone, ValueEnum)]
enum Command {
    GetRandom,
    PcrRead,
    CreatePrimary,
    ReadPublic,
    NvRead,
    NvReadPublic,
    Quote,
}

/// Unions with variants in the built-in registry.
#[derive(Copy, Clone, ValueEnum)]
enum Union {
    Signature,
    SigScheme,
    Attest,
    PublicId,
}

impl Union {
    fn name(self) -> &'static str {
        match self {
            Union::Signature => "TPMU_SIGNATURE",
            Union::SigScheme => "TPMU_SIG_SCHEME",
            Union::Attest => "TPMU_ATTEST",
            Union::PublicId => "TPMU_PUBLIC_ID",
        }
    }
}

#[derive(Parser)]
#[clap(
    name = "tpm20proto_dump",
    about = "Tool to decode TPM 2.0 structures and responses."
)]
enum Options {
    /// Decode a single structure, which must span the whole input.
    Decode {
        structure: Structure,
        #[command(flatten)]
        input: InputArg,
    },
    /// Decode a complete response buffer, header included.
    Response {
        command: Command,
        /// The command was sent with an authorization area
        #[clap(short = 's', long)]
        sessions: bool,
        #[command(flatten)]
        input: InputArg,
    },
    /// Decode the payload of a union variant, without its selector.
    Variant {
        union: Union,
        /// The selector value, decimal or 0x-prefixed hex
        #[clap(value_parser = parse_selector)]
        selector: u32,
        #[command(flatten)]
        input: InputArg,
    },
}

fn parse_selector(s: &str) -> Result<u32, std::num::ParseIntError> {
    match s.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

fn main() {
    let opts = Options::parse();
    let filter = if std::env::var(LOG_ENV).is_ok() {
        EnvFilter::from_env(LOG_ENV)
    } else {
        EnvFilter::default().add_directive(LevelFilter::INFO.into())
    };
    tracing_subscriber::fmt()
        .log_internal_errors(true)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if let Err(e) = do_main(opts) {
        let exit_code = match e {
            Error::Decode(_) | Error::Response(_) | Error::Hex(_) => ExitCode::ErrorMalformed,
            Error::CommandFailed(_) => ExitCode::ErrorCommandFailed,
            _ => ExitCode::Error,
        };

        eprintln!("EXIT CODE: {} ({:?})", exit_code as i32, exit_code);
        eprintln!("ERROR: {}", e);
        let mut error_source = std::error::Error::source(&e);
        while let Some(e2) = error_source {
            eprintln!("- {}", e2);
            error_source = e2.source();
        }

        std::process::exit(exit_code as i32);
    }
}

fn do_main(opts: Options) -> Result<(), Error> {
    match opts {
        Options::Decode { structure, input } => {
            let bytes = input.read()?;
            match structure {
                Structure::Public => dump::<types::Tpm2bPublic>(&bytes),
                Structure::NvPublic => dump::<types::Tpm2bNvPublic>(&bytes),
                Structure::CreationData => dump::<types::Tpm2bCreationData>(&bytes),
                Structure::Attest => dump::<types::TpmsAttest>(&bytes),
                Structure::Signature => dump::<types::TpmtSignature>(&bytes),
                Structure::Ha => dump::<types::TpmtHa>(&bytes),
                Structure::PcrSelection => dump::<types::TpmlPcrSelection>(&bytes),
            }
        }
        Options::Response {
            command,
            sessions,
            input,
        } => {
            let bytes = input.read()?;
            match command {
                Command::GetRandom => dump_response::<commands::GetRandomCmd>(&bytes, sessions),
                Command::PcrRead => dump_response::<commands::PcrReadCmd>(&bytes, sessions),
                Command::CreatePrimary => {
                    dump_response::<commands::CreatePrimaryCmd>(&bytes, sessions)
                }
                Command::ReadPublic => dump_response::<commands::ReadPublicCmd>(&bytes, sessions),
                Command::NvRead => dump_response::<commands::NvReadCmd>(&bytes, sessions),
                Command::NvReadPublic => {
                    dump_response::<commands::NvReadPublicCmd>(&bytes, sessions)
                }
                Command::Quote => dump_response::<commands::QuoteCmd>(&bytes, sessions),
            }
        }
        Options::Variant {
            union,
            selector,
            input,
        } => {
            let bytes = input.read()?;
            let mut r = Reader::new(&bytes);
            let variant = UnionRegistry::global().decode(union.name(), selector, &mut r)?;
            r.finish()?;
            println!(
                "{} {:?} ({})",
                variant.union(),
                variant.selector(),
                variant.value().type_name()
            );
            println!("{:#?}", variant.value());
            Ok(())
        }
    }
}

fn dump<T: Marshal + Debug>(bytes: &[u8]) -> Result<(), Error> {
    let value = T::decode_from_bytes(bytes)?;
    println!("{:#?}", value);
    Ok(())
}

fn dump_response<C: TpmCommand>(bytes: &[u8], sessions: bool) -> Result<(), Error>
where
    C::Response: Debug,
{
    let response = decode_response::<C>(bytes, sessions)?;
    tracing::info!(
        command = ?C::CODE,
        handles = response.handles.len(),
        sessions = response.auths.len(),
        "decoded response"
    );
    println!("{:#?}", response);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors() {
        assert_eq!(parse_selector("0x0014").unwrap(), 0x14);
        assert_eq!(parse_selector("32792").unwrap(), 0x8018);
        assert!(parse_selector("0xzz").is_err());
    }

    #[test]
    fn hex_input_ignores_whitespace() {
        let input = InputArg {
            hex: Some("00 14 000b".into()),
            file: None,
        };
        assert_eq!(input.read().unwrap(), [0x00, 0x14, 0x00, 0x0b]);
    }

    #[test]
    fn missing_input() {
        let input = InputArg {
            hex: None,
            file: None,
        };
        assert!(matches!(input.read(), Err(Error::MissingInput)));
    }

    #[test]
    fn command_failure_is_its_own_error() {
        // TPM_RC_HANDLE for the first handle
        let fail = [0x80, 0x01, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x01, 0x8b];
        let err = dump_response::<commands::ReadPublicCmd>(&fail, false).unwrap_err();
        assert!(matches!(err, Error::CommandFailed(0x18b)));
    }

    #[test]
    fn parse_variant_options() {
        let opts = Options::try_parse_from([
            "tpm20proto_dump",
            "variant",
            "sig-scheme",
            "0x14",
            "000b",
        ])
        .unwrap();
        assert!(matches!(
            opts,
            Options::Variant {
                union: Union::SigScheme,
                selector: 0x14,
                ..
            }
        ));
        do_main(opts).unwrap();
    }
}
