//! Errors of the outer surfaces: id decoding, configuration and host scripts.
//!
//! Register operations themselves are total and never fail.

use std::io;

use thiserror::Error;

use crate::RegisterId;

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum CfuError {
    #[error("unknown register id {0:#04x}")]
    UnknownRegister(u32),

    #[error("unknown register name `{0}`")]
    UnknownRegisterName(String),

    #[error("unknown op code {0}")]
    UnknownOp(u32),

    #[error("register {0} is not readable")]
    NotReadable(RegisterId),

    #[error("register {0} is not writable")]
    NotWritable(RegisterId),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("file system error: {0}")]
    Fs(#[from] io::Error),
}
