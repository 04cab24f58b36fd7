use std::path::PathBuf;

use alloy_primitives::Address;
use serde_json::Value;

/// Why a single constructor argument could not be turned into an ABI value.
#[derive(Debug, thiserror::Error)]
pub(crate) enum Rejection {
    /// The parameter type needs a hex string.
    #[error("expected a hex string")]
    NotAString,

    /// The string is not valid hex.
    #[error("malformed hex: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),

    /// The decoded byte string has the wrong size.
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    /// The value is not a non-negative integer.
    #[error("not an unsigned integer")]
    NotUnsigned,

    /// The integer does not fit in the parameter width.
    #[error("value does not fit in {bits} bits")]
    OutOfRange { bits: usize },

    /// The ABI encoder refused the value.
    #[error(transparent)]
    Coerce(#[from] alloy_dyn_abi::Error),
}

/// Errors produced while canonicalizing constructor arguments.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ArgumentError {
    /// Fewer arguments were supplied than the constructor declares.
    #[error("missing constructor argument #{index} of type `{ty}`")]
    Missing { index: usize, ty: String },

    /// An argument could not be converted to its declared type.
    #[error("constructor argument #{index} ({value}) is not a valid `{ty}`: {reason}")]
    Invalid {
        index: usize,
        ty: String,
        value: Value,
        reason: Rejection,
    },
}

/// Errors produced while loading an artifact or building init code from it.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ArtifactError {
    /// The artifact reference has no file name to derive the JSON name from.
    #[error("invalid artifact reference {0:?}")]
    InvalidReference(String),

    /// No artifact is known under the reference.
    #[error("artifact {0:?} not found")]
    NotFound(String),

    /// The artifact file could not be read.
    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The artifact file is not a valid `{abi, bytecode}` descriptor.
    #[error("malformed artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A constructor parameter type cannot be parsed.
    #[error("unsupported constructor parameter type `{ty}`: {source}")]
    Type {
        ty: String,
        source: alloy_dyn_abi::Error,
    },

    /// Constructor arguments could not be canonicalized.
    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

/// Errors produced by the salt miner.
#[derive(Debug, thiserror::Error)]
pub(crate) enum MineError {
    /// The desired prefix is not a hex string of at most 40 digits.
    #[error("invalid address prefix {0:?}")]
    InvalidPrefix(String),

    /// The search was cancelled or ran past its deadline.
    #[error("salt search cancelled")]
    Cancelled,

    /// The worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Errors produced while handling key material.
#[derive(Debug, thiserror::Error)]
pub(crate) enum KeyError {
    /// The private key is empty.
    #[error("private key not set")]
    Missing,

    /// A key, IV, or ciphertext is not valid hex.
    #[error("malformed hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// The bytes are not a valid secp256k1 scalar.
    #[error("invalid secp256k1 private key")]
    InvalidKey,

    /// The IV does not have the AES block size.
    #[error("initialization vector must be 16 bytes, got {0}")]
    InvalidIv(usize),

    /// Wrong passphrase or corrupted ciphertext.
    #[error("decryption failed: bad padding")]
    Padding,

    /// The plaintext is not text.
    #[error("decrypted key is not valid UTF-8")]
    NotUtf8,
}

/// Top-level error for a planning run.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PlanError {
    /// Filesystem access failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A descriptor file is not a JSON array of objects.
    #[error("malformed descriptor JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A pre-supplied or computed contract address cannot be parsed.
    #[error("action {name:?} carries a malformed contract address {value:?}")]
    InvalidAddress { name: String, value: String },

    /// A name is already bound to a different address.
    #[error("name {name:?} is already bound to {existing}, refusing {rejected}")]
    NameConflict {
        name: String,
        existing: Address,
        rejected: Address,
    },

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Mine(#[from] MineError),

    #[error(transparent)]
    Key(#[from] KeyError),
}

impl PlanError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
