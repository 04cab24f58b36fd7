use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::JsonAbi;
use alloy_primitives::Bytes;
use serde::Deserialize;
use serde_json::Value;

use crate::{canonical::canonicalize, error::ArtifactError};

/// Default location of compiled contract artifacts.
pub(crate) const DEFAULT_ARTIFACTS_ROOT: &str = "artifacts/contracts";

/// A compiled contract: its ABI and creation bytecode.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Artifact {
    pub(crate) abi: JsonAbi,
    pub(crate) bytecode: Bytes,
}

impl Artifact {
    /// Constructor parameter types, in declaration order. Empty when the ABI
    /// declares no constructor.
    pub(crate) fn constructor_types(&self) -> Result<Vec<DynSolType>, ArtifactError> {
        let Some(constructor) = &self.abi.constructor else {
            return Ok(Vec::new());
        };
        constructor
            .inputs
            .iter()
            .map(|param| {
                param.resolve().map_err(|source| ArtifactError::Type {
                    ty: param.ty.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Creation bytecode followed by the ABI-encoded constructor arguments.
    ///
    /// With no constructor parameters this is the bytecode alone.
    pub(crate) fn init_code(&self, arguments: &[Value]) -> Result<Bytes, ArtifactError> {
        let types = self.constructor_types()?;
        let values = canonicalize(&types, arguments)?;

        let mut init_code = self.bytecode.to_vec();
        if !values.is_empty() {
            init_code.extend(DynSolValue::Tuple(values).abi_encode_params());
        }
        Ok(init_code.into())
    }
}

/// Source of artifacts, keyed by the reference used in deployment actions.
pub(crate) trait ArtifactSource {
    fn load(&self, reference: &str) -> Result<Artifact, ArtifactError>;
}

/// Artifacts laid out by the Hardhat compiler: `dir/Name.sol` lives at
/// `<root>/dir/Name.sol/Name.json`.
#[derive(Debug, Clone)]
pub(crate) struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn path_for(&self, reference: &str) -> Result<PathBuf, ArtifactError> {
        let contract = Path::new(reference)
            .file_stem()
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| ArtifactError::InvalidReference(reference.to_owned()))?;

        let mut file_name = contract.to_os_string();
        file_name.push(".json");
        Ok(self.root.join(reference).join(file_name))
    }
}

impl ArtifactSource for ArtifactStore {
    fn load(&self, reference: &str) -> Result<Artifact, ArtifactError> {
        let path = self.path_for(reference)?;
        let content = fs::read_to_string(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ArtifactError::NotFound(reference.to_owned()),
            _ => ArtifactError::Read {
                path: path.clone(),
                source,
            },
        })?;
        serde_json::from_str(&content).map_err(|source| ArtifactError::Parse { path, source })
    }
}
