//! Processing of deployment descriptor files.
//!
//! A descriptor file is a JSON array of actions. Every `"deployment"` action
//! gets its constructor placeholders resolved, its init code built, and a
//! vanity salt mined unless it already carries a contract address. The
//! resulting address is bound under the action's name so that later actions,
//! in the same file or in files processed afterwards, can refer to it.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy_primitives::{Address, B256, keccak256};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    artifact::ArtifactSource,
    directory::AddressDirectory,
    error::PlanError,
    mine::{Create2Miner, MineConfig, Miner, derive_address},
    resolve::resolve_arguments,
};

/// Action type that is planned; everything else is passed through.
pub(crate) const DEPLOYMENT: &str = "deployment";

/// One entry of a descriptor file.
///
/// Missing and `null` fields read as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DeploymentAction {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub(crate) kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub(crate) name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub(crate) artifact: String,
    #[serde(deserialize_with = "null_as_default")]
    pub(crate) constructor_arguments: Vec<Value>,
    /// Constructor arguments with placeholders resolved, as handed to the
    /// encoder. Written back for verification tooling.
    #[serde(deserialize_with = "null_as_default")]
    pub(crate) parsed_arguments: Vec<Value>,
    /// Desired hex prefix of the contract address.
    #[serde(deserialize_with = "null_as_default")]
    pub(crate) leading: String,
    #[serde(deserialize_with = "null_as_default")]
    pub(crate) salt: String,
    #[serde(deserialize_with = "null_as_default")]
    pub(crate) contract_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) deployments: Option<Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Outcome of a run over a descriptor tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TreeReport {
    pub(crate) processed: usize,
    pub(crate) failed: usize,
}

/// Plans deployment actions in order, accumulating their addresses.
#[derive(Debug)]
pub(crate) struct Planner<S> {
    artifacts: S,
    config: MineConfig,
    directory: AddressDirectory,
}

impl<S: ArtifactSource> Planner<S> {
    pub(crate) fn new(artifacts: S, config: MineConfig, directory: AddressDirectory) -> Self {
        Self {
            artifacts,
            config,
            directory,
        }
    }

    pub(crate) fn directory(&self) -> &AddressDirectory {
        &self.directory
    }

    /// Plans one action and binds its address under its name.
    ///
    /// An action that already has a contract address is not mined again. A
    /// name already bound to another address fails the action.
    pub(crate) fn process_action(&mut self, action: &mut DeploymentAction) -> Result<(), PlanError> {
        action.parsed_arguments = resolve_arguments(&self.directory, action);

        let artifact = self.artifacts.load(&action.artifact)?;
        let init_code = artifact.init_code(&action.parsed_arguments)?;
        let init_code_hash = keccak256(&init_code);

        if action.contract_address.is_empty() {
            let (salt, address) =
                Create2Miner::new(init_code_hash).mine(&action.leading, &self.config)?;
            action.salt = salt.to_string();
            action.contract_address = address.to_checksum(None);
            info!(name = %action.name, %salt, %address, "mined contract address");
        } else {
            debug!(name = %action.name, address = %action.contract_address, "address already set");
        }

        let address = Address::from_str(&action.contract_address).map_err(|_| {
            PlanError::InvalidAddress {
                name: action.name.clone(),
                value: action.contract_address.clone(),
            }
        })?;

        if let Ok(salt) = B256::from_str(&action.salt) {
            let derived = derive_address(init_code_hash, salt);
            if derived != address {
                warn!(name = %action.name, recorded = %address, %derived, "salt does not derive the recorded address");
            }
        }

        self.directory.insert(action.name.clone(), address)
    }

    /// Plans every deployment action of one descriptor file and rewrites it.
    ///
    /// The file is only written once every action succeeded, so a failure
    /// leaves it untouched. Returns the number of deployment actions.
    pub(crate) fn process_file(&mut self, path: &Path) -> Result<usize, PlanError> {
        let content = fs::read_to_string(path).map_err(PlanError::io(path))?;
        let mut entries: Vec<Value> = serde_json::from_str(&content)?;

        let mut planned = 0;
        for entry in &mut entries {
            if entry.get("type").and_then(Value::as_str) != Some(DEPLOYMENT) {
                continue;
            }

            let mut action: DeploymentAction = serde_json::from_value(entry.clone())?;
            self.process_action(&mut action)?;
            planned += 1;

            if let Some(fields) = entry.as_object_mut() {
                fields.insert("parsedArguments".to_owned(), Value::Array(action.parsed_arguments));
                fields.insert("salt".to_owned(), Value::String(action.salt));
                fields.insert("contractAddress".to_owned(), Value::String(action.contract_address));
            }
        }

        let mut rendered = serde_json::to_string_pretty(&entries)?;
        rendered.push('\n');
        fs::write(path, rendered).map_err(PlanError::io(path))?;
        Ok(planned)
    }

    /// Processes every file below `root` in path order.
    ///
    /// A file that fails is reported and skipped; only a failure to walk the
    /// tree aborts the run.
    pub(crate) fn process_tree(&mut self, root: &Path) -> Result<TreeReport, PlanError> {
        let mut report = TreeReport::default();

        for path in collect_files(root)? {
            match self.process_file(&path) {
                Ok(planned) => {
                    report.processed += 1;
                    info!(path = %path.display(), planned, "processed descriptor file");
                }
                Err(err) => {
                    report.failed += 1;
                    error!(path = %path.display(), %err, "failed to process descriptor file");
                }
            }
        }
        Ok(report)
    }
}

/// All regular files below `root`, sorted by path.
pub(crate) fn collect_files(root: &Path) -> Result<Vec<PathBuf>, PlanError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).map_err(PlanError::io(&dir))? {
            let path = entry.map_err(PlanError::io(&dir))?.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }

    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    Ok(files)
}
