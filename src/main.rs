mod artifact;
mod canonical;
mod cli;
mod directory;
mod error;
mod keys;
mod logging;
mod mine;
mod pipeline;
mod resolve;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use {
    artifact::ArtifactStore,
    cli::VanityPlan,
    directory::AddressDirectory,
    error::PlanError,
    pipeline::{Planner, TreeReport},
};

/// Entry point for the vanity-plan tool.
///
/// Loads `.env`, binds the deployer, operator and owner addresses, then
/// mines a vanity salt for every deployment in the descriptor tree and
/// writes the results back in place. With `--encrypt` it only prints the
/// encrypted form of the given key.
///
/// # Error
///
/// Exits non-zero if key material is unusable, the descriptor tree cannot be
/// read, or any descriptor file failed.
fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = VanityPlan::parse();
    cli.log.init();

    if let Some(private_key) = &cli.encrypt {
        return match encrypt(&cli, private_key) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!(%err, "encryption failed");
                ExitCode::FAILURE
            }
        };
    }

    match run(&cli) {
        Ok(report) if report.failed == 0 => {
            info!(files = report.processed, "all descriptor files planned");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            error!(processed = report.processed, failed = report.failed, "some descriptor files failed");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(%err, "planning aborted");
            ExitCode::FAILURE
        }
    }
}

/// Prints the `OWNER_KEY` ciphertext for `private_key`.
fn encrypt(cli: &VanityPlan, private_key: &str) -> Result<(), PlanError> {
    let owner = keys::address_from_private_key(private_key)?;
    let ciphertext = keys::encrypt_private_key(private_key, &cli.passphrase, &cli.iv)?;
    info!(%owner, "encrypted owner key");
    println!("{ciphertext}");
    Ok(())
}

fn run(cli: &VanityPlan) -> Result<TreeReport, PlanError> {
    let deployer_key = cli.deployer_key.as_deref().unwrap_or_default();
    let operator_key = cli.operator_key.as_deref().unwrap_or_default();
    let owner_key = cli.owner_key.as_deref().unwrap_or_default();

    let mut directory = AddressDirectory::default();
    directory.insert("DEPLOYER", keys::address_from_private_key(deployer_key)?)?;
    directory.insert("OPERATOR", keys::address_from_private_key(operator_key)?)?;

    let owner_key = keys::decrypt_private_key(owner_key, &cli.passphrase, &cli.iv)?;
    directory.insert("OWNER", keys::address_from_private_key(&owner_key)?)?;
    info!(bound = directory.len(), "key addresses bound");

    let mut planner = Planner::new(ArtifactStore::new(&cli.artifacts), cli.mine_config(), directory);
    let report = planner.process_tree(&cli.deployments)?;
    info!(bound = planner.directory().len(), "addresses bound after planning");
    Ok(report)
}
