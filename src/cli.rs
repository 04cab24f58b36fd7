use std::{path::PathBuf, time::Duration};

use crate::{
    artifact::DEFAULT_ARTIFACTS_ROOT,
    logging::LogArgs,
    mine::{CancelToken, DEFAULT_ATTEMPTS_PER_ROUND, DEFAULT_WORKERS, MineConfig},
};

/// Command-line interface for the vanity-plan tool.
///
/// Mines CREATE2 salts for every deployment in a descriptor tree so that each
/// contract lands on an address with the requested hex prefix, and writes the
/// salts and addresses back into the descriptors.
#[derive(Clone, Debug, clap::Parser)]
#[command(
    name = "vanity-plan",
    about = "Precomputes vanity CREATE2 addresses for a multi-contract deployment plan."
)]
pub(super) struct VanityPlan {
    /// Passphrase that decrypts the owner key.
    pub(super) passphrase: String,

    /// Private key of the deployer, bound to `<DEPLOYER>`.
    #[arg(long, env = "DEPLOYER_KEY", hide_env_values = true, required_unless_present = "encrypt")]
    pub(super) deployer_key: Option<String>,

    /// Private key of the operator, bound to `<OPERATOR>`.
    #[arg(long, env = "OPERATOR_KEY", hide_env_values = true, required_unless_present = "encrypt")]
    pub(super) operator_key: Option<String>,

    /// Encrypted private key of the owner, bound to `<OWNER>`.
    #[arg(long, env = "OWNER_KEY", hide_env_values = true, required_unless_present = "encrypt")]
    pub(super) owner_key: Option<String>,

    /// Hex initialization vector the owner key was encrypted with.
    #[arg(long, env = "IV", hide_env_values = true)]
    pub(super) iv: String,

    /// Encrypt this private key with the passphrase and IV, print the
    /// ciphertext to use as `OWNER_KEY`, and exit without planning.
    #[arg(long, value_name = "PRIVATE_KEY")]
    pub(super) encrypt: Option<String>,

    /// Directory holding the deployment descriptor files.
    #[arg(long, default_value = "deployments")]
    pub(super) deployments: PathBuf,

    /// Root of the compiled contract artifacts.
    #[arg(long, default_value = DEFAULT_ARTIFACTS_ROOT)]
    pub(super) artifacts: PathBuf,

    /// Number of concurrent mining workers.
    #[arg(long, default_value_t = DEFAULT_WORKERS, value_parser = parse_workers)]
    pub(super) workers: usize,

    /// Salts each worker tries before a mining round restarts.
    #[arg(long, default_value_t = DEFAULT_ATTEMPTS_PER_ROUND)]
    pub(super) attempts: u64,

    /// Give up on a single contract after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub(super) timeout: Option<u64>,

    /// Seed the salt generator for reproducible runs.
    #[arg(long)]
    pub(super) seed: Option<u64>,

    #[command(flatten)]
    pub(super) log: LogArgs,
}

impl VanityPlan {
    pub(super) fn mine_config(&self) -> MineConfig {
        MineConfig {
            workers: self.workers,
            attempts_per_round: self.attempts,
            seed: self.seed,
            timeout: self.timeout.map(Duration::from_secs),
            cancel: CancelToken::default(),
        }
    }
}

fn parse_workers(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("at least one worker is required".to_owned()),
        Ok(workers) => Ok(workers),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    const REQUIRED: [&str; 10] = [
        "vanity-plan",
        "secret",
        "--deployer-key",
        "0x01",
        "--operator-key",
        "0x02",
        "--owner-key",
        "00",
        "--iv",
        "00",
    ];

    #[test]
    fn test_defaults_match_mining_defaults() {
        let cli = VanityPlan::try_parse_from(REQUIRED).unwrap();
        assert_eq!(cli.passphrase, "secret");
        assert_eq!(cli.deployments, PathBuf::from("deployments"));
        assert_eq!(cli.artifacts, PathBuf::from(DEFAULT_ARTIFACTS_ROOT));

        let config = cli.mine_config();
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.attempts_per_round, DEFAULT_ATTEMPTS_PER_ROUND);
        assert_eq!(config.timeout, None);
        assert!(!config.cancel.is_cancelled());
    }

    #[test]
    fn test_parses_mining_options() {
        let args = REQUIRED
            .iter()
            .copied()
            .chain(["--workers", "2", "--attempts", "10", "--timeout", "30", "--seed", "9", "-vv"]);
        let cli = VanityPlan::try_parse_from(args).unwrap();
        let config = cli.mine_config();
        assert_eq!(config.workers, 2);
        assert_eq!(config.attempts_per_round, 10);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.seed, Some(9));
        assert_eq!(cli.log.verbose, 2);
    }

    #[test]
    fn test_rejects_zero_workers() {
        let args = REQUIRED.iter().copied().chain(["--workers", "0"]);
        assert!(VanityPlan::try_parse_from(args).is_err());
    }

    #[test]
    fn test_encrypt_mode_needs_only_passphrase_and_iv() {
        let cli = VanityPlan::try_parse_from(["vanity-plan", "secret", "--iv", "00", "--encrypt", "0x01"]).unwrap();
        assert_eq!(cli.encrypt.as_deref(), Some("0x01"));
        assert_eq!(cli.owner_key, None);

        assert!(VanityPlan::try_parse_from(["vanity-plan", "secret", "--iv", "00"]).is_err());
    }
}
