use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use alloy_primitives::{Address, B256, address};
use rand::{Rng, SeedableRng, rng, rngs::StdRng};
use rayon::{
    ThreadPoolBuilder,
    prelude::{IntoParallelIterator, ParallelIterator},
};
use tracing::debug;

use crate::error::MineError;

/// The ImmutableCreate2Factory, deployed at the same address on every
/// supported network.
pub(crate) const IMMUTABLE_CREATE2_FACTORY: Address =
    address!("0x0000000000FFe8B47B3e2130213B802212439497");

/// Number of concurrent workers in a round.
pub(crate) const DEFAULT_WORKERS: usize = 16;

/// Salts each worker tries before the round is abandoned.
pub(crate) const DEFAULT_ATTEMPTS_PER_ROUND: u64 = 100_000;

/// The salt keeps its first 20 bytes zero; the remaining 12 are random.
const SALT_RANDOM_OFFSET: usize = 20;

/// Hex digits in an address.
const ADDRESS_DIGITS: usize = 40;

/// Length of the progress prefix reported while the full prefix is searched.
const PREVIEW_DIGITS: usize = 5;

/// How often a worker looks at the cancellation token and the deadline.
const INTERRUPT_CHECK_INTERVAL: u64 = 1024;

/// Shared flag that stops a running search.
#[derive(Debug, Clone, Default)]
pub(crate) struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[cfg(test)]
    pub(crate) fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Tuning for a salt search.
#[derive(Debug, Clone)]
pub(crate) struct MineConfig {
    /// Width of the worker pool.
    pub(crate) workers: usize,
    /// Attempts per worker before a round is restarted.
    pub(crate) attempts_per_round: u64,
    /// Seed for a reproducible random source; OS entropy when unset.
    pub(crate) seed: Option<u64>,
    /// Wall-clock limit for one search.
    pub(crate) timeout: Option<Duration>,
    pub(crate) cancel: CancelToken,
}

impl Default for MineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            attempts_per_round: DEFAULT_ATTEMPTS_PER_ROUND,
            seed: None,
            timeout: None,
            cancel: CancelToken::default(),
        }
    }
}

impl MineConfig {
    /// Random source for one worker of one round.
    fn worker_rng(&self, round: u64, worker: usize) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ (round << 32) ^ worker as u64),
            None => StdRng::from_rng(&mut rng()),
        }
    }

    fn interrupted(&self, started: Instant) -> bool {
        self.cancel.is_cancelled() || self.timeout.is_some_and(|limit| started.elapsed() >= limit)
    }
}

/// Leading hex digits an address must carry, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Prefix {
    nibbles: Vec<u8>,
}

impl Prefix {
    /// Parses a hex prefix, with or without `0x`.
    pub(crate) fn parse(text: &str) -> Result<Self, MineError> {
        let digits = text.trim();
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);
        let nibbles = digits
            .chars()
            .map(|digit| digit.to_digit(16).map(|value| value as u8))
            .collect::<Option<Vec<_>>>()
            .filter(|nibbles| nibbles.len() <= ADDRESS_DIGITS)
            .ok_or_else(|| MineError::InvalidPrefix(text.to_owned()))?;
        Ok(Self { nibbles })
    }

    pub(crate) fn matches(&self, address: &Address) -> bool {
        Self::starts_with(address, &self.nibbles)
    }

    /// Whether `address` carries the first few digits of a longer prefix.
    fn previews(&self, address: &Address) -> bool {
        self.nibbles.len() > PREVIEW_DIGITS
            && Self::starts_with(address, &self.nibbles[..PREVIEW_DIGITS])
    }

    fn starts_with(address: &Address, nibbles: &[u8]) -> bool {
        nibbles.iter().enumerate().all(|(index, nibble)| {
            let byte = address.as_slice()[index / 2];
            let digit = if index % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            digit == *nibble
        })
    }
}

/// Defines the interface for address mining algorithms.
///
/// Implementations must be thread-safe to enable parallel mining.
pub(crate) trait Miner: Sync {
    /// Calculates the contract address that would result from deploying with the given salt.
    fn compute_address(&self, salt: &B256) -> Address;

    /// Searches for a salt whose address starts with `prefix`.
    ///
    /// Each round starts `config.workers` workers on a dedicated pool. A
    /// worker draws salts whose first 20 bytes are zero and last 12 random,
    /// for at most `config.attempts_per_round` tries. The first match stops
    /// its siblings and wins; when every worker runs dry, a new round starts.
    /// Only cancellation or the timeout ends a search without a match.
    fn mine(&self, prefix: &str, config: &MineConfig) -> Result<(B256, Address), MineError> {
        let prefix = Prefix::parse(prefix)?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers.max(1))
            .build()?;
        let started = Instant::now();

        for round in 0u64.. {
            if config.interrupted(started) {
                break;
            }

            // Set by the first worker that finds a match.
            let found = AtomicBool::new(false);

            let mining_result = pool.install(|| {
                (0..config.workers.max(1))
                    .into_par_iter()
                    .find_map_any(|worker| {
                        let mut rng = config.worker_rng(round, worker);
                        self.scan(&mut rng, &prefix, config, &found, started)
                    })
            });

            if let Some(found) = mining_result {
                return Ok(found);
            }
            debug!(round, "round exhausted without a match");
        }

        Err(MineError::Cancelled)
    }

    /// One worker's share of a round.
    fn scan(
        &self,
        rng: &mut StdRng,
        prefix: &Prefix,
        config: &MineConfig,
        found: &AtomicBool,
        started: Instant,
    ) -> Option<(B256, Address)> {
        let mut salt = B256::ZERO;

        for attempt in 0..config.attempts_per_round {
            if found.load(Ordering::Relaxed) {
                return None;
            }
            if attempt % INTERRUPT_CHECK_INTERVAL == 0 && config.interrupted(started) {
                return None;
            }

            rng.fill(&mut salt[SALT_RANDOM_OFFSET..]);
            let candidate = self.compute_address(&salt);

            if prefix.previews(&candidate) {
                debug!(%salt, address = %candidate, "preview match");
            }
            if prefix.matches(&candidate) {
                found.store(true, Ordering::Relaxed);
                return Some((salt, candidate));
            }
        }
        None
    }
}

/// CREATE2 address for `salt` and `init_code_hash` under the
/// ImmutableCreate2Factory:
/// `keccak256(0xff ++ factory ++ salt ++ init_code_hash)[12..]`.
pub(crate) fn derive_address(init_code_hash: B256, salt: B256) -> Address {
    IMMUTABLE_CREATE2_FACTORY.create2(salt, init_code_hash)
}

/// Mines vanity addresses for contracts deployed through a CREATE2 factory.
///
/// The 32-byte salt is structured as follows:
/// - Bytes 0-19: zero
/// - Bytes 20-31: random values drawn per attempt
#[derive(Debug, Clone, Copy)]
pub(crate) struct Create2Miner {
    /// Address of the factory contract that will perform the CREATE2 deployment
    factory: Address,
    /// Keccak256 hash of the contract's initialization bytecode
    init_code_hash: B256,
}

impl Create2Miner {
    /// Creates a miner for the ImmutableCreate2Factory.
    pub(crate) fn new(init_code_hash: B256) -> Self {
        Self::with_factory(IMMUTABLE_CREATE2_FACTORY, init_code_hash)
    }

    pub(crate) fn with_factory(factory: Address, init_code_hash: B256) -> Self {
        Self {
            factory,
            init_code_hash,
        }
    }
}

impl Miner for Create2Miner {
    fn compute_address(&self, salt: &B256) -> Address {
        self.factory.create2(*salt, self.init_code_hash)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU64;

    use alloy_primitives::{b256, keccak256};

    use super::*;

    fn seeded(seed: u64) -> MineConfig {
        MineConfig {
            workers: 4,
            seed: Some(seed),
            ..Default::default()
        }
    }

    fn assert_salt_shape(salt: &B256) {
        assert!(salt[..SALT_RANDOM_OFFSET].iter().all(|byte| *byte == 0));
    }

    /// Returns a matching address only after `after` calls.
    struct Countdown {
        calls: AtomicU64,
        after: u64,
    }

    impl Miner for Countdown {
        fn compute_address(&self, _salt: &B256) -> Address {
            if self.calls.fetch_add(1, Ordering::Relaxed) >= self.after {
                Address::repeat_byte(0xaa)
            } else {
                Address::ZERO
            }
        }
    }

    #[test]
    fn test_create2_matches_eip1014_vectors() {
        let cases = [
            (Address::ZERO, B256::ZERO, &[0x00u8][..], address!("0x4D1A2e2bB4F88F0250f26Ffff098B0b30B26BF38")),
            (
                address!("0xdeadbeef00000000000000000000000000000000"),
                B256::ZERO,
                &[0x00u8][..],
                address!("0xB928f69Bb1D91Cd65274e3c79d8986362984fDA3"),
            ),
            (
                address!("0xdeadbeef00000000000000000000000000000000"),
                b256!("0x000000000000000000000000feed000000000000000000000000000000000000"),
                &[0x00u8][..],
                address!("0xD04116cDd17beBE565EB2422F2497E06cC1C9833"),
            ),
            (
                Address::ZERO,
                B256::ZERO,
                &[0xdeu8, 0xad, 0xbe, 0xef][..],
                address!("0x70f2b2914A2a4b783FaEFb75f459A580616Fcb5e"),
            ),
        ];
        for (factory, salt, init_code, expected) in cases {
            let miner = Create2Miner::with_factory(factory, keccak256(init_code));
            assert_eq!(miner.compute_address(&salt), expected);
        }
    }

    #[test]
    fn test_derive_address_is_deterministic() {
        let init_code_hash = keccak256([0x60u8, 0x80]);
        let salt = B256::with_last_byte(7);
        let address = derive_address(init_code_hash, salt);

        assert_eq!(derive_address(init_code_hash, salt), address);
        assert_eq!(Create2Miner::new(init_code_hash).compute_address(&salt), address);
        assert_ne!(derive_address(init_code_hash, B256::with_last_byte(8)), address);
        assert_ne!(derive_address(keccak256([0x60u8, 0x81]), salt), address);
        assert_ne!(
            Create2Miner::with_factory(Address::ZERO, init_code_hash).compute_address(&salt),
            address
        );
    }

    #[test]
    fn test_prefix_parsing() {
        assert_eq!(Prefix::parse("0xAB").unwrap(), Prefix::parse("ab").unwrap());
        assert!(Prefix::parse("").unwrap().matches(&Address::ZERO));
        assert!(matches!(Prefix::parse("xyz"), Err(MineError::InvalidPrefix(_))));
        assert!(matches!(Prefix::parse(&"1".repeat(41)), Err(MineError::InvalidPrefix(_))));

        let address = address!("0x8888065406a0c0938a9857e6c79bf8aa6a1d8152");
        assert!(Prefix::parse("8888").unwrap().matches(&address));
        assert!(Prefix::parse("88880654").unwrap().matches(&address));
        assert!(Prefix::parse("8888065406a0c0938a9857e6c79bf8aa6a1d8152").unwrap().matches(&address));
        assert!(!Prefix::parse("8889").unwrap().matches(&address));
        assert!(Prefix::parse("888806ff").unwrap().previews(&address));
        assert!(!Prefix::parse("8888").unwrap().previews(&address));
    }

    #[test]
    fn test_mine_one_digit_prefix_with_seed() {
        let miner = Create2Miner::new(keccak256([0x60u8, 0x80, 0x60, 0x40]));
        for prefix in ["a", "F", "0x0"] {
            let (salt, address) = miner.mine(prefix, &seeded(42)).unwrap();
            assert_salt_shape(&salt);
            assert_eq!(miner.compute_address(&salt), address);
            assert!(Prefix::parse(prefix).unwrap().matches(&address));
            assert!(address.to_string().to_lowercase()[2..].starts_with(&prefix.to_lowercase().replace("0x", "")));
        }
    }

    #[test]
    fn test_mine_empty_prefix_returns_first_candidate() {
        let miner = Countdown {
            calls: AtomicU64::new(0),
            after: u64::MAX,
        };
        let (salt, address) = miner.mine("", &seeded(1)).unwrap();
        assert_salt_shape(&salt);
        assert_eq!(address, Address::ZERO);
        assert!(miner.calls.load(Ordering::Relaxed) <= 4);
    }

    #[test]
    fn test_mine_restarts_rounds_until_match() {
        let miner = Countdown {
            calls: AtomicU64::new(0),
            after: 100,
        };
        let config = MineConfig {
            workers: 2,
            attempts_per_round: 10,
            ..seeded(7)
        };
        let (salt, address) = miner.mine("aa", &config).unwrap();
        assert_salt_shape(&salt);
        assert_eq!(address, Address::repeat_byte(0xaa));
        assert!(miner.calls.load(Ordering::Relaxed) > 100);
    }

    #[test]
    fn test_mine_stops_when_cancelled() {
        let miner = Countdown {
            calls: AtomicU64::new(0),
            after: u64::MAX,
        };
        let config = seeded(3);
        config.cancel.cancel();
        assert!(matches!(miner.mine("aa", &config), Err(MineError::Cancelled)));
        assert_eq!(miner.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_mine_stops_at_timeout() {
        let miner = Countdown {
            calls: AtomicU64::new(0),
            after: u64::MAX,
        };
        let config = MineConfig {
            attempts_per_round: 1_000,
            timeout: Some(Duration::from_millis(50)),
            ..seeded(5)
        };
        assert!(matches!(miner.mine("aa", &config), Err(MineError::Cancelled)));
    }

    #[test]
    fn test_mine_rejects_invalid_prefix() {
        let miner = Create2Miner::new(B256::ZERO);
        assert!(matches!(miner.mine("0xzz", &MineConfig::default()), Err(MineError::InvalidPrefix(_))));
    }
}
