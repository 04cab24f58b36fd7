use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

/// Logging flags shared by every invocation.
#[derive(Debug, Clone, Default, clap::Args)]
pub(super) struct LogArgs {
    /// Increase logging verbosity (-v = debug, -vv = trace). Info by default.
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub(super) verbose: u8,

    /// Disable colorful console logging.
    #[arg(long = "log.no-color", visible_aliases = ["log-no-color"], global = true)]
    pub(super) no_color: bool,
}

impl LogArgs {
    /// Installs the global subscriber. `RUST_LOG` takes precedence over `-v`.
    pub(super) fn init(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            let level = match self.verbose {
                0 => Level::INFO,
                1 => Level::DEBUG,
                _ => Level::TRACE,
            };
            EnvFilter::new(format!("vanity_plan={level}"))
        };

        fmt()
            .with_env_filter(filter)
            .with_target(self.verbose > 0)
            .with_writer(std::io::stderr)
            .with_ansi(!self.no_color)
            .init();
    }
}
