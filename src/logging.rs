//! Logging setup for applications embedding the editor.
//!
//! The crates only emit `tracing` events; nothing is printed until the
//! host installs a subscriber. `RUST_LOG` wins over the verbosity count
//! when it is set, e.g. `RUST_LOG=quire_core=debug`.

use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Maps a `-v` count to a level.
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(verbosity: u8) -> Result<(), TryInitError> {
    let default = LevelFilter::from_level(level_for(verbosity));
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true),
        )
        .with(filter)
        .try_init()?;

    tracing::info!("quire v{} logging at {}", env!("CARGO_PKG_VERSION"), default);
    Ok(())
}
