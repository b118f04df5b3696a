//! Logger set-up for the binary and the tests.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Default filter: this crate at `level`, every dependency at `warn`.
fn default_filter(level: LevelFilter) -> String {
    format!("warn,{}={level}", env!("CARGO_CRATE_NAME"))
}

/// Installs the global logger.
///
/// With `verbose` the wall-run integrator's per-substep trace output is
/// shown; otherwise only info and above. `RUST_LOG` overrides either
/// default. Calling this again after a logger is installed does nothing.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter(level)));
    builder.format_timestamp_millis();
    if builder.try_init().is_err() {
        log::debug!("logger already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn init_is_idempotent() {
        init(false);
        init(true);
    }

    #[rstest]
    #[case(LevelFilter::Info, "warn,wallrun=INFO")]
    #[case(LevelFilter::Trace, "warn,wallrun=TRACE")]
    fn default_filter_scopes_level_to_this_crate(#[case] level: LevelFilter, #[case] expected: &str) {
        assert_eq!(default_filter(level), expected);
    }
}
