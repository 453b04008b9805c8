//! Diagnostic logging setup.
//!
//! The dispatcher logs through `tracing`. Library hosts that install their own
//! subscriber get those events directly. Hosts that reach the dispatcher only
//! through the C surface can opt in with `VPL_DISPATCH_LOG` (an `EnvFilter`
//! directive such as `vpl_dispatch_runtime=debug`) and pick JSON output with
//! `VPL_DISPATCH_LOG_FORMAT=json`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "VPL_DISPATCH_LOG";
pub const LOG_FORMAT_ENV: &str = "VPL_DISPATCH_LOG_FORMAT";

/// Install a fmt subscriber if `VPL_DISPATCH_LOG` is set.
///
/// Returns `true` if this call installed the global subscriber. Does nothing
/// when the variable is absent or malformed, or when a subscriber already
/// exists.
pub fn init_logging() -> bool {
    let Ok(directives) = std::env::var(LOG_ENV) else {
        return false;
    };
    let Ok(filter) = EnvFilter::try_new(directives) else {
        return false;
    };

    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let installed = if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    };
    installed.is_ok()
}
