use env_logger::{Builder, Env};
use log::LevelFilter;

/// Installs `env_logger` for the `lemmings` binary.
///
/// A `RUST_LOG` filter in the environment is used verbatim, so
/// `RUST_LOG=lemmings_system_behavior=debug` narrows output to skill
/// transitions. Without it the filter falls back to `debug` under `--verbose`
/// and to `info` otherwise, which shows level start, restart and nuke.
pub(crate) fn init(verbose: bool) {
    let fallback = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let env = Env::default().default_filter_or(fallback.as_str());

    // A logger installed earlier in the process keeps precedence.
    let _ = Builder::from_env(env).format_timestamp(None).try_init();
}
