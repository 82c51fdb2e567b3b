pub mod assertions;
pub mod callback;
pub mod changeset;
pub mod cli;
pub mod config;
pub mod detect;
pub mod diagnostics;
pub mod error;
pub mod modifiers;
pub mod provider;
pub mod rules;
pub mod scope;
pub mod span;
pub mod syntax;
pub mod transform;

pub use config::TransformOptions;
pub use transform::{TransformOutput, transform_source, transform_tree};

/// Environment variable holding the log filter for the binary.
pub const LOG_ENV: &str = "AVA_TO_JEST_LOG";

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Installs the stderr log subscriber; filter from [`LOG_ENV`], `warn` when unset.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
