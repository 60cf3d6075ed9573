//! Built-in defaults, the lowest-precedence layer.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub const DEFAULT_REMOTE_PATH: &str = "prompt-builder-data.json";
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update from Prompt Builder";

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("remote.path", DEFAULT_REMOTE_PATH)?
        .set_default("remote.api_base", DEFAULT_API_BASE)?
        .set_default("remote.timeout_secs", DEFAULT_TIMEOUT_SECS)?
        .set_default("remote.commit_message", DEFAULT_COMMIT_MESSAGE)
}
