//! Environment variable sources.
//!
//! - `PROMPTSYNC__SECTION__KEY` for any config key (`__` separates nesting)
//! - `REPO_OWNER`, `REPO_NAME`, `REPO_PATH` as shorthands for the remote target

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Plain variables mapped onto remote target keys.
pub const TARGET_VARIABLES: [(&str, &str); 3] = [
    ("REPO_OWNER", "remote.owner"),
    ("REPO_NAME", "remote.repo"),
    ("REPO_PATH", "remote.path"),
];

/// Add environment variable overlay to builder.
/// Uses PROMPTSYNC prefix and __ as separator for nested keys.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("PROMPTSYNC")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    add_target_variables(builder, |name| std::env::var(name).ok())
}

/// Overlay the plain target variables using `lookup` to read them.
pub fn add_target_variables<F>(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: F,
) -> Result<ConfigBuilder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (variable, key) in TARGET_VARIABLES {
        let value = lookup(variable).filter(|v| !v.trim().is_empty());
        builder = builder.set_override_option(key, value)?;
    }
    Ok(builder)
}
