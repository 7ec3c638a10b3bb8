//! CLI subcommand implementations.

pub mod backend;
pub mod migrate;

/// Read the first of `keys` that is set and not blank.
fn first_env(keys: &[&'static str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}
