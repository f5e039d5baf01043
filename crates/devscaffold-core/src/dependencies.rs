//! Required dependencies and gap analysis

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

/// One externally required package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencySpec {
    /// Package identifier as it appears in the manifest
    pub name: String,
    /// Argument handed to the manager's install command
    pub resolution_token: String,
    /// Always true for test tooling
    pub dev: bool,
}

impl DependencySpec {
    /// A dev dependency whose resolution token is its own name.
    pub fn dev(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            resolution_token: name.clone(),
            name,
            dev: true,
        }
    }

    /// A dev dependency installed from a pinned token such as a VCS reference.
    pub fn dev_pinned(name: impl Into<String>, resolution_token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolution_token: resolution_token.into(),
            dev: true,
        }
    }
}

/// The Nightwatch test toolchain the scaffold depends on.
pub fn nightwatch_toolchain() -> Vec<DependencySpec> {
    vec![
        DependencySpec::dev_pinned(
            "@lullabot/nightwatch-drupal-commands",
            "@lullabot/nightwatch-drupal-commands@https://github.com/Lullabot/nightwatch-drupal-commands.git#main",
        ),
        DependencySpec::dev("nightwatch"),
        DependencySpec::dev("nightwatch-accessibility"),
    ]
}

/// The entries of `required` whose name is not in `declared`.
///
/// Order follows `required`; a name listed twice in `required` is
/// returned once.
pub fn missing(required: &[DependencySpec], declared: &BTreeSet<String>) -> Vec<DependencySpec> {
    let mut seen = HashSet::new();
    required
        .iter()
        .filter(|dep| !declared.contains(&dep.name))
        .filter(|dep| seen.insert(dep.name.as_str()))
        .cloned()
        .collect()
}

/// Resolution tokens of `deps`, in order.
pub fn resolution_tokens(deps: &[DependencySpec]) -> Vec<String> {
    deps.iter().map(|dep| dep.resolution_token.clone()).collect()
}
