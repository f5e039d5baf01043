//! Dependency-manager selection from lockfile presence

use devscaffold_presets::{CommandLine, LockfilePresence};
use serde::Serialize;

/// The toolchain that governs the project's dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerKind {
    Yarn,
    Npm,
    /// No lockfile; a human has to pick a manager
    Unmanaged,
}

impl ManagerKind {
    /// Select the manager. A yarn lockfile wins when both are present.
    pub fn select(lockfiles: LockfilePresence) -> Self {
        if lockfiles.yarn_lock {
            Self::Yarn
        } else if lockfiles.npm_lock {
            Self::Npm
        } else {
            Self::Unmanaged
        }
    }

    /// Command that adds `tokens` as dev dependencies.
    ///
    /// Returns `None` for [`ManagerKind::Unmanaged`].
    pub fn install_command(self, tokens: &[String]) -> Option<CommandLine> {
        let command = match self {
            Self::Yarn => CommandLine::new("yarn").args(["add", "--dev"]),
            Self::Npm => CommandLine::new("npm").args(["install", "--save-dev"]),
            Self::Unmanaged => return None,
        };
        Some(command.args(tokens.iter().cloned()))
    }

    /// Command that installs the manifest's dependencies inside the DDEV container.
    pub fn container_follow_up(self) -> Option<CommandLine> {
        match self {
            Self::Yarn => Some(CommandLine::new("ddev").args(["exec", "yarn"])),
            Self::Npm => Some(CommandLine::new("ddev").args(["npm", "install"])),
            Self::Unmanaged => None,
        }
    }
}

impl std::fmt::Display for ManagerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yarn => write!(f, "yarn"),
            Self::Npm => write!(f, "npm"),
            Self::Unmanaged => write!(f, "unmanaged"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(false, false, ManagerKind::Unmanaged)]
    #[case(false, true, ManagerKind::Npm)]
    #[case(true, false, ManagerKind::Yarn)]
    #[case(true, true, ManagerKind::Yarn)]
    fn selection_truth_table(#[case] yarn_lock: bool, #[case] npm_lock: bool, #[case] expected: ManagerKind) {
        let lockfiles = LockfilePresence { yarn_lock, npm_lock };
        assert_eq!(ManagerKind::select(lockfiles), expected);
    }

    #[test]
    fn yarn_install_command() {
        let tokens = vec!["nightwatch".to_string(), "nightwatch-accessibility".to_string()];
        let command = ManagerKind::Yarn.install_command(&tokens).unwrap();
        assert_eq!(command.to_string(), "yarn add --dev nightwatch nightwatch-accessibility");
    }

    #[test]
    fn npm_install_command() {
        let tokens = vec!["nightwatch".to_string()];
        let command = ManagerKind::Npm.install_command(&tokens).unwrap();
        assert_eq!(command.tokens(), vec!["npm", "install", "--save-dev", "nightwatch"]);
    }

    #[test]
    fn unmanaged_has_no_commands() {
        assert!(ManagerKind::Unmanaged.install_command(&[]).is_none());
        assert!(ManagerKind::Unmanaged.container_follow_up().is_none());
    }

    #[rstest]
    #[case(ManagerKind::Yarn, "ddev exec yarn")]
    #[case(ManagerKind::Npm, "ddev npm install")]
    fn container_follow_ups(#[case] manager: ManagerKind, #[case] expected: &str) {
        assert_eq!(manager.container_follow_up().unwrap().to_string(), expected);
    }

    proptest! {
        #[test]
        fn selection_is_deterministic(yarn_lock: bool, npm_lock: bool) {
            let lockfiles = LockfilePresence { yarn_lock, npm_lock };
            let first = ManagerKind::select(lockfiles);
            prop_assert_eq!(first, ManagerKind::select(lockfiles));
            prop_assert_eq!(first == ManagerKind::Yarn, yarn_lock);
        }
    }
}
