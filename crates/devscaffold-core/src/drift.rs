//! Drift detection between an installed artifact and its reference
//!
//! Verdicts are computed fresh on every pass from the bytes handed in; the
//! filesystem is the only source of truth and nothing is cached.

use devscaffold_fs::compute_checksum;
use serde::Serialize;

use crate::catalog::{ArtifactDescriptor, ComparisonStrategy};
use crate::structured::{self, KeyPathMismatch};

/// Which side of a comparison could not be read or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Reference,
    Target,
}

/// Lifecycle of one artifact in the current pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum InstallState {
    /// Target file does not exist
    Absent,
    #[serde(rename = "present-identical")]
    Identical,
    #[serde(rename = "present-drifted")]
    Drifted,
    /// The comparison itself could not be made
    #[serde(rename = "present-unverifiable")]
    Unverifiable { side: Side, reason: String },
}

impl InstallState {
    /// Unverifiable because the reference is broken, which is fatal for a pass.
    pub fn is_reference_failure(&self) -> bool {
        matches!(
            self,
            Self::Unverifiable {
                side: Side::Reference,
                ..
            }
        )
    }
}

/// Verdict for one artifact, with key-level detail for structured artifacts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactAssessment {
    pub state: InstallState,
    pub mismatches: Vec<KeyPathMismatch>,
}

impl From<InstallState> for ArtifactAssessment {
    fn from(state: InstallState) -> Self {
        Self {
            state,
            mismatches: Vec::new(),
        }
    }
}

/// Exact-content verdict.
///
/// `reference` is `None` when the template could not be read. That is
/// checked before target absence: a missing template cannot be installed
/// either, so it is reported as unverifiable rather than absent.
pub fn evaluate(reference: Option<&[u8]>, target: Option<&[u8]>) -> InstallState {
    let Some(reference) = reference else {
        return InstallState::Unverifiable {
            side: Side::Reference,
            reason: "reference template is unreadable".to_string(),
        };
    };
    let Some(target) = target else {
        return InstallState::Absent;
    };

    if compute_checksum(reference) == compute_checksum(target) {
        InstallState::Identical
    } else {
        InstallState::Drifted
    }
}

/// Assess an artifact using its descriptor's comparison strategy.
///
/// Structured documents are parsed here; a reference that fails to parse
/// is a reference failure, a target that fails to parse only makes this
/// one artifact unverifiable.
pub fn assess(
    descriptor: &ArtifactDescriptor,
    reference: Option<&[u8]>,
    target: Option<&[u8]>,
) -> ArtifactAssessment {
    let assessment = match &descriptor.strategy {
        ComparisonStrategy::ExactContentHash => evaluate(reference, target).into(),
        ComparisonStrategy::StructuredKeySubset { format, key_paths } => {
            let Some(reference) = reference else {
                return evaluate(None, target).into();
            };
            let reference = match format.parse(reference) {
                Ok(tree) => tree,
                Err(e) => {
                    return InstallState::Unverifiable {
                        side: Side::Reference,
                        reason: e.to_string(),
                    }
                    .into();
                }
            };
            match target.map(|bytes| format.parse(bytes)).transpose() {
                Ok(target) => {
                    let (state, mismatches) =
                        structured::evaluate(key_paths, &reference, target.as_ref());
                    ArtifactAssessment { state, mismatches }
                }
                Err(e) => InstallState::Unverifiable {
                    side: Side::Target,
                    reason: e.to_string(),
                }
                .into(),
            }
        }
    };

    tracing::debug!(
        artifact = %descriptor.reference_id,
        strategy = descriptor.strategy.label(),
        state = ?assessment.state,
        "Assessed artifact"
    );
    assessment
}
