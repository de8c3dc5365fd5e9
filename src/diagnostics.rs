// ABOUTME: Diagnostics accumulator for non-fatal warnings during a build.
// ABOUTME: Collects warnings that shouldn't fail a build but should be shown to users.

/// Collects non-fatal warnings during build operations.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Take over warnings collected elsewhere, keeping their order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }
}

/// A non-fatal warning collected during a build.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A step's compensating cleanup failed; the resource may be left behind.
    pub fn cleanup_failed(step: &str, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::CleanupFailed,
            message: format!("cleanup of {step} failed: {}", message.into()),
        }
    }

    pub fn region_appended(region: &str) -> Self {
        Self {
            kind: WarningKind::RegionAppended,
            message: format!("added image location {region} to gallery replication regions"),
        }
    }
}

/// Categories of warnings that can occur during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A cleanup action failed (a transient resource may remain).
    CleanupFailed,
    /// The build location was missing from the gallery replication regions.
    RegionAppended,
}
