//! Embedding configuration for the versioning core.
//!
//! A small builder-style struct, not a file-format config layer — this
//! crate has no on-disk configuration of its own (persistence is an
//! external collaborator, see the repository's design notes). Mirrors the
//! teacher's `Parameter`/`ParameterValue` builder pattern.

/// Tunables a host passes when constructing a [`crate::store::Store`] or
/// [`crate::session::Session`].
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Initial gap between neighboring lines' order keys. Halved on every
    /// bisecting insert; once the gap between two neighbors collapses to
    /// zero the whole file is renumbered back out to this spacing.
    pub order_spacing: i64,
    /// When `true` (the default), an [`crate::error::CoreError::InvariantViolation`]
    /// panics instead of being returned. Test suites that want to assert on
    /// the error instead of catching an unwind should set this to `false`.
    pub invariant_violations_panic: bool,
    /// End-of-line marker used for files loaded without an explicit `eol`.
    pub default_eol: &'static str,
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            order_spacing: 1 << 32,
            invariant_violations_panic: true,
            default_eol: "\n",
        }
    }
}

/// Builder for [`CoreConfig`].
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    order_spacing: Option<i64>,
    invariant_violations_panic: Option<bool>,
    default_eol: Option<&'static str>,
}

impl CoreConfigBuilder {
    pub fn order_spacing(mut self, spacing: i64) -> Self {
        self.order_spacing = Some(spacing);
        self
    }

    pub fn invariant_violations_panic(mut self, panic: bool) -> Self {
        self.invariant_violations_panic = Some(panic);
        self
    }

    pub fn default_eol(mut self, eol: &'static str) -> Self {
        self.default_eol = Some(eol);
        self
    }

    pub fn build(self) -> CoreConfig {
        let defaults = CoreConfig::default();
        CoreConfig {
            order_spacing: self.order_spacing.unwrap_or(defaults.order_spacing),
            invariant_violations_panic: self
                .invariant_violations_panic
                .unwrap_or(defaults.invariant_violations_panic),
            default_eol: self.default_eol.unwrap_or(defaults.default_eol),
        }
    }
}

#[cfg(test)]
/// Configuration used by the crate's own test suite: invariant violations
/// come back as errors instead of unwinding, so tests can assert on them.
pub fn test_config() -> CoreConfig {
    CoreConfig::builder().invariant_violations_panic(false).build()
}
