use crate::capture::{CpuProfile, ProfileFormat};
use crate::error::{Error, Result};

/// Environment variable overriding the profiler interface revision.
pub const INTERFACE_ENV: &str = "JSPROF_INTERFACE";

/// Last module version whose profiler still reported per-node timing.
pub const SAMPLED_INTERFACE_MODULE_VERSION: u32 = 0x000B;

/// Profiler interface revision node records follow.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterfaceRevision {
    /// Records report total/self time and sample totals
    Legacy,
    /// Records report hit counts only
    Sampled,
}

impl InterfaceRevision {
    pub fn from_module_version(version: u32) -> Self {
        if version > SAMPLED_INTERFACE_MODULE_VERSION {
            InterfaceRevision::Sampled
        } else {
            InterfaceRevision::Legacy
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(InterfaceRevision::Legacy),
            "sampled" => Ok(InterfaceRevision::Sampled),
            other => Err(Error::InvalidArgument(format!(
                "unknown interface revision '{}', expected 'legacy' or 'sampled'",
                other
            ))),
        }
    }

    /// Revision a capture's native layout corresponds to.
    pub fn for_format(format: ProfileFormat) -> Self {
        match format {
            ProfileFormat::Nested => InterfaceRevision::Legacy,
            ProfileFormat::Flat => InterfaceRevision::Sampled,
        }
    }

    /// Pick the revision for this run: explicit flag, then the
    /// environment, then whatever the capture was recorded with.
    pub fn resolve(
        flag: Option<InterfaceRevision>,
        env: Option<&str>,
        profile: &CpuProfile,
    ) -> Result<Self> {
        let revision = match (flag, env) {
            (Some(revision), _) => revision,
            (None, Some(value)) => Self::parse(value)?,
            (None, None) => Self::for_format(profile.format()),
        };
        log::debug!("Using {:?} profiler interface", revision);
        Ok(revision)
    }

    /// [`Self::resolve`] reading [`INTERFACE_ENV`] from the process environment.
    pub fn resolve_from_env(flag: Option<InterfaceRevision>, profile: &CpuProfile) -> Result<Self> {
        let env = std::env::var(INTERFACE_ENV).ok();
        Self::resolve(flag, env.as_deref(), profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CapturedNode;

    #[test]
    fn test_module_version_gate() {
        assert_eq!(
            InterfaceRevision::from_module_version(0x000B),
            InterfaceRevision::Legacy
        );
        assert_eq!(
            InterfaceRevision::from_module_version(0x000C),
            InterfaceRevision::Sampled
        );
        assert_eq!(
            InterfaceRevision::from_module_version(0x0001),
            InterfaceRevision::Legacy
        );
    }

    #[test]
    fn test_resolution_order() {
        let profile = CpuProfile::from_root(CapturedNode::new("(root)", "", 0), 0.0, 0.0);

        assert_eq!(
            InterfaceRevision::resolve(None, None, &profile).unwrap(),
            InterfaceRevision::Sampled
        );
        assert_eq!(
            InterfaceRevision::resolve(None, Some("Legacy"), &profile).unwrap(),
            InterfaceRevision::Legacy
        );
        assert_eq!(
            InterfaceRevision::resolve(Some(InterfaceRevision::Sampled), Some("legacy"), &profile)
                .unwrap(),
            InterfaceRevision::Sampled
        );
        assert!(matches!(
            InterfaceRevision::resolve(None, Some("v9"), &profile),
            Err(Error::InvalidArgument(_))
        ));
    }
}
