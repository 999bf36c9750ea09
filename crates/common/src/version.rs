use std::fmt;

/// Build information captured by `build.rs` at compile time
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub repo_version: &'static str,
    pub build_profile: &'static str,
    pub build_timestamp: &'static str,
    /// Protocol generation written into every envelope
    pub protocol_version: u32,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        repo_version: env!("REPO_VERSION"),
        build_profile: env!("BUILD_PROFILE"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        protocol_version: crate::envelope::METADATA_VERSION,
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "metavault {} ({}, {} build, {}) metadata protocol v{}",
            self.version,
            self.repo_version,
            self.build_profile,
            self.build_timestamp,
            self.protocol_version
        )
    }
}
