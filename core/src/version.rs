//! Version constants for pgschema
//!
//! The tool version travels inside every serialized plan so that `apply`
//! can refuse plans produced by a different binary. The plan format version
//! changes only when the JSON shape changes incompatibly.

/// Version of the pgschema tool itself
pub const PGSCHEMA_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the plan JSON document format
pub const PLAN_FORMAT_VERSION: &str = "1.0";

/// Check whether a plan was produced by this pgschema version
pub fn is_same_pgschema_version(version: &str) -> bool {
    version == PGSCHEMA_VERSION
}

/// Check whether a plan format version can be loaded by this binary
pub fn is_supported_plan_format(version: &str) -> bool {
    version == PLAN_FORMAT_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_format_supported() {
        assert!(is_supported_plan_format(PLAN_FORMAT_VERSION));
        assert!(!is_supported_plan_format("0.9"));
    }

    #[test]
    fn test_pgschema_version_matches_manifest() {
        assert!(is_same_pgschema_version(env!("CARGO_PKG_VERSION")));
        assert!(!is_same_pgschema_version("0.0.0"));
    }
}
