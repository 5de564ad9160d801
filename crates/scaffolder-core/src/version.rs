//! Version parsing and CLI update checks

use crate::error::{Result, ScaffoldError};
use semver::Version;

/// Compare the running CLI version against the newest published one
/// Returns a warning message if a newer release exists
pub fn check_for_update(
    current_version: &str,
    latest_version: &str,
    upgrade_command: &str,
) -> Option<String> {
    let current = match parse_version(current_version) {
        Ok(v) => v,
        Err(_) => return None, // Can't compare, skip warning
    };

    let latest = match parse_version(latest_version) {
        Ok(v) => v,
        Err(_) => return None,
    };

    if current < latest {
        Some(format!(
            "A newer version is available: {} (you are running {}).\n\
             Update with: {}",
            latest, current, upgrade_command
        ))
    } else {
        None
    }
}

/// Parse version string, accepting a leading 'v'
pub fn parse_version(version_str: &str) -> Result<Version> {
    let cleaned = version_str.trim();
    let cleaned = cleaned.strip_prefix('v').unwrap_or(cleaned);
    Version::parse(cleaned).map_err(|source| ScaffoldError::InvalidVersion {
        value: version_str.to_string(),
        source,
    })
}
