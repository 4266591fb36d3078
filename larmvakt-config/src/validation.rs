//! Custom validation functions for configuration.
//!
//! Shared validation logic used across multiple configuration modules.

use std::path::Path;

use validator::ValidationError;

/// Validate that an interface name follows Linux naming conventions.
pub fn validate_interface(name: &str) -> Result<(), ValidationError> {
    let valid = !name.is_empty()
        && name.len() <= 15
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    let re =
        regex::Regex::new("^[a-zA-Z0-9_]+$").map_err(|_| ValidationError::new("invalid_regex"))?;

    if valid && re.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_interface"))
    }
}

/// Validate that a detector identity is non-empty and printable.
pub fn validate_detector_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::new("empty_detector_id"));
    }
    Ok(())
}

/// Validate that an executable path is non-empty.
pub fn validate_executable(path: &Path) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() {
        return Err(ValidationError::new("empty_executable_path"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn interface_names() {
        assert!(validate_interface("eth0").is_ok());
        assert!(validate_interface("plc1_eth").is_ok());
        assert!(validate_interface("").is_err());
        assert!(validate_interface("eth0; rm -rf /").is_err());
        assert!(validate_interface("averylonginterfacename").is_err());
    }

    #[test]
    fn executable_paths() {
        assert!(validate_executable(&PathBuf::from("detectors/net.py")).is_ok());
        assert!(validate_executable(&PathBuf::new()).is_err());
    }
}
