//! Utility functions.
//!
//! Small helpers shared by the providers, the registry and the client.

use crate::error::{Result, SdkError};

/// Normalize a city name into a cache key (trimmed, lowercase).
///
/// # Errors
/// Returns `InvalidArgument` if the name is blank.
pub fn normalize_city(city: &str) -> Result<String> {
    let trimmed = city.trim();
    if trimmed.is_empty() {
        return Err(SdkError::InvalidArgument("city name cannot be empty".to_string()));
    }
    Ok(trimmed.to_lowercase())
}

/// Mask a credential for diagnostics.
///
/// Keeps the first and last four characters; anything of eight characters
/// or fewer is fully hidden.
pub fn mask_credential(credential: &str) -> String {
    let chars: Vec<char> = credential.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_city() {
        assert_eq!(normalize_city("  London ").unwrap(), "london");
        assert_eq!(normalize_city("SÃO PAULO").unwrap(), "são paulo");
        assert!(matches!(normalize_city("   "), Err(SdkError::InvalidArgument(_))));
        assert!(matches!(normalize_city(""), Err(SdkError::InvalidArgument(_))));
    }

    #[test]
    fn test_mask_credential() {
        assert_eq!(mask_credential("0123456789abcdef"), "0123...cdef");
        assert_eq!(mask_credential("12345678"), "***");
        assert_eq!(mask_credential(""), "***");
        assert_eq!(mask_credential("123456789"), "1234...6789");
    }
}
