//! Postal-code lookup — narrow contract around an external address service.

pub mod viacep;

use async_trait::async_trait;

use crate::error::LookupError;

pub use viacep::ViaCepClient;

/// Address data as returned by the lookup service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub street: String,
    pub district: String,
    pub city: String,
    pub state: String,
}

/// Resolves a normalized 8-digit postal code to an address.
///
/// `Ok(None)` means the code does not exist. Transport and timeout failures
/// come back as `Err`; callers are expected to treat them like not-found
/// after logging the cause.
#[async_trait]
pub trait PostalCodeResolver: Send + Sync {
    async fn resolve(&self, code: &str) -> Result<Option<ResolvedAddress>, LookupError>;
}

/// Strip separators from a user-entered postal code and require exactly
/// 8 digits. Returns `None` for anything else.
pub fn normalize_postal_code(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.'))
        .collect();
    if cleaned.len() == 8 && cleaned.chars().all(|c| c.is_ascii_digit()) {
        Some(cleaned)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_separators() {
        assert_eq!(normalize_postal_code("01310-100"), Some("01310100".to_string()));
        assert_eq!(normalize_postal_code(" 01310.100 "), Some("01310100".to_string()));
        assert_eq!(normalize_postal_code("01310 100"), Some("01310100".to_string()));
        assert_eq!(normalize_postal_code("01310100"), Some("01310100".to_string()));
    }

    #[test]
    fn normalize_rejects_wrong_lengths_and_letters() {
        assert_eq!(normalize_postal_code(""), None);
        assert_eq!(normalize_postal_code("1234567"), None);
        assert_eq!(normalize_postal_code("123456789"), None);
        assert_eq!(normalize_postal_code("abcd-efgh"), None);
        assert_eq!(normalize_postal_code("01310-10a"), None);
    }
}
