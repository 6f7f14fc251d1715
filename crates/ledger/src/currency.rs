use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Open-ended currency code attached to transactions and exchange rates.
///
/// Unlike a closed enum, codes come from free text (the extractor emits
/// whatever short code it recognizes), so the type validates instead of
/// enumerating: 1 to 8 ASCII alphanumeric characters, normalized to
/// uppercase at the boundary.
///
/// `USD` is the reference currency for conversion (rate 1).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

const MAX_CODE_LEN: usize = 8;

impl CurrencyCode {
    /// The reference currency: everything converts into USD.
    pub fn usd() -> Self {
        CurrencyCode("USD".to_string())
    }

    /// Canonical (uppercase) code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let code = value.trim().to_ascii_uppercase();
        if code.is_empty() || code.len() > MAX_CODE_LEN {
            return Err(LedgerError::InvalidCurrency(format!(
                "currency code must be 1..={MAX_CODE_LEN} characters, got {value:?}"
            )));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LedgerError::InvalidCurrency(format!(
                "currency code must be ASCII alphanumeric, got {value:?}"
            )));
        }
        Ok(CurrencyCode(code))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::try_from(value.as_str())
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_normalized_to_uppercase() {
        assert_eq!(CurrencyCode::try_from(" try ").unwrap().as_str(), "TRY");
        assert_eq!(CurrencyCode::try_from("usd").unwrap(), CurrencyCode::usd());
    }

    #[test]
    fn rejects_empty_and_non_alphanumeric() {
        assert!(CurrencyCode::try_from("").is_err());
        assert!(CurrencyCode::try_from("   ").is_err());
        assert!(CurrencyCode::try_from("US$").is_err());
        assert!(CurrencyCode::try_from("TOOLONGCODE").is_err());
    }
}
