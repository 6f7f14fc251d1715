//! Exchange rate table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CurrencyCode, LedgerError, ResultLedger};

/// Mapping from currency code to units-per-one-USD.
///
/// The reference currency is USD with rate 1. Rates are mutated by direct
/// user edit; no history is retained. The write boundary rejects
/// non-positive rates, but a table pulled from the cloud is taken as-is
/// (the aggregator treats any rate <= 0 as "no conversion", see
/// [`summarize`](crate::summarize)).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRates(BTreeMap<CurrencyCode, f64>);

impl ExchangeRates {
    /// The table a fresh user starts from.
    pub fn seed() -> Self {
        let mut rates = BTreeMap::new();
        rates.insert(CurrencyCode::usd(), 1.0);
        if let Ok(code) = CurrencyCode::try_from("TRY") {
            rates.insert(code, 34.5);
        }
        if let Ok(code) = CurrencyCode::try_from("SYP") {
            rates.insert(code, 14500.0);
        }
        ExchangeRates(rates)
    }

    pub fn get(&self, currency: &CurrencyCode) -> Option<f64> {
        self.0.get(currency).copied()
    }

    /// Inserts or overwrites a rate. Rejects non-positive or non-finite
    /// values at this boundary.
    pub fn set(&mut self, currency: CurrencyCode, rate: f64) -> ResultLedger<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(LedgerError::InvalidRate(format!(
                "rate for {currency} must be a positive number, got {rate}"
            )));
        }
        self.0.insert(currency, rate);
        Ok(())
    }

    pub fn remove(&mut self, currency: &CurrencyCode) -> Option<f64> {
        self.0.remove(currency)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, f64)> {
        self.0.iter().map(|(code, rate)| (code, *rate))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Builds a table verbatim, without write-boundary validation.
///
/// Used when mirroring an upstream copy (cloud pull, file load), where the
/// table is taken as-is even if it predates validation.
impl FromIterator<(CurrencyCode, f64)> for ExchangeRates {
    fn from_iter<I: IntoIterator<Item = (CurrencyCode, f64)>>(iter: I) -> Self {
        ExchangeRates(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_contains_usd_reference() {
        let rates = ExchangeRates::seed();
        assert_eq!(rates.get(&CurrencyCode::usd()), Some(1.0));
        assert_eq!(rates.len(), 3);
    }

    #[test]
    fn set_rejects_non_positive_rates() {
        let mut rates = ExchangeRates::seed();
        let eur = CurrencyCode::try_from("EUR").unwrap();
        assert!(rates.set(eur.clone(), 0.0).is_err());
        assert!(rates.set(eur.clone(), -3.0).is_err());
        assert!(rates.set(eur.clone(), f64::INFINITY).is_err());
        assert!(rates.set(eur.clone(), 0.92).is_ok());
        assert_eq!(rates.get(&eur), Some(0.92));
    }

    #[test]
    fn json_roundtrip_preserves_key_set() {
        let mut rates = ExchangeRates::seed();
        rates
            .set(CurrencyCode::try_from("EUR").unwrap(), 0.92)
            .unwrap();

        let encoded = serde_json::to_string(&rates).unwrap();
        let decoded: ExchangeRates = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, rates);
    }
}
