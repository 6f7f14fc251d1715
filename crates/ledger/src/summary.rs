//! Per-currency aggregation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{CurrencyCode, ExchangeRates, Transaction, TransactionKind};

/// Derived per-currency aggregate of a transaction set. Never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrencySummary {
    pub currency: CurrencyCode,
    pub total_incoming: f64,
    pub total_outgoing: f64,
    /// `total_incoming - total_outgoing`.
    pub balance: f64,
    /// `balance / rate` when a positive rate is known, otherwise 0.
    pub usd_value: f64,
}

/// Reduces a transaction list into per-currency summaries.
///
/// Groups appear in insertion order of the first transaction per currency.
/// A missing or non-positive rate yields `usd_value = 0` rather than a
/// division error, so the function has no failure modes.
pub fn summarize(transactions: &[Transaction], rates: &ExchangeRates) -> Vec<CurrencySummary> {
    let mut order: HashMap<CurrencyCode, usize> = HashMap::new();
    let mut summaries: Vec<CurrencySummary> = Vec::new();

    for tx in transactions {
        let index = match order.get(&tx.currency) {
            Some(index) => *index,
            None => {
                order.insert(tx.currency.clone(), summaries.len());
                summaries.push(CurrencySummary {
                    currency: tx.currency.clone(),
                    total_incoming: 0.0,
                    total_outgoing: 0.0,
                    balance: 0.0,
                    usd_value: 0.0,
                });
                summaries.len() - 1
            }
        };

        let summary = &mut summaries[index];
        match tx.kind {
            TransactionKind::Incoming => summary.total_incoming += tx.amount,
            TransactionKind::Outgoing => summary.total_outgoing += tx.amount,
        }
        summary.balance = summary.total_incoming - summary.total_outgoing;
        let rate = rates.get(&summary.currency).unwrap_or(0.0);
        summary.usd_value = if rate > 0.0 {
            summary.balance / rate
        } else {
            0.0
        };
    }

    summaries
}

/// Total normalized balance across all summaries.
pub fn total_usd_balance(summaries: &[CurrencySummary]) -> f64 {
    summaries.iter().map(|summary| summary.usd_value).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewTransaction;

    fn tx(kind: TransactionKind, amount: f64, currency: &str) -> Transaction {
        NewTransaction::new(
            kind,
            amount,
            CurrencyCode::try_from(currency).unwrap(),
            String::new(),
        )
        .unwrap()
        .into_transaction()
    }

    fn sample_rates() -> ExchangeRates {
        let mut rates = ExchangeRates::default();
        rates.set(CurrencyCode::usd(), 1.0).unwrap();
        rates
            .set(CurrencyCode::try_from("TRY").unwrap(), 34.5)
            .unwrap();
        rates
    }

    #[test]
    fn groups_cover_exactly_the_currencies_present() {
        let transactions = vec![
            tx(TransactionKind::Incoming, 100.0, "USD"),
            tx(TransactionKind::Incoming, 500.0, "TRY"),
            tx(TransactionKind::Outgoing, 30.0, "USD"),
        ];
        let summaries = summarize(&transactions, &sample_rates());

        let codes: Vec<&str> = summaries
            .iter()
            .map(|summary| summary.currency.as_str())
            .collect();
        assert_eq!(codes, vec!["USD", "TRY"]);
    }

    #[test]
    fn documented_scenario() {
        let transactions = vec![
            tx(TransactionKind::Incoming, 100.0, "USD"),
            tx(TransactionKind::Outgoing, 30.0, "USD"),
            tx(TransactionKind::Incoming, 500.0, "TRY"),
        ];
        let summaries = summarize(&transactions, &sample_rates());

        assert_eq!(summaries.len(), 2);
        let usd = &summaries[0];
        assert_eq!(usd.total_incoming, 100.0);
        assert_eq!(usd.total_outgoing, 30.0);
        assert_eq!(usd.balance, 70.0);
        assert_eq!(usd.usd_value, 70.0);

        let try_summary = &summaries[1];
        assert_eq!(try_summary.total_incoming, 500.0);
        assert_eq!(try_summary.total_outgoing, 0.0);
        assert_eq!(try_summary.balance, 500.0);
        assert!((try_summary.usd_value - 14.49).abs() < 0.01);

        let total = total_usd_balance(&summaries);
        assert!((total - 84.49).abs() < 0.01);
    }

    #[test]
    fn zero_rate_never_yields_nan_or_infinity() {
        let transactions = vec![tx(TransactionKind::Incoming, 500.0, "SYP")];

        // Rate absent entirely.
        let summaries = summarize(&transactions, &ExchangeRates::default());
        assert_eq!(summaries[0].usd_value, 0.0);

        // Rate present but zero (e.g. arrived via a cloud pull that predates
        // write-boundary validation).
        let rates: ExchangeRates = serde_json::from_str(r#"{"SYP": 0.0}"#).unwrap();
        let summaries = summarize(&transactions, &rates);
        assert_eq!(summaries[0].usd_value, 0.0);
        assert!(summaries[0].usd_value.is_finite());
    }

    #[test]
    fn total_is_invariant_under_reordering() {
        let mut transactions = vec![
            tx(TransactionKind::Incoming, 100.0, "USD"),
            tx(TransactionKind::Outgoing, 30.0, "USD"),
            tx(TransactionKind::Incoming, 500.0, "TRY"),
            tx(TransactionKind::Outgoing, 120.0, "TRY"),
        ];
        let total = total_usd_balance(&summarize(&transactions, &sample_rates()));

        transactions.reverse();
        let reversed = total_usd_balance(&summarize(&transactions, &sample_rates()));
        assert!((total - reversed).abs() < 1e-9);
    }

    #[test]
    fn empty_input_produces_no_summaries() {
        let summaries = summarize(&[], &sample_rates());
        assert!(summaries.is_empty());
        assert_eq!(total_usd_balance(&summaries), 0.0);
    }
}
