pub use account::{Role, UserAccount, find_by_credentials, find_by_id};
pub use currency::CurrencyCode;
pub use error::LedgerError;
pub use rates::ExchangeRates;
pub use session::{SessionCheck, SessionToken};
pub use store::{CurrentSession, Store};
pub use summary::{CurrencySummary, summarize, total_usd_balance};
pub use transaction::{NewTransaction, Transaction, TransactionKind};

mod account;
mod currency;
mod error;
mod rates;
pub mod session;
mod store;
mod summary;
mod transaction;

type ResultLedger<T> = Result<T, LedgerError>;
