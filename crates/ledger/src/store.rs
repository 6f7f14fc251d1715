//! Local persistence adapter.
//!
//! JSON files under a data directory, one whole-file overwrite per save.
//! Keys are namespaced per user id; there are no transactional
//! guarantees, matching the durable-key contract the app was built
//! against:
//!
//! - `transactions_<uid>.json`: the user's transaction list
//! - `rates_<uid>.json`: the user's exchange rate table
//! - `accounts.json`: the global account list (shared session flags)
//! - `session.json`: login flag + current-user id for this data dir

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{ExchangeRates, ResultLedger, Transaction, UserAccount};

/// Marker that a user is logged in, and which one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentSession {
    pub user_id: String,
}

#[derive(Clone, Debug)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn transactions_path(&self, user_id: &str) -> PathBuf {
        self.root.join(format!("transactions_{user_id}.json"))
    }

    fn rates_path(&self, user_id: &str) -> PathBuf {
        self.root.join(format!("rates_{user_id}.json"))
    }

    fn accounts_path(&self) -> PathBuf {
        self.root.join("accounts.json")
    }

    fn session_path(&self) -> PathBuf {
        self.root.join("session.json")
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> ResultLedger<()> {
        fs::create_dir_all(&self.root)?;
        let payload = serde_json::to_string_pretty(value)?;
        fs::write(path, payload)?;
        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> ResultLedger<Option<T>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Overwrites the user's transaction list and rate table.
    pub fn save_user_data(
        &self,
        user_id: &str,
        transactions: &[Transaction],
        rates: &ExchangeRates,
    ) -> ResultLedger<()> {
        self.write_json(&self.transactions_path(user_id), &transactions)?;
        self.write_json(&self.rates_path(user_id), rates)?;
        Ok(())
    }

    /// Loads the user's data, falling back to an empty list and the seed
    /// rate table when nothing was saved yet.
    pub fn load_user_data(
        &self,
        user_id: &str,
    ) -> ResultLedger<(Vec<Transaction>, ExchangeRates)> {
        let transactions = self
            .read_json(&self.transactions_path(user_id))?
            .unwrap_or_default();
        let rates = self
            .read_json(&self.rates_path(user_id))?
            .unwrap_or_else(ExchangeRates::seed);
        Ok((transactions, rates))
    }

    /// Removes a user's data files (admin account deletion).
    pub fn remove_user_data(&self, user_id: &str) -> ResultLedger<()> {
        for path in [self.transactions_path(user_id), self.rates_path(user_id)] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    pub fn save_accounts(&self, accounts: &[UserAccount]) -> ResultLedger<()> {
        self.write_json(&self.accounts_path(), &accounts)
    }

    /// Loads the shared account list, seeding `default_admin` on first use
    /// so a fresh data dir is immediately usable.
    pub fn load_accounts(&self, default_admin: &UserAccount) -> ResultLedger<Vec<UserAccount>> {
        match self.read_json::<Vec<UserAccount>>(&self.accounts_path())? {
            Some(accounts) => Ok(accounts),
            None => {
                let accounts = vec![default_admin.clone()];
                self.save_accounts(&accounts)?;
                Ok(accounts)
            }
        }
    }

    pub fn save_session(&self, session: Option<&CurrentSession>) -> ResultLedger<()> {
        match session {
            Some(session) => self.write_json(&self.session_path(), session),
            None => {
                match fs::remove_file(self.session_path()) {
                    Ok(()) => {}
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => return Err(err.into()),
                }
                Ok(())
            }
        }
    }

    pub fn load_session(&self) -> ResultLedger<Option<CurrentSession>> {
        self.read_json(&self.session_path())
    }
}
