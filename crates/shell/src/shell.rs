//! The application shell: owns all in-memory state and orchestrates the
//! login flow, transaction CRUD, persistence and best-effort cloud sync.
//!
//! The local store and the cloud store are passive mirrors of the state
//! held here. The one exception is login time: a reachable cloud copy
//! overwrites local state wholesale (last-fetch-wins, no merge).
//!
//! Methods take `&mut self`, so mutations are serialized by construction:
//! a second submission cannot start while one is awaiting the extractor
//! or the cloud. In-flight calls are not cancellable; a logout while a
//! sync is pending simply lets it complete.

use std::path::Path;

use ledger::{
    CurrencyCode, CurrencySummary, CurrentSession, ExchangeRates, NewTransaction, Role,
    SessionCheck, SessionToken, Store, Transaction, TransactionKind, UserAccount, session,
};

use crate::{CloudClient, Extractor, Result, ShellError, export};

/// Cloud connectivity indicator; purely informational, never blocking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloudStatus {
    Idle,
    /// The remote copy was fetched successfully.
    Connected,
    /// The last push went through.
    Synced,
    /// The last push or pull failed; local state is authoritative.
    Error,
}

#[derive(Clone, Debug)]
struct ActiveSession {
    user_id: String,
    token: SessionToken,
}

pub struct Shell {
    store: Store,
    cloud: CloudClient,
    extractor: Extractor,
    default_admin: UserAccount,
    accounts: Vec<UserAccount>,
    session: Option<ActiveSession>,
    transactions: Vec<Transaction>,
    rates: ExchangeRates,
    cloud_status: CloudStatus,
}

impl Shell {
    pub fn new(
        store: Store,
        cloud: CloudClient,
        extractor: Extractor,
        default_admin: UserAccount,
    ) -> Result<Self> {
        let accounts = store.load_accounts(&default_admin)?;
        Ok(Self {
            store,
            cloud,
            extractor,
            default_admin,
            accounts,
            session: None,
            transactions: Vec::new(),
            rates: ExchangeRates::seed(),
            cloud_status: CloudStatus::Idle,
        })
    }

    fn reload_accounts(&mut self) -> Result<()> {
        self.accounts = self.store.load_accounts(&self.default_admin)?;
        Ok(())
    }

    fn require_session(&self) -> Result<&ActiveSession> {
        self.session.as_ref().ok_or(ShellError::NotLoggedIn)
    }

    fn require_admin(&self) -> Result<()> {
        let current = self.current_user().ok_or(ShellError::NotLoggedIn)?;
        if current.is_admin() {
            Ok(())
        } else {
            Err(ShellError::Forbidden)
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_user(&self) -> Option<&UserAccount> {
        let session = self.session.as_ref()?;
        self.accounts
            .iter()
            .find(|account| account.id == session.user_id)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn rates(&self) -> &ExchangeRates {
        &self.rates
    }

    pub fn cloud_status(&self) -> CloudStatus {
        self.cloud_status
    }

    pub fn summaries(&self) -> Vec<CurrencySummary> {
        ledger::summarize(&self.transactions, &self.rates)
    }

    pub fn total_usd_balance(&self) -> f64 {
        ledger::total_usd_balance(&self.summaries())
    }

    /// Plaintext credential check against the shared account list.
    ///
    /// On success this context claims the account's session slot
    /// (last-writer-wins), loads local data, then lets a reachable cloud
    /// copy overwrite it. Wrong credentials change nothing.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.reload_accounts()?;
        let Some(index) = ledger::find_by_credentials(&self.accounts, username, password) else {
            return Err(ShellError::InvalidCredentials);
        };

        let token = SessionToken::generate();
        session::claim(&mut self.accounts, index, &token);
        let user_id = self.accounts[index].id.clone();
        self.store.save_accounts(&self.accounts)?;
        self.store.save_session(Some(&CurrentSession {
            user_id: user_id.clone(),
        }))?;

        let (transactions, rates) = self.store.load_user_data(&user_id)?;
        self.transactions = transactions;
        self.rates = rates;
        self.session = Some(ActiveSession {
            user_id: user_id.clone(),
            token,
        });

        match self.cloud.fetch(&user_id).await {
            Some((transactions, rates)) => {
                self.transactions = transactions;
                self.rates = rates;
                self.store
                    .save_user_data(&user_id, &self.transactions, &self.rates)?;
                self.cloud_status = CloudStatus::Connected;
            }
            None => self.cloud_status = CloudStatus::Error,
        }

        Ok(())
    }

    /// Explicit logout: releases the session slot in the shared store.
    pub fn logout(&mut self) -> Result<()> {
        if let Some(active) = self.session.take() {
            self.reload_accounts()?;
            session::release(&mut self.accounts, &active.user_id);
            self.store.save_accounts(&self.accounts)?;
        }
        self.clear_local_state()
    }

    /// Forced logout after a revoked session: the slot now belongs to the
    /// other context, so the shared list is left untouched.
    fn force_logout(&mut self) -> Result<()> {
        self.session = None;
        self.clear_local_state()
    }

    fn clear_local_state(&mut self) -> Result<()> {
        self.store.save_session(None)?;
        self.transactions.clear();
        self.rates = ExchangeRates::seed();
        self.cloud_status = CloudStatus::Idle;
        Ok(())
    }

    /// One watchdog step: re-reads the shared account list and compares
    /// the stored session token with this context's. Advisory only; the
    /// caller drives this from a periodic timer.
    pub fn session_check(&mut self) -> Result<SessionCheck> {
        let Some(active) = self.session.clone() else {
            return Ok(SessionCheck::Active);
        };

        self.reload_accounts()?;
        let verdict = session::check(&self.accounts, &active.user_id, &active.token);
        if verdict != SessionCheck::Active {
            tracing::warn!(user_id = %active.user_id, "session revoked by another context");
            self.force_logout()?;
        }
        Ok(verdict)
    }

    /// Extracts transactions from free text and appends them.
    ///
    /// On extraction failure nothing changes and the caller keeps its
    /// input for retry. On success the new entries are persisted and a
    /// best-effort sync fires.
    pub async fn process_text(&mut self, text: &str) -> Result<Vec<Transaction>> {
        self.require_session()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ShellError::Invalid("nothing to analyze".to_string()));
        }

        let drafts = self.extractor.extract(trimmed).await?;
        let new: Vec<Transaction> = drafts
            .into_iter()
            .map(NewTransaction::into_transaction)
            .collect();

        self.transactions.extend(new.iter().cloned());
        self.persist_and_sync().await?;
        Ok(new)
    }

    /// Manual entry path, same persist + sync sequence as extraction.
    pub async fn add_transaction(
        &mut self,
        kind: TransactionKind,
        amount: f64,
        currency: &str,
        description: &str,
    ) -> Result<Transaction> {
        self.require_session()?;
        let currency = CurrencyCode::try_from(currency)?;
        let tx = NewTransaction::new(kind, amount, currency, description.to_string())?
            .into_transaction();

        self.transactions.push(tx.clone());
        self.persist_and_sync().await?;
        Ok(tx)
    }

    pub async fn delete_transaction(&mut self, id: &str) -> Result<()> {
        self.require_session()?;
        let Some(index) = self.transactions.iter().position(|tx| tx.id == id) else {
            return Err(ShellError::NotFound(id.to_string()));
        };
        self.transactions.remove(index);
        self.persist_and_sync().await?;
        Ok(())
    }

    /// Destructive: the front end must confirm before calling this.
    pub async fn clear_transactions(&mut self) -> Result<()> {
        self.require_session()?;
        self.transactions.clear();
        self.persist_and_sync().await?;
        Ok(())
    }

    /// Updates one exchange rate. Non-positive rates are rejected at this
    /// boundary; the table is persisted and pushed as a whole.
    pub async fn set_rate(&mut self, currency: &str, rate: f64) -> Result<()> {
        let user_id = self.require_session()?.user_id.clone();
        let currency = CurrencyCode::try_from(currency)?;
        self.rates.set(currency, rate)?;

        self.store
            .save_user_data(&user_id, &self.transactions, &self.rates)?;
        self.cloud_status = if self.cloud.update_rates(&user_id, &self.rates).await {
            CloudStatus::Synced
        } else {
            CloudStatus::Error
        };
        Ok(())
    }

    /// Manual push of the whole transaction list.
    pub async fn cloud_sync(&mut self) -> Result<()> {
        let user_id = self.require_session()?.user_id.clone();
        self.cloud_status = if self.cloud.sync(&user_id, &self.transactions).await {
            CloudStatus::Synced
        } else {
            CloudStatus::Error
        };
        Ok(())
    }

    /// Manual pull. A successful fetch replaces local state wholesale;
    /// a failed one leaves it untouched and degrades the status.
    pub async fn refresh_from_cloud(&mut self) -> Result<bool> {
        let user_id = self.require_session()?.user_id.clone();
        match self.cloud.fetch(&user_id).await {
            Some((transactions, rates)) => {
                self.transactions = transactions;
                self.rates = rates;
                self.store
                    .save_user_data(&user_id, &self.transactions, &self.rates)?;
                self.cloud_status = CloudStatus::Connected;
                Ok(true)
            }
            None => {
                self.cloud_status = CloudStatus::Error;
                Ok(false)
            }
        }
    }

    pub fn export_csv(&self, path: &Path) -> Result<()> {
        self.require_session()?;
        export::write_csv(&self.transactions, path)
    }

    pub fn list_accounts(&self) -> Result<&[UserAccount]> {
        self.require_admin()?;
        Ok(&self.accounts)
    }

    pub fn create_account(
        &mut self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<UserAccount> {
        self.require_admin()?;
        if username.trim().is_empty() || password.is_empty() {
            return Err(ShellError::Invalid(
                "username and password must not be empty".to_string(),
            ));
        }

        self.reload_accounts()?;
        if self.accounts.iter().any(|account| account.username == username) {
            return Err(ShellError::Invalid(format!(
                "username \"{username}\" is already taken"
            )));
        }

        let account = UserAccount::new(username, password, role);
        self.accounts.push(account.clone());
        self.store.save_accounts(&self.accounts)?;
        Ok(account)
    }

    /// Destructive: removes the account and its local data files. The
    /// front end must confirm first; deleting the logged-in account is
    /// refused outright.
    pub fn delete_account(&mut self, id: &str) -> Result<()> {
        self.require_admin()?;
        let current = self.require_session()?.user_id.clone();
        if current == id {
            return Err(ShellError::Invalid(
                "cannot delete the logged-in account".to_string(),
            ));
        }

        self.reload_accounts()?;
        let Some(index) = self.accounts.iter().position(|account| account.id == id) else {
            return Err(ShellError::NotFound(id.to_string()));
        };
        self.accounts.remove(index);
        self.store.save_accounts(&self.accounts)?;
        self.store.remove_user_data(id)?;
        Ok(())
    }

    async fn persist_and_sync(&mut self) -> Result<()> {
        let user_id = self.require_session()?.user_id.clone();
        self.store
            .save_user_data(&user_id, &self.transactions, &self.rates)?;
        self.cloud_status = if self.cloud.sync(&user_id, &self.transactions).await {
            CloudStatus::Synced
        } else {
            CloudStatus::Error
        };
        Ok(())
    }
}
