use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{
    Account, AccountId, Cents, Ledger, LedgerError, ResetPolicy, TransferOutcome,
    ensure_positive,
};
use crate::storage::FileStore;

use super::AppError;

/// Application service providing the ledger operations.
/// This is the primary interface for any client (HTTP, CLI, tests).
///
/// The ledger is loaded once and cached. Every mutation is applied to a copy,
/// written through to the store and only then published, all under one lock, so
/// the file always matches the last operation that returned successfully.
pub struct LedgerService {
    store: FileStore,
    ledger: Mutex<Ledger>,
    reset_policy: ResetPolicy,
}

impl LedgerService {
    /// Create a new ledger service over an already loaded ledger.
    pub fn new(store: FileStore, ledger: Ledger, reset_policy: ResetPolicy) -> Self {
        Self {
            store,
            ledger: Mutex::new(ledger),
            reset_policy,
        }
    }

    /// Open the ledger file at `path`, loading whatever it currently holds.
    pub async fn open(
        path: impl Into<PathBuf>,
        reset_policy: ResetPolicy,
    ) -> Result<Self, AppError> {
        let store = FileStore::open(path).await?;
        let ledger = store.load().await?;
        info!(
            path = %store.path().display(),
            accounts = ledger.len(),
            "Ledger loaded"
        );
        Ok(Self::new(store, ledger, reset_policy))
    }

    // ========================
    // Queries
    // ========================

    /// Current balance of an account, or `None` if it does not exist.
    pub async fn get_balance(&self, account_id: &str) -> Option<Cents> {
        let id = AccountId::new(account_id).ok()?;
        let balance = self.ledger.lock().await.balance(&id);
        debug!(account = %id, ?balance, "Balance lookup");
        balance
    }

    /// All accounts in identifier order.
    pub async fn list_accounts(&self) -> Vec<Account> {
        self.ledger.lock().await.accounts().collect()
    }

    // ========================
    // Mutations
    // ========================

    /// Create an account. Does nothing if the account already exists.
    pub async fn create_account(
        &self,
        account_id: &str,
        initial_balance: Cents,
    ) -> Result<Account, AppError> {
        let id = AccountId::new(account_id)?;
        let account = self
            .commit(|ledger| ledger.open(id, initial_balance))
            .await?;
        info!(account = %account.id, balance = account.balance, "Account ready");
        Ok(account)
    }

    /// Credit an existing account.
    pub async fn deposit(&self, account_id: &str, amount: Cents) -> Result<Account, AppError> {
        let id = AccountId::new(account_id)?;
        let account = self.commit(|ledger| ledger.deposit(&id, amount)).await?;
        info!(account = %account.id, amount, balance = account.balance, "Deposit applied");
        Ok(account)
    }

    /// Credit an account, opening it at zero first if it does not exist.
    /// An invalid amount never opens the account.
    pub async fn deposit_or_open(
        &self,
        account_id: &str,
        amount: Cents,
    ) -> Result<Account, AppError> {
        let id = AccountId::new(account_id)?;
        let amount = ensure_positive(amount)?;
        let account = self
            .commit(|ledger| {
                ledger.open(id.clone(), 0)?;
                ledger.deposit(&id, amount)
            })
            .await?;
        info!(account = %account.id, amount, balance = account.balance, "Deposit applied");
        Ok(account)
    }

    /// Debit an existing account, refusing to go below zero.
    pub async fn withdraw(&self, account_id: &str, amount: Cents) -> Result<Account, AppError> {
        let id = AccountId::new(account_id)?;
        let account = self.commit(|ledger| ledger.withdraw(&id, amount)).await?;
        info!(account = %account.id, amount, balance = account.balance, "Withdrawal applied");
        Ok(account)
    }

    /// Move funds between accounts, opening the destination if needed.
    /// Both balances are persisted together.
    pub async fn transfer(
        &self,
        origin_id: &str,
        destination_id: &str,
        amount: Cents,
    ) -> Result<TransferOutcome, AppError> {
        let origin = AccountId::new(origin_id)?;
        let destination = AccountId::new(destination_id)?;
        let outcome = self
            .commit(|ledger| ledger.transfer(&origin, &destination, amount))
            .await?;
        info!(
            origin = %outcome.origin.id,
            destination = %outcome.destination.id,
            amount,
            "Transfer applied"
        );
        Ok(outcome)
    }

    /// Replace the whole ledger according to the configured reset policy.
    /// The file is rewritten even when the ledger is already in that state.
    pub async fn reset(&self) -> Result<(), AppError> {
        let mut current = self.ledger.lock().await;
        let fresh = Ledger::reset(&self.reset_policy);
        self.store.save(&fresh).await?;
        *current = fresh;
        info!(policy = ?self.reset_policy, "Ledger reset");
        Ok(())
    }

    /// Apply `op` to a copy of the ledger, persist the copy, then publish it.
    /// If either step fails the cached ledger is left as it was.
    async fn commit<T>(
        &self,
        op: impl FnOnce(&mut Ledger) -> Result<T, LedgerError>,
    ) -> Result<T, AppError> {
        let mut current = self.ledger.lock().await;
        let mut staged = current.clone();
        let result = op(&mut staged)?;

        if staged != *current {
            self.store.save(&staged).await?;
            *current = staged;
        }
        Ok(result)
    }
}
