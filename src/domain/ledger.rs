use std::collections::BTreeMap;

use serde::Serialize;

use super::{Account, AccountId, AmountError, Cents, ensure_positive};

/// The authoritative mapping of account identifiers to balances.
///
/// Every rule that touches a balance lives here, so a `Ledger` can never be
/// observed with a negative balance. Keys are kept sorted so the persisted
/// representation is stable between writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Ledger {
    accounts: BTreeMap<AccountId, Cents>,
}

/// Balances of both sides after a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub origin: Account,
    pub destination: Account,
}

/// What a reset replaces the ledger with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResetPolicy {
    /// Drop every account.
    #[default]
    Empty,
    /// Recreate a fixed set of accounts at zero.
    Seeded(Vec<AccountId>),
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from raw balances, rejecting any negative entry.
    pub fn from_balances(accounts: BTreeMap<AccountId, Cents>) -> Result<Self, LedgerError> {
        if let Some((id, balance)) = accounts.iter().find(|(_, balance)| **balance < 0) {
            return Err(LedgerError::NegativeBalance {
                account: id.clone(),
                balance: *balance,
            });
        }
        Ok(Self { accounts })
    }

    /// The ledger a reset produces under the given policy.
    pub fn reset(policy: &ResetPolicy) -> Self {
        match policy {
            ResetPolicy::Empty => Self::new(),
            ResetPolicy::Seeded(ids) => Self {
                accounts: ids.iter().cloned().map(|id| (id, 0)).collect(),
            },
        }
    }

    pub fn balance(&self, id: &AccountId) -> Option<Cents> {
        self.accounts.get(id).copied()
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.accounts.contains_key(id)
    }

    pub fn account(&self, id: &AccountId) -> Option<Account> {
        self.balance(id).map(|balance| Account::new(id.clone(), balance))
    }

    /// All accounts in identifier order.
    pub fn accounts(&self) -> impl Iterator<Item = Account> + '_ {
        self.accounts
            .iter()
            .map(|(id, balance)| Account::new(id.clone(), *balance))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Open an account. Opening an existing account is a no-op and returns it unchanged.
    pub fn open(&mut self, id: AccountId, initial_balance: Cents) -> Result<Account, LedgerError> {
        if let Some(existing) = self.account(&id) {
            return Ok(existing);
        }
        if initial_balance < 0 {
            return Err(AmountError::Negative(initial_balance).into());
        }
        self.accounts.insert(id.clone(), initial_balance);
        Ok(Account::new(id, initial_balance))
    }

    pub fn deposit(&mut self, id: &AccountId, amount: Cents) -> Result<Account, LedgerError> {
        let amount = ensure_positive(amount)?;
        let balance = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.clone()))?;

        *balance = balance
            .checked_add(amount)
            .ok_or(AmountError::Overflow {
                balance: *balance,
                amount,
            })?;

        Ok(Account::new(id.clone(), *balance))
    }

    /// A missing account is reported before the amount is checked.
    pub fn withdraw(&mut self, id: &AccountId, amount: Cents) -> Result<Account, LedgerError> {
        let balance = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.clone()))?;
        let amount = ensure_positive(amount)?;

        if *balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account: id.clone(),
                balance: *balance,
                required: amount,
            });
        }
        *balance -= amount;

        Ok(Account::new(id.clone(), *balance))
    }

    /// Move `amount` from `origin` to `destination`, opening the destination at zero
    /// if needed. Either both sides change or neither does.
    pub fn transfer(
        &mut self,
        origin: &AccountId,
        destination: &AccountId,
        amount: Cents,
    ) -> Result<TransferOutcome, LedgerError> {
        let mut staged = self.clone();
        staged.withdraw(origin, amount)?;
        staged.open(destination.clone(), 0)?;
        let destination = staged.deposit(destination, amount)?;
        let origin = staged
            .account(origin)
            .ok_or_else(|| LedgerError::AccountNotFound(origin.clone()))?;

        *self = staged;
        Ok(TransferOutcome {
            origin,
            destination,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    InvalidAmount(AmountError),
    AccountNotFound(AccountId),
    InsufficientFunds {
        account: AccountId,
        balance: Cents,
        required: Cents,
    },
    NegativeBalance {
        account: AccountId,
        balance: Cents,
    },
}

impl From<AmountError> for LedgerError {
    fn from(err: AmountError) -> Self {
        LedgerError::InvalidAmount(err)
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::InvalidAmount(err) => write!(f, "{}", err),
            LedgerError::AccountNotFound(id) => write!(f, "account {} does not exist", id),
            LedgerError::InsufficientFunds {
                account,
                balance,
                required,
            } => write!(
                f,
                "insufficient funds in account {}: balance {}, required {}",
                account, balance, required
            ),
            LedgerError::NegativeBalance { account, balance } => {
                write!(f, "account {} has negative balance {}", account, balance)
            }
        }
    }
}

impl std::error::Error for LedgerError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn ledger_with(entries: &[(&str, Cents)]) -> Ledger {
        let mut ledger = Ledger::new();
        for (name, balance) in entries {
            ledger.open(id(name), *balance).unwrap();
        }
        ledger
    }

    #[test]
    fn test_open_then_deposit() {
        let mut ledger = Ledger::new();
        ledger.open(id("A"), 100).unwrap();

        let account = ledger.deposit(&id("A"), 50).unwrap();

        assert_eq!(account.balance, 150);
        assert_eq!(ledger.balance(&id("A")), Some(150));
    }

    #[test]
    fn test_open_is_idempotent() {
        let mut ledger = ledger_with(&[("A", 100)]);

        let account = ledger.open(id("A"), 0).unwrap();
        assert_eq!(account.balance, 100);

        // Negative initial balance is ignored when the account already exists
        let account = ledger.open(id("A"), -10).unwrap();
        assert_eq!(account.balance, 100);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_open_rejects_negative_initial_balance() {
        let mut ledger = Ledger::new();
        let result = ledger.open(id("A"), -1);

        assert_eq!(
            result,
            Err(LedgerError::InvalidAmount(AmountError::Negative(-1)))
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_deposit_rejects_non_positive_amount() {
        let mut ledger = ledger_with(&[("A", 150)]);

        assert!(matches!(
            ledger.deposit(&id("A"), -5),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.deposit(&id("A"), 0),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(ledger.balance(&id("A")), Some(150));
    }

    #[test]
    fn test_deposit_to_missing_account() {
        let mut ledger = Ledger::new();
        assert_eq!(
            ledger.deposit(&id("B"), 10),
            Err(LedgerError::AccountNotFound(id("B")))
        );
        assert!(!ledger.contains(&id("B")));
    }

    #[test]
    fn test_deposit_overflow_is_rejected() {
        let mut ledger = ledger_with(&[("A", i64::MAX - 1)]);

        let result = ledger.deposit(&id("A"), 2);

        assert!(matches!(
            result,
            Err(LedgerError::InvalidAmount(AmountError::Overflow { .. }))
        ));
        assert_eq!(ledger.balance(&id("A")), Some(i64::MAX - 1));
    }

    #[test]
    fn test_withdraw_checks() {
        let mut ledger = ledger_with(&[("A", 150)]);

        assert_eq!(
            ledger.withdraw(&id("B"), 10),
            Err(LedgerError::AccountNotFound(id("B")))
        );
        assert_eq!(
            ledger.withdraw(&id("A"), 10000),
            Err(LedgerError::InsufficientFunds {
                account: id("A"),
                balance: 150,
                required: 10000,
            })
        );
        assert_eq!(ledger.balance(&id("A")), Some(150));

        let account = ledger.withdraw(&id("A"), 150).unwrap();
        assert_eq!(account.balance, 0);
    }

    #[test]
    fn test_missing_origin_wins_over_bad_amount() {
        let mut ledger = ledger_with(&[("A", 10)]);

        assert_eq!(
            ledger.withdraw(&id("B"), -5),
            Err(LedgerError::AccountNotFound(id("B")))
        );
        assert_eq!(
            ledger.transfer(&id("B"), &id("A"), 0),
            Err(LedgerError::AccountNotFound(id("B")))
        );
        assert!(matches!(
            ledger.withdraw(&id("A"), 0),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_transfer_opens_destination() {
        let mut ledger = ledger_with(&[("A", 150)]);

        let outcome = ledger.transfer(&id("A"), &id("C"), 40).unwrap();

        assert_eq!(outcome.origin, Account::new(id("A"), 110));
        assert_eq!(outcome.destination, Account::new(id("C"), 40));
        assert_eq!(ledger.balance(&id("A")), Some(110));
        assert_eq!(ledger.balance(&id("C")), Some(40));
    }

    #[test]
    fn test_failed_transfer_leaves_ledger_untouched() {
        let mut ledger = ledger_with(&[("A", 10), ("B", i64::MAX)]);
        let before = ledger.clone();

        // Withdraw succeeds, deposit overflows: nothing may change
        assert!(ledger.transfer(&id("A"), &id("B"), 5).is_err());
        assert_eq!(ledger, before);

        // Insufficient funds: destination must not be opened
        assert!(ledger.transfer(&id("A"), &id("Z"), 50).is_err());
        assert!(!ledger.contains(&id("Z")));

        // Missing origin
        assert_eq!(
            ledger.transfer(&id("X"), &id("A"), 1),
            Err(LedgerError::AccountNotFound(id("X")))
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_transfer_to_self_is_neutral() {
        let mut ledger = ledger_with(&[("A", 100)]);

        let outcome = ledger.transfer(&id("A"), &id("A"), 60).unwrap();

        assert_eq!(outcome.origin.balance, 100);
        assert_eq!(outcome.destination.balance, 100);
        assert_eq!(ledger.balance(&id("A")), Some(100));
    }

    #[test]
    fn test_reset_policies() {
        assert!(Ledger::reset(&ResetPolicy::Empty).is_empty());

        let seeded = Ledger::reset(&ResetPolicy::Seeded(vec![id("100"), id("300")]));
        assert_eq!(seeded.len(), 2);
        assert_eq!(seeded.balance(&id("100")), Some(0));
        assert_eq!(seeded.balance(&id("300")), Some(0));
    }

    #[test]
    fn test_from_balances_rejects_negative() {
        let mut raw = BTreeMap::new();
        raw.insert(id("A"), 5);
        raw.insert(id("B"), -1);

        assert_eq!(
            Ledger::from_balances(raw),
            Err(LedgerError::NegativeBalance {
                account: id("B"),
                balance: -1,
            })
        );
    }

    #[test]
    fn test_serializes_sorted() {
        let ledger = ledger_with(&[("b", 2), ("a", 1)]);
        let json = serde_json::to_string(&ledger).unwrap();
        assert_eq!(json, r#"{"a":1,"b":2}"#);
    }
}
