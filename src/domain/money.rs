use std::fmt;

/// Money is represented as integer units of the smallest denomination (cents).
/// Amounts coming from callers are signed so that negative input can be rejected
/// instead of silently wrapping.
pub type Cents = i64;

/// Validate that an amount moved by an operation is strictly positive.
pub fn ensure_positive(amount: Cents) -> Result<Cents, AmountError> {
    if amount <= 0 {
        return Err(AmountError::NotPositive(amount));
    }
    Ok(amount)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    NotPositive(Cents),
    Negative(Cents),
    Overflow { balance: Cents, amount: Cents },
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::NotPositive(amount) => {
                write!(f, "amount must be positive, got {}", amount)
            }
            AmountError::Negative(amount) => {
                write!(f, "initial balance cannot be negative, got {}", amount)
            }
            AmountError::Overflow { balance, amount } => {
                write!(f, "adding {} to balance {} overflows", amount, balance)
            }
        }
    }
}

impl std::error::Error for AmountError {}
