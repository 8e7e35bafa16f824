//! Ledger domain types: accounts, ledger entries, and operation receipts.

use chrono::{DateTime, Utc};
use quetzal_shared::types::{AccountId, Currency, Money, TransactionId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// External 10-digit account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(i64);

impl AccountNumber {
    /// Smallest valid account number.
    pub const MIN: i64 = 1_000_000_000;
    /// Largest valid account number.
    pub const MAX: i64 = 9_999_999_999;

    /// Wraps a raw number, rejecting values outside the 10-digit range.
    #[must_use]
    pub const fn new(value: i64) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Wraps a raw number, clamping it into the 10-digit range.
    #[must_use]
    pub const fn saturating(value: i64) -> Self {
        if value < Self::MIN {
            Self(Self::MIN)
        } else if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    /// Returns the raw number.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AccountNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid account number: {s}"))?;
        Self::new(value).ok_or_else(|| format!("Account number out of range: {s}"))
    }
}

/// Kind of bank account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Checking / monetary account.
    Monetary,
    /// Savings account.
    Savings,
}

impl AccountType {
    /// Returns the stored name of the account type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monetary => "Monetary",
            Self::Savings => "Savings",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of money movement recorded on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Funds added to an account.
    Deposit,
    /// Funds taken out of an account.
    Withdrawal,
    /// Funds moved between two accounts.
    Transfer,
    /// A deposit undone by a privileged actor.
    DepositReversal,
}

impl TransactionType {
    /// Returns the stored name of the transaction type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdrawal => "WITHDRAWAL",
            Self::Transfer => "TRANSFER",
            Self::DepositReversal => "DEPOSIT_REVERSAL",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bank account.
///
/// # Invariants
///
/// - `balance` is never negative after a successful operation
/// - `account_number`, `owner_id`, `currency`, and `account_type` never change
/// - `version` increases by one on every write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Store identifier.
    pub id: AccountId,
    /// External 10-digit number.
    pub account_number: AccountNumber,
    /// Owning user.
    pub owner_id: UserId,
    /// Denomination.
    pub currency: Currency,
    /// Account kind.
    pub account_type: AccountType,
    /// Current balance in `currency`.
    pub balance: Decimal,
    /// False once the account has been soft-deleted.
    pub is_active: bool,
    /// Bookmarked account for quick transfers. Lookup only.
    pub favorite_account_id: Option<AccountId>,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Builds a fresh, active, zero-balance account.
    #[must_use]
    pub fn open(
        account_number: AccountNumber,
        owner_id: UserId,
        currency: Currency,
        account_type: AccountType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            account_number,
            owner_id,
            currency,
            account_type,
            balance: Decimal::ZERO,
            is_active: true,
            favorite_account_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current balance with its currency.
    #[must_use]
    pub fn balance_money(&self) -> Money {
        Money::new(self.balance, self.currency)
    }

    /// Wraps an amount in this account's currency.
    #[must_use]
    pub fn money(&self, amount: Decimal) -> Money {
        Money::new(amount, self.currency)
    }

    /// Returns true if the balance covers `amount`.
    #[must_use]
    pub fn can_cover(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Entry id.
    pub id: TransactionId,
    /// Source account (the only account for deposits, withdrawals, and reversals).
    pub from_account_number: AccountNumber,
    /// Destination account, transfers only.
    pub to_account_number: Option<AccountNumber>,
    /// Amount in the source account's currency.
    pub amount: Decimal,
    /// Movement kind.
    pub transaction_type: TransactionType,
    /// Source account currency.
    pub currency: Currency,
    /// Destination currency when a transfer crossed currencies.
    pub converted_to: Option<Currency>,
    /// Amount credited in `converted_to`.
    pub converted_amount: Option<Decimal>,
    /// Acting user.
    pub owner_id: UserId,
    /// The deposit a reversal undoes.
    pub original_transaction_id: Option<TransactionId>,
    /// Creation time; orders history and bounds the reversal window.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a single-account entry (deposit, withdrawal, or reversal).
    #[must_use]
    pub fn single(
        transaction_type: TransactionType,
        account: &Account,
        amount: Decimal,
        owner_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            from_account_number: account.account_number,
            to_account_number: None,
            amount,
            transaction_type,
            currency: account.currency,
            converted_to: None,
            converted_amount: None,
            owner_id,
            original_transaction_id: None,
            created_at,
        }
    }

    /// Returns true if the entry debits or credits `number`.
    #[must_use]
    pub fn touches(&self, number: AccountNumber) -> bool {
        self.from_account_number == number || self.to_account_number == Some(number)
    }

    /// Amount credited to the destination account, in its currency.
    #[must_use]
    pub fn credited_amount(&self) -> Decimal {
        self.converted_amount.unwrap_or(self.amount)
    }

    /// Absolute amount this entry moved through `number`.
    #[must_use]
    pub fn movement_for(&self, number: AccountNumber) -> Decimal {
        let mut total = Decimal::ZERO;
        if self.from_account_number == number {
            total = total.saturating_add(self.amount);
        }
        if self.to_account_number == Some(number) {
            total = total.saturating_add(self.credited_amount());
        }
        total
    }
}

/// Request to open an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAccountRequest {
    /// Denomination.
    pub currency: Currency,
    /// Account kind.
    pub account_type: AccountType,
    /// Owner when a privileged actor opens on behalf of a user.
    #[serde(default)]
    pub owner_id: Option<UserId>,
}

/// Result of a deposit, withdrawal, or reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementReceipt {
    /// Affected account.
    pub account_number: AccountNumber,
    /// Amount moved.
    pub amount: Money,
    /// Balance after the movement.
    pub balance: Money,
    /// The recorded ledger entry.
    pub transaction: Transaction,
}

/// Result of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    /// Debited account.
    pub from_account_number: AccountNumber,
    /// Credited account.
    pub to_account_number: AccountNumber,
    /// Amount debited, in the source currency.
    pub amount: Money,
    /// Amount credited, in the destination currency.
    pub converted_amount: Money,
    /// Source balance after the transfer.
    pub source_balance: Money,
    /// The recorded ledger entry.
    pub transaction: Transaction,
}

/// Aggregate movement through one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountActivity {
    /// The account.
    pub account_number: AccountNumber,
    /// Sum of amounts debited from and credited to the account.
    pub total_movement: Decimal,
    /// Number of ledger entries touching the account.
    pub transaction_count: u64,
}

/// An account with its most recent movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountDetail {
    /// The account.
    pub account: Account,
    /// Latest entries, newest first.
    pub recent_transactions: Vec<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[rstest]
    #[case(999_999_999, false)]
    #[case(1_000_000_000, true)]
    #[case(9_999_999_999, true)]
    #[case(10_000_000_000, false)]
    fn test_account_number_range(#[case] raw: i64, #[case] valid: bool) {
        assert_eq!(AccountNumber::new(raw).is_some(), valid);
    }

    #[test]
    fn test_account_number_parse() {
        let number = AccountNumber::from_str("1234567890").unwrap();
        assert_eq!(number.value(), 1_234_567_890);
        assert!(AccountNumber::from_str("12345").is_err());
        assert!(AccountNumber::from_str("abc").is_err());
    }

    #[test]
    fn test_open_account_starts_empty_and_active() {
        let number = AccountNumber::new(1_234_567_890).unwrap();
        let account = Account::open(number, UserId::new(), Currency::Gtq, AccountType::Savings, Utc::now());
        assert_eq!(account.balance, Decimal::ZERO);
        assert!(account.is_active);
        assert_eq!(account.version, 0);
        assert!(account.favorite_account_id.is_none());
    }

    #[test]
    fn test_transfer_movement_counts_both_sides() {
        let a = AccountNumber::new(1_000_000_001).unwrap();
        let b = AccountNumber::new(1_000_000_002).unwrap();
        let entry = Transaction {
            id: TransactionId::new(),
            from_account_number: a,
            to_account_number: Some(b),
            amount: dec!(30),
            transaction_type: TransactionType::Transfer,
            currency: Currency::Usd,
            converted_to: Some(Currency::Gtq),
            converted_amount: Some(dec!(232.5)),
            owner_id: UserId::new(),
            original_transaction_id: None,
            created_at: Utc::now(),
        };
        assert!(entry.touches(a));
        assert!(entry.touches(b));
        assert_eq!(entry.movement_for(a), dec!(30));
        assert_eq!(entry.movement_for(b), dec!(232.5));
        assert_eq!(entry.movement_for(AccountNumber::new(1_000_000_003).unwrap()), Decimal::ZERO);
    }

    #[test]
    fn test_movement_saturates_instead_of_overflowing() {
        let a = AccountNumber::new(1_000_000_001).unwrap();
        let entry = Transaction {
            id: TransactionId::new(),
            from_account_number: a,
            to_account_number: Some(a),
            amount: Decimal::MAX,
            transaction_type: TransactionType::Transfer,
            currency: Currency::Usd,
            converted_to: None,
            converted_amount: Some(Decimal::MAX),
            owner_id: UserId::new(),
            original_transaction_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(entry.movement_for(a), Decimal::MAX);
    }

    #[test]
    fn test_transaction_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&TransactionType::DepositReversal).unwrap(),
            "\"DEPOSIT_REVERSAL\""
        );
        assert_eq!(TransactionType::Withdrawal.to_string(), "WITHDRAWAL");
    }
}
