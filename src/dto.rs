use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator;
use crate::{Error, Result};

pub(crate) fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Incoming,
    Outgoing,
}

/// Every transaction recorded by the ledger is completed; there is no
/// pending/failed lifecycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    Card,
    BankAccount,
    Wallet,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    pub user_id: String,
    pub kind: PaymentMethodKind,
    pub label: String,
    /// Masked instrument number, e.g. `**** **** **** 4242`.
    pub number: String,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Instrument data for [`crate::PaymentMethodRegistry::add`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentMethod {
    pub kind: PaymentMethodKind,
    pub label: String,
    pub number: String,
    pub expires: Option<String>,
}

impl NewPaymentMethod {
    pub fn new(
        kind: PaymentMethodKind,
        label: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            number: number.into(),
            expires: None,
        }
    }

    pub fn expires(mut self, expires: impl Into<String>) -> Self {
        self.expires = Some(expires.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_non_empty("label", &self.label)?;
        require_non_empty("number", &self.number)
    }
}

/// Partial update of a payment method.
///
/// Only instrument fields can be patched. `id`, `userId` and `isDefault` are
/// not reachable from here; promotion goes through `set_default`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentMethodPatch {
    kind: Option<PaymentMethodKind>,
    label: Option<String>,
    number: Option<String>,
    expires: Option<Option<String>>,
}

impl PaymentMethodPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: PaymentMethodKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    /// `None` clears the expiry.
    pub fn expires(mut self, expires: Option<String>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(label) = &self.label {
            require_non_empty("label", label)?;
        }
        if let Some(number) = &self.number {
            require_non_empty("number", number)?;
        }
        Ok(())
    }

    pub(crate) fn apply_to(self, method: &mut PaymentMethod) {
        if let Some(kind) = self.kind {
            method.kind = kind;
        }
        if let Some(label) = self.label {
            method.label = label;
        }
        if let Some(number) = self.number {
            method.number = number;
        }
        if let Some(expires) = self.expires {
            method.expires = expires;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// True if `user_id` is the actor or the recipient.
    pub fn involves(&self, user_id: &str) -> bool {
        self.user_id == user_id || self.recipient_id.as_deref() == Some(user_id)
    }
}

/// Data for [`crate::TransactionLedger::append`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_id: String,
    pub recipient_id: Option<String>,
    pub tx_type: TransactionType,
    pub amount: Decimal,
    pub payment_method_id: Option<String>,
    pub description: String,
    /// Defaults to the ledger clock when absent.
    pub created_at: Option<DateTime<Utc>>,
}

impl NewTransaction {
    pub fn new(user_id: impl Into<String>, tx_type: TransactionType, amount: Decimal) -> Self {
        Self {
            user_id: user_id.into(),
            recipient_id: None,
            tx_type,
            amount,
            payment_method_id: None,
            description: String::new(),
            created_at: None,
        }
    }

    pub fn recipient(mut self, recipient_id: impl Into<String>) -> Self {
        self.recipient_id = Some(recipient_id.into());
        self
    }

    pub fn payment_method(mut self, payment_method_id: impl Into<String>) -> Self {
        self.payment_method_id = Some(payment_method_id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_non_empty("userId", &self.user_id)?;
        if self.amount < Decimal::ZERO {
            return Err(Error::InvalidInput(format!(
                "amount must not be negative, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}

/// Optional constraints for [`crate::TransactionLedger::query`]. An empty
/// filter matches everything the user is involved in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub tx_type: Option<TransactionType>,
    pub payment_method_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tx_type(mut self, tx_type: TransactionType) -> Self {
        self.tx_type = Some(tx_type);
        self
    }

    pub fn payment_method(mut self, payment_method_id: impl Into<String>) -> Self {
        self.payment_method_id = Some(payment_method_id.into());
        self
    }

    pub fn start_date(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn end_date(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(end);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(Error::InvalidInput(format!(
                    "startDate {start} is after endDate {end}"
                )));
            }
        }
        Ok(())
    }

    /// Checks the filter constraints only; user involvement is checked by the ledger.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        if self.tx_type.is_some_and(|t| t != transaction.tx_type) {
            return false;
        }
        if let Some(method_id) = &self.payment_method_id {
            if transaction.payment_method_id.as_ref() != Some(method_id) {
                return false;
            }
        }
        if self.start_date.is_some_and(|start| transaction.created_at < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| transaction.created_at > end) {
            return false;
        }
        true
    }
}

/// One line of a user's statement: the transaction seen from that user's side.
#[derive(Debug, Serialize, PartialEq)]
pub struct StatementRow {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub counterparty: Option<String>,
    /// Positive when the user was credited, negative when debited.
    pub amount: Decimal,
    pub payment_method_id: Option<String>,
    pub description: String,
}

impl StatementRow {
    pub fn for_user(user_id: &str, transaction: &Transaction) -> Self {
        let counterparty = if transaction.user_id == user_id {
            transaction.recipient_id.clone().filter(|r| r != user_id)
        } else {
            Some(transaction.user_id.clone())
        };
        let amount = match aggregator::direction_for(user_id, transaction) {
            Some(TransactionType::Outgoing) => -transaction.amount,
            _ => transaction.amount,
        };
        Self {
            id: transaction.id.clone(),
            created_at: transaction.created_at,
            tx_type: transaction.tx_type,
            counterparty,
            amount,
            payment_method_id: transaction.payment_method_id.clone(),
            description: transaction.description.clone(),
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}
