//! Domain types for wallets (cash, bank, and e-wallet accounts).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{Displayable, Identifiable, NamedEntity};

/// A money container owned by one user. The balance is kept in minor
/// currency units and always reflects the signed sum of the wallet's
/// transactions on top of the balance it was created with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wallet {
    pub id: Uuid,
    pub name: String,
    pub kind: WalletKind,
    pub balance: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(name: impl Into<String>, kind: WalletKind, balance: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            balance,
            icon: None,
            color: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

impl Identifiable for Wallet {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Wallet {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Wallet {
    fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.kind)
    }
}

/// Supported wallet flavours.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    Cash,
    Bank,
    Ewallet,
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WalletKind::Cash => "cash",
            WalletKind::Bank => "bank",
            WalletKind::Ewallet => "ewallet",
        };
        f.write_str(label)
    }
}
