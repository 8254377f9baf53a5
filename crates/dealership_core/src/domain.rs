//! crates/dealership_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or template format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Accounts
//=========================================================================================

/// The role of an account. New registrations are always `Client`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccountType {
    #[default]
    Client,
    Employee,
    Admin,
}

impl AccountType {
    /// Employees and admins may manage the inventory.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Employee | Self::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Employee => "Employee",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown account type '{0}'")]
pub struct UnknownAccountType(pub String);

impl FromStr for AccountType {
    type Err = UnknownAccountType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Client" => Ok(Self::Client),
            "Employee" => Ok(Self::Employee),
            "Admin" => Ok(Self::Admin),
            other => Err(UnknownAccountType(other.to_string())),
        }
    }
}

/// A stored account, including the password hash.
/// Only used internally for login and password changes.
#[derive(Debug, Clone)]
pub struct Account {
    pub account_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub account_type: AccountType,
}

impl Account {
    pub fn identity(&self) -> Identity {
        Identity {
            account_id: self.account_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            account_type: self.account_type,
        }
    }
}

/// The non-secret view of an account that travels inside the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub account_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub account_type: AccountType,
}

impl Identity {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Data for a new registration. The hash is computed before it reaches the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

/// Editable profile fields of an account.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub account_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

//=========================================================================================
// Inventory
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub classification_id: i32,
    pub classification_name: String,
}

/// A vehicle in the inventory, joined with its classification name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    pub inv_id: i32,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub description: String,
    pub image: String,
    pub thumbnail: String,
    pub price: f64,
    pub miles: i32,
    pub color: String,
    pub classification_id: i32,
    pub classification_name: String,
}

impl Vehicle {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.make, self.model)
    }
}

/// The writable fields of a vehicle, used both for inserts and updates.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleDraft {
    pub classification_id: i32,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub description: String,
    pub image: String,
    pub thumbnail: String,
    pub price: f64,
    pub miles: i32,
    pub color: String,
}

//=========================================================================================
// Messages
//=========================================================================================

/// A message between two account holders, joined with the sender's name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub message_id: i32,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub to_account: i32,
    pub from_account: i32,
    pub from_name: String,
    pub read: bool,
    pub archived: bool,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub to_account: i32,
    pub from_account: i32,
    pub subject: String,
    pub body: String,
}

/// An account that can be selected as a message recipient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipient {
    pub account_id: i32,
    pub name: String,
}
