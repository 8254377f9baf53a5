//! crates/dealership_core/src/ports.rs
//!
//! Defines the storage contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the relational store behind them.

use async_trait::async_trait;

use crate::domain::{
    Account, AccountUpdate, Classification, Message, NewAccount, NewMessage, Recipient, Vehicle,
    VehicleDraft,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the underlying store.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    /// A write named a related row that does not exist.
    #[error("Unknown reference: {0}")]
    UnknownReference(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The email lookups the validation pipeline needs.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// True when any account uses `email`.
    async fn email_exists(&self, email: &str) -> PortResult<bool>;

    /// True when an account other than `account_id` uses `email`.
    async fn email_used_by_other(&self, email: &str, account_id: i32) -> PortResult<bool>;
}

#[async_trait]
pub trait DatabaseService: AccountDirectory {
    // --- Account Management ---
    async fn create_account(&self, account: NewAccount) -> PortResult<Account>;

    async fn get_account_by_email(&self, email: &str) -> PortResult<Option<Account>>;

    async fn update_account(&self, update: AccountUpdate) -> PortResult<Account>;

    async fn update_password(&self, account_id: i32, password_hash: &str) -> PortResult<Account>;

    // --- Inventory Management ---
    async fn list_classifications(&self) -> PortResult<Vec<Classification>>;

    async fn get_classification(&self, classification_id: i32)
        -> PortResult<Option<Classification>>;

    async fn add_classification(&self, name: &str) -> PortResult<Classification>;

    async fn vehicles_by_classification(&self, classification_id: i32) -> PortResult<Vec<Vehicle>>;

    async fn get_vehicle(&self, inv_id: i32) -> PortResult<Option<Vehicle>>;

    async fn add_vehicle(&self, draft: VehicleDraft) -> PortResult<Vehicle>;

    async fn update_vehicle(&self, inv_id: i32, draft: VehicleDraft) -> PortResult<Vehicle>;

    async fn delete_vehicle(&self, inv_id: i32) -> PortResult<()>;

    // --- Messaging ---
    async fn list_recipients(&self) -> PortResult<Vec<Recipient>>;

    async fn create_message(&self, message: NewMessage) -> PortResult<Message>;

    async fn get_message(&self, message_id: i32) -> PortResult<Option<Message>>;

    /// Messages addressed to the account, filtered by their archived flag, newest first.
    async fn messages_for(&self, account_id: i32, archived: bool) -> PortResult<Vec<Message>>;

    async fn set_message_read(&self, message_id: i32, read: bool) -> PortResult<()>;

    async fn archive_message(&self, message_id: i32) -> PortResult<()>;

    async fn delete_message(&self, message_id: i32) -> PortResult<()>;

    async fn count_unread(&self, account_id: i32) -> PortResult<i64>;

    async fn count_archived(&self, account_id: i32) -> PortResult<i64>;
}
