//! services/site/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`. Every statement is parameterized.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dealership_core::domain::{
    Account, AccountType, AccountUpdate, Classification, Message, NewAccount, NewMessage,
    Recipient, Vehicle, VehicleDraft,
};
use dealership_core::ports::{AccountDirectory, DatabaseService, PortError, PortResult};
use sqlx::{migrate::MigrateError, FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Maps a `sqlx` error onto the port error vocabulary.
fn store_error(what: &str) -> impl Fn(sqlx::Error) -> PortError + '_ {
    move |e| match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(what.to_string()),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(format!("{}: {}", what, db.message()))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            PortError::UnknownReference(format!("{}: {}", what, db.message()))
        }
        _ => PortError::Unexpected(format!("{}: {}", what, e)),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct AccountRecord {
    account_id: i32,
    account_firstname: String,
    account_lastname: String,
    account_email: String,
    account_password: String,
    account_type: String,
}
impl AccountRecord {
    fn to_domain(self) -> PortResult<Account> {
        let account_type = self
            .account_type
            .parse::<AccountType>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Account {
            account_id: self.account_id,
            first_name: self.account_firstname,
            last_name: self.account_lastname,
            email: self.account_email,
            password_hash: self.account_password,
            account_type,
        })
    }
}

#[derive(FromRow)]
struct ClassificationRecord {
    classification_id: i32,
    classification_name: String,
}
impl ClassificationRecord {
    fn to_domain(self) -> Classification {
        Classification {
            classification_id: self.classification_id,
            classification_name: self.classification_name,
        }
    }
}

#[derive(FromRow)]
struct VehicleRecord {
    inv_id: i32,
    inv_make: String,
    inv_model: String,
    inv_year: i32,
    inv_description: String,
    inv_image: String,
    inv_thumbnail: String,
    inv_price: f64,
    inv_miles: i32,
    inv_color: String,
    classification_id: i32,
    classification_name: String,
}
impl VehicleRecord {
    fn to_domain(self) -> Vehicle {
        Vehicle {
            inv_id: self.inv_id,
            make: self.inv_make,
            model: self.inv_model,
            year: self.inv_year,
            description: self.inv_description,
            image: self.inv_image,
            thumbnail: self.inv_thumbnail,
            price: self.inv_price,
            miles: self.inv_miles,
            color: self.inv_color,
            classification_id: self.classification_id,
            classification_name: self.classification_name,
        }
    }
}

#[derive(FromRow)]
struct MessageRecord {
    message_id: i32,
    message_subject: String,
    message_body: String,
    message_created: DateTime<Utc>,
    message_to: i32,
    message_from: i32,
    from_name: String,
    message_read: bool,
    message_archived: bool,
}
impl MessageRecord {
    fn to_domain(self) -> Message {
        Message {
            message_id: self.message_id,
            subject: self.message_subject,
            body: self.message_body,
            created_at: self.message_created,
            to_account: self.message_to,
            from_account: self.message_from,
            from_name: self.from_name,
            read: self.message_read,
            archived: self.message_archived,
        }
    }
}

#[derive(FromRow)]
struct RecipientRecord {
    account_id: i32,
    name: String,
}

//=========================================================================================
// `AccountDirectory` Trait Implementation
//=========================================================================================

#[async_trait]
impl AccountDirectory for DbAdapter {
    async fn email_exists(&self, email: &str) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM account WHERE account_email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("email lookup"))
    }

    async fn email_used_by_other(&self, email: &str, account_id: i32) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM account WHERE account_email = $1 AND account_id <> $2)",
        )
        .bind(email)
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("email lookup"))
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Account Management ---

    async fn create_account(&self, account: NewAccount) -> PortResult<Account> {
        sqlx::query_as::<_, AccountRecord>(
            "INSERT INTO account (account_firstname, account_lastname, account_email, account_password)
             VALUES ($1, $2, $3, $4)
             RETURNING account_id, account_firstname, account_lastname, account_email,
                       account_password, account_type::text AS account_type",
        )
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("account"))?
        .to_domain()
    }

    async fn get_account_by_email(&self, email: &str) -> PortResult<Option<Account>> {
        sqlx::query_as::<_, AccountRecord>(
            "SELECT account_id, account_firstname, account_lastname, account_email,
                    account_password, account_type::text AS account_type
             FROM account WHERE account_email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error("account"))?
        .map(AccountRecord::to_domain)
        .transpose()
    }

    async fn update_account(&self, update: AccountUpdate) -> PortResult<Account> {
        sqlx::query_as::<_, AccountRecord>(
            "UPDATE account
             SET account_firstname = $1, account_lastname = $2, account_email = $3
             WHERE account_id = $4
             RETURNING account_id, account_firstname, account_lastname, account_email,
                       account_password, account_type::text AS account_type",
        )
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(update.account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("account"))?
        .to_domain()
    }

    async fn update_password(&self, account_id: i32, password_hash: &str) -> PortResult<Account> {
        sqlx::query_as::<_, AccountRecord>(
            "UPDATE account SET account_password = $1
             WHERE account_id = $2
             RETURNING account_id, account_firstname, account_lastname, account_email,
                       account_password, account_type::text AS account_type",
        )
        .bind(password_hash)
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("account"))?
        .to_domain()
    }

    // --- Inventory Management ---

    async fn list_classifications(&self) -> PortResult<Vec<Classification>> {
        let records = sqlx::query_as::<_, ClassificationRecord>(
            "SELECT classification_id, classification_name
             FROM classification ORDER BY classification_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error("classifications"))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_classification(
        &self,
        classification_id: i32,
    ) -> PortResult<Option<Classification>> {
        let record = sqlx::query_as::<_, ClassificationRecord>(
            "SELECT classification_id, classification_name
             FROM classification WHERE classification_id = $1",
        )
        .bind(classification_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error("classification"))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn add_classification(&self, name: &str) -> PortResult<Classification> {
        let record = sqlx::query_as::<_, ClassificationRecord>(
            "INSERT INTO classification (classification_name) VALUES ($1)
             RETURNING classification_id, classification_name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("classification"))?;
        Ok(record.to_domain())
    }

    async fn vehicles_by_classification(&self, classification_id: i32) -> PortResult<Vec<Vehicle>> {
        let records = sqlx::query_as::<_, VehicleRecord>(
            "SELECT i.inv_id, i.inv_make, i.inv_model, i.inv_year, i.inv_description,
                    i.inv_image, i.inv_thumbnail, i.inv_price, i.inv_miles, i.inv_color,
                    i.classification_id, c.classification_name
             FROM inventory i
             JOIN classification c ON c.classification_id = i.classification_id
             WHERE i.classification_id = $1
             ORDER BY i.inv_make, i.inv_model",
        )
        .bind(classification_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error("vehicles"))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_vehicle(&self, inv_id: i32) -> PortResult<Option<Vehicle>> {
        let record = sqlx::query_as::<_, VehicleRecord>(
            "SELECT i.inv_id, i.inv_make, i.inv_model, i.inv_year, i.inv_description,
                    i.inv_image, i.inv_thumbnail, i.inv_price, i.inv_miles, i.inv_color,
                    i.classification_id, c.classification_name
             FROM inventory i
             JOIN classification c ON c.classification_id = i.classification_id
             WHERE i.inv_id = $1",
        )
        .bind(inv_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error("vehicle"))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn add_vehicle(&self, draft: VehicleDraft) -> PortResult<Vehicle> {
        let record = sqlx::query_as::<_, VehicleRecord>(
            "WITH inserted AS (
                 INSERT INTO inventory (classification_id, inv_make, inv_model, inv_year,
                     inv_description, inv_image, inv_thumbnail, inv_price, inv_miles, inv_color)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                 RETURNING *
             )
             SELECT i.inv_id, i.inv_make, i.inv_model, i.inv_year, i.inv_description,
                    i.inv_image, i.inv_thumbnail, i.inv_price, i.inv_miles, i.inv_color,
                    i.classification_id, c.classification_name
             FROM inserted i
             JOIN classification c ON c.classification_id = i.classification_id",
        )
        .bind(draft.classification_id)
        .bind(&draft.make)
        .bind(&draft.model)
        .bind(draft.year)
        .bind(&draft.description)
        .bind(&draft.image)
        .bind(&draft.thumbnail)
        .bind(draft.price)
        .bind(draft.miles)
        .bind(&draft.color)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("vehicle"))?;
        Ok(record.to_domain())
    }

    async fn update_vehicle(&self, inv_id: i32, draft: VehicleDraft) -> PortResult<Vehicle> {
        let record = sqlx::query_as::<_, VehicleRecord>(
            "WITH updated AS (
                 UPDATE inventory
                 SET classification_id = $1, inv_make = $2, inv_model = $3, inv_year = $4,
                     inv_description = $5, inv_image = $6, inv_thumbnail = $7,
                     inv_price = $8, inv_miles = $9, inv_color = $10
                 WHERE inv_id = $11
                 RETURNING *
             )
             SELECT i.inv_id, i.inv_make, i.inv_model, i.inv_year, i.inv_description,
                    i.inv_image, i.inv_thumbnail, i.inv_price, i.inv_miles, i.inv_color,
                    i.classification_id, c.classification_name
             FROM updated i
             JOIN classification c ON c.classification_id = i.classification_id",
        )
        .bind(draft.classification_id)
        .bind(&draft.make)
        .bind(&draft.model)
        .bind(draft.year)
        .bind(&draft.description)
        .bind(&draft.image)
        .bind(&draft.thumbnail)
        .bind(draft.price)
        .bind(draft.miles)
        .bind(&draft.color)
        .bind(inv_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("vehicle"))?;
        Ok(record.to_domain())
    }

    async fn delete_vehicle(&self, inv_id: i32) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM inventory WHERE inv_id = $1")
            .bind(inv_id)
            .execute(&self.pool)
            .await
            .map_err(store_error("vehicle"))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("vehicle {}", inv_id)));
        }
        Ok(())
    }

    // --- Messaging ---

    async fn list_recipients(&self) -> PortResult<Vec<Recipient>> {
        let records = sqlx::query_as::<_, RecipientRecord>(
            "SELECT account_id, account_firstname || ' ' || account_lastname AS name
             FROM account ORDER BY account_lastname, account_firstname",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error("recipients"))?;
        Ok(records
            .into_iter()
            .map(|r| Recipient {
                account_id: r.account_id,
                name: r.name,
            })
            .collect())
    }

    async fn create_message(&self, message: NewMessage) -> PortResult<Message> {
        let record = sqlx::query_as::<_, MessageRecord>(
            "WITH inserted AS (
                 INSERT INTO messages (message_subject, message_body, message_to, message_from)
                 VALUES ($1, $2, $3, $4)
                 RETURNING *
             )
             SELECT m.message_id, m.message_subject, m.message_body, m.message_created,
                    m.message_to, m.message_from,
                    a.account_firstname || ' ' || a.account_lastname AS from_name,
                    m.message_read, m.message_archived
             FROM inserted m
             JOIN account a ON a.account_id = m.message_from",
        )
        .bind(&message.subject)
        .bind(&message.body)
        .bind(message.to_account)
        .bind(message.from_account)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("message"))?;
        Ok(record.to_domain())
    }

    async fn get_message(&self, message_id: i32) -> PortResult<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            "SELECT m.message_id, m.message_subject, m.message_body, m.message_created,
                    m.message_to, m.message_from,
                    a.account_firstname || ' ' || a.account_lastname AS from_name,
                    m.message_read, m.message_archived
             FROM messages m
             JOIN account a ON a.account_id = m.message_from
             WHERE m.message_id = $1",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error("message"))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn messages_for(&self, account_id: i32, archived: bool) -> PortResult<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            "SELECT m.message_id, m.message_subject, m.message_body, m.message_created,
                    m.message_to, m.message_from,
                    a.account_firstname || ' ' || a.account_lastname AS from_name,
                    m.message_read, m.message_archived
             FROM messages m
             JOIN account a ON a.account_id = m.message_from
             WHERE m.message_to = $1 AND m.message_archived = $2
             ORDER BY m.message_created DESC, m.message_id DESC",
        )
        .bind(account_id)
        .bind(archived)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error("messages"))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn set_message_read(&self, message_id: i32, read: bool) -> PortResult<()> {
        let result = sqlx::query("UPDATE messages SET message_read = $1 WHERE message_id = $2")
            .bind(read)
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(store_error("message"))?;
        found(result.rows_affected(), message_id)
    }

    async fn archive_message(&self, message_id: i32) -> PortResult<()> {
        let result =
            sqlx::query("UPDATE messages SET message_archived = TRUE WHERE message_id = $1")
                .bind(message_id)
                .execute(&self.pool)
                .await
                .map_err(store_error("message"))?;
        found(result.rows_affected(), message_id)
    }

    async fn delete_message(&self, message_id: i32) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM messages WHERE message_id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(store_error("message"))?;
        found(result.rows_affected(), message_id)
    }

    async fn count_unread(&self, account_id: i32) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages
             WHERE message_to = $1 AND message_read = FALSE AND message_archived = FALSE",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("message count"))
    }

    async fn count_archived(&self, account_id: i32) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE message_to = $1 AND message_archived = TRUE",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("message count"))
    }
}

fn found(rows_affected: u64, message_id: i32) -> PortResult<()> {
    if rows_affected == 0 {
        return Err(PortError::NotFound(format!("message {}", message_id)));
    }
    Ok(())
}
