//! Shared fixtures for the router tests: an in-memory store, a renderer that
//! emits the view as JSON, and request/response helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use chrono::Utc;
use dealership_core::domain::{
    Account, AccountType, AccountUpdate, Classification, Identity, Message, NewAccount,
    NewMessage, Recipient, Vehicle, VehicleDraft,
};
use dealership_core::ports::{AccountDirectory, DatabaseService, PortError, PortResult};
use serde_json::Value;
use site_lib::auth::{Passwords, SessionKeys};
use site_lib::web::{router, AppState, RenderError, View, ViewRenderer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use url::form_urlencoded;

pub const PASSWORD: &str = "Str0ng!Passw0rd12";
pub const SECRET: &str = "integration-test-secret";

//=========================================================================================
// In-memory Store
//=========================================================================================

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    classifications: Vec<Classification>,
    vehicles: Vec<Vehicle>,
    messages: Vec<Message>,
}

fn next_id(ids: impl Iterator<Item = i32>) -> i32 {
    ids.max().unwrap_or(0) + 1
}

/// A `DatabaseService` over plain vectors, with the same uniqueness and
/// reference rules as the SQL schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    broken_writes: AtomicBool,
    panicking_reads: AtomicBool,
}

impl MemoryStore {
    /// Every later write fails as if the database connection dropped.
    pub fn break_writes(&self) {
        self.broken_writes.store(true, Ordering::SeqCst);
    }

    /// Every later classification listing panics.
    pub fn panic_on_reads(&self) {
        self.panicking_reads.store(true, Ordering::SeqCst);
    }

    fn writable(&self, what: &str) -> PortResult<()> {
        if self.broken_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected(format!("{}: connection reset", what)));
        }
        Ok(())
    }

    pub fn insert_account(&self, account: NewAccount, account_type: AccountType) -> Account {
        let mut t = self.tables.lock().unwrap();
        let account = Account {
            account_id: next_id(t.accounts.iter().map(|a| a.account_id)),
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            password_hash: account.password_hash,
            account_type,
        };
        t.accounts.push(account.clone());
        account
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.tables.lock().unwrap().accounts.clone()
    }

    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.tables.lock().unwrap().vehicles.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.tables.lock().unwrap().messages.clone()
    }

    pub fn classification_named(&self, name: &str) -> Option<Classification> {
        self.tables
            .lock()
            .unwrap()
            .classifications
            .iter()
            .find(|c| c.classification_name == name)
            .cloned()
    }
}

fn vehicle_from(t: &Tables, inv_id: i32, draft: VehicleDraft) -> PortResult<Vehicle> {
    let classification = t
        .classifications
        .iter()
        .find(|c| c.classification_id == draft.classification_id)
        .ok_or_else(|| PortError::UnknownReference(format!("classification {}", draft.classification_id)))?;
    Ok(Vehicle {
        inv_id,
        make: draft.make,
        model: draft.model,
        year: draft.year,
        description: draft.description,
        image: draft.image,
        thumbnail: draft.thumbnail,
        price: draft.price,
        miles: draft.miles,
        color: draft.color,
        classification_id: classification.classification_id,
        classification_name: classification.classification_name.clone(),
    })
}

#[async_trait]
impl AccountDirectory for MemoryStore {
    async fn email_exists(&self, email: &str) -> PortResult<bool> {
        Ok(self.tables.lock().unwrap().accounts.iter().any(|a| a.email == email))
    }

    async fn email_used_by_other(&self, email: &str, account_id: i32) -> PortResult<bool> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .accounts
            .iter()
            .any(|a| a.email == email && a.account_id != account_id))
    }
}

#[async_trait]
impl DatabaseService for MemoryStore {
    async fn create_account(&self, account: NewAccount) -> PortResult<Account> {
        self.writable("create_account")?;
        if self.email_exists(&account.email).await? {
            return Err(PortError::Conflict(account.email));
        }
        Ok(self.insert_account(account, AccountType::Client))
    }

    async fn get_account_by_email(&self, email: &str) -> PortResult<Option<Account>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn update_account(&self, update: AccountUpdate) -> PortResult<Account> {
        self.writable("update_account")?;
        let mut t = self.tables.lock().unwrap();
        if t
            .accounts
            .iter()
            .any(|a| a.email == update.email && a.account_id != update.account_id)
        {
            return Err(PortError::Conflict(update.email));
        }
        let account = t
            .accounts
            .iter_mut()
            .find(|a| a.account_id == update.account_id)
            .ok_or_else(|| PortError::NotFound(format!("account {}", update.account_id)))?;
        account.first_name = update.first_name;
        account.last_name = update.last_name;
        account.email = update.email;
        Ok(account.clone())
    }

    async fn update_password(&self, account_id: i32, password_hash: &str) -> PortResult<Account> {
        self.writable("update_password")?;
        let mut t = self.tables.lock().unwrap();
        let account = t
            .accounts
            .iter_mut()
            .find(|a| a.account_id == account_id)
            .ok_or_else(|| PortError::NotFound(format!("account {}", account_id)))?;
        account.password_hash = password_hash.to_string();
        Ok(account.clone())
    }

    async fn list_classifications(&self) -> PortResult<Vec<Classification>> {
        if self.panicking_reads.load(Ordering::SeqCst) {
            panic!("classification table is corrupt");
        }
        let mut list = self.tables.lock().unwrap().classifications.clone();
        list.sort_by(|a, b| a.classification_name.cmp(&b.classification_name));
        Ok(list)
    }

    async fn get_classification(&self, classification_id: i32) -> PortResult<Option<Classification>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .classifications
            .iter()
            .find(|c| c.classification_id == classification_id)
            .cloned())
    }

    async fn add_classification(&self, name: &str) -> PortResult<Classification> {
        self.writable("add_classification")?;
        let mut t = self.tables.lock().unwrap();
        if t.classifications.iter().any(|c| c.classification_name == name) {
            return Err(PortError::Conflict(name.to_string()));
        }
        let classification = Classification {
            classification_id: next_id(t.classifications.iter().map(|c| c.classification_id)),
            classification_name: name.to_string(),
        };
        t.classifications.push(classification.clone());
        Ok(classification)
    }

    async fn vehicles_by_classification(&self, classification_id: i32) -> PortResult<Vec<Vehicle>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .vehicles
            .iter()
            .filter(|v| v.classification_id == classification_id)
            .cloned()
            .collect())
    }

    async fn get_vehicle(&self, inv_id: i32) -> PortResult<Option<Vehicle>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .vehicles
            .iter()
            .find(|v| v.inv_id == inv_id)
            .cloned())
    }

    async fn add_vehicle(&self, draft: VehicleDraft) -> PortResult<Vehicle> {
        self.writable("add_vehicle")?;
        let mut t = self.tables.lock().unwrap();
        let inv_id = next_id(t.vehicles.iter().map(|v| v.inv_id));
        let vehicle = vehicle_from(&t, inv_id, draft)?;
        t.vehicles.push(vehicle.clone());
        Ok(vehicle)
    }

    async fn update_vehicle(&self, inv_id: i32, draft: VehicleDraft) -> PortResult<Vehicle> {
        self.writable("update_vehicle")?;
        let mut t = self.tables.lock().unwrap();
        let vehicle = vehicle_from(&t, inv_id, draft)?;
        let slot = t
            .vehicles
            .iter_mut()
            .find(|v| v.inv_id == inv_id)
            .ok_or_else(|| PortError::NotFound(format!("vehicle {}", inv_id)))?;
        *slot = vehicle.clone();
        Ok(vehicle)
    }

    async fn delete_vehicle(&self, inv_id: i32) -> PortResult<()> {
        self.writable("delete_vehicle")?;
        let mut t = self.tables.lock().unwrap();
        let before = t.vehicles.len();
        t.vehicles.retain(|v| v.inv_id != inv_id);
        if t.vehicles.len() == before {
            return Err(PortError::NotFound(format!("vehicle {}", inv_id)));
        }
        Ok(())
    }

    async fn list_recipients(&self) -> PortResult<Vec<Recipient>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .accounts
            .iter()
            .map(|a| Recipient {
                account_id: a.account_id,
                name: format!("{} {}", a.first_name, a.last_name),
            })
            .collect())
    }

    async fn create_message(&self, message: NewMessage) -> PortResult<Message> {
        self.writable("create_message")?;
        let mut t = self.tables.lock().unwrap();
        if !t.accounts.iter().any(|a| a.account_id == message.to_account) {
            return Err(PortError::UnknownReference(format!("account {}", message.to_account)));
        }
        let sender = t
            .accounts
            .iter()
            .find(|a| a.account_id == message.from_account)
            .ok_or_else(|| PortError::UnknownReference(format!("account {}", message.from_account)))?;
        let message = Message {
            message_id: next_id(t.messages.iter().map(|m| m.message_id)),
            subject: message.subject,
            body: message.body,
            created_at: Utc::now(),
            to_account: message.to_account,
            from_account: message.from_account,
            from_name: format!("{} {}", sender.first_name, sender.last_name),
            read: false,
            archived: false,
        };
        t.messages.push(message.clone());
        Ok(message)
    }

    async fn get_message(&self, message_id: i32) -> PortResult<Option<Message>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .messages
            .iter()
            .find(|m| m.message_id == message_id)
            .cloned())
    }

    async fn messages_for(&self, account_id: i32, archived: bool) -> PortResult<Vec<Message>> {
        let mut list: Vec<Message> = self
            .tables
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.to_account == account_id && m.archived == archived)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.message_id.cmp(&a.message_id));
        Ok(list)
    }

    async fn set_message_read(&self, message_id: i32, read: bool) -> PortResult<()> {
        self.writable("set_message_read")?;
        self.update_message(message_id, |m| m.read = read)
    }

    async fn archive_message(&self, message_id: i32) -> PortResult<()> {
        self.writable("archive_message")?;
        self.update_message(message_id, |m| m.archived = true)
    }

    async fn delete_message(&self, message_id: i32) -> PortResult<()> {
        self.writable("delete_message")?;
        let mut t = self.tables.lock().unwrap();
        let before = t.messages.len();
        t.messages.retain(|m| m.message_id != message_id);
        if t.messages.len() == before {
            return Err(PortError::NotFound(format!("message {}", message_id)));
        }
        Ok(())
    }

    async fn count_unread(&self, account_id: i32) -> PortResult<i64> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.to_account == account_id && !m.read && !m.archived)
            .count() as i64)
    }

    async fn count_archived(&self, account_id: i32) -> PortResult<i64> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.to_account == account_id && m.archived)
            .count() as i64)
    }
}

impl MemoryStore {
    fn update_message(&self, message_id: i32, change: impl FnOnce(&mut Message)) -> PortResult<()> {
        let mut t = self.tables.lock().unwrap();
        let message = t
            .messages
            .iter_mut()
            .find(|m| m.message_id == message_id)
            .ok_or_else(|| PortError::NotFound(format!("message {}", message_id)))?;
        change(message);
        Ok(())
    }
}

//=========================================================================================
// JSON View Renderer
//=========================================================================================

/// Renders the whole view as JSON so tests can assert on what a page received.
pub struct JsonRenderer;

impl ViewRenderer for JsonRenderer {
    fn render(&self, view: &View) -> Result<String, RenderError> {
        serde_json::to_string(view).map_err(|e| RenderError {
            template: view.template.to_string(),
            reason: e.to_string(),
        })
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

//=========================================================================================
// Test Application
//=========================================================================================

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub sessions: SessionKeys,
    pub passwords: Passwords,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let passwords = Passwords::with_cost(1024, 1).unwrap();
        let sessions = SessionKeys::new(SECRET.as_bytes(), Duration::from_secs(3600), false);

        let state = Arc::new(AppState {
            db: store.clone(),
            views: Arc::new(JsonRenderer),
            passwords: passwords.clone(),
            sessions: sessions.clone(),
        });

        Self {
            router: router(state),
            store,
            sessions,
            passwords,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Stores an account with `PASSWORD` and returns its identity.
    pub async fn account(&self, first: &str, last: &str, email: &str, kind: AccountType) -> Identity {
        let password_hash = self.passwords.hash(PASSWORD.to_string()).await.unwrap();
        self.store
            .insert_account(
                NewAccount {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    email: email.to_string(),
                    password_hash,
                },
                kind,
            )
            .identity()
    }

    /// A `Cookie` header value carrying a fresh session for `identity`.
    pub fn session_for(&self, identity: &Identity) -> String {
        format!("jwt={}", self.sessions.issue(identity).unwrap())
    }
}

//=========================================================================================
// Request and Response Helpers
//=========================================================================================

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, fields: &[(&str, &str)], cookie: Option<&str>) -> Request<Body> {
    let body = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

/// The rendered view of a JSON-rendered page.
pub async fn page(res: Response<Body>) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// The full `Set-Cookie` header for the named cookie, if the response sets it.
pub fn set_cookie(res: &Response<Body>, name: &str) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", name)))
        .map(str::to_string)
}

/// The `name=value` pair of a `Set-Cookie` header, ready to send back.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().to_string()
}

pub fn notices(page: &Value) -> Vec<String> {
    page["notices"]
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|n| n.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// The message recorded for `field` in a page's error set.
pub fn error_for(page: &Value, field: &str) -> Option<String> {
    page["errors"].as_array()?.iter().find_map(|e| {
        (e["field"] == field).then(|| e["message"].as_str().unwrap_or_default().to_string())
    })
}
