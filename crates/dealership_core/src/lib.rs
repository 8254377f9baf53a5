pub mod domain;
pub mod ports;
pub mod rules;
pub mod validation;

pub use domain::{
    Account, AccountType, AccountUpdate, Classification, Identity, Message, NewAccount,
    NewMessage, Recipient, Vehicle, VehicleDraft,
};
pub use ports::{AccountDirectory, DatabaseService, PortError, PortResult};
pub use validation::{ErrorSet, FieldError, FormInput, RuleSet};
