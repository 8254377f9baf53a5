pub mod account;
pub mod context;
pub mod cookies;
pub mod doc;
pub mod error;
pub mod flash;
pub mod gate;
pub mod inventory;
pub mod message;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod view;

// Re-export what the binaries need to assemble the server.
pub use routes::router;
pub use state::AppState;
pub use view::{RenderError, View, ViewRenderer};
