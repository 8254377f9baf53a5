pub mod db;
pub mod html;

pub use db::DbAdapter;
pub use html::HtmlRenderer;
