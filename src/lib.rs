//! Smart Kissan: chat client engine and webhook relay for farmers' queries.

pub mod config;
pub mod conversations;
pub mod error;
pub mod i18n;
pub mod routes;
pub mod speech;
pub mod state;
pub mod webhook;

pub use config::Config;
pub use conversations::ChatSession;
pub use i18n::Language;
pub use state::AppState;
