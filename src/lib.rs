pub mod errors;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;
pub mod store;

pub use errors::{AppError, LlmError};
pub use state::AppState;
