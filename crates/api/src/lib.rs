pub mod errors;
pub mod handlers;
pub mod models;

pub use errors::ApiError;
pub use handlers::{dispatch, list_servers};
pub use models::AppState;
