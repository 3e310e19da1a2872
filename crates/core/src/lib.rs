pub mod app_state;
pub mod clients;
pub mod services;
pub mod store;

pub use app_state::AppState;
