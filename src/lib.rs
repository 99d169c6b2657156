pub mod aggregate;
pub mod app;
pub mod assets;
pub mod config;
pub mod errors;
pub mod format;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod shell;
pub mod state;
pub mod storage;
pub mod tabs;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
