pub mod backing;
pub mod config;
pub mod docs;
pub mod domain;
pub mod state;
pub mod store;
