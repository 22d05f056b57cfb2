pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod session_store;
pub mod storage;
