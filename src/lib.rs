//! Email warmup dashboard: live views over a realtime document store plus
//! the account actions that talk to the warmup backend.

pub mod actions;
pub mod auth;
pub mod backend;
pub mod config;
pub mod context;
pub mod domain;
pub mod event;
pub mod store;
pub mod sync;
pub mod terminal;
