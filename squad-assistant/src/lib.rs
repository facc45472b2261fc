// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod app;
pub mod config;
pub mod console;
pub mod llm;
pub mod protocol;
pub mod reference;
pub mod roster;
pub mod session;
pub mod view;
