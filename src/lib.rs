// Library surface shared by the binary and the integration tests.
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod persistence;
pub mod render;
pub mod storage;
pub mod store;
pub mod validation;
pub mod workout;
