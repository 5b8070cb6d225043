//! Integration tests for odds-watch

mod config_test;
mod engine_test;
mod support;
