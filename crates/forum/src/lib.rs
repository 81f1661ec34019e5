//! Coding Gurus forum library.
//!
//! A server-rendered discussion forum: members register, open threads,
//! reply, and edit or delete what they wrote. The binary in `main.rs` wires
//! this library to `PostgreSQL`; the integration tests wire it to the
//! in-memory repositories (feature `testing`).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

pub use app::{App, build_app};
