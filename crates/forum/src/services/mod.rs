//! Business logic services for the forum.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `forum` - Thread and reply lifecycle
//! - `authorization` - Author-only checks for edits and deletes

pub mod auth;
pub mod authorization;
pub mod forum;
