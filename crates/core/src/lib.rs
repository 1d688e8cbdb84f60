//! ocsync core - shared types library.
//!
//! This crate provides the types exchanged between the catalog gateway
//! components:
//! - `gateway` - HTTP gateway and synchronization engine
//! - `cli` - Operator commands (schema, batch finalize, image cleanup)
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, statuses, catalog and order payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
