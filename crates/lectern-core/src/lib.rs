//! Core types and trait definitions for the Lectern progress tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; storage backends implement the traits in
//! [`store`], and the presentation layer consumes [`aggregate`], [`view`] and
//! [`tracker`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod catalog;
pub mod error;
pub mod identity;
pub mod import;
pub mod memory;
pub mod progress;
pub mod store;
pub mod tracker;
pub mod view;

pub use error::{Error, Result};
