//! PideAI Storefront library.
//!
//! The cart runtime and its HTTP surface, built on the pure engine in
//! `pideai_core`. Provided as a library so the binary, the CLI and the
//! integration tests share one implementation.
//!
//! # Modules
//!
//! - [`cart`] - Cart store lifecycle, background writes, per-token registry
//! - [`storage`] - Persistence backends (memory, file, `PostgreSQL`)
//! - [`catalog`] - Catalog lookups and schema cache
//! - [`analytics`] / [`report`] - Best-effort event and fault delivery
//! - [`routes`] - JSON API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod report;
pub mod routes;
pub mod state;
pub mod storage;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
