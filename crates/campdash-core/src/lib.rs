//! Core types and trait definitions for the campaign dashboard.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! holds the domain model, the [`store::ReportStore`] abstraction, the
//! live-window fetch policy, the revenue matcher and the read-path grouping.

// Native `async fn` in traits, same as the store backends expect.
#![allow(async_fn_in_trait)]

pub mod campaign;
pub mod error;
pub mod matcher;
pub mod metrics;
pub mod report;
pub mod revenue;
pub mod store;
pub mod tenant;
pub mod window;

pub use error::{Error, Result};
