//! Functional core for the storecache request layer.
//!
//! Everything in this crate is pure: key derivation, freshness checks,
//! failure classification and backoff schedules. The stateful pieces (the
//! cache store, the retry loop, background sweeping) live in the
//! `storecache` crate and are built on top of these functions.

pub mod cache;
pub mod retry;
pub mod store;
