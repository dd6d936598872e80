//! ServiceNow Alert Forwarder
//!
//! One-shot bridge from a monitoring platform's health-rule violation
//! alerts into ServiceNow incidents. Invoked once per event with the alert
//! template's positional arguments, it decodes the event, renders the
//! incident payload, and creates or updates the downstream incident based on
//! a file-backed `incidentID -> sys_id` mapping.
//!
//! # Design Principles
//! - One-shot: one event in, at most one HTTP call out, no retries
//! - Idempotent: the id store makes re-fired events update, not duplicate
//! - Byte-compatible: the incident body matches the upstream template renderer

pub mod alert;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod runner;
pub mod store;

pub use error::{AlertError, Result};
