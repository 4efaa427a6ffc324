//! Core types shared across assocx facilities
//!
//! This crate holds the canonical field keys and event names used by both
//! the error facility and the structured logging facility, so that log
//! consumers and tests agree on one vocabulary.

pub mod schema;
