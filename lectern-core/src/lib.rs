//! Lectern Core
//!
//! Core types and abstractions shared by the Lectern services.
//!
//! This crate contains:
//! - Domain types: Jobs, accounts and audit events
//! - DTOs: Data transfer objects for inter-service communication
//! - Signature: the shared-secret MAC that authenticates outcome reports

pub mod domain;
pub mod dto;
pub mod signature;
