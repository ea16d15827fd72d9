//! Core domain types
//!
//! This module contains the core domain structures used across Lectern services.
//! The API persists them in the ledger; the worker only ever sees the DTOs
//! derived from them.

pub mod account;
pub mod event;
pub mod job;
