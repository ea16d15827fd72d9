//! Data Transfer Objects for inter-service communication
//!
//! This module contains DTOs used for communication between Lectern services
//! (api, worker, cli). DTOs are lightweight representations of domain
//! entities optimized for network transfer.

pub mod account;
pub mod callback;
pub mod error;
pub mod job;
