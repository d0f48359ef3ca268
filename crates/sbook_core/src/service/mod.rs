//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Log every failure at the call site and return a typed error the host
//!   can turn into a user-visible message.

pub mod admin_service;
pub mod attendance_service;
pub mod deletion_service;
pub mod enrollment_service;
pub mod error;
pub mod sync_service;
