//! Service Layer
//!
//! This module contains business logic extracted from DTO types.
//! Services handle state transitions and database operations,
//! keeping response types as pure DTOs.

mod delegation_service;
mod handoff_service;
mod lock_service;

pub use delegation_service::*;
pub use handoff_service::*;
pub use lock_service::*;
