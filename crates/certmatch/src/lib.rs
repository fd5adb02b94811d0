//! Core library for the certmatch marketplace service.
//!
//! The interesting rules live in [`marketplace`]: who may create, read, and
//! transition consulting inquiries, and how consultant verification gates
//! directory visibility. Everything that talks to the outside world (identity
//! provider, record store, event transport) sits behind traits so the rules
//! can be exercised without infrastructure.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod telemetry;
