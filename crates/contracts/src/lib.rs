//! Shared types for the repair-order tracker.
//!
//! Everything here is plain data plus pure rules (status classification,
//! notification transitions) so that the backend and any client agree on
//! the wire format.

pub mod dashboards;
pub mod domain;
pub mod enums;
pub mod shared;
pub mod system;
pub mod usecases;
