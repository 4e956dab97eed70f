//! Core state types and the pure decision functions of the session

pub mod close_guard;
pub mod document;
pub mod drop;
