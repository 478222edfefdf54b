//! Core data types for the ShArc credit core

pub mod address;
pub mod decision;
pub mod history;
pub mod loan;
pub mod money;
