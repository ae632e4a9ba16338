//! Subcommand implementations.

pub mod corners;
pub mod ir_drop;
pub mod steady;
pub mod transient;
