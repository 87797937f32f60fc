//! CLI command implementations

pub mod info;
pub mod publish;
pub mod render;
