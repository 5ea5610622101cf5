//! core
//!
//! Configuration shared by the library and the binary.
//!
//! # Modules
//!
//! - [`config`] - Configuration schema and loading

pub mod config;
