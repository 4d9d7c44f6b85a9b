//! ragfuse-core
//!
//! Shared data model, error taxonomy, capability traits and configuration for
//! the retrieval fusion engine. Nothing in here talks to the network or disk
//! except `config` (reads TOML) and `chunker` (walks a docs directory).
#![deny(unused_imports)]
#![deny(unused_variables)]

pub mod chunker;
pub mod config;
pub mod corpus;
pub mod error;
pub mod traits;
pub mod types;
