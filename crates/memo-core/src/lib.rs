//! memo-core: vocabulary model, test scoring and reply grading.
//!
//! This crate defines the data model, the storage gateway trait, and the
//! logic that picks questions for a new test and grades the replies to it.

pub mod assembler;
pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod model;
pub mod render;
pub mod reply;
pub mod report;
pub mod scoring;
pub mod vocabulary;
