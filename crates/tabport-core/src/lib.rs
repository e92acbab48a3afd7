//! # tabport-core
//!
//! Core types and the value codec shared across all tabport crates.
//!
//! This crate provides the foundational, database-agnostic pieces of the
//! import/export engine:
//! - Semantic column types and the catalog type classifier
//! - Column descriptors and row elements (the string interchange form)
//! - The row codec converting between interchange strings and typed cells
//! - Import results and their per-item messages
//! - Status enums with state machine transitions
//! - Automatic export configuration entity
//! - Cross-cutting error types

pub mod codec;
pub mod column;
pub mod element;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod result;
