//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! process. It includes:
//!
//! - Error structures with source line information
//! - One variant per failure kind (tree ingestion, semantic, internal)
//! - Error classification so reports can tell user errors from compiler faults
//! - Helpful error messages and suggestions

pub mod errors;
