//! Code generation module for the compiler.
//!
//! This module contains the LLVM-based code generator that turns a read
//! program into a verified LLVM module. It handles:
//!
//! - Declarations of types, variables, parameters and nested procedures
//! - Activation frames, static links and call wiring
//! - Compilation of expressions and statements
//! - Declarations of the runtime I/O primitives
//! - Emission as LLVM IR, assembly or object code

pub mod compiler;
pub mod decl;
pub mod emit;
pub mod expr;
pub mod frames;
pub mod runtime;
pub mod stmt;
pub mod symbols;

#[cfg(test)]
mod tests;
