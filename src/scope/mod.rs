//! Scoped symbol tables.
//!
//! The code generator keeps three of these (types, variables, procedures).
//! A scope is pushed when a program or procedure body is entered and popped
//! when it is left; the variable table tags each scope with the procedure
//! that owns it.

pub mod scope;
