//! Type syntax as written in declarations.
//!
//! These nodes are resolved into structural `TypeInfo` values by
//! `types::type_info::resolve_type` when a declaration is visited.

use super::ast::VarDecl;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    Integer,
    Char,
    Array {
        low: i32,
        high: i32,
        element: Box<TypeNode>,
    },
    /// Fields in declaration order.
    Record(Vec<VarDecl>),
    /// Reference to a type declared with `type`.
    Named { name: String, line: u32 },
}
