/// AST (Abstract Syntax Tree) module
/// Contains the immutable syntax tree handed over by the front end
///
/// Submodules:
/// - ast: Program and declaration nodes
/// - expressions: Expression nodes and operators
/// - statements: Statement nodes
/// - types: Type syntax nodes
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
