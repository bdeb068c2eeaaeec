use super::{statements::StatementList, types::TypeNode};

/// A whole program: head, declarations of the top-level procedure, and its body.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub line: u32,
    pub head: ProgramHead,
    pub type_decls: Vec<TypeDecl>,
    pub var_decls: Vec<VarDecl>,
    pub proc_decls: Vec<ProcDecl>,
    pub body: StatementList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramHead {
    pub line: u32,
    pub name: String,
}

/// `type name = type_node`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub line: u32,
    pub name: String,
    pub type_node: TypeNode,
}

/// Declares every name in `names` with the same type.
/// Also used for record fields.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub line: u32,
    pub type_node: TypeNode,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub line: u32,
    pub by_ref: bool,
    pub type_node: TypeNode,
    pub names: Vec<String>,
}

/// A procedure declaration. Its body lives one lexical level below the
/// procedure that declares it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcDecl {
    pub line: u32,
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub type_decls: Vec<TypeDecl>,
    pub var_decls: Vec<VarDecl>,
    pub proc_decls: Vec<ProcDecl>,
    pub body: StatementList,
}
