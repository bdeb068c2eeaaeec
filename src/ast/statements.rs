use super::expressions::Expr;

#[derive(Debug, Clone, PartialEq)]
pub struct StatementList {
    pub line: u32,
    pub statements: Vec<Stmt>,
}

impl StatementList {
    pub fn iter(&self) -> std::slice::Iter<'_, Stmt> {
        self.statements.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub line: u32,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Assign {
        target: Expr,
        value: Expr,
    },
    Call {
        name: String,
        arguments: Vec<Expr>,
    },
    If {
        condition: Expr,
        then_body: StatementList,
        else_body: StatementList,
    },
    While {
        condition: Expr,
        body: StatementList,
    },
    Read {
        target: Expr,
    },
    Write {
        value: Expr,
    },
    Return,
}
