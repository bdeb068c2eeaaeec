use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Lt,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Sub),
            "*" => Some(Operator::Mul),
            "<" => Some(Operator::Lt),
            _ => None,
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Add => write!(f, "+"),
            Operator::Sub => write!(f, "-"),
            Operator::Mul => write!(f, "*"),
            Operator::Lt => write!(f, "<"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub line: u32,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Binary {
        operator: Operator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    ConstantInt(i32),
    ConstantChar(u8),
    Identifier(String),
    ArrayMember {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    RecordMember {
        record: Box<Expr>,
        field: String,
    },
}

impl Expr {
    pub fn new(line: u32, kind: ExprKind) -> Self {
        Expr { line, kind }
    }

    pub fn identifier(line: u32, name: &str) -> Self {
        Expr::new(line, ExprKind::Identifier(name.to_string()))
    }

    /// Only these forms can denote a storage location.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Identifier(_) | ExprKind::ArrayMember { .. } | ExprKind::RecordMember { .. }
        )
    }
}
