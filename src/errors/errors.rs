use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::MalformedTree { .. } => "MalformedTree",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::UnknownIdentifier { .. } => "UnknownIdentifier",
            ErrorImpl::UnknownProcedure { .. } => "UnknownProcedure",
            ErrorImpl::UnknownMember { .. } => "UnknownMember",
            ErrorImpl::NotAssignable { .. } => "NotAssignable",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::UnsupportedOperationType { .. } => "UnsupportedOperationType",
            ErrorImpl::ArgumentCountMismatch { .. } => "ArgumentCountMismatch",
            ErrorImpl::DuplicateDeclaration { .. } => "DuplicateDeclaration",
            ErrorImpl::InvalidArrayBounds { .. } => "InvalidArrayBounds",
            ErrorImpl::ReservedName { .. } => "ReservedName",
            ErrorImpl::InternalFault { .. } => "InternalFault",
            ErrorImpl::BackendError { .. } => "BackendError",
        }
    }

    /// Malformed input, user-facing semantic error, or a fault inside the compiler itself.
    pub fn get_class(&self) -> ErrorClass {
        match &self.internal_error {
            ErrorImpl::MalformedTree { .. } => ErrorClass::Input,
            ErrorImpl::InternalFault { .. } | ErrorImpl::BackendError { .. } => {
                ErrorClass::Internal
            }
            _ => ErrorClass::Semantic,
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::MalformedTree { line, message } => {
                ErrorTip::Suggestion(format!("Tree line `{}`: {}", line.trim(), message))
            }
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}`, is it declared before use?", type_))
            }
            ErrorImpl::UnknownIdentifier { identifier } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", identifier))
            }
            ErrorImpl::UnknownProcedure { procedure } => {
                ErrorTip::Suggestion(format!("Procedure `{}` is not visible here", procedure))
            }
            ErrorImpl::UnknownMember { member } => {
                ErrorTip::Suggestion(format!("Record has no field `{}`", member))
            }
            ErrorImpl::NotAssignable { context } => ErrorTip::Suggestion(format!(
                "Expected a variable, array element or record field as {}",
                context
            )),
            ErrorImpl::TypeMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::UnsupportedOperationType { operation, type_ } => ErrorTip::Suggestion(
                format!("`{}` is not supported on type `{}`", operation, type_),
            ),
            ErrorImpl::ArgumentCountMismatch { expected, received } => ErrorTip::Suggestion(
                format!("Expected {} arguments, received {}", expected, received),
            ),
            ErrorImpl::DuplicateDeclaration { name } => {
                ErrorTip::Suggestion(format!("`{}` already declared in this scope", name))
            }
            ErrorImpl::InvalidArrayBounds { .. } => ErrorTip::Suggestion(String::from(
                "Array bounds need low <= high and at most 4294967295 elements",
            )),
            ErrorImpl::ReservedName { name } => ErrorTip::Suggestion(format!(
                "`{}` names the entry point or a runtime function, rename the procedure",
                name
            )),
            ErrorImpl::InternalFault { .. } => ErrorTip::None,
            ErrorImpl::BackendError { .. } => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}: {}",
            self.get_error_name(),
            self.position.1,
            self.position.0,
            self.internal_error
        )
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Input,
    Semantic,
    Internal,
}

impl Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Input => write!(f, "malformed input"),
            ErrorClass::Semantic => write!(f, "semantic error"),
            ErrorClass::Internal => write!(f, "internal compiler fault"),
        }
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("malformed tree ({message}): {line:?}")]
    MalformedTree { line: String, message: String },
    #[error("unknown type {type_}")]
    UnknownType { type_: String },
    #[error("unknown identifier {identifier:?}")]
    UnknownIdentifier { identifier: String },
    #[error("unknown procedure {procedure:?}")]
    UnknownProcedure { procedure: String },
    #[error("unknown record member {member:?}")]
    UnknownMember { member: String },
    #[error("expected an assignable expression as {context}")]
    NotAssignable { context: String },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMismatch { expected: String, received: String },
    #[error("{operation} does not support type {type_}")]
    UnsupportedOperationType { operation: String, type_: String },
    #[error("wrong number of arguments: expected {expected}, received {received}")]
    ArgumentCountMismatch { expected: usize, received: usize },
    #[error("{name:?} declared twice in the same scope")]
    DuplicateDeclaration { name: String },
    #[error("invalid array bounds {low}..{high}")]
    InvalidArrayBounds { low: i32, high: i32 },
    #[error("procedure name {name:?} is reserved")]
    ReservedName { name: String },
    #[error("internal fault: {message}")]
    InternalFault { message: String },
    #[error("backend error: {message}")]
    BackendError { message: String },
}
