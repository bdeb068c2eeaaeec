use std::{fmt::Display, rc::Rc};

use crate::{
    ast::types::TypeNode,
    errors::errors::{Error, ErrorImpl},
    scope::scope::ScopedTable,
    MK_ERROR,
};

/// Structural type of a value. Two types are the same type exactly when they compare equal.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeInfo {
    Integer,
    Char,
    /// Result of `<`. Only usable as a branch condition.
    Boolean,
    Array(ArrayInfo),
    Record(RecordInfo),
}

/// Bounds as declared. `len` is `high - low + 1` and is never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayInfo {
    pub element: Box<TypeInfo>,
    pub low: i32,
    pub high: i32,
    pub len: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub type_info: TypeInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordInfo {
    pub fields: Vec<FieldInfo>,
}

impl RecordInfo {
    /// Layout index and type of a field. The first field with the name wins.
    pub fn field(&self, name: &str) -> Option<(u32, &TypeInfo)> {
        self.fields
            .iter()
            .position(|field| field.name == name)
            .map(|index| (index as u32, &self.fields[index].type_info))
    }
}

impl TypeInfo {
    /// Integer and Char: the types `read`, `write` and the operators work on.
    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeInfo::Integer | TypeInfo::Char)
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeInfo::Integer => write!(f, "integer"),
            TypeInfo::Char => write!(f, "char"),
            TypeInfo::Boolean => write!(f, "boolean"),
            TypeInfo::Array(array) => {
                write!(f, "array [{}..{}] of {}", array.low, array.high, array.element)
            }
            TypeInfo::Record(record) => {
                write!(f, "record {{")?;
                for (index, field) in record.fields.iter().enumerate() {
                    if index > 0 {
                        write!(f, ";")?;
                    }
                    write!(f, " {}: {}", field.name, field.type_info)?;
                }
                write!(f, " }}")
            }
        }
    }
}

/// Resolves type syntax against the visible type declarations.
///
/// Named types are replaced by their structure, so an alias and the type it
/// names are interchangeable afterwards. Fails with `UnknownType` when a
/// named type is not declared in any enclosing scope, and with
/// `InvalidArrayBounds` when an array is empty or has more elements than
/// LLVM can index.
pub fn resolve_type<E>(
    type_node: &TypeNode,
    types: &ScopedTable<TypeInfo, E>,
    line: u32,
    file: &Rc<String>,
) -> Result<TypeInfo, Error> {
    match type_node {
        TypeNode::Integer => Ok(TypeInfo::Integer),
        TypeNode::Char => Ok(TypeInfo::Char),
        TypeNode::Array { low, high, element } => {
            let len = array_len(*low, *high).ok_or_else(|| {
                MK_ERROR!(
                    ErrorImpl::InvalidArrayBounds {
                        low: *low,
                        high: *high,
                    },
                    line,
                    file
                )
            })?;

            Ok(TypeInfo::Array(ArrayInfo {
                element: Box::new(resolve_type(element, types, line, file)?),
                low: *low,
                high: *high,
                len,
            }))
        }
        TypeNode::Record(field_decls) => {
            let mut fields = vec![];
            for decl in field_decls {
                let type_info = resolve_type(&decl.type_node, types, decl.line, file)?;
                for name in &decl.names {
                    fields.push(FieldInfo {
                        name: name.clone(),
                        type_info: type_info.clone(),
                    });
                }
            }

            Ok(TypeInfo::Record(RecordInfo { fields }))
        }
        TypeNode::Named { name, line } => match types.lookup(name) {
            Some((type_info, _)) => Ok(type_info.clone()),
            None => Err(MK_ERROR!(
                ErrorImpl::UnknownType {
                    type_: name.clone()
                },
                *line,
                file
            )),
        },
    }
}

/// Number of elements in `low..high`, if it is at least one and fits in `u32`.
fn array_len(low: i32, high: i32) -> Option<u32> {
    let len = i64::from(high) - i64::from(low) + 1;
    if len < 1 {
        return None;
    }

    u32::try_from(len).ok()
}
