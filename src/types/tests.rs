use std::rc::Rc;

use pretty_assertions::assert_eq;

use crate::{
    ast::{ast::VarDecl, types::TypeNode},
    errors::errors::ErrorImpl,
    scope::scope::ScopedTable,
};

use super::type_info::{resolve_type, ArrayInfo, FieldInfo, RecordInfo, TypeInfo};

fn file() -> Rc<String> {
    Rc::new("types.tree".to_string())
}

fn named(name: &str) -> TypeNode {
    TypeNode::Named {
        name: name.to_string(),
        line: 7,
    }
}

#[test]
fn test_resolve_array_keeps_low_bound() {
    let types: ScopedTable<TypeInfo> = ScopedTable::new();
    let node = TypeNode::Array {
        low: 3,
        high: 7,
        element: Box::new(TypeNode::Char),
    };

    let resolved = resolve_type(&node, &types, 1, &file()).unwrap();
    assert_eq!(
        resolved,
        TypeInfo::Array(ArrayInfo {
            element: Box::new(TypeInfo::Char),
            low: 3,
            high: 7,
            len: 5,
        })
    );
    assert_eq!(resolved.to_string(), "array [3..7] of char");
}

#[test]
fn test_resolve_record_flattens_field_names_in_order() {
    let types: ScopedTable<TypeInfo> = ScopedTable::new();
    let node = TypeNode::Record(vec![
        VarDecl {
            line: 2,
            type_node: TypeNode::Integer,
            names: vec!["x".to_string(), "y".to_string()],
        },
        VarDecl {
            line: 3,
            type_node: TypeNode::Char,
            names: vec!["tag".to_string()],
        },
    ]);

    let TypeInfo::Record(record) = resolve_type(&node, &types, 2, &file()).unwrap() else {
        panic!("expected a record");
    };

    let names: Vec<&str> = record.fields.iter().map(|field| field.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y", "tag"]);
    assert_eq!(record.field("tag"), Some((2, &TypeInfo::Char)));
    assert_eq!(record.field("z"), None);
}

#[test]
fn test_named_type_resolves_structurally() {
    let mut types: ScopedTable<TypeInfo> = ScopedTable::new();
    types.push(());
    let array = TypeInfo::Array(ArrayInfo {
        element: Box::new(TypeInfo::Integer),
        low: 1,
        high: 20,
        len: 20,
    });
    types.declare("arr", array.clone()).unwrap();

    types.push(());
    types.declare("alias", TypeInfo::Integer).unwrap();

    assert_eq!(resolve_type(&named("arr"), &types, 7, &file()).unwrap(), array);
    assert_eq!(
        resolve_type(&named("alias"), &types, 7, &file()).unwrap(),
        TypeInfo::Integer
    );
}

#[test]
fn test_unknown_named_type() {
    let mut types: ScopedTable<TypeInfo> = ScopedTable::new();
    types.push(());

    let error = resolve_type(&named("missing"), &types, 1, &file()).unwrap_err();
    assert_eq!(
        error.get_impl(),
        &ErrorImpl::UnknownType {
            type_: "missing".to_string()
        }
    );
    // The position is the reference's own line.
    assert_eq!(error.get_position().0, 7);
}

#[test]
fn test_structural_equality_ignores_alias_names() {
    let record = |field: &str| {
        TypeInfo::Record(RecordInfo {
            fields: vec![FieldInfo {
                name: field.to_string(),
                type_info: TypeInfo::Integer,
            }],
        })
    };

    assert_eq!(record("a"), record("a"));
    assert_ne!(record("a"), record("b"));
    assert_eq!(record("a").to_string(), "record { a: integer }");
}

#[test]
fn test_array_bounds_are_checked_without_overflow() {
    let types: ScopedTable<TypeInfo> = ScopedTable::new();
    let array = |low: i32, high: i32| TypeNode::Array {
        low,
        high,
        element: Box::new(TypeNode::Integer),
    };

    let error = resolve_type(&array(5, 4), &types, 3, &file()).unwrap_err();
    assert_eq!(
        error.get_impl(),
        &ErrorImpl::InvalidArrayBounds { low: 5, high: 4 }
    );
    assert_eq!(error.get_position().0, 3);

    // 2^32 elements do not fit an LLVM array length.
    let error = resolve_type(&array(i32::MIN, i32::MAX), &types, 4, &file()).unwrap_err();
    assert_eq!(
        error.get_impl(),
        &ErrorImpl::InvalidArrayBounds {
            low: i32::MIN,
            high: i32::MAX
        }
    );

    let wide = resolve_type(&array(i32::MIN + 1, i32::MAX), &types, 5, &file()).unwrap();
    assert_eq!(wide.to_string(), "array [-2147483647..2147483647] of integer");
    let TypeInfo::Array(info) = wide else {
        panic!("expected an array");
    };
    assert_eq!(info.len, u32::MAX);

    let negative = resolve_type(&array(-2, 2), &types, 6, &file()).unwrap();
    assert_eq!(negative.to_string(), "array [-2..2] of integer");
}
