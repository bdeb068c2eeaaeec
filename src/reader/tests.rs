//! Unit tests for the tree reader.
//!
//! This module contains tests for reading declarations, statements,
//! expressions and for rejecting malformed trees.

use std::rc::Rc;

use pretty_assertions::assert_eq;

use crate::{
    ast::{
        ast::VarDecl,
        expressions::{Expr, ExprKind, Operator},
        statements::StmtKind,
        types::TypeNode,
    },
    errors::errors::{ErrorClass, ErrorImpl},
};

use super::{
    lines::{split_lines, NodeKind},
    reader::read_program,
};

fn file() -> Rc<String> {
    Rc::new("test.tree".to_string())
}

const SIMPLE: &str = "\
ProK 1
   PheadK 1 p
   TypeK 2
      DecK 2 ArrayK 1 20 IntegerK arr
   VarK 3
      DecK 3 IntegerK i j num
      DecK 4 IdK arr a
   StmLK 5
      StmtK 6 ReadK num
      StmtK 7 AssignK
         ExpK 7 IdK ArrayMembV a
            ExpK 7 IdK IdV i
         ExpK 7 OpK +
            ExpK 7 IdK IdV num
            ExpK 7 ConstK 1
      StmtK 8 WriteK
         ExpK 8 ConstK 'x'
";

#[test]
fn test_split_lines_levels_and_kinds() {
    let lines = split_lines(SIMPLE, &file()).unwrap();

    assert_eq!(lines.len(), 17);
    assert_eq!(lines[0].kind, NodeKind::Program);
    assert_eq!(lines[0].level, 0);
    assert_eq!(lines[1].kind, NodeKind::ProgramHead);
    assert_eq!(lines[1].level, 1);
    assert_eq!(lines[5].words, vec!["IntegerK", "i", "j", "num"]);
    assert_eq!(lines[5].source_line, 3);
    assert_eq!(lines[11].level, 4);
}

#[test]
fn test_read_declarations() {
    let program = read_program(SIMPLE, file()).unwrap();

    assert_eq!(program.head.name, "p");
    assert_eq!(program.type_decls.len(), 1);
    assert_eq!(program.type_decls[0].name, "arr");
    assert_eq!(
        program.type_decls[0].type_node,
        TypeNode::Array {
            low: 1,
            high: 20,
            element: Box::new(TypeNode::Integer)
        }
    );
    assert_eq!(
        program.var_decls,
        vec![
            VarDecl {
                line: 3,
                type_node: TypeNode::Integer,
                names: vec!["i".to_string(), "j".to_string(), "num".to_string()],
            },
            VarDecl {
                line: 4,
                type_node: TypeNode::Named {
                    name: "arr".to_string(),
                    line: 4
                },
                names: vec!["a".to_string()],
            },
        ]
    );
    assert!(program.proc_decls.is_empty());
}

#[test]
fn test_read_statements() {
    let program = read_program(SIMPLE, file()).unwrap();
    let statements = &program.body.statements;

    assert_eq!(statements.len(), 3);
    assert_eq!(
        statements[0].kind,
        StmtKind::Read {
            target: Expr::identifier(6, "num")
        }
    );
    assert_eq!(
        statements[1].kind,
        StmtKind::Assign {
            target: Expr::new(
                7,
                ExprKind::ArrayMember {
                    array: Box::new(Expr::identifier(7, "a")),
                    index: Box::new(Expr::identifier(7, "i")),
                }
            ),
            value: Expr::new(
                7,
                ExprKind::Binary {
                    operator: Operator::Add,
                    left: Box::new(Expr::identifier(7, "num")),
                    right: Box::new(Expr::new(7, ExprKind::ConstantInt(1))),
                }
            ),
        }
    );
    assert_eq!(
        statements[2].kind,
        StmtKind::Write {
            value: Expr::new(8, ExprKind::ConstantChar(b'x'))
        }
    );
}

#[test]
fn test_read_record_member_of_array_field() {
    let source = "\
ProK 1
   PheadK 1 p
   VarK 2
      DecK 2 RecordK r
         DecK 3 IntegerK n
         DecK 4 ArrayK 0 9 CharK s
   StmLK 5
      StmtK 6 AssignK
         ExpK 6 IdK FieldMembV r
            ExpK 6 IdK ArrayMembV s
               ExpK 6 IdK FieldMembV r
                  ExpK 6 IdK IdV n
         ExpK 6 ConstK ' '
";
    let program = read_program(source, file()).unwrap();

    let TypeNode::Record(fields) = &program.var_decls[0].type_node else {
        panic!("expected a record type");
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[1].names, vec!["s".to_string()]);

    let record_member = |field: &str| {
        Expr::new(
            6,
            ExprKind::RecordMember {
                record: Box::new(Expr::identifier(6, "r")),
                field: field.to_string(),
            },
        )
    };

    assert_eq!(
        program.body.statements[0].kind,
        StmtKind::Assign {
            target: Expr::new(
                6,
                ExprKind::ArrayMember {
                    array: Box::new(record_member("s")),
                    index: Box::new(record_member("n")),
                }
            ),
            value: Expr::new(6, ExprKind::ConstantChar(b' ')),
        }
    );
}

#[test]
fn test_read_nested_procedures_and_params() {
    let source = "\
ProK 1
   PheadK 1 p
   TypeK 1
   VarK 2
      DecK 2 IntegerK x
   ProcDecK 3
      ProcDecK 3 outer
         DecK 3 valparamType IntegerK a b
         DecK 3 varparamType CharK c
         TypeK 4
         VarK 4
            DecK 4 IntegerK y
         ProcDecK 5
            ProcDecK 5 inner
               TypeK 5
               StmLK 6
                  StmtK 6 ReturnK
         StmLK 7
            StmtK 7 CallK inner
      ProcDecK 8 sibling
         StmLK 9
            StmtK 9 CallK outer
               ExpK 9 IdK IdV x
               ExpK 9 ConstK 2
               ExpK 9 IdK IdV x
   StmLK 10
      StmtK 10 CallK sibling
";
    let program = read_program(source, file()).unwrap();

    assert_eq!(program.proc_decls.len(), 2);

    let outer = &program.proc_decls[0];
    assert_eq!(outer.name, "outer");
    assert_eq!(outer.params.len(), 2);
    assert!(!outer.params[0].by_ref);
    assert_eq!(outer.params[0].names, vec!["a".to_string(), "b".to_string()]);
    assert!(outer.params[1].by_ref);
    assert_eq!(outer.params[1].type_node, TypeNode::Char);
    assert_eq!(outer.var_decls.len(), 1);
    assert_eq!(outer.proc_decls.len(), 1);
    assert_eq!(outer.proc_decls[0].name, "inner");
    assert_eq!(outer.proc_decls[0].body.statements[0].kind, StmtKind::Return);

    let sibling = &program.proc_decls[1];
    assert_eq!(sibling.name, "sibling");
    let StmtKind::Call { name, arguments } = &sibling.body.statements[0].kind else {
        panic!("expected a call");
    };
    assert_eq!(name, "outer");
    assert_eq!(arguments.len(), 3);
}

#[test]
fn test_if_and_while_bodies() {
    let source = "\
ProK 1
   PheadK 1 p
   VarK 1
      DecK 1 IntegerK i
   StmLK 2
      StmtK 2 WhileK
         ExpK 2 OpK <
            ExpK 2 IdK IdV i
            ExpK 2 ConstK 10
         StmLK 3
            StmtK 3 IfK
               ExpK 3 OpK <
                  ExpK 3 IdK IdV i
                  ExpK 3 ConstK 5
               StmLK 4
                  StmtK 4 WriteK
                     ExpK 4 IdK IdV i
               StmLK 5
      StmtK 6 WriteK
         ExpK 6 ConstK 0
";
    let program = read_program(source, file()).unwrap();
    assert_eq!(program.body.statements.len(), 2);

    let StmtKind::While { body, .. } = &program.body.statements[0].kind else {
        panic!("expected a while loop");
    };
    let StmtKind::If {
        then_body,
        else_body,
        ..
    } = &body.statements[0].kind
    else {
        panic!("expected an if statement");
    };
    assert_eq!(then_body.statements.len(), 1);
    assert!(else_body.statements.is_empty());
}

fn malformed_message(source: &str) -> String {
    let error = read_program(source, file()).unwrap_err();
    assert_eq!(error.get_class(), ErrorClass::Input);
    match error.get_impl() {
        ErrorImpl::MalformedTree { message, .. } => message.clone(),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_unknown_operator_is_malformed() {
    let source = "\
ProK 1
   PheadK 1 p
   StmLK 2
      StmtK 2 WriteK
         ExpK 2 OpK /
            ExpK 2 ConstK 1
            ExpK 2 ConstK 2
";
    assert_eq!(malformed_message(source), "unknown operator `/`");
}

#[test]
fn test_non_assignable_target_is_malformed() {
    let source = "\
ProK 1
   PheadK 1 p
   StmLK 2
      StmtK 3 AssignK
         ExpK 3 ConstK 1
         ExpK 3 ConstK 2
";
    let error = read_program(source, file()).unwrap_err();
    assert_eq!(error.get_position().0, 3);
    assert_eq!(malformed_message(source), "assignment target is not assignable");
}

#[test]
fn test_missing_body_is_malformed() {
    let source = "\
ProK 1
   PheadK 1 p
   VarK 1
      DecK 1 IntegerK i
";
    assert_eq!(malformed_message(source), "expected a `StmLK` node");
}

#[test]
fn test_unknown_node_kind_is_malformed() {
    let source = "\
ProK 1
   PheadK 1 p
   LoopK 2
";
    assert_eq!(malformed_message(source), "unknown node kind `LoopK`");
}
