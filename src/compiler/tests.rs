//! Unit tests for the code generator.
//!
//! These tests compile small trees and inspect the generated module:
//! runtime declarations, the entry point, block labels, symbol naming and
//! the state of the symbol tables after a failed compilation.

use std::rc::Rc;

use inkwell::context::Context;
use pretty_assertions::assert_eq;

use crate::{
    config::CompileOptions,
    errors::errors::{ErrorClass, ErrorImpl},
    reader::reader::read_program,
};

use super::{
    compiler::{compile, Compiler},
    emit::postprocess_assembly,
    runtime::RuntimePrimitive,
};

fn file() -> Rc<String> {
    Rc::new("unit.tree".to_string())
}

fn compile_ir(source: &str) -> String {
    let program = read_program(source, file()).unwrap();
    let context = Context::create();
    let compiler = compile(&program, &context, file(), CompileOptions::default()).unwrap();
    compiler.print_ir()
}

const EMPTY: &str = "\
ProK 1
   PheadK 1 p
   StmLK 2
";

#[test]
fn test_runtime_functions_are_declared() {
    let ir = compile_ir(EMPTY);

    assert!(ir.contains("declare i32 @read_integer()"));
    assert!(ir.contains("declare i8 @read_char()"));
    assert!(ir.contains("declare void @write_integer(i32)"));
    assert!(ir.contains("declare void @write_char(i8)"));
}

#[test]
fn test_entry_allocates_root_frame_and_calls_body() {
    let ir = compile_ir(EMPTY);

    assert!(ir.contains("define void @_start()"));
    assert!(ir.contains("define private void @p.body({}* %env)"));
    assert!(ir.contains("%root = alloca {}"));
    assert!(ir.contains("call void @p.body({}* %root)"));
}

#[test]
fn test_entry_symbol_is_configurable() {
    let program = read_program(EMPTY, file()).unwrap();
    let context = Context::create();
    let options = CompileOptions {
        entry_symbol: String::from("main_entry"),
        ..CompileOptions::default()
    };
    let compiler = compile(&program, &context, file(), options).unwrap();
    let ir = compiler.print_ir();

    assert!(ir.contains("define void @main_entry()"));
    assert!(!ir.contains("@_start"));
}

#[test]
fn test_compiled_module_verifies() {
    let program = read_program(EMPTY, file()).unwrap();
    let context = Context::create();
    let compiler = compile(&program, &context, file(), CompileOptions::default()).unwrap();

    assert!(compiler.verify_module(1).is_ok());
}

const PROCEDURE_Q: &str = "\
ProK 1
   PheadK 1 p
   ProcDecK 2
      ProcDecK 2 q
         StmLK 3
   StmLK 4
      StmtK 4 CallK q
";

#[test]
fn test_procedure_named_like_entry_is_rejected() {
    let program = read_program(PROCEDURE_Q, file()).unwrap();
    let context = Context::create();
    let options = CompileOptions {
        entry_symbol: String::from("q"),
        ..CompileOptions::default()
    };

    let error = match compile(&program, &context, file(), options) {
        Ok(_) => panic!("procedure `q` should clash with entry `q`"),
        Err(error) => error,
    };
    assert_eq!(
        error.get_impl(),
        &ErrorImpl::ReservedName {
            name: String::from("q")
        }
    );
    assert_eq!(error.get_class(), ErrorClass::Semantic);
    assert_eq!(error.get_position().0, 2);

    // The default entry leaves `q` free.
    assert!(compile_ir(PROCEDURE_Q).contains("define private void @q("));
}

#[test]
fn test_procedure_named_like_runtime_function_is_rejected() {
    let source = PROCEDURE_Q.replace(" q\n", " write_char\n");
    let program = read_program(&source, file()).unwrap();
    let context = Context::create();

    let error = match compile(&program, &context, file(), CompileOptions::default()) {
        Ok(_) => panic!("procedure `write_char` should clash with the runtime"),
        Err(error) => error,
    };
    assert_eq!(
        error.get_impl(),
        &ErrorImpl::ReservedName {
            name: String::from("write_char")
        }
    );

    // Nested procedures are qualified and never clash.
    let nested = "\
ProK 1
   PheadK 1 p
   ProcDecK 2
      ProcDecK 2 outer
         ProcDecK 3
            ProcDecK 3 write_char
               StmLK 4
         StmLK 5
   StmLK 6
";
    assert!(compile_ir(nested).contains("define private void @outer.write_char("));
}

#[test]
fn test_nested_procedure_symbols_are_qualified() {
    let source = "\
ProK 1
   PheadK 1 p
   ProcDecK 2
      ProcDecK 2 outer
         ProcDecK 3
            ProcDecK 3 inner
               StmLK 4
         StmLK 5
            StmtK 5 CallK inner
   StmLK 6
      StmtK 6 CallK outer
";
    let ir = compile_ir(source);

    assert!(ir.contains("define private void @outer("));
    assert!(ir.contains("define private void @outer.inner("));
    assert!(ir.contains("call void @outer.inner("));
}

#[test]
fn test_labels_count_per_compiler() {
    let source = "\
ProK 1
   PheadK 1 p
   VarK 1
      DecK 1 IntegerK i
   StmLK 2
      StmtK 2 IfK
         ExpK 2 OpK <
            ExpK 2 IdK IdV i
            ExpK 2 ConstK 1
         StmLK 3
         StmLK 4
      StmtK 5 WhileK
         ExpK 5 OpK <
            ExpK 5 IdK IdV i
            ExpK 5 ConstK 1
         StmLK 6
      StmtK 7 IfK
         ExpK 7 OpK <
            ExpK 7 IdK IdV i
            ExpK 7 ConstK 1
         StmLK 8
         StmLK 9
";
    let ir = compile_ir(source);

    for label in [
        "then_0:",
        "else_0:",
        "if_merge_0:",
        "while_cond_0:",
        "while_body_0:",
        "while_merge_0:",
        "then_1:",
        "else_1:",
        "if_merge_1:",
    ] {
        assert!(
            ir.lines().any(|line| line.starts_with(label)),
            "missing label {}",
            label
        );
    }

    // A second compilation starts counting again.
    let again = compile_ir(source);
    assert!(again.lines().any(|line| line.starts_with("then_0:")));
}

#[test]
fn test_if_blocks_are_printed_in_source_order() {
    let source = "\
ProK 1
   PheadK 1 p
   VarK 1
      DecK 1 IntegerK i
   StmLK 2
      StmtK 2 IfK
         ExpK 2 OpK <
            ExpK 2 IdK IdV i
            ExpK 2 ConstK 1
         StmLK 3
            StmtK 3 WhileK
               ExpK 3 OpK <
                  ExpK 3 IdK IdV i
                  ExpK 3 ConstK 1
               StmLK 4
         StmLK 5
";
    let ir = compile_ir(source);
    let position = |label: &str| {
        ir.lines()
            .position(|line| line.starts_with(label))
            .unwrap_or_else(|| panic!("missing label {}", label))
    };

    assert!(position("then_0:") < position("while_cond_0:"));
    assert!(position("while_merge_0:") < position("else_0:"));
    assert!(position("else_0:") < position("if_merge_0:"));
}

#[test]
fn test_scopes_are_popped_after_failure() {
    let source = "\
ProK 1
   PheadK 1 p
   ProcDecK 2
      ProcDecK 2 q
         VarK 2
            DecK 2 IntegerK x
         StmLK 3
            StmtK 3 WriteK
               ExpK 3 IdK IdV missing
   StmLK 4
";
    let program = read_program(source, file()).unwrap();
    let context = Context::create();
    let mut compiler = Compiler::new(&context, file(), CompileOptions::default()).unwrap();

    let error = compiler.compile_program(&program).unwrap_err();
    assert_eq!(
        error.get_impl(),
        &ErrorImpl::UnknownIdentifier {
            identifier: "missing".to_string()
        }
    );
    assert_eq!(compiler.types.depth(), 0);
    assert_eq!(compiler.variables.depth(), 0);
    assert_eq!(compiler.procedures.depth(), 0);
}

#[test]
fn test_runtime_primitive_selection() {
    use crate::types::type_info::TypeInfo;

    assert_eq!(
        RuntimePrimitive::read(&TypeInfo::Integer),
        Some(RuntimePrimitive::ReadInteger)
    );
    assert_eq!(
        RuntimePrimitive::write(&TypeInfo::Char),
        Some(RuntimePrimitive::WriteChar)
    );
    assert_eq!(RuntimePrimitive::read(&TypeInfo::Boolean), None);
    assert_eq!(RuntimePrimitive::WriteInteger.symbol(), "write_integer");
}

#[test]
fn test_postprocess_assembly_drops_directives() {
    let assembly = "\
\t.text
\t.file\t\"p\"
\t.globl\t_start
_start:
\tjal\tp.body
.LBB0_2:
\tjr\t$ra
\t.size\t_start, .Lfunc_end0-_start
";
    let result = postprocess_assembly(assembly, Some("# bootstrap\n\tj _start"));

    assert_eq!(
        result,
        "# bootstrap\n\tj _start\n\n_start:\n\tjal\tp.body\n.LBB0_2:\n\tjr\t$ra\n"
    );
    assert_eq!(
        postprocess_assembly(assembly, None),
        "_start:\n\tjal\tp.body\n.LBB0_2:\n\tjr\t$ra\n"
    );
}
