use std::rc::Rc;

use inkwell::values::{BasicMetadataValueEnum, FunctionValue, IntValue};
use tracing::trace;

use crate::{
    ast::{
        expressions::Expr,
        statements::{StatementList, Stmt, StmtKind},
    },
    errors::errors::{Error, ErrorImpl},
    types::type_info::TypeInfo,
    MK_ERROR,
};

use super::{
    compiler::Compiler,
    expr::{gen_expression, load_value},
    frames::gen_frame_argument,
    runtime::{gen_runtime_call, RuntimePrimitive},
};

pub fn gen_statement_list<'a>(
    compiler: &mut Compiler<'a>,
    statements: &StatementList,
) -> Result<(), Error> {
    for statement in statements.iter() {
        gen_statement(compiler, statement)?;
    }

    Ok(())
}

pub fn gen_statement<'a>(compiler: &mut Compiler<'a>, statement: &Stmt) -> Result<(), Error> {
    let line = statement.line;

    match &statement.kind {
        StmtKind::Assign { target, value } => gen_assign(compiler, target, value, line),
        StmtKind::Call { name, arguments } => gen_call(compiler, name, arguments, line),
        StmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            let id = compiler.next_if_id();
            let condition = gen_condition(compiler, condition, line)?;
            let function = current_function(compiler, line)?;

            let then_block = compiler.create_basic_block(&format!("then_{}", id), function);
            let else_block = compiler.create_basic_block(&format!("else_{}", id), function);
            let merge_block = compiler.create_basic_block(&format!("if_merge_{}", id), function);

            compiler
                .builder
                .build_conditional_branch(condition, then_block, else_block)
                .map_err(compiler.fault(line))?;

            compiler.builder.position_at_end(then_block);
            gen_statement_list(compiler, then_body)?;
            compiler
                .builder
                .build_unconditional_branch(merge_block)
                .map_err(compiler.fault(line))?;

            compiler.move_block_to_end(else_block, function, line)?;
            compiler.builder.position_at_end(else_block);
            gen_statement_list(compiler, else_body)?;
            compiler
                .builder
                .build_unconditional_branch(merge_block)
                .map_err(compiler.fault(line))?;

            compiler.move_block_to_end(merge_block, function, line)?;
            compiler.builder.position_at_end(merge_block);

            Ok(())
        }
        StmtKind::While { condition, body } => {
            let id = compiler.next_while_id();
            let function = current_function(compiler, line)?;

            let condition_block =
                compiler.create_basic_block(&format!("while_cond_{}", id), function);
            compiler
                .builder
                .build_unconditional_branch(condition_block)
                .map_err(compiler.fault(line))?;

            compiler.builder.position_at_end(condition_block);
            let condition = gen_condition(compiler, condition, line)?;

            let body_block = compiler.create_basic_block(&format!("while_body_{}", id), function);
            let merge_block =
                compiler.create_basic_block(&format!("while_merge_{}", id), function);
            compiler
                .builder
                .build_conditional_branch(condition, body_block, merge_block)
                .map_err(compiler.fault(line))?;

            compiler.builder.position_at_end(body_block);
            gen_statement_list(compiler, body)?;
            compiler
                .builder
                .build_unconditional_branch(condition_block)
                .map_err(compiler.fault(line))?;

            compiler.move_block_to_end(merge_block, function, line)?;
            compiler.builder.position_at_end(merge_block);

            Ok(())
        }
        StmtKind::Read { target } => {
            let target = gen_expression(compiler, target)?;
            if !target.is_address {
                return Err(MK_ERROR!(
                    ErrorImpl::NotAssignable {
                        context: String::from("read target"),
                    },
                    line,
                    compiler.file
                ));
            }

            let primitive = RuntimePrimitive::read(&target.type_info).ok_or_else(|| {
                MK_ERROR!(
                    ErrorImpl::UnsupportedOperationType {
                        operation: String::from("read"),
                        type_: target.type_info.to_string(),
                    },
                    line,
                    compiler.file
                )
            })?;

            let input = gen_runtime_call(compiler, primitive, &[], line)?.ok_or_else(|| {
                MK_ERROR!(
                    ErrorImpl::InternalFault {
                        message: format!("`{}` returned no value", primitive.symbol()),
                    },
                    line,
                    compiler.file
                )
            })?;

            compiler
                .builder
                .build_store(target.value.into_pointer_value(), input)
                .map_err(compiler.fault(line))?;

            Ok(())
        }
        StmtKind::Write { value } => {
            let value = gen_expression(compiler, value)?;
            let primitive = RuntimePrimitive::write(&value.type_info).ok_or_else(|| {
                MK_ERROR!(
                    ErrorImpl::UnsupportedOperationType {
                        operation: String::from("write"),
                        type_: value.type_info.to_string(),
                    },
                    line,
                    compiler.file
                )
            })?;

            let value = load_value(compiler, &value, line)?;
            gen_runtime_call(compiler, primitive, &[value.into()], line)?;

            Ok(())
        }
        StmtKind::Return => {
            compiler
                .builder
                .build_return(None)
                .map_err(compiler.fault(line))?;

            // Statements after a return still need a block to land in.
            let function = current_function(compiler, line)?;
            let continuation = compiler.create_basic_block("return_cont", function);
            compiler.builder.position_at_end(continuation);

            Ok(())
        }
    }
}

/// `target := value`. The value is evaluated first.
fn gen_assign<'a>(
    compiler: &mut Compiler<'a>,
    target: &Expr,
    value: &Expr,
    line: u32,
) -> Result<(), Error> {
    let value = gen_expression(compiler, value)?;
    if value.type_info == TypeInfo::Boolean {
        return Err(MK_ERROR!(
            ErrorImpl::UnsupportedOperationType {
                operation: String::from("assignment"),
                type_: value.type_info.to_string(),
            },
            line,
            compiler.file
        ));
    }
    let loaded = load_value(compiler, &value, line)?;

    let target = gen_expression(compiler, target)?;
    if !target.is_address {
        return Err(MK_ERROR!(
            ErrorImpl::NotAssignable {
                context: String::from("assignment target"),
            },
            line,
            compiler.file
        ));
    }
    if target.type_info != value.type_info {
        return Err(MK_ERROR!(
            ErrorImpl::TypeMismatch {
                expected: target.type_info.to_string(),
                received: value.type_info.to_string(),
            },
            line,
            compiler.file
        ));
    }

    compiler
        .builder
        .build_store(target.value.into_pointer_value(), loaded)
        .map_err(compiler.fault(line))?;

    Ok(())
}

/// Calls a visible procedure, passing the frame it expects followed by the arguments.
fn gen_call<'a>(
    compiler: &mut Compiler<'a>,
    name: &str,
    arguments: &[Expr],
    line: u32,
) -> Result<(), Error> {
    let caller = compiler.current_procedure(line)?;
    let callee = match compiler.procedures.lookup(name) {
        Some((callee, _)) => Rc::clone(callee),
        None => {
            return Err(MK_ERROR!(
                ErrorImpl::UnknownProcedure {
                    procedure: name.to_string(),
                },
                line,
                compiler.file
            ))
        }
    };

    if arguments.len() != callee.params.len() {
        return Err(MK_ERROR!(
            ErrorImpl::ArgumentCountMismatch {
                expected: callee.params.len(),
                received: arguments.len(),
            },
            line,
            compiler.file
        ));
    }

    let frame = gen_frame_argument(compiler, &caller, &callee, line)?;
    let mut values: Vec<BasicMetadataValueEnum<'a>> = vec![frame.into()];

    for (argument, param) in arguments.iter().zip(callee.params.iter()) {
        let value = gen_expression(compiler, argument)?;
        if value.type_info != param.type_info {
            return Err(MK_ERROR!(
                ErrorImpl::TypeMismatch {
                    expected: param.type_info.to_string(),
                    received: value.type_info.to_string(),
                },
                argument.line,
                compiler.file
            ));
        }

        if param.by_ref {
            if !value.is_address {
                return Err(MK_ERROR!(
                    ErrorImpl::NotAssignable {
                        context: format!("argument for `{}` of `{}`", param.name, name),
                    },
                    argument.line,
                    compiler.file
                ));
            }
            values.push(value.value.into());
        } else {
            values.push(load_value(compiler, &value, line)?.into());
        }
    }

    trace!(
        caller = caller.symbol.as_str(),
        callee = callee.symbol.as_str(),
        "call"
    );

    compiler
        .builder
        .build_call(callee.function, &values, "")
        .map_err(compiler.fault(line))?;

    Ok(())
}

/// Evaluates a branch or loop condition, which must be a comparison.
fn gen_condition<'a>(
    compiler: &Compiler<'a>,
    condition: &Expr,
    line: u32,
) -> Result<IntValue<'a>, Error> {
    let condition = gen_expression(compiler, condition)?;
    if condition.type_info != TypeInfo::Boolean {
        return Err(MK_ERROR!(
            ErrorImpl::TypeMismatch {
                expected: TypeInfo::Boolean.to_string(),
                received: condition.type_info.to_string(),
            },
            line,
            compiler.file
        ));
    }

    Ok(load_value(compiler, &condition, line)?.into_int_value())
}

fn current_function<'a>(compiler: &Compiler<'a>, line: u32) -> Result<FunctionValue<'a>, Error> {
    compiler
        .builder
        .get_insert_block()
        .and_then(|block| block.get_parent())
        .ok_or_else(|| {
            MK_ERROR!(
                ErrorImpl::InternalFault {
                    message: String::from("the builder is not inside a function"),
                },
                line,
                compiler.file
            )
        })
}
