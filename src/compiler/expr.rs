use std::rc::Rc;

use inkwell::{
    values::{BasicValueEnum, IntValue, PointerValue},
    IntPredicate,
};

use crate::{
    ast::expressions::{Expr, ExprKind, Operator},
    errors::errors::{Error, ErrorImpl},
    types::type_info::TypeInfo,
    MK_ERROR,
};

use super::{compiler::Compiler, frames::gen_nonlocal_address};

/// The result of generating an expression.
///
/// When `is_address` is set, `value` is a pointer to storage of `type_info`
/// and must be loaded before it is used as a plain value.
#[derive(Debug, Clone)]
pub struct ExprValue<'a> {
    pub value: BasicValueEnum<'a>,
    pub type_info: TypeInfo,
    pub is_address: bool,
}

impl<'a> ExprValue<'a> {
    pub fn address(pointer: PointerValue<'a>, type_info: TypeInfo) -> Self {
        ExprValue {
            value: pointer.into(),
            type_info,
            is_address: true,
        }
    }

    pub fn value(value: BasicValueEnum<'a>, type_info: TypeInfo) -> Self {
        ExprValue {
            value,
            type_info,
            is_address: false,
        }
    }
}

pub fn gen_expression<'a>(compiler: &Compiler<'a>, expr: &Expr) -> Result<ExprValue<'a>, Error> {
    match &expr.kind {
        ExprKind::ConstantInt(value) => Ok(ExprValue::value(
            compiler
                .context
                .i32_type()
                .const_int(*value as u64, true)
                .into(),
            TypeInfo::Integer,
        )),
        ExprKind::ConstantChar(value) => Ok(ExprValue::value(
            compiler
                .context
                .i8_type()
                .const_int(*value as u64, false)
                .into(),
            TypeInfo::Char,
        )),
        ExprKind::Identifier(name) => gen_identifier(compiler, name, expr.line),
        ExprKind::ArrayMember { array, index } => {
            gen_array_member(compiler, array, index, expr.line)
        }
        ExprKind::RecordMember { record, field } => {
            gen_record_member(compiler, record, field, expr.line)
        }
        ExprKind::Binary {
            operator,
            left,
            right,
        } => gen_binary(compiler, *operator, left, right, expr.line),
    }
}

/// Turns an expression result into a plain value, loading through addresses.
pub fn load_value<'a>(
    compiler: &Compiler<'a>,
    value: &ExprValue<'a>,
    line: u32,
) -> Result<BasicValueEnum<'a>, Error> {
    if !value.is_address {
        return Ok(value.value);
    }

    compiler
        .builder
        .build_load(value.value.into_pointer_value(), "load")
        .map_err(compiler.fault(line))
}

fn gen_identifier<'a>(
    compiler: &Compiler<'a>,
    name: &str,
    line: u32,
) -> Result<ExprValue<'a>, Error> {
    let current = compiler.current_procedure(line)?;

    let (var, owner) = compiler.variables.lookup(name).ok_or_else(|| {
        MK_ERROR!(
            ErrorImpl::UnknownIdentifier {
                identifier: name.to_string(),
            },
            line,
            compiler.file
        )
    })?;

    let address = if Rc::ptr_eq(owner, &current) {
        var.location
    } else {
        gen_nonlocal_address(compiler, &current, owner, name, line)?
    };

    Ok(ExprValue::address(address, var.type_info.clone()))
}

/// `array[index]` addresses element `index - low`. The index is not range checked.
fn gen_array_member<'a>(
    compiler: &Compiler<'a>,
    array: &Expr,
    index: &Expr,
    line: u32,
) -> Result<ExprValue<'a>, Error> {
    let base = gen_expression(compiler, array)?;
    let TypeInfo::Array(array_info) = &base.type_info else {
        return Err(MK_ERROR!(
            ErrorImpl::TypeMismatch {
                expected: String::from("an array"),
                received: base.type_info.to_string(),
            },
            line,
            compiler.file
        ));
    };
    let base_pointer = expect_address(compiler, &base, line)?;

    let index = gen_expression(compiler, index)?;
    if index.type_info != TypeInfo::Integer {
        return Err(MK_ERROR!(
            ErrorImpl::TypeMismatch {
                expected: TypeInfo::Integer.to_string(),
                received: index.type_info.to_string(),
            },
            line,
            compiler.file
        ));
    }
    let index = load_value(compiler, &index, line)?.into_int_value();

    let i32_type = compiler.context.i32_type();
    let offset = compiler
        .builder
        .build_int_sub(index, i32_type.const_int(array_info.low as u64, true), "offset")
        .map_err(compiler.fault(line))?;

    let element = unsafe {
        compiler
            .builder
            .build_gep(base_pointer, &[i32_type.const_zero(), offset], "element")
    }
    .map_err(compiler.fault(line))?;

    Ok(ExprValue::address(element, (*array_info.element).clone()))
}

fn gen_record_member<'a>(
    compiler: &Compiler<'a>,
    record: &Expr,
    field: &str,
    line: u32,
) -> Result<ExprValue<'a>, Error> {
    let base = gen_expression(compiler, record)?;
    let TypeInfo::Record(record_info) = &base.type_info else {
        return Err(MK_ERROR!(
            ErrorImpl::TypeMismatch {
                expected: String::from("a record"),
                received: base.type_info.to_string(),
            },
            line,
            compiler.file
        ));
    };
    let base_pointer = expect_address(compiler, &base, line)?;

    let (index, field_type) = record_info.field(field).ok_or_else(|| {
        MK_ERROR!(
            ErrorImpl::UnknownMember {
                member: field.to_string(),
            },
            line,
            compiler.file
        )
    })?;

    let member = compiler
        .builder
        .build_struct_gep(base_pointer, index, field)
        .map_err(compiler.fault(line))?;

    Ok(ExprValue::address(member, field_type.clone()))
}

/// Both operands must have the same scalar type. Arithmetic keeps that type,
/// `<` produces a Boolean.
fn gen_binary<'a>(
    compiler: &Compiler<'a>,
    operator: Operator,
    left: &Expr,
    right: &Expr,
    line: u32,
) -> Result<ExprValue<'a>, Error> {
    let left = gen_expression(compiler, left)?;
    if !left.type_info.is_scalar() {
        return Err(MK_ERROR!(
            ErrorImpl::UnsupportedOperationType {
                operation: format!("operator `{}`", operator),
                type_: left.type_info.to_string(),
            },
            line,
            compiler.file
        ));
    }

    let right = gen_expression(compiler, right)?;
    if right.type_info != left.type_info {
        return Err(MK_ERROR!(
            ErrorImpl::TypeMismatch {
                expected: left.type_info.to_string(),
                received: right.type_info.to_string(),
            },
            line,
            compiler.file
        ));
    }

    let lhs: IntValue<'a> = load_value(compiler, &left, line)?.into_int_value();
    let rhs: IntValue<'a> = load_value(compiler, &right, line)?.into_int_value();
    let builder = &compiler.builder;

    let (value, type_info) = match operator {
        Operator::Add => (builder.build_int_add(lhs, rhs, "add"), left.type_info),
        Operator::Sub => (builder.build_int_sub(lhs, rhs, "sub"), left.type_info),
        Operator::Mul => (builder.build_int_mul(lhs, rhs, "mul"), left.type_info),
        Operator::Lt => {
            let predicate = match left.type_info {
                TypeInfo::Char => IntPredicate::ULT,
                _ => IntPredicate::SLT,
            };
            (
                builder.build_int_compare(predicate, lhs, rhs, "lt"),
                TypeInfo::Boolean,
            )
        }
    };

    Ok(ExprValue::value(
        value.map_err(compiler.fault(line))?.into(),
        type_info,
    ))
}

/// Array and record operands always come from assignable expressions.
fn expect_address<'a>(
    compiler: &Compiler<'a>,
    value: &ExprValue<'a>,
    line: u32,
) -> Result<PointerValue<'a>, Error> {
    if value.is_address {
        return Ok(value.value.into_pointer_value());
    }

    Err(MK_ERROR!(
        ErrorImpl::InternalFault {
            message: format!("{} operand has no address", value.type_info),
        },
        line,
        compiler.file
    ))
}
