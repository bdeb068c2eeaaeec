//! Runtime I/O primitives.
//!
//! Generated programs do all of their input and output through four
//! functions resolved at link time:
//!
//! - `read_integer() -> i32`
//! - `read_char() -> i8`
//! - `write_integer(i32)`
//! - `write_char(i8)`

use inkwell::{
    module::Linkage,
    types::BasicMetadataTypeEnum,
    values::{BasicMetadataValueEnum, BasicValueEnum},
};

use crate::{
    errors::errors::{Error, ErrorImpl},
    types::type_info::TypeInfo,
    MK_ERROR,
};

use super::compiler::Compiler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimePrimitive {
    ReadInteger,
    ReadChar,
    WriteInteger,
    WriteChar,
}

impl RuntimePrimitive {
    pub const ALL: [RuntimePrimitive; 4] = [
        RuntimePrimitive::ReadInteger,
        RuntimePrimitive::ReadChar,
        RuntimePrimitive::WriteInteger,
        RuntimePrimitive::WriteChar,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            RuntimePrimitive::ReadInteger => "read_integer",
            RuntimePrimitive::ReadChar => "read_char",
            RuntimePrimitive::WriteInteger => "write_integer",
            RuntimePrimitive::WriteChar => "write_char",
        }
    }

    /// Primitive reading a value of the given type, if the type can be read.
    pub fn read(type_info: &TypeInfo) -> Option<Self> {
        match type_info {
            TypeInfo::Integer => Some(RuntimePrimitive::ReadInteger),
            TypeInfo::Char => Some(RuntimePrimitive::ReadChar),
            _ => None,
        }
    }

    pub fn write(type_info: &TypeInfo) -> Option<Self> {
        match type_info {
            TypeInfo::Integer => Some(RuntimePrimitive::WriteInteger),
            TypeInfo::Char => Some(RuntimePrimitive::WriteChar),
            _ => None,
        }
    }
}

/// Declares the four primitives with external linkage.
pub fn declare_runtime_functions(compiler: &Compiler<'_>) {
    let i32_type = compiler.context.i32_type();
    let i8_type = compiler.context.i8_type();
    let void_type = compiler.context.void_type();

    for primitive in RuntimePrimitive::ALL {
        let function_type = match primitive {
            RuntimePrimitive::ReadInteger => i32_type.fn_type(&[], false),
            RuntimePrimitive::ReadChar => i8_type.fn_type(&[], false),
            RuntimePrimitive::WriteInteger => {
                void_type.fn_type(&[BasicMetadataTypeEnum::from(i32_type)], false)
            }
            RuntimePrimitive::WriteChar => {
                void_type.fn_type(&[BasicMetadataTypeEnum::from(i8_type)], false)
            }
        };

        compiler
            .module
            .add_function(primitive.symbol(), function_type, Some(Linkage::External));
    }
}

/// Calls a primitive. Returns the value read, if any.
pub fn gen_runtime_call<'a>(
    compiler: &Compiler<'a>,
    primitive: RuntimePrimitive,
    arguments: &[BasicMetadataValueEnum<'a>],
    line: u32,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    let function = compiler
        .module
        .get_function(primitive.symbol())
        .ok_or_else(|| {
            MK_ERROR!(
                ErrorImpl::InternalFault {
                    message: format!("runtime function `{}` is not declared", primitive.symbol()),
                },
                line,
                compiler.file
            )
        })?;

    // Void calls must stay unnamed.
    let name = match primitive {
        RuntimePrimitive::ReadInteger | RuntimePrimitive::ReadChar => "input",
        RuntimePrimitive::WriteInteger | RuntimePrimitive::WriteChar => "",
    };

    let call = compiler
        .builder
        .build_call(function, arguments, name)
        .map_err(compiler.fault(line))?;

    Ok(call.try_as_basic_value().left())
}
