use std::rc::Rc;

use inkwell::{
    module::Linkage,
    types::{BasicMetadataTypeEnum, BasicType},
    AddressSpace,
};
use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{ParamDecl, ProcDecl, Program, TypeDecl, VarDecl},
        statements::StatementList,
    },
    errors::errors::{Error, ErrorImpl},
    types::type_info::resolve_type,
    MK_ERROR,
};

use super::{
    compiler::Compiler,
    frames::build_frame,
    stmt::gen_statement_list,
    symbols::{ParamInfo, ProcInfo, VarInfo},
};

/// The parts shared by the program and by every procedure declaration.
pub struct Block<'p> {
    pub line: u32,
    pub type_decls: &'p [TypeDecl],
    pub var_decls: &'p [VarDecl],
    pub proc_decls: &'p [ProcDecl],
    pub body: &'p StatementList,
}

impl<'p> From<&'p Program> for Block<'p> {
    fn from(program: &'p Program) -> Self {
        Block {
            line: program.line,
            type_decls: &program.type_decls,
            var_decls: &program.var_decls,
            proc_decls: &program.proc_decls,
            body: &program.body,
        }
    }
}

impl<'p> From<&'p ProcDecl> for Block<'p> {
    fn from(decl: &'p ProcDecl) -> Self {
        Block {
            line: decl.line,
            type_decls: &decl.type_decls,
            var_decls: &decl.var_decls,
            proc_decls: &decl.proc_decls,
            body: &decl.body,
        }
    }
}

/// Generates the body of `procedure` into its function.
///
/// Must run inside the procedure's own scope, with the builder at the end of
/// the function's entry block. Parameters and variables are declared before
/// any nested procedure, so every nested frame captures all of them.
pub fn gen_block<'a>(
    compiler: &mut Compiler<'a>,
    procedure: &ProcInfo<'a>,
    block: Block<'_>,
) -> Result<(), Error> {
    gen_params(compiler, procedure, block.line)?;

    for decl in block.type_decls {
        gen_type_decl(compiler, decl)?;
    }
    for decl in block.var_decls {
        gen_var_decl(compiler, decl)?;
    }
    for decl in block.proc_decls {
        gen_proc_decl(compiler, decl)?;
    }

    gen_statement_list(compiler, block.body)?;

    compiler
        .builder
        .build_return(None)
        .map_err(compiler.fault(block.line))?;

    Ok(())
}

fn gen_type_decl(compiler: &mut Compiler<'_>, decl: &TypeDecl) -> Result<(), Error> {
    let type_info = resolve_type(&decl.type_node, &compiler.types, decl.line, &compiler.file)?;
    trace!(name = decl.name.as_str(), type_ = %type_info, "declared type");

    compiler
        .types
        .declare(&decl.name, type_info)
        .map_err(compiler.declare_error(decl.line))
}

fn gen_var_decl(compiler: &mut Compiler<'_>, decl: &VarDecl) -> Result<(), Error> {
    let type_info = resolve_type(&decl.type_node, &compiler.types, decl.line, &compiler.file)?;
    let llvm_type = compiler.convert_type(&type_info);

    for name in &decl.names {
        let location = compiler
            .builder
            .build_alloca(llvm_type, name)
            .map_err(compiler.fault(decl.line))?;

        trace!(name = name.as_str(), type_ = %type_info, "declared variable");
        compiler
            .variables
            .declare(
                name,
                VarInfo {
                    location,
                    type_info: type_info.clone(),
                },
            )
            .map_err(compiler.declare_error(decl.line))?;
    }

    Ok(())
}

/// Gives every parameter of `procedure` a location in the current scope.
///
/// A by-value parameter is copied into a local slot. A by-reference parameter
/// arrives as a pointer, which is used as the location directly.
fn gen_params<'a>(
    compiler: &mut Compiler<'a>,
    procedure: &ProcInfo<'a>,
    line: u32,
) -> Result<(), Error> {
    for (index, param) in procedure.params.iter().enumerate() {
        let value = procedure
            .function
            .get_nth_param(index as u32 + 1)
            .ok_or_else(|| {
                MK_ERROR!(
                    ErrorImpl::InternalFault {
                        message: format!("`{}` has no parameter `{}`", procedure.name, param.name),
                    },
                    line,
                    compiler.file
                )
            })?;

        let location = if param.by_ref {
            let pointer = value.into_pointer_value();
            pointer.set_name(&param.name);
            pointer
        } else {
            let slot = compiler
                .builder
                .build_alloca(compiler.convert_type(&param.type_info), &param.name)
                .map_err(compiler.fault(line))?;
            compiler
                .builder
                .build_store(slot, value)
                .map_err(compiler.fault(line))?;
            slot
        };

        compiler
            .variables
            .declare(
                &param.name,
                VarInfo {
                    location,
                    type_info: param.type_info.clone(),
                },
            )
            .map_err(compiler.declare_error(line))?;
    }

    Ok(())
}

/// Resolves parameter types in the declaring procedure's scope.
fn resolve_params(compiler: &Compiler<'_>, params: &[ParamDecl]) -> Result<Vec<ParamInfo>, Error> {
    let mut resolved = vec![];
    for decl in params {
        let type_info = resolve_type(&decl.type_node, &compiler.types, decl.line, &compiler.file)?;
        for name in &decl.names {
            resolved.push(ParamInfo {
                name: name.clone(),
                type_info: type_info.clone(),
                by_ref: decl.by_ref,
            });
        }
    }

    Ok(resolved)
}

/// Declares a procedure nested in the current one and generates its body.
///
/// The frame type is fixed here, from the enclosing procedure's locals
/// declared so far. The procedure is registered before its body is generated,
/// so it can call itself.
pub fn gen_proc_decl<'a>(compiler: &mut Compiler<'a>, decl: &ProcDecl) -> Result<(), Error> {
    let enclosing = compiler.current_procedure(decl.line)?;
    let params = resolve_params(compiler, &decl.params)?;
    let frame = Rc::new(build_frame(compiler, &enclosing, &decl.name, decl.line)?);

    let mut param_types: Vec<BasicMetadataTypeEnum<'a>> = vec![frame.pointer_type().into()];
    for param in &params {
        let llvm_type = compiler.convert_type(&param.type_info);
        param_types.push(if param.by_ref {
            llvm_type.ptr_type(AddressSpace::default()).into()
        } else {
            llvm_type.into()
        });
    }
    let function_type = compiler.context.void_type().fn_type(&param_types, false);

    let symbol = enclosing.nested_symbol(&decl.name);
    if compiler.is_reserved_symbol(&symbol) {
        return Err(MK_ERROR!(
            ErrorImpl::ReservedName { name: symbol },
            decl.line,
            compiler.file
        ));
    }
    let previous_block = compiler.builder.get_insert_block();
    let function = compiler.create_function(&symbol, function_type, Linkage::Private, decl.line)?;

    let procedure = Rc::new(ProcInfo {
        name: decl.name.clone(),
        symbol,
        function,
        level: enclosing.level + 1,
        frame,
        params,
    });

    debug!(
        procedure = procedure.symbol.as_str(),
        level = procedure.level,
        params = procedure.params.len(),
        "declared procedure"
    );

    compiler
        .procedures
        .declare(&decl.name, Rc::clone(&procedure))
        .map_err(compiler.declare_error(decl.line))?;

    compiler.in_scope(Rc::clone(&procedure), |compiler| {
        gen_block(compiler, &procedure, Block::from(decl))
    })?;
    compiler.verify_function(&procedure, decl.line)?;

    if let Some(block) = previous_block {
        compiler.builder.position_at_end(block);
    }

    Ok(())
}
