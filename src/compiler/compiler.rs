//! Main compiler module.
//!
//! This module contains the core Compiler structure and drives code
//! generation from a read program to a verified LLVM module. It owns the
//! LLVM context handles, the target machine, the three scoped symbol tables
//! and the label counters.

use std::{fmt::Display, rc::Rc};

use inkwell::{
    attributes::{Attribute, AttributeLoc},
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::{Linkage, Module},
    targets::{CodeModel, InitializationConfig, Target, TargetMachine, TargetTriple},
    types::{BasicType, BasicTypeEnum, FunctionType},
    values::FunctionValue,
};
use tracing::{debug, info};

use crate::{
    ast::ast::Program,
    config::CompileOptions,
    errors::errors::{Error, ErrorImpl},
    scope::scope::{ScopeError, ScopedTable},
    types::type_info::TypeInfo,
    MK_ERROR,
};

use super::{
    decl::{gen_block, Block},
    frames::FrameInfo,
    runtime::{declare_runtime_functions, RuntimePrimitive},
    symbols::{ProcInfo, VarInfo},
};

/// The main compiler structure that holds the state of the compilation process.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the LLVM context
pub struct Compiler<'a> {
    pub options: CompileOptions,
    /// Name of the tree file, used in error positions
    pub file: Rc<String>,

    /// Declared types
    pub types: ScopedTable<TypeInfo>,
    /// Declared variables and parameters, each scope tagged with its owning procedure
    pub variables: ScopedTable<VarInfo<'a>, Rc<ProcInfo<'a>>>,
    /// Declared procedures
    pub procedures: ScopedTable<Rc<ProcInfo<'a>>>,

    if_counter: usize,
    while_counter: usize,
    frame_counter: usize,

    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM module being built
    pub module: Module<'a>,
    /// The LLVM IR builder
    pub builder: Builder<'a>,
    pub target_machine: TargetMachine,
}

impl<'a> Compiler<'a> {
    /// Creates a new Compiler instance for the configured target.
    ///
    /// # Arguments
    ///
    /// * `context` - Reference to the LLVM context
    /// * `file` - Name of the file being compiled (used for module naming and errors)
    /// * `options` - Target and output options
    pub fn new(
        context: &'a Context,
        file: Rc<String>,
        options: CompileOptions,
    ) -> Result<Self, Error> {
        let target_machine = create_target_machine(&options, &file)?;

        let module = context.create_module(&file);
        module.set_triple(&target_machine.get_triple());
        module.set_data_layout(&target_machine.get_target_data().get_data_layout());

        Ok(Compiler {
            options,
            file,
            types: ScopedTable::new(),
            variables: ScopedTable::new(),
            procedures: ScopedTable::new(),
            if_counter: 0,
            while_counter: 0,
            frame_counter: 0,
            module,
            builder: context.create_builder(),
            context,
            target_machine,
        })
    }

    /// Generates the whole program into the module.
    ///
    /// The program body becomes the private function `<program>.body`, which
    /// receives the empty root frame. The entry symbol allocates that frame
    /// and calls the body.
    pub fn compile_program(&mut self, program: &Program) -> Result<(), Error> {
        info!(program = program.head.name.as_str(), "generating code");

        declare_runtime_functions(self);

        let frame = Rc::new(FrameInfo::root(
            self.next_frame_id(),
            &program.head.name,
            self.context,
        ));
        let symbol = format!("{}.body", program.head.name);
        let function_type = self
            .context
            .void_type()
            .fn_type(&[frame.pointer_type().into()], false);
        let function = self.create_function(&symbol, function_type, Linkage::Private, program.line)?;

        let body = Rc::new(ProcInfo {
            name: program.head.name.clone(),
            symbol,
            function,
            level: 0,
            frame,
            params: vec![],
        });

        self.in_scope(Rc::clone(&body), |compiler| {
            gen_block(compiler, &body, Block::from(program))
        })?;
        self.verify_function(&body, program.line)?;

        self.create_entry(&body, program.line)?;
        self.verify_module(program.line)
    }

    /// Runs `generate` inside a fresh scope of every symbol table.
    ///
    /// The scopes are popped again whether or not generation succeeds.
    pub fn in_scope<T>(
        &mut self,
        procedure: Rc<ProcInfo<'a>>,
        generate: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.types.push(());
        self.variables.push(procedure);
        self.procedures.push(());

        let result = generate(self);

        self.procedures.pop();
        self.variables.pop();
        self.types.pop();

        result
    }

    /// The procedure whose body is being generated.
    pub fn current_procedure(&self, line: u32) -> Result<Rc<ProcInfo<'a>>, Error> {
        self.variables
            .current()
            .map(|scope| Rc::clone(&scope.extra))
            .ok_or_else(|| {
                MK_ERROR!(
                    ErrorImpl::InternalFault {
                        message: String::from("no procedure is being generated"),
                    },
                    line,
                    self.file
                )
            })
    }

    pub fn next_frame_id(&mut self) -> usize {
        self.frame_counter += 1;
        self.frame_counter - 1
    }

    pub fn next_if_id(&mut self) -> usize {
        self.if_counter += 1;
        self.if_counter - 1
    }

    pub fn next_while_id(&mut self) -> usize {
        self.while_counter += 1;
        self.while_counter - 1
    }

    /// Wraps a failure inside LLVM or the builder as an internal fault at `line`.
    pub fn fault<E: Display>(&self, line: u32) -> impl FnOnce(E) -> Error {
        let file = Rc::clone(&self.file);
        move |error| {
            MK_ERROR!(
                ErrorImpl::InternalFault {
                    message: error.to_string(),
                },
                line,
                file
            )
        }
    }

    /// Maps a failed declaration to `DuplicateDeclaration`.
    pub fn declare_error(&self, line: u32) -> impl FnOnce(ScopeError) -> Error {
        let file = Rc::clone(&self.file);
        move |error| {
            let kind = match &error {
                ScopeError::Duplicate(name) => ErrorImpl::DuplicateDeclaration { name: name.clone() },
                ScopeError::NoScope => ErrorImpl::InternalFault {
                    message: error.to_string(),
                },
            };
            MK_ERROR!(kind, line, file)
        }
    }

    /// Whether a procedure may not use `symbol`: the entry point and the
    /// runtime primitives are defined outside the program.
    pub fn is_reserved_symbol(&self, symbol: &str) -> bool {
        symbol == self.options.entry_symbol
            || RuntimePrimitive::ALL
                .iter()
                .any(|primitive| primitive.symbol() == symbol)
    }

    /// Converts a resolved type to its LLVM storage type.
    ///
    /// Records become literal structs, so structurally equal records share one LLVM type.
    pub fn convert_type(&self, type_info: &TypeInfo) -> BasicTypeEnum<'a> {
        match type_info {
            TypeInfo::Integer => self.context.i32_type().into(),
            TypeInfo::Char => self.context.i8_type().into(),
            TypeInfo::Boolean => self.context.bool_type().into(),
            TypeInfo::Array(array) => self
                .convert_type(&array.element)
                .array_type(array.len)
                .into(),
            TypeInfo::Record(record) => {
                let fields: Vec<BasicTypeEnum<'a>> = record
                    .fields
                    .iter()
                    .map(|field| self.convert_type(&field.type_info))
                    .collect();
                self.context.struct_type(&fields, false).into()
            }
        }
    }

    /// Creates a new function in the module and positions the builder in its entry block.
    ///
    /// Adds function attributes like 'uwtable' and 'nounwind'.
    pub fn create_function(
        &self,
        name: &str,
        function_type: FunctionType<'a>,
        linkage: Linkage,
        line: u32,
    ) -> Result<FunctionValue<'a>, Error> {
        if self.module.get_function(name).is_some() {
            return Err(MK_ERROR!(
                ErrorImpl::BackendError {
                    message: format!("symbol `{}` is already defined in the module", name),
                },
                line,
                self.file
            ));
        }

        let function = self.module.add_function(name, function_type, Some(linkage));

        let attributes = [
            self.context
                .create_enum_attribute(Attribute::get_named_enum_kind_id("uwtable"), 0),
            self.context
                .create_enum_attribute(Attribute::get_named_enum_kind_id("nounwind"), 0),
        ];
        for attribute in attributes.iter() {
            function.add_attribute(AttributeLoc::Function, *attribute);
        }

        if let Some(frame) = function.get_first_param() {
            frame.into_pointer_value().set_name("env");
        }

        let entry = self.create_basic_block("entry", function);
        self.builder.position_at_end(entry);

        Ok(function)
    }

    /// Creates a new basic block at the end of the given function.
    pub fn create_basic_block(&self, name: &str, function: FunctionValue<'a>) -> BasicBlock<'a> {
        self.context.append_basic_block(function, name)
    }

    /// Moves `block` after every block of its function.
    ///
    /// Branch targets are created before the code branching to them, so this keeps
    /// the printed block order close to the source order.
    pub fn move_block_to_end(
        &self,
        block: BasicBlock<'a>,
        function: FunctionValue<'a>,
        line: u32,
    ) -> Result<(), Error> {
        match function.get_last_basic_block() {
            Some(last) if last != block => block.move_after(last).map_err(|_| {
                MK_ERROR!(
                    ErrorImpl::InternalFault {
                        message: String::from("failed to reorder basic blocks"),
                    },
                    line,
                    self.file
                )
            }),
            _ => Ok(()),
        }
    }

    /// Creates the external entry point that runs the program body with a new root frame.
    fn create_entry(&self, body: &ProcInfo<'a>, line: u32) -> Result<(), Error> {
        let function = self.create_function(
            &self.options.entry_symbol,
            self.context.void_type().fn_type(&[], false),
            Linkage::External,
            line,
        )?;

        let root = self
            .builder
            .build_alloca(body.frame.llvm_type, "root")
            .map_err(self.fault(line))?;
        self.builder
            .build_call(body.function, &[root.into()], "")
            .map_err(self.fault(line))?;
        self.builder.build_return(None).map_err(self.fault(line))?;

        if !function.verify(false) {
            return Err(MK_ERROR!(
                ErrorImpl::InternalFault {
                    message: format!("entry `{}` failed verification", self.options.entry_symbol),
                },
                line,
                self.file
            ));
        }

        debug!(entry = self.options.entry_symbol.as_str(), "created entry point");
        Ok(())
    }

    pub fn verify_function(&self, procedure: &ProcInfo<'a>, line: u32) -> Result<(), Error> {
        if procedure.function.verify(false) {
            return Ok(());
        }

        Err(MK_ERROR!(
            ErrorImpl::InternalFault {
                message: format!("generated function `{}` failed verification", procedure.symbol),
            },
            line,
            self.file
        ))
    }

    /// Verifies the finished module.
    ///
    /// No IR passes run here. The requested optimization level applies when
    /// the target machine emits assembly or object code.
    pub fn verify_module(&self, line: u32) -> Result<(), Error> {
        self.module.verify().map_err(self.fault(line))
    }

    pub fn print_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }
}

fn create_target_machine(options: &CompileOptions, file: &Rc<String>) -> Result<TargetMachine, Error> {
    let file = Rc::clone(file);
    let backend_error = |message: String| {
        MK_ERROR!(ErrorImpl::BackendError { message }, 0, file)
    };

    // Initialize all targets, targets info, target MCs, asm parsers and printers
    Target::initialize_all(&InitializationConfig::default());

    let target_triple = match &options.target_triple {
        Some(triple) => TargetTriple::create(triple),
        None => TargetMachine::get_default_triple(),
    };
    let target = Target::from_triple(&target_triple).map_err(|error| backend_error(error.to_string()))?;

    target
        .create_target_machine(
            &target_triple,
            &options.cpu,
            &options.features,
            options.opt_level,
            options.reloc_mode,
            CodeModel::Default,
        )
        .ok_or_else(|| {
            backend_error(format!(
                "cannot create a target machine for {}",
                target_triple.as_str().to_string_lossy()
            ))
        })
}

/// Generates `program` into a new module.
///
/// The returned compiler holds the verified module, ready to be printed or emitted.
pub fn compile<'a>(
    program: &Program,
    context: &'a Context,
    file: Rc<String>,
    options: CompileOptions,
) -> Result<Compiler<'a>, Error> {
    let mut compiler = Compiler::new(context, file, options)?;
    compiler.compile_program(program)?;

    Ok(compiler)
}
