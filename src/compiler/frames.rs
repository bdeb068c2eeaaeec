//! Activation frames and static links.
//!
//! Every generated procedure receives a pointer to its frame as its first
//! argument. A frame is a struct whose field 0 points to the frame of the
//! lexically enclosing procedure (the static link) and whose other fields
//! point to the enclosing procedure's locals and parameters, captured by
//! address when the nested procedure was declared:
//!
//! ```text
//! { enclosing_frame*, local_1*, ..., local_n* }
//! ```
//!
//! Frames are literal LLVM structs, so two sibling procedures capturing the
//! same locals get the same frame type. That is what lets a procedure hand
//! its own frame (or one reached through static links) to a sibling.
//!
//! Inside the compiler a captured variable is addressed as a frame id plus
//! a field index; only the generated code deals in raw pointers.

use std::rc::Rc;

use inkwell::{
    context::Context,
    types::{BasicType, BasicTypeEnum, PointerType, StructType},
    values::PointerValue,
    AddressSpace,
};
use tracing::{debug, trace};

use crate::{
    errors::errors::{Error, ErrorImpl},
    types::type_info::TypeInfo,
    MK_ERROR,
};

use super::{compiler::Compiler, symbols::ProcInfo};

#[derive(Debug, Clone, PartialEq)]
pub struct CapturedVar {
    pub name: String,
    pub type_info: TypeInfo,
}

#[derive(Debug)]
pub struct FrameInfo<'a> {
    /// Unique per frame type built. Identifies frames without comparing LLVM types.
    pub id: usize,
    /// Procedure receiving frames of this type.
    pub owner: String,
    /// Frame type of the enclosing procedure. `None` for the root frame.
    pub parent: Option<Rc<FrameInfo<'a>>>,
    /// Captured locals of the enclosing procedure; capture `i` is field `i + 1`.
    pub captures: Vec<CapturedVar>,
    pub llvm_type: StructType<'a>,
}

impl<'a> FrameInfo<'a> {
    /// The empty frame handed to the program body.
    pub fn root(id: usize, owner: &str, context: &'a Context) -> Self {
        FrameInfo {
            id,
            owner: owner.to_string(),
            parent: None,
            captures: vec![],
            llvm_type: context.struct_type(&[], false),
        }
    }

    pub fn pointer_type(&self) -> PointerType<'a> {
        self.llvm_type.ptr_type(AddressSpace::default())
    }

    pub fn field_index(&self, name: &str) -> Option<u32> {
        self.captures
            .iter()
            .position(|capture| capture.name == name)
            .map(|index| index as u32 + 1)
    }
}

/// Builds the frame type of procedure `name`, declared in `enclosing`.
///
/// Captures every variable and parameter the enclosing procedure has
/// declared so far, in declaration order.
pub fn build_frame<'a>(
    compiler: &mut Compiler<'a>,
    enclosing: &ProcInfo<'a>,
    name: &str,
    line: u32,
) -> Result<FrameInfo<'a>, Error> {
    let scope = compiler.variables.current().ok_or_else(|| {
        MK_ERROR!(
            ErrorImpl::InternalFault {
                message: format!("procedure `{}` declared outside of any scope", name),
            },
            line,
            compiler.file
        )
    })?;

    let captures: Vec<CapturedVar> = scope
        .iter()
        .map(|(name, var)| CapturedVar {
            name: name.to_string(),
            type_info: var.type_info.clone(),
        })
        .collect();

    let mut fields: Vec<BasicTypeEnum<'a>> = vec![enclosing.frame.pointer_type().into()];
    for capture in &captures {
        fields.push(
            compiler
                .convert_type(&capture.type_info)
                .ptr_type(AddressSpace::default())
                .into(),
        );
    }

    let llvm_type = compiler.context.struct_type(&fields, false);

    debug!(
        procedure = name,
        enclosing = enclosing.name.as_str(),
        captures = captures.len(),
        "built frame type"
    );

    Ok(FrameInfo {
        id: compiler.next_frame_id(),
        owner: name.to_string(),
        parent: Some(Rc::clone(&enclosing.frame)),
        captures,
        llvm_type,
    })
}

/// Produces the frame pointer `caller` passes when calling `callee`.
///
/// Calling a procedure declared directly inside the caller allocates a new
/// frame. Calling any other visible procedure (itself, a sibling, or one
/// visible from an enclosing procedure) reuses the frame reached by following
/// `caller.level - callee.level` static links.
pub fn gen_frame_argument<'a>(
    compiler: &Compiler<'a>,
    caller: &Rc<ProcInfo<'a>>,
    callee: &ProcInfo<'a>,
    line: u32,
) -> Result<PointerValue<'a>, Error> {
    if callee.level == caller.level + 1 {
        gen_new_frame(compiler, caller, callee, line)
    } else if callee.level <= caller.level {
        let hops = caller.level - callee.level;
        trace!(
            caller = caller.symbol.as_str(),
            callee = callee.symbol.as_str(),
            hops,
            "reusing frame"
        );

        let mut pointer = own_frame_pointer(compiler, caller, line)?;
        for _ in 0..hops {
            pointer = gen_load_static_link(compiler, pointer, line)?;
        }

        Ok(pointer)
    } else {
        Err(MK_ERROR!(
            ErrorImpl::InternalFault {
                message: format!(
                    "`{}` at level {} is not callable from level {}",
                    callee.name, callee.level, caller.level
                ),
            },
            line,
            compiler.file
        ))
    }
}

/// Fills a fresh frame for `callee` from the caller's activation.
///
/// The frame storage is allocated once per call site in the caller's entry
/// block and refilled on every execution of the call, so a call inside a
/// loop does not grow the stack. The callee returns before the call site
/// runs again, which leaves no live user of the previous contents.
fn gen_new_frame<'a>(
    compiler: &Compiler<'a>,
    caller: &Rc<ProcInfo<'a>>,
    callee: &ProcInfo<'a>,
    line: u32,
) -> Result<PointerValue<'a>, Error> {
    let frame = gen_entry_alloca(compiler, caller, callee.frame.llvm_type, line)?;

    let link = compiler
        .builder
        .build_struct_gep(frame, 0, "frame.link")
        .map_err(compiler.fault(line))?;
    let caller_frame = own_frame_pointer(compiler, caller, line)?;
    compiler
        .builder
        .build_store(link, caller_frame)
        .map_err(compiler.fault(line))?;

    for (index, capture) in callee.frame.captures.iter().enumerate() {
        let location = match compiler.variables.lookup(&capture.name) {
            Some((var, owner)) if Rc::ptr_eq(owner, caller) => var.location,
            _ => {
                return Err(MK_ERROR!(
                    ErrorImpl::InternalFault {
                        message: format!(
                            "`{}` captured by `{}` is not a local of `{}`",
                            capture.name, callee.name, caller.name
                        ),
                    },
                    line,
                    compiler.file
                ))
            }
        };

        let slot = compiler
            .builder
            .build_struct_gep(frame, index as u32 + 1, &format!("frame.{}", capture.name))
            .map_err(compiler.fault(line))?;
        compiler
            .builder
            .build_store(slot, location)
            .map_err(compiler.fault(line))?;
    }

    debug!(
        caller = caller.symbol.as_str(),
        callee = callee.symbol.as_str(),
        captures = callee.frame.captures.len(),
        "allocated frame"
    );

    Ok(frame)
}

/// Address of variable `name` owned by an enclosing procedure `owner`.
///
/// Follows static links from the current frame until reaching the frame
/// whose static link points to `owner`'s frame: the frame of `owner`'s child
/// on the current lexical path, which captured the variable. Then loads the
/// captured pointer from that frame.
pub fn gen_nonlocal_address<'a>(
    compiler: &Compiler<'a>,
    current: &ProcInfo<'a>,
    owner: &ProcInfo<'a>,
    name: &str,
    line: u32,
) -> Result<PointerValue<'a>, Error> {
    let mut frame = Rc::clone(&current.frame);
    let mut pointer = own_frame_pointer(compiler, current, line)?;
    let mut hops = 0;

    loop {
        let parent = match &frame.parent {
            Some(parent) => Rc::clone(parent),
            None => {
                return Err(MK_ERROR!(
                    ErrorImpl::InternalFault {
                        message: format!(
                            "no frame on the path from `{}` captures `{}`",
                            current.name, name
                        ),
                    },
                    line,
                    compiler.file
                ))
            }
        };

        if parent.id == owner.frame.id {
            break;
        }

        pointer = gen_load_static_link(compiler, pointer, line)?;
        frame = parent;
        hops += 1;
    }

    let index = frame.field_index(name).ok_or_else(|| {
        MK_ERROR!(
            ErrorImpl::InternalFault {
                message: format!("frame of `{}` does not capture `{}`", frame.owner, name),
            },
            line,
            compiler.file
        )
    })?;

    trace!(
        variable = name,
        from = current.symbol.as_str(),
        owner = owner.symbol.as_str(),
        hops,
        "non-local access"
    );

    let slot = compiler
        .builder
        .build_struct_gep(pointer, index, &format!("{}.slot", name))
        .map_err(compiler.fault(line))?;
    let address = compiler
        .builder
        .build_load(slot, &format!("{}.ref", name))
        .map_err(compiler.fault(line))?;

    Ok(address.into_pointer_value())
}

/// Allocates `llvm_type` at the top of the entry block of `procedure`.
///
/// Uses its own builder, so the insertion point of the compiler is untouched.
fn gen_entry_alloca<'a>(
    compiler: &Compiler<'a>,
    procedure: &ProcInfo<'a>,
    llvm_type: StructType<'a>,
    line: u32,
) -> Result<PointerValue<'a>, Error> {
    let entry = procedure.function.get_first_basic_block().ok_or_else(|| {
        MK_ERROR!(
            ErrorImpl::InternalFault {
                message: format!("`{}` has no entry block", procedure.symbol),
            },
            line,
            compiler.file
        )
    })?;

    let builder = compiler.context.create_builder();
    match entry.get_first_instruction() {
        Some(first) => builder.position_before(&first),
        None => builder.position_at_end(entry),
    }

    builder
        .build_alloca(llvm_type, "frame")
        .map_err(compiler.fault(line))
}

fn gen_load_static_link<'a>(
    compiler: &Compiler<'a>,
    frame: PointerValue<'a>,
    line: u32,
) -> Result<PointerValue<'a>, Error> {
    let link = compiler
        .builder
        .build_struct_gep(frame, 0, "link")
        .map_err(compiler.fault(line))?;
    let parent = compiler
        .builder
        .build_load(link, "static_link")
        .map_err(compiler.fault(line))?;

    Ok(parent.into_pointer_value())
}

fn own_frame_pointer<'a>(
    compiler: &Compiler<'a>,
    procedure: &ProcInfo<'a>,
    line: u32,
) -> Result<PointerValue<'a>, Error> {
    procedure.frame_pointer().ok_or_else(|| {
        MK_ERROR!(
            ErrorImpl::InternalFault {
                message: format!("`{}` has no frame parameter", procedure.name),
            },
            line,
            compiler.file
        )
    })
}
