//! Entries of the variable and procedure tables.

use std::rc::Rc;

use inkwell::values::{FunctionValue, PointerValue};

use crate::types::type_info::TypeInfo;

use super::frames::FrameInfo;

/// A variable or parameter: where it lives in the activation of its owner, and its type.
#[derive(Debug, Clone)]
pub struct VarInfo<'a> {
    pub location: PointerValue<'a>,
    pub type_info: TypeInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: String,
    pub type_info: TypeInfo,
    pub by_ref: bool,
}

/// A declared procedure. Created once, when its declaration is visited.
#[derive(Debug)]
pub struct ProcInfo<'a> {
    /// Name as written in the program.
    pub name: String,
    /// Symbol of the generated function.
    pub symbol: String,
    pub function: FunctionValue<'a>,
    /// Lexical level. The program body is level 0.
    pub level: usize,
    /// Type of the frame this procedure receives as its first argument.
    pub frame: Rc<FrameInfo<'a>>,
    pub params: Vec<ParamInfo>,
}

impl<'a> ProcInfo<'a> {
    /// The frame pointer the procedure itself received.
    pub fn frame_pointer(&self) -> Option<PointerValue<'a>> {
        self.function
            .get_first_param()
            .map(|param| param.into_pointer_value())
    }

    /// Symbol for a procedure declared inside this one.
    pub fn nested_symbol(&self, name: &str) -> String {
        if self.level == 0 {
            name.to_string()
        } else {
            format!("{}.{}", self.symbol, name)
        }
    }
}
