//! Utility macros for the compiler.
//!
//! This module defines helper macros used throughout the compiler:
//!
//! - `MK_ERROR!` - Creates an Error at a source line of the current file
//! - `MK_TREE_ERROR!` - Creates a MalformedTree error for a tree line
//!
//! These macros reduce boilerplate in the reader and code generator.

/// Creates an Error instance located at a source line.
///
/// # Arguments
///
/// * `$kind` - The ErrorImpl variant
/// * `$line` - The source line number
/// * `$file` - An `Rc<String>` naming the file
///
/// # Example
///
/// ```ignore
/// return Err(MK_ERROR!(ErrorImpl::UnknownType { type_ }, line, compiler.file));
/// ```
#[macro_export]
macro_rules! MK_ERROR {
    ($kind:expr, $line:expr, $file:expr) => {
        $crate::errors::errors::Error::new(
            $kind,
            $crate::Position($line, ::std::rc::Rc::clone(&$file)),
        )
    };
}

/// Creates a MalformedTree error for the tree line that failed to read.
///
/// # Arguments
///
/// * `$line` - The `TreeLine` being read
/// * `$message` - What was wrong with it
/// * `$file` - An `Rc<String>` naming the tree file
#[macro_export]
macro_rules! MK_TREE_ERROR {
    ($line:expr, $message:expr, $file:expr) => {
        $crate::MK_ERROR!(
            $crate::errors::errors::ErrorImpl::MalformedTree {
                line: $line.text.clone(),
                message: String::from($message),
            },
            $line.source_line,
            $file
        )
    };
}
