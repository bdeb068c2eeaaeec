//! Reader for the front end's textual syntax tree.
//!
//! The front end prints the tree one node per line, indented three spaces
//! per tree level. This module turns that text into the `ast` nodes:
//!
//! - Line classification using a regex pattern and a node-kind lookup table
//! - Recursive descent over the classified lines, guided by indentation
//! - `MalformedTree` errors pointing at the offending tree line

pub mod lines;
pub mod reader;

#[cfg(test)]
mod tests;
