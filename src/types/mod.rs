//! Resolved, structural types.

pub mod type_info;

#[cfg(test)]
mod tests;
