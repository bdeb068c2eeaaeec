use lazy_static::lazy_static;
use regex::Regex;
use std::{collections::HashMap, fmt::Display, rc::Rc};

use crate::{errors::errors::{Error, ErrorImpl}, MK_ERROR};

/// Spaces per tree level in the front end's output.
pub const INDENT_WIDTH: usize = 3;

lazy_static! {
    static ref LINE_PATTERN: Regex =
        Regex::new(r"^(?P<indent>[ \t]*)(?P<kind>[A-Za-z]+) (?P<line>[0-9]+)(?P<rest>.*)$").unwrap();
    pub static ref NODE_KIND_LOOKUP: HashMap<&'static str, NodeKind> = {
        let mut map = HashMap::new();
        map.insert("ProK", NodeKind::Program);
        map.insert("PheadK", NodeKind::ProgramHead);
        map.insert("TypeK", NodeKind::TypePart);
        map.insert("VarK", NodeKind::VarPart);
        map.insert("ProcDecK", NodeKind::ProcDecl);
        map.insert("DecK", NodeKind::Decl);
        map.insert("StmLK", NodeKind::StatementList);
        map.insert("StmtK", NodeKind::Statement);
        map.insert("ExpK", NodeKind::Expression);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum NodeKind {
    Program,
    ProgramHead,
    TypePart,
    VarPart,
    ProcDecl,
    Decl,
    StatementList,
    Statement,
    Expression,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = NODE_KIND_LOOKUP
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("?");
        write!(f, "{}", name)
    }
}

/// One line of the textual tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeLine {
    pub text: String,
    pub level: usize,
    pub kind: NodeKind,
    pub source_line: u32,
    /// Everything after the source line number, untrimmed.
    pub rest: String,
    pub words: Vec<String>,
}

impl TreeLine {
    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }
}

fn indent_level(indent: &str) -> usize {
    let width: usize = indent
        .chars()
        .map(|c| if c == '\t' { INDENT_WIDTH } else { 1 })
        .sum();
    width / INDENT_WIDTH
}

/// Splits the tree text into classified lines. Blank lines are skipped.
pub fn split_lines(source: &str, file: &Rc<String>) -> Result<Vec<TreeLine>, Error> {
    let mut lines = vec![];

    for text in source.lines() {
        if text.trim().is_empty() {
            continue;
        }

        let captures = LINE_PATTERN.captures(text).ok_or_else(|| {
            MK_ERROR!(
                ErrorImpl::MalformedTree {
                    line: text.to_string(),
                    message: String::from("expected `<NodeKind> <line> ...`"),
                },
                0,
                file
            )
        })?;

        let kind_name = &captures["kind"];
        let kind = *NODE_KIND_LOOKUP.get(kind_name).ok_or_else(|| {
            MK_ERROR!(
                ErrorImpl::MalformedTree {
                    line: text.to_string(),
                    message: format!("unknown node kind `{}`", kind_name),
                },
                0,
                file
            )
        })?;

        let source_line = captures["line"].parse::<u32>().map_err(|_| {
            MK_ERROR!(
                ErrorImpl::MalformedTree {
                    line: text.to_string(),
                    message: String::from("line number out of range"),
                },
                0,
                file
            )
        })?;

        let rest = captures["rest"].to_string();
        let words = rest.split_whitespace().map(String::from).collect();

        lines.push(TreeLine {
            text: text.to_string(),
            level: indent_level(&captures["indent"]),
            kind,
            source_line,
            rest,
            words,
        });
    }

    Ok(lines)
}
