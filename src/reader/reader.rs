use std::{fs, path::Path, rc::Rc};

use tracing::debug;

use crate::{
    ast::{
        ast::{ParamDecl, ProcDecl, Program, ProgramHead, TypeDecl, VarDecl},
        expressions::{Expr, ExprKind, Operator},
        statements::{StatementList, Stmt, StmtKind},
        types::TypeNode,
    },
    errors::errors::{Error, ErrorImpl},
    MK_ERROR, MK_TREE_ERROR,
};

use super::lines::{split_lines, NodeKind, TreeLine};

const VALUE_PARAM: &str = "valparamType";
const REFERENCE_PARAM: &str = "varparamType";

/// Recursive-descent reader over the classified lines of a textual tree.
pub struct TreeReader {
    lines: Vec<TreeLine>,
    pos: usize,
    file: Rc<String>,
}

impl TreeReader {
    pub fn new(lines: Vec<TreeLine>, file: Rc<String>) -> Self {
        TreeReader {
            lines,
            pos: 0,
            file,
        }
    }

    fn peek(&self) -> Option<&TreeLine> {
        self.lines.get(self.pos)
    }

    fn peek_is(&self, kind: NodeKind) -> bool {
        self.peek().is_some_and(|line| line.kind == kind)
    }

    fn peek_at_level(&self, kind: NodeKind, level: usize) -> bool {
        self.peek()
            .is_some_and(|line| line.kind == kind && line.level == level)
    }

    fn advance(&mut self) -> TreeLine {
        let line = self.lines[self.pos].clone();
        self.pos += 1;
        line
    }

    fn expect(&mut self, kind: NodeKind) -> Result<TreeLine, Error> {
        match self.peek() {
            Some(line) if line.kind == kind => Ok(self.advance()),
            Some(line) => Err(MK_TREE_ERROR!(
                line,
                format!("expected a `{}` node", kind),
                self.file
            )),
            None => Err(MK_ERROR!(
                ErrorImpl::MalformedTree {
                    line: String::from("<end of tree>"),
                    message: format!("expected a `{}` node", kind),
                },
                self.lines.last().map_or(0, |line| line.source_line),
                self.file
            )),
        }
    }

    pub fn read_program(&mut self) -> Result<Program, Error> {
        let program_line = self.expect(NodeKind::Program)?;

        let head_line = self.expect(NodeKind::ProgramHead)?;
        let name = head_line
            .word(0)
            .ok_or_else(|| MK_TREE_ERROR!(head_line, "program head without a name", self.file))?
            .to_string();

        let type_decls = self.read_type_part()?;
        let var_decls = self.read_var_part()?;
        let proc_decls = self.read_proc_part()?;
        let body = self.read_statement_list()?;

        if let Some(line) = self.peek() {
            return Err(MK_TREE_ERROR!(line, "trailing node after program body", self.file));
        }

        debug!(program = %name, procedures = proc_decls.len(), "read program tree");

        Ok(Program {
            line: program_line.source_line,
            head: ProgramHead {
                line: head_line.source_line,
                name,
            },
            type_decls,
            var_decls,
            proc_decls,
            body,
        })
    }

    fn read_type_part(&mut self) -> Result<Vec<TypeDecl>, Error> {
        if !self.peek_is(NodeKind::TypePart) {
            return Ok(vec![]);
        }
        self.advance();

        let mut type_decls = vec![];
        while self.peek_is(NodeKind::Decl) {
            let line = self.advance();
            let Some((name, spec)) = line.words.split_last() else {
                return Err(MK_TREE_ERROR!(line, "type declaration without a name", self.file));
            };

            let (type_node, rest) = self.read_type_spec(&line, spec)?;
            if !rest.is_empty() {
                return Err(MK_TREE_ERROR!(
                    line,
                    "type declaration names more than one type",
                    self.file
                ));
            }

            type_decls.push(TypeDecl {
                line: line.source_line,
                name: name.clone(),
                type_node,
            });
        }

        Ok(type_decls)
    }

    fn read_var_part(&mut self) -> Result<Vec<VarDecl>, Error> {
        if !self.peek_is(NodeKind::VarPart) {
            return Ok(vec![]);
        }
        let part = self.advance();
        self.read_var_decls(part.level + 1)
    }

    /// Reads variable (or record field) declarations at exactly `level`.
    fn read_var_decls(&mut self, level: usize) -> Result<Vec<VarDecl>, Error> {
        let mut var_decls = vec![];

        while self.peek_at_level(NodeKind::Decl, level) {
            let line = self.advance();
            let (type_node, names) = self.read_type_spec(&line, &line.words)?;
            if names.is_empty() {
                return Err(MK_TREE_ERROR!(line, "declaration without names", self.file));
            }

            var_decls.push(VarDecl {
                line: line.source_line,
                type_node,
                names,
            });
        }

        Ok(var_decls)
    }

    /// Reads `IntegerK | CharK | ArrayK low high elem | RecordK | IdK name` from the
    /// front of `words`. Record fields are read from the lines nested below `line`.
    /// Returns the type and the words left over.
    fn read_type_spec(
        &mut self,
        line: &TreeLine,
        words: &[String],
    ) -> Result<(TypeNode, Vec<String>), Error> {
        let Some((kind, rest)) = words.split_first() else {
            return Err(MK_TREE_ERROR!(line, "missing type", self.file));
        };

        let (type_node, used) = match kind.as_str() {
            "IntegerK" => (TypeNode::Integer, 0),
            "CharK" => (TypeNode::Char, 0),
            "ArrayK" => {
                let [low, high, element, ..] = rest else {
                    return Err(MK_TREE_ERROR!(
                        line,
                        "array type needs `low high element`",
                        self.file
                    ));
                };
                let low = self.read_number(line, low)?;
                let high = self.read_number(line, high)?;
                let element = match element.as_str() {
                    "IntegerK" => TypeNode::Integer,
                    "CharK" => TypeNode::Char,
                    other => {
                        return Err(MK_TREE_ERROR!(
                            line,
                            format!("unsupported array element type `{}`", other),
                            self.file
                        ))
                    }
                };
                (
                    TypeNode::Array {
                        low,
                        high,
                        element: Box::new(element),
                    },
                    3,
                )
            }
            "RecordK" => {
                let fields = self.read_var_decls(line.level + 1)?;
                (TypeNode::Record(fields), 0)
            }
            "IdK" => {
                let Some(name) = rest.first() else {
                    return Err(MK_TREE_ERROR!(line, "named type without a name", self.file));
                };
                (
                    TypeNode::Named {
                        name: name.clone(),
                        line: line.source_line,
                    },
                    1,
                )
            }
            other => {
                return Err(MK_TREE_ERROR!(
                    line,
                    format!("unknown type kind `{}`", other),
                    self.file
                ))
            }
        };

        Ok((type_node, rest[used..].to_vec()))
    }

    fn read_number(&self, line: &TreeLine, word: &str) -> Result<i32, Error> {
        word.parse::<i32>()
            .map_err(|_| MK_TREE_ERROR!(line, format!("invalid number `{}`", word), self.file))
    }

    fn read_proc_part(&mut self) -> Result<Vec<ProcDecl>, Error> {
        // The part header is `ProcDecK n`, each procedure is `ProcDecK n name`.
        if !self
            .peek()
            .is_some_and(|line| line.kind == NodeKind::ProcDecl && line.words.is_empty())
        {
            return Ok(vec![]);
        }
        self.advance();

        let mut proc_decls = vec![];
        while self
            .peek()
            .is_some_and(|line| line.kind == NodeKind::ProcDecl && line.words.len() == 1)
        {
            proc_decls.push(self.read_proc_decl()?);
        }

        Ok(proc_decls)
    }

    fn read_proc_decl(&mut self) -> Result<ProcDecl, Error> {
        let line = self.advance();
        let name = line.words[0].clone();

        let mut params = vec![];
        while self.peek().is_some_and(|param| {
            param.kind == NodeKind::Decl
                && matches!(param.word(0), Some(VALUE_PARAM) | Some(REFERENCE_PARAM))
        }) {
            params.push(self.read_param_decl()?);
        }

        let type_decls = self.read_type_part()?;
        let var_decls = self.read_var_part()?;
        let proc_decls = self.read_proc_part()?;
        let body = self.read_statement_list()?;

        Ok(ProcDecl {
            line: line.source_line,
            name,
            params,
            type_decls,
            var_decls,
            proc_decls,
            body,
        })
    }

    fn read_param_decl(&mut self) -> Result<ParamDecl, Error> {
        let line = self.advance();
        let by_ref = line.word(0) == Some(REFERENCE_PARAM);
        let (type_node, names) = self.read_type_spec(&line, &line.words[1..])?;
        if names.is_empty() {
            return Err(MK_TREE_ERROR!(line, "parameter declaration without names", self.file));
        }

        Ok(ParamDecl {
            line: line.source_line,
            by_ref,
            type_node,
            names,
        })
    }

    fn read_statement_list(&mut self) -> Result<StatementList, Error> {
        let line = self.expect(NodeKind::StatementList)?;

        let mut statements = vec![];
        while self.peek_at_level(NodeKind::Statement, line.level + 1) {
            statements.push(self.read_statement()?);
        }

        Ok(StatementList {
            line: line.source_line,
            statements,
        })
    }

    fn read_statement(&mut self) -> Result<Stmt, Error> {
        let line = self.advance();
        let child_level = line.level + 1;

        let kind = match line.word(0) {
            Some("AssignK") => {
                let target = self.expect_expression(&line, child_level, "assignment target")?;
                if !target.is_assignable() {
                    return Err(MK_TREE_ERROR!(
                        line,
                        "assignment target is not assignable",
                        self.file
                    ));
                }
                let value = self.expect_expression(&line, child_level, "assignment value")?;
                StmtKind::Assign { target, value }
            }
            Some("CallK") => {
                let name = self.expect_word(&line, 1, "called procedure name")?;
                let mut arguments = vec![];
                while let Some(argument) = self.read_expression(child_level)? {
                    arguments.push(argument);
                }
                StmtKind::Call { name, arguments }
            }
            Some("IfK") => {
                let condition = self.expect_expression(&line, child_level, "if condition")?;
                let then_body = self.read_statement_list()?;
                let else_body = self.read_statement_list()?;
                StmtKind::If {
                    condition,
                    then_body,
                    else_body,
                }
            }
            Some("WhileK") => {
                let condition = self.expect_expression(&line, child_level, "while condition")?;
                let body = self.read_statement_list()?;
                StmtKind::While { condition, body }
            }
            Some("ReadK") => {
                let name = self.expect_word(&line, 1, "read variable")?;
                StmtKind::Read {
                    target: Expr::identifier(line.source_line, &name),
                }
            }
            Some("WriteK") => {
                let value = self.expect_expression(&line, child_level, "write value")?;
                StmtKind::Write { value }
            }
            Some("ReturnK") => StmtKind::Return,
            Some(other) => {
                return Err(MK_TREE_ERROR!(
                    line,
                    format!("unknown statement kind `{}`", other),
                    self.file
                ))
            }
            None => return Err(MK_TREE_ERROR!(line, "statement without a kind", self.file)),
        };

        Ok(Stmt {
            line: line.source_line,
            kind,
        })
    }

    fn expect_word(&self, line: &TreeLine, index: usize, what: &str) -> Result<String, Error> {
        line.word(index)
            .map(String::from)
            .ok_or_else(|| MK_TREE_ERROR!(line, format!("missing {}", what), self.file))
    }

    fn expect_expression(
        &mut self,
        parent: &TreeLine,
        level: usize,
        what: &str,
    ) -> Result<Expr, Error> {
        self.read_expression(level)?
            .ok_or_else(|| MK_TREE_ERROR!(parent, format!("missing {}", what), self.file))
    }

    /// Reads the expression at `level` if the next line is one.
    fn read_expression(&mut self, level: usize) -> Result<Option<Expr>, Error> {
        if !self.peek_at_level(NodeKind::Expression, level) {
            return Ok(None);
        }

        let line = self.advance();
        let source_line = line.source_line;
        let child_level = level + 1;

        let kind = match line.word(0) {
            Some("OpK") => {
                let symbol = self.expect_word(&line, 1, "operator")?;
                let operator = Operator::from_symbol(&symbol).ok_or_else(|| {
                    MK_TREE_ERROR!(line, format!("unknown operator `{}`", symbol), self.file)
                })?;
                let left = self.expect_expression(&line, child_level, "left operand")?;
                let right = self.expect_expression(&line, child_level, "right operand")?;
                ExprKind::Binary {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            Some("ConstK") => self.read_constant(&line)?,
            Some("IdK") => {
                let name = self.expect_word(&line, 2, "identifier")?;
                match line.word(1) {
                    Some("IdV") => ExprKind::Identifier(name),
                    Some("ArrayMembV") => {
                        let index = self.expect_expression(&line, child_level, "array index")?;
                        ExprKind::ArrayMember {
                            array: Box::new(Expr::identifier(source_line, &name)),
                            index: Box::new(index),
                        }
                    }
                    Some("FieldMembV") => {
                        let member = self.expect_expression(&line, child_level, "record member")?;
                        let record = Box::new(Expr::identifier(source_line, &name));
                        match member.kind {
                            ExprKind::Identifier(field) => ExprKind::RecordMember { record, field },
                            // `r.f[i]` arrives as `f[i]` under `r`
                            ExprKind::ArrayMember { array, index } => {
                                let ExprKind::Identifier(field) = array.kind else {
                                    return Err(MK_TREE_ERROR!(
                                        line,
                                        "invalid record member",
                                        self.file
                                    ));
                                };
                                ExprKind::ArrayMember {
                                    array: Box::new(Expr::new(
                                        source_line,
                                        ExprKind::RecordMember { record, field },
                                    )),
                                    index,
                                }
                            }
                            _ => {
                                return Err(MK_TREE_ERROR!(line, "invalid record member", self.file))
                            }
                        }
                    }
                    other => {
                        return Err(MK_TREE_ERROR!(
                            line,
                            format!("unknown variable kind `{}`", other.unwrap_or("")),
                            self.file
                        ))
                    }
                }
            }
            Some(other) => {
                return Err(MK_TREE_ERROR!(
                    line,
                    format!("unknown expression kind `{}`", other),
                    self.file
                ))
            }
            None => return Err(MK_TREE_ERROR!(line, "expression without a kind", self.file)),
        };

        Ok(Some(Expr::new(source_line, kind)))
    }

    fn read_constant(&self, line: &TreeLine) -> Result<ExprKind, Error> {
        // Taken from the raw text so that `' '` survives word splitting.
        let value = line
            .rest
            .trim_start()
            .strip_prefix("ConstK")
            .map(|value| value.trim_start_matches(' ').trim_end())
            .unwrap_or("");

        let bytes = value.as_bytes();
        if bytes.len() == 3 && bytes[0] == b'\'' && bytes[2] == b'\'' {
            return Ok(ExprKind::ConstantChar(bytes[1]));
        }

        Ok(ExprKind::ConstantInt(self.read_number(line, value.trim())?))
    }
}

/// Reads a whole program from the text of a tree file.
pub fn read_program(source: &str, file: Rc<String>) -> Result<Program, Error> {
    let lines = split_lines(source, &file)?;
    TreeReader::new(lines, file).read_program()
}

/// Reads a whole program from a tree file on disk.
pub fn read_program_file(path: &Path) -> Result<Program, Error> {
    let file = Rc::new(path.to_string_lossy().to_string());
    let source = fs::read_to_string(path).map_err(|error| {
        MK_ERROR!(
            ErrorImpl::MalformedTree {
                line: String::from("<unreadable>"),
                message: error.to_string(),
            },
            0,
            file
        )
    })?;

    read_program(&source, file)
}
