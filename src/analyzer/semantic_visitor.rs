use std::collections::HashMap;

use tracing::debug;

use crate::error::SemanticError;
use crate::parser::{DeclKind, Node, NodeKind};

/// Outcome of a checking pass: every error found, in visit order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CheckReport {
    errors: Vec<SemanticError>,
}

impl CheckReport {
    pub fn errors(&self) -> &[SemanticError] {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), Vec<SemanticError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Declare-before-use, no-redeclaration and assignment type checks.
///
/// Keeps its own name to kind table, independent from the generator's
/// `SymbolTable`.
#[derive(Debug, Default)]
pub struct SemanticVisitor {
    vars: HashMap<String, DeclKind>,
    errors: Vec<SemanticError>,
}

impl SemanticVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.vars.clear();
        self.errors.clear();
    }

    pub fn check(&mut self, program: &Node) -> CheckReport {
        self.visit(program);
        debug!(
            vars = self.vars.len(),
            errors = self.errors.len(),
            "semantic check finished"
        );
        CheckReport {
            errors: self.errors.clone(),
        }
    }

    fn report(&mut self, error: SemanticError) {
        debug!("{}", error);
        self.errors.push(error);
    }

    fn visit(&mut self, node: &Node) {
        for child in node.children() {
            self.visit(child);
        }

        match &node.kind {
            NodeKind::Decl(name, kind) => self.visit_decl(name, *kind),
            NodeKind::Assign(name) => self.visit_assign(name, node.children().first()),
            NodeKind::Ident(name) => {
                if !self.vars.contains_key(name) {
                    self.report(SemanticError::Undeclared(name.clone()));
                }
            }
            _ => (),
        }
    }

    fn visit_decl(&mut self, name: &str, kind: DeclKind) {
        if self.vars.contains_key(name) {
            self.report(SemanticError::Redeclared(name.to_string()));
        } else {
            self.vars.insert(name.to_string(), kind);
        }
    }

    fn visit_assign(&mut self, name: &str, value: Option<&Node>) {
        let Some(&declared) = self.vars.get(name) else {
            self.report(SemanticError::Undeclared(name.to_string()));
            return;
        };

        // an undeclared right-hand identifier was already reported; it has no
        // kind to compare against, so no mismatch is added on top of it
        let Some(found) = value.and_then(|v| self.infer_kind(v)) else {
            return;
        };

        if declared != found {
            self.report(SemanticError::IncorrectType {
                name: name.to_string(),
                declared: declared.to_string(),
                found: found.to_string(),
            });
        }
    }

    fn infer_kind(&self, value: &Node) -> Option<DeclKind> {
        match &value.kind {
            NodeKind::Str(_) => Some(DeclKind::String),
            NodeKind::Ident(name) => self.vars.get(name).copied(),
            _ => Some(DeclKind::Number),
        }
    }
}
