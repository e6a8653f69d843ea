use std::mem;

use tracing::debug;

use crate::{
    analyzer::SymbolTable,
    error::CodegenError,
    ir::{
        BinaryOp, BlockId, FloatCmp, FunctionBuilder, LogicOp, Module, ModuleBuilder, Runtime,
        Type, Value,
    },
    parser::{ArithOp, DeclKind, LogicalOp, Node, NodeKind, RelOp},
};

pub const MODULE_NAME: &str = "emj";
pub const ENTRY_FUNCTION: &str = "main";

type Lowered = Result<Option<Value>, CodegenError>;

/// Lowers a checked tree into a single-function `Module`.
///
/// Every node yields `Ok(Some(value))`, `Ok(None)` for pure statements, or an
/// error. Statement lists record a failed child and go on with the next one;
/// the module is only handed out when nothing failed.
pub struct Codegen {
    module: ModuleBuilder,
    builder: FunctionBuilder,
    symbol_table: SymbolTable,
    errors: Vec<CodegenError>,
    label_index: usize,
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

impl Codegen {
    pub fn new() -> Self {
        Self {
            module: ModuleBuilder::new(MODULE_NAME),
            builder: FunctionBuilder::new(ENTRY_FUNCTION),
            symbol_table: SymbolTable::new(),
            errors: vec![],
            label_index: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    pub fn generate(&mut self, program: &Node) -> Result<Module, Vec<CodegenError>> {
        self.reset();

        let entry = self.builder.create_block("entry".to_string());
        if let Err(e) = self.builder.switch_to_block(entry) {
            return Err(vec![e.into()]);
        }

        if let Err(e) = self.gen_node(program) {
            self.record(e, program);
        }
        if let Err(e) = self.builder.ret(0) {
            self.record(e.into(), program);
        }

        let function =
            mem::replace(&mut self.builder, FunctionBuilder::new(ENTRY_FUNCTION)).build();
        let module = mem::replace(&mut self.module, ModuleBuilder::new(MODULE_NAME));

        if self.errors.is_empty() {
            if let Err(e) = function.verify() {
                self.errors.push(e.into());
            }
        }
        if !self.errors.is_empty() {
            return Err(mem::take(&mut self.errors));
        }

        debug!(
            blocks = function.blocks.len(),
            slots = function.slots.len(),
            "generated function {}",
            function.name
        );
        Ok(module.build(function))
    }

    fn record(&mut self, error: CodegenError, node: &Node) {
        debug!(node = %node.label(), "{}", error);
        self.errors.push(error);
    }

    fn new_index(&mut self) -> usize {
        let i = self.label_index;
        self.label_index += 1;
        i
    }

    fn check_arity(node: &Node) -> Result<(), CodegenError> {
        match node.expected_arity() {
            Some(expected) if expected != node.children().len() => Err(CodegenError::Arity {
                label: node.label(),
                expected,
                found: node.children().len(),
            }),
            _ => Ok(()),
        }
    }

    fn gen_node(&mut self, node: &Node) -> Lowered {
        Self::check_arity(node)?;
        let children = node.children();

        match &node.kind {
            NodeKind::Program | NodeKind::Stmts => Ok(self.gen_stmts(children)),
            NodeKind::Ident(name) => self.gen_ident(name).map(Some),
            NodeKind::Float(value) => Ok(Some(self.builder.f64const(*value)?)),
            NodeKind::Int(value) => Ok(Some(self.builder.f64const(f64::from(*value))?)),
            NodeKind::Str(value) => self.gen_str(value).map(Some),
            NodeKind::Decl(name, kind) => self.gen_decl(name, *kind),
            NodeKind::Assign(name) => self.gen_assign(name, &children[0]),
            NodeKind::Print => self.gen_print(&children[0]),
            NodeKind::Arith(op) => self.gen_arith(*op, &children[0], &children[1]),
            NodeKind::Inc(name) => self.gen_step(name, BinaryOp::FAdd, &children[0]),
            NodeKind::Dec(name) => self.gen_step(name, BinaryOp::FSub, &children[0]),
            NodeKind::While => self.gen_while(&children[0], &children[1]),
            NodeKind::If => self.gen_if(&children[0], &children[1]),
            NodeKind::IfElse => self.gen_if_else(&children[0], &children[1], &children[2]),
            NodeKind::Relational(op) => self.gen_relational(*op, &children[0], &children[1]),
            NodeKind::Logical(op) => self.gen_logical(*op, children),
        }
    }

    fn gen_expr(&mut self, node: &Node) -> Result<Value, CodegenError> {
        self.gen_node(node)?
            .ok_or_else(|| CodegenError::NoValue(node.label()))
    }

    fn gen_stmts(&mut self, stmts: &[Node]) -> Option<Value> {
        let mut last = None;
        for stmt in stmts {
            last = match self.gen_node(stmt) {
                Ok(value) => value,
                Err(e) => {
                    self.record(e, stmt);
                    None
                }
            };
        }
        last
    }

    fn gen_ident(&mut self, name: &str) -> Result<Value, CodegenError> {
        let symbol = self
            .symbol_table
            .lookup(name)
            .ok_or_else(|| CodegenError::UndeclaredSymbol(name.to_string()))?;
        Ok(self.builder.load(symbol.slot)?)
    }

    fn gen_str(&mut self, value: &str) -> Result<Value, CodegenError> {
        let id = self.module.intern_string(value);
        Ok(self.builder.global_str(id)?)
    }

    fn gen_decl(&mut self, name: &str, kind: DeclKind) -> Lowered {
        let (ty, default) = match kind {
            DeclKind::Number => (Type::F64, self.builder.f64const(0.0)?),
            DeclKind::String => (Type::Ptr, self.gen_str("")?),
        };

        let slot = self.builder.create_slot(name, ty);
        self.builder.store(slot, default)?;
        self.symbol_table.declare(name, slot, kind);
        Ok(None)
    }

    fn gen_assign(&mut self, name: &str, value: &Node) -> Lowered {
        let value = self.gen_expr(value)?;
        let symbol = self
            .symbol_table
            .lookup(name)
            .ok_or_else(|| CodegenError::UndeclaredSymbol(name.to_string()))?;
        self.builder.store(symbol.slot, value)?;
        Ok(None)
    }

    fn gen_print(&mut self, expr: &Node) -> Lowered {
        let value = self.gen_expr(expr)?;
        let callee = match value.ty {
            Type::F64 => Runtime::PrintFloat,
            Type::Ptr => Runtime::PrintStr,
            ty => return Err(CodegenError::Unprintable(ty)),
        };
        self.builder.call(callee, value)?;
        Ok(None)
    }

    fn gen_arith(&mut self, op: ArithOp, left: &Node, right: &Node) -> Lowered {
        let lhs = self.gen_expr(left)?;
        let rhs = self.gen_expr(right)?;
        let op = match op {
            ArithOp::Add => BinaryOp::FAdd,
            ArithOp::Sub => BinaryOp::FSub,
            ArithOp::Mul => BinaryOp::FMul,
            ArithOp::Div => BinaryOp::FDiv,
        };
        Ok(Some(self.builder.binary(op, lhs, rhs)?))
    }

    /// `x++` / `x--`: load, add or subtract 1.0, store back.
    fn gen_step(&mut self, name: &str, op: BinaryOp, ident: &Node) -> Lowered {
        let current = self.gen_expr(ident)?;
        let one = self.builder.f64const(1.0)?;
        let next = self.builder.binary(op, current, one)?;
        let symbol = self
            .symbol_table
            .lookup(name)
            .ok_or_else(|| CodegenError::UndeclaredSymbol(name.to_string()))?;
        self.builder.store(symbol.slot, next)?;
        Ok(None)
    }

    fn gen_relational(&mut self, op: RelOp, left: &Node, right: &Node) -> Lowered {
        let lhs = self.gen_expr(left)?;
        let rhs = self.gen_expr(right)?;
        let cond = match op {
            RelOp::Equal => FloatCmp::Eq,
            RelOp::NotEqual => FloatCmp::Ne,
            RelOp::Greater => FloatCmp::Gt,
            RelOp::Less => FloatCmp::Lt,
            RelOp::GreaterEqual => FloatCmp::Ge,
            RelOp::LessEqual => FloatCmp::Le,
        };
        Ok(Some(self.builder.fcmp(cond, lhs, rhs)?))
    }

    fn gen_logical(&mut self, op: LogicalOp, operands: &[Node]) -> Lowered {
        let lhs = self.gen_expr(&operands[0])?;
        let value = match op {
            LogicalOp::Not => self.builder.not(lhs)?,
            LogicalOp::And => {
                let rhs = self.gen_expr(&operands[1])?;
                self.builder.logic(LogicOp::And, lhs, rhs)?
            }
            LogicalOp::Or => {
                let rhs = self.gen_expr(&operands[1])?;
                self.builder.logic(LogicOp::Or, lhs, rhs)?
            }
        };
        Ok(Some(value))
    }

    /// Ends the current block with a branch on `cond`. A condition that fails
    /// to lower is recorded and replaced by a jump to `else_block`, so the
    /// block still gets its terminator.
    fn gen_condition(
        &mut self,
        cond: &Node,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<(), CodegenError> {
        let branched = self
            .gen_expr(cond)
            .and_then(|v| {
                self.builder
                    .branch(v, then_block, else_block)
                    .map_err(CodegenError::from)
            });

        if let Err(e) = branched {
            self.record(e, cond);
            self.builder.jump(else_block)?;
        }
        Ok(())
    }

    fn gen_body(&mut self, body: &Node) {
        if let Err(e) = self.gen_node(body) {
            self.record(e, body);
        }
    }

    //   entry: ... jump cond
    //   cond:  brif c, body, contin
    //   body:  ... jump cond
    //   contin:
    fn gen_while(&mut self, cond: &Node, body: &Node) -> Lowered {
        let i = self.new_index();
        let cond_block = self.builder.create_block(format!("cond{i}"));
        let body_block = self.builder.create_block(format!("body{i}"));
        let contin = self.builder.create_block(format!("contin{i}"));
        debug!(index = i, "lowering while");

        self.builder.jump(cond_block)?;

        self.builder.switch_to_block(cond_block)?;
        self.gen_condition(cond, body_block, contin)?;

        self.builder.switch_to_block(body_block)?;
        self.gen_body(body);
        self.builder.jump(cond_block)?;

        self.builder.switch_to_block(contin)?;
        Ok(None)
    }

    fn gen_if(&mut self, cond: &Node, body: &Node) -> Lowered {
        let i = self.new_index();
        let cond_block = self.builder.create_block(format!("cond{i}"));
        let body_block = self.builder.create_block(format!("body{i}"));
        let contin = self.builder.create_block(format!("contin{i}"));
        debug!(index = i, "lowering if");

        self.builder.jump(cond_block)?;

        self.builder.switch_to_block(cond_block)?;
        self.gen_condition(cond, body_block, contin)?;

        self.builder.switch_to_block(body_block)?;
        self.gen_body(body);
        self.builder.jump(contin)?;

        self.builder.switch_to_block(contin)?;
        Ok(None)
    }

    fn gen_if_else(&mut self, cond: &Node, if_body: &Node, else_body: &Node) -> Lowered {
        let i = self.new_index();
        let cond_block = self.builder.create_block(format!("cond{i}"));
        let if_block = self.builder.create_block(format!("ifBody{i}"));
        let else_block = self.builder.create_block(format!("elseBody{i}"));
        let contin = self.builder.create_block(format!("contin{i}"));
        debug!(index = i, "lowering if/else");

        self.builder.jump(cond_block)?;

        self.builder.switch_to_block(cond_block)?;
        self.gen_condition(cond, if_block, else_block)?;

        self.builder.switch_to_block(if_block)?;
        self.gen_body(if_body);
        self.builder.jump(contin)?;

        self.builder.switch_to_block(else_block)?;
        self.gen_body(else_body);
        self.builder.jump(contin)?;

        self.builder.switch_to_block(contin)?;
        Ok(None)
    }
}
