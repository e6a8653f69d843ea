//! Control-flow-graph IR
//!
//! A module holds one function made of basic blocks. Every block ends in
//! exactly one terminator; variables live in stack slots and are accessed
//! through explicit loads and stores.

mod builder;
mod interp;
mod printer;

pub use builder::*;
pub use interp::*;

use std::fmt;

use crate::error::IrError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    F64,
    Ptr,
    Bool,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::F64 => write!(f, "f64"),
            Type::Ptr => write!(f, "ptr"),
            Type::Bool => write!(f, "bool"),
        }
    }
}

/// Handle to the result of an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Value {
    pub index: u32,
    pub ty: Type,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StringId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    FAdd,
    FSub,
    FMul,
    FDiv,
}

/// Ordered floating point comparisons: false whenever an operand is NaN.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatCmp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl FloatCmp {
    pub fn eval(&self, lhs: f64, rhs: f64) -> bool {
        if lhs.is_nan() || rhs.is_nan() {
            return false;
        }
        match self {
            FloatCmp::Eq => lhs == rhs,
            FloatCmp::Ne => lhs != rhs,
            FloatCmp::Gt => lhs > rhs,
            FloatCmp::Lt => lhs < rhs,
            FloatCmp::Ge => lhs >= rhs,
            FloatCmp::Le => lhs <= rhs,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

/// Functions provided by the runtime library the object file links against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Runtime {
    PrintFloat,
    PrintStr,
}

impl Runtime {
    pub fn symbol(&self) -> &'static str {
        match self {
            Runtime::PrintFloat => "emj_print_float",
            Runtime::PrintStr => "emj_print_str",
        }
    }

    pub fn param(&self) -> Type {
        match self {
            Runtime::PrintFloat => Type::F64,
            Runtime::PrintStr => Type::Ptr,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Inst {
    ConstF64 {
        dest: Value,
        value: f64,
    },
    GlobalStr {
        dest: Value,
        id: StringId,
    },
    Load {
        dest: Value,
        slot: SlotId,
    },
    Store {
        slot: SlotId,
        value: Value,
    },
    Binary {
        dest: Value,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
    },
    FCmp {
        dest: Value,
        cond: FloatCmp,
        lhs: Value,
        rhs: Value,
    },
    Logic {
        dest: Value,
        op: LogicOp,
        lhs: Value,
        rhs: Value,
    },
    Not {
        dest: Value,
        operand: Value,
    },
    Call {
        callee: Runtime,
        args: Vec<Value>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Terminator {
    Jump(BlockId),
    Branch {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Return(i32),
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Jump(target) => vec![*target],
            Terminator::Branch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Return(_) => vec![],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StackSlot {
    pub name: String,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub label: String,
    pub insts: Vec<Inst>,
    pub terminator: Option<Terminator>,
}

impl Block {
    pub fn new(label: String) -> Self {
        Self {
            label,
            insts: vec![],
            terminator: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: String,
    pub slots: Vec<StackSlot>,
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    pub fn block_by_label(&self, label: &str) -> Option<BlockId> {
        self.blocks
            .iter()
            .position(|b| b.label == label)
            .map(BlockId)
    }

    pub fn successors(&self, id: BlockId) -> Vec<BlockId> {
        self.block(id)
            .and_then(|b| b.terminator.as_ref())
            .map(Terminator::successors)
            .unwrap_or_default()
    }

    /// Incoming edges of `id`, one entry per edge.
    pub fn predecessors(&self, id: BlockId) -> Vec<BlockId> {
        let mut preds = vec![];
        for index in 0..self.blocks.len() {
            let from = BlockId(index);
            for to in self.successors(from) {
                if to == id {
                    preds.push(from);
                }
            }
        }
        preds
    }

    /// Checks that every block is terminated and only targets existing blocks.
    pub fn verify(&self) -> Result<(), IrError> {
        for block in &self.blocks {
            let Some(terminator) = &block.terminator else {
                return Err(IrError::MissingTerminator(block.label.clone()));
            };
            if let Some(target) = terminator
                .successors()
                .into_iter()
                .find(|t| t.0 >= self.blocks.len())
            {
                return Err(IrError::UnknownBlock(target.0));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    pub name: String,
    pub strings: Vec<String>,
    pub function: Function,
}

impl Module {
    pub fn string(&self, id: StringId) -> Option<&str> {
        self.strings.get(id.0).map(String::as_str)
    }
}
