use std::collections::HashMap;
use std::io::Write;

use tracing::debug;

use super::*;
use crate::error::InterpError;

pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Scalar {
    F64(f64),
    Bool(bool),
    Str(StringId),
}

/// Executes a module directly, standing in for the native runtime.
///
/// `emj_print_float` and `emj_print_str` write one line each to the output.
pub struct Interpreter<'m> {
    module: &'m Module,
    values: HashMap<u32, Scalar>,
    slots: Vec<Option<Scalar>>,
    step_limit: usize,
}

type Result<T> = std::result::Result<T, InterpError>;

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self {
            module,
            values: HashMap::new(),
            slots: vec![None; module.function.slots.len()],
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    fn get(&self, value: Value) -> Result<Scalar> {
        self.values
            .get(&value.index)
            .copied()
            .ok_or(InterpError::UndefinedValue(value.index))
    }

    fn get_f64(&self, value: Value) -> Result<f64> {
        match self.get(value)? {
            Scalar::F64(v) => Ok(v),
            s => Err(InterpError::InvalidIr(format!("{} is {:?}, not f64", value, s))),
        }
    }

    fn get_bool(&self, value: Value) -> Result<bool> {
        match self.get(value)? {
            Scalar::Bool(v) => Ok(v),
            s => Err(InterpError::InvalidIr(format!("{} is {:?}, not bool", value, s))),
        }
    }

    fn slot_mut(&mut self, slot: SlotId) -> Result<&mut Option<Scalar>> {
        self.slots
            .get_mut(slot.0)
            .ok_or_else(|| InterpError::InvalidIr(format!("unknown slot {}", slot)))
    }

    /// Runs `main` to completion and returns its exit code.
    pub fn run(&mut self, out: &mut impl Write) -> Result<i32> {
        let module = self.module;
        let function = &module.function;
        let mut current = function.entry();
        let mut steps = 0;

        loop {
            let block = function
                .block(current)
                .ok_or_else(|| InterpError::InvalidIr(format!("unknown block #{}", current.0)))?;

            for inst in &block.insts {
                steps += 1;
                if steps > self.step_limit {
                    return Err(InterpError::StepLimit(self.step_limit));
                }
                self.exec(inst, out)?;
            }

            steps += 1;
            if steps > self.step_limit {
                return Err(InterpError::StepLimit(self.step_limit));
            }
            current = match &block.terminator {
                Some(Terminator::Jump(target)) => *target,
                Some(Terminator::Branch {
                    cond,
                    then_block,
                    else_block,
                }) => {
                    if self.get_bool(*cond)? {
                        *then_block
                    } else {
                        *else_block
                    }
                }
                Some(Terminator::Return(code)) => {
                    debug!(steps, code, "interpreter finished");
                    return Ok(*code);
                }
                None => {
                    return Err(InterpError::InvalidIr(format!(
                        "block {} has no terminator",
                        block.label
                    )))
                }
            };
        }
    }

    fn exec(&mut self, inst: &Inst, out: &mut impl Write) -> Result<()> {
        match inst {
            Inst::ConstF64 { dest, value } => {
                self.values.insert(dest.index, Scalar::F64(*value));
            }
            Inst::GlobalStr { dest, id } => {
                self.values.insert(dest.index, Scalar::Str(*id));
            }
            Inst::Load { dest, slot } => {
                let value = self
                    .slot_mut(*slot)?
                    .ok_or(InterpError::UninitializedSlot(slot.0))?;
                self.values.insert(dest.index, value);
            }
            Inst::Store { slot, value } => {
                let value = self.get(*value)?;
                *self.slot_mut(*slot)? = Some(value);
            }
            Inst::Binary { dest, op, lhs, rhs } => {
                let (l, r) = (self.get_f64(*lhs)?, self.get_f64(*rhs)?);
                let result = match op {
                    BinaryOp::FAdd => l + r,
                    BinaryOp::FSub => l - r,
                    BinaryOp::FMul => l * r,
                    BinaryOp::FDiv => l / r,
                };
                self.values.insert(dest.index, Scalar::F64(result));
            }
            Inst::FCmp {
                dest,
                cond,
                lhs,
                rhs,
            } => {
                let result = cond.eval(self.get_f64(*lhs)?, self.get_f64(*rhs)?);
                self.values.insert(dest.index, Scalar::Bool(result));
            }
            Inst::Logic { dest, op, lhs, rhs } => {
                let (l, r) = (self.get_bool(*lhs)?, self.get_bool(*rhs)?);
                let result = match op {
                    LogicOp::And => l && r,
                    LogicOp::Or => l || r,
                };
                self.values.insert(dest.index, Scalar::Bool(result));
            }
            Inst::Not { dest, operand } => {
                let result = !self.get_bool(*operand)?;
                self.values.insert(dest.index, Scalar::Bool(result));
            }
            Inst::Call { callee, args } => {
                let arg = args.first().ok_or_else(|| {
                    InterpError::InvalidIr(format!("{} called without argument", callee.symbol()))
                })?;
                match (callee, self.get(*arg)?) {
                    (Runtime::PrintFloat, Scalar::F64(v)) => writeln!(out, "{}", v)?,
                    (Runtime::PrintStr, Scalar::Str(id)) => {
                        let text = self.module.string(id).ok_or_else(|| {
                            InterpError::InvalidIr(format!("unknown string {}", id))
                        })?;
                        writeln!(out, "{}", text)?
                    }
                    (callee, s) => {
                        return Err(InterpError::InvalidIr(format!(
                            "{} called with {:?}",
                            callee.symbol(),
                            s
                        )))
                    }
                }
            }
        }
        Ok(())
    }
}
