use std::fmt;

use super::*;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.index)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ss{}", self.0)
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@str{}", self.0)
    }
}

fn binary_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::FAdd => "fadd",
        BinaryOp::FSub => "fsub",
        BinaryOp::FMul => "fmul",
        BinaryOp::FDiv => "fdiv",
    }
}

fn cmp_name(cond: FloatCmp) -> &'static str {
    match cond {
        FloatCmp::Eq => "oeq",
        FloatCmp::Ne => "one",
        FloatCmp::Gt => "ogt",
        FloatCmp::Lt => "olt",
        FloatCmp::Ge => "oge",
        FloatCmp::Le => "ole",
    }
}

struct InstDisplay<'a> {
    inst: &'a Inst,
}

impl fmt::Display for InstDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inst {
            Inst::ConstF64 { dest, value } => write!(f, "{} = f64const {:?}", dest, value),
            Inst::GlobalStr { dest, id } => write!(f, "{} = global_str {}", dest, id),
            Inst::Load { dest, slot } => write!(f, "{} = load.{} {}", dest, dest.ty, slot),
            Inst::Store { slot, value } => write!(f, "store {}, {}", slot, value),
            Inst::Binary { dest, op, lhs, rhs } => {
                write!(f, "{} = {} {}, {}", dest, binary_name(*op), lhs, rhs)
            }
            Inst::FCmp {
                dest,
                cond,
                lhs,
                rhs,
            } => write!(f, "{} = fcmp {} {}, {}", dest, cmp_name(*cond), lhs, rhs),
            Inst::Logic { dest, op, lhs, rhs } => {
                let name = match op {
                    LogicOp::And => "and",
                    LogicOp::Or => "or",
                };
                write!(f, "{} = {} {}, {}", dest, name, lhs, rhs)
            }
            Inst::Not { dest, operand } => write!(f, "{} = not {}", dest, operand),
            Inst::Call { callee, args } => {
                write!(f, "call {}(", callee.symbol())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Function {
    fn label_of(&self, id: BlockId) -> &str {
        self.block(id).map(|b| b.label.as_str()).unwrap_or("?")
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  fn {}() -> i32 {{", self.name)?;

        for (i, slot) in self.slots.iter().enumerate() {
            writeln!(f, "    {} = stack_slot {} ; {}", SlotId(i), slot.ty, slot.name)?;
        }

        for block in &self.blocks {
            writeln!(f, "  {}:", block.label)?;
            for inst in &block.insts {
                writeln!(f, "    {}", InstDisplay { inst })?;
            }
            match &block.terminator {
                Some(Terminator::Jump(target)) => {
                    writeln!(f, "    jump {}", self.label_of(*target))?
                }
                Some(Terminator::Branch {
                    cond,
                    then_block,
                    else_block,
                }) => writeln!(
                    f,
                    "    brif {}, {}, {}",
                    cond,
                    self.label_of(*then_block),
                    self.label_of(*else_block)
                )?,
                Some(Terminator::Return(code)) => writeln!(f, "    return {}", code)?,
                None => writeln!(f, "    ; missing terminator")?,
            }
        }

        writeln!(f, "  }}")
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module {} {{", self.name)?;

        for (i, text) in self.strings.iter().enumerate() {
            writeln!(f, "  {} = {:?}", StringId(i), text)?;
        }
        if !self.strings.is_empty() {
            writeln!(f)?;
        }

        write!(f, "{}", self.function)?;
        writeln!(f, "}}")
    }
}
