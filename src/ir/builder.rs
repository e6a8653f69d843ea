use std::collections::HashMap;

use super::*;

/// Collects module level data while a function is being built.
#[derive(Debug)]
pub struct ModuleBuilder {
    name: String,
    strings: Vec<String>,
    ids: HashMap<String, StringId>,
}

impl ModuleBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            strings: vec![],
            ids: HashMap::new(),
        }
    }

    /// Returns the id of a global string constant, reusing identical ones.
    pub fn intern_string(&mut self, text: &str) -> StringId {
        if let Some(id) = self.ids.get(text) {
            return *id;
        }
        let id = StringId(self.strings.len());
        self.strings.push(text.to_string());
        self.ids.insert(text.to_string(), id);
        id
    }

    pub fn build(self, function: Function) -> Module {
        Module {
            name: self.name,
            strings: self.strings,
            function,
        }
    }
}

#[derive(Debug)]
pub struct FunctionBuilder {
    function: Function,
    current_block: Option<BlockId>,
    next_value: u32,
}

type Result<T> = std::result::Result<T, IrError>;

fn expect_type(op: &'static str, value: Value, expected: Type) -> Result<()> {
    if value.ty == expected {
        Ok(())
    } else {
        Err(IrError::TypeMismatch {
            op,
            expected,
            found: value.ty,
        })
    }
}

impl FunctionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            function: Function {
                name: name.to_string(),
                slots: vec![],
                blocks: vec![],
            },
            current_block: None,
            next_value: 0,
        }
    }

    pub fn create_block(&mut self, label: String) -> BlockId {
        self.function.blocks.push(Block::new(label));
        BlockId(self.function.blocks.len() - 1)
    }

    pub fn switch_to_block(&mut self, block: BlockId) -> Result<()> {
        if block.0 >= self.function.blocks.len() {
            return Err(IrError::UnknownBlock(block.0));
        }
        self.current_block = Some(block);
        Ok(())
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    pub fn block_count(&self) -> usize {
        self.function.blocks.len()
    }

    pub fn create_slot(&mut self, name: &str, ty: Type) -> SlotId {
        self.function.slots.push(StackSlot {
            name: name.to_string(),
            ty,
        });
        SlotId(self.function.slots.len() - 1)
    }

    pub fn slot_type(&self, slot: SlotId) -> Result<Type> {
        self.function
            .slots
            .get(slot.0)
            .map(|s| s.ty)
            .ok_or(IrError::UnknownSlot(slot.0))
    }

    fn new_value(&mut self, ty: Type) -> Value {
        let value = Value {
            index: self.next_value,
            ty,
        };
        self.next_value += 1;
        value
    }

    fn open_block(&mut self) -> Result<&mut Block> {
        let id = self.current_block.ok_or(IrError::NoInsertionPoint)?;
        let block = self
            .function
            .blocks
            .get_mut(id.0)
            .ok_or(IrError::UnknownBlock(id.0))?;
        if block.terminator.is_some() {
            return Err(IrError::BlockTerminated(block.label.clone()));
        }
        Ok(block)
    }

    fn push(&mut self, inst: Inst) -> Result<()> {
        self.open_block()?.insts.push(inst);
        Ok(())
    }

    fn terminate(&mut self, terminator: Terminator) -> Result<()> {
        for target in terminator.successors() {
            if target.0 >= self.function.blocks.len() {
                return Err(IrError::UnknownBlock(target.0));
            }
        }
        self.open_block()?.terminator = Some(terminator);
        Ok(())
    }

    pub fn f64const(&mut self, value: f64) -> Result<Value> {
        self.open_block()?;
        let dest = self.new_value(Type::F64);
        self.push(Inst::ConstF64 { dest, value })?;
        Ok(dest)
    }

    pub fn global_str(&mut self, id: StringId) -> Result<Value> {
        self.open_block()?;
        let dest = self.new_value(Type::Ptr);
        self.push(Inst::GlobalStr { dest, id })?;
        Ok(dest)
    }

    pub fn load(&mut self, slot: SlotId) -> Result<Value> {
        let ty = self.slot_type(slot)?;
        self.open_block()?;
        let dest = self.new_value(ty);
        self.push(Inst::Load { dest, slot })?;
        Ok(dest)
    }

    pub fn store(&mut self, slot: SlotId, value: Value) -> Result<()> {
        expect_type("store", value, self.slot_type(slot)?)?;
        self.push(Inst::Store { slot, value })
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
        expect_type("arithmetic", lhs, Type::F64)?;
        expect_type("arithmetic", rhs, Type::F64)?;
        self.open_block()?;
        let dest = self.new_value(Type::F64);
        self.push(Inst::Binary { dest, op, lhs, rhs })?;
        Ok(dest)
    }

    pub fn fcmp(&mut self, cond: FloatCmp, lhs: Value, rhs: Value) -> Result<Value> {
        expect_type("comparison", lhs, Type::F64)?;
        expect_type("comparison", rhs, Type::F64)?;
        self.open_block()?;
        let dest = self.new_value(Type::Bool);
        self.push(Inst::FCmp {
            dest,
            cond,
            lhs,
            rhs,
        })?;
        Ok(dest)
    }

    pub fn logic(&mut self, op: LogicOp, lhs: Value, rhs: Value) -> Result<Value> {
        expect_type("logical", lhs, Type::Bool)?;
        expect_type("logical", rhs, Type::Bool)?;
        self.open_block()?;
        let dest = self.new_value(Type::Bool);
        self.push(Inst::Logic { dest, op, lhs, rhs })?;
        Ok(dest)
    }

    pub fn not(&mut self, operand: Value) -> Result<Value> {
        expect_type("not", operand, Type::Bool)?;
        self.open_block()?;
        let dest = self.new_value(Type::Bool);
        self.push(Inst::Not { dest, operand })?;
        Ok(dest)
    }

    pub fn call(&mut self, callee: Runtime, arg: Value) -> Result<()> {
        expect_type(callee.symbol(), arg, callee.param())?;
        self.push(Inst::Call {
            callee,
            args: vec![arg],
        })
    }

    pub fn jump(&mut self, target: BlockId) -> Result<()> {
        self.terminate(Terminator::Jump(target))
    }

    pub fn branch(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) -> Result<()> {
        expect_type("branch", cond, Type::Bool)?;
        self.terminate(Terminator::Branch {
            cond,
            then_block,
            else_block,
        })
    }

    pub fn ret(&mut self, code: i32) -> Result<()> {
        self.terminate(Terminator::Return(code))
    }

    pub fn build(self) -> Function {
        self.function
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_second_terminator() {
        let mut b = FunctionBuilder::new("main");
        let entry = b.create_block("entry".to_string());
        b.switch_to_block(entry).unwrap();
        b.ret(0).unwrap();
        assert_eq!(
            b.ret(0),
            Err(IrError::BlockTerminated("entry".to_string()))
        );
        assert!(b.f64const(1.0).is_err());
    }

    #[test]
    fn needs_insertion_point() {
        let mut b = FunctionBuilder::new("main");
        assert_eq!(b.f64const(1.0), Err(IrError::NoInsertionPoint));
    }

    #[test]
    fn checks_operand_types() {
        let mut strings = ModuleBuilder::new("m");
        let mut b = FunctionBuilder::new("main");
        let entry = b.create_block("entry".to_string());
        b.switch_to_block(entry).unwrap();

        let s = b.global_str(strings.intern_string("hi")).unwrap();
        let one = b.f64const(1.0).unwrap();
        assert!(matches!(
            b.binary(BinaryOp::FAdd, s, one),
            Err(IrError::TypeMismatch {
                expected: Type::F64,
                found: Type::Ptr,
                ..
            })
        ));

        let slot = b.create_slot("x", Type::F64);
        assert!(b.store(slot, s).is_err());
        assert!(b.store(slot, one).is_ok());
        assert!(b.branch(one, entry, entry).is_err());
    }

    #[test]
    fn interns_strings_once() {
        let mut m = ModuleBuilder::new("m");
        let a = m.intern_string("a");
        let b = m.intern_string("b");
        assert_eq!(m.intern_string("a"), a);
        assert_ne!(a, b);
    }
}
