//! Cranelift backend: lowers the IR into a relocatable object for the host.
//!
//! The object exports `main() -> i32` and imports the print routines of the
//! runtime library (`emj_print_float(f64)`, `emj_print_str(*const u8)`).

use std::collections::HashMap;
use std::fmt::Display;

use cranelift::codegen::ir::{FuncRef, GlobalValue, StackSlot};
use cranelift::codegen::isa::OwnedTargetIsa;
use cranelift::prelude::{
    settings, types, AbiParam, Block, Configurable, FloatCC, FunctionBuilder,
    FunctionBuilderContext, InstBuilder, IntCC, StackSlotData, StackSlotKind,
    Value as ClifValue,
};
use cranelift_module::{DataDescription, DataId, FuncId, Linkage, Module as ClifModule};
use cranelift_object::{ObjectBuilder, ObjectModule};
use tracing::debug;

use super::Backend;
use crate::error::BackendError;
use crate::ir::{
    BinaryOp, FloatCmp, Function as IrFunction, Inst, LogicOp, Module, Runtime, Terminator, Type,
    Value,
};

pub struct ObjectBackend {
    isa: OwnedTargetIsa,
}

impl ObjectBackend {
    pub fn new() -> Result<Self, BackendError> {
        Ok(Self {
            isa: build_native_isa()?,
        })
    }

    pub fn target(&self) -> String {
        self.isa.triple().to_string()
    }
}

impl Backend for ObjectBackend {
    fn name(&self) -> &'static str {
        "cranelift"
    }

    fn emit(&self, module: &Module) -> Result<Vec<u8>, BackendError> {
        module
            .function
            .verify()
            .map_err(|e| BackendError::InvalidIr(e.to_string()))?;
        if module.function.blocks.is_empty() {
            return Err(BackendError::InvalidIr(format!(
                "function {} has no blocks",
                module.function.name
            )));
        }

        let builder = ObjectBuilder::new(
            self.isa.clone(),
            module.name.as_str(),
            cranelift_module::default_libcall_names(),
        )
        .map_err(codegen_error)?;
        let mut object = ObjectModule::new(builder);

        let strings = define_strings(&mut object, module)?;
        let runtime = declare_runtime_imports(&mut object)?;

        let mut signature = object.make_signature();
        signature.returns.push(AbiParam::new(types::I32));
        let main_id = object
            .declare_function(&module.function.name, Linkage::Export, &signature)
            .map_err(codegen_error)?;

        let mut context = object.make_context();
        context.func.signature = signature;
        {
            let mut builder_context = FunctionBuilderContext::new();
            let mut builder = FunctionBuilder::new(&mut context.func, &mut builder_context);
            let mut lowering = FunctionLowering {
                object: &mut object,
                strings: &strings,
                runtime: &runtime,
                values: HashMap::new(),
                globals: HashMap::new(),
            };
            lowering.lower(&module.function, &mut builder)?;
            builder.seal_all_blocks();
            builder.finalize();
        }

        object
            .define_function(main_id, &mut context)
            .map_err(codegen_error)?;
        object.clear_context(&mut context);

        let bytes = object.finish().emit().map_err(codegen_error)?;
        debug!(target = %self.target(), bytes = bytes.len(), "emitted object");
        Ok(bytes)
    }
}

struct RuntimeImports {
    print_float: FuncId,
    print_str: FuncId,
}

fn declare_runtime_imports(object: &mut ObjectModule) -> Result<RuntimeImports, BackendError> {
    let pointer_ty = object.target_config().pointer_type();

    let mut print_float_sig = object.make_signature();
    print_float_sig.params.push(AbiParam::new(types::F64));
    let print_float = object
        .declare_function(
            Runtime::PrintFloat.symbol(),
            Linkage::Import,
            &print_float_sig,
        )
        .map_err(codegen_error)?;

    let mut print_str_sig = object.make_signature();
    print_str_sig.params.push(AbiParam::new(pointer_ty));
    let print_str = object
        .declare_function(Runtime::PrintStr.symbol(), Linkage::Import, &print_str_sig)
        .map_err(codegen_error)?;

    Ok(RuntimeImports {
        print_float,
        print_str,
    })
}

/// One nul-terminated data object per string constant.
fn define_strings(object: &mut ObjectModule, module: &Module) -> Result<Vec<DataId>, BackendError> {
    let mut ids = Vec::with_capacity(module.strings.len());

    for (i, text) in module.strings.iter().enumerate() {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);

        let mut data = DataDescription::new();
        data.define(bytes.into_boxed_slice());

        let id = object
            .declare_data(&format!("__emj_str{}", i), Linkage::Local, false, false)
            .map_err(codegen_error)?;
        object.define_data(id, &data).map_err(codegen_error)?;
        ids.push(id);
    }

    Ok(ids)
}

struct FunctionLowering<'a> {
    object: &'a mut ObjectModule,
    strings: &'a [DataId],
    runtime: &'a RuntimeImports,
    values: HashMap<u32, ClifValue>,
    globals: HashMap<usize, GlobalValue>,
}

impl FunctionLowering<'_> {
    fn clif_type(&self, ty: Type) -> cranelift::prelude::Type {
        match ty {
            Type::F64 => types::F64,
            Type::Ptr => self.object.target_config().pointer_type(),
            Type::Bool => types::I8,
        }
    }

    fn get(&self, value: Value) -> Result<ClifValue, BackendError> {
        self.values
            .get(&value.index)
            .copied()
            .ok_or_else(|| BackendError::InvalidIr(format!("use of undefined value {}", value)))
    }

    fn lower(
        &mut self,
        function: &IrFunction,
        builder: &mut FunctionBuilder,
    ) -> Result<(), BackendError> {
        let blocks: Vec<Block> = function.blocks.iter().map(|_| builder.create_block()).collect();
        builder.append_block_params_for_function_params(blocks[0]);

        let mut slots = Vec::with_capacity(function.slots.len());
        for slot in &function.slots {
            let size = self.clif_type(slot.ty).bytes();
            slots.push(builder.create_sized_stack_slot(StackSlotData::new(
                StackSlotKind::ExplicitSlot,
                size,
                3,
            )));
        }

        let print_float = self
            .object
            .declare_func_in_func(self.runtime.print_float, builder.func);
        let print_str = self
            .object
            .declare_func_in_func(self.runtime.print_str, builder.func);

        for (block, &clif_block) in function.blocks.iter().zip(&blocks) {
            builder.switch_to_block(clif_block);

            for inst in &block.insts {
                self.lower_inst(inst, &slots, [print_float, print_str], builder)?;
            }

            match &block.terminator {
                Some(Terminator::Jump(target)) => {
                    builder.ins().jump(blocks[target.0], &[]);
                }
                Some(Terminator::Branch {
                    cond,
                    then_block,
                    else_block,
                }) => {
                    let cond = self.get(*cond)?;
                    builder
                        .ins()
                        .brif(cond, blocks[then_block.0], &[], blocks[else_block.0], &[]);
                }
                Some(Terminator::Return(code)) => {
                    let code = builder.ins().iconst(types::I32, i64::from(*code));
                    builder.ins().return_(&[code]);
                }
                None => {
                    return Err(BackendError::InvalidIr(format!(
                        "block {} has no terminator",
                        block.label
                    )))
                }
            }
        }

        Ok(())
    }

    fn lower_inst(
        &mut self,
        inst: &Inst,
        slots: &[StackSlot],
        [print_float, print_str]: [FuncRef; 2],
        builder: &mut FunctionBuilder,
    ) -> Result<(), BackendError> {
        let slot = |id: usize| {
            slots
                .get(id)
                .copied()
                .ok_or_else(|| BackendError::InvalidIr(format!("unknown stack slot #{}", id)))
        };

        let (dest, result) = match inst {
            Inst::ConstF64 { dest, value } => (*dest, builder.ins().f64const(*value)),
            Inst::GlobalStr { dest, id } => {
                let data_id = *self.strings.get(id.0).ok_or_else(|| {
                    BackendError::InvalidIr(format!("unknown string constant {}", id))
                })?;
                let global = match self.globals.get(&id.0) {
                    Some(global) => *global,
                    None => {
                        let global = self.object.declare_data_in_func(data_id, builder.func);
                        self.globals.insert(id.0, global);
                        global
                    }
                };
                let ptr_ty = self.clif_type(Type::Ptr);
                (*dest, builder.ins().global_value(ptr_ty, global))
            }
            Inst::Load { dest, slot: id } => {
                let ty = self.clif_type(dest.ty);
                (*dest, builder.ins().stack_load(ty, slot(id.0)?, 0))
            }
            Inst::Store { slot: id, value } => {
                let value = self.get(*value)?;
                builder.ins().stack_store(value, slot(id.0)?, 0);
                return Ok(());
            }
            Inst::Binary { dest, op, lhs, rhs } => {
                let (l, r) = (self.get(*lhs)?, self.get(*rhs)?);
                let result = match op {
                    BinaryOp::FAdd => builder.ins().fadd(l, r),
                    BinaryOp::FSub => builder.ins().fsub(l, r),
                    BinaryOp::FMul => builder.ins().fmul(l, r),
                    BinaryOp::FDiv => builder.ins().fdiv(l, r),
                };
                (*dest, result)
            }
            Inst::FCmp {
                dest,
                cond,
                lhs,
                rhs,
            } => {
                let (l, r) = (self.get(*lhs)?, self.get(*rhs)?);
                let cc = match cond {
                    FloatCmp::Eq => FloatCC::Equal,
                    FloatCmp::Ne => FloatCC::OrderedNotEqual,
                    FloatCmp::Gt => FloatCC::GreaterThan,
                    FloatCmp::Lt => FloatCC::LessThan,
                    FloatCmp::Ge => FloatCC::GreaterThanOrEqual,
                    FloatCmp::Le => FloatCC::LessThanOrEqual,
                };
                (*dest, builder.ins().fcmp(cc, l, r))
            }
            Inst::Logic { dest, op, lhs, rhs } => {
                let (l, r) = (self.get(*lhs)?, self.get(*rhs)?);
                let result = match op {
                    LogicOp::And => builder.ins().band(l, r),
                    LogicOp::Or => builder.ins().bor(l, r),
                };
                (*dest, result)
            }
            Inst::Not { dest, operand } => {
                let operand = self.get(*operand)?;
                (*dest, builder.ins().icmp_imm(IntCC::Equal, operand, 0))
            }
            Inst::Call { callee, args } => {
                let func = match callee {
                    Runtime::PrintFloat => print_float,
                    Runtime::PrintStr => print_str,
                };
                let args = args
                    .iter()
                    .map(|a| self.get(*a))
                    .collect::<Result<Vec<_>, _>>()?;
                builder.ins().call(func, &args);
                return Ok(());
            }
        };

        self.values.insert(dest.index, result);
        Ok(())
    }
}

fn build_native_isa() -> Result<OwnedTargetIsa, BackendError> {
    let mut flags = settings::builder();
    flags.set("is_pic", "true").map_err(codegen_error)?;
    flags.set("opt_level", "none").map_err(codegen_error)?;

    let isa_builder = cranelift_native::builder()
        .map_err(|msg| BackendError::UnsupportedHost(msg.to_string()))?;

    isa_builder
        .finish(settings::Flags::new(flags))
        .map_err(codegen_error)
}

fn codegen_error(err: impl Display) -> BackendError {
    BackendError::Codegen(err.to_string())
}
