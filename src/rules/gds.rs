//! GDS atomic rule family (family 20): `DsAppend`/`DsConsume`.
use crate::context::TranslationContext;
use crate::error::Result;
use crate::model::ShaderInstruction;
use crate::operand::variable_name;
use crate::pool::ConstTy;

/// `DsAppend dst, gds` / `DsConsume dst, gds` — atomically increments
/// (append) or decrements (consume) the GDS counter bound at
/// `gds_pointer_res_<slot>` and returns the pre-update value, bracketed by
/// the workgroup-scope memory barrier the original semantics require for
/// cross-invocation visibility.
fn atomic(inst: &ShaderInstruction, ctx: &mut TranslationContext, op: &str) -> Result<String> {
    let mut out = String::new();
    let slot = inst.src[0].register_id;
    let scope = ctx.consts.insert(ConstTy::Uint, 2); // Workgroup
    let semantics = ctx.consts.insert(ConstTy::Uint, 0x108); // AcquireRelease | WorkgroupMemory
    let gep = ctx.next_index();
    out += &format!("%{g} = OpAccessChain %_ptr_StorageBuffer_uint %gds_pointer_res_{slot} %uint_0\n", g = gep, slot = slot);
    let old = ctx.next_index();
    out += &format!(
        "%{o} = {op} %uint %{g} %{scope} %{sem}\n",
        o = old,
        op = op,
        g = gep,
        scope = scope,
        sem = semantics
    );
    out += &format!("OpMemoryBarrier %{scope} %{sem}\n", scope = scope, sem = semantics);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, old);
    Ok(out)
}

pub fn ds_append(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    atomic(inst, ctx, "OpAtomicIIncrement")
}

pub fn ds_consume(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    atomic(inst, ctx, "OpAtomicIDecrement")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerateConfig;
    use crate::model::{InstrFormat, InstrType, OperandType, ShaderOperand};

    fn gds_inst(ty: InstrType) -> ShaderInstruction {
        ShaderInstruction {
            pc: 0,
            ty,
            format: InstrFormat::None,
            dst: ShaderOperand::reg(OperandType::Vgpr, 0),
            dst2: ShaderOperand::unused(),
            src: [ShaderOperand::reg(OperandType::Sgpr, 4), ShaderOperand::unused(), ShaderOperand::unused(), ShaderOperand::unused()],
            src_num: 1,
        }
    }

    #[test]
    fn ds_append_uses_atomic_increment_and_a_barrier() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let text = ds_append(&gds_inst(InstrType::DsAppend), &mut ctx).unwrap();
        assert!(text.contains("OpAtomicIIncrement"));
        assert!(text.contains("OpMemoryBarrier"));
        assert!(text.contains("OpStore %v0"));
    }

    #[test]
    fn ds_consume_uses_atomic_decrement() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let text = ds_consume(&gds_inst(InstrType::DsConsume), &mut ctx).unwrap();
        assert!(text.contains("OpAtomicIDecrement"));
    }
}
