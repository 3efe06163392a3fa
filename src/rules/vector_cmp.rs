//! Vector compare rule family (family 14) and `VCndmaskB32` (family 15).
//!
//! Compares write their boolean result to `vcc_lo` (`vcc_hi` cleared,
//! since this model scalarizes one wavefront lane per invocation). The
//! `x` (`VCmpx*`) variants additionally overwrite `EXEC` with the same
//! result and refresh `EXECZ`.
use crate::context::TranslationContext;
use crate::error::Result;
use crate::loader::{load_float, load_int, load_uint};
use crate::model::ShaderInstruction;
use crate::operand::variable_name;
use crate::rules::scalar_alu::execz_refresh;

fn store_vcc(ctx: &mut TranslationContext, bool_id: &str) -> (String, String) {
    let sel = ctx.next_index();
    let out = format!("%{sel} = OpSelect %uint %{b} %uint_1 %uint_0\nOpStore %vcc_lo %{sel}\nOpStore %vcc_hi %uint_0\n", sel = sel, b = bool_id);
    (out, sel)
}

pub fn cmp_f32(inst: &ShaderInstruction, ctx: &mut TranslationContext, spirv_op: &str) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_float(&inst.src[0], &i0, &i0, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_float(&inst.src[1], &i1, &i1, &mut ctx.consts)?;
    let b = ctx.next_index();
    out += &format!("%{b} = {op} %bool %{a} %{c}\n", b = b, op = spirv_op, a = i0, c = i1);
    let (vtext, _) = store_vcc(ctx, &b);
    out += &vtext;
    Ok(out)
}

pub fn cmp_i32(inst: &ShaderInstruction, ctx: &mut TranslationContext, spirv_op: &str) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_int(&inst.src[0], &i0, &i0, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_int(&inst.src[1], &i1, &i1, &mut ctx.consts)?;
    let b = ctx.next_index();
    out += &format!("%{b} = {op} %bool %{a} %{c}\n", b = b, op = spirv_op, a = i0, c = i1);
    let (vtext, _) = store_vcc(ctx, &b);
    out += &vtext;
    Ok(out)
}

pub fn cmp_u32(inst: &ShaderInstruction, ctx: &mut TranslationContext, spirv_op: &str) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_uint(&inst.src[0], &i0, &i0, None, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_uint(&inst.src[1], &i1, &i1, None, &mut ctx.consts)?;
    let b = ctx.next_index();
    out += &format!("%{b} = {op} %bool %{a} %{c}\n", b = b, op = spirv_op, a = i0, c = i1);
    let (vtext, _) = store_vcc(ctx, &b);
    out += &vtext;
    Ok(out)
}

/// `VCmpxEqI32`/`VCmpxGtU32` — like the plain compares but also updates
/// `EXEC`.
pub fn cmpx_i32(inst: &ShaderInstruction, ctx: &mut TranslationContext, spirv_op: &str) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_int(&inst.src[0], &i0, &i0, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_int(&inst.src[1], &i1, &i1, &mut ctx.consts)?;
    let b = ctx.next_index();
    out += &format!("%{b} = {op} %bool %{a} %{c}\n", b = b, op = spirv_op, a = i0, c = i1);
    let (vtext, sel) = store_vcc(ctx, &b);
    out += &vtext;
    out += &format!("OpStore %exec_lo %{}\nOpStore %exec_hi %uint_0\n", sel);
    out += &execz_refresh(ctx, &sel, "uint_0");
    Ok(out)
}

pub fn cmpx_u32(inst: &ShaderInstruction, ctx: &mut TranslationContext, spirv_op: &str) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_uint(&inst.src[0], &i0, &i0, None, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_uint(&inst.src[1], &i1, &i1, None, &mut ctx.consts)?;
    let b = ctx.next_index();
    out += &format!("%{b} = {op} %bool %{a} %{c}\n", b = b, op = spirv_op, a = i0, c = i1);
    let (vtext, sel) = store_vcc(ctx, &b);
    out += &vtext;
    out += &format!("OpStore %exec_lo %{}\nOpStore %exec_hi %uint_0\n", sel);
    out += &execz_refresh(ctx, &sel, "uint_0");
    Ok(out)
}

/// `VCndmaskB32 dst, src0, src1, src2` — `dst := (low half of src2 != 0) ?
/// src1 : src0`. `src2` is whatever SGPR pair (or VCC) the encoding names,
/// not implicitly `vcc_lo`, per the select-operand shape in §4.E.
pub fn cndmask_b32(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_uint(&inst.src[0], &i0, &i0, None, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_uint(&inst.src[1], &i1, &i1, None, &mut ctx.consts)?;
    let sel = ctx.next_index();
    out += &load_uint(&inst.src[2], &sel, &sel, Some(0), &mut ctx.consts)?;
    let cond = ctx.next_index();
    out += &format!("%{c} = OpINotEqual %bool %{v} %uint_0\n", c = cond, v = sel);
    let d = ctx.next_index();
    out += &format!("%{d} = OpSelect %uint %{c} %{a} %{b}\n", d = d, c = cond, a = i1, b = i0);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, d);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerateConfig;
    use crate::model::{InstrFormat, OperandType, ShaderOperand};

    fn make(src2: ShaderOperand) -> ShaderInstruction {
        ShaderInstruction {
            pc: 0,
            ty: crate::model::InstrType::VCndmaskB32,
            format: InstrFormat::VdstVsrc0Vsrc1Vsrc2,
            dst: ShaderOperand::reg(OperandType::Vgpr, 4),
            dst2: ShaderOperand::unused(),
            src: [
                ShaderOperand::reg(OperandType::Vgpr, 0),
                ShaderOperand::reg(OperandType::Vgpr, 1),
                src2,
                ShaderOperand::unused(),
            ],
            src_num: 3,
        }
    }

    #[test]
    fn cndmask_reads_its_own_src2_select_operand_not_vcc_lo() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let inst = make(ShaderOperand::reg(OperandType::Sgpr, 9));
        let text = cndmask_b32(&inst, &mut ctx).unwrap();
        assert!(text.contains("%s9"));
        assert!(!text.contains("%vcc_lo"));
    }

    #[test]
    fn cndmask_can_still_select_on_vcc_lo_when_that_is_the_named_operand() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let inst = make(ShaderOperand::special(OperandType::VccLo));
        let text = cndmask_b32(&inst, &mut ctx).unwrap();
        assert!(text.contains("%vcc_lo"));
    }

    #[test]
    fn cmpx_updates_exec_and_refreshes_execz() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let inst = ShaderInstruction {
            pc: 0,
            ty: crate::model::InstrType::VCmpxGtU32,
            format: InstrFormat::VdstVsrc0Vsrc1,
            dst: ShaderOperand::unused(),
            dst2: ShaderOperand::unused(),
            src: [ShaderOperand::reg(OperandType::Vgpr, 0), ShaderOperand::reg(OperandType::Vgpr, 1), ShaderOperand::unused(), ShaderOperand::unused()],
            src_num: 2,
        };
        let text = cmpx_u32(&inst, &mut ctx, "OpUGreaterThan").unwrap();
        assert!(text.contains("OpStore %exec_lo"));
        assert!(text.contains("OpStore %execz"));
    }
}
