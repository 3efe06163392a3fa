//! Pack (family 16) and interpolation (family 17) rule families.
use crate::context::TranslationContext;
use crate::error::Result;
use crate::loader::load_float;
use crate::model::ShaderInstruction;
use crate::operand::variable_name;
use crate::pool::ConstTy;

/// `VCvtPkrtzF16F32 dst, src0, src1` — packs two round-toward-zero halves
/// into the low/high 16 bits of `dst`.
pub fn cvt_pkrtz_f16_f32(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let lo = ctx.next_index();
    out += &load_float(&inst.src[0], &lo, &lo, &mut ctx.consts)?;
    let hi = ctx.next_index();
    out += &load_float(&inst.src[1], &hi, &hi, &mut ctx.consts)?;
    let vec = ctx.next_index();
    out += &format!("%{v} = OpCompositeConstruct %v2float %{a} %{b}\n", v = vec, a = lo, b = hi);
    let packed = ctx.next_index();
    out += &format!("%{p} = OpExtInst %uint %glsl_std_450 PackHalf2x16 %{v}\n", p = packed, v = vec);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, packed);
    Ok(out)
}

/// `VInterpP1F32` — the first of the two-instruction barycentric
/// interpolation pair. With attributes fetched directly into VGPRs by
/// `SSwappcB64`'s vertex-fetch thunks rather than reconstructed from
/// plane equations, this phase has nothing left to compute.
pub fn interp_p1_f32() -> String {
    String::new()
}

/// `VInterpP2F32 dst, src0` — the second phase; reads `attr<attr>.<chan>`
/// via an `OpAccessChain` against the pixel-stage `attr<attr>` input (a
/// `v4float` varying), per the recompiler specification's interpolation
/// rule, and stores the selected component to `dst`.
pub fn interp_p2_f32(inst: &ShaderInstruction, ctx: &mut TranslationContext, attr: u32, chan: u32) -> Result<String> {
    let mut out = String::new();
    let chan_id = ctx.consts.insert(ConstTy::Uint, chan);
    let gep = ctx.next_index();
    out += &format!(
        "%{g} = OpAccessChain %_ptr_Input_float %attr{attr} %{chan}\n",
        g = gep,
        attr = attr,
        chan = chan_id
    );
    let v = ctx.next_index();
    out += &format!("%{v} = OpLoad %float %{g}\n", v = v, g = gep);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, v);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerateConfig;
    use crate::model::{InstrFormat, InstrType, OperandType, ShaderOperand};

    #[test]
    fn cvt_pkrtz_packs_both_halves_into_one_uint() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let inst = ShaderInstruction {
            pc: 0,
            ty: InstrType::VCvtPkrtzF16F32,
            format: InstrFormat::VdstVsrc0Vsrc1,
            dst: ShaderOperand::reg(OperandType::Vgpr, 4),
            dst2: ShaderOperand::unused(),
            src: [ShaderOperand::reg(OperandType::Vgpr, 0), ShaderOperand::reg(OperandType::Vgpr, 1), ShaderOperand::unused(), ShaderOperand::unused()],
            src_num: 2,
        };
        let text = cvt_pkrtz_f16_f32(&inst, &mut ctx).unwrap();
        assert!(text.contains("PackHalf2x16"));
        assert!(text.contains("OpStore %v4"));
    }

    #[test]
    fn interp_p1_f32_emits_nothing() {
        assert_eq!(interp_p1_f32(), "");
    }

    #[test]
    fn interp_p2_f32_reads_the_bound_attr_channel() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let inst = ShaderInstruction {
            pc: 0,
            ty: InstrType::VInterpP2F32,
            format: InstrFormat::AttrChan { attr: 1, chan: 2 },
            dst: ShaderOperand::reg(OperandType::Vgpr, 2),
            dst2: ShaderOperand::unused(),
            src: [ShaderOperand::reg(OperandType::Vgpr, 0), ShaderOperand::unused(), ShaderOperand::unused(), ShaderOperand::unused()],
            src_num: 1,
        };
        let text = interp_p2_f32(&inst, &mut ctx, 1, 2).unwrap();
        assert!(text.contains("OpAccessChain %_ptr_Input_float %attr1"));
        assert!(text.contains("OpStore %v2"));
    }
}
