//! Vector ALU rule families: float (family 12) and int/uint (family 13).
use crate::context::TranslationContext;
use crate::error::Result;
use crate::loader::{load_float, load_int, load_uint};
use crate::model::ShaderInstruction;
use crate::operand::variable_name;
use crate::pool::ConstTy;

/// Applies a `dst` operand's output modifiers (`multiplier`, `clamp`) to a
/// freshly computed `float` value, returning the extra snippet plus the id
/// of the final (possibly unchanged) value.
fn apply_output_modifiers(ctx: &mut TranslationContext, value_id: &str, dst: &crate::model::ShaderOperand) -> (String, String) {
    let mut out = String::new();
    let mut cur = value_id.to_owned();
    if (dst.multiplier - 1.0).abs() > f32::EPSILON {
        let k = ctx.consts.insert(ConstTy::Float, dst.multiplier.to_bits());
        let m = ctx.next_index();
        out += &format!("%{m} = OpFMul %float %{c} %{k}\n", m = m, c = cur, k = k);
        cur = m;
    }
    if dst.clamp {
        let lo = ctx.consts.insert(ConstTy::Float, 0.0f32.to_bits());
        let hi = ctx.consts.insert(ConstTy::Float, 1.0f32.to_bits());
        let c = ctx.next_index();
        out += &format!("%{c2} = OpFClamp %float %{v} %{lo} %{hi}\n", c2 = c, v = cur, lo = lo, hi = hi);
        cur = c;
    }
    (out, cur)
}

/// `VAddF32`, `VMulF32`, `VMinF32`, `VMaxF32`, `VSubF32`, `VSubrevF32`.
pub fn float_binary(inst: &ShaderInstruction, ctx: &mut TranslationContext, spirv_op: &str, swap: bool) -> Result<String> {
    let mut out = String::new();
    let (s0, s1) = if swap { (&inst.src[1], &inst.src[0]) } else { (&inst.src[0], &inst.src[1]) };
    let i0 = ctx.next_index();
    out += &load_float(s0, &i0, &i0, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_float(s1, &i1, &i1, &mut ctx.consts)?;
    let d = ctx.next_index();
    out += &format!("%{d} = {op} %float %{a} %{b}\n", d = d, op = spirv_op, a = i0, b = i1);
    let (mtext, final_id) = apply_output_modifiers(ctx, &d, &inst.dst);
    out += &mtext;
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, final_id);
    Ok(out)
}

/// `VMinF32`/`VMaxF32` — GLSL.std.450 extended-instruction binary ops.
pub fn float_binary_ext(inst: &ShaderInstruction, ctx: &mut TranslationContext, ext_op: &str) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_float(&inst.src[0], &i0, &i0, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_float(&inst.src[1], &i1, &i1, &mut ctx.consts)?;
    let d = ctx.next_index();
    out += &format!("%{d} = OpExtInst %float %glsl_std_450 {op} %{a} %{b}\n", d = d, op = ext_op, a = i0, b = i1);
    let (mtext, final_id) = apply_output_modifiers(ctx, &d, &inst.dst);
    out += &mtext;
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, final_id);
    Ok(out)
}

/// `VRcpF32 dst, src0` — `dst := 1.0 / src0`.
pub fn rcp_f32(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_float(&inst.src[0], &i0, &i0, &mut ctx.consts)?;
    let one = ctx.consts.insert(ConstTy::Float, 1.0f32.to_bits());
    let d = ctx.next_index();
    out += &format!("%{d} = OpFDiv %float %{one} %{a}\n", d = d, one = one, a = i0);
    let (mtext, final_id) = apply_output_modifiers(ctx, &d, &inst.dst);
    out += &mtext;
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, final_id);
    Ok(out)
}

/// `VRsqF32`, `VSqrtF32` — GLSL.std.450 extended-instruction unary ops.
pub fn float_unary_ext(inst: &ShaderInstruction, ctx: &mut TranslationContext, ext_op: &str) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_float(&inst.src[0], &i0, &i0, &mut ctx.consts)?;
    let d = ctx.next_index();
    out += &format!("%{d} = OpExtInst %float %glsl_std_450 {op} %{a}\n", d = d, op = ext_op, a = i0);
    let (mtext, final_id) = apply_output_modifiers(ctx, &d, &inst.dst);
    out += &mtext;
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, final_id);
    Ok(out)
}

/// `VMacF32 dst, src0, src1` — `dst := dst + src0 * src1`.
pub fn mac_f32(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_float(&inst.src[0], &i0, &i0, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_float(&inst.src[1], &i1, &i1, &mut ctx.consts)?;
    let acc = ctx.next_index();
    out += &load_float(&inst.dst, &acc, &acc, &mut ctx.consts)?;
    let prod = ctx.next_index();
    out += &format!("%{p} = OpFMul %float %{a} %{b}\n", p = prod, a = i0, b = i1);
    let sum = ctx.next_index();
    out += &format!("%{s} = OpFAdd %float %{a} %{p}\n", s = sum, a = acc, p = prod);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, sum);
    Ok(out)
}

/// `VCvtF32I32 dst, src0` / `VCvtF32U32 dst, src0`.
pub fn cvt_f32(inst: &ShaderInstruction, ctx: &mut TranslationContext, signed: bool) -> Result<String> {
    let mut out = String::new();
    let d = ctx.next_index();
    if signed {
        let i0 = ctx.next_index();
        out += &load_int(&inst.src[0], &i0, &i0, &mut ctx.consts)?;
        out += &format!("%{d} = OpConvertSToF %float %{a}\n", d = d, a = i0);
    } else {
        let i0 = ctx.next_index();
        out += &load_uint(&inst.src[0], &i0, &i0, None, &mut ctx.consts)?;
        out += &format!("%{d} = OpConvertUToF %float %{a}\n", d = d, a = i0);
    }
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, d);
    Ok(out)
}

/// `VMulU32U24 dst, src0, src1` / `VMadU32U24 dst, src0, src1, src2` —
/// operands truncated to their low 24 bits before multiplying.
pub fn mul_u24(inst: &ShaderInstruction, ctx: &mut TranslationContext, mad: bool) -> Result<String> {
    let mut out = String::new();
    let mask = ctx.consts.insert(ConstTy::Uint, 0xffffff);
    let a_raw = ctx.next_index();
    out += &load_uint(&inst.src[0], &a_raw, &a_raw, None, &mut ctx.consts)?;
    let a = ctx.next_index();
    out += &format!("%{a} = OpBitwiseAnd %uint %{r} %{m}\n", a = a, r = a_raw, m = mask);
    let b_raw = ctx.next_index();
    out += &load_uint(&inst.src[1], &b_raw, &b_raw, None, &mut ctx.consts)?;
    let b = ctx.next_index();
    out += &format!("%{b} = OpBitwiseAnd %uint %{r} %{m}\n", b = b, r = b_raw, m = mask);
    let prod = ctx.next_index();
    out += &format!("%{p} = OpIMul %uint %{a} %{b}\n", p = prod, a = a, b = b);
    let result = if mad {
        let c = ctx.next_index();
        out += &load_uint(&inst.src[2], &c, &c, None, &mut ctx.consts)?;
        let sum = ctx.next_index();
        out += &format!("%{s} = OpIAdd %uint %{p} %{c}\n", s = sum, p = prod, c = c);
        sum
    } else {
        prod
    };
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, result);
    Ok(out)
}

/// `VMulLoI32 dst, src0, src1` — low 32 bits of a signed multiply.
pub fn mul_lo_i32(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_int(&inst.src[0], &i0, &i0, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_int(&inst.src[1], &i1, &i1, &mut ctx.consts)?;
    let d = ctx.next_index();
    out += &format!("%{d} = OpIMul %int %{a} %{b}\n", d = d, a = i0, b = i1);
    let bits = ctx.next_index();
    out += &format!("%{u} = OpBitcast %uint %{d}\n", u = bits, d = d);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, bits);
    Ok(out)
}

/// `VSadU32 dst, src0, src1, src2` — `dst := |src0 - src1| + src2`.
pub fn sad_u32(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let a = ctx.next_index();
    out += &load_uint(&inst.src[0], &a, &a, None, &mut ctx.consts)?;
    let b = ctx.next_index();
    out += &load_uint(&inst.src[1], &b, &b, None, &mut ctx.consts)?;
    let c = ctx.next_index();
    out += &load_uint(&inst.src[2], &c, &c, None, &mut ctx.consts)?;
    let diff = ctx.next_index();
    out += &format!("%{d} = OpISub %int %{a} %{b}\n", d = diff, a = a, b = b);
    let abs_diff = ctx.next_index();
    out += &format!("%{d} = OpExtInst %int %glsl_std_450 SAbs %{v}\n", d = abs_diff, v = diff);
    let abs_u = ctx.next_index();
    out += &format!("%{u} = OpBitcast %uint %{d}\n", u = abs_u, d = abs_diff);
    let sum = ctx.next_index();
    out += &format!("%{s} = OpIAdd %uint %{a} %{c}\n", s = sum, a = abs_u, c = c);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, sum);
    Ok(out)
}

/// `VBfeU32 dst, src0, offset, width` — `offset`/`width` are already
/// decoded into `src[1]`/`src[2]` by the upstream disassembler.
pub fn bfe_u32(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let base = ctx.next_index();
    out += &load_uint(&inst.src[0], &base, &base, None, &mut ctx.consts)?;
    let offset = ctx.next_index();
    out += &load_uint(&inst.src[1], &offset, &offset, None, &mut ctx.consts)?;
    let width = ctx.next_index();
    out += &load_uint(&inst.src[2], &width, &width, None, &mut ctx.consts)?;
    let d = ctx.next_index();
    out += &format!(
        "%{d} = OpBitFieldUExtract %uint %{b} %{o} %{w}\n",
        d = d,
        b = base,
        o = offset,
        w = width
    );
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, d);
    Ok(out)
}

/// `VAddI32`/`VSubI32`/`VSubrevI32 dst, dst2(carry/borrow), src0, src1`.
pub fn add_sub_i32_carry(inst: &ShaderInstruction, ctx: &mut TranslationContext, sub: bool, swap: bool) -> Result<String> {
    let mut out = String::new();
    let (s0, s1) = if swap { (&inst.src[1], &inst.src[0]) } else { (&inst.src[0], &inst.src[1]) };
    let a = ctx.next_index();
    out += &load_uint(s0, &a, &a, None, &mut ctx.consts)?;
    let b = ctx.next_index();
    out += &load_uint(s1, &b, &b, None, &mut ctx.consts)?;
    let result = ctx.next_index();
    let carry_cond = ctx.next_index();
    if sub {
        out += &format!("%{r} = OpISub %uint %{a} %{b}\n", r = result, a = a, b = b);
        out += &format!("%{c} = OpULessThan %bool %{a} %{b}\n", c = carry_cond, a = a, b = b);
    } else {
        out += &format!("%{r} = OpIAdd %uint %{a} %{b}\n", r = result, a = a, b = b);
        out += &format!("%{c} = OpULessThan %bool %{r} %{a}\n", c = carry_cond, r = result, a = a);
    }
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, result);
    let carry_u = ctx.next_index();
    out += &format!("%{cu} = OpSelect %uint %{c} %uint_1 %uint_0\n", cu = carry_u, c = carry_cond);
    let (dname, _) = variable_name(&inst.dst2, 0);
    out += &format!("OpStore %{} %{}\n", dname, carry_u);
    Ok(out)
}

/// Masks a shift-count value to its low 5 bits, matching GCN's
/// register-shift semantics (only bits [4:0] of the count operand select
/// the amount; the rest are ignored rather than producing a >31 shift).
fn mask_shift_count(ctx: &mut TranslationContext, raw_id: &str) -> (String, String) {
    let mask = ctx.consts.insert(ConstTy::Uint, 31);
    let masked = ctx.next_index();
    (format!("%{m} = OpBitwiseAnd %uint %{r} %{k}\n", m = masked, r = raw_id, k = mask), masked)
}

/// `VLshlB32`/`VLshrB32 dst, src0, src1` — logical shift, count masked to
/// its low 5 bits.
pub fn shift_logical(inst: &ShaderInstruction, ctx: &mut TranslationContext, spirv_op: &str) -> Result<String> {
    let mut out = String::new();
    let a = ctx.next_index();
    out += &load_uint(&inst.src[0], &a, &a, None, &mut ctx.consts)?;
    let b_raw = ctx.next_index();
    out += &load_uint(&inst.src[1], &b_raw, &b_raw, None, &mut ctx.consts)?;
    let (mtext, b) = mask_shift_count(ctx, &b_raw);
    out += &mtext;
    let d = ctx.next_index();
    out += &format!("%{d} = {op} %uint %{a} %{b}\n", d = d, op = spirv_op, a = a, b = b);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, d);
    Ok(out)
}

/// `VAshrrevI32 dst, src0, src1` — arithmetic shift right, `src0` the
/// shift amount (masked to its low 5 bits), `src1` the value (note the
/// "rev" operand order).
pub fn ashrrev_i32(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let shift_raw = ctx.next_index();
    out += &load_uint(&inst.src[0], &shift_raw, &shift_raw, None, &mut ctx.consts)?;
    let (mtext, shift) = mask_shift_count(ctx, &shift_raw);
    out += &mtext;
    let value = ctx.next_index();
    out += &load_int(&inst.src[1], &value, &value, &mut ctx.consts)?;
    let d = ctx.next_index();
    out += &format!("%{d} = OpShiftRightArithmetic %int %{v} %{s}\n", d = d, v = value, s = shift);
    let bits = ctx.next_index();
    out += &format!("%{u} = OpBitcast %uint %{d}\n", u = bits, d = d);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, bits);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerateConfig;
    use crate::model::{InstrFormat, InstrType, OperandType, ShaderOperand};

    fn binary_inst(ty: InstrType, dst: ShaderOperand) -> ShaderInstruction {
        ShaderInstruction {
            pc: 0,
            ty,
            format: InstrFormat::VdstVsrc0Vsrc1,
            dst,
            dst2: ShaderOperand::unused(),
            src: [ShaderOperand::reg(OperandType::Vgpr, 0), ShaderOperand::reg(OperandType::Vgpr, 1), ShaderOperand::unused(), ShaderOperand::unused()],
            src_num: 2,
        }
    }

    #[test]
    fn float_binary_applies_multiplier_and_clamp_when_present() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let mut dst = ShaderOperand::reg(OperandType::Vgpr, 4);
        dst.multiplier = 2.0;
        dst.clamp = true;
        let text = float_binary(&binary_inst(InstrType::VAddF32, dst), &mut ctx, "OpFAdd", false).unwrap();
        assert!(text.contains("OpFMul"));
        assert!(text.contains("OpFClamp"));
        assert!(text.contains("OpStore %v4"));
    }

    #[test]
    fn float_binary_skips_modifiers_when_unset() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let dst = ShaderOperand::reg(OperandType::Vgpr, 4);
        let text = float_binary(&binary_inst(InstrType::VAddF32, dst), &mut ctx, "OpFAdd", false).unwrap();
        assert!(!text.contains("OpFMul"));
        assert!(!text.contains("OpFClamp"));
    }

    #[test]
    fn shift_logical_masks_the_shift_count_to_five_bits() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let dst = ShaderOperand::reg(OperandType::Vgpr, 4);
        let text = shift_logical(&binary_inst(InstrType::VLshlB32, dst), &mut ctx, "OpShiftLeftLogical").unwrap();
        assert!(text.contains("OpBitwiseAnd %uint"));
        assert!(text.contains("OpShiftLeftLogical"));
    }

    #[test]
    fn ashrrev_i32_masks_its_shift_operand_before_shifting() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let dst = ShaderOperand::reg(OperandType::Vgpr, 4);
        let text = ashrrev_i32(&binary_inst(InstrType::VAshrrevI32, dst), &mut ctx).unwrap();
        assert!(text.contains("OpBitwiseAnd %uint"));
        assert!(text.contains("OpShiftRightArithmetic"));
    }

    #[test]
    fn add_sub_i32_carry_add_sets_carry_on_wraparound() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let mut inst = binary_inst(InstrType::VAddI32, ShaderOperand::reg(OperandType::Vgpr, 4));
        inst.dst2 = ShaderOperand::reg(OperandType::Sgpr, 10);
        inst.src[0] = ShaderOperand::uint_const(u32::MAX);
        inst.src[1] = ShaderOperand::uint_const(1);
        let text = add_sub_i32_carry(&inst, &mut ctx, false, false).unwrap();
        assert!(text.contains("OpIAdd"));
        assert!(text.contains("OpStore %v4"));
        assert!(text.contains("OpStore %s10"));
    }

    #[test]
    fn mul_u24_masks_both_operands_to_24_bits_before_multiplying() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let inst = binary_inst(InstrType::VMulU32U24, ShaderOperand::reg(OperandType::Vgpr, 4));
        let text = mul_u24(&inst, &mut ctx, false).unwrap();
        assert_eq!(text.matches("OpBitwiseAnd").count(), 2);
        assert!(text.contains("OpIMul"));
    }
}
