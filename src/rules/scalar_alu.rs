//! Scalar ALU rule families: bitwise `S*B32`, integer `S{Add,Mul}I32`,
//! 64-bit logical `S*B64`, `SMovB32/64`, `SAndSaveexecB64`, `SWqmB64`.
use crate::context::TranslationContext;
use crate::error::{Error, Result};
use crate::loader::{load_int, load_uint};
use crate::model::{OperandType, ShaderInstruction};
use crate::operand::variable_name;

/// `scc := (value != 0) ? 1 : 0`, the standard SCC-nonzero postlude shared
/// by every `scc_check = NonZero` rule.
pub(super) fn scc_nonzero(ctx: &mut TranslationContext, value_id: &str) -> String {
    let nz = ctx.next_index();
    let sel = ctx.next_index();
    format!(
        "%{nz} = OpINotEqual %bool %{v} %uint_0\n%{sel} = OpSelect %uint %{nz} %uint_1 %uint_0\nOpStore %scc %{sel}\n",
        nz = nz,
        v = value_id,
        sel = sel
    )
}

/// `execz := (lo == 0) AND (hi == 0) ? 1 : 0`, run after anything that
/// overwrites EXEC.
pub(super) fn execz_refresh(ctx: &mut TranslationContext, lo: &str, hi: &str) -> String {
    let zl = ctx.next_index();
    let zh = ctx.next_index();
    let both = ctx.next_index();
    let sel = ctx.next_index();
    format!(
        "%{zl} = OpIEqual %bool %{lo} %uint_0\n\
         %{zh} = OpIEqual %bool %{hi} %uint_0\n\
         %{both} = OpLogicalAnd %bool %{zl} %{zh}\n\
         %{sel} = OpSelect %uint %{both} %uint_1 %uint_0\n\
         OpStore %execz %{sel}\n",
        zl = zl,
        zh = zh,
        both = both,
        sel = sel
    )
}

/// `dst := op(uint(src0), uint(src1))`, optionally followed by the
/// SCC-nonzero postlude. Covers `SAndB32`, `SLshlB32`, `SLshrB32`.
pub fn bitwise_b32(inst: &ShaderInstruction, ctx: &mut TranslationContext, spirv_op: &str, scc_nonzero_check: bool) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_uint(&inst.src[0], &i0, &i0, None, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_uint(&inst.src[1], &i1, &i1, None, &mut ctx.consts)?;
    let d = ctx.next_index();
    out += &format!("%{d} = {op} %uint %{a} %{b}\n", d = d, op = spirv_op, a = i0, b = i1);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, d);
    if scc_nonzero_check {
        out += &scc_nonzero(ctx, &d);
    }
    Ok(out)
}

/// `SCselectB32 dst, src0, src1` — `dst := (scc != 0) ? src0 : src1`.
pub fn cselect_b32(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_uint(&inst.src[0], &i0, &i0, None, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_uint(&inst.src[1], &i1, &i1, None, &mut ctx.consts)?;
    let scc = ctx.next_index();
    out += &format!("%{s} = OpLoad %uint %scc\n", s = scc);
    let cond = ctx.next_index();
    out += &format!("%{c} = OpINotEqual %bool %{s} %uint_0\n", c = cond, s = scc);
    let d = ctx.next_index();
    out += &format!("%{d} = OpSelect %uint %{c} %{a} %{b}\n", d = d, c = cond, a = i0, b = i1);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, d);
    Ok(out)
}

/// `SAddI32 dst, src0, src1` — signed add in `int`, SCC set to the
/// signed-overflow flag (matched source signs, sign change vs dst). See the
/// open question recorded in `DESIGN.md`: this formula is specific to
/// addition and is not reused for subtraction.
pub fn add_i32(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_int(&inst.src[0], &i0, &i0, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_int(&inst.src[1], &i1, &i1, &mut ctx.consts)?;
    let sum = ctx.next_index();
    out += &format!("%{s} = OpIAdd %int %{a} %{b}\n", s = sum, a = i0, b = i1);
    let bits = ctx.next_index();
    out += &format!("%{u} = OpBitcast %uint %{s}\n", u = bits, s = sum);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, bits);

    let s0 = ctx.next_index();
    out += &format!("%{x} = OpSLessThan %bool %{a} %int_0\n", x = s0, a = i0);
    let s1 = ctx.next_index();
    out += &format!("%{x} = OpSLessThan %bool %{a} %int_0\n", x = s1, a = i1);
    let sd = ctx.next_index();
    out += &format!("%{x} = OpSLessThan %bool %{a} %int_0\n", x = sd, a = sum);
    let same_sign = ctx.next_index();
    out += &format!("%{x} = OpLogicalEqual %bool %{a} %{b}\n", x = same_sign, a = s0, b = s1);
    let sign_changed = ctx.next_index();
    out += &format!("%{x} = OpLogicalNotEqual %bool %{a} %{b}\n", x = sign_changed, a = sd, b = s0);
    let overflow = ctx.next_index();
    out += &format!("%{x} = OpLogicalAnd %bool %{a} %{b}\n", x = overflow, a = same_sign, b = sign_changed);
    let ov_uint = ctx.next_index();
    out += &format!("%{x} = OpSelect %uint %{c} %uint_1 %uint_0\n", x = ov_uint, c = overflow);
    out += &format!("OpStore %scc %{}\n", ov_uint);
    Ok(out)
}

/// `SMulI32 dst, src0, src1` — signed multiply, no SCC effect.
pub fn mul_i32(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_int(&inst.src[0], &i0, &i0, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_int(&inst.src[1], &i1, &i1, &mut ctx.consts)?;
    let prod = ctx.next_index();
    out += &format!("%{p} = OpIMul %int %{a} %{b}\n", p = prod, a = i0, b = i1);
    let bits = ctx.next_index();
    out += &format!("%{u} = OpBitcast %uint %{p}\n", u = bits, p = prod);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, bits);
    Ok(out)
}

/// `S{And,Or,Xor}B64 dst, src0, src1` — per-lane bitwise over two SGPR
/// pairs; `scc := (lo|hi) != 0`.
pub fn logical_b64(inst: &ShaderInstruction, ctx: &mut TranslationContext, spirv_op: &str) -> Result<String> {
    let mut out = String::new();
    let mut halves = Vec::with_capacity(2);
    for shift in 0..2u32 {
        let i0 = ctx.next_index();
        out += &load_uint(&inst.src[0], &i0, &i0, Some(shift), &mut ctx.consts)?;
        let i1 = ctx.next_index();
        out += &load_uint(&inst.src[1], &i1, &i1, Some(shift), &mut ctx.consts)?;
        let d = ctx.next_index();
        out += &format!("%{d} = {op} %uint %{a} %{b}\n", d = d, op = spirv_op, a = i0, b = i1);
        let (name, _) = variable_name(&inst.dst, shift);
        out += &format!("OpStore %{} %{}\n", name, d);
        halves.push(d);
    }
    let orred = ctx.next_index();
    out += &format!("%{x} = OpBitwiseOr %uint %{a} %{b}\n", x = orred, a = halves[0], b = halves[1]);
    out += &scc_nonzero(ctx, &orred);
    Ok(out)
}

/// `SMovB32 dst, src0`.
pub fn mov_b32(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let v = ctx.next_index();
    out += &load_uint(&inst.src[0], &v, &v, None, &mut ctx.consts)?;
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, v);
    Ok(out)
}

/// `SMovB64 dst, src0` — copies both halves of an SGPR pair.
pub fn mov_b64(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    for shift in 0..2u32 {
        let v = ctx.next_index();
        out += &load_uint(&inst.src[0], &v, &v, Some(shift), &mut ctx.consts)?;
        let (name, _) = variable_name(&inst.dst, shift);
        out += &format!("OpStore %{} %{}\n", name, v);
    }
    Ok(out)
}

/// `SAndSaveexecB64 dst, src0` — saves EXEC to `dst`, then
/// `EXEC := EXEC AND src0`, then refreshes EXECZ.
pub fn and_saveexec_b64(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let exec_pair = crate::model::ShaderOperand::reg_sized(OperandType::ExecLo, 0, 2);
    for shift in 0..2u32 {
        let old = ctx.next_index();
        out += &load_uint(&exec_pair, &old, &old, Some(shift), &mut ctx.consts)?;
        let (name, _) = variable_name(&inst.dst, shift);
        out += &format!("OpStore %{} %{}\n", name, old);
    }
    let mut halves = Vec::with_capacity(2);
    for shift in 0..2u32 {
        let e = ctx.next_index();
        out += &load_uint(&exec_pair, &e, &e, Some(shift), &mut ctx.consts)?;
        let s = ctx.next_index();
        out += &load_uint(&inst.src[0], &s, &s, Some(shift), &mut ctx.consts)?;
        let d = ctx.next_index();
        out += &format!("%{d} = OpBitwiseAnd %uint %{a} %{b}\n", d = d, a = e, b = s);
        let exec_name = if shift == 0 { "exec_lo" } else { "exec_hi" };
        out += &format!("OpStore %{} %{}\n", exec_name, d);
        halves.push(d);
    }
    out += &execz_refresh(ctx, &halves[0], &halves[1]);
    Ok(out)
}

/// `SWqmB64` — recognized only in the trivial case `dst == ExecLo && src0
/// == ExecLo`, where it is a no-op (see the recorded open-question
/// decision in `DESIGN.md`). Any other operand shape is rejected rather
/// than silently dropped.
pub fn wqm_b64(inst: &ShaderInstruction) -> Result<String> {
    if matches!(inst.dst.ty, OperandType::ExecLo) && matches!(inst.src[0].ty, OperandType::ExecLo) {
        Ok(String::new())
    } else {
        Err(Error::UnsupportedOperandShape {
            pc: inst.pc,
            disassembly: inst.disassemble(),
            reason: "SWqmB64 is only recognized for dst=ExecLo, src0=ExecLo".to_owned(),
        }
        .logged())
    }
}
