//! Vector memory rule family: `BufferLoadDword`, `BufferLoadFormatX`,
//! `BufferStoreDword`, `BufferStoreFormatX`, `TBufferLoadFormatXyzw`.
//!
//! Loads execute unconditionally (the design notes' documented EXEC
//! divergence); stores are wrapped in a structured branch on `EXECZ == 0`
//! via [`exec_gated`].
use crate::context::TranslationContext;
use crate::error::Result;
use crate::loader::load_uint;
use crate::model::ShaderInstruction;
use crate::operand::variable_name;
use crate::pool::ConstTy;

/// `BufferLoadDword vdata, vaddr, s[...], soffset` — a single-dword typed
/// buffer load, `vaddr` giving the element index.
pub fn buffer_load_dword(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let idx = ctx.next_index();
    out += &load_uint(&inst.src[0], &idx, &idx, None, &mut ctx.consts)?;
    let gep = ctx.next_index();
    out += &format!(
        "%{g} = OpAccessChain %_ptr_StorageBuffer_uint %sbuffer_res_{slot} %uint_0 %{idx}\n",
        g = gep,
        slot = inst.src[1].register_id,
        idx = idx
    );
    let val = ctx.next_index();
    out += &format!("%{v} = OpLoad %uint %{g}\n", v = val, g = gep);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, val);
    Ok(out)
}

/// `BufferLoadFormatX vdata, vaddr, s[...], soffset` — loads a single
/// formatted component as `float` (no swizzle/normalization, matching the
/// original's single-channel fast path).
pub fn buffer_load_format_x(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let idx = ctx.next_index();
    out += &load_uint(&inst.src[0], &idx, &idx, None, &mut ctx.consts)?;
    let gep = ctx.next_index();
    out += &format!(
        "%{g} = OpAccessChain %_ptr_StorageBuffer_float %sbuffer_res_{slot} %uint_1 %{idx}\n",
        g = gep,
        slot = inst.src[1].register_id,
        idx = idx
    );
    let val = ctx.next_index();
    out += &format!("%{v} = OpLoad %float %{g}\n", v = val, g = gep);
    let (name, _) = variable_name(&inst.dst, 0);
    out += &format!("OpStore %{} %{}\n", name, val);
    Ok(out)
}

/// Wraps `body` (one or more `OpStore`s) in a structured branch on `EXECZ
/// == 0`, since vector-memory stores execute only for an active wavefront
/// (loads and samples stay unconditional — see the design notes' EXEC
/// divergence callout).
fn exec_gated(ctx: &mut TranslationContext, body: &str) -> String {
    let idx = ctx.next_index();
    let execz_v = ctx.next_index();
    let cond = ctx.next_index();
    format!(
        "%{ev} = OpLoad %uint %execz\n\
         %{c} = OpIEqual %bool %{ev} %uint_0\n\
         OpSelectionMerge %store_merge_{idx} None\n\
         OpBranchConditional %{c} %store_then_{idx} %store_merge_{idx}\n\
         %store_then_{idx} = OpLabel\n\
         {body}\
         OpBranch %store_merge_{idx}\n\
         %store_merge_{idx} = OpLabel\n",
        ev = execz_v,
        c = cond,
        idx = idx,
        body = body
    )
}

/// `BufferStoreDword vdata, vaddr, s[...], soffset`.
pub fn buffer_store_dword(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let idx = ctx.next_index();
    out += &load_uint(&inst.src[0], &idx, &idx, None, &mut ctx.consts)?;
    let data = ctx.next_index();
    out += &load_uint(&inst.src[2], &data, &data, None, &mut ctx.consts)?;
    let gep = ctx.next_index();
    let mut body = String::new();
    body += &format!(
        "%{g} = OpAccessChain %_ptr_StorageBuffer_uint %sbuffer_res_{slot} %uint_0 %{idx}\n",
        g = gep,
        slot = inst.src[1].register_id,
        idx = idx
    );
    body += &format!("OpStore %{} %{}\n", gep, data);
    out += &exec_gated(ctx, &body);
    Ok(out)
}

/// `BufferStoreFormatX vdata, vaddr, s[...], soffset`.
pub fn buffer_store_format_x(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let idx = ctx.next_index();
    out += &load_uint(&inst.src[0], &idx, &idx, None, &mut ctx.consts)?;
    let data = ctx.next_index();
    let (src_name, _) = variable_name(&inst.src[2], 0);
    out += &format!("%{d} = OpLoad %float %{n}\n", d = data, n = src_name);
    let gep = ctx.next_index();
    let mut body = String::new();
    body += &format!(
        "%{g} = OpAccessChain %_ptr_StorageBuffer_float %sbuffer_res_{slot} %uint_1 %{idx}\n",
        g = gep,
        slot = inst.src[1].register_id,
        idx = idx
    );
    body += &format!("OpStore %{} %{}\n", gep, data);
    out += &exec_gated(ctx, &body);
    Ok(out)
}

/// Bit position of the combined `dfmt:nfmt` byte within the third dword of
/// a T# descriptor, per the ABI's `(dfmt << 4) | nfmt` encoding.
const DFMT_NFMT_SHIFT: u32 = 20;
const DFMT_NFMT_XYZW: u32 = 119;

/// `TBufferLoadFormatXyzw vdata, vaddr, s[...], soffset` — loads a
/// four-component typed-buffer element into `dst..dst+3`, guarded on the
/// bound T#'s `dfmt:nfmt` code matching `119` (`R32G32B32A32_FLOAT`); any
/// other format code falls through as a no-op, per the ABI note in §6.
pub fn tbuffer_load_format_xyzw(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let idx = ctx.next_index();
    out += &load_uint(&inst.src[0], &idx, &idx, None, &mut ctx.consts)?;

    let desc_slot = inst.src[1].register_id;
    let fmt_dword = ctx.next_index();
    out += &format!(
        "%{f} = OpLoad %uint %s{reg}\n",
        f = fmt_dword,
        reg = desc_slot + 2
    );
    let shift_id = ctx.consts.insert(ConstTy::Uint, DFMT_NFMT_SHIFT);
    let mask_id = ctx.consts.insert(ConstTy::Uint, 0xff);
    let shifted = ctx.next_index();
    out += &format!("%{s} = OpShiftRightLogical %uint %{f} %{k}\n", s = shifted, f = fmt_dword, k = shift_id);
    let code = ctx.next_index();
    out += &format!("%{c} = OpBitwiseAnd %uint %{s} %{m}\n", c = code, s = shifted, m = mask_id);
    let want_id = ctx.consts.insert(ConstTy::Uint, DFMT_NFMT_XYZW);
    let matches = ctx.next_index();
    out += &format!("%{m} = OpIEqual %bool %{c} %{w}\n", m = matches, c = code, w = want_id);

    let gate = ctx.next_index();
    out += &format!("OpSelectionMerge %tbuf_merge_{idx} None\n", idx = gate);
    out += &format!("OpBranchConditional %{c} %tbuf_then_{idx} %tbuf_merge_{idx}\n", c = matches, idx = gate);
    out += &format!("%tbuf_then_{idx} = OpLabel\n", idx = gate);
    let four_id = ctx.consts.insert(ConstTy::Uint, 4);
    let base_idx = ctx.next_index();
    out += &format!("%{b} = OpIMul %uint %{idx} %{four}\n", b = base_idx, idx = idx, four = four_id);
    for comp in 0..4u32 {
        let comp_id = ctx.consts.insert(ConstTy::Uint, comp);
        let elem_idx = ctx.next_index();
        out += &format!("%{e} = OpIAdd %uint %{b} %{c}\n", e = elem_idx, b = base_idx, c = comp_id);
        let gep = ctx.next_index();
        out += &format!(
            "%{g} = OpAccessChain %_ptr_StorageBuffer_float %sbuffer_res_{slot} %uint_1 %{elem}\n",
            g = gep,
            slot = inst.src[1].register_id,
            elem = elem_idx
        );
        let val = ctx.next_index();
        out += &format!("%{v} = OpLoad %float %{g}\n", v = val, g = gep);
        let (name, _) = variable_name(&inst.dst, comp);
        out += &format!("OpStore %{} %{}\n", name, val);
    }
    out += &format!("OpBranch %tbuf_merge_{idx}\n", idx = gate);
    out += &format!("%tbuf_merge_{idx} = OpLabel\n", idx = gate);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerateConfig;
    use crate::model::{InstrFormat, InstrType, OperandType, ShaderOperand};

    fn store_inst(ty: InstrType) -> ShaderInstruction {
        ShaderInstruction {
            pc: 0,
            ty,
            format: InstrFormat::Vdata1Vaddr1SsssOffenIdxen,
            dst: ShaderOperand::unused(),
            dst2: ShaderOperand::unused(),
            src: [
                ShaderOperand::uint_const(0),
                ShaderOperand::reg(OperandType::Sgpr, 0),
                ShaderOperand::reg(OperandType::Vgpr, 4),
                ShaderOperand::unused(),
            ],
            src_num: 3,
        }
    }

    #[test]
    fn buffer_store_dword_is_wrapped_in_an_execz_gate() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let inst = store_inst(InstrType::BufferStoreDword);
        let text = buffer_store_dword(&inst, &mut ctx).unwrap();
        assert!(text.contains("OpLoad %uint %execz"));
        assert!(text.contains("OpSelectionMerge"));
        assert!(text.contains("OpBranchConditional"));
        assert!(text.contains("OpStore"));
    }

    #[test]
    fn buffer_store_format_x_is_also_execz_gated() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let inst = store_inst(InstrType::BufferStoreFormatX);
        let text = buffer_store_format_x(&inst, &mut ctx).unwrap();
        assert!(text.contains("OpLoad %uint %execz"));
        assert!(text.contains("OpSelectionMerge"));
    }

    #[test]
    fn buffer_load_dword_is_not_execz_gated() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let inst = store_inst(InstrType::BufferLoadDword);
        let text = buffer_load_dword(&inst, &mut ctx).unwrap();
        assert!(!text.contains("execz"));
    }

    #[test]
    fn tbuffer_load_checks_dfmt_nfmt_before_loading_components() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let mut inst = store_inst(InstrType::TBufferLoadFormatXyzw);
        inst.dst = ShaderOperand::reg_sized(OperandType::Vgpr, 8, 4);
        let text = tbuffer_load_format_xyzw(&inst, &mut ctx).unwrap();
        assert!(text.contains("OpShiftRightLogical"));
        assert!(text.contains("OpIEqual"));
        assert!(text.contains("OpSelectionMerge"));
        assert_eq!(text.matches("OpAccessChain %_ptr_StorageBuffer_float").count(), 4);
    }
}
