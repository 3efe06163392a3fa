//! Scalar compare rule family: `SCmp{Eq,Lg,Gt,Ge,Lt,Le}U32`.
use crate::context::TranslationContext;
use crate::error::Result;
use crate::loader::load_uint;
use crate::model::ShaderInstruction;

/// `dst` is unused; the comparison result is written only to `scc`.
pub fn cmp_u32(inst: &ShaderInstruction, ctx: &mut TranslationContext, spirv_op: &str) -> Result<String> {
    let mut out = String::new();
    let i0 = ctx.next_index();
    out += &load_uint(&inst.src[0], &i0, &i0, None, &mut ctx.consts)?;
    let i1 = ctx.next_index();
    out += &load_uint(&inst.src[1], &i1, &i1, None, &mut ctx.consts)?;
    let b = ctx.next_index();
    out += &format!("%{b} = {op} %bool %{a} %{c}\n", b = b, op = spirv_op, a = i0, c = i1);
    let sel = ctx.next_index();
    out += &format!("%{sel} = OpSelect %uint %{b} %uint_1 %uint_0\nOpStore %scc %{sel}\n", sel = sel, b = b);
    Ok(out)
}
