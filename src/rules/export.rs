//! Export rule family (`Exp`, family 18) — pixel MRT0 writes and vertex
//! parameter/position writes.
use crate::context::TranslationContext;
use crate::error::Result;
use crate::loader::{load_float, load_uint};
use crate::model::ShaderInstruction;

/// `Exp mrt0, src0, src1 compr vm done` — two packed-half2x16 sources,
/// unpacked into the four-component fragment color output.
pub fn mrt0_packed_half(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let p0 = ctx.next_index();
    out += &load_uint(&inst.src[0], &p0, &p0, None, &mut ctx.consts)?;
    let p1 = ctx.next_index();
    out += &load_uint(&inst.src[1], &p1, &p1, None, &mut ctx.consts)?;
    let rg = ctx.next_index();
    out += &format!("%{v} = OpExtInst %v2float %glsl_std_450 UnpackHalf2x16 %{p}\n", v = rg, p = p0);
    let ba = ctx.next_index();
    out += &format!("%{v} = OpExtInst %v2float %glsl_std_450 UnpackHalf2x16 %{p}\n", v = ba, p = p1);
    let color = ctx.next_index();
    out += &format!("%{c} = OpCompositeConstruct %v4float %{a} %{b}\n", c = color, a = rg, b = ba);
    out += &format!("OpStore %frag_color_0 %{}\n", color);
    Ok(out)
}

/// `Exp mrt0, src0, src1, src2, src3 vm done` — four discrete float
/// components.
pub fn mrt0_four_float(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let mut comps = Vec::with_capacity(4);
    for src in inst.srcs() {
        let c = ctx.next_index();
        out += &load_float(src, &c, &c, &mut ctx.consts)?;
        comps.push(c);
    }
    let color = ctx.next_index();
    out += &format!(
        "%{c} = OpCompositeConstruct %v4float %{a} %{b} %{d} %{e}\n",
        c = color,
        a = comps[0],
        b = comps[1],
        d = comps[2],
        e = comps[3]
    );
    out += &format!("OpStore %frag_color_0 %{}\n", color);
    Ok(out)
}

/// `Exp mrt0, off, off compr vm done` — no color data is written. When the
/// pixel stage declared kill-enable this is the canonical discard export
/// (sandwiched between `SMovB64 EXEC, 0` and `SEndpgm`, see the body
/// emitter's terminator tracking) and emits `OpKill`; otherwise it is a
/// depth-only export with no SSA effect.
pub fn mrt0_kill_only(kill_enable: bool) -> String {
    if kill_enable {
        "OpKill\n".to_owned()
    } else {
        String::new()
    }
}

/// `Exp param<n>, src0, src1, src2, src3` — writes a four-component
/// vertex output parameter.
pub fn param(inst: &ShaderInstruction, ctx: &mut TranslationContext, param_index: u32) -> Result<String> {
    let mut out = String::new();
    let mut comps = Vec::with_capacity(4);
    for src in inst.srcs() {
        let c = ctx.next_index();
        out += &load_float(src, &c, &c, &mut ctx.consts)?;
        comps.push(c);
    }
    let v = ctx.next_index();
    out += &format!(
        "%{v} = OpCompositeConstruct %v4float %{a} %{b} %{c} %{d}\n",
        v = v,
        a = comps[0],
        b = comps[1],
        c = comps[2],
        d = comps[3]
    );
    out += &format!("OpStore %param{idx} %{v}\n", idx = param_index, v = v);
    Ok(out)
}

/// `Exp pos0, src0, src1, src2, src3 done` — writes `gl_Position`.
pub fn pos0(inst: &ShaderInstruction, ctx: &mut TranslationContext) -> Result<String> {
    let mut out = String::new();
    let mut comps = Vec::with_capacity(4);
    for src in inst.srcs() {
        let c = ctx.next_index();
        out += &load_float(src, &c, &c, &mut ctx.consts)?;
        comps.push(c);
    }
    let v = ctx.next_index();
    out += &format!(
        "%{v} = OpCompositeConstruct %v4float %{a} %{b} %{c} %{d}\n",
        v = v,
        a = comps[0],
        b = comps[1],
        c = comps[2],
        d = comps[3]
    );
    out += &format!("OpStore %gl_Position %{}\n", v);
    Ok(out)
}
