//! Image sample rule family (`ImageSample`).
use crate::context::TranslationContext;
use crate::error::Result;
use crate::loader::load_float;
use crate::model::ShaderInstruction;
use crate::operand::variable_name;

/// `ImageSample vdata, vaddr, t[...], s[...], dmask` — samples a bound
/// 2D texture/sampler pair at `(u, v)` taken from `vaddr`/`vaddr+1`,
/// writing up to four components into `dst..dst+popcount(dmask)-1`.
pub fn image_sample(inst: &ShaderInstruction, ctx: &mut TranslationContext, dmask: u32) -> Result<String> {
    let mut out = String::new();
    let u = ctx.next_index();
    out += &load_float(&inst.src[0], &u, &u, &mut ctx.consts)?;
    let v = ctx.next_index();
    out += &load_float(&inst.src[1], &v, &v, &mut ctx.consts)?;
    let coord = ctx.next_index();
    out += &format!("%{c} = OpCompositeConstruct %v2float %{u} %{v}\n", c = coord, u = u, v = v);
    let sampled_image = ctx.next_index();
    out += &format!(
        "%{si} = OpSampledImage %sampled_image_2d %texture_res_{tslot} %sampler_res_{sslot}\n",
        si = sampled_image,
        tslot = inst.src[2].register_id,
        sslot = inst.src[3].register_id
    );
    let sample = ctx.next_index();
    out += &format!(
        "%{s} = OpImageSampleImplicitLod %v4float %{si} %{c}\n",
        s = sample,
        si = sampled_image,
        c = coord
    );
    let mut written = 0u32;
    for lane in 0..4u32 {
        if dmask & (1 << lane) == 0 {
            continue;
        }
        let comp = ctx.next_index();
        out += &format!(
            "%{comp} = OpCompositeExtract %float %{s} {lane}\n",
            comp = comp,
            s = sample,
            lane = lane
        );
        let (name, _) = variable_name(&inst.dst, written);
        out += &format!("OpStore %{} %{}\n", name, comp);
        written += 1;
    }
    Ok(out)
}
