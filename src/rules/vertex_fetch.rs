//! Vertex fetch thunk expansion (family 19, `SSwappcB64`).
//!
//! Grounded on the original collaborator's inline vertex-fetch-thunk
//! template: each bound attribute is loaded from its `attr<n>` input,
//! staged through a fixed-name temporary of matching vector width, and
//! handed to the matching `fetch_f1_f1_vf<n>_` support function (emitted
//! conditionally by the support-function emitter) which writes the result
//! into the destination VGPR range.
use crate::context::TranslationContext;
use crate::input::FetchResource;

fn vec_type_and_fetch_fn(registers_num: u32) -> (&'static str, &'static str) {
    match registers_num {
        1 => ("float", "fetch_f1_f1_vf1_"),
        2 => ("v2float", "fetch_f1_f1_vf2_"),
        3 => ("v3float", "fetch_f1_f1_vf3_"),
        _ => ("v4float", "fetch_f1_f1_vf4_"),
    }
}

/// Expands one bound vertex-attribute fetch into the destination VGPR
/// range named by `resource.register_start..+registers_num`.
pub fn expand(ctx: &mut TranslationContext, resource: &FetchResource) -> String {
    let registers_num = resource.registers_num.clamp(1, 4);
    let idx = ctx.next_index();
    let attr = format!("attr{}", resource.attr_index);
    let (vec_ty, fetch_fn) = vec_type_and_fetch_fn(registers_num);
    let dests: Vec<String> = (0..registers_num).map(|i| format!("%v{}", resource.register_start + i)).collect();
    format!(
        "%t1_{idx} = OpLoad %{ty} %{attr}\n\
         OpStore %temp_{ty} %t1_{idx}\n\
         %t2_{idx} = OpFunctionCall %void %{fetch_fn} {dests} %temp_{ty}\n",
        idx = idx,
        ty = vec_ty,
        attr = attr,
        fetch_fn = fetch_fn,
        dests = dests.join(" ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerateConfig;

    #[test]
    fn expand_picks_the_fetch_function_matching_register_width() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let resource = FetchResource { register_start: 4, registers_num: 3, attr_index: 1 };
        let text = expand(&mut ctx, &resource);
        assert!(text.contains("attr1"));
        assert!(text.contains("fetch_f1_f1_vf3_"));
        assert!(text.contains("%v4 %v5 %v6"));
    }

    #[test]
    fn expand_clamps_registers_num_to_four() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let resource = FetchResource { register_start: 0, registers_num: 9, attr_index: 0 };
        let text = expand(&mut ctx, &resource);
        assert!(text.contains("fetch_f1_f1_vf4_"));
        assert!(text.contains("%v0 %v1 %v2 %v3"));
    }
}
