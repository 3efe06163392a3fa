//! Scalar branch and program-control rule families.
use crate::context::TranslationContext;

/// `SCbranchScc0` — branches to `taken_label` when `scc == 0`, otherwise
/// falls through to `fallthrough_label`. Both labels are resolved by the
/// body emitter from the branch edge table before this rule is invoked.
pub fn cbranch_scc0(ctx: &mut TranslationContext, taken_label: &str, fallthrough_label: &str) -> String {
    let v = ctx.next_index();
    let cond = ctx.next_index();
    format!(
        "%{v} = OpLoad %uint %scc\n\
         %{cond} = OpIEqual %bool %{v} %uint_0\n\
         OpSelectionMerge %{f} None\n\
         OpBranchConditional %{cond} %{t} %{f}\n",
        v = v,
        cond = cond,
        t = taken_label,
        f = fallthrough_label
    )
}

/// `SCbranchExecz` — branches to `taken_label` when `execz == 1`.
pub fn cbranch_execz(ctx: &mut TranslationContext, taken_label: &str, fallthrough_label: &str) -> String {
    let v = ctx.next_index();
    let cond = ctx.next_index();
    format!(
        "%{v} = OpLoad %uint %execz\n\
         %{cond} = OpIEqual %bool %{v} %uint_1\n\
         OpSelectionMerge %{f} None\n\
         OpBranchConditional %{cond} %{t} %{f}\n",
        v = v,
        cond = cond,
        t = taken_label,
        f = fallthrough_label
    )
}

/// `SEndpgm` — a plain `OpReturn`, unless the immediately preceding
/// instruction was the kill-only `Exp` export (which already terminated
/// the block with `OpKill`), in which case nothing is appended: a block
/// may have only one terminator.
pub fn endpgm(prev_was_kill_export: bool) -> String {
    if prev_was_kill_export {
        String::new()
    } else {
        "OpReturn\n".to_owned()
    }
}

/// `SWaitcnt` — a wave-sync fence with no SPIR-V counterpart in a
/// single-invocation-per-thread compute model; emits nothing.
pub fn waitcnt() -> String {
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerateConfig;

    #[test]
    fn cbranch_scc0_branches_on_scc_equal_zero() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let text = cbranch_scc0(&mut ctx, "block_8", "block_4");
        assert!(text.contains("OpLoad %uint %scc"));
        assert!(text.contains("OpSelectionMerge %block_4 None"));
        assert!(text.contains("OpBranchConditional"));
        assert!(text.contains("%block_8"));
        assert!(text.contains("%block_4"));
    }

    #[test]
    fn cbranch_execz_branches_on_execz_equal_one() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let text = cbranch_execz(&mut ctx, "block_8", "block_4");
        assert!(text.contains("OpLoad %uint %execz"));
        assert!(text.contains("OpSelectionMerge %block_4 None"));
        assert!(text.contains("%uint_1"));
    }

    #[test]
    fn endpgm_emits_opreturn_unless_preceded_by_kill_export() {
        assert_eq!(endpgm(false), "OpReturn\n");
        assert_eq!(endpgm(true), "");
    }
}
