//! Translation configuration builder.
//!
//! Mirrors the shape of a reflection-config builder: a small set of
//! optional knobs collected before the call, none of which may change the
//! observable computation (see testable property 12 in the recompiler
//! specification) — only what gets emitted alongside it for diagnostics.

/// Generation configuration builder.
#[derive(Clone)]
pub struct GenerateConfig {
    pub(crate) emit_disassembly_comments: bool,
    pub(crate) target_env: &'static str,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        GenerateConfig {
            emit_disassembly_comments: false,
            target_env: "SPV_ENV_VULKAN_1_0",
        }
    }
}

impl GenerateConfig {
    pub fn new() -> Self {
        Default::default()
    }

    /// Emit a `; <disassembly>` comment line before the SPIR-V emitted for
    /// each source instruction. Never changes the instructions themselves.
    pub fn emit_disassembly_comments(&mut self, x: bool) -> &mut Self {
        self.emit_disassembly_comments = x;
        self
    }

    /// Target SPIR-V environment recorded in the header comment. Does not
    /// change capability or version declarations, which are fixed by the
    /// header emitter.
    pub fn target_env(&mut self, x: &'static str) -> &mut Self {
        self.target_env = x;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_bare_generate_behavior() {
        let cfg = GenerateConfig::new();
        assert!(!cfg.emit_disassembly_comments);
        assert_eq!(cfg.target_env, "SPV_ENV_VULKAN_1_0");
    }
}
