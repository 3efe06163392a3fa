//! Per-invocation translation context.
//!
//! Owns everything a single [`crate::generate`] call mutates: the constant
//! and variable pools, the monotonic SSA id counter, and the extended
//! push-constant mapping table consulted by `SLoadDwordx*`. Never shared
//! across invocations — two concurrent translations each get their own,
//! which is what makes the recompiler's "no shared mutable state" guarantee
//! trivially true.
use crate::config::GenerateConfig;
use crate::pool::{ConstantPool, VariablePool};

/// Number of push-constant slot rows the extended mapping table covers.
/// Matches the original collaborator's fixed `64` row table.
const EXTENDED_MAPPING_ROWS: usize = 64;

pub struct TranslationContext {
    pub consts: ConstantPool,
    pub vars: VariablePool,
    pub config: GenerateConfig,
    next_id: u32,
    /// `extended_mapping[row] = Some((buffer, field))` once the resource at
    /// that push-constant row has been assigned during main-prolog
    /// emission; consulted by `SLoadDwordx4`/`SLoadDwordx8`.
    extended_mapping: Vec<Option<(u32, u32)>>,
}

impl TranslationContext {
    pub fn new(config: GenerateConfig) -> Self {
        TranslationContext {
            consts: ConstantPool::new(),
            vars: VariablePool::new(),
            config,
            next_id: 0,
            extended_mapping: vec![None; EXTENDED_MAPPING_ROWS],
        }
    }

    /// Allocates the next SSA-uniqueness index, rendered ready for
    /// substitution into a rule's `<index>` placeholders.
    pub fn next_index(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    pub fn set_extended_mapping(&mut self, row: usize, buffer: u32, field: u32) {
        self.extended_mapping[row] = Some((buffer, field));
    }

    pub fn extended_mapping(&self, row: usize) -> Option<(u32, u32)> {
        self.extended_mapping.get(row).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_counter_is_monotonic_and_unique_per_call() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        let a = ctx.next_index();
        let b = ctx.next_index();
        assert_ne!(a, b);
    }

    #[test]
    fn extended_mapping_round_trips() {
        let mut ctx = TranslationContext::new(GenerateConfig::new());
        assert_eq!(ctx.extended_mapping(3), None);
        ctx.set_extended_mapping(3, 1, 2);
        assert_eq!(ctx.extended_mapping(3), Some((1, 2)));
    }
}
