//! Per-stage input bundle threaded through body emission and rule dispatch.
use crate::error::{Error, Result};
use crate::input::{ComputeInputInfo, PixelInputInfo, ShaderResources, VertexInputInfo};
use crate::model::ShaderType;

pub enum StageInfo<'a> {
    Vertex(&'a VertexInputInfo),
    Pixel(&'a PixelInputInfo),
    Compute(&'a ComputeInputInfo),
}

pub struct TranslationInputs<'a> {
    pub stage: StageInfo<'a>,
    pub resources: &'a ShaderResources,
}

impl<'a> TranslationInputs<'a> {
    pub fn vertex(&self) -> Option<&'a VertexInputInfo> {
        match self.stage {
            StageInfo::Vertex(v) => Some(v),
            _ => None,
        }
    }
    pub fn pixel(&self) -> Option<&'a PixelInputInfo> {
        match self.stage {
            StageInfo::Pixel(p) => Some(p),
            _ => None,
        }
    }
    pub fn compute(&self) -> Option<&'a ComputeInputInfo> {
        match self.stage {
            StageInfo::Compute(c) => Some(c),
            _ => None,
        }
    }
}

/// Validates that exactly one stage-info record was supplied and that it
/// matches `ty`, per the `InvalidStageCombination` error row.
pub fn resolve_stage<'a>(
    ty: ShaderType,
    vs_info: Option<&'a VertexInputInfo>,
    ps_info: Option<&'a PixelInputInfo>,
    cs_info: Option<&'a ComputeInputInfo>,
    resources: &'a ShaderResources,
) -> Result<TranslationInputs<'a>> {
    let supplied = [vs_info.is_some(), ps_info.is_some(), cs_info.is_some()].iter().filter(|x| **x).count();
    if supplied != 1 {
        return Err(Error::InvalidStageCombination {
            reason: format!("exactly one stage info record must be supplied, got {}", supplied),
        }
        .logged());
    }
    let stage = match (ty, vs_info, ps_info, cs_info) {
        (ShaderType::Vertex, Some(v), None, None) => StageInfo::Vertex(v),
        (ShaderType::Pixel, None, Some(p), None) => StageInfo::Pixel(p),
        (ShaderType::Compute, None, None, Some(c)) => StageInfo::Compute(c),
        _ => {
            return Err(Error::InvalidStageCombination {
                reason: format!("shader type {:?} does not match the supplied stage info", ty),
            }
            .logged())
        }
    };
    Ok(TranslationInputs { stage, resources })
}
