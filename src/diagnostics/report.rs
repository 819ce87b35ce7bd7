use super::TimingBreakdown;
use crate::types::RegionInfo;
use serde::{Deserialize, Serialize};

/// Size of the analysed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
}

/// How one frame went through the pipeline.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTrace {
    pub input: InputDescriptor,
    /// Binarisation level used, reusable for later frames.
    pub threshold: Option<u8>,
    /// Cues found by region isolation (contact-angle mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<RegionInfo>,
    pub timings: TimingBreakdown,
}

impl FrameTrace {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            input: InputDescriptor {
                width: width as usize,
                height: height as usize,
            },
            ..Default::default()
        }
    }
}
