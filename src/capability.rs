//! Catalog of the Aidge operations this crate knows how to drive.
//!
//! Payloads and results stay opaque JSON; a capability only records where to
//! submit, whether the call is asynchronous, and how to ask for its status.

use std::fmt;
use std::time::Duration;

use crate::poll::StatusEndpoint;

/// An Aidge operation with a known submit path and completion model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `/ai/image/cut/out`, answered in one call.
    BackgroundRemoval,
    /// `/ai/text/marco/translator`, answered in one call.
    TextTranslation,
    /// `/ai/image/removal`, answered in one call.
    ImageElementsRemoval,
    /// `/ai/virtual/tryon`, polled with a snake-case `task_id`.
    VirtualTryOn,
    /// `/ai/virtual/tryon-pro`, polled on the same results path as try-on.
    VirtualTryOnPro,
    /// `/ai/image/translation_mllm/batch`, polled with a GET query.
    ImageTranslationPro,
    /// `/ai/hand-foot/repair`, polled with a JSON `taskId`.
    HandFootRepair,
}

impl Capability {
    /// Every capability, in catalog order.
    pub const ALL: [Capability; 7] = [
        Capability::BackgroundRemoval,
        Capability::TextTranslation,
        Capability::ImageElementsRemoval,
        Capability::VirtualTryOn,
        Capability::VirtualTryOnPro,
        Capability::ImageTranslationPro,
        Capability::HandFootRepair,
    ];

    /// Operation path the payload is POSTed to.
    pub fn submit_path(self) -> &'static str {
        match self {
            Capability::BackgroundRemoval => "/ai/image/cut/out",
            Capability::TextTranslation => "/ai/text/marco/translator",
            Capability::ImageElementsRemoval => "/ai/image/removal",
            Capability::VirtualTryOn => "/ai/virtual/tryon",
            Capability::VirtualTryOnPro => "/ai/virtual/tryon-pro",
            Capability::ImageTranslationPro => "/ai/image/translation_mllm/batch",
            Capability::HandFootRepair => "/ai/hand-foot/repair",
        }
    }

    /// Status endpoint for asynchronous capabilities, `None` when the submit
    /// response already carries the result.
    pub fn status_endpoint(self) -> Option<StatusEndpoint> {
        match self {
            Capability::BackgroundRemoval
            | Capability::TextTranslation
            | Capability::ImageElementsRemoval => None,
            Capability::VirtualTryOn | Capability::VirtualTryOnPro => {
                Some(StatusEndpoint::post_snake("/ai/virtual/tryon-results"))
            }
            Capability::ImageTranslationPro => {
                Some(StatusEndpoint::get("/ai/image/translation_mllm/results"))
            }
            Capability::HandFootRepair => {
                Some(StatusEndpoint::post("/ai/hand-foot/repair-results"))
            }
        }
    }

    /// True when the submit call returns a task id to poll.
    pub fn is_async(self) -> bool {
        self.status_endpoint().is_some()
    }

    /// Wait between status checks.
    pub fn poll_interval(self) -> Duration {
        match self {
            Capability::ImageTranslationPro | Capability::HandFootRepair => Duration::from_secs(5),
            _ => Duration::from_secs(1),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::BackgroundRemoval => "background-removal",
            Capability::TextTranslation => "text-translation",
            Capability::ImageElementsRemoval => "image-elements-removal",
            Capability::VirtualTryOn => "virtual-try-on",
            Capability::VirtualTryOnPro => "virtual-try-on-pro",
            Capability::ImageTranslationPro => "image-translation-pro",
            Capability::HandFootRepair => "hand-foot-repair",
        };
        f.write_str(name)
    }
}
