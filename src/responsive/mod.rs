//! Responsive image attributes
//!
//! Turns one image request into `src`, `srcset` and `sizes`. The candidate
//! widths depend on what the caller knows about the layout:
//!
//! | Request | Strategy | Candidates | Descriptor |
//! |---|---|---|---|
//! | `sizes` with a `vw` unit | full range | device breakpoints | `640w` |
//! | `sizes` without `vw` | pixel sizes | image ∪ device breakpoints | `640w` |
//! | `width`, no `sizes` | density | 1x and 2x breakpoints | `1x` |
//! | neither | full range | device breakpoints, `sizes="100vw"` | `640w` |
//!
//! Every candidate URL ends with a `{width: N, crop: "at_max"}` step so the CDN
//! never upscales past the source resolution.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::error::{ImageKitError, Result};
use crate::transformation::TransformationStep;
use crate::url::{SrcOptions, UrlBuilder};

pub const DEFAULT_DEVICE_BREAKPOINTS: &[u32] = &[640, 750, 828, 1080, 1200, 1920, 2048, 3840];
pub const DEFAULT_IMAGE_BREAKPOINTS: &[u32] = &[16, 32, 48, 64, 96, 128, 256, 384];

/// `sizes` value used when the caller gives neither width nor sizes
pub const DEFAULT_SIZES: &str = "100vw";

/// One responsive image request
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsiveRequest {
    pub src: SrcOptions,
    /// Intended display width in CSS pixels
    pub width: Option<u32>,
    /// Caller-supplied `sizes` attribute
    pub sizes: Option<String>,
    pub device_breakpoints: Vec<u32>,
    pub image_breakpoints: Vec<u32>,
}

impl ResponsiveRequest {
    /// Request with the default breakpoint sets
    pub fn new(src: SrcOptions) -> Self {
        Self {
            src,
            width: None,
            sizes: None,
            device_breakpoints: DEFAULT_DEVICE_BREAKPOINTS.to_vec(),
            image_breakpoints: DEFAULT_IMAGE_BREAKPOINTS.to_vec(),
        }
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn sizes(mut self, sizes: impl Into<String>) -> Self {
        self.sizes = Some(sizes.into());
        self
    }

    pub fn device_breakpoints(mut self, breakpoints: impl Into<Vec<u32>>) -> Self {
        self.device_breakpoints = breakpoints.into();
        self
    }

    pub fn image_breakpoints(mut self, breakpoints: impl Into<Vec<u32>>) -> Self {
        self.image_breakpoints = breakpoints.into();
        self
    }
}

/// Output attributes, ready to copy onto an `<img>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsiveResult {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
}

/// How candidate widths were chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Every device breakpoint, width descriptors
    FullRange,
    /// Union of image and device breakpoints, width descriptors
    PixelSizes,
    /// 1x/2x pair around the requested width
    Density,
}

/// `srcset` descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    Width(u32),
    Density(u8),
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Width(w) => write!(f, "{}w", w),
            Descriptor::Density(x) => write!(f, "{}x", x),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub width: u32,
    pub descriptor: Descriptor,
}

/// Result of the strategy decision, before any URL is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    pub strategy: Strategy,
    pub candidates: Vec<Candidate>,
    pub sizes: Option<String>,
}

/// Sort ascending, drop duplicates and zero widths
pub fn normalize_breakpoints(breakpoints: &[u32]) -> Vec<u32> {
    let mut result: Vec<u32> = breakpoints.iter().copied().filter(|&w| w > 0).collect();
    result.sort_unstable();
    result.dedup();
    result
}

fn viewport_unit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[\s(,])(?:\d+(?:\.\d+)?|\.\d+)vw\b")
            .expect("viewport unit pattern is valid")
    })
}

/// True when a `sizes` attribute contains a viewport-relative length like `50vw`
pub fn has_viewport_unit(sizes: &str) -> bool {
    viewport_unit_regex().is_match(sizes)
}

fn width_candidates(widths: &[u32]) -> Vec<Candidate> {
    widths
        .iter()
        .map(|&width| Candidate {
            width,
            descriptor: Descriptor::Width(width),
        })
        .collect()
}

/// Pick the 1x/2x pair for a requested width
///
/// 1x is the greatest breakpoint not exceeding `width` (the smallest one when
/// every breakpoint is larger); 2x is the next breakpoint up, or the largest.
/// A width exactly on a breakpoint takes that breakpoint as 1x.
fn density_candidates(width: u32, breakpoints: &[u32]) -> Vec<Candidate> {
    let one_x = breakpoints.iter().rposition(|&b| b <= width).unwrap_or(0);
    let two_x = (one_x + 1).min(breakpoints.len().saturating_sub(1));

    let mut candidates = vec![Candidate {
        width: breakpoints[one_x],
        descriptor: Descriptor::Density(1),
    }];
    if two_x != one_x {
        candidates.push(Candidate {
            width: breakpoints[two_x],
            descriptor: Descriptor::Density(2),
        });
    }
    candidates
}

/// Decide which widths to generate for a request
pub fn select_candidates(request: &ResponsiveRequest) -> Result<CandidateSet> {
    let device = normalize_breakpoints(&request.device_breakpoints);
    let image = normalize_breakpoints(&request.image_breakpoints);

    if device.is_empty() && image.is_empty() {
        return Err(ImageKitError::invalid_input(
            "breakpoints",
            "device and image breakpoints are both empty",
        ));
    }
    if request.width == Some(0) {
        return Err(ImageKitError::invalid_input("width", "must be greater than 0"));
    }

    // Device-based strategies fall back to image breakpoints when no device set is configured
    let device_or_image = if device.is_empty() { &image } else { &device };
    let sizes = request
        .sizes
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let set = match (request.width, sizes) {
        (_, Some(sizes)) if has_viewport_unit(sizes) => CandidateSet {
            strategy: Strategy::FullRange,
            candidates: width_candidates(device_or_image),
            sizes: Some(sizes.to_string()),
        },
        (_, Some(sizes)) => {
            let mut all = image.clone();
            all.extend_from_slice(&device);
            CandidateSet {
                strategy: Strategy::PixelSizes,
                candidates: width_candidates(&normalize_breakpoints(&all)),
                sizes: Some(sizes.to_string()),
            }
        }
        (Some(width), None) => CandidateSet {
            strategy: Strategy::Density,
            candidates: density_candidates(width, device_or_image),
            sizes: None,
        },
        (None, None) => CandidateSet {
            strategy: Strategy::FullRange,
            candidates: width_candidates(device_or_image),
            sizes: Some(DEFAULT_SIZES.to_string()),
        },
    };

    tracing::debug!(
        strategy = ?set.strategy,
        candidates = set.candidates.len(),
        width = ?request.width,
        "Selected responsive candidates"
    );

    Ok(set)
}

fn at_max_step(width: u32) -> TransformationStep {
    TransformationStep::new()
        .with("width", width)
        .with("crop", "at_max")
}

/// Generate responsive attributes, reading the wall clock for signed URLs
pub fn generate(builder: &UrlBuilder, request: &ResponsiveRequest) -> Result<ResponsiveResult> {
    generate_at(builder, request, Utc::now())
}

/// Generate responsive attributes with an explicit clock reading
pub fn generate_at(
    builder: &UrlBuilder,
    request: &ResponsiveRequest,
    now: DateTime<Utc>,
) -> Result<ResponsiveResult> {
    let CandidateSet {
        candidates, sizes, ..
    } = select_candidates(request)?;

    let largest = candidates
        .iter()
        .map(|c| c.width)
        .max()
        .ok_or_else(|| ImageKitError::invalid_input("breakpoints", "no candidate widths"))?;

    let src = builder.build_at(&request.src.with_trailing_step(at_max_step(largest)), now)?;

    let src_set = if candidates.len() > 1 {
        let entries = candidates
            .iter()
            .map(|c| {
                let url =
                    builder.build_at(&request.src.with_trailing_step(at_max_step(c.width)), now)?;
                Ok(format!("{} {}", url, c.descriptor))
            })
            .collect::<Result<Vec<_>>>()?;
        Some(entries.join(", "))
    } else {
        None
    };

    Ok(ResponsiveResult {
        src,
        src_set,
        sizes,
    })
}
