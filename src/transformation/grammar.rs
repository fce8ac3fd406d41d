//! ImageKit transformation token grammar
//!
//! Maps readable parameter names to the short codes the CDN understands.
//! Table order is the order tokens are emitted within one step, so a step
//! built as `{width, height}` still serializes as `h-..,w-..`.

/// How a boolean value is rendered for a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `true` → `pr-true`, `false` → `pr-false`
    Valued,
    /// `true` → bare code (`e-grayscale`), `false` → omitted
    Flag,
}

/// One row of the grammar table
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub code: &'static str,
    pub kind: ParamKind,
}

const fn valued(name: &'static str, code: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        code,
        kind: ParamKind::Valued,
    }
}

const fn flag(name: &'static str, code: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        code,
        kind: ParamKind::Flag,
    }
}

/// Key whose value is appended verbatim
pub const RAW: &str = "raw";

/// Layer kinds accepted under strict validation
pub const LAYER_KINDS: &[&str] = &["image", "text", "video", "subtitles", "solid"];

pub const PARAMS: &[ParamSpec] = &[
    valued("height", "h"),
    valued("width", "w"),
    valued("aspect_ratio", "ar"),
    valued("quality", "q"),
    valued("crop", "c"),
    valued("crop_mode", "cm"),
    valued("x", "x"),
    valued("y", "y"),
    valued("x_center", "xc"),
    valued("y_center", "yc"),
    valued("focus", "fo"),
    valued("zoom", "z"),
    valued("format", "f"),
    valued("radius", "r"),
    valued("background", "bg"),
    valued("border", "b"),
    valued("rotation", "rt"),
    valued("blur", "bl"),
    valued("named", "n"),
    valued("opacity", "o"),
    valued("progressive", "pr"),
    valued("lossless", "lo"),
    valued("trim", "t"),
    valued("metadata", "md"),
    valued("color_profile", "cp"),
    valued("default_image", "di"),
    valued("dpr", "dpr"),
    flag("effect_sharpen", "e-sharpen"),
    flag("effect_usm", "e-usm"),
    flag("effect_contrast", "e-contrast"),
    flag("effect_gray", "e-grayscale"),
    flag("effect_shadow", "e-shadow"),
    flag("effect_gradient", "e-gradient"),
    valued("original", "orig"),
    valued("input", "i"),
    valued(RAW, RAW),
];

/// Look up a parameter by readable name or by its short code.
///
/// Returns the emission rank alongside the table row.
pub fn lookup(key: &str) -> Option<(usize, &'static ParamSpec)> {
    PARAMS
        .iter()
        .enumerate()
        .find(|(_, spec)| spec.name == key || spec.code == key)
}
