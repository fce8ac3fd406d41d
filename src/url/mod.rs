//! URL builder
//!
//! Serializes a [`SrcOptions`] into a single ImageKit URL. Two placements are
//! supported:
//!
//! ## Query
//! ```text
//! https://ik.imagekit.io/acct/image.jpg?tr=h-300,w-400
//! ```
//!
//! ## Path
//! ```text
//! https://ik.imagekit.io/acct/tr:h-300,w-400/image.jpg
//! ```
//!
//! Absolute source URLs always use query placement. Query parameters are
//! emitted in a fixed order: the source URL's own query, caller parameters,
//! `tr`, then `ik-t` and `ik-s` when signing. A `#fragment` on the source
//! is moved back to the very end and is not part of the signed string.

pub mod signing;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{ImageKitError, Result};
use crate::transformation::{serialize_chain, Position, TransformationPolicy, TransformationStep};
pub use signing::{HmacSha1Signer, UrlSigner, DEFAULT_EXPIRY};

/// Everything needed to build one URL
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SrcOptions {
    /// Relative path under the endpoint, or an absolute source URL
    pub path: String,
    pub url_endpoint: String,
    pub transformations: Vec<TransformationStep>,
    pub position: Position,
    /// Extra query parameters, emitted in insertion order
    pub query_parameters: Vec<(String, String)>,
    pub signed: bool,
    /// Signed URL lifetime; implies signing
    pub expire_seconds: Option<u64>,
}

impl SrcOptions {
    pub fn new(path: impl Into<String>, url_endpoint: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url_endpoint: url_endpoint.into(),
            ..Default::default()
        }
    }

    pub fn transformation(mut self, step: TransformationStep) -> Self {
        self.transformations.push(step);
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_parameters.push((key.into(), value.into()));
        self
    }

    pub fn signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    pub fn expire_seconds(mut self, seconds: u64) -> Self {
        self.expire_seconds = Some(seconds);
        self
    }

    /// Same options with one more step at the end of the chain
    pub fn with_trailing_step(&self, step: TransformationStep) -> Self {
        let mut options = self.clone();
        options.transformations.push(step);
        options
    }

    fn wants_signature(&self) -> bool {
        self.signed || self.expire_seconds.is_some()
    }
}

/// Check for an RFC 3986 scheme (`https://`) or a protocol-relative `//host`
pub fn is_absolute_url(path: &str) -> bool {
    if path.starts_with("//") {
        return true;
    }

    match path.split_once("://") {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Stateless URL builder
///
/// Holds only the signer and the validation policy, so one instance can be
/// shared freely across threads.
#[derive(Debug, Clone, Default)]
pub struct UrlBuilder {
    signer: Option<Arc<dyn UrlSigner>>,
    policy: TransformationPolicy,
}

impl UrlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder that signs with HMAC-SHA1 over the given private key
    pub fn with_private_key(private_key: impl Into<Vec<u8>>) -> Self {
        Self::new().signer(Arc::new(HmacSha1Signer::new(private_key)))
    }

    pub fn signer(mut self, signer: Arc<dyn UrlSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn policy(mut self, policy: TransformationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn transformation_policy(&self) -> TransformationPolicy {
        self.policy
    }

    /// Build a URL, reading the wall clock for signed URL expiry
    pub fn build(&self, options: &SrcOptions) -> Result<String> {
        self.build_at(options, Utc::now())
    }

    /// Build a URL with an explicit clock reading
    pub fn build_at(&self, options: &SrcOptions, now: DateTime<Utc>) -> Result<String> {
        let path = options.path.trim();
        if path.is_empty() {
            return Err(ImageKitError::invalid_input("path", "must not be empty"));
        }

        let tr = serialize_chain(&options.transformations, self.policy)?;
        let absolute = is_absolute_url(path);
        let position = if absolute {
            Position::Query
        } else {
            options.position
        };

        if absolute && options.position == Position::Path {
            tracing::debug!(
                path = %path,
                "Absolute source URL, placing transformations in query"
            );
        }

        let endpoint = options.url_endpoint.trim().trim_end_matches('/');
        let (source, existing_query, fragment) = split_source(path);
        let mut query: Vec<String> = existing_query
            .map(|existing| {
                existing
                    .split('&')
                    .filter(|pair| !pair.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let base = if absolute {
            source.to_string()
        } else {
            if endpoint.is_empty() {
                return Err(ImageKitError::invalid_input(
                    "url_endpoint",
                    "required for relative paths",
                ));
            }
            let relative = source.trim_start_matches('/');
            if position == Position::Path && !tr.is_empty() {
                format!("{}/tr:{}/{}", endpoint, tr, relative)
            } else {
                format!("{}/{}", endpoint, relative)
            }
        };

        for (key, value) in &options.query_parameters {
            query.push(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ));
        }

        if position == Position::Query && !tr.is_empty() {
            query.push(format!("tr={}", tr));
        }

        let mut url = join_query(&base, &query);

        if options.wants_signature() {
            let signer = self.signer.as_ref().ok_or_else(|| {
                ImageKitError::invalid_input(
                    "private_key",
                    "signing requested but no private key configured",
                )
            })?;

            let expiry = match options.expire_seconds {
                Some(seconds) => (now.timestamp().max(0) as u64).saturating_add(seconds),
                None => DEFAULT_EXPIRY,
            };

            let canonical = canonical_url(&url, endpoint);
            let signature = signer.sign(canonical, expiry);

            if options.expire_seconds.is_some() {
                query.push(format!("ik-t={}", expiry));
            }
            query.push(format!("ik-s={}", signature));
            url = join_query(&base, &query);
        }

        if let Some(fragment) = fragment {
            url.push('#');
            url.push_str(fragment);
        }

        tracing::debug!(
            path = %path,
            position = ?position,
            transformations = options.transformations.len(),
            signed = options.wants_signature(),
            "Built ImageKit URL"
        );

        Ok(url)
    }
}

/// Split a source into `(path, query, fragment)`; the fragment never reaches the CDN
fn split_source(source: &str) -> (&str, Option<&str>, Option<&str>) {
    let (rest, fragment) = match source.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (source, None),
    };
    match rest.split_once('?') {
        Some((path, query)) => (path, Some(query), fragment),
        None => (rest, None, fragment),
    }
}

fn join_query(base: &str, query: &[String]) -> String {
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, query.join("&"))
    }
}

/// Strip the endpoint so signatures do not depend on which endpoint alias served them
fn canonical_url<'a>(url: &'a str, endpoint: &str) -> &'a str {
    if endpoint.is_empty() {
        return url;
    }
    // Only a whole `endpoint/` prefix counts; `endpointX/...` is a different path
    url.strip_prefix(endpoint)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(url)
}
