// ImageKit URL and responsive attribute library
//
// Pure, synchronous builders: transformation chain → URL, and
// request → src/srcset/sizes. Configuration is an explicit snapshot.

pub mod config;
pub mod error;
pub mod logging;
pub mod reload;
pub mod responsive;
pub mod transformation;
pub mod url;

pub use config::Config;
pub use error::{ImageKitError, Result};
pub use reload::ConfigHandle;
pub use responsive::{generate, generate_at, ResponsiveRequest, ResponsiveResult};
pub use transformation::{Position, TransformationPolicy, TransformationStep, Value};
pub use url::{SrcOptions, UrlBuilder, UrlSigner};
