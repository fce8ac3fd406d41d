use clap::{Parser, Subcommand};
use imagekit_url::logging::{init_subscriber, LogFormat};
use imagekit_url::{
    responsive, Config, ImageKitError, Position, SrcOptions, TransformationStep,
};
use std::error::Error;
use std::path::{Path, PathBuf};

/// ikurl - build ImageKit URLs and responsive image attributes
#[derive(Parser, Debug)]
#[command(name = "ikurl")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to IMAGEKIT_* environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct SourceArgs {
    /// Image path under the endpoint, or an absolute source URL
    #[arg(long)]
    path: String,

    /// Transformation step such as `width=400,height=300`; repeat to chain
    #[arg(long = "tr")]
    transformations: Vec<TransformationStep>,

    /// Transformation placement (query or path); overrides the config
    #[arg(long)]
    position: Option<Position>,

    /// Extra query parameter as `key=value`; repeatable
    #[arg(long = "query", value_parser = parse_key_value)]
    query: Vec<(String, String)>,

    /// Sign the URL with the configured private key
    #[arg(long)]
    signed: bool,

    /// Signed URL lifetime in seconds (implies --signed)
    #[arg(long)]
    expire_seconds: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a single URL
    Url {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print src, srcSet and sizes
    Responsive {
        #[command(flatten)]
        source: SourceArgs,

        /// Intended display width in CSS pixels
        #[arg(long)]
        width: Option<u32>,

        /// `sizes` attribute, e.g. "(max-width: 800px) 100vw, 50vw"
        #[arg(long)]
        sizes: Option<String>,
    },
    /// Print responsive attributes when `responsive` is set in the config,
    /// otherwise a single URL
    Image {
        #[command(flatten)]
        source: SourceArgs,

        /// Intended display width in CSS pixels (responsive mode only)
        #[arg(long)]
        width: Option<u32>,

        /// `sizes` attribute (responsive mode only)
        #[arg(long)]
        sizes: Option<String>,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, ImageKitError> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn src_options(config: &Config, source: SourceArgs) -> SrcOptions {
    let mut options = config.src_options(source.path);
    if let Some(position) = source.position {
        options.position = position;
    }
    options.transformations = source.transformations;
    options.query_parameters = source.query;
    options.signed = source.signed;
    options.expire_seconds = source.expire_seconds;
    options
}

fn responsive_output(
    config: &Config,
    source: SourceArgs,
    width: Option<u32>,
    sizes: Option<String>,
) -> Result<serde_json::Value, Box<dyn Error>> {
    let mut request = config.responsive_request(src_options(config, source));
    request.width = width;
    request.sizes = sizes;
    Ok(serde_json::to_value(responsive::generate(
        &config.url_builder(),
        &request,
    )?)?)
}

fn url_output(config: &Config, source: SourceArgs) -> Result<serde_json::Value, Box<dyn Error>> {
    let url = config.url_builder().build(&src_options(config, source))?;
    Ok(serde_json::json!({ "url": url }))
}

fn run(config: &Config, command: Command) -> Result<String, Box<dyn Error>> {
    let output = match command {
        Command::Url { source } => url_output(config, source)?,
        Command::Responsive {
            source,
            width,
            sizes,
        } => responsive_output(config, source, width, sizes)?,
        Command::Image {
            source,
            width,
            sizes,
        } => {
            if config.responsive {
                responsive_output(config, source, width, sizes)?
            } else {
                if width.is_some() || sizes.is_some() {
                    tracing::debug!("responsive disabled in config, ignoring --width/--sizes");
                }
                url_output(config, source)?
            }
        }
    };

    Ok(serde_json::to_string_pretty(&output)?)
}

fn main() {
    let args = Args::parse();

    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_subscriber(format).expect("Failed to initialize logging subsystem");

    let config = load_config(args.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    tracing::debug!(
        config_file = ?args.config,
        url_endpoint = %config.url_endpoint,
        position = ?config.transformation_position,
        signing_enabled = config.private_key.is_some(),
        "Configuration loaded successfully"
    );

    match run(&config, args.command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
