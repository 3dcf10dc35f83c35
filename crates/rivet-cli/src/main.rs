//! # Rivet CLI Entry Point
//!
//! Main binary for the Rivet RPC compiler.
//!
//! ## Usage
//!
//! ```bash
//! # Generate Rust sources for every service in a descriptor
//! rivet generate --schema api/echo.json --out src/gen
//!
//! # List the routes a descriptor defines
//! rivet routes --schema api/echo.json
//!
//! # Make an RPC call (outputs raw JSON)
//! rivet call http://127.0.0.1:8080 /demo.v1.Echo/Echo -a '{"msg": "hi"}'
//! ```
//!
//! `--out` and `--option-prefix` fall back to `RIVET_OUT_DIR` and
//! `RIVET_OPTION_PREFIX`.

use anyhow::Result;
use argh::FromArgs;
use rivet_cli::commands;
use rivet_codegen::GeneratorConfig;
use std::path::PathBuf;

#[derive(FromArgs)]
/// Rivet - RPC interface compiler
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Generate(GenerateArgs),
    Routes(RoutesArgs),
    Call(CallArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "generate")]
/// generate Rust sources from a service descriptor
struct GenerateArgs {
    /// path to the JSON service descriptor
    #[argh(option, short = 's')]
    schema: String,

    /// output directory (falls back to RIVET_OUT_DIR)
    #[argh(option, short = 'o')]
    out: Option<String>,

    /// prefix of the method option tag in trailing comments
    /// (falls back to RIVET_OPTION_PREFIX, default "rivet")
    #[argh(option, long = "option-prefix")]
    option_prefix: Option<String>,

    /// do not generate validators
    #[argh(switch, long = "no-validate")]
    no_validate: bool,

    /// skip unknown validation rules with a warning instead of failing
    #[argh(switch, long = "lenient-rules")]
    lenient_rules: bool,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "routes")]
/// list the routes defined by a service descriptor
struct RoutesArgs {
    /// path to the JSON service descriptor
    #[argh(option, short = 's')]
    schema: String,

    /// prefix of the method option tag in trailing comments
    #[argh(option, long = "option-prefix")]
    option_prefix: Option<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// make a JSON RPC call (outputs raw JSON)
struct CallArgs {
    /// server base URL (must include http:// or https://)
    #[argh(positional)]
    server_address: String,

    /// route path, e.g. /demo.v1.Echo/Echo
    #[argh(positional)]
    path: String,

    /// JSON request body
    #[argh(option, short = 'a', long = "args", default = "\"{}\".into()")]
    args: String,

    /// request header as name:value (repeatable)
    #[argh(option, short = 'H', long = "header")]
    headers: Vec<String>,

    /// request timeout in milliseconds
    #[argh(option, long = "timeout-ms", default = "30000")]
    timeout_ms: u64,
}

fn generator_config(option_prefix: Option<String>) -> GeneratorConfig {
    match commands::resolve_option_prefix(option_prefix) {
        Some(prefix) => GeneratorConfig::new().with_option_prefix(prefix),
        None => GeneratorConfig::new(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // call keeps stdout clean for piping into other tools.
    if !matches!(cli.command, Commands::Call(_)) {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .init();
    }

    match cli.command {
        Commands::Generate(args) => {
            let out_dir = commands::resolve_out_dir(args.out)?;
            let config = generator_config(args.option_prefix)
                .with_validation(!args.no_validate)
                .with_strict_rules(!args.lenient_rules);

            tracing::info!("Generating {} into {}", args.schema, out_dir.display());
            commands::generate(&PathBuf::from(&args.schema), &out_dir, config)?;
            Ok(())
        }
        Commands::Routes(args) => {
            let config = generator_config(args.option_prefix);
            for line in commands::routes(&PathBuf::from(&args.schema), &config)? {
                println!("{}", line);
            }
            Ok(())
        }
        Commands::Call(args) => {
            let result = commands::call(
                &args.server_address,
                &args.path,
                &args.args,
                &args.headers,
                args.timeout_ms,
            )
            .await?;

            println!("{}", serde_json::to_string(&result)?);
            Ok(())
        }
    }
}
