mod commands;
mod config;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_DESCRIPTION_ERROR, EXIT_EXPORT_ERROR, EXIT_FAILURE};
use config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use sysdesc_core::RendererRegistry;

#[derive(Debug, Parser)]
#[command(
    name = "sysdesc",
    version,
    about = "Compare system descriptions and export them as installation profiles"
)]
struct Cli {
    /// Directory holding system descriptions (default: ~/.local/share/sysdesc).
    #[arg(long, global = true)]
    store: Option<String>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the contents of a system description.
    Show {
        /// Description name.
        name: String,
        /// Only show these scopes (repeatable).
        #[arg(short, long = "scope")]
        scopes: Vec<String>,
    },
    /// Compare two system descriptions scope by scope.
    Compare {
        /// First description.
        name_a: String,
        /// Second description.
        name_b: String,
        /// Only compare these scopes (repeatable).
        #[arg(short, long = "scope")]
        scopes: Vec<String>,
    },
    /// Export a system description as an AutoYaST profile bundle.
    ExportAutoyast {
        /// Description name.
        name: String,
        /// Directory in which the `<name>-autoyast` bundle is created.
        #[arg(short = 'e', long)]
        exporter_dir: PathBuf,
        /// Overwrite an existing bundle.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SYSDESC_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let result = Config::load_default().and_then(|config| dispatch(cli, &config));

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("description error:") {
                EXIT_DESCRIPTION_ERROR
            } else if msg.starts_with("export error:") {
                EXIT_EXPORT_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn dispatch(cli: Cli, config: &Config) -> Result<u8, String> {
    let store = config.store_path(cli.store.as_deref());
    tracing::debug!("using store {}", store.display());
    let registry = RendererRegistry::builtin();
    let json_output = cli.json;

    match cli.command {
        Commands::Show { name, scopes } => {
            commands::show::run(&registry, &store, &name, &scopes, json_output)
        }
        Commands::Compare {
            name_a,
            name_b,
            scopes,
        } => commands::compare::run(&registry, &store, &name_a, &name_b, &scopes, json_output),
        Commands::ExportAutoyast {
            name,
            exporter_dir,
            force,
        } => commands::export::run(
            &store,
            &name,
            &exporter_dir,
            force,
            config.export_options(),
            json_output,
        ),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    }
}
