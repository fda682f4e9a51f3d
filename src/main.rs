use react_refactor::config::{self, StubBody};
use react_refactor::document::DocumentSnapshot;
use react_refactor::{locator, lsp, stub};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// react-refactor - quick-fixes for undefined React components
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the language server over stdio
    Serve {
        /// Config directory (contains react-refactor.toml)
        #[arg(long, short = 'c', default_value = ".")]
        config_dir: PathBuf,
    },
    /// Print where a component is first used as markup in a file
    Locate {
        /// TSX/JSX file to search
        file: PathBuf,

        /// Component name
        name: String,
    },
    /// Print the declaration stub for a component
    Stub {
        /// Component name
        name: String,

        /// What the component renders
        #[arg(long, value_enum, default_value_t = Body::Null)]
        body: Body,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Body {
    Null,
    Fragment,
}

impl From<Body> for StubBody {
    fn from(body: Body) -> Self {
        match body {
            Body::Null => StubBody::Null,
            Body::Fragment => StubBody::Fragment,
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Serve {
        config_dir: PathBuf::from("."),
    });

    match command {
        Commands::Serve { config_dir } => serve_command(config_dir),
        Commands::Locate { file, name } => {
            init_logging(None)?;
            locate_command(file, &name)
        }
        Commands::Stub { name, body } => {
            init_logging(None)?;
            print!("{}", stub::render_component_stub(&name, body.into())?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Install the stderr subscriber
///
/// RUST_LOG wins over the configured level; "warn" if neither is set.
/// stdout is reserved for protocol traffic.
fn init_logging(configured: Option<&str>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(configured.unwrap_or("warn")));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn serve_command(config_dir: PathBuf) -> Result<ExitCode> {
    let config = config::Config::load(&config_dir)?;
    init_logging(config.log_level.as_deref())?;
    info!("Loaded configuration from: {}", config_dir.display());

    let runtime = tokio::runtime::Runtime::new()?;
    let clean = runtime.block_on(lsp::run(tokio::io::stdin(), tokio::io::stdout(), config))?;

    // Exit without a prior shutdown request is an error per the protocol
    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn locate_command(file: PathBuf, name: &str) -> Result<ExitCode> {
    let text = std::fs::read_to_string(&file)?;

    let Some(span) = locator::locate(&text, name) else {
        eprintln!("<{}> not found in {}", name, file.display());
        return Ok(ExitCode::from(1));
    };

    let snapshot = DocumentSnapshot::new(&text, 0);
    let range = snapshot.range_of(span);
    println!(
        "{}:{}:{}-{}:{}\t{}",
        file.display(),
        range.start.line + 1,
        range.start.character + 1,
        range.end.line + 1,
        range.end.character + 1,
        snapshot.text_in_span(span)
    );
    Ok(ExitCode::SUCCESS)
}
