use clap::{Parser as ClapParser, Subcommand};
use mini4gl::cli::{self, CheckOptions, CliError, RunRequest};
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "mini4gl")]
#[command(about = "mini4gl - run 4GL scripts against JSON record fixtures")]
#[command(version)]
struct Cli {
    /// Log interpreter activity (debug level) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program
    Run {
        /// Program file (reads stdin if not provided)
        file: Option<PathBuf>,

        /// Value for the next INPUT statement; repeat for more
        #[arg(short, long = "input", value_name = "VALUE")]
        inputs: Vec<String>,

        /// JSON fixture to serve FOR EACH and FIND from
        #[arg(short, long, value_name = "FIXTURE")]
        data: Option<PathBuf>,

        /// Print a JSON report of output lines and final variables
        #[arg(long)]
        json: bool,
    },

    /// Check program syntax without running it
    Check {
        /// Program file (reads stdin if not provided)
        file: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            file,
            inputs,
            data,
            json,
        } => run_program(file, inputs, data, json),
        Commands::Check { file } => check_program(file),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

fn read_source(file: Option<PathBuf>) -> Result<String, CliError> {
    match file {
        Some(path) => Ok(fs::read_to_string(path)?),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
        None => Err(CliError::NoInput),
    }
}

fn run_program(
    file: Option<PathBuf>,
    inputs: Vec<String>,
    data: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let request = RunRequest {
        source: read_source(file)?,
        inputs,
        data,
        echo: !json,
    };

    let report = cli::execute_run(&request)?;
    if json {
        let text = serde_json::to_string_pretty(&report.to_json())
            .map_err(|e| CliError::Io(io::Error::other(e)))?;
        println!("{}", text);
    }
    Ok(())
}

fn check_program(file: Option<PathBuf>) -> Result<(), CliError> {
    let options = CheckOptions {
        source: read_source(file)?,
    };
    let statements = cli::execute_check(&options)?;
    println!("Syntax is valid ({} statements)", statements);
    Ok(())
}
