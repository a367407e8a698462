//! bluedata - data container CLI tool
//!
//! Converts documents between the supported formats and checks them against
//! validation rules.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use blue_data::codec::Format;
use blue_data::container::{DataContainer, Options};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "bluedata", version)]
#[command(about = "Convert and validate structured data documents", long_about = None)]
struct Cli {
    /// Output location. Use '-' for stdout
    #[arg(short, long, default_value = "-", global = true)]
    output: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a document from one format to another
    Convert {
        file: PathBuf,

        /// Input format: json, yaml, xml, simple_xml or serialized
        #[arg(long)]
        from: Format,

        /// Output format: json, yaml, xml, serialized or text
        #[arg(long)]
        to: Format,

        /// Write XML text as escaped text instead of CDATA sections
        #[arg(long)]
        no_cdata: bool,

        /// DTD system identifier for XML output
        #[arg(long)]
        dtd: Option<String>,

        /// Separator for text output
        #[arg(long)]
        separator: Option<String>,

        /// Replace embedded objects with a marker in serialized output
        #[arg(long)]
        skip_objects: bool,

        /// Element-name prefix for integer keys in XML
        #[arg(long)]
        integer_key_prefix: Option<String>,
    },
    /// Check every key of a document against the rules of an options file
    Validate {
        file: PathBuf,

        /// YAML options file with `validation` rules
        #[arg(short, long)]
        config: PathBuf,

        /// Input format; defaults to the `type` of the options file
        #[arg(long)]
        from: Option<Format>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blue_data=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut output: Box<dyn Write> = if cli.output == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(
            fs::File::create(&cli.output)
                .map_err(|e| format!("Failed to create output file {:?}: {}", cli.output, e))?,
        )
    };

    match cli.command {
        Command::Convert {
            file,
            from,
            to,
            no_cdata,
            dtd,
            separator,
            skip_objects,
            integer_key_prefix,
        } => {
            let mut options = Options::new().data(read(&file)?, from);
            if let Some(prefix) = integer_key_prefix {
                options = options.integer_key_prefix(prefix);
            }
            if let Some(separator) = separator {
                options = options.separator(separator);
            }
            let mut container = load(options)?;
            let text = match to {
                Format::Json => container.to_json(),
                Format::Yaml => container.to_yaml(),
                Format::Xml => container.to_xml(!no_cdata, dtd.as_deref()),
                Format::Serialized => container.serialize(skip_objects),
                Format::Text => container.to_text(),
                other => return Err(format!("{} is not an output format", other).into()),
            };
            match text {
                Some(text) => writeln!(output, "{}", text)?,
                None => return Err(describe_errors(&container).into()),
            }
        }
        Command::Validate { file, config, from } => {
            let config_text = fs::read_to_string(&config)
                .map_err(|e| format!("Failed to read options file {:?}: {}", config, e))?;
            let options = Options::from_yaml(&config_text)?;
            let format = from.unwrap_or(options.input_type);

            let source = load(
                Options::new()
                    .data(read(&file)?, format)
                    .integer_key_prefix(options.integer_key_prefix.clone()),
            )?;

            let mut checked = DataContainer::with_options(options);
            checked.set_map(source.get_all());
            debug!(keys = source.len(), "validated document");

            if checked.has_errors() {
                return Err(describe_errors(&checked).into());
            }
            writeln!(output, "{}: {} keys valid", file.display(), checked.len())?;
        }
    }

    Ok(())
}

fn read(file: &Path) -> Result<String, String> {
    fs::read_to_string(file).map_err(|e| format!("Failed to read file {:?}: {}", file, e))
}

fn load(options: Options) -> Result<DataContainer, String> {
    let container = DataContainer::with_options(options);
    if container.has_errors() {
        return Err(describe_errors(&container));
    }
    Ok(container)
}

fn describe_errors(container: &DataContainer) -> String {
    container
        .errors()
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
