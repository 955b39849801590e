//! emx-datauri CLI
//!
//! Convert files to data URIs and back.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use emx_datauri::{detect_content_type, DataUri, Decoder, Encoder, Encoding};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "emx-datauri")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Data URI (RFC 2397) encoding tool")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a file (or stdin) as a data URI
    #[command(visible_alias = "e")]
    Encode {
        /// File to encode (default: stdin)
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Media type as type/subtype (default: sniffed from content)
        #[arg(short = 'm', long)]
        mimetype: Option<String>,

        /// Media type parameter as key=value, may be repeated
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Percent-escape the payload instead of using base64
        #[arg(short = 'a', long)]
        ascii: bool,
    },

    /// Decode a data URI and write its payload
    #[command(visible_alias = "d")]
    Decode {
        /// File holding the data URI (default: stdin)
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Show media type, parameters and payload size of a data URI
    #[command(visible_alias = "i")]
    Info {
        /// File holding the data URI (default: stdin)
        input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Encode { input, output, mimetype, params, ascii } => {
            encode_input(input, output, mimetype, params, ascii)?;
        }
        Commands::Decode { input, output } => {
            decode_input(input, output)?;
        }
        Commands::Info { input } => {
            show_info(input)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_input(input: Option<&PathBuf>) -> Result<Vec<u8>> {
    match input {
        Some(path) => {
            fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))
        }
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer).context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn write_output(output: Option<&PathBuf>, bytes: &[u8]) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("Failed to write: {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn read_uri(input: Option<&PathBuf>) -> Result<DataUri> {
    let content = read_input(input)?;
    let decoder = Decoder::new();
    let uri = decoder
        .decode_reader(content.trim_ascii())
        .context("Failed to decode data URI")?;
    Ok(uri)
}

fn encode_input(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    mimetype: Option<String>,
    params: Vec<String>,
    ascii: bool,
) -> Result<()> {
    let data = read_input(input.as_ref())?;

    let sniffed;
    let mimetype = match &mimetype {
        Some(mimetype) => mimetype.as_str(),
        None => {
            sniffed = detect_content_type(&data).replace("; ", ";");
            info!(content_type = %sniffed, "sniffed content type");
            sniffed.as_str()
        }
    };

    // Sniffed types may carry their own parameters
    let mut pieces = mimetype.split(';');
    let media_type = pieces.next().unwrap_or_default();
    let mut pairs: Vec<&str> = Vec::new();
    for param in pieces.chain(params.iter().map(String::as_str)) {
        let Some((key, value)) = param.split_once('=') else {
            bail!("Invalid parameter '{}': expected key=value", param);
        };
        pairs.push(key);
        pairs.push(value);
    }

    let mut uri = DataUri::try_new(data, media_type, &pairs)?;
    if ascii {
        uri.encoding = Encoding::Ascii;
    }

    let mut encoded = Encoder::new().encode(&uri);
    if output.is_none() {
        encoded.push('\n');
    }
    write_output(output.as_ref(), encoded.as_bytes())?;

    info!(content_type = %uri.content_type(), bytes = uri.data.len(), "encoded");
    Ok(())
}

fn decode_input(input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let uri = read_uri(input.as_ref())?;
    write_output(output.as_ref(), &uri.data)?;

    info!(content_type = %uri.content_type(), bytes = uri.data.len(), "decoded");
    Ok(())
}

fn show_info(input: Option<PathBuf>) -> Result<()> {
    let uri = read_uri(input.as_ref())?;

    println!("content-type: {}", uri.content_type());
    for (key, value) in &uri.media_type.params {
        println!("param: {}={}", key, value);
    }
    println!("encoding: {}", uri.encoding);
    println!("size: {}", uri.data.len());

    Ok(())
}
