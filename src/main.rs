use std::io::Read;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use smbc::xattr::{self, NTAccessMask};

/// Inspect and compare NT security descriptors in their extended-attribute text form.
#[derive(Parser, Debug)]
#[command(name = "smbc_sd", version)]
struct Cli {
    /// Log at debug level (overridden by SMBC_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the descriptor in the form the set-attribute call expects
    Normalize {
        /// Descriptor text; read from stdin when omitted
        raw: Option<String>,
    },
    /// Exit non-zero unless ACTUAL only holds entries EXPECTED also has
    Compare {
        expected: String,
        actual: String,
    },
    /// List the named rights in each entry's access mask
    Mask {
        /// Descriptor text; read from stdin when omitted
        raw: Option<String>,
    },
}

fn read_input(raw: Option<String>) -> anyhow::Result<String> {
    match raw {
        Some(raw) => Ok(raw),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer).context("reading descriptor from stdin")?;
            Ok(buffer.trim_end().to_string())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("SMBC_LOG").unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Normalize { raw } => {
            let descriptor = xattr::parse(&read_input(raw)?)?;
            println!("{}", xattr::serialize(&descriptor));
        }
        Command::Compare { expected, actual } => {
            let expected = xattr::parse(&expected).context("parsing expected descriptor")?;
            let actual = xattr::parse(&actual).context("parsing actual descriptor")?;
            if !xattr::equivalent(&expected, &actual) {
                anyhow::bail!("descriptors differ");
            }
            println!("equivalent");
        }
        Command::Mask { raw } => {
            let descriptor = xattr::parse(&read_input(raw)?)?;
            for (principal, entry) in descriptor.entries() {
                let mask: NTAccessMask = entry.access_mask();
                println!("{} {:?} 0x{:08x} {}", principal, entry.kind(), entry.mask(), mask.right_names().join("|"));
            }
        }
    }
    Ok(())
}
