//! suarc CLI - Sonic Unleashed archive tool
//!
//! Lists, unpacks, packs, merges and links AR/ARL containers, unwrapping
//! SEGS and XCompression files on the fly.

mod commands;
mod utils;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "suarc")]
#[command(author, version, about = "Sonic Unleashed AR/ARL archive tool")]
#[command(long_about = "
suarc reads and writes the AR data archives and ARL name linkers of
Sonic Unleashed. SEGS and XCompression wrapped files are unwrapped
transparently (XCompression only partially).

Examples:
  suarc list Stage.ar.00
  suarc list Stage.arl --json
  suarc unpack Stage.ar.00 -o stage/
  suarc pack Mod.ar.00 stage/*.xml --align
  suarc merge Merged.ar.00 Mod.ar.00 Stage.ar.00 --arl
  suarc link Stage.arl Stage.ar.00 Stage.ar.01
  suarc decompress Stage.ar.00 -o Stage.plain.ar.00
")]
struct Cli {
    /// Log level used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entries of an AR or ARL file
    #[command(alias = "l")]
    List {
        /// Container file to list
        file: PathBuf,

        /// Show sizes, offsets and dates
        #[arg(short, long)]
        verbose: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Include only entries matching pattern (glob syntax: *.xml)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },

    /// Show header and compression details of a container
    #[command(alias = "i")]
    Info {
        /// Container file to inspect
        file: PathBuf,
    },

    /// Write every archive entry to a directory
    #[command(alias = "x")]
    Unpack {
        /// Archive file to unpack
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Include only entries matching pattern (glob syntax)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,

        /// Show progress bar
        #[arg(short = 'P', long, default_value = "true")]
        progress: bool,
    },

    /// Build a new archive from files
    #[command(alias = "c")]
    Pack {
        /// Output archive file
        archive: PathBuf,

        /// Files to add; each is stored under its file name
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Pad payloads to the header alignment
        #[arg(short, long)]
        align: bool,

        /// Alignment value written into the header
        #[arg(long, default_value_t = 64)]
        alignment: u32,
    },

    /// Merge archives; the first occurrence of a name wins
    Merge {
        /// Output archive file
        output: PathBuf,

        /// Input archives, highest priority first
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Also write a linker for the merged archive next to it
        #[arg(long)]
        arl: bool,
    },

    /// Build a linker listing the entries of archives
    Link {
        /// Output linker file
        output: PathBuf,

        /// Archives to list, in slot order
        #[arg(required = true)]
        archives: Vec<PathBuf>,
    },

    /// Unwrap a SEGS or XCompression file into a plain container
    Decompress {
        /// Compressed container file
        input: PathBuf,

        /// Output file (defaults to the input with ".plain" appended)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Commands::List {
            file,
            verbose,
            json,
            include,
            exclude,
        } => commands::cmd_list(&file, verbose, json, &include, &exclude),
        Commands::Info { file } => commands::cmd_info(&file),
        Commands::Unpack {
            archive,
            output,
            include,
            exclude,
            progress,
        } => commands::cmd_unpack(&archive, &output, &include, &exclude, progress),
        Commands::Pack {
            archive,
            files,
            align,
            alignment,
        } => commands::cmd_pack(&archive, &files, align, alignment),
        Commands::Merge { output, inputs, arl } => commands::cmd_merge(&output, &inputs, arl),
        Commands::Link { output, archives } => commands::cmd_link(&output, &archives),
        Commands::Decompress { input, output } => commands::cmd_decompress(&input, output.as_deref()),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "suarc", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_merge() {
        let cli = Cli::parse_from(["suarc", "merge", "out.ar", "a.ar", "b.ar", "--arl"]);
        match cli.command {
            Commands::Merge { output, inputs, arl } => {
                assert_eq!(output, PathBuf::from("out.ar"));
                assert_eq!(inputs.len(), 2);
                assert!(arl);
            }
            _ => panic!("expected merge"),
        }
        assert_eq!(cli.log_level, "warn");
    }
}
