//! Build script for qec-cli.
//!
//! This script generates man pages at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Note: We build a minimal command structure here rather than importing from
//! the main crate, since build scripts cannot depend on the crate being built.

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// IMPORTANT: Keep this structure synchronized with src/cli.rs
/// When adding/removing/modifying commands, update both files.
fn build_cli() -> Command {
    let passthrough = || {
        Arg::new("args")
            .help("Extra arguments for docker compose")
            .value_name("ARGS")
            .num_args(0..)
            .trailing_var_arg(true)
            .allow_hyphen_values(true)
    };

    Command::new("qec")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run several Docker Compose projects as one")
        .long_about(
            "Merges compose files from different directories into a single project. \
             Services and named resources are prefixed with their directory's name, \
             relative paths are made absolute and colliding host ports are moved by \
             a fixed offset.",
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .help("Compose file to include (repeat for each project)")
                .value_name("FILE")
                .global(true)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Show what would run without writing files or starting docker compose")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("offset")
                .long("offset")
                .help("Distance between reassigned host ports")
                .value_name("N")
                .global(true),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Override the user settings directory")
                .value_name("PATH")
                .global(true)
                .env("QEC_DATA_DIR"),
        )
        .subcommands(vec![
            Command::new("up")
                .about("Create and start the merged project (the default)")
                .arg(
                    Arg::new("detach")
                        .short('d')
                        .long("detach")
                        .help("Run containers in the background")
                        .action(ArgAction::SetTrue),
                )
                .arg(passthrough()),
            Command::new("down")
                .about("Stop and remove the merged project's containers")
                .arg(passthrough()),
            Command::new("config")
                .about("Validate and print the merged project as docker compose sees it")
                .arg(passthrough()),
            Command::new("ps")
                .about("List the merged project's containers")
                .arg(passthrough()),
            Command::new("logs")
                .about("Show output from the merged project's containers")
                .arg(passthrough()),
            Command::new("merge")
                .about("Print the merged compose file without running docker compose")
                .arg(
                    Arg::new("report")
                        .long("report")
                        .help("Print JSON with the merged project and every merge event")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Write the merged compose file here instead of stdout")
                        .value_name("FILE"),
                ),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() -> io::Result<()> {
    // Generate man pages at build time
    let out_dir = PathBuf::from(
        std::env::var_os("OUT_DIR")
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "OUT_DIR is not set"))?,
    );
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;
    fs::write(man_dir.join("qec.1"), buffer)?;

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
    Ok(())
}
