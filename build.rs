// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: metadata cache root
fn cache_root_arg() -> Arg {
    Arg::new("cache_root")
        .long("cache-root")
        .value_name("DIR")
        .default_value("cache")
        .help("Directory where metadata cache files are stored")
}

fn build_cli() -> Command {
    Command::new("rverflow")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve R package dependency stacks across CRAN, Bioconductor, and GitHub")
        .subcommand_required(false)
        .subcommand(
            Command::new("solve")
                .about("Resolve package versions for a project manifest")
                .arg(Arg::new("config").required(true).help("Path to the project manifest"))
                .arg(cache_root_arg())
                .arg(
                    Arg::new("lock_r")
                        .long("lock-r")
                        .value_name("VERSION")
                        .help("Lock the R version during resolution"),
                )
                .arg(
                    Arg::new("prefer_bioc")
                        .long("prefer-bioc")
                        .value_name("RELEASE")
                        .help("Preferred Bioconductor release"),
                )
                .arg(
                    Arg::new("include_optional")
                        .long("include-optional")
                        .action(clap::ArgAction::SetTrue)
                        .help("Include Suggests dependencies"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["human", "json"])
                        .default_value("human")
                        .help("Output format"),
                ),
        )
        .subcommand(
            Command::new("update-cache")
                .about("Prime the metadata cache for selected sources")
                .arg(cache_root_arg())
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_name("PATH")
                        .help("Project manifest to scan for targets"),
                )
                .arg(
                    Arg::new("package")
                        .long("package")
                        .action(clap::ArgAction::Append)
                        .help("CRAN package to fetch metadata for"),
                )
                .arg(
                    Arg::new("bioc_release")
                        .long("bioc-release")
                        .action(clap::ArgAction::Append)
                        .help("Bioconductor release to cache"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("rverflow.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
