mod analyzers;
mod cli;
mod core;
mod http;
mod intruder;
mod payloads;
mod report;
mod scanner;

use clap::{CommandFactory, Parser};
use crate::cli::args::Cli;
use crate::core::context::Context;
use crate::core::engine::Engine;
use std::env;

const BANNER: &str = r#"
 ╔════════════════════════════════════════════════════╗
 ║                                                    ║
 ║     ██████╗ ██████╗ ██████╗                        ║
 ║    ██╔═══██╗██╔══██╗██╔══██╗                       ║
 ║    ██║   ██║██████╔╝██████╔╝                       ║
 ║    ██║   ██║██╔══██╗██╔══██╗ weaver                ║
 ║    ╚██████╔╝██║  ██║██████╔╝                       ║
 ║     ╚═════╝ ╚═╝  ╚═╝╚═════╝                        ║
 ║                                                    ║
 ║    Web Vulnerability Probing Engine                ║
 ║                                                    ║
 ║    Version : 0.1.0                                 ║
 ║    License : Apache-2.0                            ║
 ║                                                    ║
 ╚════════════════════════════════════════════════════╝
"#;

fn print_banner() {
    println!("\x1b[36m{}\x1b[0m", BANNER); // Cyan color
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let show_help = args.iter().any(|a| a == "--help" || a == "-h");
    let show_version = args.iter().any(|a| a == "--version" || a == "-V");
    let no_banner = args.iter().any(|a| a == "--no-banner");

    if (show_help || show_version) && !no_banner {
        print_banner();

        if show_version && !show_help {
            // The banner already contains version info
            return Ok(());
        }

        if show_help {
            Cli::command().print_help()?;
            println!();
            return Ok(());
        }
    }

    let cli = Cli::parse();

    if !cli.no_banner && !cli.quiet {
        print_banner();
    }

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }

    let ctx = Context::from_cli(cli)?;
    let engine = Engine::new(ctx)?;
    engine.run().await?;

    Ok(())
}
