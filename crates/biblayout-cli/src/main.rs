/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! biblayout CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod diagnostics;

#[derive(Parser)]
#[command(name = "biblayout")]
#[command(version)]
#[command(about = "Render bibliographic entries through layout templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every entry of an entry file through a layout
    Render {
        /// Layout file
        #[arg(short, long)]
        layout: PathBuf,

        /// JSON file holding an array of entries
        #[arg(short, long)]
        entries: PathBuf,

        /// YAML configuration (name formatters, file directories, macros)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Base directory for attached files (repeatable, tried before configured ones)
        #[arg(long = "file-dir")]
        file_dirs: Vec<PathBuf>,

        /// Text written between rendered entries
        #[arg(long, default_value = "")]
        separator: String,

        /// Write output to FILE instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile a layout and report syntax errors
    Check {
        /// Layout file
        layout: PathBuf,

        /// YAML configuration providing custom formatters
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Expand #macro# references in a text
    Resolve {
        /// Text to expand
        text: String,

        /// YAML configuration providing macro definitions
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "biblayout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            layout,
            entries,
            config,
            file_dirs,
            separator,
            output,
        } => commands::render::execute(commands::render::RenderArgs {
            layout,
            entries,
            config,
            file_dirs,
            separator,
            output,
        }),
        Commands::Check { layout, config } => commands::check::execute(&layout, config.as_deref()),
        Commands::Resolve { text, config } => commands::resolve::execute(&text, config.as_deref()),
    }
}
