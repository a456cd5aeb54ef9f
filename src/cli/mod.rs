// Keyforge - CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: serve, generate, convert, archives.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::execute;

/// Keyforge - keystore generation bot for Android signing keys.
#[derive(Parser, Debug)]
#[command(name = "keyforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML config file. Defaults to ./keyforge.toml if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the chat bot (needs BOT_TOKEN or bot.token).
    Serve,

    /// Generate a keystore for a package, archiving any previous one.
    Generate {
        /// Package identifier (e.g. "com.example.app").
        package: String,

        /// Key alias. Defaults to the configured alias.
        #[arg(long)]
        alias: Option<String>,

        /// Store and key password. Defaults to the configured password.
        #[arg(long)]
        password: Option<String>,

        /// Keep the existing private key and re-issue its certificate.
        #[arg(long, default_value = "false")]
        reuse: bool,
    },

    /// Store an existing keystore file and export its certificate as PEM.
    Convert {
        /// Keystore file (.jks or .keystore).
        file: PathBuf,

        /// Alias of the key entry.
        #[arg(long)]
        alias: Option<String>,

        /// Keystore password.
        #[arg(long)]
        password: Option<String>,

        /// Package identifier. Defaults to the file name without extension.
        #[arg(long)]
        package: Option<String>,
    },

    /// List archived records of a package, oldest first.
    Archives {
        /// Package identifier.
        package: String,
    },
}
