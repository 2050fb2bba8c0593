//! CLI argument parsing.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// IP range filter and Ansible Vault tool.
#[derive(Debug, Parser)]
#[command(name = "ipfilter-vault")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// JSON configuration file.
    #[arg(short, long, env = "IPFILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// log4rs configuration file; a console logger is used when it is missing.
    #[arg(long, default_value = "log4rs.yml")]
    pub log_config: PathBuf,

    /// Debug logging to stderr; takes precedence over `--log-config`.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The log4rs file to load, unless it is missing or `--verbose` asks for
    /// the console logger.
    pub fn log_config_file(&self) -> Option<&Path> {
        (!self.verbose && self.log_config.exists()).then_some(self.log_config.as_path())
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check whether an address is allowed.
    Check {
        /// Address to check.
        ip: String,
        /// Check against this single spec instead of the allow list.
        #[arg(short, long)]
        range: Option<String>,
        /// Allow list entries; replaces the configured list.
        #[arg(short, long, value_delimiter = ',')]
        allow: Vec<String>,
    },

    /// Print the lowest address of a spec (default: first allowed spec).
    First {
        spec: Option<String>,
    },

    /// Print the highest address of a spec (default: first allowed spec).
    Last {
        spec: Option<String>,
    },

    /// Add a (possibly negative) offset to an address.
    Increment {
        ip: String,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },

    /// Print the canonical form of an address.
    Format {
        ip: String,
        /// Append /32 or /128.
        #[arg(long)]
        cidr: bool,
    },

    /// Print the fully expanded form of an IPv6 address.
    Expand {
        ip: String,
    },

    /// Address of a host, numbered by its position in an index.
    Calc {
        /// Base address or CIDR block.
        base: String,
        /// Host to look up.
        hostname: String,
        /// Ordered host names.
        #[arg(short, long, value_delimiter = ',', required = true)]
        index: Vec<String>,
        /// Prefix length appended to the result and used as the bound for a
        /// bare base address.
        #[arg(short, long)]
        mask: Option<u8>,
    },

    /// Encrypt into an Ansible Vault envelope.
    Encrypt {
        #[command(flatten)]
        io: VaultIo,
        /// Write the payload on a single line.
        #[arg(long)]
        no_chunk: bool,
        /// Vault-id label (writes format 1.2).
        #[arg(long)]
        label: Option<String>,
    },

    /// Decrypt an Ansible Vault envelope.
    Decrypt {
        #[command(flatten)]
        io: VaultIo,
    },
}

/// Input/output and password options shared by the vault commands.
#[derive(Debug, clap::Args)]
pub struct VaultIo {
    /// Input file (default: stdin).
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// Output file (default: stdout).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// File holding the vault password.
    #[arg(long)]
    pub vault_password_file: Option<PathBuf>,
}
