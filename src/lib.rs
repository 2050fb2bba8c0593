//! IP range filtering and Ansible Vault encryption.
//!
//! - [`ipfilter`] - allow lists in single, CIDR, wildcard and section notation
//! - [`vault`] - `$ANSIBLE_VAULT` 1.1/1.2 envelopes (AES-256-CTR + HMAC-SHA256)
//! - [`config`], [`cli`], [`commands`] - the `ipfilter-vault` command line tool

pub mod cli;
pub mod commands;
pub mod config;
pub mod ipfilter;
pub mod vault;

pub use config::Config;
pub use ipfilter::{FilterError, IpFilter};
pub use vault::VaultError;
