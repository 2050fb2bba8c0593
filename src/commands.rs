//! Subcommand execution.
//!
//! Results go to the writer handed in by `main` (stdout), diagnostics go
//! through `log`.

use colored::Colorize;
use std::error::Error;
use std::io::{Read, Write};
use std::path::Path;

use crate::cli::{Command, VaultIo};
use crate::config::Config;
use crate::ipfilter::{self, IpFilter};
use crate::vault;

/// Run one subcommand. Returns `false` when `check` denies the address.
pub fn run(command: &Command, config: &Config, out: &mut dyn Write) -> Result<bool, Box<dyn Error>> {
    match command {
        Command::Check { ip, range, allow } => {
            let override_filter;
            let filter = if allow.is_empty() {
                &config.allowed_ips
            } else {
                override_filter = IpFilter::new(allow);
                &override_filter
            };
            let allowed = filter.in_range(ip, range.as_deref())?;
            log::info!("check {ip}: allowed={allowed}");
            if allowed {
                writeln!(out, "{ip} {}", "allowed".green())?;
            } else {
                writeln!(out, "{ip} {}", "denied".red())?;
            }
            return Ok(allowed);
        }
        Command::First { spec } => {
            let first = config
                .allowed_ips
                .first(spec.as_deref())
                .ok_or_else(|| no_address("first", spec))?;
            writeln!(out, "{first}")?;
        }
        Command::Last { spec } => {
            let last = config
                .allowed_ips
                .last(spec.as_deref())?
                .ok_or_else(|| no_address("last", spec))?;
            writeln!(out, "{last}")?;
        }
        Command::Increment { ip, delta } => {
            let next = ipfilter::increment(ip, *delta)
                .ok_or_else(|| format!("Cannot add {delta} to {ip}"))?;
            writeln!(out, "{next}")?;
        }
        Command::Format { ip, cidr } => {
            let formatted =
                ipfilter::format(ip, *cidr).ok_or_else(|| format!("Not an IP address: {ip}"))?;
            writeln!(out, "{formatted}")?;
        }
        Command::Expand { ip } => {
            writeln!(out, "{}", ipfilter::expand_ipv6(ip)?)?;
        }
        Command::Calc {
            base,
            hostname,
            index,
            mask,
        } => {
            let host = ipfilter::calc(base, index.as_slice(), hostname, *mask)
                .ok_or_else(|| format!("No address for {hostname} in {base}"))?;
            writeln!(out, "{host}")?;
        }
        Command::Encrypt {
            io,
            no_chunk,
            label,
        } => {
            let password = vault_password(io, config)?;
            let plaintext = read_input(io.input.as_deref())?;
            let chunked = config.vault.chunked && !no_chunk;
            let vaulttext = match label {
                Some(label) => vault::encrypt_with_label(&plaintext, &password, label, chunked)?,
                None => vault::encrypt(&plaintext, &password, chunked)?,
            };
            write_output(io.output.as_deref(), vaulttext.as_bytes(), out)?;
        }
        Command::Decrypt { io } => {
            let password = vault_password(io, config)?;
            let input = read_input(io.input.as_deref())?;
            let vaulttext = String::from_utf8(input).map_err(|_| "Vault input is not UTF-8")?;
            if !vault::is_vault(&vaulttext) {
                return Err(format!("Input does not start with {}", vault::VAULT_MARKER).into());
            }
            let plaintext = vault::decrypt(&vaulttext, &password)?;
            write_output(io.output.as_deref(), &plaintext, out)?;
        }
    }
    Ok(true)
}

fn no_address(which: &str, spec: &Option<String>) -> String {
    match spec {
        Some(spec) => format!("No {which} address for {spec}"),
        None => format!("No {which} address: the allow list is empty"),
    }
}

/// `--vault-password-file` wins over the configured password source.
fn vault_password(io: &VaultIo, config: &Config) -> Result<String, Box<dyn Error>> {
    match &io.vault_password_file {
        Some(path) => Ok(vault::read_password_file(path)?),
        None => config.vault_password(),
    }
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>, Box<dyn Error>> {
    match path {
        Some(path) => {
            log::debug!("Reading {}", path.display());
            std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()).into())
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&Path>, data: &[u8], out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    match path {
        Some(path) => {
            log::info!("Writing {}", path.display());
            std::fs::write(path, data)
                .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
        }
        None => out.write_all(data)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn run_args(args: &[&str], config: &Config) -> (Result<bool, Box<dyn Error>>, String) {
        let cli = Cli::parse_from(std::iter::once("ipfilter-vault").chain(args.iter().copied()));
        let mut out = Vec::new();
        let result = run(&cli.command, config, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    fn config_with(specs: &[&str]) -> Config {
        Config {
            allowed_ips: IpFilter::new(specs),
            ..Config::default()
        }
    }

    #[test]
    fn test_check_against_config() {
        let config = config_with(&["10.0.0.0/24"]);
        let (result, out) = run_args(&["check", "10.0.0.9"], &config);
        assert!(result.unwrap());
        assert!(out.contains("allowed"));

        let (result, out) = run_args(&["check", "10.0.1.9"], &config);
        assert!(!result.unwrap());
        assert!(out.contains("denied"));
    }

    #[test]
    fn test_check_with_allow_override() {
        let config = config_with(&["10.0.0.0/24"]);
        let (result, _) = run_args(&["check", "192.168.1.4", "--allow", "192.168.*"], &config);
        assert!(result.unwrap());
    }

    #[test]
    fn test_check_unsupported_v6_wildcard_is_error() {
        let config = config_with(&["fd00:*"]);
        let (result, _) = run_args(&["check", "fd00::1"], &config);
        assert!(result.is_err());
    }

    #[test]
    fn test_first_last_defaults_to_first_spec() {
        let config = config_with(&["192.168.0.0/30"]);
        let (_, out) = run_args(&["first"], &config);
        assert_eq!(out, "192.168.0.0\n");
        let (_, out) = run_args(&["last"], &config);
        assert_eq!(out, "192.168.0.3\n");
        let (result, _) = run_args(&["last"], &Config::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_address_helpers() {
        let config = Config::default();
        assert_eq!(run_args(&["increment", "10.0.1.0", "-1"], &config).1, "10.0.0.255\n");
        assert_eq!(run_args(&["format", "fd00:0::1", "--cidr"], &config).1, "fd00::1/128\n");
        assert!(run_args(&["format", "nope"], &config).0.is_err());
        assert_eq!(
            run_args(&["expand", "fd00::1"], &config).1,
            "fd00:0000:0000:0000:0000:0000:0000:0001\n"
        );
        assert_eq!(
            run_args(&["calc", "10.0.0.0/24", "web02", "-i", "gw,web01,web02"], &config).1,
            "10.0.0.2\n"
        );
    }

    #[test]
    fn test_encrypt_decrypt_files() {
        let dir = tempfile::tempdir().unwrap();
        let password = dir.path().join("pass");
        let plain = dir.path().join("plain.txt");
        let sealed = dir.path().join("plain.vault");
        let opened = dir.path().join("opened.txt");
        std::fs::write(&password, "pw\n").unwrap();
        std::fs::write(&plain, "db_password: s3cr3t\n").unwrap();

        let config = Config::default();
        let path = |p: &std::path::PathBuf| p.to_str().unwrap().to_string();
        let (result, _) = run_args(
            &[
                "encrypt",
                "-i",
                &path(&plain),
                "-o",
                &path(&sealed),
                "--vault-password-file",
                &path(&password),
                "--label",
                "dev",
            ],
            &config,
        );
        assert!(result.unwrap());
        let vaulttext = std::fs::read_to_string(&sealed).unwrap();
        assert!(vaulttext.starts_with("$ANSIBLE_VAULT;1.2;AES256;dev\n"));

        let (result, _) = run_args(
            &[
                "decrypt",
                "-i",
                &path(&sealed),
                "-o",
                &path(&opened),
                "--vault-password-file",
                &path(&password),
            ],
            &config,
        );
        assert!(result.unwrap());
        assert_eq!(std::fs::read_to_string(&opened).unwrap(), "db_password: s3cr3t\n");
    }

    #[test]
    fn test_decrypt_rejects_plain_input() {
        let dir = tempfile::tempdir().unwrap();
        let password = dir.path().join("pass");
        let plain = dir.path().join("plain.txt");
        std::fs::write(&password, "pw").unwrap();
        std::fs::write(&plain, "not a vault").unwrap();
        let (result, _) = run_args(
            &[
                "decrypt",
                "-i",
                plain.to_str().unwrap(),
                "--vault-password-file",
                password.to_str().unwrap(),
            ],
            &Config::default(),
        );
        assert!(result.is_err());
    }
}
