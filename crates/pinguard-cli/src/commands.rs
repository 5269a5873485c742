//! CLI command implementations

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pinguard_core::{
    format_lockout_time, generate_secure_pin, hash_pin, is_weak_pin, validate_format,
    JsonFileStore, LengthBounds, PinGuard, ReferencePin, SystemClock,
};

use crate::settings::Settings;

/// PinGuard - PIN validation with brute-force lockout
#[derive(Parser)]
#[command(name = "pinguard")]
#[command(about = "PIN validation with time-boxed lockout")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Policy file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the attempt ledger
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a PIN's format and strength
    Check {
        pin: String,

        /// Override the policy's minimum length
        #[arg(long)]
        min: Option<usize>,

        /// Override the policy's maximum length
        #[arg(long)]
        max: Option<usize>,
    },

    /// Report whether a digit string is a weak pattern
    Weak { pin: String },

    /// Generate a random PIN
    Generate {
        /// PIN length (defaults to the policy's canonical length)
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Hash a PIN with Argon2id
    Hash { pin: String },

    /// Validate a PIN for a user and record the attempt
    Verify {
        #[arg(long)]
        user: String,

        #[arg(long)]
        pin: String,

        /// Reference PIN in the clear
        #[arg(long, conflicts_with = "reference_hash")]
        reference: Option<String>,

        /// Reference PIN as an Argon2id PHC string
        #[arg(long)]
        reference_hash: Option<String>,
    },

    /// Show a user's lockout state
    Status {
        #[arg(long)]
        user: String,
    },

    /// Clear a user's attempts and lockout
    Reset {
        #[arg(long)]
        user: String,
    },

    /// Drop expired lockouts and stale attempts
    Purge,

    /// Render a lockout countdown
    FormatTime { seconds: u64 },
}

/// Result of a command: text to print and whether it succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output: String,
    pub success: bool,
}

impl Outcome {
    fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
        }
    }

    fn failed(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: false,
        }
    }
}

fn open_guard(settings: &Settings) -> anyhow::Result<PinGuard<JsonFileStore, SystemClock>> {
    let store = JsonFileStore::open(settings.ledger_path())
        .with_context(|| format!("cannot open ledger in {}", settings.data_dir.display()))?;
    Ok(PinGuard::with_parts(store, SystemClock, settings.policy.clone())?)
}

/// Run a parsed command
pub fn execute(cli: &Cli) -> anyhow::Result<Outcome> {
    let settings = Settings::resolve(cli.config.as_deref(), cli.data_dir.as_deref())?;

    match &cli.command {
        Commands::Check { pin, min, max } => {
            let defaults = settings.policy.bounds();
            let bounds = LengthBounds::new(min.unwrap_or(defaults.min), max.unwrap_or(defaults.max));
            let check = validate_format(pin, bounds);

            let output = if cli.json {
                serde_json::to_string(&check)?
            } else {
                match &check.error {
                    None => "PIN format is valid".to_string(),
                    Some(e) => e.to_string(),
                }
            };
            Ok(Outcome {
                output,
                success: check.valid,
            })
        }

        Commands::Weak { pin } => {
            let weak = is_weak_pin(pin);
            let output = if cli.json {
                serde_json::json!({ "weak": weak }).to_string()
            } else if weak {
                "weak".to_string()
            } else {
                "not weak".to_string()
            };
            Ok(Outcome::ok(output))
        }

        Commands::Generate { length } => {
            let pin = generate_secure_pin(length.unwrap_or(settings.policy.pin_length))?;
            Ok(Outcome::ok(pin))
        }

        Commands::Hash { pin } => Ok(Outcome::ok(hash_pin(pin)?)),

        Commands::Verify {
            user,
            pin,
            reference,
            reference_hash,
        } => {
            // Malformed input never reaches the ledger
            let check = validate_format(pin, settings.policy.bounds());
            if let Some(e) = &check.error {
                let output = if cli.json {
                    serde_json::to_string(&check)?
                } else {
                    e.to_string()
                };
                return Ok(Outcome::failed(output));
            }

            let reference = match (reference, reference_hash) {
                (Some(plain), _) => Some(ReferencePin::plain(plain.clone())),
                (None, Some(phc)) => Some(ReferencePin::hashed(phc.clone())),
                (None, None) => None,
            };

            let guard = open_guard(&settings)?;
            let verification = guard.validate_pin(user, pin, reference.as_ref())?;

            let output = if cli.json {
                serde_json::to_string(&verification)?
            } else {
                verification.to_string()
            };
            Ok(Outcome {
                output,
                success: verification.is_success(),
            })
        }

        Commands::Status { user } => {
            let guard = open_guard(&settings)?;
            let status = guard.status(user)?;

            if cli.json {
                return Ok(Outcome::ok(serde_json::to_string(&status)?));
            }
            let output = if status.locked {
                format!(
                    "{} is locked out for {}",
                    user,
                    format_lockout_time(status.remaining_secs)
                )
            } else {
                format!(
                    "{} is not locked ({} attempts remaining)",
                    user, status.remaining_attempts
                )
            };
            Ok(Outcome::ok(output))
        }

        Commands::Reset { user } => {
            open_guard(&settings)?.reset_attempts(user)?;
            Ok(Outcome::ok(format!("Attempts cleared for {}", user)))
        }

        Commands::Purge => {
            let purged = open_guard(&settings)?.purge_expired()?;
            Ok(Outcome::ok(format!("Purged records for {} users", purged)))
        }

        Commands::FormatTime { seconds } => Ok(Outcome::ok(format_lockout_time(*seconds))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn run(dir: &TempDir, args: &[&str]) -> Outcome {
        let data_dir = dir.path().to_str().unwrap();
        let config = dir.path().join("policy.toml");
        let mut argv = vec![
            "pinguard",
            "--data-dir",
            data_dir,
            "--config",
            config.to_str().unwrap(),
        ];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        execute(&cli).unwrap()
    }

    #[test]
    fn test_check_command() {
        let dir = tempdir().unwrap();
        assert!(run(&dir, &["check", "481902"]).success);

        let outcome = run(&dir, &["check", "12a456"]);
        assert!(!outcome.success);
        assert_eq!(outcome.output, "PIN must contain only digits");

        let outcome = run(&dir, &["--json", "check", "12"]);
        assert_eq!(
            outcome.output,
            r#"{"valid":false,"error":{"LengthOutOfRange":{"min":4,"max":8}}}"#
        );

        assert!(!run(&dir, &["check", "4819", "--min", "6"]).success);
    }

    #[test]
    fn test_generate_uses_policy_length() {
        let dir = tempdir().unwrap();
        let outcome = run(&dir, &["generate"]);
        assert_eq!(outcome.output.len(), 6);
        assert!(!is_weak_pin(&outcome.output));

        assert_eq!(run(&dir, &["generate", "-l", "8"]).output.len(), 8);
    }

    #[test]
    fn test_verify_persists_lockout() {
        let dir = tempdir().unwrap();
        let verify = |pin: &str| {
            run(
                &dir,
                &["verify", "--user", "alice", "--pin", pin, "--reference", "482910"],
            )
        };

        assert_eq!(verify("591047").output, "Incorrect PIN (2 attempts remaining)");
        assert_eq!(verify("703816").output, "Incorrect PIN (1 attempt remaining)");
        let outcome = verify("365920");
        assert!(!outcome.success);
        assert!(outcome.output.starts_with("Too many attempts"));

        // A fresh process sees the lockout from the ledger file
        assert!(verify("482910").output.starts_with("Too many attempts"));
        assert!(run(&dir, &["status", "--user", "alice"])
            .output
            .starts_with("alice is locked out"));

        run(&dir, &["reset", "--user", "alice"]);
        assert!(verify("482910").success);
    }

    #[test]
    fn test_verify_rejects_malformed_pin_without_recording() {
        let dir = tempdir().unwrap();
        for pin in ["", "12a456", "12", "111111"] {
            let outcome = run(
                &dir,
                &["verify", "--user", "alice", "--pin", pin, "--reference", "482910"],
            );
            assert!(!outcome.success);
        }

        assert_eq!(
            run(&dir, &["verify", "--user", "alice", "--pin", "", "--reference", "482910"]).output,
            "PIN is required"
        );
        assert_eq!(
            run(&dir, &["status", "--user", "alice"]).output,
            "alice is not locked (3 attempts remaining)"
        );
    }

    #[test]
    fn test_verify_without_reference() {
        let dir = tempdir().unwrap();
        let outcome = run(&dir, &["--json", "verify", "--user", "bob", "--pin", "482910"]);
        assert!(!outcome.success);
        assert_eq!(outcome.output, r#"{"kind":"not_configured"}"#);
    }

    #[test]
    fn test_hash_then_verify() {
        let dir = tempdir().unwrap();
        let phc = run(&dir, &["hash", "482910"]).output;
        let outcome = run(
            &dir,
            &["verify", "--user", "carol", "--pin", "482910", "--reference-hash", &phc],
        );
        assert!(outcome.success);
    }

    #[test]
    fn test_format_time_and_weak() {
        let dir = tempdir().unwrap();
        assert_eq!(run(&dir, &["format-time", "135"]).output, "2m 15s");
        assert_eq!(run(&dir, &["weak", "654321"]).output, "weak");
        assert_eq!(run(&dir, &["--json", "weak", "481902"]).output, r#"{"weak":false}"#);
    }

    #[test]
    fn test_conflicting_references_rejected() {
        let result = Cli::try_parse_from([
            "pinguard",
            "verify",
            "--user",
            "alice",
            "--pin",
            "1",
            "--reference",
            "1",
            "--reference-hash",
            "x",
        ]);
        assert!(result.is_err());
    }
}
