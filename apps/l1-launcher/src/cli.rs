//! # CLI Session
//!
//! Line-oriented rendering surface for a wizard session.
//!
//! Each input line is one command. Blank lines and lines starting with `#`
//! are ignored, so the same parser serves an interactive terminal and a
//! script file.
//!
//! ```text
//! set chain-id 43114
//! next
//! set name My Chain
//! next
//! wallet 0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed
//! next
//! generate
//! next
//! ```

use crate::driver::WizardDriver;
use crate::wallet::StaticWallet;
use anyhow::Context;
use l1_launcher_core::{FieldKey, Navigation, Step, Wizard, WalletProvider};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

// =============================================================================
// COMMANDS
// =============================================================================

/// One parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { key: FieldKey, raw: String },
    Clear(FieldKey),
    /// Connect a wallet; `None` uses the configured provider.
    Wallet(Option<String>),
    Next,
    Back,
    Jump(Step),
    Generate,
    Status { json: bool },
    Show,
    Steps,
    Help,
    Quit,
}

/// Whether the session keeps reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub const HELP: &str = "\
commands:
  set <field> <value>   set a field (chain-id, name, wallet, symbol, alloc)
  clear <field>         remove a field
  wallet [address]      connect a wallet (default: configured provider)
  next                  advance to the next step
  back                  go back one step
  jump <step>           jump to a reached step (id or number)
  generate              generate the genesis document
  status [--json]       show session state
  show                  print the genesis document
  steps                 list steps
  help                  show this help
  quit                  end the session";

/// Parse one input line. `Ok(None)` for blank lines and comments.
pub fn parse_command(line: &str) -> anyhow::Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "set" => {
            let (key, raw) = match rest.split_once(char::is_whitespace) {
                Some((key, raw)) => (key, raw.trim()),
                None => (rest, ""),
            };
            if key.is_empty() {
                anyhow::bail!("usage: set <field> <value>");
            }
            Command::Set {
                key: key.parse()?,
                raw: raw.to_string(),
            }
        }
        "clear" => Command::Clear(rest.parse()?),
        "wallet" | "connect" => Command::Wallet((!rest.is_empty()).then(|| rest.to_string())),
        "next" | "advance" => Command::Next,
        "back" | "prev" => Command::Back,
        "jump" | "goto" => Command::Jump(rest.parse()?),
        "generate" | "gen" => Command::Generate,
        "status" => Command::Status {
            json: rest == "--json",
        },
        "show" => Command::Show,
        "steps" => Command::Steps,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => anyhow::bail!("unknown command '{other}' (try 'help')"),
    };
    Ok(Some(command))
}

// =============================================================================
// COMMAND HANDLERS
// =============================================================================

fn describe(nav: &Navigation) -> String {
    match nav {
        Navigation::Moved { to, .. } => format!("-> {} ({})", to.title(), to.id()),
        Navigation::Denied { reason } => format!("cannot move: {reason}"),
    }
}

/// Render the session state as text or JSON.
pub fn cmd_status(wizard: &Wizard, json: bool) -> anyhow::Result<String> {
    let snapshot = wizard.snapshot();
    if json {
        return serde_json::to_string_pretty(&snapshot).context("failed to serialize snapshot");
    }

    let mut out = format!(
        "step: {} ({}/{}), furthest: {}\n",
        snapshot.current_step.title(),
        snapshot.current_step.index() + 1,
        Step::ALL.len(),
        snapshot.max_advanced_step.title(),
    );
    for (key, entry) in &snapshot.fields {
        let mark = match entry.validation.reason() {
            None => "ok".to_string(),
            Some(reason) => format!("invalid: {reason}"),
        };
        out.push_str(&format!("  {key} = {} [{mark}]\n", entry.value.display()));
    }
    let genesis = match (&snapshot.genesis_string, snapshot.genesis_stale) {
        (None, _) => "none",
        (Some(_), true) => "stale",
        (Some(_), false) => "ready",
    };
    out.push_str(&format!("genesis: {genesis}"));
    if snapshot.is_regenerating {
        out.push_str(" (generating)");
    }
    if let Some(err) = &snapshot.last_genesis_error {
        out.push_str(&format!("\nlast genesis error: {err}"));
    }
    Ok(out)
}

/// List every step with its lock and completion state.
pub fn cmd_steps(wizard: &Wizard) -> String {
    wizard
        .snapshot()
        .steps
        .iter()
        .map(|s| {
            format!(
                "{} {}. {} ({}){}{}",
                if s.current { '>' } else { ' ' },
                s.step.index() + 1,
                s.title,
                s.step.id(),
                if s.unlocked { "" } else { " [locked]" },
                if s.satisfied { " [done]" } else { "" },
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the current, fresh genesis to `path`.
pub fn cmd_write_genesis(wizard: &Wizard, path: &Path) -> anyhow::Result<()> {
    let json = match wizard.fresh_genesis_string() {
        Some(json) => json,
        None if wizard.genesis_string().is_some() => {
            anyhow::bail!("genesis is stale; run 'generate' before writing it")
        }
        None => anyhow::bail!("no genesis has been generated"),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, json).with_context(|| format!("failed to write genesis to {}", path.display()))?;
    info!(path = %path.display(), "genesis written");
    Ok(())
}

/// Execute one command and write its feedback to `out`.
pub async fn execute<W: Write>(
    driver: &WizardDriver,
    wallet: &dyn WalletProvider,
    command: Command,
    out: &mut W,
) -> anyhow::Result<Flow> {
    debug!(?command, "executing");
    match command {
        Command::Set { key, raw } => {
            let validation = driver.lock().await.set_field_raw(key, &raw);
            match validation.reason() {
                None => writeln!(out, "{key}: ok")?,
                Some(reason) => writeln!(out, "{key}: invalid: {reason}")?,
            }
        }
        Command::Clear(key) => {
            let removed = driver.lock().await.clear_field(key);
            writeln!(out, "{key}: {}", if removed.is_some() { "cleared" } else { "not set" })?;
        }
        Command::Wallet(address) => {
            let validation = match address {
                Some(addr) => driver.lock().await.connect_wallet(&StaticWallet::new(addr)),
                None => driver.lock().await.connect_wallet(wallet),
            };
            match validation.reason() {
                None => {
                    let wizard = driver.lock().await;
                    let shown = wizard
                        .field(FieldKey::WalletAddress)
                        .map(|e| e.value.display())
                        .unwrap_or_default();
                    writeln!(out, "wallet connected: {shown}")?;
                }
                Some(reason) => writeln!(out, "wallet not connected: {reason}")?,
            }
        }
        Command::Next => {
            let nav = driver.lock().await.advance();
            writeln!(out, "{}", describe(&nav))?;
        }
        Command::Back => {
            let nav = driver.lock().await.go_back();
            writeln!(out, "{}", describe(&nav))?;
        }
        Command::Jump(step) => {
            let nav = driver.lock().await.jump_to(step);
            writeln!(out, "{}", describe(&nav))?;
        }
        Command::Generate => match driver.regenerate_genesis().await {
            Ok(()) => writeln!(out, "genesis generated")?,
            Err(err) => writeln!(out, "genesis not generated: {err}")?,
        },
        Command::Status { json } => {
            let text = cmd_status(&*driver.lock().await, json)?;
            writeln!(out, "{text}")?;
        }
        Command::Show => {
            let wizard = driver.lock().await;
            match wizard.genesis_string() {
                Some(json) => {
                    if wizard.is_genesis_stale() {
                        writeln!(out, "# stale: inputs changed since generation")?;
                    }
                    writeln!(out, "{json}")?;
                }
                None => writeln!(out, "no genesis generated")?,
            }
        }
        Command::Steps => writeln!(out, "{}", cmd_steps(&*driver.lock().await))?,
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Run a session over `input` until it ends or `quit` is read.
///
/// Unparseable lines are reported to `out` and skipped. Returns the number
/// of commands executed.
pub async fn run_session<R, W>(
    driver: &WizardDriver,
    wallet: &dyn WalletProvider,
    input: R,
    out: &mut W,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut executed = 0;
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(out, "error: {err:#}")?;
                continue;
            }
        };
        executed += 1;
        if execute(driver, wallet, command, out).await? == Flow::Quit {
            break;
        }
    }
    out.flush()?;
    Ok(executed)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(parse_command("# a comment").unwrap(), None);
    }

    #[test]
    fn set_keeps_spaces_in_value() {
        assert_eq!(
            parse_command("set name  My Chain 1 ").unwrap(),
            Some(Command::Set {
                key: FieldKey::L1Name,
                raw: "My Chain 1".into()
            })
        );
    }

    #[test]
    fn aliases_and_arguments() {
        assert_eq!(parse_command("NEXT").unwrap(), Some(Command::Next));
        assert_eq!(parse_command("jump 1").unwrap(), Some(Command::Jump(Step::ChainId)));
        assert_eq!(
            parse_command("jump genesis").unwrap(),
            Some(Command::Jump(Step::Genesis))
        );
        assert_eq!(parse_command("wallet").unwrap(), Some(Command::Wallet(None)));
        assert_eq!(
            parse_command("status --json").unwrap(),
            Some(Command::Status { json: true })
        );
    }

    #[test]
    fn bad_commands_are_errors() {
        assert!(parse_command("launch").is_err());
        assert!(parse_command("set").is_err());
        assert!(parse_command("set colour blue").is_err());
        assert!(parse_command("jump nowhere").is_err());
    }

    #[test]
    fn steps_listing_marks_locked_steps() {
        let listing = cmd_steps(&Wizard::new());
        assert!(listing.starts_with("> 1."));
        assert!(listing.contains("[locked]"));
    }

    #[test]
    fn status_reports_missing_genesis() {
        let text = cmd_status(&Wizard::new(), false).unwrap();
        assert!(text.contains("genesis: none"));
    }
}
