// Declare modules
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod formatter;
pub mod models;
pub mod scanner;
pub mod session;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::fs::OpenOptions;
use std::path::Path;
use std::time::Duration;

use self::cli::{Cli, Command, TypesCommand};
use self::clipboard::{deliver, Destination};
use self::config::{default_settings_path, load_settings, save_settings, Settings};
use self::formatter::OutputGenerator;
use self::models::PathStyle;
use self::scanner::Scanner;
use self::session::Session;

/// Initializes components and orchestrates data flow.
pub fn run() -> Result<()> {
    // 1. Parse Args
    let args = Cli::parse();
    init_logging(args.log_file.as_deref());

    // 2. Load persisted settings
    let settings_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => default_settings_path()
            .map_err(|e| log::error!("{:#}; settings will not be persisted", e))
            .ok(),
    };
    let mut settings = match &settings_path {
        Some(path) => load_settings(path),
        None => Settings::default(),
    };

    if let Some(Command::Types(cmd)) = &args.command {
        manage_types(cmd, &mut settings, settings_path.as_deref());
        return Ok(());
    }

    apply_toggles(&args, &mut settings, settings_path.as_deref());

    if args.paths.is_empty() {
        log::warn!("💡 Tip: pass files or directories to collect.");
        return Ok(());
    }

    // 3. Collect
    let rules = settings.rules();
    let progress = collect_spinner()?;
    let scanner = Scanner::new(&rules, &settings.scan_options(args.exclude.clone()))?
        .with_progress(progress.clone());
    let mut session = Session::new();
    let (added, skipped) = session.add_paths(&scanner, &args.paths);
    progress.finish_and_clear();
    log::info!("Added {} file{}", added, plural(added));
    if !skipped.is_empty() {
        log::warn!("⚠️ Skipped {} unreadable path{}", skipped.len(), plural(skipped.len()));
    }

    let deselected = session.deselect_matching(&args.skip)?;
    if deselected > 0 {
        log::info!("Left {} file{} unselected", deselected, plural(deselected));
    }

    let selected = session.selected();
    if selected.is_empty() {
        log::warn!("⚠️ No files selected to copy.");
        return Ok(());
    }

    if args.list {
        for entry in &selected {
            println!("{}\t{}", entry.key, entry.path.display());
        }
        return Ok(());
    }

    // 4. Format
    let path_style = if args.relative {
        PathStyle::relative_to(env::current_dir().context("Failed to get current directory")?)
    } else {
        PathStyle::Absolute
    };
    let output = OutputGenerator::format(&selected, &settings.output_options(path_style));

    if output.files_included == 0 {
        log::warn!("⚠️ No eligible files found, or all files were unreadable.");
        return Ok(());
    }
    if output.files_included < selected.len() {
        log::warn!(
            "⚠️ {} of {} files could not be read",
            selected.len() - output.files_included,
            selected.len()
        );
    }

    // 5. Deliver
    let destination = if args.stdout {
        Destination::Stdout
    } else {
        Destination::Clipboard
    };
    if deliver(&output.text, destination)? == Destination::Clipboard {
        log::info!(
            "📋 Copied content from {} files, totaling {} characters.",
            output.files_included,
            output.total_chars
        );
    }

    Ok(())
}

/// Spinner on stderr while paths are walked; hidden when stderr is not a tty.
fn collect_spinner() -> Result<ProgressBar> {
    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::with_template(
        "{spinner:.green} 📂 {pos} files {wide_msg:.dim}",
    )?);
    progress.enable_steady_tick(Duration::from_millis(100));
    Ok(progress)
}

fn init_logging(log_file: Option<&Path>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    let mut open_error = None;
    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => open_error = Some((path.to_path_buf(), e)),
        }
    }

    builder.init();

    if let Some((path, e)) = open_error {
        log::warn!("Could not open log file {:?}: {}", path, e);
    }
}

/// Applies `--xml/--no-xml` and `--path/--no-path`, saving only on change.
fn apply_toggles(args: &Cli, settings: &mut Settings, path: Option<&Path>) {
    let mut changed = false;

    if let Some(xml) = args.xml_override() {
        if settings.use_xml_tags != xml {
            settings.use_xml_tags = xml;
            log::info!("XML format {}.", if xml { "enabled" } else { "disabled" });
            changed = true;
        }
    }
    if let Some(with_path) = args.path_override() {
        if settings.include_path != with_path {
            settings.include_path = with_path;
            log::info!("Filepath {}.", if with_path { "enabled" } else { "disabled" });
            changed = true;
        }
    }

    if changed {
        persist(path, settings);
    }
}

fn manage_types(cmd: &TypesCommand, settings: &mut Settings, path: Option<&Path>) {
    let mut rules = settings.rules();

    let changed = match cmd {
        TypesCommand::List => {
            println!("allowed: {}", join(&rules.allowed));
            println!("blocked: {}", join(&rules.blocked));
            return;
        }
        TypesCommand::Allow { types } => apply_each(types, |t| rules.allow(t)),
        TypesCommand::Disallow { types } => apply_each(types, |t| rules.disallow(t)),
        TypesCommand::Block { types } => apply_each(types, |t| rules.block(t)),
        TypesCommand::Unblock { types } => apply_each(types, |t| rules.unblock(t)),
        TypesCommand::Reset => {
            let changed = rules.reset();
            if changed {
                log::info!("Reset file types to default.");
            }
            changed
        }
    };

    if changed {
        settings.set_rules(rules);
        persist(path, settings);
    } else {
        log::info!("File types unchanged.");
    }
}

fn apply_each(types: &[String], mut op: impl FnMut(&str) -> bool) -> bool {
    let mut changed = false;
    for t in types {
        if op(t) {
            log::info!("Updated file type: {}", t);
            changed = true;
        }
    }
    changed
}

fn persist(path: Option<&Path>, settings: &Settings) {
    if let Some(path) = path {
        save_settings(path, settings);
    }
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_toggles_persist_only_on_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        let mut settings = Settings::default();

        let args = Cli::parse_from(["file_summarizer", "--xml", "--path"]);
        apply_toggles(&args, &mut settings, Some(path.as_path()));
        assert!(!path.exists());

        let args = Cli::parse_from(["file_summarizer", "--no-xml"]);
        apply_toggles(&args, &mut settings, Some(path.as_path()));
        assert!(!settings.use_xml_tags);
        assert!(!load_settings(&path).use_xml_tags);
    }

    #[test]
    fn test_manage_types_persists_rules() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        let mut settings = Settings::default();

        let add = TypesCommand::Allow {
            types: vec!["rs".to_string(), ".py".to_string()],
        };
        manage_types(&add, &mut settings, Some(path.as_path()));
        assert!(settings.allowed.contains(".rs"));
        assert!(load_settings(&path).allowed.contains(".rs"));

        manage_types(&TypesCommand::Reset, &mut settings, Some(path.as_path()));
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn test_collect_spinner_template_parses() {
        let progress = collect_spinner().unwrap();
        progress.inc(3);
        assert_eq!(progress.position(), 3);
        progress.finish_and_clear();
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1), "");
        assert_eq!(plural(0), "s");
        assert_eq!(plural(3), "s");
    }
}
