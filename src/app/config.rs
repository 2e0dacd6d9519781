use crate::app::models::{OutputOptions, PathStyle, ScanOptions, TypeRules};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything persisted between runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub include_path: bool,
    pub use_xml_tags: bool,
    pub respect_gitignore: bool,
    pub allowed: BTreeSet<String>,
    pub blocked: BTreeSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let rules = TypeRules::default();
        Self {
            include_path: true,
            use_xml_tags: true,
            respect_gitignore: false,
            allowed: rules.allowed,
            blocked: rules.blocked,
        }
    }
}

impl Settings {
    /// Brings hand-edited type lists into the form `TypeRules::classify`
    /// expects, dropping entries that normalize to nothing.
    fn normalize_types(&mut self) {
        for list in [&mut self.allowed, &mut self.blocked] {
            *list = list.iter().filter_map(|t| TypeRules::normalize(t)).collect();
        }
    }

    pub fn rules(&self) -> TypeRules {
        TypeRules {
            allowed: self.allowed.clone(),
            blocked: self.blocked.clone(),
        }
    }

    pub fn set_rules(&mut self, rules: TypeRules) {
        self.allowed = rules.allowed;
        self.blocked = rules.blocked;
    }

    pub fn output_options(&self, path_style: PathStyle) -> OutputOptions {
        OutputOptions {
            include_path: self.include_path,
            use_xml_tags: self.use_xml_tags,
            path_style,
        }
    }

    pub fn scan_options(&self, exclude: Vec<String>) -> ScanOptions {
        ScanOptions {
            respect_gitignore: self.respect_gitignore,
            exclude,
        }
    }
}

/// `~/.config/file_summarizer/settings.toml`
pub fn default_settings_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home
        .join(".config")
        .join("file_summarizer")
        .join("settings.toml"))
}

fn read_settings(path: &Path) -> Result<Settings> {
    let content =
        fs::read_to_string(path).context(format!("Failed to read settings at {:?}", path))?;
    let mut settings: Settings =
        toml::from_str(&content).context("Failed to parse settings.toml")?;
    settings.normalize_types();
    Ok(settings)
}

/// Loads the settings file, falling back to defaults on any problem.
pub fn load_settings(path: &Path) -> Settings {
    if !path.exists() {
        log::debug!("No settings at {:?}, using defaults", path);
        return Settings::default();
    }

    match read_settings(path) {
        Ok(settings) => {
            log::debug!("Settings loaded from {:?}", path);
            settings
        }
        Err(e) => {
            log::error!("Error loading settings: {:#}", e);
            Settings::default()
        }
    }
}

fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(format!("Failed to create {:?}", parent))?;
    }
    let content = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
    fs::write(path, content).context(format!("Failed to write settings at {:?}", path))?;
    Ok(())
}

/// Persists the settings. Failures are logged and reported as `false`.
pub fn save_settings(path: &Path, settings: &Settings) -> bool {
    match write_settings(path, settings) {
        Ok(()) => {
            log::info!("Settings saved to {:?}", path);
            true
        }
        Err(e) => {
            log::error!("Error saving settings: {:#}", e);
            false
        }
    }
}
