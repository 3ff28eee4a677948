//! Keyboard shortcuts and persisted shortcut overrides.
//!
//! # Responsibility
//! - Parse and print shortcuts (`Ctrl+Shift+Z`).
//! - Hold per-operation overrides and persist them as versioned JSON.
//!
//! # Invariants
//! - Shortcut keys are canonical: single characters upper-case, named keys
//!   in their table spelling, so equal chords compare equal.
//! - An override of `None` unbinds the operation; a missing override keeps
//!   the operation's default shortcut.
//! - The override file format is
//!   `{"version":1,"overrides":[{"operationId":..,"shortcut":..|null}]}`.

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Current override file version.
pub const KEYMAP_FORMAT_VERSION: u32 = 1;

static SHORTCUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*((?:(?:ctrl|control|shift|alt|option)\s*\+\s*)*)([a-z0-9]+)\s*$")
        .expect("valid shortcut regex")
});
static MODIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ctrl|control|shift|alt|option").expect("valid modifier regex"));

const NAMED_KEYS: &[&str] = &[
    "Enter",
    "Escape",
    "Backspace",
    "Delete",
    "Tab",
    "Space",
    "Left",
    "Right",
    "Up",
    "Down",
    "Home",
    "End",
    "PageUp",
    "PageDown",
    "F1",
    "F2",
    "F3",
    "F4",
    "F5",
    "F6",
    "F7",
    "F8",
    "F9",
    "F10",
    "F11",
    "F12",
];

/// Keymap parse and persistence failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeymapError {
    /// Shortcut text does not match `[Mod+]*Key`.
    InvalidShortcut(String),
    /// Key name is neither one character nor a known named key.
    UnknownKey(String),
    UnsupportedVersion(u32),
    Parse(String),
    Io { path: PathBuf, message: String },
}

impl Display for KeymapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidShortcut(value) => write!(f, "invalid shortcut: `{value}`"),
            Self::UnknownKey(value) => write!(f, "unknown key: `{value}`"),
            Self::UnsupportedVersion(version) => write!(
                f,
                "unsupported keymap version {version}; expected {KEYMAP_FORMAT_VERSION}"
            ),
            Self::Parse(message) => write!(f, "invalid keymap json: {message}"),
            Self::Io { path, message } => {
                write!(f, "keymap file `{}`: {message}", path.display())
            }
        }
    }
}

impl Error for KeymapError {}

/// One key chord.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Shortcut {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
}

impl Shortcut {
    /// Plain key without modifiers. The key is canonicalized.
    pub fn key(key: &str) -> Result<Self, KeymapError> {
        Ok(Self {
            key: canonical_key(key)?,
            ctrl: false,
            shift: false,
            alt: false,
        })
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// Parses `Ctrl+Shift+Z` style text. Modifiers are case-insensitive
    /// and may come in any order.
    pub fn parse(value: &str) -> Result<Self, KeymapError> {
        let captures = SHORTCUT_RE
            .captures(value)
            .ok_or_else(|| KeymapError::InvalidShortcut(value.to_string()))?;
        let mut shortcut = Self::key(&captures[2])?;
        for modifier in MODIFIER_RE.find_iter(&captures[1]) {
            match modifier.as_str().to_ascii_lowercase().as_str() {
                "ctrl" | "control" => shortcut.ctrl = true,
                "shift" => shortcut.shift = true,
                _ => shortcut.alt = true,
            }
        }
        Ok(shortcut)
    }

    /// Same chord with the key re-canonicalized (for deserialized input).
    fn normalized(self) -> Result<Self, KeymapError> {
        Ok(Self {
            key: canonical_key(&self.key)?,
            ..self
        })
    }
}

impl Display for Shortcut {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        write!(f, "{}", self.key)
    }
}

fn canonical_key(key: &str) -> Result<String, KeymapError> {
    let trimmed = key.trim();
    let mut chars = trimmed.chars();
    if let (Some(single), None) = (chars.next(), chars.next()) {
        if single.is_ascii_alphanumeric() {
            return Ok(single.to_ascii_uppercase().to_string());
        }
    }
    NAMED_KEYS
        .iter()
        .find(|name| name.eq_ignore_ascii_case(trimmed))
        .map(|name| (*name).to_string())
        .ok_or_else(|| KeymapError::UnknownKey(trimmed.to_string()))
}

#[derive(Debug, Serialize, Deserialize)]
struct OverrideEntry {
    #[serde(rename = "operationId", alias = "operation_id")]
    operation_id: String,
    shortcut: Option<Shortcut>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OverrideFile {
    version: u32,
    #[serde(default)]
    overrides: Vec<OverrideEntry>,
}

/// Per-operation shortcut overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keymap {
    overrides: BTreeMap<String, Option<Shortcut>>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds (`Some`) or unbinds (`None`) one operation.
    pub fn set_override(&mut self, operation_id: impl Into<String>, shortcut: Option<Shortcut>) {
        self.overrides.insert(operation_id.into(), shortcut);
    }

    /// Drops one override so the default applies again.
    pub fn reset(&mut self, operation_id: &str) -> bool {
        self.overrides.remove(operation_id).is_some()
    }

    pub fn clear(&mut self) {
        self.overrides.clear();
    }

    /// `Some(override)` when the operation is overridden, even to unbound.
    pub fn override_for(&self, operation_id: &str) -> Option<Option<&Shortcut>> {
        self.overrides.get(operation_id).map(Option::as_ref)
    }

    /// Shortcut in effect given the operation's default.
    pub fn effective<'a>(
        &'a self,
        operation_id: &str,
        default: Option<&'a Shortcut>,
    ) -> Option<&'a Shortcut> {
        match self.override_for(operation_id) {
            Some(overridden) => overridden,
            None => default,
        }
    }

    /// Overridden operation ids, sorted.
    pub fn overridden_ids(&self) -> impl Iterator<Item = &str> {
        self.overrides.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Parses the versioned override document.
    ///
    /// # Errors
    /// - `Parse` for malformed JSON.
    /// - `UnsupportedVersion` for any version other than 1.
    /// - `UnknownKey` when a stored shortcut names an unknown key.
    pub fn from_json_str(value: &str) -> Result<Self, KeymapError> {
        let file: OverrideFile =
            serde_json::from_str(value).map_err(|err| KeymapError::Parse(err.to_string()))?;
        if file.version != KEYMAP_FORMAT_VERSION {
            return Err(KeymapError::UnsupportedVersion(file.version));
        }
        let mut keymap = Self::new();
        for entry in file.overrides {
            let shortcut = entry.shortcut.map(Shortcut::normalized).transpose()?;
            keymap.set_override(entry.operation_id, shortcut);
        }
        Ok(keymap)
    }

    /// Serializes the versioned override document.
    pub fn to_json_string(&self) -> Result<String, KeymapError> {
        let file = OverrideFile {
            version: KEYMAP_FORMAT_VERSION,
            overrides: self
                .overrides
                .iter()
                .map(|(operation_id, shortcut)| OverrideEntry {
                    operation_id: operation_id.clone(),
                    shortcut: shortcut.clone(),
                })
                .collect(),
        };
        serde_json::to_string_pretty(&file).map_err(|err| KeymapError::Parse(err.to_string()))
    }

    /// Loads overrides from a file. A missing file yields an empty keymap.
    pub fn load_file(path: &Path) -> Result<Self, KeymapError> {
        if !path.exists() {
            debug!(
                "event=keymap_load module=keymap status=skipped reason=missing_file path={}",
                path.display()
            );
            return Ok(Self::new());
        }
        let text = std::fs::read_to_string(path).map_err(|err| KeymapError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let keymap = Self::from_json_str(&text)?;
        info!(
            "event=keymap_load module=keymap status=ok overrides={}",
            keymap.len()
        );
        Ok(keymap)
    }

    /// Writes overrides to a file, creating parent directories.
    pub fn save_file(&self, path: &Path) -> Result<(), KeymapError> {
        let io_error = |err: std::io::Error| KeymapError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(path, self.to_json_string()?).map_err(io_error)?;
        info!(
            "event=keymap_save module=keymap status=ok overrides={}",
            self.len()
        );
        Ok(())
    }
}
