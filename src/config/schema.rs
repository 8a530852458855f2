use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::session::{SessionContext, SessionUser, UserRole};
use crate::error::ConfigError;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (`~/.moodwell`) - computed from home, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub companion: CompanionConfig,

    #[serde(default)]
    pub offline: OfflineConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

// ── Remote store ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Firebase project id
    #[serde(default)]
    pub project_id: String,
    /// Web API key, sent as `?key=`
    #[serde(default)]
    pub api_key: Option<String>,
    /// Override for emulators and tests
    #[serde(default)]
    pub base_url: Option<String>,
    /// Bounded wait for each remote write
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,
}

fn default_write_timeout_secs() -> u64 {
    8
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: None,
            base_url: None,
            write_timeout_secs: default_write_timeout_secs(),
        }
    }
}

// ── Companion ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_companion_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_companion_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_phrase_max_chars")]
    pub phrase_max_chars: usize,
}

fn default_companion_model() -> String {
    crate::core::companion::gemini::DEFAULT_GEMINI_MODEL.to_string()
}

fn default_companion_timeout_secs() -> u64 {
    15
}

fn default_phrase_max_chars() -> usize {
    120
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_companion_model(),
            base_url: None,
            timeout_secs: default_companion_timeout_secs(),
            phrase_max_chars: default_phrase_max_chars(),
        }
    }
}

// ── Offline queue ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineConfig {
    /// Storage file, relative to the data directory unless absolute
    #[serde(default = "default_storage_file")]
    pub storage_file: String,
    /// Bounded wait for each replayed action
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,
}

fn default_storage_file() -> String {
    "offline_storage.json".into()
}

fn default_action_timeout_secs() -> u64 {
    8
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            storage_file: default_storage_file(),
            action_timeout_secs: default_action_timeout_secs(),
        }
    }
}

// ── Session ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

impl SessionConfig {
    pub fn to_context(&self) -> SessionContext {
        match self.uid.as_deref().map(str::trim) {
            Some(uid) if !uid.is_empty() => SessionContext::signed_in(SessionUser {
                uid: uid.to_string(),
                email: self.email.clone(),
                username: self.username.clone(),
                id_token: self.id_token.clone(),
                role: self.role,
            }),
            _ => SessionContext::anonymous(),
        }
    }
}

// ── Config impl ──────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let data_dir = home.join(".moodwell");

        Self {
            config_path: data_dir.join("config.toml"),
            data_dir,
            remote: RemoteConfig::default(),
            companion: CompanionConfig::default(),
            offline: OfflineConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        Self::load_or_init_in(&home.join(".moodwell"))
    }

    /// Loads `config.toml` from `data_dir`, writing defaults there first if
    /// it does not exist yet.
    pub fn load_or_init_in(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join("config.toml");

        if !data_dir.exists() {
            fs::create_dir_all(data_dir).context("Failed to create .moodwell directory")?;
        }

        let config = if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path.clone_from(&config_path);
            config.data_dir = data_dir.to_path_buf();
            config
        } else {
            let config = Self {
                config_path,
                data_dir: data_dir.to_path_buf(),
                ..Self::default()
            };
            config.save()?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("remote.write_timeout_secs", self.remote.write_timeout_secs),
            ("offline.action_timeout_secs", self.offline.action_timeout_secs),
            ("companion.timeout_secs", self.companion.timeout_secs),
            (
                "companion.phrase_max_chars",
                u64::try_from(self.companion.phrase_max_chars).unwrap_or(u64::MAX),
            ),
        ];
        match positive.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigError::Validation(format!(
                "{name} must be greater than 0"
            ))),
            None => Ok(()),
        }
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        // Project: MOODWELL_PROJECT_ID
        if let Ok(project) = std::env::var("MOODWELL_PROJECT_ID")
            && !project.is_empty()
        {
            self.remote.project_id = project;
        }

        // Firebase key: MOODWELL_FIREBASE_API_KEY
        if let Ok(key) = std::env::var("MOODWELL_FIREBASE_API_KEY")
            && !key.is_empty()
        {
            self.remote.api_key = Some(key);
        }

        // Gemini key: MOODWELL_GEMINI_API_KEY or GEMINI_API_KEY
        if let Ok(key) =
            std::env::var("MOODWELL_GEMINI_API_KEY").or_else(|_| std::env::var("GEMINI_API_KEY"))
            && !key.is_empty()
        {
            self.companion.api_key = Some(key);
        }

        // Model: MOODWELL_MODEL
        if let Ok(model) = std::env::var("MOODWELL_MODEL")
            && !model.is_empty()
        {
            self.companion.model = model;
        }

        // Signed-in user: MOODWELL_UID / MOODWELL_ID_TOKEN
        if let Ok(uid) = std::env::var("MOODWELL_UID")
            && !uid.is_empty()
        {
            self.session.uid = Some(uid);
        }
        if let Ok(token) = std::env::var("MOODWELL_ID_TOKEN")
            && !token.is_empty()
        {
            self.session.id_token = Some(token);
        }

        // Write timeout: MOODWELL_WRITE_TIMEOUT_SECS
        if let Ok(raw) = std::env::var("MOODWELL_WRITE_TIMEOUT_SECS")
            && let Ok(secs) = raw.parse::<u64>()
            && secs > 0
        {
            self.remote.write_timeout_secs = secs;
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        let file = Path::new(&self.offline.storage_file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
