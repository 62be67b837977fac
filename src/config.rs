use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub uploads: UploadConfig,

    pub classifier: ClassifierConfig,

    pub moderation: ModerationConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/gramguard.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    /// Sessions expire after this many minutes without a request.
    pub session_idle_minutes: i64,

    /// Overall request body cap, uploads included.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec![
                "http://localhost:5000".to_string(),
                "http://127.0.0.1:5000".to_string(),
            ],
            secure_cookies: true,
            session_idle_minutes: 60,
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory where post images and profile pictures are written
    pub directory: String,

    /// Served for users who never uploaded a profile picture
    pub default_profile_pic: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            directory: "static/images".to_string(),
            default_profile_pic: "default_profile.png".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// ONNX export of the trained bullying classifier
    pub model_path: String,

    /// JSON object mapping words to embedding indices
    pub vocabulary_path: String,

    /// Length of the index sequence fed to the model
    pub max_len: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: "models/bullying.onnx".to_string(),
            vocabulary_path: "models/word_to_index.json".to_string(),
            max_len: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    /// Reputation assigned at registration
    pub initial_reputation: f64,

    /// Users strictly below this score are restricted
    pub restriction_threshold: f64,

    /// Comments scoring strictly above this are treated as bullying
    pub detection_threshold: f64,

    /// Maximum accepted comment length in characters
    pub max_comment_length: usize,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            initial_reputation: 10.0,
            restriction_threshold: 5.0,
            detection_threshold: 0.4,
            max_comment_length: 2200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Minimum accepted password length at registration
    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            min_password_length: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "gramguard".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("gramguard").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".gramguard").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let moderation = &self.moderation;

        if !(0.0..=1.0).contains(&moderation.detection_threshold) {
            anyhow::bail!("moderation.detection_threshold must be within [0, 1]");
        }

        if moderation.restriction_threshold < 0.0 {
            anyhow::bail!("moderation.restriction_threshold cannot be negative");
        }

        if moderation.initial_reputation < moderation.restriction_threshold {
            anyhow::bail!("moderation.initial_reputation would restrict every new user");
        }

        if self.classifier.max_len == 0 {
            anyhow::bail!("classifier.max_len must be > 0");
        }

        if self.uploads.directory.is_empty() {
            anyhow::bail!("uploads.directory cannot be empty");
        }

        Ok(())
    }
}
