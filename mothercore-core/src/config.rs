use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub logbook: LogbookConfig,
    #[serde(default)]
    pub plans: PlansConfig,
    #[serde(default)]
    pub constitution: ConstitutionConfig,
    #[serde(default)]
    pub policies: PoliciesConfig,
}

impl CoreConfig {
    /// Read `<root>/config.toml` if present, otherwise defaults.
    /// Relative paths are resolved against `root` either way.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join("config.toml");
        let mut cfg = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str::<CoreConfig>(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else {
            tracing::info!(
                "No config file found at {}. Using CoreConfig::default().",
                path.display()
            );
            CoreConfig::default()
        };
        cfg.resolve_paths(root);
        Ok(cfg)
    }

    /// Defaults rooted at `root`, without looking for a config file.
    pub fn rooted_at(root: &Path) -> Self {
        let mut cfg = CoreConfig::default();
        cfg.resolve_paths(root);
        cfg
    }

    fn resolve_paths(&mut self, root: &Path) {
        self.memory.path = absolutize(root, &self.memory.path);
        self.logbook.audit = absolutize(root, &self.logbook.audit);
        self.plans.dir = absolutize(root, &self.plans.dir);
        self.constitution.path = absolutize(root, &self.constitution.path);
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            system: SystemConfig::default(),
            memory: MemoryConfig::default(),
            logbook: LogbookConfig::default(),
            plans: PlansConfig::default(),
            constitution: ConstitutionConfig::default(),
            policies: PoliciesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "SystemConfig::default_name")]
    pub name: String,
    #[serde(default = "SystemConfig::default_version")]
    pub version: String,
}

impl SystemConfig {
    fn default_name() -> String {
        "Oracle-Mother".to_string()
    }

    fn default_version() -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            version: Self::default_version(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "MemoryConfig::default_path")]
    pub path: PathBuf,
}

impl MemoryConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("memory.jsonl")
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogbookConfig {
    #[serde(default = "LogbookConfig::default_audit")]
    pub audit: PathBuf,
}

impl LogbookConfig {
    fn default_audit() -> PathBuf {
        PathBuf::from("audit.log.jsonl")
    }
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            audit: Self::default_audit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlansConfig {
    #[serde(default = "PlansConfig::default_dir")]
    pub dir: PathBuf,
}

impl PlansConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("plans")
    }
}

impl Default for PlansConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConstitutionConfig {
    #[serde(default = "ConstitutionConfig::default_path")]
    pub path: PathBuf,
}

impl ConstitutionConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("constitution.json")
    }
}

impl Default for ConstitutionConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoliciesConfig {
    #[serde(default = "PoliciesConfig::default_search_k")]
    pub search_k: usize,
    #[serde(default = "PoliciesConfig::default_reflect_window")]
    pub reflect_window: usize,
    #[serde(default = "PoliciesConfig::default_preview_len")]
    pub preview_len: usize,
    #[serde(default = "PoliciesConfig::default_summary_sentences")]
    pub summary_sentences: usize,
    #[serde(default = "PoliciesConfig::default_topic_len")]
    pub topic_len: usize,
}

impl PoliciesConfig {
    fn default_search_k() -> usize {
        5
    }

    fn default_reflect_window() -> usize {
        3
    }

    fn default_preview_len() -> usize {
        120
    }

    fn default_summary_sentences() -> usize {
        3
    }

    fn default_topic_len() -> usize {
        80
    }
}

impl Default for PoliciesConfig {
    fn default() -> Self {
        Self {
            search_k: Self::default_search_k(),
            reflect_window: Self::default_reflect_window(),
            preview_len: Self::default_preview_len(),
            summary_sentences: Self::default_summary_sentences(),
            topic_len: Self::default_topic_len(),
        }
    }
}

fn absolutize(root: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        root.join(value)
    }
}
