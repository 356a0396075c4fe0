use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

const DATA_DIR_ENV: &str = "OPSDESK_HOME";
const DEFAULT_DATA_DIR: &str = ".opsdesk";

pub const MAX_KEY_PLAN_HORIZON_DAYS: i64 = 366;
pub const MAX_DIGEST_DAYS: u32 = 31;

/// Fallback colors per schedule type when neither a client nor the schedule
/// itself provides one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleColors {
    pub task: String,
    pub meeting: String,
    pub deadline: String,
}

impl Default for ScheduleColors {
    fn default() -> Self {
        Self {
            task: "#10b981".into(),
            meeting: "#3b82f6".into(),
            deadline: "#ef4444".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardSettings {
    /// Days past today still counted as "upcoming" on the key-plan panel.
    pub key_plan_horizon_days: i64,
    pub default_colors: ScheduleColors,
    /// Number of days the digest prints, starting today.
    pub digest_days: u32,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            key_plan_horizon_days: 7,
            default_colors: ScheduleColors::default(),
            digest_days: 1,
        }
    }
}

impl DashboardSettings {
    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_KEY_PLAN_HORIZON_DAYS).contains(&self.key_plan_horizon_days) {
            return Err(anyhow!(
                "key_plan_horizon_days must be between 0 and {MAX_KEY_PLAN_HORIZON_DAYS}"
            ));
        }
        if !(1..=MAX_DIGEST_DAYS).contains(&self.digest_days) {
            return Err(anyhow!("digest_days must be between 1 and {MAX_DIGEST_DAYS}"));
        }
        Ok(())
    }

    /// Out-of-range values from disk fall back to their defaults.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(0..=MAX_KEY_PLAN_HORIZON_DAYS).contains(&self.key_plan_horizon_days) {
            log::warn!(
                "Ignoring key_plan_horizon_days {}, using {}",
                self.key_plan_horizon_days,
                defaults.key_plan_horizon_days
            );
            self.key_plan_horizon_days = defaults.key_plan_horizon_days;
        }
        if !(1..=MAX_DIGEST_DAYS).contains(&self.digest_days) {
            log::warn!(
                "Ignoring digest_days {}, using {}",
                self.digest_days,
                defaults.digest_days
            );
            self.digest_days = defaults.digest_days;
        }
        self
    }
}

/// Resolve the data directory from `OPSDESK_HOME`, else `./.opsdesk`.
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<DashboardSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str::<DashboardSettings>(&contents)
                .unwrap_or_default()
                .sanitized()
        } else {
            DashboardSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> DashboardSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, settings: DashboardSettings) -> Result<()> {
        settings.validate()?;

        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &DashboardSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
