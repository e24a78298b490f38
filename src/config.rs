//! Run configuration
//!
//! Host-level settings consumed by the runner and the browser backend. Only
//! the timeouts and settle delays reach workflow logic; browser, viewport and
//! artifact policies are passed through to the backend.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{WorkflowError, WorkflowResult};

/// Production address of the application under test
pub const DEFAULT_BASE_URL: &str = "https://k12-harmony-hub.lovable.app";

/// Browser engine to launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
        };
        f.write_str(name)
    }
}

impl FromStr for Browser {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Self::Chromium),
            "firefox" => Ok(Self::Firefox),
            "webkit" | "safari" => Ok(Self::Webkit),
            other => Err(WorkflowError::Config(format!("unknown browser: {other}"))),
        }
    }
}

/// When the host keeps a failure artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactPolicy {
    Off,
    On,
    OnlyOnFailure,
    RetainOnFailure,
    OnFirstRetry,
}

/// Artifact capture policies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Artifacts {
    pub screenshot: ArtifactPolicy,
    pub video: ArtifactPolicy,
    pub trace: ArtifactPolicy,
}

impl Default for Artifacts {
    fn default() -> Self {
        Self {
            screenshot: ArtifactPolicy::OnlyOnFailure,
            video: ArtifactPolicy::RetainOnFailure,
            trace: ArtifactPolicy::OnFirstRetry,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Timeouts in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Whole-scenario budget
    pub test_ms: u64,
    /// Assertion retry budget
    pub expect_ms: u64,
    /// Waits on modals, options and other action targets
    pub action_ms: u64,
    /// Screen load until its title is visible
    pub navigation_ms: u64,
    /// Interval between predicate probes
    pub poll_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            test_ms: 30_000,
            expect_ms: 5_000,
            action_ms: 10_000,
            navigation_ms: 20_000,
            poll_ms: 100,
        }
    }
}

impl Timeouts {
    pub fn test(&self) -> Duration {
        Duration::from_millis(self.test_ms)
    }

    pub fn expect(&self) -> Duration {
        Duration::from_millis(self.expect_ms)
    }

    pub fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

/// Fixed delays used where the application exposes no completion signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleDelays {
    /// Schedule panel re-render after a calendar day is clicked
    pub day_select_ms: u64,
    /// Client-side list filtering after typing a search term
    pub search_ms: u64,
    /// List refresh after a form is committed
    pub refresh_ms: u64,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            day_select_ms: 500,
            search_ms: 500,
            refresh_ms: 1_000,
        }
    }
}

impl SettleDelays {
    pub fn day_select(&self) -> Duration {
        Duration::from_millis(self.day_select_ms)
    }

    pub fn search(&self) -> Duration {
        Duration::from_millis(self.search_ms)
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

/// Execution configuration for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    /// Scenarios executed concurrently, each in its own browsing context
    pub workers: usize,
    /// Extra attempts for a failed scenario
    pub retries: u32,
    pub viewport: Viewport,
    pub timeouts: Timeouts,
    pub settle: SettleDelays,
    pub artifacts: Artifacts,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            browser: Browser::default(),
            headless: true,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            retries: 0,
            viewport: Viewport::default(),
            timeouts: Timeouts::default(),
            settle: SettleDelays::default(),
            artifacts: Artifacts::default(),
        }
    }
}

impl RunConfig {
    /// Configuration for the in-memory application: no settle delays and
    /// short budgets, since nothing renders asynchronously.
    pub fn offline() -> Self {
        Self {
            base_url: "http://harmony.test".to_string(),
            workers: 4,
            timeouts: Timeouts {
                test_ms: 5_000,
                expect_ms: 200,
                action_ms: 200,
                navigation_ms: 200,
                poll_ms: 10,
            },
            settle: SettleDelays {
                day_select_ms: 0,
                search_ms: 0,
                refresh_ms: 0,
            },
            ..Self::default()
        }
    }

    /// Load configuration from a YAML or JSON file, chosen by extension
    pub fn load(path: &Path) -> WorkflowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let config = match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            _ => {
                return Err(WorkflowError::Config(format!(
                    "unsupported config format: {}",
                    path.display()
                )));
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> WorkflowResult<Self> {
        serde_yaml::from_str(content).map_err(|e| WorkflowError::Config(e.to_string()))
    }

    pub fn from_json_str(content: &str) -> WorkflowResult<Self> {
        serde_json::from_str(content).map_err(|e| WorkflowError::Config(e.to_string()))
    }

    /// Reject settings no run can honour
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(WorkflowError::Config("base_url is empty".to_string()));
        }
        if self.workers == 0 {
            return Err(WorkflowError::Config("workers must be at least 1".to_string()));
        }
        if self.timeouts.poll_ms == 0 {
            return Err(WorkflowError::Config("poll_ms must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> WorkflowResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// Recognised: `HARMONY_BASE_URL`, `BROWSER`, `HARMONY_WORKERS`,
    /// `HARMONY_RETRIES`, and `GITHUB_ACTIONS`/`CI` which switch to the
    /// CI profile (2 workers, 2 retries, traces kept on failure).
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> WorkflowResult<Self> {
        if lookup("GITHUB_ACTIONS").is_some() || lookup("CI").is_some() {
            self.workers = 2;
            self.retries = 2;
            self.artifacts.trace = ArtifactPolicy::RetainOnFailure;
        }
        if let Some(url) = lookup("HARMONY_BASE_URL") {
            self.base_url = url;
        }
        if let Some(browser) = lookup("BROWSER") {
            self.browser = browser.parse()?;
        }
        if let Some(workers) = lookup("HARMONY_WORKERS") {
            self.workers = workers
                .parse()
                .map_err(|_| WorkflowError::Config(format!("invalid HARMONY_WORKERS: {workers}")))?;
        }
        if let Some(retries) = lookup("HARMONY_RETRIES") {
            self.retries = retries
                .parse()
                .map_err(|_| WorkflowError::Config(format!("invalid HARMONY_RETRIES: {retries}")))?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Absolute URL for a screen path such as `/schedule`
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_host_profile() {
        let config = RunConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeouts.test(), Duration::from_secs(30));
        assert_eq!(config.timeouts.expect(), Duration::from_secs(5));
        assert_eq!(config.timeouts.action(), Duration::from_secs(10));
        assert_eq!(config.timeouts.navigation(), Duration::from_secs(20));
        assert_eq!(config.viewport, Viewport { width: 1920, height: 1080 });
        assert_eq!(config.retries, 0);
        assert!(config.workers >= 1);
        assert_eq!(config.artifacts.screenshot, ArtifactPolicy::OnlyOnFailure);
    }

    #[test]
    fn url_joins_without_double_slash() {
        let mut config = RunConfig::default();
        config.base_url = "http://localhost:8080/".to_string();
        assert_eq!(config.url("/schedule"), "http://localhost:8080/schedule");
        assert_eq!(config.url("students"), "http://localhost:8080/students");
    }

    #[test]
    fn yaml_overrides_only_named_fields() {
        let config = RunConfig::from_yaml_str(
            "base_url: http://staging.example\nbrowser: firefox\ntimeouts:\n  expect_ms: 750\n",
        )
        .expect("parse yaml");
        assert_eq!(config.base_url, "http://staging.example");
        assert_eq!(config.browser, Browser::Firefox);
        assert_eq!(config.timeouts.expect_ms, 750);
        assert_eq!(config.timeouts.action_ms, 10_000);
        assert_eq!(config.settle, SettleDelays::default());
    }

    #[test]
    fn json_artifact_policies_are_kebab_case() {
        let config = RunConfig::from_json_str(
            r#"{"artifacts": {"screenshot": "on", "video": "off", "trace": "retain-on-failure"}}"#,
        )
        .expect("parse json");
        assert_eq!(config.artifacts.screenshot, ArtifactPolicy::On);
        assert_eq!(config.artifacts.video, ArtifactPolicy::Off);
        assert_eq!(config.artifacts.trace, ArtifactPolicy::RetainOnFailure);
    }

    #[test]
    fn load_picks_format_by_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let yaml = dir.path().join("run.yaml");
        std::fs::write(&yaml, "retries: 3\n").expect("write yaml");
        assert_eq!(RunConfig::load(&yaml).expect("load yaml").retries, 3);

        let json = dir.path().join("run.json");
        std::fs::write(&json, r#"{"workers": 6}"#).expect("write json");
        assert_eq!(RunConfig::load(&json).expect("load json").workers, 6);

        let toml = dir.path().join("run.toml");
        std::fs::write(&toml, "retries = 1").expect("write toml");
        assert!(matches!(
            RunConfig::load(&toml),
            Err(WorkflowError::Config(_))
        ));
    }

    #[test]
    fn load_rejects_zero_workers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.yml");
        std::fs::write(&path, "workers: 0\n").expect("write");
        assert!(matches!(RunConfig::load(&path), Err(WorkflowError::Config(_))));
    }

    #[test]
    fn ci_profile_applies_before_explicit_overrides() {
        let config = RunConfig::default()
            .with_overrides_from(env(&[("GITHUB_ACTIONS", "true"), ("HARMONY_WORKERS", "3")]))
            .expect("overrides");
        assert_eq!(config.workers, 3);
        assert_eq!(config.retries, 2);
        assert_eq!(config.artifacts.trace, ArtifactPolicy::RetainOnFailure);
    }

    #[test]
    fn browser_and_base_url_overrides() {
        let config = RunConfig::default()
            .with_overrides_from(env(&[
                ("BROWSER", "WebKit"),
                ("HARMONY_BASE_URL", "http://127.0.0.1:9000"),
            ]))
            .expect("overrides");
        assert_eq!(config.browser, Browser::Webkit);
        assert_eq!(config.url("/students"), "http://127.0.0.1:9000/students");
    }

    #[test]
    fn invalid_override_is_a_config_error() {
        let err = RunConfig::default()
            .with_overrides_from(env(&[("BROWSER", "netscape")]))
            .expect_err("should reject");
        assert_eq!(err.to_string(), "configuration error: unknown browser: netscape");
    }

    #[test]
    fn offline_profile_has_no_settle_delays() {
        let config = RunConfig::offline();
        assert_eq!(config.settle.day_select(), Duration::ZERO);
        assert_eq!(config.settle.refresh(), Duration::ZERO);
        assert!(config.validate().is_ok());
    }
}
