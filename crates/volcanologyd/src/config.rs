//! Daemon configuration
//!
//! Loaded from a TOML file (default `config/volcanology.toml`):
//!
//! ```toml
//! [jenkins]
//! server = "jenkins.local"
//! port = 8080
//! view = "Main"
//!
//! [hours]
//! start = 8
//! end = 18
//!
//! [scan]
//! poll_interval_secs = 30
//! streak_threshold = 6
//!
//! [holidays]
//! calendar = "us"            # us, none
//! extra = ["2026-12-24"]
//!
//! [job_status]               # optional, Jenkins colours by default
//! red = "failing"
//! blue = "success"
//! blue_anime = "building"
//!
//! [indicators]
//! enabled = true
//! failure = ["red_lamp"]
//! success = ["green_lamp"]
//!
//! [hs100.red_lamp]
//! ip = "10.0.0.21"
//!
//! [photon.bubbles]
//! device_id = "..."
//! access_token = "..."
//! function = "status"
//! ```
//!
//! Every problem is reported at startup; nothing here is re-read while
//! running.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use volcanology_core::{
    Aggregator, BusinessHoursGate, CombinedCalendar, DateSet, DeviceRole, HolidayCalendar,
    IndicatorRouter, NoHolidays, Scanner, StatusCodeMap, SystemClock, UsFederalHolidays,
    DEFAULT_POLL_INTERVAL, DEFAULT_STREAK_THRESHOLD,
};
use volcanology_devices::{
    Hs100Config, Hs100Plug, JenkinsConfig, JenkinsFeed, PhotonConfig, PhotonStatus,
};

/// Full daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub jenkins: JenkinsConfig,
    pub hours: HoursConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub holidays: HolidaysConfig,
    /// Raw status code → category name
    #[serde(default)]
    pub job_status: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub indicators: IndicatorsConfig,
    #[serde(default)]
    pub hs100: BTreeMap<String, Hs100Config>,
    #[serde(default)]
    pub photon: BTreeMap<String, PhotonConfig>,
}

/// Inclusive business-hour bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoursConfig {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Successes a job must exceed before a streak fires
    #[serde(default = "default_streak_threshold")]
    pub streak_threshold: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            poll_interval_secs: default_poll_interval_secs(),
            streak_threshold: default_streak_threshold(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_streak_threshold() -> u32 {
    DEFAULT_STREAK_THRESHOLD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarKind {
    #[default]
    Us,
    None,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolidaysConfig {
    #[serde(default)]
    pub calendar: CalendarKind,
    /// Additional ISO dates
    #[serde(default)]
    pub extra: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorsConfig {
    /// Master switch; when false no device is touched
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub failure: Vec<String>,
    #[serde(default)]
    pub success: Vec<String>,
    /// Trackers that receive the status; all photons when absent
    #[serde(default)]
    pub status: Option<Vec<String>>,
}

impl DaemonConfig {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::parse(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn parse(raw: &str) -> Result<Self> {
        let config: DaemonConfig = toml::from_str(raw).context("malformed TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that can be checked without touching the network.
    pub fn validate(&self) -> Result<()> {
        if self.scan.poll_interval_secs == 0 {
            bail!("scan.poll_interval_secs must be greater than zero");
        }
        self.gate()?;
        self.code_map()?;
        self.calendar()?;
        self.jenkins.view_url()?;
        self.router()?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.scan.poll_interval_secs)
    }

    pub fn gate(&self) -> Result<BusinessHoursGate> {
        Ok(BusinessHoursGate::new(self.hours.start, self.hours.end)?)
    }

    pub fn code_map(&self) -> Result<StatusCodeMap> {
        match &self.job_status {
            None => Ok(StatusCodeMap::jenkins_defaults()),
            Some(entries) => {
                let map = StatusCodeMap::from_names(entries.iter().map(|(k, v)| (k.clone(), v)))?;
                if map.is_empty() {
                    bail!("[job_status] is present but maps no codes");
                }
                debug!(codes = map.len(), "loaded job status map");
                Ok(map)
            }
        }
    }

    pub fn calendar(&self) -> Result<Box<dyn HolidayCalendar>> {
        let extra = DateSet::parse(&self.holidays.extra)?;
        let calendar: Box<dyn HolidayCalendar> = match (self.holidays.calendar, extra.is_empty()) {
            (CalendarKind::None, true) => Box::new(NoHolidays),
            (CalendarKind::None, false) => Box::new(extra),
            (CalendarKind::Us, true) => Box::new(UsFederalHolidays),
            (CalendarKind::Us, false) => {
                Box::new(CombinedCalendar::new().with(UsFederalHolidays).with(extra))
            }
        };
        Ok(calendar)
    }

    /// Construct every configured device and assign roles.
    pub fn router(&self) -> Result<IndicatorRouter> {
        let mut builder = IndicatorRouter::builder().enabled(self.indicators.enabled);

        for (name, plug) in &self.hs100 {
            debug!(indicator = %name, "loading hs100 indicator");
            let switch = Hs100Plug::new(name, plug)
                .with_context(|| format!("hs100 '{}'", name))?;
            builder = builder.switch(Arc::new(switch));
        }
        for (name, photon) in &self.photon {
            debug!(status = %name, "loading photon status");
            let tracker = PhotonStatus::new(name, photon)
                .with_context(|| format!("photon '{}'", name))?;
            builder = builder.tracker(Arc::new(tracker));
        }

        for name in &self.indicators.failure {
            builder = builder.assign(name.clone(), DeviceRole::SignalsFailure);
        }
        for name in &self.indicators.success {
            builder = builder.assign(name.clone(), DeviceRole::SignalsSuccess);
        }
        if let Some(names) = &self.indicators.status {
            builder = builder.status_trackers(names.iter().cloned());
        }

        Ok(builder.build()?)
    }

    pub fn aggregator(&self) -> Result<Aggregator> {
        Ok(Aggregator::new(
            self.code_map()?,
            self.gate()?,
            self.calendar()?,
            self.scan.streak_threshold,
        ))
    }

    /// Wire the Jenkins feed, devices and system clock into a scanner.
    pub fn scanner(&self) -> Result<Scanner> {
        let feed = JenkinsFeed::new(&self.jenkins).context("jenkins feed")?;
        info!(url = %feed.url(), "watching jenkins view");
        let router = self.router()?;
        info!(
            enabled = router.is_enabled(),
            switches = router.switch_count(),
            trackers = router.tracker_count(),
            "indicators ready"
        );
        Ok(Scanner::new(
            self.aggregator()?,
            Arc::new(feed),
            Arc::new(router),
            Arc::new(SystemClock),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [jenkins]
        server = "jenkins.local"
        view = "Main"

        [hours]
        start = 8
        end = 18
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = DaemonConfig::parse(MINIMAL).unwrap();
        assert_eq!(config.jenkins.port, 8080);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.scan.streak_threshold, 6);
        assert_eq!(config.holidays.calendar, CalendarKind::Us);
        assert!(!config.indicators.enabled);
        assert_eq!(config.code_map().unwrap(), StatusCodeMap::jenkins_defaults());
    }

    #[test]
    fn test_bad_hours_rejected() {
        let raw = MINIMAL.replace("end = 18", "end = 24");
        let err = DaemonConfig::parse(&raw).unwrap_err();
        assert!(format!("{:#}", err).contains("0..=23"));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let raw = format!("{}\n[scan]\npoll_interval_secs = 0\n", MINIMAL);
        assert!(DaemonConfig::parse(&raw).is_err());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let raw = format!("{}\n[job_status]\nred = \"angry\"\n", MINIMAL);
        let err = DaemonConfig::parse(&raw).unwrap_err();
        assert!(format!("{:#}", err).contains("angry"));
    }

    #[test]
    fn test_role_naming_missing_plug_rejected() {
        let raw = format!(
            "{}\n[indicators]\nenabled = true\nfailure = [\"red_lamp\"]\n",
            MINIMAL
        );
        let err = DaemonConfig::parse(&raw).unwrap_err();
        assert!(format!("{:#}", err).contains("red_lamp"));
    }

    #[test]
    fn test_plug_with_unparseable_ip_rejected() {
        let raw = format!("{}\n[hs100.red_lamp]\nip = \"lamp.local\"\n", MINIMAL);
        let err = DaemonConfig::parse(&raw).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("hs100 'red_lamp'"));
        assert!(message.contains("invalid ip"));
    }

    #[test]
    fn test_plug_with_ipv6_address_accepted() {
        let raw = format!("{}\n[hs100.red_lamp]\nip = \"fd00::17\"\n", MINIMAL);
        let config = DaemonConfig::parse(&raw).unwrap();
        assert_eq!(config.router().unwrap().switch_count(), 1);
    }

    #[test]
    fn test_bad_holiday_rejected() {
        let raw = format!("{}\n[holidays]\nextra = [\"tomorrow\"]\n", MINIMAL);
        assert!(DaemonConfig::parse(&raw).is_err());
    }

    #[test]
    fn test_extra_holidays_join_us_calendar() {
        let raw = format!("{}\n[holidays]\nextra = [\"2026-12-24\"]\n", MINIMAL);
        let calendar = DaemonConfig::parse(&raw).unwrap().calendar().unwrap();
        assert!(calendar.is_holiday(NaiveDate::from_ymd_opt(2026, 12, 24).unwrap()));
        assert!(calendar.is_holiday(NaiveDate::from_ymd_opt(2026, 12, 25).unwrap()));
    }

    #[test]
    fn test_no_calendar_has_no_holidays() {
        let raw = format!("{}\n[holidays]\ncalendar = \"none\"\n", MINIMAL);
        let calendar = DaemonConfig::parse(&raw).unwrap().calendar().unwrap();
        assert!(!calendar.is_holiday(NaiveDate::from_ymd_opt(2026, 12, 25).unwrap()));
    }

    #[test]
    fn test_load_from_file_builds_scanner() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{}
            [indicators]
            enabled = true
            failure = ["red_lamp"]
            success = ["green_lamp"]

            [hs100.red_lamp]
            ip = "10.0.0.21"

            [hs100.green_lamp]
            ip = "10.0.0.22"
            enabled = false

            [photon.bubbles]
            device_id = "0123abcd"
            access_token = "token"
            function = "status"
            "#,
            MINIMAL
        )
        .unwrap();

        let config = DaemonConfig::load(file.path()).unwrap();
        let router = config.router().unwrap();
        assert_eq!(router.switch_count(), 2);
        assert_eq!(router.tracker_count(), 1);

        let scanner = config.scanner().unwrap();
        assert_eq!(scanner.aggregator().cycles(), 0);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = DaemonConfig::load(Path::new("/nonexistent/volcanology.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/volcanology.toml"));
    }

    #[test]
    fn test_shipped_sample_config_is_valid() {
        let raw = include_str!("../../../config/volcanology.toml");
        let config = DaemonConfig::parse(raw).unwrap();
        assert!(config.router().unwrap().switch_count() > 0);
    }
}
