//! Jenkins view feed
//!
//! Reads `/view/<name>/api/json` and turns each job's ball colour into a
//! [`JobReport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;
use volcanology_core::{JobFeed, JobReport};

use crate::error::{DeviceError, Result};

/// Restrict the view API answer to the fields the feed reads.
const JOB_TREE: &str = "jobs[name,color]";

/// Jenkins connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JenkinsConfig {
    /// Host name or IP of the Jenkins server
    pub server: String,
    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// View whose jobs are watched
    pub view: String,
    /// Full URL of the view's JSON API, overriding server/port/view
    #[serde(default)]
    pub url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    10
}

impl JenkinsConfig {
    pub fn new(server: &str, port: u16, view: &str) -> Self {
        JenkinsConfig {
            server: server.to_string(),
            port,
            view: view.to_string(),
            url: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// URL of the view's job list.
    pub fn view_url(&self) -> Result<Url> {
        if let Some(url) = &self.url {
            return parse_url(url);
        }

        let base = format!("http://{}:{}/", self.server, self.port);
        let mut url = parse_url(&base)?;
        url.path_segments_mut()
            .map_err(|_| DeviceError::Config(format!("{} cannot be a base URL", base)))?
            .pop_if_empty()
            .extend(["view", self.view.as_str(), "api", "json"]);
        url.query_pairs_mut().append_pair("tree", JOB_TREE);
        Ok(url)
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| DeviceError::Config(format!("{}: {}", raw, e)))
}

#[derive(Debug, Deserialize)]
struct ViewResponse {
    #[serde(default)]
    jobs: Vec<JobEntry>,
}

#[derive(Debug, Deserialize)]
struct JobEntry {
    name: String,
    #[serde(default)]
    color: Option<String>,
}

/// Decode a view API response. Jobs without a colour (folders) report the
/// empty code.
pub fn parse_view(body: &str) -> Result<Vec<JobReport>> {
    let view: ViewResponse = serde_json::from_str(body)?;
    Ok(view
        .jobs
        .into_iter()
        .map(|job| JobReport::new(job.name, job.color.unwrap_or_default()))
        .collect())
}

/// [`JobFeed`] backed by a Jenkins view.
pub struct JenkinsFeed {
    url: Url,
    http_client: reqwest::Client,
}

impl JenkinsFeed {
    pub fn new(config: &JenkinsConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("volcanology/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(JenkinsFeed {
            url: config.view_url()?,
            http_client,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch and decode the view.
    pub async fn fetch_view(&self) -> Result<Vec<JobReport>> {
        debug!(url = %self.url, "about to query jenkins");
        let response = self.http_client.get(self.url.clone()).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DeviceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_view(&body)
    }
}

#[async_trait]
impl JobFeed for JenkinsFeed {
    async fn fetch_jobs(&self) -> volcanology_core::Result<Vec<JobReport>> {
        self.fetch_view().await.map_err(DeviceError::into_fetch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_url_from_parts() {
        let config = JenkinsConfig::new("jenkins.local", 8080, "My View");
        let url = config.view_url().unwrap();
        assert!(url
            .as_str()
            .starts_with("http://jenkins.local:8080/view/My%20View/api/json?tree="));
    }

    #[test]
    fn test_view_url_override() {
        let mut config = JenkinsConfig::new("ignored", 1, "ignored");
        config.url = Some("https://ci.example.com/view/All/api/json".to_string());
        assert_eq!(
            config.view_url().unwrap().as_str(),
            "https://ci.example.com/view/All/api/json"
        );
    }

    #[test]
    fn test_view_url_override_must_parse() {
        let mut config = JenkinsConfig::new("ignored", 1, "ignored");
        config.url = Some("not a url".to_string());
        assert!(matches!(config.view_url(), Err(DeviceError::Config(_))));
    }

    #[test]
    fn test_parse_view() {
        let body = r#"{
            "_class": "hudson.model.ListView",
            "jobs": [
                {"_class": "hudson.model.FreeStyleProject", "name": "api", "color": "blue"},
                {"_class": "hudson.model.FreeStyleProject", "name": "web", "color": "red_anime"},
                {"_class": "com.cloudbees.hudson.plugins.folder.Folder", "name": "libs"}
            ]
        }"#;
        let jobs = parse_view(body).unwrap();
        assert_eq!(
            jobs,
            vec![
                JobReport::new("api", "blue"),
                JobReport::new("web", "red_anime"),
                JobReport::new("libs", ""),
            ]
        );
    }

    #[test]
    fn test_parse_view_rejects_malformed_body() {
        assert!(matches!(
            parse_view("<html>login</html>"),
            Err(DeviceError::Json(_))
        ));
    }
}
