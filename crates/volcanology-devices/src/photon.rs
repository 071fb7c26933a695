//! Particle Photon status tracker
//!
//! Calls a cloud function on the device with the status as its argument,
//! e.g. to start a bubble machine on a success streak.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use volcanology_core::{AggregateStatus, StatusTracker};

use crate::error::{DeviceError, Result};

pub const PARTICLE_API: &str = "https://api.particle.io";

/// Photon settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotonConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub device_id: String,
    pub access_token: String,
    /// Name of the cloud function to call
    pub function: String,
    /// Particle API root; override for a local cloud or tests
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn enabled_by_default() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    10
}

/// Cloud function response
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionReply {
    #[serde(default)]
    pub connected: Option<bool>,
    #[serde(default)]
    pub return_value: Option<i64>,
}

/// A Photon tracking the aggregate status.
pub struct PhotonStatus {
    name: String,
    enabled: bool,
    function_url: String,
    access_token: String,
    http_client: reqwest::Client,
}

impl PhotonStatus {
    pub fn new(name: &str, config: &PhotonConfig) -> Result<Self> {
        let base = config
            .api_base
            .as_deref()
            .unwrap_or(PARTICLE_API)
            .trim_end_matches('/');
        let function_url = format!(
            "{}/v1/devices/{}/{}",
            base, config.device_id, config.function
        );

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("volcanology/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        debug!(
            photon = %name,
            device_id = %config.device_id,
            function = %config.function,
            "new photon"
        );

        Ok(PhotonStatus {
            name: name.to_string(),
            enabled: config.enabled,
            function_url,
            access_token: config.access_token.clone(),
            http_client,
        })
    }

    pub fn function_url(&self) -> &str {
        &self.function_url
    }

    /// Invoke the cloud function with `arg`.
    pub async fn call_function(&self, arg: &str) -> Result<FunctionReply> {
        let response = self
            .http_client
            .post(&self.function_url)
            .bearer_auth(&self.access_token)
            .form(&[("arg", arg)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(photon = %self.name, status = status.as_u16(), response = %body, "photon response");
        if !status.is_success() {
            return Err(DeviceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: FunctionReply = serde_json::from_str(&body)?;
        if reply.connected == Some(false) {
            return Err(DeviceError::Rejected("device is offline".to_string()));
        }
        Ok(reply)
    }
}

#[async_trait]
impl StatusTracker for PhotonStatus {
    fn name(&self) -> &str {
        &self.name
    }

    async fn update_status(&self, status: AggregateStatus) -> volcanology_core::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        debug!(photon = %self.name, status = %status, "photon status");
        self.call_function(status.as_str())
            .await
            .map(|_| ())
            .map_err(|e| e.for_device(&self.name))
    }
}
