//! TP-Link HS100 smart outlet
//!
//! The plug listens on TCP 9999. Each message is a 4-byte big-endian length
//! followed by the JSON command, obfuscated with an XOR autokey cipher whose
//! initial key is 171.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;
use volcanology_core::Switch;

use crate::error::{DeviceError, Result};

pub const HS100_PORT: u16 = 9999;

const INITIAL_KEY: u8 = 171;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outlet settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hs100Config {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub ip: String,
    #[serde(default)]
    pub port: Option<u16>,
}

fn enabled_by_default() -> bool {
    true
}

/// Frame a command for the plug.
pub fn encrypt(plain: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(plain.len() + 4);
    frame.extend_from_slice(&(plain.len() as u32).to_be_bytes());
    let mut key = INITIAL_KEY;
    for byte in plain {
        key ^= byte;
        frame.push(key);
    }
    frame
}

/// Undo [`encrypt`]. The length prefix, if present, is skipped.
pub fn decrypt(frame: &[u8]) -> Vec<u8> {
    let body = frame.get(4..).unwrap_or_default();
    let mut key = INITIAL_KEY;
    body.iter()
        .map(|byte| {
            let plain = key ^ byte;
            key = *byte;
            plain
        })
        .collect()
}

fn relay_command(on: bool) -> Vec<u8> {
    let state = if on { 1 } else { 0 };
    let command = json!({"system": {"set_relay_state": {"state": state}}});
    command.to_string().into_bytes()
}

/// One outlet, switched on and off over the local network.
#[derive(Debug, Clone)]
pub struct Hs100Plug {
    name: String,
    enabled: bool,
    addr: SocketAddr,
    timeout: Duration,
}

impl Hs100Plug {
    /// Fails when `ip` is not an IPv4 or IPv6 address.
    pub fn new(name: &str, config: &Hs100Config) -> Result<Self> {
        let ip = match config.ip.trim().parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(_) => {
                let reason = format!("plug {}: invalid ip '{}'", name, config.ip);
                return Err(DeviceError::Config(reason));
            }
        };
        let addr = SocketAddr::new(ip, config.port.unwrap_or(HS100_PORT));
        debug!(plug = %name, addr = %addr, "new plug");
        Ok(Hs100Plug {
            name: name.to_string(),
            enabled: config.enabled,
            addr,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the relay and check the plug's answer.
    pub async fn set_relay(&self, on: bool) -> Result<()> {
        let frame = encrypt(&relay_command(on));
        let reply = tokio::time::timeout(self.timeout, self.exchange(&frame))
            .await
            .map_err(|_| DeviceError::Timeout(self.timeout.as_millis()))??;

        if reply.is_empty() {
            return Ok(());
        }
        let answer: Value = serde_json::from_slice(&decrypt(&reply))?;
        match answer["system"]["set_relay_state"]["err_code"].as_i64() {
            Some(0) | None => Ok(()),
            Some(code) => Err(DeviceError::Rejected(format!(
                "set_relay_state err_code {}",
                code
            ))),
        }
    }

    async fn exchange(&self, frame: &[u8]) -> Result<Vec<u8>> {
        let mut stream = TcpStream::connect(self.addr).await?;
        stream.write_all(frame).await?;
        stream.shutdown().await?;

        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).await?;
        Ok(reply)
    }
}

#[async_trait]
impl Switch for Hs100Plug {
    fn name(&self) -> &str {
        &self.name
    }

    async fn turn_on(&self) -> volcanology_core::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        debug!(plug = %self.name, "turn on");
        self.set_relay(true)
            .await
            .map_err(|e| e.for_device(&self.name))
    }

    async fn turn_off(&self) -> volcanology_core::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        debug!(plug = %self.name, "turn off");
        self.set_relay(false)
            .await
            .map_err(|e| e.for_device(&self.name))
    }
}
