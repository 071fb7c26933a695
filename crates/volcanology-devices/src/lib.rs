//! Volcanology Devices: I/O adapters for the aggregation engine
//!
//! - [`JenkinsFeed`]: the job feed, read from a Jenkins view's JSON API
//! - [`Hs100Plug`]: on/off lamps behind TP-Link HS100 outlets
//! - [`PhotonStatus`]: Particle Photon cloud functions told the status value

mod error;
pub mod hs100;
pub mod jenkins;
pub mod photon;

pub use error::{DeviceError, Result};
pub use hs100::{Hs100Config, Hs100Plug, HS100_PORT};
pub use jenkins::{parse_view, JenkinsConfig, JenkinsFeed};
pub use photon::{FunctionReply, PhotonConfig, PhotonStatus, PARTICLE_API};
