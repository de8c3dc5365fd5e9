// ABOUTME: Polling configuration for long-running remote operations.
// ABOUTME: Shared interval plus the deployment timeout.

use serde::Deserialize;
use std::time::Duration;

use crate::remote::PollOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_deployment_timeout", with = "humantime_serde")]
    pub deployment_timeout: Duration,
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_deployment_timeout() -> Duration {
    Duration::from_secs(15 * 60)
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfig {
            interval: default_interval(),
            deployment_timeout: default_deployment_timeout(),
        }
    }
}

impl PollingConfig {
    /// Poll options for machine deployment and machine lifecycle calls.
    pub fn deployment(&self) -> PollOptions {
        PollOptions::new(self.interval, self.deployment_timeout)
    }

    /// Poll options with the shared interval and a dedicated timeout.
    pub fn with_timeout(&self, timeout: Duration) -> PollOptions {
        PollOptions::new(self.interval, timeout)
    }
}
