// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup and build fixtures backed by the in-memory lab.

use std::sync::{Arc, Once};

use labforge::config::Config;
use labforge::pipeline::{RecordingReporter, StateBag, initial_state};
use labforge::remote::memory::MemoryLab;
use labforge::steps::StepContext;
use labforge::types::TempNames;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("labforge=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Linux build config with millisecond polling and retry delays.
#[allow(dead_code)]
pub fn linux_config() -> Config {
    Config::from_yaml(
        r#"
subscription_id: sub-1
resource_group: lab-rg
lab_name: imaging
location: westeurope
os_type: linux
source:
  marketplace:
    publisher: Canonical
    offer: 0001-com-ubuntu-server-jammy
    sku: 22_04-lts
capture:
  image_name: golden-linux
polling:
  interval: 1ms
  deployment_timeout: 5s
winrm_retry:
  max_attempts: 3
  initial_delay: 1ms
  max_delay: 4ms
"#,
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn windows_config() -> Config {
    let mut config = linux_config();
    config.os_type = labforge::remote::OsType::Windows;
    config.capture.image_name = labforge::types::ImageName::new("golden-windows").unwrap();
    config
}

/// Everything a test needs to run steps by hand.
#[allow(dead_code)]
pub struct Fixture {
    pub lab: Arc<MemoryLab>,
    pub reporter: Arc<RecordingReporter>,
    pub config: Arc<Config>,
    pub names: TempNames,
}

#[allow(dead_code)]
impl Fixture {
    pub fn new(config: Config, lab: MemoryLab) -> Self {
        Self {
            lab: Arc::new(lab),
            reporter: Arc::new(RecordingReporter::new()),
            config: Arc::new(config),
            names: TempNames::generate(),
        }
    }

    pub fn context(&self) -> StepContext<MemoryLab> {
        StepContext {
            client: Arc::clone(&self.lab),
            reporter: self.reporter.clone(),
            config: Arc::clone(&self.config),
        }
    }

    pub fn state(&self) -> StateBag {
        initial_state(&self.config, &self.names)
    }
}
