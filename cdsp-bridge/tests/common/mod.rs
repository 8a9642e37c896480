use cdsp_bridge::bridge::Bridge;
use cdsp_bridge::config::{AppConfig, DeviceConfig};
use cdsp_client::mock::MockDevice;
use cdsp_client::{PlayerState, Snapshot};
use std::sync::Arc;

#[allow(unused)]
pub const DEVICE_URL: &str = "http://dsp.test:5005";

#[allow(unused)]
pub fn playing_snapshot() -> Snapshot {
    Snapshot {
        state: PlayerState::Playing,
        volume_db: -12.5,
        muted: false,
        active_profile: Some("Default".to_string()),
        available_profiles: vec!["Default".to_string(), "Night".to_string()],
        capture_rate: 44100,
    }
}

#[allow(unused)]
pub fn test_config(url: &str) -> AppConfig {
    AppConfig {
        device: DeviceConfig {
            url: url.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Sets up a bridge against a mock device currently reporting `snapshot`.
#[allow(unused)]
pub async fn mock_bridge(snapshot: Snapshot) -> (Bridge, Arc<MockDevice>) {
    let device = Arc::new(MockDevice::new(snapshot));
    let bridge = Bridge::with_device(test_config(DEVICE_URL), device.clone())
        .await
        .expect("Failed to set up bridge");
    (bridge, device)
}
