mod common;

use cdsp_bridge::config::VolumeConfig;
use cdsp_bridge::error::{BridgeError, ConfigError};
use cdsp_bridge::media_player::{MediaPlayerView, device_identifier};
use cdsp_client::mock::Command;
use cdsp_client::{ApiError, PlayerState, Refresh, Snapshot};
use common::{DEVICE_URL, mock_bridge, playing_snapshot};
use pretty_assertions::assert_eq;
use std::time::Duration;
use test_log::test;

#[test(tokio::test)]
async fn view_of_playing_device() {
    let (bridge, _device) = mock_bridge(playing_snapshot()).await;

    assert_eq!(
        bridge.media_player().view(),
        MediaPlayerView {
            available: true,
            state: PlayerState::Playing,
            volume_level: 0.75,
            is_volume_muted: false,
            source: Some("Default".to_string()),
            source_list: vec!["Default".to_string(), "Night".to_string()],
            volume_step: 0.02,
            volume_db: -12.5,
            capture_rate: 44100,
            unconfirmed: false,
        }
    );
}

#[test(tokio::test)]
async fn view_of_device_off() {
    let (bridge, _device) = mock_bridge(Snapshot::off()).await;

    let view = bridge.media_player().view();
    assert!(!view.available);
    assert_eq!(view.state, PlayerState::Off);
    assert_eq!(view.source, None);
    assert!(view.source_list.is_empty());
}

#[test(tokio::test)]
async fn device_info_derived_from_url() {
    let (bridge, _device) = mock_bridge(playing_snapshot()).await;
    let media_player = bridge.media_player();

    assert_eq!(media_player.unique_id(), device_identifier(DEVICE_URL));
    assert_eq!(media_player.device_info().identifier, media_player.unique_id());
    assert_eq!(media_player.device_info().name, "CamillaDSP");
    assert_eq!(media_player.device_info().manufacturer, "HEnquist");
}

#[test]
fn device_identifier_is_stable_hex() {
    let identifier = device_identifier(DEVICE_URL);

    assert_eq!(identifier.len(), 16);
    assert!(identifier.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(identifier, device_identifier(DEVICE_URL));
    assert_ne!(identifier, device_identifier("http://other.test:5005"));
}

#[test(tokio::test)]
async fn set_volume_shown_until_refresh_confirms() {
    let (bridge, device) = mock_bridge(playing_snapshot()).await;
    let media_player = bridge.media_player();

    media_player.set_volume_level(0.5).await.unwrap();

    assert_eq!(device.commands(), vec![Command::SetVolume(-25.0)]);
    let view = media_player.view();
    assert_eq!(view.volume_level, 0.5);
    assert_eq!(view.volume_db, -25.0);
    assert!(view.unconfirmed);

    bridge.coordinator().refresh_now().await;

    let view = media_player.view();
    assert_eq!(view.volume_db, -25.0);
    assert!(!view.unconfirmed);
}

#[test(tokio::test)]
async fn failed_command_kept_until_next_refresh() {
    let (bridge, device) = mock_bridge(playing_snapshot()).await;
    let media_player = bridge.media_player();
    device.fail_commands(true);

    let result = media_player.mute_volume(true).await;

    assert!(matches!(result, Err(BridgeError::Api(_))));
    assert_eq!(device.commands(), vec![Command::SetMuted(true)]);
    let view = media_player.view();
    assert!(view.is_volume_muted);
    assert!(view.unconfirmed);

    bridge.coordinator().refresh_now().await;

    let view = media_player.view();
    assert!(!view.is_volume_muted);
    assert!(!view.unconfirmed);
}

#[test(tokio::test)]
async fn local_changes_accumulate_between_refreshes() {
    let (bridge, device) = mock_bridge(playing_snapshot()).await;
    let media_player = bridge.media_player();
    device.fail_commands(true);

    let _ = media_player.mute_volume(true).await;
    let _ = media_player.select_source("Night").await;

    let view = media_player.view();
    assert!(view.is_volume_muted);
    assert_eq!(view.source, Some("Night".to_string()));
    assert_eq!(view.volume_db, -12.5);
    assert!(view.unconfirmed);
}

#[test(tokio::test)]
async fn degraded_refresh_replaces_local_changes() {
    let (bridge, device) = mock_bridge(playing_snapshot()).await;
    let media_player = bridge.media_player();
    device.fail_commands(true);
    device.push_refresh(Refresh::Degraded {
        snapshot: Snapshot::with_state(PlayerState::Playing),
        error: ApiError::Malformed {
            endpoint: "/api/getparam/volume",
            reason: "unexpected body".to_string(),
        },
    });

    let _ = media_player.set_volume_level(1.0).await;
    assert_eq!(media_player.view().volume_db, 0.0);

    bridge.coordinator().refresh_now().await;

    let view = media_player.view();
    assert_eq!(view.volume_db, -12.5);
    assert!(!view.unconfirmed);
}

#[test(tokio::test)]
async fn select_source_switches_profile() {
    let (bridge, device) = mock_bridge(playing_snapshot()).await;
    let media_player = bridge.media_player();

    media_player.select_source("Night").await.unwrap();

    assert_eq!(
        device.commands(),
        vec![Command::SelectProfile("Night".to_string())]
    );
    assert_eq!(media_player.view().source, Some("Night".to_string()));

    bridge.coordinator().refresh_now().await;
    assert_eq!(media_player.view().source, Some("Night".to_string()));
    assert!(!media_player.view().unconfirmed);
}

#[test(tokio::test)]
async fn volume_steps_by_configured_db() {
    let (bridge, device) = mock_bridge(playing_snapshot()).await;
    let media_player = bridge.media_player();

    media_player.volume_up().await.unwrap();
    bridge.coordinator().refresh_now().await;
    media_player.volume_down().await.unwrap();
    media_player.volume_down().await.unwrap();

    assert_eq!(
        device.commands(),
        vec![
            Command::SetVolume(-11.5),
            Command::SetVolume(-12.5),
            Command::SetVolume(-13.5),
        ]
    );
}

#[test(tokio::test)]
async fn volume_up_clamps_at_max() {
    let (bridge, device) = mock_bridge(Snapshot {
        volume_db: 0.0,
        ..playing_snapshot()
    })
    .await;

    bridge.media_player().volume_up().await.unwrap();

    assert_eq!(device.commands(), vec![Command::SetVolume(0.0)]);
}

#[test(tokio::test)]
async fn zero_step_disables_stepping() {
    let (mut bridge, device) = mock_bridge(playing_snapshot()).await;
    bridge
        .reconfigure_volume(VolumeConfig {
            min: -50.0,
            max: 0.0,
            step: 0.0,
        })
        .unwrap();

    bridge.media_player().volume_up().await.unwrap();
    bridge.media_player().volume_down().await.unwrap();

    assert!(device.commands().is_empty());
    assert_eq!(bridge.media_player().view().volume_step, 0.0);
}

#[test(tokio::test)]
async fn reconfigure_volume_updates_view() {
    let (mut bridge, _device) = mock_bridge(playing_snapshot()).await;
    let mut view_rx = bridge.media_player().subscribe();
    let volume = VolumeConfig {
        min: -25.0,
        max: 0.0,
        step: 1.0,
    };

    bridge.reconfigure_volume(volume.clone()).unwrap();

    assert!(view_rx.has_changed().unwrap());
    let view = view_rx.borrow_and_update().clone();
    assert_eq!(view.volume_level, 0.5);
    assert_eq!(view.volume_step, 0.04);
    assert_eq!(bridge.config().volume, volume);
}

#[test(tokio::test)]
async fn invalid_volume_options_keep_current_ones() {
    let (mut bridge, _device) = mock_bridge(playing_snapshot()).await;

    let result = bridge.reconfigure_volume(VolumeConfig {
        min: -10.0,
        max: -20.0,
        step: 1.0,
    });

    assert!(matches!(
        result,
        Err(ConfigError::InvalidValue {
            field: "volume.min",
            ..
        })
    ));
    assert_eq!(bridge.config().volume, VolumeConfig::default());
    assert_eq!(bridge.media_player().view().volume_level, 0.75);
}

#[test(tokio::test)]
async fn commands_rejected_after_shutdown() {
    let (bridge, device) = mock_bridge(playing_snapshot()).await;
    bridge.shutdown();

    let media_player = bridge.media_player();
    assert!(matches!(
        media_player.set_volume_level(0.5).await,
        Err(BridgeError::ShuttingDown)
    ));
    assert!(matches!(
        media_player.mute_volume(true).await,
        Err(BridgeError::ShuttingDown)
    ));
    assert!(matches!(
        media_player.select_source("Night").await,
        Err(BridgeError::ShuttingDown)
    ));
    assert!(device.commands().is_empty());
    assert!(!media_player.view().unconfirmed);
}

#[test(tokio::test(start_paused = true))]
async fn running_bridge_publishes_refreshed_views() {
    let (bridge, device) = mock_bridge(playing_snapshot()).await;
    let mut view_rx = bridge.media_player().subscribe();
    let tasks = bridge.start();

    device.set_snapshot(Snapshot {
        state: PlayerState::Paused,
        ..playing_snapshot()
    });
    bridge.coordinator().request_refresh();

    tokio::time::timeout(Duration::from_secs(1), view_rx.changed())
        .await
        .expect("No view published after refresh")
        .unwrap();
    assert_eq!(view_rx.borrow_and_update().state, PlayerState::Paused);

    bridge.shutdown();
    tokio::time::timeout(Duration::from_secs(1), tasks.join())
        .await
        .expect("Bridge tasks did not stop")
        .unwrap();
}

#[test(tokio::test(start_paused = true))]
async fn command_triggers_refresh_on_running_bridge() {
    let (bridge, device) = mock_bridge(playing_snapshot()).await;
    let mut data_rx = bridge.coordinator().subscribe();
    let tasks = bridge.start();

    bridge.media_player().mute_volume(true).await.unwrap();

    tokio::time::timeout(Duration::from_secs(1), data_rx.changed())
        .await
        .expect("No refresh after command")
        .unwrap();
    assert!(data_rx.borrow_and_update().snapshot.muted);
    // one refresh during setup, one requested by the command
    assert_eq!(device.refresh_count(), 2);

    bridge.shutdown();
    tasks.join().await.unwrap();
}
