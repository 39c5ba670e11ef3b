//! Light executor behaviour against a recording transport.

use std::sync::Mutex;

use rstest::{fixture, rstest};

use super::*;

const CAPTURED: LightState = LightState {
    power: true,
    brightness: 40,
    color: RgbColor::new(255, 80, 0),
    color_temperature_kelvin: 0,
};

/// Records every command; optionally fails status queries or some sends.
struct RecordingTransport {
    status: Result<LightState, DispatchError>,
    failing_command: Option<&'static str>,
    sent: Mutex<Vec<(String, LightCommand)>>,
    queries: Mutex<usize>,
}

impl RecordingTransport {
    fn answering(status: Result<LightState, DispatchError>) -> Self {
        Self {
            status,
            failing_command: None,
            sent: Mutex::new(Vec::new()),
            queries: Mutex::new(0),
        }
    }

    fn failing_sends_of(mut self, command: &'static str) -> Self {
        self.failing_command = Some(command);
        self
    }

    fn commands(&self) -> Vec<LightCommand> {
        self.sent
            .lock()
            .expect("sent lock")
            .iter()
            .map(|(_, command)| *command)
            .collect()
    }

    fn query_count(&self) -> usize {
        *self.queries.lock().expect("queries lock")
    }
}

#[async_trait]
impl LightTransport for RecordingTransport {
    async fn send(&self, address: &str, command: LightCommand) -> Result<(), DispatchError> {
        self.sent
            .lock()
            .expect("sent lock")
            .push((address.to_owned(), command));
        if self.failing_command == Some(command.name()) {
            return Err(DispatchError::transport("socket closed"));
        }
        Ok(())
    }

    async fn query_status(&self, _address: &str) -> Result<LightState, DispatchError> {
        *self.queries.lock().expect("queries lock") += 1;
        self.status.clone()
    }
}

#[fixture]
fn quick_lightning() -> LightningSettings {
    LightningSettings {
        duration: Duration::from_millis(20),
        flash_high: Duration::from_millis(1)..=Duration::from_millis(2),
        flash_low: Duration::from_millis(1)..=Duration::from_millis(3),
        command_spacing: Duration::from_millis(1),
    }
}

fn light_trigger(kind: fn(LightTarget) -> TriggerKind) -> Trigger {
    Trigger::new("storm", "Storm", kind(LightTarget::new("10.0.0.9")))
}

fn lightning_trigger() -> Trigger {
    light_trigger(|light| TriggerKind::LightEffect { light })
}

fn set_state_trigger(target: LightTargetState) -> Trigger {
    Trigger::new(
        "mood",
        "Mood",
        TriggerKind::LightSetState {
            light: LightTarget::new("10.0.0.9"),
            target,
        },
    )
}

#[rstest]
#[tokio::test]
async fn status_trigger_succeeds_when_light_answers() {
    let transport = Arc::new(RecordingTransport::answering(Ok(CAPTURED)));
    let executor = LightStatusExecutor::new(transport.clone());

    executor
        .execute(&light_trigger(|light| TriggerKind::LightStatus { light }))
        .await
        .expect("status answered");

    assert_eq!(transport.query_count(), 1);
    assert!(transport.commands().is_empty());
}

#[rstest]
#[tokio::test]
async fn status_trigger_fails_on_timeout() {
    let transport = Arc::new(RecordingTransport::answering(Err(DispatchError::timeout(
        "status query",
    ))));
    let executor = LightStatusExecutor::new(transport);

    let err = executor
        .execute(&light_trigger(|light| TriggerKind::LightStatus { light }))
        .await
        .expect_err("timed out");

    assert_eq!(err, DispatchError::timeout("status query"));
}

#[rstest]
#[tokio::test]
async fn lightning_capture_timeout_sends_nothing(quick_lightning: LightningSettings) {
    let transport = Arc::new(RecordingTransport::answering(Err(DispatchError::timeout(
        "status query",
    ))));
    let executor = LightningExecutor::new(transport.clone(), quick_lightning);

    let err = executor
        .execute(&lightning_trigger())
        .await
        .expect_err("capture failed");

    assert_eq!(err, DispatchError::timeout("status query"));
    assert!(transport.commands().is_empty());
}

#[rstest]
#[tokio::test]
async fn lightning_flickers_then_restores_in_order(quick_lightning: LightningSettings) {
    let transport = Arc::new(RecordingTransport::answering(Ok(CAPTURED)));
    let executor = LightningExecutor::new(transport.clone(), quick_lightning);

    executor
        .execute(&lightning_trigger())
        .await
        .expect("lightning fired");

    let commands = transport.commands();
    assert_eq!(
        commands.first(),
        Some(&LightCommand::ColorWc {
            color: FLASH_COLOR,
            color_temperature_kelvin: 0,
        })
    );
    assert!(commands.contains(&LightCommand::Brightness(100)));
    assert!(commands.contains(&LightCommand::Brightness(1)));
    let tail = &commands[commands.len() - 3..];
    assert_eq!(
        tail,
        [
            LightCommand::Turn(true),
            LightCommand::Brightness(40),
            LightCommand::ColorWc {
                color: RgbColor::new(255, 80, 0),
                color_temperature_kelvin: 0,
            },
        ]
    );
}

#[rstest]
#[tokio::test]
async fn lightning_tolerates_command_failures(quick_lightning: LightningSettings) {
    let transport =
        Arc::new(RecordingTransport::answering(Ok(CAPTURED)).failing_sends_of("brightness"));
    let executor = LightningExecutor::new(transport.clone(), quick_lightning);

    executor
        .execute(&lightning_trigger())
        .await
        .expect("partial restore still counts as fired");

    assert_eq!(
        transport.commands().last(),
        Some(&LightCommand::ColorWc {
            color: RgbColor::new(255, 80, 0),
            color_temperature_kelvin: 0,
        })
    );
}

#[rstest]
#[tokio::test]
async fn lightning_rejects_other_kinds(quick_lightning: LightningSettings) {
    let transport = Arc::new(RecordingTransport::answering(Ok(CAPTURED)));
    let executor = LightningExecutor::new(transport.clone(), quick_lightning);
    let trigger = Trigger::new(
        "scream",
        "Scream",
        TriggerKind::HttpDevice {
            address: "10.0.0.2".into(),
            secret_key: "k".into(),
        },
    );

    let err = executor.execute(&trigger).await.expect_err("wrong kind");

    assert!(matches!(err, DispatchError::Misconfigured { .. }));
    assert_eq!(transport.query_count(), 0);
}

#[rstest]
#[case::scene_wins(
    LightTargetState { brightness: Some(30), scene_id: Some(7), ..LightTargetState::default() },
    vec![LightCommand::Scene(7)]
)]
#[case::power_only(LightTargetState::default(), vec![LightCommand::Turn(true)])]
#[case::colour_and_brightness(
    LightTargetState {
        brightness: Some(70),
        color: Some(RgbColor::new(255, 0, 0)),
        ..LightTargetState::default()
    },
    vec![
        LightCommand::Turn(true),
        LightCommand::Brightness(70),
        LightCommand::ColorWc { color: RgbColor::new(255, 0, 0), color_temperature_kelvin: 0 },
    ]
)]
#[case::colour_beats_temperature(
    LightTargetState {
        color: Some(RgbColor::new(255, 0, 0)),
        color_temperature_kelvin: Some(2700),
        ..LightTargetState::default()
    },
    vec![
        LightCommand::Turn(true),
        LightCommand::ColorWc { color: RgbColor::new(255, 0, 0), color_temperature_kelvin: 0 },
    ]
)]
#[case::temperature_only(
    LightTargetState { color_temperature_kelvin: Some(2700), ..LightTargetState::default() },
    vec![
        LightCommand::Turn(true),
        LightCommand::ColorWc { color: RgbColor::new(255, 255, 255), color_temperature_kelvin: 2700 },
    ]
)]
#[tokio::test]
async fn set_state_sends_planned_commands(
    #[case] target: LightTargetState,
    #[case] expected: Vec<LightCommand>,
) {
    let transport = Arc::new(RecordingTransport::answering(Ok(CAPTURED)));
    let executor = LightSetStateExecutor::new(transport.clone(), Duration::from_millis(1));

    executor
        .execute(&set_state_trigger(target))
        .await
        .expect("state applied");

    assert_eq!(transport.commands(), expected);
    assert_eq!(transport.query_count(), 0);
}

#[rstest]
#[tokio::test]
async fn set_state_fails_on_send_error() {
    let transport =
        Arc::new(RecordingTransport::answering(Ok(CAPTURED)).failing_sends_of("turn"));
    let executor = LightSetStateExecutor::new(transport.clone(), Duration::from_millis(1));

    let err = executor
        .execute(&set_state_trigger(LightTargetState {
            brightness: Some(50),
            ..LightTargetState::default()
        }))
        .await
        .expect_err("send failed");

    assert!(matches!(err, DispatchError::Transport { .. }));
    assert_eq!(transport.commands(), vec![LightCommand::Turn(true)]);
}
