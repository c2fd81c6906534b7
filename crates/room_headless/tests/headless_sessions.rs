//! Scripted headless sessions driven through files.

use std::fs;
use std::io::BufReader;

use room_core::buildings::BuildingKind;
use room_core::cell::{CellPos, CellState};
use room_core::config::{ConfigError, SimConfig};
use room_core::controller::{ConstructionMode, ControllerEvent};
use room_core::room::RoomSide;
use room_headless::protocol::{Command, Response};
use room_headless::runner::{HeadlessConfig, HeadlessRunner};
use room_test_utils::fixtures::{find_kind, free_neighbor};

const CONFIG: &str = r"
SimConfig(
    grid_width: 10,
    grid_height: 10,
    seed: 11,
    starting: (stock: 0, capacity: 10, energy: 5, material: 40, research: 0),
)
";

fn write_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("session.ron");
    fs::write(&path, CONFIG).unwrap();
    path
}

fn parse_output(output: Vec<u8>) -> Vec<Response> {
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn runner_from_file() -> HeadlessRunner {
    let dir = tempfile::tempdir().unwrap();
    let sim = SimConfig::load(write_config(&dir)).unwrap();
    HeadlessRunner::new(HeadlessConfig {
        sim,
        ..HeadlessConfig::default()
    })
    .unwrap()
}

fn world(runner: &HeadlessRunner, pos: CellPos) -> (f64, f64) {
    let point = runner.controller().active_grid().cell_to_world(pos);
    (point.x.to_num(), point.y.to_num())
}

#[test]
fn config_file_sets_up_session() {
    let runner = runner_from_file();
    let state = runner.state();

    assert_eq!(state.ledger.material, 40);
    assert_eq!(state.ledger.energy, 5);
    // 8x8 playable cells minus the two seeds
    assert_eq!(state.available_cells, 62);
    assert!(state.unlocked.contains(&ConstructionMode::Bus));
    assert!(!state.unlocked.contains(&ConstructionMode::Science));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = SimConfig::load(dir.path().join("absent.ron")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn script_file_builds_and_advances() {
    let mut runner = runner_from_file();
    let node = find_kind(runner.controller(), BuildingKind::DataNode).unwrap();
    let spot = free_neighbor(runner.controller(), node).unwrap();
    let (x, y) = world(&runner, spot);

    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("build.jsonl");
    fs::write(
        &script,
        format!(
            "# lay one bus segment next to the data node\n\
             {{\"cmd\":\"set_mode\",\"mode\":\"bus\"}}\n\
             {{\"cmd\":\"begin_drag\",\"x\":{x},\"y\":{y}}}\n\
             {{\"cmd\":\"end_drag\",\"x\":{x},\"y\":{y}}}\n\
             \n\
             {{\"cmd\":\"advance\",\"seconds\":5.0}}\n\
             {{\"cmd\":\"query\"}}\n\
             {{\"cmd\":\"quit\"}}\n"
        ),
    )
    .unwrap();

    let mut output = Vec::new();
    runner
        .run(BufReader::new(fs::File::open(&script).unwrap()), &mut output)
        .unwrap();
    let responses = parse_output(output);

    assert!(matches!(&responses[0], Response::Ready { seed: 11, .. }));
    assert_eq!(responses.last(), Some(&Response::Bye));

    let outcome = responses
        .iter()
        .find_map(|response| match response {
            Response::Ack {
                outcome: Some(outcome),
                ..
            } => Some(*outcome),
            _ => None,
        })
        .unwrap();
    assert_eq!(outcome.mode, ConstructionMode::Bus);
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.material_spent, 1);

    let events: Vec<&ControllerEvent> = responses
        .iter()
        .filter_map(|response| match response {
            Response::Events { events } => Some(events.iter()),
            _ => None,
        })
        .flatten()
        .collect();
    assert!(events
        .iter()
        .any(|event| matches!(event, ControllerEvent::LedgerChanged { .. })));

    let state = responses
        .iter()
        .find_map(|response| match response {
            Response::State(state) => Some(state.clone()),
            _ => None,
        })
        .unwrap();
    assert!(state.ticks > 0);
    assert_eq!(state.ledger.material, 40 - 1 + state.ticks as i32);
    assert_eq!(state.ledger.energy, 4);

    let cell = runner
        .controller()
        .active_grid()
        .cell_at(spot.x.into(), spot.y.into())
        .unwrap();
    assert_eq!(cell.state(), CellState::Built);
}

#[test]
fn bad_lines_report_errors_and_continue() {
    let mut runner = runner_from_file();
    let input = "{\"cmd\":\"fly\"}\n\
                 {\"cmd\":\"set_mode\",\"mode\":\"energy_storage\"}\n\
                 {\"cmd\":\"update_drag\",\"x\":0.5,\"y\":0.5}\n\
                 {\"cmd\":\"query\"}\n";
    let mut output = Vec::new();
    runner.run(input.as_bytes(), &mut output).unwrap();
    let responses = parse_output(output);

    let errors: Vec<Option<String>> = responses
        .iter()
        .filter_map(|response| match response {
            Response::Error { cmd, .. } => Some(cmd.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(errors, vec![None, Some("set_mode".to_string())]);

    // update_drag without a drag is a harmless no-op
    assert!(responses.contains(&Response::ack("update_drag")));
    assert!(responses
        .iter()
        .any(|response| matches!(response, Response::State(_))));
    // End of input without quit still says goodbye
    assert_eq!(responses.last(), Some(&Response::Bye));
}

#[test]
fn side_switch_and_ascii_render() {
    let mut runner = runner_from_file();
    let responses = runner.handle(Command::Side {
        side: RoomSide::Ceiling,
    });
    assert_eq!(responses[0], Response::ack("side"));
    assert!(matches!(&responses[1], Response::Events { events }
        if events.contains(&ControllerEvent::GridRebuilt {
            side: RoomSide::Ceiling
        })));

    let responses = runner.handle(Command::Ascii);
    let Response::Ascii { side, grid } = &responses[0] else {
        panic!("expected ascii, got {:?}", responses[0]);
    };
    assert_eq!(*side, RoomSide::Ceiling);
    assert!(grid.contains('@'));
    assert!(grid.contains('#'));
    assert!(grid.contains("stock 0/10"));
}

#[test]
fn restart_returns_to_config_state() {
    let mut runner = runner_from_file();
    let before = runner.state();
    runner.handle(Command::Advance { seconds: 12.0 });
    assert_ne!(runner.state().ticks, 0);

    let responses = runner.handle(Command::Restart);
    assert_eq!(responses[0], Response::ack("restart"));
    assert_eq!(runner.state(), before);
}
