use crate::events::{WindowId, WindowKind, WindowView, WorkspaceId};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::info;

use super::simulated::SimulatedTopology;

const EDITOR: WindowId = WindowId(1);
const PLAYER: WindowId = WindowId(2);
const DIALOG: WindowId = WindowId(3);

type Scenario = (&'static str, fn(&SimulatedTopology));

/// Desktop situations replayed in dry-run mode, one per tick
const SCENARIOS: [Scenario; 11] = [
    ("empty desktop", |t| {
        t.clear_windows();
        t.set_global_fullscreen(false);
        t.switch_workspace(WorkspaceId(0));
    }),
    ("editor opened", |t| {
        t.add_window(WindowView::new(EDITOR.0).with_title("Editor").with_class("code"));
    }),
    ("file dialog opened", |t| {
        t.add_window(
            WindowView::new(DIALOG.0)
                .with_title("Open File")
                .with_kind(WindowKind::Other),
        );
    }),
    ("video player fullscreen", |t| {
        t.add_window(WindowView::new(PLAYER.0).with_title("Player").with_class("mpv"));
        t.set_fullscreen(PLAYER, true);
    }),
    ("player closed, editor maximized", |t| {
        t.remove_window(PLAYER);
        t.set_maximized(EDITOR, true);
    }),
    ("editor minimized", |t| t.set_minimized(EDITOR, true)),
    ("overview opened and closed", |t| {
        t.set_overview_visible(true);
        t.set_minimized(EDITOR, false);
        t.set_overview_visible(false);
    }),
    ("editor moved to secondary monitor", |t| t.move_to_monitor(EDITOR, 1)),
    ("game fullscreen on primary monitor", |t| t.set_global_fullscreen(true)),
    ("game closed", |t| t.set_global_fullscreen(false)),
    ("switched to an empty workspace", |t| t.switch_workspace(WorkspaceId(1))),
];

/// Replays `SCENARIOS` on `topology` every `every` until the task is aborted
pub fn spawn_scenario_cycler(topology: SimulatedTopology, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Dry-run: replaying {} desktop scenarios", SCENARIOS.len());

        let mut ticker = interval(every);
        let mut index = 0;
        loop {
            ticker.tick().await;

            let (name, apply) = SCENARIOS[index];
            info!("Dry-run: scenario '{}'", name);
            apply(&topology);

            index = (index + 1) % SCENARIOS.len();
        }
    })
}
