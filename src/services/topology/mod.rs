//! Window topology source: the host's view of windows, monitors and workspaces.
//!
//! Only the interface and a simulated host live here; the classifier never sees
//! a source, only the `TopologySnapshot` taken from one.

mod scenario;
mod simulated;
mod r#trait;

pub use self::scenario::spawn_scenario_cycler;
pub use self::simulated::SimulatedTopology;
pub use self::r#trait::{take_snapshot, TopologySink, WindowTopologySource};
