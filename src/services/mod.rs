pub mod animation;
pub mod classifier;
pub mod controller;
pub mod normalizer;
pub mod scheduler;
pub mod settings_store;
pub mod style;
pub mod topology;

pub use animation::create_animation_driver;
pub use controller::PanelController;
pub use settings_store::FileSettingsStore;
pub use style::create_style_applier;
pub use topology::{spawn_scenario_cycler, SimulatedTopology};
