//! Style applier: the only place a panel opacity turns into a visible style.
//!
//! Implementations only render; they never decide what opacity to show.

mod css_file;
mod dry_run;
mod r#trait;

pub use self::r#trait::{create_style_applier, StyleApplier};

#[cfg(test)]
pub(crate) mod recording;
#[cfg(test)]
pub(crate) use self::recording::RecordingApplier;
