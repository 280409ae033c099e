//! Animation drivers: move the painted opacity towards a target.
//!
//! The controller talks to a `Box<dyn AnimationDriver>` and never cares whether
//! values are interpolated or applied in one step.

mod eased;
mod easing;
mod immediate;
mod r#trait;

pub use self::r#trait::{create_animation_driver, AnimationDriver};
