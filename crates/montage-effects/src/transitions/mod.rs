//! Built-in transition effects.

mod fade;
mod push;
mod rotate;
mod slide;
mod wipe;
mod zoom;

pub use fade::Fade;
pub use push::Push;
pub use rotate::Rotate;
pub use slide::Slide;
pub use wipe::Wipe;
pub use zoom::Zoom;
