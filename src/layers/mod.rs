//! Map layers: the rendered tile set, the density overlay and the headless canvas.

pub mod headless;
pub mod overlay;
pub mod render_set;

pub use headless::{blend_overlay, HeadlessCanvas};
pub use overlay::{OverlayField, OverlayFrame, OverlayStats};
pub use render_set::RenderSet;
