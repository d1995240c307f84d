pub mod animation;
pub mod border;
pub mod renderer;
pub mod selection;

pub use border::BorderFrame;
pub use renderer::{DragEnd, OverlayRenderer};
pub use selection::SelectionBox;
