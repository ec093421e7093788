mod control;
pub(crate) mod convert;
mod renderer;
mod state;

pub use control::{ArrayControl, ControlNode, GroupControl, InputControl, ItemGroup, Widget};
pub use renderer::{render, render_fields, render_item, render_template};
pub use state::FormState;
