pub mod emit;
pub mod error;
pub mod format;

pub use emit::{count_line_feeds, insertion_edit, plan_stub_edit};
pub use format::{render_component_stub, Formatter};
