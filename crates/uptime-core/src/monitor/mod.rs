pub mod engine;
pub mod event;
pub mod state;

pub use engine::{Monitor, StatusHandle};
pub use event::{EventKind, EventRing, MonitorEvent};
pub use state::{alert_eligible, LinkStatus, MonitorState, Transition};
