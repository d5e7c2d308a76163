pub mod enums;
pub mod identifier;
pub mod item;
pub mod schedule;
pub mod tab;
pub mod views;

pub use enums::{Filter, Placement, Status};
pub use identifier::normalize;
pub use item::Item;
pub use schedule::{parse_schedule, Schedule, ScheduleValue};
pub use tab::{ColumnMapping, Tab};
pub use views::{by_schedule, filter_items, TabCounts};
