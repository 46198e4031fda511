//! Domain model for the task board.
//!
//! Column placement and the index-shift planner live in [`ordering`];
//! the [`Task`] aggregate carries content, placement and timestamps.

mod error;
mod ids;
pub mod ordering;
mod status;
mod task;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{OrderIndex, TaskId, TaskTitle};
pub use ordering::{
    ColumnExpectation, ColumnKey, IndexShift, InsertPlan, MovePlan, Placement, PlanConflict,
    RemovalPlan, ShiftDelta,
};
pub use status::TaskStatus;
pub use task::{NewTaskData, PersistedTaskData, Task, TaskChanges, TaskEdit};
