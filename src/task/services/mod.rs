//! Application services for the task board.

mod board;
mod policy;
mod requests;

pub use board::{TaskBoardError, TaskBoardResult, TaskBoardService};
pub use policy::OrderingPolicy;
pub use requests::{CreateTaskRequest, ReorderTaskRequest};
