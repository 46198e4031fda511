//! Request payloads for task board operations.

use crate::task::domain::{OrderIndex, TaskStatus};

/// Request payload for creating a task in the caller's organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub(super) title: String,
    pub(super) description: Option<String>,
    pub(super) category: Option<String>,
    pub(super) status: TaskStatus,
    pub(super) order_index: Option<OrderIndex>,
}

impl CreateTaskRequest {
    /// Creates a request for a `todo` task appended to its column.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            category: None,
            status: TaskStatus::default(),
            order_index: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Places the task in `status` instead of `todo`.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Inserts the task at `index` instead of appending it.
    ///
    /// Indices past the end of the column append.
    #[must_use]
    pub const fn at_index(mut self, index: u32) -> Self {
        self.order_index = Some(OrderIndex::new(index));
        self
    }
}

/// Request payload for moving a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderTaskRequest {
    pub(super) order_index: OrderIndex,
    pub(super) status: Option<TaskStatus>,
}

impl ReorderTaskRequest {
    /// Moves the task to `index` within its current column.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self {
            order_index: OrderIndex::new(index),
            status: None,
        }
    }

    /// Moves the task into the `status` column instead.
    #[must_use]
    pub const fn to_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }
}
