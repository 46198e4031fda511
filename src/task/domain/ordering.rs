//! Column placement and the index-shift planner.
//!
//! A column is the set of tasks sharing an organization and a status. The
//! planner turns a requested create, delete or move into the range-bounded
//! shifts that keep the column's indices dense, together with the
//! observations the plan was computed from. Repositories re-check those
//! observations inside their atomic unit and reject the plan with a
//! [`PlanConflict`] if another writer got there first.

use super::{OrderIndex, TaskId, TaskStatus};
use crate::organization::domain::OrganizationId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifies one ordered column on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnKey {
    organization_id: OrganizationId,
    status: TaskStatus,
}

impl ColumnKey {
    /// Creates a column key.
    #[must_use]
    pub const fn new(organization_id: OrganizationId, status: TaskStatus) -> Self {
        Self {
            organization_id,
            status,
        }
    }

    /// Returns the owning organization.
    #[must_use]
    pub const fn organization_id(self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the column status.
    #[must_use]
    pub const fn status(self) -> TaskStatus {
        self.status
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization_id, self.status)
    }
}

/// A task's column and position within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Placement {
    column: ColumnKey,
    index: OrderIndex,
}

impl Placement {
    /// Creates a placement.
    #[must_use]
    pub const fn new(column: ColumnKey, index: OrderIndex) -> Self {
        Self { column, index }
    }

    /// Returns the column.
    #[must_use]
    pub const fn column(self) -> ColumnKey {
        self.column
    }

    /// Returns the position within the column.
    #[must_use]
    pub const fn index(self) -> OrderIndex {
        self.index
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.column, self.index)
    }
}

/// Direction of a bulk index shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftDelta {
    /// Every covered index moves one position later.
    Increment,
    /// Every covered index moves one position earlier.
    Decrement,
}

impl ShiftDelta {
    /// Applies the delta to `index`.
    #[must_use]
    pub const fn apply(self, index: OrderIndex) -> OrderIndex {
        match self {
            Self::Increment => index.next(),
            Self::Decrement => index.previous(),
        }
    }
}

/// Range-conditioned update of every index in `[from, until)` of a column.
///
/// An open `until` covers the rest of the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexShift {
    column: ColumnKey,
    from: OrderIndex,
    until: Option<OrderIndex>,
    delta: ShiftDelta,
}

impl IndexShift {
    const fn new(
        column: ColumnKey,
        from: OrderIndex,
        until: Option<OrderIndex>,
        delta: ShiftDelta,
    ) -> Self {
        Self {
            column,
            from,
            until,
            delta,
        }
    }

    /// Returns the shifted column.
    #[must_use]
    pub const fn column(&self) -> ColumnKey {
        self.column
    }

    /// Returns the first covered index.
    #[must_use]
    pub const fn start(&self) -> OrderIndex {
        self.from
    }

    /// Returns the exclusive upper bound, if any.
    #[must_use]
    pub const fn end(&self) -> Option<OrderIndex> {
        self.until
    }

    /// Returns the shift direction.
    #[must_use]
    pub const fn delta(&self) -> ShiftDelta {
        self.delta
    }

    /// Returns `true` when `placement` falls inside the shifted range.
    #[must_use]
    pub fn covers(&self, placement: Placement) -> bool {
        placement.column == self.column
            && placement.index >= self.from
            && self.until.is_none_or(|until| placement.index < until)
    }

    /// Returns the index `placement` ends up at after the shift.
    #[must_use]
    pub fn apply(&self, placement: Placement) -> OrderIndex {
        if self.covers(placement) {
            self.delta.apply(placement.index)
        } else {
            placement.index
        }
    }
}

/// Column length observed while planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnExpectation {
    column: ColumnKey,
    len: u32,
}

impl ColumnExpectation {
    const fn new(column: ColumnKey, len: u32) -> Self {
        Self { column, len }
    }

    /// Returns the observed column.
    #[must_use]
    pub const fn column(self) -> ColumnKey {
        self.column
    }

    /// Returns the observed number of tasks.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.len
    }

    /// Returns `true` when the column was observed empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Fails unless `actual` matches the observed length.
    ///
    /// # Errors
    ///
    /// Returns [`PlanConflict::ColumnLengthChanged`] on mismatch.
    pub const fn verify(self, actual: u32) -> Result<(), PlanConflict> {
        if actual == self.len {
            return Ok(());
        }
        Err(PlanConflict::ColumnLengthChanged {
            column: self.column,
            expected: self.len,
            actual,
        })
    }
}

/// The state a plan was computed from no longer holds.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PlanConflict {
    /// The planned task disappeared.
    #[error("task {0} no longer exists")]
    TaskMissing(TaskId),

    /// The planned task was moved by another writer.
    #[error("task {task_id} moved from {expected} to {actual}")]
    PlacementChanged {
        /// Task being planned for.
        task_id: TaskId,
        /// Placement the plan assumed.
        expected: Placement,
        /// Placement found in storage.
        actual: Placement,
    },

    /// Tasks were added to or removed from a planned column.
    #[error("column {column} holds {actual} tasks, plan expected {expected}")]
    ColumnLengthChanged {
        /// Column that changed.
        column: ColumnKey,
        /// Length the plan assumed.
        expected: u32,
        /// Length found in storage.
        actual: u32,
    },
}

fn verify_placement(
    task_id: TaskId,
    expected: Placement,
    actual: Option<Placement>,
) -> Result<(), PlanConflict> {
    match actual {
        None => Err(PlanConflict::TaskMissing(task_id)),
        Some(found) if found == expected => Ok(()),
        Some(found) => Err(PlanConflict::PlacementChanged {
            task_id,
            expected,
            actual: found,
        }),
    }
}

/// Inserts a task at a position, shifting later tasks back by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPlan {
    placement: Placement,
    expectation: ColumnExpectation,
    shift: Option<IndexShift>,
}

impl InsertPlan {
    /// Plans an insertion into `column`, which currently holds `len` tasks.
    ///
    /// Without `requested` the task is appended; otherwise it is placed at
    /// `requested` clamped to `[0, len]`.
    #[must_use]
    pub fn plan(column: ColumnKey, len: u32, requested: Option<OrderIndex>) -> Self {
        let end = OrderIndex::new(len);
        let index = requested.map_or(end, |wanted| wanted.min(end));
        let shift = (index < end)
            .then(|| IndexShift::new(column, index, None, ShiftDelta::Increment));
        Self {
            placement: Placement::new(column, index),
            expectation: ColumnExpectation::new(column, len),
            shift,
        }
    }

    /// Returns where the new task lands.
    #[must_use]
    pub const fn placement(&self) -> Placement {
        self.placement
    }

    /// Returns the column length the plan assumed.
    #[must_use]
    pub const fn expectation(&self) -> ColumnExpectation {
        self.expectation
    }

    /// Returns the shift opening the slot, if the task is not appended.
    #[must_use]
    pub const fn shift(&self) -> Option<IndexShift> {
        self.shift
    }

    /// Re-checks the plan against storage.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `column_len`, or a converted
    /// [`PlanConflict`] when the column length changed.
    pub fn verify<F, E>(&self, mut column_len: F) -> Result<(), E>
    where
        F: FnMut(ColumnKey) -> Result<u32, E>,
        E: From<PlanConflict>,
    {
        let actual = column_len(self.expectation.column)?;
        Ok(self.expectation.verify(actual)?)
    }
}

/// Removes a task, closing the gap it leaves behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalPlan {
    task_id: TaskId,
    placement: Placement,
    expectation: ColumnExpectation,
    shift: Option<IndexShift>,
}

impl RemovalPlan {
    /// Plans the removal of `task_id` from `placement` in a column holding
    /// `len` tasks.
    #[must_use]
    pub fn plan(task_id: TaskId, placement: Placement, len: u32) -> Self {
        let from = placement.index.next();
        let shift = (from < OrderIndex::new(len))
            .then(|| IndexShift::new(placement.column, from, None, ShiftDelta::Decrement));
        Self {
            task_id,
            placement,
            expectation: ColumnExpectation::new(placement.column, len),
            shift,
        }
    }

    /// Returns the task being removed.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the placement the plan assumed.
    #[must_use]
    pub const fn placement(&self) -> Placement {
        self.placement
    }

    /// Returns the column length the plan assumed.
    #[must_use]
    pub const fn expectation(&self) -> ColumnExpectation {
        self.expectation
    }

    /// Returns the shift closing the gap, if the task was not last.
    #[must_use]
    pub const fn shift(&self) -> Option<IndexShift> {
        self.shift
    }

    /// Re-checks the plan against storage.
    ///
    /// `current` is the task's placement as stored now, or `None` if it is
    /// gone.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `column_len`, or a converted
    /// [`PlanConflict`] when the task or its column changed.
    pub fn verify<F, E>(&self, current: Option<Placement>, mut column_len: F) -> Result<(), E>
    where
        F: FnMut(ColumnKey) -> Result<u32, E>,
        E: From<PlanConflict>,
    {
        verify_placement(self.task_id, self.placement, current)?;
        let actual = column_len(self.expectation.column)?;
        Ok(self.expectation.verify(actual)?)
    }
}

/// Moves a task within its column or into another column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    task_id: TaskId,
    from: Placement,
    to: Placement,
    expectations: Vec<ColumnExpectation>,
    shifts: Vec<IndexShift>,
}

impl MovePlan {
    /// Plans a move inside the column of `from`, which holds `len` tasks.
    ///
    /// `requested` is clamped to `[0, len - 1]`. Returns `None` when the
    /// clamped target equals the current position.
    #[must_use]
    pub fn within_column(
        task_id: TaskId,
        from: Placement,
        len: u32,
        requested: OrderIndex,
    ) -> Option<Self> {
        let column = from.column;
        let old = from.index;
        let target = requested.min(OrderIndex::new(len.saturating_sub(1)));
        let shift = if target > old {
            IndexShift::new(column, old.next(), Some(target.next()), ShiftDelta::Decrement)
        } else if target < old {
            IndexShift::new(column, target, Some(old), ShiftDelta::Increment)
        } else {
            return None;
        };
        Some(Self {
            task_id,
            from,
            to: Placement::new(column, target),
            expectations: vec![ColumnExpectation::new(column, len)],
            shifts: vec![shift],
        })
    }

    /// Plans a move from `from` (in a column of `source_len` tasks) into
    /// `target`, which holds `target_len` tasks.
    ///
    /// `requested` is clamped to `[0, target_len]`.
    #[must_use]
    pub fn across_columns(
        task_id: TaskId,
        from: Placement,
        source_len: u32,
        target: ColumnKey,
        target_len: u32,
        requested: OrderIndex,
    ) -> Self {
        let target_end = OrderIndex::new(target_len);
        let index = requested.min(target_end);
        let gap_start = from.index.next();
        let shifts = [
            (gap_start < OrderIndex::new(source_len))
                .then(|| IndexShift::new(from.column, gap_start, None, ShiftDelta::Decrement)),
            (index < target_end)
                .then(|| IndexShift::new(target, index, None, ShiftDelta::Increment)),
        ]
        .into_iter()
        .flatten()
        .collect();
        Self {
            task_id,
            from,
            to: Placement::new(target, index),
            expectations: vec![
                ColumnExpectation::new(from.column, source_len),
                ColumnExpectation::new(target, target_len),
            ],
            shifts,
        }
    }

    /// Returns the task being moved.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the placement the plan assumed.
    #[must_use]
    pub const fn origin(&self) -> Placement {
        self.from
    }

    /// Returns where the task lands.
    #[must_use]
    pub const fn destination(&self) -> Placement {
        self.to
    }

    /// Returns `true` when the task changes column.
    #[must_use]
    pub fn is_cross_column(&self) -> bool {
        self.from.column != self.to.column
    }

    /// Returns the column lengths the plan assumed.
    #[must_use]
    pub fn expectations(&self) -> &[ColumnExpectation] {
        &self.expectations
    }

    /// Returns the shifts to apply to every other task.
    #[must_use]
    pub fn shifts(&self) -> &[IndexShift] {
        &self.shifts
    }

    /// Returns the columns the plan touches, sorted and deduplicated.
    #[must_use]
    pub fn columns(&self) -> Vec<ColumnKey> {
        let mut columns: Vec<_> = self
            .expectations
            .iter()
            .map(|expectation| expectation.column)
            .collect();
        columns.sort_unstable();
        columns.dedup();
        columns
    }

    /// Re-checks the plan against storage.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `column_len`, or a converted
    /// [`PlanConflict`] when the task or a column changed.
    pub fn verify<F, E>(&self, current: Option<Placement>, mut column_len: F) -> Result<(), E>
    where
        F: FnMut(ColumnKey) -> Result<u32, E>,
        E: From<PlanConflict>,
    {
        verify_placement(self.task_id, self.from, current)?;
        for expectation in &self.expectations {
            let actual = column_len(expectation.column)?;
            expectation.verify(actual)?;
        }
        Ok(())
    }
}
