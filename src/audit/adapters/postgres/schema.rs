//! Diesel schema for audit persistence.

diesel::table! {
    /// Append-only audit records.
    audit_logs (id) {
        /// Monotonic record sequence.
        id -> Int8,
        /// Acting user, if known.
        actor_id -> Nullable<Uuid>,
        /// Action name such as `task.create`.
        #[max_length = 64]
        action -> Varchar,
        /// Kind of resource affected.
        #[max_length = 64]
        resource_type -> Varchar,
        /// Affected resource, if any.
        resource_id -> Nullable<Uuid>,
        /// Action-specific detail.
        meta -> Jsonb,
        /// Time the record was taken.
        recorded_at -> Timestamptz,
    }
}
