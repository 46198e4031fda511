//! Diesel schema for task persistence.

diesel::table! {
    /// Task records. `(organization_id, status, order_index)` is unique,
    /// checked at commit.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning organization.
        organization_id -> Uuid,
        /// Creating user.
        owner_id -> Uuid,
        /// Title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Optional category label.
        #[max_length = 64]
        category -> Nullable<Varchar>,
        /// Status column: `todo`, `in-progress` or `done`.
        #[max_length = 16]
        status -> Varchar,
        /// Zero-based position within the status column.
        order_index -> Int4,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
