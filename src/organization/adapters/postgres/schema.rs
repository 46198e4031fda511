//! Diesel schema for organization persistence.

diesel::table! {
    /// Organizations in the two-level hierarchy.
    organizations (id) {
        /// Organization identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Parent organization for child organizations.
        parent_id -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
