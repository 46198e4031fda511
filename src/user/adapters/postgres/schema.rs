//! Diesel schema for user persistence.

diesel::table! {
    /// Registered users.
    users (id) {
        /// User identifier.
        id -> Uuid,
        /// Normalised, globally unique email address.
        #[max_length = 320]
        email -> Varchar,
        /// Role name: `owner`, `admin` or `viewer`.
        #[max_length = 16]
        role -> Varchar,
        /// Owning organization.
        organization_id -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
