//! Diesel schema for marketplace persistence.

diesel::table! {
    /// Marketplace tasks.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Client who posted the task.
        client_id -> Uuid,
        /// Assigned performer.
        performer_id -> Nullable<Uuid>,
        /// Task category.
        #[max_length = 255]
        category -> Varchar,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Optional deadline.
        expire_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Optimistic concurrency version.
        version -> Int8,
    }
}

diesel::table! {
    /// Opinions left on completed tasks, at most one per task.
    opinions (id) {
        /// Opinion identifier.
        id -> Uuid,
        /// Rated task.
        task_id -> Uuid,
        /// Rated performer.
        performer_id -> Uuid,
        /// Rate between 1 and 5.
        rate -> Int2,
        /// Free-text comment.
        comment -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Contractors and their failure counters.
    performers (id) {
        /// Performer user identifier.
        id -> Uuid,
        /// Insertion sequence used as the ranking tie-break.
        registration_seq -> Int8,
        /// Number of refused tasks.
        fail_count -> Int4,
        /// Whether contacts are restricted.
        hide_contacts -> Bool,
        /// Registration timestamp.
        registered_at -> Timestamptz,
    }
}

diesel::joinable!(opinions -> tasks (task_id));
diesel::joinable!(opinions -> performers (performer_id));
diesel::joinable!(tasks -> performers (performer_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, opinions, performers);
