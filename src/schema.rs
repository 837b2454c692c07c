//! Handwritten Diesel schema declarations used by model structs.
//!
//! Migrations define the actual tables and constraints. This module only
//! provides `diesel::table!` declarations so we can derive Insertable/Queryable
//! in a type-safe way without running `diesel print-schema`.

diesel::table! {
    categories (id) {
        id -> Text,
        name -> Text,
        color -> Text,
        icon -> Text,
        is_archived -> Bool,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::table! {
    habits (id) {
        id -> Text,
        category_id -> Text,
        title -> Text,
        description -> Nullable<Text>,
        // serialized frequency descriptor; only the storage adapter touches
        // the raw blob
        frequency -> Text,
        #[sql_name = "type"]
        habit_type -> Text,
        goal_id -> Nullable<Text>,
        is_archived -> Bool,
        sync_status -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::table! {
    logs (id) {
        id -> Text,
        habit_id -> Text,
        user_id -> Text,
        // ISO calendar day, no time component
        date -> Text,
        value -> Bool,
        text -> Nullable<Text>,
        sync_status -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

// Sync bookkeeping (pull watermark and friends).
diesel::table! {
    sync_state (key) {
        key -> Text,
        value -> Text,
    }
}

diesel::joinable!(habits -> categories (category_id));
diesel::joinable!(logs -> habits (habit_id));

diesel::allow_tables_to_appear_in_same_query!(categories, habits, logs);
