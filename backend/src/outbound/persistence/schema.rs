//! Diesel table definitions; must match `backend/migrations`.

diesel::table! {
    /// Dashboard visitors and admins.
    users (id) {
        id -> Uuid,
        tokens_remaining -> Int4,
        is_admin -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Activation log. `success` stays false until the device fires.
    actions (id) {
        id -> Int8,
        user_id -> Uuid,
        trigger_id -> Varchar,
        occurred_at -> Timestamptz,
        success -> Bool,
    }
}

diesel::table! {
    /// Append-only recharge log.
    recharges (id) {
        id -> Int8,
        user_id -> Uuid,
        occurred_at -> Timestamptz,
    }
}

diesel::joinable!(actions -> users (user_id));
diesel::joinable!(recharges -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(actions, recharges, users);
