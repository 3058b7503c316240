diesel::table! {
    review_items (item_id) {
        item_id -> Integer,
        owner_id -> Integer,
        item_type -> Text,
        content -> Text,
        ease_factor -> Double,
        interval_days -> Double,
        due_at -> Timestamp,
        failure_count -> Integer,
        review_count -> Integer,
        priority -> Integer,
        requires_spoken -> Bool,
        explanation -> Nullable<Text>,
        source_evaluation_id -> Nullable<Text>,
        created_at -> Timestamp,
    }
}
