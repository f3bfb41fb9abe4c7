diesel::table! {
    datasets (id) {
        id -> Uuid,
        user_id -> Uuid,
        name -> Text,
        file_path -> Text,
        file_size -> Int8,
        row_count -> Int4,
        column_count -> Int4,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    dataset_columns (dataset_id, position) {
        dataset_id -> Uuid,
        position -> Int4,
        column_name -> Text,
        data_type -> Text,
        sample_values -> Array<Text>,
    }
}

diesel::table! {
    insights (id) {
        id -> Uuid,
        user_id -> Uuid,
        dataset_id -> Uuid,
        title -> Text,
        content -> Text,
        insight_type -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(dataset_columns -> datasets (dataset_id));
diesel::joinable!(insights -> datasets (dataset_id));

diesel::allow_tables_to_appear_in_same_query!(datasets, dataset_columns, insights);
