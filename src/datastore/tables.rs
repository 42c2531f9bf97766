#[allow(unused_imports)]
use diesel::sql_types::*;

table! {
    posts (id) {
        id -> Uuid,
        pub_date -> Timestamptz,
        text -> Text,
        author_id -> Uuid,
        group_id -> Nullable<Uuid>,
        image -> Nullable<Text>,
    }
}

table! {
    users (id) {
        id -> Uuid,
        created_at -> Timestamptz,
        username -> Text,
    }
}

table! {
    groups (id) {
        id -> Uuid,
        title -> Text,
        slug -> Text,
        description -> Text,
    }
}

table! {
    comments (id) {
        id -> Uuid,
        created -> Timestamptz,
        text -> Text,
        post_id -> Uuid,
        author_id -> Uuid,
    }
}

table! {
    follows (user_id, author_id) {
        user_id -> Uuid,
        author_id -> Uuid,
    }
}

joinable!(posts -> users (author_id));
joinable!(posts -> groups (group_id));
joinable!(comments -> posts (post_id));
joinable!(comments -> users (author_id));

allow_tables_to_appear_in_same_query!(posts, users, groups);
allow_tables_to_appear_in_same_query!(comments, users);
allow_tables_to_appear_in_same_query!(follows, users);
