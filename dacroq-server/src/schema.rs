table! {
    docs (section_id) {
        section_id -> Varchar,
        title -> Varchar,
        content -> Text,
        updated -> Timestamptz,
    }
}

table! {
    feedback (id) {
        id -> Int4,
        kind -> Varchar,
        description -> Text,
        email -> Nullable<Varchar>,
        status -> Varchar,
        created -> Timestamptz,
    }
}

table! {
    notifications (id) {
        id -> Int4,
        title -> Varchar,
        message -> Text,
        kind -> Varchar,
        global -> Bool,
        recipients -> Array<Int4>,
        read_by -> Array<Int4>,
        deleted -> Bool,
        created -> Timestamptz,
    }
}

table! {
    posts (id) {
        id -> Int4,
        title -> Varchar,
        content -> Text,
        author_id -> Nullable<Int4>,
        author -> Jsonb,
        created -> Timestamptz,
        views -> Int4,
        reply_count -> Int4,
        pinned -> Bool,
        answered -> Bool,
    }
}

table! {
    replies (id) {
        id -> Int4,
        post_id -> Int4,
        content -> Text,
        author_id -> Nullable<Int4>,
        author -> Jsonb,
        created -> Timestamptz,
    }
}

table! {
    sat_results (id) {
        id -> Int4,
        batch_id -> Varchar,
        problem_id -> Varchar,
        source -> Varchar,
        variables -> Int4,
        clauses -> Int4,
        solver -> Varchar,
        solved -> Bool,
        satisfiable -> Nullable<Bool>,
        time_ms -> Float8,
        energy_nj -> Nullable<Float8>,
        created -> Timestamptz,
        created_by -> Nullable<Int4>,
    }
}

table! {
    sessions (id) {
        id -> Int4,
        user_id -> Int4,
        token -> Varchar,
        created -> Timestamptz,
        last_used -> Timestamptz,
        last_ip -> Bytea,
        user_agent -> Varchar,
    }
}

table! {
    system_flags (name) {
        name -> Varchar,
        enabled -> Bool,
        message -> Nullable<Text>,
        updated -> Timestamptz,
    }
}

table! {
    tests (id) {
        id -> Int4,
        name -> Varchar,
        chip_type -> Varchar,
        status -> Varchar,
        created -> Timestamptz,
        completed -> Nullable<Timestamptz>,
        results -> Nullable<Jsonb>,
        created_by -> Nullable<Int4>,
        creator -> Jsonb,
    }
}

table! {
    users (id) {
        id -> Int4,
        name -> Varchar,
        email -> Varchar,
        password_hash -> Varchar,
        role -> Varchar,
        enabled -> Bool,
        created -> Timestamptz,
        last_online -> Nullable<Timestamptz>,
    }
}

joinable!(replies -> posts (post_id));
joinable!(sessions -> users (user_id));

allow_tables_to_appear_in_same_query!(
    docs,
    feedback,
    notifications,
    posts,
    replies,
    sat_results,
    sessions,
    system_flags,
    tests,
    users,
);
