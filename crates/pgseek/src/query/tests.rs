use super::*;
use crate::client::mock::RecordingClient;
use crate::record::fixtures::Item;
use crate::params;

fn users() -> Query {
    table("users")
}

// ==================== Rendering ====================

#[test]
fn test_select_all_by_default() {
    assert_eq!(users().to_sql(), "SELECT * FROM users");
}

#[test]
fn test_full_clause_order() {
    let q = users()
        .select(["id", "name"])
        .join("INNER JOIN p ON p.user_id = users.id")
        .filter("age > $1", params![18])
        .group_by("dept")
        .having("COUNT(*) > 3")
        .order_by("name ASC")
        .limit(10)
        .offset(20)
        .for_update();

    assert_eq!(
        q.to_sql(),
        "SELECT id, name FROM users INNER JOIN p ON p.user_id = users.id WHERE age > $1 \
         GROUP BY dept HAVING COUNT(*) > 3 ORDER BY name ASC LIMIT 10 OFFSET 20 FOR UPDATE"
    );
}

#[test]
fn test_zero_limit_and_offset_are_omitted() {
    let q = users().limit(5).offset(5).limit(0).offset(0);
    assert_eq!(q.to_sql(), "SELECT * FROM users");
}

#[test]
fn test_joins_append_in_call_order() {
    let q = users()
        .join("LEFT JOIN a ON a.id = users.a_id")
        .join("LEFT JOIN b ON b.id = users.b_id");
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM users LEFT JOIN a ON a.id = users.a_id LEFT JOIN b ON b.id = users.b_id"
    );
}

#[test]
fn test_rendering_is_deterministic() {
    let q = users().select(["id"]).filter("id > $1", params![1]).limit(3);
    assert_eq!(q.to_sql(), q.to_sql());
    assert_eq!(q.config().to_select_sql("users"), q.config().to_select_sql("users"));
}

#[test]
fn test_count_sql_keeps_only_where() {
    let q = users()
        .select(["id"])
        .join("INNER JOIN p ON p.user_id = users.id")
        .filter("status = $1", params!["active"])
        .group_by("dept")
        .order_by("id DESC")
        .limit(10)
        .offset(30);
    assert_eq!(q.to_count_sql(), "SELECT COUNT(*) FROM users WHERE status = $1");
}

#[test]
fn test_exists_sql_probes_one_row() {
    let q = users().select(["id", "name"]).filter("id = $1", params![7]);
    assert_eq!(
        q.config().to_exists_sql(q.table()),
        "SELECT 1 FROM users WHERE id = $1 LIMIT 1"
    );
}

// ==================== Immutability ====================

#[test]
fn test_mutators_leave_receiver_unchanged() {
    let base = users()
        .select(["id"])
        .filter("status = $1", params!["active"])
        .join("INNER JOIN p ON p.user_id = users.id")
        .limit(5);
    let before = base.config().clone();
    let before_args = base.args().to_vec();

    let derived = [
        base.select(["name"]),
        base.filter("age > $1", params![30]),
        base.order_by("id DESC"),
        base.limit(50),
        base.offset(10),
        base.join("LEFT JOIN q ON q.id = users.q_id"),
        base.group_by("dept"),
        base.having("COUNT(*) > 1"),
        base.for_update(),
        base.tagged("users.list"),
    ];

    assert_eq!(base.config(), &before);
    assert_eq!(base.args(), before_args.as_slice());
    assert_eq!(base.tag(), None);
    for q in &derived {
        assert_ne!(
            (q.config(), q.args(), q.tag()),
            (&before, before_args.as_slice(), None)
        );
    }
}

#[test]
fn test_siblings_do_not_share_storage() {
    let base = users().join("INNER JOIN a ON true");
    let left = base.join("INNER JOIN b ON true");
    let right = base.join("INNER JOIN c ON true");

    assert_eq!(base.config().join_clauses.len(), 1);
    assert_eq!(left.config().join_clauses[1], "INNER JOIN b ON true");
    assert_eq!(right.config().join_clauses[1], "INNER JOIN c ON true");
}

#[test]
fn test_filter_replaces_previous_where_and_args() {
    let q = users()
        .filter("status = $1", params!["active"])
        .filter("age > $1", params![21]);
    assert_eq!(q.config().where_clause, "age > $1");
    assert_eq!(q.args(), &[Value::Int(21)]);
}

// ==================== Placeholder rebind ====================

#[test]
fn test_rebind_numbers_markers_in_order() {
    assert_eq!(rebind("a = ? AND b = ?"), "a = $1 AND b = $2");
}

#[test]
fn test_rebind_continues_after_native_placeholders() {
    assert_eq!(
        rebind("(status = $1 AND age > $2) AND (id > ?)"),
        "(status = $1 AND age > $2) AND (id > $3)"
    );
    assert_eq!(rebind("x = $10 OR y = ?"), "x = $10 OR y = $11");
}

#[test]
fn test_rebind_skips_literals_and_comments() {
    assert_eq!(
        rebind("note = 'why?' AND \"q?\" = ? -- really?\nAND id = ?"),
        "note = 'why?' AND \"q?\" = $1 -- really?\nAND id = $2"
    );
    assert_eq!(rebind("/* ? */ id = ?"), "/* ? */ id = $1");
    assert_eq!(rebind("s = 'it''s ?' AND t = ?"), "s = 'it''s ?' AND t = $1");
}

#[test]
fn test_rebind_honors_backslash_escapes_in_e_strings() {
    assert_eq!(rebind(r"a = E'it\'s ?' AND b = ?"), r"a = E'it\'s ?' AND b = $1");
    assert_eq!(rebind(r"a = e'\\' AND b = ?"), r"a = e'\\' AND b = $1");
    // Without the prefix a backslash is an ordinary character.
    assert_eq!(rebind(r"name = 'x\' AND b = ?"), r"name = 'x\' AND b = $1");
}

#[test]
fn test_rebind_skips_dollar_quoted_bodies() {
    assert_eq!(rebind("a = $$it's ?$$ AND b = ?"), "a = $$it's ?$$ AND b = $1");
    assert_eq!(
        rebind("a = $fn$ $1 ? $fn$ AND b = $2 AND c = ?"),
        "a = $fn$ $1 ? $fn$ AND b = $2 AND c = $3"
    );
}

#[test]
fn test_rebind_ignores_dollar_inside_literals() {
    assert_eq!(rebind("price = '$9' AND id = ?"), "price = '$9' AND id = $1");
}

#[test]
fn test_rebind_without_markers_is_identity() {
    let sql = "SELECT * FROM users WHERE id = $1";
    assert_eq!(rebind(sql), sql);
}

// ==================== Execution ====================

#[tokio::test]
async fn test_get_all_sends_rendered_sql_and_args() {
    let client = RecordingClient::new();
    let q = users().filter("status = $1", params!["active"]).limit(2);

    let rows: Vec<Item> = q.get_all(&client).await.unwrap();
    assert!(rows.is_empty());

    let recorded = client.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(
        recorded[0].sql,
        "SELECT * FROM users WHERE status = $1 LIMIT 2"
    );
    assert_eq!(recorded[0].params, 1);
    assert_eq!(recorded[0].tag, None);
}

#[tokio::test]
async fn test_tag_is_forwarded() {
    let client = RecordingClient::new();
    let q = users().tagged("users.count");
    q.exists(&client).await.unwrap();
    assert_eq!(client.recorded()[0].tag.as_deref(), Some("users.count"));
}

#[tokio::test]
async fn test_count_expects_a_single_scalar_row() {
    let client = RecordingClient::new();
    let q = users().filter("status = $1", params!["active"]).tagged("users.count");

    let err = q.count(&client).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("Expected one row, got none"));

    let recorded = client.recorded();
    assert_eq!(recorded[0].sql, "SELECT COUNT(*) FROM users WHERE status = $1");
    assert_eq!(recorded[0].tag.as_deref(), Some("users.count"));
    assert_eq!(recorded[0].params, 1);
}

#[tokio::test]
async fn test_repeated_count_sends_identical_statements() {
    let client = RecordingClient::new();
    let q = users().filter("status = $1", params!["active"]).limit(5);
    let before = q.config().clone();

    let _ = q.count(&client).await;
    let _ = q.count(&client).await;

    let recorded = client.recorded();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0].sql, recorded[1].sql);
    assert_eq!(recorded[0].params, recorded[1].params);
    assert_eq!(q.config(), &before);
}

#[tokio::test]
async fn test_get_without_rows_is_not_found() {
    let client = RecordingClient::new();
    let err = users()
        .filter("id = $1", params![1])
        .get::<Item>(&client)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("execute get query"));
}

#[tokio::test]
async fn test_get_opt_without_rows_is_none() {
    let client = RecordingClient::new();
    let item = users().get_opt::<Item>(&client).await.unwrap();
    assert!(item.is_none());
}

#[tokio::test]
async fn test_exists_without_rows_is_false() {
    let client = RecordingClient::new();
    let found = users().filter("id = $1", params![1]).exists(&client).await.unwrap();
    assert!(!found);
    assert_eq!(
        client.sql(),
        vec!["SELECT 1 FROM users WHERE id = $1 LIMIT 1".to_string()]
    );
}

#[tokio::test]
async fn test_failures_are_annotated_with_operation() {
    let client = RecordingClient::failing("connection reset");

    let err = users().count(&client).await.unwrap_err();
    assert_eq!(err.operation(), Some("execute count query"));

    let err = users().exists(&client).await.unwrap_err();
    assert_eq!(err.operation(), Some("exists check failed"));

    let err = users().get_all::<Item>(&client).await.unwrap_err();
    assert_eq!(err.operation(), Some("execute get all query"));
    assert_eq!(
        err.to_string(),
        "execute get all query: Connection error: connection reset"
    );
}
