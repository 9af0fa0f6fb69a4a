use super::{CompositeCursor, Cursor, Seek, SortDir, seek_cmp_op};
use crate::query::Query;
use crate::value::Value;

impl Query {
    /// Restrict this query to the rows past `cursor` on `key_field`.
    ///
    /// - No cursor or an empty `key_field` returns an unchanged copy.
    /// - A non-zero `cursor.limit` becomes `LIMIT limit + 1` (one extra row
    ///   signals that another page exists).
    /// - A `Null` key value only sets the limit: this is the first page.
    /// - Otherwise `<key_field> <op> ?` is ANDed onto the WHERE fragment, where
    ///   `op` follows the ORDER BY direction (defaulting to `<key_field> ASC`)
    ///   and `cursor.forward`.
    pub fn with_cursor(&self, key_field: &str, cursor: Option<&Cursor>) -> Self {
        let mut q = self.clone();
        let Some(cursor) = cursor else {
            return q;
        };
        if key_field.is_empty() {
            return q;
        }

        let page_limit = (cursor.limit > 0).then_some(cursor.limit);
        if let Some(limit) = page_limit {
            q.config_mut().limit = limit + 1;
        }
        q.seek = Some(Seek::Key {
            field: key_field.to_string(),
            page_limit,
        });

        if cursor.key_value.is_null() {
            return q;
        }

        if q.config().order_by.is_empty() {
            q.config_mut().order_by = format!("{key_field} ASC");
        }
        let dir = SortDir::from_order_by(&q.config().order_by);
        let op = seek_cmp_op(dir, cursor.forward);

        q.push_predicate(format!("{key_field} {op} ?"), [cursor.key_value.clone()]);
        q
    }

    /// Restrict this query to the rows past a multi-column cursor.
    ///
    /// ORDER BY is replaced by the cursor's order fields and the boundary is
    /// a row comparison `(f1, f2, ...) > (?, ?, ...)` (`<` when paging
    /// backward). Keys missing from `key_values` bind as `NULL`.
    ///
    /// The single operator is only exact when every order field sorts in the
    /// same direction.
    pub fn with_composite_cursor(&self, cursor: Option<&CompositeCursor>) -> Self {
        let mut q = self.clone();
        let Some(cursor) = cursor else {
            return q;
        };
        if cursor.key_values.is_empty() || cursor.order_fields.is_empty() {
            return q;
        }

        let page_limit = (cursor.limit > 0).then_some(cursor.limit);
        if let Some(limit) = page_limit {
            q.config_mut().limit = limit + 1;
        }

        #[cfg(feature = "tracing")]
        {
            let first = cursor.order_fields[0].direction;
            if cursor.order_fields.iter().any(|f| f.direction != first) {
                tracing::warn!(
                    target: "pgseek.page",
                    order_by = %order_by_sql(cursor),
                    "composite cursor mixes sort directions; tuple comparison uses a single operator"
                );
            }
        }

        q.config_mut().order_by = order_by_sql(cursor);

        let names: Vec<&str> = cursor.order_fields.iter().map(|f| f.name.as_str()).collect();
        let markers = vec!["?"; names.len()].join(", ");
        let op = if cursor.forward { ">" } else { "<" };
        let values: Vec<Value> = cursor
            .order_fields
            .iter()
            .map(|f| cursor.key_values.get(&f.name).cloned().unwrap_or_default())
            .collect();

        q.push_predicate(format!("({}) {op} ({markers})", names.join(", ")), values);
        q.seek = Some(Seek::Composite {
            order_fields: cursor.order_fields.clone(),
            page_limit,
        });
        q
    }
}

fn order_by_sql(cursor: &CompositeCursor) -> String {
    cursor
        .order_fields
        .iter()
        .map(|f| format!("{} {}", f.name, f.direction))
        .collect::<Vec<_>>()
        .join(", ")
}
