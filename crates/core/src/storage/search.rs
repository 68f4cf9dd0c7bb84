//! SQLite execution of object queries

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, instrument};

use super::parse::value_to_string;
use super::query::{Column, ObjectQuery, QueryLanguage, Row};
use crate::error::Result;

pub struct QueryStore<'a> {
    conn: &'a Connection,
}

impl<'a> QueryStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Run an object query
    #[instrument(skip_all, fields(statement = %query))]
    pub fn execute(&self, query: &ObjectQuery) -> Result<Vec<Row>> {
        let (sql, bindings) = to_sql(query);
        debug!(language = ?QueryLanguage::Sql, sql = %sql, "Executing object query");

        let mut stmt = self.conn.prepare(&sql)?;
        let width = query.columns().len();

        let rows = stmt.query_map(params_from_iter(bindings.iter()), |row| {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(value_to_string(row.get::<_, SqlValue>(i)?));
            }
            Ok(values)
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

/// Translate to SQL plus positional bindings
fn to_sql(query: &ObjectQuery) -> (String, Vec<String>) {
    let mut bindings = vec![query.class().to_string()];

    let columns = query
        .columns()
        .iter()
        .map(|c| match c {
            Column::Space => "d.space".to_string(),
            Column::DocumentName => "d.name".to_string(),
            Column::Property(property) => {
                bindings.push(json_path(property));
                format!("json_extract(o.properties, ?{})", bindings.len())
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!(
        "SELECT {}{} FROM documents d JOIN objects o ON o.document_id = d.id WHERE o.class = ?1",
        if query.is_distinct() { "DISTINCT " } else { "" },
        columns
    );

    if let Some(wiki) = query.wiki() {
        bindings.push(wiki.to_string());
        sql.push_str(&format!(" AND d.wiki = ?{}", bindings.len()));
    }

    if query.is_distinct() {
        let positions = (1..=query.columns().len())
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        if !positions.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", positions));
        }
    } else {
        sql.push_str(" ORDER BY d.space, d.name, o.number");
    }
    (sql, bindings)
}

fn json_path(property: &str) -> String {
    format!("$.\"{}\"", property.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, DocumentReference, XObject};
    use crate::storage::Database;

    fn listener_query() -> ObjectQuery {
        ObjectQuery::objects_of("IRC.IRCBotListenerClass")
            .alias("listener")
            .select(Column::Space)
            .select(Column::DocumentName)
            .select_property("name")
            .select_property("description")
            .distinct()
    }

    fn save_listener(db: &Database, wiki: &str, space: &str, name: &str, listener: &str) {
        let mut doc = Document::new(DocumentReference::new(wiki, space, name));
        doc.add_object(
            XObject::new("IRC.IRCBotListenerClass")
                .with("name", listener)
                .with("description", format!("{} listener", listener)),
        );
        db.documents().save(&doc, "", "XWiki.Admin").unwrap();
    }

    #[test]
    fn test_projects_requested_columns() {
        let db = Database::open_in_memory().unwrap();
        save_listener(&db, "xwiki", "IRC", "LogListener", "Log");
        save_listener(&db, "xwiki", "Bots", "Echo", "Echo");

        let rows = db.queries().execute(&listener_query()).unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["Bots".to_string(), "Echo".into(), "Echo".into(), "Echo listener".into()],
                vec!["IRC".to_string(), "LogListener".into(), "Log".into(), "Log listener".into()],
            ]
        );
    }

    #[test]
    fn test_missing_property_reads_empty_and_wiki_filter() {
        let db = Database::open_in_memory().unwrap();
        let mut doc = Document::new(DocumentReference::new("xwiki", "Main", "Bare"));
        doc.add_object(XObject::new("IRC.IRCBotListenerClass"));
        db.documents().save(&doc, "", "XWiki.Admin").unwrap();
        save_listener(&db, "other", "IRC", "Remote", "Remote");

        let rows = db
            .queries()
            .execute(&listener_query().in_wiki("xwiki"))
            .unwrap();
        assert_eq!(rows, vec![vec!["Main".to_string(), "Bare".into(), "".into(), "".into()]]);
    }

    #[test]
    fn test_unrelated_classes_ignored() {
        let db = Database::open_in_memory().unwrap();
        let mut doc = Document::new(DocumentReference::new("xwiki", "Main", "WebHome"));
        doc.add_object(XObject::new("XWiki.TagClass").with("name", "tag"));
        db.documents().save(&doc, "", "XWiki.Admin").unwrap();

        assert!(db.queries().execute(&listener_query()).unwrap().is_empty());
    }
}
