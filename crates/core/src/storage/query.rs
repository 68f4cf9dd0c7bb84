//! Object query builder
//!
//! Describes "select these columns from every document carrying an object of
//! class X" without tying callers to a query language. The statement text is
//! kept for diagnostics.

use std::fmt;

/// One projected row; width equals the number of selected columns
pub type Row = Vec<String>;

/// Language tag of a rendered statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryLanguage {
    Xwql,
    Sql,
}

/// A projected column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Space,
    DocumentName,
    /// A property of the matched object
    Property(String),
}

/// Query over documents carrying an object of one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectQuery {
    class: String,
    alias: String,
    columns: Vec<Column>,
    distinct: bool,
    wiki: Option<String>,
}

impl ObjectQuery {
    /// Start a query over objects of `class` (local form)
    pub fn objects_of(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            alias: "obj".to_string(),
            columns: Vec::new(),
            distinct: false,
            wiki: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn select(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn select_property(self, property: impl Into<String>) -> Self {
        self.select(Column::Property(property.into()))
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Restrict to documents of one wiki
    pub fn in_wiki(mut self, wiki: impl Into<String>) -> Self {
        self.wiki = Some(wiki.into());
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn wiki(&self) -> Option<&str> {
        self.wiki.as_deref()
    }

    pub fn language(&self) -> QueryLanguage {
        QueryLanguage::Xwql
    }

    /// XWQL rendering, e.g.
    /// `select distinct doc.space, doc.name from Document doc, doc.object(A.B) as obj`
    pub fn statement(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| match c {
                Column::Space => "doc.space".to_string(),
                Column::DocumentName => "doc.name".to_string(),
                Column::Property(p) => format!("{}.{}", self.alias, p),
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "select {}{} from Document doc, doc.object({}) as {}",
            if self.distinct { "distinct " } else { "" },
            columns,
            self.class,
            self.alias
        )
    }
}

impl fmt::Display for ObjectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.statement())
    }
}
