//! Cursor pagination over report tables
//!
//! A [`Paginator`] walks a [`PageSource`] from the first page until a page
//! comes back without a continuation cursor, handing out rows one at a time.
//! It is finite and cannot be restarted; every collector invocation builds a
//! fresh one.
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::error::Result;
use crate::extract::{FieldKind, FieldValue, FromNode, Node, coerce};

/// Rows requested on the first page
pub const FIRST_PAGE_LIMIT: usize = 100;

/// Rows requested on every continuation page
pub const NEXT_PAGE_LIMIT: usize = 1000;

/// One page of a positional table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TablePage {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub next_cursor: Option<String>,
}

impl FromNode for TablePage {
    fn from_node(node: &Node<'_>) -> Self {
        let columns = node
            .array("columns")
            .iter()
            .map(|c| match coerce(c, FieldKind::Str) {
                Some(FieldValue::Str(name)) => name,
                _ => String::new(),
            })
            .collect();

        let rows = node
            .array("dataGrid")
            .iter()
            .filter_map(|row| match row {
                Value::Array(cells) => Some(cells.clone()),
                _ => {
                    warn!("Skipping non-array row in {}", node.context());
                    None
                }
            })
            .collect();

        let cursor = node.string("cursor").filter(|c| !c.is_empty());
        let next_cursor = match (node.has("hasMore"), node.bool_or("hasMore", false)) {
            (true, false) => None,
            (true, true) if cursor.is_none() => {
                warn!("{} reports more rows but no cursor, stopping", node.context());
                None
            }
            _ => cursor,
        };

        Self { columns, rows, next_cursor }
    }
}

/// Something that can fetch table pages by cursor
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page. `cursor` is `None` for the first page only.
    async fn fetch_page(&self, cursor: Option<&str>, limit: usize) -> Result<TablePage>;
}

/// Column name to position mapping, captured from the first page
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn new(names: Vec<String>) -> Self {
        let mut positions = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            positions.insert(name.clone(), i);
        }
        Self { names, positions }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Position of the last column carrying `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Position of whichever of `names` appears last in column order
    pub fn last_of(&self, names: &[&str]) -> Option<usize> {
        names.iter().filter_map(|name| self.position(name)).max()
    }
}

/// A positional row paired with the column layout of its table
#[derive(Debug, Clone)]
pub struct Row {
    cells: Vec<Value>,
    columns: Arc<ColumnIndex>,
}

impl Row {
    pub fn new(cells: Vec<Value>, columns: Arc<ColumnIndex>) -> Self {
        Self { cells, columns }
    }

    fn cell(&self, position: Option<usize>, kind: FieldKind) -> Option<FieldValue> {
        let position = position?;
        match self.cells.get(position) {
            None | Some(Value::Null) => None,
            Some(value) => {
                let coerced = coerce(value, kind);
                if coerced.is_none() {
                    warn!(
                        "Cell '{}' is not a {:?}, using default",
                        self.columns.names()[position],
                        kind
                    );
                }
                coerced
            }
        }
    }

    /// Text cell, or `default` when the column or value is missing
    pub fn text(&self, column: &str, default: &str) -> String {
        self.text_at(self.columns.position(column), default)
    }

    /// Text cell from whichever of `columns` appears last in the table
    pub fn text_last_of(&self, columns: &[&str], default: &str) -> String {
        self.text_at(self.columns.last_of(columns), default)
    }

    fn text_at(&self, position: Option<usize>, default: &str) -> String {
        match self.cell(position, FieldKind::Str) {
            Some(FieldValue::Str(s)) => s,
            _ => default.to_string(),
        }
    }

    /// Numeric cell, or `default` when missing or unparsable
    pub fn number(&self, column: &str, default: f64) -> f64 {
        self.cell(self.columns.position(column), FieldKind::Number)
            .and_then(|v| v.as_f64())
            .unwrap_or(default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    Paging,
    Done,
}

/// Lazily walks every page of a [`PageSource`]
pub struct Paginator<S> {
    source: S,
    state: State,
    cursor: Option<String>,
    columns: Arc<ColumnIndex>,
    buffer: VecDeque<Vec<Value>>,
    pages: usize,
    rows: usize,
}

impl<S: PageSource> Paginator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: State::Fresh,
            cursor: None,
            columns: Arc::new(ColumnIndex::default()),
            buffer: VecDeque::new(),
            pages: 0,
            rows: 0,
        }
    }

    /// Next row, fetching the next page when the current one is drained.
    ///
    /// Returns `Ok(None)` once the last page is exhausted. A fetch failure is
    /// returned once and ends the pagination; rows already handed out stay valid.
    pub async fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            if let Some(cells) = self.buffer.pop_front() {
                self.rows += 1;
                return Ok(Some(Row::new(cells, Arc::clone(&self.columns))));
            }

            let (cursor, limit) = match self.state {
                State::Done => return Ok(None),
                State::Fresh => (None, FIRST_PAGE_LIMIT),
                State::Paging => match self.cursor.take() {
                    Some(cursor) => (Some(cursor), NEXT_PAGE_LIMIT),
                    None => {
                        self.finish();
                        return Ok(None);
                    }
                },
            };

            let page = match self.source.fetch_page(cursor.as_deref(), limit).await {
                Ok(page) => page,
                Err(e) => {
                    self.state = State::Done;
                    return Err(e);
                }
            };
            self.pages += 1;

            // Column layout is taken from the first page and assumed stable
            if self.state == State::Fresh {
                self.columns = Arc::new(ColumnIndex::new(page.columns));
                self.state = State::Paging;
            }

            self.buffer.extend(page.rows);
            self.cursor = page.next_cursor;
        }
    }

    /// Drain every remaining row
    pub async fn collect_rows(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    pub fn rows_yielded(&self) -> usize {
        self.rows
    }

    fn finish(&mut self) {
        debug!("Pagination complete: {} rows over {} pages", self.rows, self.pages);
        self.state = State::Done;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExporterError;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves pages from a list; page `i` carries cursor `c{i+1}` unless last
    pub struct VecPages {
        pages: Vec<Result<TablePage>>,
        pub calls: Mutex<Vec<(Option<String>, usize)>>,
    }

    impl VecPages {
        pub fn new(pages: Vec<Result<TablePage>>) -> Self {
            Self { pages, calls: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl<'a> PageSource for &'a VecPages {
        async fn fetch_page(&self, cursor: Option<&str>, limit: usize) -> Result<TablePage> {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len();
            calls.push((cursor.map(str::to_string), limit));
            match self.pages.get(index) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(e)) => Err(ExporterError::Report(e.to_string())),
                None => panic!("fetched past the last page"),
            }
        }
    }

    fn page(rows: usize, cursor: Option<&str>) -> Result<TablePage> {
        Ok(TablePage {
            columns: vec!["ObjectName".into(), "LocalStorage".into()],
            rows: (0..rows).map(|i| vec![json!(format!("obj{}", i)), json!("10")]).collect(),
            next_cursor: cursor.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_row_count_is_sum_of_pages() {
        let source = VecPages::new(vec![page(100, Some("X")), page(37, None)]);
        let mut pager = Paginator::new(&source);

        let rows = pager.collect_rows().await.unwrap();
        assert_eq!(rows.len(), 137);
        assert_eq!(pager.pages_fetched(), 2);

        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(None, FIRST_PAGE_LIMIT), (Some("X".into()), NEXT_PAGE_LIMIT)]);
    }

    #[tokio::test]
    async fn test_finished_pagination_stays_finished() {
        let source = VecPages::new(vec![page(2, None)]);
        let mut pager = Paginator::new(&source);

        assert_eq!(pager.collect_rows().await.unwrap().len(), 2);
        assert!(pager.next_row().await.unwrap().is_none());
        assert_eq!(source.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_pages_continue_until_cursor_ends() {
        let source = VecPages::new(vec![page(0, Some("a")), page(0, Some("b")), page(3, None)]);
        let mut pager = Paginator::new(&source);
        assert_eq!(pager.collect_rows().await.unwrap().len(), 3);
        assert_eq!(pager.pages_fetched(), 3);
    }

    #[tokio::test]
    async fn test_failure_aborts_after_yielded_rows() {
        let source = VecPages::new(vec![
            page(5, Some("next")),
            Err(ExporterError::Report("boom".into())),
        ]);
        let mut pager = Paginator::new(&source);

        let mut seen = 0;
        let err = loop {
            match pager.next_row().await {
                Ok(Some(_)) => seen += 1,
                Ok(None) => panic!("should fail"),
                Err(e) => break e,
            }
        };
        assert_eq!(seen, 5);
        assert!(matches!(err, ExporterError::Report(_)));
        assert!(pager.next_row().await.unwrap().is_none());
        assert_eq!(source.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_columns_from_first_page_apply_to_later_pages() {
        let mut second = page(1, None).unwrap();
        second.columns = vec!["Different".into()];
        let source = VecPages::new(vec![page(1, Some("c")), Ok(second)]);
        let mut pager = Paginator::new(&source);

        let rows = pager.collect_rows().await.unwrap();
        assert_eq!(rows[1].text("ObjectName", "null"), "obj0");
    }

    #[test]
    fn test_table_page_decoding() {
        let body = json!({
            "columns": ["ObjectId", "ObjectName"],
            "dataGrid": [["id-1", "db1"], "junk", ["id-2", "db2"]],
            "hasMore": true,
            "cursor": "abc"
        });
        let page: TablePage = crate::extract::decode(&body, "table").unwrap();
        assert_eq!(page.columns, vec!["ObjectId", "ObjectName"]);
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));

        let done: TablePage =
            crate::extract::decode(&json!({"dataGrid": [], "hasMore": false, "cursor": "abc"}), "t").unwrap();
        assert_eq!(done.next_cursor, None);

        let empty_cursor: TablePage = crate::extract::decode(&json!({"cursor": ""}), "t").unwrap();
        assert_eq!(empty_cursor.next_cursor, None);

        let no_flag: TablePage = crate::extract::decode(&json!({"cursor": "z"}), "t").unwrap();
        assert_eq!(no_flag.next_cursor.as_deref(), Some("z"));
    }

    #[test]
    fn test_row_accessors() {
        let columns = Arc::new(ColumnIndex::new(vec![
            "ObjectId".into(),
            "ObjectName".into(),
            "ObjectLinkingId".into(),
            "LocalStorage".into(),
            "ArchiveStorage".into(),
        ]));
        let row = Row::new(
            vec![json!("id"), json!(null), json!("link"), json!("2048.5"), json!("n/a")],
            columns,
        );

        assert_eq!(row.text_last_of(&["ObjectId", "ObjectLinkingId"], "null"), "link");
        assert_eq!(row.text("ObjectName", "null"), "null");
        assert_eq!(row.text("Location", "null"), "null");
        assert_eq!(row.number("LocalStorage", 0.0), 2048.5);
        assert_eq!(row.number("ArchiveStorage", 0.0), 0.0);
    }
}
