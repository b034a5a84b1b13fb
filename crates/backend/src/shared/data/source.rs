use async_trait::async_trait;

/// Ошибки загрузки данных из удалённого табличного источника
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The source cannot be reached, denies access, or a required
    /// worksheet does not exist. Transient from the cache's point of view.
    #[error("data source unavailable: {0}")]
    SourceUnavailable(String),

    /// A required column is absent from a fetched worksheet. Indicates a
    /// misconfigured spreadsheet, not a transient condition.
    #[error("worksheet '{table}' is missing required column '{column}'")]
    Schema { table: String, column: String },
}

/// One rectangular worksheet: header row + data rows.
///
/// Rows may be ragged (the Sheets values API omits trailing empty cells),
/// so cell access goes through [`cell`].
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Index of a header column by exact name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Index of a required column, or a schema error naming the worksheet
    pub fn require_column(&self, table: &str, name: &str) -> Result<usize, LoadError> {
        self.column(name).ok_or_else(|| LoadError::Schema {
            table: table.to_string(),
            column: name.to_string(),
        })
    }
}

/// Trimmed cell value; "" for cells beyond the end of a ragged row
pub fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

/// Удалённый источник таблиц (Google Sheets в проде, фикстуры в тестах)
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Fetch a worksheet by its exact (case-sensitive) name
    async fn fetch_table(&self, name: &str) -> Result<SheetTable, LoadError>;
}
