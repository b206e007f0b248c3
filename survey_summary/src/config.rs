// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The content of one cell of the input, after loading.
///
/// Loaders are expected to go through [CellValue::from_text] for textual
/// content so that blank strings are always represented as `Empty`.
#[derive(PartialEq, Debug, Clone)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

/// Texts that are treated as a missing answer (compared trimmed and
/// case-insensitively).
pub const MISSING_TOKENS: [&str; 5] = ["n/a", "na", "nan", "#n/a", "null"];

pub(crate) static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    pub fn from_text(s: &str) -> CellValue {
        let t = s.trim();
        if t.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(t.to_string())
        }
    }

    /// True for empty cells and for the texts listed in [MISSING_TOKENS].
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => {
                let t = s.trim().to_lowercase();
                t.is_empty() || MISSING_TOKENS.contains(&t.as_str())
            }
            CellValue::Number(x) => x.is_nan(),
            CellValue::Bool(_) => false,
        }
    }

    /// The numeric value of this cell, if any.
    ///
    /// Numbers are accepted as is, texts when they parse as a finite float.
    /// Booleans are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(x) if x.is_finite() => Some(*x),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
            _ => None,
        }
    }

    /// The textual form of this cell, or None when the cell is missing.
    pub fn as_text(&self) -> Option<String> {
        if self.is_missing() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(x) => write!(f, "{}", format_number(*x)),
            CellValue::Bool(true) => write!(f, "Yes"),
            CellValue::Bool(false) => write!(f, "No"),
            CellValue::Empty => Ok(()),
        }
    }
}

/// The shortest text that reads back as the same number. Integral values have
/// no decimal part.
pub fn format_number(x: f64) -> String {
    format!("{}", x)
}

/// One row of the input.
#[derive(PartialEq, Debug, Clone)]
pub struct Record {
    pub values: Vec<CellValue>,
}

impl Record {
    pub fn get(&self, column: usize) -> &CellValue {
        self.values.get(column).unwrap_or(&EMPTY_CELL)
    }
}

/// All the records of one run, with their column names.
///
/// Invariant: every record has exactly one value per column and column names
/// are unique. Use [crate::builder::DatasetBuilder] to construct one.
#[derive(PartialEq, Debug, Clone)]
pub struct Dataset {
    pub(crate) columns: Vec<String>,
    pub(crate) records: Vec<Record>,
}

impl Dataset {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The index of the first column (in header order) matched by the pattern.
    pub fn find_column(&self, pattern: &ColumnPattern) -> Option<usize> {
        self.columns.iter().position(|c| pattern.matches(c))
    }

    pub fn require_column(&self, pattern: &ColumnPattern) -> Result<usize, SummaryError> {
        self.find_column(pattern)
            .ok_or_else(|| SummaryError::MissingColumn(pattern.to_string()))
    }
}

/// How a configured field finds its column in the header.
///
/// Matching ignores case and collapses whitespace runs into a single space.
/// Patterns may contain the placeholders `{n}` and `{ordinal}`, filled in by
/// [ColumnPattern::instantiate].
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ColumnPattern {
    /// The whole (trimmed) header.
    Exact(String),
    /// All the needles must appear in the header. Leading and trailing
    /// spaces of a needle are significant.
    Contains(Vec<String>),
    /// The first alternative that matches.
    AnyOf(Vec<ColumnPattern>),
}

impl ColumnPattern {
    pub fn exact(name: &str) -> ColumnPattern {
        ColumnPattern::Exact(name.to_string())
    }

    pub fn contains(needles: &[&str]) -> ColumnPattern {
        ColumnPattern::Contains(needles.iter().map(|s| s.to_string()).collect())
    }

    pub fn matches(&self, header: &str) -> bool {
        let h = normalize_header(header);
        self.matches_normalized(&h)
    }

    fn matches_normalized(&self, header: &str) -> bool {
        match self {
            ColumnPattern::Exact(name) => normalize_header(name) == header,
            ColumnPattern::Contains(needles) => needles
                .iter()
                .all(|n| header.contains(normalize_needle(n).as_str())),
            ColumnPattern::AnyOf(alts) => alts.iter().any(|p| p.matches_normalized(header)),
        }
    }

    /// Fills in the objective placeholders.
    pub fn instantiate(&self, n: u32) -> ColumnPattern {
        let fill = |s: &String| {
            s.replace("{n}", &n.to_string())
                .replace("{ordinal}", &ordinal(n))
        };
        match self {
            ColumnPattern::Exact(name) => ColumnPattern::Exact(fill(name)),
            ColumnPattern::Contains(needles) => {
                ColumnPattern::Contains(needles.iter().map(fill).collect())
            }
            ColumnPattern::AnyOf(alts) => {
                ColumnPattern::AnyOf(alts.iter().map(|p| p.instantiate(n)).collect())
            }
        }
    }
}

impl Display for ColumnPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnPattern::Exact(name) => write!(f, "{:?}", name),
            ColumnPattern::Contains(needles) => write!(f, "column containing {:?}", needles),
            ColumnPattern::AnyOf(alts) => {
                let parts: Vec<String> = alts.iter().map(|p| p.to_string()).collect();
                write!(f, "one of [{}]", parts.join(", "))
            }
        }
    }
}

fn normalize_header(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

// Same as the header, but the surrounding spaces are kept.
fn normalize_needle(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_space {
                res.push(' ');
            }
            in_space = true;
        } else {
            res.extend(c.to_lowercase());
            in_space = false;
        }
    }
    res
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 21st...
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Grouping {
    /// A single group with all the records.
    None,
    /// One group per distinct value of the column.
    ByColumn(ColumnPattern),
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum StatKind {
    /// Count, sum, mean, min and max of the numeric values.
    Mean,
    /// Number of occurences of each distinct value.
    Distribution,
}

#[derive(PartialEq, Debug, Clone)]
pub struct StatSpec {
    pub label: String,
    pub column: ColumnPattern,
    pub kind: StatKind,
    /// Appended verbatim after the values when rendering (LaTeX).
    pub unit: Option<String>,
    /// If true, a missing column drops the statistic instead of failing.
    pub optional: bool,
}

// ******** Output data structures *********

/// A subset of the records sharing the same grouping key.
#[derive(PartialEq, Debug, Clone)]
pub struct Group<'a> {
    /// None for the global group.
    pub key: Option<String>,
    pub records: Vec<&'a Record>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct NumericSummary {
    pub label: String,
    pub unit: Option<String>,
    /// Number of numeric values.
    pub count: u64,
    pub missing: u64,
    pub non_numeric: u64,
    pub sum: f64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Distribution {
    pub label: String,
    /// Sorted by value.
    pub counts: Vec<(String, u64)>,
    pub missing: u64,
}

/// Statistics for one group
#[derive(PartialEq, Debug, Clone)]
pub struct Summary {
    pub group: Option<String>,
    pub record_count: u64,
    pub numeric: Vec<NumericSummary>,
    pub distributions: Vec<Distribution>,
}

// ******** Errors *********

/// Errors while assembling a dataset.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DatasetError {
    NoColumns,
    RecordTooWide {
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl Error for DatasetError {}

impl Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::NoColumns => write!(f, "the header row has no columns"),
            DatasetError::RecordTooWide {
                row,
                expected,
                found,
            } => write!(
                f,
                "record {} has {} values but the header only has {} columns",
                row, found, expected
            ),
        }
    }
}

/// Errors that prevent the aggregation from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SummaryError {
    MissingColumn(String),
}

impl Error for SummaryError {}

impl Display for SummaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryError::MissingColumn(c) => write!(f, "missing expected column {}", c),
        }
    }
}

/// Errors while rendering a document.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RenderError {
    UnknownPlaceholder(String),
    UnterminatedPlaceholder(String),
}

impl Error for RenderError {}

impl Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::UnknownPlaceholder(name) => {
                write!(f, "unknown template placeholder {{{{{}}}}}", name)
            }
            RenderError::UnterminatedPlaceholder(template) => {
                write!(f, "unterminated placeholder in template {:?}", template)
            }
        }
    }
}
