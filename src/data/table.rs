use std::cmp::Ordering;

use serde::Serialize;
use thiserror::Error;

use super::model::{CellValue, Dataset, Record};

// ---------------------------------------------------------------------------
// Data table queries – filter, sort and page the full dataset
// ---------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq)]
pub enum TableQueryError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("invalid page number '{0}'")]
    InvalidPage(String),
    #[error("invalid sort '{0}', expected <column>:asc or <column>:desc")]
    InvalidSort(String),
    #[error("invalid filter '{0}', expected <column>:<expression>")]
    InvalidFilter(String),
    #[error("column '{column}' is numeric but '{value}' is not a number")]
    NotNumeric { column: String, value: String },
}

// ---------------------------------------------------------------------------
// Query model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    /// No operator given: equality on numbers, substring on text.
    Bare,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFilter {
    pub column: String,
    pub op: FilterOp,
    pub operand: String,
}

impl ColumnFilter {
    /// Parse an expression such as `>= 3.1`, `contains set` or `setosa`.
    pub fn parse(column: &str, expr: &str) -> Self {
        let expr = expr.trim();
        const OPS: [(&str, FilterOp); 6] = [
            (">=", FilterOp::Ge),
            ("<=", FilterOp::Le),
            ("!=", FilterOp::Ne),
            ("=", FilterOp::Eq),
            ("<", FilterOp::Lt),
            (">", FilterOp::Gt),
        ];
        let (op, operand) = if let Some(rest) = expr.strip_prefix("contains ") {
            (FilterOp::Contains, rest)
        } else {
            OPS.iter()
                .find_map(|(sym, op)| expr.strip_prefix(*sym).map(|rest| (*op, rest)))
                .unwrap_or((FilterOp::Bare, expr))
        };
        let operand = operand.trim().trim_matches('"').to_string();
        ColumnFilter {
            column: column.to_string(),
            op,
            operand,
        }
    }

    fn matches(&self, cell: &CellValue, number: Option<f64>) -> bool {
        match cell {
            CellValue::Number(v) => match (self.op, number) {
                (FilterOp::Contains, _) => v.to_string().contains(&self.operand),
                (op, Some(n)) => compare(op, v.total_cmp(&n)),
                (_, None) => false,
            },
            CellValue::Text(s) => match self.op {
                FilterOp::Contains | FilterOp::Bare => s.contains(&self.operand),
                op => compare(op, s.as_str().cmp(self.operand.as_str())),
            },
        }
    }
}

fn compare(op: FilterOp, ord: Ordering) -> bool {
    match op {
        FilterOp::Eq | FilterOp::Bare => ord == Ordering::Equal,
        FilterOp::Ne => ord != Ordering::Equal,
        FilterOp::Lt => ord == Ordering::Less,
        FilterOp::Le => ord != Ordering::Greater,
        FilterOp::Gt => ord == Ordering::Greater,
        FilterOp::Ge => ord != Ordering::Less,
        FilterOp::Contains => false,
    }
}

/// What the table asks for: one page, under some sorts and filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableQuery {
    pub page_current: usize,
    pub sort_by: Vec<SortSpec>,
    pub filters: Vec<ColumnFilter>,
}

impl TableQuery {
    /// Parse `page=1&sort=sepal_width:desc&filter=species:contains%20set`.
    /// `sort` and `filter` may repeat; the first `sort` is the primary key.
    pub fn from_query_string(query: &str) -> Result<Self, TableQueryError> {
        let mut q = TableQuery::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => {
                    q.page_current = value
                        .parse()
                        .map_err(|_| TableQueryError::InvalidPage(value.to_string()))?;
                }
                "sort" => {
                    let (column, dir) = value
                        .split_once(':')
                        .ok_or_else(|| TableQueryError::InvalidSort(value.to_string()))?;
                    let direction = match dir {
                        "asc" => SortDirection::Asc,
                        "desc" => SortDirection::Desc,
                        _ => return Err(TableQueryError::InvalidSort(value.to_string())),
                    };
                    q.sort_by.push(SortSpec {
                        column: column.to_string(),
                        direction,
                    });
                }
                "filter" => {
                    let (column, expr) = value
                        .split_once(':')
                        .ok_or_else(|| TableQueryError::InvalidFilter(value.to_string()))?;
                    if expr.trim().is_empty() {
                        continue;
                    }
                    q.filters.push(ColumnFilter::parse(column, expr));
                }
                _ => {}
            }
        }
        Ok(q)
    }
}

// ---------------------------------------------------------------------------
// Result page
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TablePage<'a> {
    pub rows: Vec<&'a Record>,
    pub page_current: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total_matching: usize,
}

fn is_numeric_column(column: &str) -> Result<bool, TableQueryError> {
    match column {
        "species" => Ok(false),
        c if Record::COLUMNS.contains(&c) => Ok(true),
        other => Err(TableQueryError::UnknownColumn(other.to_string())),
    }
}

/// Run a table query against the full dataset.
pub fn query_table<'a>(
    dataset: &'a Dataset,
    query: &TableQuery,
    page_size: usize,
) -> Result<TablePage<'a>, TableQueryError> {
    // Validate once up front; parsed numeric operands ride along with the filter.
    let mut filters = Vec::with_capacity(query.filters.len());
    for f in &query.filters {
        let number = if is_numeric_column(&f.column)? && f.op != FilterOp::Contains {
            Some(f.operand.parse::<f64>().map_err(|_| TableQueryError::NotNumeric {
                column: f.column.clone(),
                value: f.operand.clone(),
            })?)
        } else {
            None
        };
        filters.push((f, number));
    }
    for s in &query.sort_by {
        is_numeric_column(&s.column)?;
    }

    let mut rows: Vec<&Record> = dataset
        .records()
        .iter()
        .filter(|r| {
            filters.iter().all(|(f, number)| {
                r.cell(&f.column)
                    .map(|cell| f.matches(&cell, *number))
                    .unwrap_or(false)
            })
        })
        .collect();

    // sort_by is stable, so ties keep dataset order
    if !query.sort_by.is_empty() {
        rows.sort_by(|a, b| {
            for spec in &query.sort_by {
                let ord = a.cell(&spec.column).cmp(&b.cell(&spec.column));
                let ord = match spec.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    let page_size = page_size.max(1);
    let total_matching = rows.len();
    let page_count = total_matching.div_ceil(page_size);
    let page_current = query.page_current.min(page_count.saturating_sub(1));
    let rows = rows
        .into_iter()
        .skip(page_current * page_size)
        .take(page_size)
        .collect();

    Ok(TablePage {
        rows,
        page_current,
        page_count,
        page_size,
        total_matching,
    })
}
