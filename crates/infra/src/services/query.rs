//! Client-side filtering, sorting and pagination
//!
//! Some list endpoints return everything at once; the views still page
//! through them, so the query is applied here.

use std::cmp::Ordering;

use kinderhub_domain::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use kinderhub_domain::{ClassRecord, LeaveRequest, Page};
use serde_json::{json, Value};

/// Field access by the names the backend uses (`className`, ...)
pub trait Listable {
    /// `None` (or `Value::Null`) when the field is unknown or unset
    fn field(&self, name: &str) -> Option<Value>;
}

/// `field,asc|desc`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Item field to sort by
    pub field: String,
    /// Largest first when set
    pub descending: bool,
}

impl SortSpec {
    /// Ascending on `field`.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), descending: false }
    }

    /// Descending on `field`.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), descending: true }
    }

    /// Parse `"className,desc"`. The direction defaults to ascending.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(',');
        let field = parts.next().map(str::trim).filter(|f| !f.is_empty())?;
        let descending =
            parts.next().is_some_and(|dir| dir.trim().eq_ignore_ascii_case("desc"));
        Some(Self { field: field.to_string(), descending })
    }
}

/// Filters, sort order and page for a client-side listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Case-insensitive substring matches
    pub filters: Vec<(String, String)>,
    /// Exact matches
    pub exact: Vec<(String, String)>,
    /// Sort order; input order when unset
    pub sort: Option<SortSpec>,
    /// 1-based
    pub page: usize,
    /// Items per page
    pub size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            exact: Vec::new(),
            sort: None,
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListQuery {
    /// Everything on the first page of default size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep items whose `field` contains `needle`. Blank needles are ignored.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, needle: &str) -> Self {
        let needle = needle.trim();
        if !needle.is_empty() {
            self.filters.push((field.into(), needle.to_lowercase()));
        }
        self
    }

    /// Keep items whose `field` equals `value`. Blank values are ignored.
    #[must_use]
    pub fn exact(mut self, field: impl Into<String>, value: &str) -> Self {
        if !value.is_empty() {
            self.exact.push((field.into(), value.to_string()));
        }
        self
    }

    /// Sort by `sort`.
    #[must_use]
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// 1-based page to return.
    #[must_use]
    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Items per page.
    #[must_use]
    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Everything on one page
    #[must_use]
    pub fn all() -> Self {
        Self::default().size(usize::MAX)
    }

    fn matches<T: Listable>(&self, item: &T) -> bool {
        self.exact.iter().all(|(field, value)| text_of(item.field(field)) == *value)
            && self
                .filters
                .iter()
                .all(|(field, needle)| text_of(item.field(field)).to_lowercase().contains(needle))
    }
}

/// Filter, sort and paginate `items`. `total` counts the filtered items.
pub fn apply_query<T: Listable>(items: Vec<T>, query: &ListQuery) -> Page<T> {
    let mut items: Vec<T> = items.into_iter().filter(|item| query.matches(item)).collect();

    if let Some(sort) = &query.sort {
        items.sort_by(|a, b| {
            let order = compare_fields(a.field(&sort.field), b.field(&sort.field));
            if sort.descending {
                order.reverse()
            } else {
                order
            }
        });
    }

    let total = items.len();
    let page = if query.page == 0 { DEFAULT_PAGE } else { query.page };
    let size = if query.size == 0 { DEFAULT_PAGE_SIZE } else { query.size };
    let start = (page - 1).saturating_mul(size);

    let items = items.into_iter().skip(start).take(size).collect();
    Page::new(items, total)
}

/// Nulls first; numbers numerically; anything else as case-insensitive text.
fn compare_fields(a: Option<Value>, b: Option<Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or_default(), y.as_f64().unwrap_or_default());
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(x), Some(y)) => {
            text_of(Some(x)).to_lowercase().cmp(&text_of(Some(y)).to_lowercase())
        }
    }
}

fn text_of(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl Listable for ClassRecord {
    fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "id" => json!(self.id),
            "className" => json!(self.class_name),
            "classCode" => json!(self.class_code),
            "grade" => json!(self.grade),
            "roomNumber" => json!(self.room_number),
            "academicYear" => json!(self.academic_year),
            "teacherName" => json!(self.teacher_name),
            "studentCurrent" => json!(self.student_current),
            "studentCapacity" => json!(self.student_capacity),
            "status" => json!(self.status),
            _ => return None,
        };
        Some(value)
    }
}

impl Listable for LeaveRequest {
    fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "id" => json!(self.id),
            "studentName" => json!(self.student_name),
            "parentName" => json!(self.parent_name),
            "className" => json!(self.class_name),
            "fromDate" => json!(self.from_date),
            "toDate" => json!(self.to_date),
            "status" => json!(self.status.to_string()),
            "createdAt" => json!(self.created_at),
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(id: i64, name: &str, room: &str, year: &str, capacity: Option<i64>) -> ClassRecord {
        ClassRecord {
            id: Some(id),
            class_name: name.into(),
            room_number: room.into(),
            academic_year: year.into(),
            student_capacity: capacity,
            ..ClassRecord::default()
        }
    }

    fn sample() -> Vec<ClassRecord> {
        vec![
            class(1, "Mầm Hoa Sen", "P101", "2024-2025", Some(25)),
            class(2, "chồi Sơn Ca", "P202", "2025-2026", None),
            class(3, "Lá Vàng Anh", "P103", "2025-2026", Some(30)),
            class(4, "Chồi Họa Mi", "P204", "2025-2026", Some(20)),
        ]
    }

    fn ids(page: &Page<ClassRecord>) -> Vec<i64> {
        page.items.iter().filter_map(|c| c.id).collect()
    }

    #[test]
    fn test_sort_spec_parse() {
        assert_eq!(SortSpec::parse("className,DESC"), Some(SortSpec::desc("className")));
        assert_eq!(SortSpec::parse("grade"), Some(SortSpec::asc("grade")));
        assert_eq!(SortSpec::parse(",asc"), None);
    }

    #[test]
    fn test_filters_are_case_insensitive_and_exact_is_not() {
        let query = ListQuery::new().filter("className", "  CHỒI ").exact("academicYear", "2025-2026");
        let page = apply_query(sample(), &query);
        assert_eq!(ids(&page), vec![2, 4]);
        assert_eq!(page.total, 2);

        let none = apply_query(sample(), &ListQuery::new().exact("academicYear", "2025"));
        assert_eq!(none.total, 0);
    }

    #[test]
    fn test_numeric_sort_puts_nulls_first() {
        let asc = apply_query(sample(), &ListQuery::new().sort(SortSpec::asc("studentCapacity")));
        assert_eq!(ids(&asc), vec![2, 4, 1, 3]);

        let desc = apply_query(sample(), &ListQuery::new().sort(SortSpec::desc("studentCapacity")));
        assert_eq!(ids(&desc), vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_text_sort_ignores_case() {
        let page = apply_query(sample(), &ListQuery::new().sort(SortSpec::asc("roomNumber")));
        assert_eq!(ids(&page), vec![1, 3, 2, 4]);

        let by_name = apply_query(sample(), &ListQuery::new().sort(SortSpec::asc("className")));
        assert_eq!(ids(&by_name), vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_pagination_counts_before_slicing() {
        let page = apply_query(sample(), &ListQuery::new().page(2).size(3));
        assert_eq!(ids(&page), vec![4]);
        assert_eq!(page.total, 4);

        let past_end = apply_query(sample(), &ListQuery::new().page(5).size(3));
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 4);

        let zero = apply_query(sample(), &ListQuery::new().page(0).size(0));
        assert_eq!(zero.items.len(), 4);
    }
}
