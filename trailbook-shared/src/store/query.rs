/// Query-specification object
///
/// Replaces query-builder chaining with a single explicit value describing
/// filtering, sorting, field selection, and pagination. Built from URL query
/// parameters of the form:
///
/// ```text
/// ?difficulty=easy&price[lte]=1200&sort=-price,name&fields=name,price&page=2&limit=10
/// ```
///
/// The keys `page`, `limit`, `sort`, and `fields` are reserved; every other
/// key is treated as a filter. A bracket suffix selects a comparison operator
/// (`gt`, `gte`, `lt`, `lte`, `ne`), plain keys mean equality.

use std::collections::HashMap;

use serde::Serialize;

use super::SqlValue;

/// Fixed default page size
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Upper bound on client-requested page sizes
pub const MAX_PAGE_SIZE: u32 = 500;

/// Comparison operator for a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    /// SQL fragment for this operator, with surrounding spaces
    pub fn sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => " = ",
            FilterOp::Ne => " <> ",
            FilterOp::Gt => " > ",
            FilterOp::Gte => " >= ",
            FilterOp::Lt => " < ",
            FilterOp::Lte => " <= ",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "ne" => Some(FilterOp::Ne),
            "gt" => Some(FilterOp::Gt),
            "gte" => Some(FilterOp::Gte),
            "lt" => Some(FilterOp::Lt),
            "lte" => Some(FilterOp::Lte),
            _ => None,
        }
    }
}

/// A single field filter
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: SqlValue,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

/// A single sort key; `-field` in the query string means descending
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub dir: SortDir,
}

/// The parsed query specification
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub filters: Vec<Filter>,
    pub sort: Vec<SortKey>,
    /// Requested projection; applied at the serialization boundary
    pub fields: Option<Vec<String>>,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort: Vec::new(),
            fields: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QuerySpec {
    /// Parses a query spec from URL query parameters
    ///
    /// Malformed values fall back to defaults rather than erroring: a list
    /// request never fails because of a bad page number.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let mut spec = QuerySpec::default();

        for (key, value) in params {
            match key.as_str() {
                "page" => {
                    spec.page = value.parse::<u32>().ok().filter(|p| *p >= 1).unwrap_or(1);
                }
                "limit" => {
                    spec.page_size = value
                        .parse::<u32>()
                        .ok()
                        .filter(|l| *l >= 1)
                        .unwrap_or(DEFAULT_PAGE_SIZE)
                        .min(MAX_PAGE_SIZE);
                }
                "sort" => {
                    spec.sort = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(|s| match s.strip_prefix('-') {
                            Some(field) => SortKey {
                                field: field.to_string(),
                                dir: SortDir::Desc,
                            },
                            None => SortKey {
                                field: s.to_string(),
                                dir: SortDir::Asc,
                            },
                        })
                        .collect();
                }
                "fields" => {
                    let fields: Vec<String> = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect();
                    if !fields.is_empty() {
                        spec.fields = Some(fields);
                    }
                }
                _ => {
                    let (field, op) = parse_filter_key(key);
                    spec.filters.push(Filter {
                        field,
                        op,
                        value: parse_filter_value(value),
                    });
                }
            }
        }

        spec
    }

    /// Row offset for the current page
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

/// Splits `price[gte]` into ("price", Gte); plain keys are equality
fn parse_filter_key(key: &str) -> (String, FilterOp) {
    if let Some(open) = key.find('[') {
        if let Some(stripped) = key[open..].strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            if let Some(op) = FilterOp::from_suffix(stripped) {
                return (key[..open].to_string(), op);
            }
        }
    }
    (key.to_string(), FilterOp::Eq)
}

/// Types a filter value: integer, float, bool, else text
fn parse_filter_value(value: &str) -> SqlValue {
    if let Ok(v) = value.parse::<i64>() {
        return SqlValue::Int(v);
    }
    if let Ok(v) = value.parse::<f64>() {
        return SqlValue::Float(v);
    }
    match value {
        "true" => SqlValue::Bool(true),
        "false" => SqlValue::Bool(false),
        _ => SqlValue::Text(value.to_string()),
    }
}

/// One page of results plus the total match count
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// Prunes serialized rows to the requested fields
///
/// Typed rows are fetched whole; projection happens here, on the JSON
/// representation, so sensitive fields (which are never serializable) cannot
/// leak through a projection. The `id` field is always retained.
pub fn apply_projection(value: serde_json::Value, fields: &[String]) -> serde_json::Value {
    match value {
        serde_json::Value::Array(items) => serde_json::Value::Array(
            items
                .into_iter()
                .map(|item| apply_projection(item, fields))
                .collect(),
        ),
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .filter(|(k, _)| k == "id" || fields.iter().any(|f| f == k))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let spec = QuerySpec::default();
        assert_eq!(spec.page, 1);
        assert_eq!(spec.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(spec.offset(), 0);
        assert!(spec.filters.is_empty());
        assert!(spec.sort.is_empty());
        assert!(spec.fields.is_none());
    }

    #[test]
    fn test_pagination_offset() {
        let spec = QuerySpec::from_params(&params(&[("page", "2"), ("limit", "10")]));
        assert_eq!(spec.page, 2);
        assert_eq!(spec.page_size, 10);
        // records 11-20 of the sorted set
        assert_eq!(spec.offset(), 10);
    }

    #[test]
    fn test_bad_page_falls_back() {
        let spec = QuerySpec::from_params(&params(&[("page", "zero"), ("limit", "0")]));
        assert_eq!(spec.page, 1);
        assert_eq!(spec.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_page_size_is_capped() {
        let spec = QuerySpec::from_params(&params(&[("limit", "99999")]));
        assert_eq!(spec.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_equality_filter() {
        let spec = QuerySpec::from_params(&params(&[("difficulty", "easy")]));
        assert_eq!(spec.filters.len(), 1);
        assert_eq!(spec.filters[0].field, "difficulty");
        assert_eq!(spec.filters[0].op, FilterOp::Eq);
        assert_eq!(spec.filters[0].value, SqlValue::Text("easy".to_string()));
    }

    #[test]
    fn test_range_filter_with_bracket_op() {
        let spec = QuerySpec::from_params(&params(&[("price[gte]", "500")]));
        assert_eq!(spec.filters[0].field, "price");
        assert_eq!(spec.filters[0].op, FilterOp::Gte);
        assert_eq!(spec.filters[0].value, SqlValue::Int(500));
    }

    #[test]
    fn test_unknown_bracket_suffix_is_equality() {
        let spec = QuerySpec::from_params(&params(&[("price[regex]", "5")]));
        assert_eq!(spec.filters[0].field, "price[regex]");
        assert_eq!(spec.filters[0].op, FilterOp::Eq);
    }

    #[test]
    fn test_filter_value_typing() {
        assert_eq!(parse_filter_value("42"), SqlValue::Int(42));
        assert_eq!(parse_filter_value("4.5"), SqlValue::Float(4.5));
        assert_eq!(parse_filter_value("true"), SqlValue::Bool(true));
        assert_eq!(
            parse_filter_value("medium"),
            SqlValue::Text("medium".to_string())
        );
    }

    #[test]
    fn test_sort_parsing() {
        let spec = QuerySpec::from_params(&params(&[("sort", "-price,name")]));
        assert_eq!(
            spec.sort,
            vec![
                SortKey {
                    field: "price".to_string(),
                    dir: SortDir::Desc,
                },
                SortKey {
                    field: "name".to_string(),
                    dir: SortDir::Asc,
                },
            ]
        );
    }

    #[test]
    fn test_fields_parsing() {
        let spec = QuerySpec::from_params(&params(&[("fields", "name, price")]));
        assert_eq!(
            spec.fields,
            Some(vec!["name".to_string(), "price".to_string()])
        );
    }

    #[test]
    fn test_projection_keeps_id_and_requested_fields() {
        let value = serde_json::json!([
            {"id": "1", "name": "a", "price": 10.0, "summary": "s"},
            {"id": "2", "name": "b", "price": 20.0, "summary": "t"}
        ]);
        let fields = vec!["name".to_string()];
        let projected = apply_projection(value, &fields);
        assert_eq!(
            projected,
            serde_json::json!([
                {"id": "1", "name": "a"},
                {"id": "2", "name": "b"}
            ])
        );
    }
}
