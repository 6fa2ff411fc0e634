use super::{
    sort::{Sort, SortOrder},
    term::{Link, Operand, Term, TermType},
};
use crate::core::value::Value;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_INDEX: usize = 0;
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Filter parameters supplied by a caller: a flat list of terms (which may
/// themselves be groups), sort keys, and an optional paging window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryParam {
    pub terms: Vec<Term>,
    pub sorts: Vec<Sort>,
    pub paging: bool,
    pub page_index: usize,
    pub page_size: usize,
    /// Pre-computed row count. When present, paged fetches skip the count query.
    pub total: Option<u64>,
}

impl Default for QueryParam {
    fn default() -> Self {
        QueryParam {
            terms: Vec::new(),
            sorts: Vec::new(),
            paging: true,
            page_index: DEFAULT_PAGE_INDEX,
            page_size: DEFAULT_PAGE_SIZE,
            total: None,
        }
    }
}

impl QueryParam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    pub fn and(self, column: &str, term_type: TermType, value: impl Into<Value>) -> Self {
        self.term(Term::leaf(column, term_type, Operand::for_term(term_type, value.into())))
    }

    pub fn or(self, column: &str, term_type: TermType, value: impl Into<Value>) -> Self {
        let term = Term::leaf(column, term_type, Operand::for_term(term_type, value.into()));
        self.term(term.with_link(Link::Or))
    }

    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.and(column, TermType::Eq, value)
    }

    pub fn order_by(mut self, column: &str, order: SortOrder) -> Self {
        self.sorts.push(Sort {
            column: column.to_string(),
            order,
        });
        self
    }

    pub fn page(mut self, page_index: usize, page_size: usize) -> Self {
        self.paging = true;
        self.page_index = page_index;
        self.page_size = page_size;
        self
    }

    pub fn no_paging(mut self) -> Self {
        self.paging = false;
        self
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let param = QueryParam::default();
        assert!(param.paging);
        assert_eq!((param.page_index, param.page_size), (0, 25));
        assert!(param.total.is_none());
    }

    #[test]
    fn test_deserialize_partial_param() {
        let param: QueryParam = serde_json::from_value(serde_json::json!({
            "pageSize": 10,
            "total": 3,
            "sorts": [{ "column": "name", "order": "desc" }]
        }))
        .unwrap();

        assert_eq!(param.page_size, 10);
        assert_eq!(param.page_index, 0);
        assert_eq!(param.total, Some(3));
        assert_eq!(param.sorts, vec![Sort::desc("name")]);
    }

    #[test]
    fn test_unary_terms_drop_operand() {
        let param = QueryParam::new().and("deleted_at", TermType::IsNull, Value::Null);
        assert_eq!(param.terms[0].value, Operand::None);
    }
}
