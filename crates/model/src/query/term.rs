use crate::{core::value::Value, error::ModelError};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// How a term joins the terms declared before it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Link {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TermType {
    #[default]
    Eq,
    Not,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    #[serde(rename = "nlike")]
    NotLike,
    In,
    #[serde(rename = "nin")]
    NotIn,
    IsNull,
    NotNull,
}

impl TermType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TermType::Eq => "eq",
            TermType::Not => "not",
            TermType::Gt => "gt",
            TermType::Gte => "gte",
            TermType::Lt => "lt",
            TermType::Lte => "lte",
            TermType::Like => "like",
            TermType::NotLike => "nlike",
            TermType::In => "in",
            TermType::NotIn => "nin",
            TermType::IsNull => "isnull",
            TermType::NotNull => "notnull",
        }
    }

    /// Null checks carry no operand.
    pub fn is_unary(&self) -> bool {
        matches!(self, TermType::IsNull | TermType::NotNull)
    }
}

impl FromStr for TermType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eq" | "=" => Ok(TermType::Eq),
            "not" | "ne" | "!=" | "<>" => Ok(TermType::Not),
            "gt" | ">" => Ok(TermType::Gt),
            "gte" | ">=" => Ok(TermType::Gte),
            "lt" | "<" => Ok(TermType::Lt),
            "lte" | "<=" => Ok(TermType::Lte),
            "like" => Ok(TermType::Like),
            "nlike" | "notlike" => Ok(TermType::NotLike),
            "in" => Ok(TermType::In),
            "nin" | "notin" => Ok(TermType::NotIn),
            "isnull" => Ok(TermType::IsNull),
            "notnull" => Ok(TermType::NotNull),
            other => Err(ModelError::UnknownTermType(other.to_string())),
        }
    }
}

impl fmt::Display for TermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Right-hand side of a leaf term.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Operand {
    #[default]
    None,
    Value(Value),
    Values(Vec<Value>),
    /// A qualified column compared against the leaf column.
    Column(String),
}

impl Operand {
    /// Picks the operand shape for a term type: null checks carry nothing,
    /// list operators spread a JSON array into individual values.
    pub fn for_term(term_type: TermType, value: Value) -> Self {
        if term_type.is_unary() {
            return Operand::None;
        }
        match (term_type, value) {
            (TermType::In | TermType::NotIn, Value::Json(serde_json::Value::Array(items))) => {
                Operand::Values(items.into_iter().map(Value::Json).collect())
            }
            (_, value) => Operand::Value(value),
        }
    }
}

/// One node of a filter tree: a leaf comparison when `terms` is empty,
/// otherwise a parenthesised group of child terms.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Term {
    #[serde(default)]
    pub link: Link,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default, rename = "termType")]
    pub term_type: TermType,
    #[serde(default)]
    pub value: Operand,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<Term>,
}

impl Term {
    pub fn leaf(column: &str, term_type: TermType, value: Operand) -> Self {
        Term {
            link: Link::And,
            column: Some(column.to_string()),
            term_type,
            value,
            terms: Vec::new(),
        }
    }

    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Term::leaf(column, TermType::Eq, Operand::Value(value.into()))
    }

    pub fn group(link: Link, terms: Vec<Term>) -> Self {
        Term {
            link,
            column: None,
            term_type: TermType::Eq,
            value: Operand::None,
            terms,
        }
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.link = link;
        self
    }

    pub fn or(self) -> Self {
        self.with_link(Link::Or)
    }

    pub fn is_group(&self) -> bool {
        !self.terms.is_empty()
    }

    /// Visits every column reference in the tree (leaf columns and
    /// column operands, nested groups included).
    pub fn try_for_each_column<E>(
        &mut self,
        f: &mut impl FnMut(&mut String) -> Result<(), E>,
    ) -> Result<(), E> {
        if let Some(column) = self.column.as_mut() {
            f(column)?;
        }
        if let Operand::Column(column) = &mut self.value {
            f(column)?;
        }
        for term in self.terms.iter_mut() {
            term.try_for_each_column(f)?;
        }
        Ok(())
    }

    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(column) = &self.column {
            out.push(column);
        }
        if let Operand::Column(column) = &self.value {
            out.push(column);
        }
        for term in &self.terms {
            term.collect_columns(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_type_from_str() {
        assert_eq!("GTE".parse::<TermType>().unwrap(), TermType::Gte);
        assert_eq!("nin".parse::<TermType>().unwrap(), TermType::NotIn);
        assert!(matches!(
            "between".parse::<TermType>(),
            Err(ModelError::UnknownTermType(name)) if name == "between"
        ));
    }

    #[test]
    fn test_visit_nested_columns() {
        let mut term = Term::group(
            Link::Or,
            vec![
                Term::eq("a.x", 1),
                Term::group(
                    Link::And,
                    vec![Term::leaf("b.y", TermType::Eq, Operand::Column("c.z".into()))],
                ),
            ],
        );

        term.try_for_each_column::<()>(&mut |c| {
            c.make_ascii_uppercase();
            Ok(())
        })
        .unwrap();

        assert_eq!(term.columns(), vec!["A.X", "B.Y", "C.Z"]);
    }

    #[test]
    fn test_deserialize_term_from_json() {
        let term: Term = serde_json::from_value(serde_json::json!({
            "column": "status",
            "termType": "nlike",
            "value": { "value": { "String": "x%" } },
            "link": "or"
        }))
        .unwrap();

        assert_eq!(term.term_type, TermType::NotLike);
        assert_eq!(term.link, Link::Or);
        assert_eq!(term.value, Operand::Value(Value::String("x%".into())));
    }
}
