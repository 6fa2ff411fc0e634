//! The condition DSL shared by `where_` filters and join conditions.
//!
//! Conditions are recorded as declarations and resolved to qualified
//! columns when the query is planned.

use crate::entity::ColumnRef;
use model::{
    core::value::Value,
    query::term::{Link, Operand, Term, TermType},
};

/// Where a column comes from: a path (`status`, `j_0.status`,
/// `user.status`) or a typed property reference.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    Path(String),
    Ref(ColumnRef),
}

impl From<&str> for ColumnSource {
    fn from(path: &str) -> Self {
        ColumnSource::Path(path.to_string())
    }
}

impl From<String> for ColumnSource {
    fn from(path: String) -> Self {
        ColumnSource::Path(path)
    }
}

impl From<ColumnRef> for ColumnSource {
    fn from(column: ColumnRef) -> Self {
        ColumnSource::Ref(column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OperandDecl {
    Fixed(Operand),
    Column(ColumnSource),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CondDecl {
    Leaf {
        link: Link,
        column: ColumnSource,
        term_type: TermType,
        operand: OperandDecl,
    },
    Group {
        link: Link,
        terms: Vec<CondDecl>,
    },
    /// A prebuilt term, kept as is apart from column rewriting.
    Raw(Term),
}

/// Accumulates conditions. `and()`/`or()` switch the link used by every
/// following condition until switched again.
#[derive(Debug, Clone, Default)]
pub struct Conditional {
    link: Link,
    terms: Vec<CondDecl>,
}

impl Conditional {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn into_decls(self) -> Vec<CondDecl> {
        self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// The condition-building surface. Implemented by [`Conditional`] and by
/// the join condition builder.
pub trait Conditions: Sized {
    #[doc(hidden)]
    fn conditional(&mut self) -> &mut Conditional;

    fn and(mut self) -> Self {
        self.conditional().link = Link::And;
        self
    }

    fn or(mut self) -> Self {
        self.conditional().link = Link::Or;
        self
    }

    /// Adds one condition linked by the current link.
    fn accept(
        self,
        column: impl Into<ColumnSource>,
        term_type: TermType,
        value: impl Into<Value>,
    ) -> Self {
        let operand = OperandDecl::Fixed(Operand::for_term(term_type, value.into()));
        push_leaf(self, None, column.into(), term_type, operand)
    }

    /// Adds one AND-linked condition without changing the current link.
    fn and_term(
        self,
        column: impl Into<ColumnSource>,
        term_type: TermType,
        value: impl Into<Value>,
    ) -> Self {
        let operand = OperandDecl::Fixed(Operand::for_term(term_type, value.into()));
        push_leaf(self, Some(Link::And), column.into(), term_type, operand)
    }

    /// Adds one OR-linked condition without changing the current link.
    fn or_term(
        self,
        column: impl Into<ColumnSource>,
        term_type: TermType,
        value: impl Into<Value>,
    ) -> Self {
        let operand = OperandDecl::Fixed(Operand::for_term(term_type, value.into()));
        push_leaf(self, Some(Link::Or), column.into(), term_type, operand)
    }

    fn eq(self, column: impl Into<ColumnSource>, value: impl Into<Value>) -> Self {
        self.accept(column, TermType::Eq, value)
    }

    fn not(self, column: impl Into<ColumnSource>, value: impl Into<Value>) -> Self {
        self.accept(column, TermType::Not, value)
    }

    fn gt(self, column: impl Into<ColumnSource>, value: impl Into<Value>) -> Self {
        self.accept(column, TermType::Gt, value)
    }

    fn gte(self, column: impl Into<ColumnSource>, value: impl Into<Value>) -> Self {
        self.accept(column, TermType::Gte, value)
    }

    fn lt(self, column: impl Into<ColumnSource>, value: impl Into<Value>) -> Self {
        self.accept(column, TermType::Lt, value)
    }

    fn lte(self, column: impl Into<ColumnSource>, value: impl Into<Value>) -> Self {
        self.accept(column, TermType::Lte, value)
    }

    fn like(self, column: impl Into<ColumnSource>, pattern: impl Into<Value>) -> Self {
        self.accept(column, TermType::Like, pattern)
    }

    fn not_like(self, column: impl Into<ColumnSource>, pattern: impl Into<Value>) -> Self {
        self.accept(column, TermType::NotLike, pattern)
    }

    fn in_list<V: Into<Value>>(
        self,
        column: impl Into<ColumnSource>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        push_leaf(
            self,
            None,
            column.into(),
            TermType::In,
            OperandDecl::Fixed(Operand::Values(values)),
        )
    }

    fn not_in<V: Into<Value>>(
        self,
        column: impl Into<ColumnSource>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        push_leaf(
            self,
            None,
            column.into(),
            TermType::NotIn,
            OperandDecl::Fixed(Operand::Values(values)),
        )
    }

    fn is_null(self, column: impl Into<ColumnSource>) -> Self {
        push_leaf(
            self,
            None,
            column.into(),
            TermType::IsNull,
            OperandDecl::Fixed(Operand::None),
        )
    }

    fn not_null(self, column: impl Into<ColumnSource>) -> Self {
        push_leaf(
            self,
            None,
            column.into(),
            TermType::NotNull,
            OperandDecl::Fixed(Operand::None),
        )
    }

    /// Compares two columns, e.g. `j_0.user_id = users.id`.
    fn apply_column(
        self,
        left: impl Into<ColumnSource>,
        term_type: TermType,
        right: impl Into<ColumnSource>,
    ) -> Self {
        let operand = OperandDecl::Column(right.into());
        push_leaf(self, None, left.into(), term_type, operand)
    }

    /// Opens an AND-linked group.
    fn nest(self, group: impl FnOnce(Conditional) -> Conditional) -> Self {
        push_group(self, Link::And, group)
    }

    /// Opens an OR-linked group.
    fn or_nest(self, group: impl FnOnce(Conditional) -> Conditional) -> Self {
        push_group(self, Link::Or, group)
    }

    /// Adds a prebuilt term with its own link.
    fn term(mut self, term: Term) -> Self {
        self.conditional().terms.push(CondDecl::Raw(term));
        self
    }
}

impl Conditions for Conditional {
    fn conditional(&mut self) -> &mut Conditional {
        self
    }
}

fn push_leaf<C: Conditions>(
    mut target: C,
    link: Option<Link>,
    column: ColumnSource,
    term_type: TermType,
    operand: OperandDecl,
) -> C {
    let conditional = target.conditional();
    let link = link.unwrap_or(conditional.link);
    conditional.terms.push(CondDecl::Leaf {
        link,
        column,
        term_type,
        operand,
    });
    target
}

fn push_group<C: Conditions>(
    mut target: C,
    link: Link,
    group: impl FnOnce(Conditional) -> Conditional,
) -> C {
    let terms = group(Conditional::new()).into_decls();
    target
        .conditional()
        .terms
        .push(CondDecl::Group { link, terms });
    target
}
