//! ORDER BY terms.

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub const fn as_sql(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// NULLS FIRST/LAST ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// A structured ORDER BY term.
#[derive(Debug, Clone)]
pub struct OrderBy {
    column: String,
    direction: OrderDirection,
    nulls: Option<NullsOrder>,
}

impl OrderBy {
    /// Create an ascending order by clause.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Asc,
            nulls: None,
        }
    }

    /// Create a descending order by clause.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Desc,
            nulls: None,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }

    /// Generate SQL for this ORDER BY term.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.column, self.direction.as_sql());
        if let Some(nulls) = self.nulls {
            sql.push_str(match nulls {
                NullsOrder::First => " NULLS FIRST",
                NullsOrder::Last => " NULLS LAST",
            });
        }
        sql
    }
}

/// Anything accepted by `order`/`reorder`.
///
/// `None` and empty strings carry no term: `order` then changes nothing and
/// `reorder` only clears.
#[derive(Debug, Clone, Default)]
pub struct OrderTerm(Option<String>);

impl OrderTerm {
    /// The SQL of this term, if it has one.
    pub fn into_sql(self) -> Option<String> {
        self.0.filter(|term| !term.trim().is_empty())
    }
}

impl From<&str> for OrderTerm {
    fn from(term: &str) -> Self {
        OrderTerm(Some(term.to_string()))
    }
}

impl From<String> for OrderTerm {
    fn from(term: String) -> Self {
        OrderTerm(Some(term))
    }
}

impl From<OrderBy> for OrderTerm {
    fn from(order: OrderBy) -> Self {
        OrderTerm(Some(order.to_sql()))
    }
}

impl<T: Into<OrderTerm>> From<Option<T>> for OrderTerm {
    fn from(term: Option<T>) -> Self {
        term.map_or(OrderTerm(None), Into::into)
    }
}
