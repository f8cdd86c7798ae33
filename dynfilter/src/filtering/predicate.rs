use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fields::Operator;
use crate::value::FilterValue;

/// Boolean combinator of a predicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    /// Parse a group operator token, ignoring case
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_uppercase().as_str() {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage-agnostic predicate tree.
///
/// "No predicate" is `Option::None`, never an empty group: every constructor
/// here produces groups with at least two children.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// One field-operator-value comparison
    Leaf {
        field_path: String,
        operator: Operator,
        value: FilterValue,
    },
    /// Boolean combination of child predicates, in order
    Group {
        combinator: Combinator,
        children: Vec<Predicate>,
    },
}

impl Predicate {
    #[must_use]
    pub fn leaf(
        field_path: impl Into<String>,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self::Leaf {
            field_path: field_path.into(),
            operator,
            value: value.into(),
        }
    }

    /// `field_path IS NULL`
    #[must_use]
    pub fn is_null(field_path: impl Into<String>) -> Self {
        Self::leaf(field_path, Operator::IsNull, true)
    }

    /// Combine two predicates, flattening nested groups with the same combinator
    #[must_use]
    pub fn combine(self, other: Self, combinator: Combinator) -> Self {
        let mut children = self.into_children(combinator);
        children.extend(other.into_children(combinator));
        Self::Group {
            combinator,
            children,
        }
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.combine(other, Combinator::And)
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        self.combine(other, Combinator::Or)
    }

    /// AND of every predicate; `None` when there are none
    pub fn all(predicates: impl IntoIterator<Item = Self>) -> Option<Self> {
        Self::fold(predicates, Combinator::And)
    }

    /// OR of every predicate; `None` when there are none
    pub fn any(predicates: impl IntoIterator<Item = Self>) -> Option<Self> {
        Self::fold(predicates, Combinator::Or)
    }

    fn fold(predicates: impl IntoIterator<Item = Self>, combinator: Combinator) -> Option<Self> {
        predicates
            .into_iter()
            .reduce(|acc, next| acc.combine(next, combinator))
    }

    fn into_children(self, combinator: Combinator) -> Vec<Self> {
        match self {
            Self::Group {
                combinator: c,
                children,
            } if c == combinator => children,
            other => vec![other],
        }
    }

    /// Number of leaves in the tree
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Group { children, .. } => children.iter().map(Self::leaf_count).sum(),
        }
    }

    /// Every leaf, depth first
    #[must_use]
    pub fn leaves(&self) -> Vec<&Self> {
        match self {
            Self::Leaf { .. } => vec![self],
            Self::Group { children, .. } => children.iter().flat_map(Self::leaves).collect(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf {
                field_path,
                operator,
                value,
            } => write!(f, "{field_path} {operator} {value}"),
            Self::Group {
                combinator,
                children,
            } => {
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {combinator} ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(path: &str) -> Predicate {
        Predicate::leaf(path, Operator::Exact, 1_i64)
    }

    #[test]
    fn test_empty_fold_is_absent() {
        assert_eq!(Predicate::all(Vec::new()), None);
        assert_eq!(Predicate::any(Vec::new()), None);
    }

    /// A single predicate is not wrapped in a group
    #[test]
    fn test_single_fold_is_unwrapped() {
        assert_eq!(Predicate::all(vec![leaf("a")]), Some(leaf("a")));
    }

    #[test]
    fn test_same_combinator_flattens() {
        let combined = leaf("a").and(leaf("b")).and(leaf("c"));
        assert_eq!(
            combined,
            Predicate::Group {
                combinator: Combinator::And,
                children: vec![leaf("a"), leaf("b"), leaf("c")],
            }
        );
    }

    #[test]
    fn test_mixed_combinators_nest() {
        let combined = leaf("a").or(leaf("b")).and(leaf("c"));
        let Predicate::Group {
            combinator,
            children,
        } = &combined
        else {
            panic!("expected group");
        };
        assert_eq!(*combinator, Combinator::And);
        assert_eq!(children.len(), 2);
        assert!(matches!(
            children[0],
            Predicate::Group {
                combinator: Combinator::Or,
                ..
            }
        ));
        assert_eq!(combined.leaf_count(), 3);
    }

    #[test]
    fn test_combinator_parse() {
        assert_eq!(Combinator::parse("and"), Some(Combinator::And));
        assert_eq!(Combinator::parse(" Or "), Some(Combinator::Or));
        assert_eq!(Combinator::parse("XOR"), None);
    }

    #[test]
    fn test_display() {
        let p = Predicate::leaf("title", Operator::IContains, "dune")
            .or(Predicate::is_null("pages"));
        assert_eq!(p.to_string(), "(title icontains dune OR pages isnull true)");
    }

    #[test]
    fn test_serialize_shape() {
        let json = serde_json::to_value(leaf("a").and(leaf("b"))).unwrap();
        assert_eq!(json["type"], "group");
        assert_eq!(json["combinator"], "AND");
        assert_eq!(json["children"][0]["type"], "leaf");
        assert_eq!(json["children"][0]["operator"], "exact");
        assert_eq!(json["children"][0]["value"], 1);
    }
}
