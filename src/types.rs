use serde::{Deserialize, Serialize};

/// Index of a node inside a tree arena
pub type NodeId = usize;

/// Kind of a dataset attribute (or of the class attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    Numeric,
    /// Values are encoded as indices `0..values`
    Nominal { values: usize },
}

impl AttributeKind {
    pub fn is_nominal(&self) -> bool {
        matches!(self, Self::Nominal { .. })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric)
    }

    /// Number of branches a split on this attribute produces
    pub fn arity(&self) -> usize {
        match self {
            Self::Numeric => 2,
            Self::Nominal { values } => *values,
        }
    }
}

/// Comparison used by a split node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    /// Numeric split: `value < threshold` takes branch 0, everything else branch 1
    Less,
    /// Nominal split: the attribute value is the branch index
    Equal,
}

impl Sign {
    pub fn for_kind(kind: AttributeKind) -> Self {
        match kind {
            AttributeKind::Numeric => Sign::Less,
            AttributeKind::Nominal { .. } => Sign::Equal,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Sign::Less => "<",
            Sign::Equal => "=",
        }
    }
}

/// Class kinds a component can work with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSupport {
    Nominal,
    Numeric,
    Any,
}

impl TargetSupport {
    pub fn accepts(&self, kind: AttributeKind) -> bool {
        match self {
            TargetSupport::Any => true,
            TargetSupport::Nominal => kind.is_nominal(),
            TargetSupport::Numeric => kind.is_numeric(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_follows_kind() {
        assert_eq!(AttributeKind::Numeric.arity(), 2);
        assert_eq!(AttributeKind::Nominal { values: 4 }.arity(), 4);
    }

    #[test]
    fn test_target_support() {
        let nominal = AttributeKind::Nominal { values: 2 };
        assert!(TargetSupport::Nominal.accepts(nominal));
        assert!(!TargetSupport::Numeric.accepts(nominal));
        assert!(TargetSupport::Any.accepts(AttributeKind::Numeric));
    }
}
