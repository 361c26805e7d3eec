//! Classification hierarchy types: nodes, account bindings, label overrides,
//! and virtual (formula-computed) nodes.

// ---------------------------------------------------------------------------
// Root context
// ---------------------------------------------------------------------------

/// A cost-center reference row: code plus its classification kind and label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostCenter {
    pub code: String,
    pub kind: String,
    pub name: String,
}

/// The attribute a root node carries and its descendants inherit.
///
/// Mutually exclusive: a subtree reports either under a cost-center kind or
/// under a virtual node, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum RootContext {
    CostCenter(CostCenter),
    Virtual { id: i64, name: String },
}

impl RootContext {
    /// The primary report kind this context groups under.
    pub fn kind(&self) -> &str {
        match self {
            Self::CostCenter(cc) => &cc.kind,
            Self::Virtual { .. } => "virtual",
        }
    }

    pub fn virtual_id(&self) -> Option<i64> {
        match self {
            Self::Virtual { id, .. } => Some(*id),
            Self::CostCenter(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Nodes and bindings
// ---------------------------------------------------------------------------

/// One node of the classification tree. `parent_id == None` marks a root.
/// Non-roots without their own context inherit the nearest ancestor's.
#[derive(Debug, Clone)]
pub struct ClassificationNode {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub context: Option<RootContext>,
}

/// Routes an account code to a classification node, optionally pinned to a
/// specific cost-center. `ordinal` fixes the source order used for fallback
/// matching.
#[derive(Debug, Clone)]
pub struct AccountBinding {
    pub id: i64,
    pub node_id: i64,
    pub account: String,
    pub cost_center: Option<String>,
    pub ordinal: i64,
}

/// A custom display label for an account, attached to either a tree node or
/// directly to a virtual node.
#[derive(Debug, Clone)]
pub struct LabelOverride {
    pub id: i64,
    pub account: String,
    pub label: String,
    pub node_id: Option<i64>,
    pub virtual_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Virtual nodes and formulas
// ---------------------------------------------------------------------------

/// A named report line with no backing ledger account. With a formula it is
/// computed from other lines; without one it only anchors classification.
#[derive(Debug, Clone)]
pub struct VirtualNode {
    pub id: i64,
    pub name: String,
    pub formula: Option<Formula>,
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    pub op: FormulaOp,
    pub operands: Vec<OperandRef>,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaOp {
    /// Sum of all operands.
    Sum,
    /// First operand minus the sum of the rest.
    Difference,
    /// Product of all operands.
    Product,
    /// First operand over the second; zero when the divisor is zero or
    /// missing.
    Quotient,
}

impl FormulaOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Difference => "difference",
            Self::Product => "product",
            Self::Quotient => "quotient",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sum" => Some(Self::Sum),
            "difference" => Some(Self::Difference),
            "product" => Some(Self::Product),
            "quotient" => Some(Self::Quotient),
            _ => None,
        }
    }
}

impl std::fmt::Display for FormulaOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which accumulator namespace an operand reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandScope {
    /// A primary report kind (cost-center classification kind).
    Kind,
    /// A hierarchy path segment (group or subgroup name).
    Node,
    /// Another virtual node, by id or name.
    Virtual,
}

impl OperandScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kind => "kind",
            Self::Node => "node",
            Self::Virtual => "virtual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "kind" => Some(Self::Kind),
            "node" => Some(Self::Node),
            "virtual" => Some(Self::Virtual),
            _ => None,
        }
    }
}

/// A named reference to an aggregated quantity, e.g. `node:Revenue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandRef {
    pub scope: OperandScope,
    pub key: String,
}

impl OperandRef {
    pub fn new(scope: OperandScope, key: impl Into<String>) -> Self {
        Self {
            scope,
            key: key.into(),
        }
    }

    /// The accumulator key this operand resolves against.
    pub fn lookup_key(&self) -> String {
        format!("{}:{}", self.scope.as_str(), self.key)
    }

    /// Parse the `scope:key` wire form used by the virtual-node table.
    pub fn parse(s: &str) -> Option<Self> {
        let (scope, key) = s.split_once(':')?;
        let scope = OperandScope::parse(scope)?;
        if key.is_empty() {
            return None;
        }
        Some(Self::new(scope, key))
    }
}

impl std::fmt::Display for OperandRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scope.as_str(), self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_wire_roundtrip() {
        let op = OperandRef::new(OperandScope::Node, "Revenue");
        assert_eq!(op.to_string(), "node:Revenue");
        assert_eq!(OperandRef::parse("node:Revenue"), Some(op));
        assert_eq!(OperandRef::parse("bogus:Revenue"), None);
        assert_eq!(OperandRef::parse("node:"), None);
        assert_eq!(OperandRef::parse("noseparator"), None);
    }

    #[test]
    fn context_kind_mapping() {
        let cc = RootContext::CostCenter(CostCenter {
            code: "200".into(),
            kind: "operational".into(),
            name: "Factory".into(),
        });
        assert_eq!(cc.kind(), "operational");
        assert_eq!(cc.virtual_id(), None);

        let virt = RootContext::Virtual {
            id: 7,
            name: "EBITDA".into(),
        };
        assert_eq!(virt.kind(), "virtual");
        assert_eq!(virt.virtual_id(), Some(7));
    }
}
