/// One row of the ordering table: a display slot for a node within a named
/// sibling scope.
///
/// The `(kind, node_ref, context)` triple is unique. Positions within one
/// context are unique by convention; the subsystem renumbers, it does not
/// enforce atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSlot {
    /// Node type: `virtual`, `group`, `subgroup`, `account`, `cc_kind`.
    pub kind: String,
    /// Reference into the owning table, as text (node ids, account codes and
    /// cost-center kinds all key here).
    pub node_ref: String,
    /// Sibling scope: `root`, `kinds`, or a type-prefixed parent id such as
    /// `group_12`.
    pub context: String,
    pub position: i64,
    pub depth: i64,
    /// Materialized chain of contexts from the root, `::`-joined.
    pub path: Option<String>,
}

impl OrderSlot {
    pub fn new(
        kind: impl Into<String>,
        node_ref: impl Into<String>,
        context: impl Into<String>,
        position: i64,
    ) -> Self {
        Self {
            kind: kind.into(),
            node_ref: node_ref.into(),
            context: context.into(),
            position,
            depth: 0,
            path: None,
        }
    }

    /// The context this slot's own children live in.
    pub fn child_context(&self) -> String {
        format!("{}_{}", self.kind, self.node_ref)
    }
}
