//! Read-only reference tables: cost-center classification and virtual-node
//! definitions (plus the seeding helpers tests and setup tooling use).

use rusqlite::params;

use ledgerline_model::{CostCenter, Formula, FormulaOp, OperandRef, VirtualNode};

use crate::{Store, StoreError};

fn decode_formula(
    id: i64,
    op: Option<String>,
    operands: Option<String>,
    multiplier: f64,
) -> Result<Option<Formula>, StoreError> {
    let Some(op) = op else {
        return Ok(None);
    };
    let op = FormulaOp::parse(&op).ok_or(StoreError::Malformed {
        entity: "virtual_node",
        detail: format!("unknown formula op '{op}' (id {id})"),
    })?;
    let operands = operands
        .unwrap_or_default()
        .split(';')
        .filter(|s| !s.is_empty())
        .map(|s| {
            OperandRef::parse(s).ok_or(StoreError::Malformed {
                entity: "virtual_node",
                detail: format!("bad operand ref '{s}' (id {id})"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(Formula {
        op,
        operands,
        multiplier,
    }))
}

impl Store {
    pub fn cost_centers(&self) -> Result<Vec<CostCenter>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT code, kind, name FROM cost_centers ORDER BY code")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CostCenter {
                    code: row.get(0)?,
                    kind: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    pub fn insert_cost_center(&self, cc: &CostCenter) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO cost_centers (code, kind, name) VALUES (?1, ?2, ?3)",
            params![cc.code, cc.kind, cc.name],
        )?;
        Ok(())
    }

    /// Virtual-node definitions, id order.
    pub fn virtual_nodes(&self) -> Result<Vec<VirtualNode>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, formula_op, formula_operands, formula_multiplier, style \
             FROM virtual_nodes ORDER BY id",
        )?;
        let raws: Vec<(i64, String, Option<String>, Option<String>, f64, Option<String>)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?
            .collect::<rusqlite::Result<_>>()?;

        raws.into_iter()
            .map(|(id, name, op, operands, multiplier, style)| {
                let formula = decode_formula(id, op, operands, multiplier)?;
                Ok(VirtualNode {
                    id,
                    name,
                    formula,
                    style,
                })
            })
            .collect()
    }

    pub fn insert_virtual_node(&self, node: &VirtualNode) -> Result<i64, StoreError> {
        let (op, operands, multiplier) = match &node.formula {
            Some(f) => (
                Some(f.op.as_str()),
                Some(
                    f.operands
                        .iter()
                        .map(|o| o.to_string())
                        .collect::<Vec<_>>()
                        .join(";"),
                ),
                f.multiplier,
            ),
            None => (None, None, 1.0),
        };
        self.conn().execute(
            "INSERT INTO virtual_nodes (name, formula_op, formula_operands, \
             formula_multiplier, style) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![node.name, op, operands, multiplier, node.style],
        )?;
        Ok(self.conn().last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerline_model::OperandScope;

    #[test]
    fn virtual_node_formula_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .insert_virtual_node(&VirtualNode {
                id: 0,
                name: "Gross margin".into(),
                formula: Some(Formula {
                    op: FormulaOp::Quotient,
                    operands: vec![
                        OperandRef::new(OperandScope::Node, "Gross profit"),
                        OperandRef::new(OperandScope::Node, "Revenue"),
                    ],
                    multiplier: 100.0,
                }),
                style: Some("percent".into()),
            })
            .unwrap();

        let nodes = store.virtual_nodes().unwrap();
        let node = nodes.iter().find(|n| n.id == id).unwrap();
        let formula = node.formula.as_ref().unwrap();
        assert_eq!(formula.op, FormulaOp::Quotient);
        assert_eq!(formula.operands.len(), 2);
        assert_eq!(formula.operands[1].key, "Revenue");
        assert_eq!(formula.multiplier, 100.0);
    }

    #[test]
    fn plain_virtual_node_has_no_formula() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert_virtual_node(&VirtualNode {
                id: 0,
                name: "Eliminations".into(),
                formula: None,
                style: None,
            })
            .unwrap();
        assert!(store.virtual_nodes().unwrap()[0].formula.is_none());
    }

    #[test]
    fn cost_center_listing_sorted_by_code() {
        let store = Store::open_in_memory().unwrap();
        for (code, kind) in [("300", "administrative"), ("200", "operational")] {
            store
                .insert_cost_center(&CostCenter {
                    code: code.into(),
                    kind: kind.into(),
                    name: format!("CC {code}"),
                })
                .unwrap();
        }
        let ccs = store.cost_centers().unwrap();
        assert_eq!(ccs[0].code, "200");
        assert_eq!(ccs[1].code, "300");
    }
}
