use rusqlite::params;

use ledgerline_model::{
    AccountBinding, ClassificationNode, CostCenter, LabelOverride, RootContext,
};

use crate::{Store, StoreError};

fn decode_context(
    id: i64,
    cc_code: Option<String>,
    cc_kind: Option<String>,
    cc_name: Option<String>,
    virtual_id: Option<i64>,
    virtual_name: Option<String>,
) -> Result<Option<RootContext>, StoreError> {
    match (cc_code, virtual_id) {
        (Some(_), Some(_)) => Err(StoreError::Malformed {
            entity: "classification_node",
            detail: format!("node {id} carries both cost-center and virtual context"),
        }),
        (Some(code), None) => Ok(Some(RootContext::CostCenter(CostCenter {
            code,
            kind: cc_kind.unwrap_or_default(),
            name: cc_name.unwrap_or_default(),
        }))),
        (None, Some(vid)) => Ok(Some(RootContext::Virtual {
            id: vid,
            name: virtual_name.unwrap_or_default(),
        })),
        (None, None) => Ok(None),
    }
}

impl Store {
    /// All classification nodes, id order. The resolver builds its arena from
    /// this one read.
    pub fn classification_nodes(&self) -> Result<Vec<ClassificationNode>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, parent_id, cc_code, cc_kind, cc_name, virtual_id, virtual_name \
             FROM classification_nodes ORDER BY id",
        )?;
        let raws: Vec<(
            i64,
            String,
            Option<i64>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<i64>,
            Option<String>,
        )> = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ))
            })?
            .collect::<rusqlite::Result<_>>()?;

        raws.into_iter()
            .map(|(id, name, parent_id, cc_code, cc_kind, cc_name, vid, vname)| {
                let context = decode_context(id, cc_code, cc_kind, cc_name, vid, vname)?;
                Ok(ClassificationNode {
                    id,
                    name,
                    parent_id,
                    context,
                })
            })
            .collect()
    }

    /// Account bindings in declared source order (ordinal, then id).
    pub fn account_bindings(&self) -> Result<Vec<AccountBinding>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, node_id, account, cost_center, ordinal \
             FROM account_bindings ORDER BY ordinal, id",
        )?;
        let bindings = stmt
            .query_map([], |row| {
                Ok(AccountBinding {
                    id: row.get(0)?,
                    node_id: row.get(1)?,
                    account: row.get(2)?,
                    cost_center: row.get(3)?,
                    ordinal: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;
        Ok(bindings)
    }

    pub fn label_overrides(&self) -> Result<Vec<LabelOverride>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, account, label, node_id, virtual_id FROM label_overrides ORDER BY id",
        )?;
        let overrides = stmt
            .query_map([], |row| {
                Ok(LabelOverride {
                    id: row.get(0)?,
                    account: row.get(1)?,
                    label: row.get(2)?,
                    node_id: row.get(3)?,
                    virtual_id: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;
        Ok(overrides)
    }

    /// Insert one classification node, returning its id.
    pub fn insert_node(
        &self,
        name: &str,
        parent_id: Option<i64>,
        context: Option<&RootContext>,
    ) -> Result<i64, StoreError> {
        let (cc_code, cc_kind, cc_name, vid, vname) = match context {
            Some(RootContext::CostCenter(cc)) => (
                Some(cc.code.as_str()),
                Some(cc.kind.as_str()),
                Some(cc.name.as_str()),
                None,
                None,
            ),
            Some(RootContext::Virtual { id, name }) => {
                (None, None, None, Some(*id), Some(name.as_str()))
            }
            None => (None, None, None, None, None),
        };
        self.conn().execute(
            "INSERT INTO classification_nodes \
             (name, parent_id, cc_code, cc_kind, cc_name, virtual_id, virtual_name) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![name, parent_id, cc_code, cc_kind, cc_name, vid, vname],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn insert_binding(
        &self,
        node_id: i64,
        account: &str,
        cost_center: Option<&str>,
        ordinal: i64,
    ) -> Result<i64, StoreError> {
        self.conn().execute(
            "INSERT INTO account_bindings (node_id, account, cost_center, ordinal) \
             VALUES (?1, ?2, ?3, ?4)",
            params![node_id, account, cost_center, ordinal],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn insert_label_override(
        &self,
        account: &str,
        label: &str,
        node_id: Option<i64>,
        virtual_id: Option<i64>,
    ) -> Result<i64, StoreError> {
        self.conn().execute(
            "INSERT INTO label_overrides (account, label, node_id, virtual_id) \
             VALUES (?1, ?2, ?3, ?4)",
            params![account, label, node_id, virtual_id],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Delete a classification node and its bindings. The caller is expected
    /// to drop the node's ordering slots as well.
    pub fn delete_node(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute("BEGIN TRANSACTION", [])?;
        conn.execute(
            "DELETE FROM account_bindings WHERE node_id = ?1",
            params![id],
        )?;
        let removed = conn.execute("DELETE FROM classification_nodes WHERE id = ?1", params![id])?;
        conn.execute("COMMIT", [])?;
        if removed == 0 {
            return Err(StoreError::NotFound {
                entity: "classification_node",
                key: id.to_string(),
            });
        }
        Ok(())
    }
}
