pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS ledger_entries (
    id INTEGER PRIMARY KEY,
    origin TEXT NOT NULL,
    account TEXT NOT NULL,
    title TEXT NOT NULL,
    entry_date TEXT NOT NULL,            -- YYYY-MM-DD
    document TEXT,
    branch TEXT,
    cost_center TEXT,
    item TEXT,
    debit_cents INTEGER NOT NULL DEFAULT 0,
    credit_cents INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_ledger_origin ON ledger_entries(origin);
CREATE INDEX IF NOT EXISTS idx_ledger_item ON ledger_entries(item);

CREATE TABLE IF NOT EXISTS adjustments (
    id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL,                  -- edit/include/auto_intergroup/auto_nonoperating
    status TEXT NOT NULL DEFAULT 'pending',
    invalid INTEGER NOT NULL DEFAULT 0,
    fingerprint TEXT,                    -- required for override kinds
    origin TEXT,
    account TEXT,
    title TEXT,
    adj_date TEXT,
    document TEXT,
    branch TEXT,
    cost_center TEXT,
    item TEXT,
    debit_cents INTEGER NOT NULL DEFAULT 0,
    credit_cents INTEGER NOT NULL DEFAULT 0,
    show_balance INTEGER NOT NULL DEFAULT 1,
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    approved_by TEXT,
    approved_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_adjustments_fingerprint ON adjustments(fingerprint);

CREATE TABLE IF NOT EXISTS adjustment_audit (
    id INTEGER PRIMARY KEY,
    adjustment_id INTEGER NOT NULL REFERENCES adjustments(id),
    field TEXT NOT NULL,
    old_value TEXT,
    new_value TEXT,
    changed_by TEXT NOT NULL,
    changed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS classification_nodes (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    parent_id INTEGER REFERENCES classification_nodes(id),
    -- root context: either a cost-center triple or a virtual node, never both
    cc_code TEXT,
    cc_kind TEXT,
    cc_name TEXT,
    virtual_id INTEGER,
    virtual_name TEXT
);

CREATE TABLE IF NOT EXISTS account_bindings (
    id INTEGER PRIMARY KEY,
    node_id INTEGER NOT NULL REFERENCES classification_nodes(id),
    account TEXT NOT NULL,
    cost_center TEXT,
    ordinal INTEGER NOT NULL DEFAULT 0,
    UNIQUE (node_id, account, cost_center)
);
CREATE INDEX IF NOT EXISTS idx_bindings_account ON account_bindings(account);

CREATE TABLE IF NOT EXISTS label_overrides (
    id INTEGER PRIMARY KEY,
    account TEXT NOT NULL,
    label TEXT NOT NULL,
    node_id INTEGER REFERENCES classification_nodes(id),
    virtual_id INTEGER
);

CREATE TABLE IF NOT EXISTS virtual_nodes (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    formula_op TEXT,                     -- sum/difference/product/quotient
    formula_operands TEXT,               -- ';'-joined scope:key refs
    formula_multiplier REAL NOT NULL DEFAULT 1.0,
    style TEXT
);

CREATE TABLE IF NOT EXISTS cost_centers (
    code TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ordering_slots (
    node_kind TEXT NOT NULL,
    node_ref TEXT NOT NULL,
    parent_ctx TEXT NOT NULL,
    position INTEGER NOT NULL,
    depth INTEGER NOT NULL DEFAULT 0,
    ctx_path TEXT,
    PRIMARY KEY (node_kind, node_ref, parent_ctx)
);
CREATE INDEX IF NOT EXISTS idx_ordering_ctx ON ordering_slots(parent_ctx);
"#;
