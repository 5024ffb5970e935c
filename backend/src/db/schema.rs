//! SQLite schema definition.

/// Complete database schema, applied as one batch on open.
pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- Atomic counters backing the sequential code generator (SG-, DV-, KH-, ...).
CREATE TABLE IF NOT EXISTS sequences (
    prefix TEXT PRIMARY KEY,
    value  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS service_groups (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    code        TEXT NOT NULL UNIQUE,
    description TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS services (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    code        TEXT NOT NULL UNIQUE,
    group_id    TEXT NOT NULL REFERENCES service_groups(id),
    unit        TEXT,
    description TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_services_group ON services(group_id);

CREATE TABLE IF NOT EXISTS price_packages (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    code        TEXT NOT NULL UNIQUE,
    description TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS service_prices (
    package_id TEXT NOT NULL REFERENCES price_packages(id),
    service_id TEXT NOT NULL REFERENCES services(id),
    unit_price REAL NOT NULL,
    UNIQUE (package_id, service_id)
);

CREATE INDEX IF NOT EXISTS idx_service_prices_package ON service_prices(package_id);

-- Care and reject taxonomies share one column layout; the store is
-- parameterized by table pair.
CREATE TABLE IF NOT EXISTS care_groups (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    code          TEXT NOT NULL UNIQUE,
    display_order INTEGER NOT NULL DEFAULT 0,
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS care_results (
    id             TEXT PRIMARY KEY,
    group_id       TEXT NOT NULL REFERENCES care_groups(id),
    group_name     TEXT NOT NULL,
    name           TEXT NOT NULL,
    classification TEXT,
    code           TEXT NOT NULL UNIQUE,
    display_order  INTEGER NOT NULL DEFAULT 0,
    is_active      INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_care_results_group ON care_results(group_id);

CREATE TABLE IF NOT EXISTS reject_groups (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    code          TEXT NOT NULL UNIQUE,
    display_order INTEGER NOT NULL DEFAULT 0,
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reject_reasons (
    id             TEXT PRIMARY KEY,
    group_id       TEXT NOT NULL REFERENCES reject_groups(id),
    group_name     TEXT NOT NULL,
    name           TEXT NOT NULL,
    classification TEXT,
    code           TEXT NOT NULL UNIQUE,
    display_order  INTEGER NOT NULL DEFAULT 0,
    is_active      INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reject_reasons_group ON reject_reasons(group_id);

CREATE TABLE IF NOT EXISTS departments (
    id             TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    description    TEXT,
    manager_id     TEXT,
    employee_count INTEGER NOT NULL DEFAULT 0,
    is_active      INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS positions (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    code        TEXT NOT NULL UNIQUE,
    description TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS customers (
    id         TEXT PRIMARY KEY,
    code       TEXT NOT NULL UNIQUE,
    name       TEXT NOT NULL,
    phone      TEXT,
    email      TEXT,
    address    TEXT,
    province   TEXT,
    source     TEXT,
    notes      TEXT,
    latitude   REAL,
    longitude  REAL,
    is_del     INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_customers_name ON customers(name);
CREATE INDEX IF NOT EXISTS idx_customers_phone ON customers(phone);

CREATE TABLE IF NOT EXISTS opportunities (
    id               TEXT PRIMARY KEY,
    code             TEXT NOT NULL UNIQUE,
    customer_id      TEXT NOT NULL REFERENCES customers(id),
    title            TEXT NOT NULL,
    stage            TEXT NOT NULL DEFAULT 'moi',
    value            REAL,
    assignee_id      TEXT,
    care_result_id   TEXT,
    reject_reason_id TEXT,
    notes            TEXT,
    is_active        INTEGER NOT NULL DEFAULT 1,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_opportunities_customer ON opportunities(customer_id);
CREATE INDEX IF NOT EXISTS idx_opportunities_stage ON opportunities(stage);

CREATE TABLE IF NOT EXISTS quotations (
    id             TEXT PRIMARY KEY,
    code           TEXT NOT NULL UNIQUE,
    customer_id    TEXT NOT NULL REFERENCES customers(id),
    opportunity_id TEXT,
    package_id     TEXT,
    status         TEXT NOT NULL DEFAULT 'draft',
    notes          TEXT,
    total          REAL NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- Lines snapshot service_name and unit_price; catalog renames must not
-- rewrite history.
CREATE TABLE IF NOT EXISTS quotation_lines (
    quotation_id TEXT NOT NULL REFERENCES quotations(id) ON DELETE CASCADE,
    service_id   TEXT NOT NULL,
    service_name TEXT NOT NULL,
    quantity     REAL NOT NULL,
    unit_price   REAL NOT NULL,
    line_total   REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_quotation_lines_quotation ON quotation_lines(quotation_id);

CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    display_name  TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'staff',
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- md5 of every successfully imported customer file; identical re-uploads are
-- short-circuited.
CREATE TABLE IF NOT EXISTS import_files (
    md5         TEXT PRIMARY KEY,
    file_name   TEXT,
    imported_at TEXT NOT NULL
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn schema_is_valid_sql() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "schema should apply cleanly: {:?}", result);
    }

    #[test]
    fn quotation_lines_cascade_on_delete() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO customers (id, code, name, created_at, updated_at)
             VALUES ('c1', 'KH-0001', 'A', '', '')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO quotations (id, code, customer_id, created_at, updated_at)
             VALUES ('q1', 'QU-0001', 'c1', '', '')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO quotation_lines (quotation_id, service_id, service_name, quantity, unit_price, line_total)
             VALUES ('q1', 's1', 'Massage', 2, 100.0, 200.0)",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM quotations WHERE id = 'q1'", []).unwrap();
        let lines: i64 = conn
            .query_row("SELECT COUNT(*) FROM quotation_lines", [], |r| r.get(0))
            .unwrap();
        assert_eq!(lines, 0);
    }
}
