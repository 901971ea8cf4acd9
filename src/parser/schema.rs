//! Destination schema definitions.
//!
//! Four append-only tables. Correlation between rows is by matching
//! `pid`/`mid` values only; there are no keys or constraints.

use rusqlite::ToSql;
use serde::Serialize;

/// A destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Relation,
    Request,
    Attr,
    S3RequestUid,
}

impl Table {
    /// All tables, in the order they are created and written
    pub const ALL: [Table; 4] = [
        Table::Relation,
        Table::Request,
        Table::Attr,
        Table::S3RequestUid,
    ];

    /// SQL table name
    pub fn name(self) -> &'static str {
        match self {
            Table::Relation => "relation",
            Table::Request => "request",
            Table::Attr => "attr",
            Table::S3RequestUid => "s3_request_uid",
        }
    }

    /// Column names and SQL types, in insert order
    pub fn columns(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Table::Relation => &[
                ("pid1", "INTEGER"),
                ("mid1", "INTEGER"),
                ("pid2", "INTEGER"),
                ("mid2", "INTEGER"),
                ("type_id", "TEXT"),
            ],
            Table::Request => &[
                ("time", "INTEGER"),
                ("pid", "INTEGER"),
                ("id", "INTEGER"),
                ("state", "TEXT"),
                ("type_id", "TEXT"),
            ],
            Table::Attr => &[
                ("entity_id", "INTEGER"),
                ("pid", "INTEGER"),
                ("name", "TEXT"),
                ("val", "TEXT"),
            ],
            Table::S3RequestUid => &[("pid", "INTEGER"), ("id", "INTEGER"), ("uuid", "TEXT")],
        }
    }

    /// Columns that get a lookup index when indexes are requested
    pub fn indexed_columns(self) -> &'static [&'static str] {
        match self {
            Table::Relation => &["mid1", "mid2", "pid1", "pid2"],
            Table::Request => &["id", "pid"],
            Table::Attr => &["entity_id", "pid"],
            Table::S3RequestUid => &[],
        }
    }

    /// `CREATE TABLE` statement for this table
    pub fn create_sql(self) -> String {
        let columns: Vec<String> = self
            .columns()
            .iter()
            .map(|(name, ty)| format!("\"{}\" {} NOT NULL", name, ty))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            self.name(),
            columns.join(", ")
        )
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Directed correlation between two scoped identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationRow {
    pub pid1: i64,
    pub mid1: i64,
    pub pid2: i64,
    pub mid2: i64,
    pub type_id: String,
}

/// One observed state transition of a unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestRow {
    /// Unix epoch nanoseconds
    pub time: i64,
    pub pid: i64,
    pub id: i64,
    pub state: String,
    pub type_id: String,
}

/// Named attribute attached to an entity; value kept as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttrRow {
    pub entity_id: i64,
    pub pid: i64,
    pub name: String,
    pub val: String,
}

/// Externally visible id of a gateway request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct S3RequestUidRow {
    pub pid: i64,
    pub id: i64,
    pub uuid: String,
}

/// A row destined for exactly one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Row {
    Relation(RelationRow),
    Request(RequestRow),
    Attr(AttrRow),
    S3RequestUid(S3RequestUidRow),
}

impl Row {
    /// Table this row belongs to
    pub fn table(&self) -> Table {
        match self {
            Row::Relation(_) => Table::Relation,
            Row::Request(_) => Table::Request,
            Row::Attr(_) => Table::Attr,
            Row::S3RequestUid(_) => Table::S3RequestUid,
        }
    }

    /// Bound values in the same order as `Table::columns`
    pub fn params(&self) -> Vec<&dyn ToSql> {
        match self {
            Row::Relation(r) => vec![&r.pid1, &r.mid1, &r.pid2, &r.mid2, &r.type_id],
            Row::Request(r) => vec![&r.time, &r.pid, &r.id, &r.state, &r.type_id],
            Row::Attr(r) => vec![&r.entity_id, &r.pid, &r.name, &r.val],
            Row::S3RequestUid(r) => vec![&r.pid, &r.id, &r.uuid],
        }
    }
}

/// Row counts per destination table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowCounts {
    pub relation: u64,
    pub request: u64,
    pub attr: u64,
    pub s3_request_uid: u64,
}

impl RowCounts {
    /// Add `n` rows to `table`
    pub fn add(&mut self, table: Table, n: u64) {
        *self.slot(table) += n;
    }

    /// Count for `table`
    pub fn get(&self, table: Table) -> u64 {
        match table {
            Table::Relation => self.relation,
            Table::Request => self.request,
            Table::Attr => self.attr,
            Table::S3RequestUid => self.s3_request_uid,
        }
    }

    /// Sum over all tables
    pub fn total(&self) -> u64 {
        Table::ALL.iter().map(|t| self.get(*t)).sum()
    }

    /// Fold another set of counts into this one
    pub fn merge(&mut self, other: &RowCounts) {
        for table in Table::ALL {
            self.add(table, other.get(table));
        }
    }

    fn slot(&mut self, table: Table) -> &mut u64 {
        match table {
            Table::Relation => &mut self.relation,
            Table::Request => &mut self.request,
            Table::Attr => &mut self.attr,
            Table::S3RequestUid => &mut self.s3_request_uid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_counts() {
        let mut a = RowCounts::default();
        a.add(Table::Relation, 3);
        a.add(Table::Attr, 1);

        let mut b = RowCounts::default();
        b.add(Table::Relation, 2);
        b.merge(&a);

        assert_eq!(b.get(Table::Relation), 5);
        assert_eq!(b.get(Table::Attr), 1);
        assert_eq!(b.total(), 6);
    }

    #[test]
    fn test_params_match_column_count() {
        let rows = [
            Row::Relation(RelationRow {
                pid1: 1,
                mid1: 2,
                pid2: 3,
                mid2: 4,
                type_id: "client_to_dix".to_string(),
            }),
            Row::Request(RequestRow {
                time: 1,
                pid: 2,
                id: 3,
                state: "INIT".to_string(),
                type_id: "be_tx".to_string(),
            }),
            Row::Attr(AttrRow {
                entity_id: 1,
                pid: 2,
                name: "M0_AVI_ATTR__RPC_OPCODE".to_string(),
                val: "33".to_string(),
            }),
            Row::S3RequestUid(S3RequestUidRow {
                pid: 1,
                id: 2,
                uuid: "f076db1d-f451-429d-802a-e5e628ec11be".to_string(),
            }),
        ];

        for row in &rows {
            assert_eq!(row.params().len(), row.table().columns().len());
        }
    }

    #[test]
    fn test_create_sql() {
        assert_eq!(
            Table::S3RequestUid.create_sql(),
            "CREATE TABLE IF NOT EXISTS \"s3_request_uid\" (\"pid\" INTEGER NOT NULL, \"id\" INTEGER NOT NULL, \"uuid\" TEXT NOT NULL)"
        );
    }
}
