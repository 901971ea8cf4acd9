//! Record-type registry: which transformer handles which dump record.
//!
//! Each record type maps to one `Transformer` variant plus the discriminator
//! written to `type_id`. Many discriminators share one physical table.

use super::record::{tokenize, TraceLine};
use super::schema::{AttrRow, RelationRow, RequestRow, Row, S3RequestUidRow};
use super::values::{parse_hex_u64, parse_id, parse_kv_block, parse_timestamp, swapped_uuid};
use crate::utils::error::{ParseError, RegistryError};
use std::collections::HashMap;

/// Which side of an rpc item / session correlation a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// rpc item → (session, xid)
    Forward,
    /// (session, xid) → rpc item
    Reverse,
}

/// Field extraction recipe for one record family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformer {
    /// Two identifiers at fixed field positions, both scoped to the file pid
    Edge { from: usize, to: usize },

    /// Inline `id`/`xid`/`session_id` block; the session id scopes one side
    SessionEdge(EdgeDirection),

    /// `<label>: <id>, ... <state>` state machine transition
    Phase,

    /// `entity_id: <id>, <name>: <value>`
    Attribute,

    /// Request id plus two byte-swapped 64-bit uid halves
    Uid,
}

/// Registry entry: transformer plus discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub kind: &'static str,
    pub transformer: Transformer,
    pub type_id: &'static str,
}

/// Most edges are `<a>_id: <x>, <b>_id: <y>`
const PAIR: Transformer = Transformer::Edge { from: 1, to: 3 };

/// Built-in record types, in the order they are registered
pub const RECORD_TYPES: &[(&str, Transformer, &str)] = &[
    ("rpc-item-id-fetch", Transformer::SessionEdge(EdgeDirection::Reverse), "sxid_to_rpc"),
    ("fom-descr", Transformer::Edge { from: 11, to: 13 }, "rpc_to_fom"),
    ("tx-state", Transformer::Phase, "be_tx"),
    ("fom-phase", Transformer::Phase, "fom_req"),
    ("fom-state", Transformer::Phase, "fom_req_state"),
    ("fom-to-tx", PAIR, "fom_to_tx"),
    ("tx-to-gr", PAIR, "tx_to_gr"),
    ("cas-to-rpc", PAIR, "cas_to_rpc"),
    ("dix-to-cas", PAIR, "dix_to_cas"),
    ("dix-to-mdix", PAIR, "dix_to_mdix"),
    ("client-to-dix", PAIR, "client_to_dix"),
    ("rpc-item-id-assign", Transformer::SessionEdge(EdgeDirection::Forward), "rpc_to_sxid"),
    ("rpc-out-phase", Transformer::Phase, "rpc_req"),
    ("rpc-in-phase", Transformer::Phase, "rpc_req"),
    ("cas-req-state", Transformer::Phase, "cas_req"),
    ("dix-req-state", Transformer::Phase, "dix_req"),
    ("op-state", Transformer::Phase, "client_req"),
    ("client-to-cob", PAIR, "client_to_cob"),
    ("cob-to-rpc", PAIR, "cob_to_rpc"),
    ("client-to-ioo", PAIR, "client_to_ioo"),
    ("ioo-to-rpc", PAIR, "ioo_to_rpc"),
    ("ioo-req-state", Transformer::Phase, "ioo_req"),
    ("cob-req-state", Transformer::Phase, "cob_req"),
    ("stio-req-state", Transformer::Phase, "stio_req"),
    ("fom-to-stio", PAIR, "fom_to_stio"),
    ("attr", Transformer::Attribute, "attr"),
    ("bulk-to-rpc", PAIR, "bulk_to_rpc"),
    ("cas-fom-to-crow-fom", PAIR, "cas_fom_to_crow_fom"),
    ("s3-request-to-motr", PAIR, "s3_request_to_client"),
    ("s3-request-state", Transformer::Phase, "s3_request_state"),
    ("s3-request-uid", Transformer::Uid, "s3_request_uid"),
];

/// Lookup table from record-type name to registration
#[derive(Debug, Clone)]
pub struct Registry {
    entries: HashMap<&'static str, Registration>,
}

impl Registry {
    /// Build the registry of built-in record types
    ///
    /// **Public** - called once per run
    pub fn new() -> Result<Self, RegistryError> {
        Self::from_entries(RECORD_TYPES)
    }

    /// Build a registry from an explicit table
    ///
    /// # Errors
    /// * `RegistryError::Duplicate` - a record-type name appears twice
    pub fn from_entries(
        entries: &[(&'static str, Transformer, &'static str)],
    ) -> Result<Self, RegistryError> {
        let mut map = HashMap::with_capacity(entries.len());
        for &(kind, transformer, type_id) in entries {
            let registration = Registration {
                kind,
                transformer,
                type_id,
            };
            if map.insert(kind, registration).is_some() {
                return Err(RegistryError::Duplicate(kind.to_string()));
            }
        }
        Ok(Self { entries: map })
    }

    /// Exact-match lookup of a record-type name
    pub fn lookup(&self, kind: &str) -> Option<&Registration> {
        self.entries.get(kind)
    }

    /// Number of registered record types
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered record-type names, sorted
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<&'static str> = self.entries.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    /// Turn one raw dump line into a row
    ///
    /// **Public** - main entry point used by the router
    ///
    /// # Returns
    /// * `Ok(None)` - blank line or unregistered record type
    /// * `Ok(Some(row))` - parsed row tagged with `pid`
    ///
    /// # Errors
    /// * `ParseError::Record` - a registered record type failed to parse
    pub fn transform(&self, line: &str, pid: i64) -> Result<Option<Row>, ParseError> {
        Ok(self.classify(line, pid)?.map(|(_, row)| row))
    }

    /// Like `transform`, but also names the record type that matched
    ///
    /// # Returns
    /// * `Ok(Some((kind, row)))` - `kind` is the registered record-type name
    pub fn classify(
        &self,
        line: &str,
        pid: i64,
    ) -> Result<Option<(&'static str, Row)>, ParseError> {
        let Some(record) = tokenize(line) else {
            return Ok(None);
        };
        let Some(registration) = self.lookup(record.kind) else {
            return Ok(None);
        };

        registration
            .transformer
            .apply(&record, pid, registration.type_id)
            .map(|row| Some((registration.kind, row)))
            .map_err(|source| ParseError::Record {
                line: line.trim_end().to_string(),
                source: Box::new(source),
            })
    }
}

impl Transformer {
    /// Extract a row from a tokenized record
    ///
    /// # Arguments
    /// * `record` - tokenized line whose kind is registered to `self`
    /// * `pid` - process id of the dump being ingested
    /// * `type_id` - discriminator to record on the row
    pub fn apply(self, record: &TraceLine<'_>, pid: i64, type_id: &str) -> Result<Row, ParseError> {
        match self {
            Transformer::Edge { from, to } => Ok(Row::Relation(RelationRow {
                pid1: pid,
                mid1: parse_id(required(record, from)?)?,
                pid2: pid,
                mid2: parse_id(required(record, to)?)?,
                type_id: type_id.to_string(),
            })),

            Transformer::SessionEdge(direction) => {
                let block = record.fields.join(" ");
                let pairs = parse_kv_block(&block)?;
                let id = kv_id(record, &pairs, "id")?;
                let xid = kv_id(record, &pairs, "xid")?;
                let session = kv_id(record, &pairs, "session_id")?;

                let (pid1, mid1, pid2, mid2) = match direction {
                    EdgeDirection::Forward => (pid, id, session, xid),
                    EdgeDirection::Reverse => (session, xid, pid, id),
                };
                Ok(Row::Relation(RelationRow {
                    pid1,
                    mid1,
                    pid2,
                    mid2,
                    type_id: type_id.to_string(),
                }))
            }

            Transformer::Phase => {
                let id = parse_id(required(record, 1)?)?;
                // position 1 exists, so the record has a last field
                let state = record.last_field().unwrap_or_default();
                Ok(Row::Request(RequestRow {
                    time: parse_timestamp(record.timestamp)?,
                    pid,
                    id,
                    state: state.to_string(),
                    type_id: type_id.to_string(),
                }))
            }

            Transformer::Attribute => {
                let entity_id = parse_id(required(record, 1)?)?;
                let name = required(record, 2)?.trim_end_matches(':');
                let val = required(record, 3)?;
                Ok(Row::Attr(AttrRow {
                    entity_id,
                    pid,
                    name: name.to_string(),
                    val: val.to_string(),
                }))
            }

            Transformer::Uid => {
                let id = parse_id(required(record, 1)?)?;
                let first = parse_hex_u64(required(record, 3)?)?;
                let last = parse_hex_u64(required(record, 5)?)?;
                Ok(Row::S3RequestUid(S3RequestUidRow {
                    pid,
                    id,
                    uuid: swapped_uuid(first, last),
                }))
            }
        }
    }
}

/// Field at `position` or a `MissingField` error
fn required<'a>(record: &TraceLine<'a>, position: usize) -> Result<&'a str, ParseError> {
    record.field(position).ok_or_else(|| ParseError::MissingField {
        kind: record.kind.to_string(),
        position,
    })
}

/// Integer value of `key` in an inline key/value block
fn kv_id(record: &TraceLine<'_>, pairs: &[(&str, &str)], key: &str) -> Result<i64, ParseError> {
    let value = pairs
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .ok_or_else(|| ParseError::MissingKey {
            kind: record.kind.to_string(),
            key: key.to_string(),
        })?;
    parse_id(value)
}
