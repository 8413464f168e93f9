//! Wire protocol: client requests in, server events out.
//!
//! Client messages are JSON objects. `{"type": "init"}` asks for the
//! bootstrap sample; anything with `"type": "query"` or with no `type` at all
//! is a point query:
//!
//! ```json
//! {"x0": -15, "x1": 15, "y0": -25, "y1": 15,
//!  "types": ["mip-clusters"], "lengthRange": [50, 300], "pLDDT": [70, 100],
//!  "supercog": ["s1", "s12"], "taxonomy": ["Bacteria"],
//!  "goTerm": "GO:0008150", "ontology": "BP"}
//! ```
//!
//! Numeric fields accept numbers or numeric strings, and list / range fields
//! accept arrays or comma-joined strings, because the browser client builds
//! its requests from query-string values. An empty list or range is the same
//! as an absent one.

use protmap_core::query::{BoundingBox, NumericRange, Query, TermFilter};
use protmap_core::terms::DEFAULT_ONTOLOGY;
use protmap_core::{PointRecord, QueryError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// An event sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Bootstrap sample. The client keeps these points for the whole session,
    /// independent of later updates.
    Init { points: Vec<PointRecord> },
    /// One batch of a query result.
    Update { points: Vec<PointRecord>, is_last: bool },
    /// The request could not be served. The session stays open.
    Error { message: String },
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// A decoded client request.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Init,
    Query(Query),
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| QueryError::MalformedMessage(e.to_string()))?;
        if !value.is_object() {
            return Err(QueryError::MalformedMessage("expected a JSON object".to_string()));
        }
        match value.get("type") {
            None | Some(serde_json::Value::Null) => {}
            Some(serde_json::Value::String(kind)) => match kind.as_str() {
                "init" => return Ok(ClientMessage::Init),
                "query" => {}
                other => return Err(QueryError::UnknownMessageType(other.to_string())),
            },
            Some(other) => {
                return Err(QueryError::WrongShape {
                    field: "type",
                    reason: format!("expected a string, got {other}"),
                })
            }
        }
        let request: QueryRequest = serde_json::from_value(value)
            .map_err(|e| QueryError::MalformedMessage(e.to_string()))?;
        request.into_query().map(ClientMessage::Query)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    fn to_f64(&self, field: &'static str) -> Result<f64, QueryError> {
        let value = match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
        };
        value
            .filter(|v| v.is_finite())
            .ok_or_else(|| QueryError::NotANumber {
                field,
                value: match self {
                    Scalar::Number(n) => n.to_string(),
                    Scalar::Text(s) => s.clone(),
                },
            })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListField {
    Items(Vec<String>),
    Joined(String),
}

impl ListField {
    /// `None` when the list has no non-blank entries.
    fn into_set(self) -> Option<HashSet<String>> {
        let items: HashSet<String> = match self {
            ListField::Items(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            ListField::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        };
        (!items.is_empty()).then_some(items)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RangeField {
    Pair(Vec<Scalar>),
    Joined(String),
}

impl RangeField {
    fn into_range(self, field: &'static str) -> Result<Option<NumericRange>, QueryError> {
        let parts: Vec<Scalar> = match self {
            RangeField::Pair(parts) if parts.is_empty() => return Ok(None),
            RangeField::Pair(parts) => parts,
            RangeField::Joined(s) if s.trim().is_empty() => return Ok(None),
            RangeField::Joined(s) => s.split(',').map(|p| Scalar::Text(p.to_string())).collect(),
        };
        let [min, max] = parts.as_slice() else {
            return Err(QueryError::MalformedRange {
                field,
                value: format!("{} values", parts.len()),
            });
        };
        Ok(Some(NumericRange::new(min.to_f64(field)?, max.to_f64(field)?)))
    }
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    x0: Option<Scalar>,
    x1: Option<Scalar>,
    y0: Option<Scalar>,
    y1: Option<Scalar>,
    types: Option<ListField>,
    #[serde(rename = "lengthRange")]
    length_range: Option<RangeField>,
    #[serde(rename = "pLDDT")]
    plddt: Option<RangeField>,
    supercog: Option<ListField>,
    taxonomy: Option<ListField>,
    #[serde(rename = "goTerm")]
    go_term: Option<String>,
    ontology: Option<String>,
}

fn bound(value: Option<Scalar>, field: &'static str, default: f64) -> Result<f64, QueryError> {
    value.map_or(Ok(default), |v| v.to_f64(field))
}

impl QueryRequest {
    fn into_query(self) -> Result<Query, QueryError> {
        let defaults = BoundingBox::default();
        let bounds = BoundingBox {
            x0: bound(self.x0, "x0", defaults.x0)?,
            x1: bound(self.x1, "x1", defaults.x1)?,
            y0: bound(self.y0, "y0", defaults.y0)?,
            y1: bound(self.y1, "y1", defaults.y1)?,
        };
        let term = self
            .go_term
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|term| TermFilter {
                ontology: self
                    .ontology
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .unwrap_or_else(|| DEFAULT_ONTOLOGY.to_string()),
                term,
            });
        Ok(Query {
            bounds,
            types: self.types.and_then(ListField::into_set),
            length: self.length_range.map(|r| r.into_range("lengthRange")).transpose()?.flatten(),
            plddt: self.plddt.map(|r| r.into_range("pLDDT")).transpose()?.flatten(),
            supercog: self.supercog.and_then(ListField::into_set),
            taxonomy: self.taxonomy.and_then(ListField::into_set),
            term,
        })
    }
}
