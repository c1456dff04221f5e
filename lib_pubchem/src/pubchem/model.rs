//! # PubChem Data Model
//!
//! The identifier and result types that flow through the fetcher and the batch
//! driver, plus the serde models of the two PUG REST bodies we consume.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// Text written to the spreadsheet for a field that could not be resolved.
pub const NOT_FOUND: &str = "Not Found";

/// # NSC Identifier
///
/// An opaque identifier as read from the input spreadsheet. The raw text is
/// kept for the output row; [`NscId::query_name`] derives what PubChem is
/// asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NscId(String);

impl NscId {
    /// Wraps the identifier exactly as given.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The identifier exactly as it appeared in the input.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The PubChem synonym to look up, e.g. `NSC740`.
    ///
    /// Surrounding whitespace is ignored, an existing `NSC` prefix is not
    /// repeated, and a spreadsheet-style `740.0` is queried as `740`.
    pub fn query_name(&self) -> String {
        let trimmed = self.0.trim();
        let number = match trimmed.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("nsc") => trimmed[3..].trim_start_matches(['-', ' ']),
            _ => trimmed,
        };
        let number = match number.split_once('.') {
            Some((int, frac))
                if !int.is_empty()
                    && int.bytes().all(|b| b.is_ascii_digit())
                    && !frac.is_empty()
                    && frac.bytes().all(|b| b == b'0') =>
            {
                int
            }
            _ => number,
        };
        format!("NSC{}", number)
    }
}

impl fmt::Display for NscId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NscId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for NscId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// # Field Lookup Outcome
///
/// A single result field: either a value PubChem returned, or nothing.
/// Keeping this apart from the field's own type means a real value can never
/// be mistaken for the "Not Found" marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// PubChem returned a value.
    Found(T),
    /// No value: missing data, empty list or a failed request.
    NotFound,
}

impl<T> Lookup<T> {
    /// True for `Found`.
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Lookup::Found(v),
            None => Lookup::NotFound,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Lookup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Found(v) => v.fmt(f),
            Lookup::NotFound => f.write_str(NOT_FOUND),
        }
    }
}

/// # Result Record
///
/// Everything learned about one identifier. Exactly one is produced per input
/// identifier, whatever happened on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    /// The identifier as given in the input.
    pub nsc_id: NscId,
    /// Substance ID of the newest substance record.
    pub sid: Lookup<u64>,
    /// Version of that substance record.
    pub version: Lookup<i64>,
    /// First compound ID PubChem associates with the identifier.
    pub cid: Lookup<u64>,
    /// The substance's synonyms joined with `", "`.
    pub synonyms: Lookup<String>,
}

impl ResultRecord {
    /// The record for an identifier nothing could be learned about.
    pub fn not_found(nsc_id: NscId) -> Self {
        Self {
            nsc_id,
            sid: Lookup::NotFound,
            version: Lookup::NotFound,
            cid: Lookup::NotFound,
            synonyms: Lookup::NotFound,
        }
    }

    /// True when every field resolved.
    pub fn is_complete(&self) -> bool {
        self.sid.is_found() && self.version.is_found() && self.cid.is_found() && self.synonyms.is_found()
    }
}

/// Body of `substance/name/{name}/JSON`.
#[derive(Debug, Deserialize, Default)]
pub struct SubstanceResponse {
    /// Every substance record registered under the name. Entries that do not
    /// fit [`Substance`] are dropped without affecting their neighbours.
    #[serde(rename = "PC_Substances", default, deserialize_with = "skip_malformed_entries")]
    pub substances: Vec<Substance>,
}

fn skip_malformed_entries<'de, D>(deserializer: D) -> Result<Vec<Substance>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Substance>(entry) {
            Ok(substance) => Some(substance),
            Err(e) => {
                log::debug!("Skipping malformed substance entry {}: {}", index, e);
                None
            }
        })
        .collect())
}

/// One entry of `PC_Substances`.
#[derive(Debug, Deserialize, Clone)]
pub struct Substance {
    /// Either `{"id": N, "version": V}` (PubChem's shape) or a bare `N`.
    #[serde(default)]
    pub sid: Option<SidField>,
    /// A flat version next to a bare `sid`.
    #[serde(default)]
    pub version: Option<i64>,
    /// Normally an array of strings; anything else counts as absent.
    #[serde(default)]
    pub synonyms: Option<serde_json::Value>,
}

/// The two shapes `sid` comes in.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum SidField {
    /// `{"id": 12345, "version": 2}`
    Keyed {
        /// The substance ID.
        id: u64,
        /// The record version.
        #[serde(default)]
        version: Option<i64>,
    },
    /// `12345`
    Plain(u64),
}

impl Substance {
    /// The substance ID, whichever shape it came in.
    pub fn substance_id(&self) -> Option<u64> {
        match self.sid {
            Some(SidField::Keyed { id, .. }) | Some(SidField::Plain(id)) => Some(id),
            None => None,
        }
    }

    /// The declared version: a top-level `version` first, then the one nested in `sid`.
    pub fn declared_version(&self) -> Option<i64> {
        self.version.or(match self.sid {
            Some(SidField::Keyed { version, .. }) => version,
            _ => None,
        })
    }

    /// Synonyms joined with `", "`. `None` when the field is absent or not a list.
    ///
    /// Non-string list items are written in their JSON form.
    pub fn joined_synonyms(&self) -> Option<String> {
        let items = self.synonyms.as_ref()?.as_array()?;
        let parts: Vec<String> = items
            .iter()
            .map(|item| match item.as_str() {
                Some(s) => s.to_string(),
                None => item.to_string(),
            })
            .collect();
        Some(parts.join(", "))
    }
}

/// Picks the substance with the highest version, counting a missing version
/// as 0. Among equal versions the earliest entry wins.
pub fn newest_substance(substances: &[Substance]) -> Option<&Substance> {
    substances.iter().reduce(|best, candidate| {
        if candidate.declared_version().unwrap_or(0) > best.declared_version().unwrap_or(0) {
            candidate
        } else {
            best
        }
    })
}

/// Body of `compound/name/{name}/cids/JSON`.
#[derive(Debug, Deserialize, Default)]
pub struct CidResponse {
    /// The identifier list wrapper.
    #[serde(rename = "IdentifierList", default)]
    pub identifier_list: IdentifierList,
}

/// `{"CID": [...]}`
#[derive(Debug, Deserialize, Default)]
pub struct IdentifierList {
    /// Candidate compound IDs, best match first.
    #[serde(rename = "CID", default)]
    pub cid: Vec<u64>,
}
