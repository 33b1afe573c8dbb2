//! Column role inference for header-ambiguous connection logs.
//!
//! Given a rectangular table of raw cells (no header assumed) and an
//! optional header row, assigns each column a semantic role by sampling
//! value shapes. A column wins a role when at least [`MATCH_THRESHOLD`]
//! of its sampled values match that role's predicate, checked in the
//! fixed specificity order of [`predicates::SHAPE_CHECKS`].

pub mod predicates;

use std::collections::HashMap;

use crate::error::{ConvertError, ConvertResult};
pub use predicates::ValueShape;

/// Values sampled per column during shape detection.
pub const DETECTION_SAMPLE_SIZE: usize = 20;
/// Fraction of sampled values that must match a shape predicate.
pub const MATCH_THRESHOLD: f32 = 0.8;

/// Semantic role of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Date,
    Time,
    Action,
    Process,
    Protocol,
    LocalAddr,
    RemoteAddr,
    Unknown,
}

impl ColumnRole {
    /// Roles without which positional mapping is unusable.
    pub const MANDATORY: [ColumnRole; 4] = [
        ColumnRole::Action,
        ColumnRole::Protocol,
        ColumnRole::LocalAddr,
        ColumnRole::RemoteAddr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Date => "Date",
            ColumnRole::Time => "Time",
            ColumnRole::Action => "Action",
            ColumnRole::Process => "Process",
            ColumnRole::Protocol => "Protocol",
            ColumnRole::LocalAddr => "LocalAddr",
            ColumnRole::RemoteAddr => "RemoteAddr",
            ColumnRole::Unknown => "Unknown",
        }
    }

    /// Match a header cell against the recognized role names.
    /// Case-sensitive: header text must name the role exactly.
    pub fn from_header(name: &str) -> Option<ColumnRole> {
        match name {
            "Date" => Some(ColumnRole::Date),
            "Time" => Some(ColumnRole::Time),
            "Action" => Some(ColumnRole::Action),
            "Process" => Some(ColumnRole::Process),
            "Protocol" => Some(ColumnRole::Protocol),
            "LocalAddr" => Some(ColumnRole::LocalAddr),
            "RemoteAddr" => Some(ColumnRole::RemoteAddr),
            _ => None,
        }
    }
}

impl ValueShape {
    /// The role a column of this shape maps to. Address columns are
    /// positional and resolve to LocalAddr/RemoteAddr later.
    fn role(self) -> ColumnRole {
        match self {
            ValueShape::Protocol => ColumnRole::Protocol,
            ValueShape::Action => ColumnRole::Action,
            ValueShape::Date => ColumnRole::Date,
            ValueShape::Time => ColumnRole::Time,
            ValueShape::Process => ColumnRole::Process,
            ValueShape::Address => ColumnRole::Unknown,
        }
    }
}

/// Mapping from column role to column index.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    roles: HashMap<ColumnRole, usize>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a role to a column. A later assignment for the same role
    /// overwrites the earlier one.
    pub fn insert(&mut self, role: ColumnRole, index: usize) {
        self.roles.insert(role, index);
    }

    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        self.roles.get(&role).copied()
    }

    pub fn contains(&self, role: ColumnRole) -> bool {
        self.roles.contains_key(&role)
    }

    pub fn missing_mandatory(&self) -> Vec<ColumnRole> {
        ColumnRole::MANDATORY
            .iter()
            .copied()
            .filter(|role| !self.contains(*role))
            .collect()
    }
}

/// Detect the shape of one column from its values.
///
/// Samples up to [`DETECTION_SAMPLE_SIZE`] non-blank values and returns
/// the first shape (in specificity order) matched by at least
/// [`MATCH_THRESHOLD`] of them, or `None` when no shape qualifies.
pub fn detect_column_shape(values: &[String]) -> Option<ValueShape> {
    let samples: Vec<&str> = values
        .iter()
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .take(DETECTION_SAMPLE_SIZE)
        .collect();
    if samples.is_empty() {
        return None;
    }

    let total = samples.len() as f32;
    let counts: Vec<(ValueShape, usize)> = predicates::SHAPE_CHECKS
        .iter()
        .map(|(shape, check)| (*shape, samples.iter().filter(|v| check(v)).count()))
        .collect();
    tracing::debug!(?counts, samples = samples.len(), "column shape counts");

    counts
        .into_iter()
        .find(|(_, matches)| *matches as f32 / total >= MATCH_THRESHOLD)
        .map(|(shape, _)| shape)
}

/// Infer the role of every column from cell contents.
///
/// Column width is taken from the first data row; shorter rows are
/// padded with empty cells. When content inference leaves mandatory
/// roles unresolved and header names are available, header text is
/// matched against role names directly before giving up.
pub fn infer_columns(
    data_rows: &[Vec<String>],
    headers: Option<&[String]>,
) -> ConvertResult<ColumnMap> {
    if data_rows.is_empty() {
        return Err(ConvertError::Classification {
            missing: ColumnRole::MANDATORY.to_vec(),
            columns: 0,
        });
    }

    let num_cols = data_rows[0].len();
    tracing::debug!(columns = num_cols, "auto-detecting column roles");

    let mut map = ColumnMap::new();
    let mut address_cols: Vec<usize> = Vec::new();

    for col in 0..num_cols {
        let values: Vec<String> = data_rows
            .iter()
            .map(|row| row.get(col).cloned().unwrap_or_default())
            .collect();
        let shape = detect_column_shape(&values);
        let header = headers.and_then(|h| h.get(col)).map(String::as_str);
        tracing::debug!(
            column = col,
            header = header.unwrap_or(""),
            role = shape.map(ValueShape::role).unwrap_or(ColumnRole::Unknown).as_str(),
            "column classified"
        );
        match shape {
            Some(ValueShape::Address) => address_cols.push(col),
            Some(other) => map.insert(other.role(), col),
            None => {}
        }
    }

    // Address columns are positional: first local, second remote. Extra
    // address columns are ignored.
    if address_cols.len() >= 2 {
        map.insert(ColumnRole::LocalAddr, address_cols[0]);
        map.insert(ColumnRole::RemoteAddr, address_cols[1]);
        tracing::debug!(
            local = address_cols[0],
            remote = address_cols[1],
            "assigned address columns"
        );
    } else if address_cols.len() == 1 {
        tracing::warn!("only one address-shaped column found, expected two");
    }

    let missing = map.missing_mandatory();
    if !missing.is_empty() {
        tracing::debug!(?missing, "mandatory roles unresolved, trying header names");
        if let Some(headers) = headers {
            for (idx, header) in headers.iter().enumerate() {
                let name = header.trim();
                if name.is_empty() {
                    continue;
                }
                if let Some(role) = ColumnRole::from_header(name) {
                    if ColumnRole::MANDATORY.contains(&role) && !map.contains(role) {
                        map.insert(role, idx);
                        tracing::debug!(role = role.as_str(), column = idx, "resolved from header name");
                    }
                }
            }
        }
    }

    let missing = map.missing_mandatory();
    if !missing.is_empty() {
        return Err(ConvertError::Classification {
            missing,
            columns: num_cols,
        });
    }

    tracing::debug!(?map, "final column mapping");
    Ok(map)
}
