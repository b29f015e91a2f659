//! Response maps and response unions per operation.
//!
//! Both are rebuilt from [`OperationMetadata`] for every operation and carry
//! no state between operations.

use std::fmt;

use crate::analysis::{OperationMetadata, StatusKey};

/// Which schema variant a type refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flavor {
    /// Tolerates unknown object fields; used by clients.
    Loose,
    /// Rejects unknown object fields; used by servers.
    Strict,
}

impl Flavor {
    pub const ALL: [Flavor; 2] = [Flavor::Loose, Flavor::Strict];

    pub fn is_strict(&self) -> bool {
        matches!(self, Flavor::Strict)
    }
}

/// One status of a response map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMapEntry {
    pub status: StatusKey,
    /// `(content type, identifier)` in declaration order.
    pub content_types: Vec<(String, String)>,
}

/// status → content type → identifier, for statuses that have schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMap {
    pub flavor: Flavor,
    pub entries: Vec<ResponseMapEntry>,
}

impl ResponseMap {
    pub fn get(&self, status: StatusKey, content_type: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.status == status)?
            .content_types
            .iter()
            .find(|(ct, _)| ct == content_type)
            .map(|(_, id)| id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every identifier the map mentions, in map order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|e| e.content_types.iter().map(|(_, id)| id.as_str()))
    }
}

/// A member of an operation's response union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnionMember {
    /// A status/content type pair with a schema.
    Success {
        status: StatusKey,
        content_type: String,
        type_name: String,
    },
    /// A status without any schema; the body is passed through untouched.
    Void { status: StatusKey },
    /// The shared failure member.
    Error,
}

impl fmt::Display for UnionMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnionMember::Success {
                status, type_name, ..
            } => write!(f, "SuccessWith{type_name}@{status}"),
            UnionMember::Void { status } => write!(f, "Void@{status}"),
            UnionMember::Error => f.write_str("Error"),
        }
    }
}

/// Ordered union members, always ending in exactly one [`UnionMember::Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseUnion {
    pub members: Vec<UnionMember>,
}

impl ResponseUnion {
    pub fn successes(&self) -> impl Iterator<Item = &UnionMember> {
        self.members
            .iter()
            .filter(|m| matches!(m, UnionMember::Success { .. }))
    }

    pub fn voids(&self) -> impl Iterator<Item = &UnionMember> {
        self.members
            .iter()
            .filter(|m| matches!(m, UnionMember::Void { .. }))
    }
}

impl fmt::Display for ResponseUnion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{member}")?;
        }
        Ok(())
    }
}

/// Response map plus union for one operation and flavor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseModel {
    pub flavor: Flavor,
    /// Name of the emitted response map type.
    pub map_type_name: String,
    pub response_map: ResponseMap,
    pub union: ResponseUnion,
    /// Statuses that must pick a content type from the runtime header.
    pub runtime_dispatch: Vec<StatusKey>,
}

pub fn build_response_map(op: &OperationMetadata, flavor: Flavor) -> ResponseModel {
    let mut entries = Vec::new();
    let mut members = Vec::new();
    let mut runtime_dispatch = Vec::new();

    for info in &op.responses.responses {
        if info.parsing_strategy.requires_runtime_content_type_check {
            runtime_dispatch.push(info.status);
        }

        let typed: Vec<(String, String)> = info
            .schema_content_types()
            .filter_map(|m| {
                m.schema
                    .as_ref()
                    .map(|s| (m.content_type.clone(), s.identifier(flavor)))
            })
            .collect();

        if typed.is_empty() {
            members.push(UnionMember::Void {
                status: info.status,
            });
            continue;
        }

        for (content_type, type_name) in &typed {
            members.push(UnionMember::Success {
                status: info.status,
                content_type: content_type.clone(),
                type_name: type_name.clone(),
            });
        }
        entries.push(ResponseMapEntry {
            status: info.status,
            content_types: typed,
        });
    }
    members.push(UnionMember::Error);

    ResponseModel {
        flavor,
        map_type_name: match flavor {
            Flavor::Loose => op.names.response_map(),
            Flavor::Strict => op.names.response_map_strict(),
        },
        response_map: ResponseMap { flavor, entries },
        union: ResponseUnion { members },
        runtime_dispatch,
    }
}
