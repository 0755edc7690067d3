//! JSON fixture format and the in-memory `TypeRepository`/`ProcessState`
//! pair it loads into.
//!
//! `memprobe-core` deliberately has no concrete implementation of either
//! trait -- the real ones live in the minidump parser and type database this
//! repository doesn't own. This module is this crate's stand-in: a small,
//! `HashMap`-backed store built straight from a deserialized fixture file,
//! so `memprobe analyze` has something runnable to point at.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use memprobe_core::{AddressRange, FieldDescriptor, FieldKind, ProcessState, TypeId, TypeRepository, TypeShape};

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read fixture file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixture file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
struct FieldSpec {
    name: String,
    offset: u64,
    type_id: u64,
    #[serde(default)]
    kind: FieldKindSpec,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
enum FieldKindSpec {
    #[default]
    Data,
    Vtable,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TypeSpec {
    Scalar { size: u64 },
    Array { element: u64, element_size: u64, size: u64 },
    Record { size: u64, fields: Vec<FieldSpec> },
    Pointer { pointee: u64, size: u64 },
}

impl TypeSpec {
    fn size(&self) -> u64 {
        match self {
            TypeSpec::Scalar { size }
            | TypeSpec::Array { size, .. }
            | TypeSpec::Record { size, .. }
            | TypeSpec::Pointer { size, .. } => *size,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BlockSpec {
    start: u64,
    size: u64,
    type_id: u64,
}

#[derive(Debug, Deserialize)]
struct RangeSpec {
    start: u64,
    size: u64,
}

/// The on-disk shape of a fixture: a small type database, the set of
/// top-level typed blocks a "process state" reports, which byte ranges are
/// readable, and what pointer-sized values live at which addresses.
#[derive(Debug, Deserialize)]
pub struct FixtureFile {
    #[serde(default)]
    types: HashMap<u64, TypeSpec>,
    #[serde(default)]
    blocks: Vec<BlockSpec>,
    #[serde(default)]
    readable: Vec<RangeSpec>,
    #[serde(default)]
    pointers: HashMap<u64, u64>,
    /// Models a process state that exposes no typed-block layer at all
    /// (distinct from one that exposes an empty layer), to exercise
    /// [`memprobe_core::CoreError::NoTypedBlockLayer`] from the CLI.
    #[serde(default = "default_true")]
    has_typed_block_layer: bool,
}

fn default_true() -> bool {
    true
}

pub fn load(path: &Path) -> Result<FixtureFile, FixtureError> {
    let text = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| FixtureError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// In-memory [`TypeRepository`] built from a [`FixtureFile`]'s `types` table.
pub struct FixtureTypes {
    types: HashMap<u64, TypeSpec>,
}

impl TypeRepository for FixtureTypes {
    fn get_type(&self, type_id: TypeId) -> Option<TypeShape> {
        self.types.get(&type_id.0).map(|spec| match spec {
            TypeSpec::Scalar { .. } => TypeShape::Scalar,
            TypeSpec::Array {
                element,
                element_size,
                ..
            } => TypeShape::Array {
                element: TypeId(*element),
                element_size: *element_size,
            },
            TypeSpec::Record { fields, .. } => TypeShape::Record {
                fields: fields
                    .iter()
                    .map(|f| FieldDescriptor {
                        name: f.name.clone(),
                        offset: f.offset,
                        type_id: TypeId(f.type_id),
                        kind: match f.kind {
                            FieldKindSpec::Data => FieldKind::Data,
                            FieldKindSpec::Vtable => FieldKind::VTable,
                        },
                    })
                    .collect(),
            },
            TypeSpec::Pointer { pointee, .. } => TypeShape::Pointer {
                pointee: TypeId(*pointee),
            },
        })
    }

    fn size_of(&self, type_id: TypeId) -> Option<u64> {
        self.types.get(&type_id.0).map(TypeSpec::size)
    }
}

/// In-memory [`ProcessState`] built from a [`FixtureFile`]'s `blocks`,
/// `readable`, and `pointers` tables.
pub struct FixtureProcess {
    blocks: Vec<(AddressRange, TypeId)>,
    readable: Vec<(u64, u64)>,
    pointers: HashMap<u64, u64>,
    has_typed_block_layer: bool,
}

impl ProcessState for FixtureProcess {
    fn typed_blocks(&self) -> Option<Vec<(AddressRange, TypeId)>> {
        self.has_typed_block_layer.then(|| self.blocks.clone())
    }

    fn read_range(&self, range: AddressRange) -> u64 {
        let mut covered = 0u64;
        for &(start, size) in &self.readable {
            let lo = range.start.max(start);
            let hi = range.end().min(start + size);
            if hi > lo {
                covered += hi - lo;
            }
        }
        covered.min(range.size)
    }

    fn read_pointer(&self, range: AddressRange) -> Option<u64> {
        if self.read_range(range) != range.size {
            return None;
        }
        self.pointers.get(&range.start).copied()
    }
}

/// Splits a loaded fixture into the `TypeRepository`/`ProcessState` pair
/// `memprobe_core::run_analysis` expects.
pub fn into_repository(fixture: FixtureFile) -> (FixtureTypes, FixtureProcess) {
    let types = FixtureTypes {
        types: fixture.types,
    };
    let process = FixtureProcess {
        blocks: fixture
            .blocks
            .into_iter()
            .map(|b| (AddressRange::new(b.start, b.size), TypeId(b.type_id)))
            .collect(),
        readable: fixture.readable.into_iter().map(|r| (r.start, r.size)).collect(),
        pointers: fixture.pointers,
        has_typed_block_layer: fixture.has_typed_block_layer,
    };
    (types, process)
}
