//! Contracts for the two external collaborators: the type repository and the
//! process state. Neither is implemented by this crate -- the minidump
//! parser, the ASan runtime, and the rest of the type system live elsewhere
//! and are reached only through these traits.

use crate::address::AddressRange;
use crate::id::TypeId;

/// Whether a record field carries ordinary data or a vtable pointer.
///
/// Vtable fields are skipped during destructuring: chasing them produces
/// hypotheses about compiler-generated tables, not about the objects the
/// analysis is trying to recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Data,
    VTable,
}

/// A single field of a record type, as found in a [`TypeShape::Record`]
/// returned by [`TypeRepository::get_type`].
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name, for diagnostics only.
    pub name: String,
    /// Byte offset of the field within the record.
    pub offset: u64,
    /// The field's declared type.
    pub type_id: TypeId,
    pub kind: FieldKind,
}

/// The structural kind of a type, as reported by [`TypeRepository::get_type`].
///
/// This is the dispatch point the destructurer switches on: every type is
/// exactly one of these four shapes.
#[derive(Debug, Clone)]
pub enum TypeShape {
    /// A type with no further structure to decompose (integers, floats,
    /// enums, ...).
    Scalar,
    /// A fixed-length run of `element` values.
    Array { element: TypeId, element_size: u64 },
    /// A user-defined type with named fields.
    Record { fields: Vec<FieldDescriptor> },
    /// A pointer to a `pointee`-typed value.
    Pointer { pointee: TypeId },
}

/// Capabilities the destructurer needs from the type system.
///
/// Implementations intern types and hand back opaque [`TypeId`]s; the core
/// never needs to know how a type is represented, only its [`TypeShape`] and
/// byte size.
pub trait TypeRepository {
    /// Looks up the structural shape of a type. `None` means the id is not
    /// known to the repository.
    fn get_type(&self, type_id: TypeId) -> Option<TypeShape>;

    /// The size in bytes of a fully materialised value of this type.
    fn size_of(&self, type_id: TypeId) -> Option<u64>;
}

/// Capabilities the destructurer needs from a snapshot of process memory.
pub trait ProcessState {
    /// Enumerates the typed blocks known at the top level (globals, stack
    /// locals, heap allocations tagged with a type by some other analysis
    /// pass). `None` means this process state exposes no typed-block layer
    /// at all, which is construction-fatal.
    fn typed_blocks(&self) -> Option<Vec<(AddressRange, TypeId)>>;

    /// Attempts to read `range` and reports how many of its bytes were
    /// actually obtained. A result equal to `range.size` means the range is
    /// fully readable.
    fn read_range(&self, range: AddressRange) -> u64;

    /// Reads the pointer-sized value stored at `range` and interprets it as
    /// an address, for pointer dereference. Returns `None` if `range` is not
    /// fully readable.
    fn read_pointer(&self, range: AddressRange) -> Option<u64>;
}
