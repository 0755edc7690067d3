//! The destructuring walk: turns one typed datum into graph fragments by
//! recursing over its structural shape.
//!
//! Every call creates (or finds) a `DeclaredType` hypothesis first; only a
//! *new* hypothesis is expanded further. Revisiting a `(range, type_id)`
//! pair already in the builder's catalogue -- the only way a cyclic pointer
//! graph can be revisited -- returns immediately, which is what terminates
//! the walk on cycles.

use crate::address::AddressRange;
use crate::builder::GraphBuilder;
use crate::factor::FactorKind;
use crate::hypothesis::HypothesisKind;
use crate::id::{HypothesisId, TypeId};
use crate::repository::{FieldKind, ProcessState, TypeRepository, TypeShape};

/// What destructuring a single typed datum produced: its declared-type
/// hypothesis always, and its content-type hypothesis if the underlying
/// memory was fully readable.
#[derive(Debug, Clone, Copy)]
pub struct DestructureOutput {
    pub declared: HypothesisId,
    pub content: Option<HypothesisId>,
}

/// Weight-table policy for this uncalibrated prototype: assignments where
/// every neighbour agrees (all false or all true) get weight `2.0`; every
/// other assignment gets `1.0`. This is a placeholder -- real weights come
/// from calibration against known-good programs -- chosen over an all-zero
/// table because it gives the engine a direction to converge toward instead
/// of a degenerate potential.
fn agreement_weights(degree: usize) -> Vec<f64> {
    let len = 1usize << degree;
    (0..len)
        .map(|index| if index == 0 || index == len - 1 { 2.0 } else { 1.0 })
        .collect()
}

/// Destructures the datum at `range` of type `type_id`, recursing into its
/// structure and recording every hypothesis and factor the walk visits.
pub fn destructure(
    builder: &mut GraphBuilder,
    types: &dyn TypeRepository,
    process: &dyn ProcessState,
    range: AddressRange,
    type_id: TypeId,
) -> DestructureOutput {
    let (declared, is_new) = builder.add_hypothesis(HypothesisKind::DeclaredType, range, type_id);
    if !is_new {
        let content = builder.lookup_hypothesis(HypothesisKind::ContentType, range, type_id);
        return DestructureOutput { declared, content };
    }

    let content = if process.read_range(range) == range.size {
        let (content, _) = builder.add_hypothesis(HypothesisKind::ContentType, range, type_id);
        builder
            .add_factor(
                FactorKind::DeclarationContent,
                &[declared, content],
                agreement_weights(2),
            )
            .expect("declaration-content factor is always degree 2");
        Some(content)
    } else {
        None
    };

    if let Some(shape) = types.get_type(type_id) {
        match shape {
            TypeShape::Scalar => {}
            TypeShape::Array {
                element,
                element_size,
            } => destructure_array(builder, types, process, range, element, element_size, declared, content),
            TypeShape::Record { fields } => {
                destructure_record(builder, types, process, range, &fields, declared, content)
            }
            TypeShape::Pointer { pointee } => {
                destructure_pointer(builder, types, process, range, pointee, declared, content)
            }
        }
    }

    DestructureOutput { declared, content }
}

fn destructure_array(
    builder: &mut GraphBuilder,
    types: &dyn TypeRepository,
    process: &dyn ProcessState,
    range: AddressRange,
    element: TypeId,
    element_size: u64,
    declared: HypothesisId,
    content: Option<HypothesisId>,
) {
    if element_size == 0 || range.size % element_size != 0 {
        // Non-exact remainder: the layout doesn't actually describe an
        // array of this element size. Leave the declared/content
        // hypotheses for the whole range in place but don't decompose.
        return;
    }
    let count = range.size / element_size;
    for index in 0..count {
        let child_range = range.array_element(index, element_size);
        let child = destructure(builder, types, process, child_range, element);
        link_decomposition(builder, declared, content, child);
    }
}

fn destructure_record(
    builder: &mut GraphBuilder,
    types: &dyn TypeRepository,
    process: &dyn ProcessState,
    range: AddressRange,
    fields: &[crate::repository::FieldDescriptor],
    declared: HypothesisId,
    content: Option<HypothesisId>,
) {
    for field in fields {
        if field.kind == FieldKind::VTable {
            continue;
        }
        let Some(field_size) = types.size_of(field.type_id) else {
            continue;
        };
        let field_range = range.field(field.offset, field_size);
        let child = destructure(builder, types, process, field_range, field.type_id);
        link_decomposition(builder, declared, content, child);
    }
}

fn destructure_pointer(
    builder: &mut GraphBuilder,
    types: &dyn TypeRepository,
    process: &dyn ProcessState,
    range: AddressRange,
    pointee: TypeId,
    declared: HypothesisId,
    content: Option<HypothesisId>,
) {
    let Some(target_addr) = process.read_pointer(range) else {
        return;
    };
    let Some(target_size) = types.size_of(pointee) else {
        return;
    };
    let target_range = AddressRange::new(target_addr, target_size);
    let target = destructure(builder, types, process, target_range, pointee);

    // The pointer factor needs all three neighbours; without a content
    // hypothesis for the pointer's own range (unreadable memory) there's
    // nothing meaningful to link.
    if let Some(content) = content {
        builder
            .add_factor(
                FactorKind::Pointer,
                &[declared, content, target.declared],
                agreement_weights(3),
            )
            .expect("pointer factor is always degree 3");
    }
}

fn link_decomposition(
    builder: &mut GraphBuilder,
    parent_declared: HypothesisId,
    parent_content: Option<HypothesisId>,
    child: DestructureOutput,
) {
    builder
        .add_factor(
            FactorKind::Decomposition,
            &[parent_declared, child.declared],
            agreement_weights(2),
        )
        .expect("decomposition factor is always degree 2");
    if let (Some(parent_content), Some(child_content)) = (parent_content, child.content) {
        builder
            .add_factor(
                FactorKind::Decomposition,
                &[parent_content, child_content],
                agreement_weights(2),
            )
            .expect("decomposition factor is always degree 2");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::FieldDescriptor;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeTypes {
        shapes: HashMap<TypeId, TypeShape>,
        sizes: HashMap<TypeId, u64>,
    }

    impl TypeRepository for FakeTypes {
        fn get_type(&self, type_id: TypeId) -> Option<TypeShape> {
            self.shapes.get(&type_id).cloned()
        }
        fn size_of(&self, type_id: TypeId) -> Option<u64> {
            self.sizes.get(&type_id).copied()
        }
    }

    struct FakeProcess {
        /// Readable `(start, size)` intervals. `read_range` sums however
        /// much of the queried range each interval covers, rather than
        /// keying on `range.start` alone -- two ranges at different
        /// addresses and sizes must not collide on the same coverage entry.
        readable: RefCell<Vec<(u64, u64)>>,
        pointers: HashMap<u64, u64>,
    }

    impl ProcessState for FakeProcess {
        fn typed_blocks(&self) -> Option<Vec<(AddressRange, TypeId)>> {
            None
        }
        fn read_range(&self, range: AddressRange) -> u64 {
            let mut covered = 0u64;
            for &(start, size) in self.readable.borrow().iter() {
                let lo = range.start.max(start);
                let hi = range.end().min(start + size);
                if hi > lo {
                    covered += hi - lo;
                }
            }
            covered.min(range.size)
        }
        fn read_pointer(&self, range: AddressRange) -> Option<u64> {
            self.pointers.get(&range.start).copied()
        }
    }

    const INT: TypeId = TypeId(1);
    const ARRAY: TypeId = TypeId(2);
    const RECORD: TypeId = TypeId(3);
    const PTR: TypeId = TypeId(4);

    #[test]
    fn scalar_fully_readable_gets_declaration_content_factor() {
        let types = FakeTypes {
            shapes: HashMap::from([(INT, TypeShape::Scalar)]),
            sizes: HashMap::from([(INT, 4)]),
        };
        let range = AddressRange::new(0x1000, 4);
        let process = FakeProcess {
            readable: RefCell::new(vec![(0x1000, 4)]),
            pointers: HashMap::new(),
        };
        let mut builder = GraphBuilder::new();
        let out = destructure(&mut builder, &types, &process, range, INT);

        assert!(out.content.is_some());
        assert_eq!(builder.graph().hypothesis_count(), 2);
        assert_eq!(builder.graph().factor_count(), 1);
    }

    #[test]
    fn partially_readable_scalar_gets_no_content_hypothesis() {
        let types = FakeTypes {
            shapes: HashMap::from([(INT, TypeShape::Scalar)]),
            sizes: HashMap::from([(INT, 4)]),
        };
        let range = AddressRange::new(0x1000, 4);
        let process = FakeProcess {
            readable: RefCell::new(vec![(0x1000, 2)]),
            pointers: HashMap::new(),
        };
        let mut builder = GraphBuilder::new();
        let out = destructure(&mut builder, &types, &process, range, INT);

        assert!(out.content.is_none());
        assert_eq!(builder.graph().hypothesis_count(), 1);
        assert_eq!(builder.graph().factor_count(), 0);
    }

    #[test]
    fn array_of_two_elements_gets_two_decomposition_factors() {
        let types = FakeTypes {
            shapes: HashMap::from([
                (
                    ARRAY,
                    TypeShape::Array {
                        element: INT,
                        element_size: 4,
                    },
                ),
                (INT, TypeShape::Scalar),
            ]),
            sizes: HashMap::from([(INT, 4), (ARRAY, 8)]),
        };
        let range = AddressRange::new(0x1000, 8);
        let process = FakeProcess {
            // One interval covering the whole array covers both elements
            // too; no need to list per-element coverage separately.
            readable: RefCell::new(vec![(0x1000, 8)]),
            pointers: HashMap::new(),
        };
        let mut builder = GraphBuilder::new();
        let out = destructure(&mut builder, &types, &process, range, ARRAY);

        assert!(out.content.is_some());
        // parent declared+content, two element declared+content = 6 hypotheses.
        assert_eq!(builder.graph().hypothesis_count(), 6);
        // 1 parent DeclarationContent + 2 element DeclarationContent
        // + 2 declared-side Decomposition + 2 content-side Decomposition = 7.
        assert_eq!(builder.graph().factor_count(), 7);
    }

    #[test]
    fn cyclic_self_pointer_terminates_with_one_declared_hypothesis() {
        let types = FakeTypes {
            shapes: HashMap::from([
                (
                    RECORD,
                    TypeShape::Record {
                        fields: vec![FieldDescriptor {
                            name: "next".into(),
                            offset: 0,
                            type_id: PTR,
                            kind: FieldKind::Data,
                        }],
                    },
                ),
                (PTR, TypeShape::Pointer { pointee: RECORD }),
            ]),
            sizes: HashMap::from([(PTR, 8), (RECORD, 8)]),
        };
        let range = AddressRange::new(0x2000, 8);
        let process = FakeProcess {
            readable: RefCell::new(vec![(0x2000, 8)]),
            pointers: HashMap::from([(0x2000, 0x2000)]),
        };
        let mut builder = GraphBuilder::new();
        let out = destructure(&mut builder, &types, &process, range, RECORD);

        let declared_count = builder
            .graph()
            .hypothesis_ids()
            .filter(|&id| builder.graph().hypothesis(id).kind() == HypothesisKind::DeclaredType)
            .count();
        assert_eq!(declared_count, 1);
        assert_eq!(
            builder.graph().factor(
                builder
                    .graph()
                    .factor_ids()
                    .find(|&f| builder.graph().factor(f).kind() == FactorKind::Pointer)
                    .unwrap()
            ).neighbours()[2],
            out.declared
        );
    }

    #[test]
    fn unreadable_array_is_not_decomposed() {
        let types = FakeTypes {
            shapes: HashMap::from([(
                ARRAY,
                TypeShape::Array {
                    element: INT,
                    element_size: 4,
                },
            )]),
            sizes: HashMap::from([(INT, 4)]),
        };
        let range = AddressRange::new(0x3000, 8);
        let process = FakeProcess {
            readable: RefCell::new(vec![]),
            pointers: HashMap::new(),
        };
        let mut builder = GraphBuilder::new();
        let out = destructure(&mut builder, &types, &process, range, ARRAY);

        assert!(out.content.is_none());
        assert_eq!(builder.graph().hypothesis_count(), 1);
    }
}
