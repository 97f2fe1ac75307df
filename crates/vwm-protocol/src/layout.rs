//! Argument-layout compiler.
//!
//! A message's arguments are partitioned into an alternating sequence of value
//! blocks and variable elements. The resulting [`LayoutPlan`] is pure data: the
//! decoder and the encoder walk the same plan, so both directions agree on
//! every byte offset by construction.

use std::mem;

use crate::kind::{ArgKind, ArgSpec};

/// Which word of an argument a block slot carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPart {
    /// The argument's own 32-bit value.
    Value,
    /// The version word that follows a generic new-id's interface name.
    GenericVersion,
    /// The allocated id that completes a generic new-id.
    GenericId,
}

/// One 32-bit word inside a value block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Index of the declared argument this word belongs to.
    pub arg: usize,
    pub part: SlotPart,
}

/// Maximal run of fixed-size words transmitted contiguously.
///
/// Blocks may be empty; an empty block is a zero-byte read or write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueBlock {
    pub slots: Vec<Slot>,
}

impl ValueBlock {
    /// Encoded size in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.slots.len() * 4
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Shape of a self-describing element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    String,
    Array,
    /// The interface-name string that opens a generic new-id.
    GenericInterface,
}

/// A length-prefixed element whose size is only known at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableElement {
    pub arg: usize,
    pub kind: VariableKind,
}

/// One step of a layout plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Block(ValueBlock),
    Variable(VariableElement),
}

/// Compiled layout for one message.
///
/// Segments always begin and end with a block and strictly alternate between
/// blocks and variable elements. Descriptor arguments never appear in a
/// segment; they are listed separately in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPlan {
    segments: Vec<Segment>,
    fd_args: Vec<usize>,
    arity: usize,
}

impl LayoutPlan {
    /// Compiles the plan for an ordered argument list.
    #[must_use]
    pub fn compile(args: &[ArgSpec]) -> Self {
        let mut segments = Vec::new();
        let mut fd_args = Vec::new();
        let mut current = ValueBlock::default();

        for (index, spec) in args.iter().enumerate() {
            match spec.kind {
                ArgKind::Fd => fd_args.push(index),
                ArgKind::String => {
                    close_block(&mut segments, &mut current, index, VariableKind::String);
                }
                ArgKind::Array => {
                    close_block(&mut segments, &mut current, index, VariableKind::Array);
                }
                ArgKind::GenericNewId => {
                    close_block(
                        &mut segments,
                        &mut current,
                        index,
                        VariableKind::GenericInterface,
                    );
                    current.slots.push(Slot {
                        arg: index,
                        part: SlotPart::GenericVersion,
                    });
                    current.slots.push(Slot {
                        arg: index,
                        part: SlotPart::GenericId,
                    });
                }
                ArgKind::Uint | ArgKind::Int | ArgKind::Fixed | ArgKind::Object | ArgKind::NewId(_) => {
                    current.slots.push(Slot {
                        arg: index,
                        part: SlotPart::Value,
                    });
                }
            }
        }
        segments.push(Segment::Block(current));

        Self {
            segments,
            fd_args,
            arity: args.len(),
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Indices of descriptor arguments, in declaration order.
    #[must_use]
    pub fn fd_args(&self) -> &[usize] {
        &self.fd_args
    }

    /// Total bytes occupied by every value block.
    #[must_use]
    pub fn fixed_size(&self) -> usize {
        self.blocks().map(ValueBlock::byte_len).sum()
    }

    #[must_use]
    pub fn variable_count(&self) -> usize {
        self.variables().count()
    }

    /// Number of declared arguments, descriptors included.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.arity
    }

    pub fn blocks(&self) -> impl Iterator<Item = &ValueBlock> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Block(block) => Some(block),
            Segment::Variable(_) => None,
        })
    }

    pub fn variables(&self) -> impl Iterator<Item = &VariableElement> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Variable(element) => Some(element),
            Segment::Block(_) => None,
        })
    }
}

fn close_block(
    segments: &mut Vec<Segment>,
    current: &mut ValueBlock,
    arg: usize,
    kind: VariableKind,
) {
    segments.push(Segment::Block(mem::take(current)));
    segments.push(Segment::Variable(VariableElement { arg, kind }));
}
