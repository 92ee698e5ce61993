//! The constraints a plan records at construction and enforces on every
//! new-array execution.

use hertz_buffer::Buffer;
use hertz_common::{Result, error::Error};
use hertz_engine::{Allocator, Real};
use tinyvec::ArrayVec;

use crate::{
    family::{MAX_SLOTS, TransformFamily},
    shape::SlotLengths,
};

#[derive(Debug, Clone)]
pub(crate) struct Contract {
    family: TransformFamily,
    lengths: SlotLengths,
    /// Aliasing of every in-place pair of the family, in pair order.
    aliased: ArrayVec<[bool; 2]>,
    requires_alignment: bool,
    alignment_classes: ArrayVec<[usize; MAX_SLOTS]>,
    verify_alignment_class: bool,
}

impl Contract {
    pub(crate) fn record<T: Real>(
        family: TransformFamily,
        lengths: SlotLengths,
        buffers: &[&Buffer<T>],
        requires_alignment: bool,
        verify_alignment_class: bool,
        allocator: &dyn Allocator,
    ) -> Contract {
        let aliased = family
            .in_place_pairs()
            .iter()
            .map(|&(a, b)| buffers[a].as_ptr() == buffers[b].as_ptr())
            .collect();
        let alignment_classes = buffers
            .iter()
            .map(|buffer| allocator.alignment_of(buffer.as_ptr().cast()))
            .collect();
        Contract {
            family,
            lengths,
            aliased,
            requires_alignment,
            alignment_classes,
            verify_alignment_class,
        }
    }

    #[inline]
    pub(crate) fn lengths(&self) -> &SlotLengths {
        &self.lengths
    }

    /// `true` if the first input/output pair shares one buffer.
    #[inline]
    pub(crate) fn is_in_place(&self) -> bool {
        self.aliased.first().copied().unwrap_or(false)
    }

    #[inline]
    pub(crate) fn requires_alignment(&self) -> bool {
        self.requires_alignment
    }

    /// Validates substitute buffers: lengths, then topology, then alignment.
    pub(crate) fn check<T: Real>(
        &self,
        buffers: &[&Buffer<T>],
        allocator: &dyn Allocator,
    ) -> Result<()> {
        let names = self.family.slot_names();
        debug_assert_eq!(buffers.len(), names.len());

        for (slot, buffer) in buffers.iter().enumerate() {
            let min = self.lengths.as_slice()[slot];
            if buffer.len() < min {
                return Err(Error::invalid_arg(
                    names[slot],
                    format!("length {} is less than the required {min}", buffer.len()),
                ));
            }
        }

        for (&(a, b), &aliased) in self.family.in_place_pairs().iter().zip(&self.aliased) {
            let same = buffers[a].as_ptr() == buffers[b].as_ptr();
            if same != aliased {
                let expected = if aliased { "in place" } else { "out of place" };
                return Err(Error::invalid_operation(format!(
                    "{}: plan was created {expected}, {} and {} must {}share an address",
                    self.family.execute_method(),
                    names[a],
                    names[b],
                    if aliased { "" } else { "not " }
                )));
            }
        }

        if self.requires_alignment {
            for (slot, buffer) in buffers.iter().enumerate() {
                if !buffer.is_engine_allocated() {
                    return Err(Error::invalid_operation(format!(
                        "{}: {} is not engine-allocated and the plan requires alignment",
                        self.family.execute_method(),
                        names[slot]
                    )));
                }
                if self.verify_alignment_class {
                    let class = allocator.alignment_of(buffer.as_ptr().cast());
                    let expected = self.alignment_classes[slot];
                    if class != expected {
                        return Err(Error::invalid_operation(format!(
                            "{}: {} has alignment class {class}, the plan was created with {expected}",
                            self.family.execute_method(),
                            names[slot]
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
