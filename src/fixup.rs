//! Listing fixups for code the static listing cannot see.
//!
//! Some regions of the image are machine code that never existed as assembly
//! source: they are generated tables of instructions reached only through
//! indirect computed jumps, so the listing records them as inert data. Each
//! [`SyntheticRegion`] describes one such table declaratively; applying it
//! marks the slot entry points as branch targets and lifts the raw image
//! bytes back into instruction variants the segmenter will process.

use crate::listing::Listing;
use crate::{Address, Insn, TranslateError, ROM_SIZE};

/// A table of equal-size synthetic instruction slots at a named symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticRegion {
    /// Symbol naming the base of the region
    pub symbol: &'static str,
    /// Number of slots in the table
    pub slots: usize,
    /// Size of each slot in bytes
    pub slot_size: usize,
    /// Size of each synthetic instruction within a slot
    pub insn_len: usize,
}

impl SyntheticRegion {
    /// Apply this fixup to a listing.
    ///
    /// Every slot base becomes a branch target, and every instruction-sized
    /// step inside a slot is recorded as a variant holding the raw bytes read
    /// from the image. Applying the same region twice leaves the listing
    /// unchanged.
    pub fn apply(&self, listing: &mut Listing) -> Result<(), TranslateError> {
        let base = listing.symbol_address(self.symbol)? as usize;

        log::debug!(
            "fixup {}: {} slots of {} bytes at {:#06x}",
            self.symbol,
            self.slots,
            self.slot_size,
            base
        );

        for slot in 0..self.slots {
            let slot_base = base + slot * self.slot_size;
            let slot_end = slot_base + self.slot_size;
            if slot_end > ROM_SIZE {
                return Err(TranslateError::OutOfRange(slot_end - 1));
            }

            listing.add_branch_target(slot_base as Address);

            let mut at = slot_base;
            while at + self.insn_len <= slot_end {
                let raw = listing.rom_bytes(at as Address, self.insn_len)?.to_vec();
                let insn = Insn::from_bytes(at as Address, &raw)?;
                listing.patch_instructions(at as Address, vec![insn]);
                at += self.insn_len;
            }
        }

        Ok(())
    }
}

/// The stock fixup table.
///
/// The ROM palettes are generated machine code jumped to when a palette is
/// selected; the listing only knows them as data. Each palette is 16 bytes,
/// consisting of 8 two-byte opcodes.
pub fn builtin_fixups() -> Vec<SyntheticRegion> {
    vec![SyntheticRegion {
        symbol: "_rom_palettes",
        slots: 16,
        slot_size: 16,
        insn_len: 2,
    }]
}

/// Run a fixup table to completion, stopping at the first error.
///
/// Fixups must all land before segmentation; a failed table aborts the
/// translation rather than leaving a half-annotated listing in play.
pub fn apply_fixups(
    listing: &mut Listing,
    regions: &[SyntheticRegion],
) -> Result<(), TranslateError> {
    for region in regions {
        region.apply(listing)?;
    }
    Ok(())
}
