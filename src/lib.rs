//! Core IR, metadata model, and pipeline dispatch for the sbt51 static
//! binary translator.
//!
//! This library turns a 16 KB 8051 firmware image, together with listing
//! metadata derived outside the translator (instruction starts, branch
//! targets, symbols), into translated basic-block routines plus a complete
//! dispatch table covering every address in the image. The emitted routines
//! reference the opcode execution layer's handlers by name; any address that
//! does not begin a translated block dispatches to a shared trap routine.
//!
//! # Basic Usage
//!
//! ```rust
//! use sbt51::{listing::Listing, translate, Insn};
//!
//! // A tiny image: clr A / mov P0, A / ret.
//! let mut listing = Listing::new();
//! listing.load_rom(0, &[0xe4, 0xf5, 0x80, 0x22]).unwrap();
//! listing.record_instruction(Insn::from_bytes(0x0000, &[0xe4]).unwrap()).unwrap();
//! listing.record_instruction(Insn::from_bytes(0x0001, &[0xf5, 0x80]).unwrap()).unwrap();
//! listing.record_instruction(Insn::from_bytes(0x0003, &[0x22]).unwrap()).unwrap();
//! listing.add_branch_target(0x0000);
//!
//! let artifact = translate(&mut listing, &[]).unwrap();
//!
//! // The ret closes the only block; everything else traps.
//! assert_eq!(artifact.routines.len(), 1);
//! assert_eq!(artifact.routines[0].calls.len(), 3);
//! ```

pub mod listing;
pub mod fixup;
pub mod opcode;
pub mod segment;
pub mod emit;
pub mod format;

use rayon::prelude::*;

use crate::emit::Translation;
use crate::fixup::SyntheticRegion;
use crate::listing::Listing;
use crate::opcode::OpcodeTable;

/// An address in the code space.
pub type Address = u16;

/// Size of the translated code image in bytes.
pub const ROM_SIZE: usize = 16 * 1024;

/// Mask applied to program-counter arithmetic.
pub const PC_MASK: Address = (ROM_SIZE - 1) as Address;

/// Maximum instruction encoding size in bytes.
pub const MAX_INSTRUCTION_SIZE: usize = 3;

use std::fmt;

/// One recorded instruction variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insn {
    /// Address of the instruction
    pub addr: Address,
    /// Size of the instruction in bytes (1 to 3)
    pub size: u8,
    /// Raw bytes of the instruction, zero-padded to MAX_INSTRUCTION_SIZE
    pub bytes: [u8; MAX_INSTRUCTION_SIZE],
}

impl Insn {
    /// Build an instruction from its raw encoding.
    ///
    /// Fails with [`TranslateError::OutOfRange`] if the byte run is empty or
    /// longer than the maximum encoding width.
    pub fn from_bytes(addr: Address, raw: &[u8]) -> Result<Self, TranslateError> {
        if raw.is_empty() || raw.len() > MAX_INSTRUCTION_SIZE {
            return Err(TranslateError::OutOfRange(addr as usize + raw.len()));
        }
        let mut bytes = [0u8; MAX_INSTRUCTION_SIZE];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Insn {
            addr,
            size: raw.len() as u8,
            bytes,
        })
    }

    /// Returns the instruction bytes, up to the actual instruction size.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.size as usize]
    }

    /// Returns the full encoding zero-padded to MAX_INSTRUCTION_SIZE.
    ///
    /// The opcode execution layer's calling convention is fixed-arity, so
    /// shorter instructions are always handed over padded.
    pub fn padded(&self) -> [u8; MAX_INSTRUCTION_SIZE] {
        self.bytes
    }

    /// The opcode byte.
    pub fn opcode(&self) -> u8 {
        self.bytes[0]
    }

    /// Address of the byte following this instruction.
    pub fn end_address(&self) -> Address {
        self.addr + self.size as Address
    }
}

impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self
            .bytes()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "0x{:04x}: {}", self.addr, hex)
    }
}

/// One basic block: a straight-line run of instruction variants with a
/// single entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    /// Starting address of the basic block
    pub start: Address,
    /// Instruction variants within this block, in emission order
    pub insns: Vec<Insn>,
}

impl BasicBlock {
    /// Create a new basic block
    pub fn new(start: Address) -> Self {
        Self {
            start,
            insns: Vec::new(),
        }
    }

    /// Add an instruction variant to this basic block
    pub fn add_instruction(&mut self, insn: Insn) {
        self.insns.push(insn);
    }

    /// Get the address following the last instruction in the block
    pub fn end_address(&self) -> Option<Address> {
        self.insns.last().map(|insn| insn.end_address())
    }

    /// Get the last instruction in the block
    pub fn last_instruction(&self) -> Option<&Insn> {
        self.insns.last()
    }

    /// Get the size of the block in bytes
    pub fn size(&self) -> usize {
        self.insns.iter().map(|i| i.size as usize).sum()
    }
}

/// Error type for translation operations.
///
/// Every category is fatal: the translation either succeeds and produces a
/// complete artifact, or fails identifying the offending address or symbol.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TranslateError {
    /// A required named region is absent from the symbol table
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    /// An address or byte run falls outside the code image
    #[error("address {0:#06x} is outside the code image")]
    OutOfRange(usize),

    /// Two metadata sources assign conflicting content to one address
    #[error("conflicting definition at address {0:#06x}")]
    DuplicateDefinition(Address),

    /// Two metadata sources assign conflicting addresses to one symbol
    #[error("conflicting definition for symbol {0}")]
    DuplicateSymbol(String),
}

/// Run the whole pipeline over one listing: fixups, segmentation, emission.
///
/// The listing is mutated by the fixup phase and then only read. Fixups must
/// run to completion before segmentation, so the first fixup error aborts the
/// translation.
pub fn translate(
    listing: &mut Listing,
    fixups: &[SyntheticRegion],
) -> Result<Translation, TranslateError> {
    fixup::apply_fixups(listing, fixups)?;

    let ops = OpcodeTable::new();
    let blocks = segment::segment(listing, &ops);
    let artifact = emit::emit(listing, &blocks, &ops);

    log::info!(
        "translation complete: {} blocks, {} trap entries",
        artifact.routines.len(),
        artifact.trap_count()
    );

    Ok(artifact)
}

/// Translate several independent firmware listings in parallel.
///
/// Each translation is a pure function of its own listing, so the fan-out
/// shares no mutable state.
pub fn translate_all(
    listings: &mut [Listing],
    fixups: &[SyntheticRegion],
) -> Result<Vec<Translation>, TranslateError> {
    listings
        .par_iter_mut()
        .map(|listing| translate(listing, fixups))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insn_bytes() {
        let insn = Insn::from_bytes(0x1000, &[0x75, 0xa8, 0x00]).unwrap();

        assert_eq!(insn.bytes(), &[0x75, 0xa8, 0x00]);
        assert_eq!(insn.opcode(), 0x75);
        assert_eq!(insn.end_address(), 0x1003);
    }

    #[test]
    fn test_insn_padding() {
        let insn = Insn::from_bytes(0x0000, &[0x22]).unwrap();

        assert_eq!(insn.size, 1);
        assert_eq!(insn.bytes(), &[0x22]);
        assert_eq!(insn.padded(), [0x22, 0x00, 0x00]);
    }

    #[test]
    fn test_insn_rejects_bad_lengths() {
        assert!(Insn::from_bytes(0x0000, &[]).is_err());
        assert!(Insn::from_bytes(0x0000, &[1, 2, 3, 4]).is_err());
    }

    #[test]
    fn test_basic_block_operations() {
        let mut block = BasicBlock::new(0x1000);

        block.add_instruction(Insn::from_bytes(0x1000, &[0x74, 0x01]).unwrap());
        block.add_instruction(Insn::from_bytes(0x1002, &[0x22]).unwrap());

        assert_eq!(block.end_address(), Some(0x1003));
        assert_eq!(block.last_instruction().unwrap().opcode(), 0x22);
        assert_eq!(block.size(), 3);
    }

    #[test]
    fn test_translate_single_block() {
        let mut listing = Listing::new();
        listing.load_rom(0, &[0xe4, 0xf5, 0x80, 0x22]).unwrap();
        listing
            .record_instruction(Insn::from_bytes(0x0000, &[0xe4]).unwrap())
            .unwrap();
        listing
            .record_instruction(Insn::from_bytes(0x0001, &[0xf5, 0x80]).unwrap())
            .unwrap();
        listing
            .record_instruction(Insn::from_bytes(0x0003, &[0x22]).unwrap())
            .unwrap();
        listing.add_branch_target(0x0000);

        let artifact = translate(&mut listing, &[]).unwrap();

        assert_eq!(artifact.routines.len(), 1);
        assert_eq!(artifact.routines[0].start, 0x0000);
        assert_eq!(artifact.routines[0].calls.len(), 3);
        assert_eq!(artifact.dispatch.len(), ROM_SIZE);
    }

    #[test]
    fn test_translate_all_matches_single() {
        let build = || {
            let mut listing = Listing::new();
            listing.load_rom(0, &[0x04, 0x22]).unwrap();
            listing
                .record_instruction(Insn::from_bytes(0x0000, &[0x04]).unwrap())
                .unwrap();
            listing
                .record_instruction(Insn::from_bytes(0x0001, &[0x22]).unwrap())
                .unwrap();
            listing
        };

        let mut single = build();
        let expected = translate(&mut single, &[]).unwrap();

        let mut batch = vec![build(), build()];
        let results = translate_all(&mut batch, &[]).unwrap();

        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(result.routines, expected.routines);
            assert_eq!(result.dispatch, expected.dispatch);
        }
    }
}
