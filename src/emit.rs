//! Translated routine emission and dispatch-table assembly.
//!
//! Each basic block becomes a [`BlockRoutine`]: a fixed sequence of calls
//! into the opcode execution layer, the accumulated cycle cost, and the exit
//! program counter. The dispatch table then covers every address in the
//! image, so an indirect jump to any address - valid or corrupted - resolves
//! to a translated block or to the shared trap routine.

use crate::listing::Listing;
use crate::opcode::OpcodeTable;
use crate::{Address, BasicBlock, MAX_INSTRUCTION_SIZE, PC_MASK, ROM_SIZE};

/// Execution-layer symbol for the shared trap routine. Jumping to any
/// address that does not begin a translated block raises a fatal
/// invalid-entry condition there.
pub const TRAP_HANDLER: &str = "sbt_exception";

/// One call into the opcode execution layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpCall {
    /// Address the instruction was translated from
    pub addr: Address,
    /// Execution-layer handler name
    pub handler: &'static str,
    /// Raw encoding, zero-padded to the fixed handler arity
    pub bytes: [u8; MAX_INSTRUCTION_SIZE],
    /// Classified machine-cycle cost
    pub cycles: u8,
}

/// The translated form of one basic block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRoutine {
    /// Address the block was translated from
    pub start: Address,
    /// Handler calls in execution order
    pub calls: Vec<OpCall>,
    /// Accumulated cycle cost of the whole block
    pub cycles: u32,
    /// Program counter after the block: the address following the last
    /// instruction, masked to the code space
    pub exit_pc: Address,
}

/// One dispatch-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchEntry {
    /// Index of the routine beginning at this address
    Block(usize),
    /// The shared trap routine
    Trap,
}

/// The translator's final artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    /// The full ROM data image, carried so the runtime can service
    /// code-space data reads
    pub rom: Vec<u8>,
    /// Translated routines, ordered by start address
    pub routines: Vec<BlockRoutine>,
    /// One entry per address in the image, no gaps
    pub dispatch: Vec<DispatchEntry>,
}

impl Translation {
    /// The routine beginning exactly at `addr`, if any.
    pub fn routine_at(&self, addr: Address) -> Option<&BlockRoutine> {
        match self.dispatch.get(addr as usize) {
            Some(DispatchEntry::Block(i)) => self.routines.get(*i),
            _ => None,
        }
    }

    /// Number of dispatch entries resolving to the trap routine.
    pub fn trap_count(&self) -> usize {
        self.dispatch
            .iter()
            .filter(|e| matches!(e, DispatchEntry::Trap))
            .count()
    }
}

/// Emit routines for every block and assemble the dispatch table.
pub fn emit(listing: &Listing, blocks: &[BasicBlock], ops: &OpcodeTable) -> Translation {
    let routines: Vec<BlockRoutine> = blocks.iter().map(|b| emit_block(b, ops)).collect();

    let mut dispatch = vec![DispatchEntry::Trap; ROM_SIZE];
    for (index, routine) in routines.iter().enumerate() {
        dispatch[routine.start as usize] = DispatchEntry::Block(index);
    }

    log::debug!(
        "emitted {} routines over a {}-entry dispatch table",
        routines.len(),
        dispatch.len()
    );

    Translation {
        rom: listing.rom().to_vec(),
        routines,
        dispatch,
    }
}

/// Translate one basic block into its routine form.
fn emit_block(block: &BasicBlock, ops: &OpcodeTable) -> BlockRoutine {
    let mut calls = Vec::with_capacity(block.insns.len());
    let mut cycles: u32 = 0;
    let mut exit_pc = block.start;

    for insn in &block.insns {
        let info = ops.lookup(insn.opcode());
        calls.push(OpCall {
            addr: insn.addr,
            handler: info.mnemonic,
            bytes: insn.padded(),
            cycles: info.cycles,
        });
        cycles += info.cycles as u32;
        exit_pc = insn.end_address() & PC_MASK;
    }

    BlockRoutine {
        start: block.start,
        calls,
        cycles,
        exit_pc,
    }
}
