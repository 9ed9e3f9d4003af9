//! Basic-block segmentation over the frozen instruction stream.

use crate::listing::Listing;
use crate::opcode::OpcodeTable;
use crate::BasicBlock;

/// Partition the listing's instruction stream into basic blocks.
///
/// Walks every address with recorded instruction content in ascending order.
/// A declared branch target always forces a boundary before the address is
/// emitted, even mid-sequence; a control-flow instruction or a protected
/// memory write closes the block after it. Whatever is still open when the
/// stream ends is closed as-is.
///
/// Every block is non-empty, no instruction address lands in two blocks, and
/// the union of block instruction addresses equals the instruction-address
/// set of the listing.
pub fn segment(listing: &Listing, ops: &OpcodeTable) -> Vec<BasicBlock> {
    log::debug!(
        "segmenting {} instruction addresses",
        listing.instruction_count()
    );

    let mut blocks: Vec<BasicBlock> = Vec::new();
    let mut open: Option<BasicBlock> = None;

    for addr in listing.instruction_addresses() {
        // Branch targets end a basic block before emitting the instruction.
        if listing.is_branch_target(addr) {
            if let Some(block) = open.take() {
                blocks.push(block);
            }
        }

        let block = open.get_or_insert_with(|| BasicBlock::new(addr));

        // Normally there's one variant per address, but fixups can record
        // several; all of them belong to this block, in listed order.
        let mut ends_block = false;
        for insn in listing.instructions_at(addr) {
            block.add_instruction(*insn);
            ends_block = ops.ends_block(insn);
        }

        if ends_block {
            if let Some(block) = open.take() {
                blocks.push(block);
            }
        }
    }

    if let Some(block) = open.take() {
        blocks.push(block);
    }

    log::debug!("segmentation complete: {} basic blocks", blocks.len());

    blocks
}
