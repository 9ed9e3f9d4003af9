//! Opcode classification for the 8051 instruction set.
//!
//! Pure, stateless lookup from an opcode byte to the execution-layer handler
//! name, the machine-cycle cost, and the predicates the segmenter needs.
//! Every byte classifies; the one invalid 8051 encoding (0xA5) maps to the
//! execution layer's `illegal` handler as a neutral category.

use crate::Insn;

/// Handler name and machine-cycle cost for each of the 256 opcode bytes.
///
/// The names are the opcode execution layer's callable symbols; column two
/// is the classic 12-clock machine-cycle count.
const OPCODES: [(&str, u8); 256] = [
    // 0x00
    ("nop", 1),
    ("ajmp_offset", 2),
    ("ljmp_address", 2),
    ("rr_a", 1),
    ("inc_a", 1),
    ("inc_mem", 1),
    ("inc_indir_rx", 1),
    ("inc_indir_rx", 1),
    ("inc_rx", 1),
    ("inc_rx", 1),
    ("inc_rx", 1),
    ("inc_rx", 1),
    ("inc_rx", 1),
    ("inc_rx", 1),
    ("inc_rx", 1),
    ("inc_rx", 1),
    // 0x10
    ("jbc_bitaddr_offset", 2),
    ("acall_offset", 2),
    ("lcall_address", 2),
    ("rrc_a", 1),
    ("dec_a", 1),
    ("dec_mem", 1),
    ("dec_indir_rx", 1),
    ("dec_indir_rx", 1),
    ("dec_rx", 1),
    ("dec_rx", 1),
    ("dec_rx", 1),
    ("dec_rx", 1),
    ("dec_rx", 1),
    ("dec_rx", 1),
    ("dec_rx", 1),
    ("dec_rx", 1),
    // 0x20
    ("jb_bitaddr_offset", 2),
    ("ajmp_offset", 2),
    ("ret", 2),
    ("rl_a", 1),
    ("add_a_imm", 1),
    ("add_a_mem", 1),
    ("add_a_indir_rx", 1),
    ("add_a_indir_rx", 1),
    ("add_a_rx", 1),
    ("add_a_rx", 1),
    ("add_a_rx", 1),
    ("add_a_rx", 1),
    ("add_a_rx", 1),
    ("add_a_rx", 1),
    ("add_a_rx", 1),
    ("add_a_rx", 1),
    // 0x30
    ("jnb_bitaddr_offset", 2),
    ("acall_offset", 2),
    ("reti", 2),
    ("rlc_a", 1),
    ("addc_a_imm", 1),
    ("addc_a_mem", 1),
    ("addc_a_indir_rx", 1),
    ("addc_a_indir_rx", 1),
    ("addc_a_rx", 1),
    ("addc_a_rx", 1),
    ("addc_a_rx", 1),
    ("addc_a_rx", 1),
    ("addc_a_rx", 1),
    ("addc_a_rx", 1),
    ("addc_a_rx", 1),
    ("addc_a_rx", 1),
    // 0x40
    ("jc_offset", 2),
    ("ajmp_offset", 2),
    ("orl_mem_a", 1),
    ("orl_mem_imm", 2),
    ("orl_a_imm", 1),
    ("orl_a_mem", 1),
    ("orl_a_indir_rx", 1),
    ("orl_a_indir_rx", 1),
    ("orl_a_rx", 1),
    ("orl_a_rx", 1),
    ("orl_a_rx", 1),
    ("orl_a_rx", 1),
    ("orl_a_rx", 1),
    ("orl_a_rx", 1),
    ("orl_a_rx", 1),
    ("orl_a_rx", 1),
    // 0x50
    ("jnc_offset", 2),
    ("acall_offset", 2),
    ("anl_mem_a", 1),
    ("anl_mem_imm", 2),
    ("anl_a_imm", 1),
    ("anl_a_mem", 1),
    ("anl_a_indir_rx", 1),
    ("anl_a_indir_rx", 1),
    ("anl_a_rx", 1),
    ("anl_a_rx", 1),
    ("anl_a_rx", 1),
    ("anl_a_rx", 1),
    ("anl_a_rx", 1),
    ("anl_a_rx", 1),
    ("anl_a_rx", 1),
    ("anl_a_rx", 1),
    // 0x60
    ("jz_offset", 2),
    ("ajmp_offset", 2),
    ("xrl_mem_a", 1),
    ("xrl_mem_imm", 2),
    ("xrl_a_imm", 1),
    ("xrl_a_mem", 1),
    ("xrl_a_indir_rx", 1),
    ("xrl_a_indir_rx", 1),
    ("xrl_a_rx", 1),
    ("xrl_a_rx", 1),
    ("xrl_a_rx", 1),
    ("xrl_a_rx", 1),
    ("xrl_a_rx", 1),
    ("xrl_a_rx", 1),
    ("xrl_a_rx", 1),
    ("xrl_a_rx", 1),
    // 0x70
    ("jnz_offset", 2),
    ("acall_offset", 2),
    ("orl_c_bitaddr", 2),
    ("jmp_indir_a_dptr", 2),
    ("mov_a_imm", 1),
    ("mov_mem_imm", 2),
    ("mov_indir_rx_imm", 1),
    ("mov_indir_rx_imm", 1),
    ("mov_rx_imm", 1),
    ("mov_rx_imm", 1),
    ("mov_rx_imm", 1),
    ("mov_rx_imm", 1),
    ("mov_rx_imm", 1),
    ("mov_rx_imm", 1),
    ("mov_rx_imm", 1),
    ("mov_rx_imm", 1),
    // 0x80
    ("sjmp_offset", 2),
    ("ajmp_offset", 2),
    ("anl_c_bitaddr", 2),
    ("movc_a_indir_a_pc", 2),
    ("div_ab", 4),
    ("mov_mem_mem", 2),
    ("mov_mem_indir_rx", 2),
    ("mov_mem_indir_rx", 2),
    ("mov_mem_rx", 2),
    ("mov_mem_rx", 2),
    ("mov_mem_rx", 2),
    ("mov_mem_rx", 2),
    ("mov_mem_rx", 2),
    ("mov_mem_rx", 2),
    ("mov_mem_rx", 2),
    ("mov_mem_rx", 2),
    // 0x90
    ("mov_dptr_imm", 2),
    ("acall_offset", 2),
    ("mov_bitaddr_c", 2),
    ("movc_a_indir_a_dptr", 2),
    ("subb_a_imm", 1),
    ("subb_a_mem", 1),
    ("subb_a_indir_rx", 1),
    ("subb_a_indir_rx", 1),
    ("subb_a_rx", 1),
    ("subb_a_rx", 1),
    ("subb_a_rx", 1),
    ("subb_a_rx", 1),
    ("subb_a_rx", 1),
    ("subb_a_rx", 1),
    ("subb_a_rx", 1),
    ("subb_a_rx", 1),
    // 0xA0
    ("orl_c_compl_bitaddr", 2),
    ("ajmp_offset", 2),
    ("mov_c_bitaddr", 1),
    ("inc_dptr", 2),
    ("mul_ab", 4),
    ("illegal", 1),
    ("mov_indir_rx_mem", 2),
    ("mov_indir_rx_mem", 2),
    ("mov_rx_mem", 2),
    ("mov_rx_mem", 2),
    ("mov_rx_mem", 2),
    ("mov_rx_mem", 2),
    ("mov_rx_mem", 2),
    ("mov_rx_mem", 2),
    ("mov_rx_mem", 2),
    ("mov_rx_mem", 2),
    // 0xB0
    ("anl_c_compl_bitaddr", 2),
    ("acall_offset", 2),
    ("cpl_bitaddr", 1),
    ("cpl_c", 1),
    ("cjne_a_imm_offset", 2),
    ("cjne_a_mem_offset", 2),
    ("cjne_indir_rx_imm_offset", 2),
    ("cjne_indir_rx_imm_offset", 2),
    ("cjne_rx_imm_offset", 2),
    ("cjne_rx_imm_offset", 2),
    ("cjne_rx_imm_offset", 2),
    ("cjne_rx_imm_offset", 2),
    ("cjne_rx_imm_offset", 2),
    ("cjne_rx_imm_offset", 2),
    ("cjne_rx_imm_offset", 2),
    ("cjne_rx_imm_offset", 2),
    // 0xC0
    ("push_mem", 2),
    ("ajmp_offset", 2),
    ("clr_bitaddr", 1),
    ("clr_c", 1),
    ("swap_a", 1),
    ("xch_a_mem", 1),
    ("xch_a_indir_rx", 1),
    ("xch_a_indir_rx", 1),
    ("xch_a_rx", 1),
    ("xch_a_rx", 1),
    ("xch_a_rx", 1),
    ("xch_a_rx", 1),
    ("xch_a_rx", 1),
    ("xch_a_rx", 1),
    ("xch_a_rx", 1),
    ("xch_a_rx", 1),
    // 0xD0
    ("pop_mem", 2),
    ("acall_offset", 2),
    ("setb_bitaddr", 1),
    ("setb_c", 1),
    ("da_a", 1),
    ("djnz_mem_offset", 2),
    ("xchd_a_indir_rx", 1),
    ("xchd_a_indir_rx", 1),
    ("djnz_rx_offset", 2),
    ("djnz_rx_offset", 2),
    ("djnz_rx_offset", 2),
    ("djnz_rx_offset", 2),
    ("djnz_rx_offset", 2),
    ("djnz_rx_offset", 2),
    ("djnz_rx_offset", 2),
    ("djnz_rx_offset", 2),
    // 0xE0
    ("movx_a_indir_dptr", 2),
    ("ajmp_offset", 2),
    ("movx_a_indir_rx", 2),
    ("movx_a_indir_rx", 2),
    ("clr_a", 1),
    ("mov_a_mem", 1),
    ("mov_a_indir_rx", 1),
    ("mov_a_indir_rx", 1),
    ("mov_a_rx", 1),
    ("mov_a_rx", 1),
    ("mov_a_rx", 1),
    ("mov_a_rx", 1),
    ("mov_a_rx", 1),
    ("mov_a_rx", 1),
    ("mov_a_rx", 1),
    ("mov_a_rx", 1),
    // 0xF0
    ("movx_indir_dptr_a", 2),
    ("acall_offset", 2),
    ("movx_indir_rx_a", 2),
    ("movx_indir_rx_a", 2),
    ("cpl_a", 1),
    ("mov_mem_a", 1),
    ("mov_indir_rx_a", 1),
    ("mov_indir_rx_a", 1),
    ("mov_rx_a", 1),
    ("mov_rx_a", 1),
    ("mov_rx_a", 1),
    ("mov_rx_a", 1),
    ("mov_rx_a", 1),
    ("mov_rx_a", 1),
    ("mov_rx_a", 1),
    ("mov_rx_a", 1),
];

/// SFR destinations whose writes must take effect before the next translated
/// instruction runs. Batching several of these into one block would break
/// timing observable at the device level.
pub const PROTECTED_WRITE_DESTS: [(u8, &str); 8] = [
    // Neighbor pulses must propagate to coupled devices within one tick.
    (0x90, "P1"),
    (0x94, "P1DIR"),
    // The I2C state machine is clocked entirely by the periodic tick.
    (0xDA, "W2DAT"),
    (0xE1, "W2CON1"),
    (0xE2, "W2CON0"),
    // Radio SPI data register.
    (0xE7, "SPIRDAT"),
    // LF clock control and watchdog.
    (0xAD, "CLKLFCTRL"),
    (0xAF, "WDSV"),
];

/// Whether a literal destination byte is in the protected-write set.
pub fn is_protected_destination(dest: u8) -> bool {
    PROTECTED_WRITE_DESTS.iter().any(|&(addr, _)| addr == dest)
}

/// Classification of one opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    /// Execution-layer handler name
    pub mnemonic: &'static str,
    /// Machine-cycle cost
    pub cycles: u8,
    /// Jump, call, or return: always ends a translation block
    pub is_control_flow: bool,
    /// Direct write to internal memory or an SFR
    pub is_memory_write: bool,
}

/// The 256-entry classification table, computed once.
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    info: [OpcodeInfo; 256],
}

impl OpcodeTable {
    /// Build the table, deriving the predicate flags from handler names.
    ///
    /// Control-flow instructions are syntactically distinguishable at this
    /// level: every jump, call, and return carries its class in its name.
    pub fn new() -> Self {
        let mut info = [OpcodeInfo {
            mnemonic: "",
            cycles: 0,
            is_control_flow: false,
            is_memory_write: false,
        }; 256];

        for (op, &(mnemonic, cycles)) in OPCODES.iter().enumerate() {
            info[op] = OpcodeInfo {
                mnemonic,
                cycles,
                is_control_flow: mnemonic.contains('j')
                    || mnemonic.contains("call")
                    || mnemonic.contains("ret"),
                is_memory_write: mnemonic.contains("mov_mem"),
            };
        }

        OpcodeTable { info }
    }

    /// Classify an opcode byte. Total over all 256 values.
    pub fn lookup(&self, opcode: u8) -> &OpcodeInfo {
        &self.info[opcode as usize]
    }

    /// True when the instruction is a memory write whose literal destination
    /// byte is in the protected set.
    ///
    /// Only the second encoding byte is inspected; writes through
    /// runtime-computed destinations are not detected here.
    pub fn is_protected_write(&self, insn: &Insn) -> bool {
        self.lookup(insn.opcode()).is_memory_write && is_protected_destination(insn.bytes[1])
    }

    /// Does this instruction need to end a translation block?
    pub fn ends_block(&self, insn: &Insn) -> bool {
        self.lookup(insn.opcode()).is_control_flow || self.is_protected_write(insn)
    }
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::new()
    }
}
