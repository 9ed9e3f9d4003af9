//! JSON and JSON Lines artifact formatters

use serde::{Serialize, Deserialize};
use serde_json::json;

use crate::emit::{BlockRoutine, OpCall, Translation};
use super::{dispatch_index, FormatError, TranslationFormatter};

/// Serializable handler call for JSON output
#[derive(Serialize, Deserialize)]
struct OpCallJson {
    /// Address of the translated instruction
    address: String,
    /// Execution-layer handler name
    handler: String,
    /// Padded encoding as hex string
    bytes: String,
    /// Machine-cycle cost
    cycles: u8,
}

/// Serializable block routine for JSON output
#[derive(Serialize, Deserialize)]
struct RoutineJson {
    /// Starting address of the block
    start: String,
    /// Accumulated cycle cost
    cycles: u32,
    /// Program counter after the block
    exit_pc: String,
    /// Handler calls in execution order
    calls: Vec<OpCallJson>,
}

/// Serializable artifact for JSON output
#[derive(Serialize, Deserialize)]
struct TranslationJson {
    /// Image size in bytes
    rom_size: usize,
    /// Number of translated blocks
    block_count: usize,
    /// Number of dispatch entries resolving to the trap routine
    trap_entries: usize,
    /// Translated routines
    routines: Vec<RoutineJson>,
    /// One entry per image address: routine index, or -1 for the trap
    dispatch: Vec<i32>,
}

impl TranslationFormatter for super::JsonFormatter {
    fn format(&self, translation: &Translation) -> Result<String, FormatError> {
        let result = TranslationJson {
            rom_size: translation.rom.len(),
            block_count: translation.routines.len(),
            trap_entries: translation.trap_count(),
            routines: translation.routines.iter().map(routine_to_json).collect(),
            dispatch: translation.dispatch.iter().map(dispatch_index).collect(),
        };

        Ok(serde_json::to_string_pretty(&result)?)
    }
}

impl TranslationFormatter for super::JsonLinesFormatter {
    fn format(&self, translation: &Translation) -> Result<String, FormatError> {
        let mut output = String::new();

        for routine in &translation.routines {
            let block = json!({
                "type": "block",
                "start": format!("0x{:x}", routine.start),
                "cycles": routine.cycles,
                "exit_pc": format!("0x{:x}", routine.exit_pc),
            });
            output.push_str(&serde_json::to_string(&block)?);
            output.push('\n');

            for call in &routine.calls {
                let line = json!({
                    "type": "call",
                    "block_start": format!("0x{:x}", routine.start),
                    "address": format!("0x{:x}", call.addr),
                    "handler": call.handler,
                    "bytes": hex_bytes(call),
                    "cycles": call.cycles,
                });
                output.push_str(&serde_json::to_string(&line)?);
                output.push('\n');
            }
        }

        let summary = json!({
            "type": "dispatch",
            "entries": translation.dispatch.len(),
            "blocks": translation.routines.len(),
            "trap_entries": translation.trap_count(),
        });
        output.push_str(&serde_json::to_string(&summary)?);
        output.push('\n');

        Ok(output)
    }
}

/// Convert a handler call to JSON form
fn call_to_json(call: &OpCall) -> OpCallJson {
    OpCallJson {
        address: format!("0x{:x}", call.addr),
        handler: call.handler.to_string(),
        bytes: hex_bytes(call),
        cycles: call.cycles,
    }
}

/// Convert a block routine to JSON form
fn routine_to_json(routine: &BlockRoutine) -> RoutineJson {
    RoutineJson {
        start: format!("0x{:x}", routine.start),
        cycles: routine.cycles,
        exit_pc: format!("0x{:x}", routine.exit_pc),
        calls: routine.calls.iter().map(call_to_json).collect(),
    }
}

fn hex_bytes(call: &OpCall) -> String {
    call.bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::super::tests::sample_translation;
    use super::*;
    use crate::ROM_SIZE;
    use std::io::Write;

    #[test]
    fn test_json_formatter_roundtrips() {
        let translation = sample_translation();
        let rendered = super::super::JsonFormatter.format(&translation).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["rom_size"], ROM_SIZE);
        assert_eq!(parsed["block_count"], 2);
        assert_eq!(parsed["dispatch"].as_array().unwrap().len(), ROM_SIZE);
        assert_eq!(parsed["dispatch"][0], 0);
        assert_eq!(parsed["dispatch"][1], -1);
        assert_eq!(
            parsed["routines"][0]["calls"][1]["handler"],
            "mov_mem_imm"
        );
    }

    #[test]
    fn test_json_lines_shape() {
        let translation = sample_translation();
        let rendered = super::super::JsonLinesFormatter.format(&translation).unwrap();

        let lines: Vec<&str> = rendered.lines().collect();
        // One line per block, one per call, one dispatch summary.
        let call_count: usize = translation.routines.iter().map(|r| r.calls.len()).sum();
        assert_eq!(lines.len(), translation.routines.len() + call_count + 1);

        for line in &lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value["type"].is_string());
        }

        let last: serde_json::Value = serde_json::from_str(lines.last().unwrap()).unwrap();
        assert_eq!(last["type"], "dispatch");
        assert_eq!(last["entries"], ROM_SIZE);
    }

    #[test]
    fn test_json_written_to_disk() {
        let translation = sample_translation();
        let rendered = super::super::JsonFormatter.format(&translation).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(rendered.as_bytes()).unwrap();

        let read_back = std::fs::read_to_string(file.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&read_back).unwrap();
        assert_eq!(parsed["block_count"], 2);
    }
}
