//! Inspection output for translated artifacts.
//!
//! These renderings exist for debugging and tooling; the downstream
//! source-file serializer consumes the [`Translation`] structs directly and
//! lives outside this crate.

mod json;
mod csv;

pub use self::json::*;
pub use self::csv::*;

use crate::emit::{DispatchEntry, Translation, TRAP_HANDLER};
use std::fmt;
use std::str::FromStr;
use clap::ValueEnum;

/// Errors raised while rendering an artifact.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error
    #[error("CSV serialization error: {0}")]
    Csv(#[from] ::csv::Error),

    /// Rendered bytes were not valid UTF-8
    #[error("output was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Supported output formats for translated artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output (default)
    Text,
    /// JSON format (hierarchical)
    Json,
    /// JSON Lines format (one JSON object per line)
    JsonLines,
    /// CSV format (comma-separated values)
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::JsonLines => write!(f, "jsonl"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "jsonlines" => Ok(OutputFormat::JsonLines),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl OutputFormat {
    /// Get the default output format
    pub fn default() -> Self {
        OutputFormat::Text
    }

    /// Get all available output formats
    pub fn available_formats() -> &'static [Self] {
        &[
            OutputFormat::Text,
            OutputFormat::Json,
            OutputFormat::JsonLines,
            OutputFormat::Csv,
        ]
    }

    /// Get a formatter for this output format
    pub fn get_formatter(&self) -> Box<dyn TranslationFormatter> {
        match self {
            OutputFormat::Text => Box::new(TextFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
            OutputFormat::JsonLines => Box::new(JsonLinesFormatter),
            OutputFormat::Csv => Box::new(CsvFormatter),
        }
    }
}

/// Formatter trait for translated artifacts
pub trait TranslationFormatter {
    /// Render a translation
    fn format(&self, translation: &Translation) -> Result<String, FormatError>;
}

/// Render a translation in plain text
pub struct TextFormatter;

/// Render a translation in JSON
pub struct JsonFormatter;

/// Render a translation in JSON Lines
pub struct JsonLinesFormatter;

/// Render a translation in CSV
pub struct CsvFormatter;

impl TranslationFormatter for TextFormatter {
    fn format(&self, translation: &Translation) -> Result<String, FormatError> {
        let mut output = String::new();

        output.push_str(&format!(
            "Translated image: {} bytes, {} blocks, {} trap entries -> {}\n\n",
            translation.rom.len(),
            translation.routines.len(),
            translation.trap_count(),
            TRAP_HANDLER
        ));

        for routine in &translation.routines {
            output.push_str(&format!(
                "Block at 0x{:04x} ({} cycles, exit pc 0x{:04x}):\n",
                routine.start, routine.cycles, routine.exit_pc
            ));

            for call in &routine.calls {
                let bytes = call
                    .bytes
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>()
                    .join(" ");

                output.push_str(&format!(
                    "  0x{:04x}: {:<24} {} ; {}\n",
                    call.addr, call.handler, bytes, call.cycles
                ));
            }

            output.push('\n');
        }

        Ok(output)
    }
}

/// Encode a dispatch entry as a compact integer: the routine index, or -1
/// for the trap routine.
pub(crate) fn dispatch_index(entry: &DispatchEntry) -> i32 {
    match entry {
        DispatchEntry::Block(i) => *i as i32,
        DispatchEntry::Trap => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::emit;
    use crate::listing::Listing;
    use crate::opcode::OpcodeTable;
    use crate::segment::segment;
    use crate::Insn;

    pub(crate) fn sample_translation() -> Translation {
        let mut listing = Listing::new();
        listing
            .load_rom(0, &[0xe4, 0x75, 0xa8, 0x01, 0x22, 0x04, 0xf5, 0x90])
            .unwrap();
        listing
            .record_instruction(Insn::from_bytes(0x0000, &[0xe4]).unwrap())
            .unwrap();
        listing
            .record_instruction(Insn::from_bytes(0x0001, &[0x75, 0xa8, 0x01]).unwrap())
            .unwrap();
        listing
            .record_instruction(Insn::from_bytes(0x0004, &[0x22]).unwrap())
            .unwrap();
        listing
            .record_instruction(Insn::from_bytes(0x0005, &[0x04]).unwrap())
            .unwrap();
        listing
            .record_instruction(Insn::from_bytes(0x0006, &[0xf5, 0x90]).unwrap())
            .unwrap();
        listing.add_branch_target(0x0000);

        let ops = OpcodeTable::new();
        let blocks = segment(&listing, &ops);
        emit(&listing, &blocks, &ops)
    }

    #[test]
    fn test_text_formatter() {
        let translation = sample_translation();
        let result = TextFormatter.format(&translation).unwrap();

        assert!(result.contains("Block at 0x0000"));
        assert!(result.contains("Block at 0x0005"));
        assert!(result.contains("mov_mem_imm"));
        assert!(result.contains("ret"));
        assert!(result.contains("sbt_exception"));
        assert!(result.contains("75 a8 01"));
    }

    #[test]
    fn test_format_selection() {
        for format in OutputFormat::available_formats() {
            let formatter = format.get_formatter();
            let _ = formatter;
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "jsonlines".parse::<OutputFormat>().unwrap(),
            OutputFormat::JsonLines
        );
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::JsonLines.to_string(), "jsonl");
    }
}
