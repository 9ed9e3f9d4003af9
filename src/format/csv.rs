//! CSV artifact formatter

use crate::emit::Translation;
use super::{FormatError, TranslationFormatter};

impl TranslationFormatter for super::CsvFormatter {
    fn format(&self, translation: &Translation) -> Result<String, FormatError> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer.write_record([
            "block_start",
            "block_cycles",
            "exit_pc",
            "address",
            "handler",
            "bytes",
            "cycles",
        ])?;

        for routine in &translation.routines {
            let block_start = format!("0x{:04x}", routine.start);
            let block_cycles = routine.cycles.to_string();
            let exit_pc = format!("0x{:04x}", routine.exit_pc);

            for call in &routine.calls {
                let bytes = call
                    .bytes
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>()
                    .join(" ");

                writer.write_record(&[
                    block_start.clone(),
                    block_cycles.clone(),
                    exit_pc.clone(),
                    format!("0x{:04x}", call.addr),
                    call.handler.to_string(),
                    bytes,
                    call.cycles.to_string(),
                ])?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| FormatError::Csv(e.into_error().into()))?;

        Ok(String::from_utf8(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::sample_translation;
    use super::*;

    #[test]
    fn test_csv_rows_match_calls() {
        let translation = sample_translation();
        let rendered = super::super::CsvFormatter.format(&translation).unwrap();

        let call_count: usize = translation.routines.iter().map(|r| r.calls.len()).sum();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), call_count + 1);

        assert_eq!(
            lines[0],
            "block_start,block_cycles,exit_pc,address,handler,bytes,cycles"
        );
        assert!(lines[1].starts_with("0x0000,"));
        assert!(rendered.contains("mov_mem_imm"));
        assert!(rendered.contains("mov_mem_a"));
    }
}
