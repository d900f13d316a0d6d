use super::error::OcrError;
use crate::types::{OcrToken, TokenGeometry};

/// Number of columns in a Tesseract TSV row; the text column may be absent on layout rows.
pub const TSV_FIELDS: usize = 12;

/// Parse Tesseract TSV output into the token stream.
///
/// Every row is kept, including the page, block, paragraph and line rows
/// whose text is empty: they carry the hierarchy numbering the text
/// reconstruction walks. Rows are returned in output order.
///
/// Rows with too few columns are skipped; a row whose numeric columns do not
/// parse is treated as corrupt engine output.
pub fn parse_tsv(tsv_data: &str) -> Result<Vec<OcrToken>, OcrError> {
    let mut tokens = Vec::new();

    for (line_num, line) in tsv_data.lines().enumerate() {
        if line_num == 0 && line.starts_with("level") {
            continue;
        }

        // Layout rows end in an empty text column, so only strip the line terminator.
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.splitn(TSV_FIELDS, '\t').collect();
        if fields.len() < TSV_FIELDS - 1 {
            tracing::debug!(line = line_num + 1, columns = fields.len(), "skipping short TSV row");
            continue;
        }

        let number = |index: usize| -> Result<usize, OcrError> {
            fields[index].trim().parse::<usize>().map_err(|_| {
                OcrError::InvalidOutput(format!(
                    "TSV line {}: column {} is not a number: '{}'",
                    line_num + 1,
                    index + 1,
                    fields[index]
                ))
            })
        };

        let confidence = fields[10].trim().parse::<f64>().map_err(|_| {
            OcrError::InvalidOutput(format!(
                "TSV line {}: confidence is not a number: '{}'",
                line_num + 1,
                fields[10]
            ))
        })?;

        tokens.push(OcrToken {
            text: fields.get(11).map(|t| t.trim().to_string()).unwrap_or_default(),
            level: number(0)? as u32,
            page_index: number(1)?,
            block_index: number(2)?,
            paragraph_index: number(3)?,
            line_index: number(4)?,
            word_index: number(5)?,
            geometry: TokenGeometry::new(
                number(6)? as u32,
                number(7)? as u32,
                number(8)? as u32,
                number(9)? as u32,
            ),
            confidence,
        });
    }

    Ok(tokens)
}
