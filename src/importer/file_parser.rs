// ==========================================
// 运单系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls/.xlsm/.ods) / 分隔文本 (.csv/.tsv/.txt)
// 输出: 原始行（单元格序列），不做表头判断与必填校验
// ==========================================

use crate::domain::cell::CellValue;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_validator::SourceFormat;
use crate::importer::row_normalizer::RawRow;
use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::ReaderBuilder;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// 分隔文本 Parser 实现
// ==========================================
// 每行独立选择分隔符: 制表符与逗号中先出现者
pub struct DelimitedTextParser;

impl DelimitedTextParser {
    /// 解析单行；行内 CSV 语法错误转为错误单元格，由标准化器丢弃该行
    pub fn split_line(&self, line: &str) -> RawRow {
        let delimiter = line
            .find(|c: char| c == '\t' || c == ',')
            .map(|idx| line.as_bytes()[idx])
            .unwrap_or(b',');

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(line.as_bytes());

        match reader.records().next() {
            Some(Ok(record)) => record.iter().map(CellValue::from).collect(),
            Some(Err(e)) => vec![CellValue::Error(e.to_string())],
            None => Vec::new(),
        }
    }

    pub fn parse_str(&self, content: &str) -> Vec<RawRow> {
        content
            .trim_start_matches('\u{feff}')
            .lines()
            // 跳过完全空白的行
            .filter(|line| !line.trim().is_empty())
            .map(|line| self.split_line(line))
            .collect()
    }
}

impl FileParser for DelimitedTextParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let bytes = std::fs::read(file_path)?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(self.parse_str(&content))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    fn convert_cell(cell: &Data, formula: Option<&String>) -> CellValue {
        let value = match cell {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) => CellValue::from(s.as_str()),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::Error(e) => CellValue::Error(e.to_string()),
            Data::Empty => CellValue::Blank,
            other => CellValue::Text(other.to_string()),
        };

        match formula {
            Some(f) if !f.is_empty() => match value {
                CellValue::Number(n) => CellValue::Formula {
                    cached_text: None,
                    cached_number: Some(n),
                },
                CellValue::Blank => CellValue::Formula {
                    cached_text: None,
                    cached_number: None,
                },
                CellValue::Text(s) => CellValue::Formula {
                    cached_text: Some(s),
                    cached_number: None,
                },
                CellValue::Boolean(b) => CellValue::Formula {
                    cached_text: Some(if b { "True" } else { "False" }.to_string()),
                    cached_number: None,
                },
                other => other,
            },
            _ => value,
        }
    }

    fn range_to_rows(range: &Range<Data>, formulas: Option<&Range<String>>) -> Vec<RawRow> {
        let (start_row, start_col) = match range.start() {
            Some(start) => start,
            None => return Vec::new(),
        };

        let mut rows = Vec::new();
        for (r, data_row) in range.rows().enumerate() {
            // 区域不从 A 列开始时补齐前导空白列
            let mut row: RawRow = vec![CellValue::Blank; start_col as usize];

            for (c, cell) in data_row.iter().enumerate() {
                let position = (start_row + r as u32, start_col + c as u32);
                let formula = formulas.and_then(|f| f.get_value(position));
                row.push(Self::convert_cell(cell, formula));
            }

            // 跳过完全空白的行
            if row.iter().all(|cell| *cell == CellValue::Blank) {
                continue;
            }
            rows.push(row);
        }
        rows
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;
        let formulas = workbook.worksheet_formula(&sheet_name).ok();

        Ok(Self::range_to_rows(&range, formulas.as_ref()))
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        match SourceFormat::from_path(file_path)? {
            SourceFormat::Spreadsheet => ExcelParser.parse_to_raw_rows(file_path),
            SourceFormat::Delimited => DelimitedTextParser.parse_to_raw_rows(file_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn texts(row: &RawRow) -> Vec<String> {
        row.iter().map(|c| c.to_text().unwrap()).collect()
    }

    #[test]
    fn test_split_line_picks_first_separator() {
        let parser = DelimitedTextParser;
        assert_eq!(texts(&parser.split_line("1\tA1\t06.ShopA")), vec!["1", "A1", "06.ShopA"]);
        assert_eq!(texts(&parser.split_line("1,A1,06.ShopA")), vec!["1", "A1", "06.ShopA"]);
        // 制表符先出现时逗号属于字段内容
        assert_eq!(texts(&parser.split_line("1\tA,1\tShop")), vec!["1", "A,1", "Shop"]);
    }

    #[test]
    fn test_split_line_handles_quotes() {
        let parser = DelimitedTextParser;
        let row = parser.split_line(r#"1,"A,1",06.ShopA"#);
        assert_eq!(texts(&row), vec!["1", "A,1", "06.ShopA"]);
    }

    #[test]
    fn test_unbalanced_quote_stays_row_level() {
        let rows = DelimitedTextParser.parse_str("1,\"A1,06.ShopA\n2,A2,03.ShopB\n");

        // 引号未闭合只影响本行，不中断解析
        assert_eq!(rows.len(), 2);
        assert!(rows[0].len() < 3);
        assert_eq!(texts(&rows[1]), vec!["2", "A2", "03.ShopB"]);
    }

    #[test]
    fn test_parse_str_skips_blank_lines_and_bom() {
        let parser = DelimitedTextParser;
        let rows = parser.parse_str("\u{feff}id,code,market\r\n\r\n1,A1,06.ShopA\r\n");

        assert_eq!(rows.len(), 2);
        assert_eq!(texts(&rows[0]), vec!["id", "code", "market"]);
    }

    #[test]
    fn test_empty_fields_become_blank() {
        let row = DelimitedTextParser.split_line("1,,");
        assert_eq!(row, vec![CellValue::from("1"), CellValue::Blank, CellValue::Blank]);
    }

    #[test]
    fn test_delimited_file() {
        let mut temp_file = Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(temp_file, "주문번호\t주문코드\t마켓").unwrap();
        writeln!(temp_file, "1\tA1\t06.ShopA").unwrap();
        temp_file.flush().unwrap();

        let rows = UniversalFileParser.parse_to_raw_rows(temp_file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(texts(&rows[1]), vec!["1", "A1", "06.ShopA"]);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = UniversalFileParser.parse_to_raw_rows(Path::new("orders.json"));
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = DelimitedTextParser.parse_to_raw_rows(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_excel_cell_conversion() {
        assert_eq!(
            ExcelParser::convert_cell(&Data::Float(1001.0), None),
            CellValue::Number(1001.0)
        );
        assert_eq!(
            ExcelParser::convert_cell(&Data::Int(7), None),
            CellValue::Number(7.0)
        );
        assert_eq!(
            ExcelParser::convert_cell(&Data::Bool(false), None),
            CellValue::Boolean(false)
        );
        assert_eq!(ExcelParser::convert_cell(&Data::Empty, None), CellValue::Blank);

        let formula = "CONCAT(\"06.\",\"ShopA\")".to_string();
        assert_eq!(
            ExcelParser::convert_cell(&Data::String("06.ShopA".to_string()), Some(&formula)),
            CellValue::Formula {
                cached_text: Some("06.ShopA".to_string()),
                cached_number: None,
            }
        );
        assert_eq!(
            ExcelParser::convert_cell(&Data::Float(3.0), Some(&formula)),
            CellValue::Formula {
                cached_text: None,
                cached_number: Some(3.0),
            }
        );
    }
}
