// ==========================================
// 销售 CRM 线索导入 - 表格解码器实现
// ==========================================
// 阶段 0: 字节流 → 表头 + 原始数据行
// 支持: CSV (.csv) / Excel (.xlsx)
// 规则:
// - 第一个非空行即表头（不做表头探测）
// - 单元格一律按原始文本返回，不做类型转换
// - 全空白的数据行跳过，不计入总行数
// - 短行补空，长行截断（截断时记录）
// - 预览模式只物化前 N 行，其余行仅计数
// ==========================================

use crate::domain::lead::{DecodedRow, DecodedTable};
use crate::domain::types::FileFormat;
use crate::importer::error::DecodeError;
use crate::importer::lead_importer_trait::FileParser;
use calamine::{Reader, Xlsx};
use csv::{ReaderBuilder, StringRecord};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// ==========================================
// TableBuilder - 解码结果累积器
// ==========================================
// CSV / Excel 共用，保证两种格式的行规则一致
struct TableBuilder {
    row_limit: Option<usize>,
    headers: Option<Vec<String>>,
    rows: Vec<DecodedRow>,
    total_row_count: usize,
    padded_rows: usize,
    truncated_rows: usize,
    notes: Vec<String>,
}

impl TableBuilder {
    fn new(row_limit: Option<usize>) -> Self {
        Self {
            row_limit,
            headers: None,
            rows: Vec::new(),
            total_row_count: 0,
            padded_rows: 0,
            truncated_rows: 0,
            notes: Vec::new(),
        }
    }

    fn push_row<'a, I>(&mut self, line_number: usize, cells: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cells: Vec<&str> = cells.into_iter().collect();

        // 跳过完全空白的行
        if cells.iter().all(|c| c.trim().is_empty()) {
            return;
        }

        let Some(width) = self.headers.as_ref().map(Vec::len) else {
            let mut headers: Vec<String> = cells.iter().map(|c| c.trim().to_string()).collect();
            // 去掉表头尾部的空单元格
            while headers.last().is_some_and(|h| h.is_empty()) {
                headers.pop();
            }
            self.headers = Some(headers);
            return;
        };

        self.total_row_count += 1;

        if cells.len() < width {
            self.padded_rows += 1;
        } else if cells[width..].iter().any(|c| !c.trim().is_empty()) {
            self.truncated_rows += 1;
        }

        let materialize = self
            .row_limit
            .map_or(true, |limit| self.rows.len() < limit);
        if !materialize {
            return;
        }

        let mut owned: Vec<String> = cells.iter().take(width).map(|c| c.to_string()).collect();
        owned.resize(width, String::new());
        self.rows.push(DecodedRow {
            line_number,
            cells: owned,
        });
    }

    fn finish(self) -> Result<DecodedTable, DecodeError> {
        let headers = self.headers.ok_or(DecodeError::EmptyFile)?;
        Ok(DecodedTable {
            headers,
            rows: self.rows,
            total_row_count: self.total_row_count,
            padded_rows: self.padded_rows,
            truncated_rows: self.truncated_rows,
            notes: self.notes,
        })
    }
}

/// 文本解码：UTF-8（去 BOM），失败时按 Latin-1 回退
fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, bool) {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => (Cow::Borrowed(text), false),
        Err(_) => (Cow::Owned(bytes.iter().map(|&b| b as char).collect()), true),
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn decode(&self, bytes: &[u8], row_limit: Option<usize>) -> Result<DecodedTable, DecodeError> {
        let (text, latin1_fallback) = decode_text(bytes);

        let mut builder = TableBuilder::new(row_limit);
        if latin1_fallback {
            builder
                .notes
                .push("File is not valid UTF-8; decoded as Latin-1".to_string());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(text.as_bytes());

        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            let line_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or_default();
            builder.push_row(line_number, record.iter());
        }

        let table = builder.finish()?;
        debug!(
            headers = table.headers.len(),
            total_rows = table.total_row_count,
            materialized = table.rows.len(),
            "CSV 解码完成"
        );
        Ok(table)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn decode(&self, bytes: &[u8], row_limit: Option<usize>) -> Result<DecodedTable, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::EmptyFile);
        }

        // 打开 Excel 文件
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| DecodeError::Corrupt("workbook has no worksheets".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // range 可能不从 A1 开始，行号需加上偏移
        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

        let mut builder = TableBuilder::new(row_limit);
        for (idx, data_row) in range.rows().enumerate() {
            let cells: Vec<String> = data_row.iter().map(|cell| cell.to_string()).collect();
            builder.push_row(first_row + idx + 1, cells.iter().map(String::as_str));
        }

        let table = builder.finish()?;
        debug!(
            sheet = %sheet_name,
            headers = table.headers.len(),
            total_rows = table.total_row_count,
            materialized = table.rows.len(),
            "Excel 解码完成"
        );
        Ok(table)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    /// 根据文件名判定格式
    pub fn detect_format(file_name: &str) -> Result<FileFormat, DecodeError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        FileFormat::from_extension(ext).ok_or_else(|| {
            DecodeError::UnsupportedFormat(if ext.is_empty() {
                file_name.to_string()
            } else {
                ext.to_lowercase()
            })
        })
    }

    pub fn decode(
        &self,
        bytes: &[u8],
        format: FileFormat,
        row_limit: Option<usize>,
    ) -> Result<DecodedTable, DecodeError> {
        match format {
            FileFormat::Csv => CsvParser.decode(bytes, row_limit),
            FileFormat::Xlsx => ExcelParser.decode(bytes, row_limit),
        }
    }

    pub fn decode_file_name(
        &self,
        file_name: &str,
        bytes: &[u8],
        row_limit: Option<usize>,
    ) -> Result<DecodedTable, DecodeError> {
        let format = Self::detect_format(file_name)?;
        self.decode(bytes, format, row_limit)
    }
}
