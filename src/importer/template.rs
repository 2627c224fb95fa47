// ==========================================
// 销售 CRM 线索导入 - 导入模板导出
// ==========================================
// 职责: 生成通用 CSV 模板（每个字段一列，必填列带标记，可选示例行）
// 约束: 模板表头重新上传后可被映射推断器识别为对应字段
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::field_schema::FieldSchema;
use anyhow::Context;

/// 必填列标记
pub const REQUIRED_MARKER: &str = " (required)";

/// 模板列名
pub fn template_header(name: &str, required: bool) -> String {
    if required {
        format!("{}{}", name, REQUIRED_MARKER)
    } else {
        name.to_string()
    }
}

/// 生成通用导入模板
///
/// # 参数
/// - schema: 字段注册表视图（决定列顺序与必填标记）
/// - with_examples: 是否附带一行示例数据
pub fn generic_template_csv(schema: &FieldSchema, with_examples: bool) -> ImportResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let headers: Vec<String> = schema
        .all_fields()
        .iter()
        .map(|f| template_header(f.name, f.required))
        .collect();
    writer.write_record(&headers).context("写入模板表头失败")?;

    if with_examples {
        let examples: Vec<&str> = schema
            .all_fields()
            .iter()
            .map(|f| f.example.unwrap_or(""))
            .collect();
        writer.write_record(&examples).context("写入模板示例行失败")?;
    }

    let bytes = writer.into_inner().context("模板缓冲区刷新失败")?;
    Ok(String::from_utf8(bytes).context("模板不是有效 UTF-8")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::field_mapper::infer_field;
    use crate::importer::file_parser::CsvParser;
    use crate::importer::lead_importer_trait::FileParser;

    #[test]
    fn test_template_header_only() {
        let csv = generic_template_csv(&FieldSchema::lead(), false).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("name (required),contact_person,contact_title,email"));
    }

    #[test]
    fn test_template_marks_configured_required_fields() {
        let schema = FieldSchema::lead().with_required(&["email"]);
        let csv = generic_template_csv(&schema, false).unwrap();
        assert!(csv.contains("email (required)"));
    }

    #[test]
    fn test_template_with_examples_row() {
        let csv = generic_template_csv(&FieldSchema::lead(), true).unwrap();
        let table = CsvParser.decode(csv.as_bytes(), None).unwrap();

        assert_eq!(table.total_row_count, 1);
        let row = &table.rows[0];
        assert_eq!(row.cells[0], "Example Corp");
        assert_eq!(row.cells.len(), table.headers.len());
    }

    #[test]
    fn test_template_headers_infer_back_to_fields() {
        let schema = FieldSchema::lead();
        let csv = generic_template_csv(&schema, false).unwrap();
        let table = CsvParser.decode(csv.as_bytes(), None).unwrap();

        for (header, field) in table.headers.iter().zip(schema.all_fields()) {
            assert_eq!(infer_field(header), Some(field.name), "header: {}", header);
        }
    }
}
