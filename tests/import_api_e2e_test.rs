// ==========================================
// 销售 CRM 线索导入 - ImportApi 端到端测试
// ==========================================
// 覆盖: 预览 → 映射建议 → 导入落库 → 按批次回查
// 使用临时 SQLite 文件，走完整的 API → Importer → Repository 链路
// ==========================================


use lead_importer::api::{ApiError, ImportApi};
use lead_importer::domain::ColumnMapping;
use lead_importer::repository::LeadImportRepositoryImpl;
use test_helpers::{count_leads, create_test_db, csv_bytes, register_active_user};

fn sample_csv() -> Vec<u8> {
    csv_bytes(&[
        "Company Name,Contact Email,Status,Phone",
        "Acme Corp,Sales@Acme.com,Open,(555) 123-4567",
        ",c@d.com,qualified,",
        "Beta LLC,not-an-email,bogus,",
    ])
}

const MAPPING_JSON: &str = r#"[
    {"csvColumn": "Company Name", "leadField": "name"},
    {"csvColumn": "Contact Email", "leadField": "email"},
    {"csvColumn": "Status", "leadField": "lead_status"},
    {"csvColumn": "Phone", "leadField": "phone"}
]"#;

// ==========================================
// 测试用例 1: 完整导入流程
// ==========================================
#[tokio::test]
async fn test_import_leads_generic_end_to_end() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let owner = register_active_user(&db_path, "owner@crm.test");
    let api = ImportApi::new(db_path.clone());

    let response = api
        .import_leads_generic("leads.csv", &sample_csv(), MAPPING_JSON, "Owner@CRM.test")
        .await
        .expect("导入失败");

    assert_eq!(response.message, "Import completed: 1 successful, 2 failed");
    assert_eq!(response.successful_imports, 1);
    assert_eq!(response.failed_imports, 2);
    assert_eq!(response.failures[0].reason, "missing required field name");
    assert!(response.failures[1].reason.contains("lead_status"));
    assert_eq!(count_leads(&db_path), 1);

    let repo = LeadImportRepositoryImpl::new(&db_path).unwrap();
    let leads = repo.list_by_batch(&response.batch_id).unwrap();
    assert_eq!(leads.len(), 1);

    let (_, record) = &leads[0];
    assert_eq!(record.get("name"), Some("Acme Corp"));
    assert_eq!(record.get("email"), Some("sales@acme.com"));
    assert_eq!(record.get("phone"), Some("5551234567"));
    assert_eq!(record.get("phone_label"), Some("work"));
    assert_eq!(record.get("lead_status"), Some("open"));
    assert_eq!(record.get("type"), Some("None"));

    // 指派人外键
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let assigned: String = conn
        .query_row("SELECT assigned_user_id FROM leads", [], |row| row.get(0))
        .unwrap();
    assert_eq!(assigned, owner.0);
}

#[tokio::test]
async fn test_import_response_serializes_failures() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    register_active_user(&db_path, "owner@crm.test");
    let api = ImportApi::new(db_path);

    let response = api
        .import_leads_generic("leads.csv", &sample_csv(), MAPPING_JSON, "owner@crm.test")
        .await
        .unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["successful_imports"], 1);
    assert_eq!(json["failures"][0]["row"], 3);
    assert_eq!(json["failures"][0]["data"]["Company Name"], "");
    assert_eq!(json["failures"][1]["data"]["Contact Email"], "not-an-email");
    assert!(json["failures"][1]["error"].as_str().unwrap().contains("bogus"));
}

// ==========================================
// 测试用例 2: 提交前错误映射为 API 错误
// ==========================================
#[tokio::test]
async fn test_import_unknown_assignee_is_not_found() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(db_path.clone());

    let result = api
        .import_leads_generic("leads.csv", &sample_csv(), MAPPING_JSON, "nobody@crm.test")
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.status_code(), 404);
    assert_eq!(count_leads(&db_path), 0);
}

#[tokio::test]
async fn test_import_malformed_mapping_json_is_invalid_input() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    register_active_user(&db_path, "owner@crm.test");
    let api = ImportApi::new(db_path.clone());

    let result = api
        .import_leads_generic("leads.csv", &sample_csv(), "{not json", "owner@crm.test")
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(count_leads(&db_path), 0);
}

#[tokio::test]
async fn test_import_missing_name_mapping_lists_fields() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    register_active_user(&db_path, "owner@crm.test");
    let api = ImportApi::new(db_path.clone());

    let mappings = vec![ColumnMapping::new("Contact Email", Some("email"))];
    let result = api
        .import_leads_with_mappings("leads.csv", &sample_csv(), &mappings, "owner@crm.test")
        .await;

    match result {
        Err(ApiError::MissingRequiredMappings(fields)) => assert_eq!(fields, vec!["name"]),
        other => panic!("expected MissingRequiredMappings, got {:?}", other.map(|r| r.message)),
    }
    assert_eq!(count_leads(&db_path), 0);
}

#[tokio::test]
async fn test_preview_corrupt_xlsx_is_invalid_file() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(db_path);

    let result = api.preview_lead_file("leads.xlsx", b"definitely not a zip").await;

    assert!(matches!(result, Err(ApiError::InvalidFile(_))));
}

// ==========================================
// 测试用例 3: 预览与映射建议
// ==========================================
#[tokio::test]
async fn test_preview_and_suggest() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(db_path);

    let preview = api.preview_lead_file("leads.csv", &sample_csv()).await.unwrap();
    assert_eq!(preview.headers.len(), 4);
    assert_eq!(preview.rows.len(), 3);
    assert_eq!(preview.total_rows, 3);
    assert_eq!(preview.rows[0][1], "Sales@Acme.com");
    assert_eq!(preview.rows[1], vec!["", "c@d.com", "qualified", ""]);

    let suggestion = api.suggest_lead_mappings("leads.csv", &sample_csv()).await.unwrap();
    let targets: Vec<Option<&str>> = suggestion
        .mappings
        .iter()
        .map(|m| m.target_field.as_deref())
        .collect();
    assert_eq!(
        targets,
        vec![Some("name"), Some("email"), Some("lead_status"), Some("phone")]
    );
}

#[tokio::test]
async fn test_preview_keeps_duplicate_header_cells() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(db_path);

    let preview = api
        .preview_lead_file("leads.csv", b"Phone,Phone\n111,222\n")
        .await
        .unwrap();
    let json = serde_json::to_value(&preview).unwrap();

    assert_eq!(json["headers"], serde_json::json!(["Phone", "Phone"]));
    assert_eq!(json["rows"], serde_json::json!([["111", "222"]]));
    assert_eq!(json["totalRows"], 1);
}

#[tokio::test]
async fn test_preview_row_limit_from_config() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(db_path);
    api.set_import_config("import.preview_row_limit", "1").unwrap();

    let preview = api.preview_lead_file("leads.csv", &sample_csv()).await.unwrap();

    assert_eq!(preview.rows.len(), 1);
    assert_eq!(preview.total_rows, 3);
}

// ==========================================
// 测试用例 4: 字段定义 / 模板 / 配置
// ==========================================
#[tokio::test]
async fn test_field_definitions_follow_require_email_config() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(db_path);

    let before = api.get_lead_field_definitions().await.unwrap();
    let email = before.iter().find(|d| d.field == "email").unwrap();
    assert!(!email.required);

    api.set_import_config("import.require_email", "true").unwrap();

    let after = api.get_lead_field_definitions().await.unwrap();
    let email = after.iter().find(|d| d.field == "email").unwrap();
    assert!(email.required);
    assert_eq!(after.len(), before.len());
}

#[tokio::test]
async fn test_download_generic_template() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(db_path);

    let template = api.download_generic_template(false).await.unwrap();
    let header = template.lines().next().unwrap();

    assert!(header.starts_with("name (required)"));
    assert_eq!(template.lines().count(), 1);

    let with_examples = api.download_generic_template(true).await.unwrap();
    assert_eq!(with_examples.lines().count(), 2);
}

#[test]
fn test_set_unknown_config_key_is_rejected() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(db_path);

    let err = api.set_import_config("import.batch_size", "10").unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let snapshot = api.get_import_config_snapshot().unwrap();
    assert!(!snapshot.contains("import.batch_size"));
}

#[test]
fn test_register_duplicate_user_is_rejected() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(db_path);

    api.register_user("owner@crm.test", "Owner").unwrap();
    let err = api.register_user("OWNER@crm.test", "Owner Again").unwrap_err();

    assert_eq!(err.status_code(), 400);
}
