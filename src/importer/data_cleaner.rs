// ==========================================
// 销售 CRM 线索导入 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 电话与邮箱规范化
// ==========================================

use crate::importer::lead_importer_trait::DataCleaner as DataCleanerTrait;

/// 电话号码最少位数
pub const MIN_PHONE_DIGITS: usize = 10;

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn normalize_null(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn clean_phone(&self, value: &str) -> String {
        value.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    fn clean_email(&self, value: &str) -> String {
        value.trim().to_lowercase()
    }
}

impl DataCleaner {
    /// 电话号码是否满足最少位数（基于清洗后的数字串）
    pub fn is_valid_phone(&self, digits: &str) -> bool {
        digits.len() >= MIN_PHONE_DIGITS
    }

    /// 邮箱格式校验：必须包含 '@'
    pub fn is_valid_email(&self, value: &str) -> bool {
        value.contains('@')
    }
}
