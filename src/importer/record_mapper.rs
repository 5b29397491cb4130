// ==========================================
// 用药门诊排期系统 - 预约记录映射器
// ==========================================
// 职责: 原始行记录 -> 类型化预约行 (字段提取 + 日期时间解析)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

// 支持的日期时间格式 (按尝试顺序)
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

// ==========================================
// RawAppointmentRow - 类型化预约行
// ==========================================
// 字段均为 Option: 缺失与否由清洗层裁决,映射层只负责解析
#[derive(Debug, Clone)]
pub struct RawAppointmentRow {
    pub status: Option<String>,
    pub medication: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDate>,

    // 元信息 (1-based 数据行号, 用于废弃原因定位)
    pub row_number: usize,
}

// ==========================================
// RecordMapper - 记录映射器
// ==========================================
pub struct RecordMapper;

impl RecordMapper {
    /// 映射单行原始记录为类型化预约行
    ///
    /// # 参数
    /// - `row`: 表头 -> 单元格文本
    /// - `row_number`: 数据行号 (1-based)
    pub fn map_row(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<RawAppointmentRow> {
        Ok(RawAppointmentRow {
            status: self.get_string(row, "Status"),
            medication: self.get_string(row, "Medication"),
            start: self.parse_datetime(row, "Start", row_number)?,
            end: self.parse_datetime(row, "End", row_number)?,
            created_at: self.parse_date(row, "Created At", row_number)?,
            row_number,
        })
    }

    /// 提取字符串字段 (TRIM, 空串视为缺失), 支持列名别名
    fn get_string(&self, row: &HashMap<String, String>, key: &str) -> Option<String> {
        let aliases: Vec<&str> = match key {
            "Created At" => vec!["Created At", "Created"],
            "Medication" => vec!["Medication", "Medication Group"],
            _ => vec![key],
        };

        for alias in aliases {
            if let Some(v) = row.get(alias) {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }

    /// 解析日期时间字段
    fn parse_datetime(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<NaiveDateTime>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => {
                for fmt in DATETIME_FORMATS {
                    if let Ok(dt) = NaiveDateTime::parse_from_str(&value, fmt) {
                        return Ok(Some(dt));
                    }
                }
                Err(ImportError::DateFormatError {
                    row: row_number,
                    field: key.to_string(),
                    value,
                })
            }
        }
    }

    /// 解析日期字段 (接受纯日期或日期时间, 仅保留日期部分)
    fn parse_date(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<NaiveDate>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => {
                if let Ok(d) = NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
                    return Ok(Some(d));
                }
                if let Ok(d) = NaiveDate::parse_from_str(&value, "%Y/%m/%d") {
                    return Ok(Some(d));
                }
                for fmt in DATETIME_FORMATS {
                    if let Ok(dt) = NaiveDateTime::parse_from_str(&value, fmt) {
                        return Ok(Some(dt.date()));
                    }
                }
                Err(ImportError::DateFormatError {
                    row: row_number,
                    field: key.to_string(),
                    value,
                })
            }
        }
    }
}
