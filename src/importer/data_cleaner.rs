// ==========================================
// 用药门诊排期系统 - 数据清洗器实现
// ==========================================
// 职责: 状态过滤 / 缺失字段废弃 / 时长折算 (秒 -> 四舍五入分钟)
// 红线: 废弃行必须带行号与原因, 不允许静默丢弃
// ==========================================

use crate::importer::record_mapper::RawAppointmentRow;
use chrono::NaiveDate;
use serde::Serialize;

// 仅保留已完成状态的历史预约
const STATUS_COMPLETE: &str = "Complete";

// ==========================================
// ImportReport - 导入报告
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub imported: usize,
    pub dropped: Vec<DroppedRow>,
}

/// 废弃行记录 (行号 + 原因)
#[derive(Debug, Clone, Serialize)]
pub struct DroppedRow {
    pub row_number: usize,
    pub reason: String,
}

impl ImportReport {
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            imported: 0,
            dropped: Vec::new(),
        }
    }

    pub fn record_drop(&mut self, row_number: usize, reason: String) {
        self.dropped.push(DroppedRow { row_number, reason });
    }

    pub fn record_imported(&mut self) {
        self.imported += 1;
    }
}

// ==========================================
// CleanedAppointment - 清洗通过的预约字段
// ==========================================
// 预约编号由导入编排层按保留顺序统一分配
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedAppointment {
    pub medication: String,
    pub duration_min: u32,
    pub original_date: NaiveDate,
    pub created_at: NaiveDate,
}

// ==========================================
// DataCleaner - 数据清洗器
// ==========================================
pub struct DataCleaner;

impl DataCleaner {
    /// 清洗单行类型化预约
    ///
    /// # 返回
    /// - `Ok`: 清洗通过的预约字段
    /// - `Err`: 废弃原因
    pub fn clean_row(&self, row: &RawAppointmentRow) -> Result<CleanedAppointment, String> {
        // 状态过滤
        match row.status.as_deref() {
            None => return Err("缺失 Status".to_string()),
            Some(s) if s != STATUS_COMPLETE => {
                return Err(format!("状态非 {}: {}", STATUS_COMPLETE, s));
            }
            Some(_) => {}
        }

        let medication = row
            .medication
            .clone()
            .ok_or_else(|| "缺失 Medication".to_string())?;
        let start = row.start.ok_or_else(|| "缺失 Start".to_string())?;
        let end = row.end.ok_or_else(|| "缺失 End".to_string())?;
        let created_at = row.created_at.ok_or_else(|| "缺失 Created At".to_string())?;

        // 时长折算: 秒差四舍五入到分钟, 必须为正
        let secs = (end - start).num_seconds();
        let minutes = (secs as f64 / 60.0).round() as i64;
        if minutes <= 0 {
            return Err(format!("预约时长非正: {} 分钟", minutes));
        }

        Ok(CleanedAppointment {
            medication,
            duration_min: minutes as u32,
            original_date: start.date(),
            created_at,
        })
    }
}
