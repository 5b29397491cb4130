// ==========================================
// 用药门诊排期系统 - 导入层
// ==========================================
// 职责: 历史预约文件导入, 生成引擎输入预约列表
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod record_mapper;

// 重导出核心类型
pub use data_cleaner::{DataCleaner, DroppedRow, ImportReport};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
pub use record_mapper::{RawAppointmentRow, RecordMapper};

use crate::domain::Appointment;
use std::path::Path;
use tracing::{debug, info, warn};

// ==========================================
// AppointmentImporter - 预约导入编排器
// ==========================================
// 流程: 文件解析 -> 记录映射 -> 数据清洗 -> 顺序编号
pub struct AppointmentImporter;

impl AppointmentImporter {
    /// 导入历史预约文件
    ///
    /// # 参数
    /// - `path`: 输入文件路径 (.csv / .xlsx / .xls)
    ///
    /// # 返回
    /// 清洗通过的预约列表 + 导入报告 (废弃行带原因)
    pub fn import_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> ImportResult<(Vec<Appointment>, ImportReport)> {
        let path = path.as_ref();
        info!(file = %path.display(), "开始导入预约文件");

        let raw_rows = UniversalFileParser.parse(path)?;
        let mut report = ImportReport::new(raw_rows.len());

        let mapper = RecordMapper;
        let cleaner = DataCleaner;
        let mut appointments = Vec::new();

        for (idx, row_map) in raw_rows.iter().enumerate() {
            let row_number = idx + 1;

            // 映射失败按行废弃, 不阻断整个导入
            let raw_row = match mapper.map_row(row_map, row_number) {
                Ok(r) => r,
                Err(e) => {
                    debug!(row = row_number, reason = %e, "行映射失败, 废弃");
                    report.record_drop(row_number, e.to_string());
                    continue;
                }
            };

            match cleaner.clean_row(&raw_row) {
                Ok(cleaned) => {
                    // 预约编号按保留顺序分配, 保证重复导入结果一致
                    let appt_id = appointments.len() as i64 + 1;
                    appointments.push(Appointment::new(
                        appt_id,
                        cleaned.medication,
                        cleaned.duration_min,
                        cleaned.original_date,
                        cleaned.created_at,
                    ));
                    report.record_imported();
                }
                Err(reason) => {
                    debug!(row = row_number, reason = %reason, "行清洗未通过, 废弃");
                    report.record_drop(row_number, reason);
                }
            }
        }

        if !report.dropped.is_empty() {
            warn!(
                dropped = report.dropped.len(),
                total = report.total_rows,
                "部分行被废弃"
            );
        }
        info!(
            imported = report.imported,
            total = report.total_rows,
            "预约文件导入完成"
        );

        Ok((appointments, report))
    }
}
