// ==========================================
// 用药门诊排期系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含引擎逻辑,不含文件解析逻辑
// ==========================================

pub mod appointment;
pub mod ledger;

// 重导出核心类型
pub use appointment::Appointment;
pub use ledger::{CapacityConstraint, DayLedger};
