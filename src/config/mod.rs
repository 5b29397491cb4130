// ==========================================
// 用药门诊排期系统 - 配置层
// ==========================================
// 职责: 系统配置管理,缺省值 + 文件覆写
// ==========================================

pub mod scheduler_config;

// 重导出核心配置类型
pub use scheduler_config::{ConfigError, SchedulerConfig};
