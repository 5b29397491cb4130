// ==========================================
// 用药门诊排期系统 - 核心库
// ==========================================
// 技术栈: Rust + CLI
// 系统定位: 决策支持系统 (人工最终控制权)
// 红线: 单次调用内完成全部计算,不跨调用持久化状态
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{Appointment, CapacityConstraint, DayLedger};

// 引擎
pub use engine::{
    AllocationResult, Allocator, ClinicCalendar, RebalanceResult, Rebalancer, ScheduleOrchestrator,
    ScheduleRunResult, SlotSuggester, SlotSuggestion,
};

// 导入
pub use importer::{AppointmentImporter, ImportError, ImportReport, ImportResult};

// 配置
pub use config::{ConfigError, SchedulerConfig};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "用药门诊排期系统";

// ==========================================
// 预编译检查
// ==========================================
