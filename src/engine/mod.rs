// ==========================================
// 用药门诊排期系统 - 引擎层
// ==========================================
// 职责: 排期业务规则 (门诊日历 / 初始分配 / 再平衡 / 槽位推荐)
// 红线: 引擎不做 IO, 输入输出全部走内存数据结构
// ==========================================

pub mod allocator;
pub mod calendar;
pub mod orchestrator;
pub mod rebalancer;
pub mod suggester;

// 重导出核心引擎
pub use allocator::{AllocationResult, Allocator};
pub use calendar::ClinicCalendar;
pub use orchestrator::{ScheduleOrchestrator, ScheduleRunResult};
pub use rebalancer::{RebalanceResult, Rebalancer};
pub use suggester::{SlotSuggester, SlotSuggestion};
