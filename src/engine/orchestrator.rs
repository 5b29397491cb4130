// ==========================================
// 用药门诊排期系统 - 引擎编排器
// ==========================================
// 用途: 协调初始分配与再平衡的执行顺序,汇总输出契约
// 红线: 每次调用重建台账,不跨调用共享任何状态
// ==========================================

use crate::config::SchedulerConfig;
use crate::domain::{Appointment, DayLedger};
use crate::engine::allocator::Allocator;
use crate::engine::rebalancer::Rebalancer;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

// ==========================================
// ScheduleRunResult - 排期结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRunResult {
    /// 本次排期运行ID
    pub run_id: Uuid,

    // 再平衡输出
    pub scheduled: Vec<Appointment>,

    // 初始分配输出: 原始月份内无容量的预约 (无落位日期)
    pub unassigned: Vec<Appointment>,

    /// 日容量台账 (与 scheduled 按日求和一致)
    pub ledger: DayLedger,

    // ===== 运行统计 =====
    pub iteration_cap_hit: bool,   // 再平衡命中轮次上限
    pub overflow_days: usize,      // 残余超限天数
    pub moved_count: usize,        // 偏离原始日期的预约条数
    pub total_minutes: u64,        // 已落位分钟总和
}

// ==========================================
// ScheduleOrchestrator - 引擎编排器
// ==========================================
pub struct ScheduleOrchestrator {
    allocator: Allocator,
    rebalancer: Rebalancer,
}

impl ScheduleOrchestrator {
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - `config`: 排期配置
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            allocator: Allocator::new(config),
            rebalancer: Rebalancer::new(config),
        }
    }

    /// 执行完整排期流程
    ///
    /// # 参数
    /// - `appointments`: 已清洗的预约列表 (导入层保证字段完整)
    ///
    /// # 返回
    /// 排期结果 (再平衡预约 + 未落位预约 + 台账 + 统计)
    pub fn run(&self, appointments: Vec<Appointment>) -> ScheduleRunResult {
        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            total = appointments.len(),
            "开始执行排期流程"
        );

        // ==========================================
        // 步骤1: 初始分配 (分组贪心首次适配)
        // ==========================================
        debug!("步骤1: 执行初始分配");
        let allocation = self.allocator.allocate(appointments);
        info!(
            assigned = allocation.assigned.len(),
            unassigned = allocation.unassigned.len(),
            "初始分配完成"
        );

        // ==========================================
        // 步骤2: 再平衡 (跨组共享容量修复 + 压实)
        // ==========================================
        debug!("步骤2: 执行再平衡");
        let rebalance = self.rebalancer.rebalance(allocation.assigned);
        info!(
            moves_applied = rebalance.moves_applied,
            iteration_cap_hit = rebalance.iteration_cap_hit,
            "再平衡完成"
        );

        // ==========================================
        // 步骤3: 汇总输出契约
        // ==========================================
        let moved_count = rebalance
            .appointments
            .iter()
            .filter(|a| a.days_moved.unwrap_or(0) != 0)
            .count();
        let overflow_days = rebalance.ledger.overflow_days();
        let total_minutes = rebalance.ledger.total_minutes();

        info!(
            run_id = %run_id,
            scheduled = rebalance.appointments.len(),
            moved_count,
            overflow_days,
            total_minutes,
            "排期流程完成"
        );

        ScheduleRunResult {
            run_id,
            scheduled: rebalance.appointments,
            unassigned: allocation.unassigned,
            ledger: rebalance.ledger,
            iteration_cap_hit: rebalance.iteration_cap_hit,
            overflow_days,
            moved_count,
            total_minutes,
        }
    }
}
