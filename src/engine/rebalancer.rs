// ==========================================
// 用药门诊排期系统 - 再平衡引擎
// ==========================================
// 红线: 容量约束跨全部用药分组共享,台账必须与落位结果一致
// ==========================================
// 职责: 有界局部搜索,消除跨组容量超限并向前压实
// 输入: 初始分配后的已落位预约
// 输出: 再平衡预约列表 + 日容量台账 + 轮次上限命中标记
// ==========================================
// 说明: 这是启发式修复,不是精确求解;轮次上限是安全阀,
// 不保证收敛,命中上限时可能遗留超限,台账如实反映。
// ==========================================

use crate::config::SchedulerConfig;
use crate::domain::{Appointment, CapacityConstraint, DayLedger};
use crate::engine::calendar::ClinicCalendar;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

// ==========================================
// RebalanceResult - 再平衡结果
// ==========================================
#[derive(Debug, Clone)]
pub struct RebalanceResult {
    /// 再平衡后的预约列表 (assigned_date / days_moved 已写入)
    pub appointments: Vec<Appointment>,

    /// 日容量台账,与 appointments 按日求和严格一致
    pub ledger: DayLedger,

    /// 任一分组命中轮次上限 (可能遗留超限,供上游告警)
    pub iteration_cap_hit: bool,

    /// 实际发生的移动次数
    pub moves_applied: usize,
}

// 组内日桶: 门诊日 -> 该组当前落位在该日的预约
type GroupBuckets = BTreeMap<NaiveDate, Vec<Appointment>>;

// ==========================================
// Rebalancer - 再平衡引擎
// ==========================================
pub struct Rebalancer {
    capacity_min: u32,
    max_iterations: u32,
    calendar: ClinicCalendar,
}

impl Rebalancer {
    /// 从排期配置创建再平衡引擎
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            capacity_min: config.capacity_minutes,
            max_iterations: config.max_rebalance_iterations,
            calendar: ClinicCalendar::from_config(config),
        }
    }

    /// 执行再平衡
    ///
    /// 算法 (按分组独立迭代,但共享同一台账):
    /// 1) 台账初始化为全分组按日真实分钟和
    /// 2) 门诊日全集 = 所有落位日期触及月份的并集
    /// 3) 逐组扫描: 超限日按时长降序外移 (先就近向前,再就近向后),
    ///    随后把后面日子的预约就近拉回当前日补满空隙 (压实)
    /// 4) 整轮无移动即该组收敛;达到轮次上限则带标记返回
    ///
    /// # 参数
    /// - `assigned`: 初始分配产出的已落位预约
    ///
    /// # 返回
    /// 再平衡结果 (预约列表 + 台账 + 上限命中标记)
    #[instrument(skip(self, assigned), fields(total = assigned.len()))]
    pub fn rebalance(&self, assigned: Vec<Appointment>) -> RebalanceResult {
        // ===== 步骤1: 构建共享台账 (全分组真实和) =====
        let mut ledger = DayLedger::new(self.capacity_min);
        for appt in &assigned {
            if let Some(day) = appt.assigned_date {
                ledger.add(day, appt.duration_min);
            }
        }

        // ===== 步骤2: 门诊日全集 (触及月份的并集,跨月共享台账) =====
        let months: BTreeSet<(i32, u32)> = assigned
            .iter()
            .filter_map(|a| a.assigned_date)
            .map(|d| (d.year(), d.month()))
            .collect();
        let days_sorted = self.calendar.clinic_days_for_months(months);

        // ===== 步骤3: 逐组再平衡 (BTreeMap 保证分组顺序确定) =====
        let mut groups: BTreeMap<String, GroupBuckets> = BTreeMap::new();
        for appt in assigned {
            let Some(day) = appt.assigned_date else {
                // 防御: 未落位记录不属于再平衡输入,原样跳过桶构建
                continue;
            };
            groups
                .entry(appt.medication.clone())
                .or_default()
                .entry(day)
                .or_default()
                .push(appt);
        }

        let mut iteration_cap_hit = false;
        let mut moves_applied = 0usize;

        for (medication, buckets) in groups.iter_mut() {
            let cap_hit = self.rebalance_group(buckets, &days_sorted, &mut ledger, &mut moves_applied);
            if cap_hit {
                warn!(
                    medication = %medication,
                    max_iterations = self.max_iterations,
                    "再平衡命中轮次上限,可能遗留容量超限"
                );
                iteration_cap_hit = true;
            }
        }

        // ===== 步骤4: 定稿 (写入落位日期与偏移天数) =====
        let mut appointments = Vec::new();
        for buckets in groups.into_values() {
            for (day, mut appts) in buckets {
                // 日内按 ID 排序,保证输出顺序确定
                appts.sort_by_key(|a| a.appt_id);
                for mut appt in appts {
                    appt.assigned_date = Some(day);
                    appt.days_moved = Some((day - appt.original_date).num_days());
                    appointments.push(appt);
                }
            }
        }

        let overflow_days = ledger.overflow_days();
        if overflow_days > 0 {
            warn!(overflow_days, "再平衡后仍有超限门诊日 (无可行修复移动)");
        }

        RebalanceResult {
            appointments,
            ledger,
            iteration_cap_hit,
            moves_applied,
        }
    }

    /// 单个分组的再平衡主循环
    ///
    /// # 返回
    /// - `true`: 命中轮次上限时仍有移动发生 (未确认收敛)
    /// - `false`: 整轮无移动,已收敛
    fn rebalance_group(
        &self,
        buckets: &mut GroupBuckets,
        days_sorted: &[NaiveDate],
        ledger: &mut DayLedger,
        moves_applied: &mut usize,
    ) -> bool {
        let mut iteration = 0u32;
        let mut changed = true;

        while changed && iteration < self.max_iterations {
            iteration += 1;
            changed = false;

            for (i, &day) in days_sorted.iter().enumerate() {
                // ----- 超限消解: 组内和 或 共享台账 任一超限都要外移 -----
                loop {
                    let local_total: u32 = buckets
                        .get(&day)
                        .map(|v| v.iter().map(|a| a.duration_min).sum())
                        .unwrap_or(0);
                    if local_total <= self.capacity_min && !ledger.is_overflow(day) {
                        break;
                    }

                    if self.relieve_overflow_once(buckets, days_sorted, i, day, ledger) {
                        *moves_applied += 1;
                        changed = true;
                    } else {
                        // 无可行修复移动: 接受该日残余超限,处理下一个门诊日
                        debug!(
                            day = %day,
                            ledger_total = ledger.total_for(day),
                            "该日无可行外移,保留残余超限"
                        );
                        break;
                    }
                }

                // ----- 压实: 把后面日子的预约就近拉回当前日 -----
                for &later_day in &days_sorted[i + 1..] {
                    // 快照候选 ID,移动过程中桶会变化
                    let candidate_ids: Vec<i64> = buckets
                        .get(&later_day)
                        .map(|v| v.iter().map(|a| a.appt_id).collect())
                        .unwrap_or_default();

                    for appt_id in candidate_ids {
                        let Some(later_appts) = buckets.get_mut(&later_day) else {
                            break;
                        };
                        let Some(pos) = later_appts.iter().position(|a| a.appt_id == appt_id)
                        else {
                            continue;
                        };

                        let duration = later_appts[pos].duration_min;
                        let created_at = later_appts[pos].created_at;

                        // 创建日期约束 + 共享容量约束
                        if day < created_at || !ledger.can_accept(day, duration) {
                            continue;
                        }

                        let appt = later_appts.remove(pos);
                        ledger.remove(later_day, duration);
                        ledger.add(day, duration);
                        buckets.entry(day).or_default().push(appt);
                        *moves_applied += 1;
                        changed = true;
                    }
                }
            }
        }

        // 上限命中: 最后一轮仍有移动,收敛未确认
        changed
    }

    /// 尝试从超限日外移一条预约 (一次成功移动即返回)
    ///
    /// 按时长降序逐条尝试: 先向更早的门诊日就近搜索,再向更晚的
    /// 门诊日就近搜索;目标日必须不早于创建日期且共享台账放得下。
    ///
    /// # 返回
    /// - `true`: 发生了一次移动
    /// - `false`: 该日所有预约在两个方向上都无可行目标日
    fn relieve_overflow_once(
        &self,
        buckets: &mut GroupBuckets,
        days_sorted: &[NaiveDate],
        day_index: usize,
        day: NaiveDate,
        ledger: &mut DayLedger,
    ) -> bool {
        let Some(appts) = buckets.get_mut(&day) else {
            return false;
        };
        if appts.is_empty() {
            return false;
        }

        // 大块优先外移,同时长按 ID 保证确定性
        appts.sort_by(|a, b| {
            b.duration_min
                .cmp(&a.duration_min)
                .then(a.appt_id.cmp(&b.appt_id))
        });

        for idx in 0..appts.len() {
            let duration = appts[idx].duration_min;
            let created_at = appts[idx].created_at;

            // 向前就近搜索 (已扫描过的更早门诊日)
            let backward = days_sorted[..day_index]
                .iter()
                .rev()
                .copied()
                .find(|d| *d >= created_at && ledger.can_accept(*d, duration));

            // 向后就近搜索 (更晚门诊日,约束同前)
            let target = backward.or_else(|| {
                days_sorted[day_index + 1..]
                    .iter()
                    .copied()
                    .find(|d| *d >= created_at && ledger.can_accept(*d, duration))
            });

            if let Some(target_day) = target {
                let appt = buckets
                    .get_mut(&day)
                    .expect("超限日桶在移动前必然存在")
                    .remove(idx);
                ledger.remove(day, duration);
                ledger.add(target_day, duration);
                buckets.entry(target_day).or_default().push(appt);
                return true;
            }
        }

        false
    }
}
