// ==========================================
// 用药门诊排期系统 - 初始分配引擎
// ==========================================
// 红线: 只在预约原始月份内寻找落位日,绝不跨月
// ==========================================
// 职责: 分组贪心首次适配 (按日期批次的 first-fit-decreasing)
// 输入: 已清洗预约列表
// 输出: 已落位预约 + 未落位预约
// ==========================================

use crate::config::SchedulerConfig;
use crate::domain::Appointment;
use crate::engine::calendar::ClinicCalendar;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

// ==========================================
// AllocationResult - 初始分配结果
// ==========================================
/// 每条预约要么落位在其原始月份的某个门诊日,要么进入未落位集合
#[derive(Debug, Clone)]
pub struct AllocationResult {
    pub assigned: Vec<Appointment>,
    pub unassigned: Vec<Appointment>,
}

// ==========================================
// Allocator - 初始分配引擎
// ==========================================
pub struct Allocator {
    capacity_min: u32,
    calendar: ClinicCalendar,
}

impl Allocator {
    /// 从排期配置创建分配引擎
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            capacity_min: config.capacity_minutes,
            calendar: ClinicCalendar::from_config(config),
        }
    }

    /// 执行初始分配
    ///
    /// 规则:
    /// 1) 按用药分组独立处理,各组使用私有的日分钟桶
    ///    (跨组共享容量由再平衡引擎处理)
    /// 2) 组内按 (原始日期升序, 时长降序, ID升序) 排序
    /// 3) 候选日 = 原始月份门诊日,且不早于创建日期,
    ///    按与原始日期的绝对距离升序 (就近优先)
    /// 4) 首次适配: 取第一个放得下的候选日
    /// 5) 无候选日放得下则进入未落位集合
    ///
    /// # 参数
    /// - `appointments`: 已清洗预约列表
    ///
    /// # 返回
    /// (已落位预约列表, 未落位预约列表)
    #[instrument(skip(self, appointments), fields(total = appointments.len()))]
    pub fn allocate(&self, appointments: Vec<Appointment>) -> AllocationResult {
        let mut assigned = Vec::new();
        let mut unassigned = Vec::new();

        // 1. 按用药分组 (BTreeMap 保证分组处理顺序确定)
        let mut groups: BTreeMap<String, Vec<Appointment>> = BTreeMap::new();
        for appt in appointments {
            groups.entry(appt.medication.clone()).or_default().push(appt);
        }

        for (medication, mut group) in groups {
            // 2. 组内排序: 早的申请先处理,同日大块优先装箱
            group.sort_by(|a, b| {
                a.original_date
                    .cmp(&b.original_date)
                    .then(b.duration_min.cmp(&a.duration_min))
                    .then(a.appt_id.cmp(&b.appt_id))
            });

            // 组私有日分钟桶
            let mut bucket: HashMap<NaiveDate, u32> = HashMap::new();

            for mut appt in group {
                // 3. 候选日: 原始月份内,就近优先,且不早于创建日期
                let mut candidates = self.calendar.clinic_days_for_date(appt.original_date);
                candidates.retain(|day| *day >= appt.created_at);
                candidates.sort_by_key(|day| {
                    ((*day - appt.original_date).num_days().abs(), *day)
                });

                // 4. 首次适配
                let slot = candidates.into_iter().find(|day| {
                    bucket.get(day).copied().unwrap_or(0) + appt.duration_min
                        <= self.capacity_min
                });

                match slot {
                    Some(day) => {
                        *bucket.entry(day).or_insert(0) += appt.duration_min;
                        appt.assigned_date = Some(day);
                        assigned.push(appt);
                    }
                    None => {
                        // 5. 原始月份内无可用容量
                        debug!(
                            appt_id = appt.appt_id,
                            medication = %medication,
                            duration_min = appt.duration_min,
                            original_date = %appt.original_date,
                            "原始月份内无可落位门诊日,转入未落位集合"
                        );
                        appt.assigned_date = None;
                        appt.days_moved = None;
                        unassigned.push(appt);
                    }
                }
            }
        }

        AllocationResult {
            assigned,
            unassigned,
        }
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_allocator() -> Allocator {
        Allocator::new(&SchedulerConfig::default())
    }

    fn appt(id: i64, medication: &str, duration: u32, original: NaiveDate) -> Appointment {
        Appointment::new(
            id,
            medication.to_string(),
            duration,
            original,
            // 创建日期统一取月初,不干扰容量相关断言
            NaiveDate::from_ymd_opt(original.year(), original.month(), 1).unwrap(),
        )
    }

    // ==========================================
    // 基础功能测试
    // ==========================================

    #[test]
    fn test_exact_fit_packs_single_day() {
        // 9 x 60 = 540 恰好填满首个门诊日
        let allocator = test_allocator();
        let first_clinic_day = date(2026, 3, 3); // 2026 年 3 月首个周二

        let appointments: Vec<Appointment> = (0..9)
            .map(|i| appt(i, "METHOTREXATE", 60, first_clinic_day))
            .collect();

        let result = allocator.allocate(appointments);

        assert_eq!(result.assigned.len(), 9);
        assert_eq!(result.unassigned.len(), 0);
        assert!(result
            .assigned
            .iter()
            .all(|a| a.assigned_date == Some(first_clinic_day)));
    }

    #[test]
    fn test_tenth_appointment_spills_to_other_day() {
        // 第 10 条同样的预约放不进已满的当日,必须落到其他门诊日
        let allocator = test_allocator();
        let first_clinic_day = date(2026, 3, 3);

        let appointments: Vec<Appointment> = (0..10)
            .map(|i| appt(i, "METHOTREXATE", 60, first_clinic_day))
            .collect();

        let result = allocator.allocate(appointments);

        assert_eq!(result.assigned.len(), 10);
        assert_eq!(result.unassigned.len(), 0);

        let on_first_day = result
            .assigned
            .iter()
            .filter(|a| a.assigned_date == Some(first_clinic_day))
            .count();
        assert_eq!(on_first_day, 9);

        let spilled = result
            .assigned
            .iter()
            .find(|a| a.assigned_date != Some(first_clinic_day))
            .unwrap();
        assert_ne!(spilled.assigned_date, Some(first_clinic_day));
        assert_eq!(spilled.assigned_date.unwrap().month(), 3);
    }

    #[test]
    fn test_oversized_appointment_always_unassigned() {
        // 600 分钟超过单日容量 540,任何日期都放不下
        let allocator = test_allocator();
        let appointments = vec![appt(1, "INFLIXIMAB", 600, date(2026, 3, 10))];

        let result = allocator.allocate(appointments);

        assert_eq!(result.assigned.len(), 0);
        assert_eq!(result.unassigned.len(), 1);
        assert_eq!(result.unassigned[0].assigned_date, None);
    }

    #[test]
    fn test_month_confinement() {
        // 落位日必须与原始日期同年同月
        let allocator = test_allocator();
        let appointments: Vec<Appointment> = (0..40)
            .map(|i| appt(i, "RITUXIMAB", 240, date(2026, 3, 25)))
            .collect();

        let result = allocator.allocate(appointments);

        for a in &result.assigned {
            let day = a.assigned_date.unwrap();
            assert_eq!(day.year(), 2026);
            assert_eq!(day.month(), 3);
        }
    }

    #[test]
    fn test_nearest_day_preferred() {
        // 空日历下首条预约应落在离原始日期最近的门诊日
        let allocator = test_allocator();
        // 2026-03-11 本身是周三,最近门诊日即当日
        let appointments = vec![appt(1, "METHOTREXATE", 60, date(2026, 3, 11))];

        let result = allocator.allocate(appointments);
        assert_eq!(result.assigned[0].assigned_date, Some(date(2026, 3, 11)));
    }

    #[test]
    fn test_groups_use_private_buckets() {
        // 两个分组各自 9 x 60,初始分配阶段互不挤占,允许同日叠加
        let allocator = test_allocator();
        let first_clinic_day = date(2026, 3, 3);

        let mut appointments = Vec::new();
        for i in 0..9 {
            appointments.push(appt(i, "METHOTREXATE", 60, first_clinic_day));
            appointments.push(appt(100 + i, "RITUXIMAB", 60, first_clinic_day));
        }

        let result = allocator.allocate(appointments);

        assert_eq!(result.assigned.len(), 18);
        assert!(result
            .assigned
            .iter()
            .all(|a| a.assigned_date == Some(first_clinic_day)));
    }

    #[test]
    fn test_candidate_days_respect_creation_date() {
        // 创建日期晚于月内前几个门诊日时,不得落位到创建日期之前
        let allocator = test_allocator();
        let mut a = appt(1, "METHOTREXATE", 60, date(2026, 3, 4));
        a.created_at = date(2026, 3, 10);

        let result = allocator.allocate(vec![a]);

        assert_eq!(result.assigned.len(), 1);
        assert!(result.assigned[0].assigned_date.unwrap() >= date(2026, 3, 10));
    }

    #[test]
    fn test_larger_duration_first_within_same_date() {
        // 同日批次内大块优先: 300+240 恰好填满,60 的被挤到次近门诊日
        let allocator = test_allocator();
        let day = date(2026, 3, 3);

        // 2026-03-04 (周三) 为次近门诊日
        let appointments = vec![
            appt(1, "METHOTREXATE", 60, day),
            appt(2, "METHOTREXATE", 300, day),
            appt(3, "METHOTREXATE", 240, day),
        ];

        let result = allocator.allocate(appointments);

        let by_id = |id: i64| {
            result
                .assigned
                .iter()
                .find(|a| a.appt_id == id)
                .unwrap()
                .assigned_date
                .unwrap()
        };
        assert_eq!(by_id(2), day);
        assert_eq!(by_id(3), day);
        assert_eq!(by_id(1), date(2026, 3, 4));
    }
}
