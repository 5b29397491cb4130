// ==========================================
// 用药门诊排期系统 - 日容量台账领域模型
// ==========================================
// 红线: 容量约束跨所有用药分组共享
// 用途: 分钟池管理,超限检测,槽位推荐
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// DayLedger - 日容量台账
// ==========================================
// 系统中唯一的共享可变状态: 门诊日 -> 全分组累计已落位分钟数。
// 所有读写必须经过本类型的访问方法,禁止在引擎里另行累加,
// 否则台账与落位结果会漂移。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayLedger {
    // ===== 容量参数 =====
    capacity_min: u32,                   // 单日容量上限 (分钟)

    // ===== 实际使用 =====
    totals: BTreeMap<NaiveDate, u32>,    // 门诊日 -> 累计分钟 (缺省即 0)
}

impl DayLedger {
    /// 创建空台账
    ///
    /// # 参数
    /// - `capacity_min`: 单日容量上限 (分钟)
    pub fn new(capacity_min: u32) -> Self {
        Self {
            capacity_min,
            totals: BTreeMap::new(),
        }
    }

    /// 单日容量上限 (分钟)
    pub fn capacity_min(&self) -> u32 {
        self.capacity_min
    }

    /// 记入一笔落位时长
    pub fn add(&mut self, day: NaiveDate, duration_min: u32) {
        *self.totals.entry(day).or_insert(0) += duration_min;
    }

    /// 移除一笔落位时长 (移动预约时调用)
    ///
    /// 台账余额不足时饱和到 0,并且清理归零条目,
    /// 保证序列化输出只含真实占用的日期。
    pub fn remove(&mut self, day: NaiveDate, duration_min: u32) {
        if let Some(total) = self.totals.get_mut(&day) {
            *total = total.saturating_sub(duration_min);
            if *total == 0 {
                self.totals.remove(&day);
            }
        }
    }

    /// 查询某日累计分钟数 (无记录即 0)
    pub fn total_for(&self, day: NaiveDate) -> u32 {
        self.totals.get(&day).copied().unwrap_or(0)
    }

    /// 按日期序遍历所有有占用的日期
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
        self.totals.iter().map(|(d, t)| (*d, *t))
    }

    /// 统计超限天数
    pub fn overflow_days(&self) -> usize {
        self.totals
            .values()
            .filter(|&&t| t > self.capacity_min)
            .count()
    }

    /// 全部日期累计分钟总和
    pub fn total_minutes(&self) -> u64 {
        self.totals.values().map(|&t| u64::from(t)).sum()
    }
}

// ==========================================
// Trait: CapacityConstraint
// ==========================================
// 用途: 引擎侧容量约束检查接口
pub trait CapacityConstraint {
    /// 检查某日是否还放得下指定时长
    fn can_accept(&self, day: NaiveDate, duration_min: u32) -> bool;

    /// 检查某日是否已超限
    fn is_overflow(&self, day: NaiveDate) -> bool;

    /// 计算某日剩余容量 (分钟)
    fn remaining_min(&self, day: NaiveDate) -> u32;

    /// 计算某日超限分钟数
    fn overflow_min(&self, day: NaiveDate) -> u32;
}

// ==========================================
// CapacityConstraint trait 实现
// ==========================================
impl CapacityConstraint for DayLedger {
    /// 检查某日是否还放得下指定时长
    ///
    /// # 返回
    /// - `true`: 累计 + 时长不超过容量上限
    /// - `false`: 会超过容量上限
    fn can_accept(&self, day: NaiveDate, duration_min: u32) -> bool {
        self.total_for(day) + duration_min <= self.capacity_min
    }

    /// 检查某日是否已超限
    fn is_overflow(&self, day: NaiveDate) -> bool {
        self.total_for(day) > self.capacity_min
    }

    /// 计算某日剩余容量
    ///
    /// # 返回
    /// 剩余分钟数,已超限时为 0
    fn remaining_min(&self, day: NaiveDate) -> u32 {
        self.capacity_min.saturating_sub(self.total_for(day))
    }

    /// 计算某日超限分钟数
    ///
    /// # 返回
    /// 超出容量上限的分钟数,未超限时为 0
    fn overflow_min(&self, day: NaiveDate) -> u32 {
        self.total_for(day).saturating_sub(self.capacity_min)
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_add_and_total() {
        let mut ledger = DayLedger::new(540);
        ledger.add(date(10), 60);
        ledger.add(date(10), 90);

        assert_eq!(ledger.total_for(date(10)), 150);
        assert_eq!(ledger.total_for(date(11)), 0); // 无记录即 0
    }

    #[test]
    fn test_remove_clears_zero_entries() {
        let mut ledger = DayLedger::new(540);
        ledger.add(date(10), 60);
        ledger.remove(date(10), 60);

        assert_eq!(ledger.total_for(date(10)), 0);
        assert_eq!(ledger.iter().count(), 0);
    }

    #[test]
    fn test_can_accept_boundary() {
        let mut ledger = DayLedger::new(540);
        ledger.add(date(10), 480);

        assert!(ledger.can_accept(date(10), 60)); // 480 + 60 = 540 恰好满
        assert!(!ledger.can_accept(date(10), 61)); // 超 1 分钟即拒绝
    }

    #[test]
    fn test_overflow_accounting() {
        let mut ledger = DayLedger::new(540);
        ledger.add(date(10), 600); // 超限必须如实记录,不得隐藏

        assert!(ledger.is_overflow(date(10)));
        assert_eq!(ledger.overflow_min(date(10)), 60);
        assert_eq!(ledger.remaining_min(date(10)), 0);
        assert_eq!(ledger.overflow_days(), 1);
    }

    #[test]
    fn test_iter_is_chronological() {
        let mut ledger = DayLedger::new(540);
        ledger.add(date(12), 30);
        ledger.add(date(3), 30);
        ledger.add(date(25), 30);

        let days: Vec<NaiveDate> = ledger.iter().map(|(d, _)| d).collect();
        assert_eq!(days, vec![date(3), date(12), date(25)]);
    }
}
