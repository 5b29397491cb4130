// ==========================================
// 用药门诊排期系统 - 槽位推荐引擎
// ==========================================
// 职责: 基于日容量台账,为新预约请求推荐候选门诊日
// 红线: 纯函数,只读台账,无候选日时返回空列表而非错误
// ==========================================

use crate::config::SchedulerConfig;
use crate::domain::{CapacityConstraint, DayLedger};
use crate::engine::calendar::ClinicCalendar;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

// ==========================================
// SlotSuggestion - 槽位推荐条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSuggestion {
    pub date: NaiveDate,       // 候选门诊日
    pub remaining_min: u32,    // 该日剩余容量 (分钟)
}

// ==========================================
// SlotSuggester - 槽位推荐引擎
// ==========================================
pub struct SlotSuggester {
    limit: usize,
    calendar: ClinicCalendar,
}

impl SlotSuggester {
    /// 从排期配置创建推荐引擎
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            limit: config.suggestion_limit,
            calendar: ClinicCalendar::from_config(config),
        }
    }

    /// 为新预约推荐候选门诊日
    ///
    /// 算法: 枚举期望日期所在月份内、不早于创建日期的门诊日;
    /// 剩余容量 >= 时长的才是候选;按 (与期望日期的距离升序,
    /// 剩余容量降序) 排序,距离优先于余量,返回前 limit 条。
    ///
    /// # 参数
    /// - `ledger`: 再平衡产出的日容量台账
    /// - `proposed_date`: 期望日期
    /// - `duration_min`: 预约时长 (分钟)
    /// - `created_at`: 创建日期,None 时取今天
    ///
    /// # 返回
    /// 排序后的推荐列表,可能为空 (无可行槽位)
    pub fn suggest(
        &self,
        ledger: &DayLedger,
        proposed_date: NaiveDate,
        duration_min: u32,
        created_at: Option<NaiveDate>,
    ) -> Vec<SlotSuggestion> {
        let created_at = created_at.unwrap_or_else(|| Local::now().date_naive());

        let mut candidates: Vec<(i64, SlotSuggestion)> = self
            .calendar
            .clinic_days_for_date(proposed_date)
            .into_iter()
            .filter(|day| *day >= created_at)
            .filter_map(|day| {
                let remaining = ledger.remaining_min(day);
                if remaining < duration_min {
                    return None;
                }
                let distance = (day - proposed_date).num_days().abs();
                Some((
                    distance,
                    SlotSuggestion {
                        date: day,
                        remaining_min: remaining,
                    },
                ))
            })
            .collect();

        // 距离优先,余量次之;同距同余量按日期升序保证确定性
        candidates.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(b.1.remaining_min.cmp(&a.1.remaining_min))
                .then(a.1.date.cmp(&b.1.date))
        });

        candidates
            .into_iter()
            .take(self.limit)
            .map(|(_, s)| s)
            .collect()
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

    fn test_suggester() -> SlotSuggester {
        SlotSuggester::new(&SchedulerConfig::default())
    }

    #[test]
    fn test_distance_wins_over_remaining_capacity() {
        // 期望日期 3/13 (周五,本身非门诊日):
        // 3/12 距 1 天只剩 60 分钟,3/11 距 2 天剩 500 分钟。
        // 请求 50 分钟时,距离近的 3/12 必须排在余量大的 3/11 前面。
        let suggester = test_suggester();
        let proposed = date(13);

        let mut ledger = DayLedger::new(540);
        ledger.add(date(12), 480); // 剩 60
        ledger.add(date(11), 40); // 剩 500

        let suggestions = suggester.suggest(&ledger, proposed, 50, Some(date(1)));

        assert!(suggestions.len() >= 2);
        assert_eq!(suggestions[0].date, date(12));
        assert_eq!(suggestions[0].remaining_min, 60);
        assert_eq!(suggestions[1].date, date(11));
        assert_eq!(suggestions[1].remaining_min, 500);
    }

    #[test]
    fn test_limit_is_three_by_default() {
        let suggester = test_suggester();
        let ledger = DayLedger::new(540); // 全月空闲

        let suggestions = suggester.suggest(&ledger, date(11), 60, Some(date(1)));
        assert_eq!(suggestions.len(), 3);
    }

    #[test]
    fn test_days_with_insufficient_remaining_are_excluded() {
        let suggester = test_suggester();
        let mut ledger = DayLedger::new(540);
        // 全月门诊日都只剩 30 分钟
        for day in ClinicCalendar::new(&[1, 2, 3]).clinic_days_in_month(2026, 3) {
            ledger.add(day, 510);
        }

        let suggestions = suggester.suggest(&ledger, date(11), 60, Some(date(1)));
        assert!(suggestions.is_empty()); // 空结果是合法答案,不是错误
    }

    #[test]
    fn test_days_before_creation_date_are_excluded() {
        let suggester = test_suggester();
        let ledger = DayLedger::new(540);

        let suggestions = suggester.suggest(&ledger, date(11), 60, Some(date(24)));

        assert!(!suggestions.is_empty());
        assert!(suggestions.iter().all(|s| s.date >= date(24)));
    }

    #[test]
    fn test_equidistant_tie_prefers_larger_remaining() {
        let suggester = test_suggester();
        let proposed = date(11); // 周三: 3/10 与 3/12 均距 1 天
        let mut ledger = DayLedger::new(540);
        ledger.add(date(10), 300); // 剩 240
        ledger.add(date(12), 100); // 剩 440

        let suggestions = suggester.suggest(&ledger, proposed, 60, Some(date(1)));

        // 3/11 本身是门诊日,距离 0,排最前;同距 1 的两天按余量排序
        assert_eq!(suggestions[0].date, date(11));
        assert_eq!(suggestions[1].date, date(12));
        assert_eq!(suggestions[2].date, date(10));
    }

    #[test]
    fn test_suggestion_contains_true_remaining() {
        let suggester = test_suggester();
        let mut ledger = DayLedger::new(540);
        ledger.add(date(11), 200);

        let suggestions = suggester.suggest(&ledger, date(11), 60, Some(date(1)));
        assert_eq!(suggestions[0].date, date(11));
        assert_eq!(suggestions[0].remaining_min, 340);
    }
}
