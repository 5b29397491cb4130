// ==========================================
// 用药门诊排期系统 - 门诊日历
// ==========================================
// 职责: 枚举指定月份内的门诊日 (缺省周二/周三/周四)
// 红线: 纯函数,无副作用,任何合法日期都不得 panic
// ==========================================

use crate::config::SchedulerConfig;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

// ==========================================
// ClinicCalendar - 门诊日历
// ==========================================
#[derive(Debug, Clone)]
pub struct ClinicCalendar {
    // 门诊日星期集合 (0=周一 ... 6=周日)
    weekdays: Vec<u8>,
}

impl ClinicCalendar {
    /// 按星期集合创建日历
    ///
    /// # 参数
    /// - `weekdays`: 门诊日星期集合 (0=周一 ... 6=周日),内部去重排序
    pub fn new(weekdays: &[u8]) -> Self {
        let set: BTreeSet<u8> = weekdays.iter().copied().collect();
        Self {
            weekdays: set.into_iter().collect(),
        }
    }

    /// 从排期配置创建日历
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(&config.clinic_weekdays)
    }

    /// 枚举某年某月的全部门诊日
    ///
    /// # 参数
    /// - `year`: 年份
    /// - `month`: 月份 (1..=12)
    ///
    /// # 返回
    /// 按日期升序、无重复的门诊日序列;月份非法时返回空序列
    pub fn clinic_days_in_month(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        let Some(first_day) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return Vec::new();
        };

        // 12 月翻年到次年 1 月
        let next_month_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        let Some(next_month_first) = next_month_first else {
            return Vec::new();
        };

        let mut days = Vec::new();
        let mut current = first_day;
        while current < next_month_first {
            let weekday = current.weekday().num_days_from_monday() as u8;
            if self.weekdays.contains(&weekday) {
                days.push(current);
            }
            current = current.succ_opt().expect("日期迭代不会越过 NaiveDate 上限");
        }
        days
    }

    /// 枚举某日期所在月份的全部门诊日
    pub fn clinic_days_for_date(&self, date: NaiveDate) -> Vec<NaiveDate> {
        self.clinic_days_in_month(date.year(), date.month())
    }

    /// 枚举多个月份并集的全部门诊日
    ///
    /// # 参数
    /// - `months`: (年, 月) 集合,允许重复
    ///
    /// # 返回
    /// 按日期升序、无重复的门诊日序列
    pub fn clinic_days_for_months<I>(&self, months: I) -> Vec<NaiveDate>
    where
        I: IntoIterator<Item = (i32, u32)>,
    {
        let mut all_days: BTreeSet<NaiveDate> = BTreeSet::new();
        for (year, month) in months {
            all_days.extend(self.clinic_days_in_month(year, month));
        }
        all_days.into_iter().collect()
    }
}
