// ==========================================
// 用药门诊排期系统 - 预约领域模型
// ==========================================
// 红线: 预约记录只是单次排期快照,不跨调用持久化
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Appointment - 用药预约
// ==========================================
// 生命周期: 导入 -> 初始分配 -> 再平衡 -> 结果输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    // ===== 标识 =====
    pub appt_id: i64,                      // 预约ID (导入时顺序分配,全局唯一)

    // ===== 业务属性 =====
    pub medication: String,                // 用药分组键
    pub duration_min: u32,                 // 时长 (整数分钟,导入边界取整)

    // ===== 日期 =====
    pub original_date: NaiveDate,          // 患者原始申请日期
    pub created_at: NaiveDate,             // 预约创建日期 (落位日期不得早于该日)

    // ===== 排期结果 (由引擎写入) =====
    pub assigned_date: Option<NaiveDate>,  // 落位日期 (未落位为 None)
    pub days_moved: Option<i64>,           // 偏移天数 = 落位日期 - 原始日期 (再平衡后计算)
}

impl Appointment {
    /// 创建尚未落位的预约记录
    pub fn new(
        appt_id: i64,
        medication: String,
        duration_min: u32,
        original_date: NaiveDate,
        created_at: NaiveDate,
    ) -> Self {
        Self {
            appt_id,
            medication,
            duration_min,
            original_date,
            created_at,
            assigned_date: None,
            days_moved: None,
        }
    }

    /// 判断是否已落位
    pub fn is_assigned(&self) -> bool {
        self.assigned_date.is_some()
    }

    /// 计算相对原始日期的偏移天数
    ///
    /// # 返回
    /// - `Some(天数)`: 已落位,正数表示延后,负数表示提前
    /// - `None`: 未落位
    pub fn displacement_days(&self) -> Option<i64> {
        self.assigned_date
            .map(|d| (d - self.original_date).num_days())
    }
}
