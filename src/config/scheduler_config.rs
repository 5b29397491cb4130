// ==========================================
// 用药门诊排期系统 - 排期配置
// ==========================================
// 职责: 系统配置管理,缺省值 + JSON 文件覆写
// 红线: 配置在进程启动时一次性加载,不跨调用热更新
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("配置文件解析失败: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("配置值非法 (字段 {field}): {message}")]
    InvalidValue { field: String, message: String },
}

// ==========================================
// SchedulerConfig - 排期参数
// ==========================================
// 所有字段带缺省值,配置文件只需覆写关心的条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// 单日容量上限 (分钟)
    #[serde(default = "default_capacity_minutes")]
    pub capacity_minutes: u32,

    /// 门诊日星期集合 (0=周一 ... 6=周日,缺省周二/周三/周四)
    #[serde(default = "default_clinic_weekdays")]
    pub clinic_weekdays: Vec<u8>,

    /// 再平衡扫描轮次上限 (安全阀,不保证收敛)
    #[serde(default = "default_max_rebalance_iterations")]
    pub max_rebalance_iterations: u32,

    /// 槽位推荐返回条数上限
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
}

fn default_capacity_minutes() -> u32 {
    540
}

fn default_clinic_weekdays() -> Vec<u8> {
    vec![1, 2, 3]
}

fn default_max_rebalance_iterations() -> u32 {
    1000
}

fn default_suggestion_limit() -> usize {
    3
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity_minutes: default_capacity_minutes(),
            clinic_weekdays: default_clinic_weekdays(),
            max_rebalance_iterations: default_max_rebalance_iterations(),
            suggestion_limit: default_suggestion_limit(),
        }
    }
}

impl SchedulerConfig {
    /// 从 JSON 文件加载配置
    ///
    /// # 参数
    /// - `path`: 配置文件路径
    ///
    /// # 返回
    /// - `Ok(SchedulerConfig)`: 校验通过的配置
    /// - `Err`: 读取/解析/校验失败
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置合法性
    ///
    /// # 校验规则
    /// - capacity_minutes > 0
    /// - clinic_weekdays 非空且取值 0..=6
    /// - max_rebalance_iterations >= 1
    /// - suggestion_limit >= 1
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "capacity_minutes".to_string(),
                message: "单日容量必须为正".to_string(),
            });
        }

        if self.clinic_weekdays.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "clinic_weekdays".to_string(),
                message: "门诊日星期集合不能为空".to_string(),
            });
        }

        if let Some(&bad) = self.clinic_weekdays.iter().find(|&&w| w > 6) {
            return Err(ConfigError::InvalidValue {
                field: "clinic_weekdays".to_string(),
                message: format!("星期取值必须在 0..=6,实际 {}", bad),
            });
        }

        if self.max_rebalance_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_rebalance_iterations".to_string(),
                message: "扫描轮次上限必须 >= 1".to_string(),
            });
        }

        if self.suggestion_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "suggestion_limit".to_string(),
                message: "推荐条数上限必须 >= 1".to_string(),
            });
        }

        Ok(())
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = SchedulerConfig::default();

        assert_eq!(config.capacity_minutes, 540);
        assert_eq!(config.clinic_weekdays, vec![1, 2, 3]); // 周二/周三/周四
        assert_eq!(config.max_rebalance_iterations, 1000);
        assert_eq!(config.suggestion_limit, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        // 只覆写容量,其余字段用缺省值
        let config: SchedulerConfig =
            serde_json::from_str(r#"{"capacity_minutes": 480}"#).unwrap();

        assert_eq!(config.capacity_minutes, 480);
        assert_eq!(config.clinic_weekdays, vec![1, 2, 3]);
        assert_eq!(config.max_rebalance_iterations, 1000);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = SchedulerConfig {
            capacity_minutes: 0,
            ..SchedulerConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "capacity_minutes"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_weekday() {
        let config = SchedulerConfig {
            clinic_weekdays: vec![1, 9],
            ..SchedulerConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"capacity_minutes": 600, "max_rebalance_iterations": 50}}"#
        )
        .unwrap();

        let config = SchedulerConfig::load(file.path()).unwrap();
        assert_eq!(config.capacity_minutes, 600);
        assert_eq!(config.max_rebalance_iterations, 50);
        assert_eq!(config.suggestion_limit, 3);
    }
}
