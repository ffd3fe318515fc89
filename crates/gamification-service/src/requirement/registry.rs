//! 条件判定器注册表
//!
//! 按条件类型名索引所有 [`RequirementPredicate`]，负责把徽章上的原始 JSON 条件
//! 解析为已校验的 [`RequirementSet`]。
//!
//! ## 使用示例
//!
//! ```ignore
//! use gamification::requirement::RequirementRegistry;
//! use serde_json::json;
//!
//! let registry = RequirementRegistry::with_defaults();
//! let set = registry.parse(&json!({"total_sessions": 10}))?;
//! assert!(set.qualifies(&snapshot));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::predicate::{
    AverageRating, CreditsEarned, LearningSessions, RequirementPredicate, TeachingSessions,
    TotalSessions,
};
use super::{Requirement, RequirementError, RequirementSet};
use crate::models::StatSnapshot;

/// 条件判定器注册表
///
/// 构建完成后只读，可通过 Arc 在多个服务间共享
pub struct RequirementRegistry {
    predicates: HashMap<&'static str, Arc<dyn RequirementPredicate>>,
    /// 旧键名 -> 条件类型名
    aliases: HashMap<&'static str, &'static str>,
}

impl RequirementRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            predicates: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// 注册一个判定器
    ///
    /// 已存在相同类型的判定器时会被替换
    pub fn register(&mut self, predicate: Arc<dyn RequirementPredicate>) -> &mut Self {
        let kind = predicate.kind();
        debug!(
            kind = kind,
            description = predicate.description(),
            "注册条件判定器"
        );
        for alias in predicate.aliases() {
            self.aliases.insert(*alias, kind);
        }
        self.predicates.insert(kind, predicate);
        self
    }

    /// 按类型名或旧键名查找判定器
    pub fn get(&self, name: &str) -> Option<Arc<dyn RequirementPredicate>> {
        let kind = self.aliases.get(name).copied().unwrap_or(name);
        self.predicates.get(kind).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 获取所有已注册的条件类型（按名称排序）
    pub fn registered_kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.predicates.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// 解析并校验徽章的原始条件
    ///
    /// 接受 JSON 对象，或内容为 JSON 对象的字符串（旧数据按文本存储）。
    /// 未知键、非数值或越界的阈值、别名与正式名重复都会返回错误
    pub fn parse(&self, raw: &Value) -> Result<RequirementSet, RequirementError> {
        let object = match raw {
            Value::Object(map) => map,
            Value::String(text) => {
                let inner: Value = serde_json::from_str(text)
                    .map_err(|_| RequirementError::NotAnObject("string".to_string()))?;
                if !inner.is_object() {
                    return Err(RequirementError::NotAnObject(json_type(&inner).to_string()));
                }
                return self.parse(&inner);
            }
            other => return Err(RequirementError::NotAnObject(json_type(other).to_string())),
        };

        let mut seen = HashSet::with_capacity(object.len());
        let mut requirements = Vec::with_capacity(object.len());

        for (key, value) in object {
            let predicate = self
                .get(key)
                .ok_or_else(|| RequirementError::UnknownKind(key.clone()))?;
            let kind = predicate.kind();

            let threshold = value
                .as_f64()
                .ok_or_else(|| RequirementError::InvalidThreshold {
                    kind: kind.to_string(),
                    reason: format!("阈值必须是数值，实际为 {}", json_type(value)),
                })?;
            predicate
                .validate_threshold(threshold)
                .map_err(|reason| RequirementError::InvalidThreshold {
                    kind: kind.to_string(),
                    reason,
                })?;

            if !seen.insert(kind) {
                return Err(RequirementError::DuplicateKind(kind.to_string()));
            }
            requirements.push(Requirement {
                predicate,
                threshold,
            });
        }

        requirements.sort_by_key(|r| r.kind());
        Ok(RequirementSet { requirements })
    }

    /// 解析条件并立即判定
    pub fn qualifies(&self, snapshot: &StatSnapshot, raw: &Value) -> Result<bool, RequirementError> {
        Ok(self.parse(raw)?.qualifies(snapshot))
    }

    /// 创建包含所有默认判定器的注册表
    ///
    /// 默认注册：total_sessions（别名 sessions）、teaching_sessions、
    /// learning_sessions、average_rating（别名 rating）、credits_earned
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry
            .register(Arc::new(TotalSessions))
            .register(Arc::new(TeachingSessions))
            .register(Arc::new(LearningSessions))
            .register(Arc::new(AverageRating))
            .register(Arc::new(CreditsEarned));

        info!(
            predicate_count = registry.len(),
            kinds = ?registry.registered_kinds(),
            "默认条件判定器初始化完成"
        );

        registry
    }
}

impl Default for RequirementRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
