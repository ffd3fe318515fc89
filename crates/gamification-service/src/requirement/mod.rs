//! 徽章获取条件评估
//!
//! 徽章的获取条件是一个 JSON 对象，键为条件类型，值为数值阈值：
//!
//! ```json
//! {"total_sessions": 10, "average_rating": 4.5}
//! ```
//!
//! 所有条件均为"与"关系，快照中对应的派生值 `>=` 阈值即视为满足。
//! 条件类型由 [`RequirementRegistry`] 中注册的 [`RequirementPredicate`] 决定，
//! 新增条件类型只需注册新的判定器。

mod predicate;
mod registry;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::models::StatSnapshot;

pub use predicate::{
    AverageRating, CreditsEarned, LearningSessions, RequirementPredicate, TeachingSessions,
    TotalSessions,
};
pub use registry::RequirementRegistry;

/// 条件解析错误
///
/// 只影响单个徽章，发放流程记录后跳过该徽章
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequirementError {
    #[error("获取条件必须是 JSON 对象，实际为: {0}")]
    NotAnObject(String),

    #[error("未知的条件类型: {0}")]
    UnknownKind(String),

    #[error("条件 {kind} 的阈值无效: {reason}")]
    InvalidThreshold { kind: String, reason: String },

    #[error("条件 {0} 重复出现")]
    DuplicateKind(String),
}

impl RequirementError {
    /// 用于指标标签
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotAnObject(_) => "not_an_object",
            Self::UnknownKind(_) => "unknown_kind",
            Self::InvalidThreshold { .. } => "invalid_threshold",
            Self::DuplicateKind(_) => "duplicate_kind",
        }
    }
}

/// 单个条件：判定器 + 阈值
#[derive(Clone)]
pub struct Requirement {
    predicate: Arc<dyn RequirementPredicate>,
    threshold: f64,
}

impl Requirement {
    pub fn kind(&self) -> &'static str {
        self.predicate.kind()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_satisfied_by(&self, snapshot: &StatSnapshot) -> bool {
        self.predicate.is_satisfied(snapshot, self.threshold)
    }
}

impl fmt::Debug for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requirement")
            .field("kind", &self.kind())
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// 已校验的条件集合
///
/// 只能通过 [`RequirementRegistry::parse`] 构建，因此其中的条件类型和阈值都是合法的，
/// 判定过程不会失败
#[derive(Debug, Clone, Default)]
pub struct RequirementSet {
    requirements: Vec<Requirement>,
}

impl RequirementSet {
    /// 判断快照是否满足全部条件
    ///
    /// 空集合视为满足
    pub fn qualifies(&self, snapshot: &StatSnapshot) -> bool {
        self.requirements.iter().all(|r| r.is_satisfied_by(snapshot))
    }

    /// 返回第一个未满足的条件
    pub fn first_unmet(&self, snapshot: &StatSnapshot) -> Option<&Requirement> {
        self.requirements.iter().find(|r| !r.is_satisfied_by(snapshot))
    }

    pub fn threshold(&self, kind: &str) -> Option<f64> {
        self.requirements
            .iter()
            .find(|r| r.kind() == kind)
            .map(Requirement::threshold)
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.requirements.iter().map(Requirement::kind).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}
