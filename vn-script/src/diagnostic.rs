//! # 诊断模块
//!
//! 提供剧本静态检查和诊断 API，不依赖 IO 或演出层。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（参数形状错误）、Warn（步骤类型的专属校验）、Info（信息提示）
//! - 诊断是建议性的，不阻塞编译；apply 函数对有问题的参数保持合理行为

use std::collections::HashSet;

use crate::role::{RoleKind, RoleType};
use crate::script::Script;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 相关角色名
    pub role: String,
    /// 步骤索引（角色级诊断为 None）
    pub step_index: Option<usize>,
    /// 诊断消息
    pub message: String,
    /// 诊断详情（可选，如步骤类型名）
    pub detail: Option<String>,
}

impl Diagnostic {
    /// 创建错误诊断
    pub fn error(role: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, role, message)
    }

    /// 创建警告诊断
    pub fn warn(role: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warn, role, message)
    }

    /// 创建信息诊断
    pub fn info(role: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, role, message)
    }

    fn with_level(
        level: DiagnosticLevel,
        role: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            role: role.into(),
            step_index: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 设置步骤索引
    pub fn with_step(mut self, step_index: usize) -> Self {
        self.step_index = Some(step_index);
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.role)?;
        if let Some(step) = self.step_index {
            write!(f, " #{}", step)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加诊断
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// 获取错误数量
    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    /// 获取警告数量
    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 按级别过滤
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }

    /// 指定步骤的诊断
    pub fn for_step(&self, step_index: usize) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.step_index == Some(step_index))
            .collect()
    }
}

/// 资源引用信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    /// 资源类型
    pub resource_type: ResourceType,
    /// 引用它的角色
    pub role: String,
    /// 曲目名 / 姿势名
    pub name: String,
    /// 资源路径
    pub path: String,
}

/// 资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// 立绘
    Image,
    /// 音频
    Audio,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "立绘"),
            Self::Audio => write!(f, "音频"),
        }
    }
}

//=============================================================================
// 剧本分析 API
//=============================================================================

/// 分析剧本，返回诊断结果
///
/// 执行以下检查：
/// - 步骤参数个数与类型（Error）
/// - 步骤类型的专属校验（Warn）
/// - 重名书签（Warn）
/// - 没有被任何步骤使用的角色（Info）
pub fn analyze_script(script: &Script) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();

    for (index, step) in script.steps().iter().enumerate() {
        let Some(role) = script.role_by_name(step.role_name()) else {
            continue;
        };
        let kind = step.kind();
        let detail = format!("{}.{}", role.name(), kind.name);

        let shape = kind.check_args(step.args());
        let specific = if shape.is_empty() {
            (kind.check)(role, step.args())
        } else {
            Vec::new()
        };

        for message in shape {
            result.push(
                Diagnostic::error(role.name(), message)
                    .with_step(index)
                    .with_detail(detail.clone()),
            );
        }
        for message in specific {
            result.push(
                Diagnostic::warn(role.name(), message)
                    .with_step(index)
                    .with_detail(detail.clone()),
            );
        }
    }

    let mut seen = HashSet::new();
    for step in script.steps() {
        if let Some(label) = step.bookmark_label()
            && !seen.insert(label)
        {
            let mut diag = Diagnostic::warn(step.role_name(), format!("重复的书签: {label}"));
            if let Some(index) = step.index() {
                diag = diag.with_step(index);
            }
            result.push(diag);
        }
    }

    let used: HashSet<&str> = script.steps().iter().map(|s| s.role_name()).collect();
    for role in script.roles() {
        if used.contains(role.name()) {
            continue;
        }
        // 对话框可能只被角色的台词间接使用
        if role.role_type() == RoleType::DialogueBox && is_referenced_box(script, role.name()) {
            continue;
        }
        result.push(Diagnostic::info(role.name(), "角色没有被任何步骤使用"));
    }

    result
}

fn is_referenced_box(script: &Script, name: &str) -> bool {
    let Some(id) = script.role_id(name) else {
        return false;
    };
    script.roles().iter().any(|role| {
        matches!(role.kind(), RoleKind::Character(config) if config.dialogue_box == Some(id))
    })
}

/// 提取剧本中实际用到的资源引用
///
/// 遍历步骤，收集点唱机播放的曲目和画框显示的姿势对应的资源路径。
/// 不在曲目表/姿势表中的名字没有路径，由 [`analyze_script`] 报告。
pub fn extract_resource_references(script: &Script) -> Vec<ResourceReference> {
    let mut refs = Vec::new();

    for step in script.steps() {
        let Some(role) = script.role_by_name(step.role_name()) else {
            continue;
        };
        let name = step.args().first().and_then(|a| a.as_text()).unwrap_or("");
        let (resource_type, table) = match (role.kind(), step.kind_name()) {
            (RoleKind::Jukebox(config), "play") => (ResourceType::Audio, &config.tracks),
            (RoleKind::PictureFrame(config), "show") => (ResourceType::Image, &config.poses),
            _ => continue,
        };
        if let Some(path) = table.get(name) {
            refs.push(ResourceReference {
                resource_type,
                role: role.name().to_string(),
                name: name.to_string(),
                path: path.clone(),
            });
        }
    }

    refs
}

/// 获取剧本中所有书签名
pub fn get_bookmark_labels(script: &Script) -> Vec<&str> {
    script
        .steps()
        .iter()
        .filter_map(|step| step.bookmark_label())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use crate::value::ArgValue;
    use std::collections::BTreeMap;

    fn script_with_roles() -> Script {
        let mut script = Script::new();
        script.add_role(Role::stage("stage")).unwrap();
        script
            .add_role(Role::jukebox(
                "music",
                BTreeMap::from([("theme".to_string(), "audio/theme.ogg".to_string())]),
            ))
            .unwrap();
        script
            .add_role(Role::picture_frame(
                "frame",
                BTreeMap::from([("smile".to_string(), "img/smile.png".to_string())]),
            ))
            .unwrap();
        script
    }

    fn push(script: &mut Script, role: &str, kind: &str, args: Vec<ArgValue>) {
        let step = script.make_step(role, kind, args).unwrap();
        script.push_step(step).unwrap();
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::warn("music", "曲目 'x' 不在曲目表中")
            .with_step(10)
            .with_detail("music.play");

        let display = format!("{}", diag);
        assert!(display.contains("[WARN]"));
        assert!(display.contains("music #10"));
        assert!(display.contains("music.play"));
    }

    #[test]
    fn test_analyze_shape_and_specific_checks() {
        let mut script = script_with_roles();
        push(&mut script, "music", "play", vec!["battle".into()]);
        push(&mut script, "stage", "wait", vec!["soon".into()]);
        push(&mut script, "frame", "show", vec!["smile".into()]);

        let result = script.check();
        assert_eq!(result.warn_count(), 1);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.for_step(0)[0].level, DiagnosticLevel::Warn);
        assert_eq!(result.for_step(1)[0].level, DiagnosticLevel::Error);
        assert!(result.for_step(2).is_empty());
        // 诊断不阻塞编译
        assert_eq!(script.beats().len(), 2);
    }

    #[test]
    fn test_duplicate_bookmark_and_unused_role() {
        let mut script = script_with_roles();
        push(&mut script, "stage", "bookmark", vec!["ch1".into()]);
        push(&mut script, "stage", "bookmark", vec!["ch1".into()]);

        let result = analyze_script(&script);
        let warns = result.filter_by_level(DiagnosticLevel::Warn);
        assert_eq!(warns.len(), 1);
        assert!(warns[0].message.contains("ch1"));
        assert_eq!(warns[0].step_index, Some(1));
        // music 与 frame 未被使用
        assert_eq!(result.filter_by_level(DiagnosticLevel::Info).len(), 3);
        assert_eq!(get_bookmark_labels(&script), vec!["ch1", "ch1"]);
    }

    #[test]
    fn test_referenced_dialogue_box_is_not_unused() {
        let mut script = Script::new();
        let dialogue = script.add_role(Role::dialogue_box("box")).unwrap();
        script
            .add_role(Role::character("alice", "Alice", Some(dialogue)))
            .unwrap();
        push(&mut script, "alice", "say", vec!["你好".into()]);

        assert!(analyze_script(&script).is_empty());
    }

    #[test]
    fn test_extract_resource_references() {
        let mut script = script_with_roles();
        push(&mut script, "music", "play", vec!["theme".into()]);
        push(&mut script, "music", "play", vec!["missing".into()]);
        push(&mut script, "frame", "show", vec!["smile".into()]);

        let refs = extract_resource_references(&script);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].resource_type, ResourceType::Audio);
        assert_eq!(refs[0].path, "audio/theme.ogg");
        assert_eq!(refs[1].resource_type, ResourceType::Image);
        assert_eq!(refs[1].name, "smile");
    }

    #[test]
    fn test_diagnostic_result_filter() {
        let mut result = DiagnosticResult::new();
        result.push(Diagnostic::error("a", "错误1"));
        result.push(Diagnostic::warn("a", "警告1"));
        result.push(Diagnostic::info("a", "信息1"));

        assert_eq!(result.filter_by_level(DiagnosticLevel::Error).len(), 1);
        assert_eq!(result.filter_by_level(DiagnosticLevel::Warn).len(), 2);
        assert_eq!(result.filter_by_level(DiagnosticLevel::Info).len(), 3);

        let mut merged = DiagnosticResult::new();
        merged.merge(result);
        assert!(merged.has_errors());
    }
}
