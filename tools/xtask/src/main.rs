//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与剧本检查命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 vn-script 覆盖率
//! - `script-check`: 检查剧本文件（加载、步骤参数、资源引用）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use anyhow::Context;
use vn_script::{
    DiagnosticLevel, DiagnosticResult, ResourceReference, Script, analyze_script,
    extract_resource_references, get_bookmark_labels,
};
use walkdir::WalkDir;

/// 子命令
enum Task {
    CheckAll,
    CovRuntime,
    /// 可选的剧本文件或目录
    ScriptCheck(Option<String>),
    Help,
}

impl Task {
    fn from_env() -> anyhow::Result<Self> {
        Self::parse(std::env::args().skip(1))
    }

    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let task = match args.next().as_deref() {
            Some("check-all") => Self::CheckAll,
            Some("cov-runtime") => Self::CovRuntime,
            Some("script-check") => Self::ScriptCheck(args.next()),
            None | Some("help" | "-h" | "--help") => Self::Help,
            Some(other) => anyhow::bail!("未知的 xtask 子命令: {other}"),
        };
        Ok(task)
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Self::CheckAll => {
                cargo(&["fmt", "--all", "--", "--check"])?;
                cargo(&["clippy", "--workspace", "--all-targets"])?;
                cargo(&["test", "--workspace"])
            }
            Self::CovRuntime => {
                require_llvm_cov()?;
                cargo(&["llvm-cov", "-p", "vn-script", "--all-features", "--html"])?;
                eprintln!("\n覆盖率报告: target/llvm-cov/html/index.html");
                Ok(())
            }
            Self::ScriptCheck(path) => script_check(path.as_deref()),
            Self::Help => {
                print_help();
                Ok(())
            }
        }
    }
}

/// 执行一条 cargo 命令，非零退出视为失败
fn cargo(args: &[&str]) -> anyhow::Result<()> {
    let step = format!("cargo {}", args.join(" "));
    eprintln!("\n==> {step}");
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("无法启动 {step}"))?;
    if !status.success() {
        anyhow::bail!("{step} 失败: {status}");
    }
    Ok(())
}

const LLVM_COV_HINT: &str = "找不到 cargo llvm-cov，先执行 `cargo install cargo-llvm-cov` 和 \
                             `rustup component add llvm-tools-preview`";

fn require_llvm_cov() -> anyhow::Result<()> {
    cargo(&["llvm-cov", "--version"]).context(LLVM_COV_HINT)
}

fn main() -> ExitCode {
    match Task::from_env().and_then(Task::run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("xtask 失败: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    eprintln!(
        "用法: cargo xtask <命令>

  check-all              fmt --check、clippy、test（整个 workspace）
  cov-runtime            vn-script 覆盖率报告（需要 cargo-llvm-cov）
  script-check [路径]    加载并检查剧本；默认检查 {SCRIPTS_DIR} 下所有 .json，
                         报告步骤诊断和 {ASSETS_ROOT}/ 下缺失的资源文件

别名见 .cargo/config.toml：cargo check-all / cov-runtime / script-check"
    );
}

//=============================================================================
// script-check
//=============================================================================

/// 剧本目录（相对于 workspace root）
const SCRIPTS_DIR: &str = "assets/scripts";
/// 资源根目录（相对于 workspace root）
const ASSETS_ROOT: &str = "assets";

/// 单个剧本的检查报告
struct ScriptReport {
    file: PathBuf,
    outcome: Outcome,
}

enum Outcome {
    /// 读取或加载失败，没有可分析的剧本
    Unloadable(String),
    Loaded {
        summary: String,
        diagnostics: DiagnosticResult,
        /// 资源根目录下找不到的引用
        missing: Vec<ResourceReference>,
    },
}

impl ScriptReport {
    fn errors(&self) -> usize {
        match &self.outcome {
            Outcome::Unloadable(_) => 1,
            Outcome::Loaded { diagnostics, .. } => diagnostics.error_count(),
        }
    }

    fn warnings(&self) -> usize {
        match &self.outcome {
            Outcome::Unloadable(_) => 0,
            Outcome::Loaded {
                diagnostics,
                missing,
                ..
            } => diagnostics.warn_count() + missing.len(),
        }
    }

    fn print(&self) {
        let file = self.file.display();
        match &self.outcome {
            Outcome::Unloadable(reason) => eprintln!("[ERROR] {file}: {reason}"),
            Outcome::Loaded {
                summary,
                diagnostics,
                missing,
            } => {
                eprintln!("{file}: {summary}");
                for diag in diagnostics.filter_by_level(DiagnosticLevel::Info) {
                    eprintln!("  {diag}");
                }
                for reference in missing {
                    eprintln!(
                        "  [WARN] {}: {} '{}' 指向不存在的文件 {}",
                        reference.role, reference.resource_type, reference.name, reference.path
                    );
                }
            }
        }
    }
}

fn script_check(path: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(path.unwrap_or(SCRIPTS_DIR));
    if !root.exists() {
        let hint = match path {
            Some(_) => "",
            None => "（请在 workspace 根目录运行，或指定剧本路径）",
        };
        anyhow::bail!("路径不存在: {}{hint}", root.display());
    }

    let files = collect_script_files(&root)?;
    if files.is_empty() {
        eprintln!("{} 下没有 .json 剧本", root.display());
        return Ok(());
    }

    let assets_root = Path::new(ASSETS_ROOT);
    let reports: Vec<_> = files
        .into_iter()
        .map(|file| check_script(file, assets_root))
        .collect();
    for report in &reports {
        report.print();
    }

    let errors: usize = reports.iter().map(ScriptReport::errors).sum();
    let warnings: usize = reports.iter().map(ScriptReport::warnings).sum();
    let total = reports.len();
    eprintln!("\n==> {total} 个剧本: {errors} 个错误, {warnings} 个警告");

    if errors > 0 {
        anyhow::bail!("剧本检查发现错误");
    }
    Ok(())
}

/// `root` 是文件时只检查它本身
fn collect_script_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("遍历目录失败: {}", root.display()))?;
        let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn check_script(file: PathBuf, assets_root: &Path) -> ScriptReport {
    let loaded = std::fs::read_to_string(&file)
        .map_err(|e| format!("无法读取文件 - {e}"))
        .and_then(|content| Script::from_json(&content).map_err(|e| e.to_string()));

    let outcome = match loaded {
        Err(reason) => Outcome::Unloadable(reason),
        Ok(script) => Outcome::Loaded {
            summary: format!(
                "{} 个角色, {} 个步骤, {} 个 Beat, 书签 [{}]",
                script.roles().len(),
                script.len(),
                script.beats().len(),
                get_bookmark_labels(&script).join(", ")
            ),
            diagnostics: analyze_script(&script),
            missing: extract_resource_references(&script)
                .into_iter()
                .filter(|reference| !assets_root.join(&reference.path).exists())
                .collect(),
        },
    };
    ScriptReport { file, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<Task> {
        Task::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn test_parse_tasks() {
        assert!(matches!(parse(&[]), Ok(Task::Help)));
        assert!(matches!(parse(&["check-all"]), Ok(Task::CheckAll)));
        assert!(matches!(parse(&["script-check"]), Ok(Task::ScriptCheck(None))));
        assert!(matches!(
            parse(&["script-check", "a.json"]),
            Ok(Task::ScriptCheck(Some(path))) if path == "a.json"
        ));
        assert!(parse(&["deploy"]).is_err());
    }

    #[test]
    fn test_check_demo_script() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        let file = root.join(SCRIPTS_DIR).join("demo.json");
        let report = check_script(file, &root.join(ASSETS_ROOT));
        assert!(matches!(report.outcome, Outcome::Loaded { .. }));
        assert_eq!(report.errors(), 0);
    }

    #[test]
    fn test_unreadable_script_counts_as_error() {
        let report = check_script(PathBuf::from("no/such/script.json"), Path::new("."));
        assert!(matches!(report.outcome, Outcome::Unloadable(_)));
        assert_eq!(report.errors(), 1);
        assert_eq!(report.warnings(), 0);
    }
}
