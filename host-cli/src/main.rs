//! vn-play - 无界面剧本播放器
//!
//! 加载 JSON 剧本，在终端中播放、检查或导出编译结果。

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use host_cli::{Player, PlayerConfig, load_script};
use tracing::Level;
use vn_script::{Bookmark, DiagnosticLevel, Script, analyze_script};

#[derive(Debug, Parser)]
#[command(name = "vn-play", version, about = "无界面剧本播放器")]
struct Cli {
    /// 配置文件路径
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 播放剧本（默认）
    Play {
        /// 剧本路径（覆盖配置文件）
        script: Option<PathBuf>,
        /// 自动播放
        #[arg(long)]
        auto: bool,
        /// 帧间隔（毫秒）
        #[arg(long)]
        frame_ms: Option<u64>,
    },
    /// 静态检查剧本
    Check {
        /// 剧本路径（覆盖配置文件）
        script: Option<PathBuf>,
    },
    /// 输出 Beat 划分
    Dump {
        /// 剧本路径（覆盖配置文件）
        script: Option<PathBuf>,
        /// 以 JSON 输出每个 Beat 的角色状态
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = PlayerConfig::load(&cli.config)?;
    let command = cli.command.unwrap_or(Commands::Play {
        script: None,
        auto: false,
        frame_ms: None,
    });

    let script_override = match &command {
        Commands::Play { script, .. }
        | Commands::Check { script }
        | Commands::Dump { script, .. } => script.clone(),
    };
    if let Some(path) = script_override {
        config.script_path = path;
    }
    if let Commands::Play { auto, frame_ms, .. } = &command {
        config.auto_play |= *auto;
        if let Some(frame_ms) = frame_ms {
            config.frame_ms = *frame_ms;
        }
    }
    if cli.verbose {
        config.log_level = "debug".to_string();
    }
    config.validate()?;

    init_tracing(config.level()?);

    match command {
        Commands::Play { .. } => play(config),
        Commands::Check { .. } => check(&config),
        Commands::Dump { json, .. } => dump(&config, json),
    }
}

fn init_tracing(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn play(config: PlayerConfig) -> anyhow::Result<()> {
    let auto = config.auto_play;
    let mut player = Player::load(config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if auto {
        player.run_auto(&mut out)
    } else {
        player.run_interactive(io::stdin().lock(), &mut out)
    }
}

fn check(config: &PlayerConfig) -> anyhow::Result<()> {
    let script = load_script(&config.script_path)?;
    let result = analyze_script(&script);
    for diag in result.filter_by_level(DiagnosticLevel::Info) {
        println!("{diag}");
    }
    println!(
        "{}: {} 个错误, {} 个警告",
        config.script_path.display(),
        result.error_count(),
        result.warn_count()
    );
    if result.has_errors() {
        anyhow::bail!("剧本检查发现错误");
    }
    Ok(())
}

fn dump(config: &PlayerConfig, json: bool) -> anyhow::Result<()> {
    let script = load_script(&config.script_path)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, script.beats()).context("序列化 Beat 失败")?;
        writeln!(out)?;
        return Ok(());
    }
    write_beat_table(&script, &mut out)?;
    Ok(())
}

fn write_beat_table(script: &Script, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{:>5}  {:<9}  {:<9}  步骤", "Beat", "范围", "暂停")?;
    for (index, beat) in script.beats().iter().enumerate() {
        let range = format!("{}..={}", beat.first_step_index(), beat.last_step_index());
        let pause = format!("{:?}", beat.pause());
        let steps = script.steps()[beat.step_range()]
            .iter()
            .map(|step| format!("{}.{}", step.role_name(), step.kind_name()))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{index:>5}  {range:<9}  {pause:<9}  {steps}")?;
    }
    for Bookmark { label, beat_index } in script.bookmarks() {
        writeln!(out, "书签 {label} -> Beat {beat_index}")?;
    }
    Ok(())
}
