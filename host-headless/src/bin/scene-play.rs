//! # scene-play
//!
//! 无渲染场景过渡播放器。
//!
//! ## 用法
//!
//! ```bash
//! # 播放一次过渡并输出逐帧轨迹
//! cargo run -p host-headless --bin scene-play -- play demos/cards.json Detail
//! cargo run -p host-headless --bin scene-play -- play demos/cards.json ">" --duration 0.8 --every 6
//!
//! # 检查两个场景之间的匹配情况
//! cargo run -p host-headless --bin scene-play -- check demos/cards.json Detail
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::Level;

use host_headless::{DEFAULT_MAX_FRAMES, HeadlessDocument, ScenePlayer};
use magic_move::{MagicConfig, SceneHost, TransitionParams};

#[derive(Parser)]
#[command(name = "scene-play")]
#[command(about = "无渲染场景过渡播放器")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（JSON），缺省使用默认配置
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 播放一次过渡
    Play {
        /// 场景文档
        document: PathBuf,

        /// 目标场景（名称或 `>` / `<` / `>Prefix` / `<Prefix`）
        target: String,

        /// 过渡时长（秒）
        #[arg(short, long)]
        duration: Option<f64>,

        /// 缓动名称
        #[arg(short, long)]
        ease: Option<String>,

        /// 帧率
        #[arg(long, default_value = "60")]
        fps: u32,

        /// 每隔多少帧输出一次轨迹（0 表示只输出结果）
        #[arg(long, default_value = "10")]
        every: u64,
    },

    /// 检查从当前场景到目标场景的匹配情况
    Check {
        /// 场景文档
        document: PathBuf,

        /// 目标场景
        target: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("scene-play error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => MagicConfig::load(path),
        None => MagicConfig::default(),
    };
    config.validate().context("配置无效")?;

    match cli.command {
        Commands::Play {
            document,
            target,
            duration,
            ease,
            fps,
            every,
        } => {
            let mut player = open(&document, config)?;
            if fps == 0 {
                anyhow::bail!("fps 必须大于 0");
            }
            player = player.with_frame_step(1.0 / f64::from(fps));
            play(&mut player, &target, duration, ease, every)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { document, target } => {
            let player = open(&document, config)?;
            let result = player.diagnose(&target);
            if result.is_empty() {
                println!("没有发现问题");
            }
            for diagnostic in &result.diagnostics {
                println!("{}", diagnostic);
            }
            println!(
                "\n{} 个错误，{} 个警告",
                result.error_count(),
                result.warn_count()
            );
            Ok(if result.has_errors() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}

fn open(path: &PathBuf, config: MagicConfig) -> anyhow::Result<ScenePlayer> {
    let document = HeadlessDocument::load(path)
        .with_context(|| format!("无法加载场景文档 {}", path.display()))?;
    Ok(ScenePlayer::new(document, config))
}

fn play(
    player: &mut ScenePlayer,
    target: &str,
    duration: Option<f64>,
    ease: Option<String>,
    every: u64,
) -> anyhow::Result<()> {
    let mut params = TransitionParams::new();
    if let Some(duration) = duration {
        params = params.with_duration(duration);
    }
    if let Some(ease) = ease {
        params = params.with_ease(ease);
    }

    let source = player.document().current_scene_name().unwrap_or_default();
    let outcome = player.transition(target, params);
    println!("{} → {}: {:?}", source, target, outcome);
    if !outcome.is_accepted() {
        return Ok(());
    }

    let mut remaining = DEFAULT_MAX_FRAMES;
    while !player.is_settled() {
        if remaining == 0 {
            anyhow::bail!("{} 帧后过渡仍未结束", DEFAULT_MAX_FRAMES);
        }
        remaining -= 1;
        player.step();
        if every > 0 && player.frames() % every == 0 {
            print_frame(player);
        }
    }

    println!("\n完成：{} 帧，{:.3} 秒", player.frames(), player.elapsed());
    print_frame(player);
    println!("行为: {}", player.document().behaviors().join(", "));
    Ok(())
}

/// 输出带 `#id` 的元素的当前样式
fn print_frame(player: &ScenePlayer) {
    let document = player.document();
    println!(
        "frame {:>4}  t={:.3}  phase={:?}",
        player.frames(),
        player.elapsed(),
        player.engine().phase()
    );
    for scene in document.scene_names() {
        let Some(root) = document.scene_root(&scene, 0) else {
            continue;
        };
        for element in document.descendants(root) {
            let Some(id) = document.dom_id(element) else {
                continue;
            };
            let style: Vec<String> = document
                .computed_style(element)
                .into_iter()
                .map(|(name, value)| format!("{}:{}", name, value))
                .collect();
            println!("  {:<8} #{:<12} {}", scene, id, style.join("; "));
        }
    }
}
