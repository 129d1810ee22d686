//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-core`: 运行 magic-move 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `scene-check`: 检查场景文档（结构、匹配、进出场指令、能否播放完毕）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use walkdir::WalkDir;
use xshell::{Cmd, Shell, cmd};

use host_headless::{DEFAULT_MAX_FRAMES, HeadlessDocument, ScenePlayer};
use magic_move::{
    AnimationRegistry, DiagnosticResult, MagicConfig, SceneHost, TransitionParams, analyze_scenes,
};

fn run(step: &str, cmd: Cmd<'_>) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    cmd.run().with_context(|| format!("{step} failed"))?;
    Ok(())
}

fn ensure_cargo_llvm_cov_available(sh: &Shell) -> anyhow::Result<()> {
    let available = cmd!(sh, "cargo llvm-cov --version")
        .quiet()
        .ignore_stdout()
        .ignore_stderr()
        .run()
        .is_ok();
    if !available {
        anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());
    let sh = Shell::new()?;

    match sub.as_str() {
        "check-all" => {
            run("cargo fmt", cmd!(sh, "cargo fmt --all -- --check"))?;
            run(
                "cargo clippy",
                cmd!(sh, "cargo clippy --workspace --all-targets"),
            )?;
            run("cargo test", cmd!(sh, "cargo test --workspace"))?;
        }
        "cov-core" => {
            ensure_cargo_llvm_cov_available(&sh)?;
            run(
                "cargo llvm-cov -p magic-move",
                cmd!(sh, "cargo llvm-cov -p magic-move --all-features --html"),
            )?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available(&sh)?;

            // 排除 xtask 以免稀释信号
            run(
                "cargo llvm-cov --workspace",
                cmd!(
                    sh,
                    "cargo llvm-cov --workspace --exclude xtask --all-features --html"
                ),
            )?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "scene-check" => {
            let path = args.next();
            scene_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-core        运行 magic-move 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  scene-check     检查场景文档

SCENE-CHECK:
  cargo xtask scene-check [path]

  不带参数：检查 demos/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - 文档结构（重名场景、缺失根元素）
    - 相邻场景之间的标识符冲突与进出场指令
    - 按顺序播放全部场景能否在帧数上限内结束
"#
    );
}

//=============================================================================
// scene-check 命令实现
//=============================================================================

/// 默认的场景文档目录（相对于 workspace root）
const DEFAULT_SCENES_DIR: &str = "demos";

/// 场景检查结果
#[derive(Default)]
struct SceneCheckResult {
    /// 检查的文档数量
    documents_checked: usize,
    /// 加载失败的文档数量
    load_errors: usize,
    /// 播放未结束的文档数量
    playback_errors: usize,
    /// 诊断结果
    diagnostics: DiagnosticResult,
}

/// 执行场景检查
fn scene_check(path: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(path.unwrap_or(DEFAULT_SCENES_DIR));
    if !root.exists() {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定场景文档路径",
            root.display()
        );
    }

    let files = collect_scene_files(&root)?;
    if files.is_empty() {
        eprintln!("未找到场景文档（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个场景文档...\n", files.len());

    let mut result = SceneCheckResult::default();
    for file in &files {
        check_scene_file(file, &mut result);
    }

    print_check_result(&result);

    if result.load_errors > 0 || result.playback_errors > 0 || result.diagnostics.has_errors() {
        anyhow::bail!("场景检查发现错误");
    }
    Ok(())
}

/// 收集场景文档（单个文件直接返回）
fn collect_scene_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// 检查单个场景文档
fn check_scene_file(file: &Path, result: &mut SceneCheckResult) {
    let id = file.display().to_string();
    result.documents_checked += 1;

    let document = match HeadlessDocument::load(file) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", id, e);
            result.load_errors += 1;
            return;
        }
    };

    // 相邻场景两两分析
    let mut registry = AnimationRegistry::new();
    for (name, spec) in document.animations() {
        registry.register(name, spec.as_str());
    }
    let scenes = document.scene_names();
    for pair in scenes.windows(2) {
        let diag = analyze_scenes(&document, &registry, &pair[0], &pair[1]);
        result.diagnostics.merge(diag);
    }

    // 从第一个场景开始顺序播放到最后
    let mut player = ScenePlayer::new(document, MagicConfig::default());
    if let Some(first) = scenes.first()
        && player.document().current_scene_name().as_deref() != Some(first.as_str())
    {
        player.transition(first, TransitionParams::new());
        if let Err(e) = player.run_until_settled(DEFAULT_MAX_FRAMES) {
            eprintln!("[ERROR] {}: {}", id, e);
            result.playback_errors += 1;
            return;
        }
    }
    while player.transition(">", TransitionParams::new()).is_accepted() {
        if let Err(e) = player.run_until_settled(DEFAULT_MAX_FRAMES) {
            eprintln!("[ERROR] {}: {}", id, e);
            result.playback_errors += 1;
            return;
        }
    }
}

/// 输出检查结果
fn print_check_result(result: &SceneCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个场景文档", result.documents_checked);
    eprintln!();

    for diag in &result.diagnostics.diagnostics {
        eprintln!("{}", diag);
    }

    let error_count =
        result.load_errors + result.playback_errors + result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
