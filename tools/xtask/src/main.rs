//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 mano-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `model-check`: 检查角色模型文件（结构、姿势引用、图片是否存在）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use mano_runtime::path::is_absolute_url;
use mano_runtime::{CharacterModel, DiagnosticResult, analyze_model};
use walkdir::WalkDir;

/// 角色模型文件后缀
const MODEL_SUFFIX: &str = ".char.json";

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    let status = cmd.status();
    match status {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
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

    match sub.as_str() {
        "check-all" => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        "cov-runtime" => {
            ensure_cargo_llvm_cov_available()?;

            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "-p", "mano-runtime", "--all-features", "--html"]);
            run(
                "cargo llvm-cov -p mano-runtime --all-features --html",
                &mut cov,
            )?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available()?;

            // 排除 xtask，避免稀释信号
            let mut cov = Command::new("cargo");
            cov.args([
                "llvm-cov",
                "--workspace",
                "--exclude",
                "xtask",
                "--all-features",
                "--html",
            ]);
            run(
                "cargo llvm-cov --workspace --exclude xtask --all-features --html",
                &mut cov,
            )?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "model-check" => {
            let path = args.next();
            model_check(path.as_deref())?;
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
  cov-runtime     运行 mano-runtime 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  model-check     检查角色模型文件

MODEL-CHECK:
  cargo xtask model-check [path]

  不带参数：检查 assets/ 下所有 *.char.json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - JSON 结构错误
    - 重复的图层 ID、不符合 group/name 约定的 ID
    - 未定义的默认姿势、无效指令、循环引用
    - 图层图片文件是否存在

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo cov-runtime   -> cargo xtask cov-runtime
  cargo cov-workspace -> cargo xtask cov-workspace
  cargo model-check   -> cargo xtask model-check
"#
    );
}

//=============================================================================
// model-check 命令实现
//=============================================================================

/// 默认模型目录（相对于 workspace root）
const DEFAULT_MODELS_DIR: &str = "assets";

/// 模型检查结果
#[derive(Default)]
struct ModelCheckResult {
    /// 检查的模型数量
    models_checked: usize,
    /// 加载错误数量
    load_errors: usize,
    /// 诊断结果
    diagnostics: DiagnosticResult,
    /// 缺失的图片文件
    missing_images: Vec<MissingImage>,
}

/// 缺失的图片信息
struct MissingImage {
    model: String,
    layer_id: String,
    path: String,
}

/// 执行模型检查
fn model_check(path: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(path.unwrap_or(DEFAULT_MODELS_DIR));

    let files = if root.is_file() {
        vec![root]
    } else if root.is_dir() {
        collect_model_files(&root)
    } else {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定模型路径",
            root.display()
        );
    };

    if files.is_empty() {
        eprintln!("未找到模型文件（{}）", MODEL_SUFFIX);
        return Ok(());
    }

    eprintln!("==> 检查 {} 个模型文件...\n", files.len());

    let mut result = ModelCheckResult::default();
    for file in &files {
        check_model_file(file, &mut result);
    }

    print_check_result(&result);

    if result.load_errors > 0 || result.diagnostics.has_errors() {
        anyhow::bail!("模型检查发现错误");
    }

    Ok(())
}

/// 收集目录下的所有模型文件
fn collect_model_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(MODEL_SUFFIX))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// 检查单个模型文件
fn check_model_file(file: &Path, result: &mut ModelCheckResult) {
    let model_name = file.display().to_string();
    result.models_checked += 1;

    let model = match CharacterModel::load(file) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", model_name, e);
            result.load_errors += 1;
            return;
        }
    };

    let mut diag = analyze_model(&model);
    for d in &mut diag.diagnostics {
        d.subject = format!("{} {}", model_name, d.subject);
    }
    result.diagnostics.merge(diag);

    // 图片相对模型文件所在目录解析
    let model_dir = file.parent().unwrap_or(Path::new("."));
    for layer in model.layers() {
        let url = model.asset_url(layer);
        if is_absolute_url(&url) || url.starts_with("//") {
            continue;
        }

        let candidates = [
            model_dir.join(url.trim_start_matches('/')),
            model_dir.join(&layer.path),
        ];
        if !candidates.iter().any(|p| p.exists()) {
            result.missing_images.push(MissingImage {
                model: model_name.clone(),
                layer_id: layer.id.clone(),
                path: url,
            });
        }
    }
}

/// 输出检查结果
fn print_check_result(result: &ModelCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个模型", result.models_checked);
    eprintln!();

    for diag in &result.diagnostics.diagnostics {
        eprintln!("{}", diag);
    }

    for mi in &result.missing_images {
        eprintln!(
            "[WARN] {}: 图层 '{}' 的图片不存在 {}",
            mi.model, mi.layer_id, mi.path
        );
    }

    let error_count = result.load_errors + result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count() + result.missing_images.len();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
