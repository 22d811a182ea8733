//! # Mano CLI
//!
//! 分层立绘角色模型的命令行检查与解析工具，不依赖任何渲染设备。
//!
//! ## 用法
//!
//! ```bash
//! # 检查模型文档
//! mano check assets/Sherry/model.char.json
//!
//! # 列出姿势及其影响的组
//! mano poses assets/Sherry/model.char.json
//!
//! # 按顺序执行操作并输出可见图层
//! mano resolve assets/Sherry/model.char.json --op set:Smile --op show:Facial/Sweat/Sweat01
//! mano resolve assets/Sherry/model.char.json --op set:ArmL_Wave --json
//! ```

mod logging;
mod ops;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mano_runtime::{
    CharacterModel, CharacterPlayer, HeadlessBackend, affected_groups, analyze_model, pose_names,
    resolve_pose, visible_ids,
};
use tracing::debug;

use crate::ops::PlayerOp;

#[derive(Parser)]
#[command(name = "mano")]
#[command(about = "分层立绘角色模型检查与解析工具")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 输出更多日志（-v 调试，-vv 追踪）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// 只输出错误日志
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 检查模型文档（重复 ID、未定义姿势、无效指令、循环引用）
    Check {
        /// 模型文件路径
        model: PathBuf,
    },

    /// 列出所有姿势、影响的组与展开后的指令
    Poses {
        /// 模型文件路径
        model: PathBuf,
    },

    /// 从默认状态开始按顺序执行操作，输出最终可见图层
    Resolve {
        /// 模型文件路径
        model: PathBuf,

        /// 操作：set:/add:/remove:<姿势>，show:/hide:<图层>，clear:<组>，reset
        #[arg(long = "op", value_name = "OP")]
        ops: Vec<PlayerOp>,

        /// 以 JSON 输出完整可见性表
        #[arg(long, conflicts_with = "draw_order")]
        json: bool,

        /// 按绘制顺序输出可见图层
        #[arg(long)]
        draw_order: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    if let Err(e) = run(cli.command) {
        eprintln!("mano error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Check { model } => check(&model),
        Commands::Poses { model } => list_poses(&model),
        Commands::Resolve {
            model,
            ops,
            json,
            draw_order,
        } => resolve(&model, &ops, json, draw_order),
    }
}

/// 检查模型文档
fn check(path: &Path) -> anyhow::Result<()> {
    let model = CharacterModel::load(path)?;
    let result = analyze_model(&model);

    for diag in &result.diagnostics {
        eprintln!("{}", diag);
    }

    let error_count = result.error_count();
    let warn_count = result.warn_count();
    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
        anyhow::bail!("模型检查发现错误: {}", path.display());
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
    Ok(())
}

/// 列出姿势
fn list_poses(path: &Path) -> anyhow::Result<()> {
    let model = CharacterModel::load(path)?;

    for name in pose_names(&model) {
        let groups: Vec<String> = affected_groups(name, model.poses()).into_iter().collect();
        let commands = resolve_pose(name, model.poses());
        println!("{}", name);
        println!("  groups:   {}", groups.join(", "));
        println!("  commands: {}", commands.join(" "));
    }
    Ok(())
}

/// 执行操作并输出可见图层
fn resolve(path: &Path, ops: &[PlayerOp], json: bool, draw_order: bool) -> anyhow::Result<()> {
    let model = CharacterModel::load_and_validate(path)?;
    let mut player = CharacterPlayer::new(model, HeadlessBackend::new());

    for op in ops {
        debug!(op = ?op, "执行操作");
        op.apply(&mut player);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&player.visibility())?);
    } else if draw_order {
        for id in player.backend().visible_in_draw_order() {
            println!("{}", id);
        }
    } else {
        for id in visible_ids(&player.visibility()) {
            println!("{}", id);
        }
    }

    eprintln!("active poses: {}", player.active_poses().join(", "));
    Ok(())
}
