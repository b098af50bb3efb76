//! 命令行参数定义

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "autocaption",
    version,
    about = "Automatic subtitle generation service, client and batch scheduler"
)]
pub struct Cli {
    /// 配置文件路径，默认搜索 config.toml / config.local.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 启动字幕服务（HTTP API + 后台 Worker）
    Serve,

    /// 为单个媒体文件生成字幕，阻塞直到任务结束
    Generate(GenerateArgs),

    /// 扫描宿主中缺少字幕的条目并批量投递
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// 媒体文件路径（服务端可见的路径）
    #[arg(long)]
    pub video_path: String,

    /// 源语言，留空或 auto 表示自动识别
    #[arg(long, default_value = "")]
    pub language: String,

    /// 目标语言
    #[arg(long)]
    pub translate_to: Option<String>,

    /// 宿主条目 id，成功后为其添加标签
    #[arg(long)]
    pub scene_id: Option<String>,

    /// 字幕服务地址，覆盖配置
    #[arg(long)]
    pub service_url: Option<String>,

    /// 成功后的冷却时间（秒），覆盖配置
    #[arg(long)]
    pub cooldown_seconds: Option<u64>,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// 本次最多投递的条目数，覆盖配置
    #[arg(long)]
    pub max_batch_size: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::parse_from([
            "autocaption",
            "generate",
            "--video-path",
            "/media/a.mkv",
            "--translate-to",
            "en",
            "--scene-id",
            "42",
        ]);
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.video_path, "/media/a.mkv");
                assert_eq!(args.language, "");
                assert_eq!(args.translate_to.as_deref(), Some("en"));
                assert_eq!(args.scene_id.as_deref(), Some("42"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_batch_with_global_config() {
        let cli = Cli::parse_from(["autocaption", "batch", "--max-batch-size", "5", "-c", "conf.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("conf.toml")));
        assert!(matches!(cli.command, Command::Batch(BatchArgs { max_batch_size: Some(5) })));
    }
}
