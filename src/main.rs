//! # 邮件签名工作室 — 命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与子命令分发。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use signature_studio::error::ExportError;
use signature_studio::export::ExportPipeline;
use signature_studio::headshot::{Compositor, PhotoSource, SourceLoader};
use signature_studio::settings::AppSettings;
use signature_studio::signature::{ProfileFields, SignatureAssembler};

/// signature-studio: 生成邮件签名并复制到剪贴板
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 设置文件路径（不存在时使用默认设置）
    #[arg(short, long, global = true, default_value = "settings.json")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 合成并发布头像，组装签名后写入剪贴板
    Export {
        /// 资料 JSON 文件
        #[arg(short, long)]
        profile: PathBuf,
        /// 头像来源（Data URL / 文件路径 / http(s) 地址），缺省时使用资料中的 headshotUrl
        #[arg(long)]
        photo: Option<String>,
    },
    /// 只合成头像并写出 PNG，不发布
    Render {
        /// 头像来源（Data URL / 文件路径 / http(s) 地址）
        #[arg(long)]
        photo: String,
        /// 输出 PNG 路径
        #[arg(short, long)]
        out: PathBuf,
        /// 取景参数来源的资料 JSON 文件，缺省时使用默认取景
        #[arg(short, long)]
        profile: Option<PathBuf>,
    },
    /// 打印预览 HTML，头像直接引用源图并由 CSS 取景
    Preview {
        /// 资料 JSON 文件
        #[arg(short, long)]
        profile: PathBuf,
        /// 头像来源，缺省时使用资料中的 headshotUrl
        #[arg(long)]
        photo: Option<String>,
        /// 同时打印纯文本回退
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ [{}] {} (stage={}, retryable={})", err.code(), err, err.stage(), err.is_retryable());
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ExportError> {
    let settings = AppSettings::load(&cli.settings)?;

    match cli.command {
        Command::Export { profile, photo } => {
            let profile = read_profile(&profile)?;
            let photo = photo.as_deref().map(PhotoSource::infer);
            let pipeline = ExportPipeline::from_settings(&settings)?;

            let report = pipeline.export(&profile, photo.as_ref()).await?;
            if let Some(published) = &report.published {
                println!("headshot: {}", published.url);
            }
            println!(
                "signature copied to clipboard at {} ({}ms)",
                report.exported_at.format("%Y-%m-%d %H:%M:%S"),
                report.total_ms
            );
        }
        Command::Render { photo, out, profile } => {
            settings.headshot.validate()?;
            let framing = match profile {
                Some(path) => read_profile(&path)?.framing,
                None => ProfileFields::default().framing,
            };
            let loader = SourceLoader::new(settings.headshot.clone())?;
            let compositor = Compositor::new(settings.headshot.clone());

            let source = loader.load(&PhotoSource::infer(&photo)).await?;
            let asset = compositor.composite(&source, &framing).await?;
            std::fs::write(&out, &asset.png)
                .map_err(|e| ExportError::Encode(format!("写出 {} 失败：{}", out.display(), e)))?;
            println!("wrote {}x{} {} headshot to {}", asset.size, asset.size, asset.shape.as_str(), out.display());
        }
        Command::Preview { profile, photo, plain } => {
            let profile = read_profile(&profile)?;
            let photo_url = photo.unwrap_or_else(|| profile.headshot_url.clone());
            let assembler = SignatureAssembler::new(settings.brand.alt_text.clone());

            let bundle = assembler.assemble_preview(
                &profile,
                settings.brand.mark_url(profile.brand_mark),
                Some(photo_url.as_str()),
            );
            println!("{}", bundle.html);
            if plain {
                println!();
                println!("{}", bundle.plain_text);
            }
        }
    }

    Ok(())
}

fn read_profile(path: &Path) -> Result<ProfileFields, ExportError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ExportError::Config(format!("读取资料文件失败 {}: {}", path.display(), e)))?;
    ProfileFields::from_json_str(&content)
}
