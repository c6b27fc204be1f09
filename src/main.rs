//! # TryOn.fit 命令行入口
//!
//! 本文件仅负责参数解析、配置合并与结果输出。
//! 业务逻辑分布在 `tryon` 模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tryon_fit::error::AppError;
use tryon_fit::settings::{self, AppSettings};
use tryon_fit::storage;
use tryon_fit::tryon::{
    ControllerEvent, GenerateOutcome, HttpJobClient, ImageRole, ImageSlotCapture, RawFile, ResultPresenter,
    TryOnConfig, TryOnController, TryOnError,
};

#[derive(Parser, Debug)]
#[command(name = "tryon-fit", version, about = "Virtual try-on client")]
struct Cli {
    /// Backend base URL (without the `/api` suffix).
    #[arg(long, env = "TRYON_BACKEND_URL", global = true)]
    backend_url: Option<String>,

    /// Tenant identifier sent with every job.
    #[arg(long, global = true)]
    tenant: Option<String>,

    /// Optional JSON settings file.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a try-on job and save the result as `tryon-result.png`.
    Generate {
        /// Person image(s); the first image file is used.
        #[arg(long, required = true, num_args = 1..)]
        person: Vec<PathBuf>,

        /// Clothing image(s); the first image file is used.
        #[arg(long, required = true, num_args = 1..)]
        clothing: Vec<PathBuf>,

        /// Directory for the downloaded result (created if missing).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Fetch a job record by id.
    Status {
        job_id: String,
    },
    /// Check that the backend is reachable.
    Ping,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        log::error!("❌ 执行失败 [{}]: {}", err.code(), err);
        if json {
            println!(
                "{}",
                serde_json::json!({ "ok": false, "code": err.code(), "stage": err.stage(), "error": err })
            );
        } else {
            eprintln!("{}", user_message(&err));
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let app_settings = match &cli.settings {
        Some(path) => settings::load_settings(path)?.unwrap_or_default(),
        None => AppSettings::default(),
    };
    let config = build_config(&cli, &app_settings)?;

    match cli.cmd {
        Command::Generate { person, clothing, out } => {
            let out = out.or(app_settings.download_dir);
            cmd_generate(config, person, clothing, out, cli.json).await
        }
        Command::Status { job_id } => cmd_status(config, &job_id, cli.json).await,
        Command::Ping => cmd_ping(config, cli.json).await,
    }
}

fn build_config(cli: &Cli, app_settings: &AppSettings) -> Result<TryOnConfig, AppError> {
    let mut config = TryOnConfig::default();
    app_settings.apply_to(&mut config);

    if let Some(url) = cli.backend_url.as_ref().filter(|url| !url.trim().is_empty()) {
        config.base_url = url.trim().to_string();
    }
    if let Some(tenant) = cli.tenant.as_ref().filter(|tenant| !tenant.trim().is_empty()) {
        config.tenant_id = tenant.trim().to_string();
    }

    config.validate()?;
    log::debug!("⚙️ 后端地址: {} 租户: {}", config.base_url, config.tenant_id);
    Ok(config)
}

async fn cmd_generate(
    config: TryOnConfig,
    person: Vec<PathBuf>,
    clothing: Vec<PathBuf>,
    out: Option<PathBuf>,
    json: bool,
) -> Result<(), AppError> {
    let out_dir = storage::resolve_download_dir(out.as_deref())?;
    let controller = TryOnController::new(config)?;

    let mut events = controller.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match &event {
                ControllerEvent::Progress { narration, .. } if !json => eprintln!("{}", narration),
                ControllerEvent::SlotFailed { role, message } if !json => {
                    eprintln!("{} image rejected: {}", role, message)
                }
                _ => log::debug!("📨 {:?}", event),
            }
        }
    });

    for (role, paths) in [(ImageRole::Person, person), (ImageRole::Clothing, clothing)] {
        let capture = ImageSlotCapture::new(role);
        let files = paths.into_iter().map(RawFile::from_path);
        if capture.deliver(&controller, files).await?.is_none() {
            log::warn!("⚠️ 没有为 {} 提供可用的图片文件", capture.role());
        }
    }

    let outcome = controller.generate().await;
    let presenter = ResultPresenter::new(&controller);
    let saved = match &outcome {
        Ok(GenerateOutcome::Completed(_)) => Some(presenter.download_result(&out_dir).await?),
        _ => None,
    };
    let view = presenter.view()?;

    drop(controller);
    if let Err(err) = printer.await {
        log::warn!("⚠️ 事件输出任务异常结束：{}", err);
    }

    match outcome? {
        GenerateOutcome::Completed(job) => {
            let dimensions = view.as_ref().and_then(|v| v.result_dimensions().ok());
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "ok": true,
                        "job_id": job.id(),
                        "status": job.status().as_str(),
                        "submitted_at": job.submitted_at(),
                        "finished_at": job.finished_at(),
                        "latency_ms": job.latency_ms(),
                        "metrics": job.metrics(),
                        "width": dimensions.map(|d| d.0),
                        "height": dimensions.map(|d| d.1),
                        "path": saved,
                    })
                );
            } else {
                println!("Job {} {}", job.id().unwrap_or("-"), job.status().as_str());
                if let Some(view) = &view {
                    for (kind, image) in view.panels() {
                        println!("  {:<14} {}", kind.label(), image.mime_type());
                    }
                }
                if let Some((width, height)) = dimensions {
                    println!("Result: {}x{}", width, height);
                }
                if let Some(path) = saved {
                    println!("Saved to {}", path.display());
                }
            }
            Ok(())
        }
        GenerateOutcome::AlreadySubmitting | GenerateOutcome::Discarded => {
            Err(TryOnError::State("任务未完成".to_string()).into())
        }
    }
}

async fn cmd_status(config: TryOnConfig, job_id: &str, json: bool) -> Result<(), AppError> {
    let client = HttpJobClient::new(&config)?;
    let job = client.fetch_job(job_id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "job_id": job.job_id,
                "status": job.status,
                "latency_ms": job.latency_ms,
                "error_message": job.error_message,
                "has_result": job.completed_payload().is_some(),
                "metrics": job.metrics,
            })
        );
    } else {
        println!(
            "Job {}: {}",
            job.job_id.as_deref().unwrap_or(job_id),
            job.status.as_deref().unwrap_or("unknown")
        );
        if let Some(message) = job.error_message.as_deref() {
            println!("Error: {}", message);
        }
        if let Some(latency) = job.latency_ms {
            println!("Latency: {}ms", latency);
        }
    }
    Ok(())
}

async fn cmd_ping(config: TryOnConfig, json: bool) -> Result<(), AppError> {
    let client = HttpJobClient::new(&config)?;
    let info = client.service_info().await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "ok": true, "message": info.message, "version": info.version })
        );
    } else {
        println!("{} (v{}) at {}", info.message, info.version, config.base_url);
    }
    Ok(())
}

/// 试穿错误只展示用户提示，其余错误展示完整信息。
fn user_message(err: &AppError) -> String {
    match err {
        AppError::TryOn(inner) => inner.message().to_string(),
        other => other.to_string(),
    }
}
