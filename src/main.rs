//! Autocaption - 自动字幕生成系统
//!
//! 三个入口：
//! - serve: 字幕服务（HTTP API + CaptionWorker）
//! - generate: 单条目轮询客户端
//! - batch: 宿主批处理调度

mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use autocaption::application::{
    BatchConfig, GenerateCaption, GenerateCaptionHandler, HostPort, PollConfig, QueueBatch,
    QueueBatchHandler, TranslatorPort,
};
use autocaption::config::{load_config_from_path, print_config, AppConfig};
use autocaption::infrastructure::adapters::{
    FfmpegExtractor, FfmpegExtractorConfig, FileCaptionStore, GraphqlHostClient,
    GraphqlHostConfig, HttpCaptionServiceClient, HttpCaptionServiceConfig, HttpEngineClient,
    HttpEngineClientConfig, LibreTranslateClient, LibreTranslateConfig, TracingProgressSink,
};
use autocaption::infrastructure::events::EventPublisher;
use autocaption::infrastructure::http::{AppState, HttpServer, ServerConfig};
use autocaption::infrastructure::memory::InMemoryTaskStore;
use autocaption::infrastructure::worker::{CaptionWorker, CaptionWorkerConfig};
use cli::{BatchArgs, Cli, Command, GenerateArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config_from_path(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Generate(args) => generate(config, args).await,
        Command::Batch(args) => batch(config, args).await,
    }
}

/// 初始化日志；RUST_LOG 优先于配置
fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},autocaption={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// ctrl-c 时取消 token
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received shutdown signal"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for ctrl-c"),
        }
        child.cancel();
    });
    token
}

fn host_client(config: &AppConfig) -> anyhow::Result<Arc<dyn HostPort>> {
    let host = GraphqlHostClient::new(GraphqlHostConfig {
        url: config.host.url.clone(),
        api_key: config.host.api_key.clone(),
        plugin_id: config.host.plugin_id.clone(),
        timeout_secs: config.host.timeout_secs,
    })
    .context("Failed to create host client")?;
    Ok(Arc::new(host))
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Autocaption - caption service");
    print_config(&config);

    tokio::fs::create_dir_all(&config.pipeline.temp_dir).await?;

    // 识别引擎
    let engine_config = HttpEngineClientConfig::new(&config.engine.url)
        .with_timeout(config.engine.timeout_secs)
        .with_streaming(config.engine.streaming);
    let engine = Arc::new(HttpEngineClient::new(engine_config).context("Failed to create engine client")?);

    // 二次翻译
    let translator: Option<Arc<dyn TranslatorPort>> = if config.translation.enabled {
        let translation_config = LibreTranslateConfig::new(&config.translation.url)
            .with_timeout(config.translation.timeout_secs);
        Some(Arc::new(
            LibreTranslateClient::new(translation_config).context("Failed to create translation client")?,
        ))
    } else {
        None
    };

    let extractor = Arc::new(FfmpegExtractor::new(FfmpegExtractorConfig {
        binary: config.pipeline.ffmpeg_binary.clone(),
        temp_dir: config.pipeline.temp_dir.clone(),
    }));
    let caption_store = Arc::new(FileCaptionStore::new());
    let event_publisher = EventPublisher::new().arc();

    // 任务队列与任务存储
    let (task_tx, task_rx) = mpsc::channel(config.pipeline.queue_size);
    let task_store = InMemoryTaskStore::with_limits(
        task_tx,
        config.pipeline.store_capacity,
        config.pipeline.idle_secs,
    )
    .arc();

    let worker = CaptionWorker::new(
        CaptionWorkerConfig {
            max_concurrent: config.pipeline.workers,
            secondary_weights: config.pipeline.weights.secondary,
            engine_weights: config.pipeline.weights.engine,
            canonical_language: config.pipeline.canonical_language.clone(),
        },
        task_rx,
        task_store.clone(),
        extractor,
        engine.clone(),
        translator.clone(),
        caption_store.clone(),
        event_publisher.clone(),
    );
    tokio::spawn(worker.run());

    let state = AppState::new(task_store, caption_store, engine, translator, event_publisher);
    let server = HttpServer::new(ServerConfig::new(&config.server.host, config.server.port), state);

    let shutdown = cancel_on_ctrl_c();
    server
        .run_with_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn generate(config: AppConfig, args: GenerateArgs) -> anyhow::Result<()> {
    let service = Arc::new(
        HttpCaptionServiceClient::new(HttpCaptionServiceConfig {
            timeout_secs: config.client.timeout_secs,
        })
        .context("Failed to create caption service client")?,
    );

    let handler = GenerateCaptionHandler::new(
        service,
        Some(host_client(&config)?),
        Arc::new(TracingProgressSink::new()),
        PollConfig {
            poll_interval: Duration::from_secs(config.client.poll_interval_secs),
            default_service_url: config.client.service_url.clone(),
            subtitled_label: config.batch.subtitled_label.clone(),
        },
    );

    let cmd = GenerateCaption {
        scene_id: args.scene_id,
        video_path: args.video_path,
        language: args.language,
        translate_to: args.translate_to,
        service_url: args.service_url,
        cooldown_secs: args.cooldown_seconds.unwrap_or(config.client.cooldown_secs),
    };

    let cancel = cancel_on_ctrl_c();
    let outcome = handler.handle(cmd, &cancel).await?;

    match outcome.result {
        Some(result) => tracing::info!(
            task_id = %outcome.task_id,
            artifact = %result.artifact_path,
            cached = result.cached,
            "Caption generated"
        ),
        None => tracing::info!(task_id = %outcome.task_id, "Caption task completed without result"),
    }
    Ok(())
}

async fn batch(config: AppConfig, args: BatchArgs) -> anyhow::Result<()> {
    let settings = &config.batch;
    let handler = QueueBatchHandler::new(
        host_client(&config)?,
        Arc::new(FileCaptionStore::new()),
        BatchConfig {
            parent_tag: settings.parent_tag.clone(),
            subtitled_label: settings.subtitled_label.clone(),
            max_batch_size: settings.max_batch_size,
            page_size: settings.page_size,
            cooldown_secs: settings.cooldown_secs,
            submit_interval: Duration::from_millis(settings.submit_interval_ms),
            dedupe_within_run: settings.dedupe_within_run,
            translate_to: settings.translate_to.clone(),
            service_url: config.client.service_url.clone(),
            task_name: config.host.task_name.clone(),
        },
    );

    let summary = handler
        .handle(QueueBatch {
            max_batch_size: args.max_batch_size,
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
