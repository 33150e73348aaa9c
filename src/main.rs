//! CLI host: per-keystroke script-filter queries, one-shot translation,
//! action dispatch and settings management.
//! stdout carries only user-facing payloads; logging goes to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::warn;

use colloq::action;
use colloq::config::{self, Settings};
use colloq::feedback;
use colloq::metrics::MetricsRegistry;
use colloq::translate::backend::ChatClient;
use colloq::translate::resolver::Resolver;
use colloq::translate::sqlite_cache::SqliteCache;
use colloq::translate::{Decision, FailureKind, TranslationBackend};

#[derive(Parser)]
#[command(
    name = "colloq",
    version,
    about = "As-you-type colloquial Chinese-to-English translation for launcher workflows"
)]
struct Cli {
    /// Config file path; the cache database sits in the same directory.
    #[arg(long, global = true, env = "COLLOQ_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Incremental query: prints launcher script-filter JSON on stdout.
    Query {
        /// Raw input as typed so far.
        text: Vec<String>,
    },
    /// One-shot translation: no completion filter, no cache.
    Translate {
        text: Vec<String>,
    },
    /// Handle a selected item's action argument (copy / speak).
    Action { arg: String },
    /// Inspect and update settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print current settings (API key elided).
    Show,
    /// Update one or more fields.
    Set {
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        prompt: Option<String>,
    },
    /// List models available from the backend.
    Models,
    /// Probe the backend with a minimal request.
    Test,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "colloq=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let settings = Settings::load(&config_path);

    match cli.command {
        Command::Query { text } => run_query(&text.join(" "), &settings, &config_path).await,
        Command::Translate { text } => run_translate(&text.join(" "), &settings).await,
        Command::Action { arg } => println!("{}", action::run(&arg)),
        Command::Config { command } => run_config(command, &settings, &config_path).await,
    }
}

/// The per-keystroke entry point: every invocation is an independent query
/// sharing only the durable cache with its predecessors.
async fn run_query(text: &str, settings: &Settings, config_path: &Path) {
    let decision = match ChatClient::new() {
        Ok(client) => {
            let durable = match SqliteCache::open(&config::cache_path_for(config_path)) {
                Ok(cache) => Some(cache),
                Err(e) => {
                    warn!(error = %e, "cache unavailable, every lookup will miss");
                    None
                }
            };
            let resolver = Resolver::new(
                Arc::new(client),
                durable,
                Arc::new(MetricsRegistry::new()),
            );
            resolver.resolve(text, settings).await
        }
        Err(e) => Decision::Failed {
            kind: FailureKind::Transport,
            message: e.to_string(),
        },
    };

    println!("{}", feedback::render(&decision, text).to_json());
}

async fn run_translate(text: &str, settings: &Settings) {
    let text = text.trim();
    if text.is_empty() {
        println!("请输入要翻译的中文文本");
        return;
    }
    if !settings.has_credential() {
        println!("错误：请先配置API Key（colloq config set --api-key <key>）");
        std::process::exit(1);
    }

    let client = match ChatClient::new() {
        Ok(client) => client,
        Err(e) => {
            println!("翻译失败：{e}");
            std::process::exit(1);
        }
    };

    match client.translate(text, settings).await {
        Ok(translated) => println!("{translated}"),
        Err(e) => {
            println!("翻译失败：{e}");
            std::process::exit(1);
        }
    }
}

async fn run_config(command: ConfigCommand, settings: &Settings, config_path: &Path) {
    match command {
        ConfigCommand::Show => {
            let key_display = if settings.api_key.is_empty() {
                "未设置".to_string()
            } else {
                let prefix: String = settings.api_key.chars().take(8).collect();
                format!("{prefix}...")
            };
            println!("config:  {}", config_path.display());
            println!("api_url: {}", settings.api_url);
            println!("api_key: {key_display}");
            println!("model:   {}", settings.model);
            println!("prompt:  {}", settings.prompt);
        }
        ConfigCommand::Set {
            api_url,
            api_key,
            model,
            prompt,
        } => {
            if api_url.is_none() && api_key.is_none() && model.is_none() && prompt.is_none() {
                println!("没有要修改的配置项（--api-url / --api-key / --model / --prompt）");
                return;
            }
            let mut updated = settings.clone();
            if let Some(v) = api_url {
                updated.api_url = v;
            }
            if let Some(v) = api_key {
                updated.api_key = v;
            }
            if let Some(v) = model {
                updated.model = v;
            }
            if let Some(v) = prompt {
                updated.prompt = v;
            }
            match updated.save(config_path) {
                Ok(()) => println!("配置已保存: {}", config_path.display()),
                Err(e) => {
                    eprintln!("配置保存失败: {e}");
                    std::process::exit(1);
                }
            }
        }
        ConfigCommand::Models => {
            let client = client_or_exit();
            match client.list_models(settings).await {
                Ok(models) if models.is_empty() => println!("后端未返回任何模型"),
                Ok(models) => {
                    for model in models {
                        println!("{model}");
                    }
                }
                Err(e) => {
                    eprintln!("获取模型列表失败: {e}");
                    std::process::exit(1);
                }
            }
        }
        ConfigCommand::Test => {
            let client = client_or_exit();
            match client.probe(settings).await {
                Ok(()) => println!("连接成功"),
                Err(e) => {
                    eprintln!("连接失败: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}

fn client_or_exit() -> ChatClient {
    match ChatClient::new() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("HTTP客户端初始化失败: {e}");
            std::process::exit(1);
        }
    }
}
