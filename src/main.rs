// ==========================================
// 销售 CRM 线索导入 - 命令行入口
// ==========================================
// 子命令: preview / infer / import / fields / template / add-user / config-set / config-show
// 输出: 结果以 JSON 写入 stdout，日志写入 stderr
// 退出码: 0 成功；2 调用方可修正的错误（4xx）；1 其他错误
// ==========================================

use anyhow::Context;
use clap::{Parser, Subcommand};
use lead_importer::api::{ApiError, ApiResult, ImportApi};
use lead_importer::{logging, VERSION};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about = "Generic tabular lead importer", long_about = None)]
struct Cli {
    /// SQLite database path
    #[arg(long, env = "LEAD_IMPORTER_DB_PATH", global = true)]
    db_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LEAD_IMPORTER_LOG_LEVEL", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show headers, the first rows and the total row count of a file
    Preview { file: PathBuf },
    /// Suggest a column mapping for a file
    Infer { file: PathBuf },
    /// Import a file as leads
    Import {
        file: PathBuf,
        /// JSON mapping file: [{"csvColumn": "...", "leadField": "..."}]; suggested mapping when omitted
        #[arg(long)]
        mapping: Option<PathBuf>,
        /// Email of the user the imported leads are assigned to
        #[arg(long)]
        assignee: String,
    },
    /// List importable lead fields
    Fields,
    /// Print the generic CSV import template
    Template {
        /// Include an example row
        #[arg(long)]
        with_examples: bool,
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Register a user that leads can be assigned to
    AddUser {
        email: String,
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Set an import config value
    ConfigSet { key: String, value: String },
    /// Show import config values
    ConfigShow,
}

/// 默认数据库路径
///
/// 优先级: LEAD_IMPORTER_DB_PATH（由 clap env 处理）→ 用户数据目录 → 当前目录
fn get_default_db_path() -> String {
    let mut path = PathBuf::from("./lead_importer.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("lead-importer");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("lead_importer.db");
        }
    }

    path.to_string_lossy().to_string()
}

fn read_upload(path: &Path) -> anyhow::Result<(String, Vec<u8>)> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok((file_name, bytes))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// 失败输出（JSON，写入 stdout 以便脚本解析）
#[derive(Serialize)]
struct ErrorOutput {
    error: String,
    status: u16,
}

async fn run(api: &ImportApi, command: Commands) -> anyhow::Result<ApiResult<()>> {
    let outcome = match command {
        Commands::Preview { file } => {
            let (name, bytes) = read_upload(&file)?;
            api.preview_lead_file(&name, &bytes).await.map(|r| print_json(&r))
        }
        Commands::Infer { file } => {
            let (name, bytes) = read_upload(&file)?;
            api.suggest_lead_mappings(&name, &bytes).await.map(|r| print_json(&r))
        }
        Commands::Import {
            file,
            mapping,
            assignee,
        } => {
            let (name, bytes) = read_upload(&file)?;
            let result = match mapping {
                Some(mapping_path) => {
                    let json = std::fs::read_to_string(&mapping_path)
                        .with_context(|| format!("cannot read {}", mapping_path.display()))?;
                    api.import_leads_generic(&name, &bytes, &json, &assignee).await
                }
                None => match api.suggest_lead_mappings(&name, &bytes).await {
                    Ok(suggestion) => {
                        tracing::info!(columns = suggestion.mappings.len(), "使用建议映射导入");
                        api.import_leads_with_mappings(&name, &bytes, &suggestion.mappings, &assignee)
                            .await
                    }
                    Err(e) => Err(e),
                },
            };
            result.map(|r| print_json(&r))
        }
        Commands::Fields => api.get_lead_field_definitions().await.map(|r| print_json(&r)),
        Commands::Template {
            with_examples,
            output,
        } => match api.download_generic_template(with_examples).await {
            Ok(csv) => Ok(match output {
                Some(path) => std::fs::write(&path, csv)
                    .with_context(|| format!("cannot write {}", path.display())),
                None => {
                    print!("{}", csv);
                    Ok(())
                }
            }),
            Err(e) => Err(e),
        },
        Commands::AddUser { email, name } => api
            .register_user(&email, &name)
            .map(|id| print_json(&serde_json::json!({ "id": id, "email": email }))),
        Commands::ConfigSet { key, value } => api.set_import_config(&key, &value).map(|_| Ok(())),
        Commands::ConfigShow => api.get_import_config_snapshot().map(|snapshot| {
            println!("{}", snapshot);
            Ok(())
        }),
    };

    match outcome {
        Ok(printed) => {
            printed?;
            Ok(Ok(()))
        }
        Err(e) => Ok(Err(e)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_with_level(&cli.log_level);

    let db_path = cli.db_path.unwrap_or_else(get_default_db_path);
    tracing::debug!(version = VERSION, db_path = %db_path, "lead-importer 启动");

    let api = ImportApi::new(db_path);
    match run(&api, cli.command).await? {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            let status = e.status_code();
            print_json(&ErrorOutput {
                error: e.to_string(),
                status,
            })?;
            Ok(exit_code_for(&e))
        }
    }
}

fn exit_code_for(err: &ApiError) -> ExitCode {
    if err.status_code() < 500 {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}
