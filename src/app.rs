//! 应用编排层
//!
//! 把命令行子命令连接到导入导出入口、题库和账户快照。

use crate::config::Config;
use crate::models::loaders::{load_bank, save_bank};
use crate::utils::logging::{log_export_done, log_import_summary};
use crate::workflow::{export_to_dir, import_path, require_records, FileKind, QuestionBank};
use anyhow::Result;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 子命令
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 在 XML 和 xlsx 之间转换
    Convert {
        /// 输入文件（.xml / .xlsx / .xls）
        input: PathBuf,
        /// 目标格式: xml 或 xlsx
        #[arg(long, value_parser = parse_kind)]
        to: FileKind,
        /// 输出目录（默认使用 OUTPUT_DIR）
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// 导入文件并显示统计
    Inspect {
        input: PathBuf,
        /// 以 JSON 输出统计
        #[arg(long)]
        json: bool,
    },
    /// 导入文件到账户题库
    Import {
        input: PathBuf,
        #[arg(long)]
        account: String,
    },
    /// 导出账户题库中选中的题目
    Export {
        #[arg(long)]
        account: String,
        #[arg(long, value_parser = parse_kind)]
        to: FileKind,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

fn parse_kind(text: &str) -> Result<FileKind, String> {
    FileKind::parse(text).ok_or_else(|| format!("不支持的格式: {} (可选 xml / xlsx)", text))
}

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Self {
        log_startup(&config);
        Self { config }
    }

    /// 执行子命令
    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Convert { input, to, out_dir } => self.convert(&input, to, out_dir).await,
            Command::Inspect { input, json } => self.inspect(&input, json).await,
            Command::Import { input, account } => self.import(&input, &account).await,
            Command::Export {
                account,
                to,
                out_dir,
            } => self.export(&account, to, out_dir).await,
        }
    }

    async fn convert(&self, input: &Path, to: FileKind, out_dir: Option<PathBuf>) -> Result<()> {
        let set = require_records(import_path(input, None, self.config.limits()).await?)?;
        log_import_summary(&input.display().to_string(), &set);

        let dir = self.out_dir(out_dir);
        let path = export_to_dir(&set, to, &dir).await?;
        log_export_done(&path, &set);
        Ok(())
    }

    async fn inspect(&self, input: &Path, json: bool) -> Result<()> {
        let set = import_path(input, None, self.config.limits()).await?;
        log_import_summary(&input.display().to_string(), &set);

        let mut bank = QuestionBank::new();
        bank.apply_import(set);
        let stats = bank.stats();

        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        info!("📊 抢答题: {} 道", stats.ordering_total);
        info!("📊 普通题: {} 道", stats.choice_total);
        for (difficulty, count) in &stats.by_difficulty {
            info!("  难度 {}: {} 道", difficulty, count);
        }
        for (category, count) in &stats.by_category {
            info!("  分类 {}: {} 道", category, count);
        }
        Ok(())
    }

    async fn import(&self, input: &Path, account: &str) -> Result<()> {
        let bank_dir = Path::new(&self.config.bank_dir);
        let mut bank = load_bank(bank_dir, account).await?;

        let set = require_records(import_path(input, None, self.config.limits()).await?)?;
        log_import_summary(&input.display().to_string(), &set);

        bank.apply_import(set);
        save_bank(bank_dir, account, &bank).await?;
        Ok(())
    }

    async fn export(&self, account: &str, to: FileKind, out_dir: Option<PathBuf>) -> Result<()> {
        let bank = load_bank(Path::new(&self.config.bank_dir), account).await?;
        let set = bank.selected_set();
        if set.is_empty() {
            warn!("⚠️ 账户 {} 没有选中的题目，未生成文件", account);
            return Ok(());
        }

        let path = export_to_dir(&set, to, &self.out_dir(out_dir)).await?;
        log_export_done(&path, &set);
        Ok(())
    }

    fn out_dir(&self, out_dir: Option<PathBuf>) -> PathBuf {
        out_dir.unwrap_or_else(|| PathBuf::from(&self.config.output_dir))
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目导入导出");
    info!(
        "📊 文件上限: {} 字节, 普通题上限: {} 行",
        config.max_file_bytes, config.max_choice_rows
    );
    info!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("question_transfer_app_{}", uuid::Uuid::new_v4()))
    }

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<questions>
	<fastest difficulty="2">
		<text>Order</text>
		<a>1</a><b>2</b><c>3</c><d>4</d>
		<correctOrder><one>b</one><two>a</two><three>d</three><four>c</four></correctOrder>
	</fastest>
	<question><category>Math</category><text>2+2?</text><a>3</a><b correct="yes">4</b><c>5</c><d>6</d></question>
</questions>"#;

    #[tokio::test]
    async fn test_import_then_export_account() {
        let dir = temp_dir();
        let input = dir.join("input.xml");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(&input, XML).await.unwrap();

        let config = Config {
            bank_dir: dir.join("banks").to_string_lossy().to_string(),
            output_dir: dir.join("out").to_string_lossy().to_string(),
            ..Config::default()
        };
        let app = App::initialize(config);

        app.run(Command::Import {
            input: input.clone(),
            account: "bob".to_string(),
        })
        .await
        .unwrap();

        let bank = load_bank(&dir.join("banks"), "bob").await.unwrap();
        assert_eq!(bank.choices().len(), 1);
        assert!(bank.selected_ordering().is_some());

        // 导入后普通题未选中，只导出抢答题
        app.run(Command::Export {
            account: "bob".to_string(),
            to: FileKind::Xlsx,
            out_dir: None,
        })
        .await
        .unwrap();
        assert!(dir.join("out").join("questions.xlsx").exists());

        app.run(Command::Convert {
            input,
            to: FileKind::Xml,
            out_dir: Some(dir.join("converted")),
        })
        .await
        .unwrap();
        let converted = std::fs::read_to_string(dir.join("converted").join("questions.xml")).unwrap();
        assert!(converted.contains("<category>Math</category>"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_convert_rejects_empty_import() {
        let dir = temp_dir();
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let input = dir.join("empty.xml");
        tokio::fs::write(&input, "<questions/>").await.unwrap();

        let app = App::initialize(Config::default());
        let err = app
            .run(Command::Convert {
                input,
                to: FileKind::Xlsx,
                out_dir: Some(dir.clone()),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<crate::error::TransferError>(),
            Some(&crate::error::TransferError::NoValidRecords)
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("xml"), Ok(FileKind::Xml));
        assert!(parse_kind("csv").is_err());
    }
}
