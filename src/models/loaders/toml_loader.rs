use crate::models::question::{ChoiceQuestion, OrderingQuestion};
use crate::workflow::question_bank::QuestionBank;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 账户题库快照（TOML 文件内容）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSnapshot {
    pub account: String,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub ordering: Vec<OrderingQuestion>,
    #[serde(default)]
    pub choices: Vec<ChoiceQuestion>,
}

impl BankSnapshot {
    pub fn new(account: &str, bank: &QuestionBank) -> Self {
        Self {
            account: account.to_string(),
            saved_at: Utc::now(),
            ordering: bank.ordering().to_vec(),
            choices: bank.choices().to_vec(),
        }
    }

    pub fn into_bank(self) -> QuestionBank {
        QuestionBank::from_parts(self.ordering, self.choices)
    }
}

/// 账户名转换为安全的文件名（只保留字母数字、`-` 和 `_`）
fn account_stem(account: &str) -> String {
    let stem: String = account
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.trim_matches('_').is_empty() {
        "default".to_string()
    } else {
        stem
    }
}

/// 账户快照文件路径
pub fn bank_file_path(dir: &Path, account: &str) -> PathBuf {
    dir.join(format!("{}.toml", account_stem(account)))
}

/// 保存账户题库到 TOML 文件，返回写入的路径
pub async fn save_bank(dir: &Path, account: &str, bank: &QuestionBank) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("无法创建题库目录: {}", dir.display()))?;

    let snapshot = BankSnapshot::new(account, bank);
    let content = toml::to_string_pretty(&snapshot)
        .with_context(|| format!("无法序列化账户题库: {}", account))?;

    let path = bank_file_path(dir, account);
    fs::write(&path, content)
        .await
        .with_context(|| format!("无法写入TOML文件: {}", path.display()))?;

    tracing::info!(
        "💾 已保存账户 {} 的题库: 抢答题 {} 道, 普通题 {} 道",
        account,
        snapshot.ordering.len(),
        snapshot.choices.len()
    );
    Ok(path)
}

/// 从 TOML 文件加载账户题库，文件不存在时返回空题库
pub async fn load_bank(dir: &Path, account: &str) -> Result<QuestionBank> {
    let path = bank_file_path(dir, account);

    let exists = fs::try_exists(&path)
        .await
        .with_context(|| format!("无法访问TOML文件: {}", path.display()))?;
    if !exists {
        tracing::info!("账户 {} 还没有保存的题库，使用空题库", account);
        return Ok(QuestionBank::new());
    }

    let content = fs::read_to_string(&path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", path.display()))?;

    let snapshot: BankSnapshot = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", path.display()))?;

    tracing::info!(
        "成功加载账户 {} 的题库（保存于 {}）",
        snapshot.account,
        snapshot.saved_at.format("%Y-%m-%d %H:%M:%S")
    );
    Ok(snapshot.into_bank())
}
