/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use crate::config::Config;
use crate::models::question::QuestionSet;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// `RUST_LOG` 优先于配置中的 `log_level`；`verbose_logging` 打开时使用 debug 级别。
/// 重复调用不会报错（测试中可能多次初始化）。
pub fn init(config: &Config) {
    let default_level = if config.verbose_logging {
        "debug"
    } else {
        config.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录导入结果
///
/// # 参数
/// - `source`: 导入的文件名
/// - `set`: 导入得到的题目
pub fn log_import_summary(source: &str, set: &QuestionSet) {
    info!("{}", "=".repeat(60));
    info!("📥 导入完成: {}", source);
    match &set.ordering {
        Some(question) => info!("⚡ 抢答题: {}", truncate_text(&question.prompt, 40)),
        None => info!("⚡ 抢答题: 无"),
    }
    info!("📋 普通题: {} 道", set.choices.len());
    info!("{}", "=".repeat(60));
}

/// 记录导出结果
///
/// # 参数
/// - `path`: 写入的文件路径
/// - `set`: 导出的题目
pub fn log_export_done(path: &Path, set: &QuestionSet) {
    info!("\n{}", "─".repeat(60));
    info!("📤 已导出 {} 道题目", set.len());
    info!("💾 文件已保存至: {}", path.display());
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("一二三四五", 3), "一二三...");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = Config::default();
        init(&config);
        init(&config);
    }
}
