/// 默认文件大小上限：10 MiB
pub const DEFAULT_MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 导入文件大小上限（字节）
    pub max_file_bytes: usize,
    /// 普通题工作表最多读取的数据行数
    pub max_choice_rows: usize,
    /// 抢答题工作表最多读取的数据行数
    pub max_ordering_rows: usize,
    /// XML 中最多读取的 <question> 元素数量
    pub max_xml_questions: usize,
    /// 表格中跳过的表头行数
    pub header_rows: usize,
    /// 导出文件存放目录
    pub output_dir: String,
    /// 账户题库快照存放目录
    pub bank_dir: String,
    /// 日志级别（RUST_LOG 优先）
    pub log_level: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_choice_rows: 1000,
            max_ordering_rows: 100,
            max_xml_questions: 1000,
            header_rows: 1,
            output_dir: ".".to_string(),
            bank_dir: "banks".to_string(),
            log_level: "info".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_file_bytes: std::env::var("MAX_FILE_BYTES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_file_bytes),
            max_choice_rows: std::env::var("MAX_CHOICE_ROWS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_choice_rows),
            max_ordering_rows: std::env::var("MAX_ORDERING_ROWS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_ordering_rows),
            max_xml_questions: std::env::var("MAX_XML_QUESTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_xml_questions),
            header_rows: std::env::var("HEADER_ROWS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.header_rows),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            bank_dir: std::env::var("BANK_DIR").unwrap_or(default.bank_dir),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(default.log_level),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 编解码器使用的导入限制
    pub fn limits(&self) -> ImportLimits {
        ImportLimits {
            max_file_bytes: self.max_file_bytes,
            max_choice_rows: self.max_choice_rows,
            max_ordering_rows: self.max_ordering_rows,
            max_xml_questions: self.max_xml_questions,
            header_rows: self.header_rows,
        }
    }
}

/// 导入限制
///
/// 大小和行数上限用于保护内存，不是并发控制。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportLimits {
    pub max_file_bytes: usize,
    pub max_choice_rows: usize,
    pub max_ordering_rows: usize,
    pub max_xml_questions: usize,
    pub header_rows: usize,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Config::default().limits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = ImportLimits::default();
        assert_eq!(limits.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(limits.max_choice_rows, 1000);
        assert_eq!(limits.max_ordering_rows, 100);
        assert_eq!(limits.max_xml_questions, 1000);
        assert_eq!(limits.header_rows, 1);
    }
}
