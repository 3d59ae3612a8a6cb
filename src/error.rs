use thiserror::Error;

/// 导入导出错误类型
///
/// 编解码器只在容器级别失败时返回错误（文件过大、格式不对、语法错误），
/// 单条记录不合法时直接丢弃，不会中断整个导入。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// 文件超过大小上限
    #[error("文件过大: {size} 字节 (上限 {limit} 字节)")]
    TooLarge { size: usize, limit: usize },

    /// 扩展名/MIME 无法识别，或缺少必需的工作表/根元素
    #[error("不支持的文件格式: {reason}")]
    UnsupportedFormat { reason: String },

    /// 解析器层面的语法错误
    #[error("文件内容格式错误: {reason}")]
    MalformedInput { reason: String },

    /// 容器结构正确，但没有任何一条记录通过校验
    #[error("没有可导入的有效题目")]
    NoValidRecords,

    /// 生成导出文件失败
    #[error("导出失败: {reason}")]
    ExportFailed { reason: String },
}

// ========== 便捷构造函数 ==========

impl TransferError {
    /// 创建格式不支持错误
    pub fn unsupported(reason: impl Into<String>) -> Self {
        TransferError::UnsupportedFormat {
            reason: reason.into(),
        }
    }

    /// 创建内容格式错误
    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        TransferError::MalformedInput {
            reason: reason.to_string(),
        }
    }

    /// 创建导出失败错误
    pub fn export_failed(reason: impl std::fmt::Display) -> Self {
        TransferError::ExportFailed {
            reason: reason.to_string(),
        }
    }

    /// 检查输入大小，超过上限时返回 `TooLarge`
    pub fn check_size(size: usize, limit: usize) -> Result<(), Self> {
        if size > limit {
            Err(TransferError::TooLarge { size, limit })
        } else {
            Ok(())
        }
    }
}

// ========== Result 类型别名 ==========

/// 导入导出结果类型
pub type TransferResult<T> = Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_size() {
        assert!(TransferError::check_size(10, 10).is_ok());
        assert_eq!(
            TransferError::check_size(11, 10),
            Err(TransferError::TooLarge { size: 11, limit: 10 })
        );
    }

    #[test]
    fn test_display_messages() {
        let err = TransferError::unsupported("缺少 NORMAL 工作表");
        assert_eq!(err.to_string(), "不支持的文件格式: 缺少 NORMAL 工作表");
        assert_eq!(TransferError::NoValidRecords.to_string(), "没有可导入的有效题目");
    }
}
