//! 导入导出入口 - 流程层
//!
//! 调用方只需要提供文件字节和声明的类型（可选），这里负责：
//! 1. 检查大小
//! 2. 按声明类型或扩展名/MIME 选择编解码器
//! 3. 返回完整的 [`QuestionSet`] 或错误，不会返回部分结果

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::config::ImportLimits;
use crate::error::{TransferError, TransferResult};
use crate::models::question::QuestionSet;
use crate::services::{XlsxCodec, XmlCodec};

/// 支持的文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Xml,
    Xlsx,
}

const XML_MIMES: [&str; 2] = ["application/xml", "text/xml"];
const XLSX_MIMES: [&str; 2] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
];

impl FileKind {
    /// 默认扩展名
    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Xml => "xml",
            FileKind::Xlsx => "xlsx",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            FileKind::Xml => XML_MIMES[0],
            FileKind::Xlsx => XLSX_MIMES[0],
        }
    }

    /// 导出时建议的文件名
    pub fn default_file_name(self) -> &'static str {
        match self {
            FileKind::Xml => "questions.xml",
            FileKind::Xlsx => "questions.xlsx",
        }
    }

    /// 从文件名的扩展名判断类型（`.xls` 也按表格处理）
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "xml" => Some(FileKind::Xml),
            "xlsx" | "xls" => Some(FileKind::Xlsx),
            _ => None,
        }
    }

    /// 从 MIME 类型判断（忽略 `;` 之后的参数）
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next()?.trim().to_ascii_lowercase();
        if XML_MIMES.contains(&essence.as_str()) {
            Some(FileKind::Xml)
        } else if XLSX_MIMES.contains(&essence.as_str()) {
            Some(FileKind::Xlsx)
        } else {
            None
        }
    }

    /// 解析命令行里的类型名
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "xml" => Some(FileKind::Xml),
            "xlsx" | "xls" | "excel" => Some(FileKind::Xlsx),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// 待导入的文件
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, mime: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime,
            bytes,
        }
    }

    /// 根据扩展名和 MIME 推断的类型
    fn detected_kinds(&self) -> (Option<FileKind>, Option<FileKind>) {
        (
            FileKind::from_name(&self.name),
            self.mime.as_deref().and_then(FileKind::from_mime),
        )
    }
}

/// 导出结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// 导入文件
///
/// `declared` 存在时必须与扩展名或 MIME 之一相符；不存在时按扩展名、再按 MIME 推断。
pub fn import_bytes(
    file: &IncomingFile,
    declared: Option<FileKind>,
    limits: ImportLimits,
) -> TransferResult<QuestionSet> {
    TransferError::check_size(file.bytes.len(), limits.max_file_bytes)?;

    let (by_name, by_mime) = file.detected_kinds();
    let kind = match declared {
        Some(kind) if by_name == Some(kind) || by_mime == Some(kind) => kind,
        Some(kind) => {
            return Err(TransferError::unsupported(format!(
                "文件 {} 不是 {} 文件",
                file.name, kind
            )))
        }
        None => by_name.or(by_mime).ok_or_else(|| {
            TransferError::unsupported(format!("无法识别文件类型: {}", file.name))
        })?,
    };
    debug!("按 {} 格式导入 {}", kind, file.name);

    match kind {
        FileKind::Xml => XmlCodec::with_limits(limits).parse_bytes(&file.bytes),
        FileKind::Xlsx => XlsxCodec::with_limits(limits).parse(&file.bytes),
    }
}

/// 导出题目集合
pub fn export_bytes(set: &QuestionSet, target: FileKind) -> TransferResult<ExportedFile> {
    let bytes = match target {
        FileKind::Xml => XmlCodec::new().serialize(set)?.into_bytes(),
        FileKind::Xlsx => XlsxCodec::new().serialize(set)?,
    };
    Ok(ExportedFile {
        file_name: target.default_file_name().to_string(),
        mime: target.mime().to_string(),
        bytes,
    })
}

/// 空结果视为 `NoValidRecords`
pub fn require_records(set: QuestionSet) -> TransferResult<QuestionSet> {
    if set.is_empty() {
        Err(TransferError::NoValidRecords)
    } else {
        Ok(set)
    }
}

/// 从磁盘读取并导入文件
pub async fn import_path(
    path: &Path,
    declared: Option<FileKind>,
    limits: ImportLimits,
) -> Result<QuestionSet> {
    let metadata = fs::metadata(path)
        .await
        .with_context(|| format!("无法读取文件信息: {}", path.display()))?;
    let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
    TransferError::check_size(size, limits.max_file_bytes)?;

    let bytes = fs::read(path)
        .await
        .with_context(|| format!("无法读取文件: {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let set = import_bytes(&IncomingFile::new(name, None, bytes), declared, limits)?;
    info!(
        "📄 已读取 {}: 抢答题 {} 道, 普通题 {} 道",
        path.display(),
        usize::from(set.ordering.is_some()),
        set.choices.len()
    );
    Ok(set)
}

/// 导出到目录，返回写入的文件路径
pub async fn export_to_dir(set: &QuestionSet, target: FileKind, dir: &Path) -> Result<PathBuf> {
    let exported = export_bytes(set, target)?;

    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("无法创建输出目录: {}", dir.display()))?;
    let path = dir.join(&exported.file_name);
    fs::write(&path, &exported.bytes)
        .await
        .with_context(|| format!("无法写入文件: {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<questions><question><text>Q</text><a correct="yes">1</a><b>2</b><c>3</c><d>4</d></question></questions>"#;

    #[test]
    fn test_kind_detection() {
        assert_eq!(FileKind::from_name("bank.XML"), Some(FileKind::Xml));
        assert_eq!(FileKind::from_name("bank.xls"), Some(FileKind::Xlsx));
        assert_eq!(FileKind::from_name("bank.csv"), None);
        assert_eq!(FileKind::from_name("bank"), None);
        assert_eq!(FileKind::from_mime("text/xml; charset=utf-8"), Some(FileKind::Xml));
        assert_eq!(FileKind::from_mime("application/vnd.ms-excel"), Some(FileKind::Xlsx));
        assert_eq!(FileKind::from_mime("text/plain"), None);
        assert_eq!(FileKind::parse("XLSX"), Some(FileKind::Xlsx));
    }

    #[test]
    fn test_import_dispatch() {
        let limits = ImportLimits::default();

        let by_name = IncomingFile::new("bank.xml", None, XML.as_bytes().to_vec());
        assert_eq!(import_bytes(&by_name, None, limits).unwrap().choices.len(), 1);

        let by_mime = IncomingFile::new("upload", Some("text/xml".to_string()), XML.as_bytes().to_vec());
        assert_eq!(import_bytes(&by_mime, None, limits).unwrap().choices.len(), 1);
        assert!(import_bytes(&by_mime, Some(FileKind::Xml), limits).is_ok());

        let unknown = IncomingFile::new("bank.txt", None, XML.as_bytes().to_vec());
        assert!(matches!(
            import_bytes(&unknown, None, limits),
            Err(TransferError::UnsupportedFormat { .. })
        ));

        let mismatched = IncomingFile::new("bank.xml", None, XML.as_bytes().to_vec());
        assert!(matches!(
            import_bytes(&mismatched, Some(FileKind::Xlsx), limits),
            Err(TransferError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_size_checked_before_dispatch() {
        let limits = ImportLimits {
            max_file_bytes: 4,
            ..ImportLimits::default()
        };
        let file = IncomingFile::new("bank.txt", None, b"12345".to_vec());
        assert_eq!(
            import_bytes(&file, None, limits).unwrap_err(),
            TransferError::TooLarge { size: 5, limit: 4 }
        );
    }

    #[test]
    fn test_export_names() {
        let set = QuestionSet::default();
        let xml = export_bytes(&set, FileKind::Xml).unwrap();
        assert_eq!(xml.file_name, "questions.xml");
        assert_eq!(xml.mime, "application/xml");
        assert!(String::from_utf8(xml.bytes).unwrap().contains("<questions>"));

        let xlsx = export_bytes(&set, FileKind::Xlsx).unwrap();
        assert_eq!(xlsx.file_name, "questions.xlsx");
        assert!(xlsx.bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_require_records() {
        assert_eq!(
            require_records(QuestionSet::default()),
            Err(TransferError::NoValidRecords)
        );
    }
}
