/// 难度枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Difficulty {
    /// 未指定（显示时按简单处理）
    Unspecified = 0,
    /// 简单
    #[default]
    Easy = 1,
    /// 中等
    Medium = 2,
    /// 困难
    Hard = 3,
}

impl Difficulty {
    /// 外部文件中允许的最大难度值
    pub const MAX_CODE: i64 = 10;

    /// 获取难度代码
    pub fn code(self) -> u8 {
        self as u8
    }

    /// 获取显示名称
    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Unspecified | Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// 显示用的难度（未指定按简单处理）
    pub fn effective(self) -> Self {
        match self {
            Difficulty::Unspecified => Difficulty::Easy,
            other => other,
        }
    }

    /// 从代码解析难度
    ///
    /// 先截断到 `[0, 10]`，大于 3 的值按困难处理。
    pub fn from_code(code: i64) -> Self {
        match code.clamp(0, Self::MAX_CODE) {
            0 => Difficulty::Unspecified,
            1 => Difficulty::Easy,
            2 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    /// 从文本解析难度，无法解析时返回 None
    ///
    /// 表格里的数字单元格可能是 "2" 或 "2.0"
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(code) = trimmed.parse::<i64>() {
            return Some(Self::from_code(code));
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() && value.fract() == 0.0 => {
                Some(Self::from_code(value as i64))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_clamps() {
        assert_eq!(Difficulty::from_code(-5), Difficulty::Unspecified);
        assert_eq!(Difficulty::from_code(0), Difficulty::Unspecified);
        assert_eq!(Difficulty::from_code(2), Difficulty::Medium);
        assert_eq!(Difficulty::from_code(7), Difficulty::Hard);
        assert_eq!(Difficulty::from_code(99), Difficulty::Hard);
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(Difficulty::parse(" 3 "), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("2.0"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::parse("2.5"), None);
        assert_eq!(Difficulty::parse("hard"), None);
        assert_eq!(Difficulty::parse(""), None);
    }

    #[test]
    fn test_unspecified_displays_as_easy() {
        assert_eq!(Difficulty::Unspecified.name(), "Easy");
        assert_eq!(Difficulty::Unspecified.effective(), Difficulty::Easy);
        assert_eq!(Difficulty::Unspecified.code(), 0);
    }
}
