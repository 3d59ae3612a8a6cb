//! 原始记录 - 业务能力层
//!
//! 编解码器先把 XML 元素或表格行读成原始记录，校验全部必填字段后才构造模型。
//! 不合法的记录只返回拒绝原因，由调用方记录日志并丢弃。

use crate::models::difficulty::Difficulty;
use crate::models::question::{ChoiceOption, ChoiceQuestion, CorrectOrder, Label, OrderingQuestion};
use crate::services::sanitizer::{sanitize, sanitize_non_empty};
use std::fmt;
use tracing::warn;

/// 记录被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// 列数不足
    TooFewColumns(usize),
    /// 题干为空
    EmptyPrompt,
    /// 缺少选项元素
    MissingOption(Label),
    /// 选项为空
    EmptyOption(Label),
    /// 答案无效
    InvalidAnswer,
    /// 正确顺序无效
    InvalidOrder,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TooFewColumns(count) => write!(f, "列数不足 ({} 列)", count),
            RejectReason::EmptyPrompt => write!(f, "题干为空"),
            RejectReason::MissingOption(label) => write!(f, "缺少选项 {}", label),
            RejectReason::EmptyOption(label) => write!(f, "选项 {} 为空", label),
            RejectReason::InvalidAnswer => write!(f, "答案无效"),
            RejectReason::InvalidOrder => write!(f, "正确顺序无效"),
        }
    }
}

/// 选项校验规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionRule {
    /// 元素必须存在，允许为空文本（XML 普通题）
    MustExist,
    /// 清洗后不能为空（抢答题、表格行）
    NonEmpty,
}

/// 普通题的答案来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawAnswer {
    /// 每个选项一个标记（XML 的 correct 属性）
    Flags([bool; 4]),
    /// 单个答案标签（表格 ANSWER 列），None 表示无法解析
    Label(Option<Label>),
}

/// 抢答题原始记录
#[derive(Debug, Clone, Default)]
pub struct RawOrderingRecord {
    pub prompt: Option<String>,
    pub options: [Option<String>; 4],
    pub correct_order: Option<CorrectOrder>,
    pub difficulty: Difficulty,
}

impl RawOrderingRecord {
    /// 校验并构造抢答题（分配新 id）
    pub fn validate(self) -> Result<OrderingQuestion, RejectReason> {
        let prompt = sanitize_non_empty(self.prompt.as_deref()).ok_or(RejectReason::EmptyPrompt)?;
        let options = clean_options(self.options, OptionRule::NonEmpty)?;
        let correct_order = self.correct_order.ok_or(RejectReason::InvalidOrder)?;

        Ok(OrderingQuestion::new(
            prompt,
            options,
            correct_order,
            self.difficulty,
        ))
    }
}

/// 普通题原始记录
#[derive(Debug, Clone)]
pub struct RawChoiceRecord {
    pub category: Option<String>,
    pub prompt: Option<String>,
    pub options: [Option<String>; 4],
    pub answer: RawAnswer,
    pub difficulty: Difficulty,
    pub option_rule: OptionRule,
}

impl RawChoiceRecord {
    /// 校验并构造普通题（分配新 id）
    ///
    /// 没有正确答案时保留记录（答案未知）；多个正确答案时按 A-D 顺序只保留第一个。
    pub fn validate(self) -> Result<ChoiceQuestion, RejectReason> {
        let prompt = sanitize_non_empty(self.prompt.as_deref()).ok_or(RejectReason::EmptyPrompt)?;
        let category = sanitize_non_empty(self.category.as_deref())
            .unwrap_or_else(|| ChoiceQuestion::DEFAULT_CATEGORY.to_string());
        let texts = clean_options(self.options, self.option_rule)?;

        let winner = match self.answer {
            RawAnswer::Label(label) => Some(label.ok_or(RejectReason::InvalidAnswer)?),
            RawAnswer::Flags(flags) => {
                let marked = flags.iter().filter(|flag| **flag).count();
                if marked > 1 {
                    warn!("⚠️ 题目有 {} 个正确答案，只保留第一个: {}", marked, prompt);
                }
                Label::ALL.into_iter().find(|label| flags[label.index()])
            }
        };

        let options = Label::ALL.map(|label| {
            ChoiceOption::new(texts[label.index()].clone(), winner == Some(label))
        });

        Ok(ChoiceQuestion::new(category, prompt, options, self.difficulty))
    }
}

fn clean_options(
    options: [Option<String>; 4],
    rule: OptionRule,
) -> Result<[String; 4], RejectReason> {
    let mut cleaned: [String; 4] = Default::default();
    for (label, raw) in Label::ALL.into_iter().zip(options) {
        let raw = raw.ok_or(RejectReason::MissingOption(label))?;
        let text = sanitize(&raw);
        if rule == OptionRule::NonEmpty && text.is_empty() {
            return Err(RejectReason::EmptyOption(label));
        }
        cleaned[label.index()] = text;
    }
    Ok(cleaned)
}
