use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::difficulty::Difficulty;

/// 选项标签 A/B/C/D
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    A,
    B,
    C,
    D,
}

impl Label {
    /// 按固定顺序排列的全部标签
    pub const ALL: [Label; 4] = [Label::A, Label::B, Label::C, Label::D];

    /// 在四个选项中的下标
    pub fn index(self) -> usize {
        self as usize
    }

    /// 大写字母
    pub fn upper(self) -> &'static str {
        match self {
            Label::A => "A",
            Label::B => "B",
            Label::C => "C",
            Label::D => "D",
        }
    }

    /// 小写字母（也是 XML 元素名）
    pub fn lower(self) -> &'static str {
        match self {
            Label::A => "a",
            Label::B => "b",
            Label::C => "c",
            Label::D => "d",
        }
    }

    /// 从字母解析标签（不区分大小写，忽略首尾空白）
    pub fn from_letter(text: &str) -> Option<Self> {
        match text.trim() {
            "a" | "A" => Some(Label::A),
            "b" | "B" => Some(Label::B),
            "c" | "C" => Some(Label::C),
            "d" | "D" => Some(Label::D),
            _ => None,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.upper())
    }
}

/// 抢答题的正确顺序
///
/// 四个名次各对应一个不同的标签，只能通过 [`CorrectOrder::new`] 构造。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[Label; 4]", into = "[Label; 4]")]
pub struct CorrectOrder([Label; 4]);

impl CorrectOrder {
    /// 校验四个标签恰好各出现一次
    pub fn new(ranks: [Label; 4]) -> Option<Self> {
        let mut seen = [false; 4];
        for label in ranks {
            if std::mem::replace(&mut seen[label.index()], true) {
                return None;
            }
        }
        Some(Self(ranks))
    }

    /// 按名次排列的标签（第一名在前）
    pub fn ranks(&self) -> [Label; 4] {
        self.0
    }

    pub fn first(&self) -> Label {
        self.0[0]
    }

    pub fn second(&self) -> Label {
        self.0[1]
    }

    pub fn third(&self) -> Label {
        self.0[2]
    }

    pub fn fourth(&self) -> Label {
        self.0[3]
    }

    /// 四个大写字母组成的顺序代码，例如 "BADC"
    pub fn code(&self) -> String {
        self.0.iter().map(|label| label.upper()).collect()
    }
}

impl Default for CorrectOrder {
    fn default() -> Self {
        Self(Label::ALL)
    }
}

impl TryFrom<[Label; 4]> for CorrectOrder {
    type Error = String;

    fn try_from(ranks: [Label; 4]) -> Result<Self, Self::Error> {
        CorrectOrder::new(ranks).ok_or_else(|| format!("顺序中存在重复标签: {:?}", ranks))
    }
}

impl From<CorrectOrder> for [Label; 4] {
    fn from(order: CorrectOrder) -> Self {
        order.0
    }
}

impl std::fmt::Display for CorrectOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// 抢答题（将四个选项排序）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingQuestion {
    pub id: Uuid,
    pub prompt: String,
    pub options: [String; 4],
    pub correct_order: CorrectOrder,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub selected: bool,
}

impl OrderingQuestion {
    /// 创建新题目，分配新的 id
    pub fn new(
        prompt: impl Into<String>,
        options: [String; 4],
        correct_order: CorrectOrder,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.into(),
            options,
            correct_order,
            difficulty,
            selected: false,
        }
    }

    /// 获取某个标签对应的选项文本
    pub fn option(&self, label: Label) -> &str {
        &self.options[label.index()]
    }
}

/// 普通题的单个选项
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    pub is_correct: bool,
}

impl ChoiceOption {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }
}

/// 普通单选题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceQuestion {
    pub id: Uuid,
    pub category: String,
    pub prompt: String,
    pub options: [ChoiceOption; 4],
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub selected: bool,
}

impl ChoiceQuestion {
    /// 导入时缺省的分类名
    pub const DEFAULT_CATEGORY: &'static str = "Imported";

    /// 创建新题目，分配新的 id
    pub fn new(
        category: impl Into<String>,
        prompt: impl Into<String>,
        options: [ChoiceOption; 4],
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            prompt: prompt.into(),
            options,
            difficulty,
            selected: false,
        }
    }

    /// 获取某个标签对应的选项
    pub fn option(&self, label: Label) -> &ChoiceOption {
        &self.options[label.index()]
    }

    /// 正确答案，多个正确时按 A-D 顺序取第一个
    pub fn correct_label(&self) -> Option<Label> {
        Label::ALL
            .into_iter()
            .find(|label| self.options[label.index()].is_correct)
    }
}

/// 一次导入/导出交换的题目集合
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuestionSet {
    pub ordering: Option<OrderingQuestion>,
    #[serde(default)]
    pub choices: Vec<ChoiceQuestion>,
}

impl QuestionSet {
    pub fn new(ordering: Option<OrderingQuestion>, choices: Vec<ChoiceQuestion>) -> Self {
        Self { ordering, choices }
    }

    pub fn is_empty(&self) -> bool {
        self.ordering.is_none() && self.choices.is_empty()
    }

    /// 题目总数
    pub fn len(&self) -> usize {
        self.choices.len() + usize::from(self.ordering.is_some())
    }
}
