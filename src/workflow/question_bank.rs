//! 题库 - 流程层
//!
//! 持有用户的全部题目，负责增删改、选择和排序。
//! 导入得到的 [`QuestionSet`] 通过 [`QuestionBank::apply_import`] 交给题库，
//! 导出时由 [`QuestionBank::selected_set`] 产出选中的题目。
//!
//! 不变量：任何时候最多只有一道抢答题处于选中状态。

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::difficulty::Difficulty;
use crate::models::question::{
    ChoiceOption, ChoiceQuestion, CorrectOrder, Label, OrderingQuestion, QuestionSet,
};

/// 抢答题的部分更新，`None` 表示保持原值
#[derive(Debug, Clone, Default)]
pub struct OrderingPatch {
    pub prompt: Option<String>,
    pub options: Option<[String; 4]>,
    pub correct_order: Option<CorrectOrder>,
    pub difficulty: Option<Difficulty>,
}

/// 普通题的部分更新，`None` 表示保持原值
#[derive(Debug, Clone, Default)]
pub struct ChoicePatch {
    pub category: Option<String>,
    pub prompt: Option<String>,
    pub options: Option<[ChoiceOption; 4]>,
    /// 指定唯一正确答案（在 `options` 之后应用）
    pub correct: Option<Label>,
    pub difficulty: Option<Difficulty>,
}

/// 按难度排序的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// 保持录入顺序
    #[default]
    None,
    /// 从简单到困难
    Ascending,
    /// 从困难到简单
    Descending,
}

/// 题库统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BankStats {
    pub ordering_total: usize,
    pub choice_total: usize,
    pub selected_choices: usize,
    pub has_selected_ordering: bool,
    /// 按难度统计普通题数量（未指定计入 Easy）
    pub by_difficulty: BTreeMap<String, usize>,
    /// 按分类统计普通题数量
    pub by_category: BTreeMap<String, usize>,
}

/// 题库
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionBank {
    ordering: Vec<OrderingQuestion>,
    choices: Vec<ChoiceQuestion>,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已有题目构造，多于一道选中的抢答题时只保留第一道的选中状态
    pub fn from_parts(ordering: Vec<OrderingQuestion>, choices: Vec<ChoiceQuestion>) -> Self {
        let mut bank = Self { ordering, choices };
        bank.enforce_single_ordering_selection();
        bank
    }

    pub fn ordering(&self) -> &[OrderingQuestion] {
        &self.ordering
    }

    pub fn choices(&self) -> &[ChoiceQuestion] {
        &self.choices
    }

    pub fn is_empty(&self) -> bool {
        self.ordering.is_empty() && self.choices.is_empty()
    }

    // ========== 增删改 ==========

    /// 新增抢答题，返回新分配的 id
    pub fn add_ordering(
        &mut self,
        prompt: impl Into<String>,
        options: [String; 4],
        correct_order: CorrectOrder,
        difficulty: Difficulty,
    ) -> Uuid {
        let question = OrderingQuestion::new(prompt, options, correct_order, difficulty);
        let id = question.id;
        self.ordering.push(question);
        id
    }

    /// 新增普通题，返回新分配的 id
    pub fn add_choice(
        &mut self,
        category: impl Into<String>,
        prompt: impl Into<String>,
        options: [ChoiceOption; 4],
        difficulty: Difficulty,
    ) -> Uuid {
        let question = ChoiceQuestion::new(category, prompt, options, difficulty);
        let id = question.id;
        self.choices.push(question);
        id
    }

    /// 部分更新抢答题，找不到 id 时返回 false
    pub fn update_ordering(&mut self, id: Uuid, patch: OrderingPatch) -> bool {
        let Some(question) = self.ordering.iter_mut().find(|q| q.id == id) else {
            return false;
        };
        if let Some(prompt) = patch.prompt {
            question.prompt = prompt;
        }
        if let Some(options) = patch.options {
            question.options = options;
        }
        if let Some(order) = patch.correct_order {
            question.correct_order = order;
        }
        if let Some(difficulty) = patch.difficulty {
            question.difficulty = difficulty;
        }
        true
    }

    /// 部分更新普通题，找不到 id 时返回 false
    pub fn update_choice(&mut self, id: Uuid, patch: ChoicePatch) -> bool {
        let Some(question) = self.choices.iter_mut().find(|q| q.id == id) else {
            return false;
        };
        if let Some(category) = patch.category {
            question.category = category;
        }
        if let Some(prompt) = patch.prompt {
            question.prompt = prompt;
        }
        if let Some(options) = patch.options {
            question.options = options;
        }
        if let Some(correct) = patch.correct {
            for label in Label::ALL {
                question.options[label.index()].is_correct = label == correct;
            }
        }
        if let Some(difficulty) = patch.difficulty {
            question.difficulty = difficulty;
        }
        true
    }

    pub fn delete_ordering(&mut self, id: Uuid) -> bool {
        let before = self.ordering.len();
        self.ordering.retain(|q| q.id != id);
        self.ordering.len() != before
    }

    pub fn delete_choice(&mut self, id: Uuid) -> bool {
        let before = self.choices.len();
        self.choices.retain(|q| q.id != id);
        self.choices.len() != before
    }

    // ========== 选择 ==========

    /// 选中一道抢答题，同时取消其他抢答题的选中
    ///
    /// 找不到 id 时不做任何修改。
    pub fn select_ordering(&mut self, id: Uuid) -> bool {
        if !self.ordering.iter().any(|q| q.id == id) {
            return false;
        }
        for question in &mut self.ordering {
            question.selected = question.id == id;
        }
        true
    }

    /// 切换抢答题的选中状态，选中时排他
    pub fn toggle_ordering_selection(&mut self, id: Uuid) -> bool {
        let Some(question) = self.ordering.iter_mut().find(|q| q.id == id) else {
            return false;
        };
        if question.selected {
            question.selected = false;
            return true;
        }
        self.select_ordering(id)
    }

    pub fn toggle_choice_selection(&mut self, id: Uuid) -> bool {
        match self.choices.iter_mut().find(|q| q.id == id) {
            Some(question) => {
                question.selected = !question.selected;
                true
            }
            None => false,
        }
    }

    /// 选中全部普通题；没有选中的抢答题时选中第一道
    pub fn select_all(&mut self) {
        for question in &mut self.choices {
            question.selected = true;
        }
        if !self.ordering.iter().any(|q| q.selected) {
            if let Some(first) = self.ordering.first_mut() {
                first.selected = true;
            }
        }
    }

    pub fn unselect_all(&mut self) {
        for question in &mut self.ordering {
            question.selected = false;
        }
        for question in &mut self.choices {
            question.selected = false;
        }
    }

    /// 删除所有选中的题目，返回删除数量
    pub fn delete_selected(&mut self) -> usize {
        let before = self.ordering.len() + self.choices.len();
        self.ordering.retain(|q| !q.selected);
        self.choices.retain(|q| !q.selected);
        let removed = before - self.ordering.len() - self.choices.len();
        debug!("删除了 {} 道选中的题目", removed);
        removed
    }

    pub fn selected_ordering(&self) -> Option<&OrderingQuestion> {
        self.ordering.iter().find(|q| q.selected)
    }

    /// 选中题目组成的导出集合
    pub fn selected_set(&self) -> QuestionSet {
        QuestionSet::new(
            self.selected_ordering().cloned(),
            self.choices.iter().filter(|q| q.selected).cloned().collect(),
        )
    }

    // ========== 导入、排序、统计 ==========

    /// 应用导入结果
    ///
    /// 普通题整体替换；导入结果包含抢答题时，抢答题列表替换为这一道并选中它。
    pub fn apply_import(&mut self, set: QuestionSet) {
        if let Some(mut ordering) = set.ordering {
            ordering.selected = true;
            self.ordering = vec![ordering];
        }
        self.choices = set.choices;
        info!(
            "📥 题库已更新: 抢答题 {} 道, 普通题 {} 道",
            self.ordering.len(),
            self.choices.len()
        );
    }

    /// 按难度排序的普通题（稳定排序，未指定按简单处理）
    pub fn sorted_choices(&self, order: SortOrder) -> Vec<&ChoiceQuestion> {
        let mut sorted: Vec<&ChoiceQuestion> = self.choices.iter().collect();
        match order {
            SortOrder::None => {}
            SortOrder::Ascending => sorted.sort_by_key(|q| q.difficulty.effective()),
            SortOrder::Descending => {
                sorted.sort_by(|a, b| b.difficulty.effective().cmp(&a.difficulty.effective()))
            }
        }
        sorted
    }

    pub fn stats(&self) -> BankStats {
        let mut stats = BankStats {
            ordering_total: self.ordering.len(),
            choice_total: self.choices.len(),
            selected_choices: self.choices.iter().filter(|q| q.selected).count(),
            has_selected_ordering: self.selected_ordering().is_some(),
            ..Default::default()
        };
        for question in &self.choices {
            *stats
                .by_difficulty
                .entry(question.difficulty.name().to_string())
                .or_default() += 1;
            *stats.by_category.entry(question.category.clone()).or_default() += 1;
        }
        stats
    }

    fn enforce_single_ordering_selection(&mut self) {
        let mut seen = false;
        for question in &mut self.ordering {
            if question.selected && std::mem::replace(&mut seen, true) {
                question.selected = false;
            }
        }
    }
}
