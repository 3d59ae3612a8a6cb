//! 表格编解码服务 - 业务能力层
//!
//! 工作簿包含两个工作表：
//! - `NORMAL`: Category, Question, A, B, C, D, ANSWER, DIFFICULTY
//! - `FASTEST FINGER FIRST`: Category, Question, A, B, C, D, CORRECT ORDER, DIFFICULTY
//!
//! 读取时不绑定表头名称，按列位置取值，跳过开头的表头行。

use crate::config::ImportLimits;
use crate::error::{TransferError, TransferResult};
use crate::models::difficulty::Difficulty;
use crate::models::question::{ChoiceQuestion, Label, OrderingQuestion, QuestionSet};
use crate::services::order_code::parse_order_lenient;
use crate::services::records::{OptionRule, RawAnswer, RawChoiceRecord, RawOrderingRecord, RejectReason};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::io::Cursor;
use tracing::{debug, warn};

pub const CHOICE_SHEET: &str = "NORMAL";
pub const ORDERING_SHEET: &str = "FASTEST FINGER FIRST";

const CHOICE_HEADER: [&str; 8] = ["Category", "Question", "A", "B", "C", "D", "ANSWER", "DIFFICULTY"];
const ORDERING_HEADER: [&str; 8] = ["Category", "Question", "A", "B", "C", "D", "CORRECT ORDER", "DIFFICULTY"];

/// 抢答题行的分类列固定值
const ORDERING_CATEGORY: &str = "Fastest Finger";

/// 工作表名包含这些关键字之一即视为对应的表（不区分大小写）
const CHOICE_SHEET_KEYWORDS: [&str; 2] = ["NORMAL", "REGULAR"];
const ORDERING_SHEET_KEYWORDS: [&str; 2] = ["FASTEST", "FINGER"];

// 列位置
const COL_CATEGORY: usize = 0;
const COL_PROMPT: usize = 1;
const COL_FIRST_OPTION: usize = 2;
const COL_ANSWER: usize = 6;
const COL_DIFFICULTY: usize = 7;
const MIN_COLUMNS: usize = 7;

/// 表格编解码器
pub struct XlsxCodec {
    limits: ImportLimits,
}

impl XlsxCodec {
    /// 使用默认限制创建
    pub fn new() -> Self {
        Self {
            limits: ImportLimits::default(),
        }
    }

    /// 使用自定义限制创建
    pub fn with_limits(limits: ImportLimits) -> Self {
        Self { limits }
    }

    /// 序列化为 xlsx 字节
    pub fn serialize(&self, set: &QuestionSet) -> TransferResult<Vec<u8>> {
        let mut workbook = Workbook::new();

        let sheet = workbook.add_worksheet();
        sheet.set_name(CHOICE_SHEET).map_err(TransferError::export_failed)?;
        write_header(sheet, &CHOICE_HEADER)?;
        for (index, question) in set.choices.iter().enumerate() {
            write_choice_row(sheet, row_number(index + 1)?, question)?;
        }

        if let Some(question) = &set.ordering {
            let sheet = workbook.add_worksheet();
            sheet.set_name(ORDERING_SHEET).map_err(TransferError::export_failed)?;
            write_header(sheet, &ORDERING_HEADER)?;
            write_ordering_row(sheet, 1, question)?;
        }

        workbook.save_to_buffer().map_err(TransferError::export_failed)
    }

    /// 解析 xlsx/xls 字节
    ///
    /// 两个工作表都找不到时返回 `UnsupportedFormat`；单行不合法时跳过该行。
    pub fn parse(&self, bytes: &[u8]) -> TransferResult<QuestionSet> {
        TransferError::check_size(bytes.len(), self.limits.max_file_bytes)?;

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| TransferError::malformed(format!("无法读取工作簿: {}", e)))?;

        let names = workbook.sheet_names();
        let choice_sheet = find_sheet(&names, &CHOICE_SHEET_KEYWORDS);
        let ordering_sheet = find_sheet(&names, &ORDERING_SHEET_KEYWORDS);

        if choice_sheet.is_none() && ordering_sheet.is_none() {
            return Err(TransferError::unsupported(format!(
                "找不到普通题或抢答题工作表 (现有工作表: {})",
                names.join(", ")
            )));
        }

        let choices = match choice_sheet {
            Some(name) => {
                let range = workbook
                    .worksheet_range(&name)
                    .map_err(|e| TransferError::malformed(format!("无法读取工作表 {}: {}", name, e)))?;
                self.read_choices(&range)
            }
            None => Vec::new(),
        };

        let ordering = match ordering_sheet {
            Some(name) => {
                let range = workbook
                    .worksheet_range(&name)
                    .map_err(|e| TransferError::malformed(format!("无法读取工作表 {}: {}", name, e)))?;
                self.read_ordering(&range)
            }
            None => None,
        };

        Ok(QuestionSet::new(ordering, choices))
    }

    /// 读取普通题，只有非空行计入行数上限
    fn read_choices(&self, range: &Range<Data>) -> Vec<ChoiceQuestion> {
        let mut choices = Vec::new();
        let mut rows = data_rows(range, self.limits.header_rows);

        for (row_number, row) in rows.by_ref().take(self.limits.max_choice_rows) {
            match read_choice_row(&row) {
                Ok(question) => choices.push(question),
                Err(reason) => debug!("丢弃 {} 第 {} 行: {}", CHOICE_SHEET, row_number, reason),
            }
        }
        if rows.next().is_some() {
            warn!(
                "⚠️ {} 工作表超过 {} 行，其余行已忽略",
                CHOICE_SHEET, self.limits.max_choice_rows
            );
        }

        choices
    }

    fn read_ordering(&self, range: &Range<Data>) -> Option<OrderingQuestion> {
        data_rows(range, self.limits.header_rows)
            .take(self.limits.max_ordering_rows)
            .find_map(|(row_number, row)| match read_ordering_row(&row) {
                Ok(question) => Some(question),
                Err(reason) => {
                    debug!("丢弃 {} 第 {} 行: {}", ORDERING_SHEET, row_number, reason);
                    None
                }
            })
    }
}

impl Default for XlsxCodec {
    fn default() -> Self {
        Self::new()
    }
}

// ========== 读取辅助函数 ==========

fn find_sheet(names: &[String], keywords: &[&str]) -> Option<String> {
    names
        .iter()
        .find(|name| {
            let upper = name.to_uppercase();
            keywords.iter().any(|keyword| upper.contains(keyword))
        })
        .cloned()
}

/// 按绝对位置展开工作表的每一行
///
/// calamine 的 Range 从第一个非空单元格开始，这里补齐前面的空行和空列，
/// 保证列下标与表格中的实际列一致；每行末尾的空单元格被去掉。
fn raw_rows(range: &Range<Data>) -> impl Iterator<Item = Vec<String>> + '_ {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let leading = std::iter::repeat_with(Vec::new).take(start_row as usize);

    leading.chain(range.rows().map(move |cells| {
        let mut row = vec![String::new(); start_col as usize];
        row.extend(cells.iter().map(cell_text));
        while row.last().is_some_and(|cell| cell.trim().is_empty()) {
            row.pop();
        }
        row
    }))
}

/// 表头之后的非空行，附带表格中的行号（从 1 开始）
fn data_rows(
    range: &Range<Data>,
    header_rows: usize,
) -> impl Iterator<Item = (usize, Vec<String>)> + '_ {
    raw_rows(range)
        .enumerate()
        .skip(header_rows)
        .filter(|(_, row)| !row.is_empty())
        .map(|(index, row)| (index + 1, row))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            (*value as i64).to_string()
        }
        other => other.to_string(),
    }
}

fn options_of(row: &[String]) -> [Option<String>; 4] {
    Label::ALL.map(|label| row.get(COL_FIRST_OPTION + label.index()).cloned())
}

fn difficulty_of(row: &[String]) -> Option<Difficulty> {
    row.get(COL_DIFFICULTY).and_then(|cell| Difficulty::parse(cell))
}

fn read_choice_row(row: &[String]) -> Result<ChoiceQuestion, RejectReason> {
    if row.len() < MIN_COLUMNS {
        return Err(RejectReason::TooFewColumns(row.len()));
    }

    RawChoiceRecord {
        category: row.get(COL_CATEGORY).cloned(),
        prompt: row.get(COL_PROMPT).cloned(),
        options: options_of(row),
        answer: RawAnswer::Label(Label::from_letter(&row[COL_ANSWER])),
        difficulty: difficulty_of(row).unwrap_or(Difficulty::Easy),
        option_rule: OptionRule::NonEmpty,
    }
    .validate()
}

fn read_ordering_row(row: &[String]) -> Result<OrderingQuestion, RejectReason> {
    if row.len() < MIN_COLUMNS {
        return Err(RejectReason::TooFewColumns(row.len()));
    }

    RawOrderingRecord {
        prompt: row.get(COL_PROMPT).cloned(),
        options: options_of(row),
        correct_order: parse_order_lenient(&row[COL_ANSWER]),
        difficulty: difficulty_of(row).unwrap_or(Difficulty::Unspecified),
    }
    .validate()
}

// ========== 写入辅助函数 ==========

fn row_number(index: usize) -> TransferResult<u32> {
    u32::try_from(index).map_err(|_| TransferError::export_failed(format!("行号超出范围: {}", index)))
}

fn write_header(sheet: &mut Worksheet, header: &[&str]) -> TransferResult<()> {
    for (col, title) in (0u16..).zip(header) {
        sheet
            .write_string(0, col, *title)
            .map_err(TransferError::export_failed)?;
    }
    Ok(())
}

fn write_cells(sheet: &mut Worksheet, row: u32, texts: &[&str], difficulty: Difficulty) -> TransferResult<()> {
    for (col, text) in (0u16..).zip(texts) {
        sheet
            .write_string(row, col, *text)
            .map_err(TransferError::export_failed)?;
    }
    sheet
        .write_number(row, COL_DIFFICULTY as u16, difficulty.code())
        .map_err(TransferError::export_failed)?;
    Ok(())
}

fn write_choice_row(sheet: &mut Worksheet, row: u32, question: &ChoiceQuestion) -> TransferResult<()> {
    let answer = question.correct_label().map(Label::upper).unwrap_or("");
    let texts = [
        question.category.as_str(),
        question.prompt.as_str(),
        question.option(Label::A).text.as_str(),
        question.option(Label::B).text.as_str(),
        question.option(Label::C).text.as_str(),
        question.option(Label::D).text.as_str(),
        answer,
    ];
    write_cells(sheet, row, &texts, question.difficulty)
}

fn write_ordering_row(sheet: &mut Worksheet, row: u32, question: &OrderingQuestion) -> TransferResult<()> {
    let code = question.correct_order.code();
    let texts = [
        ORDERING_CATEGORY,
        question.prompt.as_str(),
        question.option(Label::A),
        question.option(Label::B),
        question.option(Label::C),
        question.option(Label::D),
        code.as_str(),
    ];
    write_cells(sheet, row, &texts, question.difficulty)
}
