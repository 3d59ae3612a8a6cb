//! XML 编解码服务 - 业务能力层
//!
//! 文件格式：
//!
//! ```text
//! <questions>
//!   <fastest difficulty="1">
//!     <text>...</text><a>...</a><b>...</b><c>...</c><d>...</d>
//!     <correctOrder><one>b</one><two>a</two><three>d</three><four>c</four></correctOrder>
//!   </fastest>
//!   <question difficulty="1">
//!     <category>...</category><text>...</text>
//!     <a correct="no">...</a><b correct="yes">...</b><c correct="no">...</c><d correct="no">...</d>
//!   </question>
//! </questions>
//! ```

use crate::config::ImportLimits;
use crate::error::{TransferError, TransferResult};
use crate::models::difficulty::Difficulty;
use crate::models::question::{ChoiceQuestion, CorrectOrder, Label, OrderingQuestion, QuestionSet};
use crate::services::records::{OptionRule, RawAnswer, RawChoiceRecord, RawOrderingRecord};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, warn};

const ROOT_ELEMENT: &str = "questions";
const ORDERING_ELEMENT: &str = "fastest";
const CHOICE_ELEMENT: &str = "question";
const ORDER_ELEMENT: &str = "correctOrder";

/// 名次元素，依次对应第一到第四名
const RANK_ELEMENTS: [&str; 4] = ["one", "two", "three", "four"];

/// XML 编解码器
pub struct XmlCodec {
    limits: ImportLimits,
}

impl XmlCodec {
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

    /// 序列化为 XML 文本
    pub fn serialize(&self, set: &QuestionSet) -> TransferResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(TransferError::export_failed)?;
        open(&mut writer, BytesStart::new(ROOT_ELEMENT))?;

        if let Some(question) = &set.ordering {
            write_ordering(&mut writer, question)?;
        }
        for question in &set.choices {
            write_choice(&mut writer, question)?;
        }

        close(&mut writer, ROOT_ELEMENT)?;
        String::from_utf8(writer.into_inner()).map_err(TransferError::export_failed)
    }

    /// 从原始字节解析（先检查大小，再按 UTF-8 解码）
    pub fn parse_bytes(&self, bytes: &[u8]) -> TransferResult<QuestionSet> {
        TransferError::check_size(bytes.len(), self.limits.max_file_bytes)?;
        let text = std::str::from_utf8(bytes)
            .map_err(|e| TransferError::malformed(format!("XML 不是有效的 UTF-8: {}", e)))?;
        self.parse(text)
    }

    /// 解析 XML 文本
    ///
    /// 只有语法错误、根元素不对或超过大小上限时返回错误；
    /// 不合法的题目直接丢弃。
    pub fn parse(&self, text: &str) -> TransferResult<QuestionSet> {
        TransferError::check_size(text.len(), self.limits.max_file_bytes)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let root = build_tree(text)?;
        if root.name != ROOT_ELEMENT {
            return Err(TransferError::unsupported(format!(
                "根元素应为 <{}>，实际为 <{}>",
                ROOT_ELEMENT, root.name
            )));
        }

        let ordering = root
            .find(ORDERING_ELEMENT)
            .and_then(|node| match read_ordering(node).validate() {
                Ok(question) => Some(question),
                Err(reason) => {
                    debug!("丢弃 <{}>: {}", ORDERING_ELEMENT, reason);
                    None
                }
            });

        let mut nodes = Vec::new();
        root.find_all(CHOICE_ELEMENT, &mut nodes);
        if nodes.len() > self.limits.max_xml_questions {
            warn!(
                "⚠️ XML 中有 {} 个 <{}>，只读取前 {} 个",
                nodes.len(),
                CHOICE_ELEMENT,
                self.limits.max_xml_questions
            );
        }

        let choices = nodes
            .into_iter()
            .take(self.limits.max_xml_questions)
            .enumerate()
            .filter_map(|(index, node)| match read_choice(node).validate() {
                Ok(question) => Some(question),
                Err(reason) => {
                    debug!("丢弃第 {} 个 <{}>: {}", index + 1, CHOICE_ELEMENT, reason);
                    None
                }
            })
            .collect();

        Ok(QuestionSet::new(ordering, choices))
    }
}

impl Default for XmlCodec {
    fn default() -> Self {
        Self::new()
    }
}

// ========== 序列化辅助函数 ==========

fn open(writer: &mut Writer<Vec<u8>>, start: BytesStart<'_>) -> TransferResult<()> {
    writer
        .write_event(Event::Start(start))
        .map_err(TransferError::export_failed)
}

fn close(writer: &mut Writer<Vec<u8>>, name: &str) -> TransferResult<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(TransferError::export_failed)
}

/// 写入 `<name attr="..">text</name>`，文本会被转义
fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> TransferResult<()> {
    let mut start = BytesStart::new(name);
    for attribute in attributes {
        start.push_attribute(*attribute);
    }
    open(writer, start)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(TransferError::export_failed)?;
    close(writer, name)
}

fn write_ordering(writer: &mut Writer<Vec<u8>>, question: &OrderingQuestion) -> TransferResult<()> {
    let difficulty = question.difficulty.code().to_string();
    let mut start = BytesStart::new(ORDERING_ELEMENT);
    start.push_attribute(("difficulty", difficulty.as_str()));
    open(writer, start)?;

    write_text_element(writer, "text", &[], &question.prompt)?;
    for label in Label::ALL {
        write_text_element(writer, label.lower(), &[], question.option(label))?;
    }

    open(writer, BytesStart::new(ORDER_ELEMENT))?;
    for (rank, label) in RANK_ELEMENTS.into_iter().zip(question.correct_order.ranks()) {
        write_text_element(writer, rank, &[], label.lower())?;
    }
    close(writer, ORDER_ELEMENT)?;

    close(writer, ORDERING_ELEMENT)
}

fn write_choice(writer: &mut Writer<Vec<u8>>, question: &ChoiceQuestion) -> TransferResult<()> {
    let difficulty = question.difficulty.code().to_string();
    let mut start = BytesStart::new(CHOICE_ELEMENT);
    start.push_attribute(("difficulty", difficulty.as_str()));
    open(writer, start)?;

    write_text_element(writer, "category", &[], &question.category)?;
    write_text_element(writer, "text", &[], &question.prompt)?;
    for label in Label::ALL {
        let option = question.option(label);
        let correct = if option.is_correct { "yes" } else { "no" };
        write_text_element(writer, label.lower(), &[("correct", correct)], &option.text)?;
    }

    close(writer, CHOICE_ELEMENT)
}

// ========== 解析辅助函数 ==========

/// 解析后的 XML 元素
#[derive(Debug, Default)]
struct XmlNode {
    name: String,
    attributes: Vec<(String, String)>,
    /// 按文档顺序排列的文本和子元素
    content: Vec<XmlContent>,
}

#[derive(Debug)]
enum XmlContent {
    Text(String),
    Element(XmlNode),
}

impl XmlNode {
    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn children(&self) -> impl Iterator<Item = &XmlNode> {
        self.content.iter().filter_map(|item| match item {
            XmlContent::Element(child) => Some(child),
            XmlContent::Text(_) => None,
        })
    }

    fn push_text(&mut self, text: &str) {
        match self.content.last_mut() {
            Some(XmlContent::Text(last)) => last.push_str(text),
            _ => self.content.push(XmlContent::Text(text.to_string())),
        }
    }

    /// 按文档顺序查找第一个同名后代元素
    fn find(&self, name: &str) -> Option<&XmlNode> {
        for child in self.children() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// 按文档顺序收集所有同名后代元素（不进入已匹配元素内部）
    fn find_all<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlNode>) {
        for child in self.children() {
            if child.name == name {
                out.push(child);
            } else {
                child.find_all(name, out);
            }
        }
    }

    /// 元素及其后代的全部文本（按文档顺序拼接）
    fn text_content(&self) -> String {
        let mut content = String::new();
        self.collect_text(&mut content);
        content
    }

    fn collect_text(&self, out: &mut String) {
        for item in &self.content {
            match item {
                XmlContent::Text(text) => out.push_str(text),
                XmlContent::Element(child) => child.collect_text(out),
            }
        }
    }
}

fn build_tree(text: &str) -> TransferResult<XmlNode> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(TransferError::malformed(format!(
                    "XML 语法错误 (位置 {}): {}",
                    reader.buffer_position(),
                    e
                )))
            }
        };

        match event {
            Event::Start(start) => stack.push(open_node(&start)?),
            Event::Empty(start) => {
                let node = open_node(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| TransferError::malformed("多余的结束标签"))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(content) => {
                let content = content.unescape().map_err(TransferError::malformed)?;
                match stack.last_mut() {
                    Some(node) => node.push_text(&content),
                    None if content.trim().is_empty() => {}
                    None => return Err(TransferError::malformed("根元素之外存在文本内容")),
                }
            }
            Event::CData(content) => {
                if let Some(node) = stack.last_mut() {
                    node.push_text(&String::from_utf8_lossy(&content.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(TransferError::malformed(format!("元素 <{}> 未闭合", open.name)));
    }
    root.ok_or_else(|| TransferError::unsupported(format!("缺少 <{}> 根元素", ROOT_ELEMENT)))
}

fn open_node(start: &BytesStart<'_>) -> TransferResult<XmlNode> {
    let mut node = XmlNode {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        ..Default::default()
    };
    for attribute in start.attributes() {
        let attribute = attribute.map_err(TransferError::malformed)?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(TransferError::malformed)?
            .into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> TransferResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.content.push(XmlContent::Element(node)),
        None if root.is_some() => return Err(TransferError::malformed("存在多个根元素")),
        None => *root = Some(node),
    }
    Ok(())
}

fn parse_difficulty(node: &XmlNode) -> Option<Difficulty> {
    node.attribute("difficulty")
        .and_then(|value| value.trim().parse::<i64>().ok())
        .map(Difficulty::from_code)
}

fn read_ordering(node: &XmlNode) -> RawOrderingRecord {
    let order_node = node.find(ORDER_ELEMENT);
    let slots = RANK_ELEMENTS.map(|rank| {
        order_node
            .and_then(|order| order.find(rank))
            .and_then(|slot| Label::from_letter(&slot.text_content()))
    });
    let correct_order = match slots {
        [Some(first), Some(second), Some(third), Some(fourth)] => {
            CorrectOrder::new([first, second, third, fourth])
        }
        _ => None,
    };

    RawOrderingRecord {
        prompt: node.find("text").map(XmlNode::text_content),
        options: Label::ALL.map(|label| node.find(label.lower()).map(XmlNode::text_content)),
        correct_order,
        difficulty: parse_difficulty(node).unwrap_or(Difficulty::Unspecified),
    }
}

fn read_choice(node: &XmlNode) -> RawChoiceRecord {
    let option_nodes = Label::ALL.map(|label| node.find(label.lower()));
    let flags = option_nodes.map(|option| {
        option
            .and_then(|option| option.attribute("correct"))
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("yes"))
    });

    RawChoiceRecord {
        category: node.find("category").map(XmlNode::text_content),
        prompt: node.find("text").map(XmlNode::text_content),
        options: option_nodes.map(|option| option.map(XmlNode::text_content)),
        answer: RawAnswer::Flags(flags),
        difficulty: parse_difficulty(node).unwrap_or(Difficulty::Easy),
        option_rule: OptionRule::MustExist,
    }
}
