//! 文本清洗服务 - 业务能力层
//!
//! 所有从外部文件读出的文本（题干、选项、分类）进入模型前都要经过这里。
//! 应用内表单录入的文本不做清洗。

const SCRIPT_OPEN: &str = "<script";
const SCRIPT_CLOSE: &str = "</script";
const JAVASCRIPT_SCHEME: &str = "javascript";
const EVENT_PREFIX: &str = "on";

/// 清洗不可信文本
///
/// 去掉 `<script ...>...</script>` 块（不区分大小写，取最短匹配）、`javascript:` 前缀
/// 和 `on<word>=` 事件属性，再去掉首尾空白。
///
/// 逐字符写入缓冲区，每写入一个字符只检查缓冲区末尾是否构成需要删除的片段。
/// 删除后拼接出的新片段（如 `java` + `javascript:` + `script:`）会在后续字符写入时被发现，
/// 因此缓冲区始终不含任何可删除片段，`sanitize(sanitize(x)) == sanitize(x)`，耗时与输入长度成线性。
pub fn sanitize(raw: &str) -> String {
    let mut scanner = Scanner::with_capacity(raw.len());
    for c in raw.chars() {
        scanner.push(c);
    }
    scanner.finish()
}

/// 清洗可选文本，清洗后为空时返回 None
pub fn sanitize_non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(sanitize).filter(|text| !text.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Word,
    Space,
    Other,
}

fn class_of(c: char) -> CharClass {
    if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else if c.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Other
    }
}

#[derive(Debug, Default)]
struct Scanner {
    chars: Vec<char>,
    /// 每个位置所在同类字符连续段的起点
    run_starts: Vec<usize>,
    /// 最后一个 '>' 之后出现的 "<script" 起点
    pending_opens: Vec<usize>,
    /// 已经闭合的 `<script ...>` 开始标签起点（递增）
    open_tags: Vec<usize>,
}

impl Scanner {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            chars: Vec::with_capacity(capacity),
            run_starts: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    fn push(&mut self, c: char) {
        let index = self.chars.len();
        let class = class_of(c);
        let run_start = match index.checked_sub(1) {
            Some(prev) if class_of(self.chars[prev]) == class => self.run_starts[prev],
            _ => index,
        };
        self.chars.push(c);
        self.run_starts.push(run_start);

        match c {
            ':' => self.strip_javascript_scheme(),
            '=' => self.strip_event_handler(),
            '>' => {
                if !self.strip_script_block() {
                    self.complete_open_tag();
                }
            }
            't' | 'T' => {
                if let Some(start) = self.chars.len().checked_sub(SCRIPT_OPEN.len()) {
                    if self.matches_at(start, SCRIPT_OPEN) {
                        self.pending_opens.push(start);
                    }
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> String {
        let text: String = self.chars.into_iter().collect();
        text.trim().to_string()
    }

    fn matches_at(&self, start: usize, pattern: &str) -> bool {
        pattern
            .chars()
            .enumerate()
            .all(|(offset, p)| self.chars.get(start + offset).is_some_and(|c| c.eq_ignore_ascii_case(&p)))
    }

    /// 末尾是 `javascript:`
    fn strip_javascript_scheme(&mut self) {
        let colon = self.chars.len() - 1;
        if let Some(start) = colon.checked_sub(JAVASCRIPT_SCHEME.len()) {
            if self.matches_at(start, JAVASCRIPT_SCHEME) {
                self.truncate(start);
            }
        }
    }

    /// 末尾是 `on<word>=`，且 `on` 位于单词开头
    fn strip_event_handler(&mut self) {
        let Some(prev) = self.chars.len().checked_sub(2) else {
            return;
        };
        if class_of(self.chars[prev]) != CharClass::Word {
            return;
        }
        let start = self.run_starts[prev];
        if prev + 1 - start > EVENT_PREFIX.len() && self.matches_at(start, EVENT_PREFIX) {
            self.truncate(start);
        }
    }

    /// 末尾是 `</script\s*>` 且前面有已闭合的开始标签时，删除从最左边的开始标签到末尾的内容
    fn strip_script_block(&mut self) -> bool {
        let Some(mut end) = self.chars.len().checked_sub(1) else {
            return false;
        };
        if let Some(prev) = end.checked_sub(1) {
            if class_of(self.chars[prev]) == CharClass::Space {
                end = self.run_starts[prev];
            }
        }
        let Some(start) = end.checked_sub(SCRIPT_CLOSE.len()) else {
            return false;
        };
        if !self.matches_at(start, SCRIPT_CLOSE) {
            return false;
        }
        match self.open_tags.first() {
            Some(&open) => {
                self.truncate(open);
                true
            }
            None => false,
        }
    }

    /// 刚写入的 '>' 闭合了最早一个后面是单词边界的 "<script"
    fn complete_open_tag(&mut self) {
        let gt = self.chars.len() - 1;
        let opened = self.pending_opens.iter().copied().find(|&start| {
            let boundary = start + SCRIPT_OPEN.len();
            boundary == gt || class_of(self.chars[boundary]) != CharClass::Word
        });
        if let Some(start) = opened {
            self.open_tags.push(start);
        }
        self.pending_opens.clear();
    }

    fn truncate(&mut self, len: usize) {
        self.chars.truncate(len);
        self.run_starts.truncate(len);
        while self.open_tags.last().is_some_and(|&start| start >= len) {
            self.open_tags.pop();
        }
        self.pending_opens
            .retain(|&start| start + SCRIPT_OPEN.len() <= len);
    }
}
