//! 顺序代码解析服务 - 业务能力层
//!
//! 把 `ABCD`、`A-B-C-D`、`1234`、`1-2-3-4`、`B, A, D, C` 等写法统一解析为 [`CorrectOrder`]。

use crate::models::question::{CorrectOrder, Label};
use phf::phf_map;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// 单个字符到标签的映射，数字 1-4 对应 A-D
static TOKEN_LABELS: phf::Map<char, Label> = phf_map! {
    'a' => Label::A, 'A' => Label::A, '1' => Label::A,
    'b' => Label::B, 'B' => Label::B, '2' => Label::B,
    'c' => Label::C, 'C' => Label::C, '3' => Label::C,
    'd' => Label::D, 'D' => Label::D, '4' => Label::D,
};

/// 按优先级排列的完整写法
static STRICT_FORMS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"^[A-Da-d]{4}$",
        r"^[A-Da-d](?:-[A-Da-d]){3}$",
        r"^[1-4]{4}$",
        r"^[1-4](?:-[1-4]){3}$",
    ]
    .map(|pattern| Regex::new(pattern).expect("顺序代码正则无效"))
});

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s,]+").expect("分隔符正则无效"));

/// 解析顺序代码（XML 和表格共用的规则）
///
/// 无法解析、数量不是 4 个或有重复标签时返回 None。
pub fn parse_order(code: &str) -> Option<CorrectOrder> {
    parse_with(code, false)
}

/// 解析顺序代码，允许取前 4 个字符兜底（仅表格导入使用）
pub fn parse_order_lenient(code: &str) -> Option<CorrectOrder> {
    parse_with(code, true)
}

fn parse_with(code: &str, allow_prefix: bool) -> Option<CorrectOrder> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return None;
    }

    // 1-4: 连写或用 "-" 连接的字母/数字
    if STRICT_FORMS.iter().any(|form| form.is_match(trimmed)) {
        let labels: Vec<Label> = trimmed.chars().filter(|c| *c != '-').filter_map(map_char).collect();
        return finish(code, &labels);
    }

    // 5: 按 "-"、空白、逗号拆分，只保留能解析的片段
    let tokens: Vec<Label> = SEPARATORS
        .split(trimmed)
        .filter(|token| !token.is_empty())
        .filter_map(map_token)
        .collect();
    if tokens.len() == 4 || !allow_prefix {
        return finish(code, &tokens);
    }

    // 6: 去掉分隔符后取前 4 个字符
    let cleaned = SEPARATORS.replace_all(trimmed, "");
    let prefix: Option<Vec<Label>> = cleaned.chars().take(4).map(map_char).collect();
    finish(code, &prefix.unwrap_or_default())
}

fn map_char(c: char) -> Option<Label> {
    TOKEN_LABELS.get(&c).copied()
}

fn map_token(token: &str) -> Option<Label> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => map_char(c),
        _ => None,
    }
}

fn finish(code: &str, labels: &[Label]) -> Option<CorrectOrder> {
    let order = <[Label; 4]>::try_from(labels).ok().and_then(CorrectOrder::new);
    if order.is_none() {
        debug!("无法解析顺序代码: {:?}", code);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permutations() -> Vec<[Label; 4]> {
        let mut result = Vec::new();
        for a in Label::ALL {
            for b in Label::ALL {
                for c in Label::ALL {
                    for d in Label::ALL {
                        if let Some(order) = CorrectOrder::new([a, b, c, d]) {
                            result.push(order.ranks());
                        }
                    }
                }
            }
        }
        result
    }

    fn digit(label: Label) -> char {
        char::from(b'1' + label.index() as u8)
    }

    #[test]
    fn test_all_forms_agree_for_every_permutation() {
        let all = permutations();
        assert_eq!(all.len(), 24);

        for ranks in all {
            let letters: String = ranks.iter().map(|l| l.upper()).collect();
            let dashed = letters.chars().map(String::from).collect::<Vec<_>>().join("-");
            let digits: String = ranks.iter().map(|l| digit(*l)).collect();
            let dashed_digits = digits.chars().map(String::from).collect::<Vec<_>>().join("-");

            let expected = CorrectOrder::new(ranks);
            for form in [&letters, &dashed, &digits, &dashed_digits] {
                assert_eq!(parse_order(form), expected, "form: {}", form);
                assert_eq!(parse_order_lenient(form), expected, "form: {}", form);
            }
            assert_eq!(parse_order(&letters.to_lowercase()), expected);
        }
    }

    #[test]
    fn test_separated_tokens() {
        let expected = CorrectOrder::new([Label::B, Label::A, Label::D, Label::C]);
        assert_eq!(parse_order("B, A, D, C"), expected);
        assert_eq!(parse_order("b a d c"), expected);
        assert_eq!(parse_order("  2-1 , 4 3 "), expected);
        assert_eq!(parse_order("B,A,X,D,C"), expected);
    }

    #[test]
    fn test_rejects_invalid_codes() {
        assert_eq!(parse_order("AABC"), None);
        assert_eq!(parse_order("ABC"), None);
        assert_eq!(parse_order("WXYZ"), None);
        assert_eq!(parse_order("1235"), None);
        assert_eq!(parse_order("A-A-B-C"), None);
        assert_eq!(parse_order(""), None);
        assert_eq!(parse_order_lenient("AABC"), None);
        assert_eq!(parse_order_lenient("ABC"), None);
        assert_eq!(parse_order_lenient("WXYZ"), None);
    }

    #[test]
    fn test_prefix_fallback_only_when_lenient() {
        let expected = CorrectOrder::new([Label::C, Label::A, Label::B, Label::D]);
        assert_eq!(parse_order("CABD!"), None);
        assert_eq!(parse_order_lenient("CABD!"), expected);
        assert_eq!(parse_order_lenient("c3b-4"), None);
        assert_eq!(parse_order_lenient("CABD (order)"), expected);
    }
}
