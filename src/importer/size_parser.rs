// ==========================================
// 施工进度跟踪系统 - 尺寸解析器
// ==========================================
// 职责: 自由文本尺寸 → 数值管径 + 异径信息
// 红线: 永不失败,无法解析时 diameter = None
// ==========================================
// 文法:
//   SIZE     := SPECIAL | REDUCER | VALUE
//   SPECIAL  := "" | "NOSIZE" | "HALF"
//   REDUCER  := VALUE "X" VALUE        （X 两侧允许空白）
//   VALUE    := FRACTION | NUMBER
//   FRACTION := NUMBER "/" NUMBER      （分母为 0 视为非法）
//   NUMBER   := 非负整数
// ==========================================

use crate::domain::takeoff::ParsedSize;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Slash,
    Cross,
    Word(String),
    Space,
    Other(char),
}

/// 解析尺寸文本
///
/// # 示例
/// - "2X4" → diameter 3.0, second_diameter 4.0, is_reducer
/// - "1/2" → 0.5
/// - "HALF" → 0.5
/// - "0" → 0.0（合法,区别于 None）
/// - "1/0" / "1.5" / "-1" / "NOSIZE" → None
pub fn parse_size(text: &str) -> ParsedSize {
    // 大写/TRIM 仅用于匹配, raw_text 保留原文
    let matched = text.trim().to_uppercase();

    if matched.is_empty() || matched == "NOSIZE" {
        return ParsedSize::invalid(text);
    }
    if matched == "HALF" {
        return ParsedSize::plain(text, 0.5);
    }

    let tokens = tokenize(&matched);
    let cross_count = tokens.iter().filter(|t| **t == Token::Cross).count();

    if cross_count > 0 {
        return parse_reducer(text, &tokens, cross_count);
    }

    match parse_value(trim_spaces(&tokens)) {
        Some(value) => ParsedSize::plain(text, value),
        None => ParsedSize::invalid(text),
    }
}

fn parse_reducer(text: &str, tokens: &[Token], cross_count: usize) -> ParsedSize {
    if cross_count != 1 {
        return ParsedSize::invalid(text);
    }

    let split_at = match tokens.iter().position(|t| *t == Token::Cross) {
        Some(idx) => idx,
        None => return ParsedSize::invalid(text),
    };
    let (left, right) = (&tokens[..split_at], &tokens[split_at + 1..]);

    match (
        parse_value(trim_spaces(left)),
        parse_value(trim_spaces(right)),
    ) {
        (Some(first), Some(second)) if ((first + second) / 2.0).is_finite() => {
            ParsedSize::reducer(text, first, second)
        }
        _ => ParsedSize::invalid(text),
    }
}

/// VALUE := NUMBER | NUMBER "/" NUMBER
fn parse_value(tokens: &[Token]) -> Option<f64> {
    let value = match tokens {
        [Token::Number(n)] => *n,
        [Token::Number(n), Token::Slash, Token::Number(d)] => {
            if *d == 0.0 {
                return None;
            }
            n / d
        }
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn trim_spaces(tokens: &[Token]) -> &[Token] {
    let start = tokens
        .iter()
        .position(|t| *t != Token::Space)
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|t| *t != Token::Space)
        .map(|idx| idx + 1)
        .unwrap_or(start);
    &tokens[start..end.max(start)]
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }
            // 超长数字串溢出为无穷大,按非法字符处理
            match digits.parse::<f64>() {
                Ok(n) if n.is_finite() => tokens.push(Token::Number(n)),
                _ => tokens.push(Token::Other(c)),
            }
        } else if c.is_alphabetic() {
            let mut word = String::new();
            while let Some(&l) = chars.peek() {
                if !l.is_alphabetic() {
                    break;
                }
                word.push(l);
                chars.next();
            }
            if word == "X" {
                tokens.push(Token::Cross);
            } else {
                tokens.push(Token::Word(word));
            }
        } else if c.is_whitespace() {
            while chars.peek().is_some_and(|w| w.is_whitespace()) {
                chars.next();
            }
            tokens.push(Token::Space);
        } else if c == '/' {
            chars.next();
            tokens.push(Token::Slash);
        } else {
            chars.next();
            tokens.push(Token::Other(c));
        }
    }

    tokens
}
