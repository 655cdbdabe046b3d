//! 字段抽取：手机号、邮编、收件人
//!
//! 每个抽取器都是一组按优先级排列的独立匹配策略，命中后返回
//! (残余文本, 字段值)，残余文本里命中片段用空格占位，保持分词边界。
//! 抽取不到一律返回 None，不报错。

use once_cell::sync::Lazy;
use regex::Regex;

/// 大陆手机号
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"1[3-9]\d{9}").expect("phone pattern compiles"));

/// 带标记词的邮编，如 "邮编:310052"
static LABELED_POSTAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:邮政编码|邮编)\s*[:：]?\s*(\d{6})").expect("labeled postal pattern compiles")
});

/// 裸 6 位数字串
static SIX_DIGIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{6}").expect("postal pattern compiles"));

/// "收件人:张三" 标记
static RECIPIENT_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"收件人\s*[:：]?\s*(\p{Han}{2,4})").expect("recipient pattern compiles")
});

/// 常见分隔符，统一替换为空格
const SEPARATORS: [char; 10] = [',', '，', ';', '；', '。', '|', '/', '\n', '\r', '\t'];

/// 候选人名不能以这些地名/街道后缀结尾
const PLACE_SUFFIXES: [char; 17] = [
    '省', '市', '区', '县', '镇', '乡', '村', '路', '街', '道', '巷', '号', '楼', '栋', '幢',
    '室', '园',
];

/// 在汉字串里切出结尾人名时的边界字符
const ADDRESS_BOUNDARY: [char; 17] = [
    '号', '路', '街', '道', '巷', '弄', '村', '镇', '楼', '栋', '幢', '层', '室', '园', '区',
    '单', '元',
];

/// 即使形态上像人名也排除的标记词
const NAME_BLACKLIST: [&str; 5] = ["邮编", "邮政编码", "收件人", "地址", "电话"];

fn is_han(c: char) -> bool {
    matches!(c, '\u{4e00}'..='\u{9fff}')
}

fn remove_span(text: &str, start: usize, end: usize) -> String {
    format!("{} {}", &text[..start], &text[end..])
}

/// 分隔符清洗：统一替换为空格并折叠连续空白
pub fn clean_text(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| if SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 行政区解析前去掉全部空白
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// 抽取手机号：第一个 11 位大陆手机号
pub fn extract_phone(text: &str) -> (String, Option<String>) {
    match PHONE_RE.find(text) {
        Some(m) => (
            remove_span(text, m.start(), m.end()),
            Some(m.as_str().to_string()),
        ),
        None => (text.to_string(), None),
    }
}

/// 带标记词的邮编，标记词一并从残余文本里去掉
fn postal_labeled(text: &str) -> Option<(usize, usize, String)> {
    for caps in LABELED_POSTAL_RE.captures_iter(text) {
        let whole = caps.get(0).expect("regex whole match");
        let code = caps.get(1).expect("regex capture group");
        let followed_by_digit = text[code.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit());
        if followed_by_digit {
            continue;
        }
        return Some((whole.start(), whole.end(), code.as_str().to_string()));
    }
    None
}

/// 裸 6 位数字串，两侧都不能紧邻数字；取最后一个（邮编惯例写在结尾）
fn postal_bare(text: &str) -> Option<(usize, usize, String)> {
    let mut found = None;
    for m in SIX_DIGIT_RE.find_iter(text) {
        let before_digit = text[..m.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit());
        let after_digit = text[m.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit());
        if before_digit || after_digit {
            continue;
        }
        found = Some((m.start(), m.end(), m.as_str().to_string()));
    }
    found
}

/// 抽取邮编：标记词形式优先于裸数字串
pub fn extract_postal(text: &str) -> (String, Option<String>) {
    match postal_labeled(text).or_else(|| postal_bare(text)) {
        Some((start, end, code)) => (remove_span(text, start, end), Some(code)),
        None => (text.to_string(), None),
    }
}

/// 人名形态检查：2~4 个汉字，不以地名后缀结尾，不在黑名单
fn is_plausible_name(candidate: &str) -> bool {
    let count = candidate.chars().count();
    if !(2..=4).contains(&count) {
        return false;
    }
    if NAME_BLACKLIST.contains(&candidate) {
        return false;
    }
    if !candidate.chars().all(is_han) {
        return false;
    }
    !candidate
        .chars()
        .next_back()
        .is_some_and(|c| PLACE_SUFFIXES.contains(&c))
}

/// 汉字串结尾的人名片段：取最后一个地址边界字符之后的部分
fn trailing_name_segment(run: &str) -> &str {
    match run.rfind(|c| ADDRESS_BOUNDARY.contains(&c)) {
        Some(pos) => {
            let boundary_len = run[pos..].chars().next().map_or(0, char::len_utf8);
            &run[pos + boundary_len..]
        }
        None => run,
    }
}

/// 策略 A1："收件人:张三" 显式标记
fn name_by_marker(text: &str) -> Option<(usize, usize, String)> {
    for caps in RECIPIENT_MARKER_RE.captures_iter(text) {
        let whole = caps.get(0).expect("regex whole match");
        let name = caps.get(1).expect("regex capture group");
        if is_plausible_name(name.as_str()) {
            return Some((whole.start(), whole.end(), name.as_str().to_string()));
        }
    }
    None
}

/// 策略 A2："张三收" 结尾标记
///
/// 从最右侧的 "收" 往前找：后面必须是结尾/空白/数字，前面取紧邻的
/// 汉字串并按地址边界字符切出人名段（"102号张三收" -> "张三"）。
fn name_by_shou_marker(text: &str) -> Option<(usize, usize, String)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    for i in (0..chars.len()).rev() {
        let (idx, ch) = chars[i];
        if ch != '收' {
            continue;
        }
        let after_ok = chars
            .get(i + 1)
            .map_or(true, |(_, c)| c.is_whitespace() || c.is_ascii_digit());
        if !after_ok {
            continue;
        }
        let mut start = i;
        while start > 0 && is_han(chars[start - 1].1) {
            start -= 1;
        }
        if start == i {
            continue;
        }
        let run = &text[chars[start].0..idx];
        let segment = trailing_name_segment(run);
        if is_plausible_name(segment) {
            let seg_start = idx - segment.len();
            let marker_end = idx + '收'.len_utf8();
            return Some((seg_start, marker_end, segment.to_string()));
        }
    }
    None
}

/// 策略 B：结尾（或结尾数字串之前）的 2~4 个汉字
///
/// 汉字串前面必须是开头或空白，避免把街道名尾部误当人名。
fn name_trailing(text: &str) -> Option<(usize, usize, String)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = chars.len();
    while i > 0 && chars[i - 1].1.is_whitespace() {
        i -= 1;
    }
    if i > 0 && chars[i - 1].1.is_ascii_digit() {
        while i > 0 && chars[i - 1].1.is_ascii_digit() {
            i -= 1;
        }
        while i > 0 && chars[i - 1].1.is_whitespace() {
            i -= 1;
        }
    }
    let run_end = i;
    while i > 0 && is_han(chars[i - 1].1) {
        i -= 1;
    }
    if i == run_end {
        return None;
    }
    if i > 0 && !chars[i - 1].1.is_whitespace() {
        return None;
    }

    let run_start_byte = chars[i].0;
    let run_end_byte = chars
        .get(run_end)
        .map_or(text.len(), |(idx, _)| *idx);
    let run = &text[run_start_byte..run_end_byte];
    let segment = trailing_name_segment(run);
    if is_plausible_name(segment) {
        let seg_start = run_end_byte - segment.len();
        return Some((seg_start, run_end_byte, segment.to_string()));
    }
    None
}

/// 策略 C：词元兜底，末词元是长数字串且前一个词元像人名
fn name_token_fallback(text: &str) -> Option<(usize, usize, String)> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    let last = tokens[tokens.len() - 1];
    let prev = tokens[tokens.len() - 2];
    if last.len() < 6 || !last.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !is_plausible_name(prev) {
        return None;
    }
    let last_pos = text.rfind(last)?;
    let prev_pos = text[..last_pos].rfind(prev)?;
    Some((prev_pos, prev_pos + prev.len(), prev.to_string()))
}

/// 抽取收件人：显式标记 > "收"结尾标记 > 结尾汉字串 > 词元兜底
pub fn extract_recipient(text: &str) -> (String, Option<String>) {
    let hit = name_by_marker(text)
        .or_else(|| name_by_shou_marker(text))
        .or_else(|| name_trailing(text))
        .or_else(|| name_token_fallback(text));
    match hit {
        Some((start, end, name)) => (remove_span(text, start, end), Some(name)),
        None => (text.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(
            clean_text("浙江省，杭州市；滨江区|长河街道"),
            "浙江省 杭州市 滨江区 长河街道"
        );
        assert_eq!(clean_text("  a\t\nb  "), "a b");
    }

    #[test]
    fn test_extract_phone() {
        let (rest, phone) = extract_phone("滨江区江南大道 张三 15900001234");
        assert_eq!(phone.as_deref(), Some("15900001234"));
        assert!(!rest.contains("15900001234"));

        // 10 位数字不是手机号
        let (_, phone) = extract_phone("张三 1590000124");
        assert_eq!(phone, None);

        // 12 开头不是手机号段
        let (_, phone) = extract_phone("电话 12900001234x");
        assert_eq!(phone, None);
    }

    #[test]
    fn test_extract_postal_bare_last_wins() {
        let (rest, postal) = extract_postal("100010 某某路 310052");
        assert_eq!(postal.as_deref(), Some("310052"));
        assert!(rest.contains("100010"));
    }

    #[test]
    fn test_extract_postal_rejects_digit_neighbors() {
        // 10 位数字串里不含合法邮编
        let (_, postal) = extract_postal("1590000124");
        assert_eq!(postal, None);

        let (_, postal) = extract_postal("单号 12345678901234");
        assert_eq!(postal, None);
    }

    #[test]
    fn test_extract_postal_labeled_beats_bare() {
        let (rest, postal) = extract_postal("邮编310052 快递单号 201100");
        assert_eq!(postal.as_deref(), Some("310052"));
        // 标记词一并去掉
        assert!(!rest.contains("邮编"));
        assert!(rest.contains("201100"));

        let (_, postal) = extract_postal("邮政编码：102206");
        assert_eq!(postal.as_deref(), Some("102206"));
    }

    #[test]
    fn test_extract_recipient_marker() {
        let (rest, name) = extract_recipient("收件人:张三 江南大道1234号");
        assert_eq!(name.as_deref(), Some("张三"));
        assert!(!rest.contains("收件人"));
    }

    #[test]
    fn test_extract_recipient_shou_marker() {
        let (rest, name) = extract_recipient("沙河镇白各庄102号张三收  ");
        assert_eq!(name.as_deref(), Some("张三"));
        assert!(rest.contains("白各庄102号"));
        assert!(!rest.contains("张三"));
    }

    #[test]
    fn test_extract_recipient_trailing() {
        let (_, name) = extract_recipient("滨江区江南大道1234号XX科技园5幢402室 张三  ");
        assert_eq!(name.as_deref(), Some("张三"));

        // 结尾数字串之前
        let (_, name) = extract_recipient("白各庄新村东区5号楼 李四 1590000124");
        assert_eq!(name.as_deref(), Some("李四"));
    }

    #[test]
    fn test_extract_recipient_rejects_place_words() {
        let (_, name) = extract_recipient("浙江省杭州市滨江区长河街道");
        assert_eq!(name, None);

        // 紧贴数字的街道尾词不算人名
        let (_, name) = extract_recipient("朝阳区建国路88号");
        assert_eq!(name, None);

        // 黑名单词不算人名
        let (_, name) = extract_recipient("江南大道 邮编 310052");
        assert_eq!(name, None);
    }

    #[test]
    fn test_extract_recipient_token_fallback() {
        let (_, name) = extract_recipient("某小区3栋 王五 88221100");
        assert_eq!(name.as_deref(), Some("王五"));
    }

    #[test]
    fn test_trailing_name_segment() {
        assert_eq!(trailing_name_segment("号张三"), "张三");
        assert_eq!(trailing_name_segment("张三"), "张三");
        assert_eq!(trailing_name_segment("室"), "");
    }
}
