//! RFC 5545 文本输出
//!
//! 只实现订阅源用到的部分：TEXT 转义、75 字节折行、UTC 时间。

use chrono::{DateTime, Utc};

const MAX_LINE_OCTETS: usize = 75;
const CRLF: &str = "\r\n";

/// TEXT 值转义：`\` `;` `,` 与换行
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// 按 75 字节折行，续行以一个空格开头；不会切开多字节字符
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut used = 0;
    for ch in line.chars() {
        let width = ch.len_utf8();
        if used + width > MAX_LINE_OCTETS {
            out.push_str(CRLF);
            out.push(' ');
            used = 1;
        }
        out.push(ch);
        used += width;
    }
    out
}

pub fn format_utc(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// 逐行构建日历文本
#[derive(Debug, Default)]
pub struct IcsWriter {
    buf: String,
}

impl IcsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 原样写入属性值（调用方负责转义）
    pub fn raw(&mut self, name: &str, value: &str) -> &mut Self {
        self.buf.push_str(&fold_line(&format!("{name}:{value}")));
        self.buf.push_str(CRLF);
        self
    }

    pub fn text(&mut self, name: &str, value: &str) -> &mut Self {
        self.raw(name, &escape_text(value))
    }

    pub fn time(&mut self, name: &str, instant: DateTime<Utc>) -> &mut Self {
        self.raw(name, &format_utc(instant))
    }

    pub fn begin(&mut self, component: &str) -> &mut Self {
        self.raw("BEGIN", component)
    }

    pub fn end(&mut self, component: &str) -> &mut Self {
        self.raw("END", component)
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a,b;c\\d"), "a\\,b\\;c\\\\d");
        assert_eq!(escape_text("line1\r\nline2"), "line1\\nline2");
        assert_eq!(escape_text("Дроби"), "Дроби");
    }

    #[test]
    fn test_short_line_not_folded() {
        let line = "SUMMARY:".to_string() + &"x".repeat(67);
        assert_eq!(line.len(), 75);
        assert_eq!(fold_line(&line), line);
    }

    #[test]
    fn test_fold_ascii() {
        let line = "DESCRIPTION:".to_string() + &"a".repeat(100);
        let folded = fold_line(&line);
        let parts: Vec<&str> = folded.split(CRLF).collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 75);
        assert!(parts[1].starts_with(' '));
        assert_eq!(parts.concat().replacen(' ', "", 1), line);
    }

    #[test]
    fn test_fold_keeps_multibyte_chars_whole() {
        // 每个西里尔字母 2 字节
        let line = "SUMMARY:".to_string() + &"я".repeat(60);
        let folded = fold_line(&line);
        for part in folded.split(CRLF) {
            assert!(part.len() <= MAX_LINE_OCTETS);
            assert!(std::str::from_utf8(part.as_bytes()).is_ok());
        }
        let unfolded: String = folded.replace("\r\n ", "");
        assert_eq!(unfolded, line);
    }

    #[test]
    fn test_writer_output() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 14, 30, 0).unwrap();
        let mut w = IcsWriter::new();
        w.begin("VEVENT")
            .time("DTSTART", start)
            .text("SUMMARY", "Иван, 9 класс")
            .end("VEVENT");
        assert_eq!(
            w.finish(),
            "BEGIN:VEVENT\r\nDTSTART:20250310T143000Z\r\nSUMMARY:Иван\\, 9 класс\r\nEND:VEVENT\r\n"
        );
    }
}
