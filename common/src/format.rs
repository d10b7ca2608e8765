//! 表示用フォーマット
//!
//! 日付・割合・欠損値プレースホルダ。プレースホルダはフィールドの意味ごとに
//! 別の文字列を使う（互いに置き換え不可）。

use chrono::NaiveDate;
use std::fmt::Write;

/// 倉庫名が無い場合
pub const PLACEHOLDER_WAREHOUSE: &str = "No especificada";
/// 日付・種別・商品名などが無い場合
pub const PLACEHOLDER_NA: &str = "N/A";
/// 最低在庫が未設定の場合
pub const PLACEHOLDER_UNDEFINED: &str = "No definido";
/// カテゴリ名が無い場合
pub const PLACEHOLDER_CATEGORY: &str = "Sin categoría";
/// 倉庫に割り当てられていない在庫
pub const PLACEHOLDER_NO_WAREHOUSE: &str = "Sin bodega";

/// 既定の日付フォーマット（es-MX の toLocaleDateString 相当）
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// スペイン語の月名（1月始まり）
pub const MONTH_NAMES_ES: [&str; 12] = [
    "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio",
    "Julio", "Agosto", "Septiembre", "Octubre", "Noviembre", "Diciembre",
];

/// "YYYY-MM-DD" または ISO日時文字列から日付を取り出す
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn try_format(date: NaiveDate, date_format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(date_format)).ok()?;
    Some(out)
}

/// 日付だけで書式化できる strftime 文字列か（時刻・タイムゾーン指定や不正な `%` は不可）
pub fn is_valid_date_format(date_format: &str) -> bool {
    if date_format.trim().is_empty() {
        return false;
    }
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|date| try_format(date, date_format))
        .is_some()
}

/// 使えない書式は既定の書式に置き換える
pub fn checked_date_format(date_format: &str) -> &str {
    if is_valid_date_format(date_format) {
        date_format
    } else {
        log::warn!("日付書式 {:?} は使えません。{} を使います", date_format, DEFAULT_DATE_FORMAT);
        DEFAULT_DATE_FORMAT
    }
}

/// 日付を書式化する。書式が使えなければ既定の書式
pub fn format_naive_date(date: NaiveDate, date_format: &str) -> String {
    try_format(date, date_format)
        .or_else(|| try_format(date, DEFAULT_DATE_FORMAT))
        .unwrap_or_default()
}

/// 日付を表示用文字列に変換
///
/// 空なら "N/A"、解析できなければ元の文字列をそのまま返す。
pub fn format_date(raw: &str, date_format: &str) -> String {
    if raw.trim().is_empty() {
        return PLACEHOLDER_NA.to_string();
    }
    match parse_date(raw) {
        Some(date) => format_naive_date(date, date_format),
        None => raw.to_string(),
    }
}

/// 時刻 "HH:MM:SS" → "HH:MM"
pub fn format_time(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.get(..5) {
        Some(hm) if trimmed.len() > 5 && hm.as_bytes()[2] == b':' => hm.to_string(),
        _ => trimmed.to_string(),
    }
}

/// 割合 → "<値>%"
pub fn format_percentage(value: f64) -> String {
    format!("{}%", value)
}

/// 空文字ならプレースホルダ
pub fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}
