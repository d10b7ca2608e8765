//! banquet-reports
//!
//! 宴会管理APIのデータを取得し、帳票をPDF/Excelで出力する。

pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod chart;
pub mod controller;
pub mod export;
