//! Parser Module
//!
//! calamineを使用したワークブック読み込みの実装。
//! XLSX / ODS（および旧XLS）をメモリ上のセルグリッドに変換します。

mod workbook;

pub(crate) use workbook::WorkbookParser;
