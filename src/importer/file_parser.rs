// ==========================================
// 包装单元导入 - CSV 行数据源
// ==========================================
// 职责: 逐行读取 CSV（惰性，不一次性载入内存）
// 支持: 仅 .csv
// ==========================================

use crate::domain::RawRow;
use crate::importer::error::{ImportError, ImportResult};
use csv::{Reader, ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;

// ==========================================
// CsvRowSource - CSV 行迭代器
// ==========================================
pub struct CsvRowSource<R: Read> {
    reader: Reader<R>,
    headers: Vec<String>,
    record: StringRecord,
    row_number: usize,
}

impl CsvRowSource<File> {
    /// 打开 CSV 文件
    pub fn open<P: AsRef<Path>>(file_path: P) -> ImportResult<Self> {
        let path = file_path.as_ref();

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read> CsvRowSource<R> {
    pub fn from_reader(input: R) -> ImportResult<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 行长度不一致时由字段映射报告缺列
            .from_reader(input);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
            row_number: 0,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl<R: Read> Iterator for CsvRowSource<R> {
    type Item = ImportResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read_record(&mut self.record) {
                Ok(false) => return None,
                Err(e) => {
                    self.row_number += 1;
                    return Some(Err(ImportError::CsvParseError {
                        row: self.row_number,
                        message: e.to_string(),
                    }));
                }
                Ok(true) => {
                    self.row_number += 1;

                    // 跳过完全空白的行
                    if self.record.iter().all(|v| v.trim().is_empty()) {
                        continue;
                    }

                    let mut row = RawRow::new(self.row_number);
                    for (col_idx, value) in self.record.iter().enumerate() {
                        if let Some(header) = self.headers.get(col_idx) {
                            row.fields.insert(header.clone(), value.trim().to_string());
                        }
                    }
                    return Some(Ok(row));
                }
            }
        }
    }
}
