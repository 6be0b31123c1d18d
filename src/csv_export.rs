use crate::error::{Error, Result};
use crate::models::{COLUMNS, NormalizedRow};

/// UTF-8 BOM（表計算ソフトでの文字化け対策）
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 行をRFC 4180形式のCSVバイト列にする
///
/// 出力は BOM + ヘッダー行 + 入力順のデータ行。区切り文字・引用符・改行を
/// 含むフィールドのみ引用符で囲み、内部の引用符は二重化する。
///
/// 書き込み先はメモリ上のバッファなので `Err` は実際には返らない。
/// `csv::Writer` の API が `Result` を返すため、panic せずに伝播している。
pub fn serialize(rows: &[NormalizedRow]) -> Result<Vec<u8>> {
    let mut buffer = UTF8_BOM.to_vec();
    {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(&mut buffer);

        writer.write_record(COLUMNS).map_err(csv_error)?;
        for row in rows {
            writer.write_record(row.to_record()).map_err(csv_error)?;
        }
        writer
            .flush()
            .map_err(|e| Error::SerializationError(e.to_string()))?;
    }
    Ok(buffer)
}

/// `serialize` の結果を文字列として返す（先頭に BOM 文字を含む）
pub fn serialize_to_string(rows: &[NormalizedRow]) -> Result<String> {
    let bytes = serialize(rows)?;
    String::from_utf8(bytes).map_err(|e| Error::SerializationError(e.to_string()))
}

fn csv_error(e: csv::Error) -> Error {
    Error::SerializationError(e.to_string())
}
