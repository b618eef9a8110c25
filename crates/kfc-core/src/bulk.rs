//! Bulk ingestion of the OPENDART corporation code archive.
//!
//! `corpCode.xml` ships as a ZIP holding one large XML document. The entry is
//! read completely into memory, then every `<list>` element becomes one
//! [`CorpCode`]. Any failure aborts the whole document.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;
use zip::ZipArchive;

use crate::coercion::DateFormat;
use crate::domain::CorpCode;
use crate::KfcError;

const RECORD_ELEMENT: &str = "list";
const CORP_CODE: &str = "corp_code";
const CORP_NAME: &str = "corp_name";
const CORP_ENG_NAME: &str = "corp_eng_name";
const STOCK_CODE: &str = "stock_code";
const MODIFY_DATE: &str = "modify_date";

/// Decompresses and parses a corporation code archive.
pub fn parse_corp_code_archive(bytes: &[u8]) -> Result<Vec<CorpCode>, KfcError> {
    let document = read_single_entry(bytes)?;
    let corp_codes = parse_corp_code_document(&document)?;
    debug!(count = corp_codes.len(), "parsed corporation code archive");
    Ok(corp_codes)
}

/// Returns the only entry of the archive as UTF-8 text. Archives with no
/// entry or with more than one entry are rejected.
pub fn read_single_entry(bytes: &[u8]) -> Result<String, KfcError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|error| KfcError::bulk_with("archive could not be opened", error))?;
    match archive.len() {
        0 => return Err(KfcError::bulk("archive contains no entry")),
        1 => {}
        entries => {
            return Err(KfcError::bulk(format!(
                "archive contains {entries} entries, expected exactly one"
            )))
        }
    }

    let mut entry = archive
        .by_index(0)
        .map_err(|error| KfcError::bulk_with("archive entry could not be read", error))?;
    let mut raw = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
    entry
        .read_to_end(&mut raw)
        .map_err(|error| KfcError::bulk_with("archive entry could not be decompressed", error))?;

    String::from_utf8(raw)
        .map_err(|error| KfcError::bulk_with("archive entry is not valid UTF-8", error))
}

/// Parses the XML text of `corpCode.xml`.
pub fn parse_corp_code_document(document: &str) -> Result<Vec<CorpCode>, KfcError> {
    let mut reader = Reader::from_str(document);
    let mut records = Vec::new();
    let mut current: Option<HashMap<String, String>> = None;
    let mut field: Option<(String, String)> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => {
                let name = element_name(start.name().as_ref())?;
                if name == RECORD_ELEMENT {
                    current = Some(HashMap::new());
                } else if current.is_some() {
                    field = Some((name, String::new()));
                }
            }
            Event::Empty(empty) => {
                let name = element_name(empty.name().as_ref())?;
                if let Some(values) = current.as_mut() {
                    values.insert(name, String::new());
                }
            }
            Event::Text(text) => {
                if let Some((_, buffer)) = field.as_mut() {
                    buffer.push_str(&text.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(cdata) => {
                if let Some((_, buffer)) = field.as_mut() {
                    let text = std::str::from_utf8(&cdata)
                        .map_err(|error| KfcError::bulk_with("CDATA is not valid UTF-8", error))?;
                    buffer.push_str(text);
                }
            }
            Event::End(end) => {
                let name = element_name(end.name().as_ref())?;
                if name == RECORD_ELEMENT {
                    if let Some(values) = current.take() {
                        records.push(corp_code_from(&values, records.len())?);
                    }
                } else if let (Some((open, buffer)), Some(values)) = (field.take(), current.as_mut())
                {
                    values.insert(open, buffer);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if current.is_some() {
        return Err(KfcError::bulk("document ended inside a <list> element"));
    }
    Ok(records)
}

fn corp_code_from(values: &HashMap<String, String>, index: usize) -> Result<CorpCode, KfcError> {
    let required = |name: &str| {
        values.get(name).ok_or_else(|| {
            KfcError::bulk(format!("<list> #{index} is missing <{name}>"))
        })
    };

    let stock_code = required(STOCK_CODE)?.trim();
    let modify_date = required(MODIFY_DATE)?.trim();

    Ok(CorpCode {
        corp_code: required(CORP_CODE)?.trim().to_owned(),
        corp_name: required(CORP_NAME)?.trim().to_owned(),
        corp_eng_name: required(CORP_ENG_NAME)?.trim().to_owned(),
        stock_code: (!stock_code.is_empty()).then(|| stock_code.to_owned()),
        modify_date: DateFormat::Compact.parse(modify_date).map_err(|error| {
            KfcError::bulk_with(
                format!("<list> #{index} has invalid modify_date '{modify_date}'"),
                error,
            )
        })?,
    })
}

fn element_name(raw: &[u8]) -> Result<String, KfcError> {
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|error| KfcError::bulk_with("element name is not valid UTF-8", error))
}

fn xml_error<E>(error: E) -> KfcError
where
    E: std::error::Error + Send + Sync + 'static,
{
    KfcError::bulk_with("malformed XML document", error)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::ErrorKind;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<result>
    <list>
        <corp_code>00126380</corp_code>
        <corp_name>삼성전자</corp_name>
        <corp_eng_name>SAMSUNG ELECTRONICS CO,.LTD</corp_eng_name>
        <stock_code>005930</stock_code>
        <modify_date>20230110</modify_date>
    </list>
    <list>
        <corp_code>00434003</corp_code>
        <corp_name>다코</corp_name>
        <corp_eng_name>Daco corporation &amp; Co</corp_eng_name>
        <stock_code> </stock_code>
        <modify_date>20170630</modify_date>
    </list>
</result>"#;

    #[test]
    fn parses_every_list_element() {
        let records = parse_corp_code_document(DOCUMENT).expect("valid document");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].corp_code, "00126380");
        assert_eq!(records[0].stock_code.as_deref(), Some("005930"));
        assert_eq!(records[0].modify_date, date!(2023 - 01 - 10));
        assert_eq!(records[1].corp_eng_name, "Daco corporation & Co");
        assert_eq!(records[1].stock_code, None);
    }

    #[test]
    fn empty_stock_code_element_is_none() {
        let document = "<result><list><corp_code>1</corp_code><corp_name>a</corp_name>\
            <corp_eng_name>A</corp_eng_name><stock_code/><modify_date>20240101</modify_date>\
            </list></result>";

        let records = parse_corp_code_document(document).expect("valid document");

        assert_eq!(records[0].stock_code, None);
    }

    #[test]
    fn missing_child_element_fails_the_whole_document() {
        let document = "<result><list><corp_code>1</corp_code><corp_name>a</corp_name>\
            <corp_eng_name>A</corp_eng_name><stock_code/></list></result>";

        let error = parse_corp_code_document(document).expect_err("missing modify_date");

        assert_eq!(error.kind(), ErrorKind::BulkDocumentParseFailure);
        assert!(error.to_string().contains("modify_date"));
    }

    #[test]
    fn malformed_date_and_xml_are_bulk_failures() {
        let bad_date = DOCUMENT.replace("20230110", "2023-01-10");
        let truncated = &DOCUMENT[..DOCUMENT.len() - 40];

        assert_eq!(
            parse_corp_code_document(&bad_date).expect_err("bad date").code(),
            2008
        );
        assert_eq!(
            parse_corp_code_document(truncated)
                .expect_err("truncated")
                .kind(),
            ErrorKind::BulkDocumentParseFailure
        );
    }

    #[test]
    fn non_zip_bytes_are_rejected() {
        let error = parse_corp_code_archive(b"not a zip").expect_err("garbage archive");
        assert_eq!(error.kind(), ErrorKind::BulkDocumentParseFailure);
    }
}
