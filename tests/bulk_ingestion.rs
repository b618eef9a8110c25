//! Behavior-driven tests for the corporation code archive
//!
//! Archives are built in memory with the zip writer; one test round-trips
//! the archive through a file on disk the way a cached download would be read.

use std::io::{Cursor, Write};
use std::sync::Arc;

use kfc_core::bulk::{parse_corp_code_archive, parse_corp_code_document};
use kfc_core::{
    ClientConfig, CorpCode, ErrorKind, HttpResponse, KfcClient, RateLimitingSettings,
    ScriptedHttpClient,
};
use tempfile::NamedTempFile;
use time::macros::date;
use zip::write::SimpleFileOptions;

const TWO_CORPS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
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
        <corp_eng_name>Daco corporation</corp_eng_name>
        <stock_code> </stock_code>
        <modify_date>20170630</modify_date>
    </list>
</result>"#;

fn archive_of(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start entry");
        writer.write_all(content.as_bytes()).expect("write entry");
    }
    writer.finish().expect("finish archive").into_inner()
}

// =============================================================================
// Bulk ingestion: well-formed archives
// =============================================================================

#[test]
fn when_archive_has_two_records_both_are_returned_field_for_field() {
    // Given: a single-entry archive with two <list> nodes
    let archive = archive_of(&[("CORPCODE.xml", TWO_CORPS)]);

    // When
    let corp_codes = parse_corp_code_archive(&archive).expect("valid archive");

    // Then: blank stock codes become None, everything else is copied over
    assert_eq!(
        corp_codes,
        vec![
            CorpCode {
                corp_code: String::from("00126380"),
                corp_name: String::from("삼성전자"),
                corp_eng_name: String::from("SAMSUNG ELECTRONICS CO,.LTD"),
                stock_code: Some(String::from("005930")),
                modify_date: date!(2023 - 01 - 10),
            },
            CorpCode {
                corp_code: String::from("00434003"),
                corp_name: String::from("다코"),
                corp_eng_name: String::from("Daco corporation"),
                stock_code: None,
                modify_date: date!(2017 - 06 - 30),
            },
        ]
    );
}

#[test]
fn when_archive_is_read_back_from_disk_the_result_is_the_same() {
    // Given: the archive persisted to a temporary file
    let archive = archive_of(&[("CORPCODE.xml", TWO_CORPS)]);
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(&archive).expect("write archive");
    file.flush().expect("flush archive");

    // When
    let bytes = std::fs::read(file.path()).expect("read archive");
    let corp_codes = parse_corp_code_archive(&bytes).expect("valid archive");

    // Then
    assert_eq!(corp_codes.len(), 2);
    assert_eq!(corp_codes[1].corp_code, "00434003");
}

#[tokio::test]
async fn when_client_downloads_corp_codes_the_zip_body_is_parsed() {
    // Given: OPENDART serves the archive as the response body
    let http = Arc::new(
        ScriptedHttpClient::new()
            .respond(Ok(HttpResponse::ok_bytes(archive_of(&[("CORPCODE.xml", TWO_CORPS)])))),
    );
    let config = ClientConfig::default()
        .with_opendart_api_key("test-key")
        .with_rate_limits(RateLimitingSettings::unlimited());
    let client = KfcClient::new(config, http.clone());

    // When
    let corp_codes = client.opendart().corp_codes().await.expect("corp codes");

    // Then
    assert_eq!(corp_codes.len(), 2);
    assert_eq!(http.requests()[0].param("crtfc_key").as_deref(), Some("test-key"));
}

#[test]
fn when_stock_code_is_an_empty_element_it_is_none() {
    // Given
    let document = "<result><list><corp_code>00999999</corp_code><corp_name>비상장</corp_name>\
        <corp_eng_name/><stock_code/><modify_date>20240102</modify_date></list></result>";

    // When
    let corp_codes = parse_corp_code_document(document).expect("valid document");

    // Then
    assert_eq!(corp_codes[0].stock_code, None);
    assert_eq!(corp_codes[0].corp_eng_name, "");
}

// =============================================================================
// Bulk ingestion: malformed input aborts the whole document
// =============================================================================

#[test]
fn when_a_record_misses_a_field_the_whole_document_fails() {
    // Given: the second record has no modify_date
    let document = "<result>\
        <list><corp_code>00126380</corp_code><corp_name>A</corp_name><corp_eng_name>A</corp_eng_name>\
        <stock_code>005930</stock_code><modify_date>20230110</modify_date></list>\
        <list><corp_code>00434003</corp_code><corp_name>B</corp_name><corp_eng_name>B</corp_eng_name>\
        <stock_code></stock_code></list></result>";

    // When
    let error = parse_corp_code_document(document).expect_err("missing field");

    // Then
    assert_eq!(error.kind(), ErrorKind::BulkDocumentParseFailure);
    assert!(error.to_string().contains("modify_date"), "{error}");
}

#[test]
fn when_input_is_not_a_valid_archive_parsing_fails() {
    // Given: bytes that are not a ZIP, and a ZIP with no entries
    let not_zip = b"<html>maintenance</html>".to_vec();
    let empty = archive_of(&[]);

    // When / Then
    for bytes in [not_zip, empty] {
        let error = parse_corp_code_archive(&bytes).expect_err("invalid archive");
        assert_eq!(error.kind(), ErrorKind::BulkDocumentParseFailure);
        assert_eq!(error.code(), 2008);
    }
}

#[test]
fn when_archive_holds_more_than_one_entry_parsing_fails() {
    // Given: the registry document plus a stray second entry
    let archive = archive_of(&[("CORPCODE.xml", TWO_CORPS), ("README.txt", "notes")]);

    // When
    let error = parse_corp_code_archive(&archive).expect_err("two entries");

    // Then
    assert_eq!(error.kind(), ErrorKind::BulkDocumentParseFailure);
    assert!(error.to_string().contains("2 entries"), "{error}");
}

#[test]
fn when_xml_is_malformed_parsing_fails() {
    // Given: mismatched closing tags
    let archive = archive_of(&[(
        "CORPCODE.xml",
        "<result><list><corp_code>00126380</corp_name></list></result>",
    )]);

    // When
    let error = parse_corp_code_archive(&archive).expect_err("malformed xml");

    // Then
    assert_eq!(error.kind(), ErrorKind::BulkDocumentParseFailure);
}
