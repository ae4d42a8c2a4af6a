//! Export engine tests
//!
//! Every format is rendered from the same fixtures; XML output is re-read
//! with a streaming parser to prove it is well formed.

mod common;

use chrono::{TimeZone, Utc};
use common::*;
use quick_xml::events::Event;
use quick_xml::Reader;
use weather_query_backend::config::Config;
use weather_query_backend::error::AppError;
use weather_query_backend::services::{ExportFormat, ExportService};

fn exporter() -> ExportService {
    ExportService::new(Config::defaults().unwrap().export)
}

fn export_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 15).unwrap()
}

/// Count elements, failing on malformed XML
fn parse_xml(xml: &str) -> usize {
    let mut reader = Reader::from_str(xml);
    let mut elements = 0;
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(_)) | Ok(Event::Empty(_)) => elements += 1,
            Ok(_) => {}
            Err(e) => panic!("malformed XML at {}: {:?}", reader.buffer_position(), e),
        }
    }
    elements
}

// ============================================================================
// Format Selection
// ============================================================================

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn test_unsupported_format() {
        let err = "yaml".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_filename_and_content_type() {
        let payload = exporter()
            .export(&[], &[], ExportFormat::Markdown, export_time())
            .unwrap();
        assert_eq!(payload.filename, "weather-export-20240601-093015.md");
        assert!(payload.content_type.starts_with("text/markdown"));

        let payload = exporter()
            .export(&[], &[], ExportFormat::Pdf, export_time())
            .unwrap();
        assert_eq!(payload.filename, "weather-export-20240601-093015.pdf");
        assert_eq!(payload.content_type, "application/pdf");
    }
}

// ============================================================================
// CSV
// ============================================================================

#[cfg(test)]
mod csv_tests {
    use super::*;

    #[test]
    fn test_empty_csv_has_only_section_headers() {
        let payload = exporter()
            .export(&[], &[], ExportFormat::Csv, export_time())
            .unwrap();
        let text = String::from_utf8(payload.body).unwrap();
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Weather Queries");
        assert!(lines[1].starts_with("id,location,start_date,end_date"));
        assert_eq!(lines[2], "AI Insights");
        assert!(lines[3].starts_with("id,query_id,location,insight"));
    }

    #[test]
    fn test_csv_joins_list_fields() {
        let query = sample_query("London", "Notes, with comma", &["work", "rain"]);
        let insight = sample_insight(&query, "Wet week ahead");
        let payload = exporter()
            .export(&[query.clone()], &[insight], ExportFormat::Csv, export_time())
            .unwrap();
        let text = String::from_utf8(payload.body).unwrap();

        assert!(text.contains("\"work, rain\""));
        assert!(text.contains("Pack an umbrella | Book indoor tours"));
        assert!(text.contains("\"Notes, with comma\""));
        assert!(text.contains(&query.id.to_string()));
    }
}

// ============================================================================
// XML
// ============================================================================

#[cfg(test)]
mod xml_tests {
    use super::*;

    #[test]
    fn test_special_characters_are_escaped_and_reparse() {
        let query = sample_query("Rock & Roll <City>", r#"Say "hi" & <wave>"#, &["a&b"]);
        let insight = sample_insight(&query, "Use <caution> & \"care\"");
        let payload = exporter()
            .export(&[query], &[insight], ExportFormat::Xml, export_time())
            .unwrap();
        let xml = String::from_utf8(payload.body).unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("Say &quot;hi&quot; &amp; &lt;wave&gt;"));
        assert!(!xml.contains("<wave>"));
        assert!(!xml.contains("<caution>"));

        assert!(xml.contains("<location>Rock &amp; Roll &lt;City&gt;</location>"));
        assert!(xml.contains("<tag>a&amp;b</tag>"));
        assert!(parse_xml(&xml) > 10);
    }

    #[test]
    fn test_root_carries_export_metadata() {
        let payload = exporter()
            .export(&[], &[], ExportFormat::Xml, export_time())
            .unwrap();
        let xml = String::from_utf8(payload.body).unwrap();

        assert!(xml.contains("<weatherExport"));
        assert!(xml.contains("exportedAt=\"2024-06-01T09:30:15+00:00\""));
        assert!(xml.contains("queryCount=\"0\""));
        // root, queries, insights
        assert_eq!(parse_xml(&xml), 3);
    }
}

// ============================================================================
// JSON / Markdown / PDF
// ============================================================================

#[cfg(test)]
mod document_tests {
    use super::*;

    #[test]
    fn test_json_keeps_sections_separate() {
        let query = sample_query("Paris", "", &[]);
        let insight = sample_insight(&query, "Sunny spells");
        let payload = exporter()
            .export(&[query.clone()], &[insight], ExportFormat::Json, export_time())
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload.body).unwrap();

        assert_eq!(value["format"], "json");
        assert_eq!(value["queries"].as_array().unwrap().len(), 1);
        assert_eq!(value["insights"].as_array().unwrap().len(), 1);
        assert_eq!(value["queries"][0]["id"], query.id.to_string());
        assert_eq!(value["insights"][0]["insight"], "Sunny spells");
    }

    #[test]
    fn test_markdown_headings_and_separators() {
        let first = sample_query("Berlin", "Long untruncated note ".repeat(20).trim(), &[]);
        let second = sample_query("Rome", "", &["food"]);
        let insight = sample_insight(&first, "Cool evenings");
        let payload = exporter()
            .export(
                &[first.clone(), second],
                &[insight],
                ExportFormat::Markdown,
                export_time(),
            )
            .unwrap();
        let md = String::from_utf8(payload.body).unwrap();

        assert!(md.contains("### Berlin"));
        assert!(md.contains("### Rome"));
        assert_eq!(md.matches("\n---\n").count(), 1);
        assert!(md.contains(&first.user_notes));
        assert!(md.contains("- Pack an umbrella"));
    }

    #[test]
    fn test_pdf_is_a_pdf_and_paginates() {
        let queries: Vec<_> = (0..10)
            .map(|i| sample_query(&format!("City {}", i), &"note ".repeat(50), &[]))
            .collect();
        let insights: Vec<_> = queries
            .iter()
            .take(5)
            .map(|q| sample_insight(q, &"A long insight sentence. ".repeat(30)))
            .collect();

        let payload = exporter()
            .export(&queries, &insights, ExportFormat::Pdf, export_time())
            .unwrap();
        assert!(payload.body.starts_with(b"%PDF"));
        assert!(payload.body.len() > 1000);
    }
}
