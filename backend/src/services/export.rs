//! Export engine for saved queries and their insights
//!
//! Queries and insights are rendered as two parallel sections; they are
//! never joined. Every format produces bytes plus a content type and a
//! timestamped filename.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use shared::{AiInsight, WeatherQuery};

use crate::config::ExportConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Xml,
    Pdf,
    Markdown,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Markdown => "markdown",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xml => "application/xml",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "xml" => Ok(ExportFormat::Xml),
            "pdf" => Ok(ExportFormat::Pdf),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            _ => Err(AppError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Rendered export ready to download
#[derive(Debug, Clone)]
pub struct ExportPayload {
    pub body: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

/// Export service
#[derive(Debug, Clone)]
pub struct ExportService {
    limits: ExportConfig,
}

impl ExportService {
    pub fn new(limits: ExportConfig) -> Self {
        Self { limits }
    }

    /// Upper bound on queries loaded for one export
    pub fn max_records(&self) -> u32 {
        self.limits.max_records
    }

    pub fn export(
        &self,
        queries: &[WeatherQuery],
        insights: &[AiInsight],
        format: ExportFormat,
        now: DateTime<Utc>,
    ) -> AppResult<ExportPayload> {
        let body = match format {
            ExportFormat::Json => export_json(queries, insights, now)?,
            ExportFormat::Csv => export_csv(queries, insights)?,
            ExportFormat::Xml => export_xml(queries, insights, now),
            ExportFormat::Pdf => export_pdf(queries, insights, now, &self.limits)?,
            ExportFormat::Markdown => export_markdown(queries, insights, now).into_bytes(),
        };

        tracing::info!(
            format = %format,
            queries = queries.len(),
            insights = insights.len(),
            bytes = body.len(),
            "Export rendered"
        );

        Ok(ExportPayload {
            body,
            filename: format!(
                "weather-export-{}.{}",
                now.format("%Y%m%d-%H%M%S"),
                format.extension()
            ),
            content_type: format.content_type(),
        })
    }
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize)]
struct JsonExport<'a> {
    exported_at: DateTime<Utc>,
    format: &'static str,
    queries: &'a [WeatherQuery],
    insights: &'a [AiInsight],
}

fn export_json(
    queries: &[WeatherQuery],
    insights: &[AiInsight],
    now: DateTime<Utc>,
) -> AppResult<Vec<u8>> {
    let export = JsonExport {
        exported_at: now,
        format: "json",
        queries,
        insights,
    };
    serde_json::to_vec_pretty(&export)
        .map_err(|e| AppError::Internal(format!("JSON serialization error: {}", e)))
}

// ============================================================================
// CSV
// ============================================================================

const QUERY_COLUMNS: [&str; 15] = [
    "id",
    "location",
    "start_date",
    "end_date",
    "temperature",
    "feels_like",
    "description",
    "humidity",
    "pressure",
    "wind_speed",
    "wind_direction",
    "user_notes",
    "tags",
    "created_at",
    "updated_at",
];

const INSIGHT_COLUMNS: [&str; 11] = [
    "id",
    "query_id",
    "location",
    "insight",
    "weather_summary",
    "recommendations",
    "travel_advice",
    "clothing_recommendations",
    "activity_suggestions",
    "generated_at",
    "model",
];

#[derive(Serialize)]
struct QueryRow<'a> {
    id: String,
    location: &'a str,
    start_date: String,
    end_date: String,
    temperature: f64,
    feels_like: f64,
    description: &'a str,
    humidity: i32,
    pressure: i32,
    wind_speed: f64,
    wind_direction: &'static str,
    user_notes: &'a str,
    tags: String,
    created_at: String,
    updated_at: String,
}

#[derive(Serialize)]
struct InsightRow<'a> {
    id: String,
    query_id: String,
    location: &'a str,
    insight: &'a str,
    weather_summary: &'a str,
    recommendations: String,
    travel_advice: &'a str,
    clothing_recommendations: String,
    activity_suggestions: String,
    generated_at: String,
    model: &'a str,
}

fn csv_table<R: Serialize>(columns: &[&str], rows: impl Iterator<Item = R>) -> AppResult<String> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    wtr.write_record(columns)
        .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    String::from_utf8(
        wtr.into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
    )
    .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

fn export_csv(queries: &[WeatherQuery], insights: &[AiInsight]) -> AppResult<Vec<u8>> {
    let query_table = csv_table(
        &QUERY_COLUMNS,
        queries.iter().map(|q| QueryRow {
            id: q.id.to_string(),
            location: &q.location,
            start_date: q.date_range.start.to_string(),
            end_date: q.date_range.end.to_string(),
            temperature: q.weather_data.temperature,
            feels_like: q.weather_data.feels_like,
            description: &q.weather_data.description,
            humidity: q.weather_data.humidity,
            pressure: q.weather_data.pressure,
            wind_speed: q.weather_data.wind_speed,
            wind_direction: q.weather_data.wind_compass(),
            user_notes: &q.user_notes,
            tags: q.tags.join(", "),
            created_at: q.created_at.to_rfc3339(),
            updated_at: q.updated_at.to_rfc3339(),
        }),
    )?;

    let insight_table = csv_table(
        &INSIGHT_COLUMNS,
        insights.iter().map(|i| InsightRow {
            id: i.id.to_string(),
            query_id: i.query_id.to_string(),
            location: &i.location,
            insight: &i.insight,
            weather_summary: &i.weather_summary,
            recommendations: i.recommendations.join(" | "),
            travel_advice: i.travel_advice.as_deref().unwrap_or(""),
            clothing_recommendations: i
                .clothing_recommendations
                .as_ref()
                .map(|c| c.join(" | "))
                .unwrap_or_default(),
            activity_suggestions: i
                .activity_suggestions
                .as_ref()
                .map(|a| a.join(" | "))
                .unwrap_or_default(),
            generated_at: i.generated_at.to_rfc3339(),
            model: &i.model,
        }),
    )?;

    Ok(format!("Weather Queries\n{}\nAI Insights\n{}", query_table, insight_table).into_bytes())
}

// ============================================================================
// XML
// ============================================================================

/// Minimal element tree rendered by both XML writers
#[derive(Debug)]
struct XmlNode {
    name: &'static str,
    attributes: Vec<(&'static str, String)>,
    text: Option<String>,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    fn leaf(name: &'static str, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(name)
        }
    }

    fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attributes.push((name, value.into()));
        self
    }

    fn child(mut self, node: XmlNode) -> Self {
        self.children.push(node);
        self
    }

    fn list(name: &'static str, item: &'static str, values: &[String]) -> Self {
        values
            .iter()
            .fold(Self::new(name), |node, v| node.child(Self::leaf(item, v.as_str())))
    }
}

/// Escape the five XML special characters
pub fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn query_node(q: &WeatherQuery) -> XmlNode {
    let w = &q.weather_data;
    XmlNode::new("query")
        .attr("id", q.id.to_string())
        .child(XmlNode::leaf("location", q.location.as_str()))
        .child(XmlNode::leaf("startDate", q.date_range.start.to_string()))
        .child(XmlNode::leaf("endDate", q.date_range.end.to_string()))
        .child(
            XmlNode::new("weather")
                .child(XmlNode::leaf("locationName", w.display_location()))
                .child(XmlNode::leaf("temperature", format!("{:.1}", w.temperature)))
                .child(XmlNode::leaf("feelsLike", format!("{:.1}", w.feels_like)))
                .child(XmlNode::leaf("description", w.description.as_str()))
                .child(XmlNode::leaf("humidity", w.humidity.to_string()))
                .child(XmlNode::leaf("pressure", w.pressure.to_string()))
                .child(XmlNode::leaf("windSpeed", format!("{:.1}", w.wind_speed)))
                .child(XmlNode::leaf("windDirection", w.wind_compass())),
        )
        .child(XmlNode::leaf("userNotes", q.user_notes.as_str()))
        .child(XmlNode::list("tags", "tag", &q.tags))
        .child(XmlNode::leaf("createdAt", q.created_at.to_rfc3339()))
        .child(XmlNode::leaf("updatedAt", q.updated_at.to_rfc3339()))
}

fn insight_node(i: &AiInsight) -> XmlNode {
    let mut node = XmlNode::new("insight")
        .attr("id", i.id.to_string())
        .attr("queryId", i.query_id.to_string())
        .child(XmlNode::leaf("location", i.location.as_str()))
        .child(XmlNode::leaf("text", i.insight.as_str()))
        .child(XmlNode::leaf("weatherSummary", i.weather_summary.as_str()))
        .child(XmlNode::list("recommendations", "recommendation", &i.recommendations));
    if let Some(advice) = &i.travel_advice {
        node = node.child(XmlNode::leaf("travelAdvice", advice.as_str()));
    }
    if let Some(clothing) = &i.clothing_recommendations {
        node = node.child(XmlNode::list("clothingRecommendations", "item", clothing));
    }
    if let Some(activities) = &i.activity_suggestions {
        node = node.child(XmlNode::list("activitySuggestions", "activity", activities));
    }
    node.child(XmlNode::leaf("generatedAt", i.generated_at.to_rfc3339()))
        .child(XmlNode::leaf("model", i.model.as_str()))
}

fn export_tree(queries: &[WeatherQuery], insights: &[AiInsight], now: DateTime<Utc>) -> XmlNode {
    XmlNode::new("weatherExport")
        .attr("exportedAt", now.to_rfc3339())
        .attr("format", "xml")
        .attr("queryCount", queries.len().to_string())
        .attr("insightCount", insights.len().to_string())
        .child(
            queries
                .iter()
                .fold(XmlNode::new("queries"), |node, q| node.child(query_node(q))),
        )
        .child(
            insights
                .iter()
                .fold(XmlNode::new("insights"), |node, i| node.child(insight_node(i))),
        )
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<(), String> {
    let mut start = BytesStart::new(node.name);
    for (key, value) in &node.attributes {
        // attribute values are escaped by quick-xml
        start.push_attribute((*key, value.as_str()));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| e.to_string())?;
    if let Some(text) = &node.text {
        writer
            .write_event(Event::Text(BytesText::from_escaped(xml_escape(text))))
            .map_err(|e| e.to_string())?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.name)))
        .map_err(|e| e.to_string())?;
    Ok(())
}

fn render_with_writer(root: &XmlNode) -> Result<Vec<u8>, String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| e.to_string())?;
    write_node(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn render_by_hand(node: &XmlNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    out.push_str(&indent);
    out.push('<');
    out.push_str(node.name);
    for (key, value) in &node.attributes {
        out.push_str(&format!(" {}=\"{}\"", key, xml_escape(value)));
    }
    out.push('>');

    if let Some(text) = &node.text {
        out.push_str(&xml_escape(text));
    }
    if !node.children.is_empty() {
        out.push('\n');
        for child in &node.children {
            render_by_hand(child, depth + 1, out);
        }
        out.push_str(&indent);
    }
    out.push_str("</");
    out.push_str(node.name);
    out.push_str(">\n");
}

fn export_xml(queries: &[WeatherQuery], insights: &[AiInsight], now: DateTime<Utc>) -> Vec<u8> {
    let root = export_tree(queries, insights, now);
    match render_with_writer(&root) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "XML writer failed; building document by hand");
            let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
            render_by_hand(&root, 0, &mut out);
            out.into_bytes()
        }
    }
}

// ============================================================================
// PDF
// ============================================================================

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 6.0;
const WRAP_COLUMNS: usize = 90;
const NOTES_PREVIEW_CHARS: usize = 120;

/// Greedy word wrap on character count
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Writes lines top-down and starts a new page when a block will not fit
struct PdfCursor {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl PdfCursor {
    fn ensure_space(&mut self, lines: usize) {
        let needed = lines as f32 * LINE_HEIGHT_MM;
        if self.y - needed < MARGIN_MM {
            self.pages += 1;
            let (page, layer) = self.doc.add_page(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                format!("Page {}", self.pages),
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        self.ensure_space(1);
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(text, size, Mm(MARGIN_MM), Mm(self.y), font);
        self.y -= LINE_HEIGHT_MM;
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT_MM / 2.0;
    }
}

fn export_pdf(
    queries: &[WeatherQuery],
    insights: &[AiInsight],
    now: DateTime<Utc>,
    limits: &ExportConfig,
) -> AppResult<Vec<u8>> {
    let pdf_error = |e: printpdf::Error| AppError::Internal(format!("PDF generation error: {}", e));

    let (doc, page, layer) = PdfDocument::new(
        "Weather Query Export",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Page 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;
    let layer = doc.get_page(page).get_layer(layer);

    let mut cursor = PdfCursor {
        doc,
        layer,
        regular,
        bold,
        y: PAGE_HEIGHT_MM - MARGIN_MM,
        pages: 1,
    };

    cursor.line("Weather Query Export", 18.0, true);
    cursor.line(&format!("Exported: {}", now.format("%Y-%m-%d %H:%M UTC")), 10.0, false);
    cursor.line(
        &format!("Queries: {}   Insights: {}", queries.len(), insights.len()),
        10.0,
        false,
    );
    cursor.gap();

    if !queries.is_empty() {
        cursor.line("Weather Queries", 14.0, true);
        for q in queries.iter().take(limits.pdf_max_queries) {
            let w = &q.weather_data;
            let notes = (!q.user_notes.trim().is_empty())
                .then(|| format!("Notes: {}", truncate_chars(q.user_notes.trim(), NOTES_PREVIEW_CHARS)));

            cursor.ensure_space(if notes.is_some() { 5 } else { 4 });
            cursor.line(&q.location, 12.0, true);
            cursor.line(
                &format!("Dates: {} to {}", q.date_range.start, q.date_range.end),
                10.0,
                false,
            );
            cursor.line(
                &format!(
                    "{:.1} C (feels like {:.1} C), {}",
                    w.temperature, w.feels_like, w.description
                ),
                10.0,
                false,
            );
            cursor.line(
                &format!(
                    "Humidity {}%, wind {:.1} m/s {}",
                    w.humidity,
                    w.wind_speed,
                    w.wind_compass()
                ),
                10.0,
                false,
            );
            if let Some(notes) = notes {
                cursor.line(&notes, 10.0, false);
            }
            cursor.gap();
        }
    }

    if !insights.is_empty() {
        cursor.ensure_space(2);
        cursor.line("AI Insights", 14.0, true);
        for i in insights.iter().take(limits.pdf_max_insights) {
            let text = wrap_text(&i.insight, WRAP_COLUMNS);
            let recommendations: Vec<String> = i
                .recommendations
                .iter()
                .take(3)
                .flat_map(|r| wrap_text(&format!("- {}", r), WRAP_COLUMNS))
                .collect();

            cursor.ensure_space(1 + text.len().min(8) + recommendations.len().min(4));
            cursor.line(&i.location, 12.0, true);
            for line in &text {
                cursor.line(line, 10.0, false);
            }
            for line in &recommendations {
                cursor.line(line, 10.0, false);
            }
            cursor.gap();
        }
    }

    cursor.doc.save_to_bytes().map_err(pdf_error)
}

// ============================================================================
// Markdown
// ============================================================================

fn export_markdown(queries: &[WeatherQuery], insights: &[AiInsight], now: DateTime<Utc>) -> String {
    let mut md = String::new();
    md.push_str("# Weather Query Export\n\n");
    md.push_str(&format!("- **Exported:** {}\n", now.to_rfc3339()));
    md.push_str(&format!("- **Queries:** {}\n", queries.len()));
    md.push_str(&format!("- **Insights:** {}\n\n", insights.len()));

    md.push_str("## Weather Queries\n\n");
    if queries.is_empty() {
        md.push_str("_No weather queries._\n\n");
    }
    for (idx, q) in queries.iter().enumerate() {
        if idx > 0 {
            md.push_str("---\n\n");
        }
        let w = &q.weather_data;
        md.push_str(&format!("### {}\n\n", q.location));
        md.push_str(&format!(
            "- **Dates:** {} to {}\n",
            q.date_range.start, q.date_range.end
        ));
        md.push_str(&format!("- **Reported for:** {}\n", w.display_location()));
        md.push_str(&format!("- **Conditions:** {}\n", w.summary()));
        md.push_str(&format!(
            "- **Pressure:** {} hPa, **Visibility:** {} m, **Cloud cover:** {}%\n",
            w.pressure, w.visibility, w.cloud_cover
        ));
        if let Some(forecast) = &q.forecast_data {
            for day in &forecast.days {
                md.push_str(&format!(
                    "- **{}:** {:.0} to {:.0}°C, {} ({:.0}% rain)\n",
                    day.label,
                    day.temp_min,
                    day.temp_max,
                    day.description,
                    day.precipitation_probability * 100.0
                ));
            }
        }
        if !q.tags.is_empty() {
            md.push_str(&format!("- **Tags:** {}\n", q.tags.join(", ")));
        }
        if !q.user_notes.is_empty() {
            md.push_str(&format!("- **Notes:** {}\n", q.user_notes));
        }
        md.push_str(&format!("- **Created:** {}\n\n", q.created_at.to_rfc3339()));
    }

    md.push_str("## AI Insights\n\n");
    if insights.is_empty() {
        md.push_str("_No AI insights._\n");
    }
    for (idx, i) in insights.iter().enumerate() {
        if idx > 0 {
            md.push_str("---\n\n");
        }
        md.push_str(&format!("### {}\n\n", i.location));
        md.push_str(&format!("{}\n\n", i.insight));
        md.push_str(&format!("**Weather:** {}\n\n", i.weather_summary));
        if !i.recommendations.is_empty() {
            md.push_str("**Recommendations:**\n\n");
            for r in &i.recommendations {
                md.push_str(&format!("- {}\n", r));
            }
            md.push('\n');
        }
        if let Some(advice) = &i.travel_advice {
            md.push_str(&format!("**Travel advice:** {}\n\n", advice));
        }
        if let Some(clothing) = &i.clothing_recommendations {
            md.push_str(&format!("**Clothing:** {}\n\n", clothing.join(", ")));
        }
        if let Some(activities) = &i.activity_suggestions {
            md.push_str(&format!("**Activities:** {}\n\n", activities.join(", ")));
        }
        md.push_str(&format!(
            "_Generated {} by {}_\n\n",
            i.generated_at.to_rfc3339(),
            i.model
        ));
    }

    md
}
