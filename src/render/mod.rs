//! Report rendering. The engine's contract ends at [`ReportData`]; layout
//! lives here.

pub mod html;

use crate::config::OutputFormat;
use crate::model::ReportData;

pub use html::render_html_report;

pub fn render_json_report(data: &ReportData) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(data)?;
    json.push('\n');
    Ok(json)
}

pub fn render_report(data: &ReportData, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Html => render_html_report(data),
        OutputFormat::Json => render_json_report(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregationContext, aggregate_fight};
    use crate::config::SegmentThresholds;
    use crate::diagnostics::Diagnostics;
    use crate::log::{SnapshotRecord, ThreatEntry};
    use crate::model::{ReportInputs, build_report_data, resolve_raid_label};
    use crate::segment::FightSegment;

    fn report(fights: Vec<FightSegment>) -> ReportData {
        let ctx = AggregationContext::default();
        let summaries: Vec<_> = fights.iter().map(|f| aggregate_fight(f, &ctx)).collect();
        build_report_data(ReportInputs {
            raid: resolve_raid_label(None, &fights, None),
            raid_summary: crate::aggregate::summarize_raid(&summaries, &ctx),
            fights: summaries,
            source_files: vec!["TWThreatThreatLog_part1.txt".to_string()],
            thresholds: SegmentThresholds::default(),
            time_origin: Some(0.0),
            guilds: &[],
            diagnostics: &Diagnostics::default(),
        })
    }

    fn hostile_fight() -> FightSegment {
        let snapshot = SnapshotRecord {
            timestamp: 0.0,
            source_file_index: 0,
            line: 1,
            sender: "Tank".to_string(),
            target_guid: "0x1".to_string(),
            target_name: "</script><b>Boss".to_string(),
            entries: vec![
                ThreatEntry {
                    player: "Tank".to_string(),
                    threat: 10.0,
                    percent: 100.0,
                    is_top_threat: true,
                    melee: true,
                },
                ThreatEntry {
                    player: "<!--<script>".to_string(),
                    threat: 5.0,
                    percent: 50.0,
                    is_top_threat: false,
                    melee: false,
                },
            ],
        };
        FightSegment {
            id: 1,
            start_time: 0.0,
            end_time: 0.0,
            snapshots: vec![snapshot],
            target_name: "</script><b>Boss".to_string(),
            target_guid: "0x1".to_string(),
            needs_review: false,
        }
    }

    #[test]
    fn empty_report_says_so() {
        let html = render_report(&report(Vec::new()), OutputFormat::Html).unwrap();
        assert!(html.contains(r#"<p class="panel empty" id="empty">No qualifying fights were found.</p>"#));
        assert!(html.contains(r#""fights":[]"#));
        assert!(!html.contains("__DATA__"));
    }

    #[test]
    fn names_cannot_close_the_script_tag() {
        let html = render_report(&report(vec![hostile_fight()]), OutputFormat::Html).unwrap();
        assert!(html.contains(r#"\u003c/script>\u003cb>Boss"#));
        assert!(html.contains(r#"\u003c!--\u003cscript>"#));
        assert!(!html.contains("<!--"));
        assert_eq!(html.matches("</script>").count(), 1);
        assert_eq!(html.matches("<script>").count(), 1);
        assert!(html.contains(r#"id="empty" hidden>"#));
    }

    #[test]
    fn json_format_round_trips_through_serde_json() {
        let json = render_report(&report(vec![hostile_fight()]), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["fights"][0]["ranking_order"][0], "Tank");
        assert_eq!(value["fights"][0]["ranking_order"][1], "<!--<script>");
        assert_eq!(value["raid"]["source"], "unknown");
    }
}
