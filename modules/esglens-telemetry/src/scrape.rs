use scraper::{Html, Selector};

/// Telemetry widget wait target: the block container after the `<hr>` rule.
pub const WIDGET_SELECTOR: &str = "hr + div";

/// Pull the raw label blocks out of a rendered dashboard page. The widget
/// is the first `<div>` sibling after the `<hr>` marker; each of its child
/// `<div>`s is one parent block whose `<label>` texts form the tuple.
pub fn extract_blocks(html: &str) -> Vec<Vec<String>> {
    let document = Html::parse_document(html);
    let widget = Selector::parse("hr + div > div").expect("static selector");
    let label = Selector::parse("label").expect("static selector");

    let mut blocks = Vec::new();
    for child in document.select(&widget) {
        let tuple: Vec<String> = child
            .select(&label)
            .map(|l| {
                l.text()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .replace('\n', " ")
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|text| !text.is_empty())
            .collect();
        if !tuple.is_empty() {
            blocks.push(tuple);
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <h1>Live Emissions</h1>
          <hr/>
          <div>
            <div>
              <label>Stack1</label>
              <label>PM</label>
              <label>25</label>
              <label>10:00
Time</label>
            </div>
            <div>
              <label>ETP Outlet</label>
              <label>pH</label>
              <label>7.2</label>
              <label>09:00 Time</label>
            </div>
            <div></div>
          </div>
          <div><label>outside the widget</label></div>
        </body></html>
    "#;

    #[test]
    fn extracts_label_tuples_per_block() {
        let blocks = extract_blocks(PAGE);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], vec!["Stack1", "PM", "25", "10:00 Time"]);
        assert_eq!(blocks[1][0], "ETP Outlet");
    }

    #[test]
    fn newlines_inside_labels_collapse_to_spaces() {
        let blocks = extract_blocks(PAGE);
        assert_eq!(blocks[0][3], "10:00 Time");
    }

    #[test]
    fn content_outside_the_widget_is_ignored() {
        let blocks = extract_blocks(PAGE);
        assert!(!blocks.iter().flatten().any(|t| t.contains("outside")));
    }

    #[test]
    fn pages_without_the_widget_yield_nothing() {
        assert!(extract_blocks("<html><body><p>maintenance</p></body></html>").is_empty());
    }

    #[test]
    fn blocks_feed_straight_into_snapshot_parsing() {
        let blocks = extract_blocks(PAGE);
        let parsed = crate::snapshot::parse_blocks(&blocks);
        assert_eq!(parsed["Stack1"]["PM"].value.as_deref(), Some("25"));
        assert_eq!(parsed["Stack1"]["PM"].time.as_deref(), Some("10:00"));
    }
}
