//! Log entry markup and the text splice that inserts it

use crate::models::DisplayFields;

/// Render the log-entry fragment for one activity.
///
/// Only the activity name comes from user input; it is escaped. The route
/// block is left out when there is no route.
pub fn render_entry(fields: &DisplayFields, route_svg: Option<&str>) -> String {
    let route = route_svg
        .map(|svg| {
            format!(
                "\n                            <div style=\"margin-left: 20px;\">\n                                {}\n                            </div>",
                svg
            )
        })
        .unwrap_or_default();

    format!(
        r#"
                    <div class="log-entry">
                        <p>
                            <span>{name}
                                <span class="tag">#activity</span></span>
                            <span style="margin-right: 0px; font-size: small;">{date}</span>
                        </p>
                        <div class="activity-details">
                            <pre class="log-text">Distance: {distance}
Time: {time}
Avg HR: {avg_hr}</pre>{route}
                        </div>
                    </div>"#,
        name = escape_html(&fields.name),
        date = fields.short_date,
        distance = fields.distance,
        time = fields.elapsed_time,
        avg_hr = fields.avg_heartrate,
        route = route,
    )
}

/// Insert `fragment` right after the `>` that closes the first `marker`.
///
/// Returns `None` when the marker is absent. Everything outside the
/// insertion point is preserved byte for byte.
pub fn splice_entry(document: &str, marker: &str, fragment: &str) -> Option<String> {
    let start = document.find(marker)?;
    let insert_at = start + document[start..].find('>')? + 1;

    let mut updated = String::with_capacity(document.len() + fragment.len());
    updated.push_str(&document[..insert_at]);
    updated.push_str(fragment);
    updated.push_str(&document[insert_at..]);
    Some(updated)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = r#"<div class="logs">"#;

    fn fields() -> DisplayFields {
        DisplayFields {
            name: "Lunch Ride".to_string(),
            kind: "Ride".to_string(),
            date: "2024-05-02 12:15".to_string(),
            short_date: "05/02/24".to_string(),
            elapsed_time: "45.5 minutes".to_string(),
            distance: "12.40 miles".to_string(),
            avg_heartrate: "N/A".to_string(),
            max_heartrate: "N/A".to_string(),
        }
    }

    #[test]
    fn test_splice_after_marker() {
        let doc = "<html><body>\n<div class=\"logs\">\n<div class=\"log-entry\">old</div>\n</div></body></html>";
        let updated = splice_entry(doc, MARKER, "NEW").unwrap();

        let at = doc.find(MARKER).unwrap() + MARKER.len();
        assert_eq!(&updated[..at], &doc[..at]);
        assert_eq!(&updated[at..at + 3], "NEW");
        assert_eq!(&updated[at + 3..], &doc[at..]);
    }

    #[test]
    fn test_splice_uses_first_marker() {
        let doc = r#"<div class="logs">a</div><div class="logs">b</div>"#;
        let updated = splice_entry(doc, MARKER, "X").unwrap();
        assert_eq!(
            updated,
            r#"<div class="logs">Xa</div><div class="logs">b</div>"#
        );
    }

    #[test]
    fn test_splice_missing_marker() {
        assert_eq!(splice_entry("<div class=\"log\"></div>", MARKER, "X"), None);
        assert_eq!(splice_entry("", MARKER, "X"), None);
    }

    #[test]
    fn test_splice_marker_without_closing_bracket() {
        // marker configured without its '>'
        let doc = r#"<div class="logs" id="feed">rest"#;
        let updated = splice_entry(doc, r#"<div class="logs""#, "X").unwrap();
        assert_eq!(updated, r#"<div class="logs" id="feed">Xrest"#);
        assert_eq!(splice_entry("<div class=\"logs\"", "<div class=\"logs\"", "X"), None);
    }

    #[test]
    fn test_entry_contents() {
        let entry = render_entry(&fields(), Some("<svg></svg>"));
        assert!(entry.starts_with("\n                    <div class=\"log-entry\">"));
        assert!(entry.contains("<span>Lunch Ride\n"));
        assert!(entry.contains(">05/02/24</span>"));
        assert!(entry.contains("Distance: 12.40 miles\nTime: 45.5 minutes\nAvg HR: N/A</pre>"));
        assert!(entry.contains("<svg></svg>"));
        assert!(entry.ends_with("</div>"));
    }

    #[test]
    fn test_entry_without_route() {
        let entry = render_entry(&fields(), None);
        assert!(!entry.contains("margin-left: 20px"));
        assert!(!entry.contains("None"));
    }

    #[test]
    fn test_entry_escapes_name() {
        let mut f = fields();
        f.name = r#"Hills & <b>"fun"</b>"#.to_string();
        let entry = render_entry(&f, None);
        assert!(entry.contains("Hills &amp; &lt;b&gt;&quot;fun&quot;&lt;/b&gt;"));
    }
}
