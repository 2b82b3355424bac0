//! HTML export: a standalone styled document with one table

use crate::results::{Column, ResultRow};
use handlebars::Handlebars;
use serde_json::json;

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{{title}}</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 20px; background-color: #f5f5f5; }
        h1 { color: #333; }
        .table { border-collapse: collapse; width: 100%; background-color: white; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .table th { background-color: #4CAF50; color: white; padding: 12px; text-align: left; font-weight: bold; }
        .table td { padding: 10px; border-bottom: 1px solid #ddd; }
        .table tr:hover { background-color: #f5f5f5; }
    </style>
</head>
<body>
    <h1>{{title}}</h1>
    <p>Total records: {{count}}</p>
    <table id="asn_results" class="table table-striped">
      <thead>
        <tr>
{{#each headers}}
          <th>{{this}}</th>
{{/each}}
        </tr>
      </thead>
      <tbody>
{{#each rows}}
        <tr>
{{#each this}}
          <td>{{this}}</td>
{{/each}}
        </tr>
{{/each}}
      </tbody>
    </table>
</body>
</html>
"#;

/// Render the complete document.
///
/// Cell text and the title go through the template's HTML escaping.
pub fn render_html(
    rows: &[ResultRow],
    columns: &[Column],
    title: &str,
) -> Result<String, handlebars::RenderError> {
    let handlebars = Handlebars::new();

    let data = json!({
        "title": title,
        "count": rows.len(),
        "headers": columns.iter().map(Column::header).collect::<Vec<_>>(),
        "rows": rows
            .iter()
            .map(|row| columns.iter().map(|column| row.value(*column)).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
    });

    handlebars.render_template(HTML_TEMPLATE, &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn::AsnRecord;
    use crate::export::DEFAULT_TITLE;
    use crate::results::{build_rows, CompletedLookup, LookupOutcome, RowShape};

    fn sample_rows() -> Vec<ResultRow> {
        let completed = vec![
            CompletedLookup {
                ip: "8.8.8.8".to_string(),
                outcome: LookupOutcome::Valid {
                    record: AsnRecord::new("15169", "GOOGLE <script>", "US", "8.8.8.0/24", "arin"),
                    traffic: None,
                },
            },
            CompletedLookup {
                ip: "x".to_string(),
                outcome: LookupOutcome::invalid(),
            },
        ];
        build_rows(&completed, true, false)
    }

    #[test]
    fn test_render_html() {
        let rows = sample_rows();
        let html = render_html(&rows, &RowShape::new(true, false).columns(), DEFAULT_TITLE).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>ASN Lookup Results</title>"));
        assert!(html.contains("<h1>ASN Lookup Results</h1>"));
        assert!(html.contains("<p>Total records: 2</p>"));
        assert!(html.contains("<table id=\"asn_results\""));
        assert!(html.contains("<th>AS Name</th>"));
        assert!(html.contains("<td>GOOGLE &lt;script&gt;</td>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<td>Invalid IP format</td>"));
    }

    #[test]
    fn test_cells_follow_column_order() {
        let rows = sample_rows();
        let html = render_html(&rows, &RowShape::new(false, false).columns(), DEFAULT_TITLE).unwrap();

        let ip = html.find("<td>8.8.8.8</td>").unwrap();
        let asn = html.find("<td>AS15169</td>").unwrap();
        let invalid = html.find("<td>x</td>").unwrap();
        assert!(ip < asn && asn < invalid);
        assert!(!html.contains("GOOGLE"));
    }

    #[test]
    fn test_title_is_escaped() {
        let html = render_html(&[], &RowShape::default().columns(), "\"AT&T\" <b>").unwrap();
        assert!(html.contains("<title>&quot;AT&amp;T&quot; &lt;b&gt;</title>"));
        assert!(html.contains("<p>Total records: 0</p>"));
    }
}
