use crate::format::format_currency;
use crate::shell::{Shell, TabId};
use crate::tabs::{CHART_UNAVAILABLE, ChartSpec, ChartSupport, Progress, Section, TransactionRow};

const PLOTLY_URL: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

pub fn render_shell(shell: &Shell) -> String {
    let active = shell.active_tab();
    let nav: String = TabId::ALL
        .iter()
        .map(|id| {
            let class = if active == Some(*id) { "tab active" } else { "tab" };
            format!(
                r#"<a class="{class}" data-nav="{id}" href="/?tab={id}">{}</a>"#,
                id.label()
            )
        })
        .collect();

    let views: String = shell
        .views()
        .into_iter()
        .map(|view| {
            let class = if view.active { "view active" } else { "view" };
            format!(r#"<section class="{class}" data-view="{}">{}</section>"#, view.id, view.html)
        })
        .collect();

    let status = match shell.status() {
        Some(message) => format!(
            r#"<div id="global-status" class="status" data-type="error">{}</div>"#,
            escape_html(message)
        ),
        None => r#"<div id="global-status" class="status" hidden></div>"#.to_string(),
    };

    let chart_script = match shell.services().charts {
        ChartSupport::Available => format!(r#"<script src="{PLOTLY_URL}" defer></script>"#),
        ChartSupport::Unavailable => String::new(),
    };

    SHELL_HTML
        .replace("{{CHART_SCRIPT}}", &chart_script)
        .replace("{{CHART_UNAVAILABLE}}", CHART_UNAVAILABLE)
        .replace("{{NAV}}", &nav)
        .replace("{{STATUS}}", &status)
        .replace("{{VIEWS}}", &views)
}

/// Replaces every `{{name}}` marker in `fragment` with the matching slot
/// content. Markers without a slot render as nothing; slots without a marker
/// are dropped.
pub fn fill_slots(fragment: &str, slots: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut rest = fragment;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                if let Some((_, content)) = slots.iter().find(|(slot, _)| *slot == name) {
                    out.push_str(content);
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
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

pub fn empty_state(message: &str) -> String {
    format!(r#"<div class="empty-state">{}</div>"#, escape_html(message))
}

pub fn section<T>(section: &Section<T>, render: impl FnOnce(&T) -> String) -> String {
    match section {
        Section::Empty(message) => empty_state(message),
        Section::Ready(value) => render(value),
    }
}

pub fn transaction_list(rows: &[TransactionRow], with_badge: bool) -> String {
    let items: String = rows
        .iter()
        .map(|row| {
            let badge = if with_badge && row.is_recurring {
                r#" <span class="badge">Recurring</span>"#
            } else {
                ""
            };
            let note = match &row.note {
                Some(note) => format!("<div>{}</div>", escape_html(note)),
                None => String::new(),
            };
            format!(
                r#"<div class="transaction-item"><div class="info-line"><span>{}</span><strong>{}</strong></div><div class="muted">{}{badge}</div>{note}</div>"#,
                row.date,
                row.display_amount,
                escape_html(&row.category_line()),
            )
        })
        .collect();
    format!(r#"<div class="transaction-list">{items}</div>"#)
}

pub fn progress_bar(progress: &Progress) -> String {
    format!(
        r#"<div class="progress"><div class="progress-fill" style="width: {}%"></div></div><div class="progress-value">{}% complete</div>"#,
        progress.bar_percent,
        progress.display_percent()
    )
}

pub fn summary_card(title: &str, value: &str) -> String {
    format!(
        r#"<div class="summary-card"><strong>{}</strong><span>{}</span></div>"#,
        escape_html(title),
        escape_html(value)
    )
}

pub fn chart(section: &Section<ChartSpec>) -> String {
    match section {
        Section::Empty(message) => format!(r#"<div class="chart empty-state">{}</div>"#, escape_html(message)),
        Section::Ready(spec) => {
            let payload = serde_json::to_string(spec).unwrap_or_else(|_| "null".to_string());
            format!(r#"<div class="chart" data-chart="{}"></div>"#, escape_html(&payload))
        }
    }
}

pub fn option(value: &str, label: &str, selected: bool) -> String {
    let selected = if selected { " selected" } else { "" };
    format!(
        r#"<option value="{}"{selected}>{}</option>"#,
        escape_html(value),
        escape_html(label)
    )
}

pub fn currency(value: f64) -> String {
    escape_html(&format_currency(value))
}

const SHELL_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Wealth Tracker</title>
  {{CHART_SCRIPT}}
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f1f5f4;
      --bg-2: #cfe8e3;
      --ink: #23302f;
      --accent: #0b7285;
      --accent-2: #2f4858;
      --income: #2d7a4b;
      --expense: #c63b2b;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e6f2ef 60%, #f7faf9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(960px, 100%);
      margin: 0 auto;
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-size: clamp(1.8rem, 4vw, 2.4rem);
      margin: 0;
    }

    nav.tabs {
      display: flex;
      gap: 6px;
      padding: 6px;
      background: rgba(47, 72, 88, 0.08);
      border-radius: 999px;
      width: fit-content;
    }

    .tab {
      border-radius: 999px;
      padding: 8px 16px;
      font-weight: 600;
      color: #5c6664;
      text-decoration: none;
    }

    .tab.active {
      background: white;
      color: var(--accent-2);
      box-shadow: 0 8px 16px rgba(47, 72, 88, 0.12);
    }

    .view {
      display: none;
      gap: 20px;
    }

    .view.active {
      display: grid;
    }

    .card {
      background: white;
      border-radius: 20px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 12px;
    }

    .summary {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(140px, 1fr));
      gap: 12px;
    }

    .summary-card {
      display: grid;
      gap: 4px;
      padding: 12px;
      border-radius: 14px;
      background: rgba(11, 114, 133, 0.06);
    }

    .transaction-list {
      display: grid;
      gap: 10px;
    }

    .transaction-item {
      padding: 10px 12px;
      border-radius: 12px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .info-line {
      display: flex;
      justify-content: space-between;
    }

    .muted {
      color: #6f7775;
      font-size: 0.9rem;
    }

    .badge {
      background: var(--accent);
      color: white;
      border-radius: 999px;
      padding: 2px 8px;
      font-size: 0.75rem;
    }

    .empty-state {
      color: #7a8482;
      font-style: italic;
    }

    .progress {
      height: 12px;
      background: rgba(47, 72, 88, 0.1);
      border-radius: 999px;
      overflow: hidden;
    }

    .progress-fill {
      height: 100%;
      background: var(--accent);
    }

    .chart {
      min-height: 120px;
    }

    form {
      display: grid;
      gap: 10px;
    }

    input, select, button {
      font: inherit;
      padding: 8px 12px;
      border-radius: 10px;
      border: 1px solid rgba(47, 72, 88, 0.2);
    }

    button {
      background: var(--accent);
      color: white;
      border: none;
      font-weight: 600;
      cursor: pointer;
    }

    .status {
      font-size: 0.95rem;
      color: #5c6664;
      min-height: 1.2em;
    }

    .status[data-type="error"] {
      color: var(--expense);
    }

    .hidden {
      display: none;
    }

    .inline-form, form.inline {
      display: inline-flex;
      align-items: center;
      gap: 8px;
    }

    .savings-card {
      display: grid;
      gap: 4px;
      padding: 12px;
      border-radius: 14px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Wealth Tracker</h1>
    </header>
    <nav class="tabs">{{NAV}}</nav>
    {{STATUS}}
    <div id="view-container">{{VIEWS}}</div>
  </main>

  <script>
    const renderCharts = () => {
      document.querySelectorAll('.chart[data-chart]').forEach((el) => {
        if (typeof window.Plotly === 'undefined') {
          el.classList.add('empty-state');
          el.textContent = '{{CHART_UNAVAILABLE}}';
          return;
        }
        const spec = JSON.parse(el.dataset.chart);
        const traces = spec.series.map((series) => ({
          x: spec.keys,
          y: series.values,
          name: series.name,
          type: series.kind === 'bar' ? 'bar' : 'scatter',
          mode: series.kind === 'bar' ? undefined : 'lines'
        }));
        window.Plotly.react(el, traces, {
          height: 320,
          margin: { t: 20, r: 20, b: 60, l: 60 },
          barmode: 'group',
          legend: { orientation: 'h' },
          xaxis: { tickmode: 'array', tickvals: spec.keys, ticktext: spec.labels }
        }, { displayModeBar: false, responsive: true });
      });
    };

    window.addEventListener('load', renderCharts);
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_slots_replaces_known_and_drops_unknown_markers() {
        let fragment = r#"<div id="a">{{a}}</div><div id="b">{{ b }}</div><p>{{missing}}</p>"#;
        let filled = fill_slots(
            fragment,
            &[("a", "one".to_string()), ("b", "two".to_string()), ("c", "three".to_string())],
        );
        assert_eq!(filled, r#"<div id="a">one</div><div id="b">two</div><p></p>"#);
    }

    #[test]
    fn fill_slots_keeps_unterminated_marker_text() {
        assert_eq!(fill_slots("x {{open", &[]), "x {{open");
    }

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"Tom & 'Jerry'"</b>"#),
            "&lt;b&gt;&quot;Tom &amp; &#39;Jerry&#39;&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn progress_bar_shows_unbounded_label() {
        let markup = progress_bar(&Progress::new(300.0, 100.0));
        assert!(markup.contains("width: 100%"));
        assert!(markup.contains("300% complete"));
    }
}
