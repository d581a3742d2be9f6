//! Server-rendered HTML pages.

use rollcall_store::{AttendanceEntry, DATE_FORMAT, TIME_FORMAT};

const NAV: &str = r#"<nav><a href="/">Attendance</a> | <a href="/collect_data/">Collect data</a> | <a href="/train_model/">Train model</a> | <a href="/recognize_faces/">Recognize faces</a></nav>"#;

// Posts a form and shows the JSON reply in #result.
const POST_SCRIPT: &str = r#"<script>
async function submitForm(form) {
  const out = document.getElementById("result");
  out.textContent = "Working...";
  const resp = await fetch(form.action, { method: "POST", body: new URLSearchParams(new FormData(form)) });
  out.textContent = await resp.text();
}
</script>"#;

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n{NAV}\n<h1>{title}</h1>\n{body}\n{POST_SCRIPT}\n</body>\n</html>\n",
        title = escape(title),
    )
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn home(entries: &[AttendanceEntry]) -> String {
    if entries.is_empty() {
        return layout("Attendance", "<p>No attendance recorded yet.</p>");
    }

    let rows: String = entries
        .iter()
        .map(|e| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape(&e.subject_id),
                escape(&e.name),
                e.date.format(DATE_FORMAT),
                e.time.format(TIME_FORMAT),
            )
        })
        .collect();

    layout(
        "Attendance",
        &format!(
            "<table>\n<thead><tr><th>Student ID</th><th>Name</th><th>Date</th><th>Time</th></tr></thead>\n<tbody>\n{rows}</tbody>\n</table>"
        ),
    )
}

pub fn collect_form() -> String {
    layout(
        "Collect data",
        r#"<form action="/collect_data/" method="post" onsubmit="submitForm(this); return false;">
<label>Student ID <input name="student_id" required></label>
<label>Name <input name="name" required></label>
<button type="submit">Start collection</button>
</form>
<p id="result"></p>"#,
    )
}

pub fn train_page() -> String {
    layout(
        "Train model",
        r#"<form action="/train_model/" method="post" onsubmit="submitForm(this); return false;">
<button type="submit">Train</button>
</form>
<p id="result"></p>"#,
    )
}

pub fn recognize_page() -> String {
    layout(
        "Recognize faces",
        r#"<form action="/recognize_faces/" method="post" onsubmit="submitForm(this); return false;">
<button type="submit">Start recognition</button>
</form>
<p id="result"></p>"#,
    )
}
