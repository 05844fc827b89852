//! Embedded minijinja templates for the dashboard, job detail pages, and
//! the static report index.
//!
//! Templates are fixed strings, so one [`minijinja::Environment`] is built
//! lazily and reused for every render.

use std::sync::OnceLock;

use minijinja::Environment;

pub const DASHBOARD: &str = r#"<!doctype html>
<html>
<head>
<title>qapbench</title>
<style>
body { font-family: sans-serif; margin: 2em; max-width: 60em; }
table { border-collapse: collapse; margin-top: 1em; }
td, th { border: 1px solid #ccc; padding: 4px 10px; text-align: left; }
form { margin: 1em 0; padding: 1em; background: #f5f5f5; }
label { display: inline-block; margin-right: 1em; }
</style>
</head>
<body>
<h1>qapbench</h1>
<form method="post" action="/bench/ui/new">
  <label>modes <input name="modes" value="hybrid"></label>
  <label>instances <input name="instances" placeholder="all"></label>
  <label>time limit (s) <input name="time_limit" size="4"></label>
  <label>data dir <input name="data_dir" placeholder="default"></label>
  <button type="submit">run benchmark</button>
</form>
<table>
<tr><th>job</th><th>status</th><th>created</th></tr>
{% for job in jobs %}
<tr>
  <td><a href="/bench/ui/{{ job.id }}">{{ job.id }}</a></td>
  <td>{{ job.status }}</td>
  <td>{{ job.created_at }}</td>
</tr>
{% endfor %}
</table>
</body>
</html>
"#;

pub const DETAIL: &str = r#"<!doctype html>
<html>
<head>
<title>qapbench — {{ job.id }}</title>
<style>
body { font-family: sans-serif; margin: 2em; max-width: 70em; }
table { border-collapse: collapse; margin-top: 1em; }
td, th { border: 1px solid #ccc; padding: 4px 10px; text-align: right; }
td:first-child, th:first-child { text-align: left; }
.bar { background: #4a90d9; height: 14px; margin: 2px 0 8px; }
.err { color: #b00020; }
.meta { color: #555; }
</style>
</head>
<body>
<h1>Job {{ job.id }}</h1>
<p class="meta">status: <b>{{ job.status }}</b> &middot; created: {{ job.created_at }}</p>
{% if job.error %}
<p class="err">{{ job.error }}</p>
{% endif %}
{% if bars %}
<h2>Average objective by mode</h2>
{% for bar in bars %}
<div>{{ bar.mode }} &mdash; {{ bar.avg|round(2) }} (n={{ bar.count }})
<div class="bar" style="width: {{ bar.pct|round(1) }}%"></div></div>
{% endfor %}
{% endif %}
{% if job.results %}
<h2>Results</h2>
<table>
<tr><th>instance</th><th>n</th><th>mode</th><th>objective</th><th>solve time</th>
<th>bound</th><th>gap</th><th>gap pct</th><th>error</th></tr>
{% for r in job.results %}
<tr>
  <td>{{ r.instance }}</td>
  <td>{{ r.n }}</td>
  <td>{{ r.mode }}</td>
  <td>{{ r.objective }}</td>
  <td>{{ r.solve_time|round(4) }}</td>
  <td>{{ r.bound }}</td>
  <td>{{ r.bound_gap }}</td>
  <td>{{ r.bound_gap_pct }}</td>
  <td class="err">{{ r.error }}</td>
</tr>
{% endfor %}
</table>
{% endif %}
{% if generated_at %}
<p class="meta">report generated {{ generated_at }}</p>
{% endif %}
</body>
</html>
"#;

pub const REPORT_INDEX: &str = r#"<!doctype html>
<html>
<head>
<title>qapbench reports</title>
<style>body { font-family: sans-serif; margin: 2em; }</style>
</head>
<body>
<h1>Benchmark reports</h1>
<ul>
{% for report in reports %}
<li><a href="/bench/reports/{{ report.id }}">{{ report.id }}</a> &mdash; {{ report.modified }}</li>
{% endfor %}
</ul>
</body>
</html>
"#;

pub fn env() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let mut env = Environment::new();
        env.add_template("dashboard", DASHBOARD)
            .expect("register dashboard template");
        env.add_template("detail", DETAIL)
            .expect("register detail template");
        env.add_template("index", REPORT_INDEX)
            .expect("register index template");
        env
    })
}
