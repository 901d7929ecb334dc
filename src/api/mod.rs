use axum::response::Html;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, AppResult};
use crate::jobs::model::{Job, NewJob};
use crate::jobs::{JobRunner, JobsRepo};

#[derive(Clone)]
pub struct ApiState {
    pub jobs: JobsRepo,
    pub runner: JobRunner,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(index))
        // Jobs
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:id", get(get_job))
        .route("/run-job/:id", post(run_job))
        // Browser client
        .route("/ui", get(ui_index))
        .layer(TraceLayer::new_for_http())
        // The UI may also be served from elsewhere during development.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

const UI_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>JobFlow</title>
  <style>
    :root {
      color-scheme: light;
      --bg: #f6f7fb;
      --panel: #ffffff;
      --border: #d7dbe6;
      --text: #1b1f2a;
      --muted: #5b6275;
      --accent: #1f6feb;
      --run: #1a7f37;
      --close: #cf222e;
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      font-family: "Segoe UI", "Helvetica Neue", Arial, sans-serif;
      background: var(--bg);
      color: var(--text);
    }
    header {
      padding: 20px 24px;
      border-bottom: 1px solid var(--border);
      background: var(--panel);
    }
    h1 { margin: 0; font-size: 20px; }
    main {
      padding: 16px 24px 32px;
      max-width: 960px;
      margin: 0 auto;
      display: grid;
      gap: 16px;
    }
    section {
      background: var(--panel);
      border: 1px solid var(--border);
      border-radius: 10px;
      padding: 12px 14px;
      box-shadow: 0 1px 2px rgba(0,0,0,0.04);
    }
    h2 { margin: 0 0 8px; font-size: 16px; }
    .muted { color: var(--muted); font-size: 12px; }
    label { display: block; font-size: 12px; margin: 6px 0 4px; }
    input, textarea, select {
      width: 100%;
      padding: 8px;
      border: 1px solid var(--border);
      border-radius: 6px;
      font-family: inherit;
    }
    .filters { display: flex; gap: 16px; }
    .filters div { flex: 1; }
    button {
      margin-top: 8px;
      padding: 8px 12px;
      border: 1px solid var(--accent);
      background: var(--accent);
      color: white;
      border-radius: 6px;
      cursor: pointer;
    }
    table { width: 100%; border-collapse: collapse; }
    th, td {
      padding: 8px;
      border-top: 1px solid var(--border);
      text-align: left;
      font-size: 13px;
    }
    thead th { border-top: none; }
    tbody tr { cursor: pointer; }
    tbody tr:hover { background: var(--bg); }
    td button {
      margin: 0;
      padding: 4px 10px;
      border-color: var(--run);
      background: var(--run);
    }
    .close-btn { border-color: var(--close); background: var(--close); }
    pre {
      margin: 10px 0 0;
      padding: 10px;
      background: #0f172a;
      color: #e5e7eb;
      border-radius: 8px;
      font-size: 12px;
      overflow: auto;
      min-height: 60px;
    }
  </style>
</head>
<body>
  <header>
    <h1>JobFlow</h1>
    <div class="muted">Endpoints: GET /jobs, POST /jobs, GET /jobs/:id, POST /run-job/:id</div>
  </header>
  <main>
    <section>
      <h2>Filters</h2>
      <div class="filters">
        <div>
          <label>Status</label>
          <select id="filter-status" onchange="applyFilters()">
            <option>All</option>
            <option>pending</option>
            <option>running</option>
            <option>completed</option>
          </select>
        </div>
        <div>
          <label>Priority</label>
          <select id="filter-priority" onchange="applyFilters()">
            <option>All</option>
            <option>Low</option>
            <option>Medium</option>
            <option>High</option>
          </select>
        </div>
      </div>
    </section>
    <section>
      <h2>Create Job</h2>
      <label>Task Name</label>
      <input id="create-task" placeholder="send-email" />
      <label>Payload JSON</label>
      <textarea id="create-payload" rows="3">{}</textarea>
      <label>Priority</label>
      <select id="create-priority">
        <option>Low</option>
        <option>Medium</option>
        <option>High</option>
      </select>
      <button onclick="createJob()">Create</button>
    </section>
    <section>
      <h2>Jobs</h2>
      <table>
        <thead>
          <tr><th>ID</th><th>Task</th><th>Priority</th><th>Status</th><th>Action</th></tr>
        </thead>
        <tbody id="jobs-body"></tbody>
      </table>
    </section>
    <section id="detail-panel" style="display:none">
      <h2 id="detail-title">Job Details</h2>
      <div><b>Task:</b> <span id="detail-task"></span></div>
      <div><b>Priority:</b> <span id="detail-priority"></span></div>
      <div><b>Status:</b> <span id="detail-status"></span></div>
      <div style="margin-top:8px"><b>Payload:</b></div>
      <pre id="detail-payload"></pre>
      <button class="close-btn" onclick="closeDetail()">Close</button>
    </section>
  </main>
  <script>
    let jobs = [];
    let statusFilter = "All";
    let priorityFilter = "All";
    let selectedId = null;

    async function loadJobs() {
      const res = await fetch("/jobs").catch(function () { return null; });
      if (!res || !res.ok) {
        alert("Cannot connect to backend");
        return;
      }
      jobs = await res.json();
      render();
    }

    function applyFilters() {
      statusFilter = document.getElementById("filter-status").value;
      priorityFilter = document.getElementById("filter-priority").value;
      render();
    }

    function matchesFilters(job, statusFilter, priorityFilter) {
      if (statusFilter !== "All" && job.status !== statusFilter) return false;
      if (priorityFilter !== "All" && job.priority !== priorityFilter) return false;
      return true;
    }

    function visibleJobs() {
      return jobs.filter(function (j) {
        return matchesFilters(j, statusFilter, priorityFilter);
      });
    }

    function render() {
      const body = document.getElementById("jobs-body");
      body.innerHTML = "";
      visibleJobs().forEach(function (j) {
        const tr = document.createElement("tr");
        tr.onclick = function () { selectJob(j.id); };

        [j.id, j.taskName, j.priority, j.status].forEach(function (value) {
          const td = document.createElement("td");
          td.textContent = value;
          tr.appendChild(td);
        });

        const action = document.createElement("td");
        const run = document.createElement("button");
        run.textContent = "Run";
        run.onclick = function (e) {
          e.stopPropagation();
          runJob(j.id);
        };
        action.appendChild(run);
        tr.appendChild(action);
        body.appendChild(tr);
      });
      renderDetail();
    }

    function selectJob(id) {
      selectedId = id;
      renderDetail();
    }

    function closeDetail() {
      selectedId = null;
      renderDetail();
    }

    function renderDetail() {
      const panel = document.getElementById("detail-panel");
      const job = jobs.find(function (j) { return j.id === selectedId; });
      if (!job) {
        panel.style.display = "none";
        return;
      }
      panel.style.display = "";
      document.getElementById("detail-title").textContent = "Job Details (ID: " + job.id + ")";
      document.getElementById("detail-task").textContent = job.taskName;
      document.getElementById("detail-priority").textContent = job.priority;
      document.getElementById("detail-status").textContent = job.status;
      let payload = job.payload;
      try { payload = JSON.stringify(JSON.parse(job.payload), null, 2); } catch (e) {}
      document.getElementById("detail-payload").textContent = payload;
    }

    async function createJob() {
      const taskName = document.getElementById("create-task").value;
      const payloadRaw = document.getElementById("create-payload").value;
      const priority = document.getElementById("create-priority").value;

      let payload;
      try {
        payload = JSON.parse(payloadRaw);
      } catch (e) {
        alert("Invalid JSON in payload");
        return;
      }

      if (!taskName.trim()) {
        alert("Task name is required");
        return;
      }

      const res = await fetch("/jobs", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({ taskName: taskName, payload: payload, priority: priority })
      }).catch(function () { return null; });

      if (!res || !res.ok) {
        alert("Failed to create job");
        return;
      }

      document.getElementById("create-task").value = "";
      document.getElementById("create-payload").value = "{}";
      loadJobs();
    }

    async function runJob(id) {
      const res = await fetch("/run-job/" + id, { method: "POST" })
        .catch(function () { return null; });
      if (!res || !res.ok) {
        alert("Failed to run job");
        return;
      }
      loadJobs();
    }

    loadJobs();
  </script>
</body>
</html>
"#;

pub async fn ui_index() -> Html<&'static str> {
    Html(UI_HTML)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub task_name: Option<String>,
    pub payload: Option<Value>,
    pub priority: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub id: i64,
}

pub async fn create_job(
    State(state): State<ApiState>,
    Json(body): Json<CreateJobRequest>,
) -> AppResult<Json<CreateJobResponse>> {
    let task_name = body.task_name.unwrap_or_default();
    if task_name.trim().is_empty() {
        return Err(AppError::Validation("taskName is required".into()));
    }

    // A JSON null payload deserializes to None and is rejected the same as
    // an absent field.
    let Some(payload) = body.payload else {
        return Err(AppError::Validation("payload is required".into()));
    };

    let priority = body.priority.unwrap_or_default();
    if priority.trim().is_empty() {
        return Err(AppError::Validation("priority is required".into()));
    }

    let id = state
        .jobs
        .create(NewJob {
            task_name,
            payload,
            priority,
        })
        .await?;

    Ok(Json(CreateJobResponse { id }))
}

pub async fn list_jobs(State(state): State<ApiState>) -> AppResult<Json<Vec<Job>>> {
    let jobs = state.jobs.list().await?;
    Ok(Json(jobs))
}

pub async fn get_job(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Job>> {
    let job = state
        .jobs
        .get(id)
        .await?
        .ok_or(AppError::NotFound { entity: "job", id })?;

    Ok(Json(job))
}

#[derive(Debug, Serialize)]
pub struct RunJobResponse {
    pub message: String,
}

pub async fn run_job(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RunJobResponse>> {
    state.runner.run(id).await?;

    Ok(Json(RunJobResponse {
        message: "Job started".into(),
    }))
}

pub async fn index() -> impl IntoResponse {
    (StatusCode::OK, "JobFlow API running")
}
