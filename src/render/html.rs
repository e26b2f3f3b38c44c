use crate::model::ReportData;

/// Render a self-contained HTML report (data embedded as JSON).
///
/// Important: we avoid `format!()` because the HTML contains many `{}` from CSS
/// rules and JS template literals, which would conflict with Rust formatting.
pub fn render_html_report(data: &ReportData) -> anyhow::Result<String> {
    // Player and target names end up inside <script>. No raw '<' may reach it;
    // '<' only occurs inside JSON strings, where \u003c is equivalent.
    let json = serde_json::to_string(data)?.replace('<', "\\u003c");
    let empty_attr = if data.fights.is_empty() { "" } else { " hidden" };

    const TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=1200">
<title>Raid Threat Report</title>
<style>
  * { margin: 0; padding: 0; box-sizing: border-box; }
  body { background: #0f1419; color: #e6edf3; font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; }
  .container { max-width: 1200px; margin: 0 auto; padding: 32px 44px 48px; }
  header { display: flex; justify-content: space-between; align-items: flex-end; margin-bottom: 20px; }
  .title { font-size: 32px; font-weight: 700; color: #f0f6fc; letter-spacing: 1px; }
  .subtitle { margin-top: 6px; color: #8b949e; font-size: 13px; }
  .stats-row { display: flex; gap: 16px; margin-bottom: 20px; }
  .stat-card { flex: 1; background: rgba(22,27,34,.7); border: 1px solid rgba(48,54,61,.6); border-radius: 12px; padding: 14px 18px; }
  .stat-label { font-size: 10px; color: #6e7681; text-transform: uppercase; letter-spacing: 1.5px; margin-bottom: 6px; }
  .stat-value { font-size: 26px; font-weight: 700; color: #f0f6fc; }
  .panel { background: rgba(22,27,34,.6); border: 1px solid rgba(48,54,61,.5); border-radius: 12px; padding: 16px; margin-bottom: 16px; }
  .panel-header { display: flex; justify-content: space-between; align-items: baseline; margin-bottom: 10px; gap: 20px; }
  .panel h3 { font-size: 18px; color: #f0f6fc; }
  .meta { font-size: 12px; color: #8b949e; white-space: nowrap; }
  .review { color: #facc15; }
  .kill { color: #4ade80; }
  table { width: 100%; border-collapse: collapse; }
  th, td { padding: 8px 10px; text-align: left; border-bottom: 1px solid rgba(110,118,129,.25); font-size: 13px; }
  th { font-size: 11px; color: #8b949e; text-transform: uppercase; letter-spacing: 1px; }
  .num { text-align: right; font-variant-numeric: tabular-nums; }
  .badge { display: inline-block; padding: 2px 8px; border-radius: 999px; font-size: 11px; border: 1px solid transparent; }
  .badge.tank { color: #fca5a5; border-color: rgba(248,113,113,.5); }
  .badge.healer { color: #86efac; border-color: rgba(34,197,94,.5); }
  .badge.dps { color: #93c5fd; border-color: rgba(59,130,246,.5); }
  .empty { padding: 24px; text-align: center; color: #8b949e; font-size: 15px; }
  .footnote { margin-top: 8px; color: #6e7681; font-size: 12px; line-height: 1.5; }
</style>
</head>
<body>
<div class="container">
  <header>
    <div>
      <div class="title">Raid Threat Report</div>
      <div class="subtitle" id="subtitle"></div>
    </div>
  </header>

  <div class="stats-row" id="stats"></div>

  <p class="panel empty" id="empty"__EMPTY_ATTR__>No qualifying fights were found.</p>

  <section class="panel" id="summaryPanel">
    <div class="panel-header"><h3>Raid Summary</h3></div>
    <table>
      <thead><tr><th>Player</th><th>Role</th><th class="num">Fights</th><th class="num">Threat Done</th><th class="num">TPS</th><th class="num">Avg Top %</th><th class="num">Heals</th><th class="num">Taunts</th></tr></thead>
      <tbody id="summaryBody"></tbody>
    </table>
    <p class="footnote" id="notes"></p>
  </section>

  <div id="fights"></div>
</div>

<script>
// Embedded report data (JSON object literal)
const DATA = __DATA__;

const ROLE_LABELS = { tank: "Tank", healer: "Healer", dps: "DPS" };

function fmt(x, digits = 1) {
  return Number(x).toLocaleString("en-US", { minimumFractionDigits: digits, maximumFractionDigits: digits });
}

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function badge(role) {
  return `<span class="badge ${role}">${ROLE_LABELS[role] || role}</span>`;
}

function renderHeader() {
  const guilds = DATA.guilds.length ? ` • guild-filtered (${DATA.guilds.map(escapeHtml).join(", ")})` : "";
  document.getElementById("subtitle").innerHTML = escapeHtml(DATA.raid.name) + guilds;

  const t = DATA.totals;
  document.getElementById("stats").innerHTML = [
    ["Fights", t.fights],
    ["Targets", t.targets],
    ["Threat Snapshots", t.snapshots.toLocaleString("en-US")],
    ["Players Seen", t.players],
  ].map(([label, value]) =>
    `<div class="stat-card"><div class="stat-label">${label}</div><div class="stat-value">${value}</div></div>`
  ).join("");
}

function renderSummary() {
  const panel = document.getElementById("summaryPanel");
  if (!DATA.raid_summary.length) {
    panel.style.display = "none";
    return;
  }
  document.getElementById("summaryBody").innerHTML = DATA.raid_summary.map(r => `
    <tr>
      <td>${escapeHtml(r.player)}</td>
      <td>${badge(r.role)}</td>
      <td class="num">${r.fights}</td>
      <td class="num">${fmt(r.threat_done)}</td>
      <td class="num">${fmt(r.tps)}</td>
      <td class="num">${fmt(r.average_top_percent)}%</td>
      <td class="num">${r.heals}</td>
      <td class="num">${r.taunts}</td>
    </tr>`).join("");

  const d = DATA.diagnostics;
  const notes = [
    `Input files: ${DATA.source_files.map(escapeHtml).join(", ") || "none"}.`,
    `Fights split when snapshots pause for more than ${fmt(DATA.thresholds.gap_seconds, 0)}s; ` +
      `kept when at least ${fmt(DATA.thresholds.min_duration, 0)}s long with ${DATA.thresholds.min_snapshots}+ snapshots.`,
  ];
  if (d.malformed_lines || d.dropped_entries) {
    notes.push(`Skipped ${d.malformed_lines} malformed line(s) and ${d.dropped_entries} bad entr(ies).`);
  }
  if (d.fights_needing_review) {
    notes.push(`${d.fights_needing_review} fight(s) mixed several targets and should be checked by hand.`);
  }
  document.getElementById("notes").innerHTML = notes.join("<br>");
}

function renderFights() {
  const root = document.getElementById("fights");
  root.innerHTML = DATA.fights.map(s => {
    const f = s.fight;
    const rows = s.ranking_order.map(name => {
      const p = s.player_stats[name];
      return `
        <tr>
          <td class="num">${p.rank}</td>
          <td>${escapeHtml(name)}</td>
          <td>${badge(p.role)}</td>
          <td class="num">${fmt(p.peak_threat)}</td>
          <td class="num">${fmt(p.average_threat)}</td>
          <td class="num">${fmt(p.threat_share * 100)}%</td>
          <td class="num">${fmt(p.threat_done)}</td>
          <td class="num">${fmt(p.tps)}</td>
          <td class="num">${fmt(p.average_top_percent)}%</td>
          <td class="num">${p.samples_seen}</td>
        </tr>`;
    }).join("");
    const outcome = f.outcome === "kill" ? ` • <span class="kill">kill</span>` : "";
    const review = f.needs_review ? ` • <span class="review">mixed targets</span>` : "";
    return `
      <section class="panel">
        <div class="panel-header">
          <h3>${f.id}. ${escapeHtml(f.target_name)}</h3>
          <div class="meta">${fmt(f.duration)}s • ${f.snapshots} snapshots${outcome}${review}</div>
        </div>
        <table>
          <thead><tr><th class="num">#</th><th>Player</th><th>Role</th><th class="num">Peak</th><th class="num">Average</th><th class="num">Share</th><th class="num">Threat Done</th><th class="num">TPS</th><th class="num">Avg Top %</th><th class="num">Samples</th></tr></thead>
          <tbody>${rows}</tbody>
        </table>
      </section>`;
  }).join("");
}

renderHeader();
renderSummary();
renderFights();
</script>
</body>
</html>
"#;

    Ok(TEMPLATE
        .replace("__EMPTY_ATTR__", empty_attr)
        .replace("__DATA__", &json))
}
