//! Live chart page
//!
//! Polls `/metrics` every 30 ms and keeps the last 300 samples per series.
//! Solid lines are band levels, dashed lines thresholds, dotted lines noise
//! floors; a marker is drawn wherever a band fired.

/// HTML served on every path except `/metrics`
pub const CHART_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>BandSense</title>
<style>
  body { margin: 0; background: #111; color: #ddd; font: 13px sans-serif; }
  header { padding: 8px 12px; display: flex; gap: 18px; align-items: center; }
  .low { color: #ff7043; } .high { color: #4fc3f7; }
  canvas { display: block; width: 100vw; height: calc(100vh - 40px); }
</style>
</head>
<body>
<header>
  <strong>BandSense</strong>
  <span class="low">low <span id="low">-</span></span>
  <span class="high">high <span id="high">-</span></span>
  <span id="status"></span>
</header>
<canvas id="chart"></canvas>
<script>
const POINTS = 300;
const POLL_MS = 30;
const MIN_DB = -100, MAX_DB = 0;
const series = {
  LowEnvDb: [], HighEnvDb: [], LowNoiseDb: [], HighNoiseDb: [],
  LowThresholdDb: [], HighThresholdDb: [], LowTriggered: [], HighTriggered: []
};
const canvas = document.getElementById('chart');
const ctx = canvas.getContext('2d');

function push(name, value) {
  const s = series[name];
  s.push(value);
  if (s.length > POINTS) s.shift();
}

function y(db) {
  const clamped = Math.max(MIN_DB, Math.min(MAX_DB, db));
  return canvas.height * (MAX_DB - clamped) / (MAX_DB - MIN_DB);
}

function line(name, color, dash) {
  const s = series[name];
  const step = canvas.width / (POINTS - 1);
  ctx.strokeStyle = color;
  ctx.setLineDash(dash);
  ctx.beginPath();
  s.forEach((v, i) => {
    const px = (POINTS - s.length + i) * step;
    if (i === 0) ctx.moveTo(px, y(v)); else ctx.lineTo(px, y(v));
  });
  ctx.stroke();
}

function markers(name, color, row) {
  const s = series[name];
  const step = canvas.width / (POINTS - 1);
  ctx.fillStyle = color;
  s.forEach((v, i) => {
    if (v) ctx.fillRect((POINTS - s.length + i) * step - 2, row, 4, 10);
  });
}

function draw() {
  canvas.width = canvas.clientWidth;
  canvas.height = canvas.clientHeight;
  ctx.clearRect(0, 0, canvas.width, canvas.height);
  ctx.strokeStyle = '#333';
  ctx.setLineDash([]);
  ctx.fillStyle = '#666';
  for (let db = MIN_DB; db <= MAX_DB; db += 20) {
    ctx.beginPath();
    ctx.moveTo(0, y(db));
    ctx.lineTo(canvas.width, y(db));
    ctx.stroke();
    ctx.fillText(db + ' dB', 4, y(db) - 2);
  }
  line('LowEnvDb', '#ff7043', []);
  line('LowThresholdDb', '#ff7043', [6, 4]);
  line('LowNoiseDb', '#ff7043', [1, 3]);
  line('HighEnvDb', '#4fc3f7', []);
  line('HighThresholdDb', '#4fc3f7', [6, 4]);
  line('HighNoiseDb', '#4fc3f7', [1, 3]);
  markers('LowTriggered', '#ff7043', 4);
  markers('HighTriggered', '#4fc3f7', 16);
}

async function poll() {
  try {
    const res = await fetch('/metrics', { cache: 'no-store' });
    const m = await res.json();
    for (const name of Object.keys(series)) push(name, m[name]);
    document.getElementById('low').textContent =
      m.LowEnvDb.toFixed(1) + ' / ' + m.LowThresholdDb.toFixed(1) + ' dB';
    document.getElementById('high').textContent =
      m.HighEnvDb.toFixed(1) + ' / ' + m.HighThresholdDb.toFixed(1) + ' dB';
    document.getElementById('status').textContent = m.Timestamp;
    draw();
  } catch (e) {
    document.getElementById('status').textContent = 'disconnected';
  }
  setTimeout(poll, POLL_MS);
}

poll();
</script>
</body>
</html>
"#;
