use std::sync::{Arc, Mutex, MutexGuard};

use colored::*;
use serde::Serialize;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::config::{PresentationConfig, SizerConfig};
use crate::engine::compute;
use crate::error::{Result, ToggleError};
use crate::share::{overlay, overlay_verbatim, parse_query, share_url, to_query};
use crate::toggles::{now_ms, ToggleList};
use crate::validate::{Field, RawInputs};

/// Toggle list shared by all connections for the lifetime of the server.
pub type ToggleStore = Arc<Mutex<ToggleList>>;

pub fn new_toggle_store() -> ToggleStore {
    Arc::new(Mutex::new(ToggleList::new()))
}

/// Single-page calculator. `{{...}}` placeholders are filled by [`render_index`].
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en" data-theme="{{THEME}}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{TITLE}}</title>
<style>
*{margin:0;padding:0;box-sizing:border-box}
:root{--bg:#0d1117;--panel:#161b22;--line:#21262d;--fg:#c9d1d9;--dim:#8b949e;--accent:#58a6ff;--bad:#f85149;--good:#3fb950}
[data-theme=light]{--bg:#ffffff;--panel:#f6f8fa;--line:#d0d7de;--fg:#1f2328;--dim:#656d76;--accent:#0969da;--bad:#cf222e;--good:#1a7f37}
body{background:var(--bg);color:var(--fg);font-family:'Cascadia Code','Fira Code',monospace;min-height:100vh}
header{padding:16px 24px;border-bottom:1px solid var(--line)}
header h1{font-size:1.2rem;color:var(--accent)}
header p{font-size:.8rem;color:var(--dim);margin-top:4px}
main{display:grid;grid-template-columns:minmax(280px,1fr) minmax(280px,1fr);gap:16px;padding:16px 24px}
section{background:var(--panel);border:1px solid var(--line);border-radius:6px;padding:14px 16px}
h2{font-size:.75rem;color:var(--dim);text-transform:uppercase;letter-spacing:.5px;margin-bottom:10px}
.field{display:flex;flex-direction:column;gap:3px;margin-bottom:10px}
.field label{font-size:.7rem;color:var(--dim);text-transform:uppercase;letter-spacing:.5px;cursor:help}
.field input{background:var(--bg);border:1px solid var(--line);color:var(--fg);padding:6px 10px;border-radius:6px;font-family:inherit}
.field input.invalid{border-color:var(--bad)}
.err{font-size:.72rem;color:var(--bad);min-height:1em}
#global-error{color:var(--bad);font-size:.8rem;margin:6px 0}
.btn{border:none;padding:6px 14px;border-radius:6px;font-family:inherit;font-size:.8rem;cursor:pointer;color:#fff;background:#30363d}
.btn-go{background:#238636}
.val{font-size:1.4rem;font-weight:bold}
.row{display:flex;justify-content:space-between;padding:4px 0;border-bottom:1px dashed var(--line);font-size:.85rem}
#toggles{grid-column:1/3}
.tg{display:grid;grid-template-columns:2fr 3fr auto 2fr auto;gap:10px;align-items:center;padding:6px 0;border-bottom:1px solid var(--line);font-size:.8rem}
.tg .desc{color:var(--dim)}
#share-url{font-size:.7rem;color:var(--dim);word-break:break-all;margin-top:8px}
</style>
</head>
<body>
<header>
  <h1>{{TITLE}}</h1>
  <p>{{SUBTITLE}}</p>
</header>
<main>
<section id="inputs">
  <h2>Assumptions</h2>
  <div class="field"><label for="baselineRatePct" title="Current conversion rate of the control arm">Baseline conversion rate (%)</label><input id="baselineRatePct" value="{{baselineRatePct}}"><span class="err" id="err-baselineRatePct"></span></div>
  <div class="field"><label for="upliftPct" title="Relative improvement you want to be able to detect">Minimum detectable uplift (%)</label><input id="upliftPct" value="{{upliftPct}}"><span class="err" id="err-upliftPct"></span></div>
  <div class="field"><label for="significancePct" title="Tolerated false-positive rate (two-sided)">Significance level α (%)</label><input id="significancePct" value="{{significancePct}}"><span class="err" id="err-significancePct"></span></div>
  <div class="field"><label for="powerPct" title="Probability of detecting a true effect of this size">Statistical power (%)</label><input id="powerPct" value="{{powerPct}}"><span class="err" id="err-powerPct"></span></div>
  <div class="field"><label for="dailyVisitors" title="Eligible users per day across both arms">Daily visitors</label><input id="dailyVisitors" value="{{dailyVisitors}}"><span class="err" id="err-dailyVisitors"></span></div>
  <div class="field"><label for="variantTrafficPct" title="Share of traffic sent to the variant">Variant traffic (%)</label><input id="variantTrafficPct" value="{{variantTrafficPct}}"><span class="err" id="err-variantTrafficPct"></span></div>
  <button class="btn" id="btn-reset">Reset to defaults</button>
  <button class="btn btn-go" id="btn-share">Copy share link</button>
  <div id="share-url"></div>
</section>
<section id="results">
  <h2>Result</h2>
  <div id="global-error"></div>
  <div class="row"><span>Sample size per group</span><span class="val" id="r-per-group">–</span></div>
  <div class="row"><span>Total sample size</span><span id="r-total">–</span></div>
  <div class="row"><span>Estimated duration</span><span class="val" id="r-days">–</span></div>
  <div class="row"><span>Expected variant rate</span><span id="r-rate">–</span></div>
</section>
<section id="toggles" style="display:{{TOGGLES_DISPLAY}}">
  <h2>Feature toggles</h2>
  <div class="field"><input id="tg-name" placeholder="Toggle name"><input id="tg-desc" placeholder="Description"></div>
  <button class="btn btn-go" id="btn-tg-add">Add toggle</button>
  <div id="tg-list"></div>
  <div class="err" id="tg-error"></div>
</section>
</main>
<script>
const FIELDS=['baselineRatePct','upliftPct','significancePct','powerPct','dailyVisitors','variantTrafficPct'];
const $=s=>document.querySelector(s);
const fmt=n=>n===null?'unbounded':Number(n).toLocaleString('en-US');
function query(){return FIELDS.map(f=>f+'='+encodeURIComponent($('#'+f).value)).join('&');}
async function recalc(){
  const q=query();
  history.replaceState(null,'','?'+q);
  const res=await fetch('/api/compute?'+q);
  const c=await res.json();
  FIELDS.forEach(f=>{const m=(c.errors||{})[f]||'';$('#err-'+f).textContent=m;$('#'+f).classList.toggle('invalid',!!m);});
  $('#global-error').textContent=c.globalError||'';
  const r=c.result;
  $('#r-per-group').textContent=r?fmt(r.sampleSizePerGroup):'–';
  $('#r-total').textContent=r?fmt(r.totalSampleSize):'–';
  $('#r-days').textContent=r?(r.durationDays===null?'unbounded':fmt(r.durationDays)+' days'):'–';
  $('#r-rate').textContent=r?(r.expectedVariantRate*100).toFixed(2)+'%':'–';
}
FIELDS.forEach(f=>$('#'+f).addEventListener('input',recalc));
$('#btn-reset').onclick=async()=>{const d=await (await fetch('/api/defaults')).json();FIELDS.forEach(f=>$('#'+f).value=d[f]);recalc();};
$('#btn-share').onclick=async()=>{const s=await (await fetch('/api/share?'+query())).json();$('#share-url').textContent=s.url;try{await navigator.clipboard.writeText(s.url);}catch(e){}};
function drawToggles(list){
  $('#tg-list').innerHTML='';
  list.forEach(t=>{
    const row=document.createElement('div');row.className='tg';
    const name=document.createElement('span');name.textContent=t.name;
    const desc=document.createElement('span');desc.className='desc';desc.textContent=t.description;desc.title='Double-click to edit';
    desc.ondblclick=()=>{const d=prompt('Description',t.description);if(d!==null)tg('describe','id='+encodeURIComponent(t.id)+'&description='+encodeURIComponent(d));};
    const on=document.createElement('input');on.type='checkbox';on.checked=t.enabled;
    on.onchange=()=>tg('toggle','id='+encodeURIComponent(t.id));
    const roll=document.createElement('input');roll.type='range';roll.min=0;roll.max=100;roll.value=t.rollout;roll.title=t.rollout+'%';
    roll.onchange=()=>tg('rollout','id='+encodeURIComponent(t.id)+'&value='+roll.value);
    const del=document.createElement('button');del.className='btn';del.textContent='Delete';
    del.onclick=()=>tg('remove','id='+encodeURIComponent(t.id));
    row.append(name,desc,on,roll,del);$('#tg-list').append(row);
  });
}
async function tg(op,q){
  const res=await fetch('/api/toggles/'+op+'?'+q);const body=await res.json();
  if(!res.ok){$('#tg-error').textContent=body.error;return;}
  $('#tg-error').textContent='';drawToggles(body);
}
$('#btn-tg-add').onclick=()=>{tg('add','name='+encodeURIComponent($('#tg-name').value)+'&description='+encodeURIComponent($('#tg-desc').value));$('#tg-name').value='';$('#tg-desc').value='';};
fetch('/api/toggles').then(r=>r.json()).then(drawToggles);
recalc();
</script>
</body>
</html>"##;

/// Escape text for safe inclusion in HTML content and attribute values.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Fill the page template with presentation settings and initial input values.
pub fn render_index(presentation: &PresentationConfig, inputs: &RawInputs) -> String {
    let mut html = INDEX_HTML
        .replace("{{TITLE}}", &html_escape(&presentation.title))
        .replace("{{SUBTITLE}}", &html_escape(&presentation.subtitle))
        .replace("{{THEME}}", presentation.theme.as_str())
        .replace(
            "{{TOGGLES_DISPLAY}}",
            if presentation.show_toggles { "block" } else { "none" },
        );
    for field in Field::ALL {
        html = html.replace(&format!("{{{{{}}}}}", field.key()), &html_escape(inputs.get(field)));
    }
    html
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    fn html(body: String) -> Self {
        Self { status: 200, content_type: "text/html; charset=utf-8", body }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, content_type: "application/json", body },
            Err(e) => Self::error(500, &e.to_string()),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: json!({ "error": message }).to_string(),
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            _ => "Internal Server Error",
        }
    }

    /// Full HTTP/1.1 response bytes.
    pub fn to_http(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n{}",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len(),
            self.body,
        )
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

fn lock(store: &ToggleStore) -> MutexGuard<'_, ToggleList> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Build the next list from the current one and swap it in.
fn mutate_toggles(
    store: &ToggleStore,
    op: impl FnOnce(&ToggleList) -> std::result::Result<ToggleList, ToggleError>,
) -> HttpResponse {
    let mut guard = lock(store);
    match op(&guard) {
        Ok(next) => {
            *guard = next;
            HttpResponse::json(200, &*guard)
        }
        Err(e) => HttpResponse::error(400, &e.to_string()),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "1" | "on" => Some(true),
        "false" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Dispatch one request. Pure apart from toggle-store mutation, so it can be
/// exercised without a socket.
pub fn route(method: &str, target: &str, cfg: &SizerConfig, store: &ToggleStore) -> HttpResponse {
    if method != "GET" {
        return HttpResponse::error(405, "only GET is supported");
    }
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let params = parse_query(query);
    let param = |key: &str| params.get(key).map(String::as_str).unwrap_or("");

    match path {
        // Loading a link: blank values fall back to the configured defaults.
        "/" | "/index.html" => {
            let raw = overlay(cfg.defaults.resolve(), &params);
            HttpResponse::html(render_index(&cfg.presentation, &raw))
        }
        // Page state: present values are taken as typed, blank included.
        "/api/compute" => match compute(&overlay_verbatim(cfg.defaults.resolve(), &params)) {
            Ok(computation) => HttpResponse::json(200, &computation),
            Err(e) => {
                warn!(error = %e, "compute failed");
                HttpResponse::error(500, &e.to_string())
            }
        },
        "/api/defaults" => HttpResponse::json(200, &cfg.defaults.resolve()),
        "/api/share" => {
            let raw = overlay_verbatim(cfg.defaults.resolve(), &params);
            HttpResponse::json(
                200,
                &json!({ "query": to_query(&raw), "url": share_url(&cfg.server.base_url(), &raw) }),
            )
        }
        "/api/toggles" => HttpResponse::json(200, &*lock(store)),
        "/api/toggles/add" => mutate_toggles(store, |list| {
            list.with_added(param("name"), param("description"), now_ms())
        }),
        "/api/toggles/enable" => match parse_bool(param("enabled")) {
            Some(enabled) => mutate_toggles(store, |list| list.with_enabled(param("id"), enabled)),
            None => HttpResponse::error(400, "enabled must be true or false"),
        },
        "/api/toggles/toggle" => mutate_toggles(store, |list| list.with_toggled(param("id"))),
        "/api/toggles/describe" => mutate_toggles(store, |list| {
            list.with_description(param("id"), param("description"))
        }),
        "/api/toggles/rollout" => match param("value").trim().parse::<u32>() {
            Ok(value) => mutate_toggles(store, |list| list.with_rollout(param("id"), value)),
            Err(_) => HttpResponse::error(400, "rollout must be a whole number between 0 and 100"),
        },
        "/api/toggles/remove" => mutate_toggles(store, |list| list.with_removed(param("id"))),
        _ => HttpResponse::error(404, "not found"),
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Start the web server and serve until the process is stopped.
pub async fn serve(cfg: SizerConfig) -> Result<()> {
    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = TcpListener::bind(&addr).await?;

    eprintln!(
        "{}",
        format!("  Calculator running at {}", cfg.server.base_url()).bright_green()
    );
    eprintln!("{}", "  Press Ctrl+C to stop.".bright_blue());
    info!(%addr, "web server listening");

    let cfg = Arc::new(cfg);
    let store = new_toggle_store();

    loop {
        let (stream, peer) = listener.accept().await?;
        let cfg = Arc::clone(&cfg);
        let store = store.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, &cfg, &store).await {
                warn!(%peer, error = %e, "connection error");
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, cfg: &SizerConfig, store: &ToggleStore) -> Result<()> {
    let mut buf = vec![0u8; 8192];
    let n = stream.read(&mut buf).await?;

    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut req = httparse::Request::new(&mut headers);
    let response = match req.parse(&buf[..n]) {
        Ok(_) => match (req.method, req.path) {
            (Some(method), Some(target)) => {
                debug!(method, path = target, "request");
                route(method, target, cfg, store)
            }
            _ => HttpResponse::error(400, "incomplete request line"),
        },
        Err(e) => HttpResponse::error(400, &e.to_string()),
    };

    stream.write_all(response.to_http().as_bytes()).await?;
    Ok(())
}
