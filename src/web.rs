//! Request handling for the joystick web interface.
//!
//! The HTTP server itself belongs to the platform; it hands each request's method and URI to
//! [`Router::handle`] and writes back whatever [`Reply`] comes out.

use core::{
    fmt::{self, Write},
    num::IntErrorKind,
};

use crate::{ingress::CommandIngress, state::StateCell};

/// Joystick page. `%HOSTNAME%` and `%IPADDRESS%` are substituted when served.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Racer</title>
<style>
body{background:#1f2937;color:#f9fafb;font-family:system-ui,sans-serif;display:flex;justify-content:center;align-items:center;min-height:100vh;margin:0}
.pad{max-width:400px;width:100%;padding:20px}
#stick{position:relative;width:100%;padding-top:100%;border-radius:50%;background:#2d3748;touch-action:none}
#area{position:absolute;top:5%;left:5%;width:90%;height:90%}
#thumb{position:absolute;width:70px;height:70px;top:50%;left:50%;transform:translate(-50%,-50%);border-radius:50%;background:#4f46e5}
p{text-align:center}
</style>
</head>
<body>
<div class="pad">
<p>Device: <span id="host">%HOSTNAME%</span><br>IP: <span id="addr">%IPADDRESS%</span></p>
<div id="stick"><div id="area"><div id="thumb"></div></div></div>
<p>T: <span id="t">0</span> | S: <span id="s">0</span></p>
</div>
<script>
const DEADZONE=20;
const stick=document.getElementById('stick'),area=document.getElementById('area'),thumb=document.getElementById('thumb');
const base=document.getElementById('addr').textContent.startsWith('192.168.4.1')?'http://192.168.4.1':'';
let radius=area.clientWidth/2,dragging=false,timer=null,lastT=0,lastS=0;
function send(t,s){fetch(`${base}/control?t=${t}&s=${s}`).catch(()=>{});}
function update(x,y){
  const mag=Math.min(1,Math.hypot(x,y)/radius),ang=Math.atan2(y,x);
  let t=Math.round(mag*Math.sin(ang)*255),s=Math.round(mag*Math.cos(ang)*255);
  if(Math.abs(t)<DEADZONE)t=0;
  if(Math.abs(s)<DEADZONE)s=0;
  document.getElementById('t').textContent=t;
  document.getElementById('s').textContent=s;
  if(t!==lastT||s!==lastS){lastT=t;lastS=s;send(t,s);}
}
function move(e){
  if(!dragging)return;
  e.preventDefault();
  const p=e.touches?e.touches[0]:e,r=area.getBoundingClientRect();
  let x=p.clientX-r.left-radius,y=p.clientY-r.top-radius;
  const d=Math.hypot(x,y);
  if(d>radius){x*=radius/d;y*=radius/d;}
  thumb.style.left=`${radius+x}px`;thumb.style.top=`${radius+y}px`;
  update(x,-y);
}
function start(e){
  dragging=true;radius=area.clientWidth/2;move(e);
  clearInterval(timer);
  timer=setInterval(()=>send(lastT,lastS),100);
}
function stop(){
  dragging=false;clearInterval(timer);
  thumb.style.left='50%';thumb.style.top='50%';
  update(0,0);send(0,0);
}
area.addEventListener('mousedown',start);
document.addEventListener('mousemove',move);
document.addEventListener('mouseup',()=>{if(dragging)stop();});
area.addEventListener('touchstart',start);
document.addEventListener('touchmove',move,{passive:false});
stick.addEventListener('touchend',stop);
stop();
</script>
</body>
</html>
"#;

const HOSTNAME_PLACEHOLDER: &str = "%HOSTNAME%";
const ADDRESS_PLACEHOLDER: &str = "%IPADDRESS%";

pub type Hostname = heapless::String<24>;

/// Unique network name derived from the station MAC, e.g. `esp32c3-a0b1c2d3e4f5`.
pub fn hostname_from_mac(mac: [u8; 6]) -> Hostname {
    let mut name = Hostname::new();
    // 8 + 12 characters always fit
    let _ = name.push_str("esp32c3-");
    for byte in mac {
        let _ = write!(name, "{:02x}", byte);
    }
    name
}

/// What the index page shows about the device.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub hostname: Hostname,
    pub address: [u8; 4],
}

impl DeviceIdentity {
    pub fn new(hostname: Hostname, address: [u8; 4]) -> Self {
        Self { hostname, address }
    }
}

struct Dotted([u8; 4]);

impl fmt::Display for Dotted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

/// Write `template` to `w`, replacing the hostname and address placeholders.
pub fn render<W: Write>(w: &mut W, template: &str, identity: &DeviceIdentity) -> fmt::Result {
    let mut rest = template;
    while let Some(start) = rest.find('%') {
        let (head, tail) = rest.split_at(start);
        w.write_str(head)?;

        rest = if let Some(after) = tail.strip_prefix(HOSTNAME_PLACEHOLDER) {
            w.write_str(&identity.hostname)?;
            after
        } else if let Some(after) = tail.strip_prefix(ADDRESS_PLACEHOLDER) {
            write!(w, "{}", Dotted(identity.address))?;
            after
        } else {
            w.write_char('%')?;
            &tail[1..]
        };
    }
    w.write_str(rest)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Method {
    Get,
    Other,
}

/// Rejected control request. Motor state is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IngressError {
    Missing,
    Malformed,
}

impl fmt::Display for IngressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "Invalid arguments (Missing t or s)",
            Self::Malformed => "Invalid arguments (t and s must be integers)",
        })
    }
}

/// Extract the throttle and steering values from a `/control` query string.
///
/// `t`/`s` are the current names; `l`/`r` from the older interface are accepted as well.
pub fn parse_control(query: &str) -> Result<(i32, i32), IngressError> {
    let mut throttle = None;
    let mut steering = None;

    for param in query.split('&') {
        let mut parts = param.splitn(2, '=');
        if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
            match key {
                "t" | "l" => throttle = Some(value),
                "s" | "r" => steering = Some(value),
                _ => {}
            }
        }
    }

    match (throttle, steering) {
        (Some(t), Some(s)) => Ok((parse_speed(t)?, parse_speed(s)?)),
        _ => Err(IngressError::Missing),
    }
}

/// Integers beyond `i32` saturate; ingress clamps them like any other out-of-range value.
fn parse_speed(value: &str) -> Result<i32, IngressError> {
    value.parse::<i32>().or_else(|e| match e.kind() {
        IntErrorKind::PosOverflow => Ok(i32::MAX),
        IntErrorKind::NegOverflow => Ok(i32::MIN),
        _ => Err(IngressError::Malformed),
    })
}

/// Outcome of a request, ready to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    Index,
    Accepted,
    BadRequest(IngressError),
    NotFound,
    Unavailable,
}

impl Reply {
    pub fn status(&self) -> u16 {
        match self {
            Self::Index | Self::Accepted => 200,
            Self::BadRequest(_) => 400,
            Self::NotFound => 404,
            Self::Unavailable => 503,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Index => "text/html",
            _ => "text/plain",
        }
    }

    pub fn write_body<W: Write>(&self, w: &mut W, identity: &DeviceIdentity) -> fmt::Result {
        match self {
            Self::Index => render(w, INDEX_HTML, identity),
            Self::Accepted => w.write_str("OK"),
            Self::BadRequest(err) => write!(w, "{err}"),
            Self::NotFound => w.write_str("Not Found"),
            Self::Unavailable => w.write_str("Not ready"),
        }
    }
}

/// Routes `GET /` and `GET /control` onto the command ingress.
pub struct Router<'a> {
    ingress: CommandIngress<'a>,
    state: &'a StateCell,
}

impl<'a> Router<'a> {
    pub fn new(ingress: CommandIngress<'a>, state: &'a StateCell) -> Self {
        Self { ingress, state }
    }

    pub fn handle(&self, method: Method, uri: &str) -> Reply {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, query),
            None => (uri, ""),
        };

        match (method, path) {
            (Method::Get, "/") => Reply::Index,
            (Method::Get, "/control") => self.control(query),
            _ => Reply::NotFound,
        }
    }

    fn control(&self, query: &str) -> Reply {
        let state = self.state.get();
        if !state.accepts_commands() {
            log::warn!("control request while {}", state);
            return Reply::Unavailable;
        }

        match parse_control(query) {
            Ok((throttle, steering)) => {
                self.ingress.set_targets(throttle, steering);
                Reply::Accepted
            }
            Err(err) => {
                log::warn!("rejected control request: {}", err);
                Reply::BadRequest(err)
            }
        }
    }
}
