//! Local remediations
//!
//! One variant per remediable feature. `Fallback::for_feature` matches on
//! every [`Feature`] without a wildcard, so adding a feature without deciding
//! its fallback does not compile.

use crate::detection::Feature;

/// Inline script implementation of a missing API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsShim {
    Fetch,
    Promises,
    IntersectionObserver,
    ObjectAssign,
    ArrayFrom,
    ArrayIncludes,
    Symbol,
    UrlSearchParams,
    CustomEvent,
    AbortController,
    ResizeObserver,
    RequestAnimationFrame,
}

impl JsShim {
    /// Global paths the shim defines
    pub fn provides(&self) -> &'static [&'static str] {
        match self {
            Self::Fetch => &["fetch"],
            Self::Promises => &["Promise"],
            Self::IntersectionObserver => &["IntersectionObserver"],
            Self::ObjectAssign => &["Object.assign"],
            Self::ArrayFrom => &["Array.from"],
            Self::ArrayIncludes => &["Array.prototype.includes"],
            Self::Symbol => &["Symbol"],
            Self::UrlSearchParams => &["URLSearchParams"],
            Self::CustomEvent => &["CustomEvent"],
            Self::AbortController => &["AbortController", "AbortSignal"],
            Self::ResizeObserver => &["ResizeObserver"],
            Self::RequestAnimationFrame => &["requestAnimationFrame", "cancelAnimationFrame"],
        }
    }

    fn body(&self) -> &'static str {
        match self {
            Self::Fetch => {
                r#"(function (w) {
  if (w.fetch) return;
  w.fetch = function (url, opts) {
    opts = opts || {};
    return new Promise(function (resolve, reject) {
      var xhr = new XMLHttpRequest();
      xhr.open(opts.method || 'GET', url, true);
      var headers = opts.headers || {};
      Object.keys(headers).forEach(function (k) { xhr.setRequestHeader(k, headers[k]); });
      xhr.onload = function () {
        resolve({
          ok: xhr.status >= 200 && xhr.status < 300,
          status: xhr.status,
          text: function () { return Promise.resolve(xhr.responseText); },
          json: function () { return Promise.resolve(JSON.parse(xhr.responseText)); }
        });
      };
      xhr.onerror = function () { reject(new TypeError('Network request failed')); };
      xhr.send(opts.body || null);
    });
  };
})(window);"#
            }
            Self::Promises => {
                r#"(function (w) {
  if (w.Promise) return;
  function P(fn) {
    var self = this; self._s = 0; self._v = undefined; self._q = [];
    function settle(s, v) {
      if (self._s) return; self._s = s; self._v = v;
      self._q.forEach(function (h) { h(); });
    }
    try { fn(function (v) { settle(1, v); }, function (e) { settle(2, e); }); }
    catch (e) { settle(2, e); }
  }
  P.prototype.then = function (ok, ko) {
    var self = this;
    return new P(function (resolve, reject) {
      function run() {
        setTimeout(function () {
          var cb = self._s === 1 ? ok : ko;
          if (typeof cb !== 'function') { (self._s === 1 ? resolve : reject)(self._v); return; }
          try {
            var r = cb(self._v);
            if (r && typeof r.then === 'function') r.then(resolve, reject); else resolve(r);
          } catch (e) { reject(e); }
        }, 0);
      }
      if (self._s) run(); else self._q.push(run);
    });
  };
  P.prototype['catch'] = function (ko) { return this.then(null, ko); };
  P.resolve = function (v) { return new P(function (r) { r(v); }); };
  P.reject = function (e) { return new P(function (_, r) { r(e); }); };
  w.Promise = P;
})(window);"#
            }
            Self::IntersectionObserver => {
                r#"(function (w) {
  if (w.IntersectionObserver) return;
  function IO(cb) { this._cb = cb; }
  IO.prototype.observe = function (el) {
    var self = this;
    setTimeout(function () {
      self._cb([{ target: el, isIntersecting: true, intersectionRatio: 1 }], self);
    }, 0);
  };
  IO.prototype.unobserve = function () {};
  IO.prototype.disconnect = function () {};
  w.IntersectionObserver = IO;
})(window);"#
            }
            Self::ObjectAssign => {
                r#"if (!Object.assign) {
  Object.assign = function (target) {
    var to = Object(target);
    for (var i = 1; i < arguments.length; i++) {
      var src = arguments[i];
      if (src == null) continue;
      for (var k in src) if (Object.prototype.hasOwnProperty.call(src, k)) to[k] = src[k];
    }
    return to;
  };
}"#
            }
            Self::ArrayFrom => {
                r#"if (!Array.from) {
  Array.from = function (items, mapFn) {
    var out = [];
    for (var i = 0; i < items.length; i++) out.push(mapFn ? mapFn(items[i], i) : items[i]);
    return out;
  };
}"#
            }
            Self::ArrayIncludes => {
                r#"if (!Array.prototype.includes) {
  Array.prototype.includes = function (value) {
    for (var i = 0; i < this.length; i++) {
      if (this[i] === value || (value !== value && this[i] !== this[i])) return true;
    }
    return false;
  };
}"#
            }
            Self::Symbol => {
                r#"(function (w) {
  if (w.Symbol) return;
  var n = 0;
  w.Symbol = function (desc) { return '@@' + (desc || '') + ':' + (n++); };
  w.Symbol.iterator = '@@iterator';
})(window);"#
            }
            Self::UrlSearchParams => {
                r#"(function (w) {
  if (w.URLSearchParams) return;
  function USP(q) {
    this._p = [];
    (q || '').replace(/^\?/, '').split('&').forEach(function (pair) {
      if (!pair) return;
      var kv = pair.split('=');
      this._p.push([decodeURIComponent(kv[0]), decodeURIComponent(kv[1] || '')]);
    }, this);
  }
  USP.prototype.get = function (k) {
    for (var i = 0; i < this._p.length; i++) if (this._p[i][0] === k) return this._p[i][1];
    return null;
  };
  USP.prototype.append = function (k, v) { this._p.push([k, String(v)]); };
  USP.prototype.toString = function () {
    return this._p.map(function (p) {
      return encodeURIComponent(p[0]) + '=' + encodeURIComponent(p[1]);
    }).join('&');
  };
  w.URLSearchParams = USP;
})(window);"#
            }
            Self::CustomEvent => {
                r#"(function (w) {
  if (typeof w.CustomEvent === 'function') return;
  function CE(type, params) {
    params = params || {};
    var ev = document.createEvent('CustomEvent');
    ev.initCustomEvent(type, !!params.bubbles, !!params.cancelable, params.detail);
    return ev;
  }
  w.CustomEvent = CE;
})(window);"#
            }
            Self::AbortController => {
                r#"(function (w) {
  if (w.AbortController) return;
  function AbortSignal() { this.aborted = false; this.onabort = null; }
  function AbortController() { this.signal = new AbortSignal(); }
  AbortController.prototype.abort = function () {
    if (this.signal.aborted) return;
    this.signal.aborted = true;
    if (typeof this.signal.onabort === 'function') this.signal.onabort();
  };
  w.AbortSignal = AbortSignal;
  w.AbortController = AbortController;
})(window);"#
            }
            Self::ResizeObserver => {
                r#"(function (w) {
  if (w.ResizeObserver) return;
  function RO(cb) { this._cb = cb; this._els = []; var self = this;
    this._h = function () {
      self._cb(self._els.map(function (el) {
        return { target: el, contentRect: el.getBoundingClientRect() };
      }), self);
    };
  }
  RO.prototype.observe = function (el) {
    if (!this._els.length) w.addEventListener('resize', this._h);
    this._els.push(el);
  };
  RO.prototype.unobserve = function (el) {
    this._els = this._els.filter(function (e) { return e !== el; });
  };
  RO.prototype.disconnect = function () {
    this._els = []; w.removeEventListener('resize', this._h);
  };
  w.ResizeObserver = RO;
})(window);"#
            }
            Self::RequestAnimationFrame => {
                r#"(function (w) {
  if (w.requestAnimationFrame) return;
  var last = 0;
  w.requestAnimationFrame = function (cb) {
    var now = Date.now(), wait = Math.max(0, 16 - (now - last));
    last = now + wait;
    return setTimeout(function () { cb(last); }, wait);
  };
  w.cancelAnimationFrame = function (id) { clearTimeout(id); };
})(window);"#
            }
        }
    }

    /// Full inline source, headed by the `provides` banner
    pub fn source(&self) -> String {
        format!("/*! provides: {} */\n{}\n", self.provides().join(" "), self.body())
    }
}

/// Fallback style rules for a missing style capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CssFallback {
    CssGrid,
    FlexGap,
    CustomProperties,
    ObjectFit,
    StickyPosition,
    AspectRatio,
    ClampFunction,
    BackdropFilter,
}

impl CssFallback {
    /// Condition that holds when the capability is native
    pub fn supports_condition(&self) -> &'static str {
        match self {
            Self::CssGrid => "(display: grid)",
            Self::FlexGap => "(gap: 1px)",
            Self::CustomProperties => "(--compat-probe: 0)",
            Self::ObjectFit => "(object-fit: cover)",
            Self::StickyPosition => "(position: sticky)",
            Self::AspectRatio => "(aspect-ratio: 1 / 1)",
            Self::ClampFunction => "(width: clamp(1px, 2px, 3px))",
            Self::BackdropFilter => "(backdrop-filter: blur(1px))",
        }
    }

    /// Unguarded fallback rule set
    pub fn rules(&self) -> &'static str {
        match self {
            Self::CssGrid => {
                ".grid { display: flex; flex-wrap: wrap; }
.grid > * { flex: 1 1 16rem; }"
            }
            Self::FlexGap => {
                ".flex-gap > * + * { margin-left: 1rem; }
.flex-gap.vertical > * + * { margin-left: 0; margin-top: 1rem; }"
            }
            Self::CustomProperties => {
                "body { color: #1a1a1a; background-color: #ffffff; }
a { color: #0b5cad; }"
            }
            Self::ObjectFit => ".cover-image { width: 100%; height: auto; }",
            Self::StickyPosition => ".sticky-header { position: relative; }",
            Self::AspectRatio => {
                ".ratio-16x9 { position: relative; height: 0; padding-top: 56.25%; }
.ratio-16x9 > * { position: absolute; top: 0; left: 0; width: 100%; height: 100%; }"
            }
            Self::ClampFunction => "h1 { font-size: 2rem; }
h2 { font-size: 1.5rem; }",
            Self::BackdropFilter => ".glass { background-color: rgba(255, 255, 255, 0.92); }",
        }
    }

    /// Rule set wrapped so it only applies without native support
    pub fn guarded_block(&self) -> String {
        format!(
            "@supports not {} {{\n{}\n}}\n",
            self.supports_condition(),
            self.rules()
        )
    }
}

/// A local remediation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fallback {
    Script(JsShim),
    Style(CssFallback),
}

impl Fallback {
    /// The fallback for a feature; media formats have none
    pub fn for_feature(feature: Feature) -> Option<Fallback> {
        let fallback = match feature {
            Feature::Fetch => Fallback::Script(JsShim::Fetch),
            Feature::Promises => Fallback::Script(JsShim::Promises),
            Feature::IntersectionObserver => Fallback::Script(JsShim::IntersectionObserver),
            Feature::ObjectAssign => Fallback::Script(JsShim::ObjectAssign),
            Feature::ArrayFrom => Fallback::Script(JsShim::ArrayFrom),
            Feature::ArrayIncludes => Fallback::Script(JsShim::ArrayIncludes),
            Feature::Symbol => Fallback::Script(JsShim::Symbol),
            Feature::UrlSearchParams => Fallback::Script(JsShim::UrlSearchParams),
            Feature::CustomEvent => Fallback::Script(JsShim::CustomEvent),
            Feature::AbortController => Fallback::Script(JsShim::AbortController),
            Feature::ResizeObserver => Fallback::Script(JsShim::ResizeObserver),
            Feature::RequestAnimationFrame => Fallback::Script(JsShim::RequestAnimationFrame),
            Feature::CssGrid => Fallback::Style(CssFallback::CssGrid),
            Feature::FlexGap => Fallback::Style(CssFallback::FlexGap),
            Feature::CustomProperties => Fallback::Style(CssFallback::CustomProperties),
            Feature::ObjectFit => Fallback::Style(CssFallback::ObjectFit),
            Feature::StickyPosition => Fallback::Style(CssFallback::StickyPosition),
            Feature::AspectRatio => Fallback::Style(CssFallback::AspectRatio),
            Feature::ClampFunction => Fallback::Style(CssFallback::ClampFunction),
            Feature::BackdropFilter => Fallback::Style(CssFallback::BackdropFilter),
            Feature::Webp | Feature::Avif | Feature::WebmVideo => return None,
        };
        Some(fallback)
    }

    /// Text injected inline when the remote copy is unusable
    pub fn inline_source(&self) -> String {
        match self {
            Self::Script(shim) => shim.source(),
            Self::Style(css) => css.guarded_block(),
        }
    }
}
