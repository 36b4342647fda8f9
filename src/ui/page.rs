use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::config::DashboardConfig;

// ---------------------------------------------------------------------------
// HTML shell
// ---------------------------------------------------------------------------

const PAGE_STYLE: &str = r##"
h1{font-family:Helvetica;margin-top:20px;margin-bottom:0}
.subtitle{margin-top:20px;margin-bottom:0}
#species_checklist label{display:inline-block;margin-right:12px}
#scatter-col{height:300px;margin-top:0;margin-bottom:0}
#table-col{height:300px;margin:20px 20px 20px 0}
table.dt{border-collapse:collapse;width:100%;font-size:12px}
table.dt th,table.dt td{border:1px solid #ddd;padding:2px 6px;text-align:right}
table.dt th{cursor:pointer;user-select:none}
table.dt input.flt{width:100%;box-sizing:border-box;font-size:11px}
.dt-del{color:#999;cursor:pointer;margin-left:4px}
.dt-pager{margin-top:6px;font-size:12px}
"##;

/// Client side of the page. The component tree comes from `/_dash-layout`
/// and the scatter plot is redrawn from `/_dash-update-component`.
const PAGE_SCRIPT: &str = r##"
(function () {
  "use strict";
  var layout = null;
  var table = { page: 0, sort: [], filters: {}, hidden: {}, selected: {} };

  function el(tag, attrs, text) {
    var e = document.createElement(tag);
    Object.keys(attrs || {}).forEach(function (k) { e.setAttribute(k, attrs[k]); });
    if (text !== undefined) e.textContent = text;
    return e;
  }

  function renderChecklist(cl) {
    var root = document.getElementById(cl.id);
    cl.options.forEach(function (opt) {
      var label = el("label");
      var box = el("input", { type: "checkbox", value: opt.value });
      box.checked = cl.value.indexOf(opt.value) >= 0;
      box.addEventListener("change", onChecklistChange);
      label.appendChild(box);
      label.appendChild(document.createTextNode(" " + opt.label));
      root.appendChild(label);
    });
  }

  function onChecklistChange() {
    var values = [];
    document.querySelectorAll("#species_checklist input").forEach(function (b) {
      if (b.checked) values.push(b.value);
    });
    fetch("/_dash-update-component", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({
        output: "scatterplot.figure",
        inputs: [{ id: "species_checklist", property: "value", value: values }]
      })
    })
      .then(function (r) {
        if (!r.ok) {
          return r.text().then(function (t) {
            throw new Error("update_figure failed (" + r.status + "): " + t);
          });
        }
        return r.json();
      })
      .then(function (body) {
        var fig = body.response.scatterplot.figure;
        Plotly.react("scatterplot", fig.data, fig.layout);
      })
      .catch(function (err) { console.error(err.message || err); });
  }

  function renderHistograms(rows) {
    var root = document.getElementById("datatable-row-ids-container");
    rows.forEach(function (row) {
      var r = el("div", { "class": "row" });
      row.figures.forEach(function (cell) {
        var c = el("div", { "class": "six columns" });
        c.appendChild(el("div", { id: cell.id }));
        r.appendChild(c);
      });
      root.appendChild(r);
      row.figures.forEach(function (cell) {
        Plotly.newPlot(cell.id, cell.figure.data, cell.figure.layout);
      });
    });
  }

  function tableQuery() {
    var p = new URLSearchParams();
    p.append("page", table.page);
    table.sort.forEach(function (s) { p.append("sort", s.column + ":" + s.direction); });
    Object.keys(table.filters).forEach(function (col) {
      if (table.filters[col]) p.append("filter", col + ":" + table.filters[col]);
    });
    return p.toString();
  }

  function toggleSort(col, multi) {
    var idx = table.sort.findIndex(function (s) { return s.column === col; });
    var next = idx < 0 ? "asc" : table.sort[idx].direction === "asc" ? "desc" : null;
    if (!multi) table.sort = table.sort.filter(function (s) { return s.column === col; });
    idx = table.sort.findIndex(function (s) { return s.column === col; });
    if (next === null) table.sort.splice(idx, 1);
    else if (idx < 0) table.sort.push({ column: col, direction: next });
    else table.sort[idx].direction = next;
    loadTable();
  }

  function loadTable() {
    fetch("/api/table?" + tableQuery())
      .then(function (r) { return r.json(); })
      .then(renderTable);
  }

  function renderTable(page) {
    var cfg = layout.table;
    var cols = cfg.columns.filter(function (c) { return !table.hidden[c.id]; });
    var root = document.getElementById(cfg.id);
    root.textContent = "";
    var t = el("table", { "class": "dt" });
    var head = el("tr");
    head.appendChild(el("th"));
    cols.forEach(function (c) {
      var s = table.sort.find(function (x) { return x.column === c.id; });
      var th = el("th", {}, c.name + (s ? (s.direction === "asc" ? " ▲" : " ▼") : ""));
      th.addEventListener("click", function (ev) { toggleSort(c.id, ev.shiftKey); });
      if (c.deletable) {
        var del = el("span", { "class": "dt-del", title: "hide column" }, "×");
        del.addEventListener("click", function (ev) {
          ev.stopPropagation();
          table.hidden[c.id] = true;
          renderTable(page);
        });
        th.appendChild(del);
      }
      head.appendChild(th);
    });
    t.appendChild(head);
    var filters = el("tr");
    filters.appendChild(el("td"));
    cols.forEach(function (c) {
      var td = el("td");
      var inp = el("input", { "class": "flt", placeholder: "filter data..." });
      inp.value = table.filters[c.id] || "";
      inp.addEventListener("change", function () {
        table.filters[c.id] = inp.value;
        table.page = 0;
        loadTable();
      });
      td.appendChild(inp);
      filters.appendChild(td);
    });
    t.appendChild(filters);
    page.rows.forEach(function (row) {
      var key = JSON.stringify(row);
      var tr = el("tr");
      var td = el("td");
      var box = el("input", { type: "checkbox" });
      box.checked = !!table.selected[key];
      box.addEventListener("change", function () { table.selected[key] = box.checked; });
      td.appendChild(box);
      tr.appendChild(td);
      cols.forEach(function (c) { tr.appendChild(el("td", {}, String(row[c.id]))); });
      t.appendChild(tr);
    });
    root.appendChild(t);
    var pager = el("div", { "class": "dt-pager" });
    var prev = el("button", {}, "<");
    var next = el("button", {}, ">");
    prev.disabled = page.page_current <= 0;
    next.disabled = page.page_current + 1 >= page.page_count;
    prev.addEventListener("click", function () { table.page = page.page_current - 1; loadTable(); });
    next.addEventListener("click", function () { table.page = page.page_current + 1; loadTable(); });
    pager.appendChild(prev);
    pager.appendChild(document.createTextNode(
      " " + (page.page_count ? page.page_current + 1 : 0) + " / " + page.page_count + " "));
    pager.appendChild(next);
    root.appendChild(pager);
  }

  fetch("/_dash-layout")
    .then(function (r) { return r.json(); })
    .then(function (l) {
      layout = l;
      table.page = l.table.page_current;
      renderChecklist(l.checklist);
      Plotly.newPlot(l.scatter.id, l.scatter.figure.data, l.scatter.figure.layout);
      renderHistograms(l.histograms);
      loadTable();
    });
})();
"##;

/// Render the HTML page for a configuration.
pub fn render_page(config: &DashboardConfig) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width,initial-scale=1";
                title { (config.title) }
                link rel="stylesheet" href=(config.stylesheet_url);
                script src=(config.plotly_url) {}
                style { (PreEscaped(PAGE_STYLE)) }
            }
            body {
                div class="row" {
                    h1 class="eight columns" { (config.title) }
                    p class="subtitle eight columns" { (config.subtitle) }
                }
                div class="row" {
                    h5 { "Choose Species:" }
                    div id="species_checklist" {}
                }
                div class="row" {
                    div id="scatter-col" class="six columns" { div id="scatterplot" {} }
                    div id="table-col" class="six columns" { div id="datatable-row-ids" {} }
                }
                div id="datatable-row-ids-container" {}
                script { (PreEscaped(PAGE_SCRIPT)) }
            }
        }
    }
}
