// tests/providers_parse.rs
//
// Each site parser against a trimmed copy of its markup. Parsers are pure:
// document in, records out, no network.

use reqwest::Url;
use scraper::Html;
use serde_json::Value;

use tender_aggregator::record::record_from;
use tender_aggregator::sources::html::PageParser;
use tender_aggregator::sources::providers::{
    adb::Adb,
    bdjobs::BdJobs,
    bppa::{filter_by_place, Bppa},
    care::Care,
    pksf::Pksf,
    undp::Undp,
    ungm::{filter_by_country, filter_by_deadline, Ungm},
    worldbank::WorldBank,
};
use tender_aggregator::Record;

fn parse<P: PageParser>(parser: &P, html: &str) -> Vec<Record> {
    let base = Url::parse(parser.url()).unwrap();
    parser.parse(&Html::parse_document(html), &base)
}

fn s<'a>(r: &'a Record, field: &str) -> &'a str {
    r.get(field).and_then(Value::as_str).unwrap_or_else(|| panic!("missing {field}"))
}

#[test]
fn adb_projects() {
    let html = r#"
      <div class="list">
        <div class="item linked">
          <div class="item-title"><a href="/projects/55032-002/main">Urban Governance Project</a></div>
          <div class="item-summary">55032-002; Bangladesh; Water and urban services</div>
          <div class="item-meta"><span>Active</span><div>Approval Date: 12 Dec 2024</div></div>
        </div>
        <div class="item linked"><div class="item-summary">untitled entry</div></div>
      </div>"#;
    let out = parse(&Adb, html);
    assert_eq!(out.len(), 1, "items without a title link are skipped");
    let r = &out[0];
    assert_eq!(s(r, "title"), "Urban Governance Project");
    assert_eq!(s(r, "project_id"), "55032-002");
    assert_eq!(s(r, "sector"), "Water and urban services");
    assert_eq!(s(r, "status"), "Active");
    assert_eq!(s(r, "approval_date"), "12 Dec 2024");
    assert_eq!(s(r, "url"), "https://www.adb.org/projects/55032-002/main");
}

#[test]
fn bdjobs_cards_with_placeholders() {
    let html = r#"
      <app-tender-card>
        <div title="World Bank">World Bank</div>
        <a href="/tender/17">Consultant for Digital Transformation</a>
        <img src="/logos/wb.png">
      </app-tender-card>
      <app-tender-card></app-tender-card>"#;
    let out = parse(&BdJobs, html);
    assert_eq!(out.len(), 2);

    assert_eq!(s(&out[0], "organization"), "World Bank");
    assert_eq!(s(&out[0], "title"), "Consultant for Digital Transformation");
    assert_eq!(s(&out[0], "link"), "https://bdjobs.com/tender/17");
    assert_eq!(s(&out[0], "logo"), "https://bdjobs.com/logos/wb.png");

    assert_eq!(s(&out[1], "organization"), "Organization 2");
    assert_eq!(s(&out[1], "title"), "Tender 2");
    assert_eq!(s(&out[1], "link"), "#");
    assert!(s(&out[1], "logo").starts_with("https://via.placeholder.com/"));
    assert_eq!(s(&out[1], "posted").len(), "2025-01-01".len());
}

#[test]
fn bppa_notice_table() {
    let html = r#"
      <div id="bodyContent">
        <table>
          <tr><th>SL</th><th>Title</th></tr>
          <tr>
            <td>1</td>
            <td><a href="notices/112.pdf">Medical Equipment for District Hospitals</a><br>DGHS/PROC/2025/112</td>
            <td>DGHS</td>
            <td>10-Feb-2025</td>
            <td>12-Mar-2025<br>12:00 PM</td>
            <td>Dhaka</td>
          </tr>
        </table>
      </div>"#;
    let out = parse(&Bppa, html);
    assert_eq!(out.len(), 1);
    let r = &out[0];
    assert_eq!(s(r, "sl_no"), "1");
    assert_eq!(s(r, "title"), "Medical Equipment for District Hospitals");
    assert_eq!(s(r, "reference_no"), "DGHS/PROC/2025/112");
    assert_eq!(s(r, "procuring_entity"), "DGHS");
    assert_eq!(s(r, "closing_date"), "12-Mar-2025");
    assert_eq!(s(r, "closing_time"), "12:00 PM");
    assert_eq!(s(r, "place"), "Dhaka");
    assert_eq!(
        s(r, "detail_url"),
        "https://www.bppa.gov.bd/advertisement-notices/notices/112.pdf"
    );
}

#[test]
fn bppa_without_content_block_is_empty() {
    assert!(parse(&Bppa, "<table><tr><td>1</td></tr></table>").is_empty());
}

#[test]
fn bppa_place_filter() {
    let mut rows = Bppa.sample();
    rows.push(record_from([("title", "No place field")]));

    let dhaka = filter_by_place(&rows, "dhaka");
    assert_eq!(dhaka.len(), 1);
    assert_eq!(s(&dhaka[0], "place"), "Dhaka");
    assert_eq!(filter_by_place(&rows, "SYL").len(), 1);
    assert!(filter_by_place(&rows, "Chattogram").is_empty());
}

#[test]
fn care_active_tab() {
    let html = r#"
      <div id="project1" class="tab-pane fade show active">
        <div class="col-md-3">
          <p><i>25 Dec 2024</i></p>
          <p>Finance and Admin Manager</p>
          <a class="default-btn" href="/uploads/tor.pdf">Download</a>
        </div>
      </div>
      <div id="project2" class="tab-pane fade">
        <div class="col-md-3"><p><i>old</i></p><p>Closed call</p></div>
      </div>"#;
    let out = parse(&Care, html);
    assert_eq!(out.len(), 1);
    let r = &out[0];
    assert_eq!(s(r, "deadline"), "25 Dec 2024");
    assert_eq!(s(r, "title"), "Finance and Admin Manager");
    assert_eq!(s(r, "download_url"), "https://www.carebangladesh.org/uploads/tor.pdf");
    assert_eq!(s(r, "organization"), "CARE Bangladesh");
}

#[test]
fn pksf_blog_posts() {
    let html = r#"
      <div id="main-content">
        <div class="wgl_col-4 item">
          <span class="post_date">15 Dec 2024</span>
          <h3 class="blog-post_title"><a href="https://pksf.org.bd/tender-1/">Procurement of Office Equipment</a></h3>
          <div class="post_views"><span class="described">234</span></div>
          <span class="sl-count">12</span>
          <span class="post_author"><a href="/author/admin">admin</a></span>
        </div>
      </div>"#;
    let out = parse(&Pksf, html);
    assert_eq!(out.len(), 1);
    let r = &out[0];
    assert_eq!(s(r, "date"), "15 Dec 2024");
    assert_eq!(s(r, "title"), "Procurement of Office Equipment");
    assert_eq!(s(r, "link"), "https://pksf.org.bd/tender-1/");
    assert_eq!(s(r, "views"), "234");
    assert_eq!(s(r, "likes"), "12");
    assert_eq!(s(r, "author"), "admin");
}

#[test]
fn undp_skips_hidden_rows() {
    let row = |style: &str, title: &str| {
        format!(
            r#"<a class="vacanciesTableLink" href="view_negotiation.cfm?nego_id=1" data-region="BGD" {style}>
                 <div class="vacanciesTable__cell"><span>{title}</span></div>
                 <div class="vacanciesTable__cell"><span>RFQ-001</span></div>
                 <div class="vacanciesTable__cell"><span>Bangladesh</span></div>
                 <div class="vacanciesTable__cell"><span>RFQ</span></div>
                 <div class="vacanciesTable__cell"><span>20-Mar-25</span></div>
                 <div class="vacanciesTable__cell"><span>01-Mar-25</span></div>
               </a>"#
        )
    };
    let html = format!(
        "{}{}",
        row("", "Solar Panels"),
        row(r#"style="display: none""#, "Hidden")
    );
    let out = parse(&Undp, &html);
    assert_eq!(out.len(), 1);
    let r = &out[0];
    assert_eq!(s(r, "title"), "Solar Panels");
    assert_eq!(s(r, "ref_no"), "RFQ-001");
    assert_eq!(s(r, "country_code"), "BGD");
    assert_eq!(s(r, "deadline"), "20-Mar-25");
    assert_eq!(
        s(r, "detail_url"),
        "https://procurement-notices.undp.org/view_negotiation.cfm?nego_id=1"
    );
    assert!(Undp.sample().is_empty());
}

#[test]
fn ungm_notice_rows() {
    let html = r#"
      <div class="tableRow dataRow notice-table" data-noticeid="261380">
        <div class="tableCell"><span class="ungm-title ungm-title--small">Construction of Training Facility</span></div>
        <div class="tableCell resultInfo1 deadline"><span>01-Mar-2026 11:00</span><span class="remainingDays">Expires within 15 days</span></div>
        <div class="tableCell resultAgency">UNOPS</div>
        <div class="tableCell">12-Feb-2026</div>
        <div class="tableCell resultInfo1" data-description="Reference"><span>ITB/2026/61380</span></div>
        <div class="tableCell">Invitation to bid</div>
        <div class="tableCell">Bangladesh</div>
      </div>"#;
    let out = parse(&Ungm, html);
    assert_eq!(out.len(), 1);
    let r = &out[0];
    assert_eq!(s(r, "title"), "Construction of Training Facility");
    assert_eq!(s(r, "deadline"), "01-Mar-2026 11:00");
    assert_eq!(s(r, "organization"), "UNOPS");
    assert_eq!(s(r, "published_date"), "12-Feb-2026");
    assert_eq!(s(r, "reference"), "ITB/2026/61380");
    assert_eq!(s(r, "opportunity_type"), "Invitation to bid");
    assert_eq!(s(r, "country"), "Bangladesh");
    assert_eq!(s(r, "remaining_days"), "Expires within 15 days");
    assert_eq!(s(r, "detail_url"), "https://www.ungm.org/Public/Notice/261380");
}

#[test]
fn ungm_filters() {
    let rows = vec![
        record_from([("country", "Bangladesh"), ("remaining_days", "Expires within 15 days")]),
        record_from([("country", "Multiple destinations"), ("remaining_days", "Expires within 24 hours")]),
        record_from([("country", "Nepal"), ("remaining_days", "")]),
    ];
    assert_eq!(filter_by_country(&rows, "bangla").len(), 1);
    assert!(filter_by_country(&rows, "Chile").is_empty());

    let soon = filter_by_deadline(&rows, 20);
    assert_eq!(soon.len(), 1);
    assert_eq!(s(&soon[0], "country"), "Bangladesh");
    assert!(filter_by_deadline(&rows, 10).is_empty());
}

#[test]
fn worldbank_table_rows() {
    let html = r#"
      <table class="project-operation-tab-table">
        <tbody>
          <tr>
            <td><a href="/p/P171023">Road Safety Project</a></td>
            <td>Bangladesh</td><td>P171023</td><td>$300.00 million</td>
            <td>Active</td><td>28-Jun-2023</td><td>31-Jan-2025</td><td>Implementation</td>
          </tr>
          <tr><td colspan="8">Loading...</td></tr>
        </tbody>
      </table>"#;
    let out = parse(&WorldBank, html);
    assert_eq!(out.len(), 1);
    let r = &out[0];
    assert_eq!(s(r, "title"), "Road Safety Project");
    assert_eq!(s(r, "project_id"), "P171023");
    assert_eq!(s(r, "amount"), "$300.00 million");
    assert_eq!(s(r, "last_stage"), "Implementation");
}

#[test]
fn unmatched_markup_yields_nothing() {
    let html = "<html><body><p>Site under maintenance</p></body></html>";
    assert!(parse(&Adb, html).is_empty());
    assert!(parse(&Bppa, html).is_empty());
    assert!(parse(&Care, html).is_empty());
    assert!(parse(&Pksf, html).is_empty());
    assert!(parse(&Undp, html).is_empty());
    assert!(parse(&Ungm, html).is_empty());
    assert!(parse(&WorldBank, html).is_empty());
}
