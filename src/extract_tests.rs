//! Unit tests for the HTML extraction adapter.

use super::*;
use chrono::TimeZone;

const URL: &str = "https://www.gsmarena.com/samsung_galaxy_s25-13610.php";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

fn spec_page() -> String {
    r##"<!DOCTYPE html>
<html><body>
  <h1 class="specs-phone-name-title">Samsung   Galaxy S25</h1>
  <div class="specs-photo-main"><a href="#"><img alt="pic" src="https://cdn.example/s25.jpg"></a></div>
  <ul class="specs-spotlight-features">
    <li><span data-spec="released-hl">Released 2025, February 07</span></li>
    <li><span data-spec="os-hl">Android 15</span></li>
    <li><span data-spec="battype-hl"><i class="head-icon icon-charging"></i>25W<i class="head-icon icon-wireless"></i>15W<i class="icon-reverse-wireless"></i>4.5W</span></li>
  </ul>
  <table>
    <tr><td data-spec="status">Available. Released 2025, February 07</td></tr>
    <tr><td data-spec="dimensions">146.9 x 70.5 x 7.2 mm</td></tr>
    <tr><td data-spec="weight">162 g (5.71 oz)</td></tr>
    <tr><td data-spec="build">Glass front, glass back, aluminum frame</td></tr>
    <tr><td data-spec="sim">Nano-SIM + eSIM<br>· Dual eSIM<hr>IP68 dust/water resistant</td></tr>
    <tr><td data-spec="displaytype">Dynamic LTPO AMOLED 2X, 120Hz</td></tr>
    <tr><td data-spec="displaysize">6.2 inches</td></tr>
    <tr><td data-spec="displayresolution">1080 x 2340 pixels</td></tr>
    <tr><td data-spec="chipset">Qualcomm SM8750-AC Snapdragon 8 Elite</td></tr>
    <tr><td data-spec="internalmemory">128GB 12GB RAM, 256GB 12GB RAM</td></tr>
    <tr><td data-spec="cam1modules">50 MP, f/1.8
       (wide)</td></tr>
    <tr><td data-spec="cam2modules">12 MP, f/2.2</td></tr>
    <tr><td data-spec="batdescription1">Li-Ion 4000 mAh</td></tr>
    <tr><td data-spec="colors">Icyblue, Navy, Mint</td></tr>
    <tr><td data-spec="price">$ 799.99</td></tr>
  </table>
</body></html>"##
        .to_string()
}

fn field<'a>(record: &'a RawRecord, name: &str) -> &'a str {
    record.get(name).and_then(Value::as_str).unwrap_or("<missing>")
}

#[test]
fn extracts_identity_and_provenance() {
    let record = extract_phone_page_at(&spec_page(), URL, now()).unwrap();
    assert_eq!(field(&record, "brand"), "Samsung");
    assert_eq!(field(&record, "model"), "Samsung Galaxy S25");
    assert_eq!(field(&record, "slug"), "samsung_galaxy_s25");
    assert_eq!(field(&record, "url"), URL);
    assert_eq!(field(&record, "updatedAt"), "2025-03-01T12:00:00.000Z");
    assert_eq!(field(&record, "firstSeen"), "2025-03-01T12:00:00.000Z");
}

#[test]
fn extracts_spec_fields_with_fallbacks() {
    let record = extract_phone_page_at(&spec_page(), URL, now()).unwrap();
    assert_eq!(field(&record, "announced"), "Released 2025, February 07");
    assert_eq!(field(&record, "os"), "Android 15");
    assert_eq!(field(&record, "chipset"), "Qualcomm SM8750-AC Snapdragon 8 Elite");
    assert_eq!(field(&record, "battery"), "Li-Ion 4000 mAh");
    assert_eq!(field(&record, "mainCamera"), "50 MP, f/1.8 (wide)");
    assert_eq!(field(&record, "displaySize"), "6.2 inches");
    assert_eq!(field(&record, "price"), "$ 799.99");
    assert_eq!(field(&record, "image"), "https://cdn.example/s25.jpg");
}

#[test]
fn splits_multi_part_spec() {
    let record = extract_phone_page_at(&spec_page(), URL, now()).unwrap();
    assert_eq!(
        field(&record, "sim"),
        "Nano-SIM + eSIM; Dual eSIM; IP68 dust/water resistant"
    );
}

#[test]
fn labels_charging_modes() {
    let record = extract_phone_page_at(&spec_page(), URL, now()).unwrap();
    assert_eq!(
        field(&record, "charging"),
        "25W wired; 15W wireless; 4.5W reverse wireless"
    );
}

#[test]
fn missing_specs_are_empty() {
    let html = r#"<html><body><h1 class="specs-phone-name-title">Nokia 3310</h1></body></html>"#;
    let record = extract_phone_page_at(html, "https://www.gsmarena.com/", now()).unwrap();
    assert_eq!(field(&record, "brand"), "Nokia");
    assert_eq!(field(&record, "slug"), "");
    assert_eq!(field(&record, "sim"), "");
    assert_eq!(field(&record, "charging"), "");
    assert_eq!(field(&record, "image"), "");
}

#[test]
fn image_falls_back_to_data_src() {
    let html = r#"<html><body><h1 class="specs-phone-name-title">Nokia 3310</h1>
        <div class="specs-photo-main"><img data-src="/lazy.jpg"></div></body></html>"#;
    let record = extract_phone_page_at(html, URL, now()).unwrap();
    assert_eq!(field(&record, "image"), "/lazy.jpg");
}

#[test]
fn non_phone_page_yields_nothing() {
    let html = "<html><body><h1>News</h1></body></html>";
    assert!(extract_phone_page_at(html, URL, now()).is_none());

    let blank_title = r#"<html><body><h1 class="specs-phone-name-title">  </h1></body></html>"#;
    assert!(extract_phone_page(blank_title, URL).is_none());
}

#[test]
fn charging_label_from_class() {
    assert_eq!(charging_label("head-icon icon-charging"), "wired");
    assert_eq!(charging_label("icon-Wireless"), "wireless");
    assert_eq!(charging_label("icon-reverse-wireless"), "reverse wireless");
}
