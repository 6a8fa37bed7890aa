//! HTML extraction adapter for GSMArena phone spec pages.
//!
//! Produces a raw record with whatever fields the page carries; the record
//! normalizer takes care of defaults.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::Value;

use crate::models::RawRecord;
use crate::normalize::slug_from_url;
use crate::records::timestamp;

const TITLE_SELECTOR: &str = ".specs-phone-name-title";
const IMAGE_SELECTOR: &str = ".specs-photo-main img";

/// Whitespace-collapsed, trimmed text
fn clean(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: ElementRef<'_>) -> String {
    clean(&el.text().collect::<String>())
}

struct Page {
    document: Html,
}

impl Page {
    fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    fn first(&self, css: &str) -> Option<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.document.select(&selector).next(),
            Err(e) => {
                log::warn!("Bad selector {}: {}", css, e);
                None
            }
        }
    }

    fn spec_element(&self, name: &str) -> Option<ElementRef<'_>> {
        self.first(&format!("[data-spec=\"{}\"]", name))
    }

    fn text_of(&self, css: &str) -> String {
        self.first(css)
            .map(element_text)
            .unwrap_or_default()
    }

    fn spec(&self, name: &str) -> String {
        self.spec_element(name)
            .map(element_text)
            .unwrap_or_default()
    }

    /// First non-empty spec among `names`
    fn spec_any(&self, names: &[&str]) -> String {
        names
            .iter()
            .map(|name| self.spec(name))
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }

    /// Spec split into parts at `<br>`/`<hr>`, joined with "; "
    fn multi_spec(&self, name: &str) -> String {
        let Some(el) = self.spec_element(name) else {
            return String::new();
        };
        let parts = collect_spec_parts(el);
        if parts.is_empty() {
            element_text(el)
        } else {
            parts.join("; ")
        }
    }

    fn image(&self) -> String {
        self.first(IMAGE_SELECTOR)
            .and_then(|img| {
                let el = img.value();
                el.attr("src")
                    .filter(|s| !s.is_empty())
                    .or_else(|| el.attr("data-src").filter(|s| !s.is_empty()))
                    .or_else(|| el.attr("data-srcset").filter(|s| !s.is_empty()))
                    .map(str::to_string)
            })
            .unwrap_or_default()
    }

    /// Charging spec: each text run is labelled by the icon before it
    fn charging(&self) -> String {
        let Some(el) = self.spec_element("battype-hl") else {
            return String::new();
        };

        let mut parts = Vec::new();
        let mut label = "";
        for child in el.children() {
            let value = match child.value() {
                Node::Element(element) if element.name() == "i" => {
                    label = charging_label(element.attr("class").unwrap_or(""));
                    continue;
                }
                Node::Text(text) => clean(text),
                Node::Element(_) => ElementRef::wrap(child)
                    .map(element_text)
                    .unwrap_or_default(),
                _ => String::new(),
            };
            if value.is_empty() {
                continue;
            }
            if label.is_empty() {
                parts.push(value);
            } else {
                parts.push(format!("{} {}", value, label));
                label = "";
            }
        }

        let formatted = parts.join("; ").trim().to_string();
        if formatted.is_empty() {
            element_text(el)
        } else {
            formatted
        }
    }
}

fn charging_label(class_name: &str) -> &'static str {
    let lower = class_name.to_lowercase();
    if lower.contains("reverse") {
        "reverse wireless"
    } else if lower.contains("wireless") {
        "wireless"
    } else {
        "wired"
    }
}

fn collect_spec_parts(root: ElementRef<'_>) -> Vec<String> {
    fn flush(buffer: &mut Vec<String>, parts: &mut Vec<String>) {
        if buffer.is_empty() {
            return;
        }
        let joined = buffer.join(" ");
        let value = joined.trim_start_matches('\u{00b7}').trim().to_string();
        if !value.is_empty() {
            parts.push(value);
        }
        buffer.clear();
    }

    fn walk(el: ElementRef<'_>, buffer: &mut Vec<String>, parts: &mut Vec<String>) {
        for child in el.children() {
            match child.value() {
                Node::Text(text) => {
                    let value = clean(text);
                    if !value.is_empty() {
                        buffer.push(value);
                    }
                }
                Node::Element(element) if matches!(element.name(), "hr" | "br") => {
                    flush(buffer, parts);
                }
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        walk(child_el, buffer, parts);
                    }
                }
                _ => {}
            }
        }
    }

    let mut parts = Vec::new();
    let mut buffer = Vec::new();
    walk(root, &mut buffer, &mut parts);
    flush(&mut buffer, &mut parts);
    parts
}

/// Extract a phone record from a spec page, stamped with the current time
pub fn extract_phone_page(html: &str, url: &str) -> Option<RawRecord> {
    extract_phone_page_at(html, url, Utc::now())
}

/// Extract a phone record from a spec page.
///
/// Returns `None` when the page has no phone title.
pub fn extract_phone_page_at(html: &str, url: &str, now: DateTime<Utc>) -> Option<RawRecord> {
    let page = Page::parse(html);

    let full_model = page.text_of(TITLE_SELECTOR);
    if full_model.is_empty() {
        log::debug!("Not a phone page: {}", url);
        return None;
    }

    let brand = full_model
        .split(' ')
        .next()
        .unwrap_or_default()
        .to_string();
    let stamp = timestamp(now);

    let fields = [
        ("brand", brand),
        ("model", full_model.clone()),
        ("slug", slug_from_url(url)),
        ("url", url.to_string()),
        ("updatedAt", stamp.clone()),
        ("firstSeen", stamp),
        ("announced", page.spec_any(&["released-hl", "year"])),
        ("status", page.spec("status")),
        ("dimensions", page.spec("dimensions")),
        ("weight", page.spec("weight")),
        ("build", page.spec("build")),
        ("sim", page.multi_spec("sim")),
        ("displayType", page.spec("displaytype")),
        ("displaySize", page.spec("displaysize")),
        ("displayResolution", page.spec("displayresolution")),
        ("os", page.spec_any(&["os", "os-hl"])),
        ("chipset", page.spec_any(&["chipset", "chipset-hl"])),
        ("memory", page.spec("internalmemory")),
        ("mainCamera", page.spec("cam1modules")),
        ("selfieCamera", page.spec("cam2modules")),
        ("battery", page.spec_any(&["batdescription1", "batsize-hl"])),
        ("charging", page.charging()),
        ("colors", page.spec("colors")),
        ("price", page.spec("price")),
        ("image", page.image()),
    ];

    let record: RawRecord = fields
        .into_iter()
        .map(|(name, value)| (name.to_string(), Value::String(value)))
        .collect();

    log::debug!("Extracted phone data for {}", full_model);
    Some(record)
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
