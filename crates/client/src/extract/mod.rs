//! Equipment extraction from a rendered character page.
//!
//! ### Zones
//! - The page lays equipment out in three zones (`left`, `right`, `bottom`),
//!   each a list of link nodes matched by a zone selector.
//!
//! ### Merge Policy
//! - Each link node yields one attribute record.
//! - If the link has a descendant image, the image's attributes are
//!   overlaid on the link's; on a key collision the image value wins.
//! - Records keep document order. A zone with no matches is an empty list.
//!
//! ### Stable Abstraction
//! - The pipeline depends on the [`Extractor`] trait; [`ZoneExtractor`] is
//!   the implementation over any [`DomQuery`] document.

pub mod dom;

pub use dom::{DomNode, DomQuery, HtmlDom};

use armory_core::{AttributeRecord, Error, ScrapeResult, Zone};
use chrono::Utc;

/// Selector for the image inside an equipment link.
pub const DEFAULT_IMAGE_SELECTOR: &str = "img";

/// Turns rendered page HTML into a [`ScrapeResult`].
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> Result<ScrapeResult, Error>;
}

/// Selector-driven zone extractor.
#[derive(Debug, Clone)]
pub struct ZoneExtractor {
    left: String,
    right: String,
    bottom: String,
    image: String,
}

impl Default for ZoneExtractor {
    fn default() -> Self {
        Self {
            left: Zone::Left.default_selector().to_string(),
            right: Zone::Right.default_selector().to_string(),
            bottom: Zone::Bottom.default_selector().to_string(),
            image: DEFAULT_IMAGE_SELECTOR.to_string(),
        }
    }
}

impl ZoneExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an extractor with custom zone and image selectors.
    ///
    /// Every selector is validated up front so a bad one is reported once at
    /// construction instead of on every page.
    pub fn with_selectors(left: &str, right: &str, bottom: &str, image: &str) -> Result<Self, Error> {
        for selector in [left, right, bottom, image] {
            dom::parse_selector(selector).map_err(|e| Error::InvalidInput(e.reason().to_string()))?;
        }
        Ok(Self { left: left.to_string(), right: right.to_string(), bottom: bottom.to_string(), image: image.to_string() })
    }

    pub fn selector(&self, zone: Zone) -> &str {
        match zone {
            Zone::Left => &self.left,
            Zone::Right => &self.right,
            Zone::Bottom => &self.bottom,
        }
    }

    /// Extract all zones from a queryable document.
    pub fn extract_dom<D: DomQuery>(&self, dom: &D) -> Result<ScrapeResult, Error> {
        let left = self.extract_zone(dom, Zone::Left)?;
        let right = self.extract_zone(dom, Zone::Right)?;
        let bottom = self.extract_zone(dom, Zone::Bottom)?;

        Ok(ScrapeResult { left, right, bottom, scraped_at: Utc::now() })
    }

    fn extract_zone<D: DomQuery>(&self, dom: &D, zone: Zone) -> Result<Vec<AttributeRecord>, Error> {
        let links = dom.query_all(self.selector(zone))?;
        let mut records = Vec::with_capacity(links.len());
        for link in &links {
            let image = link.first_descendant(&self.image)?;
            records.push(merge_attributes(link.attributes(), image.map(|img| img.attributes())));
        }
        tracing::trace!(%zone, records = records.len(), "zone extracted");
        Ok(records)
    }
}

impl Extractor for ZoneExtractor {
    fn extract(&self, html: &str) -> Result<ScrapeResult, Error> {
        if html.trim().is_empty() {
            return Err(Error::ExtractFailed("page content is empty".to_string()));
        }
        self.extract_dom(&HtmlDom::parse(html))
    }
}

/// Overlay image attributes on link attributes; image keys win.
pub fn merge_attributes(mut link: AttributeRecord, image: Option<AttributeRecord>) -> AttributeRecord {
    if let Some(image) = image {
        link.extend(image);
    }
    link
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn record(pairs: &[(&str, &str)]) -> AttributeRecord {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    /// Hand-built document: each selector maps to a fixed node list.
    #[derive(Default)]
    struct MemDom {
        matches: HashMap<String, Vec<MemNode>>,
        broken: Option<String>,
    }

    #[derive(Default)]
    struct MemNode {
        attrs: AttributeRecord,
        descendants: HashMap<String, MemNode>,
    }

    impl MemDom {
        fn with(mut self, selector: &str, nodes: Vec<MemNode>) -> Self {
            self.matches.insert(selector.to_string(), nodes);
            self
        }
    }

    impl MemNode {
        fn link(pairs: &[(&str, &str)]) -> Self {
            Self { attrs: record(pairs), descendants: HashMap::new() }
        }

        fn with_image(mut self, pairs: &[(&str, &str)]) -> Self {
            self.descendants.insert("img".to_string(), MemNode::link(pairs));
            self
        }
    }

    impl DomQuery for MemDom {
        type Node<'a> = &'a MemNode;

        fn query_all(&self, selector: &str) -> Result<Vec<&MemNode>, Error> {
            if self.broken.as_deref() == Some(selector) {
                return Err(Error::ExtractFailed(format!("cannot evaluate {selector}")));
            }
            Ok(self.matches.get(selector).map(|nodes| nodes.iter().collect()).unwrap_or_default())
        }
    }

    impl DomNode for &MemNode {
        fn attributes(&self) -> AttributeRecord {
            self.attrs.clone()
        }

        fn first_descendant(&self, selector: &str) -> Result<Option<Self>, Error> {
            let node: &MemNode = self;
            Ok(node.descendants.get(selector))
        }
    }

    #[test]
    fn test_merge_image_keys_win() {
        let merged =
            merge_attributes(record(&[("href", "a"), ("class", "x")]), Some(record(&[("src", "b"), ("class", "y")])));
        assert_eq!(merged, record(&[("href", "a"), ("class", "y"), ("src", "b")]));
    }

    #[test]
    fn test_merge_without_image() {
        let merged = merge_attributes(record(&[("href", "a")]), None);
        assert_eq!(merged, record(&[("href", "a")]));
    }

    #[test]
    fn test_extract_dom_in_memory() {
        let dom = MemDom::default()
            .with(
                ".item-left div div a",
                vec![
                    MemNode::link(&[("href", "/item/1"), ("class", "x")]).with_image(&[("src", "i1.png"), ("class", "y")]),
                    MemNode::link(&[("href", "/item/2")]),
                ],
            )
            .with(".item-right div div a", vec![MemNode::link(&[("href", "/item/3")])]);

        let result = ZoneExtractor::new().extract_dom(&dom).unwrap();

        assert_eq!(result.left.len(), 2);
        assert_eq!(result.left[0], record(&[("href", "/item/1"), ("class", "y"), ("src", "i1.png")]));
        assert_eq!(result.left[1], record(&[("href", "/item/2")]));
        assert_eq!(result.right, vec![record(&[("href", "/item/3")])]);
        assert!(result.bottom.is_empty());
    }

    #[test]
    fn test_evaluation_error_fails_extraction() {
        let dom = MemDom { broken: Some(".item-bottom div div a".to_string()), ..MemDom::default() };
        let result = ZoneExtractor::new().extract_dom(&dom);
        assert!(matches!(result, Err(Error::ExtractFailed(_))));
    }

    #[test]
    fn test_extract_html() {
        let html = r#"
            <html><body>
                <div class="item-left">
                    <div><div><a href="/item/49623" class="icon"><img src="/icons/helm.jpg" class="border"></a></div></div>
                    <div><div><a href="/item/50633"></a></div></div>
                </div>
                <div class="item-right">
                    <div><div><a href="/item/50604"><img src="/icons/gloves.jpg"></a></div></div>
                </div>
            </body></html>
        "#;

        let result = ZoneExtractor::new().extract(html).unwrap();

        assert_eq!(result.left.len(), 2);
        assert_eq!(
            result.left[0],
            record(&[("href", "/item/49623"), ("class", "border"), ("src", "/icons/helm.jpg")])
        );
        assert_eq!(result.left[1], record(&[("href", "/item/50633")]));
        assert_eq!(result.right[0]["src"], "/icons/gloves.jpg");
        assert!(result.bottom.is_empty());
    }

    #[test]
    fn test_extract_page_without_zones() {
        let result = ZoneExtractor::new().extract("<html><body><p>Nothing here</p></body></html>").unwrap();
        assert_eq!(result.record_count(), 0);
    }

    #[test]
    fn test_extract_empty_html() {
        let result = ZoneExtractor::new().extract("   ");
        assert!(matches!(result, Err(Error::ExtractFailed(_))));
    }

    #[test]
    fn test_scraped_at_is_recent() {
        let before = Utc::now();
        let result = ZoneExtractor::new().extract("<html></html>").unwrap();
        assert!(result.scraped_at >= before);
    }

    #[test]
    fn test_with_selectors() {
        let extractor = ZoneExtractor::with_selectors(".l a", ".r a", ".b a", "img.icon").unwrap();
        assert_eq!(extractor.selector(Zone::Right), ".r a");

        let result = ZoneExtractor::with_selectors(".l a", "a[[", ".b a", "img");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
