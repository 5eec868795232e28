//! Minimal DOM query capability.
//!
//! The extractor only needs three things from a document: ordered selector
//! matches, a node's attributes, and a node's first matching descendant.
//! [`HtmlDom`] provides them over a scraper-parsed rendered page; tests can
//! provide them over a hand-built tree.

use armory_core::{AttributeRecord, Error};
use scraper::{ElementRef, Html, Selector};

/// A document that can be queried with CSS selectors.
pub trait DomQuery {
    type Node<'a>: DomNode
    where
        Self: 'a;

    /// All nodes matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Result<Vec<Self::Node<'_>>, Error>;
}

/// An element within a [`DomQuery`] document.
pub trait DomNode: Sized {
    /// The element's own attributes.
    fn attributes(&self) -> AttributeRecord;

    /// The first descendant (excluding the node itself) matching `selector`.
    fn first_descendant(&self, selector: &str) -> Result<Option<Self>, Error>;
}

/// Parse a CSS selector, reporting failures as extraction errors.
pub fn parse_selector(selector: &str) -> Result<Selector, Error> {
    Selector::parse(selector).map_err(|e| Error::ExtractFailed(format!("invalid selector {selector:?}: {e}")))
}

/// A rendered HTML document.
pub struct HtmlDom {
    document: Html,
}

impl HtmlDom {
    pub fn parse(html: &str) -> Self {
        Self { document: Html::parse_document(html) }
    }
}

impl DomQuery for HtmlDom {
    type Node<'a> = ElementRef<'a>;

    fn query_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, Error> {
        let selector = parse_selector(selector)?;
        Ok(self.document.select(&selector).collect())
    }
}

impl DomNode for ElementRef<'_> {
    fn attributes(&self) -> AttributeRecord {
        self.value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    fn first_descendant(&self, selector: &str) -> Result<Option<Self>, Error> {
        let selector = parse_selector(selector)?;
        Ok(self.select(&selector).next())
    }
}
