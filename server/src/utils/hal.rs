//! HAL hypermedia representations.
//!
//! Resources carry a `_links` object keyed by relation name; collections put
//! their items under `_embedded` and add `page` metadata.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::page::{Page, PageMetadata, PageRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, Link>);

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, rel: &str, link: Link) -> Self {
        self.add(rel, link);
        self
    }

    pub fn add(&mut self, rel: &str, link: Link) {
        self.0.insert(rel.to_string(), link);
    }

    pub fn get(&self, rel: &str) -> Option<&Link> {
        self.0.get(rel)
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.0.contains_key(rel)
    }
}

/// A single resource with its links inlined next to its own fields.
#[derive(Debug, Clone, Serialize)]
pub struct EntityModel<T> {
    #[serde(flatten)]
    pub content: T,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl<T> EntityModel<T> {
    pub fn new(content: T, links: Links) -> Self {
        Self { content, links }
    }

    pub fn add_link(&mut self, rel: &str, link: Link) {
        self.links.add(rel, link);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PagedModel<T> {
    #[serde(rename = "_embedded", skip_serializing_if = "BTreeMap::is_empty")]
    pub embedded: BTreeMap<&'static str, Vec<T>>,
    #[serde(rename = "_links")]
    pub links: Links,
    pub page: PageMetadata,
}

impl<T> PagedModel<T> {
    /// Wraps `page` with navigation links built by `href_for`, which turns a
    /// page request into the collection URL for that page.
    pub fn new(
        relation: &'static str,
        page: Page<T>,
        request: &PageRequest,
        href_for: impl Fn(&PageRequest) -> String,
    ) -> Self {
        let mut links = Links::new();
        let total_pages = page.total_pages();

        if total_pages > 1 {
            links.add("first", Link::new(href_for(&request.with_page(0))));
        }
        if page.has_previous() {
            links.add("prev", Link::new(href_for(&request.with_page(page.number - 1))));
        }
        links.add("self", Link::new(href_for(request)));
        if let Some(next) = page.number.checked_add(1).filter(|_| page.has_next()) {
            links.add("next", Link::new(href_for(&request.with_page(next))));
        }
        if total_pages > 1 {
            links.add("last", Link::new(href_for(&request.with_page(total_pages - 1))));
        }

        let metadata = page.metadata();
        let mut embedded = BTreeMap::new();
        if !page.content.is_empty() {
            embedded.insert(relation, page.content);
        }

        Self {
            embedded,
            links,
            page: metadata,
        }
    }

    pub fn add_link(&mut self, rel: &str, link: Link) {
        self.links.add(rel, link);
    }
}

/// Path builders for every linked resource.
pub mod links {
    use super::Link;
    use crate::models::event::EventId;
    use crate::models::page::PageRequest;

    pub const INDEX: &str = "/api";
    pub const EVENTS: &str = "/api/events";
    const DOCS: &str = "/docs/index.html";

    pub fn index() -> Link {
        Link::new(INDEX)
    }

    pub fn events() -> Link {
        Link::new(EVENTS)
    }

    pub fn event(id: EventId) -> Link {
        Link::new(event_path(id))
    }

    pub fn event_path(id: EventId) -> String {
        format!("{}/{}", EVENTS, id)
    }

    pub fn events_page(request: &PageRequest) -> String {
        let mut href = format!("{}?page={}&size={}", EVENTS, request.page, request.size);
        if let Some(sort) = &request.sort {
            href.push_str("&sort=");
            href.push_str(&sort.to_param());
        }
        href
    }

    pub fn profile(anchor: &str) -> Link {
        Link::new(format!("{}#{}", DOCS, anchor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::page::{Direction, EventSortField, Sort};

    #[test]
    fn test_entity_model_flattens_content() {
        let model = EntityModel::new(
            serde_json::json!({ "id": 1, "name": "event" }),
            Links::new().with("self", links::event(1)),
        );
        let json = serde_json::to_value(&model).unwrap();

        assert_eq!(json["name"], "event");
        assert_eq!(json["_links"]["self"]["href"], "/api/events/1");
    }

    #[test]
    fn test_paged_model_middle_page_links() {
        let request = PageRequest::new(1, 10).with_sort(Sort {
            field: EventSortField::Name,
            direction: Direction::Desc,
        });
        let page = Page::new((0..10).collect::<Vec<i32>>(), &request, 30);
        let model = PagedModel::new("eventList", page, &request, links::events_page);

        for rel in ["first", "prev", "self", "next", "last"] {
            assert!(model.links.contains(rel), "missing {}", rel);
        }
        assert_eq!(
            model.links.get("next").unwrap().href,
            "/api/events?page=2&size=10&sort=name,DESC"
        );
        assert_eq!(model.page.total_pages, 3);
        assert_eq!(model.embedded["eventList"].len(), 10);
    }

    #[test]
    fn test_paged_model_single_page_has_only_self() {
        let request = PageRequest::default();
        let page = Page::new(vec![1, 2, 3], &request, 3);
        let model = PagedModel::new("eventList", page, &request, links::events_page);

        assert!(model.links.contains("self"));
        assert!(!model.links.contains("first"));
        assert!(!model.links.contains("next"));
    }

    #[test]
    fn test_empty_page_omits_embedded() {
        let request = PageRequest::default();
        let page: Page<i32> = Page::new(vec![], &request, 0);
        let json =
            serde_json::to_value(PagedModel::new("eventList", page, &request, links::events_page))
                .unwrap();

        assert!(json.get("_embedded").is_none());
        assert_eq!(json["page"]["totalElements"], 0);
    }
}
