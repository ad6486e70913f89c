//! Shared fixtures for the integration tests
//!
//! `page_model()` is a root page at `/content/test/page` whose children map
//! holds three more pages, one of them nested below another
//! (`/content/test/subpage2/subpage22`).

#![allow(dead_code)]

use pagemodel_core::services::{InMemoryModelClient, ModelManager, StaticHost};
use pagemodel_core::ManagerConfig;
use serde_json::{json, Value};
use std::sync::Arc;

pub const ROOT_PATH: &str = "/content/test/page";
pub const CHILD_PAGE_1: &str = "/content/test/child_page_1";
pub const SUBPAGE_2: &str = "/content/test/subpage2";
pub const SUBPAGE_22: &str = "/content/test/subpage2/subpage22";

pub fn grid(order: &[&str], items: Value) -> Value {
    json!({
        "gridClassNames": "aem-Grid aem-Grid--12 aem-Grid--default--12",
        "columnCount": 12,
        ":itemsOrder": order,
        ":items": items,
        ":type": "wcm/foundation/components/responsivegrid"
    })
}

pub fn component(kind: &str) -> Value {
    json!({ ":type": format!("test/components/{}", kind) })
}

pub fn page_root() -> Value {
    grid(
        &["child0000", "child0001"],
        json!({
            "child0000": grid(
                &["child0010", "child0011"],
                json!({
                    "child0010": component("componentchild0"),
                    "child0011": component("componentchild1")
                })
            ),
            "child0001": component("componentchild1")
        }),
    )
}

pub fn child_page_1() -> Value {
    json!({
        ":type": "sample/components/structure/page",
        ":path": CHILD_PAGE_1,
        ":items": {
            "root": grid(
                &["child1000", "child1001"],
                json!({
                    "child1000": {
                        "gridClassNames": "aem-Grid aem-Grid--12 aem-Grid--default--12",
                        "columnCount": 12,
                        ":type": "wcm/foundation/components/responsivegrid"
                    },
                    "child1001": component("componentchild1")
                })
            )
        },
        ":itemsOrder": ["root"]
    })
}

pub fn subpage_2() -> Value {
    json!({
        ":type": "sample/components/structure/page",
        ":items": {
            "root": grid(
                &["child2000", "child2001"],
                json!({
                    "child2000": component("componentchild0"),
                    "child2001": component("componentchild1")
                })
            )
        },
        ":itemsOrder": ["root"]
    })
}

pub fn subpage_22() -> Value {
    json!({
        ":type": "sample/components/structure/page",
        ":items": { "page": component("page") },
        ":itemsOrder": ["page"]
    })
}

/// Root page with all child pages loaded
pub fn page_model() -> Value {
    json!({
        "title": "Sample page",
        "language": "en-US",
        ":itemsOrder": ["root"],
        ":items": { "root": page_root() },
        ":hierarchyType": "page",
        ":children": {
            CHILD_PAGE_1: child_page_1(),
            SUBPAGE_22: subpage_22(),
            SUBPAGE_2: subpage_2()
        },
        ":path": ROOT_PATH,
        ":type": "sample/components/structure/page"
    })
}

/// Root page without any child pages
pub fn bare_page_model() -> Value {
    let mut model = page_model();
    if let Some(map) = model.as_object_mut() {
        map.remove(":children");
    }
    model
}

/// Model request URL of a page in a host without context path
pub fn model_url(path: &str) -> String {
    format!("{}.model.json", path)
}

/// In-memory client serving the bare root page and every child page
pub fn page_client() -> InMemoryModelClient {
    InMemoryModelClient::new()
        .with_model(model_url(ROOT_PATH), bare_page_model())
        .with_model(model_url(CHILD_PAGE_1), child_page_1())
        .with_model(model_url(SUBPAGE_2), subpage_2())
        .with_model(model_url(SUBPAGE_22), subpage_22())
}

/// Manager with default configuration over `client` and `host`
pub fn manager(client: Arc<InMemoryModelClient>, host: StaticHost) -> ModelManager {
    ModelManager::new(ManagerConfig::default(), client, Arc::new(host))
        .expect("default configuration is valid")
}
