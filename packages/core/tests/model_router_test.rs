//! Model Router Tests
//!
//! Route switching, route filters and the `RouteChanged` broadcast.

mod common;

#[cfg(test)]
mod model_router_tests {
    use super::common::{self, CHILD_PAGE_1, ROOT_PATH, SUBPAGE_2};
    use anyhow::Result;
    use pagemodel_core::models::MetaProperty;
    use pagemodel_core::services::{
        InMemoryModelClient, ModelManager, ModelRouter, RouteOutcome, StaticHost,
    };
    use pagemodel_core::ModelEvent;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    async fn router(
        host: StaticHost,
    ) -> Result<(ModelRouter, ModelManager, Arc<InMemoryModelClient>)> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(Arc::clone(&client), host);
        manager.initialize(ROOT_PATH).await?;
        Ok((ModelRouter::new(manager.clone()), manager, client))
    }

    #[tokio::test]
    async fn test_route_loads_and_broadcasts() -> Result<()> {
        let (router, manager, client) = router(StaticHost::new()).await?;
        let mut events = manager.subscribe_to_events();

        let outcome = router.route(CHILD_PAGE_1).await?;

        assert_eq!(
            outcome,
            RouteOutcome::Routed {
                path: CHILD_PAGE_1.to_string(),
                model: common::child_page_1(),
            }
        );
        assert_eq!(
            events.recv().await?,
            ModelEvent::RouteChanged {
                path: CHILD_PAGE_1.to_string(),
                model: common::child_page_1(),
            }
        );
        assert_eq!(client.fetch_count(), 2);

        // Routing back to a loaded page is served from the store
        router.route(CHILD_PAGE_1).await?;
        assert_eq!(client.fetch_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_router_disabled_by_meta() -> Result<()> {
        let host = StaticHost::new().with_meta(MetaProperty::PAGE_MODEL_ROUTER, "false");
        let (router, _manager, client) = router(host).await?;

        assert!(!router.is_enabled());
        assert_eq!(router.route(CHILD_PAGE_1).await?, RouteOutcome::Disabled);
        assert_eq!(client.fetch_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_router_enabled_by_default() -> Result<()> {
        let host = StaticHost::new().with_meta(MetaProperty::PAGE_MODEL_ROUTER, "true");
        let (explicit, _manager, _client) = router(host).await?;
        assert!(explicit.is_enabled());

        let (default, _manager, _client) = router(StaticHost::new()).await?;
        assert!(default.is_enabled());
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_and_root_routes_are_skipped() -> Result<()> {
        let (router, _manager, client) = router(StaticHost::new()).await?;

        assert_eq!(router.route("").await?, RouteOutcome::Skipped);
        assert_eq!(router.route("/").await?, RouteOutcome::Skipped);
        assert_eq!(client.fetch_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_filtered_routes_are_excluded() -> Result<()> {
        let host = StaticHost::new()
            .with_meta(MetaProperty::PAGE_MODEL_ROUTE_FILTERS, "^/content/other,.*/subpage2$");
        let (router, _manager, client) = router(host).await?;

        assert!(router.is_route_excluded(SUBPAGE_2));
        assert!(router.is_route_excluded("/content/other/page"));
        assert!(!router.is_route_excluded(CHILD_PAGE_1));

        assert_eq!(router.route(SUBPAGE_2).await?, RouteOutcome::Excluded);
        assert_eq!(client.fetch_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_filter_is_skipped() -> Result<()> {
        let host = StaticHost::new()
            .with_meta(MetaProperty::PAGE_MODEL_ROUTE_FILTERS, "([,.*/child_page_1$");
        let (router, _manager, _client) = router(host).await?;

        assert!(router.is_route_excluded(CHILD_PAGE_1));
        assert!(!router.is_route_excluded(SUBPAGE_2));
        Ok(())
    }

    #[tokio::test]
    async fn test_route_current_location() -> Result<()> {
        let host = StaticHost::new();
        host.navigate(format!("{}.html", SUBPAGE_2));
        let (router, _manager, _client) = router(host).await?;

        let outcome = router.route_current().await?;

        assert_eq!(
            outcome,
            RouteOutcome::Routed {
                path: SUBPAGE_2.to_string(),
                model: common::subpage_2(),
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_route_to_unknown_page_fails() -> Result<()> {
        let (router, _manager, _client) = router(StaticHost::new()).await?;

        assert!(router.route("/content/test/unknown").await.is_err());
        Ok(())
    }
}
