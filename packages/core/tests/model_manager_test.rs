//! Model Manager Tests
//!
//! Initialization, caching, fetch deduplication, listener notification and
//! event emission of `ModelManager` over an in-memory model client.

mod common;

#[cfg(test)]
mod model_manager_tests {
    use super::common::{self, model_url, CHILD_PAGE_1, ROOT_PATH, SUBPAGE_2};
    use anyhow::Result;
    use pagemodel_core::models::MetaProperty;
    use pagemodel_core::services::{
        GetDataOptions, InMemoryModelClient, InitOptions, ModelListener, ModelManagerError,
        StaticHost,
    };
    use pagemodel_core::{ModelEvent, ModelStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn counting_listener() -> (ModelListener, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let listener: ModelListener = Arc::new(move |_path: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (listener, calls)
    }

    #[tokio::test]
    async fn test_initialize_from_current_location() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(
            Arc::clone(&client),
            StaticHost::new().with_pathname(format!("{}.html", ROOT_PATH)),
        );

        let model = manager.initialize(InitOptions::new()).await?;

        assert_eq!(model, common::bare_page_model());
        assert_eq!(manager.root_path().await.as_deref(), Some(ROOT_PATH));
        assert_eq!(client.fetch_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_fetches_missing_current_page() -> Result<()> {
        let client = Arc::new(common::page_client());
        let host = StaticHost::new()
            .with_meta(MetaProperty::PAGE_MODEL_ROOT_URL, format!("{}.html", ROOT_PATH))
            .with_pathname(format!("{}.html", CHILD_PAGE_1));
        let manager = common::manager(Arc::clone(&client), host);

        manager.initialize(InitOptions::new()).await?;

        assert_eq!(client.fetch_count(), 2);
        assert_eq!(manager.root_path().await.as_deref(), Some(ROOT_PATH));
        assert_eq!(manager.get_data(CHILD_PAGE_1).await?, common::child_page_1());
        assert_eq!(client.fetch_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_skips_current_page_already_in_root() -> Result<()> {
        let client = Arc::new(
            InMemoryModelClient::new().with_model(model_url(ROOT_PATH), common::page_model()),
        );
        let host = StaticHost::new()
            .with_meta(MetaProperty::PAGE_MODEL_ROOT_URL, ROOT_PATH)
            .with_pathname(format!("{}.html", CHILD_PAGE_1));
        let manager = common::manager(Arc::clone(&client), host);

        let model = manager.initialize(InitOptions::new()).await?;

        assert_eq!(model, common::page_model());
        assert_eq!(client.fetch_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_current_page_fetch_still_initializes() -> Result<()> {
        let client = Arc::new(common::page_client());
        client.fail_with(model_url(CHILD_PAGE_1), 500);
        let host = StaticHost::new()
            .with_meta(MetaProperty::PAGE_MODEL_ROOT_URL, ROOT_PATH)
            .with_pathname(format!("{}.html", CHILD_PAGE_1));
        let manager = common::manager(Arc::clone(&client), host);

        let model = manager.initialize(InitOptions::new()).await?;

        assert_eq!(model, common::bare_page_model());
        assert_eq!(client.fetch_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_with_supplied_model_skips_fetch() -> Result<()> {
        let client = Arc::new(InMemoryModelClient::new());
        let manager = common::manager(Arc::clone(&client), StaticHost::new());

        let model = manager
            .initialize(
                InitOptions::new()
                    .with_path(ROOT_PATH)
                    .with_model(common::page_model()),
            )
            .await?;

        assert_eq!(model, common::page_model());
        assert_eq!(client.fetch_count(), 0);
        assert_eq!(manager.get_data(SUBPAGE_2).await?, common::subpage_2());
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_with_prepared_store_skips_fetch() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(Arc::clone(&client), StaticHost::new());
        let store = ModelStore::new(Some(ROOT_PATH), Some(common::page_model()));

        let model = manager
            .initialize(InitOptions::new().with_path(ROOT_PATH).with_store(store))
            .await?;

        assert_eq!(model, common::page_model());
        assert_eq!(client.fetch_count(), 0);
        assert_eq!(manager.root_path().await.as_deref(), Some(ROOT_PATH));
        assert_eq!(manager.get_data(CHILD_PAGE_1).await?, common::child_page_1());
        assert_eq!(client.fetch_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_with_empty_prepared_store_fetches_root() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(Arc::clone(&client), StaticHost::new());

        let model = manager
            .initialize(InitOptions::new().with_path(ROOT_PATH).with_store(ModelStore::default()))
            .await?;

        assert_eq!(model, common::bare_page_model());
        assert_eq!(client.fetch_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_rejects_empty_supplied_model() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(Arc::clone(&client), StaticHost::new());

        let err = manager
            .initialize(InitOptions::new().with_path(ROOT_PATH).with_model(json!({})))
            .await
            .unwrap_err();

        assert!(matches!(err, ModelManagerError::InvalidConfig(_)));
        assert_eq!(client.fetch_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_with_replacement_client() -> Result<()> {
        let unused = Arc::new(InMemoryModelClient::new());
        let client = Arc::new(common::page_client());
        let manager = common::manager(Arc::clone(&unused), StaticHost::new());

        manager
            .initialize(InitOptions::new().with_path(ROOT_PATH).with_client(client.clone()))
            .await?;

        assert_eq!(unused.fetch_count(), 0);
        assert_eq!(client.fetch_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_propagates_fetch_failure() -> Result<()> {
        let client = Arc::new(common::page_client());
        client.fail_with(model_url(ROOT_PATH), 500);
        let manager = common::manager(Arc::clone(&client), StaticHost::new());

        let err = manager.initialize(ROOT_PATH).await.unwrap_err();

        match err {
            ModelManagerError::Fetch(e) => assert_eq!(e.status_code(), Some(500)),
            other => panic!("unexpected error: {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_emits_events() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(client, StaticHost::new());
        let mut events = manager.subscribe_to_events();

        manager.initialize(ROOT_PATH).await?;

        let first = events.recv().await?;
        assert_eq!(
            first,
            ModelEvent::Initialized {
                root_path: ROOT_PATH.to_string()
            }
        );

        let second = events.recv().await?;
        assert_eq!(second.event_type(), "cq-pagemodel-loaded");
        assert_eq!(
            second,
            ModelEvent::Loaded {
                model: common::bare_page_model()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_cached_data_is_not_refetched() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(Arc::clone(&client), StaticHost::new());
        manager.initialize(ROOT_PATH).await?;

        let first = manager.get_data(CHILD_PAGE_1).await?;
        let second = manager.get_data(CHILD_PAGE_1).await?;
        let root = manager.get_data(GetDataOptions::default()).await?;

        assert_eq!(first, second);
        assert_eq!(root[":children"][CHILD_PAGE_1], common::child_page_1());
        assert_eq!(client.fetch_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_force_reload_fetches_again() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(Arc::clone(&client), StaticHost::new());
        manager.initialize(ROOT_PATH).await?;
        manager.get_data(CHILD_PAGE_1).await?;

        let changed = json!({ ":type": "sample/components/structure/page", "title": "changed" });
        client.insert(model_url(CHILD_PAGE_1), changed.clone());

        assert_eq!(manager.get_data(CHILD_PAGE_1).await?, common::child_page_1());
        assert_eq!(manager.get_data(GetDataOptions::reload(CHILD_PAGE_1)).await?, changed);
        assert_eq!(manager.get_data(CHILD_PAGE_1).await?, changed);
        assert_eq!(client.fetch_count(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_reloading_root_replaces_tree() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(Arc::clone(&client), StaticHost::new());
        manager.initialize(ROOT_PATH).await?;

        client.insert(model_url(ROOT_PATH), common::page_model());
        let reloaded = manager.get_data(GetDataOptions::reload(ROOT_PATH)).await?;

        assert_eq!(reloaded, common::page_model());
        assert_eq!(manager.get_data(SUBPAGE_2).await?, common::subpage_2());
        assert_eq!(client.fetch_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() -> Result<()> {
        let client = Arc::new(common::page_client().with_delay(Duration::from_millis(50)));
        let manager = common::manager(Arc::clone(&client), StaticHost::new());
        manager.initialize(ROOT_PATH).await?;
        assert_eq!(client.fetch_count(), 1);

        let requests = (0..8).map(|_| {
            let manager = manager.clone();
            async move { manager.get_data(CHILD_PAGE_1).await }
        });
        let results = futures::future::join_all(requests).await;

        assert_eq!(client.fetch_count(), 2);
        for result in results {
            assert_eq!(result?, common::child_page_1());
        }
        assert_eq!(manager.pending_fetch_count(), 0);

        manager.get_data(GetDataOptions::reload(CHILD_PAGE_1)).await?;
        assert_eq!(client.fetch_count(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(Arc::clone(&client), StaticHost::new());
        manager.initialize(ROOT_PATH).await?;

        let err = manager.get_data("/content/test/unknown").await.unwrap_err();
        assert!(matches!(err, ModelManagerError::Fetch(_)));
        assert_eq!(manager.pending_fetch_count(), 0);

        client.insert(model_url("/content/test/unknown"), json!({ "title": "found" }));
        assert_eq!(manager.get_data("/content/test/unknown").await?["title"], "found");
        Ok(())
    }

    #[tokio::test]
    async fn test_returned_data_is_a_copy() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(client, StaticHost::new());
        manager.initialize(ROOT_PATH).await?;

        let path = format!("{}/jcr:content/root", ROOT_PATH);
        let mut data = manager.get_data(path.as_str()).await?;
        data[":itemsOrder"] = json!([]);

        assert_eq!(manager.get_data(path.as_str()).await?, common::page_root());
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_notifies_page_and_root_listeners() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(client, StaticHost::new());
        manager.initialize(ROOT_PATH).await?;

        let (page_listener, page_calls) = counting_listener();
        let (root_listener, root_calls) = counting_listener();
        manager.add_listener(CHILD_PAGE_1, page_listener).await;
        manager.add_listener(ROOT_PATH, root_listener).await;

        manager.get_data(CHILD_PAGE_1).await?;

        assert_eq!(page_calls.load(Ordering::SeqCst), 1);
        assert_eq!(root_calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_root_path_and_empty_path_share_listeners() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(client, StaticHost::new());
        manager.initialize(ROOT_PATH).await?;

        let (listener, calls) = counting_listener();
        manager.add_listener("", listener.clone()).await;

        manager.notify_listeners(ROOT_PATH).await;
        manager.notify_listeners("").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        manager.remove_listener(ROOT_PATH, &listener).await;
        manager.notify_listeners("").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_stop_others() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(client, StaticHost::new());
        manager.initialize(ROOT_PATH).await?;

        let failing: ModelListener =
            Arc::new(|_path: &str| -> Result<()> { anyhow::bail!("listener failed") });
        let (listener, calls) = counting_listener();
        manager.add_listener(CHILD_PAGE_1, failing).await;
        manager.add_listener(CHILD_PAGE_1, listener).await;

        manager.notify_listeners(CHILD_PAGE_1).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_clears_listeners() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(client, StaticHost::new());
        manager.initialize(ROOT_PATH).await?;

        let (listener, calls) = counting_listener();
        manager.add_listener(CHILD_PAGE_1, listener).await;
        manager.initialize(ROOT_PATH).await?;
        manager.notify_listeners(CHILD_PAGE_1).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_data_without_root_is_rejected() -> Result<()> {
        let manager = common::manager(Arc::new(InMemoryModelClient::new()), StaticHost::new());

        let err = manager.get_data(GetDataOptions::default()).await.unwrap_err();

        assert!(matches!(err, ModelManagerError::InvalidPath(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_data_before_initialize_loads_root() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(Arc::clone(&client), StaticHost::new());

        let model = manager.get_data(CHILD_PAGE_1).await?;

        assert_eq!(model, common::child_page_1());
        assert!(manager.read_store(|store| store.is_initialized()).await);
        Ok(())
    }

    #[tokio::test]
    async fn test_destroy_clears_state() -> Result<()> {
        let client = Arc::new(common::page_client());
        let manager = common::manager(client, StaticHost::new());
        manager.initialize(ROOT_PATH).await?;

        manager.destroy().await;

        assert_eq!(manager.root_path().await, None);
        assert!(manager.read_store(|store| !store.is_initialized()).await);
        Ok(())
    }

    #[tokio::test]
    async fn test_context_path_is_applied_to_requests() -> Result<()> {
        let client = Arc::new(
            InMemoryModelClient::new()
                .with_model(format!("/ctx{}", model_url(ROOT_PATH)), common::bare_page_model()),
        );
        let host = StaticHost::new().with_pathname(format!("/ctx{}.html", ROOT_PATH));
        let manager = common::manager(Arc::clone(&client), host);

        manager.initialize(InitOptions::new()).await?;

        assert_eq!(manager.root_path().await.as_deref(), Some(ROOT_PATH));
        assert_eq!(client.fetch_count(), 1);
        Ok(())
    }
}
