#[cfg(test)]
mod tests {
    use std::time::Duration;

    use roster_states::StateCtx;

    use crate::test_utils::{TestContext, page_body, sample_raw_user};
    use crate::users::install;
    use crate::{
        FetchUsersError, Pagination, ProviderError, SettingsState, USERS_LIMIT, UsersProvider,
        read_users,
    };

    fn names(view: &crate::UsersView<'_>) -> Vec<String> {
        view.users.iter().map(|user| user.full_name()).collect()
    }

    async fn mounted_with_ann_and_bob(test_ctx: &TestContext) -> UsersProvider {
        test_ctx
            .mock_users_page(
                None,
                page_body(
                    "abc",
                    2,
                    vec![sample_raw_user("Ann", "Lee"), sample_raw_user("Bob", "Ann")],
                ),
            )
            .await;
        let mut provider = UsersProvider::mount(test_ctx.config());
        provider.settle().await;
        provider
    }

    #[tokio::test]
    async fn test_mount_starts_loading_synchronously() {
        let test_ctx = TestContext::new().await;
        test_ctx
            .mock_users_page(None, page_body("abc", 1, vec![sample_raw_user("Ann", "Lee")]))
            .await;

        let mut provider = UsersProvider::mount(test_ctx.config());

        let view = provider.read();
        assert!(view.users.is_empty());
        assert!(view.is_loading);
        assert!(view.error.is_none());
        assert_eq!(provider.pagination(), &Pagination::default());

        provider.settle().await;
        assert!(!provider.read().is_loading);
    }

    #[tokio::test]
    async fn test_successful_refresh_replaces_users_and_cursor() {
        let test_ctx = TestContext::new().await;
        let provider = mounted_with_ann_and_bob(&test_ctx).await;

        let view = provider.read();
        assert_eq!(names(&view), vec!["Ann Lee", "Bob Ann"]);
        assert!(!view.is_loading);
        assert!(view.error.is_none());
        assert_eq!(
            provider.pagination(),
            &Pagination {
                page: 2,
                limit: USERS_LIMIT,
                seed: "abc".to_owned()
            }
        );
        assert!(provider.last_fetched_at().is_some());

        let queries = test_ctx.users_queries().await;
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].get("page").map(String::as_str), Some("1"));
        assert_eq!(
            queries[0].get("results"),
            Some(&USERS_LIMIT.to_string())
        );
        assert!(!queries[0].contains_key("seed"));
        assert!(!queries[0].contains_key("nat"));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_users() {
        let test_ctx = TestContext::new().await;
        let mut provider = mounted_with_ann_and_bob(&test_ctx).await;
        test_ctx.mock_users_status(Some("fr"), 500).await;

        assert!(provider.set_nationality("fr"));
        assert!(provider.read().is_loading);
        provider.settle().await;

        let view = provider.read();
        assert_eq!(names(&view), vec!["Ann Lee", "Bob Ann"]);
        assert!(!view.is_loading);
        assert_eq!(view.error, Some(&FetchUsersError::Status(500)));
        assert_eq!(provider.pagination().page, 2);
        assert_eq!(provider.pagination().seed, "abc");
    }

    #[tokio::test]
    async fn test_api_error_body_is_a_fetch_failure() {
        let test_ctx = TestContext::new().await;
        test_ctx.mock_users_api_error(None, "Uh oh").await;

        let mut provider = UsersProvider::mount(test_ctx.config());
        provider.settle().await;

        let view = provider.read();
        assert!(view.users.is_empty());
        assert_eq!(view.error, Some(&FetchUsersError::Api("Uh oh".to_owned())));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_a_transport_failure() {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = crate::BusinessConfig::new("http://127.0.0.1:9");

        let mut provider = UsersProvider::mount(config);
        provider.settle().await;

        assert!(matches!(
            provider.read().error,
            Some(FetchUsersError::Transport(_))
        ));
        assert!(!provider.read().is_loading);
    }

    #[tokio::test]
    async fn test_search_filters_view_without_refetching() {
        let test_ctx = TestContext::new().await;
        let mut provider = mounted_with_ann_and_bob(&test_ctx).await;

        provider.set_search("ann");
        assert_eq!(names(&provider.read()), vec!["Ann Lee", "Bob Ann"]);

        provider.set_search("LEE");
        assert_eq!(names(&provider.read()), vec!["Ann Lee"]);

        provider.set_search("");
        assert_eq!(names(&provider.read()), vec!["Ann Lee", "Bob Ann"]);

        assert_eq!(provider.in_flight(), 0);
        provider.settle().await;
        assert_eq!(test_ctx.users_queries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_nationality_change_fetches_once_with_current_cursor() {
        let test_ctx = TestContext::new().await;
        let mut provider = mounted_with_ann_and_bob(&test_ctx).await;
        test_ctx
            .mock_users_page(
                Some("fr"),
                page_body("abc", 3, vec![sample_raw_user("Lucas", "Moreau")]),
            )
            .await;

        assert!(provider.set_nationality("fr"));
        provider.settle().await;

        let queries = test_ctx.users_queries().await;
        assert_eq!(queries.len(), 2);
        let last = &queries[1];
        assert_eq!(last.get("nat").map(String::as_str), Some("fr"));
        assert_eq!(last.get("page").map(String::as_str), Some("2"));
        assert_eq!(last.get("seed").map(String::as_str), Some("abc"));

        assert_eq!(names(&provider.read()), vec!["Lucas Moreau"]);
        assert_eq!(provider.pagination().page, 3);
        assert_eq!(provider.nationality(), "fr");
    }

    #[tokio::test]
    async fn test_same_nationality_does_not_refetch() {
        let test_ctx = TestContext::new().await;
        let mut provider = mounted_with_ann_and_bob(&test_ctx).await;

        assert!(!provider.set_nationality(""));
        assert!(!provider.read().is_loading);
        provider.settle().await;

        assert_eq!(test_ctx.users_queries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_refresh_reuses_nationality_and_cursor() {
        let test_ctx = TestContext::new().await;
        let mut provider = mounted_with_ann_and_bob(&test_ctx).await;

        provider.refresh();
        assert!(provider.read().is_loading);
        provider.settle().await;

        let queries = test_ctx.users_queries().await;
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[1].get("page").map(String::as_str), Some("2"));
        assert!(!queries[1].contains_key("nat"));
    }

    #[tokio::test]
    async fn test_stale_response_never_overwrites_newer_one() {
        let test_ctx = TestContext::new().await;
        test_ctx
            .mock_users_page_delayed(
                Some("us"),
                page_body("slow", 5, vec![sample_raw_user("Stale", "Result")]),
                Duration::from_millis(300),
            )
            .await;
        test_ctx
            .mock_users_page(
                Some("fr"),
                page_body("fast", 2, vec![sample_raw_user("Fresh", "Result")]),
            )
            .await;

        let mut provider = UsersProvider::mount_with(
            test_ctx.config(),
            SettingsState {
                search_nationality: "us".to_owned(),
            },
        );
        // Let the "us" request go out before superseding it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(provider.set_nationality("fr"));
        provider.settle().await;

        // Give the slow response time to arrive if anything were still waiting on it.
        tokio::time::sleep(Duration::from_millis(400)).await;
        provider.sync();

        let view = provider.read();
        assert_eq!(names(&view), vec!["Fresh Result"]);
        assert!(!view.is_loading);
        assert_eq!(provider.pagination().seed, "fast");
    }

    #[tokio::test]
    async fn test_teardown_during_fetch_applies_nothing() {
        let test_ctx = TestContext::new().await;
        test_ctx
            .mock_users_page_delayed(
                None,
                page_body("abc", 2, vec![sample_raw_user("Ann", "Lee")]),
                Duration::from_millis(200),
            )
            .await;

        let mut ctx = StateCtx::new();
        install(&mut ctx, test_ctx.config(), SettingsState::default());
        tokio::time::sleep(Duration::from_millis(20)).await;

        ctx.shutdown().await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(ctx.sync_updates(), 0);

        let view = read_users(&ctx).expect("provider installed");
        assert!(view.users.is_empty());
        assert!(view.error.is_none());
    }

    #[tokio::test]
    async fn test_unmount_with_request_in_flight() {
        let test_ctx = TestContext::new().await;
        test_ctx
            .mock_users_page_delayed(
                None,
                page_body("abc", 2, vec![sample_raw_user("Ann", "Lee")]),
                Duration::from_millis(200),
            )
            .await;

        let mut provider = UsersProvider::mount(test_ctx.config());
        assert_eq!(provider.in_flight(), 1);
        tokio::time::sleep(Duration::from_millis(20)).await;

        provider.teardown().await;
        assert_eq!(provider.in_flight(), 0);

        // The delayed response would have landed by now.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(provider.sync(), 0);
        let view = provider.read();
        assert!(view.users.is_empty());
        assert!(view.error.is_none());
        assert_eq!(provider.pagination(), &Pagination::default());

        provider.unmount().await;
    }

    #[tokio::test]
    async fn test_cancelled_refresh_stops_waiting_on_the_fetch() {
        let test_ctx = TestContext::new().await;
        test_ctx
            .mock_users_page_delayed(
                None,
                page_body("abc", 2, vec![sample_raw_user("Ann", "Lee")]),
                Duration::from_millis(2_000),
            )
            .await;

        let mut ctx = StateCtx::new();
        install(&mut ctx, test_ctx.config(), SettingsState::default());
        tokio::time::sleep(Duration::from_millis(20)).await;
        ctx.invalidate();

        let joined = tokio::time::timeout(
            Duration::from_millis(500),
            ctx.task_set_mut().join_next(),
        )
        .await
        .expect("cancelled run resolves before the response arrives");
        assert!(joined.is_some());
        assert_eq!(ctx.task_count(), 0);
        assert_eq!(ctx.sync_updates(), 0);
    }

    #[tokio::test]
    async fn test_frame_loop_sync_leaves_no_finished_runs_behind() {
        let test_ctx = TestContext::new().await;
        test_ctx
            .mock_users_page(None, page_body("abc", 2, vec![sample_raw_user("Ann", "Lee")]))
            .await;
        test_ctx
            .mock_users_page(
                Some("fr"),
                page_body("abc", 3, vec![sample_raw_user("Lucas", "Moreau")]),
            )
            .await;

        let mut provider = UsersProvider::mount(test_ctx.config());
        for nationality in ["fr", "", "fr", "", "fr"] {
            // Only frame-style syncing, never `settle`.
            for _ in 0..400 {
                if !provider.read().is_loading && provider.in_flight() == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
                provider.sync();
            }
            assert!(!provider.read().is_loading);
            assert_eq!(provider.in_flight(), 0);
            assert!(provider.set_nationality(nationality));
        }

        for _ in 0..400 {
            if !provider.read().is_loading && provider.in_flight() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            provider.sync();
        }
        assert_eq!(provider.in_flight(), 0);
        assert_eq!(names(&provider.read()), vec!["Lucas Moreau"]);
        assert_eq!(test_ctx.users_queries().await.len(), 6);
    }

    #[test]
    fn test_read_users_outside_provider_fails() {
        let ctx = StateCtx::new();
        assert_eq!(read_users(&ctx).err(), Some(ProviderError::NotMounted));
        assert_eq!(
            ProviderError::NotMounted.to_string(),
            "read_users must be used within a UsersProvider"
        );
    }

    #[tokio::test]
    async fn test_read_users_matches_provider_read() {
        let test_ctx = TestContext::new().await;
        let mut provider = mounted_with_ann_and_bob(&test_ctx).await;
        provider.set_search("bob");

        let through_ctx = read_users(provider.ctx()).expect("provider installed");
        assert_eq!(through_ctx, provider.read());
        assert_eq!(provider.search(), "bob");
    }
}
