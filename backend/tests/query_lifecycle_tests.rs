//! Weather query lifecycle tests
//!
//! Create, read, update, delete and list against the in-memory store with
//! stub weather and AI collaborators.

mod common;

use chrono::{Duration, Utc};
use common::*;
use proptest::prelude::*;
use shared::QueryFilter;
use uuid::Uuid;
use weather_query_backend::error::AppError;
use weather_query_backend::services::query::{CreateQueryInput, UpdateQueryInput};
use weather_query_backend::store::QueryStore;

fn create_input(location: &str) -> CreateQueryInput {
    CreateQueryInput {
        location: location.to_string(),
        start_date: iso(today()),
        end_date: iso(today() + Duration::days(2)),
        user_notes: Some("Weekend trip".to_string()),
        tags: vec!["travel".to_string(), " family ".to_string()],
        generate_insight: None,
    }
}

// ============================================================================
// Create / Get
// ============================================================================

#[cfg(test)]
mod create_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let app = app();
        let created = app.state.queries.create(create_input("London")).await.unwrap();

        let fetched = app.state.queries.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.location, "London");
        assert_eq!(fetched.normalized_location, "london");
        assert_eq!(fetched.date_range.start, today());
        assert_eq!(fetched.date_range.end, today() + Duration::days(2));
        assert_eq!(fetched.user_notes, "Weekend trip");
        assert_eq!(fetched.tags, vec!["travel", "family"]);
        assert_eq!(fetched.weather_data.location_name, "London");
        assert!(fetched.coordinates.is_some());
        assert_eq!(fetched.forecast_data.as_ref().map(|f| f.days.len()), Some(5));
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_none() {
        let app = app();
        assert!(app.state.queries.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_reversed_range() {
        let app = app();
        let mut input = create_input("London");
        input.start_date = iso(today() + Duration::days(3));
        input.end_date = iso(today());

        match app.state.queries.create(input).await {
            Err(AppError::Validation { field, message }) => {
                assert_eq!(field, "date_range");
                assert!(message.contains("on or before"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(app.store.count_queries(&QueryFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_date() {
        let app = app();
        let mut input = create_input("London");
        input.start_date = "31/12/2024".to_string();

        let err = app.state.queries.create(input).await.unwrap_err();
        assert!(err.to_string().contains("Invalid start date"));
    }

    #[tokio::test]
    async fn test_create_requires_location() {
        let app = app();
        let err = app.state.queries.create(create_input("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "location"));
        assert_eq!(app.weather.current_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_location_is_not_found() {
        let app = app();
        let err = app
            .state
            .queries
            .create(create_input("Qwxzvbn Plkj"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LocationNotFound(_)));
    }

    #[tokio::test]
    async fn test_misspelled_location_uses_gazetteer_coordinates() {
        let app = app();
        let created = app.state.queries.create(create_input("Lodnon")).await.unwrap();

        assert_eq!(created.location, "Lodnon");
        assert_eq!(created.weather_data.location_name, "London");
    }

    #[tokio::test]
    async fn test_unreachable_provider_fails_create() {
        let weather = StubWeather {
            unreachable: true,
            ..StubWeather::new()
        };
        let app = app_with(weather, None);

        let err = app.state.queries.create(create_input("London")).await.unwrap_err();
        assert!(matches!(err, AppError::WeatherProvider { .. }));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_not_reported_as_bad_location() {
        let weather = StubWeather {
            unreachable: true,
            ..StubWeather::new()
        };
        let app = app_with(weather, None);

        let err = app
            .state
            .queries
            .create(create_input("Reykjavik"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::WeatherProvider { status: None, .. }));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_unknown_city_outside_gazetteer_is_location_not_found() {
        let app = app();

        let err = app
            .state
            .queries
            .create(create_input("Atlantis"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LocationNotFound(_)));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_forecast_failure_is_absorbed() {
        let weather = StubWeather {
            fail_forecast: true,
            ..StubWeather::new()
        };
        let app = app_with(weather, None);

        let created = app.state.queries.create(create_input("Paris")).await.unwrap();
        assert!(created.forecast_data.is_none());
        assert_eq!(created.weather_data.location_name, "Paris");
    }
}

// ============================================================================
// Update
// ============================================================================

#[cfg(test)]
mod update_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_notes_only_keeps_everything_else() {
        let app = app();
        let created = app.state.queries.create(create_input("London")).await.unwrap();

        let outcome = app
            .state
            .queries
            .update(
                created.id,
                UpdateQueryInput {
                    user_notes: Some("Bring boots".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = outcome.query;
        assert!(!outcome.location_changed);
        assert_eq!(updated.user_notes, "Bring boots");
        assert_eq!(updated.location, created.location);
        assert_eq!(updated.date_range, created.date_range);
        assert_eq!(updated.weather_data, created.weather_data);
        assert_eq!(updated.tags, created.tags);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_location_refetches_weather() {
        let app = app();
        let created = app.state.queries.create(create_input("London")).await.unwrap();

        let outcome = app
            .state
            .queries
            .update(
                created.id,
                UpdateQueryInput {
                    location: Some("Paris".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(outcome.location_changed);
        assert_ne!(outcome.query.weather_data, created.weather_data);
        assert_eq!(outcome.query.weather_data.location_name, "Paris");
        assert_eq!(outcome.query.normalized_location, "paris");
        assert_eq!(
            outcome.query.forecast_data.as_ref().map(|f| f.city.as_str()),
            Some("Paris")
        );

        let stored = app.state.queries.get(created.id).await.unwrap().unwrap();
        assert_eq!(stored, outcome.query);
    }

    #[tokio::test]
    async fn test_update_single_date_is_revalidated() {
        let app = app();
        let created = app.state.queries.create(create_input("Tokyo")).await.unwrap();

        let err = app
            .state
            .queries
            .update(
                created.id,
                UpdateQueryInput {
                    end_date: Some(iso(today() - Duration::days(1))),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let outcome = app
            .state
            .queries
            .update(
                created.id,
                UpdateQueryInput {
                    end_date: Some(iso(today() + Duration::days(4))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.query.date_range.start, today());
        assert_eq!(outcome.query.date_range.end, today() + Duration::days(4));
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let app = app();
        let err = app
            .state
            .queries
            .update(Uuid::new_v4(), UpdateQueryInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

// ============================================================================
// Delete
// ============================================================================

#[cfg(test)]
mod delete_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_twice_reports_no_op() {
        let app = app();
        let created = app.state.queries.create(create_input("Paris")).await.unwrap();

        assert!(app.state.queries.delete(created.id).await.unwrap());
        assert!(!app.state.queries.delete(created.id).await.unwrap());
        assert!(app.state.queries.get(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_insights() {
        let app = app();
        let query = sample_query("London", "", &[]);
        app.store.insert_query(&query).await.unwrap();
        app.store
            .insert_insight(&sample_insight(&query, "Rain later"))
            .await
            .unwrap();

        assert!(app.state.queries.delete(query.id).await.unwrap());
        assert!(app.store.find_insight_for_query(query.id).await.unwrap().is_none());
    }
}

// ============================================================================
// List
// ============================================================================

#[cfg(test)]
mod list_tests {
    use super::*;

    async fn seed(app: &TestApp, count: usize) -> Vec<Uuid> {
        let base = Utc::now() - Duration::hours(1);
        let mut ids = Vec::new();
        for i in 0..count {
            let mut query = sample_query(&format!("City {}", i), "", &[]);
            query.created_at = base + Duration::seconds(i as i64);
            query.updated_at = query.created_at;
            app.store.insert_query(&query).await.unwrap();
            ids.push(query.id);
        }
        ids
    }

    #[tokio::test]
    async fn test_second_page_of_twenty_five() {
        let app = app();
        seed(&app, 25).await;

        let page = app
            .state
            .queries
            .list(&QueryFilter::default(), Some(2), Some(10))
            .await
            .unwrap();

        assert_eq!(page.data.len(), 10);
        assert_eq!(page.pagination.page, 2);
        assert_eq!(page.pagination.total_items, 25);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[tokio::test]
    async fn test_newest_first() {
        let app = app();
        let ids = seed(&app, 3).await;

        let page = app
            .state
            .queries
            .list(&QueryFilter::default(), None, None)
            .await
            .unwrap();
        let listed: Vec<Uuid> = page.data.iter().map(|q| q.id).collect();
        assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_latest_insert_first() {
        let app = app();
        let first = sample_query("London", "", &[]);
        let mut second = sample_query("Paris", "", &[]);
        second.created_at = first.created_at;
        app.store.insert_query(&first).await.unwrap();
        app.store.insert_query(&second).await.unwrap();

        let listed = app
            .store
            .find_queries(&QueryFilter::default(), 0, 10)
            .await
            .unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_page_size_is_capped() {
        let app = app();
        seed(&app, 60).await;

        let page = app
            .state
            .queries
            .list(&QueryFilter::default(), Some(1), Some(500))
            .await
            .unwrap();
        assert_eq!(page.data.len(), 50);
        assert_eq!(page.pagination.per_page, 50);
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn test_filters() {
        let app = app();
        let london = sample_query("London, UK", "", &["work"]);
        let paris = sample_query("Paris", "", &["travel", "food"]);
        let mut old = sample_query("New London", "", &[]);
        old.date_range.start = today() - Duration::days(30);
        old.date_range.end = today() - Duration::days(28);
        for q in [&london, &paris, &old] {
            app.store.insert_query(q).await.unwrap();
        }
        app.store
            .insert_insight(&sample_insight(&paris, "Sunny"))
            .await
            .unwrap();

        let by_location = QueryFilter {
            location: Some("LONDON".to_string()),
            ..Default::default()
        };
        assert_eq!(app.state.queries.list(&by_location, None, None).await.unwrap().data.len(), 2);

        let by_tag = QueryFilter {
            tags: vec!["food".to_string(), "work".to_string()],
            ..Default::default()
        };
        assert_eq!(app.state.queries.list(&by_tag, None, None).await.unwrap().data.len(), 2);

        let with_insight = QueryFilter {
            has_insight: Some(true),
            ..Default::default()
        };
        let found = app.state.queries.list(&with_insight, None, None).await.unwrap();
        assert_eq!(found.data.len(), 1);
        assert_eq!(found.data[0].id, paris.id);

        let without_insight = QueryFilter {
            has_insight: Some(false),
            ..Default::default()
        };
        assert_eq!(
            app.state.queries.list(&without_insight, None, None).await.unwrap().pagination.total_items,
            2
        );

        let recent = QueryFilter {
            date_from: Some(today() - Duration::days(1)),
            ..Default::default()
        };
        let found = app.state.queries.list(&recent, None, None).await.unwrap();
        assert!(found.data.iter().all(|q| q.id != old.id));
        assert_eq!(found.data.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let app = app();
        let page = app
            .state
            .queries
            .list(&QueryFilter::default(), Some(3), None)
            .await
            .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total_items, 0);
        assert_eq!(page.pagination.total_pages, 0);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Page slices never exceed the page size and cover the remainder exactly
    #[test]
    fn prop_pagination_slices(total in 0usize..40, per_page in 1u32..15, page in 1u32..6) {
        let app = app();
        let (data_len, meta) = tokio_test::block_on(async {
            for i in 0..total {
                app.store.insert_query(&sample_query(&format!("Town {}", i), "", &[])).await.unwrap();
            }
            let page = app
                .state
                .queries
                .list(&QueryFilter::default(), Some(page), Some(per_page))
                .await
                .unwrap();
            (page.data.len(), page.pagination)
        });

        let offset = ((page - 1) * per_page) as usize;
        let expected = total.saturating_sub(offset).min(per_page as usize);
        prop_assert_eq!(data_len, expected);
        prop_assert_eq!(meta.total_items, total as u64);
        prop_assert_eq!(meta.total_pages as usize, total.div_ceil(per_page as usize));
    }
}
