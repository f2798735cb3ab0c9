use speculate2::speculate;

speculate! {
    use taskboard::api::create_router;
    use taskboard::client::{ClientError, MutationState, TaskClient, TaskStore};
    use taskboard::db::Database;
    use taskboard::models::{CreateTaskInput, Task, TaskQuery, TaskStatus, UpdateTaskInput};
    use tokio_test::{assert_err, assert_ok};

    /// Serve a fresh database on an ephemeral port for the current runtime.
    async fn spawn_server() -> TaskClient {
        let db = Database::open_in_memory().expect("Failed to create test database");
        db.migrate().expect("Failed to migrate test database");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, create_router(db)).await.unwrap();
        });

        TaskClient::new(format!("http://{}/", addr))
    }

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id).collect()
    }

    fn cached_ids(store: &TaskStore, query: &TaskQuery) -> Vec<i64> {
        ids(store.cache().get(query).expect("entry should be cached"))
    }

    describe "task client" {
        it "talks to the health endpoint" {
            tokio_test::block_on(async {
                let client = spawn_server().await;
                let health = assert_ok!(client.health().await);
                assert_eq!(health.status, "ok");
            });
        }

        it "surfaces error bodies" {
            tokio_test::block_on(async {
                let client = spawn_server().await;
                let err = assert_err!(client.get_task(9).await);
                assert!(err.is_not_found());
                match err {
                    ClientError::Api { message, .. } => assert_eq!(message, "Task not found"),
                    other => panic!("unexpected error: {:?}", other),
                }
            });
        }

        it "sends list parameters" {
            tokio_test::block_on(async {
                let client = spawn_server().await;
                let done = assert_ok!(client.create_task(&CreateTaskInput {
                    status: Some(TaskStatus::Completed),
                    ..CreateTaskInput::new("done")
                }).await);
                assert_ok!(client.create_task(&CreateTaskInput::new("open")).await);

                let query = TaskQuery::default().with_status(TaskStatus::Completed);
                let tasks = assert_ok!(client.list_tasks(&query).await);
                assert_eq!(ids(&tasks), vec![done.id]);
            });
        }
    }

    describe "task store" {
        it "serves lists from cache until refreshed" {
            tokio_test::block_on(async {
                let client = spawn_server().await;
                let first = assert_ok!(client.create_task(&CreateTaskInput::new("first")).await);
                let mut store = TaskStore::new(client.clone());
                let query = TaskQuery::default();

                assert_eq!(ids(&assert_ok!(store.list(&query).await)), vec![first.id]);

                // Written behind the store's back
                let second = assert_ok!(client.create_task(&CreateTaskInput::new("second")).await);
                assert_eq!(ids(&assert_ok!(store.list(&query).await)), vec![first.id]);

                let refreshed = assert_ok!(store.refresh(&query).await);
                assert_eq!(ids(&refreshed), vec![second.id, first.id]);
            });
        }

        it "reconciles an optimistic create with the server record" {
            tokio_test::block_on(async {
                let client = spawn_server().await;
                let mut store = TaskStore::new(client);
                let query = TaskQuery::default();
                assert_ok!(store.list(&query).await);

                let task = assert_ok!(store.create(&query, CreateTaskInput::new("Write docs")).await);
                assert!(task.id > 0);
                assert_eq!(task.status, TaskStatus::Pending);
                assert_eq!(store.last_mutation_state(), Some(MutationState::Reconciled));
                assert_eq!(cached_ids(&store, &query), vec![task.id]);
            });
        }

        it "rolls back a create the server rejects" {
            tokio_test::block_on(async {
                let client = spawn_server().await;
                let mut store = TaskStore::new(client);
                let query = TaskQuery::default();
                assert_ok!(store.list(&query).await);

                let err = assert_err!(store.create(&query, CreateTaskInput::new("  ")).await);
                assert_eq!(err.status(), Some(400));
                assert_eq!(store.last_mutation_state(), Some(MutationState::RolledBack));
                assert!(cached_ids(&store, &query).is_empty());
            });
        }

        it "removes deleted tasks and rolls back a repeated delete" {
            tokio_test::block_on(async {
                let client = spawn_server().await;
                let keep = assert_ok!(client.create_task(&CreateTaskInput::new("keep")).await);
                let gone = assert_ok!(client.create_task(&CreateTaskInput::new("gone")).await);
                let mut store = TaskStore::new(client.clone());
                let query = TaskQuery::default();
                assert_ok!(store.list(&query).await);

                let response = assert_ok!(store.delete(&query, gone.id).await);
                assert!(response.success);
                assert_eq!(store.last_mutation_state(), Some(MutationState::Reconciled));
                assert_eq!(cached_ids(&store, &query), vec![keep.id]);

                let err = assert_err!(store.delete(&query, gone.id).await);
                assert!(err.is_not_found());
                assert_eq!(store.last_mutation_state(), Some(MutationState::RolledBack));
                assert_eq!(cached_ids(&store, &query), vec![keep.id]);

                assert!(assert_err!(client.get_task(gone.id).await).is_not_found());
            });
        }

        it "moves updated tasks out of filtered entries and marks others stale" {
            tokio_test::block_on(async {
                let client = spawn_server().await;
                let task = assert_ok!(client.create_task(&CreateTaskInput::new("finish me")).await);
                let mut store = TaskStore::new(client);

                let pending = TaskQuery::default().with_status(TaskStatus::Pending);
                let completed = TaskQuery::default().with_status(TaskStatus::Completed);
                assert_ok!(store.list(&pending).await);
                assert_ok!(store.list(&completed).await);

                let updated = assert_ok!(
                    store
                        .update(&pending, task.id, UpdateTaskInput::status(TaskStatus::Completed))
                        .await
                );
                assert_eq!(updated.status, TaskStatus::Completed);
                assert_eq!(updated.title, "finish me");
                assert!(updated.updated_at > task.updated_at);

                assert!(cached_ids(&store, &pending).is_empty());
                assert!(!store.cache().is_fresh(&completed));
                assert_eq!(ids(&assert_ok!(store.list(&completed).await)), vec![task.id]);
            });
        }

        it "writes through updates for tasks it has not cached" {
            tokio_test::block_on(async {
                let client = spawn_server().await;
                let task = assert_ok!(client.create_task(&CreateTaskInput::new("elsewhere")).await);
                let mut store = TaskStore::new(client);

                let updated = assert_ok!(
                    store
                        .update(&TaskQuery::default(), task.id, UpdateTaskInput {
                            title: Some("renamed".into()),
                            ..Default::default()
                        })
                        .await
                );
                assert_eq!(updated.title, "renamed");
                assert_eq!(store.last_mutation_state(), None);
            });
        }
    }
}
