use std::sync::Arc;

use chrono::{Duration, Utc};
use session_kit::{InMemorySessionStore, Session, SessionStore, StorageError};

/// Concurrent access to the in-memory store
///
/// Many tasks hammer a small set of shared tokens while each also owns a
/// private token used to check read-your-writes.

const TASKS: usize = 16;
const ROUNDS: usize = 200;
const SHARED_TOKENS: usize = 4;

fn live_session(token: &str) -> Session {
    let mut session = Session::new(token, "");
    session.expires_at = Utc::now() + Duration::hours(1);
    session
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_store_stress() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(InMemorySessionStore::new());

    let mut handles = Vec::with_capacity(TASKS);
    for task in 0..TASKS {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let own_token = format!("own-{task}");
            store.create(&live_session(&own_token)).await?;

            for round in 0..ROUNDS {
                let shared = format!("shared-{}", (task + round) % SHARED_TOKENS);

                match round % 5 {
                    0 => store.create(&live_session(&shared)).await?,
                    1 => match store.get(&shared).await {
                        Ok(session) => assert_eq!(session.token, shared),
                        Err(StorageError::NotFound) => {}
                        Err(e) => return Err(e),
                    },
                    2 => {
                        let mut session = live_session(&shared);
                        session.set("writer", task as i64);
                        match store.update(&session).await {
                            Ok(()) | Err(StorageError::NotFound) => {}
                            Err(e) => return Err(e),
                        }
                    }
                    3 => {
                        let now = Utc::now();
                        match store
                            .update_activity(&shared, now, now + Duration::minutes(30))
                            .await
                        {
                            Ok(()) | Err(StorageError::NotFound) => {}
                            Err(e) => return Err(e),
                        }
                    }
                    _ => store.delete(&shared).await?,
                }

                // Read-your-writes on the private token
                let mut own = store.get(&own_token).await?;
                own.set("round", round as i64);
                store.update(&own).await?;
                let seen = store.get(&own_token).await?;
                assert_eq!(seen.get_int("round"), Some(round as i64));
            }
            Ok::<_, StorageError>(())
        }));
    }

    for handle in handles {
        handle.await??;
    }

    // Final state: every private session holds its last write
    for task in 0..TASKS {
        let own = store.get(&format!("own-{task}")).await?;
        assert_eq!(own.get_int("round"), Some(ROUNDS as i64 - 1));
    }

    // Shared tokens are either gone or intact
    for index in 0..SHARED_TOKENS {
        let token = format!("shared-{index}");
        match store.get(&token).await {
            Ok(session) => {
                assert_eq!(session.token, token);
                assert!(!session.is_expired());
            }
            Err(StorageError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let stats = store.stats().await;
    assert!(stats.total >= TASKS && stats.total <= TASKS + SHARED_TOKENS);
    assert_eq!(stats.authenticated, 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_get_isolated_copies() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(InMemorySessionStore::new());
    let mut session = live_session("shared");
    session.set("value", "original");
    store.create(&session).await?;

    let mut handles = Vec::new();
    for task in 0..TASKS {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let mut copy = store.get("shared").await?;
            copy.set("value", format!("mutated-by-{task}"));
            copy.clear();
            Ok::<_, StorageError>(())
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let stored = store.get("shared").await?;
    assert_eq!(stored.get_string("value"), Some("original".to_string()));
    Ok(())
}
