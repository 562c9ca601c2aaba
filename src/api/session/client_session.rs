//! Client session state.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Description of the graph space a session currently operates in.
#[derive(Debug, Clone)]
pub struct SpaceInfo {
    pub name: String,
    pub id: i64,
}

/// Raw session record as established at authentication time.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: i64,
    pub user_name: String,
    pub timezone: Option<i32>,
}

/// ClientSession tracks who created the session, which space it operates in
/// and the queries currently running under it. One user connection maps to
/// one ClientSession.
#[derive(Debug)]
pub struct ClientSession {
    session: Mutex<Session>,
    space: Mutex<Option<SpaceInfo>>,
    idle_start_time: Mutex<Instant>,
    /// Queries running in this session, keyed by query id.
    queries: DashMap<i64, String>,
}

impl ClientSession {
    pub fn new(session: Session) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(session),
            space: Mutex::new(None),
            idle_start_time: Mutex::new(Instant::now()),
            queries: DashMap::new(),
        })
    }

    pub fn id(&self) -> i64 {
        self.session.lock().session_id
    }

    pub fn user(&self) -> String {
        self.session.lock().user_name.clone()
    }

    pub fn space(&self) -> Option<SpaceInfo> {
        self.space.lock().clone()
    }

    pub fn set_space(&self, space: SpaceInfo) {
        *self.space.lock() = Some(space);
    }

    /// Current space name; empty when no space has been chosen yet.
    pub fn space_name(&self) -> String {
        self.space
            .lock()
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }

    /// Register a running query. Called when a query instance is created.
    pub fn add_query(&self, query_id: i64, stmt: String) {
        self.queries.insert(query_id, stmt);
    }

    /// Deregister a finished query. Returns whether it was still registered,
    /// so terminal paths can assert exactly-once removal.
    pub fn delete_query(&self, query_id: i64) -> bool {
        self.queries.remove(&query_id).is_some()
    }

    pub fn num_queries(&self) -> usize {
        self.queries.len()
    }

    pub fn idle_seconds(&self) -> u64 {
        self.idle_start_time.lock().elapsed().as_secs()
    }

    /// Reset the idle clock; called whenever the session serves a request.
    pub fn charge(&self) {
        *self.idle_start_time.lock() = Instant::now();
    }

    pub fn timezone(&self) -> Option<i32> {
        self.session.lock().timezone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_session() -> Arc<ClientSession> {
        ClientSession::new(Session {
            session_id: 7,
            user_name: "root".to_string(),
            timezone: None,
        })
    }

    #[test]
    fn test_space_selection() {
        let session = new_session();
        assert_eq!(session.space_name(), "");

        session.set_space(SpaceInfo {
            name: "nba".to_string(),
            id: 1,
        });
        assert_eq!(session.space_name(), "nba");
    }

    #[test]
    fn test_query_registry() {
        let session = new_session();
        session.add_query(1, "YIELD 1".to_string());
        assert_eq!(session.num_queries(), 1);

        assert!(session.delete_query(1));
        assert!(!session.delete_query(1));
        assert_eq!(session.num_queries(), 0);
    }
}
