//! Session persistence through the file-backed store.

use std::sync::Arc;

use roshnet_core::models::AuthProvider;
use roshnet_core::services::session_service::{Session, SessionConfig, SESSION_KEY};
use roshnet_core::store::{FileSessionStore, SessionStore};

fn config(dir: &std::path::Path) -> SessionConfig {
    SessionConfig {
        session_dir: dir.to_string_lossy().into_owned(),
        login_delay_ms: 0,
    }
}

#[tokio::test]
async fn login_survives_restart_and_logout_clears_it() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let mut session = Session::new(Arc::new(FileSessionStore::new(&config.session_dir)), &config);
    let user = session.login(AuthProvider::Email, Some("trader@roshnet.ai")).await.unwrap().clone();

    let store = FileSessionStore::new(&config.session_dir);
    let raw = store.get(SESSION_KEY).unwrap().unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["email"], "trader@roshnet.ai");
    assert_eq!(stored["name"], "trader");

    let mut restarted = Session::new(Arc::new(store), &config);
    assert_eq!(restarted.load().unwrap(), Some(&user));

    restarted.logout().unwrap();
    assert!(!restarted.is_authenticated());

    let mut after_logout = Session::new(Arc::new(FileSessionStore::new(&config.session_dir)), &config);
    assert!(after_logout.load().unwrap().is_none());
}
