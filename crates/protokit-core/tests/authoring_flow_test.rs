//! Integration test: app-authoring flow (store → registry → composer → download).
//!
//! Verifies that:
//! 1. Disjoint import sets merge into their sorted union with no duplicates.
//! 2. Adding the same component twice appends its body twice.
//! 3. `most_recent` on an empty directory regenerates exactly one placeholder app.
//! 4. Duplicate component names resolve to the later url, and fetches are memoized.
//! 5. Download payloads decode to the exact app bytes.
//! 6. A merge whose save fails leaves the app file untouched.

use async_trait::async_trait;
use protokit_core::{
    compose, split_imports, AppComposer, AppStore, ComponentRegistry, EditorSession, Fetch,
    RegistryError, COMPONENT_MARKER,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory registry transport that counts requests per url.
struct FakeFetcher {
    responses: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            responses: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Fetch for FakeFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| RegistryError::Status {
                status: 404,
                url: url.to_string(),
            })
    }
}

const INDEX_URL: &str = "https://registry.test/index.json";

#[test]
fn disjoint_imports_merge_to_sorted_union() {
    let app = "import streamlit as st\nimport requests\n\nst.write('app')";
    let component = "from PIL import Image\nimport numpy as np\n\nst.image(np.zeros((2, 2)))";
    let merged = compose(app, component);

    let (imports, _) = split_imports(&merged);
    let lines: Vec<&str> = imports.iter().collect();
    assert_eq!(
        lines,
        vec![
            "from PIL import Image",
            "import numpy as np",
            "import requests",
            "import streamlit as st",
        ]
    );
    let block: Vec<&str> = merged.lines().take_while(|l| !l.is_empty()).collect();
    assert_eq!(block, lines, "import block leads the file, sorted, unique");
}

#[test]
fn adding_component_twice_duplicates_body() {
    let tmp = tempfile::tempdir().unwrap();
    let store = AppStore::new(tmp.path().join("app_data"), ".py");
    let id = store.ensure_default_app().unwrap();

    let component = "import pandas as pd\n\nst.dataframe(pd.DataFrame({'a': [1]}))\n";
    AppComposer::add_component(&store, &id, component).unwrap();
    let merged = AppComposer::add_component(&store, &id, component).unwrap();

    assert_eq!(merged.matches("st.dataframe(pd.DataFrame({'a': [1]}))").count(), 2);
    assert_eq!(merged.matches(COMPONENT_MARKER).count(), 2);
    assert_eq!(merged.matches("import pandas as pd").count(), 1);
    assert_eq!(store.read(&id).unwrap(), merged);
}

#[test]
fn compose_failure_leaves_nothing_behind() {
    let tmp = tempfile::tempdir().unwrap();
    let store = AppStore::new(tmp.path().join("never_created"), ".py");
    let id = protokit_core::AppId::parse("20240101_120000").unwrap();
    assert!(AppComposer::add_component(&store, &id, "x = 1").is_err());
    assert!(!store.dir().exists());
}

#[test]
fn failed_write_keeps_original_app() {
    let tmp = tempfile::tempdir().unwrap();
    let store = AppStore::new(tmp.path().join("app_data"), ".py");
    let id = store.ensure_default_app().unwrap();
    let before = store.read(&id).unwrap();

    // Occupy the temp-file slot with a directory so the save cannot go through.
    let blocker = store.dir().join(format!(".{}.py.tmp", id));
    std::fs::create_dir(&blocker).unwrap();

    let err = AppComposer::add_component(&store, &id, "import pandas as pd\nst.write(1)").unwrap_err();
    assert!(matches!(
        err,
        protokit_core::ComposeError::Store(protokit_core::FilesystemError::Write { .. })
    ));
    assert_eq!(store.read(&id).unwrap(), before);
    assert!(!store.read(&id).unwrap().contains(COMPONENT_MARKER));
}

#[test]
fn most_recent_on_empty_dir_creates_one_placeholder() {
    let tmp = tempfile::tempdir().unwrap();
    let store = AppStore::new(tmp.path().join("app_data"), ".py");

    let first = store.most_recent(1).unwrap();
    assert_eq!(first.len(), 1);
    assert!(first[0].is_file());

    let second = store.most_recent(5).unwrap();
    assert_eq!(second, first);
}

#[tokio::test]
async fn registry_duplicate_names_and_memoization() {
    let index = r#"[
        {"name": "Charts", "url": "https://registry.test/charts_v1.py"},
        {"name": "Maps", "url": "https://registry.test/maps.py"},
        {"name": "Notes", "url": null},
        {"name": "Charts", "url": "https://registry.test/charts_v2.py"}
    ]"#;
    let fetcher = Arc::new(FakeFetcher::new(&[
        (INDEX_URL, index),
        ("https://registry.test/charts_v2.py", "import altair as alt\nst.altair_chart(alt.Chart())"),
    ]));
    let registry = ComponentRegistry::new(fetcher.clone(), ".py");

    let components = registry.list_components(INDEX_URL).await.unwrap();
    assert_eq!(components.len(), 2);
    assert_eq!(components[0].name, "Charts");
    assert_eq!(components[0].url, "https://registry.test/charts_v2.py");

    registry.list_components(INDEX_URL).await.unwrap();
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1, "index fetched once");

    let charts = registry.find(INDEX_URL, "Charts").await.unwrap();
    let a = registry.fetch_source(&charts.url).await.unwrap();
    let b = registry.fetch_source(&charts.url).await.unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2, "source fetched once");

    assert!(matches!(
        registry.find(INDEX_URL, "Nope").await,
        Err(RegistryError::UnknownComponent(_))
    ));
}

#[tokio::test]
async fn registry_failures_are_not_cached() {
    let fetcher = Arc::new(FakeFetcher::new(&[]));
    let registry = ComponentRegistry::new(fetcher.clone(), ".py");
    assert!(matches!(
        registry.list_components(INDEX_URL).await,
        Err(RegistryError::Status { status: 404, .. })
    ));
    assert!(registry.list_components(INDEX_URL).await.is_err());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn session_download_roundtrip_is_byte_exact() {
    let tmp = tempfile::tempdir().unwrap();
    let session = EditorSession::open(AppStore::new(tmp.path(), ".py")).unwrap();
    let source = "import streamlit as st\n\n# ünïcode and tabs\t\r\nst.write('ok')\n\n";
    session.save_current(source).unwrap();
    let payload = session.download().unwrap();
    assert_eq!(payload.decode().unwrap(), source.as_bytes());
}
