//! # Record Fetcher Integration Tests
//!
//! Runs `RecordFetcher` against a local `mockito` server that stands in for
//! PUG REST. Retries use a zero `FixedDelay` so failing paths finish quickly.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use lib_pubchem::retrieve::ky_http::ApiClient;
use lib_pubchem::{DelayStrategy, FixedDelay, Lookup, NscId, RecordFetcher, ResultRecord, RetryPolicy};
use mockito::Server;
use serde_json::json;

fn fetcher_for(base_url: &str, attempts: u32) -> RecordFetcher {
    let client = ApiClient::new(base_url, Duration::from_secs(5)).unwrap();
    let policy = RetryPolicy::new(attempts, Arc::new(FixedDelay(Duration::ZERO))).unwrap();
    RecordFetcher::new(client, policy)
}

fn substance_body() -> String {
    json!({
        "PC_Substances": [
            {"sid": {"id": 1111, "version": 1}, "synonyms": ["old name"]},
            {"sid": {"id": 2222, "version": 2}, "synonyms": ["methotrexate", "amethopterin"]}
        ]
    })
    .to_string()
}

#[tokio::test]
async fn newest_version_wins_and_cid_is_first_listed() {
    let mut server = Server::new_async().await;
    let substance = server
        .mock("GET", "/substance/name/NSC12345/JSON")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(substance_body())
        .expect(1)
        .create_async()
        .await;
    let cids = server
        .mock("GET", "/compound/name/NSC12345/cids/JSON")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"IdentifierList": {"CID": [126941, 5]}}).to_string())
        .expect(1)
        .create_async()
        .await;

    let record = fetcher_for(&server.url(), 5).fetch(&NscId::new("12345")).await;

    assert_eq!(
        record,
        ResultRecord {
            nsc_id: NscId::new("12345"),
            sid: Lookup::Found(2222),
            version: Lookup::Found(2),
            cid: Lookup::Found(126941),
            synonyms: Lookup::Found("methotrexate, amethopterin".to_string()),
        }
    );
    substance.assert_async().await;
    cids.assert_async().await;
}

#[tokio::test]
async fn flat_body_shape_is_accepted() {
    let mut server = Server::new_async().await;
    let _substance = server
        .mock("GET", "/substance/name/NSC740/JSON")
        .with_status(200)
        .with_body(json!({"PC_Substances": [{"sid": 42, "version": 7}]}).to_string())
        .create_async()
        .await;
    let _cids = server
        .mock("GET", "/compound/name/NSC740/cids/JSON")
        .with_status(200)
        .with_body(json!({"IdentifierList": {"CID": [1]}}).to_string())
        .create_async()
        .await;

    let record = fetcher_for(&server.url(), 5).fetch(&NscId::new("740")).await;

    assert_eq!(record.sid, Lookup::Found(42));
    assert_eq!(record.version, Lookup::Found(7));
    assert_eq!(record.synonyms, Lookup::NotFound);
    assert_eq!(record.cid, Lookup::Found(1));
}

#[tokio::test]
async fn persistent_server_error_exhausts_attempts() {
    let mut server = Server::new_async().await;
    let substance = server
        .mock("GET", "/substance/name/NSC99999/JSON")
        .with_status(500)
        .expect(5)
        .create_async()
        .await;
    let cids = server
        .mock("GET", "/compound/name/NSC99999/cids/JSON")
        .with_status(200)
        .with_body(json!({"IdentifierList": {"CID": [1]}}).to_string())
        .expect(0)
        .create_async()
        .await;

    let record = fetcher_for(&server.url(), 5).fetch(&NscId::new("99999")).await;

    assert_eq!(record, ResultRecord::not_found(NscId::new("99999")));
    assert_eq!(record.sid.to_string(), "Not Found");
    substance.assert_async().await;
    cids.assert_async().await;
}

#[tokio::test]
async fn transport_errors_exhaust_attempts() {
    // Nothing listens on port 1, so every attempt is refused.
    let record = fetcher_for("http://127.0.0.1:1/", 2).fetch(&NscId::new("7")).await;
    assert_eq!(record, ResultRecord::not_found(NscId::new("7")));
}

#[tokio::test]
async fn failed_compound_lookup_keeps_substance_fields() {
    let mut server = Server::new_async().await;
    let _substance = server
        .mock("GET", "/substance/name/NSC12345/JSON")
        .with_status(200)
        .with_body(substance_body())
        .create_async()
        .await;
    let cids = server
        .mock("GET", "/compound/name/NSC12345/cids/JSON")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let record = fetcher_for(&server.url(), 5).fetch(&NscId::new("12345")).await;

    assert_eq!(record.sid, Lookup::Found(2222));
    assert_eq!(record.version, Lookup::Found(2));
    assert!(record.synonyms.is_found());
    assert_eq!(record.cid, Lookup::NotFound);
    // The compound lookup is never retried.
    cids.assert_async().await;
}

#[tokio::test]
async fn empty_compound_list_is_not_found() {
    let mut server = Server::new_async().await;
    let _substance = server
        .mock("GET", "/substance/name/NSC12345/JSON")
        .with_status(200)
        .with_body(substance_body())
        .create_async()
        .await;
    let _cids = server
        .mock("GET", "/compound/name/NSC12345/cids/JSON")
        .with_status(200)
        .with_body(json!({"IdentifierList": {"CID": []}}).to_string())
        .create_async()
        .await;

    let record = fetcher_for(&server.url(), 5).fetch(&NscId::new("12345")).await;

    assert_eq!(record.sid, Lookup::Found(2222));
    assert_eq!(record.cid, Lookup::NotFound);
}

#[tokio::test]
async fn empty_substance_list_still_looks_up_cid() {
    let mut server = Server::new_async().await;
    let substance = server
        .mock("GET", "/substance/name/NSC5/JSON")
        .with_status(200)
        .with_body(json!({"PC_Substances": []}).to_string())
        .expect(1)
        .create_async()
        .await;
    let _cids = server
        .mock("GET", "/compound/name/NSC5/cids/JSON")
        .with_status(200)
        .with_body(json!({"IdentifierList": {"CID": [99]}}).to_string())
        .create_async()
        .await;

    let record = fetcher_for(&server.url(), 5).fetch(&NscId::new("5")).await;

    assert_eq!(record.sid, Lookup::NotFound);
    assert_eq!(record.version, Lookup::NotFound);
    assert_eq!(record.synonyms, Lookup::NotFound);
    assert_eq!(record.cid, Lookup::Found(99));
    substance.assert_async().await;
}

#[tokio::test]
async fn malformed_body_is_no_data_without_retry() {
    let mut server = Server::new_async().await;
    let substance = server
        .mock("GET", "/substance/name/NSC6/JSON")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .expect(1)
        .create_async()
        .await;
    let _cids = server
        .mock("GET", "/compound/name/NSC6/cids/JSON")
        .with_status(200)
        .with_body("also not json")
        .create_async()
        .await;

    let record = fetcher_for(&server.url(), 5).fetch(&NscId::new("6")).await;

    assert_eq!(record, ResultRecord::not_found(NscId::new("6")));
    substance.assert_async().await;
}

#[tokio::test]
async fn prefixed_identifier_is_kept_verbatim_in_record() {
    let mut server = Server::new_async().await;
    let substance = server
        .mock("GET", "/substance/name/NSC740/JSON")
        .with_status(404)
        .expect(2)
        .create_async()
        .await;

    let record = fetcher_for(&server.url(), 2).fetch(&NscId::new("nsc740")).await;

    assert_eq!(record.nsc_id.as_str(), "nsc740");
    assert!(!record.is_complete());
    substance.assert_async().await;
}

/// Records which attempt each wait was requested after, and never sleeps.
#[derive(Debug, Default)]
struct RecordingDelay {
    requested_after: Mutex<Vec<u32>>,
}

impl DelayStrategy for RecordingDelay {
    fn next_delay(&self, attempt: u32) -> Duration {
        self.requested_after.lock().unwrap().push(attempt);
        Duration::ZERO
    }
}

#[tokio::test]
async fn no_wait_follows_the_final_attempt() {
    let mut server = Server::new_async().await;
    let substance = server
        .mock("GET", "/substance/name/NSC31/JSON")
        .with_status(502)
        .with_body("<html>bad gateway</html>")
        .expect(4)
        .create_async()
        .await;

    let delay = Arc::new(RecordingDelay::default());
    let client = ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap();
    let policy = RetryPolicy::new(4, delay.clone()).unwrap();
    let record = RecordFetcher::new(client, policy).fetch(&NscId::new("31")).await;

    assert_eq!(record, ResultRecord::not_found(NscId::new("31")));
    // Four attempts, three waits in between, none after the last.
    assert_eq!(*delay.requested_after.lock().unwrap(), vec![1, 2, 3]);
    substance.assert_async().await;
}

#[tokio::test]
async fn one_bad_entry_keeps_the_valid_ones() {
    let mut server = Server::new_async().await;
    let _substance = server
        .mock("GET", "/substance/name/NSC33/JSON")
        .with_status(200)
        .with_body(
            json!({"PC_Substances": [
                {"sid": {"id": 330, "version": 1}, "synonyms": ["kept"]},
                {"sid": "x", "version": 2}
            ]})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let _cids = server
        .mock("GET", "/compound/name/NSC33/cids/JSON")
        .with_status(200)
        .with_body(json!({"IdentifierList": {"CID": [3300]}}).to_string())
        .create_async()
        .await;

    let record = fetcher_for(&server.url(), 5).fetch(&NscId::new("33")).await;

    assert_eq!(record.sid, Lookup::Found(330));
    assert_eq!(record.version, Lookup::Found(1));
    assert_eq!(record.synonyms, Lookup::Found("kept".to_string()));
    assert_eq!(record.cid, Lookup::Found(3300));
}
