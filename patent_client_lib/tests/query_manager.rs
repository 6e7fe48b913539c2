use std::sync::Arc;

use chrono::NaiveDate;
use patent_client_lib::{
    one_to_many, one_to_one, CollectionConfig, Fetcher, FieldValue, Item, MemoryFetcher,
    ModelDescriptor, ModelRegistry, PageRequest, PatentClientError, QueryManager, RawRecord,
    RequestParams,
};
use serde_json::{json, Value};

struct Fixture {
    registry: Arc<ModelRegistry>,
    trials: Arc<MemoryFetcher>,
    documents: Arc<MemoryFetcher>,
}

fn trial_rows(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "trialNumber": format!("IPR2020-{:05}", i),
                "prosecutionStatus": if i % 2 == 0 { "Terminated" } else { "Instituted" },
                "FiledDate": "2020/01/15 10:00:00",
                "lastModifiedDatetime": "not-a-date",
                "applicationNumber": "09026118",
            })
        })
        .collect()
}

fn document_rows() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "trialNumber": "IPR2020-00001",
            "title": "Petition",
            "links": [
                {"rel": "self", "href": "https://example.test/documents/1"},
                {"rel": "download", "href": "https://example.test/documents/1/download"}
            ]
        }),
        json!({"id": 2, "trialNumber": "IPR2020-00001", "title": "Institution Decision"}),
        json!({"id": 3, "trialNumber": "IPR2020-00002", "title": "Final Written Decision"}),
        json!({"id": 4, "trialNumber": "IPR2020-99999", "title": "Orphan"}),
    ]
}

fn fixture_with(trials: Vec<Value>, page_size: usize) -> Fixture {
    let trials = Arc::new(MemoryFetcher::from_json(trials));
    let documents = Arc::new(MemoryFetcher::from_json(document_rows()));

    let mut registry = ModelRegistry::new();
    registry
        .register(
            ModelDescriptor::new(
                CollectionConfig::new("ptab", "PtabTrial", "/trials")
                    .with_primary_key("trial_number")
                    .with_page_size(page_size)
                    .with_display_field("trial_number"),
                trials.clone(),
            )
            .with_relation(one_to_many(
                "documents",
                "ptab.PtabDocument",
                &[("trial_number", "trial_number")],
            ))
            .with_relation(one_to_one(
                "us_application",
                "uspto.USApplication",
                &[("appl_id", "application_number")],
            )),
        )
        .unwrap();
    registry
        .register(
            ModelDescriptor::new(
                CollectionConfig::new("ptab", "PtabDocument", "/documents")
                    .with_page_size(page_size)
                    .with_display_field("title"),
                documents.clone(),
            )
            .with_relation(one_to_one(
                "trial",
                "ptab.PtabTrial",
                &[("trial_number", "trial_number")],
            ))
            .with_relation(one_to_one("author", "ptab.PtabTrial", &[("trial_number", "author")])),
        )
        .unwrap();

    Fixture {
        registry: Arc::new(registry),
        trials,
        documents,
    }
}

fn fixture() -> Fixture {
    fixture_with(trial_rows(12), 5)
}

fn trials(fx: &Fixture) -> QueryManager {
    fx.registry.objects("PtabTrial").unwrap()
}

fn trial_number(item: &Item) -> String {
    item.as_record()
        .unwrap()
        .str_field("trial_number")
        .unwrap()
        .to_string()
}

#[test]
fn filter_merges_without_touching_the_receiver() {
    let fx = fixture();
    let base = trials(&fx);
    let a = base.filter([("a", 1)]);
    let ab = a.filter([("b", 2)]);
    let ba = base.filter([("b", 2)]).filter([("a", 1)]);

    assert!(base.state().filters().is_empty());
    assert_eq!(a.state().filters().len(), 1);
    assert_eq!(ab.state().filters(), ba.state().filters());

    let overridden = a.filter_by("a", 3);
    assert_eq!(overridden.state().filters()["a"], json!(3));
    assert_eq!(a.state().filters()["a"], json!(1));
}

#[test]
fn order_by_appends_and_reaches_the_request() {
    let fx = fixture();
    let m = trials(&fx).order_by(["x"]).order_by(["y"]);
    assert_eq!(m.state().sort(), ["x", "y"]);
    assert_eq!(m.params().unwrap().get("sort"), Some(&json!(["x", "y"])));
}

#[test]
fn params_are_camelized() {
    let fx = fixture();
    let params = trials(&fx)
        .filter([("trial_number", "IPR2020-00001")])
        .params()
        .unwrap();
    assert_eq!(params.get_str("trialNumber").as_deref(), Some("IPR2020-00001"));
}

#[test]
fn get_returns_the_single_match() {
    let fx = fixture();
    let record = trials(&fx)
        .get([("trial_number", "IPR2020-00003")])
        .unwrap();
    assert_eq!(record.str_field("trial_number").unwrap(), "IPR2020-00003");
    assert_eq!(record.to_string(), "<PtabTrial(trial_number=IPR2020-00003)>");

    let by_pk = trials(&fx).get_pk("IPR2020-00004").unwrap();
    assert_eq!(by_pk.str_field("trial_number").unwrap(), "IPR2020-00004");
}

#[test]
fn get_with_many_matches_lists_them() {
    let fx = fixture_with(trial_rows(4), 25);
    let err = trials(&fx)
        .get([("prosecution_status", "Terminated")])
        .unwrap_err();
    match err {
        PatentClientError::MultipleResults { model, matches } => {
            assert_eq!(model, "PtabTrial");
            assert_eq!(
                matches,
                vec![
                    "<PtabTrial(trial_number=IPR2020-00000)>",
                    "<PtabTrial(trial_number=IPR2020-00002)>",
                ]
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn get_with_no_match_is_out_of_range() {
    let fx = fixture();
    let err = trials(&fx)
        .get([("trial_number", "IPR1999-00000")])
        .unwrap_err();
    assert!(matches!(
        err,
        PatentClientError::OutOfRange { index: 0, count: 0 }
    ));
}

#[test]
fn indexing_crosses_pages() {
    let fx = fixture();
    let m = trials(&fx);
    assert_eq!(trial_number(&m.at(0).unwrap()), "IPR2020-00000");
    assert_eq!(trial_number(&m.at(7).unwrap()), "IPR2020-00007");
    assert_eq!(trial_number(&m.at(11).unwrap()), "IPR2020-00011");
    assert_eq!(fx.trials.page_calls(), 3);
}

#[test]
fn indexing_past_the_end_is_out_of_range() {
    let fx = fixture();
    let m = trials(&fx);
    assert!(matches!(
        m.at(12),
        Err(PatentClientError::OutOfRange { index: 12, count: 12 })
    ));
    assert!(matches!(
        m.at(40),
        Err(PatentClientError::OutOfRange { index: 40, count: 12 })
    ));
}

#[test]
fn slice_is_clipped_to_len() {
    let fx = fixture();
    let m = trials(&fx);
    assert_eq!(m.count().unwrap(), 12);
    let items = m.slice(10..15).unwrap();
    let numbers: Vec<_> = items.iter().map(trial_number).collect();
    assert_eq!(numbers, ["IPR2020-00010", "IPR2020-00011"]);

    assert!(m.slice(20..).unwrap().is_empty());
}

#[test]
fn slice_with_step() {
    let fx = fixture();
    let m = trials(&fx);
    let numbers: Vec<_> = m
        .slice_step(..6, 2)
        .unwrap()
        .iter()
        .map(trial_number)
        .collect();
    assert_eq!(numbers, ["IPR2020-00000", "IPR2020-00002", "IPR2020-00004"]);

    assert!(matches!(
        m.slice_step(0..4, 0),
        Err(PatentClientError::InvalidInput(_))
    ));
}

#[test]
fn all_is_lazy_and_bounded_by_count() {
    let fx = fixture();
    let mut iter = trials(&fx).all();
    assert_eq!(fx.trials.page_calls(), 0);
    assert_eq!(fx.trials.count_calls(), 0);

    let first = iter.next().unwrap().unwrap();
    assert_eq!(first.str_field("trial_number").unwrap(), "IPR2020-00000");
    assert_eq!(fx.trials.count_calls(), 1);

    let rest: Vec<_> = iter.collect::<Result<_, _>>().unwrap();
    assert_eq!(rest.len(), 11);
    assert_eq!(fx.trials.page_calls(), 12);
}

#[test]
fn manager_into_iter_yields_items() {
    let fx = fixture();
    let titles: Vec<_> = fx
        .registry
        .objects("PtabDocument")
        .unwrap()
        .values_list(["title"], true)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(titles.len(), 4);
}

#[test]
fn records_canonicalize_keys_and_coerce_dates() {
    let fx = fixture();
    let record = trials(&fx).first().unwrap();
    assert_eq!(
        record.get("filed_date"),
        Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2020, 1, 15).unwrap()))
    );
    assert_eq!(record.get("last_modified_datetime"), Some(&FieldValue::Null));
    assert!(record.get("prosecution_status").is_some());
    assert!(record.get("FiledDate").is_none());
    assert_eq!(record.to_json()["filed_date"], json!("2020-01-15"));
}

#[test]
fn values_list_flat_yields_scalars() {
    let fx = fixture();
    let docs = fx.registry.objects("PtabDocument").unwrap();
    let items = docs.values_list(["title"], true).slice(..2).unwrap();
    assert!(matches!(&items[0], Item::Scalar(FieldValue::String(s)) if s == "Petition"));

    let tuples = docs.values_list(["id", "title"], false).slice(..1).unwrap();
    match &tuples[0] {
        Item::Tuple(values) => assert_eq!(values.len(), 2),
        other => panic!("expected a tuple, got {other:?}"),
    }

    let single_tuple = docs.values_list(["title"], false).at(0).unwrap();
    assert!(matches!(single_tuple, Item::Tuple(ref v) if v.len() == 1));
}

#[test]
fn values_follow_nested_paths() {
    let fx = fixture();
    let docs = fx.registry.objects("PtabDocument").unwrap();
    let item = docs.values(["title", "links__1__href", "links__5__href"]).at(0).unwrap();
    match item {
        Item::Values(map) => {
            let keys: Vec<_> = map.keys().cloned().collect();
            assert_eq!(keys, ["title", "links__1__href", "links__5__href"]);
            assert_eq!(
                map["links__1__href"].as_str(),
                Some("https://example.test/documents/1/download")
            );
            assert!(map["links__5__href"].is_null());
        }
        other => panic!("expected values, got {other:?}"),
    }
}

#[test]
fn values_can_reach_through_one_to_one_relations() {
    let fx = fixture();
    let docs = fx.registry.objects("PtabDocument").unwrap();
    let status = docs.values_list(["trial__prosecution_status"], true).at(0).unwrap();
    assert!(matches!(status, Item::Scalar(FieldValue::String(ref s)) if s == "Instituted"));
}

#[test]
fn one_to_many_counts_without_enumerating() {
    let fx = fixture();
    let trial = trials(&fx).get_pk("IPR2020-00001").unwrap();
    let documents = trial.many("documents").unwrap();

    assert_eq!(documents.count().unwrap(), 2);
    assert_eq!(fx.documents.page_calls(), 0);

    let titles: Vec<_> = documents
        .all()
        .map(|d| d.unwrap().str_field("title").unwrap().to_string())
        .collect();
    assert_eq!(titles, ["Petition", "Institution Decision"]);
}

#[test]
fn one_to_one_resolves_from_the_owner() {
    let fx = fixture();
    let doc = fx.registry.objects("PtabDocument").unwrap().at(2).unwrap();
    let trial = doc.as_record().unwrap().one("trial").unwrap();
    assert_eq!(trial.str_field("trial_number").unwrap(), "IPR2020-00002");
}

#[test]
fn one_to_one_with_two_matches_fails() {
    let mut rows = trial_rows(3);
    rows.push(rows[1].clone());
    let fx = fixture_with(rows, 5);
    let doc = fx.registry.objects("PtabDocument").unwrap().first().unwrap();
    assert!(matches!(
        doc.one("trial"),
        Err(PatentClientError::MultipleResults { ref matches, .. }) if matches.len() == 2
    ));
}

#[test]
fn relation_lookups_fail_at_access_time() {
    let fx = fixture();
    let trial = trials(&fx).first().unwrap();
    assert!(matches!(
        trial.related("us_application"),
        Err(PatentClientError::Lookup(_))
    ));
    assert!(matches!(trial.related("nope"), Err(PatentClientError::Lookup(_))));

    let doc = fx.registry.objects("PtabDocument").unwrap().first().unwrap();
    assert!(matches!(doc.one("author"), Err(PatentClientError::Lookup(_))));
}

#[test]
fn unsupported_operations() {
    let fx = fixture();
    let m = trials(&fx);
    assert!(matches!(
        m.exclude([("trial_number", "x")]),
        Err(PatentClientError::NotImplemented(_))
    ));

    let docs = fx.registry.objects("PtabDocument").unwrap();
    assert!(matches!(docs.get_pk(1), Err(PatentClientError::NotImplemented(_))));
}

#[test]
fn uncountable_collections_say_so() {
    let mut registry = ModelRegistry::new();
    registry
        .register(ModelDescriptor::new(
            CollectionConfig::new("misc", "Thing", "/things"),
            Arc::new(MemoryFetcher::from_json(vec![json!({"a": 1})]).without_count()),
        ))
        .unwrap();
    let registry = Arc::new(registry);
    let m = registry.objects("misc.Thing").unwrap();

    match m.count() {
        Err(PatentClientError::NotImplemented(msg)) => {
            assert_eq!(msg, "Thing: in-memory collection is not countable")
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert!(m.record_at(0).is_ok());
    assert!(matches!(
        m.record_at(30),
        Err(PatentClientError::OutOfRange { index: 30, count: 25 })
    ));
}

/// Serves empty pages and fails every count.
struct BrokenCount;

impl Fetcher for BrokenCount {
    fn fetch_page(
        &self,
        _params: &RequestParams,
        _page: PageRequest,
    ) -> Result<Vec<RawRecord>, PatentClientError> {
        Ok(Vec::new())
    }

    fn fetch_count(&self, _params: &RequestParams) -> Result<usize, PatentClientError> {
        Err(PatentClientError::Cache("disk unavailable".to_string()))
    }
}

#[test]
fn count_failures_are_not_hidden_by_index_errors() {
    let mut registry = ModelRegistry::new();
    registry
        .register(ModelDescriptor::new(
            CollectionConfig::new("misc", "Broken", "/broken"),
            Arc::new(BrokenCount),
        ))
        .unwrap();
    let m = Arc::new(registry).objects("Broken").unwrap();

    assert!(matches!(m.record_at(30), Err(PatentClientError::Cache(_))));
    assert!(matches!(
        m.record_at(0),
        Err(PatentClientError::OutOfRange { index: 0, count: 0 })
    ));
}

/// Counting is left to the trait's default.
struct PagesOnly;

impl Fetcher for PagesOnly {
    fn fetch_page(
        &self,
        _params: &RequestParams,
        _page: PageRequest,
    ) -> Result<Vec<RawRecord>, PatentClientError> {
        Ok(Vec::new())
    }
}

#[test]
fn default_count_names_the_model() {
    let mut registry = ModelRegistry::new();
    registry
        .register(ModelDescriptor::new(
            CollectionConfig::new("misc", "Pages", "/pages"),
            Arc::new(PagesOnly),
        ))
        .unwrap();
    let m = Arc::new(registry).objects("misc.Pages").unwrap();
    match m.count() {
        Err(PatentClientError::NotImplemented(msg)) => assert_eq!(msg, "Pages: has no length method"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn registry_checks_module_names() {
    let fx = fixture();
    assert!(fx.registry.objects("ptab.PtabTrial").is_ok());
    assert!(matches!(
        fx.registry.objects("itc_edis.PtabTrial"),
        Err(PatentClientError::Lookup(_))
    ));
    assert!(matches!(
        fx.registry.objects("Missing"),
        Err(PatentClientError::Lookup(_))
    ));
}
