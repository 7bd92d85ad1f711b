use crate::mock_api::MockApi;
use freshfood::staples::Staples;
use freshfood::Error;
use std::sync::Arc;

#[tokio::test]
async fn test_add_and_remove_reload_the_list() {
    let api = Arc::new(MockApi::new().with_staples(&["salt"]));
    let mut staples = Staples::new(api.clone());
    assert_eq!(staples.fetch().await.unwrap(), ["salt"]);

    assert_eq!(staples.add(" pepper ").await.unwrap(), ["salt", "pepper"]);
    assert_eq!(staples.remove("salt").await.unwrap(), ["pepper"]);
    assert_eq!(
        api.calls(),
        vec!["staples", "add_staple", "staples", "remove_staple", "staples"]
    );
}

#[tokio::test]
async fn test_clear_empties_the_list() {
    let api = Arc::new(MockApi::new().with_staples(&["salt", "oil"]));
    let mut staples = Staples::new(api.clone());
    staples.fetch().await.unwrap();

    staples.clear().await.unwrap();
    assert!(staples.names().is_empty());
    assert!(!staples.is_loading());
}

#[tokio::test]
async fn test_blank_names_are_rejected_locally() {
    let api = Arc::new(MockApi::new());
    let mut staples = Staples::new(api.clone());

    assert!(matches!(staples.add(" ").await, Err(Error::Validation(_))));
    assert!(matches!(staples.remove("").await, Err(Error::Validation(_))));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_failed_add_keeps_the_list() {
    let api = Arc::new(MockApi::new().with_staples(&["salt"]));
    let mut staples = Staples::new(api.clone());
    staples.fetch().await.unwrap();

    api.fail_next(
        "add_staple",
        Error::from_response(409, r#"{"error": "Already a staple"}"#),
    );
    let err = staples.add("salt").await.unwrap_err();
    assert_eq!(err.user_message(), "Already a staple");
    assert_eq!(staples.names(), ["salt"]);
}
