use crate::mock_api::{summary, MockApi};
use crate::temp_storage;
use freshfood::api::ImageUpload;
use freshfood::ingredients::{IngredientCollection, Phase, STORAGE_KEY};
use freshfood::types::Ingredient;
use freshfood::Error;
use std::sync::Arc;

fn photo() -> ImageUpload {
    ImageUpload::new("fridge.jpg", vec![0xff, 0xd8, 0xff, 0xe0])
}

#[tokio::test]
async fn test_confirm_merges_only_selected_new_names() {
    let (_dir, storage) = temp_storage();
    let api = Arc::new(MockApi::new());
    let mut collection = IngredientCollection::open(api.clone(), storage).await;
    collection.add("egg").await.unwrap();
    collection.add("milk").await.unwrap();

    api.queue_recognition(&["milk", "flour"]);
    let staged = collection.upload(&photo()).await.unwrap();
    assert_eq!(staged.len(), 2);
    assert!(staged.iter().all(|s| !s.selected));

    assert!(collection.toggle(1).unwrap());
    let added = collection.confirm().await.unwrap();

    assert_eq!(added.len(), 1);
    assert_eq!(added[0].name, "flour");
    assert_eq!(collection.names(), vec!["egg", "milk", "flour"]);
    assert_eq!(collection.phase(), &Phase::Idle);
}

#[tokio::test]
async fn test_selecting_an_existing_name_adds_nothing() {
    let (_dir, storage) = temp_storage();
    let api = Arc::new(MockApi::new());
    let mut collection = IngredientCollection::open(api.clone(), storage).await;
    collection.add("Tomato").await.unwrap();

    api.queue_recognition(&["Tomato"]);
    collection.upload(&photo()).await.unwrap();
    collection.select_all();
    let added = collection.confirm().await.unwrap();

    assert!(added.is_empty());
    assert_eq!(collection.names(), vec!["Tomato"]);
}

#[tokio::test]
async fn test_manual_add_deduplicates_and_assigns_ids() {
    let (_dir, storage) = temp_storage();
    let api = Arc::new(MockApi::new());
    let mut collection = IngredientCollection::open(api.clone(), storage).await;

    let rice = collection.add("rice").await.unwrap();
    let again = collection.add(" rice ").await.unwrap();
    let beans = collection.add("beans").await.unwrap();

    assert_eq!(rice, again);
    assert_eq!(beans.id, rice.id + 1);
    assert_eq!(collection.ingredients().len(), 2);
    assert!(matches!(
        collection.add("  ").await,
        Err(Error::Validation(_))
    ));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_collection_survives_reopen() {
    let (_dir, storage) = temp_storage();
    let api = Arc::new(MockApi::new());
    {
        let mut collection = IngredientCollection::open(api.clone(), storage.clone()).await;
        collection.add("carrot").await.unwrap();
        collection.add("onion").await.unwrap();
        let carrot = collection.ingredients()[0].id;
        collection.remove(carrot).await.unwrap();
    }

    let reopened = IngredientCollection::open(api.clone(), storage).await;
    assert_eq!(reopened.names(), vec!["onion"]);
}

#[tokio::test]
async fn test_stored_duplicates_are_dropped_on_open() {
    let (_dir, storage) = temp_storage();
    let stored = vec![
        Ingredient { id: 1, name: "egg".into() },
        Ingredient { id: 2, name: "egg".into() },
        Ingredient { id: 3, name: "ham".into() },
    ];
    storage.save(STORAGE_KEY, &stored).await.unwrap();

    let collection = IngredientCollection::open(Arc::new(MockApi::new()), storage).await;
    assert_eq!(collection.names(), vec!["egg", "ham"]);
}

#[tokio::test]
async fn test_corrupt_store_starts_empty() {
    let (_dir, storage) = temp_storage();
    std::fs::create_dir_all(storage.dir()).unwrap();
    std::fs::write(storage.path_for(STORAGE_KEY), "{not json").unwrap();

    let collection = IngredientCollection::open(Arc::new(MockApi::new()), storage).await;
    assert!(collection.ingredients().is_empty());
}

#[tokio::test]
async fn test_recommend_with_empty_collection_makes_no_request() {
    let (_dir, storage) = temp_storage();
    let api = Arc::new(MockApi::new());
    let mut collection = IngredientCollection::open(api.clone(), storage).await;

    let err = collection.recommend().await.unwrap_err();
    assert_eq!(err.message(), "Please add at least one ingredient");
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_recommend_consumes_the_collection() {
    let (_dir, storage) = temp_storage();
    let api = Arc::new(MockApi::new().with_recipes(vec![
        summary("11", "Fried Rice", 0.8),
        summary("12", "Omelette", 0.5),
    ]));
    let mut collection = IngredientCollection::open(api.clone(), storage.clone()).await;
    collection.add("egg").await.unwrap();
    collection.add("rice").await.unwrap();
    assert!(storage.path_for(STORAGE_KEY).exists());

    let recipes = collection.recommend().await.unwrap();
    assert_eq!(recipes.len(), 2);
    assert_eq!(api.last_recommend(), Some(vec!["egg".into(), "rice".into()]));

    assert!(collection.ingredients().is_empty());
    assert!(!storage.path_for(STORAGE_KEY).exists());

    let reopened = IngredientCollection::open(api.clone(), storage).await;
    assert!(reopened.ingredients().is_empty());
}

#[tokio::test]
async fn test_failed_recommend_keeps_the_collection() {
    let (_dir, storage) = temp_storage();
    let api = Arc::new(MockApi::new());
    let mut collection = IngredientCollection::open(api.clone(), storage.clone()).await;
    collection.add("egg").await.unwrap();

    api.fail_next(
        "recommend",
        Error::from_response(400, r#"{"detail": "Unknown ingredient"}"#),
    );
    let err = collection.recommend().await.unwrap_err();
    assert_eq!(err.message(), "Unknown ingredient");
    assert_eq!(collection.names(), vec!["egg"]);
    assert!(storage.path_for(STORAGE_KEY).exists());
    assert!(!collection.is_loading());
}

#[tokio::test]
async fn test_failed_upload_returns_to_idle() {
    let (_dir, storage) = temp_storage();
    let api = Arc::new(MockApi::new());
    let mut collection = IngredientCollection::open(api.clone(), storage).await;
    api.watch_loading(collection.loading_flag());

    api.fail_next("recognize_ingredients", Error::Network("dns".into()));
    let err = collection.upload(&photo()).await.unwrap_err();
    assert_eq!(err.user_message(), "Network error, please try again");
    assert_eq!(collection.phase(), &Phase::Idle);
    assert!(collection.staged().is_empty());
    assert!(!collection.is_loading());
    assert_eq!(api.observed_loading(), vec![true]);
}

#[tokio::test]
async fn test_upload_stages_trimmed_unique_names() {
    let (_dir, storage) = temp_storage();
    let api = Arc::new(MockApi::new());
    let mut collection = IngredientCollection::open(api.clone(), storage).await;

    api.queue_recognition(&[" apple ", "apple", "", "pear"]);
    let staged = collection.upload(&photo()).await.unwrap();
    let names: Vec<_> = staged.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["apple", "pear"]);
}

#[tokio::test]
async fn test_second_upload_requires_finishing_the_selection() {
    let (_dir, storage) = temp_storage();
    let api = Arc::new(MockApi::new());
    let mut collection = IngredientCollection::open(api.clone(), storage).await;

    api.queue_recognition(&["kale"]);
    collection.upload(&photo()).await.unwrap();
    assert!(matches!(
        collection.upload(&photo()).await,
        Err(Error::Validation(_))
    ));
    assert_eq!(api.calls(), vec!["recognize_ingredients"]);

    collection.cancel_selection();
    assert_eq!(collection.phase(), &Phase::Idle);
    assert!(collection.ingredients().is_empty());
    assert!(collection.confirm().await.is_err());
}

#[tokio::test]
async fn test_empty_recognition_stages_nothing() {
    let (_dir, storage) = temp_storage();
    let api = Arc::new(MockApi::new());
    let mut collection = IngredientCollection::open(api.clone(), storage).await;

    api.queue_recognition(&[]);
    assert!(collection.upload(&photo()).await.unwrap().is_empty());
    assert!(collection.toggle(0).is_err());
    assert!(collection.confirm().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_recommend_returns_recipes_when_clearing_storage_fails() {
    let (_dir, storage) = temp_storage();
    let api = Arc::new(MockApi::new().with_recipes(vec![summary("11", "Egg Fried Rice", 0.8)]));
    let mut collection = IngredientCollection::open(api.clone(), storage.clone()).await;
    collection.add("egg").await.unwrap();

    // A directory in place of the stored file makes removal fail.
    let path = storage.path_for(STORAGE_KEY);
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    let recipes = collection.recommend().await.unwrap();
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0].recipe_name, "Egg Fried Rice");
    assert!(collection.ingredients().is_empty());
    assert_eq!(api.calls(), vec!["recommend"]);
}

#[tokio::test]
async fn test_stored_max_id_is_renumbered_on_open() {
    let (_dir, storage) = temp_storage();
    let stored = vec![Ingredient { id: u32::MAX, name: "egg".into() }];
    storage.save(STORAGE_KEY, &stored).await.unwrap();

    let mut collection = IngredientCollection::open(Arc::new(MockApi::new()), storage).await;
    let milk = collection.add("milk").await.unwrap();

    let ids: Vec<u32> = collection.ingredients().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(milk.id, 2);
}

#[tokio::test]
async fn test_recognized_duplicates_merge_once() {
    let (_dir, storage) = temp_storage();
    let api = Arc::new(MockApi::new());
    let mut collection = IngredientCollection::open(api.clone(), storage).await;

    api.queue_recognition(&["Tomato", "Tomato", "Onion"]);
    collection.upload(&photo()).await.unwrap();
    collection.select_all();
    let added = collection.confirm().await.unwrap();

    assert_eq!(added.len(), 2);
    let tomatoes = collection
        .ingredients()
        .iter()
        .filter(|i| i.name == "Tomato")
        .count();
    assert_eq!(tomatoes, 1);
    assert_eq!(collection.names(), vec!["Tomato", "Onion"]);
}
