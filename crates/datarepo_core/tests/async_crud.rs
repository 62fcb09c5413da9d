use datarepo_core::{
    AsyncRepository, BaseService, Filter, OrderBy, PageRequest, RepoError, Repository,
    SampleEntity, Session, SqliteRepository,
};

fn repo() -> SqliteRepository<SampleEntity> {
    SqliteRepository::new(Session::open_in_memory().unwrap())
}

#[tokio::test]
async fn async_add_all_then_get_roundtrip() {
    let repo = repo();

    let added = repo
        .add_all_async(vec![SampleEntity::new("Turtle"), SampleEntity::new("Fox")])
        .await
        .unwrap();

    assert_eq!(added.len(), 2);
    for entity in &added {
        let loaded = repo.get_async(entity.id.unwrap()).await.unwrap();
        assert_eq!(loaded.as_ref(), Some(entity));
    }
    assert_eq!(repo.count_async().await.unwrap(), 2);
}

#[tokio::test]
async fn async_and_blocking_forms_observe_each_other() {
    let repo = repo();

    let blocking = repo.add(SampleEntity::new("Cat")).unwrap();
    let via_async = repo.add_async(SampleEntity::new("Dog")).await.unwrap();

    assert_eq!(
        repo.get_async(blocking.id.unwrap()).await.unwrap(),
        Some(blocking)
    );
    assert_eq!(repo.get(&via_async.id.unwrap()).unwrap(), Some(via_async));
    assert_eq!(repo.get_all().unwrap(), repo.get_all_async().await.unwrap());
}

#[tokio::test]
async fn async_page_find_and_update() {
    let repo = repo();
    repo.add_all_async(
        ["one", "two", "three", "four", "five"]
            .into_iter()
            .map(SampleEntity::new)
            .collect(),
    )
    .await
    .unwrap();

    let page = repo
        .get_page_async(PageRequest::new(2, 2).unwrap(), OrderBy::asc("id"))
        .await
        .unwrap();
    let ids: Vec<i64> = page.iter().filter_map(|entity| entity.id).collect();
    assert_eq!(ids, vec![3, 4]);

    let three = repo
        .find_async(Filter::eq("name", "three".to_string()))
        .await
        .unwrap()
        .unwrap();
    let updated = repo
        .update_async(SampleEntity::new("THREE"), three.id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "THREE");

    assert_eq!(
        repo.update_async(SampleEntity::new("nobody"), 404)
            .await
            .unwrap(),
        None
    );

    let short = repo
        .find_all_async(Filter::lt("id", 3_i64))
        .await
        .unwrap();
    assert_eq!(short.len(), 2);
}

#[tokio::test]
async fn async_find_reports_non_unique() {
    let repo = repo();
    repo.add_all_async(vec![SampleEntity::new("Twin"), SampleEntity::new("Twin")])
        .await
        .unwrap();

    let err = repo
        .find_async(Filter::eq("name", "Twin".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NonUnique { .. }));
}

#[tokio::test]
async fn async_service_runs_turtle_fox_cat_scenario() {
    let service: BaseService<SampleEntity, _> = BaseService::new(repo());

    service
        .add_all_async(vec![
            SampleEntity::new("Turtle"),
            SampleEntity::new("Fox"),
            SampleEntity::new("Cat"),
        ])
        .await
        .unwrap();
    assert_eq!(service.count_async().await.unwrap(), 3);

    let fox = service
        .find_async(Filter::eq("name", "Fox".to_string()))
        .await
        .unwrap()
        .unwrap();
    let fox_id = fox.id.unwrap();
    service
        .update_async(SampleEntity::new("Dog"), fox_id)
        .await
        .unwrap();
    assert_eq!(
        service.get_async(fox_id).await.unwrap().unwrap().name,
        "Dog"
    );

    let turtle = service
        .find_async(Filter::eq("name", "Turtle".to_string()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(service.delete_async(turtle).await.unwrap(), 1);
    assert_eq!(service.count_async().await.unwrap(), 2);
    assert_eq!(service.delete_by_key_async(fox_id).await.unwrap(), 1);
}
