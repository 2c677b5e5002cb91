use std::sync::Arc;

use interview_nav_rust::logic::{EntityTarget, NavOutcome, Navigator, PageValues};
use interview_nav_rust::model::{
    Attribute, AttributeEntity, Condition, Entity, EntityHead, Id, OptionDef, Project, Question,
    Relation, ValueState, WidgetType,
};
use interview_nav_rust::seed;
use interview_nav_rust::store::{MemoryStore, ValueStore as _};
use interview_nav_rust::{EngineError, RenderSignal};

const SNAPSHOT: &str = "snapshot-1";
const CATALOG: &str = "catalog-1";
const PROJECT: &str = "project-1";

fn question(attribute: &str, widget_type: WidgetType, options: Vec<OptionDef>) -> Question {
    Question {
        id: format!("question-{}", attribute),
        text: format!("question about {}", attribute),
        help: None,
        widget_type,
        attribute: Attribute {
            id: attribute.to_string(),
            options,
            range: None,
            is_collection: false,
        },
    }
}

fn entity(id: &str, questions: Vec<Question>, conditions: Vec<Condition>) -> Entity {
    let attributes = questions.iter().map(|q| q.attribute.id.clone()).collect();
    Entity {
        id: id.to_string(),
        help: None,
        attribute_entity: AttributeEntity {
            id: format!("ae-{}", id),
            is_collection: false,
            conditions,
        },
        collection: None,
        is_set: false,
        prev: None,
        next: None,
        section: String::new(),
        subsection: String::new(),
        questions,
        attributes,
    }
}

fn eq_condition(source: &str, option: &str) -> Condition {
    Condition {
        source_attribute: source.to_string(),
        relation: Relation::Eq,
        target_option: Some(option.to_string()),
        target_text: None,
    }
}

/// Install a linear chain of entities plus the project around them.
fn fixture(store: &MemoryStore, mut entities: Vec<Entity>) {
    let ids: Vec<Id> = entities.iter().map(|e| e.id.clone()).collect();
    let catalog: Id = CATALOG.to_string();
    for (position, entity) in entities.iter_mut().enumerate() {
        entity.prev = position.checked_sub(1).map(|p| ids[p].clone());
        entity.next = ids.get(position + 1).cloned();
    }
    for entity in entities {
        store.put_entity(&catalog, entity);
    }
    store.put_catalog(interview_nav_rust::model::Catalog {
        id: catalog,
        title: "catalog".to_string(),
        sections: Vec::new(),
    });
    store.put_project(Project {
        id: PROJECT.to_string(),
        title: "project".to_string(),
        description: None,
        current_snapshot: SNAPSHOT.to_string(),
        catalog: CATALOG.to_string(),
    });
}

async fn start(store: &Arc<MemoryStore>) -> Navigator<MemoryStore> {
    Navigator::start(Arc::clone(store), &PROJECT.to_string(), "/summary/")
        .await
        .expect("navigator starts")
}

fn current_id(navigator: &Navigator<MemoryStore>) -> &str {
    &navigator.current().expect("a bound page").entity.id
}

#[tokio::test]
async fn single_text_entity_walkthrough() {
    let store = Arc::new(MemoryStore::new());
    fixture(
        &store,
        vec![entity(
            "entity-a",
            vec![question("attr-a", WidgetType::Text, Vec::new())],
            Vec::new(),
        )],
    );

    let mut navigator = start(&store).await;
    assert_eq!(current_id(&navigator), "entity-a");

    // The factory created exactly one blank live value.
    {
        let values = navigator.active_values_mut().expect("active bucket");
        let bucket = values.get_mut("attr-a").expect("bucket for the question");
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].text, "");
        assert!(bucket[0].is_live());
        bucket[0].text = "hello".to_string();
    }

    let signals = navigator.take_signals();
    assert!(signals.contains(&RenderSignal::FocusField {
        attribute: "attr-a".to_string(),
        index: None
    }));
    assert!(signals.contains(&RenderSignal::ScrollToTop));

    // Saving with advance persists one create and exits the wizard.
    let outcome = navigator.save(true).await.expect("save succeeds");
    assert_eq!(outcome, NavOutcome::Exit);
    assert!(navigator
        .take_signals()
        .contains(&RenderSignal::NavigateTo {
            url: "/summary/".to_string()
        }));

    let stored = store
        .list_values(&SNAPSHOT.to_string(), &"attr-a".to_string())
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].text, "hello");
    assert!(stored[0].id.is_some());
    assert_eq!(stored[0].set_index, 0);
    assert_eq!(stored[0].collection_index, 0);

    // The in-memory value absorbed the canonical representation.
    let values = navigator.active_values_mut().unwrap();
    assert_eq!(values["attr-a"][0].id, stored[0].id);
}

#[tokio::test]
async fn conditional_entity_is_skipped_until_answered() {
    let store = Arc::new(MemoryStore::new());
    fixture(
        &store,
        vec![
            entity(
                "entity-a",
                vec![question(
                    "attr-a",
                    WidgetType::Radio,
                    vec![OptionDef {
                        id: "option-yes".to_string(),
                        text: "Yes".to_string(),
                        additional_input: false,
                    }],
                )],
                Vec::new(),
            ),
            entity(
                "entity-b",
                vec![question("attr-b", WidgetType::Text, Vec::new())],
                vec![eq_condition("attr-a", "option-yes")],
            ),
            entity(
                "entity-c",
                vec![question("attr-c", WidgetType::Text, Vec::new())],
                Vec::new(),
            ),
        ],
    );

    // Unanswered source attribute: the chain lands on entity-c.
    let mut navigator = start(&store).await;
    assert_eq!(current_id(&navigator), "entity-a");
    navigator.next().await.unwrap();
    assert_eq!(current_id(&navigator), "entity-c");

    // Skipping also works backward.
    navigator.prev().await.unwrap();
    assert_eq!(current_id(&navigator), "entity-a");

    // Answer the source question; now the conditional page admits.
    {
        let values = navigator.active_values_mut().unwrap();
        values.get_mut("attr-a").unwrap()[0].option = Some("option-yes".to_string());
    }
    navigator.save(false).await.unwrap();
    navigator.next().await.unwrap();
    assert_eq!(current_id(&navigator), "entity-b");
}

#[tokio::test]
async fn exhausted_when_no_entity_admits_backward() {
    let store = Arc::new(MemoryStore::new());
    fixture(
        &store,
        vec![
            entity(
                "entity-a",
                vec![question("attr-a", WidgetType::Text, Vec::new())],
                vec![eq_condition("attr-unanswered", "option-x")],
            ),
            entity(
                "entity-b",
                vec![question("attr-b", WidgetType::Text, Vec::new())],
                Vec::new(),
            ),
        ],
    );

    let mut navigator = start(&store).await;
    // entity-a skips, the start lands on entity-b.
    assert_eq!(current_id(&navigator), "entity-b");

    // Going backward only finds the skipping entity and runs out.
    let outcome = navigator.prev().await.unwrap();
    assert_eq!(outcome, NavOutcome::Exhausted);
    assert_eq!(current_id(&navigator), "entity-b");
}

#[tokio::test]
async fn next_at_the_boundary_redirects_without_fetching() {
    let store = Arc::new(MemoryStore::new());
    fixture(
        &store,
        vec![entity(
            "entity-a",
            vec![question("attr-a", WidgetType::Text, Vec::new())],
            Vec::new(),
        )],
    );

    let mut navigator = start(&store).await;
    navigator.take_signals();

    let outcome = navigator.next().await.unwrap();
    assert_eq!(outcome, NavOutcome::Exit);
    assert_eq!(current_id(&navigator), "entity-a");
    let signals = navigator.take_signals();
    assert_eq!(
        signals,
        vec![RenderSignal::NavigateTo {
            url: "/summary/".to_string()
        }]
    );
}

#[tokio::test]
async fn checkbox_answers_survive_a_roundtrip() {
    let store = Arc::new(MemoryStore::new());
    let options = vec![
        OptionDef {
            id: "option-1".to_string(),
            text: "one".to_string(),
            additional_input: false,
        },
        OptionDef {
            id: "option-2".to_string(),
            text: "two".to_string(),
            additional_input: false,
        },
        OptionDef {
            id: "option-3".to_string(),
            text: "three".to_string(),
            additional_input: false,
        },
    ];
    fixture(
        &store,
        vec![entity(
            "entity-a",
            vec![question("attr-a", WidgetType::Checkbox, options)],
            Vec::new(),
        )],
    );

    let mut navigator = start(&store).await;
    {
        let values = navigator.active_values_mut().unwrap();
        let bucket = values.get_mut("attr-a").unwrap();
        assert_eq!(bucket.len(), 3);
        assert!(bucket.iter().all(|v| v.state == ValueState::Unanswered));
        bucket[1].set_checked(true);
    }
    navigator.save(false).await.unwrap();

    // Only the checked option was persisted.
    assert_eq!(store.value_count(), 1);

    // Re-entering the page reconciles the bucket against the option list.
    navigator
        .goto(EntityTarget::Entity("entity-a".to_string()))
        .await
        .unwrap();
    let values = navigator.active_values_mut().unwrap();
    let bucket = &values["attr-a"];
    assert_eq!(bucket.len(), 3);
    let states: Vec<ValueState> = bucket.iter().map(|v| v.state).collect();
    assert_eq!(
        states,
        vec![
            ValueState::Unanswered,
            ValueState::Answered,
            ValueState::Unanswered
        ]
    );
    assert_eq!(bucket[1].option.as_deref(), Some("option-2"));

    // Unchecking the persisted option deletes it on the next save.
    values.get_mut("attr-a").unwrap()[1].set_checked(false);
    navigator.save(false).await.unwrap();
    assert_eq!(store.value_count(), 0);
}

fn dataset_entity() -> Entity {
    let mut datasets = entity(
        "entity-sets",
        vec![
            question("attr-name", WidgetType::Text, Vec::new()),
            question("attr-format", WidgetType::Text, Vec::new()),
        ],
        Vec::new(),
    );
    datasets.is_set = true;
    datasets.attribute_entity.is_collection = true;
    datasets.collection = Some(interview_nav_rust::model::Collection {
        id: "collection-1".to_string(),
        id_attribute: Some("attr-name".to_string()),
    });
    datasets
}

fn set_fixture(store: &MemoryStore) {
    store.register_collection(
        &"collection-1".to_string(),
        &["attr-name".to_string(), "attr-format".to_string()],
    );
    fixture(store, vec![dataset_entity()]);
}

fn add_titled_set(navigator: &mut Navigator<MemoryStore>, title: &str) {
    let mut form = navigator
        .open_set_form(true)
        .expect("form opens")
        .expect("title attribute declared");
    form.title = title.to_string();
    navigator.submit_set_form(&form).expect("valid title");
}

#[tokio::test]
async fn removed_sets_do_not_consume_an_index_slot() {
    let store = Arc::new(MemoryStore::new());
    set_fixture(&store);

    let mut navigator = start(&store).await;
    // A set page with no stored rows has nothing to edit yet.
    assert!(navigator.active_values_mut().is_none());

    for title in ["row 0", "row 1", "row 2"] {
        add_titled_set(&mut navigator, title);
    }
    navigator.save(false).await.unwrap();

    // Three rows persisted with contiguous indices.
    let stored = store
        .list_collection_values(&SNAPSHOT.to_string(), &"collection-1".to_string())
        .await
        .unwrap();
    let mut names: Vec<(usize, String)> = stored
        .iter()
        .filter(|v| v.attribute == "attr-name")
        .map(|v| (v.set_index, v.text.clone()))
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            (0, "row 0".to_string()),
            (1, "row 1".to_string()),
            (2, "row 2".to_string())
        ]
    );

    // Remove the middle row; the survivors close the gap at save time.
    if let Some(PageValues::Sets(sets)) = navigator.current().map(|page| &page.values) {
        assert_eq!(sets.active_index(), Some(2));
    } else {
        panic!("set page expected");
    }
    navigator
        .goto(EntityTarget::Entity("entity-sets".to_string()))
        .await
        .unwrap();

    {
        let page = navigator.current().unwrap();
        let PageValues::Sets(sets) = &page.values else {
            panic!("set page expected");
        };
        assert_eq!(sets.sets().len(), 3);
    }

    // Move the active pointer onto the middle row, then remove it.
    {
        let page = navigator.current().unwrap();
        let PageValues::Sets(sets) = &page.values else {
            panic!("set page expected");
        };
        assert_eq!(sets.active_index(), Some(0));
    }
    navigator.save(true).await.unwrap(); // advance to row 1
    navigator.remove_value_set();
    navigator.save(false).await.unwrap();

    let stored = store
        .list_collection_values(&SNAPSHOT.to_string(), &"collection-1".to_string())
        .await
        .unwrap();
    let mut names: Vec<(usize, String)> = stored
        .iter()
        .filter(|v| v.attribute == "attr-name")
        .map(|v| (v.set_index, v.text.clone()))
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![(0, "row 0".to_string()), (1, "row 2".to_string())]
    );
}

#[tokio::test]
async fn save_advance_steps_through_remaining_sets_first() {
    let store = Arc::new(MemoryStore::new());
    set_fixture(&store);

    let mut navigator = start(&store).await;
    add_titled_set(&mut navigator, "alpha");
    add_titled_set(&mut navigator, "beta");

    // The newest row is active; step back to the first.
    {
        let page = navigator.current().unwrap();
        let PageValues::Sets(sets) = &page.values else {
            panic!("set page expected");
        };
        assert_eq!(sets.active_index(), Some(1));
    }
    navigator
        .goto(EntityTarget::Entity("entity-sets".to_string()))
        .await
        .unwrap();
    // Nothing was saved yet, so re-entering the page discards both drafts.
    assert!(navigator.active_values_mut().is_none());

    add_titled_set(&mut navigator, "alpha");
    add_titled_set(&mut navigator, "beta");
    navigator.save(false).await.unwrap();
    navigator
        .goto(EntityTarget::Entity("entity-sets".to_string()))
        .await
        .unwrap();

    // Active row is 0; saving with advance moves to row 1, not off the page.
    let outcome = navigator.save(true).await.unwrap();
    assert_eq!(outcome, NavOutcome::Page);
    {
        let page = navigator.current().unwrap();
        let PageValues::Sets(sets) = &page.values else {
            panic!("set page expected");
        };
        assert_eq!(sets.active_index(), Some(1));
    }

    // Advancing past the last row leaves the wizard (next is null).
    let outcome = navigator.save(true).await.unwrap();
    assert_eq!(outcome, NavOutcome::Exit);
}

#[tokio::test]
async fn set_form_requires_a_title_before_any_store_call() {
    let store = Arc::new(MemoryStore::new());
    set_fixture(&store);

    let mut navigator = start(&store).await;
    let form = navigator.open_set_form(true).unwrap().unwrap();
    assert!(navigator
        .take_signals()
        .contains(&RenderSignal::ShowSetForm));

    let err = navigator.submit_set_form(&form).unwrap_err();
    match err {
        EngineError::Validation(errors) => {
            assert!(errors.fields.contains_key("text"));
        }
        other => panic!("expected a validation failure, got {:?}", other),
    }
    // The rejected submission created nothing, locally or remotely.
    assert!(navigator.active_values_mut().is_none());
    assert_eq!(store.value_count(), 0);
}

#[tokio::test]
async fn persistence_failure_keeps_the_engine_on_the_page() {
    let store = Arc::new(MemoryStore::new());
    fixture(
        &store,
        vec![
            entity(
                "entity-a",
                vec![question("attr-a", WidgetType::Text, Vec::new())],
                Vec::new(),
            ),
            entity(
                "entity-b",
                vec![question("attr-b", WidgetType::Text, Vec::new())],
                Vec::new(),
            ),
        ],
    );

    let mut navigator = start(&store).await;
    {
        let values = navigator.active_values_mut().unwrap();
        values.get_mut("attr-a").unwrap()[0].text = "draft".to_string();
    }

    store.set_fail_writes(true);
    let err = navigator.save(true).await.unwrap_err();
    match err {
        EngineError::Persist { failed, total, .. } => {
            assert_eq!(failed, 1);
            assert_eq!(total, 1);
        }
        other => panic!("expected a persist failure, got {:?}", other),
    }
    assert_eq!(current_id(&navigator), "entity-a");

    // The store recovers and the same save goes through.
    store.set_fail_writes(false);
    let outcome = navigator.save(true).await.unwrap();
    assert_eq!(outcome, NavOutcome::Page);
    assert_eq!(current_id(&navigator), "entity-b");
}

#[tokio::test]
async fn jump_resolves_the_most_specific_target() {
    let store = Arc::new(MemoryStore::new());
    let project_id = seed::load_demo_data(&store).await.unwrap();

    let mut navigator = Navigator::start(Arc::clone(&store), &project_id, "/summary/")
        .await
        .unwrap();
    assert_eq!(current_id(&navigator), "entity-title");

    let catalog = navigator.catalog().clone();
    let methods = catalog.sections[1].clone();

    // Section target: first entity of its first subsection.
    navigator.jump(&methods, None, None).await.unwrap();
    assert_eq!(current_id(&navigator), "entity-methods");

    // Subsection target: its own first entity.
    let data = methods.subsections[1].clone();
    navigator.jump(&methods, Some(&data), None).await.unwrap();
    assert_eq!(current_id(&navigator), "entity-datasets");

    // Entity target wins over both.
    let head = EntityHead {
        id: "entity-deadline".to_string(),
        title: None,
    };
    navigator
        .jump(&methods, Some(&data), Some(&head))
        .await
        .unwrap();
    assert_eq!(current_id(&navigator), "entity-deadline");
}

#[tokio::test]
async fn demo_walkthrough_skips_the_conditional_page() {
    let store = Arc::new(MemoryStore::new());
    let project_id = seed::load_demo_data(&store).await.unwrap();

    let mut navigator = Navigator::start(Arc::clone(&store), &project_id, "/done/")
        .await
        .unwrap();

    let mut visited = vec![current_id(&navigator).to_string()];
    loop {
        match navigator.next().await.unwrap() {
            NavOutcome::Page => visited.push(current_id(&navigator).to_string()),
            _ => break,
        }
    }
    // entity-data-kind is gated on an answer that was never given.
    assert_eq!(
        visited,
        vec![
            "entity-title",
            "entity-has-data",
            "entity-methods",
            "entity-effort",
            "entity-deadline",
            "entity-datasets"
        ]
    );

    // Answer the gate, then the page admits.
    navigator
        .goto(EntityTarget::Entity("entity-has-data".to_string()))
        .await
        .unwrap();
    {
        let values = navigator.active_values_mut().unwrap();
        values.get_mut("attr-has-data").unwrap()[0].option = Some("option-yes".to_string());
    }
    navigator.save(true).await.unwrap();
    assert_eq!(current_id(&navigator), "entity-data-kind");
}

#[tokio::test]
async fn values_update_in_place_on_resave() {
    let store = Arc::new(MemoryStore::new());
    fixture(
        &store,
        vec![entity(
            "entity-a",
            vec![question("attr-a", WidgetType::Text, Vec::new())],
            Vec::new(),
        )],
    );

    let mut navigator = start(&store).await;
    {
        let values = navigator.active_values_mut().unwrap();
        values.get_mut("attr-a").unwrap()[0].text = "first".to_string();
    }
    navigator.save(false).await.unwrap();
    assert_eq!(store.value_count(), 1);

    {
        let values = navigator.active_values_mut().unwrap();
        values.get_mut("attr-a").unwrap()[0].text = "second".to_string();
    }
    navigator.save(false).await.unwrap();

    // Still one record; the update went to the same id.
    let stored = store
        .list_values(&SNAPSHOT.to_string(), &"attr-a".to_string())
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].text, "second");

    // A value removed after persisting disappears on the next save.
    navigator.remove_value(&"attr-a".to_string(), 0);
    navigator.save(false).await.unwrap();
    assert_eq!(store.value_count(), 0);
}

#[tokio::test]
async fn repeatable_questions_grow_and_focus_new_inputs() {
    let store = Arc::new(MemoryStore::new());
    let mut repeatable = entity(
        "entity-a",
        vec![question("attr-a", WidgetType::Text, Vec::new())],
        Vec::new(),
    );
    repeatable.questions[0].attribute.is_collection = true;
    fixture(&store, vec![repeatable]);

    let mut navigator = start(&store).await;
    // The first field of a repeatable question is focused by index.
    assert!(navigator.take_signals().contains(&RenderSignal::FocusField {
        attribute: "attr-a".to_string(),
        index: Some(0)
    }));

    navigator.add_value(&"attr-a".to_string());
    assert!(navigator.take_signals().contains(&RenderSignal::FocusField {
        attribute: "attr-a".to_string(),
        index: Some(1)
    }));

    {
        let values = navigator.active_values_mut().unwrap();
        let bucket = values.get_mut("attr-a").unwrap();
        bucket[0].text = "one".to_string();
        bucket[1].text = "two".to_string();
    }
    navigator.save(false).await.unwrap();

    let stored = store
        .list_values(&SNAPSHOT.to_string(), &"attr-a".to_string())
        .await
        .unwrap();
    let texts: Vec<(usize, String)> = stored
        .iter()
        .map(|v| (v.collection_index, v.text.clone()))
        .collect();
    assert_eq!(texts, vec![(0, "one".to_string()), (1, "two".to_string())]);
}
