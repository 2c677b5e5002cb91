use anyhow::Result;

use crate::model::{
    Attribute, AttributeEntity, Catalog, Collection, Condition, Entity, EntityHead, Id, OptionDef,
    Project, Question, RangeDef, Relation, Section, Subsection, TrustedHtml, WidgetType,
};
use crate::store::MemoryStore;

const SNAPSHOT: &str = "snapshot-1";
const CATALOG: &str = "catalog-demo";
const PROJECT: &str = "demo";

fn question(attribute: &str, text: &str, widget_type: WidgetType, options: Vec<OptionDef>) -> Question {
    Question {
        id: format!("question-{}", attribute),
        text: text.to_string(),
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

fn option(id: &str, text: &str) -> OptionDef {
    OptionDef {
        id: id.to_string(),
        text: text.to_string(),
        additional_input: false,
    }
}

fn entity(
    id: &str,
    section: &str,
    subsection: &str,
    questions: Vec<Question>,
    conditions: Vec<Condition>,
) -> Entity {
    let attributes = questions.iter().map(|q| q.attribute.id.clone()).collect();
    Entity {
        id: id.to_string(),
        help: Some(TrustedHtml::new(format!("<p>{}</p>", subsection))),
        attribute_entity: AttributeEntity {
            id: format!("ae-{}", id),
            is_collection: false,
            conditions,
        },
        collection: None,
        is_set: false,
        prev: None,
        next: None,
        section: section.to_string(),
        subsection: subsection.to_string(),
        questions,
        attributes,
    }
}

/// Link the declared linear order and register everything under the catalog.
fn chain(store: &MemoryStore, catalog: &Id, mut entities: Vec<Entity>) -> Vec<EntityHead> {
    let ids: Vec<Id> = entities.iter().map(|e| e.id.clone()).collect();
    for (position, entity) in entities.iter_mut().enumerate() {
        entity.prev = position.checked_sub(1).map(|p| ids[p].clone());
        entity.next = ids.get(position + 1).cloned();
    }
    let heads = entities
        .iter()
        .map(|entity| EntityHead {
            id: entity.id.clone(),
            title: Some(entity.subsection.clone()),
        })
        .collect();
    for entity in entities {
        store.put_entity(catalog, entity);
    }
    heads
}

/// Populate the in-memory store with a small questionnaire that exercises
/// every widget and the branching machinery: a plain text page, a branching
/// radio page with its conditional follow-up, a checkbox page, range and
/// date pages, and a row-scoped dataset collection.
pub async fn load_demo_data(store: &MemoryStore) -> Result<Id> {
    let catalog_id: Id = CATALOG.to_string();

    let intro = entity(
        "entity-title",
        "General",
        "Project title",
        vec![question("attr-title", "What is the project called?", WidgetType::Text, Vec::new())],
        Vec::new(),
    );

    let has_data = entity(
        "entity-has-data",
        "General",
        "Existing data",
        vec![question(
            "attr-has-data",
            "Will existing data be reused?",
            WidgetType::Radio,
            vec![option("option-yes", "Yes"), option("option-no", "No")],
        )],
        Vec::new(),
    );

    // Only shown once the previous page was answered with "Yes".
    let data_kind = entity(
        "entity-data-kind",
        "General",
        "Kind of data",
        vec![question(
            "attr-data-kind",
            "What kind of data is reused?",
            WidgetType::Textarea,
            Vec::new(),
        )],
        vec![Condition {
            source_attribute: "attr-has-data".to_string(),
            relation: Relation::Eq,
            target_option: Some("option-yes".to_string()),
            target_text: None,
        }],
    );

    let methods = entity(
        "entity-methods",
        "Methods",
        "Collection methods",
        vec![question(
            "attr-methods",
            "How is data collected?",
            WidgetType::Checkbox,
            vec![
                option("option-interviews", "Interviews"),
                option("option-sensors", "Sensor readings"),
                option("option-simulation", "Simulation"),
            ],
        )],
        Vec::new(),
    );

    let mut effort = entity(
        "entity-effort",
        "Methods",
        "Effort",
        vec![question("attr-effort", "Expected effort", WidgetType::Range, Vec::new())],
        Vec::new(),
    );
    effort.questions[0].attribute.range = Some(RangeDef {
        minimum: 0.0,
        maximum: 100.0,
        step: 5.0,
    });

    let deadline = entity(
        "entity-deadline",
        "Methods",
        "Deadline",
        vec![question("attr-deadline", "When must data be ready?", WidgetType::Date, Vec::new())],
        Vec::new(),
    );

    // Row-scoped collection: one row per dataset, titled by the name value.
    let mut datasets = entity(
        "entity-datasets",
        "Data",
        "Datasets",
        vec![
            question("attr-dataset-name", "Dataset name", WidgetType::Text, Vec::new()),
            question("attr-dataset-format", "Format", WidgetType::Text, Vec::new()),
        ],
        Vec::new(),
    );
    datasets.is_set = true;
    datasets.attribute_entity.is_collection = true;
    datasets.collection = Some(Collection {
        id: "collection-datasets".to_string(),
        id_attribute: Some("attr-dataset-name".to_string()),
    });
    store.register_collection(
        &"collection-datasets".to_string(),
        &[
            "attr-dataset-name".to_string(),
            "attr-dataset-format".to_string(),
        ],
    );

    let heads = chain(
        store,
        &catalog_id,
        vec![intro, has_data, data_kind, methods, effort, deadline, datasets],
    );

    store.put_catalog(Catalog {
        id: catalog_id.clone(),
        title: "Demo data management plan".to_string(),
        sections: vec![
            Section {
                id: "section-general".to_string(),
                title: "General".to_string(),
                subsections: vec![Subsection {
                    id: "subsection-general".to_string(),
                    title: "General".to_string(),
                    entities: heads[..3].to_vec(),
                }],
            },
            Section {
                id: "section-methods".to_string(),
                title: "Methods".to_string(),
                subsections: vec![
                    Subsection {
                        id: "subsection-methods".to_string(),
                        title: "Methods".to_string(),
                        entities: heads[3..6].to_vec(),
                    },
                    Subsection {
                        id: "subsection-data".to_string(),
                        title: "Data".to_string(),
                        entities: heads[6..].to_vec(),
                    },
                ],
            },
        ],
    });

    store.put_project(Project {
        id: PROJECT.to_string(),
        title: "Demo project".to_string(),
        description: None,
        current_snapshot: SNAPSHOT.to_string(),
        catalog: catalog_id,
    });

    Ok(PROJECT.to_string())
}
