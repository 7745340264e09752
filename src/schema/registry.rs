use std::collections::BTreeSet;
use std::collections::HashMap;

use super::definition::{
    ActorDef, CustomOperationDef, CustomTypeDef, FieldDef, ModelDef, ReturnDef, RuleDef,
    SchemaDocument,
};
use super::error::{NotFoundError, SchemaError};
use super::types::{
    ActorClassifier, AuthorizationRule, Condition, CustomOperation, CustomType, Field, Model,
    ReturnShape, ScalarType, SecondaryIndex,
};

/// Immutable registry of every model, custom type, and custom operation.
/// Built once at startup; lookups only afterwards.
#[derive(Debug)]
pub struct SchemaRegistry {
    models: HashMap<String, Model>,
    custom_types: HashMap<String, CustomType>,
    operations: HashMap<String, CustomOperation>,
}

impl SchemaRegistry {
    pub fn register(doc: SchemaDocument) -> Result<Self, SchemaError> {
        let mut models = HashMap::new();
        let mut custom_types = HashMap::new();
        let mut operations = HashMap::new();

        for def in doc.models {
            let model = freeze_model(def)?;
            if models.contains_key(&model.name) {
                return Err(SchemaError::DuplicateModel(model.name));
            }
            models.insert(model.name.clone(), model);
        }

        for def in doc.custom_types {
            let custom = freeze_custom_type(def)?;
            if custom_types.contains_key(&custom.name) {
                return Err(SchemaError::DuplicateCustomType(custom.name));
            }
            custom_types.insert(custom.name.clone(), custom);
        }

        for def in doc.operations {
            let operation = freeze_operation(def)?;
            if operations.contains_key(&operation.name) {
                return Err(SchemaError::DuplicateOperation(operation.name));
            }
            // Return-type references must resolve against what was registered above
            let reference = operation.returns.reference();
            let resolved = match &operation.returns {
                ReturnShape::Model(_) | ReturnShape::ModelList(_) => models.contains_key(reference),
                ReturnShape::Custom(_) | ReturnShape::CustomList(_) => {
                    custom_types.contains_key(reference)
                }
            };
            if !resolved {
                return Err(SchemaError::UnresolvedReturnType {
                    operation: operation.name,
                    reference: reference.to_string(),
                });
            }
            operations.insert(operation.name.clone(), operation);
        }

        let registry = Self {
            models,
            custom_types,
            operations,
        };
        tracing::info!(
            models = registry.models.len(),
            custom_types = registry.custom_types.len(),
            operations = registry.operations.len(),
            "schema registry built"
        );
        Ok(registry)
    }

    pub fn model(&self, name: &str) -> Result<&Model, NotFoundError> {
        self.models.get(name).ok_or_else(|| NotFoundError::model(name))
    }

    pub fn operation(&self, name: &str) -> Result<&CustomOperation, NotFoundError> {
        self.operations
            .get(name)
            .ok_or_else(|| NotFoundError::operation(name))
    }

    pub fn custom_type(&self, name: &str) -> Result<&CustomType, NotFoundError> {
        self.custom_types
            .get(name)
            .ok_or_else(|| NotFoundError::custom_type(name))
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    pub fn operations(&self) -> impl Iterator<Item = &CustomOperation> {
        self.operations.values()
    }
}

fn freeze_fields(target: &str, defs: Vec<FieldDef>) -> Result<Vec<Field>, SchemaError> {
    let mut fields: Vec<Field> = Vec::with_capacity(defs.len());
    for def in defs {
        if fields.iter().any(|f| f.name == def.name) {
            return Err(SchemaError::DuplicateField {
                target: target.to_string(),
                field: def.name,
            });
        }
        if def.enum_values.is_some() && def.scalar != ScalarType::String {
            return Err(SchemaError::EnumOnNonString {
                target: target.to_string(),
                field: def.name,
            });
        }
        let field = Field {
            name: def.name,
            scalar: def.scalar,
            array: def.array,
            required: def.required,
            default: def.default,
            enum_values: def.enum_values,
        };
        if let Some(default) = &field.default {
            if !field.accepts(default) {
                return Err(SchemaError::DefaultTypeMismatch {
                    target: target.to_string(),
                    field: field.name,
                });
            }
        }
        fields.push(field);
    }
    Ok(fields)
}

fn freeze_rules(rules: Vec<RuleDef>) -> Vec<AuthorizationRule> {
    rules
        .into_iter()
        .map(|def| AuthorizationRule {
            actor: match def.actor {
                ActorDef::Owner => ActorClassifier::Owner,
                ActorDef::Authenticated => ActorClassifier::AuthenticatedUser,
                ActorDef::PublicKey => ActorClassifier::PublicKey,
                ActorDef::Group(name) => ActorClassifier::Group(name),
            },
            operations: BTreeSet::from_iter(def.operations),
            condition: def.condition.map(|c| Condition {
                field: c.field,
                op: c.op,
                value: c.value,
            }),
        })
        .collect()
}

fn freeze_model(def: ModelDef) -> Result<Model, SchemaError> {
    let name = def.name;
    let fields = freeze_fields(&format!("model '{}'", name), def.fields)?;

    let mut indexes: Vec<SecondaryIndex> = Vec::with_capacity(def.indexes.len());
    for idx in def.indexes {
        if indexes.iter().any(|i| i.name == idx.name) {
            return Err(SchemaError::DuplicateIndex {
                model: name,
                index: idx.name,
            });
        }
        let mut keys = vec![&idx.partition_key];
        keys.extend(idx.sort_key.as_ref());
        for key in keys {
            if !fields.iter().any(|f| &f.name == key) {
                return Err(SchemaError::UnknownIndexField {
                    model: name,
                    index: idx.name,
                    field: key.clone(),
                });
            }
        }
        indexes.push(SecondaryIndex {
            name: idx.name,
            partition_key: idx.partition_key,
            sort_key: idx.sort_key,
        });
    }

    let rules = freeze_rules(def.rules);
    for rule in &rules {
        if let Some(condition) = &rule.condition {
            if !fields.iter().any(|f| f.name == condition.field) {
                return Err(SchemaError::UnknownConditionField {
                    target: format!("model '{}'", name),
                    field: condition.field.clone(),
                });
            }
        }
    }

    Ok(Model {
        name,
        fields,
        rules,
        indexes,
    })
}

fn freeze_custom_type(def: CustomTypeDef) -> Result<CustomType, SchemaError> {
    let name = def.name;
    let fields = freeze_fields(&format!("custom type '{}'", name), def.fields)?;
    Ok(CustomType { name, fields })
}

fn freeze_returns(operation: &str, def: ReturnDef) -> Result<ReturnShape, SchemaError> {
    match (def.model, def.custom, def.list) {
        (Some(model), None, false) => Ok(ReturnShape::Model(model)),
        (Some(model), None, true) => Ok(ReturnShape::ModelList(model)),
        (None, Some(custom), false) => Ok(ReturnShape::Custom(custom)),
        (None, Some(custom), true) => Ok(ReturnShape::CustomList(custom)),
        _ => Err(SchemaError::Parse(format!(
            "operation '{}' must declare exactly one of returns.model / returns.custom",
            operation
        ))),
    }
}

fn freeze_operation(def: CustomOperationDef) -> Result<CustomOperation, SchemaError> {
    let name = def.name;
    let args = freeze_fields(&format!("operation '{}'", name), def.args)?;
    let returns = freeze_returns(&name, def.returns)?;
    Ok(CustomOperation {
        name,
        kind: def.kind,
        args,
        returns,
        handler: def.handler,
        rules: freeze_rules(def.rules),
    })
}
