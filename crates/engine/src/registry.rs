//! Per-entity tables: default columns, searchable fields, filter bindings.
//!
//! One [`EntitySchema`] per [`EntityKind`], indexed by declaration order. Adding
//! an entity kind means adding a variant and one entry here.

use crate::entity::EntityKind;

/// How a filter key is matched against its bound fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterClass {
    /// Case-insensitive substring; matches if any bound field contains it.
    Fragment,
    /// Exact match on a single enumerated field; empty selection is a wildcard.
    Choice,
    /// Inclusive numeric bounds on a single field.
    Range,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub key: &'static str,
    pub class: FilterClass,
    pub fields: &'static [&'static str],
}

const fn fragment(key: &'static str, fields: &'static [&'static str]) -> FilterField {
    FilterField { key, class: FilterClass::Fragment, fields }
}

const fn choice(key: &'static str, fields: &'static [&'static str]) -> FilterField {
    FilterField { key, class: FilterClass::Choice, fields }
}

const fn range(key: &'static str, fields: &'static [&'static str]) -> FilterField {
    FilterField { key, class: FilterClass::Range, fields }
}

#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    /// Attribute ids rendered when the operator selected none.
    pub default_columns: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    pub filter_fields: &'static [FilterField],
    /// Candidate fields for the date-range filter; any one in range matches.
    pub date_fields: &'static [&'static str],
}

impl EntitySchema {
    pub fn filter_field(&self, key: &str) -> Option<&FilterField> {
        self.filter_fields.iter().find(|f| f.key == key)
    }
}

const ADDRESS: &[&str] = &["purok", "barangay", "municipality", "province"];

static SCHEMAS: [EntitySchema; 5] = [
    EntitySchema {
        kind: EntityKind::BeneficiaryList,
        default_columns: &[
            "ben_id",
            "ben_fullname",
            "ben_gender",
            "ben_marital_status",
            "ben_birth_date",
            "ben_age",
            "ben_cellphone",
            "ben_address",
        ],
        search_fields: &[
            "beneficiary_id",
            "first_name",
            "middle_name",
            "last_name",
            "barangay",
            "municipality",
        ],
        filter_fields: &[
            fragment("name", &["first_name", "middle_name", "last_name"]),
            fragment("address", ADDRESS),
            fragment("cellphone", &["cellphone"]),
            choice("gender", &["gender"]),
            choice("marital_status", &["marital_status"]),
            range("age", &["age"]),
        ],
        date_fields: &["birth_date"],
    },
    EntitySchema {
        kind: EntityKind::FarmLocation,
        default_columns: &[
            "farm_id",
            "farm_beneficiary_id",
            "farm_farmer",
            "farm_hectares",
            "farm_date_registered",
            "farm_address",
        ],
        search_fields: &["plot_id", "beneficiary_id", "farmer_name", "barangay", "municipality"],
        filter_fields: &[
            fragment("farmer", &["farmer_name"]),
            fragment("address", ADDRESS),
            range("hectares", &["hectares"]),
        ],
        date_fields: &["date_registered"],
    },
    EntitySchema {
        kind: EntityKind::SeedlingRecord,
        default_columns: &[
            "seed_beneficiary_id",
            "seed_farmer",
            "seed_variety",
            "seed_received",
            "seed_planted",
            "seed_date_received",
            "seed_planting_start",
            "seed_planting_end",
        ],
        search_fields: &["seedling_id", "beneficiary_id", "farmer_name", "variety"],
        filter_fields: &[
            fragment("farmer", &["farmer_name"]),
            fragment("variety", &["variety"]),
            range("received", &["received"]),
            range("planted", &["planted"]),
        ],
        date_fields: &["date_received", "date_of_planting_start", "date_of_planting_end"],
    },
    EntitySchema {
        kind: EntityKind::CropSurveyStatus,
        default_columns: &[
            "survey_beneficiary_id",
            "survey_farmer",
            "survey_surveyer",
            "survey_date",
            "survey_alive",
            "survey_dead",
            "survey_remarks",
        ],
        search_fields: &["survey_id", "beneficiary_id", "farmer_name", "surveyer"],
        filter_fields: &[
            fragment("farmer", &["farmer_name"]),
            fragment("surveyer", &["surveyer"]),
            fragment("remarks", &["remarks"]),
            range("alive_crops", &["alive_crops"]),
            range("dead_crops", &["dead_crops"]),
        ],
        date_fields: &["survey_date"],
    },
    EntitySchema {
        kind: EntityKind::ActivityLog,
        default_columns: &["log_timestamp", "log_user", "log_action", "log_description"],
        search_fields: &["user_name", "action", "description"],
        filter_fields: &[
            fragment("user", &["user_name"]),
            fragment("description", &["description"]),
            choice("action", &["action"]),
        ],
        date_fields: &["timestamp"],
    },
];

pub fn schema(kind: EntityKind) -> &'static EntitySchema {
    &SCHEMAS[kind.index()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn test_schema_indexed_by_kind() {
        for kind in EntityKind::ALL {
            assert_eq!(schema(kind).kind, kind);
        }
    }

    #[test]
    fn test_default_columns_belong_to_entity() {
        for kind in EntityKind::ALL {
            for id in schema(kind).default_columns {
                let attr = catalog::lookup(id).unwrap_or_else(|| panic!("{id} not in catalog"));
                assert_eq!(attr.entity, kind, "{id} is not a {kind} attribute");
            }
        }
    }

    #[test]
    fn test_search_field_counts() {
        for kind in EntityKind::ALL {
            let n = schema(kind).search_fields.len();
            assert!((3..=6).contains(&n), "{kind} has {n} search fields");
        }
    }

    #[test]
    fn test_single_field_bindings_for_choice_and_range() {
        for kind in EntityKind::ALL {
            for f in schema(kind).filter_fields {
                if f.class != FilterClass::Fragment {
                    assert_eq!(f.fields.len(), 1, "{kind}:{} must bind one field", f.key);
                }
            }
        }
    }
}
