//! Attribute catalog - the static registry of exportable fields.
//!
//! Every attribute id maps to exactly one entity kind. Ids are looked up from
//! operator selections that may predate the current catalog, so unknown ids are
//! dropped by callers rather than treated as errors.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::entity::EntityKind;
use crate::format::{self, ValueClass};
use crate::row::Row;

/// How an attribute's display value is read from a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    /// A native field of the row.
    Field(&'static str),
    /// First, middle and last name joined by single spaces.
    FullName,
    /// Purok, barangay, municipality and province joined by ", ".
    Address,
}

const NAME_PARTS: [&str; 3] = ["first_name", "middle_name", "last_name"];
const ADDRESS_PARTS: [&str; 4] = ["purok", "barangay", "municipality", "province"];

impl Accessor {
    /// Display string for `row`, or `None` when the value is missing or malformed.
    pub fn display(&self, row: &Row, class: ValueClass) -> Option<String> {
        match self {
            Accessor::Field(field) => format::render(row.get(field), class),
            Accessor::FullName => join_parts(row, &NAME_PARTS, " "),
            Accessor::Address => join_parts(row, &ADDRESS_PARTS, ", "),
        }
    }
}

fn join_parts(row: &Row, parts: &[&str], sep: &str) -> Option<String> {
    let present: Vec<String> = parts
        .iter()
        .filter_map(|field| format::text_of(row.get(field)))
        .collect();
    if present.is_empty() {
        None
    } else {
        Some(present.join(sep))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttributeDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub entity: EntityKind,
    pub class: ValueClass,
    #[serde(skip)]
    pub accessor: Accessor,
}

impl AttributeDescriptor {
    const fn field(
        id: &'static str,
        label: &'static str,
        entity: EntityKind,
        class: ValueClass,
        field: &'static str,
    ) -> Self {
        Self { id, label, entity, class, accessor: Accessor::Field(field) }
    }

    const fn derived(
        id: &'static str,
        label: &'static str,
        entity: EntityKind,
        accessor: Accessor,
    ) -> Self {
        Self { id, label, entity, class: ValueClass::Text, accessor }
    }

    /// Display string for `row`, `None` for a missing/malformed value.
    pub fn display(&self, row: &Row) -> Option<String> {
        self.accessor.display(row, self.class)
    }
}

use crate::entity::EntityKind::{
    ActivityLog, BeneficiaryList, CropSurveyStatus, FarmLocation, SeedlingRecord,
};
use crate::format::ValueClass::{Date, Number, Text, Timestamp};

/// Catalog in insertion order.
static ATTRIBUTES: &[AttributeDescriptor] = &[
    // Beneficiaries
    AttributeDescriptor::field("ben_id", "Beneficiary ID", BeneficiaryList, Text, "beneficiary_id"),
    AttributeDescriptor::derived("ben_fullname", "Full Name", BeneficiaryList, Accessor::FullName),
    AttributeDescriptor::field("ben_first_name", "First Name", BeneficiaryList, Text, "first_name"),
    AttributeDescriptor::field("ben_middle_name", "Middle Name", BeneficiaryList, Text, "middle_name"),
    AttributeDescriptor::field("ben_last_name", "Last Name", BeneficiaryList, Text, "last_name"),
    AttributeDescriptor::field("ben_gender", "Gender", BeneficiaryList, Text, "gender"),
    AttributeDescriptor::field("ben_marital_status", "Marital Status", BeneficiaryList, Text, "marital_status"),
    AttributeDescriptor::field("ben_birth_date", "Birth Date", BeneficiaryList, Date, "birth_date"),
    AttributeDescriptor::field("ben_age", "Age", BeneficiaryList, Number, "age"),
    AttributeDescriptor::field("ben_cellphone", "Cellphone", BeneficiaryList, Text, "cellphone"),
    AttributeDescriptor::field("ben_purok", "Purok", BeneficiaryList, Text, "purok"),
    AttributeDescriptor::field("ben_barangay", "Barangay", BeneficiaryList, Text, "barangay"),
    AttributeDescriptor::field("ben_municipality", "Municipality", BeneficiaryList, Text, "municipality"),
    AttributeDescriptor::field("ben_province", "Province", BeneficiaryList, Text, "province"),
    AttributeDescriptor::derived("ben_address", "Address", BeneficiaryList, Accessor::Address),
    // Farm plots
    AttributeDescriptor::field("farm_id", "Plot ID", FarmLocation, Text, "plot_id"),
    AttributeDescriptor::field("farm_beneficiary_id", "Beneficiary ID", FarmLocation, Text, "beneficiary_id"),
    AttributeDescriptor::field("farm_farmer", "Farmer Name", FarmLocation, Text, "farmer_name"),
    AttributeDescriptor::field("farm_purok", "Purok", FarmLocation, Text, "purok"),
    AttributeDescriptor::field("farm_barangay", "Barangay", FarmLocation, Text, "barangay"),
    AttributeDescriptor::field("farm_municipality", "Municipality", FarmLocation, Text, "municipality"),
    AttributeDescriptor::field("farm_province", "Province", FarmLocation, Text, "province"),
    AttributeDescriptor::derived("farm_address", "Farm Address", FarmLocation, Accessor::Address),
    AttributeDescriptor::field("farm_hectares", "Hectares", FarmLocation, Number, "hectares"),
    AttributeDescriptor::field("farm_date_registered", "Date Registered", FarmLocation, Date, "date_registered"),
    // Seedling distributions
    AttributeDescriptor::field("seed_id", "Seedling Record ID", SeedlingRecord, Text, "seedling_id"),
    AttributeDescriptor::field("seed_beneficiary_id", "Beneficiary ID", SeedlingRecord, Text, "beneficiary_id"),
    AttributeDescriptor::field("seed_farmer", "Farmer Name", SeedlingRecord, Text, "farmer_name"),
    AttributeDescriptor::field("seed_variety", "Variety", SeedlingRecord, Text, "variety"),
    AttributeDescriptor::field("seed_received", "Seedlings Received", SeedlingRecord, Number, "received"),
    AttributeDescriptor::field("seed_planted", "Seedlings Planted", SeedlingRecord, Number, "planted"),
    AttributeDescriptor::field("seed_date_received", "Date Received", SeedlingRecord, Date, "date_received"),
    AttributeDescriptor::field("seed_planting_start", "Planting Start", SeedlingRecord, Date, "date_of_planting_start"),
    AttributeDescriptor::field("seed_planting_end", "Planting End", SeedlingRecord, Date, "date_of_planting_end"),
    AttributeDescriptor::field("seed_plot_id", "Plot ID", SeedlingRecord, Text, "plot_id"),
    // Crop surveys
    AttributeDescriptor::field("survey_id", "Survey ID", CropSurveyStatus, Text, "survey_id"),
    AttributeDescriptor::field("survey_beneficiary_id", "Beneficiary ID", CropSurveyStatus, Text, "beneficiary_id"),
    AttributeDescriptor::field("survey_farmer", "Farmer Name", CropSurveyStatus, Text, "farmer_name"),
    AttributeDescriptor::field("survey_surveyer", "Surveyer", CropSurveyStatus, Text, "surveyer"),
    AttributeDescriptor::field("survey_date", "Survey Date", CropSurveyStatus, Date, "survey_date"),
    AttributeDescriptor::field("survey_alive", "Alive Crops", CropSurveyStatus, Number, "alive_crops"),
    AttributeDescriptor::field("survey_dead", "Dead Crops", CropSurveyStatus, Number, "dead_crops"),
    AttributeDescriptor::field("survey_plot_id", "Plot ID", CropSurveyStatus, Text, "plot_id"),
    AttributeDescriptor::field("survey_remarks", "Remarks", CropSurveyStatus, Text, "remarks"),
    // Activity log
    AttributeDescriptor::field("log_id", "Log ID", ActivityLog, Text, "log_id"),
    AttributeDescriptor::field("log_user", "User", ActivityLog, Text, "user_name"),
    AttributeDescriptor::field("log_action", "Action", ActivityLog, Text, "action"),
    AttributeDescriptor::field("log_description", "Description", ActivityLog, Text, "description"),
    AttributeDescriptor::field("log_timestamp", "Timestamp", ActivityLog, Timestamp, "timestamp"),
];

static INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    ATTRIBUTES
        .iter()
        .enumerate()
        .map(|(i, attr)| (attr.id, i))
        .collect()
});

/// Whole catalog in insertion order.
pub fn all() -> &'static [AttributeDescriptor] {
    ATTRIBUTES
}

pub fn lookup(id: &str) -> Option<&'static AttributeDescriptor> {
    INDEX.get(id.trim()).map(|&i| &ATTRIBUTES[i])
}

/// Attributes owned by `kind`, in catalog order.
pub fn attributes_of(kind: EntityKind) -> Vec<&'static AttributeDescriptor> {
    ATTRIBUTES.iter().filter(|attr| attr.entity == kind).collect()
}

/// Resolve a selection, dropping ids the catalog does not know. Order and
/// duplicates are preserved.
pub fn resolve<S: AsRef<str>>(ids: &[S]) -> Vec<&'static AttributeDescriptor> {
    ids.iter()
        .filter_map(|id| {
            let id = id.as_ref();
            let found = lookup(id);
            if found.is_none() {
                log::debug!("dropping unknown attribute id {id:?}");
            }
            found
        })
        .collect()
}

/// Distinct entity kinds behind a selection, in declaration order.
pub fn involved_entities<S: AsRef<str>>(ids: &[S]) -> Vec<EntityKind> {
    let mut kinds: Vec<EntityKind> = resolve(ids).iter().map(|attr| attr.entity).collect();
    kinds.sort();
    kinds.dedup();
    kinds
}
