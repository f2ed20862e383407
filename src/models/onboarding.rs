// ============================================================================
// ONBOARDING : SCHÉMAS DES ÉTAPES PAR RÔLE
// ============================================================================
//
// Description:
//   Types des étapes d'onboarding. Chaque rôle (customer / vendor) a son
//   propre agrégat de brouillon; chaque étape écrit dans une seule clé de
//   step_data.
//
// Clés de step_data:
//   - customer : interests, preferences
//   - vendor   : businessInfo, categories, businessDetails, storeDetails
//
// Points d'attention:
//   - profile_finalize (customer) n'écrit pas dans le brouillon mais
//     directement dans users (étape terminale)
//   - Le vendeur n'a pas d'étape terminale pour l'instant
//
// ============================================================================

use std::collections::BTreeMap;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum OnboardingRole {
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "vendor")]
    Vendor,
}

impl OnboardingRole {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(Self::Customer),
            "vendor" => Some(Self::Vendor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
        }
    }
}

// --- Validateurs custom ------------------------------------------------------

pub fn validate_non_empty_items(items: &Vec<String>) -> Result<(), ValidationError> {
    if items.iter().any(|item| item.trim().is_empty()) {
        let mut err = ValidationError::new("non_empty_items");
        err.message = Some("categories must not contain empty values".into());
        return Err(err);
    }
    Ok(())
}

// --- Étapes customer ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InterestsStep {
    #[validate(length(min = 1, max = 3), custom(function = "validate_non_empty_items"))]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesStep {
    #[serde(default)]
    #[validate(length(max = 3), custom(function = "validate_non_empty_items"))]
    pub categories: Vec<String>,
    #[validate(length(min = 1, message = "budgetRange is required"))]
    pub budget_range: String,
    #[validate(length(min = 1, message = "shoppingFrequency is required"))]
    pub shopping_frequency: String,
    #[serde(default)]
    pub special_prefs: BTreeMap<String, bool>,
}

// --- Étapes vendor -----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BusinessType {
    Unregistered,
    SoleProprietor,
    Partnership,
    Llc,
    Corporation,
    Nonprofit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessSize {
    #[serde(rename = "just_me")]
    JustMe,
    #[serde(rename = "2-10")]
    From2To10,
    #[serde(rename = "11-50")]
    From11To50,
    #[serde(rename = "51-100")]
    From51To100,
    #[serde(rename = "101+")]
    Over100,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Experience {
    #[serde(rename = "0-6months")]
    UpTo6Months,
    #[serde(rename = "6months-2years")]
    UpTo2Years,
    #[serde(rename = "2years-5years")]
    UpTo5Years,
    #[serde(rename = "5years-10years")]
    UpTo10Years,
    #[serde(rename = "10years+")]
    Over10Years,
}

/// Valeurs énumérées: la désérialisation rejette déjà tout ce qui sort des listes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfoStep {
    #[serde(rename = "type")]
    pub business_type: BusinessType,
    pub size: BusinessSize,
    pub experience: Experience,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CategoriesStep {
    #[validate(length(min = 1, max = 5), custom(function = "validate_non_empty_items"))]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDetailsStep {
    #[serde(default)]
    pub business_name: Option<String>,
    #[validate(length(min = 50, max = 1000))]
    pub description: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    #[serde(default)]
    #[validate(url)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StoreDetailsStep {
    #[validate(length(min = 1, message = "storeName is required"))]
    pub store_name: String,
    #[validate(length(min = 1, message = "storeDescription is required"))]
    pub store_description: String,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
    /// URL Cloudinary du logo
    #[validate(url)]
    pub store_logo: String,
}

// --- Variantes d'étapes ------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum CustomerStep {
    Interests(InterestsStep),
    Preferences(PreferencesStep),
}

#[derive(Debug, Clone, PartialEq)]
pub enum VendorStep {
    BusinessInfo(BusinessInfoStep),
    Categories(CategoriesStep),
    BusinessDetails(BusinessDetailsStep),
    StoreDetails(StoreDetailsStep),
}

/// Une soumission d'étape non terminale, déjà typée selon le rôle
#[derive(Debug, Clone, PartialEq)]
pub enum DraftStep {
    Customer(CustomerStep),
    Vendor(VendorStep),
}

impl DraftStep {
    pub fn role(&self) -> OnboardingRole {
        match self {
            Self::Customer(_) => OnboardingRole::Customer,
            Self::Vendor(_) => OnboardingRole::Vendor,
        }
    }

    /// Clé de step_data écrite par l'étape
    pub fn key(&self) -> &'static str {
        match self {
            Self::Customer(CustomerStep::Interests(_)) => "interests",
            Self::Customer(CustomerStep::Preferences(_)) => "preferences",
            Self::Vendor(VendorStep::BusinessInfo(_)) => "businessInfo",
            Self::Vendor(VendorStep::Categories(_)) => "categories",
            Self::Vendor(VendorStep::BusinessDetails(_)) => "businessDetails",
            Self::Vendor(VendorStep::StoreDetails(_)) => "storeDetails",
        }
    }

    /// Numéro d'étape utilisé à la création du brouillon
    pub fn ordinal(&self) -> i32 {
        match self {
            Self::Customer(CustomerStep::Interests(_)) => 1,
            Self::Customer(CustomerStep::Preferences(_)) => 2,
            Self::Vendor(VendorStep::BusinessInfo(_)) => 1,
            Self::Vendor(VendorStep::Categories(_)) => 2,
            Self::Vendor(VendorStep::BusinessDetails(_)) => 3,
            Self::Vendor(VendorStep::StoreDetails(_)) => 4,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Customer(CustomerStep::Interests(step)) => step.validate(),
            Self::Customer(CustomerStep::Preferences(step)) => step.validate(),
            Self::Vendor(VendorStep::BusinessInfo(step)) => step.validate(),
            Self::Vendor(VendorStep::Categories(step)) => step.validate(),
            Self::Vendor(VendorStep::BusinessDetails(step)) => step.validate(),
            Self::Vendor(VendorStep::StoreDetails(step)) => step.validate(),
        }
    }

    /// Valeur JSON stockée sous `key()`. Les catégories vendeur sont une simple liste.
    pub fn bucket(&self) -> Value {
        let value = match self {
            Self::Customer(CustomerStep::Interests(step)) => serde_json::to_value(step),
            Self::Customer(CustomerStep::Preferences(step)) => serde_json::to_value(step),
            Self::Vendor(VendorStep::BusinessInfo(step)) => serde_json::to_value(step),
            Self::Vendor(VendorStep::Categories(step)) => serde_json::to_value(&step.categories),
            Self::Vendor(VendorStep::BusinessDetails(step)) => serde_json::to_value(step),
            Self::Vendor(VendorStep::StoreDetails(step)) => serde_json::to_value(step),
        };
        // types dérivés de Serialize sans map à clés non-string: ne peut pas échouer
        value.unwrap_or(Value::Null)
    }

    /// Projette une entrée `stepData.<key>` non typée vers la variante du rôle.
    pub fn project(role: OnboardingRole, key: &str, value: Value) -> Result<Self, AppError> {
        fn parse<T: serde::de::DeserializeOwned>(key: &str, value: Value) -> Result<T, AppError> {
            serde_json::from_value(value)
                .map_err(|e| AppError::invalid_input(format!("Invalid stepData.{key}: {e}")))
        }

        let step = match (role, key) {
            (OnboardingRole::Customer, "interests") => {
                Self::Customer(CustomerStep::Interests(parse(key, value)?))
            }
            (OnboardingRole::Customer, "preferences") => {
                Self::Customer(CustomerStep::Preferences(parse(key, value)?))
            }
            (OnboardingRole::Vendor, "businessInfo") => {
                Self::Vendor(VendorStep::BusinessInfo(parse(key, value)?))
            }
            (OnboardingRole::Vendor, "categories") => Self::Vendor(VendorStep::Categories(
                CategoriesStep {
                    categories: parse(key, value)?,
                },
            )),
            (OnboardingRole::Vendor, "businessDetails") => {
                Self::Vendor(VendorStep::BusinessDetails(parse(key, value)?))
            }
            (OnboardingRole::Vendor, "storeDetails") => {
                Self::Vendor(VendorStep::StoreDetails(parse(key, value)?))
            }
            (role, key) => {
                return Err(AppError::invalid_input(format!(
                    "Unknown stepData key '{key}' for role {}",
                    role.as_str()
                )));
            }
        };

        step.validate()?;
        Ok(step)
    }

    /// Projette tout le mapping `stepData` d'une soumission générique
    pub fn project_all(role: OnboardingRole, step_data: Map<String, Value>) -> Result<Vec<Self>, AppError> {
        step_data
            .into_iter()
            .map(|(key, value)| Self::project(role, &key, value))
            .collect()
    }
}

/// Construit le patch `{ key: bucket, ... }` fusionné dans step_data
pub fn step_patch(steps: &[DraftStep]) -> Value {
    let mut patch = Map::new();
    for step in steps {
        patch.insert(step.key().to_string(), step.bucket());
    }
    Value::Object(patch)
}

// --- Agrégats par rôle -------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraftData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<InterestsStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PreferencesStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorDraftData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_info: Option<BusinessInfoStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_details: Option<BusinessDetailsStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_details: Option<StoreDetailsStep>,
}

/// Contenu typé de drafts.step_data, discriminé par la colonne role
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepData {
    Customer(CustomerDraftData),
    Vendor(VendorDraftData),
}

impl StepData {
    pub fn from_json(role: OnboardingRole, value: Value) -> Result<Self, serde_json::Error> {
        match role {
            OnboardingRole::Customer => serde_json::from_value(value).map(Self::Customer),
            OnboardingRole::Vendor => serde_json::from_value(value).map(Self::Vendor),
        }
    }
}
