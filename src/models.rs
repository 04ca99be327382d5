use mongodb::bson::{Document, oid::ObjectId};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::ApiError;

const NAME_MAX_CHARS: usize = 50;

/// Tri-state wrapper for fields of a partial update.
///
/// Distinguishes a field that was absent from the request body (`Unset`) from
/// one supplied as an explicit JSON `null` (`Null`) and one supplied with a
/// value (`Set`). Plain `Option` collapses the first two, which makes
/// "leave unchanged" and "clear" indistinguishable.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Unset,
    Null,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only reached when the field is present; `#[serde(default)]` on the
        // containing struct produces `Unset` for absent fields.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Null,
        })
    }
}

/// An item as stored in the collection. `_id` is absent before insert and
/// always present on anything read back.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ItemDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub oid: Option<ObjectId>,
    #[serde(rename = "ID")]
    pub item_id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// An item as returned to callers: the internal record identifier is exposed
/// only as a hex string, never as a raw `ObjectId`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ItemRecord {
    pub id: String,
    #[serde(rename = "ID")]
    pub item_id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl From<ItemDocument> for ItemRecord {
    fn from(doc: ItemDocument) -> Self {
        Self {
            id: doc.oid.map(|oid| oid.to_hex()).unwrap_or_default(),
            item_id: doc.item_id,
            first_name: doc.first_name,
            last_name: doc.last_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewItem {
    #[serde(rename = "ID")]
    pub item_id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl NewItem {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)
    }

    pub fn to_document(&self) -> ItemDocument {
        ItemDocument {
            oid: None,
            item_id: self.item_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UpdateItem {
    #[serde(default)]
    pub first_name: Patch<String>,
    #[serde(default)]
    pub last_name: Patch<String>,
}

impl UpdateItem {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_unset() && self.last_name.is_unset()
    }

    /// Builds the `$set` document from the supplied fields only. Name fields
    /// are not nullable, so an explicit `null` is rejected here.
    pub fn set_document(&self) -> Result<Document, ApiError> {
        let mut set = Document::new();

        match &self.first_name {
            Patch::Set(name) => {
                validate_name("first_name", name)?;
                set.insert("first_name", name);
            }
            Patch::Null => {
                return Err(ApiError::Validation(
                    "first_name may not be null".to_string(),
                ));
            }
            Patch::Unset => {}
        }

        match &self.last_name {
            Patch::Set(name) => {
                validate_name("last_name", name)?;
                set.insert("last_name", name);
            }
            Patch::Null => {
                return Err(ApiError::Validation(
                    "last_name may not be null".to_string(),
                ));
            }
            Patch::Unset => {}
        }

        Ok(set)
    }
}

fn validate_name(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} must not be empty", field)));
    }
    if value.chars().count() > NAME_MAX_CHARS {
        return Err(ApiError::Validation(format!(
            "{} must be at most {} characters",
            field, NAME_MAX_CHARS
        )));
    }
    Ok(())
}
