//! Entity types and identity.
//!
//! Entities are read-only inputs to the merge-planning flow: the core
//! never mutates them. Only the backend rewrites entities, after a merge
//! is confirmed and submitted.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique, stable entity identifier.
///
/// Once created, an `EntityId` never changes. Merge plans reference
/// entities exclusively through these ids.
///
/// # Examples
///
/// ```
/// use narrafuse::EntityId;
///
/// let id = EntityId::new();
/// assert!(!id.is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Creates a new random entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an entity ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns true if this is a nil (all zeros) UUID.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Creates a nil entity ID (for testing or sentinel values).
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<EntityId> for Uuid {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Classification of narrative entities.
///
/// The type is carried through candidate names so the conflict view can
/// show which kind of entity contributed each name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityType {
    /// A person in the narrative
    Character,
    /// A geographic or fictional place
    Location,
    /// A formal group (guild, army, church)
    Organization,
    /// A relevant physical object (sword, ring, letter)
    Object,
    /// A notable event (the wedding, the Great War)
    Event,
    /// An abstract concept (prophecy, curse, law)
    Concept,
}

impl EntityType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Location => "location",
            Self::Organization => "organization",
            Self::Object => "object",
            Self::Event => "event",
            Self::Concept => "concept",
        }
    }
}

impl TryFrom<String> for EntityType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value.is_empty() {
            return Err("entity type cannot be empty".to_string());
        }

        Ok(if value.eq_ignore_ascii_case("character") {
            Self::Character
        } else if value.eq_ignore_ascii_case("location") {
            Self::Location
        } else if value.eq_ignore_ascii_case("organization") {
            Self::Organization
        } else if value.eq_ignore_ascii_case("object") {
            Self::Object
        } else if value.eq_ignore_ascii_case("event") {
            Self::Event
        } else if value.eq_ignore_ascii_case("concept") {
            Self::Concept
        } else {
            return Err(format!(
                "unknown entity type: {value}. Expected one of: character, location, organization, object, event, concept"
            ));
        })
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A narrative entity as supplied by the surrounding system.
///
/// Already fetched and resolved by the entity list; the merge core reads
/// `canonical_name`, `aliases`, and `mention_count` and requires nothing
/// else of the record.
///
/// # Examples
///
/// ```
/// use narrafuse::{Entity, EntityType};
///
/// let entity = Entity::new("Juan Pérez", EntityType::Character);
/// assert_eq!(entity.canonical_name, "Juan Pérez");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Globally unique identifier.
    pub id: EntityId,

    /// Primary name for the entity.
    pub canonical_name: String,

    /// Other names this entity is known by.
    #[serde(default)]
    pub aliases: Vec<String>,

    /// The type classification of the entity.
    pub entity_type: EntityType,

    /// Number of detected mentions across the analyzed text.
    ///
    /// A display aggregate maintained by the backend; the core only sums
    /// it for the plan preview.
    #[serde(default)]
    pub mention_count: u64,
}

impl Entity {
    /// Creates a new entity with the given name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            id: EntityId::new(),
            canonical_name: name.into(),
            aliases: Vec::new(),
            entity_type,
            mention_count: 0,
        }
    }

    /// Creates a new entity with a specific ID.
    ///
    /// Useful when ids must be controlled, such as in tests or when
    /// mirroring backend records.
    #[must_use]
    pub fn with_id(id: EntityId, name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            id,
            canonical_name: name.into(),
            aliases: Vec::new(),
            entity_type,
            mention_count: 0,
        }
    }

    /// Adds an alias, skipping exact duplicates.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        if !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
        self
    }

    /// Sets the mention count.
    #[must_use]
    pub fn with_mentions(mut self, count: u64) -> Self {
        self.mention_count = count;
        self
    }

    /// Returns the number of aliases.
    #[must_use]
    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Iterates over every name of this entity, canonical name first.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical_name.as_str())
            .chain(self.aliases.iter().map(String::as_str))
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl std::hash::Hash for Entity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
