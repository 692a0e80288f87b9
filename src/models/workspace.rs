//! Users, pages and blocks of the document editor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: String,
    /// Login email, unique across users.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Encoded password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// The projection of a [`User`] that is safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    /// Unique identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
        }
    }
}

/// A page in the editor tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Unique identifier.
    pub id: String,
    /// Owner.
    pub user_id: String,
    /// Title.
    pub title: String,
    /// Emoji or icon name.
    pub icon: String,
    /// Parent page, if nested.
    pub parent_id: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/pages`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPage {
    /// Title, defaults to `Untitled`.
    #[serde(default = "default_page_title")]
    pub title: String,
    /// Icon, defaults to a page emoji.
    #[serde(default = "default_page_icon")]
    pub icon: String,
    /// Optional parent page.
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Default for NewPage {
    fn default() -> Self {
        Self {
            title: default_page_title(),
            icon: default_page_icon(),
            parent_id: None,
        }
    }
}

fn default_page_title() -> String {
    "Untitled".to_string()
}

fn default_page_icon() -> String {
    "📄".to_string()
}

/// Body of `PATCH /api/pages/{id}`; only present fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagePatch {
    /// New title.
    pub title: Option<String>,
    /// New icon.
    pub icon: Option<String>,
    /// New parent.
    pub parent_id: Option<String>,
}

/// A content block inside a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Unique identifier.
    pub id: String,
    /// Page the block belongs to.
    pub page_id: String,
    /// Block kind (`text`, `heading`, `todo`, ...).
    #[serde(rename = "type")]
    pub block_type: String,
    /// Arbitrary JSON payload.
    pub content: serde_json::Value,
    /// Position within the page.
    pub order: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/blocks`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBlock {
    /// Page the block belongs to.
    pub page_id: String,
    /// Block kind.
    #[serde(rename = "type")]
    pub block_type: String,
    /// Payload.
    #[serde(default)]
    pub content: serde_json::Value,
    /// Position within the page.
    #[serde(default)]
    pub order: i64,
}

/// Body of `PATCH /api/blocks/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockPatch {
    /// New kind.
    #[serde(rename = "type")]
    pub block_type: Option<String>,
    /// New payload.
    pub content: Option<serde_json::Value>,
    /// New order.
    pub order: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization_hides_hash() {
        let user = User {
            id: "u1".to_string(),
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            password_hash: "secret".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_new_page_defaults() {
        let page: NewPage = serde_json::from_str("{}").unwrap();
        assert_eq!(page.title, "Untitled");
        assert_eq!(page.icon, "📄");
        assert!(page.parent_id.is_none());
    }

    #[test]
    fn test_block_type_field_renamed() {
        let block: NewBlock =
            serde_json::from_str(r#"{"page_id":"p1","type":"heading","content":{"text":"hi"}}"#)
                .unwrap();
        assert_eq!(block.block_type, "heading");
        assert_eq!(block.order, 0);
    }
}
